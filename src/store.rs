// Copyright (c) 2025 Ant Group
//
// SPDX-License-Identifier: Apache-2.0 or MIT
//

//! Reading and writing limit documents.
//!
//! Documents are YAML: an application's file maps process names to
//! `kind: quantity` tables, the defaults file is a single such table.
//! Unknown kinds and out-of-range quantities fail to load. A missing file
//! is not an error, it means nothing has been configured yet.

use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::{LimitSet, ResourceSet};

const FILE_MODE: u32 = 0o644;

/// Loads an application's limits. Returns an empty set if the file does
/// not exist.
pub fn load_limit_set(path: &Path) -> Result<LimitSet> {
    let mut limits: LimitSet = match read_document(path)? {
        Some(limits) => limits,
        None => {
            debug!("no limits file at {:?}", path);
            return Ok(LimitSet::new());
        }
    };
    limits.prune();

    Ok(limits)
}

/// Prunes `limits` and replaces the file at `path` with it.
pub fn save_limit_set(path: &Path, limits: &mut LimitSet) -> Result<()> {
    limits.prune();
    write_document(path, limits)?;
    info!("saved limits of {} process(es) to {:?}", limits.len(), path);

    Ok(())
}

/// Loads the configured defaults, or the built-in system defaults if the
/// file does not exist.
pub fn load_defaults(path: &Path) -> Result<ResourceSet> {
    match read_document(path)? {
        Some(defaults) => Ok(defaults),
        None => {
            debug!("no defaults file at {:?}, using system defaults", path);
            Ok(ResourceSet::system_defaults())
        }
    }
}

/// Replaces the defaults file at `path` with `defaults`.
pub fn save_defaults(path: &Path, defaults: &ResourceSet) -> Result<()> {
    write_document(path, defaults)?;
    info!("saved default limits to {:?}", path);

    Ok(())
}

fn read_document<T>(path: &Path) -> Result<Option<T>>
where
    T: DeserializeOwned + Default,
{
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };

    if raw.trim().is_empty() {
        return Ok(Some(T::default()));
    }

    serde_yaml::from_str(&raw)
        .map(Some)
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })
}

// The document goes to a temporary file next to `path`, which is synced
// and then renamed over `path`. Readers see the old or the new document,
// never a partial one.
fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_yaml::to_string(value)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    file.write_all(raw.as_bytes())
        .and_then(|_| file.as_file().sync_all())
        .and_then(|_| {
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(FILE_MODE))
        })
        .map_err(|e| Error::io(file.path(), e))?;

    file.persist(path).map_err(|e| Error::io(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LimitKind;

    fn cpu(share: i64) -> ResourceSet {
        let mut set = ResourceSet::new();
        set.set(LimitKind::CpuShare, share).unwrap();
        set
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");

        assert!(load_limit_set(&path).unwrap().is_empty());

        let defaults = load_defaults(&path).unwrap();
        assert_eq!(defaults.get(LimitKind::Memory), Some(1073741824));
        assert_eq!(defaults.get(LimitKind::CpuShare), Some(100));
    }

    #[test]
    fn test_save_prunes_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");

        let mut limits = LimitSet::new();
        limits.insert("web", ResourceSet::new());
        limits.insert("worker", cpu(50));

        save_limit_set(&path, &mut limits).unwrap();
        assert_eq!(limits.len(), 1);

        let loaded = load_limit_set(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("worker"), Some(&cpu(50)));
        assert_eq!(loaded, limits);

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, FILE_MODE);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");

        let mut limits = LimitSet::new();
        limits.insert("web", cpu(10));
        limits.insert("worker", cpu(20));
        save_limit_set(&path, &mut limits).unwrap();

        let mut limits = LimitSet::new();
        limits.insert("clock", cpu(30));
        save_limit_set(&path, &mut limits).unwrap();

        let loaded = load_limit_set(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get("web").is_none());
        assert_eq!(loaded.get("clock"), Some(&cpu(30)));
    }

    #[test]
    fn test_document_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");

        let mut web = cpu(50);
        web.set(LimitKind::Memory, 536870912).unwrap();
        let mut limits = LimitSet::new();
        limits.insert("web", web);
        save_limit_set(&path, &mut limits).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "web:\n  memory: 536870912\n  cpu: 50\n");
    }

    #[test]
    fn test_load_prunes_empty_processes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");
        fs::write(&path, "web: {}\nworker:\n  cpu: 50\n").unwrap();

        let loaded = load_limit_set(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("worker"), Some(&cpu(50)));
    }

    #[test]
    fn test_load_rejects_unknown_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");
        fs::write(&path, "web:\n  cpu: 50\n  swap: 1024\n").unwrap();

        let err = load_limit_set(&path).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.is_persistence_failure());
    }

    #[test]
    fn test_load_rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");

        fs::write(&path, "cpu: 150\n").unwrap();
        assert!(matches!(load_defaults(&path), Err(Error::Decode { .. })));

        fs::write(&path, "web:\n  memory: 0\n").unwrap();
        assert!(matches!(load_limit_set(&path), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_load_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");
        fs::write(&path, "web: [unterminated\n").unwrap();

        assert!(matches!(load_limit_set(&path), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");
        fs::write(&path, "\n").unwrap();

        assert!(load_limit_set(&path).unwrap().is_empty());
        assert!(load_defaults(&path).unwrap().is_empty());
    }

    #[test]
    fn test_defaults_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RESOURCES.yml");

        let defaults = ResourceSet::parse(&["memory=2g"]).unwrap();
        save_defaults(&path, &defaults).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "memory: 2147483648\n");
        assert_eq!(load_defaults(&path).unwrap(), defaults);
    }

    #[test]
    fn test_configure_and_launch() {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::env::Environment::new(dir.path().join("apps"), dir.path().join("lib"));
        fs::create_dir_all(env.app_root("blog")).unwrap();
        fs::create_dir_all(env.defaults_file_path().parent().unwrap()).unwrap();

        save_defaults(
            &env.defaults_file_path(),
            &ResourceSet::parse(&["memory=2g", "cpu=100"]).unwrap(),
        )
        .unwrap();
        let defaults = load_defaults(&env.defaults_file_path()).unwrap();

        let mut limits = load_limit_set(&env.limit_file_path("blog")).unwrap();
        let web = ResourceSet::parse(&["cpu=50"]).unwrap();
        limits.insert("web", web.apply_defaults(&defaults));
        save_limit_set(&env.limit_file_path("blog"), &mut limits).unwrap();

        let limits = load_limit_set(&env.limit_file_path("blog")).unwrap();
        let host = crate::tests::FixedHost(2);
        assert_eq!(
            limits.resources_for("web", &defaults).docker_options(&host),
            vec!["--memory=2147483648", "--cpus=\"1\""]
        );
        assert_eq!(
            limits.resources_for("worker", &defaults).docker_options(&host),
            vec!["--memory=2147483648", "--cpus=\"2\""]
        );
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("RESOURCES.yml");

        let err = save_defaults(&path, &ResourceSet::system_defaults()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(!path.exists());
    }
}
