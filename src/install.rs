//! Placing a staged binary into the destination directory.

use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Permission bits for installed binaries.
pub const BINARY_MODE: u32 = 0o755;

/// Copy `source` to `dir/name` and make it executable.
///
/// An existing file is truncated and overwritten in place. Returns the
/// installed path.
///
/// # Errors
///
/// Returns [`Error::Io`] naming the path that could not be read or written.
pub fn install(source: &Path, dir: &Path, name: &str) -> Result<PathBuf> {
    let target = dir.join(name);

    let mut input = File::open(source).map_err(|e| Error::io(source, e))?;
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(BINARY_MODE);
    }
    let mut output = options.open(&target).map_err(|e| Error::io(&target, e))?;
    let bytes = io::copy(&mut input, &mut output).map_err(|e| Error::io(&target, e))?;
    output.sync_all().map_err(|e| Error::io(&target, e))?;

    // The create mode is masked by umask and ignored for existing files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&target, fs::Permissions::from_mode(BINARY_MODE))
            .map_err(|e| Error::io(&target, e))?;
    }

    log::debug!("installed {} ({} bytes)", target.display(), bytes);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_new_binary() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("foo-extracted");
        fs::write(&staged, b"#!/bin/sh\n").unwrap();
        let dest = dir.path().join("bin");
        fs::create_dir(&dest).unwrap();

        let installed = install(&staged, &dest, "foo").unwrap();
        assert_eq!(installed, dest.join("foo"));
        assert_eq!(fs::read(&installed).unwrap(), b"#!/bin/sh\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&installed).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_install_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged");
        fs::write(&staged, b"new").unwrap();
        let existing = dir.path().join("foo");
        fs::write(&existing, b"old contents that are longer").unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&existing, fs::Permissions::from_mode(0o600)).unwrap();
        }

        install(&staged, dir.path(), "foo").unwrap();
        assert_eq!(fs::read(&existing).unwrap(), b"new");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&existing).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_install_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = install(&dir.path().join("missing"), dir.path(), "foo").unwrap_err();
        match err {
            Error::Io { path, .. } => assert_eq!(path, dir.path().join("missing")),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert!(!dir.path().join("foo").exists());
    }
}
