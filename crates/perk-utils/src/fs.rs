use std::{fs, path::Path};

use crate::error::{FileSystemError, FileSystemResult};

/// Creates a directory structure if it doesn't exist.
///
/// If the path exists but is not a directory, this returns
/// [`FileSystemError::NotADirectory`]. Construction of stores rooted at a
/// caller-supplied path relies on this to refuse foreign file layouts
/// instead of silently coexisting with them.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path).map_err(|err| FileSystemError::Directory {
            path: path.to_path_buf(),
            action: "create",
            source: err,
        })?;
    } else if !path.is_dir() {
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Removes the specified file or directory safely.
///
/// If the path does not exist, returns `Ok(())` without error. Directories
/// are removed recursively.
pub fn safe_remove<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(());
    }

    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    result.map_err(|err| FileSystemError::File {
        path: path.to_path_buf(),
        action: "remove",
        source: err,
    })
}

/// Writes `contents` to `path` atomically.
///
/// The bytes are written to a temporary sibling in the same directory and
/// then renamed into place, so a crash mid-write never leaves a partially
/// written file at `path`. Record stores depend on this: a reader either
/// sees the whole record or no record at all.
pub fn atomic_write<P: AsRef<Path>>(path: P, contents: &[u8]) -> FileSystemResult<()> {
    let path = path.as_ref();
    let file_err = |action: &'static str| {
        move |err: std::io::Error| FileSystemError::File {
            path: path.to_path_buf(),
            action,
            source: err,
        }
    };

    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    fs::write(&tmp, contents).map_err(file_err("write"))?;
    fs::rename(&tmp, path).map_err(file_err("rename"))
}
