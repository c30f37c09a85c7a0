//! File persistence helpers used for status snapshots.
//!
//! `write_atomic` uses the write-to-temp-then-rename pattern so readers never
//! observe a partially written file.

use crate::error::FileError;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Durably replaces the contents of `path` with `data`.
///
/// Missing parent directories are created. Fails with
/// [`FileError::InvalidPath`] if `path` is empty or names no file.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<(), FileError> {
    let path = path.as_ref();
    validate(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| FileError::io(parent, e))?;
    }

    let temp_path = temp_sibling(path);
    let result = write_and_sync(&temp_path, data)
        .and_then(|()| fs::rename(&temp_path, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(FileError::io(path, e));
    }
    Ok(())
}

/// Moves `src` to `dst`.
///
/// A plain rename is tried first; if that fails (for example across
/// filesystems) the bytes are copied and the source removed. On success
/// `dst` holds the source bytes and `src` no longer exists.
pub fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<(), FileError> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    validate(src)?;
    validate(dst)?;

    // Checked up front so an unreadable source never leaves a destination behind.
    let mut reader = File::open(src).map_err(|e| FileError::io(src, e))?;

    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    let mut writer = File::create(dst).map_err(|e| FileError::io(dst, e))?;
    if let Err(e) = io::copy(&mut reader, &mut writer).and_then(|_| writer.sync_all()) {
        drop(writer);
        let _ = fs::remove_file(dst);
        return Err(FileError::io(dst, e));
    }
    drop(reader);

    fs::remove_file(src).map_err(|e| FileError::io(src, e))
}

fn validate(path: &Path) -> Result<(), FileError> {
    if path.as_os_str().is_empty() || path.file_name().is_none() {
        return Err(FileError::InvalidPath(path.display().to_string()));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp.{:016x}", file_name, rand::random::<u64>()))
}

fn write_and_sync(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(data)?;
    file.sync_all()
}
