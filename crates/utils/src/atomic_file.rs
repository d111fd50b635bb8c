//! Atomic file operations so a failed transfer never leaves a half-written file

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tes_core::{Error, Result};
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Copy `source` to `destination` atomically, creating parent directories
pub fn copy_atomic(source: &Path, destination: &Path) -> Result<u64> {
    let mut reader =
        File::open(source).map_err(|e| Error::file_system(source, "open source file", e))?;
    let mut copied = 0;
    with_temp_file(destination, |file, temp_path| {
        copied = io::copy(&mut reader, file)
            .map_err(|e| Error::file_system(temp_path, "copy into temporary file", e))?;
        Ok(())
    })?;
    Ok(copied)
}

/// Stream `reader` into `path` atomically, returning the bytes written
///
/// The content never sits in memory as a whole, so this suits downloads of
/// any size.
pub async fn write_atomic_from<R>(path: &Path, reader: R) -> Result<u64>
where
    R: AsyncRead,
{
    let parent = parent_dir(path)?;
    tokio::fs::create_dir_all(&parent)
        .await
        .map_err(|e| Error::file_system(parent.clone(), "create parent directory", e))?;

    let temp_path = temp_path_in(&parent);
    let mut reader = std::pin::pin!(reader);

    let result = async {
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::file_system(&temp_path, "create temporary file", e))?;
        let copied = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| Error::file_system(&temp_path, "copy into temporary file", e))?;
        file.sync_all()
            .await
            .map_err(|e| Error::file_system(&temp_path, "sync temporary file", e))?;
        Ok::<_, Error>(copied)
    }
    .await;

    let copied = match result {
        Ok(copied) => copied,
        Err(e) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
    };

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(Error::file_system(path.to_path_buf(), "atomic rename", e));
    }
    Ok(copied)
}

/// Temporary files live next to their target so the rename stays atomic
fn temp_path_in(parent: &Path) -> PathBuf {
    parent.join(format!(".{}.tmp", Uuid::new_v4()))
}

fn with_temp_file<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File, &Path) -> Result<()>,
{
    let parent = parent_dir(path)?;

    fs::create_dir_all(&parent)
        .map_err(|e| Error::file_system(parent.clone(), "create parent directory", e))?;

    let temp_path = temp_path_in(&parent);

    let result = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::file_system(&temp_path, "create temporary file", e))?;

        fill(&mut file, &temp_path)?;

        file.sync_all()
            .map_err(|e| Error::file_system(&temp_path, "sync temporary file", e))?;

        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::file_system(path.to_path_buf(), "atomic rename", e)
    })?;

    Ok(())
}

fn parent_dir(path: &Path) -> Result<PathBuf> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(PathBuf::from(".")),
        Some(parent) => Ok(parent.to_path_buf()),
        None => Err(Error::configuration(format!(
            "invalid file path '{}': no parent directory",
            path.display()
        ))),
    }
}
