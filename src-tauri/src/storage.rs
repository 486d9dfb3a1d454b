//! File store: dated folders of sequentially numbered PNGs.
//!
//! Layout is `<base>/<MM-DD-YYYY>/<n>.png`, where `n` is the first free
//! number starting at 1. One writer per folder is assumed; the file is still
//! opened with `create_new` so a lost race moves on to the next number
//! instead of overwriting.

use crate::capture::Bitmap;
use chrono::{Local, NaiveDate};
use image::ImageFormat;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/// `chrono` pattern for the per-day folder name.
pub const DATE_FOLDER_FORMAT: &str = "%m-%d-%Y";

/// `~/Desktop/Screenshots`.
pub fn default_base_folder() -> Result<PathBuf, StorageError> {
    dirs::home_dir()
        .map(|home| home.join("Desktop").join("Screenshots"))
        .ok_or(StorageError::NoHomeDirectory)
}

/// The override when set, else [`default_base_folder`].
pub fn resolve_base_folder(base_folder: Option<&Path>) -> Result<PathBuf, StorageError> {
    match base_folder {
        Some(path) => Ok(path.to_path_buf()),
        None => default_base_folder(),
    }
}

/// Resolves the base folder and creates it if needed.
pub fn ensure_base_folder(base_folder: Option<&Path>) -> Result<PathBuf, StorageError> {
    let base = resolve_base_folder(base_folder)?;
    create_dir(&base)?;
    Ok(base)
}

pub fn date_folder(base: &Path, date: NaiveDate) -> PathBuf {
    base.join(date.format(DATE_FOLDER_FORMAT).to_string())
}

/// First `<n>.png` in `folder`, counting up from `start`, that does not
/// exist yet.
fn next_free_from(folder: &Path, start: u64) -> (u64, PathBuf) {
    let mut n = start;
    loop {
        let candidate = folder.join(format!("{}.png", n));
        if !candidate.exists() {
            return (n, candidate);
        }
        n += 1;
    }
}

/// Saves under today's folder. See [`save_screenshot_on`].
pub fn save_screenshot(bitmap: &Bitmap, base_folder: Option<&Path>) -> Result<PathBuf, StorageError> {
    save_screenshot_on(bitmap, base_folder, Local::now().date_naive())
}

/// Writes `bitmap` as a lossless PNG to the next free slot in the folder for
/// `date`, creating any missing directories.
pub fn save_screenshot_on(
    bitmap: &Bitmap,
    base_folder: Option<&Path>,
    date: NaiveDate,
) -> Result<PathBuf, StorageError> {
    let base = resolve_base_folder(base_folder)?;
    let folder = date_folder(&base, date);
    create_dir(&folder)?;

    let (mut n, mut path) = next_free_from(&folder, 1);
    let file = loop {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                (n, path) = next_free_from(&folder, n + 1);
            }
            Err(source) => return Err(StorageError::Create { path, source }),
        }
    };

    if let Err(source) = write_png(bitmap, file) {
        // Leave no truncated file behind to shadow the sequence number.
        let _ = fs::remove_file(&path);
        return Err(StorageError::Encode { path, source });
    }

    log::debug!(
        "[STORE] Wrote {}x{} PNG to {}",
        bitmap.width(),
        bitmap.height(),
        path.display()
    );
    Ok(path)
}

fn write_png(bitmap: &Bitmap, file: File) -> Result<(), image::ImageError> {
    let mut writer = BufWriter::new(file);
    bitmap.write_to(&mut writer, ImageFormat::Png)?;
    writer.into_inner().map_err(|e| image::ImageError::IoError(e.into_error()))?;
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path).map_err(|source| StorageError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("No home directory to place the default screenshots folder in")]
    NoHomeDirectory,

    #[error("Failed to create folder {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to create {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("Failed to write PNG {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}
