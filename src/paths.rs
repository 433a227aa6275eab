//! On-disk layout and single-instance guard.
//!
//! Everything lives under one root: a `system` directory for the queue
//! file, config, and lock, plus per-site destination folders under
//! `Downloads`: videos, playlist videos, pictures, and catalog images each
//! get their own folder.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::info;

/// Resolved locations for every file and directory the tool touches.
#[derive(Debug, Clone)]
pub struct Layout {
    pub root: PathBuf,
    pub system_dir: PathBuf,
    pub queue_file: PathBuf,
    pub config_file: PathBuf,
    pub lock_file: PathBuf,
    pub downloads: PathBuf,
    pub videos: PathBuf,
    pub playlists: PathBuf,
    pub pictures: PathBuf,
    pub catalog: PathBuf,
}

impl Layout {
    /// Derives the full layout from a root directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let system_dir = root.join("system");
        let downloads = root.join("Downloads");
        let videos = downloads.join("Videos");
        Self {
            queue_file: system_dir.join("download-list.txt"),
            config_file: system_dir.join("config.toml"),
            lock_file: system_dir.join("linkstash.lock"),
            playlists: videos.join("Playlist Videos"),
            pictures: downloads.join("Pictures"),
            catalog: downloads.join("Pictures").join("Wildberries"),
            system_dir,
            downloads,
            videos,
            root,
        }
    }

    /// Creates the system directory and every download destination.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when a directory cannot be created;
    /// this is fatal setup, not a per-URL outcome.
    pub fn ensure_directories(&self) -> io::Result<()> {
        for dir in [
            &self.system_dir,
            &self.videos,
            &self.playlists,
            &self.pictures,
            &self.catalog,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Advisory lock held for the process lifetime; dropping releases it.
#[derive(Debug)]
pub struct InstanceLock {
    _file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Tries to become the single running instance.
    ///
    /// Returns `Ok(None)` when another instance already holds the lock.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the lock file itself cannot be
    /// created.
    pub fn acquire(path: &Path) -> io::Result<Option<Self>> {
        let file = File::create(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                info!(lock = %path.display(), "instance lock acquired");
                Ok(Some(Self {
                    _file: file,
                    path: path.to_path_buf(),
                }))
            }
            Err(_) => Ok(None),
        }
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Removal is best effort; the lock itself is released with the file.
        let _ = fs::remove_file(&self.path);
    }
}
