//! # File Management Module
//!
//! Filesystem operations used by the scheduler and the workers.
//!
//! ## Responsibilities:
//! - Resolve the project's search roots (`PostBuildCopy*/` and `Assets/`)
//! - Recursive discovery of every file under those roots
//! - Icon detection (icons are always copied, never transcoded)
//! - Modification-time lookup for the incrementality check
//! - Verbatim copy with parent-directory creation
//!
//! ## Search roots:
//! | platform | roots |
//! |----------|-------|
//! | Windows  | `PostBuildCopy_windows/`, `Assets/` |
//! | other    | `PostBuildCopy/`, `Assets/` |
//!
//! Roots that do not exist are skipped. Discovery order is not significant.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Path segments stripped when mapping a source path to its destination
pub const POST_BUILD_COPY_DIRS: [&str; 2] = ["PostBuildCopy", "PostBuildCopy_windows"];

/// General assets directory under the project root
pub const ASSETS_DIR: &str = "Assets";

/// Manages file discovery and file operations
pub struct FileManager;

impl FileManager {
    /// Name of the platform-specific post-build copy directory
    pub fn post_build_copy_dir() -> &'static str {
        if cfg!(windows) {
            "PostBuildCopy_windows"
        } else {
            "PostBuildCopy"
        }
    }

    /// Directories searched for assets, in submission order
    pub fn search_roots(source_root: &Path) -> Vec<PathBuf> {
        vec![
            source_root.join(Self::post_build_copy_dir()),
            source_root.join(ASSETS_DIR),
        ]
    }

    /// Find every file below the project's search roots.
    ///
    /// Symbolic links are followed, so linked files and directories ship like
    /// regular ones; link loops are reported and skipped.
    pub fn find_asset_files(source_root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for root in Self::search_roots(source_root) {
            if !root.is_dir() {
                debug!("Search root not present, skipping: {}", root.display());
                continue;
            }

            for entry in WalkDir::new(&root).follow_links(true) {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        files.push(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Failed to read directory entry under {}: {}", root.display(), e),
                }
            }
        }

        files
    }

    /// Check if a file is an icon (`.ico`, case-insensitive)
    pub fn is_icon(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("ico"))
            .unwrap_or(false)
    }

    /// Modification time of a file
    pub fn modified_time(path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    /// Create the parent directories of `path` if necessary
    pub fn ensure_parent_dirs(path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Copy `source` to `destination` byte for byte, creating parent directories.
    ///
    /// `std::fs::copy` delegates to the platform's bulk copy primitive
    /// (`copy_file_range`, `CopyFileEx`, `fcopyfile`) where available.
    pub fn copy_file(source: &Path, destination: &Path) -> io::Result<u64> {
        Self::ensure_parent_dirs(destination)?;
        std::fs::copy(source, destination)
    }
}
