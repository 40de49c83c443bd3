//! # Path Resolution Module
//!
//! Maps every discovered source file to the destination paths its worker
//! writes to. The mapping is a pure function of the source path and the
//! two roots, so computing it twice always yields the same path.
//!
//! ```text
//! Source: <root>/PostBuildCopy/shaders/basic.vert
//! Copy:   <root>/bin/Debug/Game/shaders/basic.vert
//!
//! Source: <root>/Assets/textures/wall.png
//! KTX2:   <root>/bin/Debug/Game/Assets/textures/wall.ktx2
//! ```

use crate::file_manager::POST_BUILD_COPY_DIRS;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Extension of the compressed texture container
pub const CONTAINER_EXTENSION: &str = "ktx2";

/// Computes destination paths for a source tree
pub struct PathResolver;

impl PathResolver {
    /// Destination for `input_path`, optionally replacing its extension.
    ///
    /// The source root prefix is replaced by the destination root, then every
    /// post-build copy segment is dropped from the whole result, the
    /// destination root included. Inputs outside the source root keep their
    /// full path below the destination root.
    pub fn output_path(
        input_path: &Path,
        source_root: &Path,
        destination_root: &Path,
        extension_override: Option<&str>,
    ) -> PathBuf {
        let relative = input_path.strip_prefix(source_root).unwrap_or(input_path);
        let mut joined = destination_root.to_path_buf();
        joined.extend(relative.components().filter(|c| matches!(c, Component::Normal(_))));

        let mut output: PathBuf = joined
            .components()
            .filter(|c| !matches!(c, Component::Normal(segment) if Self::is_post_build_copy(segment)))
            .collect();

        if let Some(extension) = extension_override {
            output.set_extension(extension);
        }

        output
    }

    fn is_post_build_copy(segment: &OsStr) -> bool {
        POST_BUILD_COPY_DIRS.iter().any(|dir| segment == OsStr::new(dir))
    }
}

/// One file to build, created at discovery and consumed by exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTask {
    /// Absolute source path
    pub source: PathBuf,
    /// Source path relative to the project root, used for display and logs
    pub name: String,
    /// Destination when the file is transcoded
    pub texture_destination: PathBuf,
    /// Destination when the file is copied verbatim
    pub copy_destination: PathBuf,
}

impl AssetTask {
    pub fn new(source: PathBuf, source_root: &Path, destination_root: &Path) -> Self {
        let name = source
            .strip_prefix(source_root)
            .unwrap_or(&source)
            .display()
            .to_string();
        let texture_destination =
            PathResolver::output_path(&source, source_root, destination_root, Some(CONTAINER_EXTENSION));
        let copy_destination = PathResolver::output_path(&source, source_root, destination_root, None);

        Self {
            source,
            name,
            texture_destination,
            copy_destination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_build_copy_segments_stripped() {
        let root = Path::new("/proj");
        let dest = Path::new("/proj/bin/Debug/proj");

        for segment in POST_BUILD_COPY_DIRS {
            let input = root.join(segment).join("shaders/basic.vert");
            let output = PathResolver::output_path(&input, root, dest, None);
            assert_eq!(output, PathBuf::from("/proj/bin/Debug/proj/shaders/basic.vert"));
            assert!(output.components().all(|c| c.as_os_str() != segment));
        }
    }

    #[test]
    fn test_post_build_copy_segment_in_roots_stripped() {
        let root = Path::new("/w/PostBuildCopy");
        let dest = Path::new("/w/PostBuildCopy/bin/Debug/PostBuildCopy");
        let input = Path::new("/w/PostBuildCopy/Assets/x.txt");

        let output = PathResolver::output_path(input, root, dest, None);
        assert_eq!(output, PathBuf::from("/w/bin/Debug/Assets/x.txt"));
        for segment in POST_BUILD_COPY_DIRS {
            assert!(output.components().all(|c| c.as_os_str() != segment));
        }
    }

    #[test]
    fn test_nested_post_build_copy_segment_stripped() {
        let root = Path::new("/proj");
        let dest = Path::new("/out");
        let input = Path::new("/proj/Assets/PostBuildCopy/data/a.txt");
        assert_eq!(
            PathResolver::output_path(input, root, dest, None),
            PathBuf::from("/out/Assets/data/a.txt")
        );
    }

    #[test]
    fn test_extension_override() {
        let root = Path::new("/proj");
        let dest = Path::new("/out");
        let input = Path::new("/proj/Assets/textures/wall.diffuse.png");
        assert_eq!(
            PathResolver::output_path(input, root, dest, Some(CONTAINER_EXTENSION)),
            PathBuf::from("/out/Assets/textures/wall.diffuse.ktx2")
        );
    }

    #[test]
    fn test_output_path_is_idempotent() {
        let root = Path::new("/proj");
        let dest = Path::new("/proj/bin/Release/Game");
        let input = Path::new("/proj/PostBuildCopy_windows/bin/x.dll");

        let first = PathResolver::output_path(input, root, dest, None);
        let second = PathResolver::output_path(input, root, dest, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_asset_task_paths() {
        let root = Path::new("/proj");
        let dest = Path::new("/proj/bin/Debug/Game");
        let task = AssetTask::new(PathBuf::from("/proj/Assets/ui/button.png"), root, dest);

        assert_eq!(task.name, Path::new("Assets/ui/button.png").display().to_string());
        assert_eq!(task.texture_destination, PathBuf::from("/proj/bin/Debug/Game/Assets/ui/button.ktx2"));
        assert_eq!(task.copy_destination, PathBuf::from("/proj/bin/Debug/Game/Assets/ui/button.png"));
    }
}
