//! # Path Classifier Module
//!
//! Decides, per discovered file, whether it is a texture the encoder should
//! transcode or an asset that is copied verbatim, and which block format a
//! texture is compressed to.
//!
//! ## Classification
//! | input | result |
//! |-------|--------|
//! | not a regular file | `CopyOnly(NotAFile)` |
//! | `.ico` extension | `CopyOnly(IconFormat)` |
//! | fails to decode as an image | `Unreadable` (copied, not an error) |
//! | decodes | `Texture(..)` |
//!
//! ## Format table
//! | target | normal map | 1 channel | otherwise |
//! |--------|-----------|-----------|-----------|
//! | ios | any | PVRTC1_4 | PVRTC1_4 |
//! | android | any | ETC2_RGBA | ETC2_RGBA |
//! | web | any | BC3 | BC3 |
//! | desktop | yes | BC5 | BC5 |
//! | desktop | no | BC4 | BC7 |
//! | legacy-desktop | yes | BC3 | BC3 |
//! | legacy-desktop | no | BC4 | BC3 |

use crate::config::{Target, DEFAULT_NORMAL_IDENTIFIER};
use crate::file_manager::FileManager;
use image::{ColorType, DynamicImage, ImageFormat};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Block-compressed formats, spelled the way the encoder's `-fd` flag expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Pvrtc1_4,
    Etc2Rgba,
    Bc3,
    Bc4,
    Bc5,
    Bc7,
}

impl TextureFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextureFormat::Pvrtc1_4 => "PVRTC1_4",
            TextureFormat::Etc2Rgba => "ETC2_RGBA",
            TextureFormat::Bc3 => "BC3",
            TextureFormat::Bc4 => "BC4",
            TextureFormat::Bc5 => "BC5",
            TextureFormat::Bc7 => "BC7",
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a file is copied without attempting to decode it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyReason {
    NotAFile,
    IconFormat,
}

/// A decoded image ready for transcoding
#[derive(Debug, Clone)]
pub struct TextureCandidate {
    pub is_normal_map: bool,
    /// 1, 3 or 4
    pub channels: u8,
    /// Container format detected from the file contents
    pub source_format: Option<ImageFormat>,
    pub image: DynamicImage,
}

impl TextureCandidate {
    /// Whether the encoder cannot read this container directly and needs a PNG intermediate
    pub fn needs_intermediate(&self) -> bool {
        matches!(
            self.source_format,
            Some(ImageFormat::Jpeg) | Some(ImageFormat::WebP) | Some(ImageFormat::Gif)
        )
    }
}

/// Result of classifying one file
#[derive(Debug)]
pub enum Classification {
    Texture(TextureCandidate),
    CopyOnly(CopyReason),
    Unreadable,
}

/// Cheap pre-check that needs no decoding
pub fn precheck(path: &Path) -> Option<CopyReason> {
    if !path.is_file() {
        Some(CopyReason::NotAFile)
    } else if FileManager::is_icon(path) {
        Some(CopyReason::IconFormat)
    } else {
        None
    }
}

/// Image format recognised from the file's header or extension, without decoding.
///
/// `None` for anything that cannot be a texture: not a file, an icon, or
/// a file whose contents and extension match no supported image format.
pub fn guess_format(path: &Path) -> Option<ImageFormat> {
    if precheck(path).is_some() {
        return None;
    }

    image::io::Reader::open(path)
        .and_then(|r| r.with_guessed_format())
        .ok()
        .and_then(|r| r.format())
}

/// Classify a file, decoding it to confirm it is an image
pub fn classify(path: &Path, normal_identifiers: &[String]) -> Classification {
    if let Some(reason) = precheck(path) {
        return Classification::CopyOnly(reason);
    }

    let reader = match image::io::Reader::open(path).and_then(|r| r.with_guessed_format()) {
        Ok(reader) => reader,
        Err(e) => {
            debug!("Cannot open {} as an image: {}", path.display(), e);
            return Classification::Unreadable;
        }
    };
    let source_format = reader.format();

    match reader.decode() {
        Ok(image) => Classification::Texture(TextureCandidate {
            is_normal_map: is_normal_map(path, normal_identifiers),
            channels: channel_hint(image.color()),
            source_format,
            image,
        }),
        Err(e) => {
            debug!("Not an image, will copy: {} ({})", path.display(), e);
            Classification::Unreadable
        }
    }
}

/// Case-insensitive substring match of the file name against the identifiers
pub fn is_normal_map(path: &Path, identifiers: &[String]) -> bool {
    let file_name = match path.file_name() {
        Some(name) => name.to_string_lossy().to_lowercase(),
        None => return false,
    };

    if identifiers.is_empty() {
        return file_name.contains(DEFAULT_NORMAL_IDENTIFIER);
    }

    identifiers
        .iter()
        .any(|identifier| file_name.contains(&identifier.to_lowercase()))
}

/// Channel count the format table keys on
pub fn channel_hint(color: ColorType) -> u8 {
    match color {
        ColorType::L8 | ColorType::L16 => 1,
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => 3,
        _ => 4,
    }
}

/// Block format for a texture on the given target
pub fn select_format(target: Target, is_normal_map: bool, channels: u8) -> TextureFormat {
    match target {
        Target::Ios => TextureFormat::Pvrtc1_4,
        Target::Android => TextureFormat::Etc2Rgba,
        Target::Web => TextureFormat::Bc3,
        Target::Desktop | Target::LegacyDesktop => {
            let legacy = target == Target::LegacyDesktop;
            if is_normal_map {
                if legacy {
                    TextureFormat::Bc3
                } else {
                    TextureFormat::Bc5
                }
            } else if channels == 1 {
                TextureFormat::Bc4
            } else if legacy {
                TextureFormat::Bc3
            } else {
                TextureFormat::Bc7
            }
        }
    }
}
