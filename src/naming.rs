//! Output naming: the only "wire format" the stage has.
//!
//! A derivative keeps its source's directory and stem; only the extension
//! changes, to the canonical extension of the codec that produced it:
//! - `images/test1.png` + webp → `images/test1.webp`
//! - `photo.JPEG` + mozjpeg → `photo.jpg`
//! - `archive.tar.png` + avif → `archive.tar.avif`

use std::path::{Path, PathBuf};

/// Lowercased extension of `path`, without the dot.
///
/// Returns `None` for paths without an extension (including dotfiles like
/// `.hidden`, whose name is all stem).
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// Replace the last extension of `path` with `extension`.
///
/// Paths without an extension get one appended.
pub fn replace_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension.trim_start_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of(Path::new("a/B.PNG")), Some("png".to_string()));
    }

    #[test]
    fn extension_missing() {
        assert_eq!(extension_of(Path::new("Makefile")), None);
        assert_eq!(extension_of(Path::new(".hidden")), None);
    }

    #[test]
    fn extension_takes_last_component() {
        assert_eq!(
            extension_of(Path::new("archive.tar.gz")),
            Some("gz".to_string())
        );
    }

    #[test]
    fn replace_keeps_directory_and_stem() {
        assert_eq!(
            replace_extension(Path::new("images/test1.png"), "webp"),
            PathBuf::from("images/test1.webp")
        );
    }

    #[test]
    fn replace_only_last_extension() {
        assert_eq!(
            replace_extension(Path::new("archive.tar.png"), "avif"),
            PathBuf::from("archive.tar.avif")
        );
    }

    #[test]
    fn replace_tolerates_leading_dot() {
        assert_eq!(
            replace_extension(Path::new("photo.JPEG"), ".jpg"),
            PathBuf::from("photo.jpg")
        );
    }

    #[test]
    fn replace_appends_when_missing() {
        assert_eq!(
            replace_extension(Path::new("dir/image"), "png"),
            PathBuf::from("dir/image.png")
        );
    }
}
