//! Local file names for downloads given without an explicit destination.

mod path;
mod sanitize;

pub use path::last_path_segment;
pub use sanitize::sanitize_filename;

use std::path::{Path, PathBuf};

/// Used when the URL path has no usable last segment.
pub const FALLBACK_FILENAME: &str = "download.bin";

/// Derives a safe file name from the last segment of `url`'s path.
pub fn derive_filename(url: &str) -> String {
    last_path_segment(url)
        .map(|s| sanitize_filename(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Destination for `url` inside `dir`.
pub fn default_destination(url: &str, dir: &Path) -> PathBuf {
    dir.join(derive_filename(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_comes_from_last_segment() {
        assert_eq!(derive_filename("http://mirror.example/pub/big.tar.xz"), "big.tar.xz");
        assert_eq!(derive_filename("http://mirror.example/dir/file.bin?x=1#frag"), "file.bin");
    }

    #[test]
    fn unusable_paths_fall_back() {
        assert_eq!(derive_filename("http://mirror.example/"), FALLBACK_FILENAME);
        assert_eq!(derive_filename("not a url"), FALLBACK_FILENAME);
        assert_eq!(derive_filename("http://mirror.example/..."), FALLBACK_FILENAME);
    }

    #[test]
    fn destination_joins_dir() {
        assert_eq!(
            default_destination("http://h/a.iso", Path::new("/srv")),
            PathBuf::from("/srv/a.iso")
        );
    }
}
