//! Path helpers: Unicode normalization, root-relative paths and file URLs.
//!
//! macOS stores file names in NFD (decomposed) form while Windows and Linux
//! usually use NFC, so the same visible name can have two byte
//! representations:
//!
//! - NFC: `café.jpg` - 'é' is U+00E9 (single code point)
//! - NFD: `café.jpg` - 'e' U+0065 + combining acute accent U+0301
//!
//! Placing both into one output tree would make them land on the same
//! destination on a normalizing filesystem, so destination keys are compared
//! in NFC form.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use uniquify::scanner::path_utils::destination_key;
//!
//! let nfc = destination_key(Path::new("trip/café.jpg"), false);
//! let nfd = destination_key(Path::new("trip/cafe\u{0301}.jpg"), false);
//! assert_eq!(nfc, nfd);
//! ```

use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Comparison key for a destination path.
///
/// Components are NFC-normalized and joined with `/` so the key is the same on
/// every platform. With `case_insensitive` the key is also lowercased, which
/// models case-folding filesystems (default macOS and Windows volumes).
#[must_use]
pub fn destination_key(relative: &Path, case_insensitive: bool) -> String {
    let joined = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(normalize_path_str(&part.to_string_lossy())),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    if case_insensitive {
        joined.to_lowercase()
    } else {
        joined
    }
}

/// Path of `path` relative to `root`.
///
/// Returns `None` when `path` is not under `root`.
#[must_use]
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// `file://` URL for an absolute path, used as the report's link column.
///
/// Characters outside the unreserved set are percent-encoded byte by byte.
#[must_use]
pub fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut url = String::with_capacity(raw.len() + 8);
    url.push_str("file://");
    if !raw.starts_with('/') {
        url.push('/');
    }
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' | b':' => {
                url.push(byte as char);
            }
            _ => url.push_str(&format!("%{byte:02X}")),
        }
    }
    url
}
