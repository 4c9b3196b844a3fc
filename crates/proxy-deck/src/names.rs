//! Filesystem-safe names for cards and deck bundles

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Characters that are replaced in file names (runs collapse to one `_`)
const RESERVED: &[char] = &['<', '>', ':', '"', '\'', '/', '\\', '|', '?', '*', ' '];

/// Make a name safe to use as a file name.
///
/// Accents are stripped via NFKD decomposition, then every run of reserved
/// characters or spaces becomes a single underscore.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for ch in name.nfkd().filter(|c| !is_combining_mark(*c)) {
        if RESERVED.contains(&ch) {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }

    out
}
