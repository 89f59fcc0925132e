//! Content filtering between the working tree and the object store.
//!
//! The only filter is line-ending normalization, applied when the caller
//! asks for filters, `core.autocrlf` is `true` or `input`, and the content
//! does not look binary. Binary detection is a heuristic: a known-binary
//! file extension, or a NUL byte in the first kilobyte.

use std::borrow::Cow;

use ngit_config::Config;

/// How many leading bytes to sniff for NULs.
const BINARY_SNIFF_LEN: usize = 1024;

/// Extensions that are binary regardless of content.
const BINARY_EXTENSIONS: &[&str] = &[
    "7z", "avi", "bin", "bmp", "class", "dll", "dylib", "exe", "flac", "gif", "gz", "ico",
    "jar", "jpeg", "jpg", "mov", "mp3", "mp4", "o", "ogg", "pdf", "png", "so", "tar", "tgz",
    "ttf", "wasm", "webp", "woff", "woff2", "zip",
];

/// Heuristic binary check: extension list first, then a NUL sniff over the
/// first kilobyte.
pub fn is_binary(filename: Option<&str>, data: &[u8]) -> bool {
    if let Some(name) = filename {
        if let Some(ext) = name.rsplit('.').next() {
            let ext = ext.to_ascii_lowercase();
            if name.contains('.') && BINARY_EXTENSIONS.contains(&ext.as_str()) {
                return true;
            }
        }
    }
    let sniff = &data[..data.len().min(BINARY_SNIFF_LEN)];
    sniff.contains(&0)
}

/// Replace `\r\n` and stray `\r` with `\n`.
///
/// Returns `None` when the content contains no `\r` at all, so unfiltered
/// content is passed through without copying.
pub fn normalize_eol(data: &[u8]) -> Option<Vec<u8>> {
    if !data.contains(&b'\r') {
        return None;
    }

    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\r' {
            out.push(b'\n');
            if i + 1 < data.len() && data[i + 1] == b'\n' {
                i += 1;
            }
        } else {
            out.push(data[i]);
        }
        i += 1;
    }
    Some(out)
}

/// Apply the filter pipeline to content headed for the object store.
pub fn filter_content<'a>(
    data: &'a [u8],
    config: &Config,
    filename: Option<&str>,
    apply_filters: bool,
) -> Cow<'a, [u8]> {
    if apply_filters
        && config.auto_crlf().normalizes_on_write()
        && !is_binary(filename, data)
    {
        if let Some(normalized) = normalize_eol(data) {
            return Cow::Owned(normalized);
        }
    }
    Cow::Borrowed(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn autocrlf_config(value: &str) -> Config {
        Config::from_bytes(
            format!("[core]\n\tautocrlf = {value}\n").as_bytes(),
            "<test>",
        )
        .unwrap()
    }

    #[test]
    fn nul_sniffing() {
        assert!(is_binary(None, b"has\x00nul"));
        assert!(!is_binary(None, b"plain text"));
        assert!(!is_binary(None, b""));
    }

    #[test]
    fn nul_beyond_first_kilobyte_is_not_sniffed() {
        let mut data = vec![b'a'; 2048];
        data[1500] = 0;
        assert!(!is_binary(None, &data));
        data[512] = 0;
        assert!(is_binary(None, &data));
    }

    #[test]
    fn extension_heuristic() {
        assert!(is_binary(Some("logo.png"), b"text content"));
        assert!(is_binary(Some("archive.tar"), b""));
        assert!(is_binary(Some("UPPER.PNG"), b""));
        assert!(!is_binary(Some("notes.txt"), b"text"));
        assert!(!is_binary(Some("png"), b"a file literally named png"));
    }

    #[test]
    fn eol_normalization() {
        assert_eq!(
            normalize_eol(b"a\r\nb\r\n").as_deref(),
            Some(b"a\nb\n".as_slice())
        );
        // Stray CR also becomes LF.
        assert_eq!(
            normalize_eol(b"a\rb\r\nc").as_deref(),
            Some(b"a\nb\nc".as_slice())
        );
        assert_eq!(normalize_eol(b"a\nb\n"), None);
    }

    #[test]
    fn filter_requires_all_three_conditions() {
        let crlf = b"line\r\n";

        // autocrlf=true + filters on + text: normalized.
        let out = filter_content(crlf, &autocrlf_config("true"), Some("a.txt"), true);
        assert_eq!(&*out, b"line\n");

        // autocrlf=input behaves the same on the way in.
        let out = filter_content(crlf, &autocrlf_config("input"), Some("a.txt"), true);
        assert_eq!(&*out, b"line\n");

        // Filters disabled: untouched.
        let out = filter_content(crlf, &autocrlf_config("true"), Some("a.txt"), false);
        assert_eq!(&*out, crlf.as_slice());

        // autocrlf off: untouched.
        let out = filter_content(crlf, &autocrlf_config("false"), Some("a.txt"), true);
        assert_eq!(&*out, crlf.as_slice());

        // Binary by extension: untouched.
        let out = filter_content(crlf, &autocrlf_config("true"), Some("a.png"), true);
        assert_eq!(&*out, crlf.as_slice());

        // Binary by content: untouched.
        let nul = b"a\r\n\x00";
        let out = filter_content(nul, &autocrlf_config("true"), Some("a.txt"), true);
        assert_eq!(&*out, nul.as_slice());
    }

    #[test]
    fn clean_content_borrows() {
        let data = b"already clean\n";
        let out = filter_content(data, &autocrlf_config("true"), Some("a.txt"), true);
        assert!(matches!(out, Cow::Borrowed(_)));
    }
}
