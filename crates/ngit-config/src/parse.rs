//! INI-style config file parsing, flattened to `"section.key"` pairs.

use std::collections::HashMap;

use crate::ConfigError;

/// Key fragments that may never appear in a flattened key. Inherited from
/// environments where config keys index into prototype-carrying maps; an
/// ordinary hash map is immune, but the reject keeps hostile files out.
const FORBIDDEN_FRAGMENTS: &[&str] = &["__proto__", "constructor", "prototype"];

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Parse config bytes into flattened `"section.key" -> value` entries.
///
/// Later occurrences of a key overwrite earlier ones, matching git's
/// last-one-wins reading for single-valued options.
pub fn parse_flat(
    input: &[u8],
    filename: &str,
) -> Result<HashMap<String, String>, ConfigError> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);

    let mut entries = HashMap::new();
    let mut section: Option<String> = None;

    for (line_no, raw_line) in input.split(|&b| b == b'\n').enumerate() {
        let line_no = line_no + 1;
        let line = trim_bytes(strip_cr(raw_line));

        if line.is_empty() || line[0] == b'#' || line[0] == b';' {
            continue;
        }

        if line[0] == b'[' {
            section = Some(parse_section_header(line, filename, line_no)?);
            continue;
        }

        let section = section.as_deref().ok_or_else(|| ConfigError::Parse {
            file: filename.to_string(),
            line: line_no,
            message: "key outside of any section".into(),
        })?;

        let (key, value) = parse_key_value(line, filename, line_no)?;
        let flat = format!("{section}.{key}");
        if FORBIDDEN_FRAGMENTS.iter().any(|f| flat.contains(f)) {
            return Err(ConfigError::ForbiddenKey(flat));
        }
        entries.insert(flat, value);
    }

    Ok(entries)
}

/// Parse `[section]` or `[section "subsection"]`, returning the flattened
/// section prefix (`section` or `section.subsection`).
fn parse_section_header(
    line: &[u8],
    filename: &str,
    line_no: usize,
) -> Result<String, ConfigError> {
    let close = line
        .iter()
        .position(|&b| b == b']')
        .ok_or_else(|| ConfigError::Parse {
            file: filename.to_string(),
            line: line_no,
            message: "unterminated section header".into(),
        })?;
    let body = trim_bytes(&line[1..close]);
    if body.is_empty() {
        return Err(ConfigError::Parse {
            file: filename.to_string(),
            line: line_no,
            message: "empty section name".into(),
        });
    }

    // Optional quoted subsection: [section "sub"]
    if let Some(quote) = body.iter().position(|&b| b == b'"') {
        let name = trim_bytes(&body[..quote]);
        let rest = &body[quote + 1..];
        let end_quote = rest
            .iter()
            .position(|&b| b == b'"')
            .ok_or_else(|| ConfigError::Parse {
                file: filename.to_string(),
                line: line_no,
                message: "unterminated subsection quote".into(),
            })?;
        let sub = &rest[..end_quote];
        Ok(format!(
            "{}.{}",
            lossy_lower(name),
            String::from_utf8_lossy(sub)
        ))
    } else {
        Ok(lossy_lower(body))
    }
}

/// Parse a `key = value` line. A key without `=` reads as boolean `true`.
fn parse_key_value(
    line: &[u8],
    filename: &str,
    line_no: usize,
) -> Result<(String, String), ConfigError> {
    let (key_bytes, value_bytes) = match line.iter().position(|&b| b == b'=') {
        Some(eq) => (trim_bytes(&line[..eq]), trim_bytes(&line[eq + 1..])),
        None => (line, b"true".as_slice()),
    };

    if key_bytes.is_empty()
        || !key_bytes
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return Err(ConfigError::Parse {
            file: filename.to_string(),
            line: line_no,
            message: format!("invalid key name: {:?}", String::from_utf8_lossy(key_bytes)),
        });
    }

    Ok((lossy_lower(key_bytes), parse_value(value_bytes)))
}

/// Strip surrounding quotes and unquoted trailing comments from a value.
fn parse_value(value: &[u8]) -> String {
    let mut out = Vec::with_capacity(value.len());
    let mut in_quote = false;
    for &b in value {
        match b {
            b'"' => in_quote = !in_quote,
            b'#' | b';' if !in_quote => break,
            _ => out.push(b),
        }
    }
    String::from_utf8_lossy(trim_bytes(&out)).into_owned()
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_bytes(s: &[u8]) -> &[u8] {
    let start = s
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(s.len());
    let end = s
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|p| p + 1)
        .unwrap_or(start);
    &s[start..end]
}

fn lossy_lower(s: &[u8]) -> String {
    String::from_utf8_lossy(s).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> HashMap<String, String> {
        parse_flat(input, "<test>").unwrap()
    }

    #[test]
    fn simple_section() {
        let entries = parse(b"[core]\n\tbare = false\n");
        assert_eq!(entries["core.bare"], "false");
    }

    #[test]
    fn case_normalization() {
        let entries = parse(b"[CoRe]\n\tIgnoreCase = TRUE\n");
        assert_eq!(entries["core.ignorecase"], "TRUE");
    }

    #[test]
    fn subsection() {
        let entries = parse(b"[remote \"origin\"]\n\turl = https://example.com\n");
        assert_eq!(entries["remote.origin.url"], "https://example.com");
    }

    #[test]
    fn comments_and_blank_lines() {
        let entries = parse(b"# comment\n; also comment\n\n[core]\n\tkey = value # tail\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["core.key"], "value");
    }

    #[test]
    fn quoted_value_keeps_hash() {
        let entries = parse(b"[core]\n\tkey = \"value # not a comment\"\n");
        assert_eq!(entries["core.key"], "value # not a comment");
    }

    #[test]
    fn boolean_key_without_value() {
        let entries = parse(b"[core]\n\tbare\n");
        assert_eq!(entries["core.bare"], "true");
    }

    #[test]
    fn crlf_input() {
        let entries = parse(b"[core]\r\n\tautocrlf = true\r\n");
        assert_eq!(entries["core.autocrlf"], "true");
    }

    #[test]
    fn bom_skipped() {
        let mut input = Vec::from(UTF8_BOM);
        input.extend_from_slice(b"[core]\nkey = v\n");
        assert_eq!(parse(&input)["core.key"], "v");
    }

    #[test]
    fn last_value_wins() {
        let entries = parse(b"[a]\nk = 1\n[a]\nk = 2\n");
        assert_eq!(entries["a.k"], "2");
    }

    #[test]
    fn key_outside_section_errors() {
        assert!(parse_flat(b"key = value\n", "<test>").is_err());
    }

    #[test]
    fn invalid_key_chars_error() {
        assert!(parse_flat(b"[a]\nbad key = v\n", "<test>").is_err());
    }

    #[test]
    fn unterminated_section_errors() {
        assert!(parse_flat(b"[core\nkey = v\n", "<test>").is_err());
    }
}
