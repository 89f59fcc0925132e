//! Typed conversions for recognized option values.

use crate::ConfigError;

/// The `core.autocrlf` modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoCrlf {
    /// No conversion (unset or `false`).
    #[default]
    Off,
    /// `true`: normalize on the way in.
    On,
    /// `input`: normalize on the way in, never on the way out.
    Input,
}

impl AutoCrlf {
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("input") => Self::Input,
            Some(v) => match parse_bool(v) {
                Ok(true) => Self::On,
                _ => Self::Off,
            },
            None => Self::Off,
        }
    }

    /// Whether hashing/writing should normalize line endings.
    pub fn normalizes_on_write(&self) -> bool {
        matches!(self, Self::On | Self::Input)
    }
}

/// Parse a boolean value with git's rules: `true`/`yes`/`on`/`1` and
/// `false`/`no`/`off`/`0` (case-insensitive); the empty string is false.
pub fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(false);
    }
    match v.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => match v.parse::<i64>() {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(_) => Err(ConfigError::InvalidBool(v.to_string())),
        },
    }
}
