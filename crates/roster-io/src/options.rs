use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field delimiter byte (`,` by default).
    pub delimiter: u8,
    /// How to decode raw CSV bytes into text fields.
    pub encoding: TextEncoding,
    /// Strip surrounding whitespace from every field before parsing.
    ///
    /// Off by default: source files are expected to be tightly formatted, and a padded
    /// identifier or date is reported as malformed.
    pub trim_fields: bool,
    /// Honor RFC 4180 double-quoted fields.
    ///
    /// Off by default, so every physical line is split on the delimiter and a stray `"`
    /// only spoils its own line. With quoting on, an unterminated quote swallows the
    /// lines after it.
    pub quoting: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: TextEncoding::Auto,
            trim_fields: false,
            quoting: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// Attempt to decode as UTF-8; if a field contains invalid UTF-8, fall back to Windows-1252.
    ///
    /// Spreadsheet exports on Windows frequently produce CP-1252 text.
    #[default]
    Auto,
    /// Decode as UTF-8 and reject lines with invalid byte sequences.
    Utf8,
    /// Decode as Windows-1252 (aka CP-1252).
    Windows1252,
}
