use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How a line is split into fields when reading.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Delimiter {
    /// One or more whitespace characters.
    #[default]
    Whitespace,
    /// Any of the given characters, taken literally. Whitespace still splits.
    Literal(String),
    /// A regular expression. Whitespace still splits.
    Regex(String),
}

/// Where the column names live and where data begins.
///
/// Row indices count only lines that hold at least one token, so blank lines
/// never shift them while comment lines do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Row holding the column names. `None`, or a value equal to
    /// `data_start`, names the columns by position instead.
    pub header_row: Option<usize>,
    pub data_start: usize,
    /// A first token equal to this marks the whole line as a comment.
    pub comment: Option<String>,
    pub delimiter: Delimiter,
    /// Reject tables whose header repeats a name.
    pub unique_header: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            header_row: Some(0),
            data_start: 1,
            comment: None,
            delimiter: Delimiter::Whitespace,
            unique_header: false,
        }
    }
}

impl ParseConfig {
    /// Column names are taken from a line of the file rather than generated.
    pub fn has_header(&self) -> bool {
        matches!(self.header_row, Some(row) if row != self.data_start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Overwrite => write!(f, "w"),
            WriteMode::Append => write!(f, "a+"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    pub delimiter: String,
    /// Written in front of the header line.
    pub header_prefix: String,
    pub mode: WriteMode,
    /// In overwrite mode, refuse to touch a file that already exists.
    pub overwrite_guard: bool,
    pub unique_header: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        WriteConfig {
            delimiter: " ".to_string(),
            header_prefix: "# ".to_string(),
            mode: WriteMode::Overwrite,
            overwrite_guard: true,
            unique_header: false,
        }
    }
}

/// A saved pair of read and write settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub parse: ParseConfig,
    pub write: WriteConfig,
}

pub fn parse_file(path: &Path) -> Result<Profile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    parse_profile(&raw).with_context(|| format!("Failed to parse profile {}", path.display()))
}

pub fn parse_profile(input: &str) -> Result<Profile> {
    Ok(serde_json::from_str(input)?)
}
