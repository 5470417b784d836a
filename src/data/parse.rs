use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, info};

use super::error::ReadError;
use super::{duplicate_name, Table};
use crate::config::{Delimiter, ParseConfig};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Read a column file, absorbing every failure into an empty table.
///
/// The failure is still logged by [`read`]; callers that need to know why
/// should use it directly.
pub fn readcol(path: impl AsRef<Path>, config: &ParseConfig) -> Table {
    read(path, config).unwrap_or_default()
}

/// Read a column file into a [`Table`].
///
/// Every failure is logged at `error` before it is returned.
pub fn read(path: impl AsRef<Path>, config: &ParseConfig) -> Result<Table, ReadError> {
    let path = path.as_ref();
    let file = notice(File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ReadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ReadError::Io {
            path: path.to_path_buf(),
            source,
        },
    }))?;
    info!("reading {}", path.display());
    notice(read_lines(BufReader::new(file), config, path))
}

/// Read columns from any buffered source.
pub fn read_from<R: BufRead>(reader: R, config: &ParseConfig) -> Result<Table, ReadError> {
    notice(read_lines(reader, config, Path::new("<input>")))
}

/// Parse an in-memory string (testable core).
pub fn parse_string(input: &str, config: &ParseConfig) -> Result<Table, ReadError> {
    read_from(input.as_bytes(), config)
}

fn notice<T>(result: Result<T, ReadError>) -> Result<T, ReadError> {
    if let Err(err) = &result {
        error!("{err}");
    }
    result
}

fn read_lines<R: BufRead>(reader: R, config: &ParseConfig, path: &Path) -> Result<Table, ReadError> {
    let splitter = Splitter::new(&config.delimiter)?;
    let mut builder = ColumnBuilder::new(config);

    for line in reader.lines() {
        let line = line.map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        builder.push(splitter.tokens(&line));
    }

    builder.finish(path)
}

/// Splits a line into non-empty fields.
#[derive(Debug)]
struct Splitter {
    pattern: Regex,
}

impl Splitter {
    fn new(delimiter: &Delimiter) -> Result<Self, ReadError> {
        let source = match delimiter {
            Delimiter::Whitespace => {
                return Ok(Splitter {
                    pattern: WHITESPACE.clone(),
                })
            }
            Delimiter::Literal(chars) => {
                if chars.is_empty() {
                    return Err(ReadError::InvalidDelimiter {
                        pattern: chars.clone(),
                        reason: "no delimiter characters given".to_string(),
                    });
                }
                let escaped: String = chars
                    .chars()
                    .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
                    .collect();
                format!(r"[{escaped}\s]+")
            }
            Delimiter::Regex(pattern) => format!(r"(?:{pattern})|\s+"),
        };

        let pattern = Regex::new(&source).map_err(|err| ReadError::InvalidDelimiter {
            pattern: source.clone(),
            reason: err.to_string(),
        })?;
        if pattern.is_match("") {
            return Err(ReadError::InvalidDelimiter {
                pattern: source,
                reason: "pattern matches the empty string".to_string(),
            });
        }
        Ok(Splitter { pattern })
    }

    fn tokens<'a>(&self, line: &'a str) -> Vec<&'a str> {
        self.pattern.split(line).filter(|t| !t.is_empty()).collect()
    }
}

/// What a tokenized, non-blank line means for the table being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Comment,
    Preamble,
    Header,
    /// First data row when there is no header line; also fixes the column
    /// count and names the columns by position.
    PositionalHeader,
    Data,
}

/// Accumulates columns line by line. The column count is committed once,
/// when the header (or the first data row, without a header) is seen.
#[derive(Debug)]
struct ColumnBuilder<'c> {
    config: &'c ParseConfig,
    /// Counts non-blank lines only. Comment lines still advance it.
    line_index: usize,
    header: Vec<String>,
    columns: Option<Vec<Vec<String>>>,
}

impl<'c> ColumnBuilder<'c> {
    fn new(config: &'c ParseConfig) -> Self {
        ColumnBuilder {
            config,
            line_index: 0,
            header: Vec::new(),
            columns: None,
        }
    }

    fn classify(&self, tokens: &[&str]) -> LineClass {
        let config = self.config;
        if let (Some(marker), Some(first)) = (config.comment.as_deref(), tokens.first()) {
            if *first == marker {
                return LineClass::Comment;
            }
        }

        if config.has_header() && config.header_row == Some(self.line_index) {
            LineClass::Header
        } else if !config.has_header() && self.line_index == config.data_start {
            LineClass::PositionalHeader
        } else if self.line_index >= config.data_start {
            LineClass::Data
        } else {
            LineClass::Preamble
        }
    }

    fn push(&mut self, tokens: Vec<&str>) {
        if tokens.is_empty() {
            return;
        }

        match self.classify(&tokens) {
            LineClass::Comment | LineClass::Preamble => {}
            LineClass::Header => self.commit_header(&tokens),
            LineClass::PositionalHeader => {
                self.header = (0..tokens.len()).map(|i| i.to_string()).collect();
                self.columns = Some(vec![Vec::new(); tokens.len()]);
                debug!("ncols: {}", tokens.len());
                self.append_row(&tokens);
            }
            LineClass::Data => self.append_row(&tokens),
        }
        self.line_index += 1;
    }

    fn commit_header(&mut self, tokens: &[&str]) {
        let tokens = match tokens.split_first() {
            Some((&"#", rest)) => rest,
            _ => tokens,
        };
        let mut names: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        if let Some(first) = names.first_mut() {
            if first.starts_with('#') {
                first.remove(0);
            }
        }
        debug!("ncols: {}", names.len());
        self.columns = Some(vec![Vec::new(); names.len()]);
        self.header = names;
    }

    fn append_row(&mut self, tokens: &[&str]) {
        if let Some(columns) = self.columns.as_mut() {
            for (column, token) in columns.iter_mut().zip(tokens) {
                column.push(token.to_string());
            }
        }
    }

    fn finish(self, path: &Path) -> Result<Table, ReadError> {
        let columns = match self.columns {
            Some(columns) if !columns.is_empty() => columns,
            _ => {
                return Err(ReadError::NoValidColumns {
                    path: path.to_path_buf(),
                })
            }
        };

        if self.config.unique_header {
            if let Some(name) = duplicate_name(&self.header) {
                return Err(ReadError::DuplicateHeader {
                    name: name.to_string(),
                });
            }
        }

        Ok(Table {
            header: self.header,
            columns,
        })
    }
}
