//! Column-oriented text tables in the style of IDL's `readcol`/`writecol`.
//!
//! A column file is plain text: an optional header line naming the columns
//! followed by one row per line, fields separated by whitespace or a chosen
//! delimiter. [`read`] turns such a file into a [`Table`] of string columns
//! and [`write`] turns a table back into text, refusing to clobber an
//! existing file unless asked to.
//!
//! ```no_run
//! use colio::{read, write, ParseConfig, WriteConfig};
//!
//! let table = read("stars.txt", &ParseConfig::default())?;
//! let mags = table.column("mag").unwrap_or_default();
//! println!("{} magnitudes", mags.len());
//! write("stars_copy.txt", &table, &WriteConfig::default())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod data;

pub use config::{Delimiter, ParseConfig, Profile, WriteConfig, WriteMode};
pub use data::error::{ReadError, WriteError};
pub use data::parse::{parse_string, read, read_from, readcol};
pub use data::write::{render, write, write_columns, writecol, WriteOutcome};
pub use data::{OutputFormat, Table};
