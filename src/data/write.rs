use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{error, info};

use super::error::WriteError;
use super::{duplicate_name, Table};
use crate::config::{WriteConfig, WriteMode};

/// What the writer did to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Overwritten,
    Appended,
}

/// Write a table, swallowing any refusal after [`write_columns`] has logged
/// it.
///
/// Returns whether the file was written.
pub fn writecol(
    path: impl AsRef<Path>,
    columns: &[Vec<String>],
    header: &[String],
    config: &WriteConfig,
) -> bool {
    write_columns(path, columns, header, config).is_ok()
}

/// Write `table` to `path`, emitting its header line when the header is
/// non-empty. See [`write_columns`] for the refusal rules.
pub fn write(
    path: impl AsRef<Path>,
    table: &Table,
    config: &WriteConfig,
) -> Result<WriteOutcome, WriteError> {
    write_columns(path, &table.columns, &table.header, config)
}

/// Write `columns` (and `header`, when non-empty) to `path`.
///
/// Shape checks and the overwrite guard run before the file is opened, so a
/// refused write never touches the destination. Every refusal or I/O failure
/// is logged at `error` before it is returned.
pub fn write_columns(
    path: impl AsRef<Path>,
    columns: &[Vec<String>],
    header: &[String],
    config: &WriteConfig,
) -> Result<WriteOutcome, WriteError> {
    let result = write_to_path(path.as_ref(), columns, header, config);
    if let Err(err) = &result {
        error!("{err}");
    }
    result
}

fn write_to_path(
    path: &Path,
    columns: &[Vec<String>],
    header: &[String],
    config: &WriteConfig,
) -> Result<WriteOutcome, WriteError> {
    check_shape(columns, header, config)?;

    let outcome = if path.is_file() {
        if config.mode == WriteMode::Overwrite && config.overwrite_guard {
            return Err(WriteError::Exists {
                path: path.to_path_buf(),
            });
        }
        info!(
            "File '{}' already exists but overwriting/appending with '{}'...",
            path.display(),
            config.mode
        );
        match config.mode {
            WriteMode::Overwrite => WriteOutcome::Overwritten,
            WriteMode::Append => WriteOutcome::Appended,
        }
    } else {
        info!("File '{}' is being created...", path.display());
        WriteOutcome::Created
    };

    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut options = OpenOptions::new();
    match config.mode {
        WriteMode::Overwrite => options.write(true).create(true).truncate(true),
        WriteMode::Append => options.append(true).create(true),
    };
    let file = options.open(path).map_err(io_err)?;

    let mut out = BufWriter::new(file);
    emit(&mut out, columns, header, config).map_err(io_err)?;
    out.flush().map_err(io_err)?;

    Ok(outcome)
}

/// Serialize a table to a string without touching the filesystem.
pub fn render(table: &Table, config: &WriteConfig) -> Result<String, WriteError> {
    check_shape(&table.columns, &table.header, config)?;
    let mut buf = Vec::new();
    emit(&mut buf, &table.columns, &table.header, config).map_err(|source| WriteError::Io {
        path: "<memory>".into(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn check_shape(
    columns: &[Vec<String>],
    header: &[String],
    config: &WriteConfig,
) -> Result<(), WriteError> {
    let lengths: Vec<usize> = columns.iter().map(Vec::len).collect();
    if lengths.windows(2).any(|w| w[0] != w[1]) {
        return Err(WriteError::RaggedColumns { lengths });
    }

    if !header.is_empty() && header.len() != columns.len() {
        return Err(WriteError::HeaderLength {
            header: header.len(),
            columns: columns.len(),
        });
    }

    if config.unique_header {
        if let Some(name) = duplicate_name(header) {
            return Err(WriteError::DuplicateHeader {
                name: name.to_string(),
            });
        }
    }

    Ok(())
}

fn emit<W: Write>(
    out: &mut W,
    columns: &[Vec<String>],
    header: &[String],
    config: &WriteConfig,
) -> std::io::Result<()> {
    if !header.is_empty() {
        writeln!(out, "{}{}", config.header_prefix, header.join(config.delimiter.as_str()))?;
    }

    let nrows = columns.first().map_or(0, Vec::len);
    for row in 0..nrows {
        let mut cells = columns.iter().map(|col| col[row].as_str());
        if let Some(first) = cells.next() {
            out.write_all(first.as_bytes())?;
        }
        for cell in cells {
            out.write_all(config.delimiter.as_bytes())?;
            out.write_all(cell.as_bytes())?;
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseConfig;
    use crate::data::parse::read;
    use pretty_assertions::assert_eq;
    use speculoos::prelude::*;
    use std::fs;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn nominal_columns() -> Vec<Vec<String>> {
        vec![strings(&["1", "2", "3", "4"]), strings(&[".1", ".2", ".3", ".4"])]
    }

    fn nominal_table() -> Table {
        Table::new(strings(&["x", "y"]), nominal_columns())
    }

    fn unguarded(mode: WriteMode) -> WriteConfig {
        WriteConfig {
            mode,
            overwrite_guard: false,
            ..WriteConfig::default()
        }
    }

    #[test]
    fn renders_header_and_rows() {
        let text = render(&nominal_table(), &WriteConfig::default()).unwrap();
        assert_eq!(text, "# x y\n1 .1\n2 .2\n3 .3\n4 .4\n");
    }

    #[test]
    fn renders_custom_delimiter_and_prefix() {
        let config = WriteConfig {
            delimiter: "\t".to_string(),
            header_prefix: "#".to_string(),
            ..WriteConfig::default()
        };
        let text = render(&nominal_table(), &config).unwrap();
        assert_eq!(text, "#x\ty\n1\t.1\n2\t.2\n3\t.3\n4\t.4\n");
    }

    #[test]
    fn renders_without_header() {
        let table = Table::new(vec![], nominal_columns());
        let text = render(&table, &WriteConfig::default()).unwrap();
        assert_eq!(text, "1 .1\n2 .2\n3 .3\n4 .4\n");
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert_eq!(render(&Table::default(), &WriteConfig::default()).unwrap(), "");
    }

    #[test]
    fn writes_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nominal_write.txt");

        let outcome = write(&path, &nominal_table(), &WriteConfig::default()).unwrap();
        assert_eq!(outcome, WriteOutcome::Created);
        assert_eq!(read(&path, &ParseConfig::default()).unwrap(), nominal_table());
    }

    #[test]
    fn guarded_overwrite_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_overwrite_false.txt");

        write(&path, &nominal_table(), &WriteConfig::default()).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let other = Table::new(strings(&["a"]), vec![strings(&["9"])]);
        let err = write(&path, &other, &WriteConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "File '{}' already exists and overwrite is set to False. Halting...",
                path.display()
            )
        );
        assert!(matches!(err, WriteError::Exists { .. }));

        let err = write(&path, &other, &WriteConfig::default()).unwrap_err();
        assert!(matches!(err, WriteError::Exists { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn unguarded_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_writer_overwrite_true.txt");
        write(&path, &nominal_table(), &WriteConfig::default()).unwrap();

        let replacement = Table::new(
            strings(&["x", "y"]),
            vec![strings(&["5", "6"]), strings(&[".5", ".6"])],
        );
        let outcome = write(&path, &replacement, &unguarded(WriteMode::Overwrite)).unwrap();
        assert_eq!(outcome, WriteOutcome::Overwritten);
        assert_eq!(read(&path, &ParseConfig::default()).unwrap(), replacement);
    }

    #[test]
    fn append_adds_rows_under_existing_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_append_overwrite_true.txt");
        write(&path, &nominal_table(), &WriteConfig::default()).unwrap();

        let more = vec![strings(&["5", "6"]), strings(&[".5", ".6"])];
        let outcome = write_columns(&path, &more, &[], &unguarded(WriteMode::Append)).unwrap();
        assert_eq!(outcome, WriteOutcome::Appended);

        let table = read(&path, &ParseConfig::default()).unwrap();
        assert_eq!(table.header, strings(&["x", "y"]));
        assert_eq!(
            table.columns,
            vec![
                strings(&["1", "2", "3", "4", "5", "6"]),
                strings(&[".1", ".2", ".3", ".4", ".5", ".6"])
            ]
        );
    }

    #[test]
    fn append_ignores_guard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guarded_append.txt");
        write(&path, &nominal_table(), &WriteConfig::default()).unwrap();

        let config = WriteConfig {
            mode: WriteMode::Append,
            ..WriteConfig::default()
        };
        let outcome = write_columns(&path, &[strings(&["5"]), strings(&[".5"])], &[], &config);
        assert_that(&outcome).is_ok();
    }

    #[test]
    fn append_with_header_repeats_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("double_header.txt");
        write(&path, &nominal_table(), &WriteConfig::default()).unwrap();
        write(&path, &nominal_table(), &unguarded(WriteMode::Append)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("# x y\n").count(), 2);
    }

    #[test]
    fn ragged_columns_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_write_columns_not_same_len.txt");

        let columns = vec![strings(&["1", "2", "3"]), strings(&[".1", ".2", ".3", ".4"])];
        let err = write_columns(&path, &columns, &strings(&["x", "y", "z"]), &WriteConfig::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: columns not all same length.");
        assert!(matches!(err, WriteError::RaggedColumns { ref lengths } if lengths == &vec![3usize, 4]));
        assert!(!path.exists());
    }

    #[test]
    fn header_length_mismatch_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_write_mismatched_headerlen.txt");

        let err = write_columns(&path, &nominal_columns(), &strings(&["x", "y", "z"]), &WriteConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: length of header, 3, does not match number of columns, 2."
        );

        let err = write_columns(&path, &nominal_columns(), &strings(&["x"]), &WriteConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: length of header, 1, does not match number of columns, 2."
        );
        assert!(!path.exists());
    }

    #[test]
    fn shape_is_checked_before_guard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exists.txt");
        fs::write(&path, "keep me\n").unwrap();

        let columns = vec![strings(&["1"]), strings(&["1", "2"])];
        let err = write_columns(&path, &columns, &[], &WriteConfig::default()).unwrap_err();
        assert!(matches!(err, WriteError::RaggedColumns { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me\n");
    }

    #[test]
    fn duplicate_header_refused_when_requested() {
        let table = Table::new(strings(&["a", "a"]), vec![strings(&["1"]), strings(&["2"])]);
        assert_that(&render(&table, &WriteConfig::default())).is_ok();

        let config = WriteConfig {
            unique_header: true,
            ..WriteConfig::default()
        };
        let err = render(&table, &config).unwrap_err();
        assert!(matches!(err, WriteError::DuplicateHeader { ref name } if name == "a"));
    }

    #[test]
    fn writecol_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.txt");

        assert!(writecol(&path, &nominal_columns(), &strings(&["x", "y"]), &WriteConfig::default()));
        assert!(!writecol(&path, &nominal_columns(), &strings(&["x", "y"]), &WriteConfig::default()));
        assert!(!writecol(
            dir.path().join("ragged.txt"),
            &[strings(&["1"]), vec![]],
            &[],
            &WriteConfig::default()
        ));
    }

    #[test]
    fn unwritable_destination_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("out.txt");
        let err = write(&path, &nominal_table(), &WriteConfig::default()).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
    }
}
