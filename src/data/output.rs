use anyhow::Result;

use super::{OutputFormat, Table};

/// Render the whole table, header first.
pub fn format_table(table: &Table, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Plain => {
            let mut lines = Vec::with_capacity(table.num_rows() + 1);
            lines.push(header_names(table).join(" "));
            lines.extend(table.rows().map(|row| row.join(" ")));
            Ok(lines.join("\n"))
        }
        OutputFormat::Csv => {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(Vec::new());
            wtr.write_record(header_names(table))?;
            for row in table.rows() {
                wtr.write_record(row)?;
            }
            let bytes = wtr.into_inner().map_err(|err| err.into_error())?;
            Ok(String::from_utf8(bytes)?.trim_end().to_string())
        }
        OutputFormat::Json => Ok(serde_json::to_string(table)?),
    }
}

pub fn format_row(table: &Table, format: OutputFormat, row_idx: usize) -> Result<String> {
    let row = table.row(row_idx);
    match format {
        OutputFormat::Plain => Ok(row.join(" ")),
        OutputFormat::Csv => csv_encode_row(&row),
        OutputFormat::Json => {
            let obj: serde_json::Map<String, serde_json::Value> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| (table.column_name(i), serde_json::Value::from(*cell)))
                .collect();
            Ok(serde_json::to_string(&obj)?)
        }
    }
}

/// Render a single column: its name followed by its values.
pub fn format_column(table: &Table, format: OutputFormat, col_idx: usize) -> Result<String> {
    let name = table.column_name(col_idx);
    let values: &[String] = table.columns.get(col_idx).map(Vec::as_slice).unwrap_or(&[]);

    match format {
        OutputFormat::Plain => {
            let mut lines = vec![name.as_str()];
            lines.extend(values.iter().map(String::as_str));
            Ok(lines.join("\n"))
        }
        OutputFormat::Csv => {
            let mut lines = vec![csv_encode_row(&[name.as_str()])?];
            for value in values {
                lines.push(csv_encode_row(&[value.as_str()])?);
            }
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            let mut obj = serde_json::Map::new();
            obj.insert(name, serde_json::Value::from(values.to_vec()));
            Ok(serde_json::to_string(&obj)?)
        }
    }
}

fn header_names(table: &Table) -> Vec<String> {
    (0..table.num_columns()).map(|i| table.column_name(i)).collect()
}

fn csv_encode_row(fields: &[&str]) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(fields)?;
    let bytes = wtr.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(bytes)?.trim_end().to_string())
}
