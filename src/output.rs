use crate::error::ReportResult;
use log::debug;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> ReportResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv_to(file, rows)?;
    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_csv_to<W: Write, T: Serialize>(writer: W, rows: &[T]) -> ReportResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> ReportResult<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Markdown table of the first `max_rows` rows, or `(no rows)`.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_table(rows, max_rows));
}
