use crate::config::RecordSource;
use crate::error::{ReportError, ReportResult};
use crate::sample;
use crate::types::{ClientRecord, ClientStatus, RawClientRow};
use crate::util::{non_empty, parse_amount_safe, parse_timestamp_safe};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use log::{debug, info, warn};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    /// Rows whose plan value cell was present but unusable; the record is
    /// kept with no plan value.
    pub dropped_plan_values: usize,
}

/// Resolve a configured source into a record collection. `now` anchors the
/// sample data set and is ignored for CSV files.
pub fn load_records(
    source: &RecordSource,
    now: DateTime<Utc>,
) -> ReportResult<(Vec<ClientRecord>, LoadReport)> {
    match source {
        RecordSource::Csv { path } => load_csv(path),
        RecordSource::Sample => {
            let data = sample::sample_records(now);
            let report = LoadReport {
                total_rows: data.len(),
                loaded_rows: data.len(),
                ..LoadReport::default()
            };
            info!("Loaded {} sample records", data.len());
            Ok((data, report))
        }
    }
}

pub fn load_csv(path: &Path) -> ReportResult<(Vec<ClientRecord>, LoadReport)> {
    info!("Reading client records from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_csv(file)
}

pub fn read_csv<R: Read>(reader: R) -> ReportResult<(Vec<ClientRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(reader);
    let mut report = LoadReport::default();
    let mut data: Vec<ClientRecord> = Vec::new();

    for (idx, result) in rdr.deserialize::<RawClientRow>().enumerate() {
        report.total_rows += 1;
        // Header is line 1.
        let row_no = idx + 2;
        let row = match result {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(ReportError::Csv(e)),
            Err(e) => {
                debug!("Skipping row {}: {}", row_no, e);
                report.parse_errors += 1;
                continue;
            }
        };
        match clean_row(row_no, row, &mut report) {
            Ok(record) => data.push(record),
            Err(e) => {
                debug!("Skipping row {}: {}", row_no, e);
                report.parse_errors += 1;
            }
        }
    }

    report.loaded_rows = data.len();
    if report.parse_errors > 0 {
        warn!("{} rows skipped due to parse errors", report.parse_errors);
    }
    Ok((data, report))
}

fn clean_row(
    row_no: usize,
    row: RawClientRow,
    report: &mut LoadReport,
) -> ReportResult<ClientRecord> {
    let created_at = parse_timestamp_safe(row.created_at.as_deref()).ok_or_else(|| {
        ReportError::InvalidTimestamp {
            row: row_no,
            value: row.created_at.clone().unwrap_or_default(),
        }
    })?;

    let raw_value = non_empty(row.plan_value);
    let plan_value = raw_value.as_deref().and_then(|v| parse_amount_safe(Some(v)));
    if raw_value.is_some() && plan_value.is_none() {
        report.dropped_plan_values += 1;
    }

    let status = non_empty(row.status)
        .map(|s| ClientStatus::from_label(&s))
        .unwrap_or_else(|| ClientStatus::Other(String::new()));

    Ok(ClientRecord {
        // Rows without an id still need a unique key.
        id: non_empty(row.id).unwrap_or_else(|| format!("row-{}", row_no)),
        status,
        origin: non_empty(row.origin),
        plan: non_empty(row.plan),
        plan_value,
        state: non_empty(row.state),
        created_at,
    })
}
