//! Streaming CSV and Excel readers feeding the row sampler

use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use super::tabular::{SampledTable, TabularProcessor};

/// Read a CSV file. The first record is the header.
pub fn read_csv(path: &Path, processor: &TabularProcessor) -> Result<SampledTable> {
    let file = std::fs::File::open(path)?;
    read_csv_from(file, processor)
}

/// Read CSV from any reader, one record at a time
pub fn read_csv_from<R: Read>(reader: R, processor: &TabularProcessor) -> Result<SampledTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::extraction(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut sampler = processor.sampler();
    for record in reader.records() {
        let record = record.map_err(|e| Error::extraction(format!("Malformed CSV record: {}", e)))?;
        sampler.push(record.iter().map(str::to_string).collect());
    }

    Ok(sampler.finish(headers, None))
}

/// Read every non-empty worksheet. The first row of each sheet is its header.
#[cfg(feature = "xlsx")]
pub fn read_excel(path: &Path, processor: &TabularProcessor) -> Result<Vec<SampledTable>> {
    use calamine::{open_workbook_auto, Reader};

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::extraction(format!("Failed to open workbook: {}", e)))?;

    let mut tables = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| Error::extraction(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            tracing::debug!("Skipping empty sheet '{}'", sheet_name);
            continue;
        };
        let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

        let mut sampler = processor.sampler();
        for row in rows {
            let cells: Vec<String> = row.iter().map(cell_to_string).collect();
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }
            sampler.push(cells);
        }

        tables.push(sampler.finish(headers, Some(sheet_name)));
    }

    Ok(tables)
}

#[cfg(not(feature = "xlsx"))]
pub fn read_excel(_path: &Path, _processor: &TabularProcessor) -> Result<Vec<SampledTable>> {
    Err(Error::extraction("Excel support is disabled (enable the `xlsx` feature)"))
}

#[cfg(feature = "xlsx")]
fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    use chrono::Timelike;

    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.num_seconds_from_midnight() == 0 => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}
