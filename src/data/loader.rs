use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use once_cell::unsync::OnceCell;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, RawTable};
use super::source::{DataSource, TableFormat};
use crate::error::{Error, Result};

/// Sheet the dashboard workbook keeps its rows in.
pub const DEFAULT_SHEET: &str = "Data";

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Sheet name, only consulted for spreadsheet sources.
    pub sheet: String,
    /// Overrides extension-based format detection.
    pub format: Option<TableFormat>,
    pub timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sheet: DEFAULT_SHEET.to_string(),
            format: None,
            timeout: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Memoised loader
// ---------------------------------------------------------------------------

/// Owns one source and caches its dataset for the life of the loader.
///
/// The source is treated as immutable for the session, so there is no
/// invalidation: a different source needs a different loader. A failed load
/// is not cached and the next call fetches again.
#[derive(Debug)]
pub struct DatasetLoader {
    source: DataSource,
    options: LoadOptions,
    cache: OnceCell<Arc<Dataset>>,
}

impl DatasetLoader {
    pub fn new(source: DataSource, options: LoadOptions) -> Self {
        Self {
            source,
            options,
            cache: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Idempotent: every call after the first success returns the same `Arc`.
    pub fn load(&self) -> Result<Arc<Dataset>> {
        if let Some(ds) = self.cache.get() {
            log::debug!("Dataset cache hit for {}", self.source);
            return Ok(Arc::clone(ds));
        }
        self.cache
            .get_or_try_init(|| load_dataset(&self.source, &self.options).map(Arc::new))
            .map(Arc::clone)
    }
}

/// Fetch, parse and bind a dataset without caching.
pub fn load_dataset(source: &DataSource, options: &LoadOptions) -> Result<Dataset> {
    let format = match options.format {
        Some(format) => format,
        None => TableFormat::detect(source)?,
    };
    let bytes = source.fetch(options.timeout)?;
    let table = parse_table(&bytes, format, &options.sheet)?;
    let dataset = Dataset::from_table(&table)?;
    log::info!(
        "Loaded {} records ({} columns) from {source}",
        dataset.len(),
        table.headers.len()
    );
    Ok(dataset)
}

/// Decode raw bytes into a header row plus untyped cells.
pub fn parse_table(bytes: &[u8], format: TableFormat, sheet: &str) -> Result<RawTable> {
    match format {
        TableFormat::Spreadsheet => parse_spreadsheet(bytes, sheet),
        TableFormat::Csv => parse_csv(bytes),
        TableFormat::Parquet => parse_parquet(bytes),
        TableFormat::Json => parse_json(bytes),
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

/// First row of the named sheet is the header row.
fn parse_spreadsheet(bytes: &[u8], sheet: &str) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| Error::Malformed(format!("opening workbook: {e}")))?;

    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        return Err(Error::SchemaMismatch(format!(
            "sheet '{sheet}' not found (available: {})",
            names.join(", ")
        )));
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| Error::Malformed(format!("reading sheet '{sheet}': {e}")))?;
    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or_else(|| Error::SchemaMismatch(format!("sheet '{sheet}' is empty")))?
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();
    let rows = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn parse_csv(bytes: &[u8]) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::Malformed(format!("reading CSV headers: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| Error::Malformed(format!("CSV row {}: {e}", row_no + 1)))?;
        rows.push(record.iter().map(CellValue::guess).collect());
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Flat scalar columns only; works with files from pandas and polars alike.
fn parse_parquet(bytes: &[u8]) -> Result<RawTable> {
    let malformed = |e: &dyn std::fmt::Display| Error::Malformed(format!("parquet: {e}"));

    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(bytes.to_vec()))
        .map_err(|e| malformed(&e))?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(|e| malformed(&e))?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| malformed(&e))?;
        let columns = batch
            .columns()
            .iter()
            .map(column_cells)
            .collect::<Result<Vec<_>>>()?;
        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| col[row].clone()).collect());
        }
    }

    Ok(RawTable { headers, rows })
}

/// Convert one Arrow column into cells, widening every integer type to i64
/// and every float type to f64.
fn column_cells(col: &ArrayRef) -> Result<Vec<CellValue>> {
    let n = col.len();
    let widen = |to: &DataType| {
        arrow::compute::cast(col.as_ref(), to)
            .map_err(|e| Error::Malformed(format!("parquet cast to {to:?}: {e}")))
    };

    let cells: Vec<CellValue> = match col.data_type() {
        DataType::Boolean => {
            let arr = col.as_boolean();
            (0..n)
                .map(|i| nullable(arr, i, || CellValue::Bool(arr.value(i))))
                .collect()
        }
        DataType::Utf8 => {
            let arr = col.as_string::<i32>();
            (0..n)
                .map(|i| nullable(arr, i, || CellValue::String(arr.value(i).to_string())))
                .collect()
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            (0..n)
                .map(|i| nullable(arr, i, || CellValue::String(arr.value(i).to_string())))
                .collect()
        }
        dt if dt.is_integer() => {
            let wide = widen(&DataType::Int64)?;
            let arr = wide.as_primitive::<Int64Type>();
            (0..n)
                .map(|i| nullable(arr, i, || CellValue::Integer(arr.value(i))))
                .collect()
        }
        dt if dt.is_floating() => {
            let wide = widen(&DataType::Float64)?;
            let arr = wide.as_primitive::<Float64Type>();
            (0..n)
                .map(|i| nullable(arr, i, || CellValue::Float(arr.value(i))))
                .collect()
        }
        other => {
            return Err(Error::Malformed(format!(
                "unsupported parquet column type {other:?}"
            )))
        }
    };
    Ok(cells)
}

fn nullable(arr: &dyn Array, i: usize, value: impl FnOnce() -> CellValue) -> CellValue {
    if arr.is_null(i) {
        CellValue::Null
    } else {
        value()
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Expected layout (records-oriented):
///
/// ```json
/// [
///   { "LIMIT_BAL": 20000, "SEX": 2, "AGE": 24, ... },
///   ...
/// ]
/// ```
fn parse_json(bytes: &[u8]) -> Result<RawTable> {
    let root: JsonValue =
        serde_json::from_slice(bytes).map_err(|e| Error::Malformed(format!("parsing JSON: {e}")))?;
    let records = root
        .as_array()
        .ok_or_else(|| Error::Malformed("expected top-level JSON array".to_string()))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| Error::Malformed(format!("row {} is not a JSON object", i + 1)))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map_or(CellValue::Null, json_cell))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::canonical_headers;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_row(age: u32, label: u8) -> String {
        let mut cells = vec![
            "50000".to_string(),
            "2".into(),
            "2".into(),
            "1".into(),
            age.to_string(),
        ];
        cells.extend(std::iter::repeat("0".to_string()).take(18));
        cells.push(label.to_string());
        cells.join(",")
    }

    fn write_csv(rows: &[(u32, u8)]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{}", canonical_headers().join(",")).unwrap();
        for &(age, label) in rows {
            writeln!(file, "{}", csv_row(age, label)).unwrap();
        }
        file
    }

    #[test]
    fn test_parse_csv() {
        let text = format!("{}\n{}\n", canonical_headers().join(","), csv_row(33, 1));
        let table = parse_table(text.as_bytes(), TableFormat::Csv, DEFAULT_SHEET).unwrap();
        assert_eq!(table.headers.len(), 24);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][4], CellValue::Integer(33));
    }

    #[test]
    fn test_parse_json_records() {
        let json = br#"[{"AGE": 25, "LIMIT_BAL": 1.5e4}, {"AGE": 30, "extra": "x"}]"#;
        let table = parse_table(json, TableFormat::Json, DEFAULT_SHEET).unwrap();
        assert_eq!(table.rows.len(), 2);
        let age = table.column_index("AGE").unwrap();
        let extra = table.column_index("extra").unwrap();
        assert_eq!(table.rows[1][age], CellValue::Integer(30));
        assert_eq!(table.rows[0][extra], CellValue::Null);
        assert_eq!(
            table.rows[0][table.column_index("LIMIT_BAL").unwrap()],
            CellValue::Float(15000.0)
        );
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_table(b"{\"not\": \"an array\"}", TableFormat::Json, DEFAULT_SHEET),
            Err(Error::Malformed(_))
        ));
    }

    /// Workbook with a `Notes` sheet ahead of `data_sheet`, holding the
    /// canonical header and one row per `(age, label)`.
    fn workbook(data_sheet: &str, rows: &[(u32, u8)]) -> Vec<u8> {
        let mut book = rust_xlsxwriter::Workbook::new();
        book.add_worksheet()
            .set_name("Notes")
            .unwrap()
            .write_string(0, 0, "Processed for the dashboard")
            .unwrap();
        let sheet = book.add_worksheet().set_name(data_sheet).unwrap();
        for (c, header) in canonical_headers().iter().enumerate() {
            sheet.write_string(0, c as u16, *header).unwrap();
        }
        for (r, line) in rows.iter().map(|&(age, label)| csv_row(age, label)).enumerate() {
            for (c, cell) in line.split(',').enumerate() {
                let value: f64 = cell.parse().unwrap();
                sheet.write_number(r as u32 + 1, c as u16, value).unwrap();
            }
        }
        book.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_named_sheet() {
        let bytes = workbook(DEFAULT_SHEET, &[(25, 1), (47, 0)]);
        let table = parse_table(&bytes, TableFormat::Spreadsheet, DEFAULT_SHEET).unwrap();
        assert_eq!(table.headers, canonical_headers());
        let ds = Dataset::from_table(&table).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].age, 47);
        assert_eq!(ds.records[0].credit_limit, 50_000.0);
        assert!(ds.records[0].defaulted && !ds.records[1].defaulted);
    }

    #[test]
    fn test_missing_sheet_is_schema_mismatch() {
        let bytes = workbook("Sheet1", &[(25, 1)]);
        match parse_table(&bytes, TableFormat::Spreadsheet, DEFAULT_SHEET) {
            Err(Error::SchemaMismatch(msg)) => {
                assert!(msg.contains("'Data'"));
                assert!(msg.contains("Sheet1"));
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_loader_reads_workbook_file() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(&workbook(DEFAULT_SHEET, &[(33, 0), (61, 1), (72, 1)]))
            .unwrap();
        let loader = DatasetLoader::new(
            DataSource::Path(file.path().to_path_buf()),
            LoadOptions::default(),
        );
        let ds = loader.load().unwrap();
        assert_eq!(ds.iter().map(|r| r.age).collect::<Vec<_>>(), vec![33, 61, 72]);
    }

    #[test]
    fn test_garbage_spreadsheet_is_malformed() {
        assert!(matches!(
            parse_table(b"not a workbook", TableFormat::Spreadsheet, DEFAULT_SHEET),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_loader_caches_after_first_load() {
        let file = write_csv(&[(25, 1), (35, 0)]);
        let source = DataSource::Path(file.path().to_path_buf());
        let loader = DatasetLoader::new(source, LoadOptions::default());
        assert!(!loader.is_cached());

        let first = loader.load().unwrap();
        assert_eq!(first.len(), 2);
        assert!(loader.is_cached());

        // The source disappears; the cached dataset is still served.
        drop(file);
        let second = loader.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let loader = DatasetLoader::new(
            DataSource::parse("/no/such/dir/credit.csv"),
            LoadOptions::default(),
        );
        assert!(matches!(loader.load(), Err(Error::SourceUnavailable { .. })));
        assert!(!loader.is_cached());
    }

    #[test]
    fn test_format_override() {
        let file = write_csv(&[(40, 0)]);
        let renamed = file.path().with_extension("dat");
        std::fs::copy(file.path(), &renamed).unwrap();
        let options = LoadOptions {
            format: Some(TableFormat::Csv),
            ..LoadOptions::default()
        };
        let ds = load_dataset(&DataSource::Path(renamed.clone()), &options).unwrap();
        assert_eq!(ds.records[0].age, 40);
        std::fs::remove_file(renamed).unwrap();
    }
}
