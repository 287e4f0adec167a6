// 🏗️ Source Loader - Files → Raw Records
// CSV and JSON decoders plus file-name based source detection

use crate::records::{RawRecord, RawValue, SourceKind};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

// ============================================================================
// CORE TYPES
// ============================================================================

/// FileFormat - How a source file is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

/// RecordParser - Decode one file into raw rows
///
/// The parser never interprets cells: typing happens in the normalizer.
pub trait RecordParser: Send + Sync {
    /// Parse a file and return its rows in file order
    fn parse(&self, file_path: &Path) -> Result<Vec<RawRecord>>;

    fn format(&self) -> FileFormat;
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Detect which source a file belongs to from its name
///
/// # Examples:
/// ```
/// use std::path::Path;
/// use transit_insights::{detect_source, SourceKind};
///
/// assert_eq!(detect_source(Path::new("tickets_marzo.csv")).unwrap(), SourceKind::Tickets);
/// assert_eq!(detect_source(Path::new("Servicios 2024.csv")).unwrap(), SourceKind::Servicios);
/// assert_eq!(detect_source(Path::new("validaciones.json")).unwrap(), SourceKind::Validaciones);
/// ```
pub fn detect_source(file_path: &Path) -> Result<SourceKind> {
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let filename_lower = filename.to_lowercase();

    if filename_lower.contains("ticket") {
        return Ok(SourceKind::Tickets);
    }

    if filename_lower.contains("servicio") || filename_lower.contains("service") {
        return Ok(SourceKind::Servicios);
    }

    if filename_lower.contains("validaci") || filename_lower.contains("validation") {
        return Ok(SourceKind::Validaciones);
    }

    Err(anyhow::anyhow!(
        "Could not detect source type from filename: {}",
        filename
    ))
}

/// Pick a parser from the file extension (`.csv` or `.json`)
pub fn get_parser(file_path: &Path) -> Result<Box<dyn RecordParser>> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(Box::new(CsvRecordParser::new())),
        "json" => Ok(Box::new(JsonRecordParser::new())),
        other => Err(anyhow::anyhow!(
            "Unsupported file extension '{}' for {}",
            other,
            file_path.display()
        )),
    }
}

/// Detect the source and parse the file in one go
pub fn load_source(file_path: &Path) -> Result<(SourceKind, Vec<RawRecord>)> {
    let kind = detect_source(file_path)?;
    let records = get_parser(file_path)?.parse(file_path)?;
    info!(
        source = kind.code(),
        rows = records.len(),
        file = %file_path.display(),
        "Loaded source file"
    );
    Ok((kind, records))
}

// ============================================================================
// CSV
// ============================================================================

pub struct CsvRecordParser;

impl CsvRecordParser {
    pub fn new() -> Self {
        CsvRecordParser
    }
}

impl Default for CsvRecordParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode CSV with a header row from any reader
///
/// Empty or missing cells become `Null`; everything else stays `Text` so
/// identifiers like "00123" keep their leading zeros.
pub fn parse_csv_reader<R: Read>(reader: R, label: &str) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header in {}", label))?
        .clone();

    let mut records = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let row = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, label)
        })?;

        // Short rows keep every header column; missing cells are Null
        let mut record = RawRecord::new();
        for (index, column) in headers.iter().enumerate() {
            let value = match row.get(index) {
                Some(cell) if !cell.is_empty() => RawValue::text(cell),
                _ => RawValue::Null,
            };
            record.insert(column, value);
        }
        records.push(record);
    }

    Ok(records)
}

impl RecordParser for CsvRecordParser {
    fn parse(&self, file_path: &Path) -> Result<Vec<RawRecord>> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

        parse_csv_reader(file, &file_path.display().to_string())
    }

    fn format(&self) -> FileFormat {
        FileFormat::Csv
    }
}

// ============================================================================
// JSON
// ============================================================================

/// JSON array of objects, one object per row
pub struct JsonRecordParser;

impl JsonRecordParser {
    pub fn new() -> Self {
        JsonRecordParser
    }
}

impl Default for JsonRecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser for JsonRecordParser {
    fn parse(&self, file_path: &Path) -> Result<Vec<RawRecord>> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse JSON rows in {}", file_path.display()))
    }

    fn format(&self) -> FileFormat {
        FileFormat::Json
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_detect_source_tickets() {
        let result = detect_source(Path::new("Reporte_Tickets_Marzo.xlsx.csv"));
        assert_eq!(result.unwrap(), SourceKind::Tickets);
    }

    #[test]
    fn test_detect_source_services() {
        assert_eq!(detect_source(Path::new("servicios.csv")).unwrap(), SourceKind::Servicios);
        assert_eq!(detect_source(Path::new("services.json")).unwrap(), SourceKind::Servicios);
    }

    #[test]
    fn test_detect_source_validations() {
        assert_eq!(
            detect_source(Path::new("Validaciones_2024.csv")).unwrap(),
            SourceKind::Validaciones
        );
        assert_eq!(
            detect_source(Path::new("validación.csv")).unwrap(),
            SourceKind::Validaciones
        );
    }

    #[test]
    fn test_detect_source_unknown() {
        assert!(detect_source(Path::new("report.csv")).is_err());
    }

    #[test]
    fn test_get_parser_by_extension() {
        assert_eq!(get_parser(Path::new("a.CSV")).unwrap().format(), FileFormat::Csv);
        assert_eq!(get_parser(Path::new("a.json")).unwrap().format(), FileFormat::Json);
        assert!(get_parser(Path::new("a.xlsx")).is_err());
    }

    #[test]
    fn test_parse_csv_reader() {
        let csv = "Usuario,ID Salida,Validado\nA,00123,Si\nB,,No\n";
        let records = parse_csv_reader(csv.as_bytes(), "inline").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("ID Salida"), Some(&RawValue::text("00123")));
        assert_eq!(records[1].get("ID Salida"), Some(&RawValue::Null));
        assert_eq!(records[1].get("Validado"), Some(&RawValue::text("No")));
    }

    #[test]
    fn test_parse_csv_short_rows() {
        let csv = "usuario,fecha,ruta\nA,2024-03-01\n";
        let records = parse_csv_reader(csv.as_bytes(), "inline").unwrap();

        assert_eq!(records[0].len(), 3);
        assert_eq!(records[0].get("fecha"), Some(&RawValue::text("2024-03-01")));
        assert_eq!(records[0].get("ruta"), Some(&RawValue::Null));
    }

    #[test]
    fn test_csv_parser_reads_file() {
        let (_dir, path) = temp_file("tickets.csv", "usuario,fecha\nA,2024-03-01\n");
        let records = CsvRecordParser::new().parse(&path).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_json_parser_reads_file() {
        let (_dir, path) = temp_file(
            "validaciones.json",
            r#"[{"usuario": "A", "fecha": 45000}, {"usuario": "B", "validado": null}]"#,
        );
        let records = JsonRecordParser::new().parse(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("fecha"), Some(&RawValue::Number(45000.0)));
        assert_eq!(records[1].get("validado"), Some(&RawValue::Null));
    }

    #[test]
    fn test_load_source() {
        let (_dir, path) = temp_file("servicios.csv", "ID Salida,Ruta\n1,R1\n2,R2\n");
        let (kind, records) = load_source(&path).unwrap();

        assert_eq!(kind, SourceKind::Servicios);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = CsvRecordParser::new().parse(Path::new("/nonexistent/tickets.csv"));
        assert!(result.is_err());
    }
}
