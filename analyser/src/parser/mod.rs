//! Input boundary: turns a delimited text file or a spreadsheet into a [`RawTable`].
//!
//! Delimited text goes through encoding detection, delimiter detection and the
//! `csv` reader. Spreadsheets are read sheet by sheet (see [`spreadsheet`]) and
//! concatenated row-wise. No cleaning happens here: cells stay untyped.

pub mod spreadsheet;

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{IngestError, IngestResult};
use crate::models::{Cell, RawTable};

/// Candidate delimiters, in tie-break order.
pub const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '|', '\t'];

/// Delimiter used when detection is inconclusive.
pub const FALLBACK_DELIMITER: char = ',';

/// Number of leading bytes sampled for delimiter detection.
const SNIFF_BYTES: usize = 4096;

/// Maximum number of lines sampled for delimiter detection.
const SNIFF_LINES: usize = 20;

const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// How the input file was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Delimited,
    Spreadsheet,
}

impl SourceKind {
    /// Classify a path by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceKind::Delimited)
        } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceKind::Spreadsheet)
        } else {
            None
        }
    }
}

/// Metadata about the input file, for logging and the `parse` command.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub kind: SourceKind,
    /// Detected encoding (delimited text only)
    pub encoding: Option<String>,
    /// Detected or supplied delimiter (delimited text only)
    pub delimiter: Option<char>,
    /// Sheets that contributed rows (spreadsheets only)
    pub sheets: Vec<String>,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of reading an input file.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub table: RawTable,
    pub info: SourceInfo,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown charsets decode as lossy UTF-8. A leading byte order mark is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> IngestResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => {
                let (text, _, had_errors) = enc.decode(bytes);
                if had_errors {
                    return Err(IngestError::Encoding(format!(
                        "content is not valid {}",
                        enc.name()
                    )));
                }
                text.into_owned()
            }
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Count occurrences of `delimiter` outside double-quoted sections.
fn count_unquoted(line: &str, delimiter: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Take the sniffing sample: leading bytes, complete lines only.
fn sample_lines(content: &str) -> Vec<&str> {
    let mut end = content.len().min(SNIFF_BYTES);
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &content[..end];

    // Drop the trailing partial line when the sample cut through the content.
    let sample = if end < content.len() {
        match sample.rfind('\n') {
            Some(pos) => &sample[..pos],
            None => sample,
        }
    } else {
        sample
    };

    sample
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect()
}

/// Infer the delimiter among comma, semicolon, pipe and tab.
///
/// A candidate qualifies when it appears in the header line and every sampled
/// line carries the same number of (unquoted) occurrences. The qualifying
/// candidate with the most occurrences wins. Returns `None` when no candidate
/// qualifies.
pub fn sniff_delimiter(content: &str) -> Option<char> {
    let lines = sample_lines(content);
    let header = lines.first()?;

    let mut best: Option<(char, usize)> = None;
    for &candidate in &DELIMITER_CANDIDATES {
        let expected = count_unquoted(header, candidate);
        if expected == 0 {
            continue;
        }
        let consistent = lines
            .iter()
            .all(|line| count_unquoted(line, candidate) == expected);
        if !consistent {
            continue;
        }
        match best {
            Some((_, count)) if count >= expected => {}
            _ => best = Some((candidate, expected)),
        }
    }

    best.map(|(delimiter, _)| delimiter)
}

/// Detect the delimiter, falling back to a comma.
pub fn detect_delimiter(content: &str) -> char {
    sniff_delimiter(content).unwrap_or(FALLBACK_DELIMITER)
}

fn delimiter_byte(delimiter: char) -> IngestResult<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(IngestError::InvalidDelimiter(delimiter))
    }
}

/// Parse delimited text with an explicit delimiter.
///
/// Headers are trimmed; cells are kept verbatim. Missing trailing cells become
/// [`Cell::Empty`], extra cells are ignored and blank lines are skipped.
///
/// # Example
/// ```
/// use spend_analyser::parser::parse_delimited;
/// use spend_analyser::models::Cell;
///
/// let table = parse_delimited("supplier;spend\nAcme;\"1.000,00\"", ';').unwrap();
/// assert_eq!(table.headers, vec!["supplier", "spend"]);
/// assert_eq!(table.rows[0][1], Cell::text("1.000,00"));
/// ```
pub fn parse_delimited(content: &str, delimiter: char) -> IngestResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = RawTable::new(headers);

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(Cell::text).collect());
    }

    Ok(table)
}

/// Parse delimited bytes: detect encoding, then the delimiter unless supplied.
pub fn parse_delimited_bytes(
    bytes: &[u8],
    delimiter: Option<char>,
) -> IngestResult<(RawTable, String, char)> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;

    let delimiter = match delimiter {
        Some(d) => d,
        None => {
            let detected = sniff_delimiter(&content);
            if detected.is_none() {
                debug!("delimiter detection inconclusive, using '{}'", FALLBACK_DELIMITER);
            }
            detected.unwrap_or(FALLBACK_DELIMITER)
        }
    };

    let table = parse_delimited(&content, delimiter)?;
    Ok((table, encoding, delimiter))
}

/// Read an input file, dispatching on its extension.
///
/// Fails with [`IngestError::EmptyFile`] when the file has no data row and
/// with [`IngestError::NoHeaders`] when every header is blank.
pub fn read_table(path: &Path, delimiter: Option<char>) -> IngestResult<ParseResult> {
    let kind = SourceKind::from_path(path).ok_or_else(|| {
        IngestError::UnsupportedFormat(
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{e}"))
                .unwrap_or_else(|| path.display().to_string()),
        )
    })?;

    let (table, encoding, used_delimiter, sheets) = match kind {
        SourceKind::Delimited => {
            let bytes = std::fs::read(path)?;
            if bytes.iter().all(|b| b.is_ascii_whitespace()) {
                return Err(IngestError::EmptyFile(path.to_path_buf()));
            }
            let (table, encoding, delimiter) = parse_delimited_bytes(&bytes, delimiter)?;
            (table, Some(encoding), Some(delimiter), Vec::new())
        }
        SourceKind::Spreadsheet => {
            let (table, sheets) = spreadsheet::read_workbook(path)?;
            (table, None, None, sheets)
        }
    };

    if table.headers.iter().all(|h| h.trim().is_empty()) {
        return Err(IngestError::NoHeaders(path.to_path_buf()));
    }
    if table.is_empty() {
        return Err(IngestError::EmptyFile(path.to_path_buf()));
    }

    let info = SourceInfo {
        path: path.to_path_buf(),
        kind,
        encoding,
        delimiter: used_delimiter,
        sheets,
        headers: table.headers.clone(),
        row_count: table.len(),
    };

    info!(
        path = %path.display(),
        rows = info.row_count,
        columns = info.headers.len(),
        "read input"
    );
    if let (Some(encoding), Some(delimiter)) = (&info.encoding, info.delimiter) {
        info!(encoding = %encoding, delimiter = %format_delimiter(delimiter), "delimited text");
    }
    if !info.sheets.is_empty() {
        info!(sheets = %info.sheets.join(", "), "spreadsheet");
    }

    Ok(ParseResult { table, info })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

/// Render a raw table as JSON objects keyed by original header.
pub fn records_as_json(table: &RawTable) -> Vec<Value> {
    table
        .rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (header, cell) in table.headers.iter().zip(row.iter()) {
                let value = match cell {
                    Cell::Empty => Value::Null,
                    Cell::Text(s) => Value::String(s.clone()),
                    Cell::Number(n) => serde_json::Number::from_f64(*n)
                        .map(Value::Number)
                        .unwrap_or(Value::Null),
                };
                obj.insert(header.clone(), value);
            }
            Value::Object(obj)
        })
        .collect()
}
