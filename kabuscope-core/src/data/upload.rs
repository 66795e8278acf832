//! User-supplied CSV files.
//!
//! Any delimited text with a header row is accepted. The only interpretation
//! applied is coercing a `Date` column to the calendar-date type; every other
//! column is kept as parsed. `Date` is read as text and handed to
//! [`normalize_dates`], so timestamps keep their written calendar date.

use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use super::dataset::Dataset;
use super::provider::DataError;
use crate::schema::{PriceSchema, DATE};
use crate::transform::normalize_dates;

/// Parse an uploaded file's bytes into a dataset.
///
/// The dataset fingerprint is the BLAKE3 hash of the bytes, so re-uploading the
/// same file reuses any export already serialized for it.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<Dataset, DataError> {
    let separator = sniff_separator(bytes);
    debug!(separator = %char::from(separator), size = bytes.len(), "parsing upload");

    // An overwrite as wide as the header renames columns by position, so only
    // pass one when the file really has a Date column.
    let date_as_text = header_names(bytes, separator)
        .iter()
        .any(|name| name == DATE)
        .then(|| Arc::new(Schema::from_iter([Field::new(DATE.into(), DataType::String)])));
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(date_as_text)
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| DataError::Parse(e.to_string()))?;

    let frame = normalize_dates(frame).map_err(|e| DataError::Parse(e.to_string()))?;
    info!(
        rows = frame.height(),
        columns = frame.width(),
        typed_dates = PriceSchema::has_typed_dates(&frame),
        "upload parsed"
    );

    Ok(Dataset::new(frame, blake3::hash(bytes).to_hex().to_string()))
}

/// Read and parse an uploaded file from disk.
pub fn read_csv_file(path: &Path) -> Result<Dataset, DataError> {
    let bytes = std::fs::read(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    read_csv_bytes(&bytes)
}

fn header_names(bytes: &[u8], separator: u8) -> Vec<String> {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    header
        .split(|&b| b == separator)
        .map(|field| {
            String::from_utf8_lossy(field)
                .trim()
                .trim_matches('"')
                .to_string()
        })
        .collect()
}

/// Pick the delimiter that occurs most in the header line; comma on a tie.
fn sniff_separator(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    let count = |sep: u8| header.iter().filter(|&&b| b == sep).count();

    let mut best = (b',', count(b','));
    for sep in [b';', b'\t'] {
        let n = count(sep);
        if n > best.1 {
            best = (sep, n);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CLOSE, SYMBOL};
    use chrono::NaiveDate;
    use std::io::Write;

    const SAMPLE: &str = "\
Date,Symbol,Open,High,Low,Close,Volume
2024-01-04,NINTENDO,7500,7550,7450,7520,1000
2024-01-05,NINTENDO,7600,7650,7550,7630,2000
";

    #[test]
    fn parses_header_and_types_dates() {
        let ds = read_csv_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.height(), 2);
        assert!(ds.has_column(SYMBOL));
        assert!(PriceSchema::has_typed_dates(ds.frame()));
        assert_eq!(ds.symbols().unwrap(), vec!["NINTENDO"]);
    }

    #[test]
    fn slash_dates_are_coerced() {
        let csv = "Date,Close\n2024/01/04,1.5\n2024/01/05,2.5\n";
        let ds = read_csv_bytes(csv.as_bytes()).unwrap();
        assert!(PriceSchema::has_typed_dates(ds.frame()));
        let bounds = ds.date_bounds().unwrap().unwrap();
        assert_eq!(bounds.days(), 2);
    }

    fn bounds(csv: &str) -> (NaiveDate, NaiveDate) {
        let ds = read_csv_bytes(csv.as_bytes()).unwrap();
        assert!(PriceSchema::has_typed_dates(ds.frame()));
        let b = ds.date_bounds().unwrap().unwrap();
        (b.start, b.end)
    }

    fn ymd(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn offset_timestamps_keep_their_local_date() {
        let csv = "Date,Close\n2024-01-04 00:00:00+09:00,1.5\n2024-01-05 00:00:00+09:00,2.5\n";
        assert_eq!(bounds(csv), (ymd(1, 4), ymd(1, 5)));
    }

    #[test]
    fn slash_dates_with_year_last_are_month_first() {
        let csv = "Date,Close\n01/05/2024,1.5\n01/13/2024,2.5\n";
        assert_eq!(bounds(csv), (ymd(1, 5), ymd(1, 13)));
    }

    #[test]
    fn naive_timestamps_are_truncated() {
        let csv = "Date,Close\n2024-01-04 15:00:00,1.5\n2024-01-05T09:00:00,2.5\n";
        assert_eq!(bounds(csv), (ymd(1, 4), ymd(1, 5)));
    }

    #[test]
    fn semicolon_files_are_detected() {
        let csv = "Date;Open;High;Low;Close\n2024-01-04;1;2;0.5;1.5\n";
        let ds = read_csv_bytes(csv.as_bytes()).unwrap();
        assert!(ds.has_column(CLOSE));
        assert_eq!(ds.column_names().len(), 5);
    }

    #[test]
    fn file_without_date_column_is_kept_as_is() {
        let csv = "Symbol,Close\nSONY,1.0\n";
        let ds = read_csv_bytes(csv.as_bytes()).unwrap();
        assert!(!ds.has_column(DATE));
        assert_eq!(ds.height(), 1);
    }

    #[test]
    fn fingerprint_follows_bytes() {
        let a = read_csv_bytes(SAMPLE.as_bytes()).unwrap();
        let b = read_csv_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = read_csv_bytes(SAMPLE.replace("7630", "7631").as_bytes()).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let ds = read_csv_file(file.path()).unwrap();
        assert_eq!(ds.height(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_csv_file(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }

    #[test]
    fn single_column_file_keeps_its_name() {
        let ds = read_csv_bytes(b"Close\n1.5\n2.5\n").unwrap();
        assert_eq!(ds.column_names(), vec![CLOSE.to_string()]);
    }

    #[test]
    fn header_names_strip_quotes_and_returns() {
        assert_eq!(
            header_names(b"\"Date\";Close\r\n2024-01-04;1", b';'),
            vec!["Date".to_string(), "Close".to_string()]
        );
    }

    #[test]
    fn sniff_prefers_most_frequent_delimiter() {
        assert_eq!(sniff_separator(b"a,b,c\n1,2,3"), b',');
        assert_eq!(sniff_separator(b"a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_separator(b"a\tb\n1\t2"), b'\t');
        assert_eq!(sniff_separator(b"single\n1"), b',');
    }
}
