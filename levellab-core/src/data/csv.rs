//! CSV market data: reads bar exports from a trading terminal.
//!
//! Headers are matched case-insensitively and may be wrapped in angle
//! brackets (`<OPEN>`). The time column may be called `timestamp`, `time`,
//! `datetime` or `date`; extra columns are ignored. Rows are sorted by
//! timestamp after parsing.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::provider::{apply_count, BarRequest, DataError, DataSource, MarketDataSource};
use crate::domain::PriceBar;

const TIME_ALIASES: [&str; 4] = ["timestamp", "time", "datetime", "date"];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y.%m.%d"];

const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Bars from a CSV file, or from `<dir>/<symbol>.csv` when `path` is a
/// directory.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self, symbol: &str) -> Result<PathBuf, DataError> {
        let path = if self.path.is_dir() {
            self.path.join(format!("{symbol}.csv"))
        } else {
            self.path.clone()
        };
        if path.is_file() {
            Ok(path)
        } else {
            Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }
}

impl MarketDataSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn kind(&self) -> DataSource {
        DataSource::Csv
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<PriceBar>, DataError> {
        let path = self.resolve(&request.symbol)?;
        let file = std::fs::File::open(&path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let bars = apply_count(read_bars(file, self.delimiter)?, request.count);
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: request.symbol.clone(),
            });
        }
        Ok(bars)
    }
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, DataError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| {
                h.trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_ascii_lowercase()
            })
            .collect();
        let find = |name: &'static str| {
            names
                .iter()
                .position(|n| n == name)
                .ok_or(DataError::MissingColumn(name))
        };

        let time = TIME_ALIASES
            .iter()
            .find_map(|alias| names.iter().position(|n| n == alias))
            .ok_or(DataError::MissingColumn("time"))?;

        Ok(Self {
            time,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
        })
    }
}

/// Parse bars from CSV text. Rows come back sorted by timestamp.
pub fn read_bars<R: Read>(reader: R, delimiter: u8) -> Result<Vec<PriceBar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::locate(rdr.headers()?)?;

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let time_text = field(columns.time);
        let timestamp = parse_timestamp(time_text).ok_or_else(|| DataError::Parse {
            row,
            field: "time",
            value: time_text.to_string(),
        })?;

        let price = |idx: usize, name: &'static str| {
            let text = field(idx);
            text.parse::<f64>().map_err(|_| DataError::Parse {
                row,
                field: name,
                value: text.to_string(),
            })
        };

        bars.push(PriceBar {
            timestamp,
            open: price(columns.open, "open")?,
            high: price(columns.high, "high")?,
            low: price(columns.low, "low")?,
            close: price(columns.close, "close")?,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Accepts the common terminal formats, a bare date, or unix seconds.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    text.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.naive_utc())
}

/// Write bars as `time,open,high,low,close`.
pub fn write_bars<W: Write>(writer: W, bars: &[PriceBar]) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["time", "open", "high", "low", "close"])?;
    for bar in bars {
        wtr.write_record([
            bar.timestamp.format(WRITE_FORMAT).to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
        ])?;
    }
    wtr.flush().map_err(|source| DataError::Io {
        path: "<csv writer>".to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::make_bars;

    const SAMPLE: &str = "\
Time,Open,High,Low,Close,Volume
2024-01-03 00:00:00,101.0,103.0,100.0,102.5,900
2024-01-02 00:00:00,100.0,102.0,99.0,101.0,1000
";

    #[test]
    fn reads_and_sorts_rows() {
        let bars = read_bars(SAMPLE.as_bytes(), b',').unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, 101.0);
        assert_eq!(bars[1].high, 103.0);
    }

    #[test]
    fn accepts_bracketed_tab_separated_headers() {
        let text = "<DATE>\t<OPEN>\t<HIGH>\t<LOW>\t<CLOSE>\n2024.01.02\t1\t2\t0.5\t1.5\n";
        let bars = read_bars(text.as_bytes(), b'\t').unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].low, 0.5);
        assert_eq!(
            bars[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn missing_column_is_reported() {
        let text = "time,open,high,close\n2024-01-02,1,2,1.5\n";
        let err = read_bars(text.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, DataError::MissingColumn("low")));
    }

    #[test]
    fn bad_number_names_row_and_field() {
        let text = "time,open,high,low,close\n2024-01-02,1,2,oops,1.5\n";
        match read_bars(text.as_bytes(), b',').unwrap_err() {
            DataError::Parse { row, field, value } => {
                assert_eq!(row, 1);
                assert_eq!(field, "low");
                assert_eq!(value, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-01-02 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024.01.02 10:30"), Some(expected));
        assert_eq!(
            parse_timestamp(&expected.and_utc().timestamp().to_string()),
            Some(expected)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn written_bars_read_back() {
        let bars = make_bars(&[100.0, 101.5, 99.25]);
        let mut buf = Vec::new();
        write_bars(&mut buf, &bars).unwrap();
        assert_eq!(read_bars(buf.as_slice(), b',').unwrap(), bars);
    }

    #[test]
    fn source_resolves_symbol_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("GER30.csv"), SAMPLE).unwrap();
        let source = CsvSource::new(dir.path());

        let bars = source.fetch(&BarRequest::new("GER30")).unwrap();
        assert_eq!(bars.len(), 2);

        let last = source.fetch(&BarRequest::new("GER30").with_count(1)).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].close, 102.5);

        assert!(matches!(
            source.fetch(&BarRequest::new("US500")),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn header_only_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        std::fs::write(&path, "time,open,high,low,close\n").unwrap();
        let err = CsvSource::new(&path)
            .fetch(&BarRequest::new("GER30"))
            .unwrap_err();
        assert!(matches!(err, DataError::Empty { .. }));
    }
}
