use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// What to do with a successful response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Output {
    /// Write the response bytes verbatim (CSV or NetCDF).
    #[default]
    Download,
    /// Parse the response as CSV; write it only when a target is given.
    Table,
}

/// A parsed CSV response. ERDDAP puts a units row right after the header,
/// which is kept as the first data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(Error::EmptyTable);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Padding counts chars, so widths must too.
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        write_row(f, &self.headers, &widths)?;
        for row in &self.rows {
            write_row(f, row, &widths)?;
        }
        write!(f, "[{} rows x {} columns]", self.rows.len(), self.headers.len())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            f.write_str("  ")?;
        }
        let w = widths.get(i).copied().unwrap_or(0);
        write!(f, "{cell:>w$}")?;
    }
    writeln!(f)
}

#[derive(Debug)]
pub enum Payload {
    Bytes(u64),
    Table(Table),
}

/// A successful request: the payload and where it was written, if anywhere.
#[derive(Debug)]
pub struct Saved {
    pub path: Option<PathBuf>,
    pub payload: Payload,
}

impl Saved {
    pub fn table(&self) -> Option<&Table> {
        match &self.payload {
            Payload::Table(t) => Some(t),
            Payload::Bytes(_) => None,
        }
    }
}

/// Result of one product request. Failures carry the product code and cause
/// and never abort the remaining products of a batch.
#[derive(Debug)]
pub struct Outcome {
    pub product: String,
    pub url: Option<String>,
    pub result: Result<Saved>,
}

impl Outcome {
    pub(crate) fn failed(product: &str, url: Option<String>, err: Error) -> Self {
        warn!(product, error = %err, "request failed");
        Self {
            product: product.to_string(),
            url,
            result: Err(err),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn path(&self) -> Option<&Path> {
        self.result.as_ref().ok().and_then(|s| s.path.as_deref())
    }
}

/// Write the response body verbatim to `path`. Nothing is written when the
/// request fails.
pub fn download<T: Transport + ?Sized>(transport: &T, url: &str, path: &Path) -> Result<u64> {
    let body = transport.fetch(url)?;
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(&body)?;
    info!(path = %path.display(), bytes = body.len(), "results written");
    Ok(body.len() as u64)
}

/// Parse the response body as CSV and optionally re-serialize it to `path`.
pub fn fetch_table<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    path: Option<&Path>,
) -> Result<Table> {
    let body = transport.fetch(url)?;
    let table = Table::parse(&body)?;
    if let Some(path) = path {
        table.write_csv(path)?;
        info!(path = %path.display(), rows = table.len(), "results written");
    }
    Ok(table)
}
