use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// DataSource – where the table bytes come from
// ---------------------------------------------------------------------------

/// Location of the tabular source. Local file and remote URL are two
/// configurations of the same loader, not separate code paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` and `https://` locations are URLs, anything else a path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::Path(PathBuf::from(trimmed))
        }
    }

    /// Lower-cased extension of the path, ignoring any URL query or fragment.
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            DataSource::Path(p) => p.file_name()?.to_str()?.to_string(),
            DataSource::Url(u) => {
                let end = u.find(|c| c == '?' || c == '#').unwrap_or(u.len());
                u[..end].rsplit('/').next()?.to_string()
            }
        };
        Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Read the whole source into memory. Any failure is final; callers
    /// surface it instead of retrying.
    pub fn fetch(&self, timeout: Duration) -> Result<Vec<u8>> {
        match self {
            DataSource::Path(path) => {
                std::fs::read(path).map_err(|e| Error::unavailable(self.to_string(), e))
            }
            DataSource::Url(url) => {
                let response = ureq::get(url).timeout(timeout).call().map_err(|e| {
                    Error::unavailable(url.as_str(), io::Error::new(io::ErrorKind::Other, e.to_string()))
                })?;
                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut bytes)
                    .map_err(|e| Error::unavailable(url.as_str(), e))?;
                Ok(bytes)
            }
        }
    }
}

impl From<String> for DataSource {
    fn from(location: String) -> Self {
        DataSource::parse(&location)
    }
}

impl From<DataSource> for String {
    fn from(source: DataSource) -> Self {
        source.to_string()
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(p) => write!(f, "{}", p.display()),
            DataSource::Url(u) => write!(f, "{u}"),
        }
    }
}

// ---------------------------------------------------------------------------
// TableFormat – how the bytes are decoded
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Workbook with named sheets (.xlsx, .xls, .xlsm, .xlsb, .ods).
    Spreadsheet,
    Csv,
    Parquet,
    /// Records-oriented array, the `df.to_json(orient='records')` layout.
    Json,
}

impl TableFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(TableFormat::Spreadsheet),
            "csv" => Ok(TableFormat::Csv),
            "parquet" | "pq" => Ok(TableFormat::Parquet),
            "json" => Ok(TableFormat::Json),
            other => Err(Error::UnsupportedFormat(format!(".{other}"))),
        }
    }

    pub fn detect(source: &DataSource) -> Result<Self> {
        let ext = source
            .extension()
            .ok_or_else(|| Error::UnsupportedFormat(format!("no file extension on {source}")))?;
        Self::from_extension(&ext)
    }
}
