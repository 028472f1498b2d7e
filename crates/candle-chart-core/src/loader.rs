use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ChartDataError;
use crate::parser::{self, ParseReport};
use crate::series::CandleSeries;

/// Resolves resource ids against a root directory and reads them into a series.
///
/// Resource ids are classpath-style (`/data/1d.csv`); a leading `/` is relative
/// to the root, not the filesystem root.
pub struct SeriesLoader {
    root: PathBuf,
}

impl SeriesLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Filesystem path a resource id maps to.
    pub fn resolve(&self, resource: &str) -> PathBuf {
        self.root.join(resource.trim_start_matches('/'))
    }

    /// Read and parse a resource. Missing resources are a hard error; bad rows are not.
    pub fn load(&self, resource: &str) -> Result<CandleSeries, ChartDataError> {
        Ok(self.load_with_report(resource)?.series)
    }

    /// Like [`load`](Self::load), keeping the parser's record of degraded rows.
    pub fn load_with_report(&self, resource: &str) -> Result<ParseReport, ChartDataError> {
        let text = self.read(resource)?;
        let report = parser::parse_with_report(&text);
        info!(
            resource,
            candles = report.series.len(),
            skipped = report.skipped.len(),
            "loaded candle series"
        );
        Ok(report)
    }

    fn read(&self, resource: &str) -> Result<String, ChartDataError> {
        let path = self.resolve(resource);
        if !path.is_file() {
            return Err(not_found(resource, path));
        }

        match std::fs::read(&path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(resource, path)),
            Err(e) => Err(e.into()),
        }
    }
}

fn not_found(resource: &str, path: PathBuf) -> ChartDataError {
    ChartDataError::ResourceNotFound {
        resource: resource.to_string(),
        path,
    }
}
