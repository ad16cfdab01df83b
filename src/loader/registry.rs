//! Hospital registry (CSV) loading.

use csv::{ByteRecord, ReaderBuilder};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{Encoding, HospitalColumns};
use crate::error::{AnalysisError, AnalysisResult, SchemaError};
use crate::models::{GeoPoint, HospitalRecord, OperationalStatus};

/// Raw registry rows, read once and filtered per section.
///
/// Header names are trimmed; everything else is kept as decoded text.
#[derive(Debug, Clone)]
pub struct HospitalRegistry {
    dataset: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl HospitalRegistry {
    /// Read a registry file. `*.gz` files are decompressed on the fly.
    pub fn open(path: &Path, encoding: Encoding, delimiter: char) -> AnalysisResult<Self> {
        info!("Loading hospital registry from {}", path.display());

        let file = File::open(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let dataset = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("hospital registry")
            .to_string();

        Self::from_reader(&dataset, reader, encoding, delimiter)
    }

    pub fn from_reader<R: Read>(
        dataset: &str,
        reader: R,
        encoding: Encoding,
        delimiter: char,
    ) -> AnalysisResult<Self> {
        if !delimiter.is_ascii() {
            return Err(AnalysisError::UnsupportedFormat(format!(
                "CSV delimiter must be ASCII, got '{}'",
                delimiter
            )));
        }

        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter as u8)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .byte_headers()?
            .iter()
            .map(|h| normalize_header(&decode(h, encoding)))
            .collect();

        let mut rows = Vec::new();
        let mut record = ByteRecord::new();
        while csv_reader.read_byte_record(&mut record)? {
            rows.push(record.iter().map(|f| decode(f, encoding)).collect());
        }

        info!(
            "Loaded {} registry rows with {} columns",
            rows.len(),
            headers.len()
        );

        Ok(Self {
            dataset: dataset.to_string(),
            headers,
            rows,
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column, matched exactly against the trimmed headers
    pub fn column(&self, name: &str) -> Result<usize, SchemaError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SchemaError::new(name, &self.dataset))
    }

    /// Check that every named column exists; reports the first missing one
    pub fn require(&self, names: &[&str]) -> Result<(), SchemaError> {
        for name in names {
            self.column(name)?;
        }
        Ok(())
    }

    /// Hospitals with the given status and both coordinates present, in file order.
    ///
    /// The unit code and department columns are optional here; sections that
    /// aggregate on them check for them with [`HospitalRegistry::require`].
    pub fn hospitals(
        &self,
        columns: &HospitalColumns,
        status: &OperationalStatus,
    ) -> Result<Vec<HospitalRecord>, SchemaError> {
        let status_idx = self.column(&columns.status)?;
        let lat_idx = self.column(&columns.latitude)?;
        let lon_idx = self.column(&columns.longitude)?;
        let name_idx = self.column(&columns.name)?;
        let code_idx = self.column(&columns.unit_code).ok();
        let department_idx = self.column(&columns.department).ok();

        let mut hospitals = Vec::new();
        let mut other_status = 0usize;
        let mut missing_coords = 0usize;

        for (row, fields) in self.rows.iter().enumerate() {
            let field = |idx: usize| fields.get(idx).map(String::as_str).unwrap_or("");

            let row_status = OperationalStatus::from_label(field(status_idx));
            if &row_status != status {
                other_status += 1;
                continue;
            }

            let (lat, lon) = match (parse_coord(field(lat_idx)), parse_coord(field(lon_idx))) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    missing_coords += 1;
                    continue;
                }
            };

            hospitals.push(HospitalRecord {
                row,
                name: field(name_idx).trim().to_string(),
                status: row_status,
                location: GeoPoint::new(lat, lon),
                unit_code: code_idx.and_then(|i| non_empty(field(i))),
                department: department_idx.and_then(|i| non_empty(field(i))),
            });
        }

        debug!(
            "Status filter {}: kept {}, other status {}, missing coordinates {}",
            status, hospitals.len(), other_status, missing_coords
        );
        info!("{} hospitals with status {}", hospitals.len(), status);

        Ok(hospitals)
    }
}

fn decode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        // Latin-1 maps every byte to the code point of the same value
        Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn parse_coord(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
