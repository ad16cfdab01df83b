//! Error types shared by the loaders, joins and the proximity engine.

use std::path::PathBuf;

use thiserror::Error;

/// An expected column is absent from a dataset.
///
/// Raised once, right after load, by the schema check of the section that
/// needs the column. The section is skipped; independent sections still run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("column '{column}' not found in {dataset}")]
pub struct SchemaError {
    pub column: String,
    pub dataset: String,
}

impl SchemaError {
    pub fn new(column: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            dataset: dataset.into(),
        }
    }
}

/// An aggregation produced no rows. Reported to the user, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no rows found for {section}")]
pub struct EmptyResultWarning {
    pub section: String,
}

impl EmptyResultWarning {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
        }
    }
}

/// Errors that can occur while loading inputs or running an analysis section
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    EmptyResult(#[from] EmptyResultWarning),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("projection error: {0}")]
    Projection(String),

    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read shapefile: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("failed to read attribute table: {0}")]
    Dbase(#[from] dbase::Error),

    #[error("failed to read GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("unsupported geometry format: {0}")]
    UnsupportedFormat(String),
}

impl AnalysisError {
    /// Whether the failure means the input itself could not be read.
    ///
    /// Only these abort the whole run; everything else affects one section.
    pub fn is_input_missing(&self) -> bool {
        matches!(self, AnalysisError::Io { .. })
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_column_and_dataset() {
        let err = SchemaError::new("UBIGEO", "hospitales.csv");
        assert_eq!(
            err.to_string(),
            "column 'UBIGEO' not found in hospitales.csv"
        );
    }

    #[test]
    fn test_schema_error_is_transparent() {
        let err: AnalysisError = SchemaError::new("DEP", "centros").into();
        assert_eq!(err.to_string(), "column 'DEP' not found in centros");
        assert!(!err.is_input_missing());
    }

    #[test]
    fn test_io_error_is_input_missing() {
        let err = AnalysisError::Io {
            path: PathBuf::from("data/hospitales.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.is_input_missing());
        assert!(err.to_string().contains("data/hospitales.csv"));
    }
}
