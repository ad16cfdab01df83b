//! Report document written by the `hospaccess` binary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ProximityResult;
use crate::error::AnalysisError;
use crate::join::{DepartmentRanking, DistrictSummary};

/// Outcome of one dashboard section.
///
/// A failing section is recorded here instead of aborting the run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SectionReport<T> {
    Complete { data: T },
    Empty { warning: String },
    Skipped { reason: String },
}

impl<T> SectionReport<T> {
    /// Turn a section result into a report entry. Empty aggregations become
    /// warnings, every other error skips the section.
    pub fn from_result(result: Result<T, AnalysisError>) -> Self {
        match result {
            Ok(data) => SectionReport::Complete { data },
            Err(AnalysisError::EmptyResult(warning)) => SectionReport::Empty {
                warning: warning.to_string(),
            },
            Err(e) => SectionReport::Skipped {
                reason: e.to_string(),
            },
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            SectionReport::Complete { data } => Some(data),
            _ => None,
        }
    }
}

/// Full analysis output
#[derive(Debug, Clone, Serialize)]
pub struct AccessReport {
    pub generated_at: DateTime<Utc>,
    pub radius_m: f64,
    pub projection: String,
    pub districts: SectionReport<DistrictSummary>,
    pub departments: SectionReport<DepartmentRanking>,
    pub proximity: SectionReport<Vec<ProximityResult>>,
    pub national_map: SectionReport<DistrictSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EmptyResultWarning, SchemaError};

    #[test]
    fn test_section_report_tags() {
        let ok: SectionReport<u32> = SectionReport::from_result(Ok(3));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"status": "complete", "data": 3})
        );

        let empty: SectionReport<u32> =
            SectionReport::from_result(Err(EmptyResultWarning::new("departments").into()));
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            serde_json::json!({"status": "empty", "warning": "no rows found for departments"})
        );

        let skipped: SectionReport<u32> =
            SectionReport::from_result(Err(SchemaError::new("UBIGEO", "hospitales.csv").into()));
        assert!(skipped.data().is_none());
        assert_eq!(
            serde_json::to_value(&skipped).unwrap()["reason"],
            "column 'UBIGEO' not found in hospitales.csv"
        );
    }
}
