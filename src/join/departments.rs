//! Hospital counts per department.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::EmptyResultWarning;
use crate::models::HospitalRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentCount {
    pub department: String,
    pub hospitals: u32,
}

/// Departments ordered by hospital count, descending.
///
/// Groups are first keyed by name (ascending), so equal counts stay in
/// alphabetical order after the stable sort.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentRanking {
    pub departments: Vec<DepartmentCount>,
}

impl DepartmentRanking {
    pub fn from_hospitals(hospitals: &[HospitalRecord]) -> Self {
        let mut groups: BTreeMap<&str, u32> = BTreeMap::new();
        for hospital in hospitals {
            if let Some(department) = hospital.department.as_deref() {
                *groups.entry(department).or_insert(0) += 1;
            }
        }

        let mut departments: Vec<DepartmentCount> = groups
            .into_iter()
            .map(|(department, hospitals)| DepartmentCount {
                department: department.to_string(),
                hospitals,
            })
            .collect();
        departments.sort_by(|a, b| b.hospitals.cmp(&a.hospitals));

        info!("{} departments with hospitals", departments.len());
        Self { departments }
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    /// Department with the most hospitals and the one with the fewest
    pub fn extremes(&self) -> Result<(&DepartmentCount, &DepartmentCount), EmptyResultWarning> {
        match (self.departments.first(), self.departments.last()) {
            (Some(most), Some(least)) => Ok((most, least)),
            _ => Err(EmptyResultWarning::new("departments")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, OperationalStatus};

    fn hospital(department: Option<&str>) -> HospitalRecord {
        HospitalRecord {
            row: 0,
            name: "H".to_string(),
            status: OperationalStatus::Activated,
            location: GeoPoint::new(0.0, 0.0),
            unit_code: None,
            department: department.map(str::to_string),
        }
    }

    #[test]
    fn test_ranking_descending_with_alphabetical_ties() {
        let hospitals = vec![
            hospital(Some("LORETO")),
            hospital(Some("LIMA")),
            hospital(Some("LIMA")),
            hospital(Some("CUSCO")),
            hospital(Some("AMAZONAS")),
            hospital(None),
        ];
        let ranking = DepartmentRanking::from_hospitals(&hospitals);
        let order: Vec<(&str, u32)> = ranking
            .departments
            .iter()
            .map(|d| (d.department.as_str(), d.hospitals))
            .collect();
        assert_eq!(
            order,
            vec![("LIMA", 2), ("AMAZONAS", 1), ("CUSCO", 1), ("LORETO", 1)]
        );

        let (most, least) = ranking.extremes().unwrap();
        assert_eq!(most.department, "LIMA");
        assert_eq!(least.department, "LORETO");
    }

    #[test]
    fn test_empty_ranking_warns() {
        let ranking = DepartmentRanking::from_hospitals(&[hospital(None)]);
        assert!(ranking.is_empty());
        assert_eq!(
            ranking.extremes().unwrap_err(),
            EmptyResultWarning::new("departments")
        );
    }
}
