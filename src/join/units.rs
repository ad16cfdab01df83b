//! Hospital counts per administrative unit.

use hashbrown::HashMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::models::{AdministrativeUnit, HospitalRecord};

/// Group hospitals by unit code. Records without a code are not counted.
pub fn count_by_unit(hospitals: &[HospitalRecord]) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for hospital in hospitals {
        if let Some(code) = &hospital.unit_code {
            *counts.entry(code.clone()).or_insert(0) += 1;
        }
    }
    debug!("{} distinct unit codes among hospitals", counts.len());
    counts
}

/// Left join of counts onto units: every unit is kept, unmatched ones get 0.
///
/// Returns how many hospitals landed on a unit.
pub fn attach_counts(units: &mut [AdministrativeUnit], counts: &HashMap<String, u32>) -> u32 {
    let mut matched = 0;
    for unit in units.iter_mut() {
        unit.hospitals = counts.get(&unit.code).copied().unwrap_or(0);
        matched += unit.hospitals;
    }
    let unmatched: u32 = counts.values().sum::<u32>().saturating_sub(matched);
    if unmatched > 0 {
        debug!("{} hospitals carry a code with no matching unit", unmatched);
    }
    matched
}

/// One row of the district table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitCount {
    pub code: String,
    pub name: String,
    pub hospitals: u32,
}

impl From<&AdministrativeUnit> for UnitCount {
    fn from(unit: &AdministrativeUnit) -> Self {
        Self {
            code: unit.code.clone(),
            name: unit.name.clone(),
            hospitals: unit.hospitals,
        }
    }
}

/// District table plus the derived views of the dashboard maps
#[derive(Debug, Clone, Serialize)]
pub struct DistrictSummary {
    /// Hospitals that passed the status filter
    pub hospitals_total: usize,
    /// Hospitals whose code matched a unit
    pub hospitals_matched: u32,
    /// Every unit in input order
    pub units: Vec<UnitCount>,
    /// Codes of units without any hospital
    pub without_hospitals: Vec<String>,
    /// Units with the most hospitals, descending; ties keep input order
    pub top: Vec<UnitCount>,
}

impl DistrictSummary {
    /// Join `hospitals` onto `units` and build the summary views
    pub fn build(
        units: &mut [AdministrativeUnit],
        hospitals: &[HospitalRecord],
        top_n: usize,
    ) -> Self {
        let counts = count_by_unit(hospitals);
        let hospitals_matched = attach_counts(units, &counts);

        let table: Vec<UnitCount> = units.iter().map(UnitCount::from).collect();
        let without_hospitals: Vec<String> = table
            .iter()
            .filter(|u| u.hospitals == 0)
            .map(|u| u.code.clone())
            .collect();

        let mut top = table.clone();
        // sort_by is stable
        top.sort_by(|a, b| b.hospitals.cmp(&a.hospitals));
        top.truncate(top_n);

        info!(
            "{} units, {} without hospitals, {} of {} hospitals matched",
            table.len(),
            without_hospitals.len(),
            hospitals_matched,
            hospitals.len()
        );

        Self {
            hospitals_total: hospitals.len(),
            hospitals_matched,
            units: table,
            without_hospitals,
            top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, OperationalStatus};
    use geo::MultiPolygon;

    fn hospital(row: usize, code: Option<&str>) -> HospitalRecord {
        HospitalRecord {
            row,
            name: format!("H{}", row),
            status: OperationalStatus::Activated,
            location: GeoPoint::new(-12.0, -77.0),
            unit_code: code.map(str::to_string),
            department: None,
        }
    }

    fn unit(code: &str) -> AdministrativeUnit {
        AdministrativeUnit::new(
            code.to_string(),
            format!("D{}", code),
            MultiPolygon::new(vec![]),
        )
    }

    #[test]
    fn test_count_by_unit_ignores_missing_codes() {
        let hospitals = vec![
            hospital(0, Some("01")),
            hospital(1, Some("01")),
            hospital(2, None),
            hospital(3, Some("02")),
        ];
        let counts = count_by_unit(&hospitals);
        assert_eq!(counts.get("01"), Some(&2));
        assert_eq!(counts.get("02"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_left_join_keeps_every_unit() {
        let mut units = vec![unit("01"), unit("02"), unit("03")];
        let hospitals = vec![
            hospital(0, Some("01")),
            hospital(1, Some("03")),
            hospital(2, Some("03")),
            hospital(3, Some("99")),
        ];
        let counts = count_by_unit(&hospitals);
        let matched = attach_counts(&mut units, &counts);

        assert_eq!(units.len(), 3);
        assert_eq!(units[0].hospitals, 1);
        assert_eq!(units[1].hospitals, 0);
        assert_eq!(units[2].hospitals, 2);
        assert_eq!(matched, 3);
    }

    #[test]
    fn test_sum_of_counts_equals_matched_records() {
        let mut units = vec![unit("01"), unit("02"), unit("03"), unit("04")];
        let hospitals: Vec<HospitalRecord> = (0..20)
            .map(|i| {
                let code = match i % 5 {
                    0 => None,
                    1 => Some("01"),
                    2 => Some("02"),
                    3 => Some("02"),
                    _ => Some("03"),
                };
                hospital(i, code)
            })
            .collect();
        let summary = DistrictSummary::build(&mut units, &hospitals, 10);

        let with_code = hospitals.iter().filter(|h| h.unit_code.is_some()).count() as u32;
        let sum: u32 = summary.units.iter().map(|u| u.hospitals).sum();
        assert_eq!(sum, with_code);
        assert_eq!(summary.hospitals_matched, with_code);
        assert_eq!(summary.hospitals_total, 20);
        assert_eq!(summary.without_hospitals, vec!["04"]);
    }

    #[test]
    fn test_top_is_stable_and_truncated() {
        let mut units = vec![unit("01"), unit("02"), unit("03"), unit("04")];
        let hospitals = vec![
            hospital(0, Some("02")),
            hospital(1, Some("03")),
            hospital(2, Some("04")),
            hospital(3, Some("04")),
        ];
        let summary = DistrictSummary::build(&mut units, &hospitals, 3);
        let top: Vec<&str> = summary.top.iter().map(|u| u.code.as_str()).collect();
        assert_eq!(top, vec!["04", "02", "03"]);
        assert_eq!(summary.units.len(), 4);
    }

    #[test]
    fn test_no_hospitals_all_zero() {
        let mut units = vec![unit("01"), unit("02")];
        let summary = DistrictSummary::build(&mut units, &[], 10);
        assert_eq!(summary.without_hospitals, vec!["01", "02"]);
        assert_eq!(summary.hospitals_matched, 0);
    }
}
