//! One function per dashboard section.
//!
//! Each section validates the columns it needs, applies its own status
//! filter and returns its own result, so a schema problem in one section
//! does not stop the others.

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AnalysisResult, EmptyResultWarning};
use crate::join::{DepartmentRanking, DistrictSummary};
use crate::loader::{self, FeatureLayer, HospitalRegistry};
use crate::models::{AdministrativeUnit, HospitalRecord, OperationalStatus, ProximityResult};
use crate::proximity::ProximityEngine;

/// District counts together with the joined inputs (for map exports)
#[derive(Debug, Clone)]
pub struct DistrictAnalysis {
    pub units: Vec<AdministrativeUnit>,
    pub hospitals: Vec<HospitalRecord>,
    pub summary: DistrictSummary,
}

/// Hospitals per district for the given status filter (left join on code)
pub fn districts(
    registry: &HospitalRegistry,
    layer: &FeatureLayer,
    config: &Config,
    status: &OperationalStatus,
) -> AnalysisResult<DistrictAnalysis> {
    if layer.is_empty() {
        return Err(EmptyResultWarning::new(format!("districts in {}", layer.dataset())).into());
    }
    let columns = &config.hospital_columns;
    registry.require(&[columns.unit_code.as_str()])?;

    let hospitals = registry.hospitals(columns, status)?;
    let mut units = loader::administrative_units(layer, &config.district_columns)?;
    if units.is_empty() {
        return Err(EmptyResultWarning::new(format!("districts in {}", layer.dataset())).into());
    }

    let summary = DistrictSummary::build(&mut units, &hospitals, config.districts.top_n);
    Ok(DistrictAnalysis {
        units,
        hospitals,
        summary,
    })
}

/// Hospitals per department, ranked
pub fn departments(registry: &HospitalRegistry, config: &Config) -> AnalysisResult<DepartmentRanking> {
    let columns = &config.hospital_columns;
    registry.require(&[columns.department.as_str()])?;

    let hospitals = registry.hospitals(columns, &config.status.departments)?;
    let ranking = DepartmentRanking::from_hospitals(&hospitals);

    match ranking.extremes() {
        Ok((most, least)) => {
            info!(
                "Most hospitals: {} ({}), fewest: {} ({})",
                most.department, most.hospitals, least.department, least.hospitals
            );
            Ok(ranking)
        }
        Err(warning) => {
            warn!("{}", warning);
            Err(warning.into())
        }
    }
}

/// Most isolated and most concentrated settlement per configured region
pub fn proximity(
    registry: &HospitalRegistry,
    layer: &FeatureLayer,
    config: &Config,
) -> AnalysisResult<Vec<ProximityResult>> {
    if layer.is_empty() {
        return Err(EmptyResultWarning::new(format!("settlements in {}", layer.dataset())).into());
    }
    let hospitals = registry.hospitals(&config.hospital_columns, &config.status.proximity)?;
    let settlements = loader::settlements(
        layer,
        &config.settlement_columns,
        &config.proximity.regions,
    )?;

    let engine = ProximityEngine::from_config(&config.proximity);
    info!(
        "Counting hospitals within {} m of {} settlements ({})",
        engine.radius_m(),
        settlements.len(),
        engine.projection()
    );
    engine.run(&settlements, &hospitals, &config.proximity.regions)
}

/// District counts and hospital markers for the national map
pub fn national_map(
    registry: &HospitalRegistry,
    layer: &FeatureLayer,
    config: &Config,
) -> AnalysisResult<DistrictAnalysis> {
    districts(registry, layer, config, &config.status.national_map)
}
