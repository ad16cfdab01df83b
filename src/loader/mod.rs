//! Input loading: the hospital registry and the geometry layers.
//!
//! Loaders trim column names, validate the columns a section needs and drop
//! incomplete rows. Nothing here aggregates.

mod layers;
mod registry;

pub use layers::{Feature, FeatureLayer};
pub use registry::HospitalRegistry;

use geo::{Geometry, MultiPolygon};
use hashbrown::HashSet;
use tracing::{debug, info, warn};

use crate::config::{DistrictColumns, SettlementColumns};
use crate::error::SchemaError;
use crate::models::{AdministrativeUnit, Settlement};

/// Build administrative units from a polygon layer.
///
/// Features without a code or without an area geometry are skipped.
pub fn administrative_units(
    layer: &FeatureLayer,
    columns: &DistrictColumns,
) -> Result<Vec<AdministrativeUnit>, SchemaError> {
    layer.require(&[columns.code.as_str(), columns.name.as_str()])?;

    let mut units = Vec::with_capacity(layer.len());
    let mut seen = HashSet::new();

    for (i, feature) in layer.features().iter().enumerate() {
        let code = match feature.get(&columns.code) {
            Some(code) => code.to_string(),
            None => {
                debug!("Feature {} in {} has no unit code", i, layer.dataset());
                continue;
            }
        };

        let geometry = match &feature.geometry {
            Some(Geometry::MultiPolygon(mp)) => mp.clone(),
            Some(Geometry::Polygon(p)) => MultiPolygon::new(vec![p.clone()]),
            _ => {
                debug!("Unit {} has no polygon geometry, skipping", code);
                continue;
            }
        };

        if !seen.insert(code.clone()) {
            warn!("Duplicate unit code {} in {}", code, layer.dataset());
        }

        let name = feature.get(&columns.name).unwrap_or_default().to_string();
        units.push(AdministrativeUnit::new(code, name, geometry));
    }

    info!("Built {} administrative units", units.len());
    Ok(units)
}

/// Build settlements from a point or polygon layer, keeping only `regions`
/// (all regions when the list is empty). Input order is preserved.
pub fn settlements(
    layer: &FeatureLayer,
    columns: &SettlementColumns,
    regions: &[String],
) -> Result<Vec<Settlement>, SchemaError> {
    layer.require(&[columns.region.as_str(), columns.name.as_str()])?;

    let mut settlements = Vec::new();
    let mut incomplete = 0usize;

    for feature in layer.features() {
        let (region, geometry) = match (feature.get(&columns.region), &feature.geometry) {
            (Some(region), Some(geometry)) => (region, geometry),
            _ => {
                incomplete += 1;
                continue;
            }
        };

        if !regions.is_empty() && !regions.iter().any(|r| r == region) {
            continue;
        }

        let name = feature.get(&columns.name).unwrap_or_default().to_string();
        settlements.push(Settlement::new(name, region.to_string(), geometry.clone()));
    }

    if incomplete > 0 {
        debug!(
            "Dropped {} settlements without region or geometry",
            incomplete
        );
    }
    info!("Built {} settlements", settlements.len());
    Ok(settlements)
}
