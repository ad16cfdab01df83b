//! Administrative units, settlements and proximity results.

use geo::{Centroid, Geometry, MultiPolygon, Point};
use serde::{Deserialize, Serialize};

use super::GeoPoint;
use crate::error::{AnalysisError, AnalysisResult};

/// A district (or department) boundary with its derived hospital count
#[derive(Debug, Clone)]
pub struct AdministrativeUnit {
    /// Unique join key (IDDIST)
    pub code: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    /// Derived on every run by the attribute join; 0 until then
    pub hospitals: u32,
}

impl AdministrativeUnit {
    pub fn new(code: String, name: String, geometry: MultiPolygon<f64>) -> Self {
        Self {
            code,
            name,
            geometry,
            hospitals: 0,
        }
    }
}

/// A populated centre (centro poblado) as read from the settlement layer
#[derive(Debug, Clone)]
pub struct Settlement {
    pub name: String,
    pub region: String,
    pub geometry: Geometry<f64>,
}

impl Settlement {
    pub fn new(name: String, region: String, geometry: Geometry<f64>) -> Self {
        Self {
            name,
            region,
            geometry,
        }
    }

    /// Point used for the buffer: the point itself, or the centroid of an
    /// area geometry computed in geographic coordinates.
    pub fn representative_point(&self) -> AnalysisResult<Point<f64>> {
        match &self.geometry {
            Geometry::Point(p) => Ok(*p),
            other => other.centroid().ok_or_else(|| {
                AnalysisError::Geometry(format!(
                    "settlement '{}' ({}) has an empty geometry",
                    self.name, self.region
                ))
            }),
        }
    }
}

/// A settlement with its nearby-hospital count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementAccess {
    /// Position in the input sequence (tie-break key)
    pub position: usize,
    pub name: String,
    pub region: String,
    /// Representative point in WGS84
    pub location: GeoPoint,
    pub nearby_hospitals: usize,
}

/// A hospital inside a settlement's buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyHospital {
    pub name: String,
    pub location: GeoPoint,
    /// Distance to the settlement in the projected CRS
    pub distance_m: f64,
}

/// Extremes of hospital access within one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityResult {
    pub region: String,
    pub most_isolated: SettlementAccess,
    pub most_concentrated: SettlementAccess,
    /// Hospitals in the most isolated settlement's buffer (for map layers)
    pub hospitals_near_isolated: Vec<NearbyHospital>,
    pub hospitals_near_concentrated: Vec<NearbyHospital>,
}
