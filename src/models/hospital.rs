//! Hospital registry records.

use serde::{Deserialize, Serialize};

/// Operational status of an establishment as written in the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationalStatus {
    /// FUNCIONANDO
    Functioning,
    /// ACTIVADO
    Activated,
    /// Any other label, kept verbatim
    Other(String),
}

impl OperationalStatus {
    /// Parse a registry label. Matching is exact apart from surrounding
    /// whitespace; unknown labels are kept as `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "FUNCIONANDO" | "FUNCTIONING" => OperationalStatus::Functioning,
            "ACTIVADO" | "ACTIVATED" => OperationalStatus::Activated,
            other => OperationalStatus::Other(other.to_string()),
        }
    }

    /// Label as it appears in the registry
    pub fn label(&self) -> &str {
        match self {
            OperationalStatus::Functioning => "FUNCIONANDO",
            OperationalStatus::Activated => "ACTIVADO",
            OperationalStatus::Other(label) => label,
        }
    }
}

impl From<String> for OperationalStatus {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<OperationalStatus> for String {
    fn from(status: OperationalStatus) -> Self {
        status.label().to_string()
    }
}

impl std::fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Geographic point (lat/lon, WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// As a `geo` point (x = lon, y = lat)
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(p: geo::Point<f64>) -> Self {
        Self { lat: p.y(), lon: p.x() }
    }
}

/// One row of the hospital registry that passed the status filter and has
/// both coordinates. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalRecord {
    /// Zero-based data row in the source file
    pub row: usize,
    pub name: String,
    pub status: OperationalStatus,
    pub location: GeoPoint,
    /// Administrative unit code (UBIGEO), when the column exists and is filled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(
            OperationalStatus::from_label("FUNCIONANDO"),
            OperationalStatus::Functioning
        );
        assert_eq!(
            OperationalStatus::from_label(" ACTIVATED "),
            OperationalStatus::Activated
        );
        assert_eq!(
            OperationalStatus::from_label("CERRADO"),
            OperationalStatus::Other("CERRADO".to_string())
        );
        // Case-sensitive, like the registry filter
        assert_eq!(
            OperationalStatus::from_label("activado"),
            OperationalStatus::Other("activado".to_string())
        );
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&OperationalStatus::Activated).unwrap();
        assert_eq!(json, "\"ACTIVADO\"");
        let status: OperationalStatus = serde_json::from_str("\"FUNCTIONING\"").unwrap();
        assert_eq!(status, OperationalStatus::Functioning);
    }

    #[test]
    fn test_geo_point_axis_order() {
        let p = GeoPoint::new(-12.05, -77.04).to_point();
        assert_eq!(p.x(), -77.04);
        assert_eq!(p.y(), -12.05);
        assert_eq!(GeoPoint::from(p), GeoPoint::new(-12.05, -77.04));
    }
}
