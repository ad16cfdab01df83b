//! WGS84 → UTM forward projection.
//!
//! Distances between projected points are in meters, which is what the
//! buffer radius is expressed in. Series expansion after Snyder,
//! "Map Projections: A Working Manual" (USGS 1987), eqs. 8-9 to 8-10.

use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalysisError, AnalysisResult};

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// UTM is undefined outside this band (polar regions use UPS)
const MIN_LAT: f64 = -80.0;
const MAX_LAT: f64 = 84.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    North,
    South,
}

/// A WGS84 / UTM zone projected CRS (EPSG:326zz or EPSG:327zz)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Projection {
    zone: u8,
    hemisphere: Hemisphere,
}

impl Projection {
    /// Panics on a zone outside 1..=60; use [`Projection::from_epsg`] for
    /// untrusted input.
    pub fn utm(zone: u8, hemisphere: Hemisphere) -> Self {
        assert!((1..=60).contains(&zone), "UTM zone out of range: {}", zone);
        Self { zone, hemisphere }
    }

    pub fn from_epsg(code: u32) -> AnalysisResult<Self> {
        let (hemisphere, zone) = match code {
            32601..=32660 => (Hemisphere::North, code - 32600),
            32701..=32760 => (Hemisphere::South, code - 32700),
            _ => {
                return Err(AnalysisError::Projection(format!(
                    "EPSG:{} is not a WGS84 UTM zone",
                    code
                )))
            }
        };
        Ok(Self {
            zone: zone as u8,
            hemisphere,
        })
    }

    pub fn epsg(&self) -> u32 {
        let base = match self.hemisphere {
            Hemisphere::North => 32600,
            Hemisphere::South => 32700,
        };
        base + u32::from(self.zone)
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    fn central_meridian(&self) -> f64 {
        f64::from(self.zone) * 6.0 - 183.0
    }

    /// Project a lon/lat point (degrees) to easting/northing (meters)
    pub fn project(&self, point: Point<f64>) -> AnalysisResult<Point<f64>> {
        let (lon, lat) = (point.x(), point.y());
        if !lon.is_finite() || !lat.is_finite() {
            return Err(AnalysisError::Projection(format!(
                "non-finite coordinate ({}, {})",
                lon, lat
            )));
        }
        if !(MIN_LAT..=MAX_LAT).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(AnalysisError::Projection(format!(
                "({}, {}) is outside the UTM domain",
                lon, lat
            )));
        }

        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lon - self.central_meridian()).to_radians();

        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let m = WGS84_A
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

        let easting = K0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + FALSE_EASTING;

        let mut northing = K0
            * (m + n
                * tan_phi
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));
        if self.hemisphere == Hemisphere::South {
            northing += FALSE_NORTHING_SOUTH;
        }

        Ok(Point::new(easting, northing))
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Projection {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("EPSG:"))
            .map(|_| &trimmed[5..])
            .unwrap_or(trimmed);
        let code: u32 = code
            .trim()
            .parse()
            .map_err(|_| AnalysisError::Projection(format!("invalid CRS '{}'", s)))?;
        Self::from_epsg(code)
    }
}

impl TryFrom<String> for Projection {
    type Error = AnalysisError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utm18s() -> Projection {
        Projection::utm(18, Hemisphere::South)
    }

    #[test]
    fn test_epsg_codes() {
        assert_eq!(Projection::from_epsg(32718).unwrap(), utm18s());
        assert_eq!(
            Projection::from_epsg(32617).unwrap(),
            Projection::utm(17, Hemisphere::North)
        );
        assert!(Projection::from_epsg(4326).is_err());
        assert!(Projection::from_epsg(32700).is_err());
        assert!(Projection::from_epsg(32761).is_err());
        assert_eq!(utm18s().epsg(), 32718);
        assert_eq!(utm18s().to_string(), "EPSG:32718");
    }

    #[test]
    fn test_parse() {
        assert_eq!("EPSG:32718".parse::<Projection>().unwrap(), utm18s());
        assert_eq!("epsg:32718".parse::<Projection>().unwrap(), utm18s());
        assert_eq!("32718".parse::<Projection>().unwrap(), utm18s());
        assert!("EPSG:abc".parse::<Projection>().is_err());
        assert!("".parse::<Projection>().is_err());
    }

    #[test]
    fn test_origin_of_zone() {
        let p = utm18s().project(Point::new(-75.0, 0.0)).unwrap();
        assert!((p.x() - 500_000.0).abs() < 1e-6);
        assert!((p.y() - 10_000_000.0).abs() < 1e-6);

        let north = Projection::utm(18, Hemisphere::North)
            .project(Point::new(-75.0, 0.0))
            .unwrap();
        assert!(north.y().abs() < 1e-6);
    }

    #[test]
    fn test_known_location() {
        // Lima, Plaza de Armas area
        let p = utm18s().project(Point::new(-77.0428, -12.0464)).unwrap();
        assert!((p.x() - 277_617.45).abs() < 1.0, "easting {}", p.x());
        assert!((p.y() - 8_667_487.90).abs() < 1.0, "northing {}", p.y());
    }

    #[test]
    fn test_distances_are_metric() {
        let proj = utm18s();
        let a = proj.project(Point::new(-75.0, -10.0)).unwrap();
        let b = proj.project(Point::new(-75.0, -10.09)).unwrap();
        let c = proj.project(Point::new(-74.9, -10.0)).unwrap();

        let d = |p: Point<f64>, q: Point<f64>| ((p.x() - q.x()).powi(2) + (p.y() - q.y()).powi(2)).sqrt();
        // ~0.09 degrees of latitude, ~0.1 degrees of longitude at 10S
        assert!((d(a, b) - 9_950.0).abs() < 50.0, "got {}", d(a, b));
        assert!((d(a, c) - 10_960.0).abs() < 50.0, "got {}", d(a, c));
    }

    #[test]
    fn test_rejects_out_of_domain() {
        let proj = utm18s();
        assert!(proj.project(Point::new(-75.0, -85.0)).is_err());
        assert!(proj.project(Point::new(f64::NAN, -10.0)).is_err());
        assert!(proj.project(Point::new(-200.0, -10.0)).is_err());
    }
}
