//! TOML configuration. Every field has a default, so an empty file (or no
//! file at all) reproduces the stock dashboard setup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::OperationalStatus;
use crate::proximity::Projection;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub hospital_columns: HospitalColumns,
    pub district_columns: DistrictColumns,
    pub settlement_columns: SettlementColumns,
    pub status: StatusConfig,
    pub proximity: ProximityConfig,
    pub districts: DistrictsConfig,
}

/// Text encoding of the hospital registry and of `.dbf` attribute tables
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Latin1,
    Utf8,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub hospitals: PathBuf,
    pub districts: PathBuf,
    pub settlements: PathBuf,
    pub encoding: Encoding,
    pub delimiter: char,
    /// `.dbf` encoding for layers without a `.cpg` file
    pub layer_encoding: Encoding,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            hospitals: PathBuf::from("data/hospitales.csv"),
            districts: PathBuf::from("data/distritos/distritos.shp"),
            settlements: PathBuf::from("data/centros_poblados/CCPP_IGN100K.shp"),
            encoding: Encoding::Latin1,
            delimiter: ',',
            layer_encoding: Encoding::Latin1,
        }
    }
}

/// Column names in the hospital registry (matched after trimming)
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HospitalColumns {
    pub status: String,
    pub latitude: String,
    pub longitude: String,
    pub unit_code: String,
    pub department: String,
    pub name: String,
}

impl Default for HospitalColumns {
    fn default() -> Self {
        Self {
            status: "Estado".to_string(),
            latitude: "NORTE".to_string(),
            longitude: "ESTE".to_string(),
            unit_code: "UBIGEO".to_string(),
            department: "Departamento".to_string(),
            name: "Nombre del establecimiento".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DistrictColumns {
    pub code: String,
    pub name: String,
}

impl Default for DistrictColumns {
    fn default() -> Self {
        Self {
            code: "IDDIST".to_string(),
            name: "DISTRITO".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SettlementColumns {
    pub region: String,
    pub name: String,
}

impl Default for SettlementColumns {
    fn default() -> Self {
        Self {
            region: "DEP".to_string(),
            name: "NOM_POBLAD".to_string(),
        }
    }
}

/// Accepted operational status per section.
///
/// Districts count FUNCIONANDO, the other sections ACTIVADO.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StatusConfig {
    pub districts: OperationalStatus,
    pub departments: OperationalStatus,
    pub proximity: OperationalStatus,
    pub national_map: OperationalStatus,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            districts: OperationalStatus::Functioning,
            departments: OperationalStatus::Activated,
            proximity: OperationalStatus::Activated,
            national_map: OperationalStatus::Activated,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProximityConfig {
    /// Buffer radius in meters
    pub radius_m: f64,
    /// Metric CRS used for distances
    pub projection: Projection,
    /// Regions to analyse, in output order. Empty means all of them.
    pub regions: Vec<String>,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            radius_m: 10_000.0,
            projection: Projection::utm(18, crate::proximity::Hemisphere::South),
            regions: vec!["LIMA".to_string(), "LORETO".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DistrictsConfig {
    pub top_n: usize,
}

impl Default for DistrictsConfig {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        if !(config.proximity.radius_m.is_finite() && config.proximity.radius_m > 0.0) {
            anyhow::bail!(
                "proximity.radius_m must be a positive number, got {}",
                config.proximity.radius_m
            );
        }
        Ok(config)
    }
}
