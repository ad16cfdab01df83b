//! Core data models for the hospital access analysis.

pub mod hospital;
pub mod report;
pub mod territory;

pub use hospital::{GeoPoint, HospitalRecord, OperationalStatus};
pub use report::{AccessReport, SectionReport};
pub use territory::{
    AdministrativeUnit, NearbyHospital, ProximityResult, Settlement, SettlementAccess,
};
