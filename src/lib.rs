//! Hospaccess - hospital access analysis over administrative and
//! settlement boundaries.
//!
//! This library provides the loaders, joins and the proximity engine used by
//! the `hospaccess` report binary.

pub mod config;
pub mod error;
pub mod join;
pub mod loader;
pub mod models;
pub mod proximity;
pub mod sections;

pub use error::{AnalysisError, AnalysisResult, EmptyResultWarning, SchemaError};
pub use models::{AdministrativeUnit, HospitalRecord, ProximityResult, Settlement};
