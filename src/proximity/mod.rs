//! Proximity analysis: how many hospitals lie within a fixed radius of each
//! settlement, measured in a metric (UTM) projection.

mod engine;
mod index;
mod projection;

pub use engine::ProximityEngine;
pub use index::{HospitalIndex, IndexedHospital};
pub use projection::{Hemisphere, Projection};
