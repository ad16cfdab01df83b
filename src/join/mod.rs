//! Attribute joins and group-by counts.
//!
//! The join key is a code attribute, never geometry: hospitals are matched
//! to units by exact code equality.

mod departments;
mod units;

pub use departments::{DepartmentCount, DepartmentRanking};
pub use units::{attach_counts, count_by_unit, DistrictSummary, UnitCount};
