//! Spatial index over projected hospital points.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::info;

use super::Projection;
use crate::error::AnalysisResult;
use crate::models::HospitalRecord;

/// Wrapper for R-tree indexing of a projected hospital
#[derive(Debug, Clone, Copy)]
pub struct IndexedHospital {
    /// Position in the hospital slice the index was built from
    pub position: usize,
    point: [f64; 2],
}

impl IndexedHospital {
    pub fn point(&self) -> [f64; 2] {
        self.point
    }
}

impl RTreeObject for IndexedHospital {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedHospital {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Hospitals in a metric CRS, queried by disk
pub struct HospitalIndex {
    tree: RTree<IndexedHospital>,
}

impl HospitalIndex {
    /// Project every hospital and bulk-load the tree.
    ///
    /// Any hospital that cannot be projected fails the whole build.
    pub fn build(hospitals: &[HospitalRecord], projection: &Projection) -> AnalysisResult<Self> {
        let indexed = hospitals
            .iter()
            .enumerate()
            .map(|(position, hospital)| {
                let p = projection.project(hospital.location.to_point())?;
                Ok(IndexedHospital {
                    position,
                    point: [p.x(), p.y()],
                })
            })
            .collect::<AnalysisResult<Vec<_>>>()?;

        let tree = RTree::bulk_load(indexed);
        info!(
            "Hospital index built with {} entries in {}",
            tree.size(),
            projection
        );
        Ok(Self { tree })
    }

    /// Hospitals whose distance to `center` is at most `radius`, boundary
    /// included, ordered by their position in the input.
    pub fn within(&self, center: [f64; 2], radius: f64) -> Vec<&IndexedHospital> {
        let mut found: Vec<&IndexedHospital> = self
            .tree
            .locate_within_distance(center, radius * radius)
            .collect();
        found.sort_by_key(|h| h.position);
        found
    }

    pub fn count_within(&self, center: [f64; 2], radius: f64) -> usize {
        self.tree
            .locate_within_distance(center, radius * radius)
            .count()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, OperationalStatus};
    use crate::proximity::Hemisphere;

    fn hospital(lat: f64, lon: f64) -> HospitalRecord {
        HospitalRecord {
            row: 0,
            name: String::new(),
            status: OperationalStatus::Activated,
            location: GeoPoint::new(lat, lon),
            unit_code: None,
            department: None,
        }
    }

    /// Deterministic pseudo-random scatter around (-75, -10)
    fn scatter(n: usize) -> Vec<HospitalRecord> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 10_000) as f64 / 10_000.0
        };
        (0..n)
            .map(|_| hospital(-10.5 + next(), -75.5 + next()))
            .collect()
    }

    #[test]
    fn test_index_matches_naive_scan() {
        let projection = Projection::utm(18, Hemisphere::South);
        let hospitals = scatter(500);
        let index = HospitalIndex::build(&hospitals, &projection).unwrap();
        assert_eq!(index.len(), 500);

        let projected: Vec<[f64; 2]> = hospitals
            .iter()
            .map(|h| {
                let p = projection.project(h.location.to_point()).unwrap();
                [p.x(), p.y()]
            })
            .collect();

        for center in projected.iter().step_by(25) {
            let radius = 10_000.0;
            let naive: Vec<usize> = projected
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    let dx = p[0] - center[0];
                    let dy = p[1] - center[1];
                    dx * dx + dy * dy <= radius * radius
                })
                .map(|(i, _)| i)
                .collect();
            let indexed: Vec<usize> = index.within(*center, radius).iter().map(|h| h.position).collect();
            assert_eq!(indexed, naive);
            assert_eq!(index.count_within(*center, radius), naive.len());
        }
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let index = HospitalIndex {
            tree: RTree::bulk_load(vec![IndexedHospital {
                position: 0,
                point: [0.0, 0.0],
            }]),
        };
        // 3-4-5 triangle: exactly on the circle
        assert_eq!(index.count_within([3_000.0, 4_000.0], 5_000.0), 1);
        assert_eq!(index.count_within([3_000.0, 4_000.0], 4_999.0), 0);
    }

    #[test]
    fn test_unprojectable_hospital_fails_build() {
        let projection = Projection::utm(18, Hemisphere::South);
        let hospitals = vec![hospital(-10.0, -75.0), hospital(-89.0, -75.0)];
        assert!(HospitalIndex::build(&hospitals, &projection).is_err());
    }

    #[test]
    fn test_empty_index() {
        let projection = Projection::utm(18, Hemisphere::South);
        let index = HospitalIndex::build(&[], &projection).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.count_within([500_000.0, 9_000_000.0], 10_000.0), 0);
    }
}
