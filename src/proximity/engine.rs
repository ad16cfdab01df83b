//! Hospital counts within a fixed radius of each settlement, and the
//! most isolated / most concentrated settlement per region.

use rayon::prelude::*;
use tracing::{debug, info};

use super::{HospitalIndex, Projection};
use crate::config::ProximityConfig;
use crate::error::AnalysisResult;
use crate::models::{
    GeoPoint, HospitalRecord, NearbyHospital, ProximityResult, Settlement, SettlementAccess,
};

/// Stateless radius search. The same inputs always give the same output.
#[derive(Debug, Clone)]
pub struct ProximityEngine {
    radius_m: f64,
    projection: Projection,
}

/// A measured settlement together with its projected point
struct Measured {
    access: SettlementAccess,
    projected: [f64; 2],
}

impl ProximityEngine {
    pub fn new(radius_m: f64, projection: Projection) -> Self {
        Self {
            radius_m,
            projection,
        }
    }

    pub fn from_config(config: &ProximityConfig) -> Self {
        Self::new(config.radius_m, config.projection)
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Nearby-hospital count for every settlement, in input order
    pub fn settlement_access(
        &self,
        settlements: &[Settlement],
        hospitals: &[HospitalRecord],
    ) -> AnalysisResult<Vec<SettlementAccess>> {
        let index = HospitalIndex::build(hospitals, &self.projection)?;
        let all: Vec<usize> = (0..settlements.len()).collect();
        Ok(self
            .measure(settlements, &all, &index)?
            .into_iter()
            .map(|m| m.access)
            .collect())
    }

    /// Extremes per region, in the order of `regions`.
    ///
    /// An empty `regions` list means every region, in order of first
    /// appearance. Regions without settlements produce no entry.
    pub fn run(
        &self,
        settlements: &[Settlement],
        hospitals: &[HospitalRecord],
        regions: &[String],
    ) -> AnalysisResult<Vec<ProximityResult>> {
        let regions = if regions.is_empty() {
            regions_in_order(settlements)
        } else {
            regions.to_vec()
        };

        let selected: Vec<usize> = settlements
            .iter()
            .enumerate()
            .filter(|(_, s)| regions.contains(&s.region))
            .map(|(i, _)| i)
            .collect();

        let index = HospitalIndex::build(hospitals, &self.projection)?;
        let measured = self.measure(settlements, &selected, &index)?;

        let mut results = Vec::new();
        for region in &regions {
            let group: Vec<&Measured> = measured
                .iter()
                .filter(|m| &m.access.region == region)
                .collect();

            let (isolated, concentrated) = match extremes(&group) {
                Some(pair) => pair,
                None => {
                    info!("No settlements in region {}, skipping", region);
                    continue;
                }
            };

            info!(
                "{}: most isolated {} ({}), most concentrated {} ({})",
                region,
                isolated.access.name,
                isolated.access.nearby_hospitals,
                concentrated.access.name,
                concentrated.access.nearby_hospitals
            );

            results.push(ProximityResult {
                region: region.clone(),
                hospitals_near_isolated: self.nearby(&index, hospitals, isolated.projected),
                hospitals_near_concentrated: self.nearby(
                    &index,
                    hospitals,
                    concentrated.projected,
                ),
                most_isolated: isolated.access.clone(),
                most_concentrated: concentrated.access.clone(),
            });
        }

        Ok(results)
    }

    /// Representative point (geographic centroid), projection, then count.
    /// Counting runs in parallel; the collected order is the input order.
    fn measure(
        &self,
        settlements: &[Settlement],
        positions: &[usize],
        index: &HospitalIndex,
    ) -> AnalysisResult<Vec<Measured>> {
        let located = positions
            .iter()
            .map(|&position| {
                let settlement = &settlements[position];
                let point = settlement.representative_point()?;
                let projected = self.projection.project(point)?;
                Ok((position, point, [projected.x(), projected.y()]))
            })
            .collect::<AnalysisResult<Vec<_>>>()?;

        let measured: Vec<Measured> = located
            .par_iter()
            .map(|&(position, point, projected)| {
                let settlement = &settlements[position];
                Measured {
                    access: SettlementAccess {
                        position,
                        name: settlement.name.clone(),
                        region: settlement.region.clone(),
                        location: GeoPoint::from(point),
                        nearby_hospitals: index.count_within(projected, self.radius_m),
                    },
                    projected,
                }
            })
            .collect();

        debug!(
            "Measured {} settlements against {} hospitals",
            measured.len(),
            index.len()
        );
        Ok(measured)
    }

    fn nearby(
        &self,
        index: &HospitalIndex,
        hospitals: &[HospitalRecord],
        center: [f64; 2],
    ) -> Vec<NearbyHospital> {
        index
            .within(center, self.radius_m)
            .into_iter()
            .map(|h| {
                let hospital = &hospitals[h.position];
                let p = h.point();
                NearbyHospital {
                    name: hospital.name.clone(),
                    location: hospital.location,
                    distance_m: ((p[0] - center[0]).powi(2) + (p[1] - center[1]).powi(2)).sqrt(),
                }
            })
            .collect()
    }
}

fn regions_in_order(settlements: &[Settlement]) -> Vec<String> {
    let mut regions: Vec<String> = Vec::new();
    for s in settlements {
        if !regions.contains(&s.region) {
            regions.push(s.region.clone());
        }
    }
    regions
}

/// (argmin, argmax) of the nearby count; ties go to the earliest entry
fn extremes<'a>(group: &[&'a Measured]) -> Option<(&'a Measured, &'a Measured)> {
    let (first, rest) = group.split_first()?;
    let mut min = *first;
    let mut max = *first;
    for &m in rest {
        if m.access.nearby_hospitals < min.access.nearby_hospitals {
            min = m;
        }
        if m.access.nearby_hospitals > max.access.nearby_hospitals {
            max = m;
        }
    }
    Some((min, max))
}
