//! GeoJSON exports for the national map (choropleth + markers).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use tracing::{error, info};

use hospaccess::models::{AdministrativeUnit, HospitalRecord};

/// One polygon feature per unit with `code`, `name` and `hospitals`
pub fn districts_collection(units: &[AdministrativeUnit]) -> FeatureCollection {
    let features = units
        .iter()
        .map(|unit| {
            let mut properties = JsonObject::new();
            properties.insert("code".to_string(), JsonValue::from(unit.code.clone()));
            properties.insert("name".to_string(), JsonValue::from(unit.name.clone()));
            properties.insert("hospitals".to_string(), JsonValue::from(unit.hospitals));
            feature(Value::from(&unit.geometry), properties)
        })
        .collect();

    collection(features)
}

/// One point feature per hospital
pub fn hospitals_collection(hospitals: &[HospitalRecord]) -> FeatureCollection {
    let features = hospitals
        .iter()
        .map(|hospital| {
            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), JsonValue::from(hospital.name.clone()));
            properties.insert(
                "status".to_string(),
                JsonValue::from(hospital.status.label().to_string()),
            );
            if let Some(code) = &hospital.unit_code {
                properties.insert("unit_code".to_string(), JsonValue::from(code.clone()));
            }
            if let Some(department) = &hospital.department {
                properties.insert("department".to_string(), JsonValue::from(department.clone()));
            }
            feature(Value::from(&hospital.location.to_point()), properties)
        })
        .collect();

    collection(features)
}

/// Write both map layers into `dir`
pub fn write_map_layers(
    dir: &Path,
    units: &[AdministrativeUnit],
    hospitals: &[HospitalRecord],
) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    write_collection(&dir.join("districts.geojson"), districts_collection(units))?;
    write_collection(&dir.join("hospitals.geojson"), hospitals_collection(hospitals))?;
    Ok(())
}

/// Write the map layers, logging a failure instead of returning it.
///
/// Returns whether both files were written.
pub fn export_map_layers(
    dir: &Path,
    units: &[AdministrativeUnit],
    hospitals: &[HospitalRecord],
) -> bool {
    match write_map_layers(dir, units, hospitals) {
        Ok(()) => true,
        Err(e) => {
            error!("GeoJSON export to {} failed: {:#}", dir.display(), e);
            false
        }
    }
}

fn write_collection(path: &Path, fc: FeatureCollection) -> Result<()> {
    let count = fc.features.len();
    fs::write(path, GeoJson::from(fc).to_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} features to {}", count, path.display());
    Ok(())
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use hospaccess::models::{GeoPoint, OperationalStatus};

    #[test]
    fn test_districts_collection_carries_counts() {
        let square = polygon![
            (x: -75.0, y: -10.0),
            (x: -74.0, y: -10.0),
            (x: -74.0, y: -9.0),
            (x: -75.0, y: -9.0),
        ];
        let mut unit = AdministrativeUnit::new(
            "150101".to_string(),
            "LIMA".to_string(),
            MultiPolygon(vec![square]),
        );
        unit.hospitals = 4;

        let fc = districts_collection(&[unit]);
        assert_eq!(fc.features.len(), 1);
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["hospitals"], JsonValue::from(4));
        assert_eq!(props["code"], JsonValue::from("150101"));
        assert!(matches!(
            fc.features[0].geometry.as_ref().unwrap().value,
            Value::MultiPolygon(_)
        ));
    }

    #[test]
    fn test_hospital_markers_are_lon_lat() {
        let hospital = HospitalRecord {
            row: 1,
            name: "Hospital A".to_string(),
            status: OperationalStatus::Activated,
            location: GeoPoint::new(-12.05, -77.04),
            unit_code: None,
            department: Some("LIMA".to_string()),
        };
        let fc = hospitals_collection(&[hospital]);
        let props = fc.features[0].properties.as_ref().unwrap();
        assert!(!props.contains_key("unit_code"));
        assert_eq!(props["status"], JsonValue::from("ACTIVADO"));
        match &fc.features[0].geometry.as_ref().unwrap().value {
            Value::Point(coords) => assert_eq!(coords, &vec![-77.04, -12.05]),
            other => panic!("expected a point, got {:?}", other),
        }
    }

    #[test]
    fn test_write_map_layers() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("maps");
        write_map_layers(&out, &[], &[]).unwrap();
        let text = std::fs::read_to_string(out.join("districts.geojson")).unwrap();
        assert!(text.contains("FeatureCollection"));
        assert!(out.join("hospitals.geojson").exists());
    }

    #[test]
    fn test_failed_export_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the export directory should be
        let blocker = dir.path().join("maps");
        std::fs::write(&blocker, "not a directory").unwrap();

        assert!(!export_map_layers(&blocker.join("nested"), &[], &[]));
        assert!(!export_map_layers(&blocker, &[], &[]));
        assert!(export_map_layers(&dir.path().join("ok"), &[], &[]));
    }
}
