//! Boundary and settlement layers (Shapefile or GeoJSON).

use geo::Geometry;
use geojson::GeoJson;
use hashbrown::HashMap;
use dbase::FieldValue;
use shapefile::Shape;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::Encoding;
use crate::error::{AnalysisError, AnalysisResult, SchemaError};

/// One feature: an optional geometry plus attributes rendered as text
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: HashMap<String, String>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry<f64>>) -> Self {
        Self {
            geometry,
            properties: HashMap::new(),
        }
    }

    /// Attribute value; absent and blank values both read as `None`
    pub fn get(&self, column: &str) -> Option<&str> {
        self.properties
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Insert an attribute, trimming the column name and the value
    pub fn set(&mut self, column: &str, value: &str) {
        self.properties
            .insert(column.trim().to_string(), value.trim().to_string());
    }
}

/// A layer of features read from disk, in file order
#[derive(Debug, Clone)]
pub struct FeatureLayer {
    dataset: String,
    columns: Vec<String>,
    features: Vec<Feature>,
}

impl FeatureLayer {
    /// Build a layer from already parsed features; columns are the union of
    /// the attribute names seen.
    pub fn new(dataset: impl Into<String>, features: Vec<Feature>) -> Self {
        Self::with_schema(dataset, Vec::new(), features)
    }

    /// Like [`FeatureLayer::new`], but `schema` columns exist even when no
    /// feature carries a value for them (or there are no features at all).
    pub fn with_schema(
        dataset: impl Into<String>,
        schema: Vec<String>,
        features: Vec<Feature>,
    ) -> Self {
        let columns: BTreeSet<String> = schema
            .into_iter()
            .map(|c| c.trim().to_string())
            .chain(features.iter().flat_map(|f| f.properties.keys().cloned()))
            .collect();
        Self {
            dataset: dataset.into(),
            columns: columns.into_iter().collect(),
            features,
        }
    }

    /// Read a `.shp` (attributes from the sibling `.dbf`) or a GeoJSON
    /// FeatureCollection. Coordinates must already be WGS84 lon/lat.
    ///
    /// `encoding` applies to `.dbf` text unless a `.cpg` file names one.
    /// GeoJSON is always UTF-8.
    pub fn open(path: &Path, encoding: Encoding) -> AnalysisResult<Self> {
        if !path.exists() {
            return Err(AnalysisError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .ok_or_else(|| {
                AnalysisError::UnsupportedFormat(format!("{} has no extension", path.display()))
            })?;

        let dataset = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("layer")
            .to_string();

        info!("Loading layer {}", path.display());

        let (schema, features) = match extension.as_str() {
            "shp" => read_shapefile(path, encoding)?,
            "json" | "geojson" => (Vec::new(), read_geojson(path)?),
            other => return Err(AnalysisError::UnsupportedFormat(other.to_string())),
        };

        let layer = Self::with_schema(dataset, schema, features);
        info!(
            "Loaded {} features with {} columns from {}",
            layer.features.len(),
            layer.columns.len(),
            layer.dataset
        );
        Ok(layer)
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Check that every named column exists; reports the first missing one
    pub fn require(&self, names: &[&str]) -> Result<(), SchemaError> {
        for name in names {
            if !self.columns.iter().any(|c| c == name) {
                return Err(SchemaError::new(*name, &self.dataset));
            }
        }
        Ok(())
    }
}

/// Column names from the `.dbf` header, then every feature in file order
fn read_shapefile(path: &Path, encoding: Encoding) -> AnalysisResult<(Vec<String>, Vec<Feature>)> {
    let dbf_path = path.with_extension("dbf");
    let table = match dbf_encoding(path, encoding) {
        Encoding::Latin1 => {
            dbase::Reader::from_path_with_encoding(&dbf_path, yore::code_pages::CP1252)?
        }
        Encoding::Utf8 => {
            dbase::Reader::from_path_with_encoding(&dbf_path, dbase::encoding::UnicodeLossy)?
        }
    };
    let schema: Vec<String> = table
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();

    let shapes = shapefile::ShapeReader::from_path(path)?;
    let mut reader = shapefile::Reader::new(shapes, table);
    let mut features = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        let mut feature = Feature::new(shape_to_geometry(shape)?);
        for (name, value) in record {
            if let Some(text) = field_to_string(value) {
                feature.set(&name, &text);
            }
        }
        features.push(feature);
    }

    Ok((schema, features))
}

/// Code page from a sibling `.cpg` file, falling back to `configured`
fn dbf_encoding(path: &Path, configured: Encoding) -> Encoding {
    let declared = match fs::read_to_string(path.with_extension("cpg")) {
        Ok(text) => text,
        Err(_) => return configured,
    };
    match cpg_encoding(&declared) {
        Some(encoding) => {
            debug!("{} declares code page {}", path.display(), declared.trim());
            encoding
        }
        None => configured,
    }
}

fn cpg_encoding(declared: &str) -> Option<Encoding> {
    let name: String = declared
        .trim()
        .to_ascii_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    match name.as_str() {
        "UTF8" | "65001" => Some(Encoding::Utf8),
        "1252" | "CP1252" | "WINDOWS1252" | "ANSI1252" | "88591" | "ISO88591" | "LATIN1" => {
            Some(Encoding::Latin1)
        }
        _ => None,
    }
}

fn shape_to_geometry(shape: Shape) -> AnalysisResult<Option<Geometry<f64>>> {
    fn convert<S, G>(shape: S) -> AnalysisResult<G>
    where
        S: TryInto<G>,
        S::Error: std::fmt::Debug,
    {
        shape
            .try_into()
            .map_err(|e| AnalysisError::Geometry(format!("failed to convert shape: {:?}", e)))
    }

    let geometry = match shape {
        Shape::Point(p) => Geometry::Point(convert(p)?),
        Shape::PointM(p) => Geometry::Point(convert(p)?),
        Shape::PointZ(p) => Geometry::Point(convert(p)?),
        Shape::Polygon(p) => Geometry::MultiPolygon(convert(p)?),
        Shape::PolygonM(p) => Geometry::MultiPolygon(convert(p)?),
        Shape::PolygonZ(p) => Geometry::MultiPolygon(convert(p)?),
        Shape::Multipoint(p) => Geometry::MultiPoint(convert(p)?),
        Shape::NullShape => return Ok(None),
        other => {
            debug!("Skipping unsupported shape type {:?}", other.shapetype());
            return Ok(None);
        }
    };
    Ok(Some(geometry))
}

fn field_to_string(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(s) => s,
        FieldValue::Memo(s) => Some(s),
        FieldValue::Numeric(n) => n.map(format_number),
        FieldValue::Float(f) => f.map(|f| format_number(f as f64)),
        FieldValue::Double(d) => Some(format_number(d)),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Logical(b) => b.map(|b| b.to_string()),
        FieldValue::Date(d) => d.map(|d| format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())),
        _ => None,
    }
}

/// Integral numbers are written without a fractional part so numeric codes
/// compare equal to their text form.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn read_geojson(path: &Path) -> AnalysisResult<Vec<Feature>> {
    let content = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson: GeoJson = content.parse()?;
    parse_geojson(geojson)
}

pub(crate) fn parse_geojson(geojson: GeoJson) -> AnalysisResult<Vec<Feature>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(AnalysisError::UnsupportedFormat(
                "GeoJSON must be a FeatureCollection".to_string(),
            ))
        }
    };

    let mut features = Vec::with_capacity(collection.features.len());
    for gj_feature in collection.features {
        let geometry = match gj_feature.geometry {
            Some(g) => Some(Geometry::<f64>::try_from(g.value)?),
            None => None,
        };

        let mut feature = Feature::new(geometry);
        if let Some(props) = gj_feature.properties {
            for (name, value) in props {
                let text = match value {
                    // Keeps the column; blank values read as absent
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => match n.as_i64() {
                        Some(i) => i.to_string(),
                        None => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
                    },
                    other => other.to_string(),
                };
                feature.set(&name, &text);
            }
        }
        features.push(feature);
    }

    Ok(features)
}
