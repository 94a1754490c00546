//! Feature sources.
//!
//! A source yields features one at a time, with geometry already in the
//! target CRS and normalized to the labels the converter dispatches on.

use geo_types::{Coord, Geometry, LineString, Polygon};
use serde_json::Value;
use thiserror::Error;

use crate::reproject::ReprojectError;

pub mod geojson;

pub use self::geojson::{GeoJsonSource, GeoJsonlSource};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed GeoJSON: {0}")]
    GeoJson(#[from] ::geojson::Error),
    #[error("malformed GeoJSON on line {line}: {source}")]
    Line {
        line: usize,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Reproject(#[from] ReprojectError),
}

/// Raw attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Integer(i64),
    /// Integers above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl AttributeValue {
    /// JSON `null` is an absent value; arrays and objects keep their JSON text.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(AttributeValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(AttributeValue::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Some(AttributeValue::Unsigned(u))
                } else {
                    n.as_f64().map(AttributeValue::Float)
                }
            }
            Value::String(s) => Some(AttributeValue::Text(s.clone())),
            other => Some(AttributeValue::Text(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<AttributeValue>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: Option<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Feature geometry, grouped into parts.
///
/// Single lines and polygons become one-part multi geometries; multipoints
/// become a `Point` geometry with one part per point.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Point(Vec<Coord<f64>>),
    MultiLineString(Vec<LineString<f64>>),
    MultiPolygon(Vec<Polygon<f64>>),
    /// Anything the converter does not handle, by label.
    Other(&'static str),
}

impl FeatureGeometry {
    pub fn label(&self) -> &'static str {
        match self {
            FeatureGeometry::Point(_) => "Point",
            FeatureGeometry::MultiLineString(_) => "MultiLineString",
            FeatureGeometry::MultiPolygon(_) => "MultiPolygon",
            FeatureGeometry::Other(label) => *label,
        }
    }

    pub fn part_count(&self) -> usize {
        match self {
            FeatureGeometry::Point(parts) => parts.len(),
            FeatureGeometry::MultiLineString(parts) => parts.len(),
            FeatureGeometry::MultiPolygon(parts) => parts.len(),
            FeatureGeometry::Other(_) => 0,
        }
    }
}

impl From<Geometry<f64>> for FeatureGeometry {
    fn from(geometry: Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(p) => FeatureGeometry::Point(vec![p.0]),
            Geometry::MultiPoint(mp) => {
                FeatureGeometry::Point(mp.0.into_iter().map(|p| p.0).collect())
            }
            Geometry::Line(line) => {
                FeatureGeometry::MultiLineString(vec![LineString::from(vec![line.start, line.end])])
            }
            Geometry::LineString(ls) => FeatureGeometry::MultiLineString(vec![ls]),
            Geometry::MultiLineString(mls) => FeatureGeometry::MultiLineString(mls.0),
            Geometry::Polygon(p) => FeatureGeometry::MultiPolygon(vec![p]),
            Geometry::MultiPolygon(mp) => FeatureGeometry::MultiPolygon(mp.0),
            Geometry::Rect(r) => FeatureGeometry::MultiPolygon(vec![r.to_polygon()]),
            Geometry::Triangle(t) => FeatureGeometry::MultiPolygon(vec![t.to_polygon()]),
            Geometry::GeometryCollection(_) => FeatureGeometry::Other("GeometryCollection"),
        }
    }
}

/// One input feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: FeatureGeometry,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
}

pub type FeatureIter = Box<dyn Iterator<Item = Result<Feature, SourceError>>>;
