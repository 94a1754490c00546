use ::geojson::{Feature as JsonFeature, FeatureReader};
use geo_types::Geometry;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::Path;

use super::{Attribute, AttributeValue, Feature, FeatureGeometry, SourceError};
use crate::reproject::Reprojector;

fn open_reader(path: &Path) -> Result<Box<dyn Read>, SourceError> {
    if path == Path::new("-") {
        return Ok(Box::new(std::io::stdin()));
    }
    Ok(Box::new(File::open(path)?))
}

fn to_feature(json: JsonFeature, reprojector: &Reprojector) -> Result<Feature, SourceError> {
    let geometry = match json.geometry {
        Some(geometry) => {
            let geometry = Geometry::<f64>::try_from(geometry)?;
            FeatureGeometry::from(reprojector.apply(geometry)?)
        }
        None => FeatureGeometry::Other("None"),
    };

    let attributes = json
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let value = AttributeValue::from_json(&value);
            Attribute::new(name, value)
        })
        .collect();

    Ok(Feature {
        geometry,
        attributes,
    })
}

/// Streams the features of a GeoJSON `FeatureCollection`.
pub struct GeoJsonSource {
    features: Box<dyn Iterator<Item = ::geojson::Result<JsonFeature>>>,
    reprojector: Reprojector,
}

impl GeoJsonSource {
    pub fn open(path: &Path, reprojector: Reprojector) -> Result<Self, SourceError> {
        let reader = open_reader(path)?;
        Ok(Self::from_reader(reader, reprojector))
    }

    pub fn from_reader<R: Read + 'static>(reader: R, reprojector: Reprojector) -> Self {
        let features = FeatureReader::from_reader(BufReader::new(reader)).features();
        Self {
            features: Box::new(features),
            reprojector,
        }
    }
}

impl Iterator for GeoJsonSource {
    type Item = Result<Feature, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let json = self.features.next()?;
        Some(
            json.map_err(SourceError::from)
                .and_then(|f| to_feature(f, &self.reprojector)),
        )
    }
}

/// Reads newline-delimited GeoJSON features, one per line.
pub struct GeoJsonlSource {
    lines: Lines<BufReader<Box<dyn Read>>>,
    line_number: usize,
    reprojector: Reprojector,
}

impl GeoJsonlSource {
    pub fn open(path: &Path, reprojector: Reprojector) -> Result<Self, SourceError> {
        let reader = open_reader(path)?;
        Ok(Self::from_reader(reader, reprojector))
    }

    pub fn from_reader<R: Read + 'static>(reader: R, reprojector: Reprojector) -> Self {
        let reader: Box<dyn Read> = Box::new(reader);
        Self {
            lines: BufReader::new(reader).lines(),
            line_number: 0,
            reprojector,
        }
    }
}

impl Iterator for GeoJsonlSource {
    type Item = Result<Feature, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let parsed = serde_json::from_str::<JsonFeature>(&line).map_err(|source| {
                SourceError::Line {
                    line: self.line_number,
                    source,
                }
            });
            return Some(parsed.and_then(|f| to_feature(f, &self.reprojector)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [13.4, 52.5]},
                "properties": {"name": "Berlin", "population": 3645000, "area": 891.8, "note": null}
            },
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
                "properties": {"highway": "residential"}
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {}
            }
        ]
    }"#;

    #[test]
    fn reads_feature_collection_in_order() {
        let source = GeoJsonSource::from_reader(Cursor::new(COLLECTION), Reprojector::identity());
        let features: Vec<Feature> = source.collect::<Result<_, _>>().unwrap();

        assert_eq!(features.len(), 3);

        let berlin = &features[0];
        assert_eq!(berlin.geometry, FeatureGeometry::Point(vec![(13.4, 52.5).into()]));
        let names: Vec<&str> = berlin.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["name", "population", "area", "note"]);
        assert_eq!(berlin.attributes[1].value, Some(AttributeValue::Integer(3_645_000)));
        assert_eq!(berlin.attributes[3].value, None);

        assert_eq!(features[1].geometry.label(), "MultiLineString");
        assert_eq!(features[2].geometry.label(), "None");
    }

    #[test]
    fn reads_geojsonl_skipping_blank_lines() {
        let input = concat!(
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]},"properties":{"a":1}}"#,
            "\n\n",
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[3,4]},"properties":{"a":2}}"#,
            "\n"
        );
        let source = GeoJsonlSource::from_reader(Cursor::new(input), Reprojector::identity());
        let features: Vec<Feature> = source.collect::<Result<_, _>>().unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[1].attributes[0].value, Some(AttributeValue::Integer(2)));
    }

    #[test]
    fn malformed_geojsonl_line_reports_line_number() {
        let input = "\n{not json}\n";
        let mut source = GeoJsonlSource::from_reader(Cursor::new(input), Reprojector::identity());

        match source.next() {
            Some(Err(SourceError::Line { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected a line error, got {:?}", other.map(|r| r.is_ok())),
        }
    }
}
