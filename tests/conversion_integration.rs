use std::path::Path;
use std::process::{Command, Output};

const RULES: &str = "\
# class,sourceKey,sourceValue,targetKey,targetValue
point,name,,name,-
point,amenity,cafe,amenity,cafe
line,type,road,highway,residential
outer,use,park,leisure,park
inner,use,pond,natural,water
bogus,a,b,c,d
point,too,few
";

fn run(dir: &Path, input: &str, extra: &[&str]) -> (Output, String) {
    let input_path = dir.join("input.geojson");
    let rules_path = dir.join("rules.txt");
    let output_path = dir.join("output.osm");
    std::fs::write(&input_path, input).unwrap();
    std::fs::write(&rules_path, RULES).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_geo2osm"))
        .arg("--input")
        .arg(&input_path)
        .arg("--rules")
        .arg(&rules_path)
        .arg("--output")
        .arg(&output_path)
        .args(extra)
        .output()
        .expect("failed to execute process");

    let content = std::fs::read_to_string(&output_path).unwrap_or_default();
    (output, content)
}

fn collection(features: &[&str]) -> String {
    format!(
        "{{\"type\":\"FeatureCollection\",\"features\":[{}]}}",
        features.join(",")
    )
}

const CAFE: &str = r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[13.4,52.5]},"properties":{"name":"Kaffee & Kuchen","amenity":"cafe"}}"#;
const BARE_POINT: &str = r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[13.5,52.6]},"properties":{"ref":7}}"#;
const ROAD: &str = r#"{"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[1,0],[2,0]]},"properties":{"type":"road"}}"#;
const PARK_WITH_POND: &str = r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[4,0],[4,4],[0,4],[0,0]],[[1,1],[2,1],[2,2],[1,2],[1,1]]]},"properties":{"use":"park"}}"#;

#[test]
fn converts_points_with_rule_tags() {
    let dir = tempfile::tempdir().unwrap();
    let (output, content) = run(dir.path(), &collection(&[CAFE]), &[]);

    assert!(output.status.success());
    assert!(content.starts_with("<?xml"));
    assert!(content.contains("lat=\"52.5\" lon=\"13.4\""));
    assert!(content.contains("<tag k=\"name\" v=\"Kaffee &amp; Kuchen\"/>"));
    assert!(content.contains("<tag k=\"amenity\" v=\"cafe\"/>"));
    assert!(content.trim_end().ends_with("</osm>"));
}

#[test]
fn only_tagged_drops_untagged_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let input = collection(&[CAFE, BARE_POINT]);

    let (_, all) = run(dir.path(), &input, &[]);
    assert_eq!(all.matches("<node ").count(), 2);

    let (output, strict) = run(dir.path(), &input, &["-t"]);
    assert!(output.status.success());
    assert_eq!(strict.matches("<node ").count(), 1);
    assert!(!strict.contains("lon=\"13.5\""));
}

#[test]
fn line_becomes_tagged_way() {
    let dir = tempfile::tempdir().unwrap();
    let (output, content) = run(dir.path(), &collection(&[ROAD]), &[]);

    assert!(output.status.success());
    assert_eq!(content.matches("<node ").count(), 3);
    assert_eq!(content.matches("<way ").count(), 1);
    assert!(content.contains("<tag k=\"highway\" v=\"residential\"/>"));
}

#[test]
fn polygon_with_hole_becomes_multipolygon() {
    let dir = tempfile::tempdir().unwrap();
    let (output, content) = run(dir.path(), &collection(&[PARK_WITH_POND]), &[]);

    assert!(output.status.success());
    assert_eq!(content.matches("<relation ").count(), 1);
    assert_eq!(content.matches("<way ").count(), 2);
    assert!(content.contains("role=\"outer\""));
    assert!(content.contains("role=\"inner\""));
    assert!(content.contains("<tag k=\"type\" v=\"multipolygon\"/>"));
    assert!(content.contains("<tag k=\"leisure\" v=\"park\"/>"));
    // A closed ring repeats its first node reference.
    assert_eq!(content.matches("<node ").count(), 8);
}

#[test]
fn rule_problems_are_reported_but_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (output, content) = run(dir.path(), &collection(&[CAFE]), &[]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bogus"));
    assert!(stderr.contains("point,too,few"));
    assert!(content.contains("<tag k=\"amenity\" v=\"cafe\"/>"));
}

#[test]
fn inclusion_expression_filters_primitives() {
    let dir = tempfile::tempdir().unwrap();
    let input = collection(&[CAFE, ROAD]);
    let (output, content) = run(dir.path(), &input, &["--include", "kind != 'node'"]);

    assert!(output.status.success());
    assert_eq!(content.matches("<way ").count(), 1);
    assert!(!content.contains("Kaffee"));
}

#[test]
fn degenerate_polygon_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let broken = r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]],[[0.5,0.5]]]},"properties":{}}"#;
    let (output, content) = run(dir.path(), &collection(&[CAFE, broken]), &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Feature 2"));
    // The feature converted before the failure was already written.
    assert!(content.contains("Kaffee &amp; Kuchen"));
}

#[test]
fn reads_geojsonl() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.geojsonl");
    let rules_path = dir.path().join("rules.txt");
    let output_path = dir.path().join("output.osm");
    std::fs::write(&input_path, format!("{}\n\n{}\n", CAFE, ROAD)).unwrap();
    std::fs::write(&rules_path, RULES).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_geo2osm"))
        .arg("--input")
        .arg(&input_path)
        .arg("--rules")
        .arg(&rules_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--verbose")
        .status()
        .expect("failed to execute process");

    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(content.matches("<way ").count(), 1);
    assert!(content.contains("<tag k=\"name\""));
}
