//! A GeoJSON FeatureCollection with two features: "origin", a Point holding the anchor, and
//! "sections", a MultiLineString with one line per section. Coordinates are [lon, lat, alt].

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};

use super::round_to;
use crate::{Annotation, Error, GeoPoint, LocalFrame, Result, Trajectory};

const ORIGIN_ID: &str = "origin";
const SECTIONS_ID: &str = "sections";
const DECIMALS: i32 = 8;

/// Only x and y are restored. Extra columns written by `encode` are ignored.
// TODO Read "extra" back into columns once the other readers of these files agree on its shape
pub fn decode(input: &str) -> Result<Trajectory> {
    let features = match input.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc.features,
        _ => return Err(Error::format("expected a GeoJSON FeatureCollection")),
    };

    let origin = features
        .iter()
        .find(|f| has_id(f, ORIGIN_ID))
        .ok_or_else(|| Error::format(format!("no '{ORIGIN_ID}' feature")))?;
    let anchor = match geometry_value(origin)? {
        Value::Point(pt) => to_geo_point(pt)?,
        _ => return Err(Error::format(format!("'{ORIGIN_ID}' must be a Point"))),
    };
    let frame = LocalFrame::new(anchor);

    let sections = features
        .iter()
        .find(|f| has_id(f, SECTIONS_ID))
        .ok_or_else(|| Error::format(format!("no '{SECTIONS_ID}' feature")))?;
    let lines = match geometry_value(sections)? {
        Value::MultiLineString(lines) => lines,
        _ => {
            return Err(Error::format(format!(
                "'{SECTIONS_ID}' must be a MultiLineString"
            )))
        }
    };

    let mut traj = Trajectory::default();
    traj.set_anchor(anchor)?;
    for line in lines {
        let mut section = Vec::with_capacity(line.len());
        for pt in line {
            let (x, y, _) = frame.to_local(to_geo_point(pt)?);
            section.push([x, y]);
        }
        traj.append_section(&section)?;
    }

    if member(sections, "extra").is_some() {
        debug!("Ignoring the extra columns of the GeoJSON sections");
    }
    if let Some(annotations) = member(sections, "annotations") {
        let annotations: Vec<Annotation> = serde_json::from_value(annotations.clone())?;
        traj.set_annotations(annotations);
        if !traj.annotations_in_bounds() {
            return Err(Error::format(format!(
                "an annotation points past the {} points",
                traj.len()
            )));
        }
    }
    Ok(traj)
}

fn has_id(feature: &Feature, id: &str) -> bool {
    matches!(&feature.id, Some(Id::String(x)) if x == id)
}

fn geometry_value(feature: &Feature) -> Result<&Value> {
    feature
        .geometry
        .as_ref()
        .map(|g| &g.value)
        .ok_or_else(|| Error::format("a feature has no geometry"))
}

// The annotations sit at the top level of the feature, but accept them as a property too
fn member<'a>(feature: &'a Feature, key: &str) -> Option<&'a serde_json::Value> {
    feature
        .foreign_members
        .as_ref()
        .and_then(|m| m.get(key))
        .or_else(|| feature.properties.as_ref().and_then(|p| p.get(key)))
}

fn to_geo_point(pt: &[f64]) -> Result<GeoPoint> {
    match *pt {
        [lon, lat] => Ok(GeoPoint::new(lat, lon, 0.0)),
        [lon, lat, alt] => Ok(GeoPoint::new(lat, lon, alt)),
        _ => Err(Error::format(format!(
            "GeoJSON positions need 2 or 3 values, got {pt:?}"
        ))),
    }
}

fn to_position(pt: GeoPoint) -> Vec<f64> {
    vec![
        round_to(pt.lon, DECIMALS),
        round_to(pt.lat, DECIMALS),
        round_to(pt.alt, DECIMALS),
    ]
}

pub fn encode(traj: &Trajectory) -> Result<String> {
    let frame = LocalFrame::new(traj.anchor());

    let origin = Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(to_position(traj.anchor())))),
        id: Some(Id::String(ORIGIN_ID.to_string())),
        properties: Some(JsonObject::new()),
        foreign_members: None,
    };

    let positions = traj.positions();
    let mut lines = Vec::new();
    let mut start = 0;
    for section in traj.sections() {
        let end = start + section.len();
        lines.push(
            positions[start..end]
                .iter()
                .map(|(x, y)| to_position(frame.to_geodetic(*x, *y, 0.0)))
                .collect::<Vec<_>>(),
        );
        start = end;
    }

    let mut members = JsonObject::new();
    members.insert(
        "extra".to_string(),
        serde_json::to_value(traj.extra_columns())?,
    );
    members.insert(
        "annotations".to_string(),
        serde_json::to_value(traj.annotations())?,
    );
    let sections = Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::MultiLineString(lines))),
        id: Some(Id::String(SECTIONS_ID.to_string())),
        properties: Some(JsonObject::new()),
        foreign_members: Some(members),
    };

    let gj = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features: vec![origin, sections],
        foreign_members: None,
    });
    Ok(serde_json::to_string_pretty(&gj)?)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::AnnotationKind;

    fn sample() -> Trajectory {
        let mut traj = Trajectory::new(
            vec!["x".to_string(), "y".to_string(), "speed".to_string()],
            GeoPoint::new(45.76277, 3.110397, 403.6),
        )
        .unwrap();
        traj.append_section(&[[0.0, 0.0, 1.0], [5.0, 0.0, 1.0]])
            .unwrap();
        traj.append_section(&[[5.0, 3.0, -0.5], [0.0, 3.0, -0.5]])
            .unwrap();
        traj.append_annotation(AnnotationKind::ZoneEnter, "work", 0);
        traj.append_annotation(AnnotationKind::ZoneExit, "work", 3);
        traj
    }

    #[test]
    fn encode_then_decode() {
        let traj = sample();
        let text = encode(&traj).unwrap();
        let back = decode(&text).unwrap();

        assert_abs_diff_eq!(back.anchor().lat, 45.76277, epsilon = 1e-8);
        assert_abs_diff_eq!(back.anchor().lon, 3.110397, epsilon = 1e-8);
        assert_abs_diff_eq!(back.anchor().alt, 403.6, epsilon = 1e-8);
        assert_eq!(back.section_indexes(), vec![0, 2]);
        assert_eq!(back.annotations(), traj.annotations());
        for (a, b) in traj.positions().into_iter().zip(back.positions()) {
            assert_abs_diff_eq!(a.0, b.0, epsilon = 0.01);
            assert_abs_diff_eq!(a.1, b.1, epsilon = 0.01);
        }
    }

    #[test]
    fn extra_columns_are_written_but_not_read() {
        let text = encode(&sample()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        let extra = &json["features"][1]["extra"];
        assert_eq!(extra["columns"], serde_json::json!(["speed"]));
        assert_eq!(extra["values"][1][0], serde_json::json!([-0.5]));

        let back = decode(&text).unwrap();
        assert_eq!(back.columns(), &["x", "y"]);
    }

    #[test]
    fn annotations_as_a_property() {
        let input = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "sections", "properties": {
                    "annotations": [{"type": "zone_enter", "value": "work", "point_index": 1}]
                 },
                 "geometry": {"type": "MultiLineString", "coordinates": [[[3.0, 45.0], [3.0001, 45.0]]]}},
                {"type": "Feature", "id": "origin", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [3.0, 45.0, 100.0]}}
            ]
        }"#;
        let traj = decode(input).unwrap();
        assert_eq!(traj.anchor(), GeoPoint::new(45.0, 3.0, 100.0));
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.annotations()[0].point_index, 1);
    }

    #[test]
    fn rejects_bad_input() {
        let no_origin = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": "sections", "properties": {},
             "geometry": {"type": "MultiLineString", "coordinates": []}}]}"#;
        assert!(matches!(decode(no_origin), Err(Error::Format(_))));

        let origin_not_a_point = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": "origin", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[3.0, 45.0], [3.1, 45.0]]}}]}"#;
        assert!(matches!(decode(origin_not_a_point), Err(Error::Format(_))));

        let just_a_point = r#"{"type": "Point", "coordinates": [3.0, 45.0]}"#;
        assert!(matches!(decode(just_a_point), Err(Error::Format(_))));

        assert!(matches!(decode("[1, 2"), Err(Error::Format(_))));
    }
}
