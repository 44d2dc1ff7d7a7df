use serde::{Deserialize, Serialize};

use crate::{Annotation, Error, GeoPoint, Result, Trajectory};

const VERSION: &str = "2";
const ORIGIN_TYPE: &str = "WGS84";

#[derive(Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    origin: Origin,
    // Required, but checked by hand for a better error
    #[serde(default)]
    points: Option<Points>,
    #[serde(default)]
    sections: Option<Vec<usize>>,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

#[derive(Serialize, Deserialize)]
struct Origin {
    #[serde(rename = "type")]
    origin_type: String,
    // latitude, longitude, altitude
    coordinates: [f64; 3],
}

#[derive(Serialize, Deserialize)]
struct Points {
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

pub fn decode(input: &str) -> Result<Trajectory> {
    let doc: Document = serde_json::from_str(input)?;

    if doc.origin.origin_type != ORIGIN_TYPE {
        return Err(Error::format(format!(
            "unknown origin type '{}'; only '{ORIGIN_TYPE}' is accepted",
            doc.origin.origin_type
        )));
    }
    match doc.version.as_deref() {
        Some(VERSION) | None => {}
        Some(v) => warn!("Trajectory file has version {v}, expected {VERSION}"),
    }
    let points = doc.points.ok_or_else(|| {
        Error::format("the element 'points' is required in a trajectory file")
    })?;

    let [lat, lon, alt] = doc.origin.coordinates;
    let mut traj = Trajectory::new(points.columns, GeoPoint::new(lat, lon, alt))?;

    if !points.values.is_empty() {
        let mut bounds = match doc.sections {
            Some(starts) if !starts.is_empty() => starts,
            // Everything is one section
            _ => vec![0],
        };
        check_section_starts(&bounds, points.values.len())?;
        bounds.push(points.values.len());
        for pair in bounds.windows(2) {
            traj.append_section(&points.values[pair[0]..pair[1]])?;
        }
    }

    traj.set_annotations(doc.annotations);
    if !traj.annotations_in_bounds() {
        return Err(Error::format(format!(
            "an annotation points past the {} points",
            traj.len()
        )));
    }
    Ok(traj)
}

fn check_section_starts(starts: &[usize], num_points: usize) -> Result<()> {
    if starts[0] != 0 {
        return Err(Error::format(format!(
            "the first section starts at {}, not 0",
            starts[0]
        )));
    }
    for pair in starts.windows(2) {
        if pair[0] >= pair[1] {
            return Err(Error::format(format!(
                "section starts must increase, but {} is followed by {}",
                pair[0], pair[1]
            )));
        }
    }
    if let Some(last) = starts.last() {
        if *last >= num_points {
            return Err(Error::format(format!(
                "a section starts at {last}, but there are only {num_points} points"
            )));
        }
    }
    Ok(())
}

pub fn encode(traj: &Trajectory) -> Result<String> {
    let anchor = traj.anchor();
    let doc = Document {
        version: Some(VERSION.to_string()),
        origin: Origin {
            origin_type: ORIGIN_TYPE.to_string(),
            coordinates: [anchor.lat, anchor.lon, anchor.alt],
        },
        points: Some(Points {
            columns: traj.columns().to_vec(),
            values: traj.points().map(|pt| pt.to_vec()).collect(),
        }),
        sections: Some(traj.section_indexes()),
        annotations: traj.annotations().to_vec(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnnotationKind;

    const SAMPLE: &str = r#"{
        "version": "2",
        "origin": {"type": "WGS84", "coordinates": [45.76277, 3.110397, 403.6]},
        "points": {
            "columns": ["x", "y", "speed"],
            "values": [[12.5, 3.2, 1.0], [12.6, 3.2, 1.0], [12.7, 3.3, -1.0], [12.75, 3.43, -1.0]]
        },
        "sections": [0, 2],
        "annotations": [
            {"type": "zone_enter", "value": "work", "point_index": 0},
            {"type": "zone_exit", "value": "work", "point_index": 3}
        ]
    }"#;

    #[test]
    fn decode_sample() {
        let traj = decode(SAMPLE).unwrap();
        assert_eq!(traj.anchor(), GeoPoint::new(45.76277, 3.110397, 403.6));
        assert_eq!(traj.columns(), &["x", "y", "speed"]);
        assert_eq!(traj.len(), 4);
        assert_eq!(traj.section_indexes(), vec![0, 2]);
        assert_eq!(traj.point(2), &[12.7, 3.3, -1.0]);
        assert_eq!(traj.annotations().len(), 2);
        assert_eq!(traj.annotations()[1].kind, AnnotationKind::ZoneExit);
        assert_eq!(traj.annotations()[1].point_index, 3);
    }

    #[test]
    fn missing_sections_means_one() {
        let input = r#"{
            "origin": {"type": "WGS84", "coordinates": [1.0, 2.0, 3.0]},
            "points": {"columns": ["x", "y"], "values": [[0, 0], [1, 0], [2, 0]]}
        }"#;
        let traj = decode(input).unwrap();
        assert_eq!(traj.section_indexes(), vec![0]);
        assert_eq!(traj.len(), 3);
        assert!(traj.annotations().is_empty());
    }

    #[test]
    fn rejects_bad_documents() {
        let wrong_origin = SAMPLE.replace(r#""type": "WGS84""#, r#""type": "Lambert93""#);
        assert!(matches!(decode(&wrong_origin), Err(Error::Format(_))));

        let no_points = r#"{"origin": {"type": "WGS84", "coordinates": [1.0, 2.0, 3.0]}}"#;
        assert!(matches!(decode(no_points), Err(Error::Format(_))));

        let bad_sections = SAMPLE.replace("[0, 2]", "[0, 4]");
        assert!(matches!(decode(&bad_sections), Err(Error::Format(_))));
        let unordered = SAMPLE.replace("[0, 2]", "[0, 2, 1]");
        assert!(matches!(decode(&unordered), Err(Error::Format(_))));

        let bad_index = SAMPLE.replace(r#""point_index": 3"#, r#""point_index": 4"#);
        assert!(matches!(decode(&bad_index), Err(Error::Format(_))));

        let short_point = SAMPLE.replace("[12.6, 3.2, 1.0]", "[12.6, 3.2]");
        assert!(matches!(
            decode(&short_point),
            Err(Error::SchemaViolation(_))
        ));

        assert!(matches!(decode("{not json"), Err(Error::Format(_))));
    }

    #[test]
    fn encode_then_decode() {
        let traj = decode(SAMPLE).unwrap();
        let text = encode(&traj).unwrap();
        assert!(text.contains(r#""version": "2""#));
        assert_eq!(decode(&text).unwrap(), traj);
    }
}
