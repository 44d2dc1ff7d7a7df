use std::fmt::Write;

use super::{require_points, round_to};
use crate::{Error, GeoPoint, LocalFrame, Result, Trajectory};

const COORDINATES_OPEN: &str = "<coordinates>";
const COORDINATES_CLOSE: &str = "</coordinates>";

/// Only the first LineString's coordinates are read. The first point becomes the anchor.
pub fn decode(input: &str) -> Result<Trajectory> {
    let coordinates = find_coordinates(input)?;

    // One tuple per line, or everything on one line separated by spaces
    let mut tuples: Vec<&str> = coordinates.trim().lines().collect();
    if tuples.len() < 2 {
        tuples = coordinates.split_whitespace().collect();
    }

    let mut geo_pts = Vec::new();
    for tuple in tuples {
        let tuple = tuple.trim();
        if tuple.is_empty() {
            continue;
        }
        geo_pts.push(parse_lon_lat_alt(tuple)?);
    }
    if geo_pts.is_empty() {
        return Err(Error::format("no points in the KML coordinate list"));
    }

    let frame = LocalFrame::new(geo_pts[0]);
    let mut traj = Trajectory::default();
    traj.set_anchor(frame.anchor())?;
    for pt in geo_pts {
        let (x, y, _) = frame.to_local(pt);
        traj.append_point(&[x, y])?;
    }
    Ok(traj)
}

fn find_coordinates(input: &str) -> Result<&str> {
    // The tag may be namespaced, like <kml:coordinates>
    let (start, open_len) = match input.find(COORDINATES_OPEN) {
        Some(idx) => (idx, COORDINATES_OPEN.len()),
        None => match input.find(":coordinates>") {
            Some(idx) => {
                let tag_start = input[..idx].rfind('<').unwrap_or(idx);
                (tag_start, idx - tag_start + ":coordinates>".len())
            }
            None => return Err(Error::format("no coordinates tag in the KML file")),
        },
    };
    let body = &input[start + open_len..];
    let end = body
        .find("</")
        .filter(|idx| body[*idx..].contains("coordinates>"))
        .ok_or_else(|| Error::format(format!("unclosed {COORDINATES_OPEN} in the KML file")))?;
    Ok(&body[..end])
}

fn parse_lon_lat_alt(tuple: &str) -> Result<GeoPoint> {
    let values = tuple
        .split(',')
        .map(|x| x.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match values[..] {
        [lon, lat] => Ok(GeoPoint::new(lat, lon, 0.0)),
        [lon, lat, alt] => Ok(GeoPoint::new(lat, lon, alt)),
        _ => Err(Error::format(format!(
            "KML coordinates need 2 or 3 values, got '{tuple}'"
        ))),
    }
}

/// One LineString placemark, with longitude and latitude rounded to 8 decimals and altitude to 3.
pub fn encode(traj: &Trajectory) -> Result<String> {
    let positions = require_points(traj, "KML")?;
    let frame = LocalFrame::new(traj.anchor());
    let name = traj.name().unwrap_or("trajectory");

    let mut out = String::new();
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2" xmlns:kml="http://www.opengis.net/kml/2.2" xmlns:atom="http://www.w3.org/2005/Atom">"#
    )?;
    writeln!(out, "  <Document>")?;
    writeln!(out, "    <name>{}</name>", escape(name))?;
    writeln!(out, "    <Placemark>")?;
    writeln!(out, "      <name>Trajectory</name>")?;
    writeln!(out, "      <LineString>")?;
    writeln!(out, "        <tessellate>1</tessellate>")?;
    writeln!(out, "        {COORDINATES_OPEN}")?;
    for (x, y) in positions {
        let geo = frame.to_geodetic(x, y, 0.0);
        writeln!(
            out,
            "{:.8},{:.8},{}",
            geo.lon,
            geo.lat,
            round_to(geo.alt, 3)
        )?;
    }
    writeln!(out, "        {COORDINATES_CLOSE}")?;
    writeln!(out, "      </LineString>")?;
    writeln!(out, "    </Placemark>")?;
    writeln!(out, "  </Document>")?;
    writeln!(out, "</kml>")?;
    Ok(out)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn decode_multiline_coordinates() {
        let input = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document><Placemark><LineString>
    <coordinates>
      3.110397,45.76277,403.6
      3.110497,45.76277,403.6
      3.110497,45.76287
    </coordinates>
  </LineString></Placemark></Document>
</kml>"#;
        let traj = decode(input).unwrap();
        assert_eq!(traj.anchor(), GeoPoint::new(45.76277, 3.110397, 403.6));
        assert_eq!(traj.columns(), &["x", "y"]);
        assert_eq!(traj.len(), 3);

        let pts = traj.positions();
        assert_abs_diff_eq!(pts[0].0, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pts[0].1, 0.0, epsilon = 1e-9);
        // 0.0001 degrees of longitude at this latitude is about 7.8m east
        assert!(pts[1].0 > 7.0 && pts[1].0 < 8.5);
        assert_abs_diff_eq!(pts[1].1, 0.0, epsilon = 0.01);
        assert!(pts[2].1 > 11.0);
    }

    #[test]
    fn decode_single_line_and_namespaced_tag() {
        let input = "<kml:coordinates>3.0,45.0,0 3.001,45.0,0</kml:coordinates>";
        let traj = decode(input).unwrap();
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.anchor(), GeoPoint::new(45.0, 3.0, 0.0));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(decode("<kml></kml>"), Err(Error::Format(_))));
        assert!(matches!(
            decode("<coordinates>  </coordinates>"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            decode("<coordinates>3.0</coordinates>"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            decode("<coordinates>3.0,north</coordinates>"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            decode("<coordinates>3.0,45.0"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn encode_then_decode() {
        let mut traj = Trajectory::default();
        traj.set_anchor(GeoPoint::new(45.76277, 3.110397, 403.6))
            .unwrap();
        traj.set_name("field <north>");
        for pt in [[0.0, 0.0], [10.0, 0.5], [20.0, -3.0]] {
            traj.append_point(&pt).unwrap();
        }

        let text = encode(&traj).unwrap();
        assert!(text.contains("<name>field &lt;north&gt;</name>"));
        assert!(text.contains("3.11039700,45.76277000,403.6\n"));

        let back = decode(&text).unwrap();
        assert_abs_diff_eq!(back.anchor().lat, 45.76277, epsilon = 1e-8);
        assert_abs_diff_eq!(back.anchor().lon, 3.110397, epsilon = 1e-8);
        assert_abs_diff_eq!(back.anchor().alt, 403.6, epsilon = 1e-8);
        for (a, b) in traj.positions().into_iter().zip(back.positions()) {
            assert_abs_diff_eq!(a.0, b.0, epsilon = 0.01);
            assert_abs_diff_eq!(a.1, b.1, epsilon = 0.01);
        }
    }

    #[test]
    fn empty_trajectory_cant_be_written() {
        assert!(encode(&Trajectory::default()).is_err());
    }
}
