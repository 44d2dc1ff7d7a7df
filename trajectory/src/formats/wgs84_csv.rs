use super::{require_points, round_to};
use crate::{Error, GeoPoint, LocalFrame, Result, Trajectory};

/// Rows of latitude, longitude and an optional altitude after a header. The first row is the
/// anchor. Only x and y are kept; the altitude just feeds the projection.
pub fn decode(input: &str) -> Result<Trajectory> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let mut records = reader.records();
    let anchor = match records.next() {
        Some(rec) => parse_row(&rec?)?,
        None => return Err(Error::format("no anchor row in the WGS84 CSV file")),
    };
    let frame = LocalFrame::new(anchor);

    let mut traj = Trajectory::default();
    traj.set_anchor(anchor)?;
    traj.append_point(&[0.0, 0.0])?;
    for rec in records {
        let (x, y, _) = frame.to_local(parse_row(&rec?)?);
        traj.append_point(&[x, y])?;
    }
    Ok(traj)
}

fn parse_row(rec: &csv::StringRecord) -> Result<GeoPoint> {
    let values = rec
        .iter()
        .map(|x| x.parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match values[..] {
        [lat, lon] => Ok(GeoPoint::new(lat, lon, 0.0)),
        [lat, lon, alt] => Ok(GeoPoint::new(lat, lon, alt)),
        _ => Err(Error::format(format!(
            "WGS84 CSV rows need 2 or 3 values, got {:?}",
            rec
        ))),
    }
}

/// Latitude and longitude are rounded to 8 decimals, altitude to 3.
pub fn encode(traj: &Trajectory) -> Result<String> {
    let positions = require_points(traj, "WGS84 CSV")?;
    let frame = LocalFrame::new(traj.anchor());

    let mut out = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        writer.write_record(["latitude", "longitude", "altitude"])?;
        for (x, y) in positions {
            let geo = frame.to_geodetic(x, y, 0.0);
            writer.write_record([
                format!("{:.8}", geo.lat),
                format!("{:.8}", geo.lon),
                round_to(geo.alt, 3).to_string(),
            ])?;
        }
        writer.flush()?;
    }
    String::from_utf8(out).map_err(|err| Error::format(err.to_string()))
}
