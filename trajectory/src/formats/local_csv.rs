use crate::{Error, Result, Trajectory};

/// The header names the columns, in any order. Every row is one point, used as-is.
pub fn decode(input: &str) -> Result<Trajectory> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(|x| x.to_string()).collect();
    let mut traj = Trajectory::default();
    traj.set_columns(columns)?;

    for rec in reader.records() {
        let point = rec?
            .iter()
            .map(|x| x.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        traj.append_point(&point)?;
    }
    Ok(traj)
}

/// Values are written at full precision.
pub fn encode(traj: &Trajectory) -> Result<String> {
    let mut out = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        writer.write_record(traj.columns())?;
        for pt in traj.points() {
            writer.write_record(pt.iter().map(|x| x.to_string()))?;
        }
        writer.flush()?;
    }
    String::from_utf8(out).map_err(|err| Error::format(err.to_string()))
}
