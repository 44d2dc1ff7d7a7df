#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use structopt::StructOpt;

use planning::Discretizer;
use trajectory::formats::legacy;
use trajectory::{FormatKind, GeoPoint, Trajectory};

#[derive(StructOpt)]
#[structopt(about = "Convert, inspect and build field robot trajectories")]
enum Args {
    /// Read a trajectory and write it in another format. Formats are picked by file extension.
    Convert {
        /// The path to read, ending in .traj, .txt, .kml, .wgs84.csv, .csv or .geojson
        #[structopt(long)]
        input: String,
        /// The path to write, with the same choice of extensions
        #[structopt(long)]
        output: String,
    },
    /// Describe a trajectory file
    Info {
        #[structopt(long)]
        input: String,
    },
    /// Resample planner output, split it into zones and sections, and write a trajectory
    Discretize {
        /// A CSV file with the header x,y,z,velocity,dir,type,angle,duration
        #[structopt(long)]
        states: String,
        /// The maximum distance between consecutive points, in meters
        #[structopt(long)]
        step_size: f64,
        /// Latitude of the local frame's origin
        #[structopt(long)]
        lat: f64,
        /// Longitude of the local frame's origin
        #[structopt(long)]
        lon: f64,
        /// Altitude of the local frame's origin, in meters
        #[structopt(long, default_value = "0")]
        alt: f64,
        #[structopt(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Args::from_args() {
        Args::Convert { input, output } => {
            let traj = load(&input)?;
            trajectory::save(&traj, &output).with_context(|| format!("writing {}", output))?;
        }
        Args::Info { input } => info(&input)?,
        Args::Discretize {
            states,
            step_size,
            lat,
            lon,
            alt,
            output,
        } => {
            let file = fs_err::File::open(&states)?;
            let states = planning::load_states(std::io::BufReader::new(file))
                .with_context(|| format!("reading planner states from {}", states))?;
            let resampled = Discretizer::new(step_size).discretize(&states)?;
            info!(
                "Resampled {} planner states into {}",
                states.len(),
                resampled.len()
            );
            let mut traj = planning::annotate(&resampled, GeoPoint::new(lat, lon, alt))?;
            if let Err(err) = traj.check_annotations() {
                warn!("The zones aren't balanced: {}", err);
            }
            traj.set_name(&output);
            trajectory::save(&traj, &output).with_context(|| format!("writing {}", output))?;
        }
    }
    Ok(())
}

fn load(path: &str) -> Result<Trajectory> {
    trajectory::load(path).with_context(|| format!("reading {}", path))
}

/// Legacy files are decoded once, directly, to get at their markers too
fn load_with_markers(path: &str) -> Result<(Trajectory, Option<usize>)> {
    if FormatKind::from_path(path)? != FormatKind::Legacy {
        return Ok((load(path)?, None));
    }
    let input = fs_err::read_to_string(path)?;
    let mut legacy = legacy::decode(&input).with_context(|| format!("reading {}", path))?;
    if let Some(name) = std::path::Path::new(path).file_name() {
        legacy.trajectory.set_name(name.to_string_lossy());
    }
    Ok((legacy.trajectory, Some(legacy.markers.len())))
}

fn info(path: &str) -> Result<()> {
    let (traj, markers) = load_with_markers(path)?;
    let anchor = traj.anchor();
    println!("Name: {}", traj.name().unwrap_or("unnamed"));
    println!(
        "Anchor: lat {}, lon {}, alt {}",
        anchor.lat, anchor.lon, anchor.alt
    );
    println!("Columns: {}", traj.columns().join(", "));
    println!("Points: {}", traj.len());
    println!("Sections: {}", traj.num_sections());
    println!("Length: {:.3}m", traj.length());
    println!("Annotations: {}", traj.annotations().len());
    for (zone, ranges) in traj.zones() {
        let ranges: Vec<String> = ranges
            .into_iter()
            .map(|(enter, exit)| format!("{}-{}", enter, exit))
            .collect();
        println!("  {}: {}", zone, ranges.join(", "));
    }

    if let Some(markers) = markers {
        println!("Markers: {}", markers);
    }

    if let Err(err) = traj.check_annotations() {
        warn!("{}: {}", path, err);
    }
    Ok(())
}
