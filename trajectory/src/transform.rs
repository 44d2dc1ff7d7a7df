//! Conversion between WGS84 geodetic coordinates and a local east/north/up tangent plane.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

// WGS84 ellipsoid
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const ECCENTRICITY_SQ: f64 = FLATTENING * (2.0 - FLATTENING);

/// A WGS84 position. Latitude and longitude are in degrees, altitude in meters above the
/// ellipsoid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }

    fn to_ecef(self) -> Vector3<f64> {
        let (sin_lat, cos_lat) = self.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.lon.to_radians().sin_cos();
        let n = prime_vertical_radius(sin_lat);
        Vector3::new(
            (n + self.alt) * cos_lat * cos_lon,
            (n + self.alt) * cos_lat * sin_lon,
            (n * (1.0 - ECCENTRICITY_SQ) + self.alt) * sin_lat,
        )
    }

    fn from_ecef(ecef: Vector3<f64>) -> Self {
        let lon = ecef.y.atan2(ecef.x);
        let p = ecef.x.hypot(ecef.y);

        let mut lat = ecef.z.atan2(p * (1.0 - ECCENTRICITY_SQ));
        for _ in 0..10 {
            let n = prime_vertical_radius(lat.sin());
            let alt = altitude(p, ecef.z, lat, n);
            let next = ecef.z.atan2(p * (1.0 - ECCENTRICITY_SQ * n / (n + alt)));
            let done = (next - lat).abs() < 1e-15;
            lat = next;
            if done {
                break;
            }
        }
        let alt = altitude(p, ecef.z, lat, prime_vertical_radius(lat.sin()));

        Self {
            lat: lat.to_degrees(),
            lon: lon.to_degrees(),
            alt,
        }
    }
}

fn prime_vertical_radius(sin_lat: f64) -> f64 {
    SEMI_MAJOR_AXIS / (1.0 - ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt()
}

// Stays well-conditioned near the poles, unlike p / cos(lat) - n
fn altitude(p: f64, z: f64, lat: f64, n: f64) -> f64 {
    let (sin_lat, cos_lat) = lat.sin_cos();
    p * cos_lat + (z + ECCENTRICITY_SQ * n * sin_lat) * sin_lat - n
}

/// An east/north/up frame tangent to the ellipsoid at some anchor.
#[derive(Clone, Debug)]
pub struct LocalFrame {
    anchor: GeoPoint,
    origin: Vector3<f64>,
    // Rows are the east, north and up unit vectors expressed in ECEF
    ecef_to_enu: Matrix3<f64>,
}

impl LocalFrame {
    pub fn new(anchor: GeoPoint) -> Self {
        let (sin_lat, cos_lat) = anchor.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = anchor.lon.to_radians().sin_cos();
        #[rustfmt::skip]
        let ecef_to_enu = Matrix3::new(
            -sin_lon,            cos_lon,            0.0,
            -sin_lat * cos_lon,  -sin_lat * sin_lon, cos_lat,
            cos_lat * cos_lon,   cos_lat * sin_lon,  sin_lat,
        );
        Self {
            anchor,
            origin: anchor.to_ecef(),
            ecef_to_enu,
        }
    }

    pub fn anchor(&self) -> GeoPoint {
        self.anchor
    }

    /// Returns (east, north, up) in meters relative to the anchor.
    pub fn to_local(&self, pt: GeoPoint) -> (f64, f64, f64) {
        let enu = self.ecef_to_enu * (pt.to_ecef() - self.origin);
        (enu.x, enu.y, enu.z)
    }

    pub fn to_geodetic(&self, x: f64, y: f64, z: f64) -> GeoPoint {
        // The rotation is orthonormal, so its transpose is the inverse
        let ecef = self.origin + self.ecef_to_enu.transpose() * Vector3::new(x, y, z);
        GeoPoint::from_ecef(ecef)
    }
}

pub fn geodetic_to_local(pt: GeoPoint, anchor: GeoPoint) -> (f64, f64, f64) {
    LocalFrame::new(anchor).to_local(pt)
}

pub fn local_to_geodetic(x: f64, y: f64, z: f64, anchor: GeoPoint) -> GeoPoint {
    LocalFrame::new(anchor).to_geodetic(x, y, z)
}
