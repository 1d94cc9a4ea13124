// Corridor derivation - rebuilds the drawn corridor when the solver only returns a centerline.
// Vertices are lifted into the WGS84 earth-centred frame, offset along the local
// horizontal normal and projected back to longitude/latitude.

use super::types::LonLat;
use crate::common::{DomainResult, TurnPathError};
use glam::DVec3;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Narrowest corridor half-width ever drawn, in metres.
pub const MIN_HALF_WIDTH_M: f64 = 2.0;

/// Converts a surface position (height 0) to earth-centred Cartesian metres.
pub fn to_cartesian(p: LonLat) -> DVec3 {
    let lon = p.lon.to_radians();
    let lat = p.lat.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    DVec3::new(n * cos_lat * lon.cos(), n * cos_lat * lon.sin(), n * (1.0 - WGS84_E2) * sin_lat)
}

/// Inverse of [`to_cartesian`], dropping the height above the ellipsoid.
pub fn to_lon_lat(v: DVec3) -> LonLat {
    let p = (v.x * v.x + v.y * v.y).sqrt();
    let lon = v.y.atan2(v.x);
    let ep2 = (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
    // Bowring's closed form; sub-millimetre at ground level.
    let theta = (v.z * WGS84_A).atan2(p * WGS84_B);
    let (sin_t, cos_t) = theta.sin_cos();
    let lat = (v.z + ep2 * WGS84_B * sin_t.powi(3)).atan2(p - WGS84_E2 * WGS84_A * cos_t.powi(3));
    LonLat::new(lon.to_degrees(), lat.to_degrees())
}

/// Outward ellipsoid normal at a Cartesian surface point.
pub fn surface_normal(v: DVec3) -> DVec3 {
    DVec3::new(v.x / (WGS84_A * WGS84_A), v.y / (WGS84_A * WGS84_A), v.z / (WGS84_B * WGS84_B)).normalize_or_zero()
}

/// Straight-line distance in metres between two surface positions.
pub fn distance_m(a: LonLat, b: LonLat) -> f64 {
    to_cartesian(a).distance(to_cartesian(b))
}

fn finite(v: DVec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Half-width of the drawn corridor for a given buffered vehicle width.
///
/// `tightening` scales the result for narrower renderings and is clamped to (0, 1].
pub fn corridor_half_width(vehicle_width_with_buffer_m: f64, tightening: f64) -> f64 {
    let width = if vehicle_width_with_buffer_m.is_finite() { vehicle_width_with_buffer_m } else { 0.0 };
    let factor = if tightening.is_finite() && tightening > 0.0 { tightening.min(1.0) } else { 1.0 };
    MIN_HALF_WIDTH_M.max(width / 2.0) * factor
}

#[derive(Debug, Clone, PartialEq)]
pub struct Corridor {
    pub half_width_m: f64,
    pub left_rail: Vec<LonLat>,
    pub right_rail: Vec<LonLat>,
}

impl Corridor {
    /// Left rail followed by the reversed right rail.
    pub fn outline(&self) -> Vec<LonLat> {
        let mut out = self.left_rail.clone();
        out.extend(self.right_rail.iter().rev().copied());
        out
    }

    /// Closed ring: the outline with its first vertex repeated at the end.
    pub fn ring(&self) -> Vec<LonLat> {
        let mut ring = self.outline();
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        ring
    }
}

/// Builds the corridor polygon around `centerline`.
pub fn build_corridor(centerline: &[LonLat], vehicle_width_with_buffer_m: f64, tightening: f64) -> DomainResult<Corridor> {
    if centerline.len() < 2 {
        return Err(TurnPathError::geometry(format!(
            "centerline has {} point(s), need at least 2",
            centerline.len()
        )));
    }
    if let Some(bad) = centerline.iter().position(|p| !p.is_finite()) {
        return Err(TurnPathError::geometry(format!("centerline vertex {} is not finite", bad)));
    }

    let half_width = corridor_half_width(vehicle_width_with_buffer_m, tightening);
    let frame: Vec<DVec3> = centerline.iter().map(|p| to_cartesian(*p)).collect();
    let last = frame.len() - 1;

    let mut left_rail = Vec::with_capacity(frame.len());
    let mut right_rail = Vec::with_capacity(frame.len());

    for (i, &p) in frame.iter().enumerate() {
        let ahead = frame[(i + 1).min(last)];
        let behind = frame[i.saturating_sub(1)];
        let forward = (ahead - behind).normalize_or_zero();
        let up = surface_normal(p);
        let left = up.cross(forward).normalize_or_zero();
        if left == DVec3::ZERO || !finite(left) {
            continue;
        }

        let l = p + left * half_width;
        let r = p - left * half_width;
        if finite(l) {
            let ll = to_lon_lat(l);
            if ll.is_finite() {
                left_rail.push(ll);
            }
        }
        if finite(r) {
            let rl = to_lon_lat(r);
            if rl.is_finite() {
                right_rail.push(rl);
            }
        }
    }

    if left_rail.len() < 2 || right_rail.len() < 2 {
        return Err(TurnPathError::geometry(format!(
            "corridor rails degenerate (left {}, right {})",
            left_rail.len(),
            right_rail.len()
        )));
    }

    Ok(Corridor { half_width_m: half_width, left_rail, right_rail })
}

/// Removes near-duplicate and closely spaced points from a polyline.
///
/// A point is dropped when both coordinates are within `epsilon_deg` of the last
/// retained point, or when it lies closer than `min_distance_m` to it. The first
/// and last input points are always kept, and the result is never longer than
/// the input.
pub fn simplify_polyline(points: &[LonLat], epsilon_deg: f64, min_distance_m: f64) -> Vec<LonLat> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let near = |a: LonLat, b: LonLat| {
        ((a.lon - b.lon).abs() <= epsilon_deg && (a.lat - b.lat).abs() <= epsilon_deg)
            || distance_m(a, b) < min_distance_m
    };

    let first = points[0];
    let last = points[points.len() - 1];
    let mut kept = vec![first];
    for &p in &points[1..points.len() - 1] {
        let prev = kept[kept.len() - 1];
        if !near(prev, p) {
            kept.push(p);
        }
    }
    if kept.len() > 1 && near(kept[kept.len() - 1], last) {
        kept.pop();
    }
    kept.push(last);
    kept
}
