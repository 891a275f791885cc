//! Elevation-to-gradient interpolation for stage profiles.
//!
//! Raw samples are sparse `(distance, elevation)` pairs measured along a route.
//! The functions here resample them onto a regular distance grid and derive the
//! percentage gradient between consecutive *output* points.
//!
//! The free functions take a mutable slice and may reorder it in place. Callers
//! that share a sample buffer between requests must hand in a copy, or build an
//! [`ElevationProfile`] once and query that instead.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while interpolating an elevation profile.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProfileError {
    #[error("no elevation samples supplied")]
    EmptyInput,
    #[error("distance {distance} is outside the sampled range [{min}, {max}]")]
    OutOfRange { distance: f64, min: f64, max: f64 },
    #[error("resolution must be a finite positive number, got {0}")]
    InvalidResolution(f64),
    #[error("resolution {resolution} would produce more than {max} points")]
    TooManyPoints { resolution: f64, max: usize },
    #[error("sample {index} has a non-finite distance or elevation")]
    NonFiniteSample { index: usize },
}

/// Upper bound on the length of a generated gradient profile.
pub const MAX_PROFILE_POINTS: usize = 10_000_000;

/// Raw elevation sample along a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationPoint {
    pub distance: f64,
    pub elevation: f64,
}

impl ElevationPoint {
    pub fn new(distance: f64, elevation: f64) -> Self {
        Self {
            distance,
            elevation,
        }
    }
}

impl From<(f64, f64)> for ElevationPoint {
    fn from((distance, elevation): (f64, f64)) -> Self {
        Self::new(distance, elevation)
    }
}

/// Resampled point of a gradient profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientPoint {
    pub distance: f64,
    pub elevation: f64,
    /// Percentage slope from the previous output point, `None` on the first point.
    pub gradient: Option<f64>,
}

/// What to emit when the route length is an exact multiple of the resolution.
///
/// In that case the last grid point already sits on the route end, so the
/// usual closing point would have a zero-length segment behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalPoint {
    /// Always emit the closing point. On an exact multiple it repeats the last
    /// grid distance and takes its gradient from the point one step further
    /// back. The profile always has `floor(max / resolution) + 2` points.
    #[default]
    Repeat,
    /// Drop the closing point on an exact multiple so distances stay strictly
    /// increasing.
    Skip,
}

/// Indices of the samples on either side of a query distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub lower: usize,
    pub upper: usize,
}

/// Returns `true` when the samples are in ascending distance order.
pub fn is_sorted_by_distance(samples: &[ElevationPoint]) -> bool {
    samples
        .windows(2)
        .all(|w| w[0].distance.total_cmp(&w[1].distance).is_le())
}

/// Fails on the first sample whose distance or elevation is NaN or infinite.
pub fn check_finite(samples: &[ElevationPoint]) -> Result<(), ProfileError> {
    match samples
        .iter()
        .position(|p| !p.distance.is_finite() || !p.elevation.is_finite())
    {
        Some(index) => Err(ProfileError::NonFiniteSample { index }),
        None => Ok(()),
    }
}

/// Sorts samples by distance unless they are already in order.
///
/// Returns `true` if the slice was reordered. The sort is stable, so samples
/// sharing a distance keep their relative order.
pub fn sort_by_distance(samples: &mut [ElevationPoint]) -> bool {
    if is_sorted_by_distance(samples) {
        return false;
    }
    debug!("sorting {} elevation samples by distance", samples.len());
    samples.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    true
}

/// Finds the samples either side of `distance` in a sorted slice.
///
/// Searches for the first sample at or past `distance` and steps back one,
/// clamping at index 0 when `distance` lands on the first sample. The upper
/// index is clamped to the last sample, so a single-sample slice yields a
/// zero-width bracket instead of an index past the end.
pub fn bracket(sorted: &[ElevationPoint], distance: f64) -> Result<Bracket, ProfileError> {
    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ProfileError::EmptyInput),
    };
    if distance.is_nan() || distance < first.distance || distance > last.distance {
        return Err(ProfileError::OutOfRange {
            distance,
            min: first.distance,
            max: last.distance,
        });
    }

    let first_at_or_past = sorted.partition_point(|p| p.distance < distance);
    let lower = first_at_or_past.saturating_sub(1);
    let upper = (lower + 1).min(sorted.len() - 1);
    trace!("distance {} bracketed by samples {}..={}", distance, lower, upper);
    Ok(Bracket { lower, upper })
}

fn elevation_in(sorted: &[ElevationPoint], distance: f64) -> Result<f64, ProfileError> {
    let Bracket { lower, upper } = bracket(sorted, distance)?;
    let p1 = sorted[lower];
    let p2 = sorted[upper];
    let run = p2.distance - p1.distance;
    if run <= 0.0 {
        return Ok(p1.elevation);
    }
    let ratio = (distance - p1.distance) / run;
    Ok(p1.elevation + ratio * (p2.elevation - p1.elevation))
}

/// Rise over run as a percentage. Both arguments must share a unit.
pub fn percent_grade(rise: f64, run: f64) -> f64 {
    rise / run * 100.0
}

fn validate_resolution(resolution: f64) -> Result<(), ProfileError> {
    if resolution.is_finite() && resolution > 0.0 {
        Ok(())
    } else {
        Err(ProfileError::InvalidResolution(resolution))
    }
}

/// Number of interior grid points, refusing grids that would exceed
/// [`MAX_PROFILE_POINTS`] once the start and closing points are added.
fn grid_steps(max_distance: f64, resolution: f64) -> Result<usize, ProfileError> {
    let too_many = ProfileError::TooManyPoints {
        resolution,
        max: MAX_PROFILE_POINTS,
    };
    let steps = (max_distance / resolution).floor();
    if !steps.is_finite() || steps < 0.0 || steps > (MAX_PROFILE_POINTS - 2) as f64 {
        return Err(too_many);
    }
    let steps = steps as usize;
    match steps.checked_add(2) {
        Some(len) if len <= MAX_PROFILE_POINTS => Ok(steps),
        _ => Err(too_many),
    }
}

fn gradient_points(
    sorted: &[ElevationPoint],
    resolution: f64,
    policy: FinalPoint,
) -> Result<Vec<GradientPoint>, ProfileError> {
    let last = *sorted.last().ok_or(ProfileError::EmptyInput)?;
    validate_resolution(resolution)?;

    let max_distance = last.distance;
    let final_elevation = last.elevation;
    // Fails for profiles that do not start at or before distance 0.
    let start_elevation = elevation_in(sorted, 0.0)?;

    let steps = grid_steps(max_distance, resolution)?;
    let mut points = Vec::with_capacity(steps + 2);
    points.push(GradientPoint {
        distance: 0.0,
        elevation: start_elevation,
        gradient: None,
    });

    for i in 1..=steps {
        // Clamped so a rounded-up step count cannot ask for a distance past the end.
        let distance = (resolution * i as f64).min(max_distance);
        let elevation = elevation_in(sorted, distance)?;
        let previous = points[i - 1];
        points.push(GradientPoint {
            distance,
            elevation,
            gradient: Some(percent_grade(
                elevation - previous.elevation,
                distance - previous.distance,
            )),
        });
    }

    let last_grid = points[steps];
    let run = max_distance - last_grid.distance;
    if run > 0.0 {
        points.push(GradientPoint {
            distance: max_distance,
            elevation: final_elevation,
            gradient: Some(percent_grade(final_elevation - last_grid.elevation, run)),
        });
    } else {
        match policy {
            FinalPoint::Skip => {
                debug!("route end {} lies on the grid, closing point skipped", max_distance);
            }
            FinalPoint::Repeat => {
                let gradient = match steps.checked_sub(1) {
                    Some(i) => {
                        let before = points[i];
                        percent_grade(
                            final_elevation - before.elevation,
                            max_distance - before.distance,
                        )
                    }
                    // Zero-length route: nothing to measure a slope against.
                    None => 0.0,
                };
                points.push(GradientPoint {
                    distance: max_distance,
                    elevation: final_elevation,
                    gradient: Some(gradient),
                });
            }
        }
    }

    debug!(
        "gradient profile of {} points over {} m at {} m resolution",
        points.len(),
        max_distance,
        resolution
    );
    Ok(points)
}

/// Interpolates the elevation at `distance`, sorting `samples` first if needed.
///
/// No extrapolation is performed: distances outside the sampled range fail
/// with [`ProfileError::OutOfRange`].
pub fn interpolate_elevation(
    samples: &mut [ElevationPoint],
    distance: f64,
) -> Result<f64, ProfileError> {
    if samples.is_empty() {
        return Err(ProfileError::EmptyInput);
    }
    check_finite(samples)?;
    sort_by_distance(samples);
    elevation_in(samples, distance)
}

/// Resamples `samples` every `resolution` metres using [`FinalPoint::Repeat`].
pub fn interpolate_gradient_profile(
    samples: &mut [ElevationPoint],
    resolution: f64,
) -> Result<Vec<GradientPoint>, ProfileError> {
    interpolate_gradient_profile_with(samples, resolution, FinalPoint::Repeat)
}

/// Resamples `samples` every `resolution` metres.
///
/// The output starts at distance 0 with no gradient, continues at every
/// multiple of `resolution` below the route end and closes on the last sample.
/// Any error aborts the whole computation.
pub fn interpolate_gradient_profile_with(
    samples: &mut [ElevationPoint],
    resolution: f64,
    policy: FinalPoint,
) -> Result<Vec<GradientPoint>, ProfileError> {
    if samples.is_empty() {
        return Err(ProfileError::EmptyInput);
    }
    check_finite(samples)?;
    sort_by_distance(samples);
    gradient_points(samples, resolution, policy)
}

/// Elevation samples sorted once and reused for any number of queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationProfile {
    points: Vec<ElevationPoint>,
}

impl ElevationProfile {
    /// Builds a profile, sorting the samples by distance if required.
    pub fn new(mut points: Vec<ElevationPoint>) -> Result<Self, ProfileError> {
        if points.is_empty() {
            return Err(ProfileError::EmptyInput);
        }
        check_finite(&points)?;
        sort_by_distance(&mut points);
        Ok(Self { points })
    }

    /// Samples in ascending distance order.
    pub fn points(&self) -> &[ElevationPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<ElevationPoint> {
        self.points
    }

    pub fn min_distance(&self) -> f64 {
        self.points[0].distance
    }

    pub fn max_distance(&self) -> f64 {
        self.points[self.points.len() - 1].distance
    }

    pub fn bracket(&self, distance: f64) -> Result<Bracket, ProfileError> {
        bracket(&self.points, distance)
    }

    /// Linearly interpolated elevation at `distance`.
    pub fn elevation_at(&self, distance: f64) -> Result<f64, ProfileError> {
        elevation_in(&self.points, distance)
    }

    /// Gradient profile at the given resolution.
    pub fn gradient_profile(
        &self,
        resolution: f64,
        policy: FinalPoint,
    ) -> Result<Vec<GradientPoint>, ProfileError> {
        gradient_points(&self.points, resolution, policy)
    }
}

impl TryFrom<Vec<ElevationPoint>> for ElevationProfile {
    type Error = ProfileError;

    fn try_from(points: Vec<ElevationPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}
