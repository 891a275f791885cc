//! File input and output helpers for elevation and gradient data.

use std::fs::File;
use std::io::{self, Read, Write};

use crate::profile::{ElevationPoint, GradientPoint};

pub mod stage_db;

/// Reads a file to string.
pub fn read_to_string(path: &str) -> io::Result<String> {
    let mut buffer = String::new();
    File::open(path)?.read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Writes a string to a file, replacing any existing contents.
pub fn write_string(path: &str, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())
}

fn parse_field(value: &str, line: usize) -> io::Result<f64> {
    let value = value.trim();
    let parsed = value.parse::<f64>().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line {}: {}", line, e),
        )
    })?;
    if !parsed.is_finite() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line {}: non-finite value `{}`", line, value),
        ));
    }
    Ok(parsed)
}

/// Parses `distance,elevation` lines. A non-numeric first line is treated as
/// a header and skipped.
pub fn parse_elevation_csv(contents: &str) -> io::Result<Vec<ElevationPoint>> {
    let mut pts = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 2 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line {}: expected distance,elevation", idx + 1),
            ));
        }
        if idx == 0 && parts[0].trim().parse::<f64>().is_err() {
            continue;
        }
        let distance = parse_field(parts[0], idx + 1)?;
        let elevation = parse_field(parts[1], idx + 1)?;
        pts.push(ElevationPoint::new(distance, elevation));
    }
    Ok(pts)
}

/// Reads elevation samples from a CSV file of `distance,elevation` pairs.
pub fn read_elevation_csv(path: &str) -> io::Result<Vec<ElevationPoint>> {
    parse_elevation_csv(&read_to_string(path)?)
}

/// Reads elevation samples from a JSON array of `{distance, elevation}` objects.
pub fn read_elevation_json(path: &str) -> io::Result<Vec<ElevationPoint>> {
    let contents = read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Reads samples as JSON when the path ends in `.json`, otherwise as CSV.
pub fn read_elevation_file(path: &str) -> io::Result<Vec<ElevationPoint>> {
    if path.to_ascii_lowercase().ends_with(".json") {
        read_elevation_json(path)
    } else {
        read_elevation_csv(path)
    }
}

/// Writes a gradient profile as a pretty-printed JSON array.
pub fn write_gradient_json(path: &str, points: &[GradientPoint]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(points).map_err(io::Error::other)?;
    write_string(path, &json)
}
