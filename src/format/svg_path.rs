//! SVG path encoding of ROI geometry.
//!
//! The Renderer speaks in path strings of the form `M x,y L x,y ... Z`. This
//! module is the single place that converts between those strings and
//! [`Ring`]s. Coordinates are integer pixels; fractional input is truncated
//! toward zero.

use crate::constants::MIN_RING_VERTICES;
use crate::format::error::PathError;
use crate::model::{Point, Ring, Vertex};

/// Parse a closed path into a single ring.
///
/// Strips the leading move command and an optional trailing close command,
/// splits the remainder on line commands, and parses each `x,y` pair.
pub fn parse_ring(path: &str) -> Result<Ring, PathError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }

    let body = trimmed
        .strip_prefix('M')
        .ok_or_else(|| PathError::MissingMove {
            path: trimmed.to_string(),
        })?;
    let body = body.trim_end();
    let body = body.strip_suffix('Z').unwrap_or(body);

    let ring = body
        .split('L')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(parse_vertex)
        .collect::<Result<Ring, PathError>>()?;

    if ring.len() < MIN_RING_VERTICES {
        return Err(PathError::TooFewVertices {
            required: MIN_RING_VERTICES,
            found: ring.len(),
        });
    }
    Ok(ring)
}

fn parse_vertex(segment: &str) -> Result<Vertex, PathError> {
    let mut parts = segment.split(',');
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(PathError::invalid_segment(segment));
    };
    Ok([parse_coordinate(x)?, parse_coordinate(y)?])
}

fn parse_coordinate(text: &str) -> Result<i32, PathError> {
    let text = text.trim();
    let value: f64 = text
        .parse()
        .map_err(|_| PathError::invalid_coordinate(text))?;
    if !value.is_finite() || value.abs() > i32::MAX as f64 {
        return Err(PathError::invalid_coordinate(text));
    }
    Ok(value.trunc() as i32)
}

/// Serialize a ring as a closed path. An empty ring yields an empty string.
pub fn ring_to_path(ring: &[Vertex]) -> String {
    let mut path = String::new();
    for (i, [x, y]) in ring.iter().enumerate() {
        if i == 0 {
            path.push_str(&format!("M {},{}", x, y));
        } else {
            path.push_str(&format!(" L{},{}", x, y));
        }
    }
    if !path.is_empty() {
        path.push_str(" Z");
    }
    path
}

/// Closed square marker centered on a point, used to draw point ROIs.
pub fn point_marker_path(point: Point, half_size: f32) -> String {
    let (x0, x1) = (point.x - half_size, point.x + half_size);
    let (y0, y1) = (point.y - half_size, point.y + half_size);
    format!(
        "M {},{} L{},{} L{},{} L{},{} Z",
        x0, y0, x1, y0, x1, y1, x0, y1
    )
}
