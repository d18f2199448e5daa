//! Geospatial validation helpers and Web Mercator tile math.

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::{Error, Result};

/// Maximum zoom level served by the vector tile endpoints.
pub const MAX_TILE_ZOOM: u8 = 14;

/// Validate a latitude/longitude pair.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::validation("latitude", "must be between -90 and 90"));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::validation("longitude", "must be between -180 and 180"));
    }
    Ok(())
}

/// Validate that four coordinates form a proper bounding box.
pub fn validate_bbox(west: f64, south: f64, east: f64, north: f64) -> Result<()> {
    validate_coordinates(south, west)?;
    validate_coordinates(north, east)?;

    if west >= east {
        return Err(Error::validation("bbox", "west longitude must be less than east longitude"));
    }
    if south >= north {
        return Err(Error::validation("bbox", "south latitude must be less than north latitude"));
    }
    Ok(())
}

pub fn validate_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(Error::validation("radius", "must be positive"));
    }
    Ok(())
}

/// Validate a date string in one of the accepted forms:
/// `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, or `YYYY-MM-DDTHH:MM:SS` (optionally
/// suffixed with `Z`).
pub fn validate_date_string(date: &str) -> Result<()> {
    let bare = date.strip_suffix('Z').unwrap_or(date);

    let valid = (bare.len() == 4 && bare.chars().all(|c| c.is_ascii_digit()))
        || NaiveDate::parse_from_str(&format!("{bare}-01"), "%Y-%m-%d").is_ok()
        || NaiveDate::parse_from_str(bare, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(bare, "%Y-%m-%dT%H:%M:%S").is_ok();

    if valid {
        Ok(())
    } else {
        Err(Error::validation(
            "date",
            "must be in format YYYY, YYYY-MM, YYYY-MM-DD, or YYYY-MM-DDTHH:MM:SS",
        ))
    }
}

/// Validate a single compass angle in degrees.
pub fn validate_compass_angle(angle: f64) -> Result<()> {
    if !angle.is_finite() || !(0.0..=360.0).contains(&angle) {
        return Err(Error::validation("compass_angle", "must be between 0 and 360"));
    }
    Ok(())
}

/// Validate a compass angle range.
///
/// A range with `min > max` is allowed only when it wraps around north
/// (e.g. 315..45); any other inverted range is rejected.
pub fn validate_compass_range(min: f64, max: f64) -> Result<()> {
    validate_compass_angle(min)?;
    validate_compass_angle(max)?;

    if min > max && !(min > 180.0 && max < 180.0) {
        return Err(Error::validation("compass_angle", "invalid compass angle range"));
    }
    Ok(())
}

/// Vector tile layers served by the upstream tile endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileLayer {
    Image,
    Sequence,
    Overview,
    TrafficSign,
    MapFeature,
}

impl TileLayer {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Sequence => "sequence",
            Self::Overview => "overview",
            Self::TrafficSign => "traffic_sign",
            Self::MapFeature => "map_feature",
        }
    }
}

/// A tile address in the Web Mercator grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// Geographic bounds of a tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Validate a z/x/y tile address against the supported zoom range.
pub fn validate_tile_coords(z: u8, x: u32, y: u32) -> Result<()> {
    if z > MAX_TILE_ZOOM {
        return Err(Error::validation("zoom", "zoom level must be between 0 and 14"));
    }
    let extent = 1u32 << z;
    if x >= extent {
        return Err(Error::validation("x", format!("must be between 0 and {}", extent - 1)));
    }
    if y >= extent {
        return Err(Error::validation("y", format!("must be between 0 and {}", extent - 1)));
    }
    Ok(())
}

/// Geographic bounds of the given tile.
pub fn tile_bounds(z: u8, x: u32, y: u32) -> Result<TileBounds> {
    validate_tile_coords(z, x, y)?;

    let n = f64::from(1u32 << z);
    let west = f64::from(x) / n * 360.0 - 180.0;
    let east = f64::from(x + 1) / n * 360.0 - 180.0;
    let north = tile_edge_latitude(f64::from(y), n);
    let south = tile_edge_latitude(f64::from(y + 1), n);

    Ok(TileBounds { west, south, east, north })
}

fn tile_edge_latitude(y: f64, n: f64) -> f64 {
    (std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
}

/// Tile addresses at `zoom` that cover the given bounding box.
pub fn tiles_for_bbox(west: f64, south: f64, east: f64, north: f64, zoom: u8) -> Result<Vec<TileCoord>> {
    validate_bbox(west, south, east, north)?;
    if zoom > MAX_TILE_ZOOM {
        return Err(Error::validation("zoom", "zoom level must be between 0 and 14"));
    }

    let (x_a, y_a) = lonlat_to_tile(west, north, zoom);
    let (x_b, y_b) = lonlat_to_tile(east, south, zoom);

    let (x_min, x_max) = (x_a.min(x_b), x_a.max(x_b));
    let (y_min, y_max) = (y_a.min(y_b), y_a.max(y_b));

    let mut tiles = Vec::new();
    for x in x_min..=x_max {
        for y in y_min..=y_max {
            tiles.push(TileCoord { z: zoom, x, y });
        }
    }
    Ok(tiles)
}

fn lonlat_to_tile(lon: f64, lat: f64, zoom: u8) -> (u32, u32) {
    let n = f64::from(1u32 << zoom);
    let max_index = (1u32 << zoom) - 1;

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();

    // Clamp the poles and the antimeridian edge into the grid.
    let x = if x < 0.0 { 0 } else { (x as u32).min(max_index) };
    let y = if y < 0.0 { 0 } else { (y as u32).min(max_index) };
    (x, y)
}
