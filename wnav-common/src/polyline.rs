//! Encoded polyline codec
//!
//! Routing backends return route geometry in the standard encoded polyline
//! format at precision 5. The `polyline` crate works on `geo_types`
//! coordinates in (x, y) = (lng, lat) order; these adapters convert to and
//! from [`LatLng`].

use crate::error::{Error, Result};
use crate::geo::LatLng;
use geo_types::{Coord, LineString};

/// Decimal places kept by the encoding
pub const PRECISION: u32 = 5;

/// Decode an encoded polyline into coordinates
///
/// # Errors
///
/// Returns [`Error::PolylineDecode`] if the input contains a character
/// outside the encoding alphabet or ends in the middle of a coordinate.
///
/// # Examples
///
/// ```
/// use wnav_common::polyline::decode;
///
/// let points = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
/// assert_eq!(points.len(), 3);
/// assert!((points[0].lat - 38.5).abs() < 1e-9);
/// assert!((points[0].lng + 120.2).abs() < 1e-9);
/// ```
pub fn decode(encoded: &str) -> Result<Vec<LatLng>> {
    let line = ::polyline::decode_polyline(encoded, PRECISION).map_err(|e| Error::PolylineDecode(e.to_string()))?;
    Ok(line.coords().map(|c| LatLng::new(c.y, c.x)).collect())
}

/// Encode coordinates into an encoded polyline
///
/// Coordinates are rounded to 5 decimal places.
///
/// # Errors
///
/// Returns [`Error::PolylineEncode`] for a coordinate outside the valid
/// latitude/longitude range.
pub fn encode(points: &[LatLng]) -> Result<String> {
    let line: LineString<f64> = points.iter().map(|p| Coord { x: p.lng, y: p.lat }).collect();
    ::polyline::encode_coordinates(line, PRECISION).map_err(|e| Error::PolylineEncode(e.to_string()))
}
