use std::fmt;

use geo::{Coord, MapCoords, MultiPolygon, Point};
use proj4rs::{proj::Proj as Proj4, transform::transform};
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// A planar coordinate reference system, identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceFrame(pub u32);

impl ReferenceFrame {
    /// WGS84 longitude/latitude in degrees.
    pub const WGS84: Self = Self(4326);

    /// Spherical (Web) Mercator in metres; the working frame for joins.
    pub const WEB_MERCATOR: Self = Self(3857);

    #[inline] pub fn epsg(&self) -> u32 { self.0 }

    /// True if coordinates in this frame are angular (degrees).
    #[inline] pub fn is_geographic(&self) -> bool { matches!(self.0, 4326 | 4269) }

    /// Return the frame shared by fragments and points, or fail if they differ.
    pub fn reconcile(fragments: Self, points: Self) -> Result<Self, StatsError> {
        if fragments != points {
            return Err(StatsError::ReferenceFrameMismatch { fragments, points });
        }
        Ok(fragments)
    }

    /// PROJ.4 definition for the supported frames.
    fn proj4_string(&self) -> Result<&'static str, StatsError> {
        match self.0 {
            4326 => Ok("+proj=longlat +datum=WGS84 +no_defs +type=crs"),
            4269 => Ok("+proj=longlat +datum=NAD83 +no_defs +type=crs"),
            3857 => Ok("+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs"),
            code => Err(StatsError::Reprojection(format!("unsupported reference frame EPSG:{code}"))),
        }
    }
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// A prepared transform between two reference frames.
pub struct Reprojector {
    from: ReferenceFrame,
    to: ReferenceFrame,
    source: Proj4,
    target: Proj4,
}

impl Reprojector {
    pub fn new(from: ReferenceFrame, to: ReferenceFrame) -> Result<Self, StatsError> {
        let build = |frame: ReferenceFrame| -> Result<Proj4, StatsError> {
            let proj_string = frame.proj4_string()?;
            Proj4::from_proj_string(proj_string)
                .map_err(|e| StatsError::Reprojection(format!("failed to build PROJ.4 for {frame}: {e:?}")))
        };
        Ok(Self { from, to, source: build(from)?, target: build(to)? })
    }

    #[inline] pub fn is_identity(&self) -> bool { self.from == self.to }

    /// Transform a single coordinate. Degrees in/out for geographic frames.
    pub fn transform_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>, StatsError> {
        if self.is_identity() { return Ok(coord) }

        let mut point = if self.from.is_geographic() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&self.source, &self.target, &mut point)
            .map_err(|e| StatsError::Reprojection(format!("{} -> {} at ({}, {}): {e:?}", self.from, self.to, coord.x, coord.y)))?;

        let coord = if self.to.is_geographic() {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        };
        if !(coord.x.is_finite() && coord.y.is_finite()) {
            return Err(StatsError::Reprojection(format!("{} -> {} produced a non-finite coordinate", self.from, self.to)));
        }
        Ok(coord)
    }

    pub fn point(&self, point: &Point<f64>) -> Result<Point<f64>, StatsError> {
        Ok(Point(self.transform_coord(point.0)?))
    }

    pub fn multi_polygon(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, StatsError> {
        shape.try_map_coords(|coord| self.transform_coord(coord))
    }
}
