//! Slippy map tile coordinates and their EPSG:3857 extents.

use crate::error::ValidationError;

/// Half the width of the web mercator world, in meters.
pub const ORIGIN_SHIFT: f64 = 20037508.342789244;

/// Meters per pixel at zoom 0 for 256 px tiles.
const INITIAL_RESOLUTION: f64 = 156543.03392804097;

pub const TILE_SIZE: f64 = 256.0;

/// Highest zoom level accepted in a request; keeps `2^zoom` within `u32`.
pub const MAX_ZOOM: u8 = 30;

/// An axis-aligned box in EPSG:3857 meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A tile's extent in WGS84 degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LonLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// A validated slippy map tile address in XYZ format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    zoom: u8,
    x: u32,
    y: u32,
}

impl TileCoordinate {
    /// Checks that the tile exists in the quad-tree at the given zoom.
    pub fn new(zoom: i64, x: i64, y: i64) -> Result<TileCoordinate, ValidationError> {
        if !(0..=i64::from(MAX_ZOOM)).contains(&zoom) {
            return Err(ValidationError::ZoomOutOfRange(zoom));
        }
        let zoom = zoom as u8;
        let tiles = 1i64 << zoom;
        if !(0..tiles).contains(&x) || !(0..tiles).contains(&y) {
            return Err(ValidationError::TileOutOfRange { zoom, x, y });
        }

        Ok(TileCoordinate {
            zoom,
            x: x as u32,
            y: y as u32,
        })
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn bounds(&self) -> BoundingBox {
        get_epsg_3857_tile_bounds(self.zoom, self.x, self.y)
    }

    pub fn lonlat_bounds(&self) -> LonLatBounds {
        // The north-west corner of tile (x+1, y+1) is this tile's south-east corner
        let (west, north) = slippy_map_tilenames::tile2lonlat(self.x, self.y, self.zoom);
        let (east, south) = slippy_map_tilenames::tile2lonlat(self.x + 1, self.y + 1, self.zoom);

        LonLatBounds {
            west,
            south,
            east,
            north,
        }
    }
}

/// Computes the web mercator extent of a tile. Rows count down from the top
/// of the map while mercator Y grows upwards, hence the flipped Y axis.
pub fn get_epsg_3857_tile_bounds(zoom: u8, x: u32, y: u32) -> BoundingBox {
    let resolution = INITIAL_RESOLUTION / 2f64.powi(zoom.into());
    let x = f64::from(x);
    let y = f64::from(y);

    BoundingBox {
        min_x: x * TILE_SIZE * resolution - ORIGIN_SHIFT,
        max_x: (x + 1.0) * TILE_SIZE * resolution - ORIGIN_SHIFT,
        min_y: ORIGIN_SHIFT - (y + 1.0) * TILE_SIZE * resolution,
        max_y: ORIGIN_SHIFT - y * TILE_SIZE * resolution,
    }
}
