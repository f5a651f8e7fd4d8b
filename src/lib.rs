//! # PostGIS Tiles
//!
//! Serves Mapbox vector tiles straight from PostGIS tables.
//!
//! ## Current features
//!
//! Every table in the configured database schema that has a geometry column is
//! exposed as a single-layer tile source at `/{table}/vt/{z}/{x}/{y}.mvt`. The
//! geometry column and attribute columns are looked up on each request, so
//! new tables and columns show up without a restart. PostGIS does all of the
//! heavy lifting: reprojection to EPSG:3857, clipping against the buffered
//! tile, and MVT encoding.
//!
//! ## Known Limitations
//!
//! Tables not registered in `geometry_columns` fall back to the first
//! `geometry` or `geography` column in catalog order, so tables with several
//! such columns should be registered. Every non-geometry column becomes a
//! feature property; columns of types PostGIS cannot encode will make the tile
//! query fail. Schema lookups are not cached.

pub mod error;
pub mod ident;
pub mod mercator;
pub mod query;
pub mod schema;
pub mod server;
pub mod service;

#[cfg(test)]
mod testing;

pub use error::{Error, ValidationError};
pub use mercator::{get_epsg_3857_tile_bounds, BoundingBox, TileCoordinate};
pub use schema::{resolve_schema, SpatialCatalog, TableSchema};
pub use service::{ConnectionSource, TileExecutor, TileRequest, TileResponse, TileService};
