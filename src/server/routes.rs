//! The tile endpoint: `GET /{table}/vt/{z}/{x}/{y}.mvt`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use crate::error::{Error, ValidationError};
use crate::service::{ConnectionSource, TileRequest, TileResponse, TileService};

pub fn tile_routes<P>(service: Arc<TileService<P>>) -> Router
where
    P: ConnectionSource + 'static,
{
    Router::new()
        .route("/:table/vt/:z/:x/:tile", get(tile_handler::<P>))
        .with_state(service)
}

async fn tile_handler<P>(
    State(service): State<Arc<TileService<P>>>,
    Path((table, z, x, tile)): Path<(String, String, String, String)>,
) -> Result<TileResponse, Error>
where
    P: ConnectionSource + 'static,
{
    let y = tile
        .strip_suffix(".mvt")
        .ok_or(ValidationError::MalformedCoordinate {
            name: "y",
            value: tile.clone(),
        })?;
    let request = TileRequest::parse(&table, &z, &x, y)?;

    service.render_mvt(&request).await
}
