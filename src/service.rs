//! Per-request orchestration of the tile pipeline.

use async_trait::async_trait;
use sqlx::{pool::PoolConnection, PgPool, Pool, Postgres};
use tracing::{debug, instrument, warn};

use crate::error::{Error, ValidationError};
use crate::ident::is_valid_identifier;
use crate::mercator::TileCoordinate;
use crate::query::{build_tile_query, TileQuery};
use crate::schema::{resolve_schema, SpatialCatalog};

/// Outcome of a successful tile render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TileResponse {
    /// No features intersect the tile.
    Empty,
    Payload(Vec<u8>),
}

/// A tile request whose table name and coordinate have been validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileRequest {
    table: String,
    tile: TileCoordinate,
}

impl TileRequest {
    pub fn new(table: &str, zoom: i64, x: i64, y: i64) -> Result<TileRequest, ValidationError> {
        if !is_valid_identifier(table) {
            return Err(ValidationError::InvalidTableName(table.to_owned()));
        }

        Ok(TileRequest {
            table: table.to_owned(),
            tile: TileCoordinate::new(zoom, x, y)?,
        })
    }

    /// Validates raw path segments, e.g. `("roads", "14", "8185", "5449")`.
    pub fn parse(table: &str, zoom: &str, x: &str, y: &str) -> Result<TileRequest, ValidationError> {
        fn number(name: &'static str, value: &str) -> Result<i64, ValidationError> {
            value
                .parse()
                .map_err(|_| ValidationError::MalformedCoordinate {
                    name,
                    value: value.to_owned(),
                })
        }

        if !is_valid_identifier(table) {
            return Err(ValidationError::InvalidTableName(table.to_owned()));
        }
        TileRequest::new(table, number("z", zoom)?, number("x", x)?, number("y", y)?)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn tile(&self) -> TileCoordinate {
        self.tile
    }
}

/// Runs a built tile query. Both a missing row and a NULL blob come back as `None`.
#[async_trait]
pub trait TileExecutor: SpatialCatalog {
    async fn fetch_tile(&mut self, query: &TileQuery) -> Result<Option<Vec<u8>>, sqlx::Error>;
}

#[async_trait]
impl TileExecutor for PoolConnection<Postgres> {
    async fn fetch_tile(&mut self, query: &TileQuery) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let row = query.bind().fetch_optional(&mut **self).await?;
        Ok(row.flatten())
    }
}

/// A shared pool of connections. A connection goes back to the pool when it
/// is dropped, so every exit path of a request releases it.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    type Connection: TileExecutor + Send;

    async fn acquire(&self) -> Result<Self::Connection, sqlx::Error>;
}

#[async_trait]
impl ConnectionSource for PgPool {
    type Connection = PoolConnection<Postgres>;

    async fn acquire(&self) -> Result<PoolConnection<Postgres>, sqlx::Error> {
        Pool::acquire(self).await
    }
}

/// Renders table layers as Mapbox vector tiles.
pub struct TileService<P> {
    pool: P,
    db_schema: String,
}

impl<P: ConnectionSource> TileService<P> {
    /// `db_schema` is the database schema holding the tile-able tables.
    pub fn new(pool: P, db_schema: &str) -> Result<TileService<P>, Error> {
        if !is_valid_identifier(db_schema) {
            return Err(Error::InvalidConfig(format!(
                "db_schema {:?} is not a plain identifier",
                db_schema
            )));
        }

        Ok(TileService {
            pool,
            db_schema: db_schema.to_owned(),
        })
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn db_schema(&self) -> &str {
        &self.db_schema
    }

    /// Renders the Mapbox vector tile for one table at a slippy map tile.
    ///
    /// Schema lookup and the tile query share one connection so both see the
    /// same table definition.
    #[instrument(
        skip(self, request),
        fields(
            table = %request.table(),
            z = request.tile().zoom(),
            x = request.tile().x(),
            y = request.tile().y()
        )
    )]
    pub async fn render_mvt(&self, request: &TileRequest) -> Result<TileResponse, Error> {
        let bounds = request.tile().lonlat_bounds();
        debug!(
            west = bounds.west,
            south = bounds.south,
            east = bounds.east,
            north = bounds.north,
            "rendering tile"
        );

        let mut conn = self.pool.acquire().await.map_err(|e| {
            warn!(error = %e, "could not acquire a database connection");
            Error::Execution(e)
        })?;

        let schema = resolve_schema(&mut conn, &self.db_schema, request.table()).await?;
        let query = build_tile_query(&self.db_schema, &schema, request.tile().bounds())?;

        let tile = conn.fetch_tile(&query).await.map_err(|e| {
            warn!(error = %e, "tile query failed");
            Error::Execution(e)
        })?;

        Ok(match tile {
            Some(bytes) if !bytes.is_empty() => {
                debug!(bytes = bytes.len(), "rendered tile");
                TileResponse::Payload(bytes)
            }
            _ => TileResponse::Empty,
        })
    }
}
