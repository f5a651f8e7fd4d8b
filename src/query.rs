//! Assembles the PostGIS query that renders one table into one MVT layer.

use sqlx::{postgres::PgArguments, query::QueryScalar, query_scalar, Postgres};

use crate::error::ValidationError;
use crate::ident::{is_valid_identifier, quote_ident};
use crate::mercator::BoundingBox;
use crate::schema::TableSchema;

/// Logical units per tile edge in the encoded geometry.
pub const TILE_EXTENT: i32 = 4096;

/// Pixels of geometry kept beyond each tile edge.
pub const TILE_BUFFER: i32 = 64;

/// Features crossing a tile edge are left unclipped so adjacent tiles join
/// without seams; the buffer bounds how far they spill over.
pub const CLIP_GEOMETRY: bool = false;

/// Name of the encoded geometry column inside the aggregated rows.
const MVT_GEOMETRY: &str = "mvt_geom";

/// A ready-to-run tile query. Identifiers are baked into `sql`; the bounding
/// box, encoding constants and layer name are bound as parameters `$1..$8`.
#[derive(Clone, Debug, PartialEq)]
pub struct TileQuery {
    pub sql: String,
    pub bbox: BoundingBox,
    pub layer: String,
}

impl TileQuery {
    /// Binds every parameter in the order the SQL expects them. The single
    /// result column is the MVT blob, NULL or empty when nothing intersects.
    pub fn bind(&self) -> QueryScalar<'_, Postgres, Option<Vec<u8>>, PgArguments> {
        query_scalar(&self.sql)
            .bind(self.bbox.min_x)
            .bind(self.bbox.min_y)
            .bind(self.bbox.max_x)
            .bind(self.bbox.max_y)
            .bind(TILE_EXTENT)
            .bind(TILE_BUFFER)
            .bind(CLIP_GEOMETRY)
            .bind(self.layer.as_str())
    }
}

/// Builds the tile query for a resolved table.
///
/// The schema and table names are checked against the identifier grammar
/// again here, since they are the only request-derived text that reaches the
/// SQL string. Column names come from the catalog and are only quoted.
pub fn build_tile_query(
    db_schema: &str,
    schema: &TableSchema,
    bbox: BoundingBox,
) -> Result<TileQuery, ValidationError> {
    for name in [db_schema, schema.table_name.as_str()] {
        if !is_valid_identifier(name) {
            return Err(ValidationError::InvalidTableName(name.to_owned()));
        }
    }

    let geom = format!(
        "ST_Transform(t.{}::geometry, 3857)",
        quote_ident(&schema.geometry_column)
    );
    let attributes: String = schema
        .attribute_columns
        .iter()
        .map(|column| format!(", t.{}", quote_ident(column)))
        .collect();

    let sql = format!(
        "WITH bounds AS (
    SELECT ST_MakeEnvelope($1, $2, $3, $4, 3857) AS geom
),
mvtgeom AS (
    SELECT ST_AsMVTGeom({geom}, bounds.geom, $5::integer, $6::integer, $7::boolean) AS {mvt_geom}{attributes}
    FROM {schema}.{table} t, bounds
    WHERE ST_Intersects({geom}, bounds.geom)
)
SELECT ST_AsMVT(mvtgeom.*, $8::text, $5::integer, '{mvt_geom}') AS tile FROM mvtgeom",
        geom = geom,
        mvt_geom = MVT_GEOMETRY,
        attributes = attributes,
        schema = quote_ident(db_schema),
        table = quote_ident(&schema.table_name),
    );

    Ok(TileQuery {
        sql,
        bbox,
        layer: schema.table_name.clone(),
    })
}
