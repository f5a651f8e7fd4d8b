//! Geometry and attribute column discovery for tile-able tables.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{pool::PoolConnection, query_scalar, Postgres};
use tracing::debug;

use crate::error::Error;

/// The columns of a table as needed to render it as a single tile layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub geometry_column: String,
    /// Every other column, in the table's declared order. Stored unquoted.
    pub attribute_columns: Vec<String>,
}

/// Read-only access to the catalogs describing a table's columns.
#[async_trait]
pub trait SpatialCatalog: Send {
    /// The geometry column registered for the table in PostGIS' `geometry_columns`.
    async fn registered_geometry_column(
        &mut self,
        db_schema: &str,
        table: &str,
    ) -> Result<Option<String>, sqlx::Error>;

    /// The first column, in catalog order, whose type is `geometry` or `geography`.
    async fn first_spatial_column(
        &mut self,
        db_schema: &str,
        table: &str,
    ) -> Result<Option<String>, sqlx::Error>;

    /// All columns of the table except `excluded`, ordered by position.
    async fn columns_except(
        &mut self,
        db_schema: &str,
        table: &str,
        excluded: &str,
    ) -> Result<Vec<String>, sqlx::Error>;
}

const REGISTERED_GEOMETRY_SQL: &str = "
    SELECT f_geometry_column::text
    FROM public.geometry_columns
    WHERE f_table_schema = $1 AND f_table_name = $2
    LIMIT 1";

const FIRST_SPATIAL_COLUMN_SQL: &str = "
    SELECT column_name::text
    FROM information_schema.columns
    WHERE table_schema = $1 AND table_name = $2
    AND udt_name IN ('geometry', 'geography')
    LIMIT 1";

const ATTRIBUTE_COLUMNS_SQL: &str = "
    SELECT column_name::text
    FROM information_schema.columns
    WHERE table_schema = $1 AND table_name = $2 AND column_name <> $3
    ORDER BY ordinal_position";

#[async_trait]
impl SpatialCatalog for PoolConnection<Postgres> {
    async fn registered_geometry_column(
        &mut self,
        db_schema: &str,
        table: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        query_scalar::<_, String>(REGISTERED_GEOMETRY_SQL)
            .bind(db_schema)
            .bind(table)
            .fetch_optional(&mut **self)
            .await
    }

    async fn first_spatial_column(
        &mut self,
        db_schema: &str,
        table: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        query_scalar::<_, String>(FIRST_SPATIAL_COLUMN_SQL)
            .bind(db_schema)
            .bind(table)
            .fetch_optional(&mut **self)
            .await
    }

    async fn columns_except(
        &mut self,
        db_schema: &str,
        table: &str,
        excluded: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        query_scalar::<_, String>(ATTRIBUTE_COLUMNS_SQL)
            .bind(db_schema)
            .bind(table)
            .bind(excluded)
            .fetch(&mut **self)
            .try_collect()
            .await
    }
}

/// Works out which column holds the geometry and which columns ride along as
/// feature attributes.
///
/// Tables registered with PostGIS are trusted as-is. Otherwise the first
/// `geometry`/`geography` column in catalog order wins; tables with several
/// unregistered spatial columns therefore have no stable choice.
pub async fn resolve_schema<C>(
    catalog: &mut C,
    db_schema: &str,
    table: &str,
) -> Result<TableSchema, Error>
where
    C: SpatialCatalog + ?Sized,
{
    let geometry_column = match catalog.registered_geometry_column(db_schema, table).await? {
        Some(column) => column,
        None => catalog
            .first_spatial_column(db_schema, table)
            .await?
            .ok_or_else(|| Error::SchemaResolution {
                table: table.to_owned(),
            })?,
    };

    let attribute_columns = catalog
        .columns_except(db_schema, table, &geometry_column)
        .await?;

    debug!(
        table,
        geometry_column = %geometry_column,
        attributes = attribute_columns.len(),
        "resolved table schema"
    );

    Ok(TableSchema {
        table_name: table.to_owned(),
        geometry_column,
        attribute_columns,
    })
}
