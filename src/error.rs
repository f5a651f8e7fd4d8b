/// Reasons a tile request is rejected before any database work happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),
    #[error("Invalid tile coordinate component {name}: {value:?}")]
    MalformedCoordinate { name: &'static str, value: String },
    #[error("Zoom level {0} is outside 0..={max}", max = crate::mercator::MAX_ZOOM)]
    ZoomOutOfRange(i64),
    #[error("Tile {x}/{y} does not exist at zoom {zoom}")]
    TileOutOfRange { zoom: u8, x: i64, y: i64 },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("No geometry column found in {table}")]
    SchemaResolution { table: String },
    #[error("Database error: {0}")]
    Execution(#[from] sqlx::Error),
    #[error("Invalid YAML in server config.")]
    Config(#[from] serde_yaml::Error),
    #[error("Invalid server config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by the request itself rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::SchemaResolution { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        let invalid = Error::from(ValidationError::InvalidTableName("a b".into()));
        assert!(invalid.is_client_error());

        let no_geom = Error::SchemaResolution {
            table: String::from("roads"),
        };
        assert!(no_geom.is_client_error());
        assert_eq!("No geometry column found in roads", no_geom.to_string());

        let db = Error::from(sqlx::Error::PoolTimedOut);
        assert!(!db.is_client_error());
    }

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::TileOutOfRange { zoom: 1, x: 2, y: 0 };
        assert_eq!("Tile 2/0 does not exist at zoom 1", err.to_string());

        let err = ValidationError::ZoomOutOfRange(31);
        assert_eq!("Zoom level 31 is outside 0..=30", err.to_string());
    }
}
