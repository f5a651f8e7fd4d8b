//! SQL identifier handling.
//!
//! Table and column names cannot be bound as query parameters, so they end up
//! in the SQL text. Anything taken from a request must pass
//! [`is_valid_identifier`] first, and every identifier is emitted through
//! [`quote_ident`] regardless of where it came from.

use once_cell::sync::Lazy;
use regex::Regex;

/// PostgreSQL truncates identifiers longer than `NAMEDATALEN - 1` bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Letters, digits and underscores, not starting with a digit.
pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && IDENTIFIER.is_match(name)
}

/// Delimits an identifier so case and reserved words survive, doubling any
/// embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
