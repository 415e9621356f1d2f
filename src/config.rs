use serde::{Deserialize, Serialize};

use crate::dialect::{BinaryEncoding, DialectStrategy};
use crate::types::DatabaseType;

fn default_quote_identifiers() -> bool {
    true
}

/// Client settings, loadable from any serde format.
///
/// ```rust
/// use sql_dialect_middleware::prelude::*;
///
/// let cfg: ClientConfig =
///     serde_json::from_str(r#"{ "database_type": "oracle", "max_rows": 500 }"#).unwrap();
/// assert!(cfg.quote_identifiers);
/// assert_eq!(cfg.dialect().name, "oracle");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub database_type: DatabaseType,
    /// Wrap identifiers in the dialect's quote characters unless a request says otherwise.
    #[serde(default = "default_quote_identifiers")]
    pub quote_identifiers: bool,
    /// Replace the dialect's binary encoding.
    #[serde(default)]
    pub binary_fallback: Option<BinaryEncoding>,
    /// Cap on the rows kept from a select.
    #[serde(default)]
    pub max_rows: Option<usize>,
}

impl ClientConfig {
    #[must_use]
    pub fn new(database_type: DatabaseType) -> Self {
        Self {
            database_type,
            quote_identifiers: default_quote_identifiers(),
            binary_fallback: None,
            max_rows: None,
        }
    }

    #[must_use]
    pub fn quote_identifiers(mut self, enabled: bool) -> Self {
        self.quote_identifiers = enabled;
        self
    }

    #[must_use]
    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    #[must_use]
    pub fn binary_fallback(mut self, encoding: BinaryEncoding) -> Self {
        self.binary_fallback = Some(encoding);
        self
    }

    /// Resolve the dialect strategy these settings describe.
    #[must_use]
    pub fn dialect(&self) -> DialectStrategy {
        let mut dialect = DialectStrategy::for_database(self.database_type);
        if let Some(encoding) = self.binary_fallback {
            dialect.binary_encoding = encoding;
        }
        dialect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: ClientConfig = serde_json::from_str(r#"{"database_type":"postgres"}"#).unwrap();
        assert_eq!(cfg, ClientConfig::new(DatabaseType::Postgres));
    }

    #[test]
    fn binary_fallback_overrides_dialect() {
        let cfg: ClientConfig = serde_json::from_str(
            r#"{"database_type":"sqlite","binary_fallback":"hex","quote_identifiers":false}"#,
        )
        .unwrap();
        assert!(!cfg.quote_identifiers);
        assert_eq!(cfg.dialect().binary_encoding, BinaryEncoding::Hex);
        assert_eq!(
            ClientConfig::new(DatabaseType::Sqlite).dialect().binary_encoding,
            BinaryEncoding::Native
        );
    }

    #[test]
    fn unknown_database_is_rejected() {
        assert!(serde_json::from_str::<ClientConfig>(r#"{"database_type":"db2"}"#).is_err());
    }
}
