use std::path::PathBuf;

use pricebook_core::WarehouseConfig;

/// Settings shared by every command.
///
/// Each value resolves as flag, then environment variable, then default. The
/// flag/env step is done by clap; the defaults live in [`WarehouseConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub warehouse: WarehouseConfig,
}

impl ServiceConfig {
    pub fn resolve(home: Option<PathBuf>, db_path: Option<PathBuf>) -> Self {
        let mut warehouse = match home {
            Some(home) => WarehouseConfig::for_home(home),
            None => WarehouseConfig::default(),
        };
        if let Some(db_path) = db_path {
            warehouse.db_path = db_path;
        }
        Self { warehouse }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_flag_places_database_under_data() {
        let config = ServiceConfig::resolve(Some(PathBuf::from("/srv/pricebook")), None);

        assert_eq!(
            config.warehouse.db_path,
            PathBuf::from("/srv/pricebook/data/financial_data.duckdb")
        );
    }

    #[test]
    fn db_path_overrides_home_layout() {
        let config = ServiceConfig::resolve(
            Some(PathBuf::from("/srv/pricebook")),
            Some(PathBuf::from("/tmp/other.duckdb")),
        );

        assert_eq!(config.warehouse.pricebook_home, PathBuf::from("/srv/pricebook"));
        assert_eq!(config.warehouse.db_path, PathBuf::from("/tmp/other.duckdb"));
    }
}
