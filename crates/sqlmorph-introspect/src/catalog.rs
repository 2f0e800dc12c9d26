use sqlmorph_core::{
    ColumnExt, DataTypeKind, Dialect, IndexExt, RoutineExt, ServerVersion, TableExt,
};

use crate::raw::{RawColumn, RawDataType, RawIndexColumn, RawRoutine, RawTable};

/// What a catalog query needs to know about the server it runs against.
#[derive(Debug, Clone)]
pub struct CatalogEnv {
    pub dialect: Dialect,
    pub version: ServerVersion,
    pub filter: CatalogFilter,
}

impl CatalogEnv {
    pub fn new(dialect: Dialect, version: ServerVersion, database: &str) -> Self {
        Self {
            dialect,
            version,
            filter: CatalogFilter::new(dialect, database),
        }
    }
}

/// Builds the WHERE-clause fragments shared by every catalog query.
///
/// This is the only place object names are interpolated into catalog SQL.
#[derive(Debug, Clone)]
pub struct CatalogFilter {
    dialect: Dialect,
    database: String,
    excluded_schemas: Vec<String>,
}

impl CatalogFilter {
    pub fn new(dialect: Dialect, database: &str) -> Self {
        let excluded_schemas = match dialect {
            Dialect::Postgres => vec!["pg_catalog", "information_schema"],
            Dialect::SqlServer => vec!["sys", "INFORMATION_SCHEMA"],
            Dialect::MySql | Dialect::MariaDb => {
                vec!["mysql", "information_schema", "performance_schema", "sys"]
            }
        };
        Self {
            dialect,
            database: database.to_string(),
            excluded_schemas: excluded_schemas.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Quote a string literal for the dialect.
    pub fn literal(&self, value: &str) -> String {
        let escaped = value.replace('\'', "''");
        match self.dialect {
            Dialect::MySql | Dialect::MariaDb => format!("'{}'", escaped.replace('\\', "\\\\")),
            Dialect::SqlServer => format!("N'{escaped}'"),
            Dialect::Postgres => format!("'{escaped}'"),
        }
    }

    /// `column = '<database>'`, for catalogs spanning every database.
    pub fn database_equals(&self, column: &str) -> String {
        format!("{column} = {}", self.literal(&self.database))
    }

    /// Predicate excluding system schemas.
    pub fn user_schema(&self, column: &str) -> String {
        let list = self
            .excluded_schemas
            .iter()
            .map(|schema| self.literal(schema))
            .collect::<Vec<_>>()
            .join(", ");
        match self.dialect {
            Dialect::Postgres => {
                format!("{column} NOT IN ({list}) AND {column} NOT LIKE 'pg\\_%'")
            }
            _ => format!("{column} NOT IN ({list})"),
        }
    }

    pub fn is_system_schema(&self, schema: &str) -> bool {
        self.excluded_schemas
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(schema))
            || (self.dialect == Dialect::Postgres && schema.starts_with("pg_"))
    }
}

/// Per-dialect catalog knowledge: the literal query for each phase and the
/// mapping of dialect-specific row facets onto the model.
///
/// Phases the dialect cannot answer return `None`; the discovery algorithm
/// also skips any phase its [`Capabilities`](sqlmorph_core::Capabilities)
/// rule out.
pub trait CatalogReader: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Narrow the dialect once the server identified itself.
    fn refine_dialect(&self, _version_text: &str) -> Dialect {
        self.dialect()
    }

    fn server_version_query(&self) -> &'static str;

    fn database_list_query(&self) -> &'static str;

    fn tables_query(&self, env: &CatalogEnv) -> String;

    fn columns_query(&self, env: &CatalogEnv) -> String;

    fn foreign_keys_query(&self, env: &CatalogEnv) -> String;

    fn indexes_query(&self, env: &CatalogEnv) -> String;

    fn constraints_query(&self, _env: &CatalogEnv) -> Option<String> {
        None
    }

    fn triggers_query(&self, env: &CatalogEnv) -> String;

    fn views_query(&self, env: &CatalogEnv) -> String;

    fn functions_query(&self, env: &CatalogEnv) -> String;

    fn stored_procedures_query(&self, _env: &CatalogEnv) -> Option<String> {
        None
    }

    fn data_types_query(&self, _env: &CatalogEnv) -> Option<String> {
        None
    }

    fn sequences_query(&self, _env: &CatalogEnv) -> Option<String> {
        None
    }

    fn schemas_query(&self, _env: &CatalogEnv) -> Option<String> {
        None
    }

    fn users_query(&self, env: &CatalogEnv) -> String;

    fn table_ext(&self, raw: &RawTable) -> TableExt;

    fn column_ext(&self, raw: &RawColumn) -> ColumnExt;

    /// Index facets, from the first member row of the index.
    fn index_ext(&self, first: &RawIndexColumn, members: &[RawIndexColumn]) -> IndexExt;

    fn routine_ext(&self, _raw: &RawRoutine) -> RoutineExt {
        RoutineExt::None
    }

    fn data_type_kind(&self, _raw: &RawDataType) -> DataTypeKind {
        DataTypeKind::Base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_interpolated_names() {
        let filter = CatalogFilter::new(Dialect::MySql, "o'neil\\db");
        assert_eq!(
            filter.database_equals("TABLE_SCHEMA"),
            "TABLE_SCHEMA = 'o''neil\\\\db'"
        );

        let filter = CatalogFilter::new(Dialect::SqlServer, "it's");
        assert_eq!(filter.literal("it's"), "N'it''s'");
    }

    #[test]
    fn default_hooks_keep_the_configured_dialect() {
        use crate::{MySqlCatalog, PostgresCatalog};

        assert_eq!(
            PostgresCatalog.refine_dialect("PostgreSQL 16.2 on x86_64-pc-linux-gnu"),
            Dialect::Postgres
        );
        let raw = RawDataType {
            type_name: "geometry".into(),
            ..RawDataType::default()
        };
        assert!(matches!(
            MySqlCatalog::default().data_type_kind(&raw),
            DataTypeKind::Base
        ));
    }

    #[test]
    fn recognises_system_schemas() {
        let filter = CatalogFilter::new(Dialect::Postgres, "shop");
        assert!(filter.is_system_schema("pg_toast"));
        assert!(filter.is_system_schema("information_schema"));
        assert!(!filter.is_system_schema("app"));
        assert!(filter.user_schema("n.nspname").contains("NOT LIKE"));
    }
}
