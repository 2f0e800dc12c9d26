//! MySQL and MariaDB connectivity and catalog knowledge.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tokio::sync::OnceCell;

use sqlmorph_core::{
    ColumnExt, ConnectionUrl, Dialect, Error, GeneratedColumn, IndexExt, MySqlColumn, MySqlIndex,
    MySqlTable, Result, TableExt,
};

use crate::catalog::{CatalogEnv, CatalogReader};
use crate::context::{CatalogRow, ConnectionContext};
use crate::raw::{RawColumn, RawIndexColumn, RawTable};

mod queries;

/// Connection context for MySQL-family servers.
#[derive(Debug)]
pub struct MySqlContext {
    url: ConnectionUrl,
    database: String,
    pool: OnceCell<MySqlPool>,
}

impl MySqlContext {
    pub fn new(url: ConnectionUrl) -> Self {
        let database = url.database.clone().unwrap_or_default();
        Self {
            url,
            database,
            pool: OnceCell::new(),
        }
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.url.host)
            .port(self.url.port);
        if !self.database.is_empty() {
            options = options.database(&self.database);
        }
        if let Some(user) = &self.url.user {
            options = options.username(user);
        }
        if let Some(password) = &self.url.password {
            options = options.password(password);
        }
        options
    }

    fn pool(&self) -> Result<&MySqlPool> {
        self.pool
            .get()
            .ok_or_else(|| Error::Connection("mysql connection is not open".to_string()))
    }
}

#[async_trait]
impl ConnectionContext for MySqlContext {
    fn dialect(&self) -> Dialect {
        self.url.dialect
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    fn hostname(&self) -> &str {
        &self.url.host
    }

    async fn open_connection(&self) -> Result<()> {
        self.pool
            .get_or_try_init(|| async {
                MySqlPoolOptions::new()
                    .max_connections(2)
                    .connect_with(self.connect_options())
                    .await
            })
            .await
            .map_err(|err| Error::Connection(err.to_string()))?;
        Ok(())
    }

    async fn query_rows(&self, sql: &str) -> Result<Vec<CatalogRow>> {
        let rows = sqlx::query(sql)
            .fetch_all(self.pool()?)
            .await
            .map_err(|err| Error::Db(err.to_string()))?;
        rows.iter().map(convert_row).collect()
    }

    async fn execute_non_query(&self, sql: &str) -> Result<u64> {
        let done = sqlx::raw_sql(sql)
            .execute(self.pool()?)
            .await
            .map_err(|err| Error::Db(err.to_string()))?;
        Ok(done.rows_affected())
    }
}

fn convert_row(row: &MySqlRow) -> Result<CatalogRow> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for column in row.columns() {
        let idx = column.ordinal();
        columns.push(column.name().to_string());
        values.push(convert_value(row, idx, column.type_info().name())?);
    }
    Ok(CatalogRow::new(columns, values))
}

/// `information_schema` reports text through a mix of character and binary
/// types depending on server version, so anything not numeric falls back to
/// lossy UTF-8.
fn convert_value(row: &MySqlRow, idx: usize, type_name: &str) -> Result<Value> {
    let raw = row
        .try_get_raw(idx)
        .map_err(|err| Error::Db(err.to_string()))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOLEAN" => row.try_get::<bool, _>(idx).map(Value::from),
        name if name.ends_with("UNSIGNED") => row.try_get::<u64, _>(idx).map(Value::from),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(idx).map(Value::from)
        }
        "FLOAT" => row.try_get::<f32, _>(idx).map(Value::from),
        "DOUBLE" => row.try_get::<f64, _>(idx).map(Value::from),
        _ => row.try_get::<String, _>(idx).map(Value::from).or_else(|_| {
            row.try_get::<Vec<u8>, _>(idx)
                .map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned()))
        }),
    };
    value.map_err(|err| Error::Db(format!("column {idx} ({type_name}): {err}")))
}

/// Catalog queries for MySQL; the same reader serves MariaDB, whose
/// version-gated differences are resolved from the refined dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySqlCatalog {
    dialect: Dialect,
}

impl MySqlCatalog {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn mariadb() -> Self {
        Self::new(Dialect::MariaDb)
    }
}

impl Default for MySqlCatalog {
    fn default() -> Self {
        Self::new(Dialect::MySql)
    }
}

impl CatalogReader for MySqlCatalog {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn refine_dialect(&self, version_text: &str) -> Dialect {
        if version_text.to_ascii_lowercase().contains("mariadb") {
            Dialect::MariaDb
        } else {
            Dialect::MySql
        }
    }

    fn server_version_query(&self) -> &'static str {
        queries::SERVER_VERSION
    }

    fn database_list_query(&self) -> &'static str {
        queries::DATABASE_LIST
    }

    fn tables_query(&self, env: &CatalogEnv) -> String {
        queries::tables(env)
    }

    fn columns_query(&self, env: &CatalogEnv) -> String {
        queries::columns(env)
    }

    fn foreign_keys_query(&self, env: &CatalogEnv) -> String {
        queries::foreign_keys(env)
    }

    fn indexes_query(&self, env: &CatalogEnv) -> String {
        queries::indexes(env)
    }

    fn triggers_query(&self, env: &CatalogEnv) -> String {
        queries::triggers(env)
    }

    fn views_query(&self, env: &CatalogEnv) -> String {
        queries::views(env)
    }

    fn functions_query(&self, env: &CatalogEnv) -> String {
        queries::functions(env)
    }

    fn stored_procedures_query(&self, env: &CatalogEnv) -> Option<String> {
        Some(queries::stored_procedures(env))
    }

    fn users_query(&self, _env: &CatalogEnv) -> String {
        queries::USERS.to_string()
    }

    fn table_ext(&self, raw: &RawTable) -> TableExt {
        TableExt::MySql(MySqlTable {
            engine: raw.engine.clone(),
            charset: raw.charset_name.clone(),
            collation: raw.collation_name.clone(),
            comment: raw.comment_text.clone(),
            auto_increment: raw.auto_increment,
        })
    }

    fn column_ext(&self, raw: &RawColumn) -> ColumnExt {
        let extra = raw.extra.as_deref().unwrap_or_default().to_ascii_lowercase();
        let generation = raw
            .generation_expression
            .as_ref()
            .map(|expression| GeneratedColumn {
                expression: expression.clone(),
                stored: extra.contains("stored") || extra.contains("persistent"),
            });
        let on_update = extra
            .find("on update ")
            .map(|start| raw.extra.as_deref().unwrap_or_default()[start + 10..].trim().to_string())
            .filter(|value| !value.is_empty());

        ColumnExt::MySql(MySqlColumn {
            column_type: raw
                .column_type
                .clone()
                .unwrap_or_else(|| raw.data_type.clone()),
            auto_increment: extra.contains("auto_increment"),
            charset: raw.charset_name.clone(),
            collation: raw.collation_name.clone(),
            generation,
            on_update,
            comment: raw.comment_text.clone(),
        })
    }

    fn index_ext(&self, first: &RawIndexColumn, members: &[RawIndexColumn]) -> IndexExt {
        IndexExt::MySql(MySqlIndex {
            index_type: first
                .index_type
                .clone()
                .unwrap_or_else(|| "BTREE".to_string()),
            sub_parts: members
                .iter()
                .filter(|member| !member.is_included)
                .map(|member| member.sub_part)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use sqlmorph_core::ServerVersion;

    use super::*;

    #[test]
    fn refines_mariadb_from_version_text() {
        let catalog = MySqlCatalog::default();
        assert_eq!(
            catalog.refine_dialect("10.11.6-MariaDB-1:10.11.6+maria~ubu2204"),
            Dialect::MariaDb
        );
        assert_eq!(catalog.refine_dialect("8.0.34"), Dialect::MySql);
    }

    #[test]
    fn gates_defaults_and_expressions_by_flavour() {
        let catalog = MySqlCatalog::default();
        let mariadb = CatalogEnv::new(Dialect::MariaDb, ServerVersion::new(10, 11, 6), "shop");
        let mysql = CatalogEnv::new(Dialect::MySql, ServerVersion::new(8, 0, 34), "shop");
        let old_mysql = CatalogEnv::new(Dialect::MySql, ServerVersion::new(5, 6, 0), "shop");

        assert!(catalog.columns_query(&mariadb).contains("NULLIF(c.COLUMN_DEFAULT, 'NULL')"));
        assert!(catalog.columns_query(&mysql).contains("DEFAULT\\_GENERATED"));
        assert!(!catalog.columns_query(&old_mysql).contains("GENERATION_EXPRESSION"));
        assert!(catalog.indexes_query(&mysql).contains("s.EXPRESSION"));
        assert!(!catalog.indexes_query(&mariadb).contains("s.EXPRESSION"));
        assert!(catalog.tables_query(&mariadb).contains("FULL_COLLATION_NAME"));
        assert!(catalog.tables_query(&mysql).contains("'shop'"));
    }

    #[test]
    fn reads_extra_flags() {
        let raw = RawColumn {
            data_type: "timestamp".into(),
            column_type: Some("timestamp".into()),
            extra: Some("DEFAULT_GENERATED on update CURRENT_TIMESTAMP".into()),
            ..RawColumn::default()
        };
        let ColumnExt::MySql(ext) = MySqlCatalog::default().column_ext(&raw) else {
            panic!("expected mysql facets");
        };
        assert_eq!(ext.on_update.as_deref(), Some("CURRENT_TIMESTAMP"));
        assert!(!ext.auto_increment);

        let raw = RawColumn {
            data_type: "int".into(),
            generation_expression: Some("(`a` + 1)".into()),
            extra: Some("STORED GENERATED".into()),
            ..RawColumn::default()
        };
        let ColumnExt::MySql(ext) = MySqlCatalog::default().column_ext(&raw) else {
            panic!("expected mysql facets");
        };
        assert!(ext.generation.is_some_and(|generated| generated.stored));
        assert_eq!(ext.column_type, "int");
    }
}
