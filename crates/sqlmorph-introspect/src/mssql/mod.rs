//! SQL Server connectivity (tiberius) and catalog knowledge.

use async_trait::async_trait;
use serde_json::Value;
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, Row};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use sqlmorph_core::{
    ColumnExt, ConnectionUrl, DataTypeKind, Dialect, Error, IdentitySpec, IndexExt, Result,
    SqlServerColumn, SqlServerIndex, SqlServerTable, TableExt,
};

use crate::catalog::{CatalogEnv, CatalogReader};
use crate::context::{CatalogRow, ConnectionContext};
use crate::raw::{RawColumn, RawDataType, RawIndexColumn, RawTable};

mod queries;

type MssqlClient = Client<Compat<TcpStream>>;

/// Connection context holding a single tiberius client.
///
/// Catalog reads are sequential, so one client behind a mutex is enough.
pub struct MssqlContext {
    url: ConnectionUrl,
    database: String,
    client: Mutex<Option<MssqlClient>>,
}

impl std::fmt::Debug for MssqlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlContext")
            .field("host", &self.url.host)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl MssqlContext {
    pub fn new(url: ConnectionUrl) -> Self {
        let database = url.database.clone().unwrap_or_else(|| "master".to_string());
        Self {
            url,
            database,
            client: Mutex::new(None),
        }
    }

    fn build_config(&self) -> Result<Config> {
        let mut config = Config::new();
        config.host(&self.url.host);
        config.port(self.url.port);
        config.database(&self.database);
        config.application_name("sqlmorph");

        let Some(user) = &self.url.user else {
            return Err(Error::Connection(
                "SQL Server connections need a user name".to_string(),
            ));
        };
        config.authentication(AuthMethod::sql_server(
            user,
            self.url.password.as_deref().unwrap_or_default(),
        ));

        let encrypt = self.url.param("encrypt").unwrap_or("true");
        match encrypt.to_ascii_lowercase().as_str() {
            "false" | "no" | "0" | "disable" => {
                config.encryption(EncryptionLevel::NotSupported);
            }
            _ => {
                let trust = self.url.param("trustServerCertificate").is_some_and(|value| {
                    matches!(value.to_ascii_lowercase().as_str(), "true" | "yes" | "1")
                });
                if trust {
                    config.trust_cert();
                }
                config.encryption(EncryptionLevel::Required);
            }
        }
        Ok(config)
    }

    async fn connect(&self) -> Result<MssqlClient> {
        let config = self.build_config()?;
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|err| Error::Connection(err.to_string()))?;
        tcp.set_nodelay(true).ok();
        Client::connect(config, tcp.compat_write())
            .await
            .map_err(|err| Error::Connection(err.to_string()))
    }
}

#[async_trait]
impl ConnectionContext for MssqlContext {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    fn hostname(&self) -> &str {
        &self.url.host
    }

    async fn open_connection(&self) -> Result<()> {
        let mut guard = self.client.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }
        Ok(())
    }

    async fn query_rows(&self, sql: &str) -> Result<Vec<CatalogRow>> {
        let mut guard = self.client.lock().await;
        let client = guard
            .as_mut()
            .ok_or_else(|| Error::Connection("SQL Server connection is not open".to_string()))?;
        let rows = client
            .simple_query(sql)
            .await
            .map_err(|err| Error::Db(err.to_string()))?
            .into_first_result()
            .await
            .map_err(|err| Error::Db(err.to_string()))?;
        Ok(rows.into_iter().map(convert_row).collect())
    }

    async fn execute_non_query(&self, sql: &str) -> Result<u64> {
        let mut guard = self.client.lock().await;
        let client = guard
            .as_mut()
            .ok_or_else(|| Error::Connection("SQL Server connection is not open".to_string()))?;
        let result = client
            .execute(sql, &[])
            .await
            .map_err(|err| Error::Db(err.to_string()))?;
        Ok(result.total())
    }
}

fn convert_row(row: Row) -> CatalogRow {
    let columns: Vec<String> = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    let values = row.into_iter().map(convert_value).collect();
    CatalogRow::new(columns, values)
}

fn convert_value(data: ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(Some(value)) => Value::from(value),
        ColumnData::I16(Some(value)) => Value::from(value),
        ColumnData::I32(Some(value)) => Value::from(value),
        ColumnData::I64(Some(value)) => Value::from(value),
        ColumnData::F32(Some(value)) => Value::from(value),
        ColumnData::F64(Some(value)) => Value::from(value),
        ColumnData::Bit(Some(value)) => Value::from(value),
        ColumnData::String(Some(value)) => Value::from(value.into_owned()),
        ColumnData::Guid(Some(value)) => Value::from(value.to_string()),
        ColumnData::Binary(Some(value)) => Value::from(String::from_utf8_lossy(&value).into_owned()),
        ColumnData::Numeric(Some(value)) => {
            Value::from(value.value() as f64 / 10f64.powi(i32::from(value.scale())))
        }
        _ => Value::Null,
    }
}

/// Catalog queries against the `sys` views.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerCatalog;

impl CatalogReader for SqlServerCatalog {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
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

    fn constraints_query(&self, env: &CatalogEnv) -> Option<String> {
        Some(queries::constraints(env))
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

    fn data_types_query(&self, env: &CatalogEnv) -> Option<String> {
        Some(queries::data_types(env))
    }

    fn sequences_query(&self, env: &CatalogEnv) -> Option<String> {
        Some(queries::sequences(env))
    }

    fn schemas_query(&self, env: &CatalogEnv) -> Option<String> {
        Some(queries::schemas(env))
    }

    fn users_query(&self, _env: &CatalogEnv) -> String {
        queries::USERS.to_string()
    }

    fn table_ext(&self, raw: &RawTable) -> TableExt {
        TableExt::SqlServer(SqlServerTable {
            history_table_schema: raw.history_schema.clone(),
            history_table_name: raw.history_table.clone(),
            period_start_column: raw.period_start.clone(),
            period_end_column: raw.period_end.clone(),
            is_history_table: raw.is_history,
        })
    }

    fn column_ext(&self, raw: &RawColumn) -> ColumnExt {
        ColumnExt::SqlServer(SqlServerColumn {
            identity: raw.is_identity.then(|| IdentitySpec {
                seed: raw.identity_seed.unwrap_or(1),
                increment: raw.identity_increment.unwrap_or(1),
            }),
            computed: raw.computed.clone(),
            is_persisted: raw.is_persisted,
            collation: raw.collation_name.clone(),
            is_rowguidcol: raw.is_rowguidcol,
            generated_always: raw.generated_always.clone(),
            is_hidden: raw.is_hidden,
            type_schema: raw.is_user_defined.then(|| raw.type_schema.clone()).flatten(),
        })
    }

    fn index_ext(&self, first: &RawIndexColumn, members: &[RawIndexColumn]) -> IndexExt {
        IndexExt::SqlServer(SqlServerIndex {
            is_clustered: first.is_clustered,
            is_columnstore: first.is_columnstore,
            included_columns: members
                .iter()
                .filter(|member| member.is_included)
                .filter_map(|member| member.column_name.clone())
                .collect(),
            filter: first.filter_definition.clone(),
        })
    }

    fn data_type_kind(&self, raw: &RawDataType) -> DataTypeKind {
        match raw.category.as_str() {
            "alias" => DataTypeKind::Alias {
                max_length: raw.max_length,
                precision: raw.numeric_precision.and_then(|value| i32::try_from(value).ok()),
                scale: raw.numeric_scale.and_then(|value| i32::try_from(value).ok()),
                is_nullable: raw.is_nullable,
            },
            "table" => DataTypeKind::TableType {
                definition: raw.definition.clone().unwrap_or_default(),
            },
            _ => DataTypeKind::Base,
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlmorph_core::ServerVersion;

    use super::*;

    #[test]
    fn gates_temporal_and_aggregation_by_version() {
        let catalog = SqlServerCatalog;
        let v2012 = CatalogEnv::new(Dialect::SqlServer, ServerVersion::new(11, 0, 0), "shop");
        let v2019 = CatalogEnv::new(Dialect::SqlServer, ServerVersion::new(15, 0, 0), "shop");

        assert!(!catalog.tables_query(&v2012).contains("history_table_id"));
        assert!(catalog.tables_query(&v2019).contains("history_table_id"));
        assert!(!catalog.columns_query(&v2012).contains("generated_always_type"));

        let legacy = catalog.data_types_query(&v2012).unwrap_or_default();
        assert!(legacy.contains("FOR XML PATH"));
        let current = catalog.data_types_query(&v2019).unwrap_or_default();
        assert!(current.contains("STRING_AGG"));
    }

    #[test]
    fn maps_alias_and_table_types() {
        let alias = RawDataType {
            category: "alias".into(),
            max_length: Some(20),
            is_nullable: true,
            ..RawDataType::default()
        };
        assert_eq!(
            SqlServerCatalog.data_type_kind(&alias),
            DataTypeKind::Alias {
                max_length: Some(20),
                precision: None,
                scale: None,
                is_nullable: true
            }
        );

        let table = RawDataType {
            category: "table".into(),
            definition: Some("[id] int NOT NULL".into()),
            ..RawDataType::default()
        };
        assert!(matches!(
            SqlServerCatalog.data_type_kind(&table),
            DataTypeKind::TableType { definition } if definition == "[id] int NOT NULL"
        ));
    }

    #[test]
    fn maps_identity_columns() {
        let raw = RawColumn {
            is_identity: true,
            identity_seed: Some(10),
            identity_increment: Some(5),
            ..RawColumn::default()
        };
        let ColumnExt::SqlServer(ext) = SqlServerCatalog.column_ext(&raw) else {
            panic!("expected sql server facets");
        };
        assert_eq!(
            ext.identity,
            Some(IdentitySpec {
                seed: 10,
                increment: 5
            })
        );
    }

    #[test]
    fn rejects_connections_without_user() {
        let url = ConnectionUrl::parse("mssql://db.internal:1433/shop").unwrap();
        let context = MssqlContext::new(url);
        assert!(matches!(context.build_config(), Err(Error::Connection(_))));
    }
}
