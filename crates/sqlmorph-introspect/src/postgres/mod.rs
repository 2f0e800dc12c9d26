//! PostgreSQL connectivity and catalog knowledge.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tokio::sync::OnceCell;

use sqlmorph_core::{
    ColumnExt, ConnectionUrl, DataTypeKind, Dialect, Error, IdentityGeneration, IdentitySpec,
    IndexExt, PostgresColumn, PostgresIndex, PostgresRoutine, PostgresTable, Result, RoutineExt,
    TableExt,
};

use crate::catalog::{CatalogEnv, CatalogReader};
use crate::context::{CatalogRow, ConnectionContext};
use crate::raw::{RawColumn, RawDataType, RawIndexColumn, RawRoutine, RawTable};

mod queries;

/// Connection context backed by a small sqlx pool, opened lazily.
#[derive(Debug)]
pub struct PgContext {
    url: ConnectionUrl,
    database: String,
    pool: OnceCell<PgPool>,
}

impl PgContext {
    pub fn new(url: ConnectionUrl) -> Self {
        let database = url.database.clone().unwrap_or_else(|| "postgres".to_string());
        Self {
            url,
            database,
            pool: OnceCell::new(),
        }
    }

    /// Wrap an already configured pool.
    pub fn from_pool(pool: PgPool, url: ConnectionUrl) -> Self {
        let context = Self::new(url);
        let _ = context.pool.set(pool);
        context
    }

    fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.url.host)
            .port(self.url.port)
            .database(&self.database)
            .application_name("sqlmorph");
        if let Some(user) = &self.url.user {
            options = options.username(user);
        }
        if let Some(password) = &self.url.password {
            options = options.password(password);
        }
        options
    }

    fn pool(&self) -> Result<&PgPool> {
        self.pool
            .get()
            .ok_or_else(|| Error::Connection("postgres connection is not open".to_string()))
    }
}

#[async_trait]
impl ConnectionContext for PgContext {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
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
                PgPoolOptions::new()
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

fn convert_row(row: &PgRow) -> Result<CatalogRow> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for column in row.columns() {
        let idx = column.ordinal();
        columns.push(column.name().to_string());
        values.push(convert_value(row, idx, column.type_info().name())?);
    }
    Ok(CatalogRow::new(columns, values))
}

fn convert_value(row: &PgRow, idx: usize, type_name: &str) -> Result<Value> {
    let raw = row
        .try_get_raw(idx)
        .map_err(|err| Error::Db(err.to_string()))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOL" => row.try_get::<bool, _>(idx).map(Value::from),
        "INT2" => row.try_get::<i16, _>(idx).map(Value::from),
        "INT4" => row.try_get::<i32, _>(idx).map(Value::from),
        "INT8" => row.try_get::<i64, _>(idx).map(Value::from),
        "FLOAT4" => row.try_get::<f32, _>(idx).map(Value::from),
        "FLOAT8" => row.try_get::<f64, _>(idx).map(Value::from),
        "INT2[]" | "INT4[]" | "INT8[]" => row
            .try_get::<Vec<i64>, _>(idx)
            .or_else(|_| {
                row.try_get::<Vec<i32>, _>(idx)
                    .map(|items| items.into_iter().map(i64::from).collect())
            })
            .map(Value::from),
        "BOOL[]" => row.try_get::<Vec<bool>, _>(idx).map(Value::from),
        name if name.ends_with("[]") => row
            .try_get::<Vec<Option<String>>, _>(idx)
            .map(|items| {
                let items: Vec<String> = items.into_iter().map(Option::unwrap_or_default).collect();
                Value::from(items)
            }),
        _ => row.try_get::<String, _>(idx).map(Value::from),
    };
    value.map_err(|err| Error::Db(format!("column {idx} ({type_name}): {err}")))
}

/// Catalog queries against `pg_catalog`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresCatalog;

impl CatalogReader for PostgresCatalog {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
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
        TableExt::Postgres(PostgresTable {
            inherits: raw
                .inherit_schemas
                .iter()
                .cloned()
                .zip(raw.inherit_names.iter().cloned())
                .collect(),
            tablespace: raw.tablespace.clone(),
            is_unlogged: raw.is_unlogged,
            partition_key: raw.partition_key.clone(),
        })
    }

    fn column_ext(&self, raw: &RawColumn) -> ColumnExt {
        let identity = match raw.identity_generation.as_deref() {
            Some("a") => Some(IdentityGeneration::Always),
            Some("d") => Some(IdentityGeneration::ByDefault),
            _ => None,
        };
        let identity_spec = identity.map(|_| IdentitySpec {
            seed: raw.identity_seed.unwrap_or(1),
            increment: raw.identity_increment.unwrap_or(1),
        });
        ColumnExt::Postgres(PostgresColumn {
            formatted_type: raw
                .formatted_type
                .clone()
                .unwrap_or_else(|| raw.data_type.clone()),
            identity,
            identity_spec,
            generated: raw.generation_expression.clone(),
            collation: raw.collation_name.clone(),
            udt_schema: raw.is_user_defined.then(|| raw.type_schema.clone()).flatten(),
        })
    }

    fn index_ext(&self, first: &RawIndexColumn, members: &[RawIndexColumn]) -> IndexExt {
        let has_expression = members.iter().any(|member| member.column_name.is_none());
        IndexExt::Postgres(PostgresIndex {
            method: first
                .index_method
                .clone()
                .unwrap_or_else(|| "btree".to_string()),
            predicate: first.predicate.clone(),
            definition: has_expression
                .then(|| first.index_definition.clone())
                .flatten(),
            included_columns: members
                .iter()
                .filter(|member| member.is_included)
                .filter_map(|member| member.column_name.clone())
                .collect(),
        })
    }

    fn routine_ext(&self, raw: &RawRoutine) -> RoutineExt {
        RoutineExt::Postgres(PostgresRoutine {
            argument_names: raw.argument_names.clone(),
            argument_modes: raw.argument_modes.clone(),
            argument_types: raw.argument_types.clone(),
            return_type: raw.return_type.clone(),
            language: raw.routine_language.clone(),
            is_aggregate: raw.is_aggregate,
        })
    }

    fn data_type_kind(&self, raw: &RawDataType) -> DataTypeKind {
        match raw.category.as_str() {
            "enum" => DataTypeKind::Enumerated {
                labels: raw.labels.clone(),
            },
            "composite" => DataTypeKind::Composite {
                attribute_names: raw.attribute_names.clone(),
                attribute_type_ids: raw.attribute_type_ids.clone(),
                attribute_types: raw.attribute_types.clone(),
            },
            "range" => DataTypeKind::Range {
                sub_type_id: raw.sub_type_id.unwrap_or_default(),
                sub_type: raw.sub_type.clone(),
                canonical: raw.canonical.clone(),
                sub_type_diff: raw.sub_type_diff.clone(),
            },
            "domain" => DataTypeKind::Domain {
                base_type_id: raw.base_type_id.unwrap_or_default(),
                base_type: raw.base_type.clone(),
                constraint: raw.constraint_def.clone(),
                not_null: raw.not_null,
                default: raw.default_value.clone(),
            },
            _ => DataTypeKind::Base,
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlmorph_core::ServerVersion;

    use super::*;

    fn env(major: u32) -> CatalogEnv {
        CatalogEnv::new(Dialect::Postgres, ServerVersion::new(major, 0, 0), "shop")
    }

    #[test]
    fn gates_catalog_columns_by_version() {
        let catalog = PostgresCatalog;

        let old = catalog.columns_query(&env(9));
        assert!(!old.contains("attidentity"));
        assert!(!old.contains("attgenerated"));

        let current = catalog.columns_query(&env(16));
        assert!(current.contains("attidentity"));
        assert!(current.contains("attgenerated"));

        assert!(catalog.functions_query(&env(10)).contains("proisagg"));
        assert!(catalog.functions_query(&env(11)).contains("prokind"));
        assert!(
            catalog
                .sequences_query(&env(9))
                .is_some_and(|sql| sql.contains("information_schema.sequences"))
        );
    }

    #[test]
    fn maps_identity_and_generated_columns() {
        let catalog = PostgresCatalog;
        let raw = RawColumn {
            data_type: "int8".into(),
            formatted_type: Some("bigint".into()),
            identity_generation: Some("a".into()),
            identity_seed: Some(100),
            ..RawColumn::default()
        };
        let ColumnExt::Postgres(ext) = catalog.column_ext(&raw) else {
            panic!("expected postgres facets");
        };
        assert_eq!(ext.identity, Some(IdentityGeneration::Always));
        assert_eq!(
            ext.identity_spec,
            Some(IdentitySpec {
                seed: 100,
                increment: 1
            })
        );
        assert_eq!(ext.formatted_type, "bigint");
    }

    #[test]
    fn keeps_definition_only_for_expression_indexes() {
        let catalog = PostgresCatalog;
        let plain = RawIndexColumn {
            column_name: Some("email".into()),
            index_definition: Some("CREATE INDEX ...".into()),
            ..RawIndexColumn::default()
        };
        let IndexExt::Postgres(ext) = catalog.index_ext(&plain, std::slice::from_ref(&plain)) else {
            panic!("expected postgres facets");
        };
        assert_eq!(ext.method, "btree");
        assert!(ext.definition.is_none());

        let expression = RawIndexColumn {
            column_name: None,
            ..plain.clone()
        };
        let IndexExt::Postgres(ext) = catalog.index_ext(&plain, &[plain.clone(), expression])
        else {
            panic!("expected postgres facets");
        };
        assert!(ext.definition.is_some());
    }

    #[test]
    fn maps_domain_types() {
        let raw = RawDataType {
            category: "domain".into(),
            base_type_id: Some(25),
            base_type: Some("text".into()),
            constraint_def: Some("CHECK ((VALUE ~~ '%@%'::text))".into()),
            not_null: true,
            ..RawDataType::default()
        };
        let kind = PostgresCatalog.data_type_kind(&raw);
        assert!(matches!(
            kind,
            DataTypeKind::Domain { base_type_id: 25, not_null: true, .. }
        ));
    }
}
