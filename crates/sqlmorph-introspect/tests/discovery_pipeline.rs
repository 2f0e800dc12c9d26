use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use sqlmorph_core::{
    ColumnExt, Dialect, Error, FkAction, IndexExt, Phase, Result, ServerVersion, TableExt,
    validate_database,
};
use sqlmorph_introspect::raw::{RawColumn, RawIndexColumn, RawTable};
use sqlmorph_introspect::{
    CatalogEnv, CatalogReader, CatalogRow, ConnectionContext, IntrospectOptions, TaskInfo,
    discover_database,
};

/// Catalog reader whose queries are plain markers the fake context answers.
struct FakeCatalog;

impl CatalogReader for FakeCatalog {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn server_version_query(&self) -> &'static str {
        "version"
    }

    fn database_list_query(&self) -> &'static str {
        "databases"
    }

    fn tables_query(&self, _env: &CatalogEnv) -> String {
        "tables".into()
    }

    fn columns_query(&self, _env: &CatalogEnv) -> String {
        "columns".into()
    }

    fn foreign_keys_query(&self, _env: &CatalogEnv) -> String {
        "foreign_keys".into()
    }

    fn indexes_query(&self, _env: &CatalogEnv) -> String {
        "indexes".into()
    }

    fn constraints_query(&self, _env: &CatalogEnv) -> Option<String> {
        Some("constraints".into())
    }

    fn triggers_query(&self, _env: &CatalogEnv) -> String {
        "triggers".into()
    }

    fn views_query(&self, _env: &CatalogEnv) -> String {
        "views".into()
    }

    fn functions_query(&self, _env: &CatalogEnv) -> String {
        "functions".into()
    }

    fn sequences_query(&self, env: &CatalogEnv) -> Option<String> {
        Some(format!("sequences {}", env.version.major))
    }

    fn schemas_query(&self, _env: &CatalogEnv) -> Option<String> {
        Some("schemas".into())
    }

    fn users_query(&self, _env: &CatalogEnv) -> String {
        "users".into()
    }

    fn table_ext(&self, _raw: &RawTable) -> TableExt {
        TableExt::None
    }

    fn column_ext(&self, _raw: &RawColumn) -> ColumnExt {
        ColumnExt::None
    }

    fn index_ext(&self, _first: &RawIndexColumn, _members: &[RawIndexColumn]) -> IndexExt {
        IndexExt::None
    }
}

#[derive(Default)]
struct FakeContext {
    responses: HashMap<String, Vec<CatalogRow>>,
    failing: HashSet<String>,
    refuse_connection: bool,
    queries: AtomicUsize,
}

impl FakeContext {
    fn respond(mut self, sql: &str, rows: Vec<CatalogRow>) -> Self {
        self.responses.insert(sql.to_string(), rows);
        self
    }

    fn fail(mut self, sql: &str) -> Self {
        self.failing.insert(sql.to_string());
        self
    }
}

#[async_trait]
impl ConnectionContext for FakeContext {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn database_name(&self) -> &str {
        "shop"
    }

    fn hostname(&self) -> &str {
        "fake"
    }

    async fn open_connection(&self) -> Result<()> {
        if self.refuse_connection {
            return Err(Error::Db("connection refused".into()));
        }
        Ok(())
    }

    async fn query_rows(&self, sql: &str) -> Result<Vec<CatalogRow>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(sql) {
            return Err(Error::Db(format!("relation for {sql} does not exist")));
        }
        Ok(self.responses.get(sql).cloned().unwrap_or_default())
    }

    async fn execute_non_query(&self, _sql: &str) -> Result<u64> {
        Ok(0)
    }
}

fn row(pairs: &[(&str, Value)]) -> CatalogRow {
    CatalogRow::new(
        pairs.iter().map(|(name, _)| name.to_string()).collect(),
        pairs.iter().map(|(_, value)| value.clone()).collect(),
    )
}

fn table_row(name: &str) -> CatalogRow {
    row(&[("schema_name", json!("app")), ("table_name", json!(name))])
}

fn column_row(table: &str, name: &str, ordinal: i32) -> CatalogRow {
    row(&[
        ("schema_name", json!("app")),
        ("table_name", json!(table)),
        ("column_name", json!(name)),
        ("ordinal_position", json!(ordinal)),
        ("data_type", json!("int4")),
        ("is_nullable", json!(false)),
    ])
}

fn fk_row(column: &str, ordinal: i32, referenced: &str) -> CatalogRow {
    row(&[
        ("schema_name", json!("app")),
        ("table_name", json!("order_lines")),
        ("constraint_name", json!("fk_lines_orders")),
        ("column_name", json!(column)),
        ("ordinal", json!(ordinal)),
        ("referenced_schema", json!("app")),
        ("referenced_table", json!("orders")),
        ("referenced_column", json!(referenced)),
        ("update_rule", json!("a")),
        ("delete_rule", json!("c")),
    ])
}

fn index_row(table: &str, index: &str, column: &str, ordinal: i32, primary: bool) -> CatalogRow {
    row(&[
        ("schema_name", json!("app")),
        ("table_name", json!(table)),
        ("index_name", json!(index)),
        ("column_name", json!(column)),
        ("ordinal", json!(ordinal)),
        ("is_descending", json!(false)),
        ("is_unique", json!(primary)),
        ("is_primary_key", json!(primary)),
    ])
}

fn shop_context() -> FakeContext {
    FakeContext::default()
        .respond("version", vec![row(&[("version", json!("15.3 (Debian 15.3-1)"))])])
        .respond("tables", vec![table_row("orders"), table_row("order_lines")])
        .respond(
            "columns",
            vec![
                column_row("order_lines", "line_no", 4),
                column_row("orders", "tenant_id", 1),
                column_row("orders", "region_id", 2),
                column_row("orders", "order_id", 3),
                column_row("order_lines", "tenant_id", 1),
                column_row("order_lines", "region_id", 2),
                column_row("order_lines", "order_id", 3),
            ],
        )
        .respond(
            "foreign_keys",
            vec![
                fk_row("order_id", 3, "order_id"),
                fk_row("tenant_id", 1, "tenant_id"),
                fk_row("region_id", 2, "region_id"),
            ],
        )
        .respond(
            "indexes",
            vec![
                index_row("orders", "orders_pkey", "region_id", 2, true),
                index_row("orders", "orders_pkey", "tenant_id", 1, true),
                index_row("orders", "orders_pkey", "order_id", 3, true),
                index_row("order_lines", "ix_lines_order", "order_id", 1, false),
            ],
        )
        .respond(
            "triggers",
            vec![row(&[
                ("schema_name", json!("app")),
                ("trigger_name", json!("trg_lines_audit")),
                ("table_schema", json!("app")),
                ("table_name", json!("order_lines")),
                ("definition", json!("\r\n\nCREATE TRIGGER trg_lines_audit ...  \n")),
            ])],
        )
        .respond(
            "schemas",
            vec![
                row(&[("schema_name", json!("app"))]),
                row(&[("schema_name", json!("pg_toast"))]),
            ],
        )
}

#[tokio::test]
async fn groups_composite_keys_by_ordinal() {
    let ctx = shop_context();
    let task = TaskInfo::new("discover shop");

    let discovery = discover_database(&ctx, &FakeCatalog, &IntrospectOptions::default(), &task)
        .await
        .unwrap();
    assert!(discovery.is_complete(), "{:?}", discovery.errors);
    let database = discovery.database;

    assert_eq!(database.server_version, ServerVersion::new(15, 3, 0));
    assert_eq!(database.foreign_keys.len(), 1);
    let fk = &database.foreign_keys[0];
    assert_eq!(fk.column_names, vec!["tenant_id", "region_id", "order_id"]);
    assert_eq!(
        fk.referenced_column_names,
        vec!["tenant_id", "region_id", "order_id"]
    );
    assert_eq!(fk.on_update, FkAction::NoAction);
    assert_eq!(fk.on_delete, FkAction::Cascade);

    let orders = database.find_table("app", "orders").unwrap();
    let columns: Vec<&str> = orders.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["tenant_id", "region_id", "order_id"]);
    assert_eq!(orders.referencing_foreign_keys, vec![0]);

    let lines = database.find_table("app", "order_lines").unwrap();
    assert_eq!(lines.columns.last().map(|c| c.name.as_str()), Some("line_no"));
    assert_eq!(lines.foreign_keys, vec![0]);
    assert_eq!(
        database.triggers[0].definition,
        "CREATE TRIGGER trg_lines_audit ..."
    );

    validate_database(&database).unwrap();
    assert_eq!(task.progress().percent, 100);
}

#[tokio::test]
async fn splits_primary_keys_out_of_indexes() {
    let ctx = shop_context();
    let task = TaskInfo::new("discover shop");

    let database = discover_database(&ctx, &FakeCatalog, &IntrospectOptions::default(), &task)
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(database.primary_keys.len(), 1);
    let pk = &database.primary_keys[0];
    assert_eq!(pk.name, "orders_pkey");
    assert_eq!(pk.column_names, vec!["tenant_id", "region_id", "order_id"]);

    assert!(database.indexes.iter().all(|index| !index.is_primary_key));
    assert!(database.indexes.iter().all(|index| index.name != pk.name));
    let orders = database.find_table("app", "orders").unwrap();
    assert_eq!(
        database.primary_key_of(orders).map(|pk| pk.name.as_str()),
        Some("orders_pkey")
    );
    assert!(orders.indexes.is_empty());
}

#[tokio::test]
async fn aggregates_failed_phases_and_keeps_going() {
    let ctx = shop_context().fail("foreign_keys").fail("views");
    let task = TaskInfo::new("discover shop");

    let discovery = discover_database(&ctx, &FakeCatalog, &IntrospectOptions::default(), &task)
        .await
        .unwrap();

    let phases: Vec<Phase> = discovery.errors.iter().map(|err| err.phase).collect();
    assert_eq!(phases, vec![Phase::ForeignKeys, Phase::Views]);
    assert_eq!(discovery.database.tables.len(), 2);
    assert!(discovery.database.foreign_keys.is_empty());
    assert_eq!(discovery.database.primary_keys.len(), 1);

    let err = discovery.into_result().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("2 failed phase(s)"), "{message}");
    assert!(message.contains("views"), "{message}");
}

#[tokio::test]
async fn falls_back_to_latest_version_when_probe_fails() {
    let ctx = shop_context().fail("version");
    let task = TaskInfo::new("discover shop");

    let discovery = discover_database(&ctx, &FakeCatalog, &IntrospectOptions::default(), &task)
        .await
        .unwrap();

    assert!(discovery.is_complete());
    assert!(discovery.database.server_version.is_max());
    assert_eq!(discovery.database.tables.len(), 2);
}

#[tokio::test]
async fn filters_system_schemas_after_discovery() {
    let ctx = shop_context();
    let task = TaskInfo::new("discover shop");

    let database = discover_database(&ctx, &FakeCatalog, &IntrospectOptions::default(), &task)
        .await
        .unwrap()
        .database;
    let names: Vec<&str> = database.schemas.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["app"]);

    let options = IntrospectOptions {
        schemas: Some(vec!["reporting".into()]),
        ..IntrospectOptions::default()
    };
    let database = discover_database(&ctx, &FakeCatalog, &options, &task)
        .await
        .unwrap()
        .database;
    assert!(database.tables.is_empty());
    assert!(database.foreign_keys.is_empty());
}

#[tokio::test]
async fn cancellation_stops_before_the_next_phase() {
    let ctx = shop_context();
    let task = TaskInfo::new("discover shop");
    task.cancel();

    let err = discover_database(&ctx, &FakeCatalog, &IntrospectOptions::default(), &task)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(ctx.queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn connection_failure_is_fatal() {
    let ctx = FakeContext {
        refuse_connection: true,
        ..shop_context()
    };
    let task = TaskInfo::new("discover shop");

    let err = discover_database(&ctx, &FakeCatalog, &IntrospectOptions::default(), &task)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connection(message) if message.contains("refused")));
}
