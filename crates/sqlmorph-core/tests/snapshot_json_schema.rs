use jsonschema::JSONSchema;
use schemars::schema_for;
use sqlmorph_core::{
    Column, ColumnExt, Database, DataType, DataTypeKind, Dialect, Index, IndexExt, PostgresColumn,
    PostgresIndex, PrimaryKey, ServerVersion, Table,
};

fn snapshot() -> Database {
    let mut db = Database::new("shop", Dialect::Postgres);
    db.server_version = ServerVersion::new(16, 2, 0);

    let mut orders = Table::new("public", "orders");
    orders.columns.push(Column {
        table_schema: "public".into(),
        table_name: "orders".into(),
        name: "id".into(),
        ordinal_position: 1,
        data_type: "int8".into(),
        ext: ColumnExt::Postgres(PostgresColumn {
            formatted_type: "bigint".into(),
            ..PostgresColumn::default()
        }),
        ..Column::default()
    });
    orders.primary_keys.push(0);
    orders.indexes.push(0);
    db.tables.push(orders);

    db.primary_keys.push(PrimaryKey {
        table_schema: "public".into(),
        table_name: "orders".into(),
        name: "orders_pkey".into(),
        column_names: vec!["id".into()],
        ..PrimaryKey::default()
    });
    db.indexes.push(Index {
        table_schema: "public".into(),
        table_name: "orders".into(),
        name: "orders_created_idx".into(),
        column_names: vec!["created_at".into()],
        column_descending: vec![true],
        ext: IndexExt::Postgres(PostgresIndex {
            method: "btree".into(),
            ..PostgresIndex::default()
        }),
        ..Index::default()
    });
    db.data_types.push(DataType {
        schema: "public".into(),
        name: "mood".into(),
        is_user_defined: true,
        kind: DataTypeKind::Enumerated {
            labels: vec!["sad".into(), "ok".into(), "happy".into()],
        },
        ..DataType::default()
    });
    db
}

#[test]
fn snapshot_validates_against_generated_schema() {
    let schema = serde_json::to_value(schema_for!(Database)).expect("serialize schema");
    let compiled = JSONSchema::compile(&schema).expect("compile schema");

    let instance = serde_json::to_value(snapshot()).expect("serialize snapshot");
    let result = compiled.validate(&instance);
    if let Err(errors) = result {
        let messages: Vec<String> = errors.map(|err| err.to_string()).collect();
        panic!("snapshot failed validation: {messages:?}");
    }
}

#[test]
fn snapshot_round_trips_without_mapping_state() {
    let mut db = snapshot();
    db.tables[0].mapped = Some(3);

    let json = serde_json::to_string(&db).expect("serialize snapshot");
    assert!(!json.contains("mapped"));
    assert!(!json.contains("direction"));

    let back: Database = serde_json::from_str(&json).expect("parse snapshot");
    assert_eq!(back.tables[0].mapped, None);
    assert_eq!(back.tables[0].columns.len(), 1);
    assert_eq!(back.indexes, db.indexes);
    assert_eq!(back.server_version, db.server_version);
}
