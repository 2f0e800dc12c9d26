use anyhow::Result;

use sqlmorph_core::{
    Column, ColumnExt, DataType, DataTypeKind, Database, Dialect, Error, Index, IndexExt,
    NameMatching, ObjectKind, PostgresColumn, PrimaryKey, SchemaInfo, Sequence, SqlServerIndex,
    StoredProcedure, Table, View, map_databases,
};
use sqlmorph_script::{
    DiffStatus, MySqlScripter, ScriptOptions, Scripter, diff_databases, scripter_for,
};

fn int_column(schema: &str, table: &str, name: &str, ordinal: i32, nullable: bool) -> Column {
    Column {
        table_schema: schema.into(),
        table_name: table.into(),
        name: name.into(),
        ordinal_position: ordinal,
        data_type: "int".into(),
        is_nullable: nullable,
        ..Column::default()
    }
}

fn table(schema: &str, name: &str, columns: Vec<Column>) -> Table {
    Table {
        columns,
        ..Table::new(schema, name)
    }
}

/// `dbo.customers(id)` with a clustered primary key, an index and a view.
fn mssql_shop() -> Database {
    let mut db = Database::new("shop", Dialect::SqlServer);
    let mut customers = table(
        "dbo",
        "customers",
        vec![
            int_column("dbo", "customers", "id", 1, false),
            int_column("dbo", "customers", "region", 2, true),
        ],
    );
    customers.primary_keys.push(0);
    customers.indexes.push(0);
    db.tables.push(customers);
    db.primary_keys.push(PrimaryKey {
        table_schema: "dbo".into(),
        table_name: "customers".into(),
        name: "PK_customers".into(),
        column_names: vec!["id".into()],
        column_descending: vec![false],
        is_clustered: true,
        ..PrimaryKey::default()
    });
    db.indexes.push(Index {
        table_schema: "dbo".into(),
        table_name: "customers".into(),
        name: "IX_customers_region".into(),
        column_names: vec!["region".into()],
        column_descending: vec![false],
        ext: IndexExt::SqlServer(SqlServerIndex::default()),
        ..Index::default()
    });
    db.views.push(View {
        schema: "dbo".into(),
        name: "active_customers".into(),
        definition: "CREATE VIEW dbo.active_customers AS SELECT id FROM dbo.customers".into(),
        ..View::default()
    });
    db
}

#[test]
fn new_not_null_column_is_added_nullable_backfilled_then_tightened() -> Result<()> {
    let mut source = Database::new("shop", Dialect::SqlServer);
    source.tables.push(table(
        "dbo",
        "t",
        vec![
            int_column("dbo", "t", "a", 1, true),
            int_column("dbo", "t", "b", 2, false),
        ],
    ));
    let mut target = Database::new("shop", Dialect::SqlServer);
    target
        .tables
        .push(table("dbo", "t", vec![int_column("dbo", "t", "a", 1, true)]));

    map_databases(&mut source, &mut target, NameMatching::Ordinal);
    let scripter = scripter_for(Dialect::SqlServer, ScriptOptions::default());
    let comparison = diff_databases(scripter.as_ref(), &source, &target)?;
    assert_eq!(comparison.different().count(), 1);

    let script = scripter.generate_full_alter_script(&source, &target, &comparison)?;
    assert!(
        script.contains(
            "ALTER TABLE [dbo].[t] ADD [b] int NULL;\nGO\n\
             UPDATE [dbo].[t] SET [b] = 0;\nGO\n\
             ALTER TABLE [dbo].[t] ALTER COLUMN [b] int NOT NULL;\nGO\n"
        ),
        "{script}"
    );
    Ok(())
}

/// Alter script adding NOT NULL column `b` of `data_type` to `t(a)`.
fn add_not_null_column_script(dialect: Dialect, schema: &str, data_type: &str) -> Result<String> {
    let column = |name: &str, ordinal: i32, nullable: bool| Column {
        data_type: data_type.into(),
        ..int_column(schema, "t", name, ordinal, nullable)
    };
    let mut source = Database::new("shop", dialect);
    source
        .tables
        .push(table(schema, "t", vec![column("a", 1, true), column("b", 2, false)]));
    let mut target = Database::new("shop", dialect);
    target.tables.push(table(schema, "t", vec![column("a", 1, true)]));

    map_databases(&mut source, &mut target, NameMatching::Ordinal);
    let scripter = scripter_for(dialect, ScriptOptions::default());
    let comparison = diff_databases(scripter.as_ref(), &source, &target)?;
    Ok(scripter.generate_full_alter_script(&source, &target, &comparison)?)
}

#[test]
fn mysql_backfill_tightens_with_modify_column() -> Result<()> {
    let script = add_not_null_column_script(Dialect::MySql, "", "int")?;
    assert!(
        script.contains(
            "ALTER TABLE `t` ADD COLUMN `b` int NULL;\n\
             UPDATE `t` SET `b` = 0;\n\
             ALTER TABLE `t` MODIFY COLUMN `b` int NOT NULL;\n"
        ),
        "{script}"
    );
    Ok(())
}

#[test]
fn postgres_backfill_tightens_with_set_not_null() -> Result<()> {
    let script = add_not_null_column_script(Dialect::Postgres, "public", "integer")?;
    assert!(
        script.contains(
            "ALTER TABLE \"public\".\"t\" ADD COLUMN \"b\" integer;\n\
             UPDATE \"public\".\"t\" SET \"b\" = 0;\n\
             ALTER TABLE \"public\".\"t\" ALTER COLUMN \"b\" SET NOT NULL;\n"
        ),
        "{script}"
    );
    Ok(())
}

#[test]
fn postgres_enum_backfill_uses_the_first_label() -> Result<()> {
    let mut source = Database::new("app", Dialect::Postgres);
    source.data_types.push(DataType {
        schema: "public".into(),
        name: "mood".into(),
        is_user_defined: true,
        kind: DataTypeKind::Enumerated {
            labels: vec!["calm".into(), "angry".into()],
        },
        ..DataType::default()
    });
    let mut target = source.clone();
    let mut mood = int_column("public", "t", "mood", 2, false);
    mood.data_type = "mood".into();
    mood.ext = ColumnExt::Postgres(PostgresColumn {
        formatted_type: "mood".into(),
        udt_schema: Some("public".into()),
        ..PostgresColumn::default()
    });
    let id = int_column("public", "t", "id", 1, false);
    source
        .tables
        .push(table("public", "t", vec![id.clone(), mood]));
    target.tables.push(table("public", "t", vec![id]));

    map_databases(&mut source, &mut target, NameMatching::Ordinal);
    let scripter = scripter_for(Dialect::Postgres, ScriptOptions::default());
    let comparison = diff_databases(scripter.as_ref(), &source, &target)?;
    let script = scripter.generate_full_alter_script(&source, &target, &comparison)?;
    assert!(
        script.contains("UPDATE \"public\".\"t\" SET \"mood\" = 'calm';\n"),
        "{script}"
    );
    Ok(())
}

#[test]
fn mssql_schemas_survive_the_full_drop_and_are_created_guarded() -> Result<()> {
    let mut db = Database::new("shop", Dialect::SqlServer);
    for name in ["dbo", "sales"] {
        db.schemas.push(SchemaInfo {
            name: name.into(),
            ..SchemaInfo::default()
        });
    }
    db.tables
        .push(table("sales", "t", vec![int_column("sales", "t", "id", 1, false)]));

    let scripter = scripter_for(Dialect::SqlServer, ScriptOptions::default());
    let drop = scripter.generate_full_drop_script(&db)?;
    assert!(drop.contains("DROP TABLE [sales].[t];"), "{drop}");
    assert!(!drop.contains("DROP SCHEMA"), "{drop}");

    // Running create after drop must not fail on the surviving schema.
    let create = scripter.generate_full_create_script(&db)?;
    assert!(
        create.contains("IF SCHEMA_ID(N'sales') IS NULL EXEC(N'CREATE SCHEMA [sales]');\nGO\n"),
        "{create}"
    );
    assert!(!create.contains("SCHEMA_ID(N'dbo')"), "{create}");
    let create_at = create.find("SCHEMA_ID(N'sales')").unwrap_or(usize::MAX);
    let table_at = create.find("CREATE TABLE [sales].[t]").unwrap_or(0);
    assert!(create_at < table_at, "{create}");
    Ok(())
}

#[test]
fn generated_default_constraint_names_do_not_count_as_changes() -> Result<()> {
    let with_default = |constraint: &str, system_named: bool| {
        let mut db = mssql_shop();
        let region = &mut db.tables[0].columns[1];
        region.default = Some("((0))".into());
        region.default_constraint_name = Some(constraint.into());
        region.default_is_system_named = system_named;
        db
    };
    let scripter = scripter_for(Dialect::SqlServer, ScriptOptions::default());

    let mut source = with_default("DF__customer__regio__5EBF139D", true);
    let mut target = with_default("DF__customer__regio__1A2B3C4D", true);
    map_databases(&mut source, &mut target, NameMatching::Ordinal);
    let comparison = diff_databases(scripter.as_ref(), &source, &target)?;
    assert!(comparison.is_identical());

    let mut source = with_default("DF_customers_region", false);
    let mut target = with_default("DF_region", false);
    map_databases(&mut source, &mut target, NameMatching::Ordinal);
    let comparison = diff_databases(scripter.as_ref(), &source, &target)?;
    assert_eq!(comparison.different().count(), 1);
    Ok(())
}

#[test]
fn alter_against_an_empty_source_is_the_full_drop() -> Result<()> {
    let mut source = Database::new("shop", Dialect::SqlServer);
    let mut target = mssql_shop();
    map_databases(&mut source, &mut target, NameMatching::Ordinal);

    let scripter = scripter_for(Dialect::SqlServer, ScriptOptions::default());
    let comparison = diff_databases(scripter.as_ref(), &source, &target)?;
    assert!(
        comparison
            .items
            .iter()
            .all(|item| item.status == DiffStatus::OnlyTarget)
    );

    let alter = scripter.generate_full_alter_script(&source, &target, &comparison)?;
    let drop = scripter.generate_full_drop_script(&target)?;
    assert_eq!(alter, drop);

    let view = drop.find("DROP VIEW").unwrap_or(usize::MAX);
    let table = drop.find("DROP TABLE").unwrap_or(0);
    assert!(view < table, "views drop before their tables:\n{drop}");
    Ok(())
}

#[test]
fn identical_databases_diff_as_unchanged_and_script_nothing() -> Result<()> {
    let mut source = mssql_shop();
    let mut target = mssql_shop();
    map_databases(&mut source, &mut target, NameMatching::Ordinal);

    let scripter = scripter_for(Dialect::SqlServer, ScriptOptions::default());
    let comparison = diff_databases(scripter.as_ref(), &source, &target)?;
    assert!(comparison.is_identical());
    assert_eq!(
        scripter.generate_full_alter_script(&source, &target, &comparison)?,
        ""
    );
    Ok(())
}

#[test]
fn swapping_sides_keeps_modified_and_mirrors_one_sided_items() -> Result<()> {
    let mut source = mssql_shop();
    source.tables[0].columns[1].data_type = "bigint".into();
    source
        .tables
        .push(table("dbo", "audit", vec![int_column("dbo", "audit", "id", 1, false)]));
    let mut target = mssql_shop();
    target.views.clear();

    let scripter = scripter_for(Dialect::SqlServer, ScriptOptions::default());

    map_databases(&mut source, &mut target, NameMatching::Ordinal);
    let forward = diff_databases(scripter.as_ref(), &source, &target)?;
    map_databases(&mut target, &mut source, NameMatching::Ordinal);
    let backward = diff_databases(scripter.as_ref(), &target, &source)?;

    let keys = |items: Vec<&sqlmorph_script::ComparisonItem>| {
        items.into_iter().map(|item| item.key.clone()).collect::<Vec<_>>()
    };
    assert_eq!(
        keys(forward.different().collect()),
        keys(backward.different().collect())
    );
    assert_eq!(
        keys(forward.only_source().collect()),
        keys(backward.only_target().collect())
    );
    assert_eq!(
        keys(forward.only_target().collect()),
        keys(backward.only_source().collect())
    );

    let modified: Vec<_> = forward.different().collect();
    assert_eq!(modified.len(), 1);
    assert_eq!(modified[0].kind, ObjectKind::Table);
    assert_eq!(forward.only_source().count(), 2, "new table and the view");
    Ok(())
}

#[test]
fn modified_view_is_altered_in_place() -> Result<()> {
    let mut source = mssql_shop();
    source.views[0].definition =
        "CREATE VIEW dbo.active_customers AS SELECT id, region FROM dbo.customers".into();
    let mut target = mssql_shop();
    map_databases(&mut source, &mut target, NameMatching::Ordinal);

    let scripter = scripter_for(Dialect::SqlServer, ScriptOptions::default());
    let comparison = diff_databases(scripter.as_ref(), &source, &target)?;
    let script = scripter.generate_full_alter_script(&source, &target, &comparison)?;
    assert_eq!(
        script,
        "--\n-- Altered objects\n--\n\
         ALTER VIEW dbo.active_customers AS SELECT id, region FROM dbo.customers\nGO\n"
    );
    Ok(())
}

#[test]
fn mysql_sequences_are_a_hard_failure() {
    let db = Database::new("shop", Dialect::MySql);
    let sequence = Sequence {
        name: "order_no".into(),
        data_type: "bigint".into(),
        ..Sequence::default()
    };
    let scripter = MySqlScripter::new(Dialect::MySql, ScriptOptions::default());
    let err = scripter
        .generate_create_script(&db, sqlmorph_core::ObjectRef::Sequence(&sequence))
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
}

#[test]
fn postgres_procedures_are_a_hard_failure() {
    let db = Database::new("app", Dialect::Postgres);
    let procedure = StoredProcedure {
        schema: "public".into(),
        name: "archive".into(),
        definition: "CREATE PROCEDURE public.archive() LANGUAGE sql AS $$ SELECT 1 $$".into(),
        ..StoredProcedure::default()
    };
    let scripter = scripter_for(Dialect::Postgres, ScriptOptions::default());
    let err = scripter
        .generate_drop_script(&db, sqlmorph_core::ObjectRef::StoredProcedure(&procedure))
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
}

#[test]
fn postgres_full_create_orders_schema_before_tables() -> Result<()> {
    let mut db = Database::new("app", Dialect::Postgres);
    db.schemas.push(SchemaInfo {
        name: "public".into(),
        ..SchemaInfo::default()
    });
    db.schemas.push(SchemaInfo {
        name: "billing".into(),
        ..SchemaInfo::default()
    });
    let mut invoices = table(
        "billing",
        "invoices",
        vec![int_column("billing", "invoices", "id", 1, false)],
    );
    invoices.columns[0].data_type = "integer".into();
    invoices.columns[0].ext = ColumnExt::Postgres(PostgresColumn {
        formatted_type: "integer".into(),
        ..PostgresColumn::default()
    });
    invoices.primary_keys.push(0);
    db.tables.push(invoices);
    db.primary_keys.push(PrimaryKey {
        table_schema: "billing".into(),
        table_name: "invoices".into(),
        name: "invoices_pkey".into(),
        column_names: vec!["id".into()],
        ..PrimaryKey::default()
    });

    let options = ScriptOptions {
        include_comments: false,
        ..ScriptOptions::default()
    };
    let script = scripter_for(Dialect::Postgres, options).generate_full_create_script(&db)?;
    assert_eq!(
        script,
        "CREATE SCHEMA IF NOT EXISTS \"billing\";\n\n\
         CREATE TABLE \"billing\".\"invoices\" (\n    \"id\" integer NOT NULL\n);\n\n\
         ALTER TABLE \"billing\".\"invoices\" ADD CONSTRAINT \"invoices_pkey\" PRIMARY KEY (\"id\");\n"
    );
    Ok(())
}
