use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::{Database, ObjectKind, RoutineExt, SchemaObject};

/// Validate internal consistency of a discovered database.
///
/// This checks:
/// - duplicate object identities per kind and duplicate columns per table
/// - parallel arrays on keys and indexes have matching lengths
/// - primary keys never appear among indexes
/// - arena links on tables point at objects owned by that table
/// - routine argument arrays are aligned
pub fn validate_database(database: &Database) -> Result<()> {
    for kind in ObjectKind::TOP_LEVEL {
        let mut seen = BTreeSet::new();
        for object in database.objects(kind) {
            let key = object.key();
            if !seen.insert(key.clone()) {
                return Err(Error::InvalidSchema(format!("duplicate {key}")));
            }
        }
    }

    for table in &database.tables {
        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    table.full_name(),
                    column.name
                )));
            }
        }

        let owned = |schema: &str, name: &str| schema == table.schema && name == table.name;

        for (label, links, len) in [
            ("primary key", &table.primary_keys, database.primary_keys.len()),
            ("foreign key", &table.foreign_keys, database.foreign_keys.len()),
            ("index", &table.indexes, database.indexes.len()),
            ("constraint", &table.constraints, database.constraints.len()),
            ("trigger", &table.triggers, database.triggers.len()),
            (
                "referencing foreign key",
                &table.referencing_foreign_keys,
                database.foreign_keys.len(),
            ),
        ] {
            if let Some(bad) = links.iter().find(|idx| **idx >= len) {
                return Err(Error::InvalidSchema(format!(
                    "{label} link {bad} out of range on {}",
                    table.full_name()
                )));
            }
        }

        if table.primary_keys.len() > 1 {
            return Err(Error::InvalidSchema(format!(
                "multiple primary keys on {}",
                table.full_name()
            )));
        }

        for pk in table.primary_keys.iter().map(|idx| &database.primary_keys[*idx]) {
            if !owned(&pk.table_schema, &pk.table_name) {
                return Err(foreign_link("primary key", &pk.name, &table.full_name()));
            }
            for column in &pk.column_names {
                if !columns.contains(column.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "primary key column not found: {}.{}",
                        table.full_name(),
                        column
                    )));
                }
            }
        }

        for fk in table.foreign_keys.iter().map(|idx| &database.foreign_keys[*idx]) {
            if !owned(&fk.table_schema, &fk.table_name) {
                return Err(foreign_link("foreign key", &fk.name, &table.full_name()));
            }
        }

        for index in table.indexes.iter().map(|idx| &database.indexes[*idx]) {
            if !owned(&index.table_schema, &index.table_name) {
                return Err(foreign_link("index", &index.name, &table.full_name()));
            }
        }

        for constraint in table.constraints.iter().map(|idx| &database.constraints[*idx]) {
            if !owned(&constraint.table_schema, &constraint.table_name) {
                return Err(foreign_link("constraint", &constraint.name, &table.full_name()));
            }
        }

        for trigger in table.triggers.iter().map(|idx| &database.triggers[*idx]) {
            if !owned(&trigger.table_schema, &trigger.table_name) {
                return Err(foreign_link("trigger", &trigger.name, &table.full_name()));
            }
        }
    }

    for pk in &database.primary_keys {
        if !pk.column_descending.is_empty() && pk.column_descending.len() != pk.column_names.len()
        {
            return Err(misaligned(&pk.key().to_string(), "column_descending"));
        }
    }

    for fk in &database.foreign_keys {
        if fk.referenced_column_names.len() != fk.column_names.len() {
            return Err(misaligned(&fk.key().to_string(), "referenced_column_names"));
        }
    }

    for index in &database.indexes {
        if index.is_primary_key {
            return Err(Error::InvalidSchema(format!(
                "primary key {} listed among indexes",
                index.key()
            )));
        }
        if index.column_descending.len() != index.column_names.len() {
            return Err(misaligned(&index.key().to_string(), "column_descending"));
        }
        if database.primary_keys.iter().any(|pk| {
            pk.table_schema == index.table_schema
                && pk.table_name == index.table_name
                && pk.name == index.name
        }) {
            return Err(Error::InvalidSchema(format!(
                "primary key {} listed among indexes",
                index.key()
            )));
        }
    }

    let routines = database
        .functions
        .iter()
        .map(|f| (f.key().to_string(), &f.ext))
        .chain(
            database
                .stored_procedures
                .iter()
                .map(|p| (p.key().to_string(), &p.ext)),
        );
    for (key, ext) in routines {
        if let RoutineExt::Postgres(routine) = ext {
            let types = routine.argument_types.len();
            if !routine.argument_names.is_empty() && routine.argument_names.len() != types {
                return Err(misaligned(&key, "argument_names"));
            }
            if !routine.argument_modes.is_empty() && routine.argument_modes.len() != types {
                return Err(misaligned(&key, "argument_modes"));
            }
        }
    }

    Ok(())
}

fn foreign_link(label: &str, name: &str, table: &str) -> Error {
    Error::InvalidSchema(format!("{label} {name} attached to {table} belongs elsewhere"))
}

fn misaligned(key: &str, field: &str) -> Error {
    Error::InvalidSchema(format!("{key}: {field} does not align with column list"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::model::{Column, Function, Index, PostgresRoutine, PrimaryKey, Table};

    fn column(table: &str, name: &str, ordinal: i32) -> Column {
        Column {
            table_schema: "public".into(),
            table_name: table.into(),
            name: name.into(),
            ordinal_position: ordinal,
            data_type: "integer".into(),
            ..Column::default()
        }
    }

    fn database() -> Database {
        let mut db = Database::new("db", Dialect::Postgres);
        let mut users = Table::new("public", "users");
        users.columns = vec![column("users", "id", 1), column("users", "email", 2)];
        users.primary_keys = vec![0];
        db.tables.push(users);
        db.primary_keys.push(PrimaryKey {
            table_schema: "public".into(),
            table_name: "users".into(),
            name: "users_pkey".into(),
            column_names: vec!["id".into()],
            ..PrimaryKey::default()
        });
        db
    }

    #[test]
    fn accepts_consistent_database() {
        assert!(validate_database(&database()).is_ok());
    }

    #[test]
    fn rejects_primary_key_among_indexes() {
        let mut db = database();
        db.indexes.push(Index {
            table_schema: "public".into(),
            table_name: "users".into(),
            name: "users_pkey".into(),
            column_names: vec!["id".into()],
            column_descending: vec![false],
            ..Index::default()
        });
        db.tables[0].indexes = vec![0];

        let err = validate_database(&db).unwrap_err();
        assert!(err.to_string().contains("listed among indexes"));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let mut db = database();
        db.tables[0].columns.push(column("users", "email", 3));
        assert!(validate_database(&db).is_err());
    }

    #[test]
    fn rejects_misaligned_routine_arguments() {
        let mut db = database();
        db.functions.push(Function {
            schema: "public".into(),
            name: "add".into(),
            definition: "CREATE FUNCTION add".into(),
            ext: RoutineExt::Postgres(PostgresRoutine {
                argument_names: vec!["a".into()],
                argument_types: vec!["integer".into(), "integer".into()],
                ..PostgresRoutine::default()
            }),
            ..Function::default()
        });
        assert!(validate_database(&db).is_err());
    }
}
