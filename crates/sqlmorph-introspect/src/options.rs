use serde::{Deserialize, Serialize};

use sqlmorph_core::{Database, ObjectKind};

/// Options that control how discovery behaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrospectOptions {
    pub include_system_schemas: bool,
    /// Skip functions and stored procedures.
    pub skip_routines: bool,
    /// Skip user-defined data types.
    pub skip_types: bool,
    /// Keep only these schemas; `None` keeps every user schema.
    pub schemas: Option<Vec<String>>,
}

impl IntrospectOptions {
    fn keeps(&self, database: &Database, schema: &str) -> bool {
        if schema.is_empty() {
            return true;
        }
        match &self.schemas {
            Some(list) => list.iter().any(|item| item == schema),
            None => self.include_system_schemas || !is_system_schema(database, schema),
        }
    }

    /// Drop objects outside the schema allow-list.
    pub fn apply(&self, database: Database) -> Database {
        if self.schemas.is_none() && self.include_system_schemas {
            return database;
        }

        let mut selection = Vec::new();
        let mut dropped = 0usize;
        for kind in ObjectKind::TOP_LEVEL {
            for (idx, object) in database.objects(kind).into_iter().enumerate() {
                let schema = match kind {
                    ObjectKind::Schema => object.name(),
                    _ => object.schema(),
                };
                if self.keeps(&database, schema) {
                    selection.push((kind, idx));
                } else {
                    dropped += 1;
                }
            }
        }

        if dropped == 0 {
            return database;
        }
        tracing::debug!(event = "schema_filter", dropped);
        database.subset(&selection)
    }
}

fn is_system_schema(database: &Database, schema: &str) -> bool {
    let lower = schema.to_ascii_lowercase();
    match database.dialect {
        sqlmorph_core::Dialect::Postgres => {
            lower.starts_with("pg_") || lower == "information_schema"
        }
        sqlmorph_core::Dialect::SqlServer => {
            matches!(lower.as_str(), "sys" | "information_schema" | "guest")
                || lower.starts_with("db_")
        }
        sqlmorph_core::Dialect::MySql | sqlmorph_core::Dialect::MariaDb => matches!(
            lower.as_str(),
            "mysql" | "information_schema" | "performance_schema" | "sys"
        ),
    }
}

#[cfg(test)]
mod tests {
    use sqlmorph_core::{Dialect, SchemaInfo, Table};

    use super::*;

    fn database() -> Database {
        let mut db = Database::new("shop", Dialect::SqlServer);
        db.tables.push(Table::new("dbo", "orders"));
        db.tables.push(Table::new("audit", "events"));
        for name in ["dbo", "audit", "db_owner", "sys"] {
            db.schemas.push(SchemaInfo {
                name: name.into(),
                ..SchemaInfo::default()
            });
        }
        db
    }

    #[test]
    fn default_drops_system_schemas_only() {
        let db = IntrospectOptions::default().apply(database());
        let schemas: Vec<&str> = db.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(schemas, vec!["dbo", "audit"]);
        assert_eq!(db.tables.len(), 2);
    }

    #[test]
    fn allow_list_keeps_named_schemas() {
        let options = IntrospectOptions {
            schemas: Some(vec!["audit".into()]),
            ..IntrospectOptions::default()
        };
        let db = options.apply(database());
        assert_eq!(db.tables.len(), 1);
        assert_eq!(db.tables[0].name, "events");
        assert_eq!(db.schemas.len(), 1);
    }
}
