use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dialect::{Capabilities, Dialect};
use crate::version::ServerVersion;

use super::keys::{Constraint, ForeignKey, Index, PrimaryKey};
use super::object::{ObjectKind, ObjectRef, SchemaObject};
use super::principals::{SchemaInfo, User};
use super::routines::{Function, StoredProcedure, Trigger, View};
use super::table::Table;
use super::types::{DataType, Sequence};

/// Which side of a comparison a database stands for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    None,
    Source,
    Target,
}

/// Root aggregate owning every discovered object.
///
/// Objects refer to each other by name or by index into these collections;
/// nothing holds a pointer back to the database.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Database {
    pub name: String,
    pub dialect: Dialect,
    pub server_version: ServerVersion,
    #[serde(skip)]
    pub direction: Direction,
    pub schemas: Vec<SchemaInfo>,
    pub users: Vec<User>,
    pub data_types: Vec<DataType>,
    pub sequences: Vec<Sequence>,
    pub tables: Vec<Table>,
    pub views: Vec<View>,
    pub functions: Vec<Function>,
    pub stored_procedures: Vec<StoredProcedure>,
    pub triggers: Vec<Trigger>,
    pub indexes: Vec<Index>,
    pub primary_keys: Vec<PrimaryKey>,
    pub foreign_keys: Vec<ForeignKey>,
    pub constraints: Vec<Constraint>,
}

impl Database {
    pub fn new(name: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            name: name.into(),
            dialect,
            server_version: ServerVersion::MAX,
            direction: Direction::None,
            schemas: Vec::new(),
            users: Vec::new(),
            data_types: Vec::new(),
            sequences: Vec::new(),
            tables: Vec::new(),
            views: Vec::new(),
            functions: Vec::new(),
            stored_procedures: Vec::new(),
            triggers: Vec::new(),
            indexes: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.dialect.capabilities(&self.server_version)
    }

    /// Number of objects of a top-level kind (columns live in their tables).
    pub fn len(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Schema => self.schemas.len(),
            ObjectKind::User => self.users.len(),
            ObjectKind::DataType => self.data_types.len(),
            ObjectKind::Sequence => self.sequences.len(),
            ObjectKind::Table => self.tables.len(),
            ObjectKind::Column => 0,
            ObjectKind::PrimaryKey => self.primary_keys.len(),
            ObjectKind::ForeignKey => self.foreign_keys.len(),
            ObjectKind::Constraint => self.constraints.len(),
            ObjectKind::Function => self.functions.len(),
            ObjectKind::StoredProcedure => self.stored_procedures.len(),
            ObjectKind::View => self.views.len(),
            ObjectKind::Index => self.indexes.len(),
            ObjectKind::Trigger => self.triggers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ObjectKind::TOP_LEVEL.iter().all(|kind| self.len(*kind) == 0)
    }

    pub fn object(&self, kind: ObjectKind, idx: usize) -> Option<ObjectRef<'_>> {
        match kind {
            ObjectKind::Schema => self.schemas.get(idx).map(ObjectRef::Schema),
            ObjectKind::User => self.users.get(idx).map(ObjectRef::User),
            ObjectKind::DataType => self.data_types.get(idx).map(ObjectRef::DataType),
            ObjectKind::Sequence => self.sequences.get(idx).map(ObjectRef::Sequence),
            ObjectKind::Table => self.tables.get(idx).map(ObjectRef::Table),
            ObjectKind::Column => None,
            ObjectKind::PrimaryKey => self.primary_keys.get(idx).map(ObjectRef::PrimaryKey),
            ObjectKind::ForeignKey => self.foreign_keys.get(idx).map(ObjectRef::ForeignKey),
            ObjectKind::Constraint => self.constraints.get(idx).map(ObjectRef::Constraint),
            ObjectKind::Function => self.functions.get(idx).map(ObjectRef::Function),
            ObjectKind::StoredProcedure => {
                self.stored_procedures.get(idx).map(ObjectRef::StoredProcedure)
            }
            ObjectKind::View => self.views.get(idx).map(ObjectRef::View),
            ObjectKind::Index => self.indexes.get(idx).map(ObjectRef::Index),
            ObjectKind::Trigger => self.triggers.get(idx).map(ObjectRef::Trigger),
        }
    }

    /// Every object of a kind, in collection order.
    pub fn objects(&self, kind: ObjectKind) -> Vec<ObjectRef<'_>> {
        (0..self.len(kind))
            .filter_map(|idx| self.object(kind, idx))
            .collect()
    }

    pub fn set_mapped(&mut self, kind: ObjectKind, idx: usize, counterpart: Option<usize>) {
        fn set<T: SchemaObject>(items: &mut [T], idx: usize, counterpart: Option<usize>) {
            if let Some(item) = items.get_mut(idx) {
                item.set_mapped(counterpart);
            }
        }

        match kind {
            ObjectKind::Schema => set(&mut self.schemas, idx, counterpart),
            ObjectKind::User => set(&mut self.users, idx, counterpart),
            ObjectKind::DataType => set(&mut self.data_types, idx, counterpart),
            ObjectKind::Sequence => set(&mut self.sequences, idx, counterpart),
            ObjectKind::Table => set(&mut self.tables, idx, counterpart),
            ObjectKind::Column => {}
            ObjectKind::PrimaryKey => set(&mut self.primary_keys, idx, counterpart),
            ObjectKind::ForeignKey => set(&mut self.foreign_keys, idx, counterpart),
            ObjectKind::Constraint => set(&mut self.constraints, idx, counterpart),
            ObjectKind::Function => set(&mut self.functions, idx, counterpart),
            ObjectKind::StoredProcedure => set(&mut self.stored_procedures, idx, counterpart),
            ObjectKind::View => set(&mut self.views, idx, counterpart),
            ObjectKind::Index => set(&mut self.indexes, idx, counterpart),
            ObjectKind::Trigger => set(&mut self.triggers, idx, counterpart),
        }
    }

    /// Clear every cross-database link.
    pub fn clear_mapping(&mut self) {
        for kind in ObjectKind::TOP_LEVEL {
            for idx in 0..self.len(kind) {
                self.set_mapped(kind, idx, None);
            }
        }
        self.direction = Direction::None;
    }

    pub fn find_table(&self, schema: &str, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|table| table.schema == schema && table.name == name)
    }

    pub fn primary_key_of(&self, table: &Table) -> Option<&PrimaryKey> {
        table
            .primary_keys
            .first()
            .and_then(|idx| self.primary_keys.get(*idx))
    }

    pub fn indexes_of<'a>(&'a self, table: &'a Table) -> impl Iterator<Item = &'a Index> + 'a {
        table.indexes.iter().filter_map(|idx| self.indexes.get(*idx))
    }

    pub fn foreign_keys_of<'a>(
        &'a self,
        table: &'a Table,
    ) -> impl Iterator<Item = &'a ForeignKey> + 'a {
        table
            .foreign_keys
            .iter()
            .filter_map(|idx| self.foreign_keys.get(*idx))
    }

    pub fn referencing_foreign_keys_of<'a>(
        &'a self,
        table: &'a Table,
    ) -> impl Iterator<Item = &'a ForeignKey> + 'a {
        table
            .referencing_foreign_keys
            .iter()
            .filter_map(|idx| self.foreign_keys.get(*idx))
    }

    pub fn constraints_of<'a>(
        &'a self,
        table: &'a Table,
    ) -> impl Iterator<Item = &'a Constraint> + 'a {
        table
            .constraints
            .iter()
            .filter_map(|idx| self.constraints.get(*idx))
    }

    pub fn triggers_of<'a>(&'a self, table: &'a Table) -> impl Iterator<Item = &'a Trigger> + 'a {
        table.triggers.iter().filter_map(|idx| self.triggers.get(*idx))
    }

    /// Build a standalone database holding only the selected objects.
    ///
    /// Arena links are re-pointed into the subset; links to objects left out
    /// are dropped. Mapping state is not carried over.
    pub fn subset(&self, selection: &[(ObjectKind, usize)]) -> Database {
        let mut out = Database::new(self.name.clone(), self.dialect);
        out.server_version = self.server_version;
        out.direction = self.direction;

        let mut remap: HashMap<ObjectKind, HashMap<usize, usize>> = HashMap::new();
        let mut sorted = selection.to_vec();
        sorted.sort();
        sorted.dedup();

        for (kind, idx) in sorted {
            let new_idx = out.len(kind);
            let pushed = match kind {
                ObjectKind::Schema => push(&mut out.schemas, self.schemas.get(idx)),
                ObjectKind::User => push(&mut out.users, self.users.get(idx)),
                ObjectKind::DataType => push(&mut out.data_types, self.data_types.get(idx)),
                ObjectKind::Sequence => push(&mut out.sequences, self.sequences.get(idx)),
                ObjectKind::Table => push(&mut out.tables, self.tables.get(idx)),
                ObjectKind::Column => false,
                ObjectKind::PrimaryKey => push(&mut out.primary_keys, self.primary_keys.get(idx)),
                ObjectKind::ForeignKey => push(&mut out.foreign_keys, self.foreign_keys.get(idx)),
                ObjectKind::Constraint => push(&mut out.constraints, self.constraints.get(idx)),
                ObjectKind::Function => push(&mut out.functions, self.functions.get(idx)),
                ObjectKind::StoredProcedure => {
                    push(&mut out.stored_procedures, self.stored_procedures.get(idx))
                }
                ObjectKind::View => push(&mut out.views, self.views.get(idx)),
                ObjectKind::Index => push(&mut out.indexes, self.indexes.get(idx)),
                ObjectKind::Trigger => push(&mut out.triggers, self.triggers.get(idx)),
            };
            if pushed {
                remap.entry(kind).or_default().insert(idx, new_idx);
            }
        }

        let relink = |kind: ObjectKind, links: &[usize]| -> Vec<usize> {
            let Some(map) = remap.get(&kind) else {
                return Vec::new();
            };
            links.iter().filter_map(|idx| map.get(idx).copied()).collect()
        };

        for table in &mut out.tables {
            table.primary_keys = relink(ObjectKind::PrimaryKey, &table.primary_keys);
            table.foreign_keys = relink(ObjectKind::ForeignKey, &table.foreign_keys);
            table.referencing_foreign_keys =
                relink(ObjectKind::ForeignKey, &table.referencing_foreign_keys);
            table.indexes = relink(ObjectKind::Index, &table.indexes);
            table.constraints = relink(ObjectKind::Constraint, &table.constraints);
            table.triggers = relink(ObjectKind::Trigger, &table.triggers);
        }
        for view in &mut out.views {
            view.indexes = relink(ObjectKind::Index, &view.indexes);
        }

        out.clear_mapping();
        out.direction = self.direction;
        out
    }
}

fn push<T: Clone>(items: &mut Vec<T>, item: Option<&T>) -> bool {
    match item {
        Some(item) => {
            items.push(item.clone());
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Database {
        let mut db = Database::new("shop", Dialect::Postgres);
        let mut users = Table::new("app", "users");
        users.primary_keys = vec![0];
        users.indexes = vec![1];
        db.tables.push(Table::new("app", "audit"));
        db.tables.push(users);
        db.primary_keys.push(PrimaryKey {
            table_schema: "app".into(),
            table_name: "users".into(),
            name: "users_pkey".into(),
            column_names: vec!["id".into()],
            ..PrimaryKey::default()
        });
        db.indexes.push(Index {
            table_schema: "app".into(),
            table_name: "audit".into(),
            name: "ix_audit".into(),
            ..Index::default()
        });
        db.indexes.push(Index {
            table_schema: "app".into(),
            table_name: "users".into(),
            name: "ix_users_email".into(),
            ..Index::default()
        });
        db
    }

    #[test]
    fn lookups_follow_arena_links() {
        let db = sample();
        let users = db.find_table("app", "users").unwrap();
        assert_eq!(db.primary_key_of(users).unwrap().name, "users_pkey");
        let names: Vec<&str> = db.indexes_of(users).map(|idx| idx.name.as_str()).collect();
        assert_eq!(names, vec!["ix_users_email"]);
    }

    #[test]
    fn subset_relinks_selected_children() {
        let db = sample();
        let subset = db.subset(&[
            (ObjectKind::Table, 1),
            (ObjectKind::Index, 1),
            (ObjectKind::PrimaryKey, 0),
        ]);

        assert_eq!(subset.tables.len(), 1);
        assert_eq!(subset.indexes.len(), 1);
        let users = &subset.tables[0];
        assert_eq!(users.indexes, vec![0]);
        assert_eq!(users.primary_keys, vec![0]);
        assert_eq!(subset.indexes[0].name, "ix_users_email");
    }

    #[test]
    fn set_mapped_round_trips_through_object_refs() {
        let mut db = sample();
        db.set_mapped(ObjectKind::Index, 1, Some(7));
        assert_eq!(db.object(ObjectKind::Index, 1).unwrap().mapped(), Some(7));
        db.clear_mapping();
        assert_eq!(db.object(ObjectKind::Index, 1).unwrap().mapped(), None);
        assert!(!db.is_empty());
    }
}
