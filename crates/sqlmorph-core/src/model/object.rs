use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::keys::{Constraint, ForeignKey, Index, PrimaryKey};
use super::principals::{SchemaInfo, User};
use super::routines::{Function, StoredProcedure, Trigger, View};
use super::table::{Column, Table};
use super::types::{DataType, Sequence};

/// Closed set of schema object kinds.
///
/// Declaration order is the order alter scripts walk modified objects in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Schema,
    User,
    DataType,
    Sequence,
    Table,
    Column,
    PrimaryKey,
    ForeignKey,
    Constraint,
    Function,
    StoredProcedure,
    View,
    Index,
    Trigger,
}

impl ObjectKind {
    /// Kinds stored in top-level [`Database`](crate::Database) collections.
    pub const TOP_LEVEL: [ObjectKind; 13] = [
        ObjectKind::Schema,
        ObjectKind::User,
        ObjectKind::DataType,
        ObjectKind::Sequence,
        ObjectKind::Table,
        ObjectKind::PrimaryKey,
        ObjectKind::ForeignKey,
        ObjectKind::Constraint,
        ObjectKind::Function,
        ObjectKind::StoredProcedure,
        ObjectKind::View,
        ObjectKind::Index,
        ObjectKind::Trigger,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Schema => "schema",
            ObjectKind::User => "user",
            ObjectKind::DataType => "data_type",
            ObjectKind::Sequence => "sequence",
            ObjectKind::Table => "table",
            ObjectKind::Column => "column",
            ObjectKind::PrimaryKey => "primary_key",
            ObjectKind::ForeignKey => "foreign_key",
            ObjectKind::Constraint => "constraint",
            ObjectKind::Function => "function",
            ObjectKind::StoredProcedure => "stored_procedure",
            ObjectKind::View => "view",
            ObjectKind::Index => "index",
            ObjectKind::Trigger => "trigger",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural identity of an object within one database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub schema: String,
    /// Owning table for keys, indexes, constraints, columns and triggers.
    pub table: Option<String>,
    /// Object name, plus the argument signature for overloadable routines.
    pub name: String,
}

impl ObjectKey {
    /// Lower-cased copy for case-insensitive matching.
    pub fn folded(&self) -> Self {
        Self {
            kind: self.kind,
            schema: self.schema.to_lowercase(),
            table: self.table.as_ref().map(|table| table.to_lowercase()),
            name: self.name.to_lowercase(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind)?;
        if !self.schema.is_empty() {
            write!(f, "{}.", self.schema)?;
        }
        if let Some(table) = &self.table {
            write!(f, "{table}.")?;
        }
        f.write_str(&self.name)
    }
}

/// Base capability set shared by every schema object.
pub trait SchemaObject {
    const KIND: ObjectKind;

    fn schema(&self) -> &str;

    fn name(&self) -> &str;

    fn owner_table(&self) -> Option<&str> {
        None
    }

    fn signature(&self) -> Option<String> {
        None
    }

    fn mapped(&self) -> Option<usize>;

    fn set_mapped(&mut self, counterpart: Option<usize>);

    fn key(&self) -> ObjectKey {
        let name = match self.signature() {
            Some(signature) => format!("{}({signature})", self.name()),
            None => self.name().to_string(),
        };
        ObjectKey {
            kind: Self::KIND,
            schema: self.schema().to_string(),
            table: self.owner_table().map(str::to_string),
            name,
        }
    }
}

macro_rules! schema_object {
    (@impl $ty:ty, $kind:expr, |$s:ident| $schema:expr, |$t:ident| $table:expr) => {
        impl SchemaObject for $ty {
            const KIND: ObjectKind = $kind;

            fn schema(&self) -> &str {
                let $s = self;
                $schema
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn owner_table(&self) -> Option<&str> {
                let $t = self;
                $table
            }

            fn mapped(&self) -> Option<usize> {
                self.mapped
            }

            fn set_mapped(&mut self, counterpart: Option<usize>) {
                self.mapped = counterpart;
            }
        }
    };
    ($ty:ty, $kind:expr, schema: $schema:ident) => {
        schema_object!(@impl $ty, $kind, |this| &this.$schema, |_this| None);
    };
    ($ty:ty, $kind:expr, schema: $schema:ident, table: $table:ident) => {
        schema_object!(@impl $ty, $kind, |this| &this.$schema, |this| Some(this.$table.as_str()));
    };
}

schema_object!(DataType, ObjectKind::DataType, schema: schema);
schema_object!(Sequence, ObjectKind::Sequence, schema: schema);
schema_object!(Table, ObjectKind::Table, schema: schema);
schema_object!(PrimaryKey, ObjectKind::PrimaryKey, schema: table_schema, table: table_name);
schema_object!(ForeignKey, ObjectKind::ForeignKey, schema: table_schema, table: table_name);
schema_object!(Constraint, ObjectKind::Constraint, schema: table_schema, table: table_name);
schema_object!(Index, ObjectKind::Index, schema: table_schema, table: table_name);
schema_object!(View, ObjectKind::View, schema: schema);
schema_object!(Trigger, ObjectKind::Trigger, schema: schema, table: table_name);

impl SchemaObject for SchemaInfo {
    const KIND: ObjectKind = ObjectKind::Schema;

    fn schema(&self) -> &str {
        ""
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn mapped(&self) -> Option<usize> {
        self.mapped
    }

    fn set_mapped(&mut self, counterpart: Option<usize>) {
        self.mapped = counterpart;
    }
}

impl SchemaObject for User {
    const KIND: ObjectKind = ObjectKind::User;

    fn schema(&self) -> &str {
        ""
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn mapped(&self) -> Option<usize> {
        self.mapped
    }

    fn set_mapped(&mut self, counterpart: Option<usize>) {
        self.mapped = counterpart;
    }
}

impl SchemaObject for Function {
    const KIND: ObjectKind = ObjectKind::Function;

    fn schema(&self) -> &str {
        &self.schema
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Option<String> {
        self.ext.signature()
    }

    fn mapped(&self) -> Option<usize> {
        self.mapped
    }

    fn set_mapped(&mut self, counterpart: Option<usize>) {
        self.mapped = counterpart;
    }
}

impl SchemaObject for StoredProcedure {
    const KIND: ObjectKind = ObjectKind::StoredProcedure;

    fn schema(&self) -> &str {
        &self.schema
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Option<String> {
        self.ext.signature()
    }

    fn mapped(&self) -> Option<usize> {
        self.mapped
    }

    fn set_mapped(&mut self, counterpart: Option<usize>) {
        self.mapped = counterpart;
    }
}

// Columns are matched through their table, never individually.
impl SchemaObject for Column {
    const KIND: ObjectKind = ObjectKind::Column;

    fn schema(&self) -> &str {
        &self.table_schema
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn owner_table(&self) -> Option<&str> {
        Some(&self.table_name)
    }

    fn mapped(&self) -> Option<usize> {
        None
    }

    fn set_mapped(&mut self, _counterpart: Option<usize>) {}
}

/// Borrowed reference to any schema object, for exhaustive dispatch.
#[derive(Debug, Clone, Copy)]
pub enum ObjectRef<'a> {
    Schema(&'a SchemaInfo),
    User(&'a User),
    DataType(&'a DataType),
    Sequence(&'a Sequence),
    Table(&'a Table),
    Column(&'a Column),
    PrimaryKey(&'a PrimaryKey),
    ForeignKey(&'a ForeignKey),
    Constraint(&'a Constraint),
    Function(&'a Function),
    StoredProcedure(&'a StoredProcedure),
    View(&'a View),
    Index(&'a Index),
    Trigger(&'a Trigger),
}

macro_rules! with_object {
    ($value:expr, $object:ident => $body:expr) => {
        match $value {
            ObjectRef::Schema($object) => $body,
            ObjectRef::User($object) => $body,
            ObjectRef::DataType($object) => $body,
            ObjectRef::Sequence($object) => $body,
            ObjectRef::Table($object) => $body,
            ObjectRef::Column($object) => $body,
            ObjectRef::PrimaryKey($object) => $body,
            ObjectRef::ForeignKey($object) => $body,
            ObjectRef::Constraint($object) => $body,
            ObjectRef::Function($object) => $body,
            ObjectRef::StoredProcedure($object) => $body,
            ObjectRef::View($object) => $body,
            ObjectRef::Index($object) => $body,
            ObjectRef::Trigger($object) => $body,
        }
    };
}

impl<'a> ObjectRef<'a> {
    pub fn kind(&self) -> ObjectKind {
        with_object!(self, object => kind_of(*object))
    }

    pub fn schema(&self) -> &'a str {
        with_object!(*self, object => object.schema())
    }

    pub fn name(&self) -> &'a str {
        with_object!(*self, object => object.name())
    }

    pub fn owner_table(&self) -> Option<&'a str> {
        with_object!(*self, object => object.owner_table())
    }

    pub fn key(&self) -> ObjectKey {
        with_object!(self, object => object.key())
    }

    pub fn mapped(&self) -> Option<usize> {
        with_object!(self, object => object.mapped())
    }
}

fn kind_of<T: SchemaObject>(_object: &T) -> ObjectKind {
    T::KIND
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::routines::{PostgresRoutine, RoutineExt};

    #[test]
    fn keys_include_owner_table_and_signature() {
        let index = Index {
            table_schema: "app".into(),
            table_name: "orders".into(),
            name: "ix_orders_user".into(),
            ..Index::default()
        };
        let key = ObjectRef::Index(&index).key();
        assert_eq!(key.kind, ObjectKind::Index);
        assert_eq!(key.table.as_deref(), Some("orders"));
        assert_eq!(key.to_string(), "index app.orders.ix_orders_user");

        let function = Function {
            schema: "app".into(),
            name: "add".into(),
            ext: RoutineExt::Postgres(PostgresRoutine {
                argument_types: vec!["integer".into(), "integer".into()],
                ..PostgresRoutine::default()
            }),
            ..Function::default()
        };
        assert_eq!(function.key().name, "add(integer, integer)");
    }

    #[test]
    fn folded_keys_ignore_case() {
        let upper = Table::new("App", "Orders").key();
        let lower = Table::new("app", "orders").key();
        assert_ne!(upper, lower);
        assert_eq!(upper.folded(), lower.folded());
    }
}
