//! The per-dialect scripting contract and its shared composite algorithms.

use sqlmorph_core::{
    Column, Constraint, DataType, Database, Error, ForeignKey, Function, Index, ObjectKind,
    ObjectRef, PrimaryKey, Result, SchemaInfo, Sequence, StoredProcedure, Table, Trigger, User,
    View,
};

use crate::diff::{Comparison, ComparisonItem};
use crate::full;
use crate::helper::{ScriptHelper, normalize_definition, terminate};
use crate::options::ScriptOptions;
use crate::table;

/// A mapped object and its counterpart, each with the database it lives in.
#[derive(Debug)]
pub struct Counterparts<'a, T> {
    pub source_db: &'a Database,
    pub source: &'a T,
    pub target_db: &'a Database,
    pub target: &'a T,
}

impl<T> Clone for Counterparts<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Counterparts<'_, T> {}

/// Script generation for one dialect.
///
/// Per-kind `script_*` primitives return complete DDL units (terminated
/// statements followed by the batch separator). Kinds the dialect cannot
/// express fail with [`Error::Unsupported`]; nothing is silently skipped.
/// Alter primitives transform the target object into the source object and
/// default to a drop followed by a create.
pub trait Scripter: ScriptHelper {
    fn options(&self) -> &ScriptOptions;

    /// Primary key and indexes are written inside `CREATE TABLE`.
    fn inlines_table_keys(&self) -> bool {
        false
    }

    /// `ALTER COLUMN` keeps a column's default in place.
    fn default_survives_alter(&self) -> bool {
        true
    }

    /// The alter-column statement restates the default itself.
    fn alter_column_sets_default(&self) -> bool {
        false
    }

    /// Value a new NOT NULL column of `db` is backfilled with.
    fn backfill_literal(&self, _db: &Database, column: &Column) -> String {
        self.default_literal(&column.data_type)
    }

    // Column primitives; these return bare statements for the table alter
    // algorithm to sequence. `table` is the quoted table name.

    /// Column definition as it appears inside `CREATE TABLE`.
    fn script_column(&self, column: &Column, include_default: bool) -> String;

    fn script_add_column(&self, table: &str, column: &Column) -> Vec<String>;

    fn script_drop_column(&self, table: &str, column: &Column) -> Vec<String>;

    fn script_alter_column(&self, table: &str, source: &Column, target: &Column) -> Vec<String>;

    fn script_set_not_null(&self, table: &str, column: &Column) -> Vec<String>;

    fn script_add_default(&self, table: &str, column: &Column) -> Vec<String>;

    fn script_drop_default(&self, table: &str, column: &Column) -> Vec<String>;

    /// Table-level option changes (engine, logging) between two versions.
    fn script_table_options(&self, _source: &Table, _target: &Table) -> Vec<String> {
        Vec::new()
    }

    fn script_create_schema(&self, db: &Database, schema: &SchemaInfo) -> Result<String>;
    fn script_drop_schema(&self, db: &Database, schema: &SchemaInfo) -> Result<String>;

    fn script_create_user(&self, db: &Database, user: &User) -> Result<String>;
    fn script_drop_user(&self, db: &Database, user: &User) -> Result<String>;

    fn script_create_data_type(&self, db: &Database, data_type: &DataType) -> Result<String>;
    fn script_drop_data_type(&self, db: &Database, data_type: &DataType) -> Result<String>;

    fn script_create_sequence(&self, db: &Database, sequence: &Sequence) -> Result<String>;
    fn script_drop_sequence(&self, db: &Database, sequence: &Sequence) -> Result<String>;

    /// `reference` is the counterpart table whose column order is matched first.
    fn script_create_table(
        &self,
        db: &Database,
        table: &Table,
        reference: Option<&Table>,
    ) -> Result<String>;
    fn script_drop_table(&self, db: &Database, table: &Table) -> Result<String>;

    fn script_create_primary_key(&self, db: &Database, key: &PrimaryKey) -> Result<String>;
    fn script_drop_primary_key(&self, db: &Database, key: &PrimaryKey) -> Result<String>;

    fn script_create_foreign_key(&self, db: &Database, key: &ForeignKey) -> Result<String>;
    fn script_drop_foreign_key(&self, db: &Database, key: &ForeignKey) -> Result<String>;

    fn script_create_constraint(&self, db: &Database, constraint: &Constraint) -> Result<String>;
    fn script_drop_constraint(&self, db: &Database, constraint: &Constraint) -> Result<String>;

    fn script_create_function(&self, db: &Database, function: &Function) -> Result<String>;
    fn script_drop_function(&self, db: &Database, function: &Function) -> Result<String>;

    fn script_create_stored_procedure(
        &self,
        db: &Database,
        procedure: &StoredProcedure,
    ) -> Result<String>;
    fn script_drop_stored_procedure(
        &self,
        db: &Database,
        procedure: &StoredProcedure,
    ) -> Result<String>;

    fn script_create_view(&self, db: &Database, view: &View) -> Result<String>;
    fn script_drop_view(&self, db: &Database, view: &View) -> Result<String>;

    fn script_create_index(&self, db: &Database, index: &Index) -> Result<String>;
    fn script_drop_index(&self, db: &Database, index: &Index) -> Result<String>;

    fn script_create_trigger(&self, db: &Database, trigger: &Trigger) -> Result<String>;
    fn script_drop_trigger(&self, db: &Database, trigger: &Trigger) -> Result<String>;

    fn script_alter_schema(&self, pair: Counterparts<'_, SchemaInfo>) -> Result<String> {
        Ok(self.script_drop_schema(pair.target_db, pair.target)?
            + &self.script_create_schema(pair.source_db, pair.source)?)
    }

    fn script_alter_user(&self, pair: Counterparts<'_, User>) -> Result<String> {
        Ok(self.script_drop_user(pair.target_db, pair.target)?
            + &self.script_create_user(pair.source_db, pair.source)?)
    }

    fn script_alter_data_type(&self, pair: Counterparts<'_, DataType>) -> Result<String> {
        Ok(self.script_drop_data_type(pair.target_db, pair.target)?
            + &self.script_create_data_type(pair.source_db, pair.source)?)
    }

    fn script_alter_sequence(&self, pair: Counterparts<'_, Sequence>) -> Result<String> {
        Ok(self.script_drop_sequence(pair.target_db, pair.target)?
            + &self.script_create_sequence(pair.source_db, pair.source)?)
    }

    fn script_alter_table(&self, pair: Counterparts<'_, Table>) -> Result<String> {
        Ok(table::alter_table(self, pair))
    }

    fn script_alter_primary_key(&self, pair: Counterparts<'_, PrimaryKey>) -> Result<String> {
        Ok(self.script_drop_primary_key(pair.target_db, pair.target)?
            + &self.script_create_primary_key(pair.source_db, pair.source)?)
    }

    fn script_alter_foreign_key(&self, pair: Counterparts<'_, ForeignKey>) -> Result<String> {
        Ok(self.script_drop_foreign_key(pair.target_db, pair.target)?
            + &self.script_create_foreign_key(pair.source_db, pair.source)?)
    }

    fn script_alter_constraint(&self, pair: Counterparts<'_, Constraint>) -> Result<String> {
        Ok(self.script_drop_constraint(pair.target_db, pair.target)?
            + &self.script_create_constraint(pair.source_db, pair.source)?)
    }

    fn script_alter_function(&self, pair: Counterparts<'_, Function>) -> Result<String> {
        Ok(self.script_drop_function(pair.target_db, pair.target)?
            + &self.script_create_function(pair.source_db, pair.source)?)
    }

    fn script_alter_stored_procedure(
        &self,
        pair: Counterparts<'_, StoredProcedure>,
    ) -> Result<String> {
        Ok(self.script_drop_stored_procedure(pair.target_db, pair.target)?
            + &self.script_create_stored_procedure(pair.source_db, pair.source)?)
    }

    fn script_alter_view(&self, pair: Counterparts<'_, View>) -> Result<String> {
        Ok(self.script_drop_view(pair.target_db, pair.target)?
            + &self.script_create_view(pair.source_db, pair.source)?)
    }

    fn script_alter_index(&self, pair: Counterparts<'_, Index>) -> Result<String> {
        Ok(self.script_drop_index(pair.target_db, pair.target)?
            + &self.script_create_index(pair.source_db, pair.source)?)
    }

    fn script_alter_trigger(&self, pair: Counterparts<'_, Trigger>) -> Result<String> {
        Ok(self.script_drop_trigger(pair.target_db, pair.target)?
            + &self.script_create_trigger(pair.source_db, pair.source)?)
    }

    /// Batch separator to emit, honouring [`ScriptOptions::batch_terminators`].
    fn batch_separator(&self) -> Option<&'static str> {
        if self.options().batch_terminators {
            self.batch_terminator()
        } else {
            None
        }
    }

    /// Terminate each statement and follow it with the batch separator.
    fn unit(&self, statements: &[String]) -> String {
        let mut out = String::new();
        for sql in statements {
            out.push_str(&terminate(sql));
            if let Some(separator) = self.batch_separator() {
                out.push_str(separator);
                out.push('\n');
            }
        }
        out
    }

    /// Unit for a stored routine, view or trigger definition.
    fn definition_unit(&self, definition: &str) -> String {
        self.unit(&[definition.to_string()])
    }

    /// Quoted name of any object; table-owned objects are prefixed with their table.
    fn generate_object_name(&self, object: ObjectRef<'_>) -> String {
        match object {
            ObjectRef::Schema(_) | ObjectRef::User(_) => self.quote_name(object.name()),
            _ => match object.owner_table() {
                Some(table) => format!(
                    "{}.{}",
                    self.object_name(object.schema(), table),
                    self.quote_name(object.name())
                ),
                None => self.object_name(object.schema(), object.name()),
            },
        }
    }

    fn generate_create_script(&self, db: &Database, object: ObjectRef<'_>) -> Result<String> {
        match object {
            ObjectRef::Schema(schema) => self.script_create_schema(db, schema),
            ObjectRef::User(user) => self.script_create_user(db, user),
            ObjectRef::DataType(data_type) => self.script_create_data_type(db, data_type),
            ObjectRef::Sequence(sequence) => self.script_create_sequence(db, sequence),
            ObjectRef::Table(table) => self.script_create_table(db, table, None),
            ObjectRef::Column(column) => {
                let table = self.object_name(&column.table_schema, &column.table_name);
                Ok(self.unit(&self.script_add_column(&table, column)))
            }
            ObjectRef::PrimaryKey(key) => self.script_create_primary_key(db, key),
            ObjectRef::ForeignKey(key) => self.script_create_foreign_key(db, key),
            ObjectRef::Constraint(constraint) => self.script_create_constraint(db, constraint),
            ObjectRef::Function(function) => self.script_create_function(db, function),
            ObjectRef::StoredProcedure(procedure) => {
                self.script_create_stored_procedure(db, procedure)
            }
            ObjectRef::View(view) => self.script_create_view(db, view),
            ObjectRef::Index(index) => self.script_create_index(db, index),
            ObjectRef::Trigger(trigger) => self.script_create_trigger(db, trigger),
        }
    }

    fn generate_drop_script(&self, db: &Database, object: ObjectRef<'_>) -> Result<String> {
        match object {
            ObjectRef::Schema(schema) => self.script_drop_schema(db, schema),
            ObjectRef::User(user) => self.script_drop_user(db, user),
            ObjectRef::DataType(data_type) => self.script_drop_data_type(db, data_type),
            ObjectRef::Sequence(sequence) => self.script_drop_sequence(db, sequence),
            ObjectRef::Table(table) => self.script_drop_table(db, table),
            ObjectRef::Column(column) => {
                let table = self.object_name(&column.table_schema, &column.table_name);
                Ok(self.unit(&self.script_drop_column(&table, column)))
            }
            ObjectRef::PrimaryKey(key) => self.script_drop_primary_key(db, key),
            ObjectRef::ForeignKey(key) => self.script_drop_foreign_key(db, key),
            ObjectRef::Constraint(constraint) => self.script_drop_constraint(db, constraint),
            ObjectRef::Function(function) => self.script_drop_function(db, function),
            ObjectRef::StoredProcedure(procedure) => {
                self.script_drop_stored_procedure(db, procedure)
            }
            ObjectRef::View(view) => self.script_drop_view(db, view),
            ObjectRef::Index(index) => self.script_drop_index(db, index),
            ObjectRef::Trigger(trigger) => self.script_drop_trigger(db, trigger),
        }
    }

    /// Script one classified item: alter when both sides exist, otherwise
    /// create the source-only or drop the target-only object.
    fn generate_alter_script(
        &self,
        source: &Database,
        target: &Database,
        item: &ComparisonItem,
    ) -> Result<String> {
        let source_object = item.source.and_then(|idx| source.object(item.kind, idx));
        let target_object = item.target.and_then(|idx| target.object(item.kind, idx));
        match (source_object, target_object) {
            (Some(source_object), Some(target_object)) => {
                alter_pair(self, source, source_object, target, target_object)
            }
            (Some(source_object), None) => self.generate_create_script(source, source_object),
            (None, Some(target_object)) => self.generate_drop_script(target, target_object),
            (None, None) => Err(Error::Other(format!(
                "{} does not resolve in either database",
                item.key
            ))),
        }
    }

    /// Normalised create script used as the comparison fingerprint.
    fn canonical_script(
        &self,
        db: &Database,
        object: ObjectRef<'_>,
        reference: Option<&Table>,
    ) -> Result<String> {
        let script = match object {
            ObjectRef::Table(table) => self.script_create_table(db, table, reference)?,
            other => self.generate_create_script(db, other)?,
        };
        Ok(normalize_definition(&script))
    }

    fn generate_full_create_script(&self, db: &Database) -> Result<String> {
        full::full_create(self, db)
    }

    fn generate_full_drop_script(&self, db: &Database) -> Result<String> {
        full::full_drop(self, db, db)
    }

    fn generate_full_alter_script(
        &self,
        source: &Database,
        target: &Database,
        comparison: &Comparison,
    ) -> Result<String> {
        full::full_alter(self, source, target, comparison)
    }
}

fn alter_pair<S: Scripter + ?Sized>(
    scripter: &S,
    source_db: &Database,
    source: ObjectRef<'_>,
    target_db: &Database,
    target: ObjectRef<'_>,
) -> Result<String> {
    macro_rules! pair {
        ($source:expr, $target:expr) => {
            Counterparts {
                source_db,
                source: $source,
                target_db,
                target: $target,
            }
        };
    }

    match (source, target) {
        (ObjectRef::Schema(s), ObjectRef::Schema(t)) => scripter.script_alter_schema(pair!(s, t)),
        (ObjectRef::User(s), ObjectRef::User(t)) => scripter.script_alter_user(pair!(s, t)),
        (ObjectRef::DataType(s), ObjectRef::DataType(t)) => {
            scripter.script_alter_data_type(pair!(s, t))
        }
        (ObjectRef::Sequence(s), ObjectRef::Sequence(t)) => {
            scripter.script_alter_sequence(pair!(s, t))
        }
        (ObjectRef::Table(s), ObjectRef::Table(t)) => scripter.script_alter_table(pair!(s, t)),
        (ObjectRef::Column(s), ObjectRef::Column(t)) => {
            let table = scripter.object_name(&t.table_schema, &t.table_name);
            Ok(scripter.unit(&scripter.script_alter_column(&table, s, t)))
        }
        (ObjectRef::PrimaryKey(s), ObjectRef::PrimaryKey(t)) => {
            scripter.script_alter_primary_key(pair!(s, t))
        }
        (ObjectRef::ForeignKey(s), ObjectRef::ForeignKey(t)) => {
            scripter.script_alter_foreign_key(pair!(s, t))
        }
        (ObjectRef::Constraint(s), ObjectRef::Constraint(t)) => {
            scripter.script_alter_constraint(pair!(s, t))
        }
        (ObjectRef::Function(s), ObjectRef::Function(t)) => {
            scripter.script_alter_function(pair!(s, t))
        }
        (ObjectRef::StoredProcedure(s), ObjectRef::StoredProcedure(t)) => {
            scripter.script_alter_stored_procedure(pair!(s, t))
        }
        (ObjectRef::View(s), ObjectRef::View(t)) => scripter.script_alter_view(pair!(s, t)),
        (ObjectRef::Index(s), ObjectRef::Index(t)) => scripter.script_alter_index(pair!(s, t)),
        (ObjectRef::Trigger(s), ObjectRef::Trigger(t)) => {
            scripter.script_alter_trigger(pair!(s, t))
        }
        (source, target) => Err(Error::InvalidSchema(format!(
            "cannot alter {} into {}",
            target.key(),
            source.kind()
        ))),
    }
}

/// Kinds walked by full alter scripts; principals and schemas are reported
/// by the diff but never rewritten in place.
pub(crate) fn alters_in_place(kind: ObjectKind) -> bool {
    !matches!(kind, ObjectKind::User | ObjectKind::Schema)
}
