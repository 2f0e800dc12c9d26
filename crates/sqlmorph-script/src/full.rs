//! Whole-database create, drop and alter scripts.

use sqlmorph_core::{
    Constraint, ConstraintKind, DataTypeKind, Database, ObjectKind, Result, TableExt,
    table_creation_order,
};

use crate::diff::Comparison;
use crate::scripter::{Scripter, alters_in_place};

/// Script sections; empty sections produce no banner.
struct Sections<'a, S: ?Sized> {
    scripter: &'a S,
    parts: Vec<String>,
}

impl<'a, S: Scripter + ?Sized> Sections<'a, S> {
    fn new(scripter: &'a S) -> Self {
        Self {
            scripter,
            parts: Vec::new(),
        }
    }

    fn push(&mut self, title: &str, units: Vec<String>) {
        let units: Vec<String> = units.into_iter().filter(|unit| !unit.is_empty()).collect();
        if units.is_empty() {
            return;
        }
        let mut section = String::new();
        if self.scripter.options().include_comments {
            section.push_str(&format!("--\n-- {title}\n--\n"));
        }
        section.push_str(&units.join("\n"));
        self.parts.push(section);
    }

    fn finish(self) -> String {
        self.parts.join("\n")
    }
}

/// Positions of `len` objects sorted by a key.
fn sorted_by<K: Ord>(len: usize, key: impl Fn(usize) -> K) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..len).collect();
    positions.sort_by_key(|idx| key(*idx));
    positions
}

/// Enumerations and ranges first, composites (which may use any of them) last.
fn data_type_rank(kind: &DataTypeKind) -> u8 {
    match kind {
        DataTypeKind::Base | DataTypeKind::Enumerated { .. } | DataTypeKind::Alias { .. } => 0,
        DataTypeKind::Range { .. } => 1,
        DataTypeKind::Domain { .. } => 2,
        DataTypeKind::Composite { .. } | DataTypeKind::TableType { .. } => 3,
    }
}

fn data_type_order(db: &Database) -> Vec<usize> {
    sorted_by(db.data_types.len(), |idx| {
        let ty = &db.data_types[idx];
        (data_type_rank(&ty.kind), ty.schema.clone(), ty.name.clone())
    })
}

/// Table creation order; SQL Server history tables precede their owners.
fn table_order(db: &Database) -> Vec<usize> {
    let order = table_creation_order(db);
    let is_history = |idx: &usize| {
        matches!(&db.tables[*idx].ext, TableExt::SqlServer(ext) if ext.is_history_table)
    };
    let (mut history, rest): (Vec<usize>, Vec<usize>) = order.into_iter().partition(is_history);
    history.extend(rest);
    history
}

/// Index order; clustered indexes come first where the dialect has them.
fn index_order(db: &Database) -> Vec<usize> {
    let clustered = db.capabilities().clustered_indexes;
    sorted_by(db.indexes.len(), |idx| {
        let index = &db.indexes[idx];
        (
            !(clustered && index.is_clustered()),
            index.table_schema.clone(),
            index.name.clone(),
            index.table_name.clone(),
        )
    })
}

fn owned_order(db: &Database, kind: ObjectKind) -> Vec<usize> {
    sorted_by(db.len(kind), |idx| {
        db.object(kind, idx)
            .map(|object| object.key())
            .map(|key| (key.schema, key.table, key.name))
    })
}

fn named_order(db: &Database, kind: ObjectKind) -> Vec<usize> {
    sorted_by(db.len(kind), |idx| {
        db.object(kind, idx)
            .map(|object| object.key())
            .map(|key| (key.schema, key.name))
    })
}

/// Synthetic constraints for column defaults that carry a constraint name.
fn default_constraints(db: &Database) -> Vec<Constraint> {
    let mut out: Vec<Constraint> = db
        .tables
        .iter()
        .flat_map(|table| table.columns.iter())
        .filter_map(|column| {
            let name = column.default_constraint_name.clone()?;
            Some(Constraint {
                table_schema: column.table_schema.clone(),
                table_name: column.table_name.clone(),
                name,
                kind: ConstraintKind::Default,
                column_names: vec![column.name.clone()],
                definition: column.default.clone(),
                ..Constraint::default()
            })
        })
        .collect();
    out.sort_by(|left, right| {
        (&left.table_schema, &left.table_name, &left.name).cmp(&(
            &right.table_schema,
            &right.table_name,
            &right.name,
        ))
    });
    out
}

fn keeps_constraint(db: &Database, constraint: &Constraint) -> bool {
    match constraint.kind {
        ConstraintKind::Check => db.capabilities().check_constraints,
        ConstraintKind::Unique => true,
        ConstraintKind::Default => false,
    }
}

/// Every object of `db` in dependency order: schemas, user types, sequences,
/// tables, primary keys, foreign keys, constraints, functions, procedures,
/// views, indexes, triggers.
pub(crate) fn full_create<S: Scripter + ?Sized>(scripter: &S, db: &Database) -> Result<String> {
    let caps = db.capabilities();
    let mut sections = Sections::new(scripter);
    let inline_keys = scripter.inlines_table_keys();
    let has_table = |schema: &str, name: &str| db.find_table(schema, name).is_some();

    if caps.schemas {
        let default_schema = db.dialect.default_schema();
        let mut units = Vec::new();
        for idx in sorted_by(db.schemas.len(), |idx| db.schemas[idx].name.clone()) {
            let schema = &db.schemas[idx];
            if schema.name != default_schema {
                units.push(scripter.script_create_schema(db, schema)?);
            }
        }
        sections.push("Schemas", units);
    }

    if caps.user_defined_types {
        let mut units = Vec::new();
        for idx in data_type_order(db) {
            units.push(scripter.script_create_data_type(db, &db.data_types[idx])?);
        }
        sections.push("User-defined types", units);
    }

    if caps.sequences {
        let mut units = Vec::new();
        for idx in named_order(db, ObjectKind::Sequence) {
            units.push(scripter.script_create_sequence(db, &db.sequences[idx])?);
        }
        sections.push("Sequences", units);
    }

    let mut units = Vec::new();
    for idx in table_order(db) {
        units.push(scripter.script_create_table(db, &db.tables[idx], None)?);
    }
    sections.push("Tables", units);

    let mut units = Vec::new();
    for idx in owned_order(db, ObjectKind::PrimaryKey) {
        let key = &db.primary_keys[idx];
        if inline_keys && has_table(&key.table_schema, &key.table_name) {
            continue;
        }
        units.push(scripter.script_create_primary_key(db, key)?);
    }
    sections.push("Primary keys", units);

    let mut units = Vec::new();
    for idx in owned_order(db, ObjectKind::ForeignKey) {
        units.push(scripter.script_create_foreign_key(db, &db.foreign_keys[idx])?);
    }
    sections.push("Foreign keys", units);

    let mut units = Vec::new();
    for idx in owned_order(db, ObjectKind::Constraint) {
        let constraint = &db.constraints[idx];
        if keeps_constraint(db, constraint) {
            units.push(scripter.script_create_constraint(db, constraint)?);
        }
    }
    sections.push("Constraints", units);

    if caps.functions {
        let mut units = Vec::new();
        for idx in named_order(db, ObjectKind::Function) {
            units.push(scripter.script_create_function(db, &db.functions[idx])?);
        }
        sections.push("Functions", units);
    }

    if caps.stored_procedures {
        let mut units = Vec::new();
        for idx in named_order(db, ObjectKind::StoredProcedure) {
            units.push(scripter.script_create_stored_procedure(db, &db.stored_procedures[idx])?);
        }
        sections.push("Stored procedures", units);
    }

    let mut units = Vec::new();
    for idx in named_order(db, ObjectKind::View) {
        units.push(scripter.script_create_view(db, &db.views[idx])?);
    }
    sections.push("Views", units);

    let mut units = Vec::new();
    for idx in index_order(db) {
        let index = &db.indexes[idx];
        if inline_keys && has_table(&index.table_schema, &index.table_name) {
            continue;
        }
        units.push(scripter.script_create_index(db, index)?);
    }
    sections.push("Indexes", units);

    let mut units = Vec::new();
    for idx in owned_order(db, ObjectKind::Trigger) {
        units.push(scripter.script_create_trigger(db, &db.triggers[idx])?);
    }
    sections.push("Triggers", units);

    tracing::debug!(
        event = "full_create_script",
        database = %db.name,
        sections = sections.parts.len(),
    );
    Ok(sections.finish())
}

/// Mirror of [`full_create`] in reverse dependency order.
///
/// `context` is the database the objects live in; it differs from `db` when
/// `db` is a subset selected for an alter script.
pub(crate) fn full_drop<S: Scripter + ?Sized>(
    scripter: &S,
    db: &Database,
    context: &Database,
) -> Result<String> {
    let caps = db.capabilities();
    let mut sections = Sections::new(scripter);

    let mut units = Vec::new();
    for idx in owned_order(db, ObjectKind::Trigger) {
        units.push(scripter.script_drop_trigger(context, &db.triggers[idx])?);
    }
    sections.push("Dropped triggers", units);

    let mut units = Vec::new();
    for idx in owned_order(db, ObjectKind::ForeignKey) {
        units.push(scripter.script_drop_foreign_key(context, &db.foreign_keys[idx])?);
    }
    sections.push("Dropped foreign keys", units);

    let mut units = Vec::new();
    for idx in index_order(db).into_iter().rev() {
        units.push(scripter.script_drop_index(context, &db.indexes[idx])?);
    }
    sections.push("Dropped indexes", units);

    let mut units = Vec::new();
    for idx in owned_order(db, ObjectKind::PrimaryKey) {
        units.push(scripter.script_drop_primary_key(context, &db.primary_keys[idx])?);
    }
    sections.push("Dropped primary keys", units);

    let mut units = Vec::new();
    for idx in named_order(db, ObjectKind::View) {
        units.push(scripter.script_drop_view(context, &db.views[idx])?);
    }
    sections.push("Dropped views", units);

    if caps.functions {
        let mut units = Vec::new();
        for idx in named_order(db, ObjectKind::Function) {
            units.push(scripter.script_drop_function(context, &db.functions[idx])?);
        }
        sections.push("Dropped functions", units);
    }

    if caps.stored_procedures {
        let mut units = Vec::new();
        for idx in named_order(db, ObjectKind::StoredProcedure) {
            units.push(
                scripter.script_drop_stored_procedure(context, &db.stored_procedures[idx])?,
            );
        }
        sections.push("Dropped stored procedures", units);
    }

    let mut units = Vec::new();
    for idx in owned_order(db, ObjectKind::Constraint) {
        let constraint = &db.constraints[idx];
        if keeps_constraint(db, constraint) {
            units.push(scripter.script_drop_constraint(context, constraint)?);
        }
    }
    if caps.named_defaults {
        for constraint in default_constraints(db) {
            units.push(scripter.script_drop_constraint(context, &constraint)?);
        }
    }
    sections.push("Dropped constraints", units);

    let mut units = Vec::new();
    for idx in table_order(db).into_iter().rev() {
        units.push(scripter.script_drop_table(context, &db.tables[idx])?);
    }
    sections.push("Dropped tables", units);

    if caps.user_defined_types {
        let mut units = Vec::new();
        for idx in data_type_order(db).into_iter().rev() {
            units.push(scripter.script_drop_data_type(context, &db.data_types[idx])?);
        }
        sections.push("Dropped user-defined types", units);
    }

    if caps.sequences {
        let mut units = Vec::new();
        for idx in named_order(db, ObjectKind::Sequence) {
            units.push(scripter.script_drop_sequence(context, &db.sequences[idx])?);
        }
        sections.push("Dropped sequences", units);
    }

    tracing::debug!(
        event = "full_drop_script",
        database = %db.name,
        sections = sections.parts.len(),
    );
    Ok(sections.finish())
}

/// Drop what only the target has, alter every modified pair in kind-then-name
/// order, then create what only the source has.
pub(crate) fn full_alter<S: Scripter + ?Sized>(
    scripter: &S,
    source: &Database,
    target: &Database,
    comparison: &Comparison,
) -> Result<String> {
    let only_target: Vec<(ObjectKind, usize)> = comparison
        .only_target()
        .filter_map(|item| item.target.map(|idx| (item.kind, idx)))
        .collect();
    let only_source: Vec<(ObjectKind, usize)> = comparison
        .only_source()
        .filter_map(|item| item.source.map(|idx| (item.kind, idx)))
        .collect();

    let mut parts = Vec::new();

    let dropped = full_drop(scripter, &target.subset(&only_target), target)?;
    parts.push(dropped);

    let mut altered = Sections::new(scripter);
    let mut units = Vec::new();
    for item in comparison.different() {
        if alters_in_place(item.kind) {
            units.push(scripter.generate_alter_script(source, target, item)?);
        }
    }
    altered.push("Altered objects", units);
    parts.push(altered.finish());

    let created = full_create(scripter, &source.subset(&only_source))?;
    parts.push(created);

    tracing::info!(
        event = "full_alter_script",
        source = %source.name,
        target = %target.name,
        dropped = only_target.len(),
        created = only_source.len(),
    );
    Ok(parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}
