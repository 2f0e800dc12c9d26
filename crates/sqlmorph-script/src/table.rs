//! Column ordering and the column delta of table alter scripts.

use sqlmorph_core::{Column, Database, ServerVersion, Table};

use crate::options::{ColumnOrder, NotNullPolicy, ScriptOptions};
use crate::scripter::{Counterparts, Scripter};

/// Columns of `table` in scripting order.
///
/// With a reference table, columns it shares with `table` (matched by
/// case-insensitive name) come first in the reference's order; the rest follow
/// in the configured order.
pub(crate) fn ordered_columns<'a>(
    table: &'a Table,
    reference: Option<&Table>,
    options: &ScriptOptions,
) -> Vec<&'a Column> {
    let mut base: Vec<&Column> = table.columns.iter().collect();
    match options.column_order {
        ColumnOrder::Ordinal => base.sort_by_key(|column| column.ordinal_position),
        ColumnOrder::Alphabetical => base.sort_by_key(|column| column.name.to_lowercase()),
    }

    let Some(reference) = reference.filter(|_| options.match_reference_order) else {
        return base;
    };

    let mut ordered: Vec<&Column> = ordered_columns(reference, None, options)
        .into_iter()
        .filter_map(|other| table.column_ignore_case(&other.name))
        .collect();
    for column in base {
        if !ordered.iter().any(|placed| std::ptr::eq(*placed, column)) {
            ordered.push(column);
        }
    }
    ordered
}

/// Identity, computed and generated columns are dropped and re-added instead
/// of being altered in place.
fn needs_recreate<S: Scripter + ?Sized>(scripter: &S, source: &Column, target: &Column) -> bool {
    let special = source.is_generated()
        || target.is_generated()
        || source.is_identity() != target.is_identity();
    special && scripter.script_column(source, true) != scripter.script_column(target, true)
}

/// Defaults are standalone named constraints in this dialect.
fn named_defaults<S: Scripter + ?Sized>(scripter: &S) -> bool {
    scripter
        .dialect()
        .capabilities(&ServerVersion::MAX)
        .named_defaults
}

fn default_changed<S: Scripter + ?Sized>(scripter: &S, source: &Column, target: &Column) -> bool {
    source.default != target.default
        || (named_defaults(scripter)
            && source.declared_default_name() != target.declared_default_name())
}

/// Statements adding `column`, following the NOT NULL policy.
///
/// A NOT NULL column without a default is added nullable, backfilled with the
/// backfill literal and then switched to NOT NULL, in that order.
pub(crate) fn add_column_statements<S: Scripter + ?Sized>(
    scripter: &S,
    db: &Database,
    table: &str,
    column: &Column,
) -> Vec<String> {
    let backfill = scripter.options().not_null_policy == NotNullPolicy::Backfill
        && !column.is_nullable
        && column.default.is_none()
        && !column.is_generated()
        && !column.is_identity();
    if !backfill {
        return scripter.script_add_column(table, column);
    }

    let nullable = Column {
        is_nullable: true,
        ..column.clone()
    };
    let mut statements = scripter.script_add_column(table, &nullable);
    statements.push(format!(
        "UPDATE {table} SET {} = {}",
        scripter.quote_name(&column.name),
        scripter.backfill_literal(db, column)
    ));
    statements.extend(scripter.script_set_not_null(table, column));
    statements
}

/// Transform the target table into the source table.
///
/// Passes run in a fixed order: drop target-only columns, drop changed
/// defaults, alter changed columns, add defaults, add source-only columns.
pub(crate) fn alter_table<S: Scripter + ?Sized>(
    scripter: &S,
    pair: Counterparts<'_, Table>,
) -> String {
    let name = scripter.object_name(&pair.target.schema, &pair.target.name);
    let source_columns = ordered_columns(pair.source, Some(pair.target), scripter.options());
    let target_columns = ordered_columns(pair.target, None, scripter.options());

    let mut drops = Vec::new();
    let mut drop_defaults = Vec::new();
    let mut alters = Vec::new();
    let mut add_defaults = Vec::new();
    let mut adds = Vec::new();

    for target in &target_columns {
        if pair.source.column_ignore_case(&target.name).is_none() {
            drops.extend(scripter.script_drop_column(&name, target));
        }
    }

    for source in &source_columns {
        let Some(target) = pair.target.column_ignore_case(&source.name) else {
            adds.extend(add_column_statements(scripter, pair.source_db, &name, source));
            continue;
        };

        if needs_recreate(scripter, source, target) {
            drops.extend(scripter.script_drop_column(&name, target));
            adds.extend(add_column_statements(scripter, pair.source_db, &name, source));
            continue;
        }

        let altered = scripter.script_column(source, false) != scripter.script_column(target, false);
        let rebind = default_changed(scripter, source, target)
            || (altered && !scripter.default_survives_alter());
        let restated = altered && scripter.alter_column_sets_default();

        if rebind && !restated {
            if target.default.is_some() && (source.default.is_none() || named_defaults(scripter)) {
                drop_defaults.extend(scripter.script_drop_default(&name, target));
            }
            if source.default.is_some() {
                add_defaults.extend(scripter.script_add_default(&name, source));
            }
        }
        if altered {
            alters.extend(scripter.script_alter_column(&name, source, target));
        }
    }

    let mut statements = scripter.script_table_options(pair.source, pair.target);
    statements.extend(drops);
    statements.extend(drop_defaults);
    statements.extend(alters);
    statements.extend(add_defaults);
    statements.extend(adds);

    tracing::debug!(
        event = "alter_table",
        table = %pair.target.full_name(),
        statements = statements.len(),
    );
    scripter.unit(&statements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, ordinal: i32) -> Column {
        Column {
            table_schema: "dbo".into(),
            table_name: "t".into(),
            name: name.into(),
            ordinal_position: ordinal,
            data_type: "int".into(),
            ..Column::default()
        }
    }

    fn table(columns: Vec<Column>) -> Table {
        Table {
            columns,
            ..Table::new("dbo", "t")
        }
    }

    fn names(columns: Vec<&Column>) -> Vec<&str> {
        columns.into_iter().map(|column| column.name.as_str()).collect()
    }

    #[test]
    fn reference_order_comes_first() {
        let source = table(vec![column("id", 1), column("note", 2), column("Email", 3)]);
        let target = table(vec![column("email", 1), column("id", 2)]);

        let ordered = ordered_columns(&source, Some(&target), &ScriptOptions::default());
        assert_eq!(names(ordered), vec!["Email", "id", "note"]);
    }

    #[test]
    fn alphabetical_order_ignores_case_and_reference_can_be_disabled() {
        let source = table(vec![column("b", 1), column("C", 2), column("a", 3)]);
        let target = table(vec![column("C", 1)]);
        let options = ScriptOptions {
            column_order: ColumnOrder::Alphabetical,
            match_reference_order: false,
            ..ScriptOptions::default()
        };

        assert_eq!(
            names(ordered_columns(&source, Some(&target), &options)),
            vec!["a", "b", "C"]
        );
    }
}
