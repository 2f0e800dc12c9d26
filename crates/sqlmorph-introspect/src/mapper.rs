//! Raw catalog rows to model objects.
//!
//! Key-like objects arrive one row per member column; they are grouped by
//! `(schema, table, name)` in first-seen order, scalar facets come from the
//! first row of each group and member arrays follow the catalog ordinal.

use std::collections::HashMap;
use std::hash::Hash;

use sqlmorph_core::{
    Column, Constraint, ConstraintKind, DataType, DataTypeKind, Database, FkAction, ForeignKey,
    Function, Index, PrimaryKey, SchemaInfo, Sequence, StoredProcedure, Table, Trigger, User,
    View,
};

use crate::catalog::CatalogReader;
use crate::raw::{
    RawColumn, RawConstraintColumn, RawDataType, RawForeignKeyColumn, RawIndexColumn, RawRoutine,
    RawSchema, RawSequence, RawTable, RawTrigger, RawUser, RawView,
};

/// Group rows by key, keeping first-seen group order and sorting members by ordinal.
pub fn group_rows<R, K>(
    rows: Vec<R>,
    key: impl Fn(&R) -> K,
    ordinal: impl Fn(&R) -> i32,
) -> Vec<Vec<R>>
where
    K: Hash + Eq,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<R>> = Vec::new();

    for row in rows {
        let k = key(&row);
        match positions.get(&k) {
            Some(idx) => groups[*idx].push(row),
            None => {
                positions.insert(k, groups.len());
                groups.push(vec![row]);
            }
        }
    }

    for group in &mut groups {
        group.sort_by_key(|row| ordinal(row));
    }
    groups
}

pub fn map_tables(raw: Vec<RawTable>, reader: &dyn CatalogReader) -> Vec<Table> {
    raw.into_iter()
        .map(|row| {
            let mut table = Table::new(row.schema_name.clone(), row.table_name.clone());
            table.ext = reader.table_ext(&row);
            table
        })
        .collect()
}

pub fn map_columns(raw: Vec<RawColumn>, reader: &dyn CatalogReader) -> Vec<Column> {
    let mut columns: Vec<Column> = raw
        .into_iter()
        .map(|row| Column {
            table_schema: row.schema_name.clone(),
            table_name: row.table_name.clone(),
            name: row.column_name.clone(),
            ordinal_position: row.ordinal_position,
            data_type: row.data_type.clone(),
            max_length: row.max_length,
            precision: row.numeric_precision.and_then(|value| i32::try_from(value).ok()),
            scale: row.numeric_scale.and_then(|value| i32::try_from(value).ok()),
            is_nullable: row.is_nullable,
            default: row.default_value.clone(),
            default_constraint_name: row.default_constraint.clone(),
            default_is_system_named: row.default_is_system_named,
            is_user_defined_type: row.is_user_defined,
            ext: reader.column_ext(&row),
        })
        .collect();

    columns.sort_by(|left, right| {
        (&left.table_schema, &left.table_name, left.ordinal_position).cmp(&(
            &right.table_schema,
            &right.table_name,
            right.ordinal_position,
        ))
    });
    columns
}

pub fn group_foreign_keys(raw: Vec<RawForeignKeyColumn>) -> Vec<ForeignKey> {
    group_rows(
        raw,
        |row| {
            (
                row.schema_name.clone(),
                row.table_name.clone(),
                row.constraint_name.clone(),
            )
        },
        |row| row.ordinal,
    )
    .into_iter()
    .filter_map(|members| {
        let first = members.first()?;
        Some(ForeignKey {
            table_schema: first.schema_name.clone(),
            table_name: first.table_name.clone(),
            name: first.constraint_name.clone(),
            column_names: members.iter().map(|row| row.column_name.clone()).collect(),
            referenced_table_schema: first.referenced_schema.clone(),
            referenced_table_name: first.referenced_table.clone(),
            referenced_column_names: members
                .iter()
                .map(|row| row.referenced_column.clone())
                .collect(),
            on_update: FkAction::from_catalog(&first.update_rule),
            on_delete: FkAction::from_catalog(&first.delete_rule),
            is_deferrable: first.is_deferrable,
            initially_deferred: first.initially_deferred,
            is_disabled: first.is_disabled,
            mapped: None,
        })
    })
    .collect()
}

pub fn group_indexes(raw: Vec<RawIndexColumn>, reader: &dyn CatalogReader) -> Vec<Index> {
    group_rows(
        raw,
        |row| {
            (
                row.schema_name.clone(),
                row.table_name.clone(),
                row.index_name.clone(),
            )
        },
        |row| row.ordinal,
    )
    .into_iter()
    .filter_map(|members| {
        let first = members.first()?;
        let key_members: Vec<&RawIndexColumn> =
            members.iter().filter(|row| !row.is_included).collect();
        Some(Index {
            table_schema: first.schema_name.clone(),
            table_name: first.table_name.clone(),
            name: first.index_name.clone(),
            column_names: key_members
                .iter()
                .map(|row| row.column_name.clone().unwrap_or_default())
                .collect(),
            column_descending: key_members.iter().map(|row| row.is_descending).collect(),
            is_unique: first.is_unique,
            is_primary_key: first.is_primary_key,
            ext: reader.index_ext(first, &members),
            mapped: None,
        })
    })
    .collect()
}

pub fn group_constraints(raw: Vec<RawConstraintColumn>) -> Vec<Constraint> {
    group_rows(
        raw,
        |row| {
            (
                row.schema_name.clone(),
                row.table_name.clone(),
                row.constraint_name.clone(),
            )
        },
        |row| row.ordinal,
    )
    .into_iter()
    .filter_map(|members| {
        let first = members.first()?;
        let kind = if first.constraint_type.eq_ignore_ascii_case("UNIQUE") {
            ConstraintKind::Unique
        } else {
            ConstraintKind::Check
        };
        Some(Constraint {
            table_schema: first.schema_name.clone(),
            table_name: first.table_name.clone(),
            name: first.constraint_name.clone(),
            kind,
            column_names: members
                .iter()
                .filter_map(|row| row.column_name.clone())
                .collect(),
            definition: first.definition.clone(),
            is_deferrable: first.is_deferrable,
            initially_deferred: first.initially_deferred,
            mapped: None,
        })
    })
    .collect()
}

pub fn map_triggers(raw: Vec<RawTrigger>) -> Vec<Trigger> {
    raw.into_iter()
        .map(|row| Trigger {
            schema: row.schema_name,
            name: row.trigger_name,
            table_schema: row.table_schema,
            table_name: row.table_name,
            definition: trim_definition(&row.definition),
            is_disabled: row.is_disabled,
            mapped: None,
        })
        .collect()
}

pub fn map_views(raw: Vec<RawView>) -> Vec<View> {
    raw.into_iter()
        .map(|row| View {
            schema: row.schema_name,
            name: row.view_name,
            definition: trim_definition(&row.definition),
            is_materialized: row.is_materialized,
            indexes: Vec::new(),
            mapped: None,
        })
        .collect()
}

pub fn map_functions(raw: Vec<RawRoutine>, reader: &dyn CatalogReader) -> Vec<Function> {
    raw.into_iter()
        .map(|row| Function {
            ext: reader.routine_ext(&row),
            schema: row.schema_name,
            name: row.routine_name,
            definition: trim_definition(&row.definition),
            mapped: None,
        })
        .collect()
}

pub fn map_stored_procedures(
    raw: Vec<RawRoutine>,
    reader: &dyn CatalogReader,
) -> Vec<StoredProcedure> {
    raw.into_iter()
        .map(|row| StoredProcedure {
            ext: reader.routine_ext(&row),
            schema: row.schema_name,
            name: row.routine_name,
            definition: trim_definition(&row.definition),
            mapped: None,
        })
        .collect()
}

/// Map data types and resolve referenced type ids to names in a second pass.
///
/// Only user-defined types are kept; built-in types are needed for resolution
/// alone.
pub fn map_data_types(raw: Vec<RawDataType>, reader: &dyn CatalogReader) -> Vec<DataType> {
    let mut types: Vec<DataType> = raw
        .iter()
        .map(|row| DataType {
            schema: row.schema_name.clone(),
            name: row.type_name.clone(),
            type_id: row.type_id,
            is_user_defined: row.is_user_defined,
            system_type_id: row.system_type_id,
            system_type: None,
            kind: reader.data_type_kind(row),
            mapped: None,
        })
        .collect();

    let names: HashMap<i64, String> = types
        .iter()
        .map(|ty| {
            let name = if ty.is_user_defined && !ty.schema.is_empty() {
                format!("{}.{}", ty.schema, ty.name)
            } else {
                ty.name.clone()
            };
            (ty.type_id, name)
        })
        .collect();
    let resolve = |id: i64| names.get(&id).cloned();

    for ty in &mut types {
        ty.system_type = ty.system_type_id.and_then(resolve);
        match &mut ty.kind {
            DataTypeKind::Composite {
                attribute_type_ids,
                attribute_types,
                ..
            } if attribute_types.is_empty() => {
                *attribute_types = attribute_type_ids
                    .iter()
                    .map(|id| resolve(*id).unwrap_or_else(|| id.to_string()))
                    .collect();
            }
            DataTypeKind::Range {
                sub_type_id,
                sub_type,
                ..
            } if sub_type.is_none() => {
                *sub_type = resolve(*sub_type_id);
            }
            DataTypeKind::Domain {
                base_type_id,
                base_type,
                ..
            } if base_type.is_none() => {
                *base_type = resolve(*base_type_id);
            }
            _ => {}
        }
    }

    types.retain(|ty| ty.is_user_defined);
    types
}

pub fn map_sequences(raw: Vec<RawSequence>) -> Vec<Sequence> {
    raw.into_iter()
        .map(|row| Sequence {
            schema: row.schema_name,
            name: row.sequence_name,
            data_type: row.data_type,
            start_value: row.start_value,
            increment: row.increment_by,
            min_value: row.min_value,
            max_value: row.max_value,
            is_cycling: row.is_cycling,
            cache_size: row.cache_size,
            current_value: row.current_value,
            mapped: None,
        })
        .collect()
}

pub fn map_schemas(raw: Vec<RawSchema>) -> Vec<SchemaInfo> {
    raw.into_iter()
        .map(|row| SchemaInfo {
            name: row.schema_name,
            owner: row.owner,
            mapped: None,
        })
        .collect()
}

pub fn map_users(raw: Vec<RawUser>) -> Vec<User> {
    raw.into_iter()
        .map(|row| User {
            name: row.user_name,
            login: row.login,
            default_schema: row.default_schema,
            can_login: row.can_login,
            mapped: None,
        })
        .collect()
}

/// Strip the leading line breaks some catalogs keep in stored definitions.
pub fn trim_definition(definition: &str) -> String {
    definition
        .trim_start_matches(['\r', '\n'])
        .trim_end()
        .to_string()
}

/// Outcome counters of the attach phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttachStats {
    pub orphan_columns: usize,
    pub orphan_objects: usize,
}

/// Move columns into their tables, split primary keys out of the index list
/// and link keys, indexes, constraints and triggers to their tables.
pub fn attach(database: &mut Database, columns: Vec<Column>, indexes: Vec<Index>) -> AttachStats {
    let mut stats = AttachStats::default();
    let table_pos: HashMap<(String, String), usize> = database
        .tables
        .iter()
        .enumerate()
        .map(|(idx, table)| ((table.schema.clone(), table.name.clone()), idx))
        .collect();
    let locate = |schema: &str, name: &str| table_pos.get(&(schema.to_string(), name.to_string()));

    for column in columns {
        match locate(&column.table_schema, &column.table_name) {
            Some(idx) => database.tables[*idx].columns.push(column),
            None => stats.orphan_columns += 1,
        }
    }
    for table in &mut database.tables {
        table.columns.sort_by_key(|column| column.ordinal_position);
    }

    database.indexes.clear();
    for index in indexes {
        if index.is_primary_key {
            let is_clustered = index.is_clustered();
            database.primary_keys.push(PrimaryKey {
                table_schema: index.table_schema,
                table_name: index.table_name,
                name: index.name,
                column_names: index.column_names,
                column_descending: index.column_descending,
                is_clustered,
                mapped: None,
            });
        } else {
            database.indexes.push(index);
        }
    }

    for (idx, pk) in database.primary_keys.iter().enumerate() {
        match locate(&pk.table_schema, &pk.table_name) {
            Some(table) => database.tables[*table].primary_keys.push(idx),
            None => stats.orphan_objects += 1,
        }
    }

    for (idx, fk) in database.foreign_keys.iter().enumerate() {
        match locate(&fk.table_schema, &fk.table_name) {
            Some(table) => database.tables[*table].foreign_keys.push(idx),
            None => stats.orphan_objects += 1,
        }
        if let Some(table) = locate(&fk.referenced_table_schema, &fk.referenced_table_name) {
            database.tables[*table].referencing_foreign_keys.push(idx);
        }
    }

    for (idx, index) in database.indexes.iter().enumerate() {
        // View indexes are linked once views are read.
        if let Some(table) = locate(&index.table_schema, &index.table_name) {
            database.tables[*table].indexes.push(idx);
        }
    }

    for (idx, constraint) in database.constraints.iter().enumerate() {
        match locate(&constraint.table_schema, &constraint.table_name) {
            Some(table) => database.tables[*table].constraints.push(idx),
            None => stats.orphan_objects += 1,
        }
    }

    for (idx, trigger) in database.triggers.iter().enumerate() {
        // Database-level triggers have no owning table.
        if let Some(table) = locate(&trigger.table_schema, &trigger.table_name) {
            database.tables[*table].triggers.push(idx);
        }
    }

    stats
}

/// Link indexes declared on views (SQL Server indexed views, materialized views).
pub fn attach_view_indexes(database: &mut Database) {
    let view_pos: HashMap<(&str, &str), usize> = database
        .views
        .iter()
        .enumerate()
        .map(|(idx, view)| ((view.schema.as_str(), view.name.as_str()), idx))
        .collect();

    let links: Vec<(usize, usize)> = database
        .indexes
        .iter()
        .enumerate()
        .filter_map(|(idx, index)| {
            view_pos
                .get(&(index.table_schema.as_str(), index.table_name.as_str()))
                .map(|view| (*view, idx))
        })
        .collect();

    for (view, idx) in links {
        database.views[view].indexes.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_keep_first_seen_order_and_sort_members() {
        let rows = vec![("b", 2), ("a", 1), ("b", 1), ("a", 3), ("a", 2)];
        let groups = group_rows(rows, |row| row.0, |row| row.1);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![("b", 1), ("b", 2)]);
        assert_eq!(groups[1], vec![("a", 1), ("a", 2), ("a", 3)]);
    }

    #[test]
    fn trims_leading_line_breaks() {
        assert_eq!(
            trim_definition("\r\n\nCREATE TRIGGER t ON x\n"),
            "CREATE TRIGGER t ON x"
        );
    }

    #[test]
    fn foreign_key_arrays_follow_ordinal() {
        let row = |column: &str, referenced: &str, ordinal: i32| RawForeignKeyColumn {
            schema_name: "dbo".into(),
            table_name: "order_lines".into(),
            constraint_name: "fk_lines_orders".into(),
            column_name: column.into(),
            ordinal,
            referenced_schema: "dbo".into(),
            referenced_table: "orders".into(),
            referenced_column: referenced.into(),
            update_rule: "NO_ACTION".into(),
            delete_rule: "CASCADE".into(),
            ..RawForeignKeyColumn::default()
        };
        let fks = group_foreign_keys(vec![
            row("line_tenant", "tenant", 2),
            row("line_order", "id", 1),
            row("line_region", "region", 3),
        ]);

        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].column_names, vec!["line_order", "line_tenant", "line_region"]);
        assert_eq!(fks[0].referenced_column_names, vec!["id", "tenant", "region"]);
        assert_eq!(fks[0].on_delete, FkAction::Cascade);
    }
}
