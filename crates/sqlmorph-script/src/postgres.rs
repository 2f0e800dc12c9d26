//! PostgreSQL scripting.

use sqlmorph_core::{
    Column, ColumnExt, Constraint, ConstraintKind, DataType, DataTypeKind, Database, Dialect,
    Error, FkAction, ForeignKey, Function, IdentityGeneration, Index, IndexExt, PrimaryKey,
    Result, RoutineExt, SchemaInfo, Sequence, StoredProcedure, Table, TableExt, Trigger, User,
    View,
};

use crate::helper::{
    ScriptHelper, TypeClass, ZERO_UUID, classify, parenthesized, quoted_list,
    replace_create_keyword,
};
use crate::options::ScriptOptions;
use crate::scripter::{Counterparts, Scripter};
use crate::table::ordered_columns;

#[derive(Debug, Clone, Default)]
pub struct PostgresScripter {
    options: ScriptOptions,
}

impl PostgresScripter {
    pub fn new(options: ScriptOptions) -> Self {
        Self { options }
    }

    fn collation(&self, column: &Column) -> Option<String> {
        match &column.ext {
            ColumnExt::Postgres(ext) => ext
                .collation
                .as_deref()
                .map(|collation| self.quote_name(collation)),
            _ => None,
        }
    }

    fn deferrable(is_deferrable: bool, initially_deferred: bool) -> &'static str {
        match (is_deferrable, initially_deferred) {
            (true, true) => " DEFERRABLE INITIALLY DEFERRED",
            (true, false) => " DEFERRABLE",
            _ => "",
        }
    }

    fn sequence_clauses(&self, db: &Database, sequence: &Sequence) -> String {
        let mut out = String::new();
        if db.server_version.at_least(10, 0) {
            out.push_str(&format!(" AS {}", sequence.data_type));
        }
        out.push_str(&format!(" INCREMENT BY {}", sequence.increment));
        match sequence.min_value {
            Some(min) => out.push_str(&format!(" MINVALUE {min}")),
            None => out.push_str(" NO MINVALUE"),
        }
        match sequence.max_value {
            Some(max) => out.push_str(&format!(" MAXVALUE {max}")),
            None => out.push_str(" NO MAXVALUE"),
        }
        out.push_str(&format!(" START WITH {}", sequence.start_value));
        if let Some(cache) = sequence.cache_size {
            out.push_str(&format!(" CACHE {cache}"));
        }
        out.push_str(if sequence.is_cycling {
            " CYCLE"
        } else {
            " NO CYCLE"
        });
        out
    }

    fn trigger_state(&self, trigger: &Trigger) -> Option<String> {
        trigger.is_disabled.then(|| {
            format!(
                "ALTER TABLE {} DISABLE TRIGGER {}",
                self.object_name(&trigger.table_schema, &trigger.table_name),
                self.quote_name(&trigger.name)
            )
        })
    }

    fn routine_signature(&self, schema: &str, name: &str, ext: &RoutineExt) -> String {
        format!(
            "{}({})",
            self.object_name(schema, name),
            ext.signature().unwrap_or_default()
        )
    }

    /// `ALTER TYPE .. ADD VALUE` statements when every target label survives
    /// in the source in the same relative order.
    fn enum_additions(
        &self,
        name: &str,
        source: &[String],
        target: &[String],
    ) -> Option<Vec<String>> {
        let mut positions = Vec::with_capacity(target.len());
        for label in target {
            positions.push(source.iter().position(|candidate| candidate == label)?);
        }
        if positions.windows(2).any(|pair| pair[0] > pair[1]) {
            return None;
        }

        let mut statements = Vec::new();
        for (idx, label) in source.iter().enumerate() {
            if target.contains(label) {
                continue;
            }
            let placement = match idx.checked_sub(1).and_then(|prev| source.get(prev)) {
                Some(previous) => format!(" AFTER {}", self.escape_literal(previous)),
                None => match source.get(idx + 1) {
                    Some(next) => format!(" BEFORE {}", self.escape_literal(next)),
                    None => String::new(),
                },
            };
            statements.push(format!(
                "ALTER TYPE {name} ADD VALUE {}{placement}",
                self.escape_literal(label)
            ));
        }
        Some(statements)
    }
}

fn action_clause(keyword: &str, action: FkAction) -> String {
    match action {
        FkAction::NoAction => String::new(),
        other => format!(" {keyword} {}", other.as_sql()),
    }
}

impl ScriptHelper for PostgresScripter {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn quote_name(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn render_type(&self, column: &Column) -> String {
        match &column.ext {
            ColumnExt::Postgres(ext) if !ext.formatted_type.is_empty() => {
                ext.formatted_type.clone()
            }
            _ => column.data_type.clone(),
        }
    }

    fn default_literal(&self, data_type: &str) -> String {
        if data_type.ends_with("[]") || data_type.eq_ignore_ascii_case("array") {
            return "'{}'".to_string();
        }
        match classify(data_type) {
            TypeClass::Integer | TypeClass::Decimal | TypeClass::Float => "0".to_string(),
            TypeClass::Boolean => "false".to_string(),
            TypeClass::Date => "'1970-01-01'".to_string(),
            TypeClass::Time => "'00:00:00'".to_string(),
            TypeClass::DateTime => "'1970-01-01 00:00:00'".to_string(),
            TypeClass::Uuid => ZERO_UUID.to_string(),
            TypeClass::Json => "'{}'".to_string(),
            TypeClass::Text | TypeClass::Binary | TypeClass::Other => "''".to_string(),
        }
    }
}

impl Scripter for PostgresScripter {
    fn options(&self) -> &ScriptOptions {
        &self.options
    }

    /// Enum columns take their type's first label; `''` is not a valid value.
    fn backfill_literal(&self, db: &Database, column: &Column) -> String {
        let udt_schema = match &column.ext {
            ColumnExt::Postgres(ext) => ext.udt_schema.as_deref(),
            _ => None,
        };
        let first_label = db
            .data_types
            .iter()
            .filter(|ty| udt_schema.is_none_or(|schema| ty.schema == schema))
            .find(|ty| ty.name == column.data_type)
            .and_then(|ty| match &ty.kind {
                DataTypeKind::Enumerated { labels } => labels.first(),
                _ => None,
            });
        match first_label {
            Some(label) => self.escape_literal(label),
            None => self.default_literal(&column.data_type),
        }
    }

    fn script_column(&self, column: &Column, include_default: bool) -> String {
        let mut def = format!("{} {}", self.quote_name(&column.name), self.render_type(column));
        if let Some(collation) = self.collation(column) {
            def.push_str(&format!(" COLLATE {collation}"));
        }
        if let ColumnExt::Postgres(ext) = &column.ext {
            if let Some(expression) = &ext.generated {
                def.push_str(&format!(
                    " GENERATED ALWAYS AS {} STORED",
                    parenthesized(expression)
                ));
            }
            if let Some(identity) = ext.identity {
                let generation = match identity {
                    IdentityGeneration::Always => "ALWAYS",
                    IdentityGeneration::ByDefault => "BY DEFAULT",
                };
                def.push_str(&format!(" GENERATED {generation} AS IDENTITY"));
                if let Some(spec) = ext.identity_spec {
                    def.push_str(&format!(
                        " (START WITH {} INCREMENT BY {})",
                        spec.seed, spec.increment
                    ));
                }
            }
        }
        if !column.is_nullable {
            def.push_str(" NOT NULL");
        }
        if include_default
            && !column.is_generated()
            && !column.is_identity()
            && let Some(default) = &column.default
        {
            def.push_str(&format!(" DEFAULT {default}"));
        }
        def
    }

    fn script_add_column(&self, table: &str, column: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {table} ADD COLUMN {}",
            self.script_column(column, true)
        )]
    }

    fn script_drop_column(&self, table: &str, column: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {table} DROP COLUMN {}",
            self.quote_name(&column.name)
        )]
    }

    fn script_alter_column(&self, table: &str, source: &Column, target: &Column) -> Vec<String> {
        let name = self.quote_name(&source.name);
        let mut statements = Vec::new();

        let source_type = self.render_type(source);
        if source_type != self.render_type(target) || self.collation(source) != self.collation(target)
        {
            let mut sql = format!("ALTER TABLE {table} ALTER COLUMN {name} TYPE {source_type}");
            if let Some(collation) = self.collation(source) {
                sql.push_str(&format!(" COLLATE {collation}"));
            }
            sql.push_str(&format!(" USING {name}::{source_type}"));
            statements.push(sql);
        }
        if source.is_nullable != target.is_nullable {
            let change = if source.is_nullable { "DROP" } else { "SET" };
            statements.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {name} {change} NOT NULL"
            ));
        }
        statements
    }

    fn script_set_not_null(&self, table: &str, column: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {table} ALTER COLUMN {} SET NOT NULL",
            self.quote_name(&column.name)
        )]
    }

    fn script_add_default(&self, table: &str, column: &Column) -> Vec<String> {
        column
            .default
            .iter()
            .map(|default| {
                format!(
                    "ALTER TABLE {table} ALTER COLUMN {} SET DEFAULT {default}",
                    self.quote_name(&column.name)
                )
            })
            .collect()
    }

    fn script_drop_default(&self, table: &str, column: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {table} ALTER COLUMN {} DROP DEFAULT",
            self.quote_name(&column.name)
        )]
    }

    fn script_table_options(&self, source: &Table, target: &Table) -> Vec<String> {
        let (TableExt::Postgres(source_ext), TableExt::Postgres(target_ext)) =
            (&source.ext, &target.ext)
        else {
            return Vec::new();
        };
        let name = self.object_name(&target.schema, &target.name);
        let mut statements = Vec::new();
        if source_ext.is_unlogged != target_ext.is_unlogged {
            let mode = if source_ext.is_unlogged {
                "UNLOGGED"
            } else {
                "LOGGED"
            };
            statements.push(format!("ALTER TABLE {name} SET {mode}"));
        }
        if source_ext.tablespace != target_ext.tablespace {
            let tablespace = source_ext.tablespace.as_deref().unwrap_or("pg_default");
            statements.push(format!(
                "ALTER TABLE {name} SET TABLESPACE {}",
                self.quote_name(tablespace)
            ));
        }
        for (schema, parent) in &target_ext.inherits {
            if !source_ext.inherits.contains(&(schema.clone(), parent.clone())) {
                statements.push(format!(
                    "ALTER TABLE {name} NO INHERIT {}",
                    self.object_name(schema, parent)
                ));
            }
        }
        for (schema, parent) in &source_ext.inherits {
            if !target_ext.inherits.contains(&(schema.clone(), parent.clone())) {
                statements.push(format!(
                    "ALTER TABLE {name} INHERIT {}",
                    self.object_name(schema, parent)
                ));
            }
        }
        statements
    }

    fn script_create_schema(&self, _db: &Database, schema: &SchemaInfo) -> Result<String> {
        let mut sql = format!("CREATE SCHEMA IF NOT EXISTS {}", self.quote_name(&schema.name));
        if let Some(owner) = &schema.owner {
            sql.push_str(&format!(" AUTHORIZATION {}", self.quote_name(owner)));
        }
        Ok(self.unit(&[sql]))
    }

    fn script_drop_schema(&self, _db: &Database, schema: &SchemaInfo) -> Result<String> {
        Ok(self.unit(&[format!("DROP SCHEMA {}", self.quote_name(&schema.name))]))
    }

    fn script_alter_schema(&self, pair: Counterparts<'_, SchemaInfo>) -> Result<String> {
        let Some(owner) = &pair.source.owner else {
            return Ok(String::new());
        };
        Ok(self.unit(&[format!(
            "ALTER SCHEMA {} OWNER TO {}",
            self.quote_name(&pair.source.name),
            self.quote_name(owner)
        )]))
    }

    fn script_create_user(&self, _db: &Database, user: &User) -> Result<String> {
        Ok(self.unit(&[format!(
            "CREATE ROLE {} {}",
            self.quote_name(&user.name),
            if user.can_login { "LOGIN" } else { "NOLOGIN" }
        )]))
    }

    fn script_drop_user(&self, _db: &Database, user: &User) -> Result<String> {
        Ok(self.unit(&[format!("DROP ROLE {}", self.quote_name(&user.name))]))
    }

    fn script_alter_user(&self, pair: Counterparts<'_, User>) -> Result<String> {
        Ok(self.unit(&[format!(
            "ALTER ROLE {} {}",
            self.quote_name(&pair.source.name),
            if pair.source.can_login {
                "LOGIN"
            } else {
                "NOLOGIN"
            }
        )]))
    }

    fn script_create_data_type(&self, _db: &Database, data_type: &DataType) -> Result<String> {
        let name = self.object_name(&data_type.schema, &data_type.name);
        let sql = match &data_type.kind {
            DataTypeKind::Enumerated { labels } => format!(
                "CREATE TYPE {name} AS ENUM ({})",
                labels
                    .iter()
                    .map(|label| self.escape_literal(label))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            DataTypeKind::Composite {
                attribute_names,
                attribute_types,
                ..
            } => format!(
                "CREATE TYPE {name} AS ({})",
                attribute_names
                    .iter()
                    .zip(attribute_types)
                    .map(|(attribute, ty)| format!("{} {ty}", self.quote_name(attribute)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            DataTypeKind::Range {
                sub_type,
                canonical,
                sub_type_diff,
                ..
            } => {
                let sub_type = sub_type.as_deref().ok_or_else(|| {
                    Error::InvalidSchema(format!("range type {name} has no subtype"))
                })?;
                let mut options = vec![format!("SUBTYPE = {sub_type}")];
                if let Some(canonical) = canonical {
                    options.push(format!("CANONICAL = {canonical}"));
                }
                if let Some(diff) = sub_type_diff {
                    options.push(format!("SUBTYPE_DIFF = {diff}"));
                }
                format!("CREATE TYPE {name} AS RANGE ({})", options.join(", "))
            }
            DataTypeKind::Domain {
                base_type,
                constraint,
                not_null,
                default,
                ..
            } => {
                let base_type = base_type.as_deref().ok_or_else(|| {
                    Error::InvalidSchema(format!("domain {name} has no base type"))
                })?;
                let mut sql = format!("CREATE DOMAIN {name} AS {base_type}");
                if let Some(default) = default {
                    sql.push_str(&format!(" DEFAULT {default}"));
                }
                if *not_null {
                    sql.push_str(" NOT NULL");
                }
                if let Some(constraint) = constraint {
                    sql.push_str(&format!(" {constraint}"));
                }
                sql
            }
            DataTypeKind::Base | DataTypeKind::Alias { .. } | DataTypeKind::TableType { .. } => {
                return Err(Error::unsupported(
                    Dialect::Postgres,
                    format!("type {name} of this kind"),
                ));
            }
        };
        Ok(self.unit(&[sql]))
    }

    fn script_drop_data_type(&self, _db: &Database, data_type: &DataType) -> Result<String> {
        let keyword = match data_type.kind {
            DataTypeKind::Domain { .. } => "DOMAIN",
            _ => "TYPE",
        };
        Ok(self.unit(&[format!(
            "DROP {keyword} {}",
            self.object_name(&data_type.schema, &data_type.name)
        )]))
    }

    fn script_alter_data_type(&self, pair: Counterparts<'_, DataType>) -> Result<String> {
        if let (
            DataTypeKind::Enumerated { labels: source },
            DataTypeKind::Enumerated { labels: target },
        ) = (&pair.source.kind, &pair.target.kind)
        {
            let name = self.object_name(&pair.target.schema, &pair.target.name);
            if let Some(statements) = self.enum_additions(&name, source, target) {
                return Ok(self.unit(&statements));
            }
        }
        Ok(self.script_drop_data_type(pair.target_db, pair.target)?
            + &self.script_create_data_type(pair.source_db, pair.source)?)
    }

    fn script_create_sequence(&self, db: &Database, sequence: &Sequence) -> Result<String> {
        Ok(self.unit(&[format!(
            "CREATE SEQUENCE {}{}",
            self.object_name(&sequence.schema, &sequence.name),
            self.sequence_clauses(db, sequence)
        )]))
    }

    /// Sequences owned by a serial column go with their table.
    fn script_drop_sequence(&self, _db: &Database, sequence: &Sequence) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP SEQUENCE IF EXISTS {}",
            self.object_name(&sequence.schema, &sequence.name)
        )]))
    }

    fn script_alter_sequence(&self, pair: Counterparts<'_, Sequence>) -> Result<String> {
        let (source, target) = (pair.source, pair.target);
        let mut sql = format!(
            "ALTER SEQUENCE {}{}",
            self.object_name(&target.schema, &target.name),
            self.sequence_clauses(pair.target_db, source)
        );
        if source.start_value != target.start_value {
            sql.push_str(&format!(" RESTART WITH {}", source.start_value));
        }
        Ok(self.unit(&[sql]))
    }

    fn script_create_table(
        &self,
        _db: &Database,
        table: &Table,
        reference: Option<&Table>,
    ) -> Result<String> {
        let name = self.object_name(&table.schema, &table.name);
        let columns: Vec<String> = ordered_columns(table, reference, &self.options)
            .into_iter()
            .map(|column| format!("    {}", self.script_column(column, true)))
            .collect();

        let (unlogged, suffix) = match &table.ext {
            TableExt::Postgres(ext) => {
                let mut suffix = String::new();
                if !ext.inherits.is_empty() {
                    let parents: Vec<String> = ext
                        .inherits
                        .iter()
                        .map(|(schema, parent)| self.object_name(schema, parent))
                        .collect();
                    suffix.push_str(&format!(" INHERITS ({})", parents.join(", ")));
                }
                if let Some(key) = &ext.partition_key {
                    suffix.push_str(&format!(" PARTITION BY {key}"));
                }
                if let Some(tablespace) = &ext.tablespace {
                    suffix.push_str(&format!(" TABLESPACE {}", self.quote_name(tablespace)));
                }
                (ext.is_unlogged, suffix)
            }
            _ => (false, String::new()),
        };

        Ok(self.unit(&[format!(
            "CREATE {}TABLE {name} (\n{}\n){suffix}",
            if unlogged { "UNLOGGED " } else { "" },
            columns.join(",\n")
        )]))
    }

    fn script_drop_table(&self, _db: &Database, table: &Table) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP TABLE {}",
            self.object_name(&table.schema, &table.name)
        )]))
    }

    fn script_create_primary_key(&self, _db: &Database, key: &PrimaryKey) -> Result<String> {
        Ok(self.unit(&[format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            self.object_name(&key.table_schema, &key.table_name),
            self.quote_name(&key.name),
            quoted_list(self, &key.column_names)
        )]))
    }

    fn script_drop_primary_key(&self, _db: &Database, key: &PrimaryKey) -> Result<String> {
        Ok(self.unit(&[format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.object_name(&key.table_schema, &key.table_name),
            self.quote_name(&key.name)
        )]))
    }

    fn script_create_foreign_key(&self, _db: &Database, key: &ForeignKey) -> Result<String> {
        Ok(self.unit(&[format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}{}{}",
            self.object_name(&key.table_schema, &key.table_name),
            self.quote_name(&key.name),
            quoted_list(self, &key.column_names),
            self.object_name(&key.referenced_table_schema, &key.referenced_table_name),
            quoted_list(self, &key.referenced_column_names),
            action_clause("ON DELETE", key.on_delete),
            action_clause("ON UPDATE", key.on_update),
            Self::deferrable(key.is_deferrable, key.initially_deferred),
        )]))
    }

    fn script_drop_foreign_key(&self, _db: &Database, key: &ForeignKey) -> Result<String> {
        Ok(self.unit(&[format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.object_name(&key.table_schema, &key.table_name),
            self.quote_name(&key.name)
        )]))
    }

    fn script_create_constraint(&self, _db: &Database, constraint: &Constraint) -> Result<String> {
        let table = self.object_name(&constraint.table_schema, &constraint.table_name);
        let name = self.quote_name(&constraint.name);
        let sql = match constraint.kind {
            ConstraintKind::Check => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} CHECK {}",
                parenthesized(constraint.definition.as_deref().unwrap_or("true"))
            ),
            ConstraintKind::Unique => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} UNIQUE ({}){}",
                quoted_list(self, &constraint.column_names),
                Self::deferrable(constraint.is_deferrable, constraint.initially_deferred)
            ),
            ConstraintKind::Default => {
                let (Some(column), Some(definition)) =
                    (constraint.column_names.first(), &constraint.definition)
                else {
                    return Err(Error::InvalidSchema(format!(
                        "default {name} has no column or value"
                    )));
                };
                format!(
                    "ALTER TABLE {table} ALTER COLUMN {} SET DEFAULT {definition}",
                    self.quote_name(column)
                )
            }
        };
        Ok(self.unit(&[sql]))
    }

    fn script_drop_constraint(&self, _db: &Database, constraint: &Constraint) -> Result<String> {
        let table = self.object_name(&constraint.table_schema, &constraint.table_name);
        let sql = match (constraint.kind, constraint.column_names.first()) {
            (ConstraintKind::Default, Some(column)) => format!(
                "ALTER TABLE {table} ALTER COLUMN {} DROP DEFAULT",
                self.quote_name(column)
            ),
            _ => format!(
                "ALTER TABLE {table} DROP CONSTRAINT {}",
                self.quote_name(&constraint.name)
            ),
        };
        Ok(self.unit(&[sql]))
    }

    fn script_create_function(&self, _db: &Database, function: &Function) -> Result<String> {
        Ok(self.definition_unit(&function.definition))
    }

    fn script_drop_function(&self, _db: &Database, function: &Function) -> Result<String> {
        let keyword = match &function.ext {
            RoutineExt::Postgres(routine) if routine.is_aggregate => "AGGREGATE",
            _ => "FUNCTION",
        };
        Ok(self.unit(&[format!(
            "DROP {keyword} {}",
            self.routine_signature(&function.schema, &function.name, &function.ext)
        )]))
    }

    /// `CREATE OR REPLACE` keeps grants and dependants, but cannot change the
    /// return type.
    fn script_alter_function(&self, pair: Counterparts<'_, Function>) -> Result<String> {
        let return_type = |function: &Function| match &function.ext {
            RoutineExt::Postgres(routine) => routine.return_type.clone(),
            RoutineExt::None => None,
        };
        if return_type(pair.source) != return_type(pair.target) {
            return Ok(self.script_drop_function(pair.target_db, pair.target)?
                + &self.script_create_function(pair.source_db, pair.source)?);
        }
        Ok(self.definition_unit(&replace_create_keyword(
            &pair.source.definition,
            "CREATE OR REPLACE",
        )))
    }

    fn script_create_stored_procedure(
        &self,
        _db: &Database,
        procedure: &StoredProcedure,
    ) -> Result<String> {
        Err(Error::unsupported(
            Dialect::Postgres,
            format!("stored procedure {}", procedure.name),
        ))
    }

    fn script_drop_stored_procedure(
        &self,
        _db: &Database,
        procedure: &StoredProcedure,
    ) -> Result<String> {
        Err(Error::unsupported(
            Dialect::Postgres,
            format!("stored procedure {}", procedure.name),
        ))
    }

    fn script_create_view(&self, _db: &Database, view: &View) -> Result<String> {
        Ok(self.definition_unit(&view.definition))
    }

    fn script_drop_view(&self, _db: &Database, view: &View) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP {}VIEW {}",
            if view.is_materialized {
                "MATERIALIZED "
            } else {
                ""
            },
            self.object_name(&view.schema, &view.name)
        )]))
    }

    fn script_alter_view(&self, pair: Counterparts<'_, View>) -> Result<String> {
        if pair.source.is_materialized || pair.target.is_materialized {
            return Ok(self.script_drop_view(pair.target_db, pair.target)?
                + &self.script_create_view(pair.source_db, pair.source)?);
        }
        Ok(self.definition_unit(&replace_create_keyword(
            &pair.source.definition,
            "CREATE OR REPLACE",
        )))
    }

    fn script_create_index(&self, _db: &Database, index: &Index) -> Result<String> {
        let ext = match &index.ext {
            IndexExt::Postgres(ext) => ext.clone(),
            _ => Default::default(),
        };
        if let Some(definition) = &ext.definition {
            return Ok(self.unit(&[definition.clone()]));
        }

        let mut sql = format!(
            "CREATE {}INDEX {} ON {}",
            if index.is_unique { "UNIQUE " } else { "" },
            self.quote_name(&index.name),
            self.object_name(&index.table_schema, &index.table_name)
        );
        if !ext.method.is_empty() && !ext.method.eq_ignore_ascii_case("btree") {
            sql.push_str(&format!(" USING {}", ext.method));
        }
        let keys: Vec<String> = index
            .column_names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let descending = index.column_descending.get(idx).copied().unwrap_or(false);
                format!(
                    "{}{}",
                    self.quote_name(name),
                    if descending { " DESC" } else { "" }
                )
            })
            .collect();
        sql.push_str(&format!(" ({})", keys.join(", ")));
        if !ext.included_columns.is_empty() {
            sql.push_str(&format!(
                " INCLUDE ({})",
                quoted_list(self, &ext.included_columns)
            ));
        }
        if let Some(predicate) = &ext.predicate {
            sql.push_str(&format!(" WHERE {predicate}"));
        }
        Ok(self.unit(&[sql]))
    }

    fn script_drop_index(&self, _db: &Database, index: &Index) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP INDEX {}",
            self.object_name(&index.table_schema, &index.name)
        )]))
    }

    fn script_create_trigger(&self, _db: &Database, trigger: &Trigger) -> Result<String> {
        let mut statements = vec![trigger.definition.clone()];
        statements.extend(self.trigger_state(trigger));
        Ok(self.unit(&statements))
    }

    fn script_drop_trigger(&self, _db: &Database, trigger: &Trigger) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP TRIGGER {} ON {}",
            self.quote_name(&trigger.name),
            self.object_name(&trigger.table_schema, &trigger.table_name)
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlmorph_core::{IdentitySpec, PostgresColumn, PostgresRoutine, ServerVersion};

    fn scripter() -> PostgresScripter {
        PostgresScripter::new(ScriptOptions::default())
    }

    fn db() -> Database {
        Database::new("app", Dialect::Postgres)
    }

    #[test]
    fn identity_columns_omit_their_default() {
        let column = Column {
            table_schema: "public".into(),
            table_name: "users".into(),
            name: "id".into(),
            data_type: "bigint".into(),
            default: Some("nextval('users_id_seq'::regclass)".into()),
            ext: ColumnExt::Postgres(PostgresColumn {
                formatted_type: "bigint".into(),
                identity: Some(IdentityGeneration::ByDefault),
                identity_spec: Some(IdentitySpec {
                    seed: 1,
                    increment: 1,
                }),
                ..PostgresColumn::default()
            }),
            ..Column::default()
        };
        assert_eq!(
            scripter().script_column(&column, true),
            "\"id\" bigint GENERATED BY DEFAULT AS IDENTITY (START WITH 1 INCREMENT BY 1) NOT NULL"
        );
    }

    #[test]
    fn enum_labels_are_added_in_place() {
        let enum_type = |labels: &[&str]| DataType {
            schema: "public".into(),
            name: "mood".into(),
            is_user_defined: true,
            kind: DataTypeKind::Enumerated {
                labels: labels.iter().map(|label| label.to_string()).collect(),
            },
            ..DataType::default()
        };
        let database = db();
        let source = enum_type(&["sad", "ok", "happy"]);
        let target = enum_type(&["sad", "happy"]);
        let script = scripter()
            .script_alter_data_type(Counterparts {
                source_db: &database,
                source: &source,
                target_db: &database,
                target: &target,
            })
            .unwrap();
        assert_eq!(
            script,
            "ALTER TYPE \"public\".\"mood\" ADD VALUE 'ok' AFTER 'sad';\n"
        );

        let reordered = enum_type(&["happy", "sad"]);
        let script = scripter()
            .script_alter_data_type(Counterparts {
                source_db: &database,
                source: &source,
                target_db: &database,
                target: &reordered,
            })
            .unwrap();
        assert!(script.starts_with("DROP TYPE \"public\".\"mood\";\n"));
    }

    #[test]
    fn sequence_type_clause_follows_server_version() {
        let sequence = Sequence {
            schema: "public".into(),
            name: "order_no".into(),
            data_type: "bigint".into(),
            start_value: 1,
            increment: 1,
            min_value: Some(1),
            max_value: None,
            ..Sequence::default()
        };
        let modern = scripter().script_create_sequence(&db(), &sequence).unwrap();
        assert!(modern.contains(" AS bigint INCREMENT BY 1"));

        let mut old = db();
        old.server_version = ServerVersion::new(9, 6, 0);
        let legacy = scripter().script_create_sequence(&old, &sequence).unwrap();
        assert_eq!(
            legacy,
            "CREATE SEQUENCE \"public\".\"order_no\" INCREMENT BY 1 MINVALUE 1 NO MAXVALUE START WITH 1 NO CYCLE;\n"
        );
    }

    #[test]
    fn functions_drop_by_identity_arguments() {
        let function = Function {
            schema: "public".into(),
            name: "total".into(),
            definition: "CREATE OR REPLACE FUNCTION public.total(a integer)".into(),
            ext: RoutineExt::Postgres(PostgresRoutine {
                argument_names: vec!["a".into(), "result".into()],
                argument_modes: vec!["i".into(), "o".into()],
                argument_types: vec!["integer".into(), "bigint".into()],
                ..PostgresRoutine::default()
            }),
            ..Function::default()
        };
        assert_eq!(
            scripter().script_drop_function(&db(), &function).unwrap(),
            "DROP FUNCTION \"public\".\"total\"(integer);\n"
        );
    }

    #[test]
    fn stored_procedures_are_unsupported() {
        let procedure = StoredProcedure {
            schema: "public".into(),
            name: "archive".into(),
            ..StoredProcedure::default()
        };
        let err = scripter()
            .script_create_stored_procedure(&db(), &procedure)
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(message) if message.contains("postgres")));
    }

    #[test]
    fn non_btree_partial_index() {
        let index = Index {
            table_schema: "public".into(),
            table_name: "events".into(),
            name: "events_payload_idx".into(),
            column_names: vec!["payload".into()],
            ext: IndexExt::Postgres(sqlmorph_core::PostgresIndex {
                method: "gin".into(),
                predicate: Some("(archived = false)".into()),
                ..Default::default()
            }),
            ..Index::default()
        };
        assert_eq!(
            scripter().script_create_index(&db(), &index).unwrap(),
            "CREATE INDEX \"events_payload_idx\" ON \"public\".\"events\" USING gin (\"payload\") WHERE (archived = false);\n"
        );
        assert_eq!(
            scripter().script_drop_index(&db(), &index).unwrap(),
            "DROP INDEX \"public\".\"events_payload_idx\";\n"
        );
    }
}
