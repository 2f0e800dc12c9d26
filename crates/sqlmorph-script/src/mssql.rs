//! SQL Server scripting: bracket quoting, `GO` batches, named default
//! constraints and in-place `ALTER` of module definitions.

use sqlmorph_core::{
    Column, ColumnExt, Constraint, ConstraintKind, DataType, DataTypeKind, Database, Dialect,
    Error, FkAction, ForeignKey, Function, Index, IndexExt, PrimaryKey, Result, SchemaInfo,
    Sequence, StoredProcedure, Table, TableExt, Trigger, User, View,
};

use crate::helper::{
    ScriptHelper, TypeClass, ZERO_UUID, classify, parenthesized, quoted_list,
    replace_create_keyword,
};
use crate::options::ScriptOptions;
use crate::scripter::{Counterparts, Scripter};
use crate::table::ordered_columns;

#[derive(Debug, Clone, Default)]
pub struct MssqlScripter {
    options: ScriptOptions,
}

impl MssqlScripter {
    pub fn new(options: ScriptOptions) -> Self {
        Self { options }
    }

    fn key_columns(&self, names: &[String], descending: &[bool]) -> String {
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let order = if descending.get(idx).copied().unwrap_or(false) {
                    "DESC"
                } else {
                    "ASC"
                };
                format!("{} {order}", self.quote_name(name))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Column spelling accepted by `ALTER COLUMN`: type, collation, nullability.
    fn alter_body(&self, column: &Column) -> String {
        let mut body = format!("{} {}", self.quote_name(&column.name), self.render_type(column));
        if let ColumnExt::SqlServer(ext) = &column.ext
            && let Some(collation) = &ext.collation
        {
            body.push_str(&format!(" COLLATE {collation}"));
        }
        body.push_str(nullability(column.is_nullable));
        body
    }

    fn module(&self, definition: &str, disabled: Option<String>) -> String {
        let mut out = self.definition_unit(definition);
        if let Some(statement) = disabled {
            out.push_str(&self.unit(&[statement]));
        }
        out
    }

    fn trigger_state(&self, trigger: &Trigger) -> Option<String> {
        trigger.is_disabled.then(|| {
            format!(
                "DISABLE TRIGGER {} ON {}",
                self.object_name(&trigger.schema, &trigger.name),
                self.object_name(&trigger.table_schema, &trigger.table_name)
            )
        })
    }
}

fn nullability(nullable: bool) -> &'static str {
    if nullable { " NULL" } else { " NOT NULL" }
}

/// `base`, plus the length, precision or scale the type takes.
fn sized_type(
    base: &str,
    max_length: Option<i64>,
    precision: Option<i32>,
    scale: Option<i32>,
) -> String {
    match base.to_ascii_lowercase().as_str() {
        "varchar" | "char" | "varbinary" | "binary" | "nvarchar" | "nchar" => match max_length {
            Some(-1) => format!("{base}(max)"),
            Some(length) => format!("{base}({length})"),
            None => base.to_string(),
        },
        "decimal" | "numeric" => match (precision, scale) {
            (Some(precision), Some(scale)) => format!("{base}({precision}, {scale})"),
            (Some(precision), None) => format!("{base}({precision})"),
            _ => base.to_string(),
        },
        "datetime2" | "time" | "datetimeoffset" => match scale {
            Some(scale) => format!("{base}({scale})"),
            None => base.to_string(),
        },
        _ => base.to_string(),
    }
}

fn action_clause(keyword: &str, action: FkAction) -> String {
    match action {
        // SQL Server spells RESTRICT as NO ACTION.
        FkAction::NoAction | FkAction::Restrict => String::new(),
        other => format!(" {keyword} {}", other.as_sql()),
    }
}

impl ScriptHelper for MssqlScripter {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn quote_name(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn render_type(&self, column: &Column) -> String {
        if column.is_user_defined_type {
            let schema = match &column.ext {
                ColumnExt::SqlServer(ext) => ext.type_schema.as_deref().unwrap_or("dbo"),
                _ => "dbo",
            };
            return self.object_name(schema, &column.data_type);
        }
        sized_type(
            &column.data_type,
            column.max_length,
            column.precision,
            column.scale,
        )
    }

    fn batch_terminator(&self) -> Option<&'static str> {
        Some("GO")
    }

    fn default_literal(&self, data_type: &str) -> String {
        match classify(data_type) {
            TypeClass::Integer | TypeClass::Decimal | TypeClass::Float | TypeClass::Boolean => {
                "0".to_string()
            }
            TypeClass::Binary => "0x".to_string(),
            TypeClass::Date => "'1900-01-01'".to_string(),
            TypeClass::Time => "'00:00:00'".to_string(),
            TypeClass::DateTime => "'1900-01-01T00:00:00'".to_string(),
            TypeClass::Uuid => ZERO_UUID.to_string(),
            TypeClass::Text | TypeClass::Json | TypeClass::Other => "N''".to_string(),
        }
    }

    fn escape_literal(&self, value: &str) -> String {
        format!("N'{}'", value.replace('\'', "''"))
    }
}

impl Scripter for MssqlScripter {
    fn options(&self) -> &ScriptOptions {
        &self.options
    }

    fn default_survives_alter(&self) -> bool {
        false
    }

    /// Module definitions must start their batch and keep their text as stored.
    fn definition_unit(&self, definition: &str) -> String {
        let mut out = format!("{}\n", definition.trim_end());
        if let Some(separator) = self.batch_separator() {
            out.push_str(separator);
            out.push('\n');
        }
        out
    }

    fn script_column(&self, column: &Column, include_default: bool) -> String {
        let name = self.quote_name(&column.name);
        let ext = match &column.ext {
            ColumnExt::SqlServer(ext) => Some(ext),
            _ => None,
        };

        if let Some(computed) = ext.and_then(|ext| ext.computed.as_ref()) {
            let mut def = format!("{name} AS {computed}");
            if ext.is_some_and(|ext| ext.is_persisted) {
                def.push_str(" PERSISTED");
                if !column.is_nullable {
                    def.push_str(" NOT NULL");
                }
            }
            return def;
        }

        let mut def = format!("{name} {}", self.render_type(column));
        if let Some(ext) = ext {
            if let Some(collation) = &ext.collation {
                def.push_str(&format!(" COLLATE {collation}"));
            }
            if let Some(period) = &ext.generated_always {
                def.push_str(&format!(" GENERATED ALWAYS AS {period}"));
                if ext.is_hidden {
                    def.push_str(" HIDDEN");
                }
            }
            if let Some(identity) = &ext.identity {
                def.push_str(&format!(
                    " IDENTITY({}, {})",
                    identity.seed, identity.increment
                ));
            }
            if ext.is_rowguidcol {
                def.push_str(" ROWGUIDCOL");
            }
        }
        def.push_str(nullability(column.is_nullable));

        if include_default && let Some(default) = &column.default {
            match column.declared_default_name() {
                Some(constraint) => def.push_str(&format!(
                    " CONSTRAINT {} DEFAULT {default}",
                    self.quote_name(constraint)
                )),
                None => def.push_str(&format!(" DEFAULT {default}")),
            }
        }
        def
    }

    fn script_add_column(&self, table: &str, column: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {table} ADD {}",
            self.script_column(column, true)
        )]
    }

    fn script_drop_column(&self, table: &str, column: &Column) -> Vec<String> {
        let mut statements = self.script_drop_default(table, column);
        statements.push(format!(
            "ALTER TABLE {table} DROP COLUMN {}",
            self.quote_name(&column.name)
        ));
        statements
    }

    fn script_alter_column(&self, table: &str, source: &Column, _target: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {table} ALTER COLUMN {}",
            self.alter_body(source)
        )]
    }

    fn script_set_not_null(&self, table: &str, column: &Column) -> Vec<String> {
        let not_null = Column {
            is_nullable: false,
            ..column.clone()
        };
        vec![format!(
            "ALTER TABLE {table} ALTER COLUMN {}",
            self.alter_body(&not_null)
        )]
    }

    fn script_add_default(&self, table: &str, column: &Column) -> Vec<String> {
        let Some(default) = &column.default else {
            return Vec::new();
        };
        let name = self.quote_name(&column.name);
        match column.declared_default_name() {
            Some(constraint) => vec![format!(
                "ALTER TABLE {table} ADD CONSTRAINT {} DEFAULT {default} FOR {name}",
                self.quote_name(constraint)
            )],
            None => vec![format!("ALTER TABLE {table} ADD DEFAULT {default} FOR {name}")],
        }
    }

    fn script_drop_default(&self, table: &str, column: &Column) -> Vec<String> {
        column
            .default_constraint_name
            .iter()
            .map(|constraint| {
                format!(
                    "ALTER TABLE {table} DROP CONSTRAINT {}",
                    self.quote_name(constraint)
                )
            })
            .collect()
    }

    /// Schemas outlive the full drop script, so creation is guarded.
    fn script_create_schema(&self, _db: &Database, schema: &SchemaInfo) -> Result<String> {
        let mut create = format!("CREATE SCHEMA {}", self.quote_name(&schema.name));
        if let Some(owner) = schema.owner.as_deref().filter(|owner| *owner != "dbo") {
            create.push_str(&format!(" AUTHORIZATION {}", self.quote_name(owner)));
        }
        Ok(self.unit(&[format!(
            "IF SCHEMA_ID({}) IS NULL EXEC({})",
            self.escape_literal(&schema.name),
            self.escape_literal(&create)
        )]))
    }

    fn script_drop_schema(&self, _db: &Database, schema: &SchemaInfo) -> Result<String> {
        Ok(self.unit(&[format!("DROP SCHEMA {}", self.quote_name(&schema.name))]))
    }

    fn script_alter_schema(&self, pair: Counterparts<'_, SchemaInfo>) -> Result<String> {
        let owner = pair.source.owner.as_deref().unwrap_or("dbo");
        Ok(self.unit(&[format!(
            "ALTER AUTHORIZATION ON SCHEMA::{} TO {}",
            self.quote_name(&pair.source.name),
            self.quote_name(owner)
        )]))
    }

    fn script_create_user(&self, _db: &Database, user: &User) -> Result<String> {
        let mut sql = format!("CREATE USER {}", self.quote_name(&user.name));
        match &user.login {
            Some(login) => sql.push_str(&format!(" FOR LOGIN {}", self.quote_name(login))),
            None => sql.push_str(" WITHOUT LOGIN"),
        }
        if let Some(schema) = &user.default_schema {
            sql.push_str(&format!(" WITH DEFAULT_SCHEMA = {}", self.quote_name(schema)));
        }
        Ok(self.unit(&[sql]))
    }

    fn script_drop_user(&self, _db: &Database, user: &User) -> Result<String> {
        Ok(self.unit(&[format!("DROP USER {}", self.quote_name(&user.name))]))
    }

    fn script_alter_user(&self, pair: Counterparts<'_, User>) -> Result<String> {
        let mut options = Vec::new();
        if let Some(schema) = &pair.source.default_schema {
            options.push(format!("DEFAULT_SCHEMA = {}", self.quote_name(schema)));
        }
        if let Some(login) = pair.source.login.as_ref().filter(|_| pair.target.login.is_some()) {
            options.push(format!("LOGIN = {}", self.quote_name(login)));
        }
        if options.is_empty() || pair.source.login.is_some() != pair.target.login.is_some() {
            return Ok(self.script_drop_user(pair.target_db, pair.target)?
                + &self.script_create_user(pair.source_db, pair.source)?);
        }
        Ok(self.unit(&[format!(
            "ALTER USER {} WITH {}",
            self.quote_name(&pair.source.name),
            options.join(", ")
        )]))
    }

    fn script_create_data_type(&self, _db: &Database, data_type: &DataType) -> Result<String> {
        let name = self.object_name(&data_type.schema, &data_type.name);
        let sql = match &data_type.kind {
            DataTypeKind::Alias {
                max_length,
                precision,
                scale,
                is_nullable,
            } => {
                let base = data_type.system_type.as_deref().ok_or_else(|| {
                    Error::InvalidSchema(format!("alias type {name} has no base type"))
                })?;
                format!(
                    "CREATE TYPE {name} FROM {}{}",
                    sized_type(base, *max_length, *precision, *scale),
                    nullability(*is_nullable)
                )
            }
            DataTypeKind::TableType { definition } => {
                format!("CREATE TYPE {name} AS TABLE (\n    {definition}\n)")
            }
            other => {
                return Err(Error::unsupported(
                    Dialect::SqlServer,
                    format!("{} type {name}", kind_label(other)),
                ));
            }
        };
        Ok(self.unit(&[sql]))
    }

    fn script_drop_data_type(&self, _db: &Database, data_type: &DataType) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP TYPE {}",
            self.object_name(&data_type.schema, &data_type.name)
        )]))
    }

    fn script_create_sequence(&self, db: &Database, sequence: &Sequence) -> Result<String> {
        if !db.capabilities().sequences {
            return Err(Error::unsupported(
                Dialect::SqlServer,
                format!("sequences before SQL Server 2012 ({})", db.server_version),
            ));
        }
        let mut sql = format!(
            "CREATE SEQUENCE {} AS {} START WITH {} INCREMENT BY {}",
            self.object_name(&sequence.schema, &sequence.name),
            sequence.data_type,
            sequence.start_value,
            sequence.increment
        );
        sql.push_str(&sequence_bounds(sequence));
        Ok(self.unit(&[sql]))
    }

    fn script_drop_sequence(&self, _db: &Database, sequence: &Sequence) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP SEQUENCE {}",
            self.object_name(&sequence.schema, &sequence.name)
        )]))
    }

    fn script_alter_sequence(&self, pair: Counterparts<'_, Sequence>) -> Result<String> {
        let (source, target) = (pair.source, pair.target);
        if source.data_type != target.data_type {
            return Ok(self.script_drop_sequence(pair.target_db, target)?
                + &self.script_create_sequence(pair.source_db, source)?);
        }
        let mut sql = format!(
            "ALTER SEQUENCE {}",
            self.object_name(&target.schema, &target.name)
        );
        if source.start_value != target.start_value {
            sql.push_str(&format!(" RESTART WITH {}", source.start_value));
        }
        sql.push_str(&format!(" INCREMENT BY {}", source.increment));
        sql.push_str(&sequence_bounds(source));
        Ok(self.unit(&[sql]))
    }

    fn script_create_table(
        &self,
        _db: &Database,
        table: &Table,
        reference: Option<&Table>,
    ) -> Result<String> {
        let name = self.object_name(&table.schema, &table.name);
        let mut lines: Vec<String> = ordered_columns(table, reference, &self.options)
            .into_iter()
            .map(|column| format!("    {}", self.script_column(column, true)))
            .collect();

        let mut options = String::new();
        if let TableExt::SqlServer(ext) = &table.ext {
            if let (Some(start), Some(end)) = (&ext.period_start_column, &ext.period_end_column) {
                lines.push(format!(
                    "    PERIOD FOR SYSTEM_TIME ({}, {})",
                    self.quote_name(start),
                    self.quote_name(end)
                ));
            }
            if let (Some(schema), Some(history)) =
                (&ext.history_table_schema, &ext.history_table_name)
            {
                options = format!(
                    " WITH (SYSTEM_VERSIONING = ON (HISTORY_TABLE = {}))",
                    self.object_name(schema, history)
                );
            }
        }

        Ok(self.unit(&[format!(
            "CREATE TABLE {name} (\n{}\n){options}",
            lines.join(",\n")
        )]))
    }

    fn script_drop_table(&self, _db: &Database, table: &Table) -> Result<String> {
        let name = self.object_name(&table.schema, &table.name);
        let mut statements = Vec::new();
        if let TableExt::SqlServer(ext) = &table.ext
            && ext.is_system_versioned()
        {
            statements.push(format!("ALTER TABLE {name} SET (SYSTEM_VERSIONING = OFF)"));
        }
        statements.push(format!("DROP TABLE {name}"));
        Ok(self.unit(&statements))
    }

    fn script_create_primary_key(&self, _db: &Database, key: &PrimaryKey) -> Result<String> {
        Ok(self.unit(&[format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY {} ({})",
            self.object_name(&key.table_schema, &key.table_name),
            self.quote_name(&key.name),
            if key.is_clustered {
                "CLUSTERED"
            } else {
                "NONCLUSTERED"
            },
            self.key_columns(&key.column_names, &key.column_descending)
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
        let table = self.object_name(&key.table_schema, &key.table_name);
        let check = if key.is_disabled { "NOCHECK" } else { "CHECK" };
        let mut statements = vec![format!(
            "ALTER TABLE {table} WITH {check} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}{}",
            self.quote_name(&key.name),
            quoted_list(self, &key.column_names),
            self.object_name(&key.referenced_table_schema, &key.referenced_table_name),
            quoted_list(self, &key.referenced_column_names),
            action_clause("ON DELETE", key.on_delete),
            action_clause("ON UPDATE", key.on_update),
        )];
        if key.is_disabled {
            statements.push(format!(
                "ALTER TABLE {table} NOCHECK CONSTRAINT {}",
                self.quote_name(&key.name)
            ));
        }
        Ok(self.unit(&statements))
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
        let definition = constraint.definition.as_deref().unwrap_or_default();
        let sql = match constraint.kind {
            ConstraintKind::Check => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} CHECK {}",
                parenthesized(definition)
            ),
            ConstraintKind::Unique => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} UNIQUE ({})",
                quoted_list(self, &constraint.column_names)
            ),
            ConstraintKind::Default => {
                let column = constraint.column_names.first().ok_or_else(|| {
                    Error::InvalidSchema(format!("default constraint {name} has no column"))
                })?;
                format!(
                    "ALTER TABLE {table} ADD CONSTRAINT {name} DEFAULT {definition} FOR {}",
                    self.quote_name(column)
                )
            }
        };
        Ok(self.unit(&[sql]))
    }

    fn script_drop_constraint(&self, _db: &Database, constraint: &Constraint) -> Result<String> {
        Ok(self.unit(&[format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.object_name(&constraint.table_schema, &constraint.table_name),
            self.quote_name(&constraint.name)
        )]))
    }

    fn script_create_function(&self, _db: &Database, function: &Function) -> Result<String> {
        Ok(self.module(&function.definition, None))
    }

    fn script_drop_function(&self, _db: &Database, function: &Function) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP FUNCTION {}",
            self.object_name(&function.schema, &function.name)
        )]))
    }

    fn script_alter_function(&self, pair: Counterparts<'_, Function>) -> Result<String> {
        Ok(self.module(
            &replace_create_keyword(&pair.source.definition, "ALTER"),
            None,
        ))
    }

    fn script_create_stored_procedure(
        &self,
        _db: &Database,
        procedure: &StoredProcedure,
    ) -> Result<String> {
        Ok(self.module(&procedure.definition, None))
    }

    fn script_drop_stored_procedure(
        &self,
        _db: &Database,
        procedure: &StoredProcedure,
    ) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP PROCEDURE {}",
            self.object_name(&procedure.schema, &procedure.name)
        )]))
    }

    fn script_alter_stored_procedure(
        &self,
        pair: Counterparts<'_, StoredProcedure>,
    ) -> Result<String> {
        Ok(self.module(
            &replace_create_keyword(&pair.source.definition, "ALTER"),
            None,
        ))
    }

    fn script_create_view(&self, _db: &Database, view: &View) -> Result<String> {
        Ok(self.module(&view.definition, None))
    }

    fn script_drop_view(&self, _db: &Database, view: &View) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP VIEW {}",
            self.object_name(&view.schema, &view.name)
        )]))
    }

    fn script_alter_view(&self, pair: Counterparts<'_, View>) -> Result<String> {
        // Altering a view drops its indexes; those are re-created as their own items.
        Ok(self.module(
            &replace_create_keyword(&pair.source.definition, "ALTER"),
            None,
        ))
    }

    fn script_create_index(&self, _db: &Database, index: &Index) -> Result<String> {
        let ext = match &index.ext {
            IndexExt::SqlServer(ext) => ext.clone(),
            _ => Default::default(),
        };
        let table = self.object_name(&index.table_schema, &index.table_name);
        let mut sql = String::from("CREATE ");
        if index.is_unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str(if ext.is_clustered {
            "CLUSTERED "
        } else {
            "NONCLUSTERED "
        });
        if ext.is_columnstore {
            sql.push_str("COLUMNSTORE ");
        }
        sql.push_str(&format!("INDEX {} ON {table}", self.quote_name(&index.name)));

        if ext.is_columnstore {
            if !ext.is_clustered {
                sql.push_str(&format!(" ({})", quoted_list(self, &index.column_names)));
            }
        } else {
            sql.push_str(&format!(
                " ({})",
                self.key_columns(&index.column_names, &index.column_descending)
            ));
            if !ext.included_columns.is_empty() {
                sql.push_str(&format!(
                    " INCLUDE ({})",
                    quoted_list(self, &ext.included_columns)
                ));
            }
            if let Some(filter) = &ext.filter {
                sql.push_str(&format!(" WHERE {filter}"));
            }
        }
        Ok(self.unit(&[sql]))
    }

    fn script_drop_index(&self, _db: &Database, index: &Index) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP INDEX {} ON {}",
            self.quote_name(&index.name),
            self.object_name(&index.table_schema, &index.table_name)
        )]))
    }

    fn script_create_trigger(&self, _db: &Database, trigger: &Trigger) -> Result<String> {
        Ok(self.module(&trigger.definition, self.trigger_state(trigger)))
    }

    fn script_drop_trigger(&self, _db: &Database, trigger: &Trigger) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP TRIGGER {}",
            self.object_name(&trigger.schema, &trigger.name)
        )]))
    }

    fn script_alter_trigger(&self, pair: Counterparts<'_, Trigger>) -> Result<String> {
        let mut out = self.module(
            &replace_create_keyword(&pair.source.definition, "ALTER"),
            self.trigger_state(pair.source),
        );
        if !pair.source.is_disabled && pair.target.is_disabled {
            out.push_str(&self.unit(&[format!(
                "ENABLE TRIGGER {} ON {}",
                self.object_name(&pair.source.schema, &pair.source.name),
                self.object_name(&pair.source.table_schema, &pair.source.table_name)
            )]));
        }
        Ok(out)
    }
}

fn sequence_bounds(sequence: &Sequence) -> String {
    let mut out = String::new();
    match sequence.min_value {
        Some(min) => out.push_str(&format!(" MINVALUE {min}")),
        None => out.push_str(" NO MINVALUE"),
    }
    match sequence.max_value {
        Some(max) => out.push_str(&format!(" MAXVALUE {max}")),
        None => out.push_str(" NO MAXVALUE"),
    }
    out.push_str(if sequence.is_cycling {
        " CYCLE"
    } else {
        " NO CYCLE"
    });
    if let Some(cache) = sequence.cache_size {
        out.push_str(&format!(" CACHE {cache}"));
    }
    out
}

pub(crate) fn kind_label(kind: &DataTypeKind) -> &'static str {
    match kind {
        DataTypeKind::Base => "base",
        DataTypeKind::Alias { .. } => "alias",
        DataTypeKind::TableType { .. } => "table",
        DataTypeKind::Enumerated { .. } => "enum",
        DataTypeKind::Composite { .. } => "composite",
        DataTypeKind::Range { .. } => "range",
        DataTypeKind::Domain { .. } => "domain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlmorph_core::{IdentitySpec, SqlServerColumn, SqlServerIndex, SqlServerTable};

    fn scripter() -> MssqlScripter {
        MssqlScripter::new(ScriptOptions::default())
    }

    fn column(name: &str, data_type: &str) -> Column {
        Column {
            table_schema: "dbo".into(),
            table_name: "orders".into(),
            name: name.into(),
            ordinal_position: 1,
            data_type: data_type.into(),
            ext: ColumnExt::SqlServer(SqlServerColumn::default()),
            ..Column::default()
        }
    }

    #[test]
    fn renders_sized_types_and_identity() {
        let s = scripter();
        let mut id = column("id", "int");
        id.ext = ColumnExt::SqlServer(SqlServerColumn {
            identity: Some(IdentitySpec {
                seed: 1,
                increment: 1,
            }),
            ..SqlServerColumn::default()
        });
        assert_eq!(s.script_column(&id, true), "[id] int IDENTITY(1, 1) NOT NULL");

        let mut name = column("name", "nvarchar");
        name.max_length = Some(-1);
        name.is_nullable = true;
        name.default = Some("(N'')".into());
        name.default_constraint_name = Some("DF_orders_name".into());
        assert_eq!(
            s.script_column(&name, true),
            "[name] nvarchar(max) NULL CONSTRAINT [DF_orders_name] DEFAULT (N'')"
        );
        assert_eq!(s.script_column(&name, false), "[name] nvarchar(max) NULL");

        let mut total = column("total", "decimal");
        total.precision = Some(12);
        total.scale = Some(2);
        assert_eq!(s.render_type(&total), "decimal(12, 2)");
    }

    #[test]
    fn generated_default_names_are_left_to_the_server() {
        let s = scripter();
        let mut flag = column("flag", "bit");
        flag.default = Some("((0))".into());
        flag.default_constraint_name = Some("DF__orders__flag__5EBF139D".into());
        flag.default_is_system_named = true;
        assert_eq!(s.script_column(&flag, true), "[flag] bit NOT NULL DEFAULT ((0))");
        assert_eq!(
            s.script_add_default("[dbo].[orders]", &flag),
            vec!["ALTER TABLE [dbo].[orders] ADD DEFAULT ((0)) FOR [flag]".to_string()]
        );
        assert_eq!(
            s.script_drop_default("[dbo].[orders]", &flag),
            vec!["ALTER TABLE [dbo].[orders] DROP CONSTRAINT [DF__orders__flag__5EBF139D]".to_string()]
        );
    }

    #[test]
    fn schema_creation_is_guarded_and_escaped() {
        let db = Database::new("shop", Dialect::SqlServer);
        let schema = SchemaInfo {
            name: "o'brien".into(),
            owner: Some("etl".into()),
            ..SchemaInfo::default()
        };
        assert_eq!(
            scripter().script_create_schema(&db, &schema).unwrap(),
            "IF SCHEMA_ID(N'o''brien') IS NULL \
             EXEC(N'CREATE SCHEMA [o''brien] AUTHORIZATION [etl]');\nGO\n"
        );
    }

    #[test]
    fn quotes_closing_brackets() {
        assert_eq!(scripter().quote_name("odd]name"), "[odd]]name]");
        assert_eq!(scripter().object_name("dbo", "t"), "[dbo].[t]");
    }

    #[test]
    fn view_alter_rewrites_create_keyword() {
        let s = scripter();
        let db = Database::new("shop", Dialect::SqlServer);
        let view = |body: &str| View {
            schema: "dbo".into(),
            name: "v".into(),
            definition: format!("CREATE VIEW dbo.v AS {body}"),
            ..View::default()
        };
        let (source, target) = (view("SELECT 2 AS x"), view("SELECT 1 AS x"));
        let script = s
            .script_alter_view(Counterparts {
                source_db: &db,
                source: &source,
                target_db: &db,
                target: &target,
            })
            .unwrap();
        assert_eq!(script, "ALTER VIEW dbo.v AS SELECT 2 AS x\nGO\n");
    }

    #[test]
    fn system_versioned_tables_turn_versioning_off_before_drop() {
        let s = scripter();
        let db = Database::new("shop", Dialect::SqlServer);
        let mut table = Table::new("dbo", "prices");
        table.ext = TableExt::SqlServer(SqlServerTable {
            history_table_schema: Some("dbo".into()),
            history_table_name: Some("prices_history".into()),
            period_start_column: Some("valid_from".into()),
            period_end_column: Some("valid_to".into()),
            is_history_table: false,
        });
        table.columns.push(column("id", "int"));

        let create = s.script_create_table(&db, &table, None).unwrap();
        assert!(create.contains("PERIOD FOR SYSTEM_TIME ([valid_from], [valid_to])"));
        assert!(create.contains("HISTORY_TABLE = [dbo].[prices_history]"));

        let drop = s.script_drop_table(&db, &table).unwrap();
        assert_eq!(
            drop,
            "ALTER TABLE [dbo].[prices] SET (SYSTEM_VERSIONING = OFF);\nGO\nDROP TABLE [dbo].[prices];\nGO\n"
        );
    }

    #[test]
    fn clustered_index_with_included_columns() {
        let s = scripter();
        let db = Database::new("shop", Dialect::SqlServer);
        let index = Index {
            table_schema: "dbo".into(),
            table_name: "orders".into(),
            name: "IX_orders_customer".into(),
            column_names: vec!["customer_id".into(), "placed_at".into()],
            column_descending: vec![false, true],
            ext: IndexExt::SqlServer(SqlServerIndex {
                included_columns: vec!["total".into()],
                filter: Some("([total]>(0))".into()),
                ..SqlServerIndex::default()
            }),
            ..Index::default()
        };
        assert_eq!(
            s.script_create_index(&db, &index).unwrap(),
            "CREATE NONCLUSTERED INDEX [IX_orders_customer] ON [dbo].[orders] \
             ([customer_id] ASC, [placed_at] DESC) INCLUDE ([total]) WHERE ([total]>(0));\nGO\n"
        );
    }

    #[test]
    fn postgres_only_types_are_unsupported() {
        let db = Database::new("shop", Dialect::SqlServer);
        let enum_type = DataType {
            schema: "dbo".into(),
            name: "mood".into(),
            is_user_defined: true,
            kind: DataTypeKind::Enumerated {
                labels: vec!["ok".into()],
            },
            ..DataType::default()
        };
        let err = scripter()
            .script_create_data_type(&db, &enum_type)
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
