//! MySQL and MariaDB scripting.
//!
//! Keys live inside `CREATE TABLE` here: an `AUTO_INCREMENT` column must be
//! indexed the moment it exists, so primary keys and indexes of new tables are
//! written inline and only standalone ones get their own statements.

use sqlmorph_core::{
    Column, ColumnExt, Constraint, ConstraintKind, DataType, Database, Dialect, Error, FkAction,
    ForeignKey, Function, Index, IndexExt, PrimaryKey, Result, SchemaInfo, Sequence,
    StoredProcedure, Table, TableExt, Trigger, User, View,
};

use crate::helper::{ScriptHelper, TypeClass, classify, quoted_list, terminate};
use crate::options::ScriptOptions;
use crate::scripter::{Counterparts, Scripter};
use crate::table::ordered_columns;

#[derive(Debug, Clone)]
pub struct MySqlScripter {
    dialect: Dialect,
    options: ScriptOptions,
}

impl MySqlScripter {
    /// `dialect` picks MySQL or MariaDB; anything else is treated as MySQL.
    pub fn new(dialect: Dialect, options: ScriptOptions) -> Self {
        let dialect = match dialect {
            Dialect::MariaDb => Dialect::MariaDb,
            _ => Dialect::MySql,
        };
        Self { dialect, options }
    }

    fn unsupported(&self, what: impl std::fmt::Display) -> Error {
        Error::unsupported(self.dialect, what)
    }

    /// Index key parts, with prefix lengths and descending markers.
    fn key_parts(&self, index: &Index) -> String {
        let sub_parts = match &index.ext {
            IndexExt::MySql(ext) => ext.sub_parts.as_slice(),
            _ => &[],
        };
        index
            .column_names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut part = self.quote_name(name);
                if let Some(Some(length)) = sub_parts.get(idx) {
                    part.push_str(&format!("({length})"));
                }
                if index.column_descending.get(idx).copied().unwrap_or(false) {
                    part.push_str(" DESC");
                }
                part
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `KEY ...` clause as written inside `CREATE TABLE`.
    fn inline_index(&self, index: &Index) -> String {
        let (prefix, using) = index_flavour(index);
        format!(
            "{prefix}KEY {} ({}){using}",
            self.quote_name(&index.name),
            self.key_parts(index)
        )
    }

    /// Host-qualified accounts; `login` holds the comma-separated hosts.
    fn accounts(&self, user: &User) -> Vec<String> {
        let hosts: Vec<&str> = user
            .login
            .as_deref()
            .map(|login| {
                login
                    .split(',')
                    .map(str::trim)
                    .filter(|host| !host.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let hosts = if hosts.is_empty() { vec!["%"] } else { hosts };
        hosts
            .into_iter()
            .map(|host| {
                format!(
                    "{}@{}",
                    self.escape_literal(&user.name),
                    self.escape_literal(host)
                )
            })
            .collect()
    }
}

/// Index prefix keyword and trailing `USING` clause.
fn index_flavour(index: &Index) -> (&'static str, &'static str) {
    let index_type = match &index.ext {
        IndexExt::MySql(ext) => ext.index_type.to_ascii_uppercase(),
        _ => String::new(),
    };
    match index_type.as_str() {
        "FULLTEXT" => ("FULLTEXT ", ""),
        "SPATIAL" => ("SPATIAL ", ""),
        "HASH" if index.is_unique => ("UNIQUE ", " USING HASH"),
        "HASH" => ("", " USING HASH"),
        _ if index.is_unique => ("UNIQUE ", ""),
        _ => ("", ""),
    }
}

/// First quoted member of an `enum('a','b')` column type, quotes included.
fn first_enum_member(column_type: &str) -> Option<&str> {
    let members = column_type
        .strip_prefix("enum(")
        .or_else(|| column_type.strip_prefix("ENUM("))?;
    if !members.starts_with('\'') {
        return None;
    }
    let bytes = members.as_bytes();
    let mut idx = 1;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\\' => idx += 2,
            b'\'' if bytes.get(idx + 1) == Some(&b'\'') => idx += 2,
            b'\'' => return Some(&members[..=idx]),
            _ => idx += 1,
        }
    }
    None
}

fn action_clause(keyword: &str, action: FkAction) -> String {
    match action {
        FkAction::NoAction => String::new(),
        other => format!(" {keyword} {}", other.as_sql()),
    }
}

impl ScriptHelper for MySqlScripter {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn quote_name(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn render_type(&self, column: &Column) -> String {
        if let ColumnExt::MySql(ext) = &column.ext
            && !ext.column_type.is_empty()
        {
            return ext.column_type.clone();
        }
        let base = column.data_type.as_str();
        match (column.max_length, column.precision, column.scale) {
            (Some(length), _, _) if length > 0 && classify(base) != TypeClass::Integer => {
                format!("{base}({length})")
            }
            (_, Some(precision), Some(scale)) if classify(base) == TypeClass::Decimal => {
                format!("{base}({precision},{scale})")
            }
            _ => base.to_string(),
        }
    }

    fn default_literal(&self, data_type: &str) -> String {
        match classify(data_type) {
            TypeClass::Integer | TypeClass::Decimal | TypeClass::Float | TypeClass::Boolean => {
                "0".to_string()
            }
            TypeClass::Date => "'1970-01-01'".to_string(),
            TypeClass::DateTime => "'1970-01-01 00:00:00'".to_string(),
            TypeClass::Time => "'00:00:00'".to_string(),
            TypeClass::Json => "'{}'".to_string(),
            TypeClass::Text
            | TypeClass::Binary
            | TypeClass::Uuid
            | TypeClass::Other => "''".to_string(),
        }
    }

    fn escape_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }
}

impl Scripter for MySqlScripter {
    fn options(&self) -> &ScriptOptions {
        &self.options
    }

    fn inlines_table_keys(&self) -> bool {
        true
    }

    fn alter_column_sets_default(&self) -> bool {
        true
    }

    /// Enum columns take their first member; `''` is only accepted in non-strict mode.
    fn backfill_literal(&self, _db: &Database, column: &Column) -> String {
        if let ColumnExt::MySql(ext) = &column.ext
            && let Some(member) = first_enum_member(&ext.column_type)
        {
            return member.to_string();
        }
        self.default_literal(&column.data_type)
    }

    /// Compound bodies contain `;`, so they are wrapped in a client delimiter.
    fn definition_unit(&self, definition: &str) -> String {
        let definition = definition.trim_end().trim_end_matches(';');
        if definition.contains(';') {
            format!("DELIMITER $$\n{definition}$$\nDELIMITER ;\n")
        } else {
            terminate(definition)
        }
    }

    fn script_column(&self, column: &Column, include_default: bool) -> String {
        let mut def = format!("{} {}", self.quote_name(&column.name), self.render_type(column));
        let ext = match &column.ext {
            ColumnExt::MySql(ext) => Some(ext),
            _ => None,
        };

        if let Some(ext) = ext {
            if let Some(charset) = &ext.charset {
                def.push_str(&format!(" CHARACTER SET {charset}"));
            }
            if let Some(collation) = &ext.collation {
                def.push_str(&format!(" COLLATE {collation}"));
            }
            if let Some(generation) = &ext.generation {
                def.push_str(&format!(
                    " GENERATED ALWAYS AS ({}) {}",
                    generation.expression,
                    if generation.stored { "STORED" } else { "VIRTUAL" }
                ));
            }
        }

        def.push_str(if column.is_nullable { " NULL" } else { " NOT NULL" });

        if include_default
            && !column.is_generated()
            && let Some(default) = &column.default
        {
            def.push_str(&format!(" DEFAULT {default}"));
        }
        if let Some(ext) = ext {
            if let Some(on_update) = &ext.on_update {
                def.push_str(&format!(" ON UPDATE {on_update}"));
            }
            if ext.auto_increment {
                def.push_str(" AUTO_INCREMENT");
            }
            if let Some(comment) = ext.comment.as_deref().filter(|comment| !comment.is_empty()) {
                def.push_str(&format!(" COMMENT {}", self.escape_literal(comment)));
            }
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

    fn script_alter_column(&self, table: &str, source: &Column, _target: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {table} MODIFY COLUMN {}",
            self.script_column(source, true)
        )]
    }

    fn script_set_not_null(&self, table: &str, column: &Column) -> Vec<String> {
        let not_null = Column {
            is_nullable: false,
            ..column.clone()
        };
        self.script_alter_column(table, &not_null, column)
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
        let (TableExt::MySql(source_ext), TableExt::MySql(target_ext)) = (&source.ext, &target.ext)
        else {
            return Vec::new();
        };
        let name = self.object_name(&target.schema, &target.name);
        let mut statements = Vec::new();
        if let Some(engine) = &source_ext.engine
            && source_ext.engine != target_ext.engine
        {
            statements.push(format!("ALTER TABLE {name} ENGINE = {engine}"));
        }
        if source_ext.charset != target_ext.charset || source_ext.collation != target_ext.collation
        {
            let mut sql = format!("ALTER TABLE {name}");
            if let Some(charset) = &source_ext.charset {
                sql.push_str(&format!(" DEFAULT CHARSET = {charset}"));
            }
            if let Some(collation) = &source_ext.collation {
                sql.push_str(&format!(" COLLATE = {collation}"));
            }
            if sql.len() > format!("ALTER TABLE {name}").len() {
                statements.push(sql);
            }
        }
        if source_ext.comment != target_ext.comment {
            statements.push(format!(
                "ALTER TABLE {name} COMMENT = {}",
                self.escape_literal(source_ext.comment.as_deref().unwrap_or_default())
            ));
        }
        statements
    }

    fn script_create_schema(&self, _db: &Database, schema: &SchemaInfo) -> Result<String> {
        Err(self.unsupported(format!("schema {}", schema.name)))
    }

    fn script_drop_schema(&self, _db: &Database, schema: &SchemaInfo) -> Result<String> {
        Err(self.unsupported(format!("schema {}", schema.name)))
    }

    fn script_create_user(&self, _db: &Database, user: &User) -> Result<String> {
        let statements: Vec<String> = self
            .accounts(user)
            .into_iter()
            .map(|account| format!("CREATE USER {account}"))
            .collect();
        Ok(self.unit(&statements))
    }

    fn script_drop_user(&self, _db: &Database, user: &User) -> Result<String> {
        let statements: Vec<String> = self
            .accounts(user)
            .into_iter()
            .map(|account| format!("DROP USER {account}"))
            .collect();
        Ok(self.unit(&statements))
    }

    fn script_create_data_type(&self, _db: &Database, data_type: &DataType) -> Result<String> {
        Err(self.unsupported(format!("user-defined type {}", data_type.name)))
    }

    fn script_drop_data_type(&self, _db: &Database, data_type: &DataType) -> Result<String> {
        Err(self.unsupported(format!("user-defined type {}", data_type.name)))
    }

    fn script_create_sequence(&self, _db: &Database, sequence: &Sequence) -> Result<String> {
        Err(self.unsupported(format!("sequence {}", sequence.name)))
    }

    fn script_drop_sequence(&self, _db: &Database, sequence: &Sequence) -> Result<String> {
        Err(self.unsupported(format!("sequence {}", sequence.name)))
    }

    fn script_create_table(
        &self,
        db: &Database,
        table: &Table,
        reference: Option<&Table>,
    ) -> Result<String> {
        let name = self.object_name(&table.schema, &table.name);
        let mut lines: Vec<String> = ordered_columns(table, reference, &self.options)
            .into_iter()
            .map(|column| format!("  {}", self.script_column(column, true)))
            .collect();

        if let Some(key) = db.primary_key_of(table) {
            lines.push(format!(
                "  PRIMARY KEY ({})",
                quoted_list(self, &key.column_names)
            ));
        }
        let mut indexes: Vec<&Index> = db
            .indexes_of(table)
            .filter(|index| !index.is_primary_key)
            .collect();
        indexes.sort_by(|left, right| left.name.cmp(&right.name));
        lines.extend(
            indexes
                .into_iter()
                .map(|index| format!("  {}", self.inline_index(index))),
        );

        let mut options = String::new();
        if let TableExt::MySql(ext) = &table.ext {
            if let Some(engine) = &ext.engine {
                options.push_str(&format!(" ENGINE={engine}"));
            }
            if let Some(charset) = &ext.charset {
                options.push_str(&format!(" DEFAULT CHARSET={charset}"));
            }
            if let Some(collation) = &ext.collation {
                options.push_str(&format!(" COLLATE={collation}"));
            }
            if let Some(comment) = ext.comment.as_deref().filter(|comment| !comment.is_empty()) {
                options.push_str(&format!(" COMMENT={}", self.escape_literal(comment)));
            }
        }

        Ok(self.unit(&[format!(
            "CREATE TABLE {name} (\n{}\n){options}",
            lines.join(",\n")
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
            "ALTER TABLE {} ADD PRIMARY KEY ({})",
            self.object_name(&key.table_schema, &key.table_name),
            quoted_list(self, &key.column_names)
        )]))
    }

    /// An `AUTO_INCREMENT` key column is modified out first; the server refuses
    /// to drop the key it depends on.
    fn script_drop_primary_key(&self, db: &Database, key: &PrimaryKey) -> Result<String> {
        let table = self.object_name(&key.table_schema, &key.table_name);
        let mut statements = Vec::new();
        if let Some(owner) = db.find_table(&key.table_schema, &key.table_name) {
            for name in &key.column_names {
                let Some(column) = owner.column_ignore_case(name) else {
                    continue;
                };
                if let ColumnExt::MySql(ext) = &column.ext
                    && ext.auto_increment
                {
                    let mut plain = ext.clone();
                    plain.auto_increment = false;
                    let plain = Column {
                        ext: ColumnExt::MySql(plain),
                        ..column.clone()
                    };
                    statements.push(format!(
                        "ALTER TABLE {table} MODIFY COLUMN {}",
                        self.script_column(&plain, true)
                    ));
                }
            }
        }
        statements.push(format!("ALTER TABLE {table} DROP PRIMARY KEY"));
        Ok(self.unit(&statements))
    }

    fn script_create_foreign_key(&self, _db: &Database, key: &ForeignKey) -> Result<String> {
        Ok(self.unit(&[format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}{}",
            self.object_name(&key.table_schema, &key.table_name),
            self.quote_name(&key.name),
            quoted_list(self, &key.column_names),
            self.object_name(&key.referenced_table_schema, &key.referenced_table_name),
            quoted_list(self, &key.referenced_column_names),
            action_clause("ON DELETE", key.on_delete),
            action_clause("ON UPDATE", key.on_update),
        )]))
    }

    fn script_drop_foreign_key(&self, _db: &Database, key: &ForeignKey) -> Result<String> {
        Ok(self.unit(&[format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.object_name(&key.table_schema, &key.table_name),
            self.quote_name(&key.name)
        )]))
    }

    fn script_create_constraint(&self, _db: &Database, constraint: &Constraint) -> Result<String> {
        let table = self.object_name(&constraint.table_schema, &constraint.table_name);
        match constraint.kind {
            ConstraintKind::Unique => Ok(self.unit(&[format!(
                "ALTER TABLE {table} ADD CONSTRAINT {} UNIQUE ({})",
                self.quote_name(&constraint.name),
                quoted_list(self, &constraint.column_names)
            )])),
            ConstraintKind::Default => {
                let (Some(column), Some(definition)) =
                    (constraint.column_names.first(), &constraint.definition)
                else {
                    return Err(Error::InvalidSchema(format!(
                        "default {} has no column or value",
                        constraint.name
                    )));
                };
                Ok(self.unit(&[format!(
                    "ALTER TABLE {table} ALTER COLUMN {} SET DEFAULT {definition}",
                    self.quote_name(column)
                )]))
            }
            ConstraintKind::Check => {
                Err(self.unsupported(format!("check constraint {}", constraint.name)))
            }
        }
    }

    fn script_drop_constraint(&self, _db: &Database, constraint: &Constraint) -> Result<String> {
        let table = self.object_name(&constraint.table_schema, &constraint.table_name);
        match constraint.kind {
            ConstraintKind::Unique => Ok(self.unit(&[format!(
                "ALTER TABLE {table} DROP INDEX {}",
                self.quote_name(&constraint.name)
            )])),
            ConstraintKind::Default => {
                let column = constraint.column_names.first().ok_or_else(|| {
                    Error::InvalidSchema(format!("default {} has no column", constraint.name))
                })?;
                Ok(self.unit(&[format!(
                    "ALTER TABLE {table} ALTER COLUMN {} DROP DEFAULT",
                    self.quote_name(column)
                )]))
            }
            ConstraintKind::Check => {
                Err(self.unsupported(format!("check constraint {}", constraint.name)))
            }
        }
    }

    fn script_create_function(&self, _db: &Database, function: &Function) -> Result<String> {
        Ok(self.definition_unit(&function.definition))
    }

    fn script_drop_function(&self, _db: &Database, function: &Function) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP FUNCTION {}",
            self.object_name(&function.schema, &function.name)
        )]))
    }

    fn script_create_stored_procedure(
        &self,
        _db: &Database,
        procedure: &StoredProcedure,
    ) -> Result<String> {
        Ok(self.definition_unit(&procedure.definition))
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

    fn script_create_view(&self, _db: &Database, view: &View) -> Result<String> {
        Ok(self.definition_unit(&view.definition))
    }

    fn script_drop_view(&self, _db: &Database, view: &View) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP VIEW {}",
            self.object_name(&view.schema, &view.name)
        )]))
    }

    fn script_create_index(&self, _db: &Database, index: &Index) -> Result<String> {
        let (prefix, using) = index_flavour(index);
        Ok(self.unit(&[format!(
            "CREATE {prefix}INDEX {} ON {} ({}){using}",
            self.quote_name(&index.name),
            self.object_name(&index.table_schema, &index.table_name),
            self.key_parts(index)
        )]))
    }

    fn script_drop_index(&self, _db: &Database, index: &Index) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP INDEX {} ON {}",
            self.quote_name(&index.name),
            self.object_name(&index.table_schema, &index.table_name)
        )]))
    }

    fn script_create_trigger(&self, _db: &Database, trigger: &Trigger) -> Result<String> {
        Ok(self.definition_unit(&trigger.definition))
    }

    fn script_drop_trigger(&self, _db: &Database, trigger: &Trigger) -> Result<String> {
        Ok(self.unit(&[format!(
            "DROP TRIGGER {}",
            self.object_name(&trigger.schema, &trigger.name)
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlmorph_core::{MySqlColumn, MySqlIndex, MySqlTable};

    fn scripter() -> MySqlScripter {
        MySqlScripter::new(Dialect::MySql, ScriptOptions::default())
    }

    fn column(name: &str, column_type: &str, ordinal: i32) -> Column {
        Column {
            table_name: "orders".into(),
            name: name.into(),
            ordinal_position: ordinal,
            data_type: column_type.split('(').next().unwrap_or(column_type).into(),
            ext: ColumnExt::MySql(MySqlColumn {
                column_type: column_type.into(),
                ..MySqlColumn::default()
            }),
            ..Column::default()
        }
    }

    #[test]
    fn enum_backfill_takes_the_first_member() {
        let s = scripter();
        let db = Database::new("shop", Dialect::MySql);
        let status = column("status", "enum('it''s','shipped')", 3);
        assert_eq!(s.backfill_literal(&db, &status), "'it''s'");
        let escaped = column("status", r"enum('a\'b','c')", 3);
        assert_eq!(s.backfill_literal(&db, &escaped), r"'a\'b'");
        let qty = column("qty", "int", 4);
        assert_eq!(s.backfill_literal(&db, &qty), "0");
        assert_eq!(first_enum_member("set('x','y')"), None);
    }

    fn orders() -> Database {
        let mut db = Database::new("shop", Dialect::MySql);
        let mut table = Table::new("", "orders");
        let mut id = column("id", "int unsigned", 1);
        if let ColumnExt::MySql(ext) = &mut id.ext {
            ext.auto_increment = true;
        }
        table.columns.push(id);
        table.columns.push(column("code", "varchar(40)", 2));
        table.ext = TableExt::MySql(MySqlTable {
            engine: Some("InnoDB".into()),
            ..MySqlTable::default()
        });
        table.primary_keys.push(0);
        table.indexes.push(0);
        db.tables.push(table);
        db.primary_keys.push(PrimaryKey {
            table_name: "orders".into(),
            name: "PRIMARY".into(),
            column_names: vec!["id".into()],
            ..PrimaryKey::default()
        });
        db.indexes.push(Index {
            table_name: "orders".into(),
            name: "ux_orders_code".into(),
            column_names: vec!["code".into()],
            is_unique: true,
            ext: IndexExt::MySql(MySqlIndex {
                index_type: "BTREE".into(),
                sub_parts: vec![Some(10)],
            }),
            ..Index::default()
        });
        db
    }

    #[test]
    fn create_table_inlines_keys() {
        let db = orders();
        let script = scripter()
            .script_create_table(&db, &db.tables[0], None)
            .unwrap();
        assert_eq!(
            script,
            "CREATE TABLE `orders` (\n  `id` int unsigned NOT NULL AUTO_INCREMENT,\n  \
             `code` varchar(40) NOT NULL,\n  PRIMARY KEY (`id`),\n  \
             UNIQUE KEY `ux_orders_code` (`code`(10))\n) ENGINE=InnoDB;\n"
        );
    }

    #[test]
    fn dropping_an_auto_increment_key_modifies_the_column_first() {
        let db = orders();
        let script = scripter()
            .script_drop_primary_key(&db, &db.primary_keys[0])
            .unwrap();
        assert_eq!(
            script,
            "ALTER TABLE `orders` MODIFY COLUMN `id` int unsigned NOT NULL;\n\
             ALTER TABLE `orders` DROP PRIMARY KEY;\n"
        );
    }

    #[test]
    fn sequences_schemas_and_checks_are_unsupported() {
        let db = Database::new("shop", Dialect::MariaDb);
        let s = MySqlScripter::new(Dialect::MariaDb, ScriptOptions::default());
        let sequence = Sequence {
            name: "order_no".into(),
            ..Sequence::default()
        };
        assert!(matches!(
            s.script_create_sequence(&db, &sequence),
            Err(Error::Unsupported(message)) if message.contains("mariadb")
        ));

        let check = Constraint {
            table_name: "orders".into(),
            name: "ck_total".into(),
            kind: ConstraintKind::Check,
            definition: Some("total > 0".into()),
            ..Constraint::default()
        };
        assert!(matches!(
            s.script_create_constraint(&db, &check),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn compound_routine_bodies_use_a_client_delimiter() {
        let s = scripter();
        assert_eq!(
            s.definition_unit("CREATE VIEW `v` AS select 1 AS `x`"),
            "CREATE VIEW `v` AS select 1 AS `x`;\n"
        );
        assert_eq!(
            s.definition_unit("CREATE PROCEDURE `p`() BEGIN SELECT 1; SELECT 2; END"),
            "DELIMITER $$\nCREATE PROCEDURE `p`() BEGIN SELECT 1; SELECT 2; END$$\nDELIMITER ;\n"
        );
    }

    #[test]
    fn users_expand_to_every_host() {
        let db = Database::new("shop", Dialect::MySql);
        let user = User {
            name: "app".into(),
            login: Some("%,localhost".into()),
            ..User::default()
        };
        assert_eq!(
            scripter().script_create_user(&db, &user).unwrap(),
            "CREATE USER 'app'@'%';\nCREATE USER 'app'@'localhost';\n"
        );
    }
}
