use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A base table and the arena indexes of the objects attached to it.
///
/// Key, index, constraint and trigger lists hold positions in the owning
/// [`Database`](crate::Database) collections; columns are owned outright.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_keys: Vec<usize>,
    pub foreign_keys: Vec<usize>,
    /// Foreign keys declared on other tables that reference this one.
    pub referencing_foreign_keys: Vec<usize>,
    pub indexes: Vec<usize>,
    pub constraints: Vec<usize>,
    pub triggers: Vec<usize>,
    pub ext: TableExt,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn full_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Case-insensitive column lookup used when aligning two tables.
    pub fn column_ignore_case(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }
}

/// Dialect-specific table facets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "dialect", rename_all = "snake_case")]
pub enum TableExt {
    #[default]
    None,
    SqlServer(SqlServerTable),
    MySql(MySqlTable),
    Postgres(PostgresTable),
}

/// System-versioned (temporal) table linkage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SqlServerTable {
    pub history_table_schema: Option<String>,
    pub history_table_name: Option<String>,
    pub period_start_column: Option<String>,
    pub period_end_column: Option<String>,
    /// `true` when this table is the history table of another one.
    pub is_history_table: bool,
}

impl SqlServerTable {
    pub fn is_system_versioned(&self) -> bool {
        self.history_table_name.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MySqlTable {
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    /// Next auto-increment value; volatile, never part of a fingerprint.
    pub auto_increment: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostgresTable {
    /// Parent tables as `(schema, name)`, in inheritance order.
    pub inherits: Vec<(String, String)>,
    pub tablespace: Option<String>,
    pub is_unlogged: bool,
    pub partition_key: Option<String>,
}

/// Column metadata for a table or view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub table_schema: String,
    pub table_name: String,
    pub name: String,
    pub ordinal_position: i32,
    /// Base type name as reported by the catalog (e.g. `nvarchar`, `int4`).
    pub data_type: String,
    /// Character length; `-1` stands for `max`.
    pub max_length: Option<i64>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub is_nullable: bool,
    pub default: Option<String>,
    /// Name of the constraint carrying the default, when the dialect names it.
    pub default_constraint_name: Option<String>,
    /// The server generated the default constraint's name (`DF__tbl__col__5EBF139D`).
    #[serde(default)]
    pub default_is_system_named: bool,
    pub is_user_defined_type: bool,
    pub ext: ColumnExt,
}

impl Column {
    /// Default constraint name worth scripting; generated names differ per database.
    pub fn declared_default_name(&self) -> Option<&str> {
        self.default_constraint_name
            .as_deref()
            .filter(|_| !self.default_is_system_named)
    }

    /// Identity, computed and generated columns cannot be altered in place.
    pub fn is_generated(&self) -> bool {
        match &self.ext {
            ColumnExt::None => false,
            ColumnExt::SqlServer(ext) => ext.computed.is_some() || ext.generated_always.is_some(),
            ColumnExt::MySql(ext) => ext.generation.is_some(),
            ColumnExt::Postgres(ext) => ext.generated.is_some(),
        }
    }

    pub fn is_identity(&self) -> bool {
        match &self.ext {
            ColumnExt::None => false,
            ColumnExt::SqlServer(ext) => ext.identity.is_some(),
            ColumnExt::MySql(ext) => ext.auto_increment,
            ColumnExt::Postgres(ext) => ext.identity.is_some(),
        }
    }
}

/// Dialect-specific column facets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "dialect", rename_all = "snake_case")]
pub enum ColumnExt {
    #[default]
    None,
    SqlServer(SqlServerColumn),
    MySql(MySqlColumn),
    Postgres(PostgresColumn),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IdentitySpec {
    pub seed: i64,
    pub increment: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SqlServerColumn {
    pub identity: Option<IdentitySpec>,
    pub computed: Option<String>,
    pub is_persisted: bool,
    pub collation: Option<String>,
    pub is_rowguidcol: bool,
    /// `ROW START` / `ROW END` for temporal period columns.
    pub generated_always: Option<String>,
    pub is_hidden: bool,
    /// Schema of a user-defined alias type.
    pub type_schema: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MySqlColumn {
    /// Full column type, e.g. `int unsigned` or `enum('a','b')`.
    pub column_type: String,
    pub auto_increment: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub generation: Option<GeneratedColumn>,
    pub on_update: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedColumn {
    pub expression: String,
    pub stored: bool,
}

/// Identity generation strategy for columns using `GENERATED ... AS IDENTITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentityGeneration {
    Always,
    ByDefault,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostgresColumn {
    /// Output of `format_type`, e.g. `character varying(40)` or `app.mood[]`.
    pub formatted_type: String,
    pub identity: Option<IdentityGeneration>,
    pub identity_spec: Option<IdentitySpec>,
    /// Expression of a `GENERATED ALWAYS AS (...) STORED` column.
    pub generated: Option<String>,
    pub collation: Option<String>,
    pub udt_schema: Option<String>,
}
