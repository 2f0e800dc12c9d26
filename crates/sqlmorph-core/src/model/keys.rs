use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FkAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl FkAction {
    /// Parse catalog spellings (`NO ACTION`, `NO_ACTION`, `SET NULL`, Postgres codes).
    pub fn from_catalog(value: &str) -> Self {
        match value.trim().to_uppercase().replace('_', " ").as_str() {
            "CASCADE" | "C" => FkAction::Cascade,
            "SET NULL" | "N" => FkAction::SetNull,
            "SET DEFAULT" | "D" => FkAction::SetDefault,
            "RESTRICT" | "R" => FkAction::Restrict,
            _ => FkAction::NoAction,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            FkAction::NoAction => "NO ACTION",
            FkAction::Restrict => "RESTRICT",
            FkAction::Cascade => "CASCADE",
            FkAction::SetNull => "SET NULL",
            FkAction::SetDefault => "SET DEFAULT",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PrimaryKey {
    pub table_schema: String,
    pub table_name: String,
    pub name: String,
    pub column_names: Vec<String>,
    pub column_descending: Vec<bool>,
    pub is_clustered: bool,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKey {
    pub table_schema: String,
    pub table_name: String,
    pub name: String,
    pub column_names: Vec<String>,
    pub referenced_table_schema: String,
    pub referenced_table_name: String,
    pub referenced_column_names: Vec<String>,
    pub on_update: FkAction,
    pub on_delete: FkAction,
    pub is_deferrable: bool,
    pub initially_deferred: bool,
    pub is_disabled: bool,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    #[default]
    Check,
    Unique,
    /// Named column default; only ever synthesised from column metadata.
    Default,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    pub table_schema: String,
    pub table_name: String,
    pub name: String,
    pub kind: ConstraintKind,
    pub column_names: Vec<String>,
    /// Check expression or default expression.
    pub definition: Option<String>,
    pub is_deferrable: bool,
    pub initially_deferred: bool,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

/// Non-primary-key index; primary keys are split out during the attach phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Index {
    pub table_schema: String,
    pub table_name: String,
    pub name: String,
    pub column_names: Vec<String>,
    /// Parallel to `column_names`.
    pub column_descending: Vec<bool>,
    pub is_unique: bool,
    pub is_primary_key: bool,
    pub ext: IndexExt,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

impl Index {
    pub fn is_clustered(&self) -> bool {
        matches!(&self.ext, IndexExt::SqlServer(ext) if ext.is_clustered)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "dialect", rename_all = "snake_case")]
pub enum IndexExt {
    #[default]
    None,
    SqlServer(SqlServerIndex),
    MySql(MySqlIndex),
    Postgres(PostgresIndex),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SqlServerIndex {
    pub is_clustered: bool,
    pub is_columnstore: bool,
    pub included_columns: Vec<String>,
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MySqlIndex {
    /// `BTREE`, `HASH`, `FULLTEXT` or `SPATIAL`.
    pub index_type: String,
    /// Prefix lengths parallel to the column list.
    pub sub_parts: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostgresIndex {
    pub method: String,
    pub predicate: Option<String>,
    /// `pg_get_indexdef` output, used for expression indexes.
    pub definition: Option<String>,
    pub included_columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_referential_actions() {
        assert_eq!(FkAction::from_catalog("NO_ACTION"), FkAction::NoAction);
        assert_eq!(FkAction::from_catalog("set null"), FkAction::SetNull);
        assert_eq!(FkAction::from_catalog("c"), FkAction::Cascade);
        assert_eq!(FkAction::from_catalog("SET_DEFAULT"), FkAction::SetDefault);
        assert_eq!(FkAction::from_catalog("a"), FkAction::NoAction);
    }
}
