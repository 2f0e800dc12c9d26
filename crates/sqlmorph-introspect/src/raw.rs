//! Catalog row shapes shared by every dialect.
//!
//! Each catalog query aliases its columns to these field names; columns a
//! dialect does not report are simply absent and take their defaults.

use serde::Deserialize;

use crate::de;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTable {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub table_name: String,
    pub engine: Option<String>,
    pub charset_name: Option<String>,
    pub collation_name: Option<String>,
    pub comment_text: Option<String>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub auto_increment: Option<i64>,
    pub history_schema: Option<String>,
    pub history_table: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub is_history: bool,
    #[serde(deserialize_with = "de::list")]
    pub inherit_schemas: Vec<String>,
    #[serde(deserialize_with = "de::list")]
    pub inherit_names: Vec<String>,
    pub tablespace: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub is_unlogged: bool,
    pub partition_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawColumn {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: i32,
    pub data_type: String,
    #[serde(deserialize_with = "de::opt_i64")]
    pub max_length: Option<i64>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub numeric_precision: Option<i64>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub numeric_scale: Option<i64>,
    #[serde(deserialize_with = "de::flag")]
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub default_constraint: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub default_is_system_named: bool,
    #[serde(deserialize_with = "de::flag")]
    pub is_user_defined: bool,
    pub type_schema: Option<String>,
    pub column_type: Option<String>,
    pub formatted_type: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub is_identity: bool,
    #[serde(deserialize_with = "de::opt_i64")]
    pub identity_seed: Option<i64>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub identity_increment: Option<i64>,
    /// PostgreSQL `attidentity` code (`a` / `d`).
    pub identity_generation: Option<String>,
    pub computed: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub is_persisted: bool,
    pub collation_name: Option<String>,
    pub charset_name: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub is_rowguidcol: bool,
    pub generated_always: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub is_hidden: bool,
    /// MySQL `EXTRA` column.
    pub extra: Option<String>,
    pub generation_expression: Option<String>,
    pub comment_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawForeignKeyColumn {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub table_name: String,
    pub constraint_name: String,
    pub column_name: String,
    pub ordinal: i32,
    #[serde(deserialize_with = "de::text")]
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
    #[serde(deserialize_with = "de::text")]
    pub update_rule: String,
    #[serde(deserialize_with = "de::text")]
    pub delete_rule: String,
    #[serde(deserialize_with = "de::flag")]
    pub is_deferrable: bool,
    #[serde(deserialize_with = "de::flag")]
    pub initially_deferred: bool,
    #[serde(deserialize_with = "de::flag")]
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawIndexColumn {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub table_name: String,
    pub index_name: String,
    /// Null for expression index members.
    pub column_name: Option<String>,
    pub ordinal: i32,
    #[serde(deserialize_with = "de::flag")]
    pub is_descending: bool,
    #[serde(deserialize_with = "de::flag")]
    pub is_included: bool,
    #[serde(deserialize_with = "de::flag")]
    pub is_unique: bool,
    #[serde(deserialize_with = "de::flag")]
    pub is_primary_key: bool,
    #[serde(deserialize_with = "de::flag")]
    pub is_clustered: bool,
    #[serde(deserialize_with = "de::flag")]
    pub is_columnstore: bool,
    pub filter_definition: Option<String>,
    pub index_type: Option<String>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub sub_part: Option<i64>,
    pub index_method: Option<String>,
    pub predicate: Option<String>,
    pub index_definition: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConstraintColumn {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub table_name: String,
    pub constraint_name: String,
    /// `CHECK` or `UNIQUE`.
    pub constraint_type: String,
    pub column_name: Option<String>,
    pub ordinal: i32,
    pub definition: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub is_deferrable: bool,
    #[serde(deserialize_with = "de::flag")]
    pub initially_deferred: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTrigger {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub trigger_name: String,
    #[serde(deserialize_with = "de::text")]
    pub table_schema: String,
    pub table_name: String,
    #[serde(deserialize_with = "de::text")]
    pub definition: String,
    #[serde(deserialize_with = "de::flag")]
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawView {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub view_name: String,
    #[serde(deserialize_with = "de::text")]
    pub definition: String,
    #[serde(deserialize_with = "de::flag")]
    pub is_materialized: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRoutine {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub routine_name: String,
    #[serde(deserialize_with = "de::text")]
    pub definition: String,
    #[serde(deserialize_with = "de::list")]
    pub argument_names: Vec<String>,
    #[serde(deserialize_with = "de::list")]
    pub argument_modes: Vec<String>,
    #[serde(deserialize_with = "de::list")]
    pub argument_types: Vec<String>,
    pub return_type: Option<String>,
    pub routine_language: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub is_aggregate: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDataType {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub type_name: String,
    #[serde(deserialize_with = "de::i64_or_zero")]
    pub type_id: i64,
    #[serde(deserialize_with = "de::flag")]
    pub is_user_defined: bool,
    #[serde(deserialize_with = "de::opt_i64")]
    pub system_type_id: Option<i64>,
    /// `base`, `alias`, `table`, `enum`, `composite`, `range` or `domain`.
    pub category: String,
    #[serde(deserialize_with = "de::opt_i64")]
    pub max_length: Option<i64>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub numeric_precision: Option<i64>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub numeric_scale: Option<i64>,
    #[serde(deserialize_with = "de::flag")]
    pub is_nullable: bool,
    pub definition: Option<String>,
    #[serde(deserialize_with = "de::list")]
    pub labels: Vec<String>,
    #[serde(deserialize_with = "de::list")]
    pub attribute_names: Vec<String>,
    #[serde(deserialize_with = "de::id_list")]
    pub attribute_type_ids: Vec<i64>,
    #[serde(deserialize_with = "de::list")]
    pub attribute_types: Vec<String>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub sub_type_id: Option<i64>,
    pub sub_type: Option<String>,
    pub canonical: Option<String>,
    pub sub_type_diff: Option<String>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub base_type_id: Option<i64>,
    pub base_type: Option<String>,
    pub constraint_def: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub not_null: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSequence {
    #[serde(deserialize_with = "de::text")]
    pub schema_name: String,
    pub sequence_name: String,
    pub data_type: String,
    #[serde(deserialize_with = "de::i64_or_zero")]
    pub start_value: i64,
    #[serde(deserialize_with = "de::i64_or_zero")]
    pub increment_by: i64,
    #[serde(deserialize_with = "de::opt_i64")]
    pub min_value: Option<i64>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub max_value: Option<i64>,
    #[serde(deserialize_with = "de::flag")]
    pub is_cycling: bool,
    #[serde(deserialize_with = "de::opt_i64")]
    pub cache_size: Option<i64>,
    #[serde(deserialize_with = "de::opt_i64")]
    pub current_value: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSchema {
    pub schema_name: String,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUser {
    pub user_name: String,
    pub login: Option<String>,
    pub default_schema: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub can_login: bool,
}
