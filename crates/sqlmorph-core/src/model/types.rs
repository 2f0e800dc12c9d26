use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A catalog data type; user-defined types carry a [`DataTypeKind`] payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DataType {
    pub schema: String,
    pub name: String,
    pub type_id: i64,
    pub is_user_defined: bool,
    /// Catalog id of the underlying system type.
    pub system_type_id: Option<i64>,
    /// Resolved name of the underlying system type (second discovery pass).
    pub system_type: Option<String>,
    pub kind: DataTypeKind,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataTypeKind {
    /// Built-in system type.
    #[default]
    Base,
    /// SQL Server alias type (`CREATE TYPE x FROM base`).
    Alias {
        max_length: Option<i64>,
        precision: Option<i32>,
        scale: Option<i32>,
        is_nullable: bool,
    },
    /// SQL Server table type; `definition` is the column list.
    TableType { definition: String },
    Enumerated { labels: Vec<String> },
    Composite {
        attribute_names: Vec<String>,
        attribute_type_ids: Vec<i64>,
        attribute_types: Vec<String>,
    },
    Range {
        sub_type_id: i64,
        sub_type: Option<String>,
        canonical: Option<String>,
        sub_type_diff: Option<String>,
    },
    Domain {
        base_type_id: i64,
        base_type: Option<String>,
        constraint: Option<String>,
        not_null: bool,
        default: Option<String>,
    },
}

/// A sequence generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Sequence {
    pub schema: String,
    pub name: String,
    pub data_type: String,
    pub start_value: i64,
    pub increment: i64,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub is_cycling: bool,
    /// `None` means the dialect default (no cache clause).
    pub cache_size: Option<i64>,
    /// Current value; volatile, never part of a fingerprint.
    pub current_value: Option<i64>,
    #[serde(skip)]
    pub mapped: Option<usize>,
}
