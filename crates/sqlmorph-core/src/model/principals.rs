use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A namespace (SQL Server / PostgreSQL schema).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaInfo {
    pub name: String,
    pub owner: Option<String>,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

/// A database principal (SQL Server user, PostgreSQL role, MySQL account).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct User {
    pub name: String,
    /// Login the user maps to (SQL Server) or host part of the account (MySQL).
    pub login: Option<String>,
    pub default_schema: Option<String>,
    pub can_login: bool,
    #[serde(skip)]
    pub mapped: Option<usize>,
}
