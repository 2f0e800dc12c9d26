use serde::{Deserialize, Serialize};

/// Column order inside generated `CREATE TABLE` statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrder {
    /// Catalog ordinal, as discovered.
    #[default]
    Ordinal,
    Alphabetical,
}

/// How a NOT NULL column without a default is added to an existing table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotNullPolicy {
    /// Add as nullable, backfill with the type's zero literal, then set NOT NULL.
    #[default]
    Backfill,
    /// Add the column NOT NULL in one statement; fails on populated tables.
    Direct,
}

/// Script generation settings, read from the `[script]` table of `sqlmorph.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptOptions {
    pub column_order: ColumnOrder,
    pub not_null_policy: NotNullPolicy,
    /// Section banners in full scripts.
    pub include_comments: bool,
    /// Batch separators (`GO`) after each DDL unit, where the dialect has one.
    pub batch_terminators: bool,
    /// Align table columns with the counterpart table's order first.
    pub match_reference_order: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            column_order: ColumnOrder::Ordinal,
            not_null_policy: NotNullPolicy::Backfill,
            include_comments: true,
            batch_terminators: true,
            match_reference_order: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let options: ScriptOptions = toml::from_str(
            r#"
column_order = "alphabetical"
include_comments = false
"#,
        )
        .unwrap();

        assert_eq!(options.column_order, ColumnOrder::Alphabetical);
        assert!(!options.include_comments);
        assert_eq!(options.not_null_policy, NotNullPolicy::Backfill);
        assert!(options.batch_terminators);
    }
}
