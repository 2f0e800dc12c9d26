use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A view; `definition` is the native CREATE statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct View {
    pub schema: String,
    pub name: String,
    pub definition: String,
    pub is_materialized: bool,
    /// Arena indexes of indexes defined on the view.
    pub indexes: Vec<usize>,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Function {
    pub schema: String,
    pub name: String,
    pub definition: String,
    pub ext: RoutineExt,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoredProcedure {
    pub schema: String,
    pub name: String,
    pub definition: String,
    pub ext: RoutineExt,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Trigger {
    pub schema: String,
    pub name: String,
    pub table_schema: String,
    pub table_name: String,
    pub definition: String,
    pub is_disabled: bool,
    #[serde(skip)]
    pub mapped: Option<usize>,
}

/// Dialect-specific routine facets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "dialect", rename_all = "snake_case")]
pub enum RoutineExt {
    #[default]
    None,
    Postgres(PostgresRoutine),
}

/// Argument arrays are aligned by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostgresRoutine {
    pub argument_names: Vec<String>,
    pub argument_modes: Vec<String>,
    pub argument_types: Vec<String>,
    pub return_type: Option<String>,
    pub language: Option<String>,
    pub is_aggregate: bool,
}

impl PostgresRoutine {
    /// Identity arguments (`IN`/`INOUT`/`VARIADIC`), as used by `DROP FUNCTION`.
    pub fn identity_arguments(&self) -> String {
        self.argument_types
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                let mode = self
                    .argument_modes
                    .get(*idx)
                    .map(String::as_str)
                    .unwrap_or("i");
                !matches!(mode, "o" | "t" | "OUT" | "TABLE")
            })
            .map(|(_, ty)| ty.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl RoutineExt {
    /// Overload-distinguishing suffix for routine identity.
    pub fn signature(&self) -> Option<String> {
        match self {
            RoutineExt::None => None,
            RoutineExt::Postgres(routine) => Some(routine.identity_arguments()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_arguments_skip_out_parameters() {
        let routine = PostgresRoutine {
            argument_names: vec!["a".into(), "b".into(), "total".into()],
            argument_modes: vec!["i".into(), "b".into(), "o".into()],
            argument_types: vec!["integer".into(), "text".into(), "bigint".into()],
            ..PostgresRoutine::default()
        };

        assert_eq!(routine.identity_arguments(), "integer, text");
    }
}
