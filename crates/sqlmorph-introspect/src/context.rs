use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use sqlmorph_core::{Dialect, Error, Result};

/// One result row: column names paired with their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl CatalogRow {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))
            .and_then(|idx| self.values.get(idx))
    }

    /// Deserialize the row into `T`, matching lower-cased column names to fields.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let object: Map<String, Value> = self
            .columns
            .iter()
            .map(|name| name.to_lowercase())
            .zip(self.values.iter().cloned())
            .collect();
        serde_json::from_value(Value::Object(object))
            .map_err(|err| Error::Db(format!("unexpected catalog row shape: {err}")))
    }
}

/// Connectivity consumed by the catalog readers.
///
/// Implementations own whatever pool or client the engine needs; readers only
/// see rows.
#[async_trait]
pub trait ConnectionContext: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Database the context is bound to.
    fn database_name(&self) -> &str;

    fn hostname(&self) -> &str;

    /// Open the underlying connection. Failure here aborts discovery.
    async fn open_connection(&self) -> Result<()>;

    async fn query_rows(&self, sql: &str) -> Result<Vec<CatalogRow>>;

    /// Run a statement that returns no rows; yields the affected row count.
    async fn execute_non_query(&self, sql: &str) -> Result<u64>;
}

/// Run a query and deserialize every row into `T`.
pub async fn query_as<T, C>(ctx: &C, sql: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    C: ConnectionContext + ?Sized,
{
    ctx.query_rows(sql)
        .await?
        .iter()
        .map(CatalogRow::deserialize)
        .collect()
}

/// Run a query and collect one column, by position, from every row.
pub async fn query_single_column<T, C>(ctx: &C, sql: &str, index: usize) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    C: ConnectionContext + ?Sized,
{
    ctx.query_rows(sql)
        .await?
        .into_iter()
        .map(|mut row| {
            if index >= row.values.len() {
                return Err(Error::Db(format!(
                    "column {index} out of range ({} columns)",
                    row.values.len()
                )));
            }
            let value = row.values.swap_remove(index);
            serde_json::from_value(value)
                .map_err(|err| Error::Db(format!("unexpected catalog value: {err}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Named {
        table_name: String,
        ordinal: i32,
    }

    #[test]
    fn deserializes_case_insensitive_columns() {
        let row = CatalogRow::new(
            vec!["TABLE_NAME".into(), "Ordinal".into()],
            vec![json!("orders"), json!(3)],
        );
        let named: Named = row.deserialize().unwrap();
        assert_eq!(named.table_name, "orders");
        assert_eq!(named.ordinal, 3);
        assert_eq!(row.get("table_name"), Some(&json!("orders")));
    }

    #[test]
    fn reports_shape_mismatches_as_db_errors() {
        let row = CatalogRow::new(vec!["ordinal".into()], vec![json!("x")]);
        let err = row.deserialize::<Named>().unwrap_err();
        assert!(matches!(err, Error::Db(_)));
    }
}
