//! Schema discovery for SQL Server, MySQL/MariaDB and PostgreSQL.
//!
//! A [`ConnectionContext`] runs SQL, a [`CatalogReader`] knows which catalog
//! queries to run for its dialect, and [`discover_database`] drives the
//! phases that turn catalog rows into a [`Database`].

pub mod catalog;
pub mod context;
mod de;
pub mod discover;
pub mod mapper;
pub mod mssql;
pub mod mysql;
pub mod options;
pub mod postgres;
pub mod provider;
pub mod raw;
pub mod task;

pub use catalog::{CatalogEnv, CatalogFilter, CatalogReader};
pub use context::{CatalogRow, ConnectionContext, query_as, query_single_column};
pub use discover::{Discovery, discover_database};
pub use mssql::{MssqlContext, SqlServerCatalog};
pub use mysql::{MySqlCatalog, MySqlContext};
pub use options::IntrospectOptions;
pub use postgres::{PgContext, PostgresCatalog};
pub use provider::{DatabaseProvider, connect_context, reader_for};
pub use task::{Progress, TaskInfo};

pub use sqlmorph_core::Database;
