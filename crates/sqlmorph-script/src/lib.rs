//! SQL script generation and schema comparison for sqlmorph.
//!
//! Every dialect implements [`ScriptHelper`] (quoting, type rendering,
//! literals) and [`Scripter`] (one create/drop/alter primitive per object
//! kind). The composite algorithms, full create/drop/alter scripts and the
//! canonical fingerprint used by [`diff_databases`], are shared default
//! methods built on those primitives.

pub mod diff;
mod full;
pub mod helper;
pub mod mssql;
pub mod mysql;
pub mod options;
pub mod postgres;
pub mod scripter;
mod table;

pub use diff::{Comparison, ComparisonItem, DiffStatus, diff_databases};
pub use helper::ScriptHelper;
pub use mssql::MssqlScripter;
pub use mysql::MySqlScripter;
pub use options::{ColumnOrder, NotNullPolicy, ScriptOptions};
pub use postgres::PostgresScripter;
pub use scripter::Scripter;

use sqlmorph_core::{Dialect, DialectFamily};

/// Scripter for a dialect, configured with `options`.
pub fn scripter_for(dialect: Dialect, options: ScriptOptions) -> Box<dyn Scripter> {
    match dialect.family() {
        DialectFamily::SqlServer => Box::new(MssqlScripter::new(options)),
        DialectFamily::MySql => Box::new(MySqlScripter::new(dialect, options)),
        DialectFamily::Postgres => Box::new(PostgresScripter::new(options)),
    }
}
