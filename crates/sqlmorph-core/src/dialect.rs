use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::ServerVersion;

/// SQL engine a database was discovered from or a script is written for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    SqlServer,
    MySql,
    MariaDb,
    Postgres,
}

/// Dialect family; MySQL and MariaDB share catalog layout and syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectFamily {
    SqlServer,
    MySql,
    Postgres,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::SqlServer => "mssql",
            Dialect::MySql => "mysql",
            Dialect::MariaDb => "mariadb",
            Dialect::Postgres => "postgres",
        }
    }

    pub fn family(self) -> DialectFamily {
        match self {
            Dialect::SqlServer => DialectFamily::SqlServer,
            Dialect::MySql | Dialect::MariaDb => DialectFamily::MySql,
            Dialect::Postgres => DialectFamily::Postgres,
        }
    }

    /// Resolve a dialect from a database type or URL scheme.
    pub fn from_db_type(db_type: &str) -> Result<Self> {
        match db_type.to_lowercase().as_str() {
            "mssql" | "sqlserver" | "sql_server" => Ok(Dialect::SqlServer),
            "mysql" => Ok(Dialect::MySql),
            "mariadb" => Ok(Dialect::MariaDb),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            other => Err(Error::Unsupported(format!(
                "unknown database type '{other}' (supported: mssql, mysql, mariadb, postgres)"
            ))),
        }
    }

    /// Capability flags for this dialect at a given server version.
    pub fn capabilities(self, version: &ServerVersion) -> Capabilities {
        match self {
            Dialect::SqlServer => Capabilities {
                schemas: true,
                user_defined_types: true,
                sequences: version.at_least(11, 0),
                check_constraints: true,
                functions: true,
                stored_procedures: true,
                table_inheritance: false,
                clustered_indexes: true,
                routine_alter: true,
                named_defaults: true,
                transactional_ddl: true,
            },
            Dialect::MySql | Dialect::MariaDb => Capabilities {
                schemas: false,
                user_defined_types: false,
                sequences: false,
                check_constraints: false,
                functions: true,
                stored_procedures: true,
                table_inheritance: false,
                clustered_indexes: false,
                routine_alter: false,
                named_defaults: false,
                transactional_ddl: false,
            },
            Dialect::Postgres => Capabilities {
                schemas: true,
                user_defined_types: true,
                sequences: true,
                check_constraints: true,
                functions: true,
                stored_procedures: false,
                table_inheritance: true,
                clustered_indexes: false,
                routine_alter: true,
                named_defaults: false,
                transactional_ddl: true,
            },
        }
    }

    /// Schema objects land in when the catalog reports none.
    pub fn default_schema(self) -> &'static str {
        match self {
            Dialect::SqlServer => "dbo",
            Dialect::MySql | Dialect::MariaDb => "",
            Dialect::Postgres => "public",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Object kinds and behaviours a dialect supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub schemas: bool,
    pub user_defined_types: bool,
    pub sequences: bool,
    pub check_constraints: bool,
    pub functions: bool,
    pub stored_procedures: bool,
    pub table_inheritance: bool,
    pub clustered_indexes: bool,
    /// Routine bodies can be replaced in place (ALTER / CREATE OR REPLACE).
    pub routine_alter: bool,
    /// Column defaults are standalone named constraints.
    pub named_defaults: bool,
    pub transactional_ddl: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_db_type_aliases() {
        assert_eq!(Dialect::from_db_type("sqlserver").unwrap(), Dialect::SqlServer);
        assert_eq!(Dialect::from_db_type("PostgreSQL").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_db_type("mariadb").unwrap(), Dialect::MariaDb);
        assert!(Dialect::from_db_type("oracle").is_err());
    }

    #[test]
    fn sequences_are_version_gated_on_sql_server() {
        let old = Dialect::SqlServer.capabilities(&ServerVersion::new(10, 50, 0));
        let new = Dialect::SqlServer.capabilities(&ServerVersion::new(11, 0, 0));
        assert!(!old.sequences);
        assert!(new.sequences);
        assert!(!Dialect::MySql.capabilities(&ServerVersion::MAX).sequences);
    }

    #[test]
    fn mariadb_shares_the_mysql_family() {
        assert_eq!(Dialect::MariaDb.family(), DialectFamily::MySql);
        assert_eq!(
            Dialect::MariaDb.capabilities(&ServerVersion::MAX),
            Dialect::MySql.capabilities(&ServerVersion::MAX)
        );
    }
}
