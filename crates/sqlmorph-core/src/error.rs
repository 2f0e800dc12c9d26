use std::fmt;

use thiserror::Error;

use crate::dialect::Dialect;

/// Core error type shared across sqlmorph crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error or adapter failure.
    #[error("database error: {0}")]
    Db(String),
    /// The connection could not be opened.
    #[error("connection error: {0}")]
    Connection(String),
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The operation is not available for the dialect or object kind.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// Discovery was cancelled through the task's cancellation token.
    #[error("operation cancelled")]
    Cancelled,
    /// One or more discovery phases failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

impl Error {
    pub fn unsupported(dialect: Dialect, what: impl fmt::Display) -> Self {
        Error::Unsupported(format!("{what} is not supported by {dialect}"))
    }
}

/// Convenience alias for results returned by sqlmorph crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Discovery phases, in the order the catalog reader runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Connect,
    ServerVersion,
    Tables,
    Columns,
    ForeignKeys,
    Indexes,
    Constraints,
    Triggers,
    Attach,
    Views,
    Functions,
    StoredProcedures,
    DataTypes,
    Sequences,
    Schemas,
    Users,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Connect => "connect",
            Phase::ServerVersion => "server_version",
            Phase::Tables => "tables",
            Phase::Columns => "columns",
            Phase::ForeignKeys => "foreign_keys",
            Phase::Indexes => "indexes",
            Phase::Constraints => "constraints",
            Phase::Triggers => "triggers",
            Phase::Attach => "attach",
            Phase::Views => "views",
            Phase::Functions => "functions",
            Phase::StoredProcedures => "stored_procedures",
            Phase::DataTypes => "data_types",
            Phase::Sequences => "sequences",
            Phase::Schemas => "schemas",
            Phase::Users => "users",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recoverable failure recorded while discovering a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseError {
    pub phase: Phase,
    pub dialect: Dialect,
    pub message: String,
}

impl PhaseError {
    pub fn new(phase: Phase, dialect: Dialect, message: impl Into<String>) -> Self {
        Self {
            phase,
            dialect,
            message: message.into(),
        }
    }
}

impl fmt::Display for PhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} catalog query for {} failed: {}",
            self.dialect, self.phase, self.message
        )
    }
}

/// Aggregate of every phase failure raised during one discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryError {
    pub database: String,
    pub errors: Vec<PhaseError>,
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "discovery of '{}' completed with {} failed phase(s)",
            self.database,
            self.errors.len()
        )?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DiscoveryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_lists_every_phase() {
        let err = DiscoveryError {
            database: "shop".to_string(),
            errors: vec![
                PhaseError::new(Phase::Views, Dialect::Postgres, "permission denied"),
                PhaseError::new(Phase::Sequences, Dialect::Postgres, "relation missing"),
            ],
        };

        let text = err.to_string();
        assert!(text.contains("2 failed phase(s)"));
        assert!(text.contains("postgres catalog query for views failed: permission denied"));
        assert!(text.contains("sequences failed: relation missing"));
    }
}
