//! Core contracts and helpers for sqlmorph.
//!
//! This crate defines the cross-dialect schema object model, dialect and
//! server-version capabilities, the mapper that pairs two databases, and the
//! error types shared by the catalog readers, scripters and the CLI.

pub mod connection;
pub mod dialect;
pub mod error;
pub mod graph;
pub mod mapping;
pub mod model;
pub mod validation;
pub mod version;

pub use connection::{ConnectionUrl, RedactedConnection, redact_connection_string};
pub use dialect::{Capabilities, Dialect, DialectFamily};
pub use error::{DiscoveryError, Error, Phase, PhaseError, Result};
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report, table_creation_order};
pub use mapping::{MappingCounts, MappingSummary, NameMatching, map_databases};
pub use model::*;
pub use validation::validate_database;
pub use version::ServerVersion;

/// Version of the `Database` snapshot JSON contract.
pub const SNAPSHOT_VERSION: &str = "0.1";
