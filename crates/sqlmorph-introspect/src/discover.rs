use std::time::Instant;

use serde::de::DeserializeOwned;

use sqlmorph_core::{
    Database, DiscoveryError, Error, Phase, PhaseError, Result, ServerVersion,
};

use crate::catalog::{CatalogEnv, CatalogReader};
use crate::context::{ConnectionContext, query_as, query_single_column};
use crate::mapper;
use crate::options::IntrospectOptions;
use crate::raw::{
    RawColumn, RawConstraintColumn, RawDataType, RawForeignKeyColumn, RawIndexColumn, RawRoutine,
    RawSchema, RawSequence, RawTable, RawTrigger, RawUser, RawView,
};
use crate::task::TaskInfo;

/// A discovered database plus the phases that failed along the way.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub database: Database,
    pub errors: Vec<PhaseError>,
}

impl Discovery {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Treat any phase failure as an error.
    pub fn into_result(self) -> std::result::Result<Database, DiscoveryError> {
        if self.errors.is_empty() {
            Ok(self.database)
        } else {
            Err(DiscoveryError {
                database: self.database.name,
                errors: self.errors,
            })
        }
    }
}

struct Run<'a> {
    ctx: &'a dyn ConnectionContext,
    task: &'a TaskInfo,
    env: CatalogEnv,
    errors: Vec<PhaseError>,
}

impl Run<'_> {
    fn enter(&self, phase: Phase, percent: u8, message: &str) -> Result<()> {
        self.task.check_cancelled()?;
        self.task.report(percent, message);
        tracing::debug!(
            event = "discovery_phase",
            phase = phase.as_str(),
            dialect = self.env.dialect.name(),
        );
        Ok(())
    }

    /// Run one phase query; failures are recorded and yield an empty result.
    async fn rows<T: DeserializeOwned>(&mut self, phase: Phase, sql: Option<String>) -> Vec<T> {
        let Some(sql) = sql else {
            return Vec::new();
        };
        let started = Instant::now();
        match query_as::<T, _>(self.ctx, &sql).await {
            Ok(rows) => {
                tracing::debug!(
                    event = "catalog_query",
                    phase = phase.as_str(),
                    count = rows.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                );
                rows
            }
            Err(err) => {
                tracing::warn!(
                    event = "catalog_query_failed",
                    phase = phase.as_str(),
                    dialect = self.env.dialect.name(),
                    error = %err,
                );
                self.errors
                    .push(PhaseError::new(phase, self.env.dialect, err.to_string()));
                Vec::new()
            }
        }
    }
}

/// Discover the schema reachable through `ctx`.
///
/// Only a failure to open the connection (or cancellation) is fatal; every
/// other phase failure is recorded in [`Discovery::errors`] and discovery
/// continues with what it has.
pub async fn discover_database(
    ctx: &dyn ConnectionContext,
    reader: &dyn CatalogReader,
    options: &IntrospectOptions,
    task: &TaskInfo,
) -> Result<Discovery> {
    let started = Instant::now();
    let mut dialect = reader.dialect();

    task.check_cancelled()?;
    task.report(4, "Connecting");
    ctx.open_connection().await.map_err(|err| match err {
        Error::Connection(_) => err,
        other => Error::Connection(other.to_string()),
    })?;

    task.check_cancelled()?;
    task.report(8, "Reading server version");
    let version = match query_single_column::<String, _>(ctx, reader.server_version_query(), 0)
        .await
    {
        Ok(values) => {
            let text = values.into_iter().next().unwrap_or_default();
            dialect = reader.refine_dialect(&text);
            ServerVersion::parse(&text).unwrap_or_else(|| {
                tracing::warn!(event = "server_version_unparsed", version = %text);
                ServerVersion::MAX
            })
        }
        Err(err) => {
            tracing::warn!(
                event = "server_version_failed",
                dialect = dialect.name(),
                error = %err,
            );
            ServerVersion::MAX
        }
    };

    let mut database = Database::new(ctx.database_name(), dialect);
    database.server_version = version;
    let caps = database.capabilities();

    let mut run = Run {
        ctx,
        task,
        env: CatalogEnv::new(dialect, version, ctx.database_name()),
        errors: Vec::new(),
    };

    run.enter(Phase::Tables, 15, "Reading tables")?;
    let sql = reader.tables_query(&run.env);
    let tables: Vec<RawTable> = run.rows(Phase::Tables, Some(sql)).await;
    database.tables = mapper::map_tables(tables, reader);

    run.enter(Phase::Columns, 25, "Reading columns")?;
    let sql = reader.columns_query(&run.env);
    let columns: Vec<RawColumn> = run.rows(Phase::Columns, Some(sql)).await;
    let columns = mapper::map_columns(columns, reader);

    run.enter(Phase::ForeignKeys, 35, "Reading foreign keys")?;
    let sql = reader.foreign_keys_query(&run.env);
    let fks: Vec<RawForeignKeyColumn> = run.rows(Phase::ForeignKeys, Some(sql)).await;
    database.foreign_keys = mapper::group_foreign_keys(fks);

    run.enter(Phase::Indexes, 45, "Reading indexes")?;
    let sql = reader.indexes_query(&run.env);
    let indexes: Vec<RawIndexColumn> = run.rows(Phase::Indexes, Some(sql)).await;
    let indexes = mapper::group_indexes(indexes, reader);

    run.enter(Phase::Constraints, 50, "Reading constraints")?;
    let sql = reader.constraints_query(&run.env);
    let constraints: Vec<RawConstraintColumn> = run.rows(Phase::Constraints, sql).await;
    database.constraints = mapper::group_constraints(constraints);
    if !caps.check_constraints {
        database
            .constraints
            .retain(|constraint| constraint.kind != sqlmorph_core::ConstraintKind::Check);
    }

    run.enter(Phase::Triggers, 55, "Reading triggers")?;
    let sql = reader.triggers_query(&run.env);
    let triggers: Vec<RawTrigger> = run.rows(Phase::Triggers, Some(sql)).await;
    database.triggers = mapper::map_triggers(triggers);

    run.enter(Phase::Attach, 60, "Attaching table objects")?;
    let stats = mapper::attach(&mut database, columns, indexes);
    if stats.orphan_columns > 0 || stats.orphan_objects > 0 {
        tracing::debug!(
            event = "attach_orphans",
            columns = stats.orphan_columns,
            objects = stats.orphan_objects,
        );
    }

    run.enter(Phase::Views, 65, "Reading views")?;
    let sql = reader.views_query(&run.env);
    let views: Vec<RawView> = run.rows(Phase::Views, Some(sql)).await;
    database.views = mapper::map_views(views);
    mapper::attach_view_indexes(&mut database);

    run.enter(Phase::Functions, 70, "Reading functions")?;
    if caps.functions && !options.skip_routines {
        let sql = reader.functions_query(&run.env);
        let functions: Vec<RawRoutine> = run.rows(Phase::Functions, Some(sql)).await;
        database.functions = mapper::map_functions(functions, reader);
    }

    run.enter(Phase::StoredProcedures, 75, "Reading stored procedures")?;
    if caps.stored_procedures && !options.skip_routines {
        let sql = reader.stored_procedures_query(&run.env);
        let procedures: Vec<RawRoutine> = run.rows(Phase::StoredProcedures, sql).await;
        database.stored_procedures = mapper::map_stored_procedures(procedures, reader);
    }

    run.enter(Phase::DataTypes, 82, "Reading data types")?;
    if caps.user_defined_types && !options.skip_types {
        let sql = reader.data_types_query(&run.env);
        let types: Vec<RawDataType> = run.rows(Phase::DataTypes, sql).await;
        database.data_types = mapper::map_data_types(types, reader);
    }

    run.enter(Phase::Sequences, 88, "Reading sequences")?;
    if caps.sequences {
        let sql = reader.sequences_query(&run.env);
        let sequences: Vec<RawSequence> = run.rows(Phase::Sequences, sql).await;
        database.sequences = mapper::map_sequences(sequences);
    } else {
        tracing::debug!(
            event = "phase_skipped",
            phase = Phase::Sequences.as_str(),
            version = %version,
        );
    }

    run.enter(Phase::Schemas, 92, "Reading schemas")?;
    if caps.schemas {
        let sql = reader.schemas_query(&run.env);
        let schemas: Vec<RawSchema> = run.rows(Phase::Schemas, sql).await;
        database.schemas = mapper::map_schemas(schemas);
    }

    run.enter(Phase::Users, 96, "Reading users")?;
    let sql = reader.users_query(&run.env);
    let users: Vec<RawUser> = run.rows(Phase::Users, Some(sql)).await;
    database.users = mapper::map_users(users);

    task.check_cancelled()?;
    let database = options.apply(database);
    task.report(100, "Done");

    tracing::info!(
        event = "discovery_finished",
        database = %database.name,
        dialect = dialect.name(),
        version = %version,
        tables = database.tables.len(),
        views = database.views.len(),
        failed_phases = run.errors.len(),
        duration_ms = started.elapsed().as_millis() as u64,
    );

    Ok(Discovery {
        database,
        errors: run.errors,
    })
}
