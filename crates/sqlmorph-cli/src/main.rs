mod config;
mod registry;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlmorph_core::{
    ConnectionUrl, Database, DiscoveryError, Error as CoreError, NameMatching, ObjectKind,
    build_fk_graph_report, map_databases, validate_database,
};
use sqlmorph_introspect::{DatabaseProvider, IntrospectOptions, TaskInfo};
use sqlmorph_script::{Scripter, diff_databases, scripter_for};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use config::{DEFAULT_CONFIG_FILE, Settings, create_settings, load_settings, write_bytes_atomic};
use registry::{
    RunContext, RunOptions, RunPaths, export, init_run_logging, init_stderr_logging, start_run,
    write_artifact_json, write_artifact_text,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    Discovery(#[from] DiscoveryError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(
    name = "sqlmorph",
    version,
    about = "Schema discovery, scripting and comparison for SQL Server, MySQL/MariaDB and PostgreSQL"
)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Output directory for runs (overrides `run_dir` from the config file).
    #[arg(long, global = true)]
    run_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the user databases on a server.
    Databases(DatabasesArgs),
    /// Discover a database and write its snapshot as JSON.
    Introspect(IntrospectArgs),
    /// Generate the full create or drop script of a database.
    Script(ScriptArgs),
    /// Compare two databases and script the changes that turn target into source.
    Diff(DiffArgs),
    /// Print the JSON Schema of the snapshot format.
    JsonSchema(JsonSchemaArgs),
    /// Write a default configuration file.
    Init(InitArgs),
}

/// Discovery flags shared by every command that reads a database.
#[derive(Args, Debug, Default)]
struct DiscoveryArgs {
    /// Schema name(s) to include.
    #[arg(long, value_name = "SCHEMA")]
    schema: Vec<String>,
    /// Include system schemas such as pg_catalog or sys.
    #[arg(long)]
    include_system_schemas: bool,
    /// Skip functions and stored procedures.
    #[arg(long)]
    skip_routines: bool,
    /// Skip user-defined data types.
    #[arg(long)]
    skip_types: bool,
    /// Fail when any catalog phase fails instead of reporting warnings.
    #[arg(long)]
    strict: bool,
}

impl DiscoveryArgs {
    fn apply(&self, mut options: IntrospectOptions) -> IntrospectOptions {
        if !self.schema.is_empty() {
            options.schemas = Some(self.schema.clone());
        }
        options.include_system_schemas |= self.include_system_schemas;
        options.skip_routines |= self.skip_routines;
        options.skip_types |= self.skip_types;
        options
    }
}

#[derive(Args, Debug)]
struct DatabasesArgs {
    /// Server connection string.
    #[arg(value_name = "CONNECTION_STRING")]
    url: String,
}

#[derive(Args, Debug)]
struct IntrospectArgs {
    /// Database connection string.
    #[arg(value_name = "CONNECTION_STRING")]
    url: String,
    #[command(flatten)]
    discovery: DiscoveryArgs,
    /// Optional copy of schema.json.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptMode {
    Create,
    Drop,
}

impl ScriptMode {
    fn artifact(self) -> &'static str {
        match self {
            ScriptMode::Create => "create.sql",
            ScriptMode::Drop => "drop.sql",
        }
    }
}

#[derive(Args, Debug)]
struct ScriptArgs {
    /// Database connection string.
    #[arg(value_name = "CONNECTION_STRING")]
    url: String,
    #[arg(long, value_enum)]
    mode: ScriptMode,
    #[command(flatten)]
    discovery: DiscoveryArgs,
    /// Leave out section banners.
    #[arg(long)]
    no_comments: bool,
    /// Write the script here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum MatchingArg {
    Ordinal,
    CaseInsensitive,
}

impl From<MatchingArg> for NameMatching {
    fn from(value: MatchingArg) -> Self {
        match value {
            MatchingArg::Ordinal => NameMatching::Ordinal,
            MatchingArg::CaseInsensitive => NameMatching::CaseInsensitive,
        }
    }
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Desired state.
    #[arg(long, value_name = "CONNECTION_STRING")]
    source: String,
    /// Database the alter script runs against.
    #[arg(long, value_name = "CONNECTION_STRING")]
    target: String,
    #[command(flatten)]
    discovery: DiscoveryArgs,
    /// How object names are paired (overrides `name_matching`).
    #[arg(long, value_enum)]
    name_matching: Option<MatchingArg>,
    /// Leave out section banners.
    #[arg(long)]
    no_comments: bool,
    /// Write the alter script here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct JsonSchemaArgs {
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init(args) => run_init(&cli.config, args),
        Command::JsonSchema(args) => run_json_schema(args),
        command => {
            let mut settings = load_settings(&cli.config)?;
            if let Some(run_dir) = cli.run_dir {
                settings.run_dir = run_dir;
            }
            let cancel = cancel_on_ctrl_c();
            let timer = Instant::now();
            let result = match command {
                Command::Databases(args) => run_databases(&settings, args).await,
                Command::Introspect(args) => run_introspect(&settings, args, cancel).await,
                Command::Script(args) => run_script(&settings, args, cancel).await,
                Command::Diff(args) => run_diff(&settings, args, cancel).await,
                Command::Init(_) | Command::JsonSchema(_) => Ok(()),
            };
            let duration_ms = timer.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(event = "run_finished", status = "success", duration_ms),
                Err(err) => tracing::error!(
                    event = "run_finished",
                    status = "failure",
                    duration_ms,
                    error = %err
                ),
            }
            result
        }
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(event = "cancel_requested");
            cancel.cancel();
        }
    });
    token
}

fn begin_run(
    command: &str,
    settings: &Settings,
    options: RunOptions,
    connections: &[(&str, &ConnectionUrl)],
) -> Result<RunPaths, CliError> {
    let ctx = RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: chrono::Utc::now(),
        command: command.to_string(),
        run_dir: settings.run_dir.clone(),
        options,
        connections: connections
            .iter()
            .map(|(role, url)| (role.to_string(), url.redacted()))
            .collect::<BTreeMap<_, _>>(),
    };

    let paths = start_run(&ctx)?;
    init_run_logging(&paths.logs_path)?;

    tracing::info!(
        event = "run_started",
        run_id = %ctx.run_id,
        command,
        config = %paths.config_path.display()
    );
    Ok(paths)
}

async fn discover(
    side: &str,
    url: ConnectionUrl,
    options: IntrospectOptions,
    strict: bool,
    cancel: CancellationToken,
    paths: &RunPaths,
) -> Result<Database, CliError> {
    let dialect = url.dialect;
    let provider = DatabaseProvider::with_options(url, options);
    let task = TaskInfo::with_token(side, cancel);
    let timer = Instant::now();

    tracing::info!(event = "discovery_started", side, dialect = dialect.name());
    let discovery = provider.get_database(&task).await?;

    let warnings: Vec<String> = discovery.errors.iter().map(ToString::to_string).collect();
    for error in &discovery.errors {
        tracing::warn!(
            event = "phase_failed",
            side,
            phase = error.phase.as_str(),
            message = %error.message
        );
    }
    if !warnings.is_empty() {
        write_artifact_json(paths, &format!("{side}.warnings.json"), &warnings)?;
    }

    let database = if strict {
        discovery.into_result()?
    } else {
        discovery.database
    };
    validate_database(&database)?;

    tracing::info!(
        event = "discovery_finished",
        side,
        database = %database.name,
        objects = ObjectKind::TOP_LEVEL.iter().map(|kind| database.len(*kind)).sum::<usize>(),
        warnings = warnings.len(),
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(database)
}

/// Write `text` to `out`, or print it when no path was given.
fn emit(text: &str, out: Option<&Path>) -> Result<(), CliError> {
    match out {
        Some(path) => {
            write_bytes_atomic(path, text.as_bytes())?;
            tracing::info!(event = "artifact_exported", path = %path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

async fn run_databases(settings: &Settings, args: DatabasesArgs) -> Result<(), CliError> {
    let url = ConnectionUrl::parse(&args.url)?;
    let options = RunOptions {
        strict: false,
        introspect: settings.introspect.clone(),
        script: None,
        name_matching: None,
    };
    let paths = begin_run("databases", settings, options, &[("server", &url)])?;

    let names = DatabaseProvider::new(url).get_database_list().await?;
    write_artifact_json(&paths, "databases.json", &names)?;
    tracing::info!(event = "databases_listed", count = names.len());

    for name in &names {
        println!("{name}");
    }
    Ok(())
}

async fn run_introspect(
    settings: &Settings,
    args: IntrospectArgs,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let url = ConnectionUrl::parse(&args.url)?;
    let options = args.discovery.apply(settings.introspect.clone());
    let run_options = RunOptions {
        strict: args.discovery.strict,
        introspect: options.clone(),
        script: None,
        name_matching: None,
    };
    let paths = begin_run("introspect", settings, run_options, &[("database", &url)])?;

    let database = discover(
        "database",
        url,
        options,
        args.discovery.strict,
        cancel,
        &paths,
    )
    .await?;

    let schema_path = write_artifact_json(&paths, "schema.json", &database)?;
    tracing::info!(event = "schema_written", path = %schema_path.display());

    let graph = build_fk_graph_report(&database);
    if let Some(cycle) = &graph.cycle {
        tracing::warn!(event = "fk_cycle", tables = %cycle.join(" -> "));
    }
    write_artifact_json(&paths, "fk_graph.json", &graph)?;

    if let Some(out) = &args.out {
        export(&schema_path, out)?;
    }
    Ok(())
}

async fn run_script(
    settings: &Settings,
    args: ScriptArgs,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let url = ConnectionUrl::parse(&args.url)?;
    let options = args.discovery.apply(settings.introspect.clone());
    let mut script_options = settings.script.clone();
    if args.no_comments {
        script_options.include_comments = false;
    }
    let run_options = RunOptions {
        strict: args.discovery.strict,
        introspect: options.clone(),
        script: Some(script_options.clone()),
        name_matching: None,
    };
    let paths = begin_run("script", settings, run_options, &[("database", &url)])?;

    let database = discover(
        "database",
        url,
        options,
        args.discovery.strict,
        cancel,
        &paths,
    )
    .await?;

    let scripter = scripter_for(database.dialect, script_options);
    let script = match args.mode {
        ScriptMode::Create => scripter.generate_full_create_script(&database)?,
        ScriptMode::Drop => scripter.generate_full_drop_script(&database)?,
    };
    let path = write_artifact_text(&paths, args.mode.artifact(), &script)?;
    tracing::info!(event = "script_written", path = %path.display(), bytes = script.len());

    emit(&script, args.out.as_deref())
}

async fn run_diff(
    settings: &Settings,
    args: DiffArgs,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let source_url = ConnectionUrl::parse(&args.source)?;
    let target_url = ConnectionUrl::parse(&args.target)?;
    if source_url.dialect.family() != target_url.dialect.family() {
        return Err(CliError::InvalidConfig(format!(
            "cannot compare {} with {}",
            source_url.dialect, target_url.dialect
        )));
    }

    let options = args.discovery.apply(settings.introspect.clone());
    let matching = args
        .name_matching
        .map(NameMatching::from)
        .unwrap_or(settings.name_matching);
    let mut script_options = settings.script.clone();
    if args.no_comments {
        script_options.include_comments = false;
    }
    let run_options = RunOptions {
        strict: args.discovery.strict,
        introspect: options.clone(),
        script: Some(script_options.clone()),
        name_matching: Some(matching),
    };
    let paths = begin_run(
        "diff",
        settings,
        run_options,
        &[("source", &source_url), ("target", &target_url)],
    )?;

    let strict = args.discovery.strict;
    let (mut source, mut target) = tokio::try_join!(
        discover(
            "source",
            source_url,
            options.clone(),
            strict,
            cancel.clone(),
            &paths
        ),
        discover("target", target_url, options, strict, cancel, &paths),
    )?;

    let mapping = map_databases(&mut source, &mut target, matching);
    write_artifact_json(&paths, "mapping.json", &mapping)?;
    tracing::info!(event = "databases_mapped", matched = mapping.matched());

    let scripter = scripter_for(target.dialect, script_options);
    let comparison = diff_databases(scripter.as_ref(), &source, &target)?;
    write_artifact_json(&paths, "comparison.json", &comparison)?;

    let counts = comparison.counts();
    tracing::info!(
        event = "diff_summary",
        modified = counts.get("modified").copied().unwrap_or(0),
        only_source = counts.get("only_source").copied().unwrap_or(0),
        only_target = counts.get("only_target").copied().unwrap_or(0),
        unchanged = counts.get("unchanged").copied().unwrap_or(0),
    );

    let script = scripter.generate_full_alter_script(&source, &target, &comparison)?;
    let path = write_artifact_text(&paths, "alter.sql", &script)?;
    tracing::info!(event = "script_written", path = %path.display(), bytes = script.len());

    if comparison.is_identical() {
        eprintln!("databases are identical");
        return Ok(());
    }
    emit(&script, args.out.as_deref())
}

fn run_json_schema(args: JsonSchemaArgs) -> Result<(), CliError> {
    init_stderr_logging()?;
    let schema = schemars::schema_for!(Database);
    let mut text = serde_json::to_string_pretty(&schema)?;
    text.push('\n');
    emit(&text, args.out.as_deref())
}

fn run_init(path: &Path, args: InitArgs) -> Result<(), CliError> {
    init_stderr_logging()?;
    create_settings(path, args.force)?;
    tracing::info!(event = "config_written", path = %path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_takes_both_sides_and_name_matching() {
        let cli = Cli::try_parse_from([
            "sqlmorph",
            "diff",
            "--source",
            "postgres://app@dev/shop",
            "--target",
            "postgres://app@prod/shop",
            "--name-matching",
            "case-insensitive",
            "--schema",
            "sales",
        ])
        .unwrap();

        let Command::Diff(args) = cli.command else {
            panic!("expected diff");
        };
        assert_eq!(args.name_matching, Some(MatchingArg::CaseInsensitive));
        assert_eq!(args.discovery.schema, vec!["sales".to_string()]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn script_requires_a_mode() {
        assert!(Cli::try_parse_from(["sqlmorph", "script", "mysql://root@localhost/shop"]).is_err());

        let cli = Cli::try_parse_from([
            "sqlmorph",
            "--run-dir",
            "/tmp/runs",
            "script",
            "mysql://root@localhost/shop",
            "--mode",
            "drop",
        ])
        .unwrap();
        assert_eq!(cli.run_dir, Some(PathBuf::from("/tmp/runs")));
        let Command::Script(args) = cli.command else {
            panic!("expected script");
        };
        assert_eq!(args.mode, ScriptMode::Drop);
        assert_eq!(args.mode.artifact(), "drop.sql");
    }

    #[test]
    fn flags_extend_configured_discovery_options() {
        let configured = IntrospectOptions {
            skip_types: true,
            schemas: Some(vec!["dbo".into()]),
            ..IntrospectOptions::default()
        };

        let untouched = DiscoveryArgs::default().apply(configured.clone());
        assert_eq!(untouched, configured);

        let flags = DiscoveryArgs {
            schema: vec!["sales".into(), "hr".into()],
            skip_routines: true,
            ..DiscoveryArgs::default()
        };
        let merged = flags.apply(configured);
        assert_eq!(merged.schemas, Some(vec!["sales".into(), "hr".into()]));
        assert!(merged.skip_routines);
        assert!(merged.skip_types);
    }

    #[test]
    fn matching_flag_maps_onto_core_enum() {
        assert_eq!(
            NameMatching::from(MatchingArg::CaseInsensitive),
            NameMatching::CaseInsensitive
        );
        assert_eq!(NameMatching::from(MatchingArg::Ordinal), NameMatching::Ordinal);
    }
}
