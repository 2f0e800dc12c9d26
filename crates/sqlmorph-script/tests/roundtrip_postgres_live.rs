use anyhow::{Context, Result};
use std::env;

use sqlmorph_core::{ConnectionUrl, Database, Dialect, NameMatching, map_databases};
use sqlmorph_introspect::{
    ConnectionContext, DatabaseProvider, IntrospectOptions, PgContext, TaskInfo,
};
use sqlmorph_script::{ScriptOptions, diff_databases, scripter_for};

const FIXTURE: &str = include_str!("../../sqlmorph-introspect/tests/fixtures/postgres_shop.sql");

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .ok()
        .filter(|url| url.starts_with("postgres"))
}

async fn discover_shop(url: &ConnectionUrl) -> Result<Database> {
    let options = IntrospectOptions {
        schemas: Some(vec!["shop".into()]),
        ..IntrospectOptions::default()
    };
    let provider = DatabaseProvider::with_options(url.clone(), options);
    let discovery = provider.get_database(&TaskInfo::new("roundtrip")).await?;
    anyhow::ensure!(discovery.is_complete(), "{:?}", discovery.errors);
    let mut database = discovery.database;
    // Roles are cluster-wide and outlive the schema.
    database.users.clear();
    Ok(database)
}

#[tokio::test]
async fn drop_then_create_reproduces_the_schema() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set to a postgres URL; skipping");
        return Ok(());
    };
    let url = ConnectionUrl::parse(&url)?;

    let ctx = PgContext::new(url.clone());
    ctx.open_connection().await?;
    ctx.execute_non_query(FIXTURE)
        .await
        .context("loading postgres fixture")?;

    let mut original = discover_shop(&url).await?;
    let scripter = scripter_for(Dialect::Postgres, ScriptOptions::default());

    let drop = scripter.generate_full_drop_script(&original)?;
    let create = scripter.generate_full_create_script(&original)?;
    ctx.execute_non_query(&drop)
        .await
        .with_context(|| format!("running drop script:\n{drop}"))?;

    let emptied = discover_shop(&url).await?;
    assert!(emptied.tables.is_empty(), "tables left after drop");
    assert!(emptied.views.is_empty(), "views left after drop");

    ctx.execute_non_query(&create)
        .await
        .with_context(|| format!("running create script:\n{create}"))?;

    let mut recreated = discover_shop(&url).await?;
    map_databases(&mut original, &mut recreated, NameMatching::Ordinal);
    let comparison = diff_databases(scripter.as_ref(), &original, &recreated)?;
    let changed: Vec<_> = comparison
        .items
        .iter()
        .filter(|item| item.status != sqlmorph_script::DiffStatus::Unchanged)
        .map(|item| item.key.to_string())
        .collect();
    assert!(changed.is_empty(), "differences after round trip: {changed:?}");

    Ok(())
}
