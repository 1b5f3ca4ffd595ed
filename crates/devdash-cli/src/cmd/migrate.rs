use anyhow::Context;
use devdash_core::config::{Config, DATABASE_URL_ENV};
use devdash_core::store::PgProjectStore;
use std::path::Path;

/// Apply the versioned Postgres schema. Stores never do this on their own.
pub fn run(root: &Path, database_url: Option<String>) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let url = database_url
        .or_else(|| config.store.database_url())
        .with_context(|| {
            format!("no database URL: pass --database-url or set {DATABASE_URL_ENV}")
        })?;

    let rt = super::runtime()?;
    rt.block_on(async {
        let store = PgProjectStore::connect(&url, config.store.timeout())
            .await
            .context("failed to connect to database")?;
        store.migrate().await.context("migration failed")?;
        anyhow::Ok(())
    })?;

    println!("Schema is up to date.");
    Ok(())
}
