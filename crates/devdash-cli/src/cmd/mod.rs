pub mod chat;
pub mod check;
pub mod migrate;
pub mod project;
pub mod serve;

use anyhow::Context;
use devdash_core::config::Config;
use devdash_core::http::ApiClient;
use std::path::Path;

/// Load config and build a client for the server the command talks to:
/// `--server` when given, otherwise the local server on `server.port`.
pub(crate) fn connect(root: &Path, server: Option<&str>) -> anyhow::Result<(Config, ApiClient)> {
    let config = Config::load(root).context("failed to load config")?;
    let url = server_url(&config, server);
    let api = ApiClient::new(url, config.store.timeout())?;
    Ok((config, api))
}

fn server_url(config: &Config, explicit: Option<&str>) -> String {
    match explicit {
        Some(url) => url.to_string(),
        None => format!("http://localhost:{}", config.server.port),
    }
}

/// Current-thread runtime for one command.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
