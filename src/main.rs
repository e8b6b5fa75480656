// Entrypoint for the CLI application.
// - Keeps `main` small: read config, open the state file, build the API
//   clients and hand them to the UI loop.
// - Logs go to stderr so they don't interleave with the menu on stdout.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use devportal_cli::{
    api::ApiClient,
    config::Config,
    storage::Storage,
    third_party::ThirdPartyClient,
    ui::{sign_out_on_unauthorized, App, PromptWallet},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log).unwrap_or_else(|_| EnvFilter::new("devportal_cli=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let state_file = config.state_file()?;
    let storage = Arc::new(
        Storage::open(&state_file)
            .with_context(|| format!("Failed to open {}", state_file.display()))?,
    );
    tracing::debug!(api = %config.api_url, "starting developer portal");

    let wallet = Arc::new(PromptWallet::new());
    let api = ApiClient::from_config(&config, Arc::clone(&storage))?
        .on_unauthorized(sign_out_on_unauthorized(Arc::clone(&storage), Arc::clone(&wallet)));
    let third_party = ThirdPartyClient::new(config.third_party_url.clone(), config.timeout())?;

    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    // Start the interactive menu. This call blocks until the user exits.
    App::new(rt, api, third_party, wallet).main_menu()?;
    Ok(())
}
