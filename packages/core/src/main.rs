use clap::Parser;
use dotenvy::dotenv;

use coupon_poster::cli::Cli;
use coupon_poster::config::Config;
use coupon_poster::error::AppError;
use coupon_poster::logging::init_logging;
use coupon_poster::run::{run_once, Collaborators};
use coupon_poster::services::feed::FeedClient;
use coupon_poster::services::graph::GraphClient;
use coupon_poster::state::StateStore;
use coupon_poster::sync;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    let config = Config::from_env()
        .and_then(|config| config.apply_cli(&cli))
        .map_err(AppError::Config)
        .unwrap_or_else(|err| exit_with(err));

    tracing::info!("Coupon run started with config: {:?}", config);

    let source = FeedClient::new(config.feed_url.clone(), config.request_timeout())
        .unwrap_or_else(|err| exit_with(err));
    let api = GraphClient::new(
        config.graph_api_url.clone(),
        config.page_id.clone(),
        config.access_token.clone(),
        config.request_timeout(),
    )
    .unwrap_or_else(|err| exit_with(err));
    let durable_sync = sync::from_config(&config);
    let store = StateStore::new(config.state_file.clone());

    let deps = Collaborators {
        source: &source,
        api: &api,
        sync: &*durable_sync,
        store: &store,
    };

    let outcome = run_once(&config, &deps).await;
    tracing::debug!("Run finished: {:?}", outcome);

    std::process::exit(outcome.exit_code());
}

fn exit_with(err: AppError) -> ! {
    tracing::error!("{}", err);
    std::process::exit(err.exit_code());
}
