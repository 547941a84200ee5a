use std::sync::Arc;

use opencravat_mcp::{
    build_app,
    config::{Config, Transport},
    cravat_client::{CravatClient, Endpoints},
    http::sse::SSE_PATH,
    logging,
    mcp::stdio::serve_stdio,
    AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;

    let client = CravatClient::new(
        Endpoints {
            api_base: config.api_base.clone(),
            store_base: config.store_base.clone(),
            protein_lookup: config.protein_lookup_url.clone(),
        },
        config.upstream_timeout,
    )?;
    let state = AppState::new(config.default_annotators.clone(), Arc::new(client));

    match config.transport {
        Transport::Stdio => serve_stdio(state).await?,
        Transport::Http => {
            let bind_socket = config.bind_socket()?;
            let app = build_app(state);
            let listener = tokio::net::TcpListener::bind(bind_socket).await?;

            info!(
                bind_addr = %config.bind_addr,
                bind_port = config.bind_port,
                api_base = %config.api_base,
                sse_endpoint = SSE_PATH,
                "server starting"
            );

            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}
