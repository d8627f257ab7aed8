//! Entry point for the `skill-gateway` HTTP server.

use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;
use skill_gateway::{
    routes::create_router,
    settings::{remediation, Cli, Settings},
    shutdown_signal,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "skill_gateway=info,skill_vendors=info,tower_http=info";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .init();

    let cli = Cli::parse();
    let settings = match Settings::resolve(&cli) {
        Ok(s) => s,
        Err(e) => {
            let path = cli.config_path().ok();
            eprintln!("{}", remediation(cli.skill, path.as_deref(), &e));
            std::process::exit(2);
        }
    };

    for (key, fingerprint) in &settings.loaded.credentials {
        info!(skill = %settings.kind, key, fingerprint = %fingerprint, "credential loaded");
    }

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, settings.port));
    let app = create_router(settings.loaded.proxy);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(
        skill = %settings.kind,
        addr = %addr,
        config = %settings.config_path.display(),
        "skill-gateway listening"
    );

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
    info!("skill-gateway stopped");
}
