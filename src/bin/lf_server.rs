//! Entry point for the Leader-Follower reactor server.

use clap::Parser;
use mstgraph::config::LfServerConfig;
use mstgraph::lf_server;
use mstgraph::shutdown::ShutdownCoordinator;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = LfServerConfig::parse();
    let shutdown = match ShutdownCoordinator::install() {
        Ok(coordinator) => coordinator,
        Err(err) => {
            tracing::error!(error = %err, "failed to install shutdown handler");
            std::process::exit(1);
        }
    };

    if let Err(err) = lf_server::run(config, shutdown) {
        tracing::error!(error = %err, "lf server exited with an error");
        std::process::exit(1);
    }
}
