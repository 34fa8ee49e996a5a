//! BSE announcement notifier: binary entrypoint.
//! Loads configuration, wires fetcher/notifier/store, and runs the poll loop
//! until Ctrl-C / SIGTERM.

use anyhow::Context;
use bse_announce_notifier::{build_poller, metrics, telemetry, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = AppConfig::from_env().context("configuration")?;
    tracing::info!(?cfg, "starting");

    if let Some(addr) = cfg.metrics_addr {
        metrics::install_exporter(addr)?;
    }

    let mut poller = build_poller(&cfg).await?;

    if cfg.run_once {
        poller.tick().await;
        return Ok(());
    }

    poller.run(cfg.poll_interval, shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("ctrl-c handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
