use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use coffee_orders::app_system::{setup_tracing, CoffeeShop};
use coffee_orders::config::Config;
use coffee_orders::http::router;

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = Config::load().map_err(|e| {
        error!(error = %e, "Configuration rejected");
        e.to_string()
    })?;

    let system = CoffeeShop::start(&config).await.map_err(|e| e.to_string())?;
    let app = router(system.state(), &config.client_url);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await.map_err(|e| e.to_string())?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| e.to_string())?;

    // Upgraded WebSocket tasks may still hold state clones; those are cut
    // off by the shutdown timeout.
    if let Err(e) = system.shutdown().await {
        error!(error = %e, "Unclean shutdown");
    }

    info!("Application completed successfully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
