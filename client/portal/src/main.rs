use bookshelf_common::{init_tracing, shutdown_signal};
use bookshelf_portal::{
    api::HttpBackend, load_config, render, store::FileStore, Portal, PortalConfig,
};
use std::sync::Arc;

#[cfg(feature = "gui")]
mod gui;

const APP_NAME: &str = "bookshelf-portal";

fn build_portal(config: PortalConfig) -> Result<Portal, bookshelf_portal::error::ApiError> {
    let backend = HttpBackend::new(&config.api_base, config.request_timeout)?;
    let store = FileStore::open(config.state_path.clone());
    tracing::info!(
        api_base = %backend.base_url(),
        state_path = %store.path().display(),
        "backend ready"
    );
    Ok(Portal::new(config, Arc::new(backend), Arc::new(store)))
}

/// Runs the timers without a window and prints the book list whenever a
/// refresh lands, until ctrl-c or SIGTERM.
async fn run_headless() {
    // Load config from file and env; env wins.
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to load config");
            return;
        }
    };
    let portal = match build_portal(config) {
        Ok(portal) => portal,
        Err(err) => {
            tracing::error!(error = %err, "failed to build http client");
            return;
        }
    };

    let tick = portal.config().countdown_tick;
    portal.start();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut last_printed: Option<String> = None;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(tick) => {
                let state = portal.snapshot().await;
                let catalog = render::render_catalog(&state);
                // The countdown line changes every tick; compare without it.
                let body = catalog
                    .rsplit_once('\n')
                    .map(|(body, _)| body.to_string())
                    .unwrap_or_default();
                if last_printed.as_deref() != Some(body.as_str()) {
                    println!("{catalog}");
                    last_printed = Some(body);
                }
            }
        }
    }
    portal.stop().await;
}

#[cfg(feature = "gui")]
fn main() {
    if std::env::args().any(|arg| arg == "--headless") {
        let _guards = init_tracing(APP_NAME);
        match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(run_headless()),
            Err(err) => tracing::error!(error = %err, "failed to start tokio runtime"),
        }
        return;
    }
    gui::run();
}

#[cfg(not(feature = "gui"))]
#[tokio::main]
async fn main() {
    let _guards = init_tracing(APP_NAME);
    run_headless().await;
}
