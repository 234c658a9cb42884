//! Pulse monitor entry point
//!
//! Connects to `SOCKET_URL`, logs every incoming message and raises toasts
//! when the connection opens, drops or gives up reconnecting.
//!
//! Run with:
//! ```bash
//! SOCKET_URL=ws://localhost:8080/ws cargo run -p pulse-socket --bin pulse-monitor
//! ```

use pulse_common::{try_init_tracing_with_config, AppConfig, AppError, AppResult, TracingConfig};
use pulse_core::{Toast, ToastConfig, ToastHandle, ToastInput, ToastStore};
use pulse_socket::{ReadyState, SocketConfig, SocketManager, SocketSnapshot};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

const CONNECTED_TOAST_DURATION: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    let tracing_config = config.as_ref().map_or_else(
        |_| TracingConfig::default(),
        |config| TracingConfig::for_environment(config.app.env),
    );
    if let Err(e) = try_init_tracing_with_config(&tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let result = match config {
        Ok(config) => run(config).await,
        Err(e) => Err(AppError::from(e)),
    };

    if let Err(e) = result {
        error!(error = %e, code = e.error_code(), "pulse-monitor failed");
        std::process::exit(e.exit_code());
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    info!(
        app = %config.app.name,
        env = ?config.app.env,
        url = %config.socket.url,
        "Starting pulse-monitor"
    );

    let toasts = ToastStore::new(ToastConfig::from(&config.toast))?;
    let socket = SocketManager::start(SocketConfig::from(&config.socket))
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let mut status = StatusToasts::new(toasts.clone());
    let mut states = socket.watch();
    let mut messages = socket.messages();
    let mut changes = toasts.subscribe();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.map_err(AppError::internal)?;
                info!("Shutdown requested");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    warn!("Socket driver stopped unexpectedly");
                    toasts.shutdown();
                    return Err(driver_stopped());
                }
                let snapshot = states.borrow_and_update().clone();
                status.observe(&snapshot);
            }
            message = messages.recv() => match message {
                Ok(message) => info!(json = message.is_json(), %message, "Message received"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Message subscriber lagged"),
                Err(RecvError::Closed) => break,
            },
            change = changes.recv() => match change {
                Ok(list) => log_toasts(&list),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Toast subscriber lagged, resyncing");
                    log_toasts(&toasts.toasts());
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    socket.shutdown().await;
    toasts.shutdown();
    info!("pulse-monitor stopped");
    Ok(())
}

/// The driver only exits on teardown, so losing it mid-run is a connection failure
fn driver_stopped() -> AppError {
    AppError::connection("socket driver stopped unexpectedly")
}

fn log_toasts(list: &[Toast]) {
    let titles: Vec<&str> = list
        .iter()
        .filter(|toast| toast.open)
        .filter_map(|toast| toast.title.as_deref())
        .collect();
    info!(visible = list.len(), ?titles, "Toasts changed");
}

/// Turns connection state changes into toasts
struct StatusToasts {
    store: ToastStore,
    last_state: ReadyState,
    exhausted: bool,
    current: Option<ToastHandle>,
}

impl StatusToasts {
    fn new(store: ToastStore) -> Self {
        Self {
            store,
            last_state: ReadyState::Closed,
            exhausted: false,
            current: None,
        }
    }

    fn observe(&mut self, snapshot: &SocketSnapshot) {
        if snapshot.ready_state != self.last_state {
            match snapshot.ready_state {
                ReadyState::Open => self.show(
                    ToastInput::new()
                        .title("Connected")
                        .description("Live updates are flowing")
                        .duration(CONNECTED_TOAST_DURATION),
                ),
                ReadyState::Closed if snapshot.reconnect_pending => {
                    self.show(
                        ToastInput::new()
                            .title("Connection lost")
                            .description(format!(
                                "Reconnecting (attempt {})",
                                snapshot.reconnect_attempts
                            ))
                            .destructive(),
                    );
                }
                _ => {}
            }
            self.last_state = snapshot.ready_state;
        }

        if snapshot.exhausted && !self.exhausted {
            let detail = snapshot
                .last_error
                .as_ref()
                .map_or_else(|| "Connection closed".to_string(), ToString::to_string);
            self.show(
                ToastInput::new()
                    .title("Unable to connect")
                    .description(format!(
                        "Gave up after {} attempts: {detail}",
                        snapshot.reconnect_attempts
                    ))
                    .destructive(),
            );
        }
        self.exhausted = snapshot.exhausted;
    }

    fn show(&mut self, input: ToastInput) {
        if let Some(previous) = self.current.take() {
            previous.dismiss();
        }
        self.current = Some(self.store.show(input));
    }
}
