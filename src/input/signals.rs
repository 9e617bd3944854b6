use crate::events::{BoothEvent, EventSender};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Turns SIGINT and SIGTERM into `Shutdown` events
#[derive(Default)]
pub struct SignalWatcher {
    tasks: Vec<JoinHandle<()>>,
}

impl SignalWatcher {
    pub fn start(events: EventSender) -> Self {
        let mut tasks = Vec::new();

        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let events = events.clone();
            tasks.push(tokio::spawn(async move {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        while sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            events.send(BoothEvent::Shutdown);
                        }
                    }
                    Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
                }
            }));
        }

        tasks.push(tokio::spawn(async move {
            loop {
                match signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Received SIGINT signal (Ctrl+C)");
                        events.send(BoothEvent::Shutdown);
                    }
                    Err(e) => {
                        warn!("Failed to listen for SIGINT: {}", e);
                        break;
                    }
                }
            }
        }));

        Self { tasks }
    }

    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
