//! Running the reminder API on a socket.

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{router, AppState};
use crate::scheduler::ReminderScheduler;

/// Serve until Ctrl-C, then drop all pending jobs.
pub async fn serve(addr: SocketAddr, scheduler: ReminderScheduler) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind reminder server to {addr}"))?;
    let local = listener.local_addr().context("read bound address")?;
    info!(addr = %local, "UniFlow notification server listening on http://{local}");

    run(listener, scheduler, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
    })
    .await
}

async fn run(
    listener: TcpListener,
    scheduler: ReminderScheduler,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(AppState::new(scheduler.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("reminder server")?;

    let dropped = scheduler.shutdown();
    info!(dropped, "reminder server stopped; pending jobs dropped");
    Ok(())
}

/// Reminder server running on a background task.
pub struct ReminderServer {
    addr: SocketAddr,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl ReminderServer {
    /// Bind `addr` (port 0 picks a free port) and start serving in the background.
    pub async fn start(addr: SocketAddr, scheduler: ReminderScheduler) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("bind reminder server to {addr}"))?;
        let addr = listener.local_addr().context("read bound address")?;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(run(listener, scheduler, async {
            let _ = stop_rx.await;
        }));
        info!(%addr, "reminder server started");

        Ok(Self {
            addr,
            stop_tx: Some(stop_tx),
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        self.handle.await.context("reminder server task panicked")?
    }
}
