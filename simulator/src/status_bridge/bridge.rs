use crate::status_bridge::model::StatusModel;
use anyhow::Context;
use log::{info, warn};
use patrolcore::control::PatrolSnapshot;
use patrolcore::telemetry::MetricsRecorder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::runtime::Builder;
use tokio::sync::{oneshot, watch};
use warp::Filter;

/// Read-only HTTP view of a running patrol.
pub fn routes(
    snapshots: watch::Receiver<PatrolSnapshot>,
    metrics: Arc<MetricsRecorder>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let snapshot_filter = warp::any().map(move || snapshots.clone());
    let metrics_filter = warp::any().map(move || metrics.clone());

    let status_route = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(snapshot_filter)
        .and(metrics_filter.clone())
        .map(
            |snapshots: watch::Receiver<PatrolSnapshot>, metrics: Arc<MetricsRecorder>| {
                let model = StatusModel {
                    patrol: snapshots.borrow().clone(),
                    metrics: metrics.snapshot(),
                };
                warp::reply::json(&model)
            },
        );

    let metrics_route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(metrics_filter)
        .map(|metrics: Arc<MetricsRecorder>| warp::reply::json(&metrics.snapshot()));

    status_route.or(metrics_route)
}

/// Serves [`routes`] from a background thread until shut down or dropped
/// along with the process.
pub struct StatusBridge {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl StatusBridge {
    pub fn start(
        snapshots: watch::Receiver<PatrolSnapshot>,
        metrics: Arc<MetricsRecorder>,
        addr: SocketAddr,
    ) -> anyhow::Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for the status bridge")?;
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let (local_addr, server) = runtime
            .block_on(async move {
                warp::serve(routes(snapshots, metrics)).try_bind_with_graceful_shutdown(
                    addr,
                    async move {
                        shutdown_rx.await.ok();
                    },
                )
            })
            .with_context(|| format!("binding status bridge to {}", addr))?;

        let worker = thread::spawn(move || {
            runtime.block_on(server);
        });
        info!("Status bridge listening on http://{}", local_addr);

        Ok(Self {
            local_addr,
            shutdown: Some(shutdown),
            worker: Some(worker),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("status bridge thread panicked");
            }
        }
    }
}

impl Drop for StatusBridge {
    fn drop(&mut self) {
        self.stop();
    }
}
