//! Scrape service: one cached Client per BMC target, the axum endpoint that
//! exposes scrapes, and the one-shot check used from the command line.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::collector::{Client, CollectError};
use crate::config::types::ExporterConfig;
use crate::metrics::PrometheusSink;
use crate::redfish::{RedfishSession, SessionClient};

/// Builds the transport for a target. Live scrapes open a `RedfishSession`;
/// dry runs hand out a fixture-backed mock.
pub type SessionFactory = Box<dyn Fn(&str) -> Result<Box<dyn SessionClient>> + Send + Sync>;

type ClientSlot = Arc<Mutex<Option<Client>>>;

/// Result of one scrape in text exposition format
#[derive(Debug, Clone)]
pub struct ScrapeOutput {
    pub up: bool,
    pub body: String,
}

pub struct Exporter {
    sessions: SessionFactory,
    clients: Mutex<HashMap<String, ClientSlot>>,
    /// Slots holding a client; readable while scrapes hold the slot locks
    connected: AtomicUsize,
}

impl Exporter {
    /// Exporter that talks to real BMCs with credentials from `config`.
    pub fn new(config: ExporterConfig) -> Self {
        let config = Arc::new(config);
        Self::with_sessions(Box::new(move |target: &str| {
            let host = config
                .host_for(target)
                .ok_or_else(|| anyhow!("No credentials configured for {}", target))?;
            let session = RedfishSession::new(target, host, &config.redfish)?;
            Ok(Box::new(session) as Box<dyn SessionClient>)
        }))
    }

    pub fn with_sessions(sessions: SessionFactory) -> Self {
        Self {
            sessions,
            clients: Mutex::new(HashMap::new()),
            connected: AtomicUsize::new(0),
        }
    }

    async fn slot(&self, target: &str) -> ClientSlot {
        let mut clients = self.clients.lock().await;
        clients
            .entry(target.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Drop the map entry for a target whose slot ended up empty, unless another
    /// scrape is already queued on it.
    async fn forget(&self, target: &str, slot: &ClientSlot) {
        let mut clients = self.clients.lock().await;
        let unused = clients.get(target).is_some_and(|s| Arc::ptr_eq(s, slot))
            && Arc::strong_count(slot) == 2;
        if unused {
            clients.remove(target);
        }
    }

    fn store(&self, cached: &mut Option<Client>, client: Client) {
        if cached.replace(client).is_none() {
            self.connected.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn evict(&self, cached: &mut Option<Client>) -> Option<Client> {
        let client = cached.take();
        if client.is_some() {
            self.connected.fetch_sub(1, Ordering::SeqCst);
        }
        client
    }

    /// Scrape one target. Concurrent scrapes of the same target queue on its slot.
    pub async fn scrape(&self, target: &str) -> Result<ScrapeOutput> {
        let slot = self.slot(target).await;
        let mut cached = slot.lock().await;

        let mut sink = PrometheusSink::new();
        let started = Instant::now();
        let up = match self.collect(target, &mut cached, &mut sink).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Scrape of {} failed: {:#}", target, e);
                false
            }
        };
        let elapsed = started.elapsed().as_secs_f64();
        debug!("Scrape of {} finished in {:.3}s (up={})", target, elapsed, up);

        let idle = cached.is_none();
        drop(cached);
        if idle {
            self.forget(target, &slot).await;
        }

        sink.record_scrape(up, elapsed)?;
        Ok(ScrapeOutput {
            up,
            body: sink.encode()?,
        })
    }

    async fn collect(
        &self,
        target: &str,
        cached: &mut Option<Client>,
        sink: &mut PrometheusSink,
    ) -> Result<()> {
        if cached.is_none() {
            let session = (self.sessions)(target)?;
            let client = Client::connect(session)
                .await
                .with_context(|| format!("Discovery on {} failed", target))?;
            self.store(cached, client);
        }

        // The client stays in its slot while the scrape runs, so a cancelled
        // scrape leaves the session cached for the next one or for shutdown.
        let client = cached
            .as_ref()
            .ok_or_else(|| anyhow!("No client for {}", target))?;

        match client.refresh_gpus(sink).await {
            Ok(()) => Ok(()),
            // Rediscovery would classify the same vendor again
            Err(e @ CollectError::UnsupportedVendor(_)) => Err(e.into()),
            Err(e) => {
                if let Some(client) = self.evict(cached) {
                    client.close().await;
                }
                Err(e.into())
            }
        }
    }

    /// Number of targets with an open client. Does not wait for in-flight scrapes.
    pub fn connected(&self) -> usize {
        self.connected.load(Ordering::SeqCst)
    }

    /// Delete every cached BMC session.
    pub async fn shutdown(&self) {
        let slots: Vec<(String, ClientSlot)> = self.clients.lock().await.drain().collect();
        for (target, slot) in slots {
            let mut cached = slot.lock().await;
            if let Some(client) = self.evict(&mut cached) {
                info!("Closing Redfish session on {}", target);
                client.close().await;
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScrapeQuery {
    target: Option<String>,
}

pub fn router(exporter: Arc<Exporter>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(exporter)
}

async fn metrics_handler(
    State(exporter): State<Arc<Exporter>>,
    Query(query): Query<ScrapeQuery>,
) -> Response {
    let Some(target) = query.target.filter(|t| !t.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing ?target=<host[:port]>\n").into_response();
    };

    match exporter.scrape(target.trim()).await {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            output.body,
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to encode scrape of {}: {:#}", target, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics\n").into_response()
        }
    }
}

async fn health_handler(State(exporter): State<Arc<Exporter>>) -> Response {
    let connected = exporter.connected();
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "connected_targets": connected,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
        .into_response()
}

/// Serve scrapes on `listen` until `shutdown` resolves, then close every session.
pub async fn serve<F>(exporter: Arc<Exporter>, listen: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!("Serving GPU metrics on http://{}/metrics?target=<bmc>", listen);

    axum::serve(listener, router(exporter.clone()))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    exporter.shutdown().await;
    Ok(())
}

/// Scrape `target` once and close the session again.
pub async fn check(exporter: &Exporter, target: &str) -> Result<ScrapeOutput> {
    let output = exporter.scrape(target).await?;
    exporter.shutdown().await;
    Ok(output)
}
