use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};

use anyhow::Context as _;
use axum::{extract::State, http::{header::CONTENT_TYPE, StatusCode}, response::IntoResponse, routing::get, Router};
use tokio::{
    net::TcpListener,
    signal::unix::{self, SignalKind},
    sync::oneshot,
    task::JoinHandle,
};

use crate::metrics::Handler;

/// `/metrics` endpoint scoped to one run: bound before the first item and closed by
/// [`RunServer::stop`] once the run ends.
pub struct RunServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl RunServer {
    pub async fn bind<H>(port: u16, metrics_handler: H) -> anyhow::Result<Self>
    where
        H: Handler + Send + Sync + 'static,
    {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .with_context(|| format!("failed to bind metrics port {port}"))?;
        let addr = listener.local_addr()?;

        let app = Router::new()
            .route("/metrics", get(handle))
            .with_state(Arc::new(metrics_handler));

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stopped.await;
                })
                .await?;

            Ok(())
        });

        tracing::info!("serving run metrics on {addr}");

        Ok(Self { addr, stop, handle })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn stop(self) {
        let _ = self.stop.send(());
        match self.handle.await {
            Ok(Ok(())) => tracing::debug!("metrics endpoint closed"),
            Ok(Err(err)) => tracing::warn!("metrics server failed: {err:#}"),
            Err(err) => tracing::warn!("metrics server task failed: {err}"),
        }
    }
}

#[tracing::instrument(skip_all)]
async fn handle<S>(State(service): State<Arc<S>>) -> impl IntoResponse
where
    S: Handler,
{
    match service.handle().await {
        Ok(res) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
            res,
        ).into_response(),
        Err(err) => {
            tracing::error!("{err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "").into_response()
        },
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let mut sigint = unix::signal(SignalKind::interrupt()).expect("SIGINT error");
    let mut sigterm = unix::signal(SignalKind::terminate()).expect("SIGTERM error");

    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
}
