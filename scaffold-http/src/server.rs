//! Server-wide routing, middleware, and the listener loop.

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use std::{future::Future, time::Duration};
use tokio::net::TcpListener;
use tracing::info;

use scaffold_core::{
    context::Context,
    error::{ErrorKind, ScaffoldError, ScaffoldResult},
};

use crate::error::{ApiError, error_response};

/// Assembles mounted resource routers into one service and serves it.
#[derive(Debug, Default)]
pub struct HttpServer {
    router: Router,
    timeout: Option<Duration>,
}

impl HttpServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mounted resource's routes.
    pub fn merge(mut self, routes: Router) -> Self {
        self.router = self.router.merge(routes);
        self
    }

    /// Fails any request that runs longer than `timeout` with an internal error.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The complete service: resource routes, the 404 fallback, and the server-wide
    /// middleware (request logging outermost, then context installation, then timeout).
    pub fn into_router(self) -> Router {
        let mut router = self.router.fallback(not_found);

        if let Some(limit) = self.timeout {
            router = router.layer(middleware::from_fn_with_state(limit, enforce_timeout));
        }

        router
            .layer(middleware::from_fn(install_context))
            .layer(middleware::from_fn(log_request))
    }

    /// Binds `address` and serves until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be bound or the server stops with an I/O error.
    pub async fn serve<F>(self, address: &str, shutdown: F) -> ScaffoldResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|err| ScaffoldError::Initialization(format!("cannot bind {address}: {err}")))?;

        info!(target: "scaffold::http", %address, "listening");

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ScaffoldError::Internal(format!("server error: {err}")))?;

        info!(target: "scaffold::http", "server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C. Pass to [`HttpServer::serve`] for graceful shutdown.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "scaffold::http", error = %err, "cannot listen for ctrl-c");
        return;
    }

    info!(target: "scaffold::http", "shutdown requested");
}

async fn not_found() -> Response {
    error_response(ErrorKind::NotFound)
}

async fn log_request(request: Request, next: Next) -> Response {
    info!(target: "scaffold::http", "HTTP {} {}", request.method(), request.uri().path());

    next.run(request).await
}

async fn install_context(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<Context>().is_none() {
        request
            .extensions_mut()
            .insert(Context::new());
    }

    next.run(request).await
}

async fn enforce_timeout(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(target: "scaffold::http", %path, ?limit, "request timed out");
            ApiError(ScaffoldError::Internal("request timed out".into())).into_response()
        }
    }
}
