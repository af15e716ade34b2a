use std::{future::Future, net::SocketAddr, time::Duration};

use anyhow::Context;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::get,
    Router,
};
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    service::TowerToHyperService,
};
use tokio::{net::TcpListener, sync::watch, task::JoinSet};
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::ServeDir,
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer, SessionStore};

use crate::{
    auth::{
        self,
        middleware::{authenticate, require_authentication},
    },
    error::not_found,
    middleware::{csrf::verify_csrf, recover::handle_panic, security_headers::secure_headers},
    session::{self, SESSION_COOKIE_NAME},
    snippets,
    state::AppState,
};

async fn ping() -> &'static str {
    "OK"
}

async fn fallback() -> Response {
    not_found()
}

/// Assembles the full router. Session-backed pages sit behind, outer to inner:
/// session load/save, user resolution, then per route the auth guard (protected
/// routes only) and the CSRF guard.
pub fn build_app<S>(state: AppState, store: S) -> anyhow::Result<Router>
where
    S: SessionStore + Clone,
{
    let key = session::signing_key(&state.config.session_secret)?;
    let sessions = SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_http_only(true)
        .with_secure(true)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(12)))
        .with_signed(key);

    let public = Router::new()
        .merge(snippets::public_routes())
        .merge(auth::public_routes())
        .route_layer(from_fn(verify_csrf));

    let protected = Router::new()
        .merge(snippets::protected_routes())
        .merge(auth::protected_routes())
        .route_layer(from_fn(verify_csrf))
        .route_layer(from_fn(require_authentication));

    let pages = Router::new()
        .merge(public)
        .merge(protected)
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(sessions);

    let timeouts = state.config.timeouts.clone();
    let static_files = ServeDir::new(&state.config.static_dir);

    Ok(Router::new()
        .route("/ping", get(ping))
        .nest_service("/static", static_files)
        .merge(pages)
        .fallback(fallback)
        .with_state(state)
        .layer(RequestBodyTimeoutLayer::new(timeouts.read))
        .layer(TimeoutLayer::new(timeouts.write))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(secure_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        ))
}

/// Serves `app` until SIGINT/SIGTERM, then drains open connections.
pub async fn serve(app: Router, addr: SocketAddr, idle: Duration) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    tracing::info!("listening on {}", addr);
    serve_listener(listener, app, idle, shutdown_signal()).await;
    tracing::info!("server stopped");
    Ok(())
}

/// Accept loop over HTTP/1.1 connections. `idle` is the header read timeout,
/// which also closes keep-alive connections that never send another request.
async fn serve_listener(
    listener: TcpListener,
    app: Router,
    idle: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let (close_tx, close_rx) = watch::channel(());
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, remote) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                let service = TowerToHyperService::new(app.clone());
                let mut close_rx = close_rx.clone();

                connections.spawn(async move {
                    let conn = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .header_read_timeout(idle)
                        .serve_connection(TokioIo::new(stream), service);
                    tokio::pin!(conn);

                    let result = tokio::select! {
                        result = conn.as_mut() => result,
                        _ = close_rx.changed() => {
                            conn.as_mut().graceful_shutdown();
                            conn.as_mut().await
                        }
                    };
                    if let Err(e) = result {
                        tracing::debug!(%remote, error = %e, "connection closed");
                    }
                });
            }
            _ = &mut shutdown => break,
        }
        while connections.try_join_next().is_some() {}
    }

    drop(listener);
    let _ = close_tx.send(());
    tracing::info!(open = connections.len(), "draining connections");
    while connections.join_next().await.is_some() {}
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
