//! Operational HTTP endpoints.
//!
//! - `/`                : landing page linking to the telemetry path
//! - `/healthz`         : liveness
//! - `/readyz`          : readiness (503 when draining)
//! - telemetry path     : one collection cycle, Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::obs::Exposition;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else {
        (StatusCode::OK, "ready")
    }
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let path = &state.cfg().web.telemetry_path;
    Html(format!(
        "<html>\n<head><title>Dovecot Exporter</title></head>\n<body>\n\
         <h1>Dovecot Exporter</h1>\n<p><a href='{path}'>Metrics</a></p>\n\
         </body>\n</html>\n"
    ))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    state.metrics().scrapes.inc(&[]);

    let collector = state.collector();
    let mut exposition = Exposition::new(collector.describe());
    collector.collect(&mut exposition).await;

    tracing::debug!(records = exposition.measurement_count(), "scrape complete");

    let mut body = String::new();
    exposition.render(&mut body);
    state.metrics().render(&mut body);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
