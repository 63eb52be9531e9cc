//! Request-Metriken und Tracing-Layer fuer Axum
//!
//! Der Pfad-Label ist das Routen-Muster (`/rooms/:room_id`), nicht der
//! konkrete Pfad, damit die Label-Menge begrenzt bleibt.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, Response},
    middleware::Next,
};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;

use crate::metrics::TreffpunktMetriken;

/// Tracing-Layer fuer alle HTTP-Anfragen
pub fn request_trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Zaehlt Anfragen und misst die Antwortzeit.
///
/// Verwendung:
/// ```ignore
/// Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn_with_state(metriken, request_metriken))
/// ```
pub async fn request_metriken(
    State(metriken): State<TreffpunktMetriken>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    let methode = req.method().to_string();
    let pfad = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unbekannt".to_string());
    let start = Instant::now();

    let response = next.run(req).await;

    let dauer = start.elapsed();
    let status = response.status().as_u16().to_string();

    metriken
        .http_requests_total
        .with_label_values(&[&methode, &pfad, &status])
        .inc();
    metriken
        .http_request_duration_seconds
        .with_label_values(&[&methode, &pfad])
        .observe(dauer.as_secs_f64());

    tracing::debug!(
        method = %methode,
        path = %pfad,
        status = %status,
        duration_ms = dauer.as_millis(),
        "HTTP-Anfrage abgeschlossen"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn anfrage_wird_mit_routen_muster_gezaehlt() {
        let metriken = TreffpunktMetriken::neu().unwrap();
        let app = Router::new()
            .route("/rooms/:room_id", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                metriken.clone(),
                request_metriken,
            ));

        let antwort = app
            .oneshot(Request::get("/rooms/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), 200);

        let wert = metriken
            .http_requests_total
            .with_label_values(&["GET", "/rooms/:room_id", "200"])
            .get();
        assert_eq!(wert, 1);
    }
}
