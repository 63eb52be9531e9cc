//! Axum-Middleware fuer Token-Authentifizierung
//!
//! Der Token steht roh im `Authorization`-Header; ein `Bearer `-Praefix
//! wird toleriert. Nach erfolgreicher Pruefung liegt die Benutzer-ID als
//! [`AngemeldeterBenutzer`] in den Request-Extensions.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use treffpunkt_core::UserId;

use crate::error::{AuthError, AuthResult};
use crate::session::SessionStore;

/// Name des Headers, der den Token traegt
pub const AUTH_HEADER: &str = "authorization";

/// Authentifizierter Benutzer (als Request-Extension gespeichert)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngemeldeterBenutzer {
    pub user_id: UserId,
    pub token: String,
}

/// Extrahiert den Token aus dem `Authorization`-Header
pub fn token_aus_headers(headers: &HeaderMap) -> AuthResult<&str> {
    let wert = headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::KeineAnmeldedaten)?;

    let token = wert.strip_prefix("Bearer ").unwrap_or(wert).trim();
    if token.is_empty() {
        return Err(AuthError::KeineAnmeldedaten);
    }
    Ok(token)
}

/// HTTP-Status fuer einen Auth-Fehler
///
/// Fehlende Anmeldedaten melden 203 wie der bestehende Browser-Client es
/// erwartet, ungueltige oder abgelaufene Tokens 401.
pub fn auth_status(fehler: &AuthError) -> StatusCode {
    match fehler {
        AuthError::KeineAnmeldedaten => StatusCode::NON_AUTHORITATIVE_INFORMATION,
        AuthError::SessionUngueltig | AuthError::SessionAbgelaufen => StatusCode::UNAUTHORIZED,
    }
}

/// Fehlerantwort fuer einen Auth-Fehler
pub fn auth_fehler_antwort(fehler: &AuthError) -> Response {
    let status = auth_status(fehler);
    (
        status,
        Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": fehler.oeffentliche_meldung()
            }
        })),
    )
        .into_response()
}

/// Zustand, aus dem die Middleware den Session-Store bezieht
///
/// `auth_fehlgeschlagen` wird bei jeder Abweisung aufgerufen (z.B. fuer
/// Metriken).
pub trait SessionQuelle: Clone + Send + Sync + 'static {
    fn session_store(&self) -> &SessionStore;

    fn auth_fehlgeschlagen(&self, _fehler: &AuthError) {}
}

impl SessionQuelle for Arc<SessionStore> {
    fn session_store(&self) -> &SessionStore {
        self
    }
}

/// Prueft die Anmeldedaten eines Requests
pub async fn anmeldung_pruefen(
    store: &SessionStore,
    headers: &HeaderMap,
) -> AuthResult<AngemeldeterBenutzer> {
    let token = token_aus_headers(headers)?;
    let user_id = store.validieren(token).await?;
    Ok(AngemeldeterBenutzer {
        user_id,
        token: token.to_string(),
    })
}

/// Axum-Middleware: prueft den Token und leitet die Benutzer-ID weiter
///
/// Verwendung:
/// ```ignore
/// Router::new()
///     .route("/invite", post(handler))
///     .route_layer(axum::middleware::from_fn_with_state(store, sitzung_pruefen::<Arc<SessionStore>>))
/// ```
pub async fn sitzung_pruefen<Q: SessionQuelle>(
    State(quelle): State<Q>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match anmeldung_pruefen(quelle.session_store(), req.headers()).await {
        Ok(benutzer) => {
            req.extensions_mut().insert(benutzer);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(pfad = %req.uri().path(), fehler = %e, "Anfrage abgewiesen");
            quelle.auth_fehlgeschlagen(&e);
            auth_fehler_antwort(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderValue, routing::get, Extension, Router};
    use std::time::Duration;
    use tower::ServiceExt;

    #[test]
    fn token_roh_und_mit_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, HeaderValue::from_static("abc123"));
        assert_eq!(token_aus_headers(&headers), Ok("abc123"));

        headers.insert(AUTH_HEADER, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(token_aus_headers(&headers), Ok("abc123"));
    }

    #[test]
    fn token_fehlt_oder_leer() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_aus_headers(&headers), Err(AuthError::KeineAnmeldedaten));

        headers.insert(AUTH_HEADER, HeaderValue::from_static("Bearer "));
        assert_eq!(token_aus_headers(&headers), Err(AuthError::KeineAnmeldedaten));
    }

    fn app(store: Arc<SessionStore>) -> Router {
        Router::new()
            .route(
                "/wer",
                get(|Extension(b): Extension<AngemeldeterBenutzer>| async move {
                    b.user_id.to_string()
                }),
            )
            .route_layer(axum::middleware::from_fn_with_state(
                store,
                sitzung_pruefen::<Arc<SessionStore>>,
            ))
    }

    fn anfrage(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/wer");
        if let Some(t) = token {
            builder = builder.header(AUTH_HEADER, t);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn middleware_unterscheidet_fehlend_und_ungueltig() {
        let store = SessionStore::neu();

        let ohne = app(Arc::clone(&store)).oneshot(anfrage(None)).await.unwrap();
        assert_eq!(ohne.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);

        let falsch = app(Arc::clone(&store))
            .oneshot(anfrage(Some("falsch")))
            .await
            .unwrap();
        assert_eq!(falsch.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn middleware_leitet_benutzer_weiter() {
        let store = SessionStore::neu();
        let token = store
            .ausstellen(&UserId::neu("frank"), Duration::from_secs(60))
            .await;

        let antwort = app(store).oneshot(anfrage(Some(&token))).await.unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);

        let body = axum::body::to_bytes(antwort.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"frank");
    }
}
