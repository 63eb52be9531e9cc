//! Router-Aufbau
//!
//! Oeffentliche und angemeldete Routen liegen in getrennten Routern; die
//! Auth-Middleware haengt nur an letzteren.

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use treffpunkt_auth::sitzung_pruefen;
use treffpunkt_observability::{
    health_router, metrics_router, request_metriken, request_trace_layer, HealthState,
};

use crate::handlers::{auth, invites, rooms, rtc, users, ws};
use crate::state::AppState;

/// Optionen fuer den Router
#[derive(Debug, Clone, Default)]
pub struct RouterOptionen {
    /// `/metrics` bereitstellen
    pub metriken: bool,
    /// Erlaubte CORS-Origins, leer = alle
    pub cors_origins: Vec<String>,
}

/// Baut den vollstaendigen Router inklusive Observability-Endpunkten
pub fn app_bauen(state: AppState, health: HealthState, optionen: &RouterOptionen) -> Router {
    let oeffentlich = Router::new()
        .route("/users", post(users::benutzer_erstellen))
        .route("/users/:user_id", get(users::benutzer_laden))
        .route("/auth/login", post(auth::login))
        .route("/rooms", get(rooms::raeume_auflisten))
        .route("/rooms/:room_id", get(rooms::raum_laden))
        .route("/config/rtc", get(rtc::rtc_konfig));

    let angemeldet = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/rooms", post(rooms::raum_erstellen))
        .route("/rooms/:room_id/join", get(ws::raum_beitreten))
        .route("/hub/join", get(ws::hub_beitreten))
        .route("/invite", post(invites::einladen))
        .route("/invites", get(invites::einladungen_auflisten))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            sitzung_pruefen::<AppState>,
        ));

    let metriken = state.metriken.clone();
    let mut app = oeffentlich
        .merge(angemeldet)
        .with_state(state)
        .merge(health_router(health));

    if optionen.metriken {
        app = app.merge(metrics_router(metriken.clone()));
    }

    app.layer(middleware::from_fn_with_state(metriken, request_metriken))
        .layer(request_trace_layer())
        .layer(cors_layer(&optionen.cors_origins))
}

/// CORS: entweder die konfigurierten Origins oder alle
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let erlaubt: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ungueltiger CORS-Origin ignoriert");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(erlaubt)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::ws::Message;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;
    use treffpunkt_auth::SessionStore;
    use treffpunkt_core::UserId;
    use treffpunkt_db::SqliteDb;
    use treffpunkt_observability::TreffpunktMetriken;
    use treffpunkt_signaling::PeerVerbindung;

    use super::*;
    use crate::config::ServerConfig;

    async fn test_app(metriken: bool) -> (Router, AppState) {
        let db = Arc::new(SqliteDb::in_memory().await.unwrap());
        let state = AppState::neu(
            Arc::clone(&db),
            SessionStore::neu(),
            TreffpunktMetriken::neu().unwrap(),
            &ServerConfig::default(),
            CancellationToken::new(),
        );
        let app = app_bauen(
            state.clone(),
            HealthState::neu(db),
            &RouterOptionen {
                metriken,
                cors_origins: vec![],
            },
        );
        (app, state)
    }

    async fn anfrage(
        app: &Router,
        methode: &str,
        pfad: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(methode).uri(pfad);
        if let Some(t) = token {
            req = req.header("authorization", t);
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let antwort = app.clone().oneshot(req).await.unwrap();
        let status = antwort.status();
        let bytes = axum::body::to_bytes(antwort.into_body(), usize::MAX)
            .await
            .unwrap();
        let wert = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, wert)
    }

    /// Legt einen Benutzer an, meldet ihn an und liefert (user_id, token)
    async fn angemeldeter_benutzer(app: &Router, name: &str) -> (String, String) {
        let (status, benutzer) =
            anfrage(app, "POST", "/users", None, Some(json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, login) = anfrage(
            app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "user": benutzer["secretKey"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(login["user"]["userID"], benutzer["userID"]);
        assert!(login["user"].get("secretKey").is_none());

        (
            benutzer["userID"].as_str().unwrap().to_string(),
            login["session"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn benutzer_anlegen_und_oeffentlich_laden() {
        let (app, _) = test_app(true).await;

        let (status, benutzer) =
            anfrage(&app, "POST", "/users", None, Some(json!({ "name": "alice" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(benutzer["secretKey"].is_string());

        let pfad = format!("/users/{}", benutzer["userID"].as_str().unwrap());
        let (status, oeffentlich) = anfrage(&app, "GET", &pfad, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(oeffentlich["name"], "alice");
        assert!(oeffentlich.get("secretKey").is_none());

        let (status, _) = anfrage(&app, "GET", "/users/unbekannt", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            anfrage(&app, "POST", "/users", None, Some(json!({ "name": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_mit_unbekanntem_schluessel() {
        let (app, _) = test_app(true).await;
        let (status, fehler) = anfrage(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "user": "falsch" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(fehler["error"]["code"], 400);
    }

    #[tokio::test]
    async fn geschuetzte_routen_pruefen_anmeldung() {
        let (app, state) = test_app(true).await;
        let body = Some(json!({ "roomName": "lobby" }));

        let (status, fehler) = anfrage(&app, "POST", "/rooms", None, body.clone()).await;
        assert_eq!(status, StatusCode::NON_AUTHORITATIVE_INFORMATION);
        assert!(fehler["error"]["message"].is_string());

        let (status, _) = anfrage(&app, "POST", "/rooms", Some("falsch"), body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.metriken.auth_failures_total.get(), 2);

        let (_, token) = angemeldeter_benutzer(&app, "alice").await;
        let (status, raum) = anfrage(&app, "POST", "/rooms", Some(&token), body).await;
        assert_eq!(status, StatusCode::CREATED);

        let pfad = format!("/rooms/{}", raum["roomID"].as_str().unwrap());
        let (status, geladen) = anfrage(&app, "GET", &pfad, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(geladen["name"], "lobby");

        let (status, liste) = anfrage(&app, "GET", "/rooms", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(liste.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unbekannter_raum_liefert_204() {
        let (app, _) = test_app(true).await;
        let (status, _) = anfrage(&app, "GET", "/rooms/gibt-es-nicht", None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn logout_macht_token_ungueltig() {
        let (app, _) = test_app(true).await;
        let (_, token) = angemeldeter_benutzer(&app, "alice").await;

        let (status, _) = anfrage(&app, "POST", "/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = anfrage(&app, "GET", "/invites", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn einladung_wird_gespeichert_und_ueber_hub_zugestellt() {
        let (app, state) = test_app(true).await;
        let (alice, token_a) = angemeldeter_benutzer(&app, "alice").await;
        let (bob, token_b) = angemeldeter_benutzer(&app, "bob").await;

        let (_, raum) = anfrage(
            &app,
            "POST",
            "/rooms",
            Some(&token_a),
            Some(json!({ "roomName": "lobby" })),
        )
        .await;

        let (verbindung, mut rx) = PeerVerbindung::neu(UserId::neu(bob.clone()), 8);
        state.signaling.hub.hinzufuegen(verbindung);

        let (status, einladung) = anfrage(
            &app,
            "POST",
            "/invite",
            Some(&token_a),
            Some(json!({ "to": bob, "roomID": raum["roomID"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(einladung["from"], alice);

        match rx.try_recv().unwrap() {
            Message::Text(t) => {
                let wert: Value = serde_json::from_str(&t).unwrap();
                assert_eq!(wert["event"], "invite");
                assert_eq!(wert["message"]["roomID"], raum["roomID"]);
                assert_eq!(wert["message"]["from"], alice);
            }
            andere => panic!("Text-Frame erwartet, bekam {andere:?}"),
        }

        let (status, liste) = anfrage(&app, "GET", "/invites", Some(&token_b), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(liste.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn einladung_an_sich_selbst_oder_offline() {
        let (app, _) = test_app(true).await;
        let (alice, token_a) = angemeldeter_benutzer(&app, "alice").await;
        let (bob, _) = angemeldeter_benutzer(&app, "bob").await;
        let (_, raum) = anfrage(
            &app,
            "POST",
            "/rooms",
            Some(&token_a),
            Some(json!({ "roomName": "lobby" })),
        )
        .await;

        let (status, _) = anfrage(
            &app,
            "POST",
            "/invite",
            Some(&token_a),
            Some(json!({ "to": alice, "roomID": raum["roomID"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Empfaenger nicht im Hub: trotzdem gespeichert
        let (status, _) = anfrage(
            &app,
            "POST",
            "/invite",
            Some(&token_a),
            Some(json!({ "to": bob, "roomID": raum["roomID"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = anfrage(
            &app,
            "POST",
            "/invite",
            Some(&token_a),
            Some(json!({ "to": bob, "roomID": "fehlt" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rtc_konfig_und_observability() {
        let (app, _) = test_app(false).await;

        let (status, rtc) = anfrage(&app, "GET", "/config/rtc", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            rtc["iceServers"][0]["urls"][0],
            "stun:stun.l.google.com:19302"
        );

        let (status, health) = anfrage(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["db_connected"], true);

        let (status, _) = anfrage(&app, "GET", "/metrics", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
