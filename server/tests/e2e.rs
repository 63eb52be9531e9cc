//! End-to-End-Tests gegen einen echten Server auf einem freien Port
//!
//! HTTP laeuft ueber reqwest, WebSockets ueber tokio-tungstenite.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use treffpunkt_db::SqliteDb;
use treffpunkt_server::{config::ServerConfig, LaufenderServer, Server};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WARTEZEIT: Duration = Duration::from_secs(5);

async fn server_starten() -> LaufenderServer {
    let mut config = ServerConfig::default();
    config.netzwerk.bind_adresse = "127.0.0.1".into();
    config.netzwerk.port = 0;

    Server::neu(config)
        .mit_datenbank(SqliteDb::in_memory().await.unwrap())
        .binden()
        .await
        .unwrap()
}

struct Client {
    http: reqwest::Client,
    basis: String,
    ws_basis: String,
}

impl Client {
    fn neu(server: &LaufenderServer) -> Self {
        Self {
            http: reqwest::Client::new(),
            basis: format!("http://{}", server.adresse()),
            ws_basis: format!("ws://{}", server.adresse()),
        }
    }

    /// Legt einen Benutzer an und meldet ihn an; liefert (user_id, token)
    async fn anmelden(&self, name: &str) -> (String, String) {
        let antwort = self
            .http
            .post(format!("{}/users", self.basis))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::CREATED);
        let benutzer: Value = antwort.json().await.unwrap();

        let antwort = self
            .http
            .post(format!("{}/auth/login", self.basis))
            .json(&json!({ "user": benutzer["secretKey"] }))
            .send()
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::CREATED);
        let login: Value = antwort.json().await.unwrap();

        (
            benutzer["userID"].as_str().unwrap().to_string(),
            login["session"].as_str().unwrap().to_string(),
        )
    }

    async fn raum_erstellen(&self, token: &str, name: &str) -> String {
        let antwort = self
            .http
            .post(format!("{}/rooms", self.basis))
            .header("authorization", token)
            .json(&json!({ "roomName": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::CREATED);
        let wert: Value = antwort.json().await.unwrap();
        wert["roomID"].as_str().unwrap().to_string()
    }

    async fn ws_verbinden(&self, pfad: &str, token: &str) -> Ws {
        let mut req = format!("{}{}", self.ws_basis, pfad)
            .into_client_request()
            .unwrap();
        req.headers_mut()
            .insert("authorization", token.parse().unwrap());
        let (ws, _) = connect_async(req).await.unwrap();
        ws
    }

    async fn metriken(&self) -> String {
        self.http
            .get(format!("{}/metrics", self.basis))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    }

    /// Wartet bis `/metrics` die Zeile enthaelt
    async fn metrik_abwarten(&self, zeile: &str) {
        let frist = tokio::time::Instant::now() + WARTEZEIT;
        loop {
            if self.metriken().await.lines().any(|l| l == zeile) {
                return;
            }
            assert!(
                tokio::time::Instant::now() < frist,
                "Metrik '{zeile}' nicht erreicht"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// Naechster Text-Frame, Pings werden uebersprungen
async fn text_empfangen(ws: &mut Ws) -> String {
    loop {
        let nachricht = tokio::time::timeout(WARTEZEIT, ws.next())
            .await
            .expect("Zeitueberschreitung beim Empfang")
            .expect("Stream beendet")
            .unwrap();
        match nachricht {
            Message::Text(t) => return t,
            Message::Ping(_) | Message::Pong(_) => continue,
            andere => panic!("Text-Frame erwartet, bekam {andere:?}"),
        }
    }
}

/// Naechster Close-Frame als (Code, Grund)
async fn close_empfangen(ws: &mut Ws) -> (u16, String) {
    loop {
        let nachricht = tokio::time::timeout(WARTEZEIT, ws.next())
            .await
            .expect("Zeitueberschreitung beim Empfang")
            .expect("Stream beendet")
            .unwrap();
        match nachricht {
            Message::Close(Some(frame)) => return (frame.code.into(), frame.reason.into_owned()),
            Message::Close(None) => panic!("Close-Frame ohne Code"),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn auth_fehler_statuscodes() {
    let server = server_starten().await;
    let client = Client::neu(&server);

    let ohne = client
        .http
        .post(format!("{}/rooms", client.basis))
        .json(&json!({ "roomName": "lobby" }))
        .send()
        .await
        .unwrap();
    assert_eq!(ohne.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);

    let falsch = client
        .http
        .post(format!("{}/rooms", client.basis))
        .header("authorization", "Bearer falsch")
        .json(&json!({ "roomName": "lobby" }))
        .send()
        .await
        .unwrap();
    assert_eq!(falsch.status(), StatusCode::UNAUTHORIZED);

    // Ohne Anmeldung kein Upgrade
    let ergebnis = connect_async(format!("{}/hub/join", client.ws_basis)).await;
    assert!(ergebnis.is_err());

    server.herunterfahren().await.unwrap();
}

#[tokio::test]
async fn zwei_peers_verhandeln_ueber_den_raum() {
    let server = server_starten().await;
    let client = Client::neu(&server);

    let (alice, token_a) = client.anmelden("alice").await;
    let (bob, token_b) = client.anmelden("bob").await;
    let raum = client.raum_erstellen(&token_a, "lobby").await;
    let pfad = format!("/rooms/{raum}/join");

    let mut ws_a = client.ws_verbinden(&pfad, &token_a).await;
    client.metrik_abwarten("treffpunkt_room_peers 1").await;

    let mut ws_b = client.ws_verbinden(&pfad, &token_b).await;
    let create_offer: Value = serde_json::from_str(&text_empfangen(&mut ws_b).await).unwrap();
    assert_eq!(create_offer["event"], "create_offer");
    assert_eq!(create_offer["requester"], bob);
    assert_eq!(create_offer["peerID"], alice);
    assert_eq!(
        create_offer["config"]["iceServers"][0]["urls"][0],
        "stun:stun.l.google.com:19302"
    );
    client.metrik_abwarten("treffpunkt_room_peers 2").await;

    // Offer geht unveraendert an alice
    let offer = json!({ "event": "offer", "peerID": alice, "requester": bob, "sdp": "v=0" })
        .to_string();
    ws_b.send(Message::Text(offer.clone())).await.unwrap();
    assert_eq!(text_empfangen(&mut ws_a).await, offer);

    let answer = json!({ "event": "answer", "requester": bob, "sdp": "v=0" }).to_string();
    ws_a.send(Message::Text(answer.clone())).await.unwrap();
    assert_eq!(text_empfangen(&mut ws_b).await, answer);

    // Persistierte Peer-Liste folgt dem Live-Zustand
    let record: Value = client
        .http
        .get(format!("{}/rooms/{raum}", client.basis))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["peers"].as_array().unwrap().len(), 2);

    ws_b.close(None).await.unwrap();
    client.metrik_abwarten("treffpunkt_room_peers 1").await;

    server.herunterfahren().await.unwrap();
}

#[tokio::test]
async fn unbekannter_raum_wird_mit_1011_geschlossen() {
    let server = server_starten().await;
    let client = Client::neu(&server);
    let (_, token) = client.anmelden("alice").await;

    let mut ws = client.ws_verbinden("/rooms/gibt-es-nicht/join", &token).await;
    let (code, grund) = close_empfangen(&mut ws).await;
    assert_eq!(code, 1011);
    assert_eq!(grund, "Raum existiert nicht");

    server.herunterfahren().await.unwrap();
}

#[tokio::test]
async fn einladung_kommt_ueber_den_hub_an() {
    let server = server_starten().await;
    let client = Client::neu(&server);

    let (alice, token_a) = client.anmelden("alice").await;
    let (bob, token_b) = client.anmelden("bob").await;
    let raum = client.raum_erstellen(&token_a, "lobby").await;

    let mut hub_b = client.ws_verbinden("/hub/join", &token_b).await;
    // Erste Nachricht meldet im Hub an
    hub_b.send(Message::Text("hallo".into())).await.unwrap();
    client.metrik_abwarten("treffpunkt_hub_peers 1").await;

    let antwort = client
        .http
        .post(format!("{}/invite", client.basis))
        .header("authorization", &token_a)
        .json(&json!({ "to": bob, "roomID": raum }))
        .send()
        .await
        .unwrap();
    assert_eq!(antwort.status(), StatusCode::CREATED);

    let ereignis: Value = serde_json::from_str(&text_empfangen(&mut hub_b).await).unwrap();
    assert_eq!(
        ereignis,
        json!({ "event": "invite", "message": { "roomID": raum, "from": alice } })
    );

    server.herunterfahren().await.unwrap();
}

#[tokio::test]
async fn shutdown_schliesst_sitzungen_mit_1001() {
    let server = server_starten().await;
    let client = Client::neu(&server);
    let (_, token) = client.anmelden("alice").await;
    let raum = client.raum_erstellen(&token, "lobby").await;

    let mut ws = client.ws_verbinden(&format!("/rooms/{raum}/join"), &token).await;
    client.metrik_abwarten("treffpunkt_room_peers 1").await;

    server.herunterfahren().await.unwrap();

    let (code, _) = close_empfangen(&mut ws).await;
    assert_eq!(code, 1001);
}

#[tokio::test]
async fn health_und_metriken() {
    let server = server_starten().await;
    let client = Client::neu(&server);

    let health: Value = client
        .http
        .get(format!("{}/health", client.basis))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["db_connected"], true);

    client.anmelden("alice").await;
    let metriken = client.metriken().await;
    assert!(metriken.contains("treffpunkt_http_requests_total"));
    assert!(metriken.contains("path=\"/auth/login\""));

    server.herunterfahren().await.unwrap();
}
