//! End-to-end tests: a real relay on a random port, real WebSocket clients.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use skirmish::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    start_server_with_write_timeout(Duration::from_secs(2)).await
}

async fn start_server_with_write_timeout(write_timeout: Duration) -> String {
    let server = SkirmishServer::builder()
        .bind("127.0.0.1:0")
        .write_timeout(write_timeout)
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_json(ws: &mut ClientWs, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("send");
}

/// Receives the next JSON frame, failing the test after a timeout.
async fn recv_json(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).expect("json"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Asserts that nothing arrives for a short while.
async fn assert_silent(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

/// Asserts that the server closes the connection.
async fn assert_closed(ws: &mut ClientWs) {
    loop {
        let result = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("server should close the connection");
        match result {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(other)) => panic!("expected close, got {other:?}"),
        }
    }
}

/// Joins `room` and returns the identifier the server assigned.
async fn join(ws: &mut ClientWs, room: &str) -> String {
    send_json(ws, json!({ "join": room })).await;
    let reply = recv_json(ws).await;
    reply["joined"]
        .as_str()
        .unwrap_or_else(|| panic!("expected joined, got {reply}"))
        .to_string()
}

// =========================================================================
// Signaling
// =========================================================================

#[tokio::test]
async fn test_join_announces_new_member() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;

    let a_id = join(&mut a, "lobby").await;
    let b_id = join(&mut b, "lobby").await;

    assert_eq!(a_id.len(), 32);
    assert_ne!(a_id, b_id);
    assert_eq!(recv_json(&mut a).await, json!({ "new": b_id }));
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn test_double_join_is_ignored() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    join(&mut a, "lobby").await;
    let b_id = join(&mut b, "lobby").await;
    recv_json(&mut a).await;

    send_json(&mut b, json!({ "join": "lobby" })).await;

    assert_silent(&mut a).await;
    assert_silent(&mut b).await;

    // The connection survives the refused join.
    send_json(&mut b, json!({ "ice": { "candidate": "c1" } })).await;
    let relayed = recv_json(&mut a).await;
    assert_eq!(relayed["ice"]["candidate"], "c1");
    assert!(!b_id.is_empty());
}

#[tokio::test]
async fn test_offer_is_relayed_verbatim() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    join(&mut a, "lobby").await;
    let b_id = join(&mut b, "lobby").await;
    recv_json(&mut a).await;

    let offer = json!({
        "offer": { "type": "offer", "sdp": "v=0\r\n" },
        "to": b_id,
        "extra": [1, 2, 3],
    });
    send_json(&mut a, offer.clone()).await;

    assert_eq!(recv_json(&mut b).await, offer);
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn test_answer_to_unknown_peer_is_dropped() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    join(&mut a, "lobby").await;
    join(&mut b, "lobby").await;
    recv_json(&mut a).await;

    send_json(&mut a, json!({ "answer": { "sdp": "x" }, "to": "nobody" })).await;
    assert_silent(&mut b).await;

    send_json(&mut a, json!({ "ice": { "candidate": "still-here" } })).await;
    assert_eq!(recv_json(&mut b).await["ice"]["candidate"], "still-here");
}

#[tokio::test]
async fn test_ice_skips_sender() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    let mut c = connect(&addr).await;
    join(&mut a, "lobby").await;
    join(&mut b, "lobby").await;
    join(&mut c, "lobby").await;
    recv_json(&mut a).await;
    recv_json(&mut a).await;
    recv_json(&mut b).await;

    let ice = json!({ "ice": { "candidate": "candidate:1 1 udp 1 10.0.0.1 9 typ host" } });
    send_json(&mut a, ice.clone()).await;

    assert_eq!(recv_json(&mut b).await, ice);
    assert_eq!(recv_json(&mut c).await, ice);
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    join(&mut a, "red").await;
    join(&mut b, "blue").await;

    send_json(&mut a, json!({ "ice": {} })).await;
    assert_silent(&mut b).await;
}

// =========================================================================
// Error handling
// =========================================================================

#[tokio::test]
async fn test_offer_before_join_closes_connection() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send_json(&mut ws, json!({ "offer": {}, "to": "someone" })).await;
    assert_closed(&mut ws).await;
}

#[tokio::test]
async fn test_invalid_json_closes_connection() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("not json".to_string()))
        .await
        .expect("send");
    assert_closed(&mut ws).await;
}

#[tokio::test]
async fn test_unknown_kind_is_ignored() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send_json(&mut ws, json!({ "hello": "world" })).await;
    let id = join(&mut ws, "lobby").await;
    assert_eq!(id.len(), 32);
}

#[tokio::test]
async fn test_shoot_out_of_range_closes_connection() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    join(&mut ws, "lobby").await;

    send_json(&mut ws, json!({ "shoot": 7 })).await;
    assert_closed(&mut ws).await;
}

// =========================================================================
// Tournament
// =========================================================================

/// Joins two clients, readies both, and drains the notices.
async fn two_player_round(addr: &str) -> (ClientWs, String, ClientWs, String) {
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let a_id = join(&mut a, "arena").await;
    let b_id = join(&mut b, "arena").await;
    assert_eq!(recv_json(&mut a).await, json!({ "new": b_id }));

    send_json(&mut a, json!({ "fight": true })).await;
    assert_eq!(recv_json(&mut b).await, json!({ "fight": "waiting" }));
    send_json(&mut b, json!({ "fight": true })).await;
    assert_eq!(recv_json(&mut a).await, json!({ "fight": "start" }));
    assert_eq!(recv_json(&mut b).await, json!({ "fight": "start" }));

    (a, a_id, b, b_id)
}

#[tokio::test]
async fn test_two_player_game_ends_with_final_win() {
    let addr = start_server().await;
    let (mut a, a_id, mut b, _b_id) = two_player_round(&addr).await;

    send_json(&mut a, json!({ "shoot": 1 })).await;
    send_json(&mut b, json!({ "shoot": 3 })).await;

    let expected = json!({ "result": "final_win", "winner": a_id });
    assert_eq!(recv_json(&mut a).await, expected);
    assert_eq!(recv_json(&mut b).await, expected);
}

#[tokio::test]
async fn test_draw_then_rematch_round() {
    let addr = start_server().await;
    let (mut a, _a_id, mut b, b_id) = two_player_round(&addr).await;

    send_json(&mut a, json!({ "shoot": 2 })).await;
    send_json(&mut b, json!({ "shoot": 2 })).await;
    assert_eq!(recv_json(&mut a).await, json!({ "result": "draw" }));
    assert_eq!(recv_json(&mut b).await, json!({ "result": "draw" }));

    send_json(&mut a, json!({ "fight": true })).await;
    assert_eq!(recv_json(&mut b).await, json!({ "fight": "waiting" }));
    send_json(&mut b, json!({ "fight": true })).await;
    assert_eq!(recv_json(&mut a).await, json!({ "fight": "start" }));
    assert_eq!(recv_json(&mut b).await, json!({ "fight": "start" }));

    send_json(&mut a, json!({ "shoot": 2 })).await;
    send_json(&mut b, json!({ "shoot": 3 })).await;
    let expected = json!({ "result": "final_win", "winner": b_id });
    assert_eq!(recv_json(&mut a).await, expected);
    assert_eq!(recv_json(&mut b).await, expected);
}

#[tokio::test]
async fn test_three_players_eliminate_one() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    let mut c = connect(&addr).await;
    join(&mut a, "arena").await;
    join(&mut b, "arena").await;
    join(&mut c, "arena").await;
    recv_json(&mut a).await;
    recv_json(&mut a).await;
    recv_json(&mut b).await;

    send_json(&mut a, json!({ "fight": 1 })).await;
    recv_json(&mut b).await;
    recv_json(&mut c).await;
    send_json(&mut b, json!({ "fight": 1 })).await;
    recv_json(&mut a).await;
    recv_json(&mut c).await;
    send_json(&mut c, json!({ "fight": 1 })).await;
    for ws in [&mut a, &mut b, &mut c] {
        assert_eq!(recv_json(ws).await, json!({ "fight": "start" }));
    }

    send_json(&mut a, json!({ "shoot": 1 })).await;
    send_json(&mut b, json!({ "shoot": 1 })).await;
    send_json(&mut c, json!({ "shoot": 3 })).await;

    assert_eq!(recv_json(&mut a).await, json!({ "result": "win" }));
    assert_eq!(recv_json(&mut b).await, json!({ "result": "win" }));
    assert_eq!(recv_json(&mut c).await, json!({ "result": "lose" }));
}

#[tokio::test]
async fn test_disconnect_mid_game_hands_walkover() {
    let addr = start_server().await;
    let (mut a, a_id, mut b, _b_id) = two_player_round(&addr).await;

    b.close(None).await.expect("close");

    assert_eq!(
        recv_json(&mut a).await,
        json!({ "result": "final_win", "winner": a_id })
    );
}

#[tokio::test]
async fn test_leave_then_rejoin_gets_fresh_room() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    join(&mut a, "solo").await;

    send_json(&mut a, json!({ "leave": true })).await;
    join(&mut a, "solo").await;

    // A fresh room with one member starts as soon as that member fights.
    send_json(&mut a, json!({ "fight": true })).await;
    assert_eq!(recv_json(&mut a).await, json!({ "fight": "start" }));
}

#[tokio::test]
async fn test_stalled_peer_is_dropped_from_its_room() {
    let addr = start_server_with_write_timeout(Duration::from_millis(200)).await;
    let (mut a, a_id, b, _b_id) = two_player_round(&addr).await;

    // `b` stops reading. Flood it with candidates until a write to it
    // misses the deadline and the relay drops it.
    let candidate = "x".repeat(256 * 1024);
    for _ in 0..256 {
        let frame = Message::text(json!({ "ice": candidate }).to_string());
        if a.send(frame).await.is_err() {
            break;
        }
    }

    assert_eq!(
        recv_json(&mut a).await,
        json!({ "result": "final_win", "winner": a_id })
    );
    drop(b);
}
