//! Full session run against a scripted in-process server: join, phase cycle,
//! vote result, night outcome, game over.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use outbreak_client::{ClientConfig, GameSession, SessionEvent};
use outbreak_domain::{Phase, PlayerNo, Role, RoomId, Team};
use outbreak_protocol::WireFrame;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn next_wire_frame(ws: &mut WebSocketStream<TcpStream>) -> WireFrame {
    loop {
        match timeout(Duration::from_secs(2), ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                return WireFrame::decode(&text).expect("decodable frame")
            }
            Ok(Some(Ok(_))) => continue,
            other => panic!("socket ended while waiting for a frame: {other:?}"),
        }
    }
}

async fn push(ws: &mut WebSocketStream<TcpStream>, topic: String, payload: serde_json::Value) {
    let frame = WireFrame::Message { topic, payload };
    ws.send(Message::Text(frame.encode().expect("encode")))
        .await
        .expect("push");
}

async fn push_room(ws: &mut WebSocketStream<TcpStream>, payload: serde_json::Value) {
    push(ws, "/sub/room/1".to_string(), payload).await;
}

async fn push_system(ws: &mut WebSocketStream<TcpStream>, payload: serde_json::Value) {
    push(ws, "/sub/system/1".to_string(), payload).await;
}

/// The server half: waits for the five subscriptions and the enter intent,
/// then drives a short game to its end.
async fn run_scripted_server(listener: TcpListener) {
    let (stream, _) = listener.accept().await.expect("accept");
    let mut ws = accept_async(stream).await.expect("handshake");

    let mut subscriptions = Vec::new();
    let mut entered = false;
    while subscriptions.len() < 5 || !entered {
        match next_wire_frame(&mut ws).await {
            WireFrame::Subscribe { topic } => subscriptions.push(topic),
            WireFrame::Send {
                destination,
                payload,
            } => {
                assert_eq!(destination, "/pub/room/1/enter");
                assert_eq!(payload["type"], "EnterRoom");
                assert_eq!(payload["nickname"], "ash");
                entered = true;
            }
            frame => panic!("unexpected frame during join: {frame:?}"),
        }
    }
    for topic in [
        "/sub/system/1",
        "/sub/room/1",
        "/sub/chat/1/all",
        "/sub/chat/1/infected",
        "/sub/chat/1/dead",
    ] {
        assert!(subscriptions.iter().any(|t| t == topic), "missing {topic}");
    }

    // Lobby fills up; the local player hosts.
    push_room(&mut ws, json!({"type": "PlayerJoined", "player_no": 1, "nickname": "ash"})).await;
    push_room(&mut ws, json!({"type": "PlayerJoined", "player_no": 2, "nickname": "brook"})).await;
    push_room(&mut ws, json!({"type": "PlayerJoined", "player_no": 3, "nickname": "cole"})).await;
    push_room(&mut ws, json!({"type": "HostChanged", "player_no": 1})).await;
    push_room(&mut ws, json!({"type": "RoleAssigned", "player_no": 1, "role": "SURVIVOR"})).await;
    push_room(&mut ws, json!({"type": "GameStarted"})).await;

    // Day discussion, with a repeated phase event (timer correction only).
    push_system(&mut ws, json!({"phase": "DAY_DISCUSSION", "time": 5})).await;
    push_system(&mut ws, json!({"phase": "DAY_DISCUSSION", "time": 4})).await;
    push(
        &mut ws,
        "/sub/chat/1/all".to_string(),
        json!({"content": "morning", "sender": 2}),
    )
    .await;

    // Vote: 1 and 2 target 2, 3 targets 1.
    push_system(&mut ws, json!({"phase": "DAY_VOTE", "time": 3})).await;
    push_system(&mut ws, json!({"voteresult": {"1": 2, "2": 2, "3": 1}})).await;

    // Night resolves with one death, then the game ends.
    push_system(&mut ws, json!({"phase": "NIGHT_ACTION", "time": 3})).await;
    push_system(&mut ws, json!({"death": [3]})).await;
    push_system(&mut ws, json!({"phase": "GAME_OVER", "winner": "SURVIVORS"})).await;

    // Drain until the client goes away.
    while let Some(Ok(_)) = ws.next().await {}
}

fn no(n: u32) -> PlayerNo {
    PlayerNo::new(n)
}

#[tokio::test]
async fn session_runs_a_full_game_to_its_terminal_state() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(run_scripted_server(listener));

    let config = ClientConfig {
        endpoint: format!("ws://{addr}"),
        reconnect_delay_ms: 100,
        ..ClientConfig::default()
    };

    let session = GameSession::join(&config, RoomId::new(1), no(1), "ash")
        .await
        .expect("join");

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let _subscription = session.events().subscribe(move |event: &SessionEvent| {
        sink.lock().expect("lock").push(event.clone());
    });

    let session = timeout(Duration::from_secs(5), session.run())
        .await
        .expect("game reached its end");

    let events = events.lock().expect("lock").clone();

    // Exactly one transition per actual phase change; the repeated
    // DAY_DISCUSSION event produced none.
    let phase_changes: Vec<Phase> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phase_changes,
        vec![Phase::DayDiscussion, Phase::DayVote, Phase::NightAction]
    );

    // Chat came through on its category topic.
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::Chat(message) if message.content == "morning" && message.sender == Some(no(2))
    )));

    // Vote result in ascending voter order.
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::VoteResult { targets }
            if *targets == vec![(no(1), no(2)), (no(2), no(2)), (no(3), no(1))]
    )));

    // The outcome reached both the bus and the room mirror.
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::Outcome { deaths, .. } if *deaths == vec![no(3)])));
    let snapshot = session.snapshot();
    assert_eq!(snapshot.participant_count(), 3);
    assert_eq!(snapshot.alive_count(), 2);
    assert!(snapshot.participant(no(3)).expect("cole").is_dead);
    assert_eq!(snapshot.host(), Some(no(1)));

    // Terminal state: winner recorded, no view active, machine finished.
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::GameOver { winner } if *winner == Some(Team::Survivors)
    )));
    assert_eq!(session.winner(), Some(Some(Team::Survivors)));
    assert_eq!(session.active_view(), None);
    assert_eq!(session.local_role(), Some(Role::Survivor));
    assert_eq!(session.current_phase(), Some(Phase::NightAction));

    session.leave().await;
    server.abort();
}

#[tokio::test]
async fn host_only_intents_are_guarded_locally() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        while let Some(Ok(_)) = ws.next().await {}
    });

    let config = ClientConfig {
        endpoint: format!("ws://{addr}"),
        reconnect_delay_ms: 100,
        ..ClientConfig::default()
    };
    let session = GameSession::join(&config, RoomId::new(1), no(2), "brook")
        .await
        .expect("join");

    // No host assignment has arrived; both host intents fail locally.
    assert!(session.start_game().await.is_err());
    assert!(session.kick_player(no(1)).await.is_err());

    session.leave().await;
    server.abort();
}
