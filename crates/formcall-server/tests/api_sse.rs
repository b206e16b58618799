use formcall_server::config::Config;
use formcall_server::session::SessionHandle;
use formcall_server::{app, AppState};
use formcall_types::{DataPacket, Reliability};
use std::time::Duration;
use tokio::net::TcpListener;

/// Reads SSE chunks until one carrying `needle` arrives.
async fn read_until(response: &mut reqwest::Response, needle: &str) -> String {
    let mut seen = String::new();
    loop {
        let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
            .await
            .expect("timed out waiting for SSE event")
            .expect("failed to read SSE chunk")
            .expect("SSE stream ended");
        seen.push_str(&String::from_utf8_lossy(&chunk));
        if seen.contains(needle) {
            return seen;
        }
    }
}

#[tokio::test]
async fn test_sse_state_stream() {
    let state = AppState::new(&Config::default());
    let handle = state.sessions.insert(
        SessionHandle::start(
            "sse-1".to_string(),
            "form-sse-1".to_string(),
            "",
            "",
            "form-filler-agent",
            16,
        )
        .unwrap(),
    );

    let app = app(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let mut response = client
        .get(format!("http://{}/events/sse-1", addr))
        .send()
        .await
        .expect("Failed to connect to SSE stream");
    assert!(response.status().is_success());

    // The current snapshot arrives on connect.
    let initial = read_until(&mut response, "should_submit").await;
    assert!(initial.starts_with("data: "));
    assert!(initial.contains(r#""customer_name":null"#));

    // A raw participant edit is not forwarded, only the resulting snapshot.
    handle.channel.publish(DataPacket::new(
        "web",
        br#"{"field":"name","value":"Ada"}"#.to_vec(),
        Reliability::Reliable,
    ));
    let event = read_until(&mut response, "customer_name").await;
    assert!(event.contains(r#""customer_name":"Ada""#));
    assert!(!event.contains(r#""field""#));
}

#[tokio::test]
async fn test_sse_unknown_session() {
    let app = app(AppState::new(&Config::default()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let response = reqwest::get(format!("http://{}/events/missing", addr))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sse_stream_ends_when_session_is_deleted() {
    let state = AppState::new(&Config::default());
    state.sessions.insert(
        SessionHandle::start(
            "sse-2".to_string(),
            "form-sse-2".to_string(),
            "",
            "",
            "form-filler-agent",
            16,
        )
        .unwrap(),
    );
    let sessions = state.sessions.clone();

    let app = app(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut response = reqwest::get(format!("http://{}/events/sse-2", addr))
        .await
        .unwrap();
    let _initial = read_until(&mut response, "should_submit").await;

    assert!(sessions.remove("sse-2").is_some());

    let ended = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match response.chunk().await {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => return,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "SSE stream stayed open after the session was deleted");
}
