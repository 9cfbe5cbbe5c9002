//! `HttpNotesGateway` against a loopback server that replays canned
//! responses and records each request it receives.

use autonote_core::{
    GatewayConfig, GatewayError, HttpNotesGateway, NoteId, NotePatch, NotesGateway, Session,
};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

#[derive(Debug)]
struct Recorded {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

/// `None` holds the connection open without answering.
type Reply = Option<String>;

fn reply(status: &str, body: &str) -> Reply {
    Some(format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ))
}

async fn read_request(socket: &mut TcpStream) -> Recorded {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let read = socket.read(&mut chunk).await.unwrap();
        assert!(read > 0, "connection closed before headers");
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let mut content_length = 0;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap(),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buffer.len() < header_end + content_length {
        let read = socket.read(&mut chunk).await.unwrap();
        assert!(read > 0, "connection closed before body");
        buffer.extend_from_slice(&chunk[..read]);
    }
    let body = String::from_utf8_lossy(&buffer[header_end..header_end + content_length]).to_string();

    Recorded {
        method,
        path,
        authorization,
        body,
    }
}

/// Serves one reply per accepted connection, in order.
async fn serve(replies: Vec<Reply>) -> (String, mpsc::UnboundedReceiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (recorded_tx, recorded_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for reply in replies {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let _ = recorded_tx.send(request);
            match reply {
                Some(response) => {
                    socket.write_all(response.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                }
                None => tokio::time::sleep(Duration::from_secs(10)).await,
            }
        }
    });

    (base_url, recorded_rx)
}

fn gateway(base_url: &str, timeout_secs: u64) -> HttpNotesGateway {
    let config = GatewayConfig::new(base_url, timeout_secs).unwrap();
    HttpNotesGateway::new(&config, Session::new("secret")).unwrap()
}

fn note_json(title: &str) -> String {
    json!({
        "id": "1",
        "user_id": "alice",
        "title": title,
        "content": "Body",
        "tags": ["x"],
        "source_type": "web",
        "source_url": "https://example.com/page",
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-01-02T00:00:00",
        "summary": null,
        "key_points": []
    })
    .to_string()
}

#[tokio::test]
async fn update_puts_full_note_body() {
    let (base_url, mut recorded) = serve(vec![
        reply("200 OK", &note_json("Old")),
        reply("200 OK", &note_json("Renamed")),
    ])
    .await;
    let gateway = gateway(&base_url, 5);

    let updated = gateway
        .update(&NoteId::from(1), &NotePatch::new().title("Renamed"))
        .await
        .unwrap();
    assert_eq!(updated.title, "Renamed");

    let fetch = recorded.recv().await.unwrap();
    assert_eq!((fetch.method.as_str(), fetch.path.as_str()), ("GET", "/notes/1"));

    let put = recorded.recv().await.unwrap();
    assert_eq!((put.method.as_str(), put.path.as_str()), ("PUT", "/notes/1"));
    assert_eq!(put.authorization.as_deref(), Some("Bearer secret"));
    let body: Value = serde_json::from_str(&put.body).unwrap();
    assert_eq!(
        body,
        json!({
            "title": "Renamed",
            "content": "Body",
            "tags": ["x"],
            "source_type": "web",
            "source_url": "https://example.com/page"
        })
    );
}

#[tokio::test]
async fn update_of_missing_note_sends_no_put() {
    let (base_url, mut recorded) = serve(vec![reply(
        "404 Not Found",
        r#"{"detail":"Note not found"}"#,
    )])
    .await;
    let gateway = gateway(&base_url, 5);

    let err = gateway
        .update(&NoteId::from(9), &NotePatch::new().title("x"))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::NotFound(Some("Note not found".to_string())));
    assert_eq!(recorded.recv().await.unwrap().method, "GET");
    assert!(recorded.recv().await.is_none());
}

#[tokio::test]
async fn unauthorized_response_invalidates_session() {
    let (base_url, _recorded) = serve(vec![reply(
        "401 Unauthorized",
        r#"{"detail":"Invalid authentication credentials"}"#,
    )])
    .await;
    let gateway = gateway(&base_url, 5);
    let session = gateway.session().clone();
    assert!(session.is_authenticated());

    let err = gateway.list().await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::Unauthorized(Some("Invalid authentication credentials".to_string()))
    );
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn not_found_carries_server_detail() {
    let (base_url, mut recorded) = serve(vec![reply(
        "404 Not Found",
        r#"{"detail":"Note not found"}"#,
    )])
    .await;
    let gateway = gateway(&base_url, 5);

    let err = gateway.get(&NoteId::from(42)).await.unwrap_err();
    assert_eq!(err, GatewayError::NotFound(Some("Note not found".to_string())));
    assert_eq!(recorded.recv().await.unwrap().path, "/notes/42");
}

#[tokio::test]
async fn invalid_note_body_is_malformed() {
    let body = json!([{"id": 1, "title": "", "content": "x", "created_at": "2024-01-01"}]);
    let (base_url, _recorded) = serve(vec![reply("200 OK", &body.to_string())]).await;
    let gateway = gateway(&base_url, 5);

    let err = gateway.list().await.unwrap_err();
    assert!(
        matches!(err, GatewayError::Malformed(ref details) if details.contains("Title is required")),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn unanswered_request_times_out() {
    let (base_url, _recorded) = serve(vec![None]).await;
    let gateway = gateway(&base_url, 1);

    assert_eq!(gateway.list().await, Err(GatewayError::Timeout));
}
