//! HttpSessionSource talking to a live server on an ephemeral port

use ccbrowse_core::models::SessionId;
use ccbrowse_core::{
    CoreError, HttpSessionSource, LocalSessionStore, SessionDataController, SessionSource,
};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_server() -> (tempfile::TempDir, HttpSessionSource) {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("projects").join("-Users-test-remote");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("s1.jsonl"),
        [
            r#"{"type":"user","message":{"content":"first"}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"reply"},{"type":"image","source":{"type":"base64","data":"QUJD"}}]}}"#,
        ]
        .join("\n"),
    )
    .unwrap();
    fs::write(
        dir.join("s2.jsonl"),
        r#"{"type":"user","message":{"content":"second"}}"#,
    )
    .unwrap();

    let store = Arc::new(LocalSessionStore::new(temp.path()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = ccbrowse_web::serve(listener, store).await;
    });

    let client =
        HttpSessionSource::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
    (temp, client)
}

#[tokio::test]
async fn test_list_and_transcript_over_http() {
    let (_temp, client) = spawn_server().await;

    let sessions = client.list_sessions(10).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.project == "/Users/test/remote"));

    let transcript = client.transcript(&SessionId::from("s1")).await.unwrap();
    assert_eq!(transcript.summary, "first");
    assert_eq!(transcript.loglines.len(), 2);

    let shown = ccbrowse_core::displayable_messages(&transcript.loglines);
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[1].blocks.len(), 2);
}

#[tokio::test]
async fn test_missing_session_maps_to_not_found() {
    let (_temp, client) = spawn_server().await;
    let err = client.transcript(&SessionId::from("gone")).await.unwrap_err();
    assert!(matches!(err, CoreError::HttpStatus { status: 404, .. }));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_controller_mutations_over_http() {
    let (temp, client) = spawn_server().await;
    let controller = SessionDataController::new(Arc::new(client));

    assert!(controller.load_sessions(10).await);
    assert_eq!(controller.sessions().len(), 2);

    let s2 = SessionId::from("s2");
    assert_eq!(controller.toggle_favorite(&s2).await, Some(true));
    assert!(controller.session(&s2).unwrap().is_favorite);
    assert!(!controller.session(&SessionId::from("s1")).unwrap().is_favorite);

    let html = controller.session_html(&s2).await.unwrap();
    assert!(html.contains("second"));

    assert!(controller.delete_session(&s2).await);
    assert!(controller.session(&s2).is_none());
    assert!(!temp.path().join("projects/-Users-test-remote/s2.jsonl").exists());

    assert!(!controller.delete_session(&s2).await);
}
