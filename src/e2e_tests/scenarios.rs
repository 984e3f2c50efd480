//! Registry scenarios against the scripted server

use super::fake_server::{FakeServer, ServerScript};
use crate::auth::Credentials;
use crate::client::{ClientConfig, SessionState, ShareEnumerator, SocketSession};
use crate::error::{Error, NtStatus};
use crate::protocol::smb2_constants::{share_type, Smb2Command};
use crate::registry::{ConnectOptions, ConnectionRegistry, DEFAULT_CONNECTION_ID};
use std::sync::Arc;
use std::time::Duration;

fn config() -> ClientConfig {
    ClientConfig::default()
        .with_connect_timeout(Duration::from_secs(5))
        .with_request_timeout(Duration::from_secs(5))
}

fn options(server: &FakeServer) -> ConnectOptions {
    ConnectOptions::new("smb://127.0.0.1/", "alice", "secret")
        .domain("WORKGROUP")
        .port(server.port)
}

fn assert_synthetic(drives: &[crate::DirectoryEntry]) {
    assert!((3..=26).contains(&drives.len()), "{} drives", drives.len());
    assert!(drives.iter().all(|d| d.is_drive && d.is_directory));
    assert!(drives.iter().all(|d| d.name.len() == 1));
    assert!(drives.windows(2).all(|pair| pair[0].name < pair[1].name));
}

#[tokio::test]
async fn test_handshake_then_list_drives() {
    let server = FakeServer::start(ServerScript::default().with_shares(&[
        ("Public", share_type::DISK_TREE),
        ("IPC$", share_type::IPC | share_type::SPECIAL),
        ("Backups", share_type::DISK_TREE),
    ]))
    .await
    .unwrap();

    let registry = ConnectionRegistry::new(config());
    assert!(registry.connect(options(&server)).await.unwrap());
    assert_eq!(registry.current().await.as_deref(), Some(DEFAULT_CONNECTION_ID));

    let drives = registry.list_drives(None).await.unwrap();
    let names: Vec<&str> = drives.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Public", "IPC$", "Backups"]);
    assert!(drives.iter().all(|d| d.is_drive));

    let seen = server.requests();
    let commands: Vec<Smb2Command> = seen.iter().map(|r| r.command).collect();
    assert_eq!(
        commands,
        [
            Smb2Command::Negotiate,
            Smb2Command::SessionSetup,
            Smb2Command::TreeConnect,
            Smb2Command::Ioctl
        ]
    );
    let ids: Vec<u64> = seen.iter().map(|r| r.message_id).collect();
    assert_eq!(ids, [1, 2, 3, 4]);
    assert_eq!(seen[1].session_id, 0);
    assert_eq!(seen[2].session_id, ServerScript::default().session_id);
    assert_eq!(seen[3].tree_id, 7);
}

#[tokio::test]
async fn test_empty_share_response_falls_back_to_synthetic_drives() {
    let server = FakeServer::start(ServerScript::default()).await.unwrap();
    let registry = ConnectionRegistry::new(config());
    registry.connect(options(&server)).await.unwrap();

    let drives = registry.list_drives(None).await.unwrap();
    assert_synthetic(&drives);
}

#[tokio::test]
async fn test_fallback_disabled_surfaces_list_failure() {
    let server = FakeServer::start(ServerScript::default()).await.unwrap();
    let registry = ConnectionRegistry::new(config().with_synthetic_drive_fallback(false));
    registry.connect(options(&server)).await.unwrap();

    let err = registry.list_drives(None).await.unwrap_err();
    assert_eq!(err.code(), "LIST_FAILED");
}

#[tokio::test]
async fn test_silent_share_enumeration_times_out_into_fallback() {
    let server = FakeServer::start(ServerScript::default().silent_on(Smb2Command::Ioctl))
        .await
        .unwrap();
    let registry =
        ConnectionRegistry::new(config().with_request_timeout(Duration::from_millis(200)));
    registry.connect(options(&server)).await.unwrap();

    let drives = registry.list_drives(None).await.unwrap();
    assert_synthetic(&drives);
}

#[tokio::test]
async fn test_silent_peer_fails_connect_within_bound() {
    let server = FakeServer::start(ServerScript::default().silent_on(Smb2Command::Negotiate))
        .await
        .unwrap();
    let registry =
        ConnectionRegistry::new(config().with_request_timeout(Duration::from_millis(200)));

    let result = tokio::time::timeout(Duration::from_secs(5), registry.connect(options(&server)))
        .await
        .expect("connect resolves within the request timeout");
    assert_eq!(result.unwrap_err().code(), "CONNECTION_FAILED");
    assert!(registry.connection_ids().await.is_empty());
}

#[tokio::test]
async fn test_session_setup_status_does_not_block_connect() {
    let script = ServerScript {
        session_status: NtStatus::MoreProcessingRequired as u32,
        ..ServerScript::default()
    };
    let server = FakeServer::start(script).await.unwrap();
    let registry = ConnectionRegistry::new(config());

    assert!(registry.connect(options(&server)).await.unwrap());
    let drives = registry.list_drives(None).await.unwrap();
    assert_synthetic(&drives);

    let seen = server.requests();
    let commands: Vec<Smb2Command> = seen.iter().map(|r| r.command).collect();
    assert_eq!(
        commands,
        [
            Smb2Command::Negotiate,
            Smb2Command::SessionSetup,
            Smb2Command::TreeConnect,
            Smb2Command::Ioctl
        ]
    );
    assert_eq!(seen[2].session_id, ServerScript::default().session_id);
    assert_eq!(seen[3].tree_id, 7);
}

#[tokio::test]
async fn test_zero_session_id_connects_but_cannot_list_drives() {
    let script = ServerScript {
        session_id: 0,
        ..ServerScript::default()
    };
    let server = FakeServer::start(script).await.unwrap();
    let registry = ConnectionRegistry::new(config());

    assert!(registry.connect(options(&server)).await.unwrap());
    assert!(matches!(
        registry.list_drives(None).await,
        Err(Error::AuthenticationFailed(_))
    ));
    assert!(!server.commands().contains(&Smb2Command::Ioctl));

    let strict = ConnectionRegistry::new(config().with_strict_handshake(true));
    let err = strict.connect(options(&server)).await.unwrap_err();
    assert_eq!(err.code(), "AUTH_FAILED");
}

#[tokio::test]
async fn test_strict_handshake_rejects_logon_failure() {
    let script = ServerScript {
        session_status: NtStatus::LogonFailure as u32,
        ..ServerScript::default()
    };
    let server = FakeServer::start(script).await.unwrap();
    let registry = ConnectionRegistry::new(config().with_strict_handshake(true));

    let err = registry.connect(options(&server)).await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed(_)));
    assert_eq!(
        server.commands(),
        [Smb2Command::Negotiate, Smb2Command::SessionSetup]
    );
    assert!(matches!(
        registry.list_drives(None).await,
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn test_refused_connection() {
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let registry = ConnectionRegistry::new(config());
    let err = registry
        .connect(ConnectOptions::new("127.0.0.1", "alice", "").port(port))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONNECTION_FAILED");
}

#[tokio::test]
async fn test_unauthenticated_session_cannot_list_drives() {
    let server = FakeServer::start(ServerScript::default()).await.unwrap();
    let config = Arc::new(config());
    let session = Arc::new(SocketSession::new("127.0.0.1", server.port, &config));
    session.connect().await.unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    let enumerator = ShareEnumerator::new(session, config, Credentials::new("alice", ""));
    assert!(matches!(
        enumerator.list_drives().await,
        Err(Error::AuthenticationFailed(_))
    ));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_transfers_are_not_implemented() {
    let server = FakeServer::start(ServerScript::default()).await.unwrap();
    let registry = ConnectionRegistry::new(config());
    registry.connect(options(&server)).await.unwrap();
    let before = server.requests().len();

    let err = registry
        .download_file("docs/a.txt", "/tmp/a.txt", None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_IMPLEMENTED");
    let err = registry
        .upload_file("/tmp/a.txt", "docs/a.txt", Some(DEFAULT_CONNECTION_ID))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_IMPLEMENTED");

    assert_eq!(server.requests().len(), before);
}

#[tokio::test]
async fn test_list_files() {
    let server = FakeServer::start(ServerScript::default().with_directory(&[
        (".", 0x10, 0),
        ("reports", 0x10, 0),
        ("budget.xlsx", 0x20, 48_213),
    ]))
    .await
    .unwrap();
    let registry = ConnectionRegistry::new(config());
    registry.connect(options(&server)).await.unwrap();

    let entries = registry.list_files("docs", None).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries[1].is_directory);
    assert_eq!(entries[2].name, "budget.xlsx");
    assert_eq!(entries[2].size, 48_213);
    assert!(entries.iter().all(|e| !e.is_drive));
}

#[tokio::test]
async fn test_disconnect_semantics() {
    let server = FakeServer::start(ServerScript::default()).await.unwrap();
    let registry = ConnectionRegistry::new(config());
    registry
        .connect(options(&server).connection_id("nas"))
        .await
        .unwrap();

    assert!(matches!(
        registry.disconnect(Some("other")).await,
        Err(Error::InvalidConnection(_))
    ));
    assert!(registry.disconnect(Some("nas")).await.unwrap());
    assert!(matches!(
        registry.list_drives(Some("nas")).await,
        Err(Error::NotConnected)
    ));
    assert!(matches!(
        registry.list_files("docs", None).await,
        Err(Error::NotConnected)
    ));
    assert!(matches!(
        registry.disconnect(Some("nas")).await,
        Err(Error::InvalidConnection(_))
    ));
}

#[tokio::test]
async fn test_connections_are_independent() {
    let first = FakeServer::start(ServerScript::default().with_shares(&[("Alpha", 0)]))
        .await
        .unwrap();
    let second = FakeServer::start(ServerScript::default().with_shares(&[("Beta", 0)]))
        .await
        .unwrap();
    let registry = ConnectionRegistry::new(config());

    registry
        .connect(options(&first).connection_id("one"))
        .await
        .unwrap();
    registry
        .connect(options(&second).connection_id("two"))
        .await
        .unwrap();
    assert_eq!(registry.connection_ids().await, ["one", "two"]);
    assert_eq!(registry.current().await.as_deref(), Some("two"));

    assert_eq!(registry.list_drives(Some("one")).await.unwrap()[0].name, "Alpha");
    assert_eq!(registry.list_drives(None).await.unwrap()[0].name, "Beta");

    registry.disconnect(Some("two")).await.unwrap();
    assert_eq!(registry.list_drives(Some("one")).await.unwrap()[0].name, "Alpha");

    // each connection numbers its own messages
    let ids: Vec<u64> = first.requests().iter().map(|r| r.message_id).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_reconnect_replaces_existing_entry() {
    let first = FakeServer::start(ServerScript::default().with_shares(&[("Old", 0)]))
        .await
        .unwrap();
    let second = FakeServer::start(ServerScript::default().with_shares(&[("New", 0)]))
        .await
        .unwrap();
    let registry = ConnectionRegistry::new(config());

    registry.connect(options(&first)).await.unwrap();
    registry.connect(options(&second)).await.unwrap();

    assert_eq!(registry.connection_ids().await, [DEFAULT_CONNECTION_ID]);
    assert_eq!(registry.list_drives(None).await.unwrap()[0].name, "New");
}

#[tokio::test]
async fn test_disconnect_releases_waiting_request() {
    let server = FakeServer::start(ServerScript::default().silent_on(Smb2Command::QueryDirectory))
        .await
        .unwrap();
    let registry = Arc::new(ConnectionRegistry::new(
        config().with_request_timeout(Duration::from_secs(30)),
    ));
    registry.connect(options(&server)).await.unwrap();

    let waiting = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.list_files("docs", None).await })
    };
    while !server.commands().contains(&Smb2Command::QueryDirectory) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    registry.disconnect(None).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), waiting)
        .await
        .expect("waiter released by disconnect")
        .unwrap();
    assert_eq!(result.unwrap_err().code(), "LIST_FAILED");
}

#[cfg(feature = "blocking")]
#[test]
fn test_blocking_registry_round_trip() {
    use crate::blocking::BlockingRegistry;

    let server_runtime = tokio::runtime::Runtime::new().unwrap();
    let server = server_runtime
        .block_on(FakeServer::start(
            ServerScript::default().with_shares(&[("Media", 0)]),
        ))
        .unwrap();

    let registry = BlockingRegistry::with_config(config()).unwrap();
    assert!(registry.connect(options(&server)).unwrap());
    assert_eq!(registry.list_drives(None).unwrap()[0].name, "Media");
    assert!(registry.disconnect(None).unwrap());
    assert!(matches!(registry.list_drives(None), Err(Error::NotConnected)));

    drop(server);
}
