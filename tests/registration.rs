//! Integration tests for the registration state machine.

mod common;

use common::TestServer;
use std::time::Duration;

#[tokio::test]
async fn test_banner_on_connect() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut client = server.connect().await.expect("connect");

    let line = client.recv().await.expect("first banner line");
    assert_eq!(line, "Welcome to the chatroom!");
    let line = client.recv().await.expect("second banner line");
    assert_eq!(line, "------------------------");
    let line = client.recv().await.expect("name prompt");
    assert!(line.contains("YOU DO NOT HAVE A NAME!"));
}

#[tokio::test]
async fn test_commands_require_a_name() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut client = server.connect().await.expect("connect");
    client.recv_banner().await.expect("banner");

    for command in ["list", "help", "bcst hello", "mesg bob hi"] {
        client.send(command).await.expect("send");
        let lines = client
            .recv_until_contains("YOU DO NOT HAVE A NAME!")
            .await
            .expect("name-required reply");
        assert!(!lines.is_empty(), "command: {command}");
    }
    assert!(server.roster.names().is_empty());
}

#[tokio::test]
async fn test_accept_notice_goes_to_others_only() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut watcher = server.join("watcher").await.expect("join watcher");
    watcher.drain().await;

    let mut newcomer = server.connect().await.expect("connect");
    watcher
        .recv_until_contains("Accepting new client:")
        .await
        .expect("watcher sees the accept notice");

    // The newcomer gets the banner and nothing else; its own accept
    // notice must not land in its queue.
    newcomer.recv_banner().await.expect("banner");
    assert!(
        newcomer
            .recv_timeout(Duration::from_millis(300))
            .await
            .is_err(),
        "newcomer received an extra line after the banner"
    );
}

#[tokio::test]
async fn test_duplicate_name_rejected() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut alice = server.join("alice").await.expect("join alice");

    let mut impostor = server.connect().await.expect("connect impostor");
    impostor.recv_banner().await.expect("banner");
    impostor.send("join alice").await.expect("send join");

    let line = impostor.recv().await.expect("rejection");
    assert_eq!(
        line,
        "That name was already taken, please use another name and try again."
    );

    // The registry still maps only the original alice, and the impostor
    // stays anonymous: named commands keep bouncing.
    assert_eq!(server.roster.names(), vec!["alice".to_string()]);
    impostor.send("list").await.expect("send list");
    impostor
        .recv_until_contains("YOU DO NOT HAVE A NAME!")
        .await
        .expect("still anonymous");

    // The original connection is unaffected.
    alice.drain().await;
    alice.send("list").await.expect("send list");
    let line = alice.recv().await.expect("list reply");
    assert_eq!(line, "Users: alice");
}

#[tokio::test]
async fn test_join_is_case_sensitive_for_names() {
    let server = TestServer::spawn().await.expect("spawn server");
    let _alice = server.join("alice").await.expect("join alice");
    let _big_alice = server.join("Alice").await.expect("join Alice");

    assert_eq!(
        server.roster.names(),
        vec!["Alice".to_string(), "alice".to_string()]
    );
}

#[tokio::test]
async fn test_invalid_name_rejected() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut client = server.connect().await.expect("connect");
    client.recv_banner().await.expect("banner");

    client.send("join b@d!name").await.expect("send join");
    let line = client.recv().await.expect("rejection");
    assert!(line.contains("not a valid name"), "got: {line}");
    assert!(server.roster.names().is_empty());
}

#[tokio::test]
async fn test_join_without_name_is_usage_error() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut client = server.connect().await.expect("connect");
    client.recv_banner().await.expect("banner");

    client.send("join").await.expect("send join");
    let line = client.recv().await.expect("usage reply");
    assert!(line.contains("Invalid usage of JOIN"), "got: {line}");
}

#[tokio::test]
async fn test_join_twice_rejected() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut alice = server.join("alice").await.expect("join alice");
    alice.drain().await;

    alice.send("join other").await.expect("send join");
    let line = alice.recv().await.expect("reply");
    assert_eq!(line, "You have already registered, you cannot use 'JOIN'.");
    assert_eq!(server.roster.names(), vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_join_broadcasts_notice_and_hint() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut alice = server.join("alice").await.expect("join alice");
    alice.drain().await;

    let mut bob = server.connect().await.expect("connect bob");
    bob.recv_banner().await.expect("banner");
    bob.send("JOIN bob").await.expect("send join");
    bob.recv_until_contains("Type 'help' for a list of commands.")
        .await
        .expect("welcome hint");

    let lines = alice
        .recv_until_contains("'bob' has joined the chatroom!")
        .await
        .expect("join notice");
    assert!(lines.iter().any(|l| l.starts_with("[Server] ")));
}

#[tokio::test]
async fn test_anonymous_quit() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut watcher = server.join("watcher").await.expect("join watcher");
    watcher.drain().await;

    let mut client = server.connect().await.expect("connect");
    client.recv_banner().await.expect("banner");
    client.send("quit").await.expect("send quit");

    watcher
        .recv_until_contains("has stopped connecting.")
        .await
        .expect("disconnect notice");
}
