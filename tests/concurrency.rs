#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Live-server concurrency tests: concurrent connections must each see
//! their own responses, in order, with correct sequence correlation.

use circ_protocol::config::{ProtocolConfig, ServerConfig};
use circ_protocol::core::frame::OutboundMessage;
use circ_protocol::service::{serve, CircClient};
use circ_protocol::transport::tcp;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

struct TestServer {
    addr: String,
    shutdown_tx: mpsc::Sender<()>,
    handle: tokio::task::JoinHandle<circ_protocol::Result<()>>,
}

async fn spawn_server() -> TestServer {
    let listener = tcp::listen("127.0.0.1:0").await.expect("ephemeral bind");
    let addr = listener.local_addr().expect("local addr").to_string();

    let server_config = ServerConfig {
        address: addr.clone(),
        ..ServerConfig::default()
    };
    let protocol_config = ProtocolConfig::default();
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    let handle = tokio::spawn(async move {
        serve(listener, &server_config, &protocol_config, shutdown_rx).await
    });

    TestServer {
        addr,
        shutdown_tx,
        handle,
    }
}

impl TestServer {
    async fn shutdown(self) {
        self.shutdown_tx.send(()).await.expect("server alive");
        self.handle
            .await
            .expect("server task joins")
            .expect("server exits cleanly");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_connections_get_correlated_responses() {
    let server = spawn_server().await;

    let mut tasks = JoinSet::new();
    for client_id in 0..2 {
        let addr = server.addr.clone();
        tasks.spawn(async move {
            let mut client = CircClient::connect(&addr).await.expect("connect");
            for i in 0..100 {
                let expected_seq = client.next_sequence();
                let patron = format!("patron-{client_id}-{i}");
                let response = client.patron_status(&patron).await.expect("response");

                // Every response belongs to this connection's request: the
                // patron id and sequence digit both match
                assert_eq!(response.code(), "24");
                assert_eq!(response.sequence(), char::from(b'0' + expected_seq));
                assert!(
                    response.fields().contains(&format!("AA{patron}|")),
                    "response {} carried fields {:?}",
                    i,
                    response.fields()
                );
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.expect("client task should complete");
    }

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_transaction_flow_over_one_connection() {
    let server = spawn_server().await;

    let mut client = CircClient::connect(&server.addr).await.expect("connect");

    let login = client.login("libuser", "secret").await.expect("login");
    assert_eq!(login.code(), "94");
    assert_eq!(login.fields(), "1");

    let checkout = client
        .checkout("patron123", "item456")
        .await
        .expect("checkout");
    assert_eq!(checkout.code(), "12");
    assert_eq!(checkout.fields(), "1");

    let checkin = client.checkin("item456").await.expect("checkin");
    assert_eq!(checkin.code(), "10");
    assert_eq!(checkin.fields(), "1");

    let status = client.patron_status("patron123").await.expect("status");
    assert_eq!(status.code(), "24");
    assert!(status.fields().contains("AApatron123|"));

    drop(client);
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pipelined_requests_are_answered_in_order() {
    let server = spawn_server().await;

    // Raw framed connection so several requests land in one write burst
    let mut framed = tcp::connect(&server.addr).await.expect("connect");
    for i in 0..5u8 {
        let seq = char::from(b'0' + i);
        framed
            .feed(OutboundMessage::new("23", format!("AAp{i}|"), seq))
            .await
            .expect("feed");
    }
    framed.flush().await.expect("flush");

    for i in 0..5u8 {
        let frame = framed
            .next()
            .await
            .expect("stream open")
            .expect("valid frame");
        assert_eq!(frame.code(), "24");
        assert_eq!(frame.sequence(), char::from(b'0' + i));
        assert_eq!(frame.field("AA"), Some(format!("p{i}").as_str()));
    }

    drop(framed);
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unsupported_transaction_gets_silence_not_disconnect() {
    let server = spawn_server().await;

    let mut framed = tcp::connect(&server.addr).await.expect("connect");

    // Unknown code: no response may arrive for it
    framed
        .send(OutboundMessage::new("63", "AOx|", '1'))
        .await
        .expect("send unknown");

    // The connection stays usable: the next supported request is answered
    framed
        .send(OutboundMessage::new("93", "BNu|COp|", '2'))
        .await
        .expect("send login");

    let frame = framed
        .next()
        .await
        .expect("stream open")
        .expect("valid frame");
    assert_eq!(frame.code(), "94");
    assert_eq!(frame.sequence(), '2');

    drop(framed);
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bind_conflict_is_an_error_not_a_crash() {
    let server = spawn_server().await;

    let result = tcp::listen(&server.addr).await;
    assert!(matches!(
        result,
        Err(circ_protocol::ProtocolError::Bind { .. })
    ));

    server.shutdown().await;
}
