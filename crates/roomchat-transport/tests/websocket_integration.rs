//! WebSocket transport against a local tokio-tungstenite acceptor.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use roomchat_transport::{connect, Connection, Endpoint, TransportError, WebSocketConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message},
};

/// Spawn a one-shot server that runs `script` against the accepted socket.
async fn spawn_server<F, Fut>(script: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        script(ws).await;
    });

    (addr, handle)
}

#[tokio::test]
async fn test_exchange_and_close() {
    let (addr, server) = spawn_server(|mut ws| async move {
        ws.send(Message::Text(
            r#"{"type":"server_message","content":"Alice joined"}"#.to_string(),
        ))
        .await
        .unwrap();

        // Echo one frame back, then expect the client's close frame
        match ws.next().await {
            Some(Ok(Message::Text(text))) => ws.send(Message::Text(text)).await.unwrap(),
            other => panic!("Expected text frame, got {:?}", other),
        }

        loop {
            match ws.next().await {
                Some(Ok(Message::Close(frame))) => {
                    let frame = frame.expect("close frame carries a status code");
                    assert_eq!(u16::from(frame.code), 1000);
                    break;
                }
                Some(Ok(_)) => continue,
                _ => panic!("Connection ended without a close frame"),
            }
        }
    })
    .await;

    let conn = connect(&Endpoint::local(&addr.to_string()), &WebSocketConfig::default())
        .await
        .unwrap();
    assert!(conn.remote_addr().unwrap().starts_with("ws://127.0.0.1"));

    let (mut reader, mut writer) = Box::new(conn).split();

    let notice = reader.recv().await.unwrap().unwrap();
    assert!(std::str::from_utf8(&notice).unwrap().contains("Alice joined"));

    writer
        .send(Bytes::from_static(br#"{"type":"user_message","content":"hi"}"#))
        .await
        .unwrap();
    let echo = reader.recv().await.unwrap().unwrap();
    assert_eq!(echo, &br#"{"type":"user_message","content":"hi"}"#[..]);

    writer.close().await.unwrap();
    writer.close().await.unwrap();
    assert!(!writer.is_open());
    assert!(matches!(
        writer.send(Bytes::from_static(b"late")).await,
        Err(TransportError::ConnectionClosed)
    ));

    server.await.unwrap();
}

#[tokio::test]
async fn test_server_close_ends_stream() {
    let (addr, server) = spawn_server(|mut ws| async move {
        ws.close(None).await.unwrap();
    })
    .await;

    let conn = connect(&Endpoint::local(&addr.to_string()), &WebSocketConfig::default())
        .await
        .unwrap();
    let (mut reader, _writer) = Box::new(conn).split();

    assert!(reader.recv().await.unwrap().is_none());
    server.await.unwrap();
}

#[tokio::test]
async fn test_close_started_by_server_completes_handshake() {
    let (addr, server) = spawn_server(|mut ws| async move {
        ws.send(Message::Close(None)).await.unwrap();

        // The client must answer the close before the socket goes away
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(WsError::ConnectionClosed)) => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("Close handshake not completed: {:?}", e),
            }
        }
    })
    .await;

    let conn = connect(&Endpoint::local(&addr.to_string()), &WebSocketConfig::default())
        .await
        .unwrap();
    let (mut reader, mut writer) = Box::new(conn).split();

    assert!(reader.recv().await.unwrap().is_none());
    assert!(!writer.is_open());

    writer.close().await.unwrap();
    writer.close().await.unwrap();
    assert!(matches!(
        writer.send(Bytes::from_static(b"late")).await,
        Err(TransportError::ConnectionClosed)
    ));

    drop(reader);
    drop(writer);
    server.await.unwrap();
}

#[tokio::test]
async fn test_oversized_frame_is_not_fatal() {
    let (addr, server) = spawn_server(|mut ws| async move {
        ws.send(Message::Text("x".repeat(128))).await.unwrap();
        ws.send(Message::Text("ok".to_string())).await.unwrap();
        // Keep the socket open until the client hangs up
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let config = WebSocketConfig {
        max_message_size: 64,
    };
    let conn = connect(&Endpoint::local(&addr.to_string()), &config)
        .await
        .unwrap();
    let (mut reader, mut writer) = Box::new(conn).split();

    let err = reader.recv().await.unwrap_err();
    assert!(matches!(err, TransportError::FrameTooLarge { size: 128, limit: 64 }));
    assert!(!err.is_fatal());

    assert_eq!(reader.recv().await.unwrap().unwrap(), &b"ok"[..]);

    writer.close().await.unwrap();
    drop(reader);
    drop(writer);
    server.await.unwrap();
}
