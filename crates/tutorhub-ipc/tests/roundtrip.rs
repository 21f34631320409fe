//! Client/server round-trips over a real Unix socket

use std::sync::Arc;
use tutorhub_api::{Command, Event, EventPayload, Response, ResponsePayload, ResponseResult};
use tutorhub_ipc::{IpcClient, IpcServer, ServerMessage};
use tutorhub_util::RequestId;

async fn start_server(socket_path: &std::path::Path) -> Arc<IpcServer> {
    let mut server = IpcServer::new(socket_path);
    server.start().await.unwrap();
    let server = Arc::new(server);

    let mut messages = server.take_message_receiver().await.unwrap();

    let accept = server.clone();
    tokio::spawn(async move {
        let _ = accept.run().await;
    });

    // Minimal dispatcher: answer pings and subscriptions
    let responder = server.clone();
    tokio::spawn(async move {
        while let Some(msg) = messages.recv().await {
            if let ServerMessage::Request { client_id, request } = msg {
                let payload = match request.command {
                    Command::Ping => ResponsePayload::Pong,
                    Command::SubscribeEvents => ResponsePayload::Subscribed {
                        client_id: client_id.clone(),
                    },
                    _ => continue,
                };
                let _ = responder
                    .send_response(&client_id, Response::success(request.request_id, payload))
                    .await;
            }
        }
    });

    server
}

#[tokio::test]
async fn ping_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("tutorhubd.sock");
    let _server = start_server(&socket_path).await;

    let mut client = IpcClient::connect(&socket_path).await.unwrap();
    let response = client.send(Command::Ping).await.unwrap();

    assert_eq!(response.request_id, 1);
    assert!(matches!(
        response.result,
        ResponseResult::Ok(ResponsePayload::Pong)
    ));
}

#[tokio::test]
async fn subscribed_client_receives_events() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("tutorhubd.sock");
    let server = start_server(&socket_path).await;

    let client = IpcClient::connect(&socket_path).await.unwrap();
    let mut events = client.subscribe().await.unwrap();

    let request_id = RequestId::new();
    server.broadcast_event(Event::new(EventPayload::RequestDeclined {
        request_id: request_id.clone(),
    }));

    let event = events.next().await.unwrap();
    match event.payload {
        EventPayload::RequestDeclined { request_id: got } => assert_eq!(got, request_id),
        other => panic!("unexpected event: {:?}", other),
    }
}
