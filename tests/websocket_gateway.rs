//! End-to-end tests for the WebSocket listener.

use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use common::{gateway_config, start_gateway, MockReply, MockRuntime};
use lambda_gateway::config::GatewayConfig;
use lambda_gateway::lifecycle::{RunningGateway, Shutdown};

mod common;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn ws_gateway(runtime: &MockRuntime) -> (RunningGateway, Shutdown) {
    let mut config: GatewayConfig = gateway_config(&[("ws", runtime)], &[]);
    config.websocket.function = Some("ws".to_string());
    start_gateway(config).await
}

async fn connect(running: &RunningGateway, path: &str) -> Client {
    let addr = running.websocket_addr.expect("websocket listener");
    let (client, _) = connect_async(format!("ws://{}{}", addr, path)).await.unwrap();
    client
}

fn connections_url(running: &RunningGateway, connection_id: &str) -> String {
    let addr = running.websocket_addr.expect("websocket listener");
    format!("http://{}/dev/@connections/{}", addr, connection_id)
}

async fn next_text(client: &mut Client) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("frame before timeout")
        .expect("stream open")
        .unwrap();
    frame.to_text().unwrap().to_string()
}

#[tokio::test]
async fn test_lifecycle_events_arrive_in_order() {
    let runtime = MockRuntime::returning(json!({"statusCode": 200})).await;
    let (running, shutdown) = ws_gateway(&runtime).await;

    let mut client = connect(&running, "/?token=abc").await;
    client
        .send(Message::Text(r#"{"action":"sendMessage","text":"hi"}"#.to_string().into()))
        .await
        .unwrap();
    client.close(None).await.unwrap();

    let calls = runtime.wait_for_calls(3).await;
    let events: Vec<Value> = calls.iter().map(|c| c.json()).collect();

    for call in &calls {
        assert_eq!(call.invocation_type.as_deref(), Some("Event"));
    }

    let connect = &events[0];
    assert_eq!(connect["requestContext"]["eventType"], "CONNECT");
    assert_eq!(connect["requestContext"]["routeKey"], "$connect");
    assert_eq!(connect["requestContext"]["stage"], "dev");
    assert_eq!(connect["requestContext"]["messageDirection"], "IN");
    assert_eq!(connect["queryStringParameters"]["token"], "abc");
    assert!(connect["headers"]["host"].is_string());

    let message = &events[1];
    assert_eq!(message["requestContext"]["eventType"], "MESSAGE");
    assert_eq!(message["requestContext"]["routeKey"], "sendMessage");
    assert!(message["requestContext"]["messageId"].is_string());
    assert_eq!(message["body"], r#"{"action":"sendMessage","text":"hi"}"#);

    let disconnect = &events[2];
    assert_eq!(disconnect["requestContext"]["eventType"], "DISCONNECT");
    assert_eq!(disconnect["requestContext"]["routeKey"], "$disconnect");

    let id = &connect["requestContext"]["connectionId"];
    assert_eq!(&message["requestContext"]["connectionId"], id);
    assert_eq!(&disconnect["requestContext"]["connectionId"], id);

    shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_frame_is_dropped() {
    let runtime = MockRuntime::returning(json!({"statusCode": 200})).await;
    let (running, shutdown) = ws_gateway(&runtime).await;

    let mut client = connect(&running, "/").await;
    client.send(Message::Text("not json".to_string().into())).await.unwrap();
    client.send(Message::Text("[1, 2]".to_string().into())).await.unwrap();
    client.send(Message::Text(r#"{"hello":1}"#.to_string().into())).await.unwrap();

    let calls = runtime.wait_for_calls(2).await;
    let message = calls[1].json();
    assert_eq!(message["requestContext"]["eventType"], "MESSAGE");
    assert_eq!(message["requestContext"]["routeKey"], "$default");
    assert_eq!(message["body"], r#"{"hello":1}"#);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(runtime.calls().len(), 2);

    shutdown.trigger();
}

#[tokio::test]
async fn test_push_details_and_server_side_close() {
    let runtime = MockRuntime::returning(json!({"statusCode": 200})).await;
    let (running, shutdown) = ws_gateway(&runtime).await;
    let http = reqwest::Client::new();

    let mut client = connect(&running, "/").await;
    let connect_event = runtime.wait_for_calls(1).await[0].json();
    let connection_id = connect_event["requestContext"]["connectionId"]
        .as_str()
        .unwrap()
        .to_string();
    let url = connections_url(&running, &connection_id);

    let res = http.post(&url).body("hello client").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(next_text(&mut client).await, "hello client");

    let res = http.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let details: Value = res.json().await.unwrap();
    assert_eq!(details["identity"]["sourceIp"], "127.0.0.1");
    assert!(details["connectedAt"].is_string());
    assert!(details["lastActiveAt"].is_string());

    let res = http.delete(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .unwrap();
    assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
    drop(client);

    let calls = runtime.wait_for_calls(2).await;
    assert_eq!(calls[1].json()["requestContext"]["eventType"], "DISCONNECT");

    let res = http.post(&url).body("too late").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::GONE);
    let res = http.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::GONE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_connection_is_gone() {
    let runtime = MockRuntime::returning(json!({"statusCode": 200})).await;
    let (running, shutdown) = ws_gateway(&runtime).await;

    let res = reqwest::Client::new()
        .post(connections_url(&running, "no-such-connection"))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::GONE);

    let res = reqwest::Client::new()
        .delete(connections_url(&running, "no-such-connection"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::GONE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_function_failure_keeps_socket_open() {
    let runtime = MockRuntime::start(|_| MockReply::raw("boom").with_status(500)).await;
    let (running, shutdown) = ws_gateway(&runtime).await;

    let mut client = connect(&running, "/").await;
    client
        .send(Message::Text(r#"{"action":"fail"}"#.to_string().into()))
        .await
        .unwrap();

    let calls = runtime.wait_for_calls(2).await;
    let connection_id = calls[0].json()["requestContext"]["connectionId"]
        .as_str()
        .unwrap()
        .to_string();

    let res = reqwest::Client::new()
        .post(connections_url(&running, &connection_id))
        .body("still here")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(next_text(&mut client).await, "still here");

    shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_closes_open_sockets() {
    let runtime = MockRuntime::returning(json!({"statusCode": 200})).await;
    let (running, shutdown) = ws_gateway(&runtime).await;

    let mut client = connect(&running, "/").await;
    runtime.wait_for_calls(1).await;

    shutdown.trigger();

    let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .unwrap();
    assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
    drop(client);

    let calls = runtime.wait_for_calls(2).await;
    assert_eq!(calls[1].json()["requestContext"]["eventType"], "DISCONNECT");
    running.wait().await.unwrap();
}
