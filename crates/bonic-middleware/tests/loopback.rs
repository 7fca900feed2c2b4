//! End-to-end check of the servo link against an in-process WebSocket
//! server that stands in for `rosbridge_server`.

use std::time::Duration;

use bonic_middleware::{COMMAND_TOPIC, FEEDBACK_TOPIC, RosbridgeClient, ServoLink, ServoTopics};
use bonic_servo::JointTable;
use bonic_servo::joints::NECK_YAW;
use bonic_types::BonicError;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Spawn a one-client server.  Frames the client sends come out of the first
/// receiver; strings pushed into the returned sender are written back.
async fn spawn_server() -> (
    String,
    mpsc::UnboundedReceiver<Value>,
    mpsc::UnboundedSender<String>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (frames_tx, frames_rx) = mpsc::unbounded_channel::<Value>();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        let (mut ws_tx, mut ws_rx) = ws.split();
        loop {
            tokio::select! {
                msg = ws_rx.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = frames_tx.send(serde_json::from_str(text.as_str()).unwrap());
                    }
                    Some(Ok(_)) => {}
                    _ => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(text) => {
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    });

    (format!("ws://{addr}"), frames_rx, reply_tx)
}

async fn next_frame(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("server closed")
}

#[tokio::test]
async fn servo_commands_and_feedback_cross_the_wire() {
    let (url, mut frames, replies) = spawn_server().await;
    let link = ServoLink::connect(&url, JointTable::bonicbot(), &ServoTopics::default())
        .await
        .unwrap();
    let servo = link.servo();

    let advertise = next_frame(&mut frames).await;
    assert_eq!(advertise["op"], "advertise");
    assert_eq!(advertise["topic"], COMMAND_TOPIC);
    assert_eq!(advertise["type"], "std_msgs/Float64MultiArray");

    let subscribe = next_frame(&mut frames).await;
    assert_eq!(subscribe["op"], "subscribe");
    assert_eq!(subscribe["topic"], FEEDBACK_TOPIC);
    assert_eq!(subscribe["type"], "sensor_msgs/JointState");

    // Out of range: clamped to 90° before it reaches the wire.
    servo.set_single(NECK_YAW, 120.0).unwrap();
    let publish = next_frame(&mut frames).await;
    assert_eq!(publish["op"], "publish");
    assert_eq!(publish["topic"], COMMAND_TOPIC);
    let data = publish["msg"]["data"].as_array().unwrap();
    assert_eq!(data.len(), 7);
    assert_eq!(data[6].as_f64().unwrap(), 90.0_f64.to_radians());
    assert_eq!(servo.angle(NECK_YAW).unwrap(), 90.0);

    replies
        .send(
            json!({
                "op": "publish",
                "topic": FEEDBACK_TOPIC,
                "msg": {
                    "name": [NECK_YAW, "head_tilt_joint"],
                    "position": [-0.5, 1.0]
                }
            })
            .to_string(),
        )
        .unwrap();

    let expected = (-0.5_f64).to_degrees();
    timeout(Duration::from_secs(2), async {
        while (servo.angle(NECK_YAW).unwrap() - expected).abs() > 1e-9 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("feedback never reached the controller");
    assert!(servo.last_feedback().is_some());

    link.close().await;
}

#[tokio::test]
async fn malformed_feedback_does_not_break_the_stream() {
    let (url, mut frames, replies) = spawn_server().await;
    let link = ServoLink::connect(&url, JointTable::bonicbot(), &ServoTopics::default())
        .await
        .unwrap();
    let servo = link.servo();
    next_frame(&mut frames).await;
    next_frame(&mut frames).await;

    replies.send("not json at all".to_string()).unwrap();
    replies
        .send(r#"{"op":"publish","topic":"/joint_states","msg":{"position":"oops"}}"#.to_string())
        .unwrap();
    replies
        .send(
            json!({
                "op": "publish",
                "topic": FEEDBACK_TOPIC,
                "msg": { "name": [NECK_YAW], "position": [0.25] }
            })
            .to_string(),
        )
        .unwrap();

    let expected = 0.25_f64.to_degrees();
    timeout(Duration::from_secs(2), async {
        while (servo.angle(NECK_YAW).unwrap() - expected).abs() > 1e-9 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("valid frame after malformed ones was not applied");
    assert!(link.client().is_connected());

    link.close().await;
}

#[tokio::test]
async fn connect_to_closed_port_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = RosbridgeClient::connect(&format!("ws://{addr}")).await;
    assert!(matches!(result, Err(BonicError::Transport(_))));
}

#[tokio::test]
async fn commands_after_the_server_hangs_up_fail_and_leave_the_cache() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        // advertise + subscribe, then hang up.
        ws.next().await;
        ws.next().await;
        let _ = ws.close(None).await;
    });

    let link = ServoLink::connect(&format!("ws://{addr}"), JointTable::bonicbot(), &ServoTopics::default())
        .await
        .unwrap();
    let servo = link.servo();

    timeout(Duration::from_secs(2), async {
        while link.client().is_connected() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never noticed the server closing");

    let result = servo.set_single(NECK_YAW, 30.0);
    assert!(matches!(result, Err(BonicError::Publish(_))));
    assert_eq!(servo.angle(NECK_YAW).unwrap(), 0.0);

    link.close().await;
}

#[tokio::test]
async fn close_flushes_commands_queued_just_before_it() {
    let (url, mut frames, _replies) = spawn_server().await;
    let link = ServoLink::connect(&url, JointTable::bonicbot(), &ServoTopics::default())
        .await
        .unwrap();
    let servo = link.servo();
    next_frame(&mut frames).await;
    next_frame(&mut frames).await;

    servo.look_left().unwrap();
    servo.reset_all().unwrap();
    link.close().await;

    let look = next_frame(&mut frames).await;
    assert_eq!(look["msg"]["data"][6].as_f64().unwrap(), 90.0_f64.to_radians());
    let reset = next_frame(&mut frames).await;
    assert!(reset["msg"]["data"].as_array().unwrap().iter().all(|v| v.as_f64() == Some(0.0)));

    assert!(matches!(servo.look_right(), Err(BonicError::Publish(_))));
}
