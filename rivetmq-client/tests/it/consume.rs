use crate::helper::{self, MockBroker};
use rivetmq_client::Session;
use rivetmq_codec::frame::{self, AMQPFrame, MethodFrameArgs};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn delivery_reaches_the_callback_and_is_acked() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;
        broker.expect_consume_setup(channel, "q", "ctag").await;
        broker.deliver(channel, 1, "q", b"hello").await;
        broker.expect_ack(1).await;
        broker.expect_teardown().await;
    });

    let session = Session::connect(helper::test_config(port).queue("q")).await.unwrap();
    let shutdown = session.cancellation_token();

    let received = Arc::new(Mutex::new(Vec::new()));
    let collected = received.clone();

    let result = session
        .consume(move |delivery| {
            assert_eq!(delivery.deliver.delivery_tag, 1);
            assert_eq!(delivery.properties.content_type.as_deref(), Some("text/plain"));

            collected.lock().unwrap().push(delivery.body.to_vec());
            shutdown.cancel();

            Ok(())
        })
        .await;

    let err = helper::error_of(result.unwrap_err());
    assert_eq!(err.code, 200);
    assert_eq!(err.message, "exiting");

    assert_eq!(*received.lock().unwrap(), vec![b"hello".to_vec()]);

    broker.await.unwrap();
}

#[tokio::test]
async fn failing_callback_sends_a_nack() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;
        broker.expect_consume_setup(channel, "q", "ctag").await;
        broker.deliver(channel, 7, "q", b"poison").await;
        broker.expect_nack(7).await;
        broker.expect_teardown().await;
    });

    let session = Session::connect(helper::test_config(port).queue("q")).await.unwrap();
    let shutdown = session.cancellation_token();

    let result = session
        .consume(move |_delivery| {
            shutdown.cancel();

            Err(anyhow::anyhow!("cannot handle this one"))
        })
        .await;

    let err = helper::error_of(result.unwrap_err());
    assert_eq!(err.message, "exiting");

    broker.await.unwrap();
}

#[tokio::test]
async fn no_ack_mode_sends_no_answer() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;
        broker.expect_consume_setup(channel, "q", "ctag").await;
        broker.deliver(channel, 1, "q", b"fire and forget").await;

        // The next frame has to be the channel close of the teardown, not an ack.
        broker.expect_teardown().await;
    });

    let session = Session::connect(helper::test_config(port).queue("q").no_ack(true))
        .await
        .unwrap();
    let shutdown = session.cancellation_token();

    let result = session
        .consume(move |_delivery| {
            shutdown.cancel();

            Ok(())
        })
        .await;

    assert!(result.is_err());

    broker.await.unwrap();
}

#[tokio::test]
async fn body_spanning_multiple_frames_is_reassembled() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;
        broker.expect_consume_setup(channel, "q", "ctag").await;

        broker
            .send(frame::BasicDeliverArgs::new("ctag", 3, "").routing_key("q").frame(channel))
            .await;
        broker
            .send(frame::ContentHeaderFrame::new(channel, frame::BASIC_CLASS, 10).frame())
            .await;
        broker
            .send(
                frame::ContentBodyFrame {
                    channel,
                    body: b"01234".to_vec(),
                }
                .frame(),
            )
            .await;
        broker
            .send(
                frame::ContentBodyFrame {
                    channel,
                    body: b"56789".to_vec(),
                }
                .frame(),
            )
            .await;

        broker.expect_ack(3).await;
        broker.expect_teardown().await;
    });

    let session = Session::connect(helper::test_config(port).queue("q")).await.unwrap();
    let shutdown = session.cancellation_token();

    let bodies = Arc::new(Mutex::new(Vec::new()));
    let collected = bodies.clone();

    let result = session
        .consume(move |delivery| {
            collected.lock().unwrap().push(delivery.body.to_vec());
            shutdown.cancel();

            Ok(())
        })
        .await;

    assert!(result.is_err());

    // One callback with the whole body, not one per frame.
    assert_eq!(*bodies.lock().unwrap(), vec![b"0123456789".to_vec()]);

    broker.await.unwrap();
}

#[tokio::test]
async fn peer_channel_close_stops_the_loop() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;
        broker.expect_consume_setup(channel, "q", "ctag").await;
        broker.deliver(channel, 1, "q", b"hello").await;
        broker.expect_ack(1).await;

        broker
            .send(frame::channel_close(channel, 404, "not found", frame::QUEUE_DECLARE))
            .await;

        // Peer-initiated close: the client owes a close-ok for the channel,
        // then closes the connection it still owns.
        match broker.recv().await {
            AMQPFrame::Method(_, frame::CHANNEL_CLOSE_OK, _) => (),
            other => panic!("Expected channel close-ok, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::Method(0, frame::CONNECTION_CLOSE, _) => {
                broker.send(frame::connection_close_ok()).await;
            }
            other => panic!("Expected connection close, got {:?}", other),
        }

        broker.expect_eof().await;
    });

    let session = Session::connect(helper::test_config(port).queue("q")).await.unwrap();

    let result = session.consume(|_delivery| Ok(())).await;

    let err = helper::error_of(result.unwrap_err());
    assert_eq!(err.code, 404);
    assert_eq!(err.message, "not found");

    broker.await.unwrap();
}

#[tokio::test]
async fn peer_connection_close_stops_the_loop() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;
        broker.expect_consume_setup(channel, "q", "ctag").await;

        broker
            .send(frame::connection_close(320, "shutting down", 0))
            .await;

        match broker.recv().await {
            AMQPFrame::Method(0, frame::CONNECTION_CLOSE_OK, _) => (),
            other => panic!("Expected connection close-ok, got {:?}", other),
        }

        broker.expect_eof().await;
    });

    let session = Session::connect(helper::test_config(port).queue("q")).await.unwrap();

    let result = session.consume(|_delivery| Ok(())).await;

    let err = helper::error_of(result.unwrap_err());
    assert_eq!(err.code, 320);
    assert_eq!(err.message, "shutting down");

    broker.await.unwrap();
}

#[tokio::test]
async fn consuming_without_a_queue_fails_before_any_declare() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        broker.handshake().await;
        broker.expect_teardown().await;
    });

    let session = Session::connect(helper::test_config(port)).await.unwrap();

    let result = session.consume(|_delivery| Ok(())).await;

    let err = helper::error_of(result.unwrap_err());
    assert!(err.message.contains("queue"));

    broker.await.unwrap();
}

#[tokio::test]
async fn silent_peer_trips_the_heartbeat_window() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;
        broker.expect_consume_setup(channel, "q", "ctag").await;

        // Stay silent. The client keeps sending heartbeats, one per missed
        // interval, until the window trips and it closes the channel.
        let mut heartbeats = 0;

        loop {
            match broker.recv().await {
                AMQPFrame::Heartbeat(_) => heartbeats += 1,
                AMQPFrame::Method(ch, frame::CHANNEL_CLOSE, _) => {
                    broker.send(frame::channel_close_ok(ch)).await;
                    break;
                }
                other => panic!("Unexpected frame {:?}", other),
            }
        }

        assert_eq!(heartbeats, 4);

        match broker.recv().await {
            AMQPFrame::Method(0, frame::CONNECTION_CLOSE, _) => {
                broker.send(frame::connection_close_ok()).await;
            }
            other => panic!("Expected connection close, got {:?}", other),
        }
    });

    let config = helper::test_config(port)
        .queue("q")
        .heartbeat(1)
        .read_timeout(Duration::from_millis(100));

    let session = Session::connect(config).await.unwrap();

    let result = session.consume(|_delivery| Ok(())).await;

    let err = helper::error_of(result.unwrap_err());
    assert_eq!(err.message, "heartbeat timeout");

    broker.await.unwrap();
}

#[tokio::test]
async fn ignored_methods_do_not_stop_the_loop() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;
        broker.expect_consume_setup(channel, "q", "ctag").await;

        // A stray cancel-ok is unexpected here; it is logged and skipped.
        broker
            .send(frame::BasicCancelOkArgs::new("other").frame(channel))
            .await;
        broker.deliver(channel, 1, "q", b"still alive").await;
        broker.expect_ack(1).await;
        broker.expect_teardown().await;
    });

    let session = Session::connect(helper::test_config(port).queue("q")).await.unwrap();
    let shutdown = session.cancellation_token();

    let result = session
        .consume(move |delivery| {
            assert_eq!(delivery.body, b"still alive");
            shutdown.cancel();

            Ok(())
        })
        .await;

    assert!(result.is_err());

    broker.await.unwrap();
}

#[tokio::test]
async fn queue_is_bound_when_an_exchange_is_configured() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;

        match broker.recv().await {
            AMQPFrame::Method(_, frame::QUEUE_DECLARE, MethodFrameArgs::QueueDeclare(args)) => {
                assert_eq!(args.name, "q");
                broker
                    .send(frame::QueueDeclareOkArgs::default().name("q").frame(channel))
                    .await;
            }
            other => panic!("Expected queue declare, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::Method(_, frame::QUEUE_BIND, MethodFrameArgs::QueueBind(args)) => {
                assert_eq!(args.queue_name, "q");
                assert_eq!(args.exchange_name, "events");
                assert_eq!(args.routing_key, "q.#");

                broker.send(frame::queue_bind_ok(channel)).await;
            }
            other => panic!("Expected queue bind, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::Method(_, frame::BASIC_CONSUME, _) => {
                broker.send(frame::BasicConsumeOkArgs::new("ctag").frame(channel)).await;
            }
            other => panic!("Expected basic consume, got {:?}", other),
        }

        broker.expect_teardown().await;
    });

    let config = helper::test_config(port)
        .queue("q")
        .exchange("events")
        .routing_key("q.#");

    let session = Session::connect(config).await.unwrap();
    let shutdown = session.cancellation_token();

    // Cancel immediately: the interesting part is the setup sequence.
    shutdown.cancel();

    let result = session.consume(|_delivery| Ok(())).await;

    let err = helper::error_of(result.unwrap_err());
    assert_eq!(err.message, "exiting");

    broker.await.unwrap();
}
