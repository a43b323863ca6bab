use crate::helper::{self, MockBroker};
use rivetmq_client::{PublishOpts, Session};
use rivetmq_codec::frame::{self, AMQPFrame, MethodFrameArgs};

#[tokio::test]
async fn publish_sends_method_header_and_body() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;

        match broker.recv().await {
            AMQPFrame::Method(ch, frame::BASIC_PUBLISH, MethodFrameArgs::BasicPublish(args)) => {
                assert_eq!(ch, channel);
                assert_eq!(args.exchange_name, "e");
                assert_eq!(args.routing_key, "k");
                assert!(!args.is_mandatory());
                assert!(!args.is_immediate());
            }
            other => panic!("Expected publish, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::ContentHeader(header) => {
                assert_eq!(header.channel, channel);
                assert_eq!(header.class_id, frame::BASIC_CLASS);
                assert_eq!(header.body_size, 2);
                assert_eq!(header.content_type, None);
            }
            other => panic!("Expected content header, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::ContentBody(body) => {
                assert_eq!(body.body, b"xy");
            }
            other => panic!("Expected content body, got {:?}", other),
        }

        // No reply is owed for a publish; the next frame is the teardown.
        broker.expect_teardown().await;
    });

    let mut session = Session::connect(helper::test_config(port)).await.unwrap();

    session
        .publish(b"xy", PublishOpts::default().exchange("e").routing_key("k"))
        .await
        .unwrap();

    session.close().await.unwrap();

    broker.await.unwrap();
}

#[tokio::test]
async fn publish_falls_back_to_the_session_routing() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        broker.handshake().await;

        match broker.recv().await {
            AMQPFrame::Method(_, frame::BASIC_PUBLISH, MethodFrameArgs::BasicPublish(args)) => {
                assert_eq!(args.exchange_name, "events");
                assert_eq!(args.routing_key, "audit");
            }
            other => panic!("Expected publish, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::ContentHeader(header) => {
                assert_eq!(header.content_type.as_deref(), Some("text/plain"));
            }
            other => panic!("Expected content header, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::ContentBody(_) => (),
            other => panic!("Expected content body, got {:?}", other),
        }

        broker.expect_teardown().await;
    });

    let config = helper::test_config(port).exchange("events").routing_key("audit");
    let mut session = Session::connect(config).await.unwrap();

    session
        .publish(b"payload", PublishOpts::default().content_type("text/plain"))
        .await
        .unwrap();

    session.close().await.unwrap();

    broker.await.unwrap();
}

#[tokio::test]
async fn large_body_is_split_at_the_negotiated_frame_size() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        // A tiny frame size forces the split: max body payload is 64 - 8 = 56.
        broker.handshake_with_tune(2047, 64).await;

        match broker.recv().await {
            AMQPFrame::Method(_, frame::BASIC_PUBLISH, _) => (),
            other => panic!("Expected publish, got {:?}", other),
        }

        let body_size = match broker.recv().await {
            AMQPFrame::ContentHeader(header) => header.body_size,
            other => panic!("Expected content header, got {:?}", other),
        };

        assert_eq!(body_size, 100);

        let mut collected = Vec::new();

        while (collected.len() as u64) < body_size {
            match broker.recv().await {
                AMQPFrame::ContentBody(mut body) => {
                    assert!(body.body.len() <= 56);
                    collected.append(&mut body.body);
                }
                other => panic!("Expected content body, got {:?}", other),
            }
        }

        assert_eq!(collected.len(), 100);

        broker.expect_teardown().await;
    });

    let mut session = Session::connect(helper::test_config(port)).await.unwrap();

    assert_eq!(session.frame_max(), 64);

    let payload = vec![0x61u8; 100];

    session
        .publish(&payload, PublishOpts::default().routing_key("k"))
        .await
        .unwrap();

    session.close().await.unwrap();

    broker.await.unwrap();
}
