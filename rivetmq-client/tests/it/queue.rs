use crate::helper::{self, MockBroker};
use rivetmq_client::{BindOpts, ConsumeOpts, QueueDeclareOpts, QueueDeleteOpts, Session};
use rivetmq_codec::frame::{self, AMQPFrame, MethodFrameArgs};

#[tokio::test]
async fn declare_carries_the_resolved_flags() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;

        match broker.recv().await {
            AMQPFrame::Method(_, frame::QUEUE_DECLARE, MethodFrameArgs::QueueDeclare(args)) => {
                assert_eq!(args.name, "jobs");
                assert!(args.flags.contains(frame::QueueDeclareFlags::DURABLE));
                // Auto-delete stays on unless overridden, that is the default.
                assert!(args.flags.contains(frame::QueueDeclareFlags::AUTO_DELETE));
                assert!(!args.flags.contains(frame::QueueDeclareFlags::EXCLUSIVE));

                broker
                    .send(
                        frame::QueueDeclareOkArgs::default()
                            .name("jobs")
                            .message_count(12)
                            .consumer_count(1)
                            .frame(channel),
                    )
                    .await;
            }
            other => panic!("Expected queue declare, got {:?}", other),
        }

        broker.expect_teardown().await;
    });

    let mut session = Session::connect(helper::test_config(port)).await.unwrap();

    let ok = session
        .queue_declare("jobs", QueueDeclareOpts::default().durable(true))
        .await
        .unwrap();

    assert_eq!(ok.name, "jobs");
    assert_eq!(ok.message_count, 12);
    assert_eq!(ok.consumer_count, 1);

    session.close().await.unwrap();

    broker.await.unwrap();
}

#[tokio::test]
async fn unbind_and_delete_report_back() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;

        match broker.recv().await {
            AMQPFrame::Method(_, frame::QUEUE_UNBIND, MethodFrameArgs::QueueUnbind(args)) => {
                assert_eq!(args.queue_name, "jobs");
                assert_eq!(args.exchange_name, "events");
                assert_eq!(args.routing_key, "jobs.*");

                broker.send(frame::queue_unbind_ok(channel)).await;
            }
            other => panic!("Expected queue unbind, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::Method(_, frame::QUEUE_DELETE, MethodFrameArgs::QueueDelete(args)) => {
                assert_eq!(args.queue_name, "jobs");
                assert!(args.flags.contains(frame::QueueDeleteFlags::IF_EMPTY));

                broker
                    .send(frame::QueueDeleteOkArgs::default().message_count(3).frame(channel))
                    .await;
            }
            other => panic!("Expected queue delete, got {:?}", other),
        }

        broker.expect_teardown().await;
    });

    let mut session = Session::connect(helper::test_config(port)).await.unwrap();

    session
        .queue_unbind("jobs", "events", BindOpts::default().routing_key("jobs.*"))
        .await
        .unwrap();

    let dropped = session
        .queue_delete("jobs", QueueDeleteOpts::default().if_empty(true))
        .await
        .unwrap();

    assert_eq!(dropped, 3);

    session.close().await.unwrap();

    broker.await.unwrap();
}

#[tokio::test]
async fn consumer_can_be_cancelled_by_tag() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;

        match broker.recv().await {
            AMQPFrame::Method(_, frame::BASIC_CONSUME, _) => {
                broker
                    .send(frame::BasicConsumeOkArgs::new("server-tag-1").frame(channel))
                    .await;
            }
            other => panic!("Expected basic consume, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::Method(_, frame::BASIC_CANCEL, MethodFrameArgs::BasicCancel(args)) => {
                assert_eq!(args.consumer_tag, "server-tag-1");

                broker
                    .send(frame::BasicCancelOkArgs::new("server-tag-1").frame(channel))
                    .await;
            }
            other => panic!("Expected basic cancel, got {:?}", other),
        }

        broker.expect_teardown().await;
    });

    let mut session = Session::connect(helper::test_config(port)).await.unwrap();

    let consumer_tag = session.basic_consume("jobs", ConsumeOpts::default()).await.unwrap();
    assert_eq!(consumer_tag, "server-tag-1");

    session.basic_cancel().await.unwrap();

    // A second cancel has no tag left to cancel and stays quiet.
    session.basic_cancel().await.unwrap();

    session.close().await.unwrap();

    broker.await.unwrap();
}
