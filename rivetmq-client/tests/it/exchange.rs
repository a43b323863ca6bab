use crate::helper::{self, MockBroker};
use rivetmq_client::{BindOpts, ExchangeDeclareOpts, ExchangeDeleteOpts, Session};
use rivetmq_codec::frame::{self, AMQPFrame, MethodFrameArgs};

#[tokio::test]
async fn declare_bind_unbind_delete() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;

        match broker.recv().await {
            AMQPFrame::Method(_, frame::EXCHANGE_DECLARE, MethodFrameArgs::ExchangeDeclare(args)) => {
                assert_eq!(args.exchange_name, "events");
                // The type falls back to the protocol default.
                assert_eq!(args.exchange_type, "topic");
                assert!(args.flags.contains(frame::ExchangeDeclareFlags::DURABLE));

                broker.send(frame::exchange_declare_ok(channel)).await;
            }
            other => panic!("Expected exchange declare, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::Method(_, frame::EXCHANGE_BIND, MethodFrameArgs::ExchangeBind(args)) => {
                assert_eq!(args.source, "events");
                assert_eq!(args.destination, "audit");
                assert_eq!(args.routing_key, "#");

                broker.send(frame::exchange_bind_ok(channel)).await;
            }
            other => panic!("Expected exchange bind, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::Method(_, frame::EXCHANGE_UNBIND, MethodFrameArgs::ExchangeUnbind(args)) => {
                assert_eq!(args.source, "events");
                assert_eq!(args.destination, "audit");

                broker.send(frame::exchange_unbind_ok(channel)).await;
            }
            other => panic!("Expected exchange unbind, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::Method(_, frame::EXCHANGE_DELETE, MethodFrameArgs::ExchangeDelete(args)) => {
                assert_eq!(args.exchange_name, "events");
                // if-unused defaults to true for deletes.
                assert!(args.flags.contains(frame::ExchangeDeleteFlags::IF_UNUSED));

                broker.send(frame::exchange_delete_ok(channel)).await;
            }
            other => panic!("Expected exchange delete, got {:?}", other),
        }

        broker.expect_teardown().await;
    });

    let mut session = Session::connect(helper::test_config(port)).await.unwrap();

    session
        .exchange_declare("events", ExchangeDeclareOpts::default().durable(true))
        .await
        .unwrap();
    session
        .exchange_bind("events", "audit", BindOpts::default().routing_key("#"))
        .await
        .unwrap();
    session
        .exchange_unbind("events", "audit", BindOpts::default())
        .await
        .unwrap();
    session
        .exchange_delete("events", ExchangeDeleteOpts::default())
        .await
        .unwrap();

    session.close().await.unwrap();

    broker.await.unwrap();
}

#[tokio::test]
async fn declare_failure_surfaces_the_channel_error() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;

        match broker.recv().await {
            AMQPFrame::Method(_, frame::EXCHANGE_DECLARE, _) => {
                broker
                    .send(frame::channel_close(
                        channel,
                        406,
                        "precondition failed",
                        frame::EXCHANGE_DECLARE,
                    ))
                    .await;
            }
            other => panic!("Expected exchange declare, got {:?}", other),
        }

        // The channel is in close-wait now, the client answers with close-ok
        // and proceeds to close the connection it still owns.
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
    });

    let mut session = Session::connect(helper::test_config(port)).await.unwrap();

    let result = session
        .exchange_declare("events", ExchangeDeclareOpts::default().durable(true))
        .await;

    let err = helper::error_of(result.unwrap_err());
    assert_eq!(err.code, 406);
    assert_eq!(err.message, "precondition failed");

    session.close().await.unwrap();

    broker.await.unwrap();
}
