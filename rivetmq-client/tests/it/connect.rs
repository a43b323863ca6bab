use crate::helper::{self, MockBroker};
use rivetmq_client::{Session, SessionState};
use rivetmq_codec::frame::{self, AMQPFrame};

#[tokio::test]
async fn handshake_negotiates_and_opens_the_channel() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;
        assert_eq!(channel, 1);

        broker.expect_teardown().await;
        broker.expect_eof().await;
    });

    let session = Session::connect(helper::test_config(port)).await.unwrap();

    assert_eq!(session.channel(), 1);
    assert_eq!(session.channel_max(), 2047);
    assert_eq!(session.frame_max(), 131_072);
    assert_eq!(session.heartbeat(), 60);
    assert_eq!(session.state(), (SessionState::Established, SessionState::Established));

    session.close().await.unwrap();

    broker.await.unwrap();
}

#[tokio::test]
async fn unlimited_peer_keeps_client_limits() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        broker.handshake_with_tune(0, 0).await;
        broker.expect_teardown().await;
    });

    let session = Session::connect(helper::test_config(port)).await.unwrap();

    assert_eq!(session.channel_max(), 65_535);
    assert_eq!(session.frame_max(), 131_072);

    session.close().await.unwrap();

    broker.await.unwrap();
}

#[tokio::test]
async fn version_mismatch_aborts_before_start_ok() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        assert!(matches!(broker.recv().await, AMQPFrame::Header));

        let mut start = frame::ConnectionStartArgs::new();
        start.version_major = 1;
        start.version_minor = 0;

        broker.send(start.frame()).await;

        // Nothing else may be sent, the client just drops the socket.
        broker.expect_eof().await;
    });

    let result = Session::connect(helper::test_config(port)).await;

    let err = helper::error_of(result.unwrap_err());
    assert!(err.message.contains("protocol version does not match"));

    broker.await.unwrap();
}

#[tokio::test]
async fn unknown_mechanism_aborts_before_start_ok() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        assert!(matches!(broker.recv().await, AMQPFrame::Header));

        broker
            .send(frame::ConnectionStartArgs::new().mechanisms("AMQPLAIN EXTERNAL").frame())
            .await;

        broker.expect_eof().await;
    });

    let result = Session::connect(helper::test_config(port)).await;

    let err = helper::error_of(result.unwrap_err());
    assert!(err.message.contains("mechanism"));

    broker.await.unwrap();
}

#[tokio::test]
async fn close_carries_the_given_reason() {
    let (listener, port) = helper::listen().await;

    let broker = tokio::spawn(async move {
        let mut broker = MockBroker::accept(&listener).await;

        let channel = broker.handshake().await;

        match broker.recv().await {
            AMQPFrame::Method(ch, frame::CHANNEL_CLOSE, frame::MethodFrameArgs::ChannelClose(args)) => {
                assert_eq!(ch, channel);
                assert_eq!(args.code, 200);
                assert_eq!(args.text, "Normal close");

                broker.send(frame::channel_close_ok(channel)).await;
            }
            other => panic!("Expected channel close, got {:?}", other),
        }

        match broker.recv().await {
            AMQPFrame::Method(0, frame::CONNECTION_CLOSE, frame::MethodFrameArgs::ConnectionClose(args)) => {
                assert_eq!(args.code, 200);

                broker.send(frame::connection_close_ok()).await;
            }
            other => panic!("Expected connection close, got {:?}", other),
        }

        broker.expect_eof().await;
    });

    let session = Session::connect(helper::test_config(port)).await.unwrap();

    session
        .close_with(rivetmq_client::CloseReason::new(200, "Normal close"))
        .await
        .unwrap();

    broker.await.unwrap();
}
