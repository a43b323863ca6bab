use crate::frame::*;
use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

const FRAME_METHOD_FRAME: u8 = 0x01;
const FRAME_CONTENT_HEADER: u8 = 0x02;
const FRAME_CONTENT_BODY: u8 = 0x03;
const FRAME_HEARTBEAT: u8 = 0x08;
const FRAME_AMQP_HEADER: u8 = 0x41;

const FRAME_END: u8 = 0xCE;

const AMQP_BANNER: &[u8] = b"AMQP\x00\x00\x09\x01";

/// AMQP frame encoder and decoder.
#[derive(Debug)]
pub struct AMQPCodec {}

#[derive(Debug)]
pub enum Frame {
    Frame(AMQPFrame),
    Frames(Vec<AMQPFrame>),
}

impl Encoder<Frame> for AMQPCodec {
    type Error = io::Error;

    fn encode(&mut self, event: Frame, mut buf: &mut BytesMut) -> Result<(), Self::Error> {
        match event {
            Frame::Frame(frame) => encode_amqp_frame(&mut buf, frame),
            Frame::Frames(frames) => {
                for frame in frames {
                    encode_amqp_frame(&mut buf, frame);
                }
            }
        }

        Ok(())
    }
}

impl Decoder for AMQPCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 8 || !is_full_frame(src) {
            return Ok(None);
        }

        match src.get_u8() {
            FRAME_METHOD_FRAME => {
                let channel = src.get_u16();
                let frame_len = src.get_u32() as usize;

                let mut frame_buf = src.split_to(frame_len);
                let frame = decode_method_frame(&mut frame_buf, channel)?;

                expect_frame_end(src)?;

                Ok(Some(Frame::Frame(frame)))
            }
            FRAME_CONTENT_HEADER => {
                let channel = src.get_u16();
                let frame_len = src.get_u32() as usize;

                let mut frame_buf = src.split_to(frame_len);
                let frame = decode_content_header_frame(&mut frame_buf, channel)?;

                expect_frame_end(src)?;

                Ok(Some(Frame::Frame(frame)))
            }
            FRAME_CONTENT_BODY => {
                let channel = src.get_u16();
                let body_len = src.get_u32();
                let bytes = src.split_to(body_len as usize);

                expect_frame_end(src)?;

                let frame = AMQPFrame::ContentBody(ContentBodyFrame {
                    channel,
                    body: bytes.to_vec(),
                });

                Ok(Some(Frame::Frame(frame)))
            }
            FRAME_HEARTBEAT => {
                let channel = src.get_u16();
                let len = src.get_u32();
                let _ = src.split_to(len as usize);

                expect_frame_end(src)?;

                Ok(Some(Frame::Frame(AMQPFrame::Heartbeat(channel))))
            }
            FRAME_AMQP_HEADER => {
                let mut head = [0u8; 7];
                src.copy_to_slice(&mut head);

                if head != AMQP_BANNER[1..] {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Invalid protocol header {:?}", head),
                    ));
                }

                Ok(Some(Frame::Frame(AMQPFrame::Header)))
            }
            f => Err(io::Error::new(io::ErrorKind::InvalidData, format!("Unknown frame {}", f))),
        }
    }
}

/// Check if the buffer contains a full frame. We can do that easily since
/// the frame header carries the length information.
fn is_full_frame(src: &BytesMut) -> bool {
    match src[0] {
        FRAME_AMQP_HEADER => src.len() >= 8,
        _ => {
            let mut bs = [0u8; 4];
            bs.copy_from_slice(&src[3..7]);

            let len = u32::from_be_bytes(bs) as usize;

            src.len() >= len + 8
        }
    }
}

/// The frame end byte closes every frame; anything else means the stream is out of sync
/// and the connection cannot be saved.
fn expect_frame_end(src: &mut BytesMut) -> Result<(), io::Error> {
    let end = src.get_u8();

    if end != FRAME_END {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Frame end mismatch {:02X}", end),
        ));
    }

    Ok(())
}

fn decode_method_frame(mut src: &mut BytesMut, channel: u16) -> Result<AMQPFrame, io::Error> {
    let class_method = src.get_u32();

    let method_frame_args = match class_method {
        CONNECTION_START => decode_connection_start(&mut src)?,
        CONNECTION_START_OK => decode_connection_start_ok(&mut src)?,
        CONNECTION_TUNE => decode_connection_tune(&mut src),
        CONNECTION_TUNE_OK => decode_connection_tune_ok(&mut src),
        CONNECTION_OPEN => decode_connection_open(&mut src)?,
        CONNECTION_OPEN_OK => decode_connection_open_ok(&mut src)?,
        CONNECTION_CLOSE => decode_connection_close(&mut src)?,
        CONNECTION_CLOSE_OK => MethodFrameArgs::ConnectionCloseOk,
        CHANNEL_OPEN => decode_channel_open(&mut src)?,
        CHANNEL_OPEN_OK => decode_channel_open_ok(&mut src)?,
        CHANNEL_CLOSE => decode_channel_close(&mut src)?,
        CHANNEL_CLOSE_OK => MethodFrameArgs::ChannelCloseOk,
        EXCHANGE_DECLARE => decode_exchange_declare(&mut src)?,
        EXCHANGE_DECLARE_OK => MethodFrameArgs::ExchangeDeclareOk,
        EXCHANGE_BIND => decode_exchange_bind(&mut src)?,
        EXCHANGE_BIND_OK => MethodFrameArgs::ExchangeBindOk,
        EXCHANGE_UNBIND => decode_exchange_unbind(&mut src)?,
        EXCHANGE_UNBIND_OK => MethodFrameArgs::ExchangeUnbindOk,
        EXCHANGE_DELETE => decode_exchange_delete(&mut src)?,
        EXCHANGE_DELETE_OK => MethodFrameArgs::ExchangeDeleteOk,
        QUEUE_DECLARE => decode_queue_declare(&mut src)?,
        QUEUE_DECLARE_OK => decode_queue_declare_ok(&mut src)?,
        QUEUE_BIND => decode_queue_bind(&mut src)?,
        QUEUE_BIND_OK => MethodFrameArgs::QueueBindOk,
        QUEUE_UNBIND => decode_queue_unbind(&mut src)?,
        QUEUE_UNBIND_OK => MethodFrameArgs::QueueUnbindOk,
        QUEUE_DELETE => decode_queue_delete(&mut src)?,
        QUEUE_DELETE_OK => decode_queue_delete_ok(&mut src),
        BASIC_CONSUME => decode_basic_consume(&mut src)?,
        BASIC_CONSUME_OK => decode_basic_consume_ok(&mut src)?,
        BASIC_CANCEL => decode_basic_cancel(&mut src)?,
        BASIC_CANCEL_OK => decode_basic_cancel_ok(&mut src)?,
        BASIC_PUBLISH => decode_basic_publish(&mut src)?,
        BASIC_DELIVER => decode_basic_deliver(&mut src)?,
        BASIC_ACK => decode_basic_ack(&mut src),
        BASIC_NACK => decode_basic_nack(&mut src),
        cm => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported method {:08X}", cm),
            ))
        }
    };

    Ok(AMQPFrame::Method(channel, class_method, method_frame_args))
}

fn decode_connection_start(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let args = ConnectionStartArgs {
        version_major: src.get_u8(),
        version_minor: src.get_u8(),
        properties: decode_field_table(&mut src)?,
        mechanisms: decode_long_string(&mut src)?,
        locales: decode_long_string(&mut src)?,
    };

    Ok(MethodFrameArgs::ConnectionStart(args))
}

fn decode_connection_start_ok(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let args = ConnectionStartOkArgs {
        properties: decode_field_table(&mut src)?,
        mechanism: decode_short_string(&mut src)?,
        response: decode_long_string(&mut src)?,
        locale: decode_short_string(&mut src)?,
    };

    Ok(MethodFrameArgs::ConnectionStartOk(args))
}

fn decode_connection_tune(src: &mut BytesMut) -> MethodFrameArgs {
    MethodFrameArgs::ConnectionTune(ConnectionTuneArgs {
        channel_max: src.get_u16(),
        frame_max: src.get_u32(),
        heartbeat: src.get_u16(),
    })
}

fn decode_connection_tune_ok(src: &mut BytesMut) -> MethodFrameArgs {
    MethodFrameArgs::ConnectionTuneOk(ConnectionTuneOkArgs {
        channel_max: src.get_u16(),
        frame_max: src.get_u32(),
        heartbeat: src.get_u16(),
    })
}

fn decode_connection_open(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let virtual_host = decode_short_string(&mut src)?;
    let _reserved = decode_short_string(&mut src)?;
    let flags = src.get_u8();

    Ok(MethodFrameArgs::ConnectionOpen(ConnectionOpenArgs {
        virtual_host,
        insist: flags & 0x01 != 0,
    }))
}

fn decode_connection_open_ok(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let _reserved = decode_short_string(&mut src)?;

    Ok(MethodFrameArgs::ConnectionOpenOk)
}

fn decode_connection_close(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    Ok(MethodFrameArgs::ConnectionClose(ConnectionCloseArgs {
        code: src.get_u16(),
        text: decode_short_string(&mut src)?,
        class_id: src.get_u16(),
        method_id: src.get_u16(),
    }))
}

fn decode_channel_open(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let _reserved = decode_short_string(&mut src)?;

    Ok(MethodFrameArgs::ChannelOpen)
}

fn decode_channel_open_ok(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let _reserved = decode_long_string(&mut src)?;

    Ok(MethodFrameArgs::ChannelOpenOk)
}

fn decode_channel_close(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    Ok(MethodFrameArgs::ChannelClose(ChannelCloseArgs {
        code: src.get_u16(),
        text: decode_short_string(&mut src)?,
        class_id: src.get_u16(),
        method_id: src.get_u16(),
    }))
}

fn decode_exchange_declare(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = ExchangeDeclareArgs::default();
    let _reserved = src.get_u16();
    args.exchange_name = decode_short_string(&mut src)?;
    args.exchange_type = decode_short_string(&mut src)?;
    args.flags = ExchangeDeclareFlags::from_bits_truncate(src.get_u8());
    args.args = decode_field_table(&mut src)?;

    Ok(MethodFrameArgs::ExchangeDeclare(args))
}

fn decode_exchange_bind(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = ExchangeBindArgs::default();
    let _reserved = src.get_u16();
    args.destination = decode_short_string(&mut src)?;
    args.source = decode_short_string(&mut src)?;
    args.routing_key = decode_short_string(&mut src)?;
    args.no_wait = src.get_u8() != 0;
    args.args = decode_field_table(&mut src)?;

    Ok(MethodFrameArgs::ExchangeBind(args))
}

fn decode_exchange_unbind(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = ExchangeUnbindArgs::default();
    let _reserved = src.get_u16();
    args.destination = decode_short_string(&mut src)?;
    args.source = decode_short_string(&mut src)?;
    args.routing_key = decode_short_string(&mut src)?;
    args.no_wait = src.get_u8() != 0;
    args.args = decode_field_table(&mut src)?;

    Ok(MethodFrameArgs::ExchangeUnbind(args))
}

fn decode_exchange_delete(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = ExchangeDeleteArgs::default();
    let _reserved = src.get_u16();
    args.exchange_name = decode_short_string(&mut src)?;
    args.flags = ExchangeDeleteFlags::from_bits_truncate(src.get_u8());

    Ok(MethodFrameArgs::ExchangeDelete(args))
}

fn decode_queue_declare(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = QueueDeclareArgs::default();
    let _reserved = src.get_u16();
    args.name = decode_short_string(&mut src)?;
    args.flags = QueueDeclareFlags::from_bits_truncate(src.get_u8());
    args.args = decode_field_table(&mut src)?;

    Ok(MethodFrameArgs::QueueDeclare(args))
}

fn decode_queue_declare_ok(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    Ok(MethodFrameArgs::QueueDeclareOk(QueueDeclareOkArgs {
        name: decode_short_string(&mut src)?,
        message_count: src.get_u32(),
        consumer_count: src.get_u32(),
    }))
}

fn decode_queue_bind(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = QueueBindArgs::default();
    let _reserved = src.get_u16();
    args.queue_name = decode_short_string(&mut src)?;
    args.exchange_name = decode_short_string(&mut src)?;
    args.routing_key = decode_short_string(&mut src)?;
    args.no_wait = src.get_u8() != 0;
    args.args = decode_field_table(&mut src)?;

    Ok(MethodFrameArgs::QueueBind(args))
}

fn decode_queue_unbind(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = QueueUnbindArgs::default();
    let _reserved = src.get_u16();
    args.queue_name = decode_short_string(&mut src)?;
    args.exchange_name = decode_short_string(&mut src)?;
    args.routing_key = decode_short_string(&mut src)?;
    args.args = decode_field_table(&mut src)?;

    Ok(MethodFrameArgs::QueueUnbind(args))
}

fn decode_queue_delete(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = QueueDeleteArgs::default();
    let _reserved = src.get_u16();
    args.queue_name = decode_short_string(&mut src)?;
    args.flags = QueueDeleteFlags::from_bits_truncate(src.get_u8());

    Ok(MethodFrameArgs::QueueDelete(args))
}

fn decode_queue_delete_ok(src: &mut BytesMut) -> MethodFrameArgs {
    MethodFrameArgs::QueueDeleteOk(QueueDeleteOkArgs {
        message_count: src.get_u32(),
    })
}

fn decode_basic_consume(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = BasicConsumeArgs::default();
    let _reserved = src.get_u16();
    args.queue = decode_short_string(&mut src)?;
    args.consumer_tag = decode_short_string(&mut src)?;
    args.flags = BasicConsumeFlags::from_bits_truncate(src.get_u8());
    args.args = decode_field_table(&mut src)?;

    Ok(MethodFrameArgs::BasicConsume(args))
}

fn decode_basic_consume_ok(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    Ok(MethodFrameArgs::BasicConsumeOk(BasicConsumeOkArgs {
        consumer_tag: decode_short_string(&mut src)?,
    }))
}

fn decode_basic_cancel(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    Ok(MethodFrameArgs::BasicCancel(BasicCancelArgs {
        consumer_tag: decode_short_string(&mut src)?,
        no_wait: src.get_u8() != 0,
    }))
}

fn decode_basic_cancel_ok(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    Ok(MethodFrameArgs::BasicCancelOk(BasicCancelOkArgs {
        consumer_tag: decode_short_string(&mut src)?,
    }))
}

fn decode_basic_publish(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    let mut args = BasicPublishArgs::default();
    let _reserved = src.get_u16();
    args.exchange_name = decode_short_string(&mut src)?;
    args.routing_key = decode_short_string(&mut src)?;
    args.flags = BasicPublishFlags::from_bits_truncate(src.get_u8());

    Ok(MethodFrameArgs::BasicPublish(args))
}

fn decode_basic_deliver(mut src: &mut BytesMut) -> Result<MethodFrameArgs, io::Error> {
    Ok(MethodFrameArgs::BasicDeliver(BasicDeliverArgs {
        consumer_tag: decode_short_string(&mut src)?,
        delivery_tag: src.get_u64(),
        redelivered: src.get_u8() != 0,
        exchange_name: decode_short_string(&mut src)?,
        routing_key: decode_short_string(&mut src)?,
    }))
}

fn decode_basic_ack(src: &mut BytesMut) -> MethodFrameArgs {
    MethodFrameArgs::BasicAck(BasicAckArgs {
        delivery_tag: src.get_u64(),
        multiple: src.get_u8() != 0,
    })
}

fn decode_basic_nack(src: &mut BytesMut) -> MethodFrameArgs {
    MethodFrameArgs::BasicNack(BasicNackArgs {
        delivery_tag: src.get_u64(),
        flags: BasicNackFlags::from_bits_truncate(src.get_u8()),
    })
}

fn decode_content_header_frame(mut src: &mut BytesMut, channel: u16) -> Result<AMQPFrame, io::Error> {
    let class_id = src.get_u16();
    let weight = src.get_u16();
    let body_size = src.get_u64();
    let prop_flags = HeaderPropertyFlags::from_bits_truncate(src.get_u16());

    let mut header = ContentHeaderFrame {
        channel,
        class_id,
        weight,
        body_size,
        prop_flags,
        ..Default::default()
    };

    // Properties follow in the flag bit order, most significant first.
    if prop_flags.contains(HeaderPropertyFlags::CONTENT_TYPE) {
        header.content_type = Some(decode_short_string(&mut src)?);
    }
    if prop_flags.contains(HeaderPropertyFlags::CONTENT_ENCODING) {
        header.content_encoding = Some(decode_short_string(&mut src)?);
    }
    if prop_flags.contains(HeaderPropertyFlags::HEADERS) {
        header.headers = decode_field_table(&mut src)?;
    }
    if prop_flags.contains(HeaderPropertyFlags::DELIVERY_MODE) {
        header.delivery_mode = Some(src.get_u8());
    }
    if prop_flags.contains(HeaderPropertyFlags::PRIORITY) {
        header.priority = Some(src.get_u8());
    }
    if prop_flags.contains(HeaderPropertyFlags::CORRELATION_ID) {
        header.correlation_id = Some(decode_short_string(&mut src)?);
    }
    if prop_flags.contains(HeaderPropertyFlags::REPLY_TO) {
        header.reply_to = Some(decode_short_string(&mut src)?);
    }
    if prop_flags.contains(HeaderPropertyFlags::EXPIRATION) {
        header.expiration = Some(decode_short_string(&mut src)?);
    }
    if prop_flags.contains(HeaderPropertyFlags::MESSAGE_ID) {
        header.message_id = Some(decode_short_string(&mut src)?);
    }
    if prop_flags.contains(HeaderPropertyFlags::TIMESTAMP) {
        header.timestamp = Some(src.get_u64());
    }
    if prop_flags.contains(HeaderPropertyFlags::MESSAGE_TYPE) {
        header.message_type = Some(decode_short_string(&mut src)?);
    }
    if prop_flags.contains(HeaderPropertyFlags::USER_ID) {
        header.user_id = Some(decode_short_string(&mut src)?);
    }
    if prop_flags.contains(HeaderPropertyFlags::APP_ID) {
        header.app_id = Some(decode_short_string(&mut src)?);
    }
    if prop_flags.contains(HeaderPropertyFlags::CLUSTER_ID) {
        header.cluster_id = Some(decode_short_string(&mut src)?);
    }

    Ok(AMQPFrame::ContentHeader(header))
}

fn decode_value(mut buf: &mut BytesMut) -> Result<AMQPFieldValue, io::Error> {
    let value = match buf.get_u8() {
        b't' => AMQPFieldValue::Bool(buf.get_u8() != 0),
        b'b' => AMQPFieldValue::Byte(buf.get_i8()),
        b's' => AMQPFieldValue::Short(buf.get_i16()),
        b'I' => AMQPFieldValue::Int(buf.get_i32()),
        b'l' => AMQPFieldValue::Long(buf.get_i64()),
        b'S' => AMQPFieldValue::LongString(decode_long_string(&mut buf)?),
        b'F' => {
            let table = decode_field_table(&mut buf)?.unwrap_or_default();

            AMQPFieldValue::FieldTable(Box::new(table))
        }
        b'V' => AMQPFieldValue::Void,
        t => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported field value type {}", t),
            ))
        }
    };

    Ok(value)
}

fn decode_short_string(buf: &mut BytesMut) -> Result<String, io::Error> {
    let len = buf.get_u8() as usize;
    let sb = buf.split_to(len);

    String::from_utf8(sb.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn decode_long_string(buf: &mut BytesMut) -> Result<String, io::Error> {
    let len = buf.get_u32() as usize;
    let sb = buf.split_to(len);

    String::from_utf8(sb.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Decode a field table.
///
/// The buffer points to the beginning of the field table which is a `u32` length
/// information. An empty table decodes as `None`.
fn decode_field_table(buf: &mut BytesMut) -> Result<Option<FieldTable>, io::Error> {
    let ft_len = buf.get_u32() as usize;

    if ft_len == 0 {
        return Ok(None);
    }

    let mut ft_buf = buf.split_to(ft_len);
    let mut table = FieldTable::new();

    while ft_buf.has_remaining() {
        let field_name = decode_short_string(&mut ft_buf)?;
        let field_value = decode_value(&mut ft_buf)?;

        table.insert(field_name, field_value);
    }

    Ok(Some(table))
}

fn encode_amqp_frame(mut buf: &mut BytesMut, frame: AMQPFrame) {
    match frame {
        AMQPFrame::Header => buf.put(AMQP_BANNER),

        AMQPFrame::Method(ch, cm, args) => encode_method_frame(&mut buf, ch, cm, &args),

        AMQPFrame::ContentHeader(header_frame) => encode_content_header_frame(&mut buf, &header_frame),

        AMQPFrame::ContentBody(body_frame) => encode_content_body_frame(&mut buf, &body_frame),

        AMQPFrame::Heartbeat(channel) => encode_heartbeat_frame(&mut buf, channel),
    }
}

fn encode_method_frame(buf: &mut BytesMut, channel: Channel, cm: ClassMethod, args: &MethodFrameArgs) {
    buf.put_u8(FRAME_METHOD_FRAME);
    buf.put_u16(channel);

    let mut fr = BytesMut::with_capacity(4096);
    fr.put_u32(cm);

    match args {
        MethodFrameArgs::ConnectionStart(args) => encode_connection_start(&mut fr, args),
        MethodFrameArgs::ConnectionStartOk(args) => encode_connection_start_ok(&mut fr, args),
        MethodFrameArgs::ConnectionTune(args) => encode_connection_tune(&mut fr, args),
        MethodFrameArgs::ConnectionTuneOk(args) => encode_connection_tune_ok(&mut fr, args),
        MethodFrameArgs::ConnectionOpen(args) => encode_connection_open(&mut fr, args),
        MethodFrameArgs::ConnectionOpenOk => encode_connection_open_ok(&mut fr),
        MethodFrameArgs::ConnectionClose(args) => encode_connection_close(&mut fr, args),
        MethodFrameArgs::ConnectionCloseOk => (),
        MethodFrameArgs::ChannelOpen => encode_channel_open(&mut fr),
        MethodFrameArgs::ChannelOpenOk => encode_channel_open_ok(&mut fr),
        MethodFrameArgs::ChannelClose(args) => encode_channel_close(&mut fr, args),
        MethodFrameArgs::ChannelCloseOk => (),
        MethodFrameArgs::ExchangeDeclare(args) => encode_exchange_declare(&mut fr, args),
        MethodFrameArgs::ExchangeDeclareOk => (),
        MethodFrameArgs::ExchangeBind(args) => encode_exchange_bind(&mut fr, args),
        MethodFrameArgs::ExchangeBindOk => (),
        MethodFrameArgs::ExchangeUnbind(args) => encode_exchange_unbind(&mut fr, args),
        MethodFrameArgs::ExchangeUnbindOk => (),
        MethodFrameArgs::ExchangeDelete(args) => encode_exchange_delete(&mut fr, args),
        MethodFrameArgs::ExchangeDeleteOk => (),
        MethodFrameArgs::QueueDeclare(args) => encode_queue_declare(&mut fr, args),
        MethodFrameArgs::QueueDeclareOk(args) => encode_queue_declare_ok(&mut fr, args),
        MethodFrameArgs::QueueBind(args) => encode_queue_bind(&mut fr, args),
        MethodFrameArgs::QueueBindOk => (),
        MethodFrameArgs::QueueUnbind(args) => encode_queue_unbind(&mut fr, args),
        MethodFrameArgs::QueueUnbindOk => (),
        MethodFrameArgs::QueueDelete(args) => encode_queue_delete(&mut fr, args),
        MethodFrameArgs::QueueDeleteOk(args) => encode_queue_delete_ok(&mut fr, args),
        MethodFrameArgs::BasicConsume(args) => encode_basic_consume(&mut fr, args),
        MethodFrameArgs::BasicConsumeOk(args) => encode_basic_consume_ok(&mut fr, args),
        MethodFrameArgs::BasicCancel(args) => encode_basic_cancel(&mut fr, args),
        MethodFrameArgs::BasicCancelOk(args) => encode_basic_cancel_ok(&mut fr, args),
        MethodFrameArgs::BasicPublish(args) => encode_basic_publish(&mut fr, args),
        MethodFrameArgs::BasicDeliver(args) => encode_basic_deliver(&mut fr, args),
        MethodFrameArgs::BasicAck(args) => encode_basic_ack(&mut fr, args),
        MethodFrameArgs::BasicNack(args) => encode_basic_nack(&mut fr, args),
    }

    buf.put_u32(fr.len() as u32);
    buf.put(fr);
    buf.put_u8(FRAME_END);
}

fn encode_connection_start(mut buf: &mut BytesMut, args: &ConnectionStartArgs) {
    buf.put_u8(args.version_major);
    buf.put_u8(args.version_minor);
    encode_field_table(&mut buf, args.properties.as_ref());
    encode_long_string(&mut buf, &args.mechanisms);
    encode_long_string(&mut buf, &args.locales);
}

fn encode_connection_start_ok(mut buf: &mut BytesMut, args: &ConnectionStartOkArgs) {
    encode_field_table(&mut buf, args.properties.as_ref());
    encode_short_string(&mut buf, &args.mechanism);
    encode_long_string(&mut buf, &args.response);
    encode_short_string(&mut buf, &args.locale);
}

fn encode_connection_tune(buf: &mut BytesMut, args: &ConnectionTuneArgs) {
    buf.put_u16(args.channel_max);
    buf.put_u32(args.frame_max);
    buf.put_u16(args.heartbeat);
}

fn encode_connection_tune_ok(buf: &mut BytesMut, args: &ConnectionTuneOkArgs) {
    buf.put_u16(args.channel_max);
    buf.put_u32(args.frame_max);
    buf.put_u16(args.heartbeat);
}

fn encode_connection_open(buf: &mut BytesMut, args: &ConnectionOpenArgs) {
    encode_short_string(buf, &args.virtual_host);
    encode_short_string(buf, "");

    let mut flags = 0x00;

    if args.insist {
        flags |= 0x01;
    }

    buf.put_u8(flags);
}

fn encode_connection_open_ok(buf: &mut BytesMut) {
    // reserved, an empty short string
    buf.put_u8(0);
}

fn encode_connection_close(mut buf: &mut BytesMut, args: &ConnectionCloseArgs) {
    buf.put_u16(args.code);
    encode_short_string(&mut buf, &args.text);
    buf.put_u16(args.class_id);
    buf.put_u16(args.method_id);
}

fn encode_channel_open(buf: &mut BytesMut) {
    // reserved, an empty short string
    buf.put_u8(0);
}

fn encode_channel_open_ok(buf: &mut BytesMut) {
    // reserved, an empty long string
    buf.put_u32(0);
}

fn encode_channel_close(mut buf: &mut BytesMut, args: &ChannelCloseArgs) {
    buf.put_u16(args.code);
    encode_short_string(&mut buf, &args.text);
    buf.put_u16(args.class_id);
    buf.put_u16(args.method_id);
}

fn encode_exchange_declare(mut buf: &mut BytesMut, args: &ExchangeDeclareArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.exchange_name);
    encode_short_string(&mut buf, &args.exchange_type);
    buf.put_u8(args.flags.bits());
    encode_field_table(&mut buf, args.args.as_ref());
}

fn encode_exchange_bind(mut buf: &mut BytesMut, args: &ExchangeBindArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.destination);
    encode_short_string(&mut buf, &args.source);
    encode_short_string(&mut buf, &args.routing_key);
    buf.put_u8(if args.no_wait { 1 } else { 0 });
    encode_field_table(&mut buf, args.args.as_ref());
}

fn encode_exchange_unbind(mut buf: &mut BytesMut, args: &ExchangeUnbindArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.destination);
    encode_short_string(&mut buf, &args.source);
    encode_short_string(&mut buf, &args.routing_key);
    buf.put_u8(if args.no_wait { 1 } else { 0 });
    encode_field_table(&mut buf, args.args.as_ref());
}

fn encode_exchange_delete(mut buf: &mut BytesMut, args: &ExchangeDeleteArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.exchange_name);
    buf.put_u8(args.flags.bits());
}

fn encode_queue_declare(mut buf: &mut BytesMut, args: &QueueDeclareArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.name);
    buf.put_u8(args.flags.bits());
    encode_field_table(&mut buf, args.args.as_ref());
}

fn encode_queue_declare_ok(mut buf: &mut BytesMut, args: &QueueDeclareOkArgs) {
    encode_short_string(&mut buf, &args.name);
    buf.put_u32(args.message_count);
    buf.put_u32(args.consumer_count);
}

fn encode_queue_bind(mut buf: &mut BytesMut, args: &QueueBindArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.queue_name);
    encode_short_string(&mut buf, &args.exchange_name);
    encode_short_string(&mut buf, &args.routing_key);
    buf.put_u8(if args.no_wait { 1 } else { 0 });
    encode_field_table(&mut buf, args.args.as_ref());
}

fn encode_queue_unbind(mut buf: &mut BytesMut, args: &QueueUnbindArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.queue_name);
    encode_short_string(&mut buf, &args.exchange_name);
    encode_short_string(&mut buf, &args.routing_key);
    encode_field_table(&mut buf, args.args.as_ref());
}

fn encode_queue_delete(mut buf: &mut BytesMut, args: &QueueDeleteArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.queue_name);
    buf.put_u8(args.flags.bits());
}

fn encode_queue_delete_ok(buf: &mut BytesMut, args: &QueueDeleteOkArgs) {
    buf.put_u32(args.message_count);
}

fn encode_basic_consume(mut buf: &mut BytesMut, args: &BasicConsumeArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.queue);
    encode_short_string(&mut buf, &args.consumer_tag);
    buf.put_u8(args.flags.bits());
    encode_field_table(&mut buf, args.args.as_ref());
}

fn encode_basic_consume_ok(mut buf: &mut BytesMut, args: &BasicConsumeOkArgs) {
    encode_short_string(&mut buf, &args.consumer_tag);
}

fn encode_basic_cancel(mut buf: &mut BytesMut, args: &BasicCancelArgs) {
    encode_short_string(&mut buf, &args.consumer_tag);
    buf.put_u8(if args.no_wait { 1 } else { 0 });
}

fn encode_basic_cancel_ok(mut buf: &mut BytesMut, args: &BasicCancelOkArgs) {
    encode_short_string(&mut buf, &args.consumer_tag);
}

fn encode_basic_publish(mut buf: &mut BytesMut, args: &BasicPublishArgs) {
    buf.put_u16(0);
    encode_short_string(&mut buf, &args.exchange_name);
    encode_short_string(&mut buf, &args.routing_key);
    buf.put_u8(args.flags.bits());
}

fn encode_basic_deliver(mut buf: &mut BytesMut, args: &BasicDeliverArgs) {
    encode_short_string(&mut buf, &args.consumer_tag);
    buf.put_u64(args.delivery_tag);
    buf.put_u8(if args.redelivered { 1 } else { 0 });
    encode_short_string(&mut buf, &args.exchange_name);
    encode_short_string(&mut buf, &args.routing_key);
}

fn encode_basic_ack(buf: &mut BytesMut, args: &BasicAckArgs) {
    buf.put_u64(args.delivery_tag);
    buf.put_u8(if args.multiple { 1 } else { 0 });
}

fn encode_basic_nack(buf: &mut BytesMut, args: &BasicNackArgs) {
    buf.put_u64(args.delivery_tag);
    buf.put_u8(args.flags.bits());
}

fn encode_content_header_frame(mut buf: &mut BytesMut, hf: &ContentHeaderFrame) {
    buf.put_u8(FRAME_CONTENT_HEADER);
    buf.put_u16(hf.channel);

    let mut fr_buf = BytesMut::with_capacity(4096);
    fr_buf.put_u16(hf.class_id);
    fr_buf.put_u16(hf.weight);
    fr_buf.put_u64(hf.body_size);

    // The flags word is computed from the fields which are actually set, so a frame
    // built by hand cannot carry a flag without its value.
    let mut flags = HeaderPropertyFlags::empty();
    flags.set(HeaderPropertyFlags::CONTENT_TYPE, hf.content_type.is_some());
    flags.set(HeaderPropertyFlags::CONTENT_ENCODING, hf.content_encoding.is_some());
    flags.set(HeaderPropertyFlags::HEADERS, hf.headers.is_some());
    flags.set(HeaderPropertyFlags::DELIVERY_MODE, hf.delivery_mode.is_some());
    flags.set(HeaderPropertyFlags::PRIORITY, hf.priority.is_some());
    flags.set(HeaderPropertyFlags::CORRELATION_ID, hf.correlation_id.is_some());
    flags.set(HeaderPropertyFlags::REPLY_TO, hf.reply_to.is_some());
    flags.set(HeaderPropertyFlags::EXPIRATION, hf.expiration.is_some());
    flags.set(HeaderPropertyFlags::MESSAGE_ID, hf.message_id.is_some());
    flags.set(HeaderPropertyFlags::TIMESTAMP, hf.timestamp.is_some());
    flags.set(HeaderPropertyFlags::MESSAGE_TYPE, hf.message_type.is_some());
    flags.set(HeaderPropertyFlags::USER_ID, hf.user_id.is_some());
    flags.set(HeaderPropertyFlags::APP_ID, hf.app_id.is_some());
    flags.set(HeaderPropertyFlags::CLUSTER_ID, hf.cluster_id.is_some());
    fr_buf.put_u16(flags.bits());

    if let Some(ref v) = hf.content_type {
        encode_short_string(&mut fr_buf, v);
    }
    if let Some(ref v) = hf.content_encoding {
        encode_short_string(&mut fr_buf, v);
    }
    if hf.headers.is_some() {
        encode_field_table(&mut fr_buf, hf.headers.as_ref());
    }
    if let Some(v) = hf.delivery_mode {
        fr_buf.put_u8(v);
    }
    if let Some(v) = hf.priority {
        fr_buf.put_u8(v);
    }
    if let Some(ref v) = hf.correlation_id {
        encode_short_string(&mut fr_buf, v);
    }
    if let Some(ref v) = hf.reply_to {
        encode_short_string(&mut fr_buf, v);
    }
    if let Some(ref v) = hf.expiration {
        encode_short_string(&mut fr_buf, v);
    }
    if let Some(ref v) = hf.message_id {
        encode_short_string(&mut fr_buf, v);
    }
    if let Some(v) = hf.timestamp {
        fr_buf.put_u64(v);
    }
    if let Some(ref v) = hf.message_type {
        encode_short_string(&mut fr_buf, v);
    }
    if let Some(ref v) = hf.user_id {
        encode_short_string(&mut fr_buf, v);
    }
    if let Some(ref v) = hf.app_id {
        encode_short_string(&mut fr_buf, v);
    }
    if let Some(ref v) = hf.cluster_id {
        encode_short_string(&mut fr_buf, v);
    }

    buf.put_u32(fr_buf.len() as u32);
    buf.put(fr_buf);
    buf.put_u8(FRAME_END);
}

fn encode_content_body_frame(buf: &mut BytesMut, bf: &ContentBodyFrame) {
    buf.reserve(bf.body.len() + 8);
    buf.put_u8(FRAME_CONTENT_BODY);
    buf.put_u16(bf.channel);
    buf.put_u32(bf.body.len() as u32);
    buf.put(bf.body.as_slice());
    buf.put_u8(FRAME_END);
}

fn encode_heartbeat_frame(buf: &mut BytesMut, channel: Channel) {
    buf.put_u8(FRAME_HEARTBEAT);
    buf.put_u16(channel);
    buf.put_u32(0);
    buf.put_u8(FRAME_END);
}

fn encode_short_string(buf: &mut BytesMut, s: &str) {
    debug_assert!(s.len() < 256);

    buf.put_u8(s.len() as u8);
    buf.put(s.as_bytes());
}

fn encode_long_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put(s.as_bytes());
}

fn encode_field_table(buf: &mut BytesMut, ft: Option<&FieldTable>) {
    match ft {
        None => buf.put_u32(0),
        Some(t) => {
            let mut ft_buf = BytesMut::with_capacity(4096);

            for (name, value) in t {
                encode_short_string(&mut ft_buf, name);
                encode_value(&mut ft_buf, value);
            }

            buf.put_u32(ft_buf.len() as u32);
            buf.put(ft_buf);
        }
    }
}

fn encode_value(mut buf: &mut BytesMut, value: &AMQPFieldValue) {
    match value {
        AMQPFieldValue::Bool(v) => {
            buf.put_u8(b't');
            buf.put_u8(if *v { 1 } else { 0 });
        }
        AMQPFieldValue::Byte(v) => {
            buf.put_u8(b'b');
            buf.put_i8(*v);
        }
        AMQPFieldValue::Short(v) => {
            buf.put_u8(b's');
            buf.put_i16(*v);
        }
        AMQPFieldValue::Int(v) => {
            buf.put_u8(b'I');
            buf.put_i32(*v);
        }
        AMQPFieldValue::Long(v) => {
            buf.put_u8(b'l');
            buf.put_i64(*v);
        }
        AMQPFieldValue::LongString(v) => {
            buf.put_u8(b'S');
            encode_long_string(&mut buf, v);
        }
        AMQPFieldValue::FieldTable(v) => {
            buf.put_u8(b'F');
            encode_field_table(&mut buf, Some(v));
        }
        AMQPFieldValue::Void => {
            buf.put_u8(b'V');
        }
    }
}
