//! Decoder behavior under transport fragmentation and hostile frames.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use duodb_expr::{ParseMode, Scalar, parse_expression};
    use duodb_proto::{
        Argument, Capabilities, ColumnMeta, DecodeError, FieldType, Row, StmtExecute, WireMessage,
    };

    use crate::{decoder, decoder_with_limit, encoder};

    /// A client/server exchange covering most message kinds.
    fn sample_conversation() -> Vec<WireMessage> {
        let filter =
            parse_expression("$.total > :min", ParseMode::Document).expect("filter parses");
        vec![
            WireMessage::CapabilitiesGet,
            WireMessage::CapabilitiesSet(Capabilities::new().with("tls", true)),
            WireMessage::Capabilities(Capabilities::new().with("tls", true).with("node", "db-1")),
            WireMessage::SessionOpen,
            WireMessage::Ok { message: None },
            WireMessage::StmtExecute(
                StmtExecute::document("shop", "SELECT doc FROM orders")
                    .with_arg(Argument::Expr(filter))
                    .with_arg(Argument::Scalar(Scalar::UInt(100))),
            ),
            WireMessage::ColumnMeta(ColumnMeta {
                field_type: FieldType::Bytes,
                name: "doc".to_owned(),
                table: "orders".to_owned(),
                schema: "shop".to_owned(),
                length: 0,
                flags: 0,
            }),
            WireMessage::Row(Row {
                fields: vec![Bytes::from_static(b"{\"total\":120}")],
            }),
            WireMessage::Row(Row {
                fields: vec![Bytes::from_static(b"{\"total\":250}")],
            }),
            WireMessage::FetchDone,
            WireMessage::StmtExecuteOk,
            WireMessage::SessionClose,
            WireMessage::ConnectionClose,
        ]
    }

    fn encoded_stream(messages: &[WireMessage]) -> Vec<u8> {
        let encoder = encoder();
        let mut stream = Vec::new();
        for message in messages {
            stream.extend_from_slice(&encoder.encode(message).expect("message encodes"));
        }
        stream
    }

    #[test]
    fn test_should_decode_identically_for_any_chunking() {
        let messages = sample_conversation();
        let stream = encoded_stream(&messages);

        for chunk_size in [1, 2, 3, 7, 64, stream.len()] {
            let mut decoder = decoder();
            let mut decoded = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                decoder.feed(chunk);
                while let Some(message) = decoder.next_message().expect("stream decodes") {
                    decoded.push(message);
                }
            }
            tracing::info!(chunk_size, decoded = decoded.len(), "stream drained");
            assert_eq!(decoded, messages, "chunk size {chunk_size}");
            assert_eq!(decoder.buffered(), 0, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_should_yield_nothing_until_a_frame_completes() {
        let frame = encoder()
            .encode(&WireMessage::SessionOpen)
            .expect("message encodes");

        let mut decoder = decoder();
        for &byte in &frame[..frame.len() - 1] {
            decoder.feed(&[byte]);
            assert!(decoder.next_message().expect("partial input").is_none());
        }

        decoder.feed(&frame[frame.len() - 1..]);
        assert_eq!(
            decoder.next_message().expect("complete frame"),
            Some(WireMessage::SessionOpen)
        );
    }

    #[test]
    fn test_should_reject_oversized_frame_before_its_payload_arrives() {
        let mut decoder = decoder_with_limit(16);
        // Only the length prefix; a million-byte payload never has to arrive
        // for the decoder to refuse the frame.
        decoder.feed(&1_000_000u32.to_le_bytes());
        let err = decoder.next_message().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::FrameTooLarge {
                declared: 1_000_000,
                max: 16
            }
        ));
    }

    #[test]
    fn test_should_accept_frames_at_the_limit_and_refuse_one_byte_over() {
        // Row payload overhead: 4-byte field count, 4-byte field length, plus
        // the type tag counted by the declared length.
        let at_limit = WireMessage::Row(Row {
            fields: vec![Bytes::from(vec![0u8; 55])],
        });
        let over = WireMessage::Row(Row {
            fields: vec![Bytes::from(vec![0u8; 56])],
        });

        let mut decoder = decoder_with_limit(64);
        decoder.feed(&encoder().encode(&at_limit).expect("message encodes"));
        assert_eq!(decoder.next_message().expect("fits"), Some(at_limit));

        decoder.feed(&encoder().encode(&over).expect("message encodes"));
        let err = decoder.next_message().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::FrameTooLarge {
                declared: 65,
                max: 64
            }
        ));
    }

    #[test]
    fn test_should_skip_unknown_message_and_resume() {
        let mut stream = encoded_stream(&[WireMessage::SessionOpen]);
        // An undefined tag with a 3-byte payload, then a valid frame.
        stream.extend_from_slice(&[4, 0, 0, 0, 0x70, 1, 2, 3]);
        stream.extend_from_slice(
            &encoder()
                .encode(&WireMessage::SessionClose)
                .expect("message encodes"),
        );

        let mut decoder = decoder();
        decoder.feed(&stream);
        assert_eq!(
            decoder.next_message().expect("first frame"),
            Some(WireMessage::SessionOpen)
        );
        let err = decoder.next_message().unwrap_err();
        assert!(matches!(err, DecodeError::UnknownMessageType { tag: 0x70 }));
        assert_eq!(
            decoder.next_message().expect("stream resumes"),
            Some(WireMessage::SessionClose)
        );
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_should_fail_cleanly_on_a_corrupt_payload_mid_stream() {
        // A StmtExecute frame whose payload stops inside the namespace.
        let mut corrupt = Vec::new();
        corrupt.extend_from_slice(&6u32.to_le_bytes());
        corrupt.push(6); // StmtExecute tag
        corrupt.extend_from_slice(&9u32.to_le_bytes()); // namespace longer than the frame
        corrupt.push(b'x');

        let mut decoder = decoder();
        decoder.feed(&corrupt);
        let err = decoder.next_message().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated {
                context: "namespace",
                ..
            }
        ));
    }
}
