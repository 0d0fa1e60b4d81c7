//! Encode/decode round trips for every message kind.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use duodb_expr::{ParseMode, Scalar, parse_expression};
    use duodb_proto::{
        Argument, Capabilities, ColumnMeta, FieldType, Notice, NoticeScope, Row, ServerError,
        Severity, StmtExecute, WireMessage,
    };
    use serde_json::json;

    use crate::{encoder, round_trip};

    #[test]
    fn test_should_round_trip_empty_payload_messages() {
        for message in [
            WireMessage::CapabilitiesGet,
            WireMessage::SessionOpen,
            WireMessage::SessionClose,
            WireMessage::ConnectionClose,
            WireMessage::FetchDone,
            WireMessage::StmtExecuteOk,
        ] {
            assert_eq!(round_trip(&message), message);
        }
    }

    #[test]
    fn test_should_round_trip_capability_messages() {
        let capabilities = Capabilities::new()
            .with("tls", true)
            .with("client.interactive", false)
            .with(
                "compression",
                Capabilities::new()
                    .with("algorithm", "zstd")
                    .with("server_combine", true),
            );

        let message = WireMessage::CapabilitiesSet(capabilities.clone());
        assert_eq!(round_trip(&message), message);

        let message = WireMessage::Capabilities(capabilities);
        assert_eq!(round_trip(&message), message);

        let message = WireMessage::Capabilities(Capabilities::new());
        assert_eq!(round_trip(&message), message);
    }

    #[test]
    fn test_should_round_trip_ok_with_and_without_note() {
        for message in [
            WireMessage::Ok { message: None },
            WireMessage::Ok {
                message: Some("0 rows affected".to_owned()),
            },
            WireMessage::Ok {
                message: Some(String::new()),
            },
        ] {
            assert_eq!(round_trip(&message), message);
        }
    }

    #[test]
    fn test_should_round_trip_error_and_notice() {
        let message = WireMessage::Error(ServerError {
            severity: Severity::Fatal,
            code: 1045,
            sql_state: "28000".to_owned(),
            message: "access denied".to_owned(),
        });
        assert_eq!(round_trip(&message), message);

        let message = WireMessage::Notice(Notice {
            scope: NoticeScope::Local,
            kind: 3,
            payload: Bytes::from_static(b"\x01\x02\x03"),
        });
        assert_eq!(round_trip(&message), message);
    }

    #[test]
    fn test_should_round_trip_result_set_messages() {
        let message = WireMessage::ColumnMeta(ColumnMeta {
            field_type: FieldType::Decimal,
            name: "total".to_owned(),
            table: "orders".to_owned(),
            schema: "shop".to_owned(),
            length: 10,
            flags: 0x11,
        });
        assert_eq!(round_trip(&message), message);

        // A row with an empty field is distinct from a row with fewer fields.
        let message = WireMessage::Row(Row {
            fields: vec![
                Bytes::from_static(b"1"),
                Bytes::new(),
                Bytes::from_static(b"kim"),
            ],
        });
        assert_eq!(round_trip(&message), message);

        let message = WireMessage::Row(Row { fields: Vec::new() });
        assert_eq!(round_trip(&message), message);
    }

    #[test]
    fn test_should_round_trip_statement_with_every_argument_kind() {
        let filter = parse_expression("age > :min AND name LIKE 'A%'", ParseMode::Document)
            .expect("filter parses");

        let message = WireMessage::StmtExecute(
            StmtExecute::document("shop", "find")
                .with_arg(Argument::Scalar(Scalar::Null))
                .with_arg(Argument::Scalar(Scalar::Bool(true)))
                .with_arg(Argument::Scalar(Scalar::UInt(300)))
                .with_arg(Argument::Scalar(Scalar::Int(-300)))
                .with_arg(Argument::Scalar(Scalar::Double(2.5)))
                .with_arg(Argument::Scalar(Scalar::String("text".to_owned())))
                .with_arg(Argument::Scalar(Scalar::Bytes(Bytes::from_static(
                    b"\x00\xff",
                ))))
                .with_arg(Argument::Expr(filter))
                .with_arg(Argument::Document(json!({
                    "name": "kim",
                    "tags": ["a", "b"],
                    "active": true,
                }))),
        );
        assert_eq!(round_trip(&message), message);
    }

    #[test]
    fn test_should_round_trip_integer_width_boundaries() {
        // The encoder picks the narrowest integer encoding; decoding must
        // restore the full-width value either side of every boundary.
        for value in [
            0,
            255,
            256,
            65_535,
            65_536,
            u64::from(u32::MAX),
            u64::from(u32::MAX) + 1,
            u64::MAX,
        ] {
            let message = WireMessage::StmtExecute(
                StmtExecute::sql("SELECT ?").with_arg(Argument::Scalar(Scalar::UInt(value))),
            );
            assert_eq!(round_trip(&message), message, "for UInt({value})");
        }

        for value in [
            0,
            -1,
            -128,
            -129,
            -32_768,
            -32_769,
            i64::from(i32::MIN),
            i64::from(i32::MIN) - 1,
            i64::MIN,
            i64::MAX,
        ] {
            let message = WireMessage::StmtExecute(
                StmtExecute::sql("SELECT ?").with_arg(Argument::Scalar(Scalar::Int(value))),
            );
            assert_eq!(round_trip(&message), message, "for Int({value})");
        }
    }

    #[test]
    fn test_should_encode_deterministically() {
        let filter =
            parse_expression("$.a[*].b = 'x'", ParseMode::Document).expect("filter parses");
        let message = WireMessage::StmtExecute(
            StmtExecute::document("shop", "find").with_arg(Argument::Expr(filter)),
        );

        let encoder = encoder();
        let first = encoder.encode(&message).expect("message encodes");
        let second = encoder.encode(&message).expect("message encodes");
        assert_eq!(first, second);
    }
}
