//! Document path integration tests: parsing, canonical rendering, and wire
//! round trips of paths embedded in statements.

#[cfg(test)]
mod tests {
    use duodb_expr::{
        DocumentPath, Expr, Identifier, ParseMode, PathItem, parse_document_path, parse_expression,
    };
    use duodb_proto::{Argument, StmtExecute, WireMessage};

    use crate::round_trip;

    #[test]
    fn test_should_render_parsed_paths_canonically() {
        for (text, canonical) in [
            ("$.items[*].name", "$.items[*].name"),
            ("items[*].name", "$.items[*].name"),
            ("", "$"),
            ("  $  ", "$"),
            ("$**.price", "$**.price"),
            ("$.\"odd name\"[0]", "$.\"odd name\"[0]"),
        ] {
            let path = parse_document_path(text)
                .unwrap_or_else(|err| panic!("path parse failed for {text:?}: {err}"));
            assert_eq!(path.to_string(), canonical, "for {text:?}");
        }
    }

    #[test]
    fn test_should_reparse_canonical_rendering_to_the_same_path() {
        // Every item kind plus members that need quoting and escaping.
        let path = DocumentPath::from(vec![
            PathItem::Member("a b".to_owned()),
            PathItem::ArrayIndex(3),
            PathItem::ArrayIndexAsterisk,
            PathItem::MemberAsterisk,
            PathItem::DoubleAsterisk,
            PathItem::Member("null".to_owned()),
            PathItem::Member("quo\"ted\\".to_owned()),
        ]);
        let reparsed = parse_document_path(&path.to_string()).expect("canonical text re-parses");
        assert_eq!(reparsed, path);
    }

    #[test]
    fn test_should_round_trip_every_path_item_kind_on_the_wire() {
        let path = DocumentPath::from(vec![
            PathItem::Member("items".to_owned()),
            PathItem::ArrayIndex(u32::MAX),
            PathItem::ArrayIndexAsterisk,
            PathItem::MemberAsterisk,
            PathItem::DoubleAsterisk,
            PathItem::Member("price".to_owned()),
        ]);
        let filter = Expr::Identifier(Identifier::from_path(path));
        let message = WireMessage::StmtExecute(
            StmtExecute::document("shop", "SELECT doc").with_arg(Argument::Expr(filter)),
        );
        assert_eq!(round_trip(&message), message);
    }

    #[test]
    fn test_should_carry_parsed_filter_paths_across_the_wire() {
        let filter = parse_expression("$.orders[*].total > 100", ParseMode::Document)
            .expect("filter parses");
        let message = WireMessage::StmtExecute(
            StmtExecute::document("shop", "SELECT doc").with_arg(Argument::Expr(filter.clone())),
        );

        let WireMessage::StmtExecute(decoded) = round_trip(&message) else {
            panic!("wrong message kind after round trip");
        };
        assert_eq!(decoded.args, vec![Argument::Expr(filter)]);
    }

    #[test]
    fn test_should_carry_arrow_paths_in_table_identifiers() {
        let filter = parse_expression("doc->'$.address.city' = :city", ParseMode::Table)
            .expect("filter parses");
        let message = WireMessage::StmtExecute(
            StmtExecute::sql("SELECT * FROM users").with_arg(Argument::Expr(filter)),
        );
        assert_eq!(round_trip(&message), message);
    }
}
