//! Expression compiler integration tests: realistic filter texts parsed into
//! ASTs, rendered back, and re-parsed.

#[cfg(test)]
mod tests {
    use duodb_expr::{Expr, ParseMode, Placeholder, Scalar, parse_expression};

    fn doc(text: &str) -> Expr {
        parse_expression(text, ParseMode::Document)
            .unwrap_or_else(|err| panic!("parse failed for {text:?}: {err}"))
    }

    fn table(text: &str) -> Expr {
        parse_expression(text, ParseMode::Table)
            .unwrap_or_else(|err| panic!("parse failed for {text:?}: {err}"))
    }

    #[test]
    fn test_should_parse_a_realistic_table_filter() {
        let expr = table("u.age >= 18 AND u.name LIKE 'A%' OR u.vip = TRUE");

        // OR binds loosest, so the AND chain sits on its left.
        let (name, operands) = expr.as_operator().expect("top-level operator");
        assert_eq!(name, "OR");
        let (left, _) = operands[0].as_operator().expect("left operand");
        assert_eq!(left, "AND");
        let (right, right_operands) = operands[1].as_operator().expect("right operand");
        assert_eq!(right, "=");
        assert_eq!(right_operands[1], Expr::Literal(Scalar::Bool(true)));
    }

    #[test]
    fn test_should_parse_a_realistic_document_filter() {
        let expr = doc("$.status = 'shipped' AND $.items[*].price BETWEEN 10 AND 99.5");

        let (name, operands) = expr.as_operator().expect("top-level operator");
        assert_eq!(name, "AND");
        let (between, between_operands) = operands[1].as_operator().expect("right operand");
        assert_eq!(between, "BETWEEN");
        assert_eq!(between_operands[2], Expr::Literal(Scalar::Double(99.5)));
    }

    #[test]
    fn test_should_carry_placeholders_through_nested_clauses() {
        let expr = doc("(age > :min OR age < :max) AND name LIKE :pattern");

        let mut named = Vec::new();
        collect_placeholders(&expr, &mut named);
        assert_eq!(named, vec!["min", "max", "pattern"]);
    }

    fn collect_placeholders(expr: &Expr, into: &mut Vec<String>) {
        match expr {
            Expr::Placeholder(Placeholder::Named(name)) => into.push(name.clone()),
            Expr::Operator { operands, .. } => {
                for operand in operands {
                    collect_placeholders(operand, into);
                }
            }
            Expr::FunctionCall { args, .. } => {
                for arg in args {
                    collect_placeholders(arg, into);
                }
            }
            _ => {}
        }
    }

    #[test]
    fn test_should_reparse_rendered_expressions_to_the_same_ast() {
        // Display renders every sub-expression parenthesized, so the text is
        // unambiguous and grouping survives the second parse.
        for text in [
            "a > 1 AND b < 2 OR NOT c = 3",
            "price * quantity + 0.5 >= :limit",
            "price = 2.0",
            "name NOT LIKE '%x%' ESCAPE 'x'",
            "a IS NOT NULL",
            "city IN ('oslo', 'bergen', 'trondheim')",
            "age NOT BETWEEN 18 AND 65",
            "lower(name) = 'kim' AND length(name) > 2",
        ] {
            let parsed = doc(text);
            let reparsed = doc(&parsed.to_string());
            assert_eq!(reparsed, parsed, "rendering of {text:?} changed meaning");
        }
    }

    #[test]
    fn test_should_reparse_rendered_table_identifiers() {
        for text in ["t.col > 1", "doc->'$.a[0].b' = 'x'", "a.b - c.d"] {
            let parsed = table(text);
            let reparsed = table(&parsed.to_string());
            assert_eq!(reparsed, parsed, "rendering of {text:?} changed meaning");
        }
    }

    #[test]
    fn test_should_point_diagnostics_at_the_failing_token() {
        // The reported offset lands on the first byte a caret should mark.
        let err = parse_expression("price >= AND 10", ParseMode::Table).unwrap_err();
        assert_eq!(err.offset, 9);

        let err = parse_expression("a IN (1, 2", ParseMode::Document).unwrap_err();
        assert_eq!(err.offset, 10);

        let err = parse_expression("a BETWEEN 1 OR 2", ParseMode::Document).unwrap_err();
        assert_eq!(err.offset, 12);
        assert_eq!(err.expected, "AND");
    }

    #[test]
    fn test_should_reject_operator_shapes_the_grammar_never_builds() {
        let err = Expr::operator("BETWEEN", vec![Expr::Literal(Scalar::UInt(1))]).unwrap_err();
        assert!(err.to_string().contains("exactly 3"));

        let err = Expr::operator("XOR", Vec::new()).unwrap_err();
        assert!(err.to_string().contains("unknown operator"));
    }
}
