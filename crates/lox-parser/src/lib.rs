pub mod parser;

pub use parser::{Parser, MAX_NESTING};

#[cfg(test)]
mod tests {
    use super::*;
    use lox_lexer::Lexer;
    use lox_syntax::ast::*;
    use lox_syntax::diagnostic::Diagnostics;
    use lox_syntax::token::Literal;
    use pretty_assertions::assert_eq;

    fn parse_expr_str(input: &str) -> (Option<Expr>, Diagnostics) {
        let tokens = Lexer::new(input).tokenize().expect("Lexing should succeed");
        let mut diags = Diagnostics::new();
        let expr = Parser::new(tokens, &mut diags).parse_expression();
        (expr, diags)
    }

    fn render(input: &str) -> String {
        let (expr, diags) = parse_expr_str(input);
        assert!(!diags.has_errors(), "unexpected diagnostics: {:?}", diags);
        expr.expect("Parsing should succeed").to_string()
    }

    fn parse_program_str(input: &str) -> (Vec<Stmt>, Diagnostics) {
        let tokens = Lexer::new(input).tokenize().expect("Lexing should succeed");
        let mut diags = Diagnostics::new();
        let program = Parser::new(tokens, &mut diags).parse();
        (program, diags)
    }

    #[test]
    fn test_literal_expressions() {
        assert_eq!(parse_expr_str("42").0, Some(Expr::Literal(Literal::Number(42.0))));
        assert_eq!(render("\"hello\""), "\"hello\"");
        assert_eq!(render("true"), "true");
        assert_eq!(render("false"), "false");
        assert_eq!(render("nil"), "nil");
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(render("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(render("2 * 3 + 1"), "(+ (* 2 3) 1)");
        assert_eq!(render("1 < 2 == 3 >= 4"), "(== (< 1 2) (>= 3 4))");
        assert_eq!(render("-1 - -2"), "(- (- 1) (- 2))");
        assert_eq!(render("!!true"), "(! (! true))");
    }

    #[test]
    fn test_precedence_tree_shape() {
        let (expr, _) = parse_expr_str("1 + 2 * 3");
        match expr {
            Some(Expr::Binary {
                left,
                operator,
                right,
            }) => {
                assert_eq!(*left, Expr::Literal(Literal::Number(1.0)));
                assert_eq!(operator.lexeme, "+");
                assert!(matches!(*right, Expr::Binary { ref operator, .. } if operator.lexeme == "*"));
            }
            other => panic!("Expected Binary, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(render("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(render("8 / 4 / 2"), "(/ (/ 8 4) 2)");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(render("(1 + 2) * 3"), "(* (group (+ 1 2)) 3)");
        assert_eq!(render("(1, 2)"), "(group (seq 1 2))");
    }

    #[test]
    fn test_comma_sequence() {
        let (expr, _) = parse_expr_str("1, 2, 3");
        match expr {
            Some(Expr::Sequence(elements)) => assert_eq!(
                elements,
                vec![
                    Expr::Literal(Literal::Number(1.0)),
                    Expr::Literal(Literal::Number(2.0)),
                    Expr::Literal(Literal::Number(3.0)),
                ]
            ),
            other => panic!("Expected Sequence, got {:?}", other),
        }
        // a single element is never wrapped
        assert_eq!(parse_expr_str("1").0, Some(Expr::Literal(Literal::Number(1.0))));
        assert_eq!(render("1 + 2, 3 * 4"), "(seq (+ 1 2) (* 3 4))");
    }

    #[test]
    fn test_unmatched_paren_reports_once() {
        let (expr, diags) = parse_expr_str("(1 + 2");
        assert!(expr.is_none());
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags.iter().next().unwrap().to_string(),
            "[line 1] Error at end: Expect ')' after expression."
        );
    }

    #[test]
    fn test_stray_tokens_are_errors() {
        let (expr, diags) = parse_expr_str(")");
        assert!(expr.is_none());
        assert_eq!(diags.messages(), vec!["Expect expression."]);

        let (expr, diags) = parse_expr_str("");
        assert!(expr.is_none());
        assert_eq!(diags.iter().next().unwrap().location, " at end");

        let (expr, diags) = parse_expr_str("1 2");
        assert!(expr.is_none());
        assert_eq!(diags.messages(), vec!["Expect end of expression."]);
    }

    #[test]
    fn test_logical_assignment_and_calls() {
        assert_eq!(render("a or b and c"), "(or a (and b c))");
        assert_eq!(render("a = b = 1"), "(= a (= b 1))");
        assert_eq!(render("f(1, 2)(3)"), "(call (call f 1 2) 3)");
        assert_eq!(render("f()"), "(call f)");
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (expr, diags) = parse_expr_str("1 = 2");
        assert_eq!(diags.messages(), vec!["Invalid assignment target."]);
        // reported, but the parse carries on
        assert_eq!(expr.map(|e| e.to_string()), Some("1".to_string()));
    }

    #[test]
    fn test_variable_nodes_get_distinct_ids() {
        let (expr, _) = parse_expr_str("a + a");
        match expr {
            Some(Expr::Binary { left, right, .. }) => match (*left, *right) {
                (Expr::Variable { id: l, .. }, Expr::Variable { id: r, .. }) => assert_ne!(l, r),
                other => panic!("Expected two variables, got {:?}", other),
            },
            other => panic!("Expected Binary, got {:?}", other),
        }
    }

    #[test]
    fn test_statements() {
        let (program, diags) = parse_program_str(
            "var a = 1;\n\
             fun add(x, y) { return x + y; }\n\
             if (a) print a; else { print nil; }\n\
             while (a < 3) a = a + 1;\n\
             print add(a, 2);",
        );
        assert!(!diags.has_errors(), "{:?}", diags);
        assert_eq!(program.len(), 5);
        assert!(matches!(&program[0], Stmt::Var { name, initializer: Some(_) } if name.lexeme == "a"));
        match &program[1] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name.lexeme, "add");
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                assert_eq!(params, vec!["x", "y"]);
                assert!(matches!(decl.body[0], Stmt::Return { value: Some(_), .. }));
            }
            other => panic!("Expected Function, got {:?}", other),
        }
        assert!(matches!(&program[2], Stmt::If { else_branch: Some(_), .. }));
        assert!(matches!(&program[3], Stmt::While { .. }));
        assert!(matches!(&program[4], Stmt::Print(Expr::Call { .. })));
    }

    #[test]
    fn test_for_desugars_to_while() {
        let (program, diags) = parse_program_str("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!diags.has_errors());
        match &program[..] {
            [Stmt::Block(outer)] => {
                assert!(matches!(outer[0], Stmt::Var { .. }));
                match &outer[1] {
                    Stmt::While { condition, body } => {
                        assert_eq!(condition.to_string(), "(< i 3)");
                        assert!(matches!(&**body, Stmt::Block(inner) if inner.len() == 2));
                    }
                    other => panic!("Expected While, got {:?}", other),
                }
            }
            other => panic!("Expected one block, got {:?}", other),
        }

        let (program, _) = parse_program_str("for (;;) print 1;");
        assert!(matches!(
            &program[..],
            [Stmt::While { condition: Expr::Literal(Literal::Bool(true)), .. }]
        ));
    }

    #[test]
    fn test_synchronize_recovers_at_statement_boundary() {
        let (program, diags) = parse_program_str(
            "var a = ;\n\
             print 1;\n\
             var b = (2;\n\
             print 3;",
        );
        assert_eq!(
            diags.messages(),
            vec!["Expect expression.", "Expect ')' after expression."]
        );
        assert_eq!(program.len(), 2);
        assert!(program.iter().all(|s| matches!(s, Stmt::Print(_))));
    }

    #[test]
    fn test_recovery_inside_block_keeps_block() {
        let (program, diags) = parse_program_str("{ print ; print 2; }");
        assert_eq!(diags.len(), 1);
        assert!(matches!(&program[..], [Stmt::Block(inner)] if inner.len() == 1));
    }

    #[test]
    fn test_missing_semicolon_and_brace() {
        let (_, diags) = parse_program_str("print 1");
        assert_eq!(diags.messages(), vec!["Expect ';' after value."]);

        let (_, diags) = parse_program_str("{ var x = 1;");
        assert_eq!(diags.messages(), vec!["Expect '}' after block."]);
    }

    #[test]
    fn test_prefix_operators_nest_up_to_the_limit() {
        let (expr, diags) = parse_expr_str(&format!("{}1", "-".repeat(200)));
        assert!(diags.is_empty(), "{:?}", diags);
        assert!(expr.is_some());

        let (expr, diags) = parse_expr_str(&format!("{}1", "-".repeat(MAX_NESTING * 4)));
        assert!(expr.is_none());
        assert_eq!(diags.messages(), vec!["Too deeply nested."]);
    }

    #[test]
    fn test_nesting_error_recovers_at_next_statement() {
        let source = format!("print {}1;\nprint 2;", "-".repeat(100_000));
        let (program, diags) = parse_program_str(&source);
        assert_eq!(diags.messages(), vec!["Too deeply nested."]);
        assert_eq!(diags.iter().next().unwrap().line, 1);
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn test_deeply_nested_groupings_and_blocks_are_rejected() {
        // each grouping level passes through every precedence level
        std::thread::Builder::new()
            .stack_size(16 * 1024 * 1024)
            .spawn(|| {
                let depth = MAX_NESTING + 1;
                let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
                let (expr, diags) = parse_expr_str(&source);
                assert!(expr.is_none());
                assert_eq!(diags.messages(), vec!["Too deeply nested."]);

                let source = format!("{}{}", "{".repeat(depth), "}".repeat(depth));
                let (_, diags) = parse_program_str(&source);
                assert!(diags.messages().contains(&"Too deeply nested."));
            })
            .unwrap()
            .join()
            .unwrap();
    }
}
