#[cfg(test)]
mod parser_tests {
    use rox::ast::{Expr, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::error::Diagnostics;
    use rox::parser::Parser;
    use rox::scanner::Scanner;

    /// Parses a program and returns every statement in printed form plus
    /// the rendered diagnostics.
    fn parse(source: &str) -> (Vec<String>, Vec<String>) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(&tokens).parse(&mut diagnostics);

        (
            statements.iter().map(AstPrinter::print_stmt).collect(),
            diagnostics.messages(),
        )
    }

    fn parse_expr(source: &str) -> String {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let expr = Parser::new(&tokens)
            .parse_expression(&mut diagnostics)
            .expect("expression should parse");

        AstPrinter::print(&expr)
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(parse_expr("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(parse_expr("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
        assert_eq!(parse_expr("-!x"), "(- (! x))");
        assert_eq!(parse_expr("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
        assert_eq!(parse_expr("a or b and c"), "(or a (and b c))");
        assert_eq!(parse_expr("1 < 2 == true"), "(== (< 1.0 2.0) true)");
    }

    #[test]
    fn test_ternary() {
        assert_eq!(parse_expr("a ? 1 : 2"), "(?: a 1.0 2.0)");
        assert_eq!(
            parse_expr("a ? b ? 1 : 2 : 3"),
            "(?: a (?: b 1.0 2.0) 3.0)"
        );
        assert_eq!(parse_expr("x = a ? 1 : 2"), "(= x (?: a 1.0 2.0))");
    }

    #[test]
    fn test_calls_properties_and_assignment() {
        assert_eq!(parse_expr("f(1, g(2))(3)"), "(call (call f 1.0 (call g 2.0)) 3.0)");
        assert_eq!(parse_expr("a.b.c = 1"), "(= (. (. a b) c) 1.0)");
        assert_eq!(parse_expr("a = b = nil"), "(= a (= b nil))");
        assert_eq!(parse_expr("super.hi"), "(super hi)");
        assert_eq!(parse_expr("fun (x) { return x; }"), "(fun anonymous(x) (block (return x)))");
    }

    #[test]
    fn test_declarations() {
        let (statements, errors) = parse("var a; var b = 1; c := \"s\"; fun f(x, y) { print x; }");

        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(
            statements,
            vec![
                "(var a)",
                "(var b 1.0)",
                "(var c s)",
                "(fun f(x y) (block (print x)))",
            ]
        );
    }

    #[test]
    fn test_class_declaration() {
        let (statements, errors) =
            parse("class B < A { init(n) { this.n = n; } static make() { return B(1); } }");

        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(
            statements,
            vec![
                "(class B < A (method init(n) (block (; (= (. this n) n)))) \
                 (static make() (block (return (call B 1.0)))))"
            ]
        );
    }

    #[test]
    fn test_for_desugars_to_while() {
        let (statements, errors) = parse("for (i := 0; i < 3; i = i + 1) print i;");

        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(
            statements,
            vec!["(block (var i 0.0) (while (< i 3.0) (print i) (= i (+ i 1.0))))"]
        );

        let (statements, _) = parse("for (;;) break;");
        assert_eq!(statements, vec!["(while true (break))"]);
    }

    #[test]
    fn test_control_flow_statements() {
        let (statements, errors) =
            parse("if (a) print 1; else { print 2; } while (b) { continue; }");

        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(
            statements,
            vec![
                "(if-else a (print 1.0) (block (print 2.0)))",
                "(while b (block (continue)))",
            ]
        );
    }

    #[test]
    fn test_reference_ids_are_unique() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("a = b; c;").scan_tokens(&mut diagnostics);
        let statements = Parser::new(&tokens).parse(&mut diagnostics);

        let mut ids = Vec::new();
        for stmt in &statements {
            if let Stmt::Expression(expr) = stmt {
                match expr {
                    Expr::Assign { id, value, .. } => {
                        ids.push(*id);
                        if let Expr::Variable { id, .. } = value.as_ref() {
                            ids.push(*id);
                        }
                    }
                    Expr::Variable { id, .. } => ids.push(*id),
                    _ => {}
                }
            }
        }

        assert_eq!(ids.len(), 3);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_error_messages() {
        let (_, errors) = parse("print 1");
        assert_eq!(errors, vec!["[line 1 Error at end: Expected ';' after value.]"]);

        let (_, errors) = parse("1 = 2;");
        assert_eq!(errors, vec!["[line 1 Error at '=': Invalid assignment target.]"]);

        let (_, errors) = parse("break;");
        assert_eq!(
            errors,
            vec!["[line 1 Error at 'break': Must be inside a loop to use 'break'.]"]
        );

        let (_, errors) = parse("while (true) { fun f() { continue; } }");
        assert_eq!(
            errors,
            vec!["[line 1 Error at 'continue': Must be inside a loop to use 'continue'.]"]
        );

        let (_, errors) = parse("print a ? 1;");
        assert_eq!(
            errors,
            vec!["[line 1 Error at ';': Expected ':' after then branch of conditional expression.]"]
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let (statements, errors) = parse("f(1, 2, 3, 4, 5, 6, 7, 8, 9);");

        assert_eq!(statements.len(), 1);
        assert_eq!(
            errors,
            vec!["[line 1 Error at '9': Can't have more than 8 arguments.]"]
        );
    }

    #[test]
    fn test_too_many_parameters() {
        let (statements, errors) = parse("fun f(a, b, c, d, e, g, h, i, j) {}");

        assert_eq!(statements.len(), 1);
        assert_eq!(
            errors,
            vec!["[line 1 Error at 'j': Can't have more than 8 parameters.]"]
        );
    }

    #[test]
    fn test_eight_parameters_and_arguments_are_allowed() {
        let (statements, errors) = parse(
            "fun f(a, b, c, d, e, g, h, i) {}\nf(1, 2, 3, 4, 5, 6, 7, 8);\nfun (a, b, c, d, e, g, h, i) {};",
        );

        assert!(errors.is_empty(), "unexpected diagnostics: {:?}", errors);
        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[1],
            "(; (call f 1.0 2.0 3.0 4.0 5.0 6.0 7.0 8.0))"
        );
    }

    #[test]
    fn test_recovers_at_statement_boundary() {
        let (statements, errors) = parse("var = 1;\nprint 2;\nvar x = ;\nprint 3;");

        assert_eq!(statements, vec!["(print 2.0)", "(print 3.0)"]);
        assert_eq!(
            errors,
            vec![
                "[line 1 Error at '=': Expected variable name.]",
                "[line 3 Error at ';': Expected expression.]",
            ]
        );
    }
}
