mod common;

#[cfg(test)]
mod interpreter_tests {
    use super::common::{self, Outcome, SharedBuffer};

    use rox::error::Diagnostics;
    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::Scanner;
    use rox::RunStatus;

    fn run_ok(source: &str) -> Vec<String> {
        let outcome: Outcome = common::run(source);

        assert_eq!(
            outcome.status,
            RunStatus::Completed,
            "unexpected diagnostics: {:?}",
            outcome.errors
        );

        let lines: Vec<String> = outcome.lines().into_iter().map(String::from).collect();

        lines
    }

    fn runtime_error(source: &str) -> Outcome {
        let outcome: Outcome = common::run(source);

        assert_eq!(outcome.status, RunStatus::RuntimeFailed);
        assert_eq!(outcome.status.exit_code(), 70);

        outcome
    }

    // ───────────────────────── expressions ─────────────────────────

    #[test]
    fn test_arithmetic_and_concatenation() {
        assert_eq!(run_ok("print 1 + 2;"), vec!["3"]);
        assert_eq!(run_ok("print \"a\" + \"b\";"), vec!["ab"]);
        assert_eq!(run_ok("print 10 / 4;"), vec!["2.5"]);
        assert_eq!(run_ok("print -(3 * 2) + 1;"), vec!["-5"]);
        assert_eq!(run_ok("print 2 * (3 + 4) - 1;"), vec!["13"]);
    }

    #[test]
    fn test_comparison_and_equality() {
        assert_eq!(
            run_ok("print 1 < 2; print 2 <= 2; print 3 > 4; print 3 >= 4;"),
            vec!["true", "true", "false", "false"]
        );
        assert_eq!(
            run_ok("print 1 == 1; print 1 == \"1\"; print nil == nil; print \"a\" != \"a\";"),
            vec!["true", "false", "true", "false"]
        );
    }

    #[test]
    fn test_truthiness_and_logical_operators() {
        assert_eq!(
            run_ok("print !nil; print !0; print !\"\";"),
            vec!["true", "false", "false"]
        );
        assert_eq!(
            run_ok("print nil or \"x\"; print 1 and 2; print false and undefined;"),
            vec!["x", "2", "false"]
        );
    }

    #[test]
    fn test_ternary_evaluates_one_branch() {
        assert_eq!(run_ok("print true ? 1 : 2;"), vec!["1"]);
        assert_eq!(run_ok("print false ? missing : \"ok\";"), vec!["ok"]);
        assert_eq!(
            run_ok("n := 5; print n > 3 ? n < 10 ? \"mid\" : \"big\" : \"small\";"),
            vec!["mid"]
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(
            run_ok(
                "fun f() {}
                 class A {}
                 print f;
                 print fun () {};
                 print clock;
                 print A;
                 print A();
                 print nil;
                 print 1.0;"
            ),
            vec!["<fn f>", "<fn anonymous>", "<native fn>", "A", "A instance", "nil", "1"]
        );
    }

    #[test]
    fn test_clock_native() {
        assert_eq!(run_ok("print clock() > 0;"), vec!["true"]);
    }

    // ───────────────────────── statements ──────────────────────────

    #[test]
    fn test_variables_and_scopes() {
        assert_eq!(
            run_ok(
                "var a = 1;
                 b := 2;
                 {
                   var a = 10;
                   b = a + b;
                   print a;
                 }
                 print a;
                 print b;"
            ),
            vec!["10", "1", "12"]
        );
    }

    #[test]
    fn test_keywords_ignore_case() {
        assert_eq!(run_ok("VAR x = TRUE; PRINT x; If (x) Print \"yes\";"), vec!["true", "yes"]);
    }

    #[test]
    fn test_block_comment() {
        assert_eq!(run_ok("print 2 /* a * b */ * 3;"), vec!["6"]);
        assert_eq!(run_ok("/* one\ntwo */ print 1;"), vec!["1"]);
    }

    #[test]
    fn test_loop_control_sum() {
        let source = "
            sum := 0;
            odd := false;
            for (i := 1; i <= 10; i = i + 1) {
              odd = !odd;
              if (!odd) continue;
              sum = sum + i;
              if (sum > 20) break;
            }
            print sum;";

        assert_eq!(run_ok(source), vec!["25"]);
    }

    #[test]
    fn test_continue_in_while() {
        assert_eq!(
            run_ok(
                "i := 0;
                 while (i < 5) {
                   i = i + 1;
                   if (i == 3) continue;
                   print i;
                 }"
            ),
            vec!["1", "2", "4", "5"]
        );
    }

    #[test]
    fn test_break_leaves_innermost_loop_only() {
        assert_eq!(
            run_ok(
                "for (var i = 0; i < 2; i = i + 1) {
                   while (true) { break; }
                   print i;
                 }"
            ),
            vec!["0", "1"]
        );
    }

    // ───────────────────────── functions ───────────────────────────

    #[test]
    fn test_counter_closure() {
        assert_eq!(
            run_ok(
                "fun makeCounter() {
                   var i = 0;
                   fun count() { i = i + 1; print i; }
                   return count;
                 }
                 var counter = makeCounter();
                 counter();
                 counter();"
            ),
            vec!["1", "2"]
        );
    }

    #[test]
    fn test_recursion_and_return() {
        assert_eq!(
            run_ok(
                "fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
                 print fib(10);"
            ),
            vec!["55"]
        );
        assert_eq!(
            run_ok("fun f() { while (true) { return \"out\"; } } print f();"),
            vec!["out"]
        );
        assert_eq!(run_ok("fun g() {} print g();"), vec!["nil"]);
    }

    #[test]
    fn test_eight_arguments() {
        assert_eq!(
            run_ok(
                "fun f(a, b, c, d, e, g, h, i) { return a + b + c + d + e + g + h + i; }
                 print f(1, 2, 3, 4, 5, 6, 7, 8);"
            ),
            vec!["36"]
        );
    }

    #[test]
    fn test_deep_recursion_terminates() {
        assert_eq!(
            run_ok(
                "fun down(n) { if (n == 0) return \"done\"; return down(n - 1); }
                 print down(500);
                 print down(1000);"
            ),
            vec!["done", "done"]
        );
    }

    #[test]
    fn test_unbounded_recursion_is_a_runtime_error() {
        let outcome = runtime_error("fun f(n) { return f(n + 1); }\nf(0);\nprint \"after\";");

        assert_eq!(outcome.errors, vec!["[line 1 Error: Stack overflow.]"]);
        assert_eq!(outcome.lines(), vec!["after"]);
    }

    #[test]
    fn test_lambdas() {
        assert_eq!(
            run_ok(
                "fun apply(f, x) { return f(x); }
                 print apply(fun (n) { return n * 2; }, 21);"
            ),
            vec!["42"]
        );
    }

    // ───────────────────────── classes ─────────────────────────────

    #[test]
    fn test_fields_methods_and_initializer() {
        assert_eq!(
            run_ok(
                "class Point {
                   init(x, y) { this.x = x; this.y = y; }
                   sum() { return this.x + this.y; }
                 }
                 var p = Point(1, 2);
                 print p.sum();
                 p.x = 10;
                 var m = p.sum;
                 print m();
                 print p.init(5, 5).x;"
            ),
            vec!["3", "12", "5"]
        );
    }

    #[test]
    fn test_fields_shadow_methods() {
        assert_eq!(
            run_ok(
                "class A { m() { return \"method\"; } }
                 var a = A();
                 a.m = \"field\";
                 print a.m;"
            ),
            vec!["field"]
        );
    }

    #[test]
    fn test_super_call() {
        assert_eq!(
            run_ok(
                "class A { hello() { return \"A\"; } }
                 class B < A { hello() { return super.hello() + \"B\"; } }
                 print B().hello();"
            ),
            vec!["AB"]
        );
    }

    #[test]
    fn test_inherited_initializer() {
        assert_eq!(
            run_ok(
                "class A { init(n) { this.n = n; } }
                 class B < A {}
                 print B(7).n;"
            ),
            vec!["7"]
        );
    }

    #[test]
    fn test_static_members() {
        assert_eq!(
            run_ok(
                "class Math {
                   static square(n) { return n * n; }
                   static name() { return this; }
                 }
                 print Math.square(3);
                 print Math.name();
                 Math.pi = 3;
                 print Math.pi;"
            ),
            vec!["9", "Math", "3"]
        );

        let outcome = runtime_error(
            "class Math { static square(n) { return n * n; } }
             class Sub < Math {}
             print Sub.square(2);",
        );
        assert_eq!(outcome.errors, vec!["[line 3 Error: Undefined property 'square'.]"]);
    }

    // ───────────────────────── runtime errors ──────────────────────

    #[test]
    fn test_division_by_zero() {
        let outcome = runtime_error("print 1 / 0;");

        assert!(outcome.stdout.is_empty());
        assert_eq!(outcome.errors, vec!["[line 1 Error: Division by zero.]"]);
    }

    #[test]
    fn test_undefined_variable() {
        let outcome = runtime_error("print x;");

        assert!(outcome.stdout.is_empty());
        assert_eq!(outcome.errors, vec!["[line 1 Error: Undefined variable 'x'.]"]);

        let outcome = runtime_error("y = 1;");
        assert_eq!(outcome.errors, vec!["[line 1 Error: Undefined variable 'y'.]"]);
    }

    #[test]
    fn test_arity_mismatch() {
        let outcome = runtime_error("fun f(a) {}\nf(1, 2);");

        assert_eq!(
            outcome.errors,
            vec!["[line 2 Error: Expected 1 arguments but got 2.]"]
        );
    }

    #[test]
    fn test_type_errors() {
        let cases = [
            ("print -\"a\";", "Operand must be a number."),
            ("print 1 < \"a\";", "Operands must be numbers."),
            ("print 1 + nil;", "Operands must be two numbers or two strings."),
            ("\"x\"();", "Can only call functions and classes."),
            ("var n = 1; print n.x;", "Only instances have properties."),
            ("var n = 1; n.x = 2;", "Only instances have fields."),
            ("class A {} print A().nope;", "Undefined property 'nope'."),
            ("var A = 1; class B < A {}", "Superclass must be a class."),
        ];

        for (source, message) in cases {
            let outcome = runtime_error(source);

            assert_eq!(
                outcome.errors,
                vec![format!("[line 1 Error: {}]", message)],
                "source: {}",
                source
            );
        }
    }

    #[test]
    fn test_runtime_error_aborts_only_its_statement() {
        let outcome = runtime_error("print 1;\nprint nope;\nprint 3;");

        assert_eq!(outcome.lines(), vec!["1", "3"]);
        assert_eq!(outcome.errors, vec!["[line 2 Error: Undefined variable 'nope'.]"]);
    }

    #[test]
    fn test_failed_initializer_defines_nothing() {
        let outcome = runtime_error("var x = 1 / 0;\nprint x;\nprint \"end\";");

        assert_eq!(
            outcome.errors,
            vec![
                "[line 1 Error: Division by zero.]",
                "[line 2 Error: Undefined variable 'x'.]",
            ]
        );
        assert_eq!(outcome.lines(), vec!["end"]);
    }

    #[test]
    fn test_environment_restored_after_error_in_block() {
        let outcome = runtime_error("var a = \"outer\";\n{ var a = \"inner\"; print 1 / 0; }\nprint a;");

        assert_eq!(outcome.lines(), vec!["outer"]);
    }

    // ───────────────────────── pipeline ────────────────────────────

    #[test]
    fn test_static_errors_prevent_execution() {
        let outcome = common::run("print 1;\nprint ;");

        assert_eq!(outcome.status, RunStatus::StaticFailed);
        assert_eq!(outcome.status.exit_code(), 65);
        assert!(outcome.stdout.is_empty());
        assert_eq!(outcome.errors, vec!["[line 2 Error at ';': Expected expression.]"]);
    }

    #[test]
    fn test_lex_errors_stop_before_parse() {
        let outcome = common::run("print 1; @");

        assert_eq!(outcome.status, RunStatus::LexFailed);
        assert_eq!(outcome.status.exit_code(), 65);
        assert!(outcome.stdout.is_empty());
        assert_eq!(outcome.errors, vec!["[line 1 Error: Unexpected character: @]"]);
    }

    #[test]
    fn test_runs_are_independent() {
        let source = "var a = 1; { var b = a + 1; print b; } print a;";

        let first = common::run(source);
        let second = common::run(source);

        assert_eq!(first.stdout, "2\n1\n");
        assert_eq!(first.stdout, second.stdout);
        assert_eq!(first.errors, second.errors);
        assert_eq!(first.status, second.status);
    }

    #[test]
    fn test_same_statements_resolve_and_run_twice() {
        let source = "var a = 1;
            {
              var b = a + 1;
              fun f() { return b; }
              print f();
            }
            print a;";

        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(&tokens).parse(&mut diagnostics);
        assert!(diagnostics.is_empty());

        let mut outputs = Vec::new();
        for _ in 0..2 {
            let buffer = SharedBuffer::default();
            let mut diagnostics = Diagnostics::new();
            let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));

            Resolver::new(&mut interpreter).resolve(&statements, &mut diagnostics);
            interpreter.interpret(&statements, &mut diagnostics);

            assert!(diagnostics.is_empty(), "{:?}", diagnostics.messages());
            outputs.push(buffer.contents());
        }

        assert_eq!(outputs[0], "2\n1\n");
        assert_eq!(outputs[0], outputs[1]);
    }
}
