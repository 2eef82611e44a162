#[cfg(test)]
mod scanner_tests {
    use rox::error::{Diagnostics, LoxError};
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn assert_token_matches(
        result: &Result<Token, LoxError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.token_type, expected_type,
                    "Expected token type {:?}, got {:?}",
                    expected_type, token.token_type
                );
                assert_eq!(
                    token.lexeme, expected_lexeme,
                    "Expected lexeme '{}', got '{}'",
                    expected_lexeme, token.lexeme
                );
            }
            Err(e) => panic!("Expected token but got error: {}", e),
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= : := ?",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::COLON, ":"),
                (TokenType::COLON_EQUAL, ":="),
                (TokenType::QUESTION, "?"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_are_case_insensitive() {
        assert_token_sequence(
            "WHILE While while whilst",
            &[
                (TokenType::WHILE, "WHILE"),
                (TokenType::WHILE, "While"),
                (TokenType::WHILE, "while"),
                (TokenType::IDENTIFIER, "whilst"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_literals() {
        let tokens: Vec<Token> = Scanner::new("12 3.5 \"hi there\" 7.")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token_type, TokenType::NUMBER(0.0));
        assert_eq!(tokens[0].to_string(), "NUMBER 12 12.0");
        assert_eq!(tokens[1].to_string(), "NUMBER 3.5 3.5");
        assert_eq!(tokens[2].to_string(), "STRING \"hi there\" hi there");

        // A trailing dot is not part of the number.
        assert_eq!(tokens[3].lexeme, "7");
        assert_eq!(tokens[4].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_05_comments_and_lines() {
        let source = "// line comment\nvar /* a * b\n spans */ x;\n";
        let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();

        assert_token_matches(&Ok(tokens[0].clone()), TokenType::VAR, "var");
        assert_eq!(tokens[0].line, 2);
        assert_token_matches(&Ok(tokens[1].clone()), TokenType::IDENTIFIER, "x");
        assert_eq!(tokens[1].line, 3);
        assert_eq!(tokens[2].token_type, TokenType::SEMICOLON);
        assert_eq!(tokens[3].token_type, TokenType::EOF);
        assert_eq!(tokens[3].line, 4);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source).collect();

        // 0: COMMA, 1: DOT, 2: error for '$', 3: LEFT_PAREN, 4: error for '#', 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1 Error: Unexpected character: $]",
                "[line 1 Error: Unexpected character: #]",
            ]
        );
    }

    #[test]
    fn test_unterminated_string_and_comment() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("\"open\n").scan_tokens(&mut diagnostics);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
        assert_eq!(
            diagnostics.messages(),
            vec!["[line 2 Error: Unterminated string.]"]
        );

        let mut diagnostics = Diagnostics::new();
        Scanner::new("1 /* never\nclosed").scan_tokens(&mut diagnostics);

        assert!(diagnostics.had_lex_error());
        assert_eq!(
            diagnostics.messages(),
            vec!["[line 2 Error: Unterminated block comment.]"]
        );
    }

    #[test]
    fn test_exactly_one_eof() {
        let mut scanner = Scanner::new("");

        assert!(matches!(scanner.next(), Some(Ok(ref t)) if t.token_type == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_token_json() {
        let token = Scanner::new("foo").next().unwrap().unwrap();
        let json = serde_json::to_value(&token).unwrap();

        assert_eq!(json["lexeme"], "foo");
        assert_eq!(json["line"], 1);
    }
}
