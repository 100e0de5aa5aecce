#[cfg(test)]
mod scanner_tests {
    use rox as lox;

    use lox::error::LoxError;
    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
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
    fn test_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_token_sequence(
            "class Foo < Bar { init() { this.x = super.y; } } _under score9 orchid",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Foo"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "Bar"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::IDENTIFIER, "init"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::THIS, "this"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::SUPER, "super"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "y"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "score9"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_numbers_keep_trailing_dot_separate() {
        let tokens: Vec<Token> = Scanner::new("12 3.25 7.")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token_type, TokenType::NUMBER(0.0));
        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 12.0));
        assert!(matches!(tokens[1].token_type, TokenType::NUMBER(n) if n == 3.25));
        assert!(matches!(tokens[2].token_type, TokenType::NUMBER(n) if n == 7.0));
        assert_eq!(tokens[2].lexeme, "7");
        assert_eq!(tokens[3].token_type, TokenType::DOT);
        assert_eq!(tokens[4].token_type, TokenType::EOF);
    }

    #[test]
    fn test_comments_and_line_tracking() {
        let source = "// leading comment\nvar a; // trailing\n\n\"multi\nline\" b";
        let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();

        let lines: Vec<(&str, usize)> = tokens
            .iter()
            .map(|t| (t.lexeme.as_str(), t.line))
            .collect();

        assert_eq!(
            lines,
            vec![
                ("var", 2),
                ("a", 2),
                (";", 2),
                ("\"multi\nline\"", 5),
                ("b", 5),
                ("", 5),
            ]
        );

        match &tokens[3].token_type {
            TokenType::STRING(s) => assert_eq!(s, "multi\nline"),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(LoxError::to_string)
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

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
    }

    #[test]
    fn test_non_ascii_outside_string_is_one_error() {
        let results: Vec<_> = Scanner::new("é \"café\"").collect();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap_err().to_string(),
            "[line 1] Error: Unexpected character: é"
        );
        assert!(
            matches!(&results[1], Ok(Token { token_type: TokenType::STRING(s), .. }) if s == "café")
        );
    }

    #[test]
    fn test_unterminated_string_still_reaches_eof() {
        let results: Vec<_> = Scanner::new("print 1;\n\"never closed\n").collect();

        let error = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .expect("an error");
        assert_eq!(error.to_string(), "[line 3] Error: Unterminated string.");

        let last = results.last().unwrap().as_ref().unwrap();
        assert_eq!(last.token_type, TokenType::EOF);
    }

    #[test]
    fn test_token_display() {
        let tokens: Vec<String> = Scanner::new("42 1.5 \"hi\" and")
            .filter_map(Result::ok)
            .map(|t| t.to_string())
            .collect();

        assert_eq!(
            tokens,
            vec![
                "NUMBER 42 42.0",
                "NUMBER 1.5 1.5",
                "STRING \"hi\" hi",
                "AND and null",
                "EOF  null",
            ]
        );
    }
}
