#[cfg(test)]
mod scanner_tests {
    use treelox as lox;

    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
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
            "({*.,+*})?:",
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
                (TokenType::QUESTION_MARK, "?"),
                (TokenType::COLON, ":"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators() {
        assert_token_sequence(
            "! != = == > >= < <= / -",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::SLASH, "/"),
                (TokenType::MINUS, "-"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "var language = nil; while break fun _private x1",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "language"),
                (TokenType::EQUAL, "="),
                (TokenType::NIL, "nil"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::WHILE, "while"),
                (TokenType::BREAK, "break"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "_private"),
                (TokenType::IDENTIFIER, "x1"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_number_literals() {
        let tokens: Vec<Token> = Scanner::new(b"12 12.5 12.")
            .filter_map(Result::ok)
            .collect();

        // A trailing '.' is not part of the number.
        assert_eq!(tokens.len(), 5);

        match &tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 12.0),
            other => panic!("expected NUMBER, got {:?}", other),
        }

        match &tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 12.5),
            other => panic!("expected NUMBER, got {:?}", other),
        }

        match &tokens[2].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 12.0),
            other => panic!("expected NUMBER, got {:?}", other),
        }

        assert_eq!(tokens[3].token_type, TokenType::DOT);
        assert_eq!(tokens[4].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_05_string_literal_spans_newlines() {
        let tokens: Vec<Token> = Scanner::new(b"\"two\nlines\" after")
            .filter_map(Result::ok)
            .collect();

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "two\nlines"),
            other => panic!("expected STRING, got {:?}", other),
        }

        // The newline inside the string counted toward the line number.
        assert_eq!(tokens[1].token_type, TokenType::IDENTIFIER);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_06_line_comment_skipped() {
        assert_token_sequence(
            "1 // the rest is noise + - *\n2",
            &[
                (TokenType::NUMBER(1.0), "1"),
                (TokenType::NUMBER(2.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_07_block_comment_skipped() {
        let tokens: Vec<Token> = Scanner::new(b"1 /* spans\ntwo lines */ 2")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].line, 1);

        // Newlines inside the comment still advance the line counter.
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_08_unterminated_block_comment() {
        let results: Vec<_> = Scanner::new(b"1 /* never closed").collect();

        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("Unterminated block comment."));
    }

    #[test]
    fn test_scanner_09_unterminated_string() {
        let results: Vec<_> = Scanner::new(b"\"oops").collect();

        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string."));
    }

    #[test]
    fn test_scanner_10_unexpected_chars_continue() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source.as_bytes()).collect();

        // Expected sequence: COMMA, DOT, error '$', LEFT_PAREN, error '#', EOF.
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, lox::error::LoxError>,
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
    fn test_scanner_11_token_display() {
        let tokens: Vec<Token> = Scanner::new(b"var x = 1.5;")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].to_string(), "VAR var null");
        assert_eq!(tokens[3].to_string(), "NUMBER 1.5 1.5");
    }

    #[test]
    fn test_scanner_12_scan_error_format() {
        let results: Vec<_> = Scanner::new(b"\n\n@").collect();

        let err = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .next()
            .expect("expected a scan error");

        assert_eq!(err.to_string(), "[line 3] Error: Unexpected character: @");
    }
}
