/// Strip `/* */` and `//` comments from C#-style source text.
///
/// - Block comments are removed entirely, even when they span lines.
/// - Line comments are replaced by the line terminator that ended them, so
///   the line count of the text is preserved.
/// - Ordinary strings (`"..."`, backslash escapes, single line) and verbatim
///   strings (`@"..."`, `""` for a literal quote) are copied unchanged, and
///   comment markers inside them are not treated as comments.
/// - Empty or whitespace-only input is returned as is.
///
/// Unterminated comments and literals are not errors: the opening character
/// is copied through and scanning carries on from the next one.
pub fn strip_comments(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    // A line comment on the last line still needs a terminator to end it.
    let mut src = String::with_capacity(text.len() + 1);
    src.push_str(text);
    src.push('\n');

    let bytes = src.as_bytes();
    let mut out = String::with_capacity(src.len());
    let mut plain_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(token) = token_at(bytes, pos) else {
            pos += 1;
            continue;
        };

        // Tokens always start on an ASCII byte, so `pos` is a char boundary.
        out.push_str(&src[plain_start..pos]);

        match token {
            Token::BlockComment { end } => pos = end,
            Token::LineComment { terminator, end } => {
                out.push_str(&src[terminator..end]);
                pos = end;
            }
            Token::Literal { end } => {
                out.push_str(&src[pos..end]);
                pos = end;
            }
        }

        plain_start = pos;
    }

    out.push_str(&src[plain_start..]);

    // Drop the terminator added above (or the one a trailing line comment
    // was replaced with).
    out.pop();
    out
}

/// A span recognised by the scanner. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    BlockComment { end: usize },
    /// `terminator..end` is the `\n` or `\r\n` that closed the comment.
    LineComment { terminator: usize, end: usize },
    Literal { end: usize },
}

fn token_at(bytes: &[u8], pos: usize) -> Option<Token> {
    match (bytes[pos], bytes.get(pos + 1)) {
        (b'/', Some(b'*')) => block_comment_end(bytes, pos).map(|end| Token::BlockComment { end }),
        (b'/', Some(b'/')) => Some(line_comment(bytes, pos)),
        (b'"', _) => string_end(bytes, pos).map(|end| Token::Literal { end }),
        (b'@', Some(b'"')) => verbatim_string_end(bytes, pos).map(|end| Token::Literal { end }),
        _ => None,
    }
}

/// Shortest `/* ... */` span starting at `start`, if it is closed at all.
fn block_comment_end(bytes: &[u8], start: usize) -> Option<usize> {
    let body = start + 2;
    bytes[body..]
        .windows(2)
        .position(|w| w == b"*/")
        .map(|offset| body + offset + 2)
}

fn line_comment(bytes: &[u8], start: usize) -> Token {
    let body = start + 2;
    let Some(newline) = bytes[body..].iter().position(|&b| b == b'\n') else {
        let end = bytes.len();
        return Token::LineComment {
            terminator: end,
            end,
        };
    };

    let newline = body + newline;
    let terminator = if newline > body && bytes[newline - 1] == b'\r' {
        newline - 1
    } else {
        newline
    };

    Token::LineComment {
        terminator,
        end: newline + 1,
    }
}

/// End of an ordinary string literal opening at `start`.
///
/// The literal may not cross a newline. If the escape-aware scan runs into
/// one, the literal instead closes on the last escaped quote seen on the
/// line, with its backslash read as a plain character.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut last_escaped_quote = None;
    let mut i = start + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => break,
            b'"' => return Some(i + 1),
            b'\\' => match bytes.get(i + 1) {
                Some(b'\n') | None => i += 1,
                Some(&next) => {
                    if next == b'"' {
                        last_escaped_quote = Some(i + 1);
                    }
                    i += 2;
                }
            },
            _ => i += 1,
        }
    }

    last_escaped_quote.map(|quote| quote + 1)
}

/// End of a verbatim string `@"..."` opening at `start`.
///
/// A doubled quote continues the literal. If a continuation is never
/// closed, the literal ends after the last complete segment.
fn verbatim_string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut end = None;
    let mut i = start + 1;

    while bytes.get(i) == Some(&b'"') {
        let Some(close) = bytes[i + 1..].iter().position(|&b| b == b'"') else {
            break;
        };
        i = i + 1 + close + 1;
        end = Some(i);
    }

    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_returned_unchanged() {
        assert_eq!(strip_comments(""), "");
        assert_eq!(strip_comments("  \r\n\t \n"), "  \r\n\t \n");
    }

    #[test]
    fn text_without_comments_is_untouched() {
        let src = "using System;\n[assembly: AssemblyVersion(\"1.0.0.15\")]";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn block_comments_are_removed_across_lines() {
        let src = "a /* one\ntwo\nthree */b\n/**/c\n";
        assert_eq!(strip_comments(src), "a b\nc\n");
    }

    #[test]
    fn line_comments_keep_their_terminator() {
        let src = "a // one\nb\n// two\r\nc";
        assert_eq!(strip_comments(src), "a \nb\n\r\nc");
    }

    #[test]
    fn line_comment_at_end_of_file_without_newline() {
        assert_eq!(strip_comments("code // trailing"), "code ");
        assert_eq!(strip_comments("code\n// trailing"), "code\n");
    }

    #[test]
    fn comment_markers_inside_strings_are_kept() {
        let src = "var url = \"http://example.com\"; // real comment\n";
        assert_eq!(strip_comments(src), "var url = \"http://example.com\"; \n");

        let src = "var s = \"/* not a comment */\";";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn escaped_quotes_do_not_end_a_string() {
        let src = r#"var s = "say \"//hi\" now"; // gone"#;
        assert_eq!(strip_comments(src), r#"var s = "say \"//hi\" now"; "#);
    }

    #[test]
    fn verbatim_strings_are_kept_with_doubled_quotes() {
        let src = "var p = @\"C:\\temp\\\"\"//x\"\"\n/* y */\"; // z\n";
        assert_eq!(
            strip_comments(src),
            "var p = @\"C:\\temp\\\"\"//x\"\"\n/* y */\"; \n"
        );
    }

    #[test]
    fn strings_do_not_cross_newlines() {
        // The quote on the first line is unterminated, so the comment on the
        // same line is a real comment.
        let src = "x = \"open // c\ny\n";
        assert_eq!(strip_comments(src), "x = \"open \ny\n");
    }

    #[test]
    fn unterminated_escape_closes_on_last_escaped_quote() {
        let src = "s = \"a\\\"b // c\n";
        assert_eq!(strip_comments(src), "s = \"a\\\"b \n");
    }

    #[test]
    fn unterminated_block_comment_is_left_alone() {
        let src = "a /* never closed\nb";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn non_ascii_text_survives() {
        let src = "// commentaire éàü\nvar s = \"héllo\"; /* ñ */ x\n";
        assert_eq!(strip_comments(src), "\nvar s = \"héllo\";  x\n");
    }

    #[test]
    fn stripping_is_idempotent() {
        let samples = [
            "[assembly: AssemblyVersion(\"1.0.0.15\")] // note",
            "/* header */\nusing System;\n// c\r\nvar s = @\"a\"\"b\";\n",
            "x = \"http://example.com\"; /* a */ // b",
            "plain text",
        ];

        for src in samples {
            let once = strip_comments(src);
            assert_eq!(strip_comments(&once), once, "input: {src:?}");
        }
    }
}
