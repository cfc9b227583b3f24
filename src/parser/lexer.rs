//! GCode Lexer
//!
//! Line reading and word extraction.
//! Comments and program delimiters are stripped here; nothing in this
//! module fails on malformed input, it only reports what it saw.

/// One logical line of a program
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// 1-based line number in the original text
    pub number: u32,
    /// The line exactly as written
    pub raw: String,
    /// Command text with comments removed and whitespace trimmed
    pub code: String,
}

/// A letter/number pair like "X10.5" or "G1"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    /// Upper-case letter
    pub letter: char,
    pub value: f64,
}

/// A lexical item of a line
#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    Word(Word),
    /// Text that is not a letter followed by a number (e.g. "QFOO", "#1")
    Unknown(String),
}

/// Iterator over the command-bearing lines of a program text.
///
/// Blank, comment-only and `%` delimiter lines are skipped; line numbers
/// keep counting across them.
#[derive(Debug, Clone)]
pub struct SourceLines<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl Iterator for SourceLines<'_> {
    type Item = SourceLine;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, raw) in self.lines.by_ref() {
            let code = strip_comments(raw);
            if code.is_empty() {
                continue;
            }
            return Some(SourceLine {
                number: (idx + 1) as u32,
                raw: raw.to_string(),
                code,
            });
        }
        None
    }
}

/// Split program text into logical lines
pub fn read_lines(text: &str) -> SourceLines<'_> {
    SourceLines {
        lines: text.lines().enumerate(),
    }
}

/// Remove `(...)` and `;` comments and `%` delimiter lines
pub fn strip_comments(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('%') {
        return String::new();
    }

    let mut code = String::with_capacity(trimmed.len());
    let mut in_comment = false;

    for ch in trimmed.chars() {
        if in_comment {
            if ch == ')' {
                in_comment = false;
            }
            continue;
        }
        match ch {
            '(' => {
                // Keep words on either side of the comment apart
                in_comment = true;
                code.push(' ');
            }
            ';' => break,
            _ => code.push(ch),
        }
    }

    code.trim().to_string()
}

/// Tokenize comment-free command text into words
///
/// Spaces between words are optional (`G1X10Y20`). A letter that is not
/// followed by a number swallows the letters right after it and becomes
/// a single [`Lexeme::Unknown`].
pub fn tokenize_line(code: &str) -> Vec<Lexeme> {
    let bytes = code.as_bytes();
    let mut lexemes = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];

        if b.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if b.is_ascii_alphabetic() {
            let letter = (b as char).to_ascii_uppercase();
            if let Some((value, len)) = scan_number(&bytes[pos + 1..]) {
                lexemes.push(Lexeme::Word(Word { letter, value }));
                pos += 1 + len;
            } else {
                let end = run_end(bytes, pos + 1, |b| b.is_ascii_alphabetic());
                lexemes.push(Lexeme::Unknown(code[pos..end].to_ascii_uppercase()));
                pos = end;
            }
            continue;
        }

        // Stray characters up to the next word or space
        let end = run_end(bytes, pos + 1, |b| {
            !b.is_ascii_whitespace() && !b.is_ascii_alphabetic()
        });
        lexemes.push(Lexeme::Unknown(code[pos..end].to_string()));
        pos = end;
    }

    lexemes
}

fn run_end(bytes: &[u8], from: usize, keep: impl Fn(u8) -> bool) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| !keep(b))
        .map_or(bytes.len(), |n| from + n)
}

/// Scan `[+-]digits[.digits]` at the start of `bytes`, returning the value
/// and the number of bytes consumed. No exponent form.
fn scan_number(bytes: &[u8]) -> Option<(f64, usize)> {
    let mut len = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        len += 1;
    }

    let int_digits = count_digits(&bytes[len..]);
    len += int_digits;

    let mut frac_digits = 0;
    if bytes.get(len) == Some(&b'.') {
        frac_digits = count_digits(&bytes[len + 1..]);
        len += 1 + frac_digits;
    }

    if int_digits + frac_digits == 0 {
        return None;
    }

    let text = std::str::from_utf8(&bytes[..len]).ok()?;
    text.parse::<f64>().ok().map(|value| (value, len))
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(letter: char, value: f64) -> Lexeme {
        Lexeme::Word(Word { letter, value })
    }

    #[test]
    fn test_tokenize_simple_command() {
        let lexemes = tokenize_line("G1 X10 Y20");

        assert_eq!(
            lexemes,
            vec![word('G', 1.0), word('X', 10.0), word('Y', 20.0)]
        );
    }

    #[test]
    fn test_tokenize_without_spaces() {
        let lexemes = tokenize_line("g1x10.5y-2.3z+1.0f800");

        assert_eq!(
            lexemes,
            vec![
                word('G', 1.0),
                word('X', 10.5),
                word('Y', -2.3),
                word('Z', 1.0),
                word('F', 800.0),
            ]
        );
    }

    #[test]
    fn test_decimal_forms() {
        assert_eq!(tokenize_line("X.5"), vec![word('X', 0.5)]);
        assert_eq!(tokenize_line("X-.5"), vec![word('X', -0.5)]);
        assert_eq!(tokenize_line("X10."), vec![word('X', 10.0)]);
        assert_eq!(tokenize_line("G00"), vec![word('G', 0.0)]);
        assert_eq!(tokenize_line("G38.2"), vec![word('G', 38.2)]);
    }

    #[test]
    fn test_letter_without_number_is_unknown() {
        let lexemes = tokenize_line("G1 X10 Qfoo");

        assert_eq!(lexemes.len(), 3);
        assert_eq!(lexemes[1], word('X', 10.0));
        assert_eq!(lexemes[2], Lexeme::Unknown("QFOO".to_string()));
    }

    #[test]
    fn test_sign_without_digits_is_unknown() {
        let lexemes = tokenize_line("X- Y5");

        assert_eq!(lexemes[0], Lexeme::Unknown("X".to_string()));
        assert_eq!(lexemes[1], Lexeme::Unknown("-".to_string()));
        assert_eq!(lexemes[2], word('Y', 5.0));
    }

    #[test]
    fn test_stray_characters() {
        let lexemes = tokenize_line("#100=5 G0");

        assert_eq!(lexemes[0], Lexeme::Unknown("#100=5".to_string()));
        assert_eq!(lexemes[1], word('G', 0.0));
    }

    #[test]
    fn test_repeated_letters_keep_order() {
        let lexemes = tokenize_line("G21 G90 G17");

        assert_eq!(
            lexemes,
            vec![word('G', 21.0), word('G', 90.0), word('G', 17.0)]
        );
    }

    #[test]
    fn test_strip_paren_comment() {
        assert_eq!(strip_comments("G1 (rapid move) X10"), "G1   X10");
        assert_eq!(strip_comments("(only a comment)"), "");
        assert_eq!(strip_comments("X1(note)0"), "X1 0");
        assert_eq!(strip_comments("  G0 X1 (unterminated"), "G0 X1");
    }

    #[test]
    fn test_strip_semicolon_comment() {
        assert_eq!(strip_comments("G1 X10 ; move to X10"), "G1 X10");
        assert_eq!(strip_comments("; header"), "");
    }

    #[test]
    fn test_comments_do_not_nest() {
        // The first ')' closes the comment
        assert_eq!(strip_comments("(a (b) c) X1"), "c) X1");
    }

    #[test]
    fn test_percent_lines_dropped() {
        assert_eq!(strip_comments("%"), "");
        assert_eq!(strip_comments("  %O1000"), "");
    }

    #[test]
    fn test_read_lines_preserves_numbers() {
        let text = "%\n(header)\n\nG21\n  \nG0 X1 ; go\n%";
        let lines: Vec<_> = read_lines(text).collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 4);
        assert_eq!(lines[0].code, "G21");
        assert_eq!(lines[1].number, 6);
        assert_eq!(lines[1].code, "G0 X1");
        assert_eq!(lines[1].raw, "G0 X1 ; go");
    }

    #[test]
    fn test_read_lines_crlf() {
        let lines: Vec<_> = read_lines("G21\r\nG90\r\n").collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].code, "G90");
    }

    #[test]
    fn test_tokenize_empty_line() {
        assert!(tokenize_line("   ").is_empty());
    }
}
