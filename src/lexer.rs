//! Tokenizer for the relative-date token grammar.
//!
//! The lexer is a pull-based cursor over the (trimmed) input: each call to
//! [`Lexer::next_token`] yields exactly one [`Token`], ending with an
//! idempotent [`TokenKind::End`]. It never fails; characters outside the
//! grammar come back as [`TokenKind::Illegal`] and the cursor resumes on the
//! next character, leaving rejection policy to the parser.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// The literal keyword `now`, matched case-sensitively.
    Now,
    Plus,
    Minus,
    Slash,
    At,
    /// A run of ASCII digits.
    Number,
    /// A bare alphanumeric word starting with a letter: unit letters,
    /// weekday codes, quarter codes like `Q1`.
    Modifier,
    /// A single character the grammar does not know.
    Illegal,
    /// End of input.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
}

impl Token {
    fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Token { kind, literal: literal.into() }
    }
}

/// A cursor over one raw token string. Holds no state other than its
/// position; every [`Lexer::next_token`] call is independent.
#[derive(Debug)]
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    raw: String,
}

impl Lexer {
    /// Create a lexer over `input`. Surrounding whitespace is trimmed here;
    /// whitespace is not part of the grammar.
    pub fn new(input: &str) -> Self {
        let raw = input.trim().to_string();
        let chars = raw.chars().collect();
        Lexer { chars, pos: 0, raw }
    }

    /// The trimmed input this lexer scans, kept for error reporting.
    pub fn input(&self) -> &str {
        &self.raw
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Produce the next token and advance. Safe to call past the end; every
    /// call after exhaustion returns [`TokenKind::End`] again.
    pub fn next_token(&mut self) -> Token {
        let Some(ch) = self.peek(0) else {
            return Token::new(TokenKind::End, "");
        };

        match ch {
            '+' => self.single(TokenKind::Plus, ch),
            '-' => self.single(TokenKind::Minus, ch),
            '/' => self.single(TokenKind::Slash, ch),
            '@' => self.single(TokenKind::At, ch),
            'n' => self.read_now(),
            c if c.is_ascii_digit() => self.read_run(TokenKind::Number, |c| c.is_ascii_digit()),
            c if c.is_alphabetic() => self.read_run(TokenKind::Modifier, |c| c.is_alphanumeric()),
            c => self.single(TokenKind::Illegal, c),
        }
    }

    fn single(&mut self, kind: TokenKind, ch: char) -> Token {
        self.pos += 1;
        Token::new(kind, ch.to_string())
    }

    /// Match the exact keyword `now`. On deviation, emit `Illegal` carrying
    /// the offending character only; the run is not swallowed.
    fn read_now(&mut self) -> Token {
        for (offset, expected) in [(1, 'o'), (2, 'w')] {
            match self.peek(offset) {
                Some(c) if c == expected => {}
                Some(c) => {
                    self.pos += offset + 1;
                    return Token::new(TokenKind::Illegal, c.to_string());
                }
                None => {
                    let last = self.peek(offset - 1).unwrap_or('n');
                    self.pos += offset;
                    return Token::new(TokenKind::Illegal, last.to_string());
                }
            }
        }
        self.pos += 3;
        Token::new(TokenKind::Now, "now")
    }

    fn read_run(&mut self, kind: TokenKind, keep: fn(char) -> bool) -> Token {
        let start = self.pos;
        while self.peek(0).is_some_and(keep) {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        Token::new(kind, literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::End;
            out.push((tok.kind, tok.literal));
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn scans_every_token_kind_in_order() {
        let input = "now-1h/h@M+2w/bw+2d/mon-3s-49d/m/tue@Y-wed/Y/Q/Q1/Q2/Q3/Q4";
        let expected: Vec<(TokenKind, &str)> = vec![
            (TokenKind::Now, "now"),
            (TokenKind::Minus, "-"),
            (TokenKind::Number, "1"),
            (TokenKind::Modifier, "h"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "h"),
            (TokenKind::At, "@"),
            (TokenKind::Modifier, "M"),
            (TokenKind::Plus, "+"),
            (TokenKind::Number, "2"),
            (TokenKind::Modifier, "w"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "bw"),
            (TokenKind::Plus, "+"),
            (TokenKind::Number, "2"),
            (TokenKind::Modifier, "d"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "mon"),
            (TokenKind::Minus, "-"),
            (TokenKind::Number, "3"),
            (TokenKind::Modifier, "s"),
            (TokenKind::Minus, "-"),
            (TokenKind::Number, "49"),
            (TokenKind::Modifier, "d"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "m"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "tue"),
            (TokenKind::At, "@"),
            (TokenKind::Modifier, "Y"),
            (TokenKind::Minus, "-"),
            (TokenKind::Modifier, "wed"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "Y"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "Q"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "Q1"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "Q2"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "Q3"),
            (TokenKind::Slash, "/"),
            (TokenKind::Modifier, "Q4"),
            (TokenKind::End, ""),
        ];

        let actual = collect(input);
        assert_eq!(actual.len(), expected.len());
        for ((kind, literal), (exp_kind, exp_literal)) in actual.iter().zip(expected) {
            assert_eq!(*kind, exp_kind);
            assert_eq!(literal, exp_literal);
        }
    }

    #[test]
    fn unknown_character_is_illegal_and_scanning_resumes() {
        let actual = collect("now*2h");
        let expected = vec![
            (TokenKind::Now, "now".to_string()),
            (TokenKind::Illegal, "*".to_string()),
            (TokenKind::Number, "2".to_string()),
            (TokenKind::Modifier, "h".to_string()),
            (TokenKind::End, String::new()),
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn deviation_inside_now_yields_illegal_for_that_character() {
        // "nope": the 'p' breaks the keyword; the rest is scanned normally.
        let actual = collect("nope");
        assert_eq!(actual[0], (TokenKind::Illegal, "p".to_string()));
        assert_eq!(actual[1], (TokenKind::Modifier, "e".to_string()));
    }

    #[test]
    fn truncated_now_is_illegal() {
        let actual = collect("no");
        assert_eq!(actual[0], (TokenKind::Illegal, "o".to_string()));
        assert_eq!(actual[1].0, TokenKind::End);
    }

    #[test]
    fn end_is_idempotent() {
        let mut lexer = Lexer::new("now");
        assert_eq!(lexer.next_token().kind, TokenKind::Now);
        assert_eq!(lexer.next_token().kind, TokenKind::End);
        assert_eq!(lexer.next_token().kind, TokenKind::End);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let mut lexer = Lexer::new("  now/d \n");
        assert_eq!(lexer.input(), "now/d");
        assert_eq!(lexer.next_token().kind, TokenKind::Now);
        assert_eq!(lexer.next_token().kind, TokenKind::Slash);
        assert_eq!(lexer.next_token().literal, "d");
        assert_eq!(lexer.next_token().kind, TokenKind::End);
    }

    #[test]
    fn empty_input_yields_end() {
        let mut lexer = Lexer::new("   ");
        assert_eq!(lexer.next_token().kind, TokenKind::End);
    }

    #[test]
    fn digit_run_is_a_single_number() {
        let actual = collect("now+10d");
        assert_eq!(actual[2], (TokenKind::Number, "10".to_string()));
    }
}
