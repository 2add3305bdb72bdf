pub mod token;

use crate::{
    log::{expected_operator, Code, Error, INVALID_SYNTAX, UNEXPECTED_TOKEN},
    region::Region,
};

use token::{Operator, Token};

pub(crate) type TokenResult = Result<Option<(Token, Region)>, Error>;

/// Provides methods to read expression source text as [`Token`] instances.
pub struct Lexer<'source> {
    /// Reference to the source text.
    pub source: &'source str,
    /// Position within source.
    pub cursor: usize,
}

impl<'source> Lexer<'source> {
    /// Create a new [`Lexer`] over the given source.
    #[inline]
    pub fn new(source: &'source str) -> Self {
        Self { source, cursor: 0 }
    }

    /// Return the next [`Token`] and [`Region`].
    ///
    /// Whitespace between tokens is skipped. Returns `None` at the end of
    /// the source.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unexpected character is found, or a
    /// string literal is left undelimited.
    pub fn next(&mut self) -> TokenResult {
        let cursor = self.cursor;
        let mut iterator = self.source[cursor..]
            .char_indices()
            .map(move |(d, c)| (cursor + d, c));

        let (from, char) = loop {
            match iterator.next() {
                Some((_, c)) if c.is_whitespace() => continue,
                Some(pair) => break pair,
                None => {
                    self.cursor = self.source.len();
                    return Ok(None);
                }
            }
        };

        match char {
            '(' => Ok(Some(self.advance(from, 1, Token::LeftParen))),
            ')' => Ok(Some(self.advance(from, 1, Token::RightParen))),
            '[' => Ok(Some(self.advance(from, 1, Token::LeftBracket))),
            ']' => Ok(Some(self.advance(from, 1, Token::RightBracket))),
            '{' => Ok(Some(self.advance(from, 1, Token::LeftBrace))),
            '}' => Ok(Some(self.advance(from, 1, Token::RightBrace))),
            ',' => Ok(Some(self.advance(from, 1, Token::Comma))),
            ':' => Ok(Some(self.advance(from, 1, Token::Colon))),
            '?' => Ok(Some(self.advance(from, 1, Token::Question))),
            '+' => Ok(Some(self.advance(from, 1, Token::Operator(Operator::Add)))),
            '-' => Ok(Some(self.advance(from, 1, Token::Operator(Operator::Subtract)))),
            '/' => Ok(Some(self.advance(from, 1, Token::Operator(Operator::Divide)))),
            '%' => Ok(Some(self.advance(from, 1, Token::Operator(Operator::Modulo)))),
            '*' => match iterator.next() {
                Some((_, '*')) => Ok(Some(self.advance(from, 2, Token::Operator(Operator::Power)))),
                _ => Ok(Some(self.advance(from, 1, Token::Operator(Operator::Multiply)))),
            },
            '.' => match iterator.next() {
                Some((_, c)) if c.is_ascii_digit() => Ok(Some(self.lex_digit(from))),
                _ => Ok(Some(self.advance(from, 1, Token::Period))),
            },
            '"' | '\'' => self.lex_string(iterator, from, char),
            '=' | '!' | '<' | '>' | '&' | '|' => self.lex_operator(iterator, from, char),
            c if c.is_ascii_digit() => Ok(Some(self.lex_digit(from))),
            c if is_ident_start(c) => Ok(Some(self.lex_ident_or_keyword(iterator, from))),
            c => Err(Error::new(Code::SyntaxError, UNEXPECTED_TOKEN)
                .with_pointer(self.source, from..from + c.len_utf8())
                .with_help(format!(
                    "character `{c}` does not begin any recognized token"
                ))),
        }
    }

    /// Move the cursor past a token of the given byte length and return it.
    fn advance(&mut self, from: usize, length: usize, token: Token) -> (Token, Region) {
        self.cursor = from + length;

        (token, (from..from + length).into())
    }

    /// Return a [`Token`] and [`Region`] based on the previous character.
    ///
    /// Checks the next character via `.next` to ensure the correct `Token`
    /// is returned. All of these are recognized:
    ///
    /// `==`, `!=`, `>=`, `<=`, `||`, `&&`, `!`, `>`, `<`
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a bare `=`, `&` or `|` is found.
    fn lex_operator<T>(&mut self, mut iter: T, from: usize, previous: char) -> TokenResult
    where
        T: Iterator<Item = (usize, char)>,
    {
        let (position, token) = match (previous, iter.next()) {
            // Double:
            ('=', Some((index, '='))) => (index, Token::Operator(Operator::Equal)),
            ('!', Some((index, '='))) => (index, Token::Operator(Operator::NotEqual)),
            ('>', Some((index, '='))) => (index, Token::Operator(Operator::GreaterOrEqual)),
            ('<', Some((index, '='))) => (index, Token::Operator(Operator::LesserOrEqual)),
            ('|', Some((index, '|'))) => (index, Token::Or),
            ('&', Some((index, '&'))) => (index, Token::And),
            // Single:
            ('!', _) => (from, Token::Exclamation),
            ('>', _) => (from, Token::Operator(Operator::Greater)),
            ('<', _) => (from, Token::Operator(Operator::Lesser)),
            (c, _) => {
                return Err(Error::new(Code::SyntaxError, UNEXPECTED_TOKEN)
                    .with_pointer(self.source, from..from + 1)
                    .with_help(expected_operator(c)));
            }
        };
        let position = position + 1;
        self.cursor = position;

        Ok(Some((token, (from..position).into())))
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::Number`].
    ///
    /// Recognizes integer, decimal and exponent forms. A `.` or exponent
    /// marker is only consumed when the characters after it keep the text
    /// a valid number.
    fn lex_digit(&mut self, from: usize) -> (Token, Region) {
        let bytes = self.source.as_bytes();
        let mut to = from;

        while to < bytes.len() && bytes[to].is_ascii_digit() {
            to += 1;
        }
        if to + 1 < bytes.len() && bytes[to] == b'.' && bytes[to + 1].is_ascii_digit() {
            to += 1;
            while to < bytes.len() && bytes[to].is_ascii_digit() {
                to += 1;
            }
        }
        if to < bytes.len() && (bytes[to] == b'e' || bytes[to] == b'E') {
            let mut exponent = to + 1;
            if exponent < bytes.len() && (bytes[exponent] == b'+' || bytes[exponent] == b'-') {
                exponent += 1;
            }
            if exponent < bytes.len() && bytes[exponent].is_ascii_digit() {
                to = exponent;
                while to < bytes.len() && bytes[to].is_ascii_digit() {
                    to += 1;
                }
            }
        }
        self.cursor = to;

        (Token::Number, (from..to).into())
    }

    /// Return a [`Token`] and [`Region`] containing [`Token::String`] using
    /// the given iterator.
    ///
    /// The region includes the quotes. Escape sequences are carried through
    /// raw, the parser resolves them.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the string is left undelimited.
    fn lex_string<T>(&mut self, mut iter: T, from: usize, quote: char) -> TokenResult
    where
        T: Iterator<Item = (usize, char)>,
    {
        while let Some((index, char)) = iter.next() {
            match char {
                '\\' => {
                    iter.next();
                }
                c if c == quote => {
                    let to = index + c.len_utf8();
                    self.cursor = to;

                    return Ok(Some((Token::String, (from..to).into())));
                }
                _ => {}
            }
        }

        Err(Error::new(Code::SyntaxError, INVALID_SYNTAX)
            .with_pointer(self.source, from..from + quote.len_utf8())
            .with_help(format!(
                "this might be an undelimited string, try closing it with `{quote}`"
            )))
    }

    /// Return a [`Token`] and [`Region`] from the given iterator.
    ///
    /// The `Token` will be [`Token::Identifier`], or the matching keyword
    /// token for `true`, `false`, `null` and `in`.
    fn lex_ident_or_keyword<T>(&mut self, mut iter: T, from: usize) -> (Token, Region)
    where
        T: Iterator<Item = (usize, char)>,
    {
        let mut check_keyword = |to: usize| {
            let range_text = self
                .source
                .get(from..to)
                .expect("valid range is required to check keyword");

            let token = match range_text {
                "true" => Token::True,
                "false" => Token::False,
                "null" => Token::Null,
                "in" => Token::In,
                _ => Token::Identifier,
            };
            self.cursor = to;

            (token, (from..to).into())
        };

        loop {
            match iter.next() {
                Some((index, char)) if !is_ident_continue(char) => {
                    break check_keyword(index);
                }
                Some((_, _)) => continue,
                None => break check_keyword(self.source.len()),
            }
        }
    }
}

/// Return true if the given character is a recognized beginning identifier,
/// meaning '_' or an `xid_start`.
fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

/// Return true if the given character is a recognized continue identifier,
/// meaning an `xid_continue`.
fn is_ident_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}
