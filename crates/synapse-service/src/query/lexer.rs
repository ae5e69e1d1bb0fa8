//! Tokenizer for the query language.
//!
//! A single forward pass over the input. Each call to [`Lexer::next_token`]
//! starts in the normal state and either finishes a token, moves into the
//! quoted-string or numeric state, or stops with a lexical error. Positions
//! are 1-based and counted in characters.

use super::ParseError;
use super::statement::Comparator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    And,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    Offset,
    Null,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Self> {
        const KEYWORDS: [(&str, Keyword); 11] = [
            ("select", Keyword::Select),
            ("from", Keyword::From),
            ("where", Keyword::Where),
            ("and", Keyword::And),
            ("order", Keyword::Order),
            ("by", Keyword::By),
            ("asc", Keyword::Asc),
            ("desc", Keyword::Desc),
            ("limit", Keyword::Limit),
            ("offset", Keyword::Offset),
            ("null", Keyword::Null),
        ];
        KEYWORDS
            .iter()
            .find(|(text, _)| word.eq_ignore_ascii_case(text))
            .map(|(_, kw)| *kw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::From => "from",
            Self::Where => "where",
            Self::And => "and",
            Self::Order => "order",
            Self::By => "by",
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::Limit => "limit",
            Self::Offset => "offset",
            Self::Null => "null",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier(String),
    /// Contents of a single- or double-quoted literal, escapes resolved.
    Quoted(String),
    Integer(i64),
    Comparator(Comparator),
    Star,
    Comma,
    Dot,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, as written.
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// How the token is quoted in syntax error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "<EOF>".to_owned(),
            _ => format!("\"{}\"", escape(&self.text)),
        }
    }
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn lexical_error(&self, after: &str) -> ParseError {
        let encountered = match self.peek() {
            Some(c) => format!("\"{}\"", escape(&c.to_string())),
            None => "<EOF>".to_owned(),
        };
        ParseError::Lexical {
            line: self.line,
            column: self.column,
            encountered,
            after: escape(after),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }

        let (line, column, start) = (self.line, self.column, self.pos);
        let token = |kind: TokenKind, end: usize, src: &str| Token {
            kind,
            text: src[start..end].to_owned(),
            line,
            column,
        };

        let Some(c) = self.peek() else {
            return Ok(token(TokenKind::Eof, start, self.src));
        };

        let kind = match c {
            '*' => {
                self.bump();
                TokenKind::Star
            }
            ',' => {
                self.bump();
                TokenKind::Comma
            }
            '.' => {
                self.bump();
                TokenKind::Dot
            }
            '"' | '\'' => self.quoted(c)?,
            '-' | '0'..='9' => self.numeric(line, column)?,
            '=' | '!' | '<' | '>' => self.comparator(c)?,
            c if c.is_alphabetic() || c == '_' => {
                while self
                    .peek()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_')
                {
                    self.bump();
                }
                let word = &self.src[start..self.pos];
                match Keyword::lookup(word) {
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Identifier(word.to_owned()),
                }
            }
            _ => return Err(self.lexical_error("")),
        };

        Ok(token(kind, self.pos, self.src))
    }

    /// In-quoted-string state: runs until the matching quote.
    fn quoted(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.lexical_error(&self.src[start..])),
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some(escaped) => value.push(escaped),
                        None => return Err(self.lexical_error(&self.src[start..])),
                    }
                }
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(TokenKind::Quoted(value));
                }
                Some(c) => {
                    self.bump();
                    value.push(c);
                }
            }
        }
    }

    /// In-numeric-token state: an optional sign followed by digits.
    fn numeric(&mut self, line: usize, column: usize) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.lexical_error("-"));
            }
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        text.parse::<i64>()
            .map(TokenKind::Integer)
            .map_err(|_| ParseError::NumberOutOfRange {
                line,
                column,
                text: text.to_owned(),
            })
    }

    fn comparator(&mut self, first: char) -> Result<TokenKind, ParseError> {
        self.bump();
        let followed_by_eq = self.peek() == Some('=');
        let cmp = match (first, followed_by_eq) {
            ('=', true) => Comparator::Equals,
            ('!', true) => Comparator::NotEquals,
            ('>', true) => Comparator::GreaterThanOrEquals,
            ('<', true) => Comparator::LessThanOrEquals,
            ('>', false) => return Ok(TokenKind::Comparator(Comparator::GreaterThan)),
            ('<', false) => return Ok(TokenKind::Comparator(Comparator::LessThan)),
            _ => return Err(self.lexical_error(&first.to_string())),
        };
        self.bump();
        Ok(TokenKind::Comparator(cmp))
    }
}

/// Escapes quotes, backslashes and control characters for error messages.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            if tok.kind == TokenKind::Eof {
                return out;
            }
            out.push(tok.kind);
        }
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("SELECT * From dataset"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Star,
                TokenKind::Keyword(Keyword::From),
                TokenKind::Identifier("dataset".into()),
            ]
        );
    }

    #[test]
    fn comparators() {
        assert_eq!(
            kinds("== != > < >= <="),
            vec![
                TokenKind::Comparator(Comparator::Equals),
                TokenKind::Comparator(Comparator::NotEquals),
                TokenKind::Comparator(Comparator::GreaterThan),
                TokenKind::Comparator(Comparator::LessThan),
                TokenKind::Comparator(Comparator::GreaterThanOrEquals),
                TokenKind::Comparator(Comparator::LessThanOrEquals),
            ]
        );
    }

    #[test]
    fn quoted_strings_keep_contents() {
        assert_eq!(
            kinds(r#"'4494' "Value String" "say \"hi\"""#),
            vec![
                TokenKind::Quoted("4494".into()),
                TokenKind::Quoted("Value String".into()),
                TokenKind::Quoted("say \"hi\"".into()),
            ]
        );
    }

    #[test]
    fn integers_including_negative() {
        assert_eq!(
            kinds("100 -7 0"),
            vec![
                TokenKind::Integer(100),
                TokenKind::Integer(-7),
                TokenKind::Integer(0),
            ]
        );
    }

    #[test]
    fn qualified_names_split_on_dot() {
        assert_eq!(
            kinds("dataset.Number_of_Samples"),
            vec![
                TokenKind::Identifier("dataset".into()),
                TokenKind::Dot,
                TokenKind::Identifier("Number_of_Samples".into()),
            ]
        );
    }

    #[test]
    fn positions_are_one_based_and_track_lines() {
        let mut lexer = Lexer::new("select\n  *");
        let select = lexer.next_token().unwrap();
        assert_eq!((select.line, select.column), (1, 1));
        let star = lexer.next_token().unwrap();
        assert_eq!((star.line, star.column), (2, 3));
        let eof = lexer.next_token().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
    }

    #[test]
    fn unterminated_string_reports_eof_position() {
        let mut lexer = Lexer::new("type == \"C");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Lexical error at line 1, column 11. Encountered: <EOF> after : "\"C""#
        );
    }

    #[test]
    fn stray_character_is_a_lexical_error() {
        let mut lexer = Lexer::new("#");
        let err = lexer.next_token().unwrap_err();
        assert_eq!(
            err.to_string(),
            r##"Lexical error at line 1, column 1. Encountered: "#" after : """##
        );
    }

    #[test]
    fn single_equals_is_rejected() {
        let mut lexer = Lexer::new("= 1");
        let err = lexer.next_token().unwrap_err();
        assert_eq!((err.line(), err.column()), (1, 2));
    }

    #[test]
    fn oversized_integer_is_rejected() {
        let mut lexer = Lexer::new("99999999999999999999");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, ParseError::NumberOutOfRange { .. }));
    }
}
