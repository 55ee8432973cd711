use std::collections::VecDeque;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::iter;

use crate::common::error::{SyntaxCause, SyntaxError};
use crate::line_source::{BufferSource, LineSource};

// Every lexing failure aborts the current parse attempt, so at most one error exists at a time.
type LexResult<A> = Result<A, SyntaxError>;

const STRING_SIGIL: char = '*';
const ESCAPE_SIGIL: char = ':';
const WORD_DELIMITERS: &str = "',*";
const LINE_COMMENT: &str = "whispers";
const COMMENT_OPEN: &str = "nuzzles";
const COMMENT_CLOSE: &str = "teehee";

macro_rules! vocabulary {
    ($name:ident { $($variant:ident => $word:literal,)* }) => {
        #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            pub fn from_word(word: &str) -> Option<Self> {
                match word {
                    $($word => Some($name::$variant),)*
                    _ => None,
                }
            }

            pub fn word(&self) -> &'static str {
                match self {
                    $($name::$variant => $word,)*
                }
            }
        }
    };
}

vocabulary!(Keyword {
    Uv => "uv",
    Wif => "wif",
    And => "and",
    Twoo => "twoo",
    Cwassu => "cwassu",
    UwU => "UwU",
    OwO => "OwO",
    Fwunction => "fwunction",
    Onegaishimasu => "onegaishimasu",
    Ewif => "ewif",
    Ewse => "ewse",
});

vocabulary!(Starter {
    Pwease => "pwease",
    Iffu => "iffu",
});

vocabulary!(Directive {
    Repeat => "repeat",
    Woad => "woad",
    Mwethod => "mwethod",
    Extend => "extend",
    Give => "give",
    Set => "set",
    New => "new",
    Cawl => "cawl",
    Bweak => "bweak",
});

#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    Keyword(Keyword),
    Starter(Starter),
    Directive(Directive),
    Identifier(String),
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Possessive,
    Comma,
    Eof,
}

impl TokenType {
    pub fn identifier<S: Into<String>>(str: S) -> Self { TokenType::Identifier(str.into()) }
    pub fn string<S: Into<String>>(str: S) -> Self { TokenType::String(str.into()) }

    fn classify(word: &str) -> Option<Self> {
        match word {
            "twue" => Some(TokenType::Boolean(true)),
            "fawse" => Some(TokenType::Boolean(false)),
            "nwull" => Some(TokenType::Null),
            _ => Keyword::from_word(word).map(TokenType::Keyword)
                .or_else(|| Starter::from_word(word).map(TokenType::Starter))
                .or_else(|| Directive::from_word(word).map(TokenType::Directive)),
        }
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Keyword(k) => write!(f, "KEYWORD {}", k.word()),
            TokenType::Starter(s) => write!(f, "STATEMENT_STARTER {}", s.word()),
            TokenType::Directive(d) => write!(f, "PWEASE_DIWECTIVE {}", d.word()),
            TokenType::Identifier(name) => write!(f, "IDENTIFIER {}", name),
            TokenType::String(s) => write!(f, "STWING {}", s),
            TokenType::Number(n) => write!(f, "NUMBWER {}", n),
            TokenType::Boolean(b) => write!(f, "BWOOLEAN {}", if *b { "twue" } else { "fawse" }),
            TokenType::Null => write!(f, "NWULL"),
            TokenType::Possessive => write!(f, "POSSESSIVE"),
            TokenType::Comma => write!(f, "COMMA"),
            TokenType::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub line: usize,
    pub r#type: TokenType,
}

impl Token {
    pub fn new(line: usize, r#type: TokenType) -> Self {
        Token { line, r#type }
    }
    pub fn get_type(&self) -> &TokenType { &self.r#type }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.r#type == TokenType::Keyword(keyword)
    }
    pub fn is_directive(&self, directive: Directive) -> bool {
        self.r#type == TokenType::Directive(directive)
    }
}

/// Lexes every token of an in-memory program, end of input excluded.
pub fn tokenize(source: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(BufferSource::from_text(source));
    let mut result = Vec::new();
    loop {
        let token = lexer.next_token()?;
        if token.r#type == TokenType::Eof {
            return Ok(result);
        }
        result.push(token);
    }
}

pub struct Lexer<S: LineSource> {
    source: S,
    queue: VecDeque<Token>,
    nuzzling: bool,
    line: usize,
}

impl<S: LineSource> Lexer<S> {
    pub fn new(source: S) -> Self {
        Lexer { source, queue: VecDeque::new(), nuzzling: false, line: 0 }
    }

    /// Number of the last physical line pulled from the source.
    pub fn current_line(&self) -> usize { self.line }

    /// Once the source is exhausted this keeps returning end of input.
    pub fn next_token(&mut self) -> LexResult<Token> {
        while self.queue.is_empty() {
            self.line += 1;
            self.pull_tokens_from_line()?;
        }
        match self.queue.pop_front() {
            Some(token) if token.r#type == TokenType::Eof => {
                self.queue.push_front(token.clone());
                Ok(token)
            }
            Some(token) => {
                tracing::trace!(line = token.line, token = %token.r#type, "lexed");
                Ok(token)
            }
            None => Ok(Token::new(self.line, TokenType::Eof)),
        }
    }

    fn pull_tokens_from_line(&mut self) -> LexResult<()> {
        if !self.source.has_more() {
            self.source.close();
            self.add_token_type(TokenType::Eof);
            return Ok(());
        }
        let line = self.source.next_line().map_err(|e| SyntaxError {
            line: self.line,
            cause: SyntaxCause::Io(e.to_string()),
        })?;
        let mut rest: &str = &line;
        while !rest.trim().is_empty() {
            rest = self.digest_next_token(rest)?;
        }
        Ok(())
    }

    fn add_token_type(&mut self, tt: TokenType) {
        self.queue.push_back(Token::new(self.line, tt));
    }

    fn error<A>(&self, msg: &str) -> LexResult<A> {
        Err(SyntaxError::malformed(self.line, msg))
    }

    fn digest_next_token<'a>(&mut self, line: &'a str) -> LexResult<&'a str> {
        let txt = line.trim_start();
        if self.nuzzling {
            let word = txt.split_whitespace().next().unwrap_or("");
            if word == COMMENT_CLOSE {
                self.nuzzling = false;
            }
            return Ok(&txt[word.len()..]);
        }
        match txt.chars().next() {
            None => Ok(""),
            Some(STRING_SIGIL) => self.read_string_literal(txt),
            Some('\'') => self.read_possessive(txt),
            Some(',') => {
                self.add_token_type(TokenType::Comma);
                Ok(&txt[1..])
            }
            Some(c) if c.is_ascii_digit() || c == '-' => self.read_number_literal(txt),
            Some(_) => self.read_words(txt),
        }
    }

    fn read_string_literal<'a>(&mut self, txt: &'a str) -> LexResult<&'a str> {
        let mut escaped = false;
        // A single space right after an escape sequence is swallowed.
        let mut just_escaped = false;
        let mut result = String::new();
        for (i, c) in txt.char_indices().skip(1) {
            if escaped {
                let unescaped = match c {
                    ')' => STRING_SIGIL,
                    '3' => '\n',
                    '>' => '\t',
                    '\\' => '\r',
                    _ => return self.error("Unexpwected chawacter in stwing"),
                };
                result.push(unescaped);
                escaped = false;
                just_escaped = true;
                continue;
            }
            if c == ESCAPE_SIGIL {
                escaped = true;
            } else if c == STRING_SIGIL {
                self.add_token_type(TokenType::String(result));
                return Ok(&txt[i + c.len_utf8()..]);
            } else if !just_escaped || c != ' ' {
                result.push(c);
            }
            just_escaped = false;
        }
        self.error("Unterminated stwing")
    }

    fn read_possessive<'a>(&mut self, txt: &'a str) -> LexResult<&'a str> {
        if txt[1..].starts_with('s') {
            self.add_token_type(TokenType::Possessive);
            Ok(&txt[2..])
        } else {
            self.error("Expwected s after '")
        }
    }

    fn read_number_literal<'a>(&mut self, txt: &'a str) -> LexResult<&'a str> {
        let mut has_dot = false;
        for (i, c) in txt.char_indices().chain(iter::once((txt.len(), ' '))) {
            if c.is_ascii_digit() || (c == '-' && i == 0) {
                continue;
            }
            if c == '.' && !has_dot {
                has_dot = true;
                continue;
            }
            if !(c.is_whitespace() || c == ',') {
                return self.error("Unexpwected chawacter in numbwer");
            }
            let text = &txt[..i];
            let number = text.parse::<f64>().map_err(|_| {
                SyntaxError::malformed(self.line, format!("Invawid numbwer {}", text))
            })?;
            self.add_token_type(TokenType::Number(number));
            return Ok(&txt[i..]);
        }
        Ok("")
    }

    // Words accumulate into one multi-word identifier until a reserved word or a delimiter.
    fn read_words<'a>(&mut self, txt: &'a str) -> LexResult<&'a str> {
        let mut words: Vec<&str> = Vec::new();
        let mut start = 0;
        for (i, c) in txt.char_indices().chain(iter::once((txt.len(), ' '))) {
            if !(c.is_whitespace() || WORD_DELIMITERS.contains(c)) {
                continue;
            }
            let word = &txt[start..i];
            start = i + c.len_utf8();
            if word == LINE_COMMENT {
                self.flush_identifier(&mut words);
                return Ok("");
            }
            if word == COMMENT_OPEN {
                self.flush_identifier(&mut words);
                self.nuzzling = true;
                return Ok(&txt[i..]);
            }
            if let Some(tt) = TokenType::classify(word) {
                self.flush_identifier(&mut words);
                self.add_token_type(tt);
                return Ok(&txt[i..]);
            }
            if !word.is_empty() {
                words.push(word);
            }
            if !c.is_whitespace() {
                self.flush_identifier(&mut words);
                return Ok(&txt[i..]);
            }
        }
        self.flush_identifier(&mut words);
        Ok("")
    }

    fn flush_identifier(&mut self, words: &mut Vec<&str>) {
        if !words.is_empty() {
            self.add_token_type(TokenType::Identifier(words.join(" ")));
            words.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    use crate::common::tests::unsafe_tokenize;

    use super::*;

    fn types(program: Vec<&str>) -> Vec<TokenType> {
        unsafe_tokenize(program).into_iter().map(|e| e.r#type).collect()
    }

    fn lex_error(program: &str) -> SyntaxError {
        tokenize(program).unwrap_err()
    }

    #[test]
    fn multi_word_identifier() {
        assert_eq!(
            unsafe_tokenize(vec!["pwease set my fav numbew twoo 5"]),
            vec![
                Token::new(1, TokenType::Starter(Starter::Pwease)),
                Token::new(1, TokenType::Directive(Directive::Set)),
                Token::new(1, TokenType::identifier("my fav numbew")),
                Token::new(1, TokenType::Keyword(Keyword::Twoo)),
                Token::new(1, TokenType::Number(5.0)),
            ],
        )
    }

    #[test]
    fn reserved_words_split_identifiers() {
        assert_eq!(
            types(vec!["cawl is bwiger wif x and y"]),
            vec![
                TokenType::Directive(Directive::Cawl),
                TokenType::identifier("is bwiger"),
                TokenType::Keyword(Keyword::Wif),
                TokenType::identifier("x"),
                TokenType::Keyword(Keyword::And),
                TokenType::identifier("y"),
            ],
        )
    }

    #[test]
    fn literals() {
        assert_eq!(
            types(vec!["twue fawse nwull -2.5, 40"]),
            vec![
                TokenType::Boolean(true),
                TokenType::Boolean(false),
                TokenType::Null,
                TokenType::Number(-2.5),
                TokenType::Comma,
                TokenType::Number(40.0),
            ],
        )
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            types(vec!["*hewwo:3 wowld :)x:) :>:\\*"]),
            vec![TokenType::string("hewwo\nwowld *x*\t\r")],
        )
    }

    #[test]
    fn string_ends_identifier() {
        assert_eq!(
            types(vec!["pwint*hi*"]),
            vec![TokenType::identifier("pwint"), TokenType::string("hi")],
        )
    }

    #[test]
    fn possessive_chain() {
        assert_eq!(
            types(vec!["my cat's favowite toy's name"]),
            vec![
                TokenType::identifier("my cat"),
                TokenType::Possessive,
                TokenType::identifier("favowite toy"),
                TokenType::Possessive,
                TokenType::identifier("name"),
            ],
        )
    }

    #[test]
    fn comments() {
        assert_eq!(
            unsafe_tokenize(vec![
                "pwease whispers nothing to see hewe",
                "set nuzzles a",
                "comment teehee x",
            ]),
            vec![
                Token::new(1, TokenType::Starter(Starter::Pwease)),
                Token::new(2, TokenType::Directive(Directive::Set)),
                Token::new(3, TokenType::identifier("x")),
            ],
        )
    }

    #[test]
    fn identifiers_end_at_line_end() {
        assert_eq!(
            unsafe_tokenize(vec!["a b", "c"]),
            vec![
                Token::new(1, TokenType::identifier("a b")),
                Token::new(2, TokenType::identifier("c")),
            ],
        )
    }

    #[test]
    fn blank_lines_still_count() {
        assert_eq!(
            unsafe_tokenize(vec!["", "   ", "x"]),
            vec![Token::new(3, TokenType::identifier("x"))],
        )
    }

    struct ClosingSource {
        lines: BufferSource,
        closed: Rc<Cell<bool>>,
    }

    impl LineSource for ClosingSource {
        fn has_more(&self) -> bool { self.lines.has_more() }

        fn next_line(&mut self) -> io::Result<String> { self.lines.next_line() }

        fn close(&mut self) {
            self.closed.set(true);
            self.lines.close();
        }
    }

    #[test]
    fn source_is_closed_at_end_of_input() {
        let closed = Rc::new(Cell::new(false));
        let mut lexer = Lexer::new(ClosingSource { lines: BufferSource::from_text("pwease"), closed: closed.clone() });
        assert_eq!(lexer.next_token().unwrap().r#type, TokenType::Starter(Starter::Pwease));
        assert!(!closed.get());
        assert_eq!(lexer.next_token().unwrap().r#type, TokenType::Eof);
        assert!(closed.get());
    }

    #[test]
    fn end_of_input_is_sticky() {
        let mut lexer = Lexer::new(BufferSource::from_text("x"));
        assert_eq!(lexer.next_token().unwrap().r#type, TokenType::identifier("x"));
        assert_eq!(lexer.next_token().unwrap().r#type, TokenType::Eof);
        assert_eq!(lexer.next_token().unwrap().r#type, TokenType::Eof);
    }

    #[test]
    fn lexical_errors() {
        assert_eq!(lex_error("a'b").cause, SyntaxCause::Malformed("Expwected s after '".into()));
        assert_eq!(
            lex_error("x\n5x").cause,
            SyntaxCause::Malformed("Unexpwected chawacter in numbwer".into()),
        );
        assert_eq!(lex_error("x\n5x").line, 2);
        assert_eq!(
            lex_error("*oops:q*").cause,
            SyntaxCause::Malformed("Unexpwected chawacter in stwing".into()),
        );
        assert_eq!(lex_error("*open").cause, SyntaxCause::Malformed("Unterminated stwing".into()));
        assert_eq!(lex_error("1.2.3").cause, SyntaxCause::Malformed("Unexpwected chawacter in numbwer".into()));
        assert_eq!(lex_error("- x").cause, SyntaxCause::Malformed("Invawid numbwer -".into()));
        assert!(!lex_error("- x").is_unexpected_eof());
    }
}
