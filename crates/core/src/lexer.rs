use crate::diagnostics::{Location, Point, Reporter};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords, distinguished in the parser
    Word(String),
    /// Integer literal text as written: decimal, negative or `0x` hex.
    /// Value checks happen when the constant is built.
    Int(String),
    /// String literal text including the quotes, escapes untouched
    Str(String),
    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Comma,
    Semi,
    Assign,
    Dot,
    At,
    // End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "'{}'", w),
            Token::Int(n) => write!(f, "'{}'", n),
            Token::Str(s) => write!(f, "{}", s),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::Lt => f.write_str("'<'"),
            Token::Gt => f.write_str("'>'"),
            Token::Comma => f.write_str("','"),
            Token::Semi => f.write_str("';'"),
            Token::Assign => f.write_str("'='"),
            Token::Dot => f.write_str("'.'"),
            Token::At => f.write_str("'@'"),
            Token::Eof => f.write_str("end of file"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub begin: Point,
    /// One past the last character.
    pub end: Point,
    /// Comment text (delimiters included) between the previous token and
    /// this one.
    pub comments: String,
}

impl Spanned {
    pub fn location(&self, filename: &str) -> Location {
        Location::new(filename, self.begin, self.end)
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek(0) {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn point(&self) -> Point {
        Point::new(self.line, self.column)
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }
}

/// Scan `src` into tokens, always ending with [`Token::Eof`].
///
/// Bad characters are reported and skipped; an unterminated string or
/// block comment is reported and ends the scan.
pub fn lex(src: &str, filename: &str, reporter: &mut Reporter) -> Vec<Spanned> {
    let mut tokens = Vec::new();
    let mut cur = Cursor {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut comments = String::new();

    while let Some(c) = cur.peek(0) {
        let begin = cur.point();

        // Line comment
        if c == '/' && cur.peek(1) == Some('/') {
            let start = cur.pos;
            while cur.peek(0).is_some_and(|c| c != '\n') {
                cur.bump();
            }
            comments.push_str(&cur.text_from(start));
            comments.push('\n');
            continue;
        }

        // Block comment
        if c == '/' && cur.peek(1) == Some('*') {
            let start = cur.pos;
            cur.bump();
            cur.bump();
            loop {
                match (cur.peek(0), cur.peek(1)) {
                    (None, _) => {
                        let here = Location::new(filename, begin, cur.point());
                        reporter.error(&here, "unterminated block comment");
                        return finish(tokens, &cur);
                    }
                    (Some('*'), Some('/')) => {
                        cur.bump();
                        cur.bump();
                        break;
                    }
                    _ => cur.bump(),
                }
            }
            comments.push_str(&cur.text_from(start));
            continue;
        }

        if c.is_whitespace() {
            cur.bump();
            continue;
        }

        let token = if c == '"' {
            let start = cur.pos;
            cur.bump();
            loop {
                match cur.peek(0) {
                    None | Some('\n') => {
                        let here = Location::new(filename, begin, cur.point());
                        reporter.error(&here, "unterminated string literal");
                        return finish(tokens, &cur);
                    }
                    Some('"') => {
                        cur.bump();
                        break;
                    }
                    Some(_) => cur.bump(),
                }
            }
            Token::Str(cur.text_from(start))
        } else if c.is_ascii_digit()
            || (c == '-' && cur.peek(1).is_some_and(|d| d.is_ascii_digit()))
        {
            // digits, a sign, or the hex prefix and digits; malformed
            // literals such as `0xzz` stay one token
            let start = cur.pos;
            cur.bump();
            while cur.peek(0).is_some_and(|c| c.is_ascii_alphanumeric()) {
                cur.bump();
            }
            Token::Int(cur.text_from(start))
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = cur.pos;
            while cur.peek(0).is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                cur.bump();
            }
            Token::Word(cur.text_from(start))
        } else {
            let punct = match c {
                '{' => Some(Token::LBrace),
                '}' => Some(Token::RBrace),
                '(' => Some(Token::LParen),
                ')' => Some(Token::RParen),
                '[' => Some(Token::LBracket),
                ']' => Some(Token::RBracket),
                '<' => Some(Token::Lt),
                '>' => Some(Token::Gt),
                ',' => Some(Token::Comma),
                ';' => Some(Token::Semi),
                '=' => Some(Token::Assign),
                '.' => Some(Token::Dot),
                '@' => Some(Token::At),
                _ => None,
            };
            cur.bump();
            match punct {
                Some(t) => t,
                None => {
                    let here = Location::new(filename, begin, cur.point());
                    reporter.error(&here, format!("unexpected character '{}'", c));
                    continue;
                }
            }
        };

        tokens.push(Spanned {
            token,
            begin,
            end: cur.point(),
            comments: std::mem::take(&mut comments),
        });
    }

    finish(tokens, &cur)
}

fn finish(mut tokens: Vec<Spanned>, cur: &Cursor) -> Vec<Spanned> {
    tokens.push(Spanned {
        token: Token::Eof,
        begin: cur.point(),
        end: cur.point(),
        comments: String::new(),
    });
    tokens
}
