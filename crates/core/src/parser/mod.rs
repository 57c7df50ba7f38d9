//! Recursive-descent grammar for declaration files.
//!
//! The parser turns the token stream into AST nodes and nothing else: no
//! name lookup happens here. Syntax errors are reported to the
//! [`Reporter`] as they are found and parsing resumes at the next member
//! or declaration boundary, so one run surfaces every error in the file.
use crate::ast::{Annotatable, DefinedType, Import, QualifiedName};
use crate::diagnostics::{Location, Reporter};
use crate::lexer::{Spanned, Token};

mod members;
mod types;

/// Words the grammar reserves; they cannot name anything.
const KEYWORDS: &[&str] = &[
    "package",
    "import",
    "parcelable",
    "interface",
    "oneway",
    "const",
    "in",
    "out",
    "inout",
    "cpp_header",
];

/// Everything the grammar produced for one file.
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub package: Option<QualifiedName>,
    pub imports: Vec<Import>,
    pub defined_types: Vec<DefinedType>,
}

/// A syntax error not yet reported.
#[derive(Debug)]
struct SyntaxError {
    location: Location,
    message: String,
}

type PResult<T> = Result<T, SyntaxError>;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a, 'r> {
    tokens: &'a [Spanned],
    pos: usize,
    filename: String,
    package: Vec<String>,
    reporter: &'r mut Reporter,
}

impl<'a, 'r> Parser<'a, 'r> {
    fn new(tokens: &'a [Spanned], filename: &str, reporter: &'r mut Reporter) -> Self {
        Parser {
            tokens,
            pos: 0,
            filename: filename.to_owned(),
            package: Vec::new(),
            reporter,
        }
    }

    fn cur(&self) -> &'a Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &'a Token {
        &self.cur().token
    }

    fn advance(&mut self) -> &'a Spanned {
        let t = self.cur();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn cur_location(&self) -> Location {
        self.cur().location(&self.filename)
    }

    /// Span from the token at `start` to the last consumed token.
    fn span_from(&self, start: usize) -> Location {
        let first = self.tokens[start.min(self.tokens.len() - 1)].location(&self.filename);
        let last_index = self.pos.saturating_sub(1).max(start);
        let last = self.tokens[last_index.min(self.tokens.len() - 1)].location(&self.filename);
        first.to(&last)
    }

    /// Comments that precede the token at `index`.
    fn comments_at(&self, index: usize) -> String {
        self.tokens[index.min(self.tokens.len() - 1)]
            .comments
            .clone()
    }

    fn err(&self, msg: impl Into<String>) -> SyntaxError {
        SyntaxError {
            location: self.cur_location(),
            message: msg.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        self.err(format!(
            "syntax error: expected {}, got {}",
            expected,
            self.peek()
        ))
    }

    fn expect(&mut self, token: Token) -> PResult<()> {
        if self.peek() == &token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn is_word(&self, w: &str) -> bool {
        matches!(self.peek(), Token::Word(x) if x == w)
    }

    fn expect_word(&mut self, w: &str) -> PResult<()> {
        if self.is_word(w) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", w)))
        }
    }

    /// A word that is not a grammar keyword.
    fn take_ident(&mut self) -> PResult<String> {
        match self.peek() {
            Token::Word(w) if !KEYWORDS.contains(&w.as_str()) => {
                self.advance();
                Ok(w.clone())
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn report(&mut self, e: SyntaxError) {
        self.reporter.error(&e.location, e.message);
    }

    // -- Top level ----------------------------------------------

    fn parse_file(&mut self) -> ParsedFile {
        let mut file = ParsedFile::default();

        if self.is_word("package") {
            match self.parse_package() {
                Ok(name) => {
                    self.package = name.terms().to_vec();
                    file.package = Some(name);
                }
                Err(e) => {
                    self.report(e);
                    self.recover_to_next_declaration();
                }
            }
        }

        while self.peek() != &Token::Eof {
            if self.is_word("import") {
                match self.parse_import() {
                    Ok(i) => file.imports.push(i),
                    Err(e) => {
                        self.report(e);
                        self.recover_to_next_declaration();
                    }
                }
                continue;
            }
            match self.parse_declaration() {
                Ok(t) => file.defined_types.push(t),
                Err(e) => {
                    self.report(e);
                    self.recover_to_next_declaration();
                }
            }
        }
        file
    }

    fn parse_package(&mut self) -> PResult<QualifiedName> {
        self.expect_word("package")?;
        let name = self.parse_qualified_name()?;
        self.expect(Token::Semi)?;
        Ok(name)
    }

    fn parse_import(&mut self) -> PResult<Import> {
        let start = self.pos;
        self.expect_word("import")?;
        let name = self.parse_qualified_name()?;
        self.expect(Token::Semi)?;
        Ok(Import::new(self.span_from(start), name.dot_name()))
    }

    fn parse_declaration(&mut self) -> PResult<DefinedType> {
        let start = self.pos;
        let annotations = self.parse_annotations()?;
        let comments = self.comments_at(start);
        let mut defined = match self.peek() {
            Token::Word(w) if w == "parcelable" => self.parse_parcelable(start)?,
            Token::Word(w) if w == "interface" || w == "oneway" => {
                self.parse_interface(start, comments)?
            }
            _ => return Err(self.unexpected("'parcelable' or 'interface'")),
        };
        defined.annotate(annotations);
        Ok(defined)
    }

    // -- Recovery -----------------------------------------------

    fn is_declaration_start(&self) -> bool {
        match self.peek() {
            Token::At => true,
            Token::Word(w) => matches!(
                w.as_str(),
                "parcelable" | "interface" | "oneway" | "import" | "package"
            ),
            _ => false,
        }
    }

    /// Skip tokens until a closing `}` at the original nesting level (which
    /// is consumed), a `;` at that level, or a declaration keyword at that
    /// level.
    fn recover_to_next_declaration(&mut self) {
        let mut depth: i32 = 0;
        let begin = self.pos;
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                Token::RBrace => {
                    self.advance();
                    if depth <= 1 {
                        break;
                    }
                    depth -= 1;
                }
                Token::Semi if depth == 0 => {
                    self.advance();
                    break;
                }
                _ => {
                    if depth == 0 && self.pos > begin && self.is_declaration_start() {
                        break;
                    }
                    self.advance();
                }
            }
        }
    }

    /// Inside a `{ }` body: skip to just after the next `;` or to the
    /// closing `}` (not consumed) at the body's level.
    fn recover_to_next_member(&mut self) {
        let mut depth: i32 = 0;
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::LBrace | Token::LParen => {
                    depth += 1;
                    self.advance();
                }
                Token::RParen => {
                    depth -= 1;
                    self.advance();
                }
                Token::RBrace => {
                    if depth <= 0 {
                        break;
                    }
                    depth -= 1;
                    self.advance();
                }
                Token::Semi if depth <= 0 => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Parse one file's tokens. Never fails: syntax errors go to `reporter`
/// and whatever could be parsed is returned.
pub fn parse(tokens: &[Spanned], filename: &str, reporter: &mut Reporter) -> ParsedFile {
    if tokens.is_empty() {
        return ParsedFile::default();
    }
    let mut p = Parser::new(tokens, filename, reporter);
    p.parse_file()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
