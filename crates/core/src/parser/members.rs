use super::{PResult, Parser};
use crate::ast::{
    Annotatable, Annotation, Argument, ConstantDeclaration, DefinedType, Direction, Interface,
    Member, Method, Parcelable, StructuredParcelable, TypeSpecifier, VariableDeclaration,
};
use crate::lexer::Token;
use std::collections::BTreeSet;

/// Annotations written before a method or argument belong to its type.
fn merge_annotations(spec: &mut TypeSpecifier, extra: BTreeSet<Annotation>) {
    if extra.is_empty() {
        return;
    }
    let mut set = spec.annotations().clone();
    set.extend(extra);
    spec.annotate(set);
}

impl<'a, 'r> Parser<'a, 'r> {
    // -- Parcelables --------------------------------------------

    /// `parcelable Name;`, `parcelable Name cpp_header "h";` or
    /// `parcelable Name { fields }`. `start` is the first token of the
    /// declaration, annotations included.
    pub(super) fn parse_parcelable(&mut self, start: usize) -> PResult<DefinedType> {
        self.expect_word("parcelable")?;
        let name = self.parse_qualified_name_with(self.comments_at(start))?;
        match self.peek() {
            Token::Semi => {
                self.advance();
                Ok(DefinedType::Parcelable(Parcelable::new(
                    self.span_from(start),
                    name,
                    self.package.clone(),
                    "",
                )))
            }
            Token::Word(w) if w == "cpp_header" => {
                self.advance();
                let header = match self.peek() {
                    Token::Str(s) => s.trim_matches('"').to_owned(),
                    _ => return Err(self.unexpected("header path")),
                };
                self.advance();
                self.expect(Token::Semi)?;
                Ok(DefinedType::Parcelable(Parcelable::new(
                    self.span_from(start),
                    name,
                    self.package.clone(),
                    header,
                )))
            }
            Token::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !matches!(self.peek(), Token::RBrace | Token::Eof) {
                    match self.parse_field() {
                        Ok(f) => fields.push(f),
                        Err(e) => {
                            self.report(e);
                            self.recover_to_next_member();
                        }
                    }
                }
                self.expect(Token::RBrace)?;
                Ok(DefinedType::StructuredParcelable(StructuredParcelable::new(
                    self.span_from(start),
                    name,
                    self.package.clone(),
                    fields,
                )))
            }
            _ => Err(self.unexpected("';', 'cpp_header' or '{'")),
        }
    }

    /// `type name [= value];`
    fn parse_field(&mut self) -> PResult<VariableDeclaration> {
        let start = self.pos;
        let type_ = self.parse_type()?;
        let name = self.take_ident()?;
        let default_value = if self.peek() == &Token::Assign {
            self.advance();
            Some(self.parse_constant()?)
        } else {
            None
        };
        self.expect(Token::Semi)?;
        Ok(VariableDeclaration::new(
            self.span_from(start),
            type_,
            name,
            default_value,
        ))
    }

    // -- Interfaces ---------------------------------------------

    pub(super) fn parse_interface(&mut self, start: usize, comments: String) -> PResult<DefinedType> {
        let oneway = if self.is_word("oneway") {
            self.advance();
            true
        } else {
            false
        };
        self.expect_word("interface")?;
        let name = self.take_ident()?;
        self.expect(Token::LBrace)?;
        let mut members = Vec::new();
        while !matches!(self.peek(), Token::RBrace | Token::Eof) {
            match self.parse_member() {
                Ok(m) => members.push(m),
                Err(e) => {
                    self.report(e);
                    self.recover_to_next_member();
                }
            }
        }
        self.expect(Token::RBrace)?;
        Ok(DefinedType::Interface(Interface::new(
            self.span_from(start),
            name,
            comments,
            oneway,
            members,
            self.package.clone(),
        )))
    }

    fn parse_member(&mut self) -> PResult<Member> {
        if self.is_word("const") {
            let start = self.pos;
            self.advance();
            let type_ = self.parse_type()?;
            let name = self.take_ident()?;
            self.expect(Token::Assign)?;
            let value = self.parse_constant()?;
            self.expect(Token::Semi)?;
            return Ok(Member::Constant(ConstantDeclaration::new(
                self.span_from(start),
                type_,
                name,
                value,
            )));
        }
        self.parse_method().map(Member::Method)
    }

    /// `[@A]* [oneway] type name(args) [= id];`
    fn parse_method(&mut self) -> PResult<Method> {
        let start = self.pos;
        let comments = self.comments_at(start);
        let annotations = self.parse_annotations()?;
        let oneway = if self.is_word("oneway") {
            self.advance();
            true
        } else {
            false
        };
        let mut return_type = self.parse_type()?;
        merge_annotations(&mut return_type, annotations);
        let name = self.take_ident()?;

        self.expect(Token::LParen)?;
        let mut arguments = Vec::new();
        if self.peek() != &Token::RParen {
            loop {
                arguments.push(self.parse_argument()?);
                if self.peek() == &Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;

        let id = if self.peek() == &Token::Assign {
            self.advance();
            let id = match self.peek() {
                Token::Int(text) => text
                    .parse::<i32>()
                    .map_err(|_| self.err(format!("Found invalid method id '{}'", text)))?,
                _ => return Err(self.unexpected("method id")),
            };
            self.advance();
            Some(id)
        } else {
            None
        };
        self.expect(Token::Semi)?;

        Ok(Method::new(
            self.span_from(start),
            oneway,
            return_type,
            name,
            arguments,
            comments,
            id,
        ))
    }

    /// `[@A]* [in|out|inout] type name`
    fn parse_argument(&mut self) -> PResult<Argument> {
        let start = self.pos;
        let annotations = self.parse_annotations()?;
        let direction = match self.peek() {
            Token::Word(w) if w == "in" => Some(Direction::In),
            Token::Word(w) if w == "out" => Some(Direction::Out),
            Token::Word(w) if w == "inout" => Some(Direction::InOut),
            _ => None,
        };
        if direction.is_some() {
            self.advance();
        }
        let mut type_ = self.parse_type()?;
        merge_annotations(&mut type_, annotations);
        let name = self.take_ident()?;
        let location = self.span_from(start);
        Ok(match direction {
            Some(d) => Argument::new(location, d, type_, name),
            None => Argument::unmarked(location, type_, name),
        })
    }
}
