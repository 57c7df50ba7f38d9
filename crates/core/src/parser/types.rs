use super::{PResult, Parser};
use crate::ast::{Annotatable, Annotation, ConstantValue, QualifiedName, TypeSpecifier};
use crate::lexer::Token;
use std::collections::BTreeSet;

impl<'a, 'r> Parser<'a, 'r> {
    // -- Names, annotations, types, literals -------------------

    pub(super) fn parse_qualified_name(&mut self) -> PResult<QualifiedName> {
        let comments = self.comments_at(self.pos);
        self.parse_qualified_name_with(comments)
    }

    /// `a.b.C`, carrying `comments` instead of the ones before its first
    /// term.
    pub(super) fn parse_qualified_name_with(&mut self, comments: String) -> PResult<QualifiedName> {
        let start = self.pos;
        let first = self.take_ident()?;
        let mut terms = vec![first];
        while self.peek() == &Token::Dot {
            self.advance();
            terms.push(self.take_ident()?);
        }
        let location = self.span_from(start);
        let mut rest = terms.into_iter();
        let mut name = QualifiedName::new(location, rest.next().unwrap_or_default(), comments);
        for term in rest {
            name.add_term(term);
        }
        Ok(name)
    }

    /// Zero or more `@name`. Unknown names are reported and dropped;
    /// that is not a syntax error.
    pub(super) fn parse_annotations(&mut self) -> PResult<BTreeSet<Annotation>> {
        let mut set = BTreeSet::new();
        while self.peek() == &Token::At {
            let start = self.pos;
            self.advance();
            let name = match self.peek() {
                Token::Word(w) => w.clone(),
                _ => return Err(self.unexpected("annotation name")),
            };
            self.advance();
            let location = self.span_from(start);
            if let Some(a) = Annotation::parse(&location, &name, self.reporter) {
                set.insert(a);
            }
        }
        Ok(set)
    }

    /// `[@A]* name[<type, ...>][[]]`
    pub(super) fn parse_type(&mut self) -> PResult<TypeSpecifier> {
        let start = self.pos;
        let comments = self.comments_at(start);
        let annotations = self.parse_annotations()?;
        let name = self.parse_qualified_name()?.dot_name();

        let params = if self.peek() == &Token::Lt {
            self.advance();
            let mut params = vec![self.parse_type()?];
            while self.peek() == &Token::Comma {
                self.advance();
                params.push(self.parse_type()?);
            }
            self.expect(Token::Gt)?;
            Some(params)
        } else {
            None
        };

        let is_array = if self.peek() == &Token::LBracket {
            self.advance();
            self.expect(Token::RBracket)?;
            true
        } else {
            false
        };

        let mut spec = TypeSpecifier::new(self.span_from(start), name, is_array, params, comments);
        spec.annotate(annotations);
        Ok(spec)
    }

    /// Integer or string literal. A malformed literal becomes an error
    /// value (already reported), not a syntax error.
    pub(super) fn parse_constant(&mut self) -> PResult<ConstantValue> {
        let location = self.cur_location();
        match self.peek() {
            Token::Int(text) => {
                self.advance();
                if text.starts_with("0x") || text.starts_with("0X") {
                    Ok(ConstantValue::parse_hex(location, text, self.reporter))
                } else {
                    Ok(ConstantValue::parse_int(location, text, self.reporter))
                }
            }
            Token::Str(text) => {
                self.advance();
                Ok(ConstantValue::parse_string(location, text, self.reporter))
            }
            _ => Err(self.unexpected("constant value")),
        }
    }
}
