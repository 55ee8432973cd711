use option_ext::OptionExt;

use crate::ast::{Node, NodeKind, TreeBuilder};
use crate::common::error::SyntaxError;
use crate::lexer::{Directive, Keyword, Lexer, Starter, Token, TokenType};
use crate::line_source::LineSource;

type ParserResult<A> = Result<A, SyntaxError>;

/// Where a statement group sits, which decides the directives it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupContext {
    Plain,
    ClassBody,
    Constructor,
}

/// Parses a whole program from a line source.
pub fn parse<S: LineSource>(source: S) -> ParserResult<Node> {
    Parser::new(Lexer::new(source))?.parse_program()
}

pub struct Parser<S: LineSource> {
    tokens: Lexer<S>,
    token: Token,
    tree: TreeBuilder,
}

impl<S: LineSource> Parser<S> {
    pub fn new(mut tokens: Lexer<S>) -> ParserResult<Self> {
        let token = tokens.next_token()?;
        Ok(Parser { tokens, token, tree: TreeBuilder::new(Node::new(NodeKind::File, 1)) })
    }

    pub fn parse_program(mut self) -> ParserResult<Node> {
        self.statement_group(&[], GroupContext::Plain)?;
        let root = self.tree.finish();
        tracing::debug!(statements = root.children.len(), lines = self.tokens.current_line(), "parsed program");
        Ok(root)
    }

    fn advance(&mut self) -> ParserResult<()> {
        self.token = self.tokens.next_token()?;
        Ok(())
    }

    fn line(&self) -> usize { self.token.line }

    fn push(&mut self, kind: NodeKind) {
        let node = Node::new(kind, self.line());
        self.tree.push(node);
    }

    fn shift(&mut self, kind: NodeKind) {
        self.shift_at(kind, self.line());
    }

    fn shift_at(&mut self, kind: NodeKind, line: usize) {
        self.tree.shift(Node::new(kind, line));
    }

    fn pop(&mut self) {
        self.tree.pop();
    }

    fn unexpected<A, E: Into<String>>(&self, expected: E) -> ParserResult<A> {
        Err(SyntaxError::unexpected(self.line(), expected, self.token.r#type.clone()))
    }

    fn keyword(&self) -> Option<Keyword> {
        match self.token.get_type() {
            TokenType::Keyword(k) => Some(*k),
            _ => None,
        }
    }

    fn is_keyword_in(&self, keywords: &[Keyword]) -> bool {
        self.keyword().map(|k| keywords.contains(&k)).unwrap_or(false)
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> ParserResult<()> {
        if self.keyword().contains(&keyword) {
            self.advance()
        } else {
            self.unexpected(keyword.word())
        }
    }

    fn expect_keywords(&self, keywords: &[Keyword]) -> ParserResult<()> {
        if self.is_keyword_in(keywords) {
            Ok(())
        } else {
            self.unexpected(keywords.iter().map(|k| k.word()).collect::<Vec<_>>().join(", "))
        }
    }

    fn identifier(&mut self) -> ParserResult<String> {
        match self.token.get_type() {
            TokenType::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => self.unexpected("IDENTIFIER"),
        }
    }

    fn shift_identifier(&mut self) -> ParserResult<()> {
        let line = self.line();
        let name = self.identifier()?;
        self.shift_at(NodeKind::Identifier(name), line);
        Ok(())
    }

    /// Statements until one of `closers` (or end of input when `closers` is empty). The closer
    /// itself is left for the caller.
    fn statement_group(&mut self, closers: &[Keyword], context: GroupContext) -> ParserResult<()> {
        let mut found_new = false;
        loop {
            let closed = if closers.is_empty() {
                self.token.r#type == TokenType::Eof
            } else {
                self.is_keyword_in(closers)
            };
            if closed {
                return Ok(());
            }
            match self.token.get_type() {
                TokenType::Starter(Starter::Pwease) => {
                    self.advance()?;
                    if self.token.is_directive(Directive::New) {
                        if found_new {
                            return Err(SyntaxError::malformed(self.line(), "Cwassu can onwy have one new statement"));
                        }
                        found_new = true;
                    }
                    self.pwease(context)?;
                }
                TokenType::Starter(Starter::Iffu) if context != GroupContext::ClassBody => self.iffu()?,
                TokenType::Starter(_) => return self.unexpected("pwease"),
                _ if context == GroupContext::ClassBody => return self.unexpected("pwease"),
                _ => return self.unexpected("pwease or iffu"),
            }
        }
    }

    fn pwease(&mut self, context: GroupContext) -> ParserResult<()> {
        let directive = match self.token.get_type() {
            TokenType::Directive(d) => *d,
            _ => return self.unexpected("pwease diwective"),
        };
        match directive {
            Directive::Set => {
                self.push(NodeKind::Set);
                self.advance()?;
                self.identifier_path()?;
                self.consume_keyword(Keyword::Twoo)?;
                self.expression()?;
                self.pop();
            }
            Directive::Cawl => {
                self.push(NodeKind::Call);
                self.advance()?;
                self.identifier_path()?;
                self.expect_keywords(&[Keyword::Wif, Keyword::Uv, Keyword::OwO])?;
                self.expression_list()?;
                self.pop();
            }
            Directive::Give => {
                self.push(NodeKind::Give);
                self.advance()?;
                self.expression()?;
                self.pop();
            }
            Directive::Repeat => {
                self.push(NodeKind::Repeat);
                self.advance()?;
                self.statement_group(&[Keyword::Onegaishimasu], GroupContext::Plain)?;
                self.advance()?;
                self.pop();
            }
            Directive::Bweak => {
                let line = self.line();
                let mut levels = 1;
                self.advance()?;
                while self.token.is_directive(Directive::Bweak) {
                    levels += 1;
                    self.advance()?;
                }
                self.shift_at(NodeKind::Break(levels), line);
            }
            Directive::Mwethod if context == GroupContext::ClassBody => {
                self.push(NodeKind::Method);
                self.advance()?;
                self.shift_identifier()?;
                if self.is_keyword_in(&[Keyword::Wif, Keyword::Uv]) {
                    self.advance()?;
                }
                self.arglist()?;
                self.body(GroupContext::Plain)?;
                self.pop();
            }
            Directive::New if context == GroupContext::ClassBody => {
                self.push(NodeKind::New);
                self.advance()?;
                self.arglist()?;
                self.body(GroupContext::Constructor)?;
                self.pop();
            }
            Directive::Extend if context == GroupContext::Constructor => {
                self.push(NodeKind::Extends);
                self.advance()?;
                self.identifier_path()?;
                self.expression_list()?;
                self.pop();
            }
            Directive::Woad => {
                self.push(NodeKind::Load);
                self.advance()?;
                self.expression()?;
                self.consume_keyword(Keyword::Twoo)?;
                self.identifier_path()?;
                self.pop();
            }
            d => {
                return Err(SyntaxError::malformed(
                    self.line(),
                    format!("Unexpwected pwease diwective {}", d.word()),
                ));
            }
        }
        Ok(())
    }

    /// A block closed by `onegaishimasu`, consuming the closer.
    fn body(&mut self, context: GroupContext) -> ParserResult<()> {
        self.push(NodeKind::Block);
        self.statement_group(&[Keyword::Onegaishimasu], context)?;
        self.pop();
        self.advance()
    }

    fn identifier_path(&mut self) -> ParserResult<()> {
        self.push(NodeKind::IdentifierPath);
        self.shift_identifier()?;
        while self.token.r#type == TokenType::Possessive {
            self.advance()?;
            self.shift_identifier()?;
        }
        self.pop();
        Ok(())
    }

    // `x`, `x and y`, `x, and y`, `x, y, and z`; nothing at all when the body starts right away.
    fn arglist(&mut self) -> ParserResult<()> {
        if matches!(self.token.get_type(), TokenType::Starter(_)) {
            self.shift(NodeKind::ArgList);
            return Ok(());
        }
        self.push(NodeKind::ArgList);
        self.shift_identifier()?;
        if self.token.r#type == TokenType::Comma {
            while self.token.r#type == TokenType::Comma {
                self.advance()?;
                if self.keyword().contains(&Keyword::And) {
                    break;
                }
                self.shift_identifier()?;
            }
            self.consume_keyword(Keyword::And)?;
            self.shift_identifier()?;
        } else if self.keyword().contains(&Keyword::And) {
            self.advance()?;
            self.shift_identifier()?;
        }
        self.pop();
        Ok(())
    }

    // `OwO`, or `wif`/`uv` followed by `x UwU`, `x and y`, `x, and y` or `x, y, and z`.
    fn expression_list(&mut self) -> ParserResult<()> {
        if self.keyword().contains(&Keyword::OwO) {
            self.shift(NodeKind::ExpressionList);
            return self.advance();
        }
        self.expect_keywords(&[Keyword::Wif, Keyword::Uv])?;
        self.advance()?;
        self.push(NodeKind::ExpressionList);
        self.expression()?;
        match self.token.get_type() {
            TokenType::Comma => {
                while self.token.r#type == TokenType::Comma {
                    self.advance()?;
                    if self.keyword().contains(&Keyword::And) {
                        break;
                    }
                    self.expression()?;
                }
                self.consume_keyword(Keyword::And)?;
                self.expression()?;
            }
            TokenType::Keyword(Keyword::And) => {
                self.advance()?;
                self.expression()?;
            }
            TokenType::Keyword(Keyword::UwU) => self.advance()?,
            _ => return self.unexpected("COMMA, and, UwU"),
        }
        self.pop();
        Ok(())
    }

    fn expression(&mut self) -> ParserResult<()> {
        self.push(NodeKind::Expression);
        match self.token.get_type().clone() {
            TokenType::Identifier(_) => {
                self.identifier_path()?;
                if self.is_keyword_in(&[Keyword::Uv, Keyword::Wif, Keyword::OwO]) {
                    self.push(NodeKind::CallArguments);
                    self.expression_list()?;
                    self.pop();
                }
            }
            TokenType::Number(n) => {
                self.shift(NodeKind::Number(n));
                self.advance()?;
            }
            TokenType::String(s) => {
                self.shift(NodeKind::String(s));
                self.advance()?;
            }
            TokenType::Boolean(b) => {
                self.shift(NodeKind::Boolean(b));
                self.advance()?;
            }
            TokenType::Null => {
                self.shift(NodeKind::Null);
                self.advance()?;
            }
            TokenType::Keyword(Keyword::Fwunction) => {
                self.advance()?;
                self.arglist()?;
                self.body(GroupContext::Plain)?;
            }
            TokenType::Keyword(Keyword::Cwassu) => {
                self.advance()?;
                self.push(NodeKind::ClassDef);
                self.statement_group(&[Keyword::Onegaishimasu], GroupContext::ClassBody)?;
                self.advance()?;
                self.pop();
            }
            _ => return self.unexpected("CONST_EXPR"),
        }
        self.pop();
        Ok(())
    }

    fn iffu(&mut self) -> ParserResult<()> {
        const BRANCH_CLOSERS: [Keyword; 3] = [Keyword::Onegaishimasu, Keyword::Ewif, Keyword::Ewse];
        self.push(NodeKind::If);
        self.advance()?;
        self.condition(&BRANCH_CLOSERS)?;
        while self.keyword().contains(&Keyword::Ewif) {
            self.advance()?;
            self.condition(&BRANCH_CLOSERS)?;
        }
        if self.keyword().contains(&Keyword::Ewse) {
            self.advance()?;
            self.push(NodeKind::Block);
            self.statement_group(&[Keyword::Onegaishimasu], GroupContext::Plain)?;
            self.pop();
        }
        self.consume_keyword(Keyword::Onegaishimasu)?;
        self.pop();
        Ok(())
    }

    fn condition(&mut self, closers: &[Keyword]) -> ParserResult<()> {
        self.push(NodeKind::Condition);
        self.expression()?;
        self.push(NodeKind::Block);
        self.statement_group(closers, GroupContext::Plain)?;
        self.pop();
        self.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::common::error::SyntaxCause;
    use crate::common::tests::{parse_error, unsafe_parse};

    use super::*;

    fn expression(inner: Vec<Node>) -> Node { Node::with_children(NodeKind::Expression, 1, inner) }

    fn path(names: &[&str]) -> Node {
        Node::with_children(
            NodeKind::IdentifierPath,
            1,
            names.iter().map(|n| Node::new(NodeKind::Identifier(n.to_string()), 1)).collect(),
        )
    }

    #[test]
    fn set_statement() {
        let root = unsafe_parse(vec!["pwease set my cat's name twoo *Mochi*"]);
        assert_eq!(
            root.children,
            vec![Node::with_children(NodeKind::Set, 1, vec![
                path(&["my cat", "name"]),
                expression(vec![Node::new(NodeKind::String("Mochi".into()), 1)]),
            ])],
        )
    }

    #[test]
    fn call_statement_with_nested_call() {
        let root = unsafe_parse(vec!["pwease cawl pwint wif sum wif 1, 2, and 3 UwU"]);
        assert_eq!(
            root.children,
            vec![Node::with_children(NodeKind::Call, 1, vec![
                path(&["pwint"]),
                Node::with_children(NodeKind::ExpressionList, 1, vec![
                    expression(vec![
                        path(&["sum"]),
                        Node::with_children(NodeKind::CallArguments, 1, vec![
                            Node::with_children(NodeKind::ExpressionList, 1, vec![
                                expression(vec![Node::new(NodeKind::Number(1.0), 1)]),
                                expression(vec![Node::new(NodeKind::Number(2.0), 1)]),
                                expression(vec![Node::new(NodeKind::Number(3.0), 1)]),
                            ]),
                        ]),
                    ]),
                ]),
            ])],
        )
    }

    #[test]
    fn no_argument_call() {
        let root = unsafe_parse(vec!["pwease cawl hewwo OwO"]);
        assert_eq!(
            root.children[0].children[1],
            Node::new(NodeKind::ExpressionList, 1),
        )
    }

    #[test]
    fn function_literal_parameters() {
        for (source, expected) in [
            ("pwease set f twoo fwunction pwease give 1 onegaishimasu", vec![]),
            ("pwease set f twoo fwunction a pwease give 1 onegaishimasu", vec!["a"]),
            ("pwease set f twoo fwunction a and b pwease give 1 onegaishimasu", vec!["a", "b"]),
            ("pwease set f twoo fwunction a, and b pwease give 1 onegaishimasu", vec!["a", "b"]),
            ("pwease set f twoo fwunction a, b, and c pwease give 1 onegaishimasu", vec!["a", "b", "c"]),
        ] {
            let root = unsafe_parse(vec![source]);
            let literal = &root.children[0].children[1];
            assert_eq!(literal.children[0].kind, NodeKind::ArgList);
            assert_eq!(literal.children[0].identifier_names(), expected, "{}", source);
            assert_eq!(literal.children[1].kind, NodeKind::Block);
        }
    }

    #[test]
    fn multi_level_break() {
        let root = unsafe_parse(vec![
            "pwease repeat",
            "  pwease repeat pwease bweak bweak onegaishimasu",
            "onegaishimasu",
        ]);
        let inner = &root.children[0].children[0];
        assert_eq!(inner.kind, NodeKind::Repeat);
        assert_eq!(inner.children, vec![Node::new(NodeKind::Break(2), 2)]);
    }

    #[test]
    fn conditional_chain() {
        let root = unsafe_parse(vec![
            "iffu a",
            "  pwease give 1",
            "ewif b",
            "  pwease give 2",
            "ewse",
            "  pwease give 3",
            "onegaishimasu",
        ]);
        let chain = &root.children[0];
        assert_eq!(chain.kind, NodeKind::If);
        let kinds: Vec<_> = chain.children.iter().map(|c| c.kind.clone()).collect();
        assert_eq!(kinds, vec![NodeKind::Condition, NodeKind::Condition, NodeKind::Block]);
        let second = &chain.children[1];
        assert_eq!(second.line, 3);
        assert_eq!(second.children[0].children[0].path_string(), "b");
        assert_eq!(second.children[1].children[0].line, 4);
    }

    #[test]
    fn class_definition() {
        let root = unsafe_parse(vec![
            "pwease set Cat twoo cwassu",
            "  pwease set legs twoo 4",
            "  pwease new name",
            "    pwease extend Animal wif name UwU",
            "    pwease set watashi's name twoo name",
            "  onegaishimasu",
            "  pwease mwethod speak wif times",
            "    pwease give *meow*",
            "  onegaishimasu",
            "onegaishimasu",
        ]);
        let class = &root.children[0].children[1].children[0];
        assert_eq!(class.kind, NodeKind::ClassDef);
        let kinds: Vec<_> = class.children.iter().map(|c| c.kind.clone()).collect();
        assert_eq!(kinds, vec![NodeKind::Set, NodeKind::New, NodeKind::Method]);
        let constructor = &class.children[1];
        assert_eq!(constructor.children[0].identifier_names(), vec!["name"]);
        assert_eq!(constructor.children[1].children[0].kind, NodeKind::Extends);
        let method = &class.children[2];
        assert_eq!(method.children[0].identifier_name(), Some("speak"));
        assert_eq!(method.children[1].identifier_names(), vec!["times"]);
    }

    #[test]
    fn load_statement() {
        let root = unsafe_parse(vec!["pwease woad *#mafs* twoo mafs"]);
        assert_eq!(
            root.children,
            vec![Node::with_children(NodeKind::Load, 1, vec![
                expression(vec![Node::new(NodeKind::String("#mafs".into()), 1)]),
                path(&["mafs"]),
            ])],
        )
    }

    #[test]
    fn duplicate_constructor() {
        let error = parse_error(vec![
            "pwease set C twoo cwassu",
            "  pwease new pwease give 1 onegaishimasu",
            "  pwease new pwease give 2 onegaishimasu",
            "onegaishimasu",
        ]);
        assert_eq!(error.cause, SyntaxCause::Malformed("Cwassu can onwy have one new statement".into()));
        assert_eq!(error.line, 3);
    }

    #[test]
    fn context_restricted_directives() {
        assert!(!parse_error(vec!["pwease mwethod m pwease give 1 onegaishimasu"]).is_unexpected_eof());
        assert!(!parse_error(vec!["pwease extend C OwO"]).is_unexpected_eof());
        assert!(!parse_error(vec![
            "pwease set C twoo cwassu iffu twue pwease give 1 onegaishimasu onegaishimasu",
        ]).is_unexpected_eof());
        assert_eq!(
            parse_error(vec!["pwease new pwease give 1 onegaishimasu"]).cause,
            SyntaxCause::Malformed("Unexpwected pwease diwective new".into()),
        );
    }

    #[test]
    fn incomplete_input_is_reported_as_eof() {
        assert!(parse_error(vec!["pwease repeat", "pwease cawl pwint wif 1 UwU"]).is_unexpected_eof());
        assert!(parse_error(vec!["pwease set x twoo"]).is_unexpected_eof());
        assert!(parse_error(vec!["iffu x pwease give 1"]).is_unexpected_eof());
    }

    #[test]
    fn genuine_mismatches_are_not_eof() {
        let error = parse_error(vec!["pwease set x *five*"]);
        assert!(!error.is_unexpected_eof());
        assert_eq!(
            error.cause,
            SyntaxCause::UnexpectedToken { expected: "twoo".into(), got: TokenType::string("five") },
        );
        assert!(!parse_error(vec!["x"]).is_unexpected_eof());
        assert!(!parse_error(vec!["pwease cawl f wif 1 onegaishimasu"]).is_unexpected_eof());
    }
}
