use crate::{
    ast::{
        BlockStatement, BreakStatement, CatchClause, ContinueStatement, DoWhileStatement,
        EmptyStatement, ExpressionStatement, ForInStatement, ForInit, ForOfStatement,
        ForStatement, ForTarget, FunctionDeclaration, Identifier, IfStatement, ReturnStatement,
        Statement, SwitchCase, SwitchStatement, ThrowStatement, TryStatement,
        VariableDeclaration, VariableDeclarator, VariableKind, WhileStatement,
    },
    lexer::{Keyword, Punct, TokenKind},
};

use super::{ParseError, Parser};

impl Parser {
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Punct(Punct::LBrace)) => {
                Ok(Statement::Block(self.parse_block_statement()?))
            }
            Some(TokenKind::Punct(Punct::Semicolon)) => {
                self.next();
                Ok(Statement::Empty(EmptyStatement {}))
            }
            Some(TokenKind::Keyword(Keyword::Var))
            | Some(TokenKind::Keyword(Keyword::Let))
            | Some(TokenKind::Keyword(Keyword::Const)) => {
                let declaration = self.parse_variable_declaration()?;
                self.consume_semicolon()?;
                Ok(Statement::VariableDeclaration(declaration))
            }
            Some(TokenKind::Keyword(Keyword::Function)) => self.parse_function_declaration(),
            Some(TokenKind::Keyword(Keyword::If)) => self.parse_if_statement(),
            Some(TokenKind::Keyword(Keyword::While)) => self.parse_while_statement(),
            Some(TokenKind::Keyword(Keyword::Do)) => self.parse_do_while_statement(),
            Some(TokenKind::Keyword(Keyword::For)) => self.parse_for_statement(),
            Some(TokenKind::Keyword(Keyword::Switch)) => self.parse_switch_statement(),
            Some(TokenKind::Keyword(Keyword::Return)) => self.parse_return_statement(),
            Some(TokenKind::Keyword(Keyword::Throw)) => self.parse_throw_statement(),
            Some(TokenKind::Keyword(Keyword::Break)) => {
                self.next();
                self.consume_semicolon()?;
                Ok(Statement::Break(BreakStatement { label: None }))
            }
            Some(TokenKind::Keyword(Keyword::Continue)) => {
                self.next();
                self.consume_semicolon()?;
                Ok(Statement::Continue(ContinueStatement { label: None }))
            }
            Some(TokenKind::Keyword(Keyword::Try)) => self.parse_try_statement(),
            Some(_) => {
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::Expression(ExpressionStatement { expression }))
            }
            None => Err(ParseError::eof("statement")),
        }
    }

    pub fn parse_block_statement(&mut self) -> Result<BlockStatement, ParseError> {
        self.expect_punct(Punct::LBrace)?;

        let mut body = vec![];
        while !self.at_punct(Punct::RBrace) {
            if self.peek().is_none() {
                return Err(ParseError::eof("block"));
            }
            body.push(self.parse_statement()?);
        }
        self.expect_punct(Punct::RBrace)?;

        Ok(BlockStatement { body })
    }

    /// Declaration head and declarators, without the trailing
    /// semicolon (`for` heads reuse this).
    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration, ParseError> {
        let kind = match self.next().map(|token| token.kind) {
            Some(TokenKind::Keyword(Keyword::Var)) => VariableKind::Var,
            Some(TokenKind::Keyword(Keyword::Let)) => VariableKind::Let,
            Some(TokenKind::Keyword(Keyword::Const)) => VariableKind::Const,
            _ => unreachable!("caller checked for a declaration keyword"),
        };

        let mut declarations = vec![];
        loop {
            let id = self.expect_ident()?;
            let init = if self.eat_punct(Punct::Assign) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            declarations.push(VariableDeclarator { id, init });

            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }

        Ok(VariableDeclaration { kind, declarations })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Function)?;
        let id = self.expect_ident()?;
        let (params, body) = self.parse_function_rest()?;

        Ok(Statement::FunctionDeclaration(FunctionDeclaration {
            id,
            params,
            body,
        }))
    }

    /// Parameter list and body, shared between declarations,
    /// expressions, methods and accessors.
    pub fn parse_function_rest(&mut self) -> Result<(Vec<Identifier>, BlockStatement), ParseError> {
        self.expect_punct(Punct::LParen)?;
        let mut params = vec![];
        while !self.at_punct(Punct::RParen) {
            params.push(self.expect_ident()?);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RParen)?;

        let body = self.with_in(|parser| parser.parse_block_statement())?;
        Ok((params, body))
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::If)?;
        self.expect_punct(Punct::LParen)?;
        let test = self.with_in(|parser| parser.parse_expression())?;
        self.expect_punct(Punct::RParen)?;

        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat_keyword(Keyword::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::While)?;
        self.expect_punct(Punct::LParen)?;
        let test = self.with_in(|parser| parser.parse_expression())?;
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Do)?;
        let body = Box::new(self.parse_statement()?);
        self.expect_keyword(Keyword::While)?;
        self.expect_punct(Punct::LParen)?;
        let test = self.with_in(|parser| parser.parse_expression())?;
        self.expect_punct(Punct::RParen)?;
        self.eat_punct(Punct::Semicolon);

        Ok(Statement::DoWhile(DoWhileStatement { body, test }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::For)?;
        self.expect_punct(Punct::LParen)?;

        if self.eat_punct(Punct::Semicolon) {
            return self.parse_for_rest(None);
        }

        let declaring = self.at_keyword(Keyword::Var)
            || self.at_keyword(Keyword::Let)
            || self.at_keyword(Keyword::Const);

        self.set_no_in(true);
        let target = if declaring {
            let declaration = self.parse_variable_declaration()?;
            ForTarget::Declaration(declaration)
        } else {
            ForTarget::Expression(self.parse_expression()?)
        };
        self.set_no_in(false);

        if self.eat_keyword(Keyword::In) {
            let right = self.parse_expression()?;
            self.expect_punct(Punct::RParen)?;
            let body = Box::new(self.parse_statement()?);
            return Ok(Statement::ForIn(ForInStatement {
                left: target,
                right,
                body,
            }));
        }

        if self.at_contextual("of") {
            self.next();
            let right = self.parse_assignment_expression()?;
            self.expect_punct(Punct::RParen)?;
            let body = Box::new(self.parse_statement()?);
            return Ok(Statement::ForOf(ForOfStatement {
                left: target,
                right,
                body,
            }));
        }

        self.expect_punct(Punct::Semicolon)?;
        let init = Some(match target {
            ForTarget::Declaration(declaration) => ForInit::Declaration(declaration),
            ForTarget::Expression(expression) => ForInit::Expression(expression),
        });
        self.parse_for_rest(init)
    }

    /// Test, update and body of a classic `for`, after the first `;`.
    fn parse_for_rest(&mut self, init: Option<ForInit>) -> Result<Statement, ParseError> {
        let test = if self.at_punct(Punct::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(Punct::Semicolon)?;

        let update = if self.at_punct(Punct::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(Punct::RParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Switch)?;
        self.expect_punct(Punct::LParen)?;
        let discriminant = self.with_in(|parser| parser.parse_expression())?;
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::LBrace)?;

        let mut cases = vec![];
        let mut seen_default = false;
        while !self.at_punct(Punct::RBrace) {
            let test = if self.eat_keyword(Keyword::Case) {
                let test = self.parse_expression()?;
                Some(test)
            } else if self.at_keyword(Keyword::Default) {
                self.next();
                if seen_default {
                    return Err(ParseError {
                        message: "more than one 'default' case".into(),
                        position: None,
                    });
                }
                seen_default = true;
                None
            } else {
                return Err(self.unexpected("'case' or 'default'"));
            };
            self.expect_punct(Punct::Colon)?;

            let mut consequent = vec![];
            while !self.at_punct(Punct::RBrace)
                && !self.at_keyword(Keyword::Case)
                && !self.at_keyword(Keyword::Default)
            {
                consequent.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, consequent });
        }
        self.expect_punct(Punct::RBrace)?;

        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Return)?;

        // Restricted production: a line break ends the statement.
        let argument = if self.newline_before_next()
            || self.at_punct(Punct::Semicolon)
            || self.at_punct(Punct::RBrace)
            || self.peek().is_none()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;

        Ok(Statement::Return(ReturnStatement { argument }))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Throw)?;
        if self.newline_before_next() {
            return Err(ParseError {
                message: "illegal newline after 'throw'".into(),
                position: self.peek().map(|token| token.span),
            });
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;

        Ok(Statement::Throw(ThrowStatement { argument }))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Try)?;
        let block = self.parse_block_statement()?;

        let handler = if self.eat_keyword(Keyword::Catch) {
            let param = if self.eat_punct(Punct::LParen) {
                let param = self.expect_ident()?;
                self.expect_punct(Punct::RParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block_statement()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.eat_keyword(Keyword::Finally) {
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.unexpected("'catch' or 'finally'"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::parse_source;

    #[test]
    fn test_parse_variable_declaration() {
        let program = parse_source("var a = 1, b;").unwrap();
        let [Statement::VariableDeclaration(declaration)] = program.body.as_slice() else {
            panic!("expected a variable declaration");
        };
        assert_eq!(declaration.kind, VariableKind::Var);
        assert_eq!(declaration.declarations.len(), 2);
        assert_eq!(declaration.declarations[0].id.name, "a");
        assert!(declaration.declarations[1].init.is_none());
    }

    #[test]
    fn test_parse_braceless_if_else() {
        let program = parse_source("if (a) b(); else c();").unwrap();
        let [Statement::If(if_statement)] = program.body.as_slice() else {
            panic!("expected an if statement");
        };
        assert!(matches!(*if_statement.consequent, Statement::Expression(_)));
        assert!(if_statement.alternate.is_some());
    }

    #[test]
    fn test_parse_for_in_and_of() {
        let program = parse_source("for (var k in o) {} for (x of xs) {}").unwrap();
        assert!(matches!(program.body[0], Statement::ForIn(_)));
        assert!(matches!(program.body[1], Statement::ForOf(_)));
    }

    #[test]
    fn test_in_operator_restriction() {
        // Inside a `for` head, `in` belongs to the loop form...
        let program = parse_source("for (var i = 0 in o) {}").unwrap();
        assert!(matches!(program.body[0], Statement::ForIn(_)));

        // ...everywhere else it is the binary operator.
        let program = parse_source("if ('x' in o) {}").unwrap();
        let [Statement::If(if_statement)] = program.body.as_slice() else {
            panic!("expected an if statement");
        };
        assert!(matches!(
            &if_statement.test,
            Expression::Binary(BinaryExpression {
                operator: BinaryOperator::In,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_switch() {
        let program = parse_source("switch (x) { case 1: a(); break; default: b(); }").unwrap();
        let [Statement::Switch(switch_statement)] = program.body.as_slice() else {
            panic!("expected a switch statement");
        };
        assert_eq!(switch_statement.cases.len(), 2);
        assert_eq!(switch_statement.cases[0].consequent.len(), 2);
        assert!(switch_statement.cases[1].test.is_none());
    }

    #[test]
    fn test_restricted_return() {
        let program = parse_source("function f() { return\n1; }").unwrap();
        let [Statement::FunctionDeclaration(function)] = program.body.as_slice() else {
            panic!("expected a function declaration");
        };
        let Statement::Return(return_statement) = &function.body.body[0] else {
            panic!("expected a return statement");
        };
        assert!(return_statement.argument.is_none());
    }

    #[test]
    fn test_semicolon_insertion() {
        assert!(parse_source("a = 1\nb = 2").is_ok());
        assert!(parse_source("a = 1 b = 2").is_err());
    }

    #[test]
    fn test_try_catch_finally() {
        let program = parse_source("try { a(); } catch (e) { b(); } finally { c(); }").unwrap();
        let [Statement::Try(try_statement)] = program.body.as_slice() else {
            panic!("expected a try statement");
        };
        assert!(try_statement.handler.is_some());
        assert!(try_statement.finalizer.is_some());
    }
}
