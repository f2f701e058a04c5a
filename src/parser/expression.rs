use crate::{
    ast::{
        ArrayExpression, AssignmentExpression, AssignmentOperator, BinaryExpression,
        BinaryOperator, CallExpression, ConditionalExpression, Expression, FunctionExpression,
        Identifier, Literal, LiteralValue, LogicalExpression, LogicalOperator, MemberExpression,
        NewExpression, ObjectExpression, Property, PropertyKind, SequenceExpression,
        ThisExpression, UnaryExpression, UnaryOperator, UpdateExpression, UpdateOperator,
    },
    lexer::{Keyword, Punct, TokenKind},
};

use super::{ParseError, Parser};

/// A binary-position operator: either a `BinaryExpression` or a
/// `LogicalExpression` is built from it.
#[derive(Debug, Clone, Copy)]
enum InfixOperator {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

impl Parser {
    /// Full expression, comma operator included.
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let first = self.parse_assignment_expression()?;
        if !self.at_punct(Punct::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.eat_punct(Punct::Comma) {
            expressions.push(self.parse_assignment_expression()?);
        }
        Ok(Expression::Sequence(SequenceExpression { expressions }))
    }

    pub fn parse_assignment_expression(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_conditional_expression()?;

        let Some(operator) = self.peek_assignment_operator() else {
            return Ok(left);
        };
        if !matches!(left, Expression::Identifier(_) | Expression::Member(_)) {
            return Err(self.unexpected("assignment target"));
        }
        self.next();

        let right = self.parse_assignment_expression()?;
        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    fn peek_assignment_operator(&self) -> Option<AssignmentOperator> {
        let TokenKind::Punct(punct) = self.peek_kind()? else {
            return None;
        };
        Some(match punct {
            Punct::Assign => AssignmentOperator::Assign,
            Punct::PlusAssign => AssignmentOperator::AddAssign,
            Punct::MinusAssign => AssignmentOperator::SubtractAssign,
            Punct::StarAssign => AssignmentOperator::MultiplyAssign,
            Punct::SlashAssign => AssignmentOperator::DivideAssign,
            Punct::PercentAssign => AssignmentOperator::RemainderAssign,
            Punct::StarStarAssign => AssignmentOperator::ExponentAssign,
            Punct::LtLtAssign => AssignmentOperator::ShiftLeftAssign,
            Punct::GtGtAssign => AssignmentOperator::ShiftRightAssign,
            Punct::GtGtGtAssign => AssignmentOperator::ShiftRightUnsignedAssign,
            Punct::AmpAssign => AssignmentOperator::BitAndAssign,
            Punct::PipeAssign => AssignmentOperator::BitOrAssign,
            Punct::CaretAssign => AssignmentOperator::BitXorAssign,
            _ => return None,
        })
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, ParseError> {
        let test = self.parse_binary_expression(1)?;

        if !self.eat_punct(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.with_in(|parser| parser.parse_assignment_expression())?;
        self.expect_punct(Punct::Colon)?;
        let alternate = self.parse_assignment_expression()?;

        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    /// Precedence climbing over all binary and logical operators.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary_expression()?;

        while let Some((precedence, operator)) = self.peek_infix_operator() {
            if precedence < min_precedence {
                break;
            }
            self.next();

            // `**` is the only right-associative one.
            let right_min = if matches!(operator, InfixOperator::Binary(BinaryOperator::Exponent)) {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_binary_expression(right_min)?;

            left = match operator {
                InfixOperator::Binary(operator) => Expression::Binary(BinaryExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                }),
                InfixOperator::Logical(operator) => Expression::Logical(LogicalExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                }),
            };
        }

        Ok(left)
    }

    fn peek_infix_operator(&self) -> Option<(u8, InfixOperator)> {
        use BinaryOperator::*;
        use InfixOperator::{Binary, Logical};

        Some(match self.peek_kind()? {
            TokenKind::Keyword(Keyword::In) if !self.no_in() => (8, Binary(In)),
            TokenKind::Keyword(Keyword::Instanceof) => (8, Binary(Instanceof)),
            TokenKind::Punct(punct) => match punct {
                Punct::QuestionQuestion => (1, Logical(LogicalOperator::NullishCoalescing)),
                Punct::PipePipe => (2, Logical(LogicalOperator::Or)),
                Punct::AmpAmp => (3, Logical(LogicalOperator::And)),
                Punct::Pipe => (4, Binary(BitOr)),
                Punct::Caret => (5, Binary(BitXor)),
                Punct::Amp => (6, Binary(BitAnd)),
                Punct::EqEq => (7, Binary(Equal)),
                Punct::NotEq => (7, Binary(NotEqual)),
                Punct::EqEqEq => (7, Binary(StrictEqual)),
                Punct::NotEqEq => (7, Binary(StrictNotEqual)),
                Punct::Lt => (8, Binary(LessThan)),
                Punct::LtEq => (8, Binary(LessThanEqual)),
                Punct::Gt => (8, Binary(GreaterThan)),
                Punct::GtEq => (8, Binary(GreaterThanEqual)),
                Punct::LtLt => (9, Binary(ShiftLeft)),
                Punct::GtGt => (9, Binary(ShiftRight)),
                Punct::GtGtGt => (9, Binary(ShiftRightUnsigned)),
                Punct::Plus => (10, Binary(Add)),
                Punct::Minus => (10, Binary(Subtract)),
                Punct::Star => (11, Binary(Multiply)),
                Punct::Slash => (11, Binary(Divide)),
                Punct::Percent => (11, Binary(Remainder)),
                Punct::StarStar => (12, Binary(Exponent)),
                _ => return None,
            },
            _ => return None,
        })
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, ParseError> {
        let operator = match self.peek_kind() {
            Some(TokenKind::Punct(Punct::Bang)) => Some(UnaryOperator::Not),
            Some(TokenKind::Punct(Punct::Tilde)) => Some(UnaryOperator::BitNot),
            Some(TokenKind::Punct(Punct::Plus)) => Some(UnaryOperator::Plus),
            Some(TokenKind::Punct(Punct::Minus)) => Some(UnaryOperator::Minus),
            Some(TokenKind::Keyword(Keyword::Typeof)) => Some(UnaryOperator::Typeof),
            Some(TokenKind::Keyword(Keyword::Void)) => Some(UnaryOperator::Void),
            Some(TokenKind::Keyword(Keyword::Delete)) => Some(UnaryOperator::Delete),
            _ => None,
        };
        if let Some(operator) = operator {
            self.next();
            let argument = Box::new(self.parse_unary_expression()?);
            return Ok(Expression::Unary(UnaryExpression { operator, argument }));
        }

        let update = match self.peek_kind() {
            Some(TokenKind::Punct(Punct::PlusPlus)) => Some(UpdateOperator::Increment),
            Some(TokenKind::Punct(Punct::MinusMinus)) => Some(UpdateOperator::Decrement),
            _ => None,
        };
        if let Some(operator) = update {
            self.next();
            let argument = Box::new(self.parse_unary_expression()?);
            return Ok(Expression::Update(UpdateExpression {
                operator,
                argument,
                prefix: true,
            }));
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_call_member_expression()?;

        // Postfix update is a restricted production: no line break
        // between operand and operator.
        if !self.newline_before_next() {
            let operator = match self.peek_kind() {
                Some(TokenKind::Punct(Punct::PlusPlus)) => Some(UpdateOperator::Increment),
                Some(TokenKind::Punct(Punct::MinusMinus)) => Some(UpdateOperator::Decrement),
                _ => None,
            };
            if let Some(operator) = operator {
                self.next();
                return Ok(Expression::Update(UpdateExpression {
                    operator,
                    argument: Box::new(expression),
                    prefix: false,
                }));
            }
        }

        Ok(expression)
    }

    fn parse_call_member_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_new_or_primary_expression()?;

        loop {
            if self.eat_punct(Punct::Dot) {
                let property = self.parse_property_name_after_dot()?;
                expression = Expression::Member(MemberExpression {
                    object: Box::new(expression),
                    property: Box::new(Expression::Identifier(property)),
                    computed: false,
                });
            } else if self.eat_punct(Punct::LBracket) {
                let property = self.with_in(|parser| parser.parse_expression())?;
                self.expect_punct(Punct::RBracket)?;
                expression = Expression::Member(MemberExpression {
                    object: Box::new(expression),
                    property: Box::new(property),
                    computed: true,
                });
            } else if self.at_punct(Punct::LParen) {
                let arguments = self.parse_arguments()?;
                expression = Expression::Call(CallExpression {
                    callee: Box::new(expression),
                    arguments,
                });
            } else {
                break;
            }
        }

        Ok(expression)
    }

    fn parse_new_or_primary_expression(&mut self) -> Result<Expression, ParseError> {
        if self.at_keyword(Keyword::New) {
            return self.parse_new_expression();
        }
        self.parse_primary_expression()
    }

    fn parse_new_expression(&mut self) -> Result<Expression, ParseError> {
        self.expect_keyword(Keyword::New)?;

        // The callee binds member accesses but no calls; a `(` after
        // the member chain is the constructor argument list.
        let mut callee = self.parse_new_or_primary_expression()?;
        loop {
            if self.eat_punct(Punct::Dot) {
                let property = self.parse_property_name_after_dot()?;
                callee = Expression::Member(MemberExpression {
                    object: Box::new(callee),
                    property: Box::new(Expression::Identifier(property)),
                    computed: false,
                });
            } else if self.eat_punct(Punct::LBracket) {
                let property = self.with_in(|parser| parser.parse_expression())?;
                self.expect_punct(Punct::RBracket)?;
                callee = Expression::Member(MemberExpression {
                    object: Box::new(callee),
                    property: Box::new(property),
                    computed: true,
                });
            } else {
                break;
            }
        }

        let arguments = if self.at_punct(Punct::LParen) {
            self.parse_arguments()?
        } else {
            vec![]
        };

        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
        }))
    }

    /// Property names after `.` may be reserved words (`a.delete`).
    fn parse_property_name_after_dot(&mut self) -> Result<Identifier, ParseError> {
        match self.next() {
            Some(token) => match token.kind {
                TokenKind::Ident(name) => Ok(Identifier { name }),
                TokenKind::Keyword(keyword) => Ok(Identifier {
                    name: keyword.to_string(),
                }),
                kind => Err(ParseError {
                    message: format!("expected property name but found {}", kind.describe()),
                    position: Some(token.span),
                }),
            },
            None => Err(ParseError::eof("property name")),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.expect_punct(Punct::LParen)?;

        let mut arguments = vec![];
        while !self.at_punct(Punct::RParen) {
            arguments.push(self.with_in(|parser| parser.parse_assignment_expression())?);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RParen)?;

        Ok(arguments)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Ident(_)) => {
                let Some(TokenKind::Ident(name)) = self.next().map(|token| token.kind) else {
                    unreachable!()
                };
                Ok(Expression::Identifier(Identifier { name }))
            }
            Some(TokenKind::Number { .. }) => {
                let Some(TokenKind::Number { value, raw }) = self.next().map(|token| token.kind)
                else {
                    unreachable!()
                };
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Number(value),
                    raw,
                }))
            }
            Some(TokenKind::Str { .. }) => {
                let Some(TokenKind::Str { value, raw }) = self.next().map(|token| token.kind)
                else {
                    unreachable!()
                };
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::String(value),
                    raw,
                }))
            }
            Some(TokenKind::Keyword(Keyword::This)) => {
                self.next();
                Ok(Expression::This(ThisExpression {}))
            }
            Some(TokenKind::Keyword(Keyword::True)) => {
                self.next();
                Ok(Expression::Literal(Literal::boolean(true)))
            }
            Some(TokenKind::Keyword(Keyword::False)) => {
                self.next();
                Ok(Expression::Literal(Literal::boolean(false)))
            }
            Some(TokenKind::Keyword(Keyword::Null)) => {
                self.next();
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Null,
                    raw: "null".into(),
                }))
            }
            Some(TokenKind::Keyword(Keyword::Function)) => self.parse_function_expression(),
            Some(TokenKind::Punct(Punct::LParen)) => {
                self.next();
                let expression = self.with_in(|parser| parser.parse_expression())?;
                self.expect_punct(Punct::RParen)?;
                Ok(expression)
            }
            Some(TokenKind::Punct(Punct::LBracket)) => self.parse_array_expression(),
            Some(TokenKind::Punct(Punct::LBrace)) => self.parse_object_expression(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_function_expression(&mut self) -> Result<Expression, ParseError> {
        self.expect_keyword(Keyword::Function)?;
        let id = if matches!(self.peek_kind(), Some(TokenKind::Ident(_))) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let (params, body) = self.parse_function_rest()?;

        Ok(Expression::Function(FunctionExpression { id, params, body }))
    }

    fn parse_array_expression(&mut self) -> Result<Expression, ParseError> {
        self.expect_punct(Punct::LBracket)?;

        let mut elements = vec![];
        loop {
            if self.eat_punct(Punct::RBracket) {
                break;
            }
            if self.at_punct(Punct::Comma) {
                // Elision.
                self.next();
                elements.push(None);
                continue;
            }
            elements.push(Some(
                self.with_in(|parser| parser.parse_assignment_expression())?,
            ));
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RBracket)?;
                break;
            }
        }

        Ok(Expression::Array(ArrayExpression { elements }))
    }

    fn parse_object_expression(&mut self) -> Result<Expression, ParseError> {
        self.expect_punct(Punct::LBrace)?;

        let mut properties = vec![];
        while !self.at_punct(Punct::RBrace) {
            properties.push(self.parse_property()?);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RBrace)?;

        Ok(Expression::Object(ObjectExpression { properties }))
    }

    fn parse_property(&mut self) -> Result<Property, ParseError> {
        // `get`/`set` are accessors only when a property key follows.
        for (word, kind) in [("get", PropertyKind::Get), ("set", PropertyKind::Set)] {
            if self.at_contextual(word) && self.key_follows_ahead() {
                self.next();
                let (key, computed) = self.parse_property_key()?;
                let (params, body) = self.parse_function_rest()?;
                return Ok(Property {
                    key,
                    value: Expression::Function(FunctionExpression {
                        id: None,
                        params,
                        body,
                    }),
                    kind,
                    computed,
                    shorthand: false,
                    method: false,
                });
            }
        }

        let (key, computed) = self.parse_property_key()?;

        if self.eat_punct(Punct::Colon) {
            let value = self.with_in(|parser| parser.parse_assignment_expression())?;
            return Ok(Property {
                key,
                value,
                kind: PropertyKind::Init,
                computed,
                shorthand: false,
                method: false,
            });
        }

        if self.at_punct(Punct::LParen) {
            let (params, body) = self.parse_function_rest()?;
            return Ok(Property {
                key,
                value: Expression::Function(FunctionExpression {
                    id: None,
                    params,
                    body,
                }),
                kind: PropertyKind::Init,
                computed,
                shorthand: false,
                method: true,
            });
        }

        // Shorthand `{ a }`.
        let Expression::Identifier(ref id) = key else {
            return Err(self.unexpected("':' after property key"));
        };
        if computed {
            return Err(self.unexpected("':' after computed property key"));
        }
        let value = Expression::Identifier(id.clone());
        Ok(Property {
            key,
            value,
            kind: PropertyKind::Init,
            computed: false,
            shorthand: true,
            method: false,
        })
    }

    /// Whether the token after the current one can start a property
    /// key (distinguishes `{ get x() {} }` from `{ get: 1 }`).
    fn key_follows_ahead(&self) -> bool {
        matches!(
            self.peek_ahead(1),
            Some(TokenKind::Ident(_))
                | Some(TokenKind::Keyword(_))
                | Some(TokenKind::Str { .. })
                | Some(TokenKind::Number { .. })
                | Some(TokenKind::Punct(Punct::LBracket))
        )
    }

    fn peek_ahead(&self, offset: usize) -> Option<&TokenKind> {
        self.peek_nth(offset)
    }

    fn parse_property_key(&mut self) -> Result<(Expression, bool), ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Ident(_)) => Ok((Expression::Identifier(self.expect_ident()?), false)),
            Some(TokenKind::Keyword(_)) => {
                let Some(TokenKind::Keyword(keyword)) = self.next().map(|token| token.kind) else {
                    unreachable!()
                };
                Ok((Expression::ident(keyword.to_string()), false))
            }
            Some(TokenKind::Str { .. }) => {
                let Some(TokenKind::Str { value, raw }) = self.next().map(|token| token.kind)
                else {
                    unreachable!()
                };
                Ok((Expression::Literal(Literal::string(value, raw)), false))
            }
            Some(TokenKind::Number { .. }) => {
                let Some(TokenKind::Number { value, raw }) = self.next().map(|token| token.kind)
                else {
                    unreachable!()
                };
                Ok((
                    Expression::Literal(Literal {
                        value: LiteralValue::Number(value),
                        raw,
                    }),
                    false,
                ))
            }
            Some(TokenKind::Punct(Punct::LBracket)) => {
                self.next();
                let key = self.with_in(|parser| parser.parse_assignment_expression())?;
                self.expect_punct(Punct::RBracket)?;
                Ok((key, true))
            }
            _ => Err(self.unexpected("property key")),
        }
    }
}
