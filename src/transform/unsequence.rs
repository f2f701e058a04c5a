//! The main pass: lifts side-effectful sub-expressions out of
//! expression position into statements of their own.
//!
//! For every statement container (program body, block body, switch
//! case) the pass re-runs until a full sweep changes nothing. Handlers
//! take their node by value and return the rewritten node, emitting
//! hoisted statements through an `additions` list that ends up in the
//! container right before the statement that produced them. Evaluation
//! order, short-circuiting and the `this` binding of method calls are
//! preserved throughout.

use std::mem;

use crate::ast::{
    AssignmentExpression, BinaryExpression, BinaryOperator, BlockStatement, CallExpression,
    ConditionalExpression, EmptyStatement, Expression, ExpressionStatement, ForInit, ForStatement,
    Identifier, IfStatement, Literal, LiteralValue, LogicalExpression, LogicalOperator,
    MemberExpression, NewExpression, ObjectExpression, Program, Property, Statement, SwitchCase,
    VariableDeclaration, VariableKind,
};

use super::{
    predicates::{is_const, is_no_op},
    NameSource, Pass, TransformError,
};

pub struct Unsequence {
    names: NameSource,
    changed: bool,
}

impl Pass for Unsequence {
    fn process_program(&mut self, program: &mut Program) -> Result<(), TransformError> {
        self.process_container(&mut program.body)
    }

    fn process_block(&mut self, block: &mut BlockStatement) -> Result<(), TransformError> {
        self.process_container(&mut block.body)
    }

    fn process_switch_case(&mut self, case: &mut SwitchCase) -> Result<(), TransformError> {
        self.process_container(&mut case.consequent)
    }
}

impl Unsequence {
    pub fn new(names: NameSource) -> Self {
        Self {
            names,
            changed: false,
        }
    }

    /// Sweep the statement list until a fixpoint is reached.
    fn process_container(&mut self, body: &mut Vec<Statement>) -> Result<(), TransformError> {
        loop {
            self.changed = false;
            self.process_container_once(body)?;
            if !self.changed {
                return Ok(());
            }
        }
    }

    fn process_container_once(&mut self, body: &mut Vec<Statement>) -> Result<(), TransformError> {
        let mut children = Vec::with_capacity(body.len());
        for child in mem::take(body) {
            if let Some(child) = self.handle_statement(child, &mut children)? {
                children.push(child);
            }
        }
        *body = children;
        Ok(())
    }

    fn handle_statement(
        &mut self,
        statement: Statement,
        additions: &mut Vec<Statement>,
    ) -> Result<Option<Statement>, TransformError> {
        match statement {
            Statement::Expression(statement) => {
                self.handle_expression_statement(statement, additions)
            }
            Statement::Return(mut statement) => {
                if let Some(argument) = statement.argument.take() {
                    statement.argument = Some(self.handle_expression(argument, additions)?);
                }
                Ok(Some(Statement::Return(statement)))
            }
            Statement::Throw(mut statement) => {
                statement.argument = self.handle_expression(statement.argument, additions)?;
                Ok(Some(Statement::Throw(statement)))
            }
            Statement::VariableDeclaration(declaration) => {
                Ok(Some(Statement::VariableDeclaration(
                    self.handle_variable_declaration(declaration, additions)?,
                )))
            }
            Statement::If(if_statement) => self.handle_if_statement(if_statement, additions),
            Statement::While(mut statement) => {
                statement.body = self.handle_loop_body(statement.body)?;
                Ok(Some(Statement::While(statement)))
            }
            Statement::DoWhile(mut statement) => {
                statement.body = self.handle_loop_body(statement.body)?;
                Ok(Some(Statement::DoWhile(statement)))
            }
            Statement::For(statement) => {
                Ok(Some(self.handle_for_statement(statement, additions)?))
            }
            Statement::ForIn(mut statement) => {
                statement.body = self.handle_loop_body(statement.body)?;
                statement.right = self.handle_expression(statement.right, additions)?;
                Ok(Some(Statement::ForIn(statement)))
            }
            Statement::ForOf(mut statement) => {
                statement.body = self.handle_loop_body(statement.body)?;
                statement.right = self.handle_expression(statement.right, additions)?;
                Ok(Some(Statement::ForOf(statement)))
            }
            Statement::Switch(mut statement) => {
                statement.discriminant =
                    self.handle_expression(statement.discriminant, additions)?;
                Ok(Some(Statement::Switch(statement)))
            }
            other => Ok(Some(other)),
        }
    }

    fn handle_expression_statement(
        &mut self,
        statement: ExpressionStatement,
        additions: &mut Vec<Statement>,
    ) -> Result<Option<Statement>, TransformError> {
        let expression = statement.expression;
        if is_no_op(&expression) {
            self.changed = true;
            return Ok(None);
        }

        match expression {
            // `a && b();` runs `b()` exactly when `a` is truthy; as a
            // statement that is an `if`.
            Expression::Logical(logical)
                if matches!(logical.operator, LogicalOperator::And | LogicalOperator::Or) =>
            {
                let LogicalExpression {
                    operator,
                    left,
                    right,
                } = logical;
                let test = if operator == LogicalOperator::Or {
                    Expression::not(*left)
                } else {
                    *left
                };
                self.changed = true;
                self.handle_statement(
                    Statement::If(IfStatement {
                        test,
                        consequent: Box::new(Statement::from(*right)),
                        alternate: None,
                    }),
                    additions,
                )
            }
            Expression::Conditional(conditional) => {
                let ConditionalExpression {
                    test,
                    consequent,
                    alternate,
                } = conditional;
                self.changed = true;
                self.handle_statement(
                    Statement::If(IfStatement {
                        test: *test,
                        consequent: Box::new(Statement::from(*consequent)),
                        alternate: Some(Box::new(Statement::from(*alternate))),
                    }),
                    additions,
                )
            }
            expression => {
                let expression = self.handle_expression(expression, additions)?;
                Ok(Some(Statement::from(expression)))
            }
        }
    }

    fn handle_variable_declaration(
        &mut self,
        mut declaration: VariableDeclaration,
        additions: &mut Vec<Statement>,
    ) -> Result<VariableDeclaration, TransformError> {
        if declaration.declarations.is_empty() {
            return Ok(declaration);
        }

        if declaration.declarations.len() > 1 {
            let mut declarators = mem::take(&mut declaration.declarations);
            let last = declarators.pop();
            for declarator in declarators {
                additions.push(Statement::VariableDeclaration(VariableDeclaration {
                    kind: declaration.kind,
                    declarations: vec![declarator],
                }));
            }
            declaration.declarations.extend(last);
            self.changed = true;
            return Ok(declaration);
        }

        let declarator = &mut declaration.declarations[0];
        if let Some(init) = declarator.init.take() {
            declarator.init = Some(self.handle_expression(init, additions)?);
        }
        Ok(declaration)
    }

    fn handle_if_statement(
        &mut self,
        if_statement: IfStatement,
        additions: &mut Vec<Statement>,
    ) -> Result<Option<Statement>, TransformError> {
        let IfStatement {
            test,
            consequent,
            alternate,
        } = if_statement;
        let test = self.handle_expression(test, additions)?;

        let mut consequent_additions = vec![];
        let mut new_consequent = self.handle_statement(*consequent, &mut consequent_additions)?;
        if !consequent_additions.is_empty() {
            if let Some(statement) = new_consequent {
                consequent_additions.push(statement);
            }
            new_consequent = Some(Statement::Block(BlockStatement {
                body: consequent_additions,
            }));
        }

        let mut new_alternate = None;
        if let Some(alternate) = alternate {
            let mut alternate_additions = vec![];
            new_alternate = self.handle_statement(*alternate, &mut alternate_additions)?;
            if !alternate_additions.is_empty() {
                if let Some(statement) = new_alternate {
                    alternate_additions.push(statement);
                }
                new_alternate = Some(Statement::Block(BlockStatement {
                    body: alternate_additions,
                }));
            }
        }

        if let Some(mut consequent) = new_consequent {
            if matches!(consequent, Statement::If(_)) {
                // Avoid dangling-else ambiguity.
                consequent = Statement::Block(BlockStatement {
                    body: vec![consequent],
                });
            }
            return Ok(Some(Statement::If(IfStatement {
                test,
                consequent: Box::new(consequent),
                alternate: new_alternate.map(Box::new),
            })));
        }

        if let Some(alternate) = new_alternate {
            self.changed = true;
            return Ok(Some(Statement::If(IfStatement {
                test: Expression::not(test),
                consequent: Box::new(alternate),
                alternate: None,
            })));
        }

        self.changed = true;
        Ok(Some(Statement::from(test)))
    }

    /// Handle a loop body in isolation, turning any hoisted statements
    /// into a block prefix (they belong inside the loop, re-run every
    /// iteration).
    fn handle_loop_body(&mut self, body: Box<Statement>) -> Result<Box<Statement>, TransformError> {
        let mut body_additions = vec![];
        let new_body = self.handle_statement(*body, &mut body_additions)?;

        Ok(Box::new(if body_additions.is_empty() {
            match new_body {
                Some(body) => body,
                None => Statement::Empty(EmptyStatement {}),
            }
        } else {
            if let Some(body) = new_body {
                body_additions.push(body);
            }
            Statement::Block(BlockStatement {
                body: body_additions,
            })
        }))
    }

    fn handle_for_statement(
        &mut self,
        for_statement: ForStatement,
        additions: &mut Vec<Statement>,
    ) -> Result<Statement, TransformError> {
        let ForStatement {
            init,
            test,
            update,
            body,
        } = for_statement;
        let mut body = self.handle_loop_body(body)?;

        let init = match init {
            None => None,
            Some(ForInit::Declaration(declaration)) => Some(ForInit::Declaration(
                self.handle_variable_declaration(declaration, additions)?,
            )),
            Some(ForInit::Expression(expression)) => Some(ForInit::Expression(
                self.handle_expression(expression, additions)?,
            )),
        };

        // The test runs once per iteration and must stay in place; the
        // update's hoisted statements go to the end of the body so they
        // also re-run every iteration.
        let update = match update {
            None => None,
            Some(expression) => {
                let mut update_additions = vec![];
                let update = self.handle_expression(expression, &mut update_additions)?;
                if !matches!(*body, Statement::Block(_)) {
                    let inner = mem::replace(&mut *body, Statement::Empty(EmptyStatement {}));
                    *body = Statement::Block(BlockStatement { body: vec![inner] });
                }
                if let Statement::Block(block) = &mut *body {
                    block.body.append(&mut update_additions);
                }
                Some(update)
            }
        };

        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn handle_expression(
        &mut self,
        expression: Expression,
        additions: &mut Vec<Statement>,
    ) -> Result<Expression, TransformError> {
        match expression {
            Expression::Sequence(mut sequence) => match sequence.expressions.pop() {
                Some(last) => {
                    self.changed = true;
                    for expression in sequence.expressions {
                        additions.push(Statement::from(expression));
                    }
                    Ok(last)
                }
                None => Ok(Expression::Sequence(sequence)),
            },
            Expression::Assignment(assignment) => {
                let AssignmentExpression {
                    operator,
                    left,
                    right,
                } = assignment;

                let mut rhs_additions = vec![];
                let right = self.handle_expression(*right, &mut rhs_additions)?;

                let left = if rhs_additions.is_empty() {
                    // The target is an identifier or member expression;
                    // handling it in place must not change its
                    // top-level shape (a temporary in its stead would
                    // assign to the wrong slot).
                    let target_kind = mem::discriminant(&*left);
                    let left = self.handle_expression(*left, additions)?;
                    if mem::discriminant(&left) != target_kind {
                        return Err(TransformError::AssignmentTargetReplaced);
                    }
                    left
                } else {
                    // The target evaluates before the right-hand side's
                    // effects.
                    let left = self.pre_eval_assignment_target(*left, additions)?;
                    additions.append(&mut rhs_additions);
                    left
                };

                Ok(Expression::Assignment(AssignmentExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }
            Expression::Unary(mut unary) => {
                unary.argument = Box::new(self.handle_expression(*unary.argument, additions)?);
                Ok(Expression::Unary(unary))
            }
            Expression::Binary(binary) => {
                let BinaryExpression {
                    operator,
                    left,
                    right,
                } = binary;

                let mut rhs_additions = vec![];
                let right = self.handle_expression(*right, &mut rhs_additions)?;
                let left = if rhs_additions.is_empty() {
                    self.handle_expression(*left, additions)?
                } else {
                    let left = self.pre_eval_expression(*left, additions)?;
                    additions.append(&mut rhs_additions);
                    left
                };

                Ok(Expression::Binary(BinaryExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }
            Expression::Member(member) => {
                let MemberExpression {
                    object,
                    property,
                    computed,
                } = member;

                if computed {
                    let mut property_additions = vec![];
                    let property = self.handle_expression(*property, &mut property_additions)?;
                    if !property_additions.is_empty() {
                        let object = self.pre_eval_expression(*object, additions)?;
                        additions.append(&mut property_additions);
                        return Ok(Expression::Member(MemberExpression {
                            object: Box::new(object),
                            property: Box::new(property),
                            computed,
                        }));
                    }
                    let object = self.handle_expression(*object, additions)?;
                    return Ok(Expression::Member(MemberExpression {
                        object: Box::new(object),
                        property: Box::new(property),
                        computed,
                    }));
                }

                let object = self.handle_expression(*object, additions)?;
                Ok(Expression::Member(MemberExpression {
                    object: Box::new(object),
                    property,
                    computed,
                }))
            }
            Expression::Call(call) => {
                let CallExpression { callee, arguments } = call;
                let (callee, arguments) =
                    self.handle_invocation(*callee, arguments, true, additions)?;
                Ok(Expression::Call(CallExpression {
                    callee: Box::new(callee),
                    arguments,
                }))
            }
            Expression::New(new) => {
                let NewExpression { callee, arguments } = new;
                let (callee, arguments) =
                    self.handle_invocation(*callee, arguments, false, additions)?;
                Ok(Expression::New(NewExpression {
                    callee: Box::new(callee),
                    arguments,
                }))
            }
            Expression::Logical(logical) => {
                if logical.operator == LogicalOperator::NullishCoalescing {
                    return Ok(Expression::Logical(logical));
                }
                let LogicalExpression {
                    operator,
                    left,
                    right,
                } = logical;

                let mut rhs_additions = vec![];
                let right = self.handle_expression(*right, &mut rhs_additions)?;
                if !rhs_additions.is_empty() {
                    // Short-circuiting: the right-hand side's effects
                    // may only run when the left-hand side decides so.
                    let result = self.store_in_temporary(Some(*left), additions);
                    rhs_additions.push(Statement::from(Expression::assign(
                        Expression::Identifier(result.clone()),
                        right,
                    )));
                    let test = if operator == LogicalOperator::Or {
                        Expression::not(Expression::Identifier(result.clone()))
                    } else {
                        Expression::Identifier(result.clone())
                    };
                    additions.push(Statement::If(IfStatement {
                        test,
                        consequent: Box::new(Statement::Block(BlockStatement {
                            body: rhs_additions,
                        })),
                        alternate: None,
                    }));
                    return Ok(Expression::Identifier(result));
                }

                let left = self.handle_expression(*left, additions)?;
                Ok(Expression::Logical(LogicalExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }
            Expression::Conditional(conditional) => {
                if matches!(*conditional.alternate, Expression::Conditional(_)) {
                    // A whole cascade becomes an if/else-if ladder
                    // assigning into one temporary.
                    let result = self.store_in_temporary(None, additions);
                    additions.push(Statement::If(conditional_to_if(conditional, &result)));
                    return Ok(Expression::Identifier(result));
                }

                let ConditionalExpression {
                    test,
                    consequent,
                    alternate,
                } = conditional;

                let mut consequent_additions = vec![];
                let consequent = self.handle_expression(*consequent, &mut consequent_additions)?;
                let mut alternate_additions = vec![];
                let alternate = self.handle_expression(*alternate, &mut alternate_additions)?;

                if !consequent_additions.is_empty() || !alternate_additions.is_empty() {
                    let result = self.store_in_temporary(None, additions);
                    consequent_additions.push(Statement::from(Expression::assign(
                        Expression::Identifier(result.clone()),
                        consequent,
                    )));
                    alternate_additions.push(Statement::from(Expression::assign(
                        Expression::Identifier(result.clone()),
                        alternate,
                    )));
                    additions.push(Statement::If(IfStatement {
                        test: *test,
                        consequent: Box::new(Statement::Block(BlockStatement {
                            body: consequent_additions,
                        })),
                        alternate: Some(Box::new(Statement::Block(BlockStatement {
                            body: alternate_additions,
                        }))),
                    }));
                    return Ok(Expression::Identifier(result));
                }

                let test = self.handle_expression(*test, additions)?;
                Ok(Expression::Conditional(ConditionalExpression {
                    test: Box::new(test),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                }))
            }
            Expression::Array(mut array) => {
                let mut element_additions = vec![];
                let mut modified_index = None;
                for index in (0..array.elements.len()).rev() {
                    if let Some(element) = array.elements[index].take() {
                        array.elements[index] =
                            Some(self.handle_expression(element, &mut element_additions)?);
                    }
                    if !element_additions.is_empty() {
                        modified_index = Some(index);
                        break;
                    }
                }

                let Some(modified_index) = modified_index else {
                    return Ok(Expression::Array(array));
                };
                for index in 0..modified_index {
                    if let Some(element) = array.elements[index].take() {
                        array.elements[index] =
                            Some(self.pre_eval_expression(element, additions)?);
                    }
                }
                additions.append(&mut element_additions);
                Ok(Expression::Array(array))
            }
            Expression::Object(object) => {
                let mut properties = object.properties;
                let mut property_additions = vec![];
                let mut reversed_tail = vec![];
                let mut found_effects = false;
                while let Some(property) = properties.pop() {
                    reversed_tail.push(self.handle_property(property, &mut property_additions)?);
                    if !property_additions.is_empty() {
                        found_effects = true;
                        break;
                    }
                }

                if !found_effects {
                    reversed_tail.reverse();
                    return Ok(Expression::Object(ObjectExpression {
                        properties: reversed_tail,
                    }));
                }

                // `properties` now holds exactly the entries left of
                // the effectful one; force their evaluation first.
                let mut rebuilt = Vec::with_capacity(properties.len() + reversed_tail.len());
                for property in properties {
                    rebuilt.push(self.pre_eval_property(property, additions)?);
                }
                additions.append(&mut property_additions);
                reversed_tail.reverse();
                rebuilt.extend(reversed_tail);
                Ok(Expression::Object(ObjectExpression {
                    properties: rebuilt,
                }))
            }
            other => Ok(other),
        }
    }

    /// Shared by calls and `new`: scan the arguments right to left for
    /// the first one whose processing hoists statements; the callee and
    /// every argument left of it must then be forced to evaluate before
    /// those hoisted effects.
    fn handle_invocation(
        &mut self,
        callee: Expression,
        mut arguments: Vec<Expression>,
        preserve_receiver: bool,
        additions: &mut Vec<Statement>,
    ) -> Result<(Expression, Vec<Expression>), TransformError> {
        let mut argument_additions = vec![];
        let mut reversed_tail = vec![];
        let mut found_effects = false;
        while let Some(argument) = arguments.pop() {
            reversed_tail.push(self.handle_expression(argument, &mut argument_additions)?);
            if !argument_additions.is_empty() {
                found_effects = true;
                break;
            }
        }

        if !found_effects {
            // Handling a member callee in place keeps its top-level
            // shape, so the receiver of a method call stays intact.
            reversed_tail.reverse();
            let callee = self.handle_expression(callee, additions)?;
            return Ok((callee, reversed_tail));
        }

        let modified_index = arguments.len();

        let callee = match (preserve_receiver, callee) {
            (true, Expression::Member(mut member)) => {
                // `obj.m(...)` must call `m` with `obj` as `this` even
                // after the callee is hoisted: rewrite to
                // `tmp.call(obj, ...)`.
                if !matches!(*member.object, Expression::Identifier(_)) {
                    let temporary = self.store_in_temporary(Some(*member.object), additions);
                    member.object = Box::new(Expression::Identifier(temporary));
                }
                let receiver = match &*member.object {
                    Expression::Identifier(identifier) => identifier.clone(),
                    _ => unreachable!("receiver was just normalized to an identifier"),
                };
                let method = self.pre_eval_expression(Expression::Member(member), additions)?;
                arguments.insert(0, Expression::Identifier(receiver));
                Expression::Member(MemberExpression::r#static(method, "call"))
            }
            (_, callee) => self.pre_eval_expression(callee, additions)?,
        };

        let head = mem::take(&mut arguments);
        for (index, argument) in head.into_iter().enumerate() {
            if index < modified_index {
                arguments.push(self.pre_eval_expression(argument, additions)?);
            } else {
                arguments.push(argument);
            }
        }

        additions.append(&mut argument_additions);
        reversed_tail.reverse();
        arguments.extend(reversed_tail);
        Ok((callee, arguments))
    }

    fn handle_property(
        &mut self,
        property: Property,
        additions: &mut Vec<Statement>,
    ) -> Result<Property, TransformError> {
        if property.shorthand && !property.method {
            if property.computed {
                return Err(TransformError::ComputedShorthandProperty);
            }
            return Ok(property);
        }

        let Property {
            key,
            value,
            kind,
            computed,
            shorthand,
            method,
        } = property;

        if method {
            if !matches!(value, Expression::Function(_)) {
                return Err(TransformError::MethodValueNotFunction);
            }
        } else {
            let mut value_additions = vec![];
            let value = self.handle_expression(value, &mut value_additions)?;
            if !value_additions.is_empty() {
                let key = if computed {
                    self.pre_eval_property_key(key, additions)?
                } else {
                    key
                };
                additions.append(&mut value_additions);
                return Ok(Property {
                    key,
                    value,
                    kind,
                    computed,
                    shorthand,
                    method,
                });
            }
            let key = if computed {
                self.handle_expression(key, additions)?
            } else {
                key
            };
            return Ok(Property {
                key,
                value,
                kind,
                computed,
                shorthand,
                method,
            });
        }

        let key = if computed {
            self.handle_expression(key, additions)?
        } else {
            key
        };
        Ok(Property {
            key,
            value,
            kind,
            computed,
            shorthand,
            method,
        })
    }

    fn pre_eval_property(
        &mut self,
        property: Property,
        additions: &mut Vec<Statement>,
    ) -> Result<Property, TransformError> {
        if property.shorthand && !property.method {
            if property.computed {
                return Err(TransformError::ComputedShorthandProperty);
            }
            return Ok(property);
        }

        let Property {
            key,
            value,
            kind,
            computed,
            shorthand,
            method,
        } = property;

        let key = if computed {
            self.pre_eval_property_key(key, additions)?
        } else {
            key
        };

        let value = if method {
            if !matches!(value, Expression::Function(_)) {
                return Err(TransformError::MethodValueNotFunction);
            }
            value
        } else {
            self.pre_eval_expression(value, additions)?
        };

        Ok(Property {
            key,
            value,
            kind,
            computed,
            shorthand,
            method,
        })
    }

    /// Declare a fresh `let` temporary (optionally initialised) and
    /// return its identifier.
    fn store_in_temporary(
        &mut self,
        init: Option<Expression>,
        additions: &mut Vec<Statement>,
    ) -> Identifier {
        self.changed = true;
        let identifier = self.names.next_ident();
        additions.push(Statement::VariableDeclaration(VariableDeclaration::single(
            VariableKind::Let,
            identifier.clone(),
            init,
        )));
        identifier
    }

    /// Process an expression and, unless it turns out to be free of
    /// effects, hoist it into a temporary so it evaluates before
    /// whatever is emitted next.
    fn pre_eval_expression(
        &mut self,
        expression: Expression,
        additions: &mut Vec<Statement>,
    ) -> Result<Expression, TransformError> {
        let expression = self.handle_expression(expression, additions)?;
        if is_no_op(&expression) {
            return Ok(expression);
        }
        Ok(Expression::Identifier(
            self.store_in_temporary(Some(expression), additions),
        ))
    }

    /// Force the parts of an assignment target that evaluate before
    /// the right-hand side: the member object and, for computed
    /// members, the key. Bare identifier targets need nothing.
    fn pre_eval_assignment_target(
        &mut self,
        target: Expression,
        additions: &mut Vec<Statement>,
    ) -> Result<Expression, TransformError> {
        match target {
            Expression::Identifier(_) => Ok(target),
            Expression::Member(member) => {
                let MemberExpression {
                    object,
                    property,
                    computed,
                } = member;
                let object = self.pre_eval_expression(*object, additions)?;
                let property = if computed {
                    self.pre_eval_expression(*property, additions)?
                } else {
                    *property
                };
                Ok(Expression::Member(MemberExpression {
                    object: Box::new(object),
                    property: Box::new(property),
                    computed,
                }))
            }
            other => Err(TransformError::UnexpectedAssignmentTarget(kind_name(
                &other,
            ))),
        }
    }

    /// Computed keys are coerced with `"" + key` once, up front: the
    /// observable string conversion happens at the original time even
    /// though the key moves before the value's effects.
    fn pre_eval_property_key(
        &mut self,
        key: Expression,
        additions: &mut Vec<Statement>,
    ) -> Result<Expression, TransformError> {
        if is_const(&key) {
            return Ok(key);
        }
        let coerced = Expression::Binary(BinaryExpression {
            operator: BinaryOperator::Add,
            left: Box::new(Expression::Literal(Literal {
                value: LiteralValue::String(String::new()),
                raw: "\"\"".into(),
            })),
            right: Box::new(key),
        });
        Ok(Expression::Identifier(
            self.store_in_temporary(Some(coerced), additions),
        ))
    }
}

/// Unfold `test ? a : b ? c : ...` into an if/else-if ladder that
/// assigns each arm's value to `dest`.
fn conditional_to_if(conditional: ConditionalExpression, dest: &Identifier) -> IfStatement {
    let ConditionalExpression {
        test,
        consequent,
        alternate,
    } = conditional;

    let alternate = match *alternate {
        Expression::Conditional(inner) => Statement::If(conditional_to_if(inner, dest)),
        other => Statement::from(Expression::assign(
            Expression::Identifier(dest.clone()),
            other,
        )),
    };

    IfStatement {
        test: *test,
        consequent: Box::new(Statement::from(Expression::assign(
            Expression::Identifier(dest.clone()),
            *consequent,
        ))),
        alternate: Some(Box::new(alternate)),
    }
}

fn kind_name(expression: &Expression) -> &'static str {
    match expression {
        Expression::Identifier(_) => "Identifier",
        Expression::Literal(_) => "Literal",
        Expression::This(_) => "ThisExpression",
        Expression::Array(_) => "ArrayExpression",
        Expression::Object(_) => "ObjectExpression",
        Expression::Function(_) => "FunctionExpression",
        Expression::Unary(_) => "UnaryExpression",
        Expression::Update(_) => "UpdateExpression",
        Expression::Binary(_) => "BinaryExpression",
        Expression::Logical(_) => "LogicalExpression",
        Expression::Assignment(_) => "AssignmentExpression",
        Expression::Conditional(_) => "ConditionalExpression",
        Expression::Call(_) => "CallExpression",
        Expression::New(_) => "NewExpression",
        Expression::Member(_) => "MemberExpression",
        Expression::Sequence(_) => "SequenceExpression",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::transform::{walk, DEFAULT_TEMP_PREFIX};

    /// Run only this pass and compare against the parse of the
    /// expected source.
    fn unsequence(source: &str) -> Program {
        let mut program = parse_source(source).unwrap();
        let mut passes: Vec<Box<dyn Pass>> = vec![Box::new(Unsequence::new(NameSource::new(
            DEFAULT_TEMP_PREFIX,
        )))];
        walk::walk_program(&mut program, &mut passes).unwrap();
        program
    }

    fn assert_rewrites(source: &str, expected: &str) {
        assert_eq!(unsequence(source), parse_source(expected).unwrap());
    }

    #[test]
    fn test_sequence_in_assignment_is_lifted() {
        assert_rewrites("a = (f(), g(), h);", "f(); g(); a = h;");
    }

    #[test]
    fn test_statement_level_short_circuits_become_ifs() {
        assert_rewrites("a && b();", "if (a) b();");
        assert_rewrites("a || b();", "if (!a) b();");
    }

    #[test]
    fn test_statement_level_ternary_becomes_if() {
        assert_rewrites("c ? f() : g();", "if (c) f(); else g();");
    }

    #[test]
    fn test_no_op_statements_are_deleted() {
        assert_rewrites("x; 42; 'use strict'; f();", "f();");
    }

    #[test]
    fn test_multi_declarator_declarations_split() {
        assert_rewrites("var a = 1, b = 2, c = 3;", "var a = 1; var b = 2; var c = 3;");
    }

    #[test]
    fn test_logical_rhs_effects_keep_short_circuit() {
        assert_rewrites(
            "x = a || (f(), g());",
            "let _$$_1 = a; if (!_$$_1) { f(); _$$_1 = g(); } x = _$$_1;",
        );
        assert_rewrites(
            "x = a && (f(), g());",
            "let _$$_1 = a; if (_$$_1) { f(); _$$_1 = g(); } x = _$$_1;",
        );
    }

    #[test]
    fn test_nullish_coalescing_is_left_alone() {
        assert_rewrites("x = a ?? b;", "x = a ?? b;");
    }

    #[test]
    fn test_ternary_with_effectful_branch() {
        assert_rewrites(
            "x = c ? f() : (g(), h);",
            "let _$$_1; if (c) { _$$_1 = f(); } else { g(); _$$_1 = h; } x = _$$_1;",
        );
    }

    #[test]
    fn test_ternary_cascade_becomes_ladder() {
        assert_rewrites(
            "function r() { return a ? b : c ? d : e; }",
            "function r() { let _$$_1; if (a) _$$_1 = b; else if (c) _$$_1 = d; else _$$_1 = e; return _$$_1; }",
        );
    }

    #[test]
    fn test_method_call_preserves_receiver() {
        assert_rewrites(
            "obj.m((f(), x), g());",
            "let _$$_1 = obj.m; f(); _$$_1.call(obj, x, g());",
        );
    }

    #[test]
    fn test_method_call_hoists_complex_receiver_once() {
        assert_rewrites(
            "a.b.m((f(), x));",
            "let _$$_1 = a.b; let _$$_2 = _$$_1.m; f(); _$$_2.call(_$$_1, x);",
        );
    }

    #[test]
    fn test_plain_calls_are_left_alone() {
        assert_rewrites("obj.m(f(), g());", "obj.m(f(), g());");
    }

    #[test]
    fn test_computed_member_pre_evaluates_object() {
        assert_rewrites(
            "a.b[(f(), k)] = 1;",
            "let _$$_1 = a.b; f(); _$$_1[k] = 1;",
        );
    }

    #[test]
    fn test_for_update_effects_rerun_each_iteration() {
        assert_rewrites(
            "for (var i = (f(), 0); i < n; i = (g(), i + 1)) h();",
            "f(); for (var i = 0; i < n; i = i + 1) { h(); g(); }",
        );
    }

    #[test]
    fn test_for_in_right_is_hoisted_out() {
        assert_rewrites(
            "for (var k in (f(), o)) g(k);",
            "f(); for (var k in o) g(k);",
        );
    }

    #[test]
    fn test_if_with_deleted_branches_degrades() {
        assert_rewrites("if (f()) x; else y;", "f();");
        assert_rewrites("if (c) x; else g();", "if (!c) g();");
    }

    #[test]
    fn test_if_wraps_branch_needing_additions() {
        assert_rewrites(
            "if (c) a = (f(), b);",
            "if (c) { f(); a = b; }",
        );
    }

    #[test]
    fn test_dangling_else_is_disambiguated() {
        assert_rewrites(
            "if (a) { if (b) f(); } else g();",
            "if (a) { if (b) f(); } else g();",
        );
        // A consequent that collapses to a bare `if` gets braces so the
        // `else` stays with the outer `if`.
        assert_rewrites(
            "if (a) b && f(); else g();",
            "if (a) { if (b) f(); } else g();",
        );
    }

    #[test]
    fn test_switch_discriminant_is_processed() {
        assert_rewrites(
            "switch ((f(), x)) { case 1: g(); }",
            "f(); switch (x) { case 1: g(); }",
        );
    }

    #[test]
    fn test_switch_cases_are_containers() {
        assert_rewrites(
            "switch (x) { case 1: a = (f(), b); }",
            "switch (x) { case 1: f(); a = b; }",
        );
    }

    #[test]
    fn test_array_literal_preserves_element_order() {
        assert_rewrites(
            "x = [f(), (g(), a), h()];",
            "let _$$_1 = f(); g(); x = [_$$_1, a, h()];",
        );
    }

    #[test]
    fn test_object_literal_preserves_property_order() {
        assert_rewrites(
            "x = { a: f(), b: (g(), c), d: h() };",
            "let _$$_1 = f(); g(); x = { a: _$$_1, b: c, d: h() };",
        );
    }

    #[test]
    fn test_computed_key_is_coerced_before_effectful_value() {
        assert_rewrites(
            "x = { [k]: (f(), v) };",
            "let _$$_1 = \"\" + k; f(); x = { [_$$_1]: v };",
        );
    }

    #[test]
    fn test_return_and_throw_arguments_are_processed() {
        assert_rewrites(
            "function f() { return (g(), x); }",
            "function f() { g(); return x; }",
        );
        assert_rewrites("throw (g(), e);", "g(); throw e;");
    }

    #[test]
    fn test_loop_bodies_keep_hoists_inside() {
        assert_rewrites(
            "while (c) a = (f(), b);",
            "while (c) { f(); a = b; }",
        );
    }

    #[test]
    fn test_assignment_target_evaluates_before_rhs_effects() {
        // The member object is forced into a temporary; the identifier
        // key has no effects and stays in place.
        assert_rewrites("a.b[k] = (f(), v);", "let _$$_1 = a.b; f(); _$$_1[k] = v;");
        assert_rewrites(
            "a.b[k()] = (f(), v);",
            "let _$$_1 = a.b; let _$$_2 = k(); f(); _$$_1[_$$_2] = v;",
        );
    }

    #[test]
    fn test_nested_sequences_reach_fixpoint() {
        assert_rewrites("a = ((f(), g()), h);", "f(); g(); a = h;");
    }
}
