//! Purity predicates the passes share.

use crate::ast::{BlockStatement, Expression, ForInit, ForTarget, Statement};

/// Whether evaluating the expression can have no observable effect at
/// all. Only literals, operator forms over constant operands and
/// function expressions (whose bodies stay unevaluated) qualify.
/// Identifiers do not: reading an undeclared name throws.
pub fn is_const(expression: &Expression) -> bool {
    match expression {
        Expression::Literal(_) | Expression::Function(_) => true,
        Expression::Unary(unary) => is_const(&unary.argument),
        Expression::Binary(binary) => is_const(&binary.left) && is_const(&binary.right),
        Expression::Logical(logical) => is_const(&logical.left) && is_const(&logical.right),
        Expression::Conditional(conditional) => {
            is_const(&conditional.test)
                && is_const(&conditional.consequent)
                && is_const(&conditional.alternate)
        }
        _ => false,
    }
}

/// Whether an expression statement built from this expression could be
/// dropped: an identifier reference or a constant. The possible
/// `ReferenceError` of a free identifier is deliberately ignored.
pub fn is_no_op(expression: &Expression) -> bool {
    matches!(expression, Expression::Identifier(_)) || is_const(expression)
}

/// Whether a function body references `this` or `arguments` outside of
/// nested function expressions.
pub fn uses_function_context(body: &BlockStatement) -> bool {
    body.body.iter().any(statement_uses_context)
}

fn statement_uses_context(statement: &Statement) -> bool {
    match statement {
        Statement::Expression(expression_statement) => {
            expression_uses_context(&expression_statement.expression)
        }
        Statement::Block(block) => block.body.iter().any(statement_uses_context),
        Statement::VariableDeclaration(declaration) => {
            declaration.declarations.iter().any(|declarator| {
                declarator.id.name == "arguments"
                    || declarator
                        .init
                        .as_ref()
                        .is_some_and(expression_uses_context)
            })
        }
        Statement::FunctionDeclaration(function) => {
            function.body.body.iter().any(statement_uses_context)
        }
        Statement::If(if_statement) => {
            expression_uses_context(&if_statement.test)
                || statement_uses_context(&if_statement.consequent)
                || if_statement
                    .alternate
                    .as_deref()
                    .is_some_and(statement_uses_context)
        }
        Statement::Return(return_statement) => return_statement
            .argument
            .as_ref()
            .is_some_and(expression_uses_context),
        Statement::Throw(throw_statement) => expression_uses_context(&throw_statement.argument),
        Statement::While(while_statement) => {
            expression_uses_context(&while_statement.test)
                || statement_uses_context(&while_statement.body)
        }
        Statement::DoWhile(do_while) => {
            statement_uses_context(&do_while.body) || expression_uses_context(&do_while.test)
        }
        Statement::For(for_statement) => {
            let init = match &for_statement.init {
                Some(ForInit::Declaration(declaration)) => declaration
                    .declarations
                    .iter()
                    .any(|declarator| {
                        declarator
                            .init
                            .as_ref()
                            .is_some_and(expression_uses_context)
                    }),
                Some(ForInit::Expression(expression)) => expression_uses_context(expression),
                None => false,
            };
            init || for_statement
                .test
                .as_ref()
                .is_some_and(expression_uses_context)
                || for_statement
                    .update
                    .as_ref()
                    .is_some_and(expression_uses_context)
                || statement_uses_context(&for_statement.body)
        }
        Statement::ForIn(for_in) => {
            for_target_uses_context(&for_in.left)
                || expression_uses_context(&for_in.right)
                || statement_uses_context(&for_in.body)
        }
        Statement::ForOf(for_of) => {
            for_target_uses_context(&for_of.left)
                || expression_uses_context(&for_of.right)
                || statement_uses_context(&for_of.body)
        }
        Statement::Switch(switch) => {
            expression_uses_context(&switch.discriminant)
                || switch.cases.iter().any(|case| {
                    case.test.as_ref().is_some_and(expression_uses_context)
                        || case.consequent.iter().any(statement_uses_context)
                })
        }
        Statement::Try(try_statement) => {
            try_statement.block.body.iter().any(statement_uses_context)
                || try_statement.handler.as_ref().is_some_and(|handler| {
                    handler.body.body.iter().any(statement_uses_context)
                })
                || try_statement.finalizer.as_ref().is_some_and(|finalizer| {
                    finalizer.body.iter().any(statement_uses_context)
                })
        }
        Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => false,
    }
}

fn for_target_uses_context(target: &ForTarget) -> bool {
    match target {
        ForTarget::Declaration(declaration) => declaration.declarations.iter().any(|declarator| {
            declarator
                .init
                .as_ref()
                .is_some_and(expression_uses_context)
        }),
        ForTarget::Expression(expression) => expression_uses_context(expression),
    }
}

fn expression_uses_context(expression: &Expression) -> bool {
    match expression {
        Expression::This(_) => true,
        Expression::Identifier(identifier) => identifier.name == "arguments",
        // A nested function has its own `this` and `arguments`.
        Expression::Function(_) => false,
        Expression::Literal(_) => false,
        Expression::Array(array) => array
            .elements
            .iter()
            .flatten()
            .any(expression_uses_context),
        Expression::Object(object) => object.properties.iter().any(|property| {
            expression_uses_context(&property.key) || expression_uses_context(&property.value)
        }),
        Expression::Unary(unary) => expression_uses_context(&unary.argument),
        Expression::Update(update) => expression_uses_context(&update.argument),
        Expression::Binary(binary) => {
            expression_uses_context(&binary.left) || expression_uses_context(&binary.right)
        }
        Expression::Logical(logical) => {
            expression_uses_context(&logical.left) || expression_uses_context(&logical.right)
        }
        Expression::Assignment(assignment) => {
            expression_uses_context(&assignment.left)
                || expression_uses_context(&assignment.right)
        }
        Expression::Conditional(conditional) => {
            expression_uses_context(&conditional.test)
                || expression_uses_context(&conditional.consequent)
                || expression_uses_context(&conditional.alternate)
        }
        Expression::Call(call) => {
            expression_uses_context(&call.callee)
                || call.arguments.iter().any(expression_uses_context)
        }
        Expression::New(new) => {
            expression_uses_context(&new.callee)
                || new.arguments.iter().any(expression_uses_context)
        }
        Expression::Member(member) => {
            expression_uses_context(&member.object) || expression_uses_context(&member.property)
        }
        Expression::Sequence(sequence) => {
            sequence.expressions.iter().any(expression_uses_context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn first_expression(source: &str) -> Expression {
        let program = parse_source(source).unwrap();
        let Statement::Expression(statement) = &program.body[0] else {
            panic!("expected an expression statement");
        };
        statement.expression.clone()
    }

    fn function_body(source: &str) -> BlockStatement {
        let Expression::Function(function) = first_expression(source) else {
            panic!("expected a function expression");
        };
        function.body
    }

    #[test]
    fn test_literals_and_operator_forms_are_const() {
        assert!(is_const(&first_expression("1 + 2 * 3;")));
        assert!(is_const(&first_expression("!true;")));
        assert!(is_const(&first_expression("1 ? 'a' : 'b';")));
        assert!(is_const(&first_expression("(function() { f(); });")));
    }

    #[test]
    fn test_identifiers_are_not_const() {
        assert!(!is_const(&first_expression("undefined;")));
        assert!(!is_const(&first_expression("1 + x;")));
    }

    #[test]
    fn test_calls_and_members_are_not_const() {
        assert!(!is_const(&first_expression("f();")));
        assert!(!is_const(&first_expression("1 + a.b;")));
    }

    #[test]
    fn test_no_op_accepts_identifiers() {
        assert!(is_no_op(&first_expression("x;")));
        assert!(is_no_op(&first_expression("42;")));
        assert!(!is_no_op(&first_expression("x();")));
    }

    #[test]
    fn test_uses_function_context() {
        assert!(uses_function_context(&function_body(
            "(function() { return this.x; });"
        )));
        assert!(uses_function_context(&function_body(
            "(function() { return arguments[0]; });"
        )));
        assert!(!uses_function_context(&function_body(
            "(function() { return x; });"
        )));
    }

    #[test]
    fn test_nested_function_expression_shields_context() {
        assert!(!uses_function_context(&function_body(
            "(function() { return function() { return this; }; });"
        )));
    }
}
