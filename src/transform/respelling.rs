//! Undo the minifier spellings of boolean and undefined literals:
//! `!0`/`!1` back to `true`/`false`, `void <literal>` back to
//! `undefined`.

use crate::ast::{Expression, Literal, LiteralValue, UnaryOperator};

use super::{Pass, TransformError};

pub struct Respelling;

impl Pass for Respelling {
    fn process_expression(&mut self, expression: &mut Expression) -> Result<(), TransformError> {
        let replacement = match expression {
            Expression::Unary(unary) if unary.operator == UnaryOperator::Void => {
                match &*unary.argument {
                    Expression::Literal(_) => Some(Expression::ident("undefined")),
                    _ => None,
                }
            }
            Expression::Unary(unary) if unary.operator == UnaryOperator::Not => {
                match &*unary.argument {
                    // Only integer-valued numbers: `!0.5` and `!true`
                    // keep their spelling.
                    Expression::Literal(literal) if literal.is_integer() => {
                        match &literal.value {
                            LiteralValue::Number(number) => {
                                Some(Expression::Literal(Literal::boolean(*number == 0.0)))
                            }
                            _ => None,
                        }
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        if let Some(replacement) = replacement {
            *expression = replacement;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Program, Statement};
    use crate::parser::parse_source;
    use crate::transform::walk;

    fn respell(source: &str) -> Program {
        let mut program = parse_source(source).unwrap();
        let mut passes: Vec<Box<dyn Pass>> = vec![Box::new(Respelling)];
        walk::walk_program(&mut program, &mut passes).unwrap();
        program
    }

    fn respelled_expression(source: &str) -> Expression {
        let program = respell(source);
        let Statement::Expression(statement) = &program.body[0] else {
            panic!("expected an expression statement");
        };
        statement.expression.clone()
    }

    #[test]
    fn test_not_zero_and_not_one() {
        assert_eq!(
            respelled_expression("x = !0;"),
            parse_expression("x = true;")
        );
        assert_eq!(
            respelled_expression("x = !1;"),
            parse_expression("x = false;")
        );
    }

    #[test]
    fn test_void_literal_becomes_undefined() {
        assert_eq!(
            respelled_expression("x = void 0;"),
            parse_expression("x = undefined;")
        );
        assert_eq!(
            respelled_expression("x = void 'a';"),
            parse_expression("x = undefined;")
        );
    }

    #[test]
    fn test_non_integer_operands_are_kept() {
        assert_eq!(
            respelled_expression("x = !0.5;"),
            parse_expression("x = !0.5;")
        );
        assert_eq!(
            respelled_expression("x = !true;"),
            parse_expression("x = !true;")
        );
        assert_eq!(
            respelled_expression("x = !'a';"),
            parse_expression("x = !'a';")
        );
        assert_eq!(
            respelled_expression("x = void f();"),
            parse_expression("x = void f();")
        );
    }

    #[test]
    fn test_rewrites_apply_in_nested_positions() {
        assert_eq!(
            respelled_expression("x = [!0, { a: void 0 }];"),
            parse_expression("x = [true, { a: undefined }];")
        );
    }

    fn parse_expression(source: &str) -> Expression {
        let program = parse_source(source).unwrap();
        let Statement::Expression(statement) = &program.body[0] else {
            panic!("expected an expression statement");
        };
        statement.expression.clone()
    }
}
