//! Collapse immediately-invoked single-return function expressions:
//! `(function() { return x; })()` becomes `x`, provided the wrapper
//! takes no arguments, declares no parameters and its body does not
//! depend on `this` or `arguments`.

use crate::ast::{Expression, Statement};

use super::{predicates::uses_function_context, Pass, TransformError};

pub struct FlattenInvoked;

impl Pass for FlattenInvoked {
    fn process_expression(&mut self, expression: &mut Expression) -> Result<(), TransformError> {
        // Unwrapping can expose another wrapper; repeat until stable.
        while let Some(argument) = flatten_once(expression) {
            *expression = argument;
        }
        Ok(())
    }
}

fn flatten_once(expression: &mut Expression) -> Option<Expression> {
    let Expression::Call(call) = expression else {
        return None;
    };
    if !call.arguments.is_empty() {
        return None;
    }
    let Expression::Function(function) = call.callee.as_mut() else {
        return None;
    };
    if !function.params.is_empty() || uses_function_context(&function.body) {
        return None;
    }
    let [Statement::Return(return_statement)] = function.body.body.as_mut_slice() else {
        return None;
    };
    // A bare `return;` yields nothing to put in the call's place.
    return_statement.argument.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;
    use crate::parser::parse_source;
    use crate::transform::walk;

    fn flatten(source: &str) -> Program {
        let mut program = parse_source(source).unwrap();
        let mut passes: Vec<Box<dyn Pass>> = vec![Box::new(FlattenInvoked)];
        walk::walk_program(&mut program, &mut passes).unwrap();
        program
    }

    fn assert_flattens(source: &str, expected: &str) {
        assert_eq!(flatten(source), parse_source(expected).unwrap());
    }

    #[test]
    fn test_single_return_iife_collapses() {
        assert_flattens("var x = (function() { return 42; })();", "var x = 42;");
    }

    #[test]
    fn test_nested_wrappers_collapse_fully() {
        assert_flattens(
            "var x = (function() { return (function() { return 42; })(); })();",
            "var x = 42;",
        );
    }

    #[test]
    fn test_this_and_arguments_block_flattening() {
        assert_flattens(
            "var x = (function() { return this; })();",
            "var x = (function() { return this; })();",
        );
        assert_flattens(
            "var x = (function() { return arguments[0]; })();",
            "var x = (function() { return arguments[0]; })();",
        );
    }

    #[test]
    fn test_parameters_or_arguments_block_flattening() {
        assert_flattens(
            "var x = (function(a) { return a; })();",
            "var x = (function(a) { return a; })();",
        );
        assert_flattens(
            "var x = (function() { return 1; })(2);",
            "var x = (function() { return 1; })(2);",
        );
    }

    #[test]
    fn test_multi_statement_bodies_are_kept() {
        assert_flattens(
            "var x = (function() { f(); return 1; })();",
            "var x = (function() { f(); return 1; })();",
        );
    }

    #[test]
    fn test_bare_return_is_kept() {
        assert_flattens(
            "var x = (function() { return; })();",
            "var x = (function() { return; })();",
        );
    }
}
