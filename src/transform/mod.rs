//! The rewrite engine: a fixed pipeline of passes over the AST.
//!
//! Every pass exposes per-node hooks through the [`Pass`] trait. A
//! single traversal (`walk`) visits each node, invokes every pass's
//! hook in pipeline order, and then descends into the node's children.
//! The engine mutates the caller's AST in place; fatal structural
//! violations surface as [`TransformError`] and abort the transform.

mod flatten_invoked;
mod if_braces;
mod label_function_array;
mod predicates;
mod respelling;
mod unsequence;
mod walk;

pub use predicates::{is_const, is_no_op, uses_function_context};

use std::{error::Error, fmt::Display};

use crate::ast::{
    BlockStatement, Expression, Identifier, Program, Statement, SwitchCase, VariableDeclarator,
};

use self::{
    flatten_invoked::FlattenInvoked, if_braces::IfBraces,
    label_function_array::LabelFunctionArray, respelling::Respelling, unsequence::Unsequence,
};

/// Default prefix for engine-introduced temporaries. Callers must make
/// sure no input identifier is this prefix followed by digits.
pub const DEFAULT_TEMP_PREFIX: &str = "_$$_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    UnexpectedAssignmentTarget(&'static str),
    AssignmentTargetReplaced,
    ComputedShorthandProperty,
    MethodValueNotFunction,
}

impl Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformError::UnexpectedAssignmentTarget(kind) => {
                write!(f, "unexpected assignment target: {kind}")
            }
            TransformError::AssignmentTargetReplaced => {
                f.write_str("assignment target unexpectedly replaced")
            }
            TransformError::ComputedShorthandProperty => {
                f.write_str("shorthand property must not be computed")
            }
            TransformError::MethodValueNotFunction => {
                f.write_str("method property value must be a function expression")
            }
        }
    }
}

impl Error for TransformError {}

/// Source of fresh identifiers, one per transform invocation.
#[derive(Debug, Clone)]
pub struct NameSource {
    prefix: String,
    counter: usize,
}

impl NameSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    pub fn next_ident(&mut self) -> Identifier {
        self.counter += 1;
        Identifier::new(format!("{}{}", self.prefix, self.counter))
    }
}

/// One rewrite stage. The traversal calls the hook matching each
/// visited node's kind; a pass overrides only the hooks it cares about
/// and may replace the node through the mutable reference.
pub trait Pass {
    fn process_program(&mut self, _program: &mut Program) -> Result<(), TransformError> {
        Ok(())
    }

    fn process_statement(&mut self, _statement: &mut Statement) -> Result<(), TransformError> {
        Ok(())
    }

    /// Called for every block node, whether it sits in statement
    /// position or serves as a function/`try` body.
    fn process_block(&mut self, _block: &mut BlockStatement) -> Result<(), TransformError> {
        Ok(())
    }

    fn process_expression(&mut self, _expression: &mut Expression) -> Result<(), TransformError> {
        Ok(())
    }

    fn process_declarator(
        &mut self,
        _declarator: &mut VariableDeclarator,
    ) -> Result<(), TransformError> {
        Ok(())
    }

    fn process_switch_case(&mut self, _case: &mut SwitchCase) -> Result<(), TransformError> {
        Ok(())
    }
}

/// Rewrite `program` in place into its deobfuscated form. Fresh
/// temporaries are named `<temp_prefix><n>` with `n` counting up
/// from 1.
pub fn transform(program: &mut Program, temp_prefix: &str) -> Result<(), TransformError> {
    let mut passes: Vec<Box<dyn Pass>> = vec![
        Box::new(Unsequence::new(NameSource::new(temp_prefix))),
        Box::new(Respelling),
        Box::new(IfBraces),
        Box::new(FlattenInvoked),
        Box::new(LabelFunctionArray),
    ];

    walk::walk_program(program, &mut passes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_source_counts_from_one() {
        let mut names = NameSource::new(DEFAULT_TEMP_PREFIX);
        assert_eq!(names.next_ident().name, "_$$_1");
        assert_eq!(names.next_ident().name, "_$$_2");
    }

    #[test]
    fn test_name_source_uses_configured_prefix() {
        let mut names = NameSource::new("tmp_");
        assert_eq!(names.next_ident().name, "tmp_1");
    }
}
