//! The ESTree-shaped syntax tree the whole pipeline works on.
//!
//! Nodes are plain data: two sum types ([`Expression`] and [`Statement`])
//! plus a handful of record structs (`Program`, `Property`,
//! `VariableDeclarator`, ...). The parser builds them, the transform
//! passes rewrite them in place, and the formatter turns them back into
//! source text. Sum-typed nodes serialize to JSON with their ESTree
//! `type` tag for the `--ast` dump mode.

mod expression;
mod statement;

pub use self::expression::*;
pub use self::statement::*;

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Root of a parsed script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Statement>,
}

impl Serialize for Program {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Program", 2)?;
        state.serialize_field("type", "Program")?;
        state.serialize_field("body", &self.body)?;
        state.end()
    }
}
