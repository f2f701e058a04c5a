//! Name the anonymous functions in array initialisers after the
//! declared variable, so stack traces and the rewritten source read
//! better: `var handlers = [function() {}, ...]` gives the elements
//! names `handlers0`, `handlers1`, ...

use crate::ast::{Expression, Identifier, VariableDeclarator};

use super::{Pass, TransformError};

pub struct LabelFunctionArray;

impl Pass for LabelFunctionArray {
    fn process_declarator(
        &mut self,
        declarator: &mut VariableDeclarator,
    ) -> Result<(), TransformError> {
        let Some(Expression::Array(array)) = &mut declarator.init else {
            return Ok(());
        };

        for (index, element) in array.elements.iter_mut().enumerate() {
            let Some(Expression::Function(function)) = element else {
                continue;
            };
            if function.id.is_some() {
                continue;
            }
            function.id = Some(Identifier::new(format!("{}{}", declarator.id.name, index)));
        }
        Ok(())
    }
}
