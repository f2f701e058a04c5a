//! Give brace-less `if`/`else` and loop bodies explicit blocks.
//! `else if` chains stay flat.

use std::mem;

use crate::ast::{BlockStatement, EmptyStatement, Statement};

use super::{Pass, TransformError};

pub struct IfBraces;

impl Pass for IfBraces {
    fn process_statement(&mut self, statement: &mut Statement) -> Result<(), TransformError> {
        match statement {
            Statement::If(if_statement) => {
                wrap_body(&mut if_statement.consequent);
                if let Some(alternate) = &mut if_statement.alternate {
                    if !matches!(**alternate, Statement::If(_)) {
                        wrap_body(alternate);
                    }
                }
            }
            Statement::While(statement) => wrap_body(&mut statement.body),
            Statement::DoWhile(statement) => wrap_body(&mut statement.body),
            Statement::For(statement) => wrap_body(&mut statement.body),
            Statement::ForIn(statement) => wrap_body(&mut statement.body),
            Statement::ForOf(statement) => wrap_body(&mut statement.body),
            _ => {}
        }
        Ok(())
    }
}

fn wrap_body(body: &mut Box<Statement>) {
    if matches!(**body, Statement::Block(_) | Statement::Empty(_)) {
        return;
    }
    let inner = mem::replace(&mut **body, Statement::Empty(EmptyStatement {}));
    **body = Statement::Block(BlockStatement { body: vec![inner] });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;
    use crate::parser::parse_source;
    use crate::transform::walk;

    fn brace(source: &str) -> Program {
        let mut program = parse_source(source).unwrap();
        let mut passes: Vec<Box<dyn Pass>> = vec![Box::new(IfBraces)];
        walk::walk_program(&mut program, &mut passes).unwrap();
        program
    }

    fn assert_braced(source: &str, expected: &str) {
        assert_eq!(brace(source), parse_source(expected).unwrap());
    }

    #[test]
    fn test_braceless_if_bodies_get_blocks() {
        assert_braced("if (a) b(); else c();", "if (a) { b(); } else { c(); }");
    }

    #[test]
    fn test_else_if_chains_stay_flat() {
        assert_braced(
            "if (a) b(); else if (c) d(); else e();",
            "if (a) { b(); } else if (c) { d(); } else { e(); }",
        );
    }

    #[test]
    fn test_loop_bodies_get_blocks() {
        assert_braced("while (a) b();", "while (a) { b(); }");
        assert_braced("do b(); while (a);", "do { b(); } while (a);");
        assert_braced("for (;;) b();", "for (;;) { b(); }");
        assert_braced("for (k in o) b();", "for (k in o) { b(); }");
    }

    #[test]
    fn test_empty_bodies_are_left_alone() {
        assert_braced("while (a);", "while (a);");
        assert_braced("if (a); else;", "if (a); else;");
    }

    #[test]
    fn test_existing_blocks_are_left_alone() {
        assert_braced("if (a) { b(); }", "if (a) { b(); }");
    }
}
