//! Turn the (rewritten) AST back into JavaScript source text.
//!
//! Every node implements [`Format`]; the [`FormatterContext`] carries
//! the output buffer and indentation state. Expressions are emitted
//! with precedence-aware parenthesisation so the printed text parses
//! back to the same tree.

pub mod expression;
pub mod statement;

use std::fmt::Write;

use crate::ast::Program;

pub trait Format {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error>;
}

#[derive(Debug, Clone)]
pub struct FormatterContext {
    pub output: String,
    indent_level: usize,
    indent_string: String,
}

impl FormatterContext {
    pub fn new() -> Self {
        Self::with_indent_size(4)
    }

    pub fn with_indent_size(indent_size: usize) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            indent_string: " ".repeat(indent_size),
        }
    }

    pub fn write(&mut self, text: &str) -> Result<(), std::fmt::Error> {
        self.output.write_str(text)
    }

    pub fn write_indent(&mut self) -> Result<(), std::fmt::Error> {
        for _ in 0..self.indent_level {
            self.output.write_str(&self.indent_string)?;
        }
        Ok(())
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn write_newline(&mut self) -> Result<(), std::fmt::Error> {
        self.write("\n")
    }

    pub fn write_separated<T, F>(
        &mut self,
        items: &[T],
        separator: &str,
        mut formatter: F,
    ) -> Result<(), std::fmt::Error>
    where
        F: FnMut(&mut Self, &T) -> Result<(), std::fmt::Error>,
    {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(separator)?;
            }
            formatter(self, item)?;
        }
        Ok(())
    }
}

impl Default for FormatterContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Emit a whole program, one statement per line.
pub fn format_program(program: &Program) -> Result<String, std::fmt::Error> {
    let mut ctx = FormatterContext::new();
    for statement in &program.body {
        ctx.write_indent()?;
        statement.format(&mut ctx)?;
        ctx.write_newline()?;
    }
    Ok(ctx.output)
}
