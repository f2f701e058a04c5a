use crate::{
    ast::{
        BlockStatement, ForInit, ForTarget, Statement, SwitchStatement, TryStatement,
        VariableDeclaration,
    },
    formatter::{
        expression::{format_with_min_precedence, starts_with_function_or_object},
        Format, FormatterContext,
    },
};

impl Format for Statement {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        match self {
            Statement::Expression(statement) => {
                if starts_with_function_or_object(&statement.expression) {
                    ctx.write("(")?;
                    statement.expression.format(ctx)?;
                    ctx.write(")")?;
                } else {
                    statement.expression.format(ctx)?;
                }
                ctx.write(";")
            }
            Statement::Block(block) => format_block(block, ctx),
            Statement::VariableDeclaration(declaration) => {
                format_variable_declaration(declaration, ctx)?;
                ctx.write(";")
            }
            Statement::FunctionDeclaration(function) => {
                ctx.write("function ")?;
                function.id.format(ctx)?;
                ctx.write("(")?;
                ctx.write_separated(&function.params, ", ", |ctx, param| param.format(ctx))?;
                ctx.write(") ")?;
                format_block(&function.body, ctx)
            }
            Statement::Empty(_) => ctx.write(";"),
            Statement::If(if_statement) => {
                ctx.write("if (")?;
                if_statement.test.format(ctx)?;
                ctx.write(")")?;
                format_attached_body(&if_statement.consequent, ctx)?;

                if let Some(alternate) = &if_statement.alternate {
                    ctx.write(" else")?;
                    if matches!(**alternate, Statement::If(_)) {
                        ctx.write(" ")?;
                        alternate.format(ctx)?;
                    } else {
                        format_attached_body(alternate, ctx)?;
                    }
                }
                Ok(())
            }
            Statement::Return(statement) => {
                ctx.write("return")?;
                if let Some(argument) = &statement.argument {
                    ctx.write(" ")?;
                    argument.format(ctx)?;
                }
                ctx.write(";")
            }
            Statement::Throw(statement) => {
                ctx.write("throw ")?;
                statement.argument.format(ctx)?;
                ctx.write(";")
            }
            Statement::While(statement) => {
                ctx.write("while (")?;
                statement.test.format(ctx)?;
                ctx.write(")")?;
                format_attached_body(&statement.body, ctx)
            }
            Statement::DoWhile(statement) => {
                ctx.write("do")?;
                format_attached_body(&statement.body, ctx)?;
                ctx.write(" while (")?;
                statement.test.format(ctx)?;
                ctx.write(");")
            }
            Statement::For(statement) => {
                ctx.write("for (")?;
                match &statement.init {
                    Some(ForInit::Declaration(declaration)) => {
                        format_variable_declaration(declaration, ctx)?;
                    }
                    Some(ForInit::Expression(expression)) => expression.format(ctx)?,
                    None => {}
                }
                ctx.write(";")?;
                if let Some(test) = &statement.test {
                    ctx.write(" ")?;
                    test.format(ctx)?;
                }
                ctx.write(";")?;
                if let Some(update) = &statement.update {
                    ctx.write(" ")?;
                    update.format(ctx)?;
                }
                ctx.write(")")?;
                format_attached_body(&statement.body, ctx)
            }
            Statement::ForIn(statement) => {
                ctx.write("for (")?;
                format_for_target(&statement.left, ctx)?;
                ctx.write(" in ")?;
                statement.right.format(ctx)?;
                ctx.write(")")?;
                format_attached_body(&statement.body, ctx)
            }
            Statement::ForOf(statement) => {
                ctx.write("for (")?;
                format_for_target(&statement.left, ctx)?;
                ctx.write(" of ")?;
                format_with_min_precedence(&statement.right, 2, ctx)?;
                ctx.write(")")?;
                format_attached_body(&statement.body, ctx)
            }
            Statement::Switch(statement) => statement.format(ctx),
            Statement::Break(statement) => {
                ctx.write("break")?;
                if let Some(label) = &statement.label {
                    ctx.write(" ")?;
                    label.format(ctx)?;
                }
                ctx.write(";")
            }
            Statement::Continue(statement) => {
                ctx.write("continue")?;
                if let Some(label) = &statement.label {
                    ctx.write(" ")?;
                    label.format(ctx)?;
                }
                ctx.write(";")
            }
            Statement::Try(statement) => statement.format(ctx),
        }
    }
}

/// `{` ... `}` with the contents one level deeper.
pub(crate) fn format_block(
    block: &BlockStatement,
    ctx: &mut FormatterContext,
) -> Result<(), std::fmt::Error> {
    if block.body.is_empty() {
        return ctx.write("{}");
    }

    ctx.write("{")?;
    ctx.write_newline()?;
    ctx.indent();
    for statement in &block.body {
        ctx.write_indent()?;
        statement.format(ctx)?;
        ctx.write_newline()?;
    }
    ctx.dedent();
    ctx.write_indent()?;
    ctx.write("}")
}

/// Loop and `if` bodies: blocks go on the same line, empty bodies
/// collapse into the closing `;`, anything else is attached inline.
fn format_attached_body(
    body: &Statement,
    ctx: &mut FormatterContext,
) -> Result<(), std::fmt::Error> {
    match body {
        Statement::Block(block) => {
            ctx.write(" ")?;
            format_block(block, ctx)
        }
        Statement::Empty(_) => ctx.write(";"),
        other => {
            ctx.write(" ")?;
            other.format(ctx)
        }
    }
}

/// Declaration head without the trailing semicolon (shared with `for`
/// heads).
fn format_variable_declaration(
    declaration: &VariableDeclaration,
    ctx: &mut FormatterContext,
) -> Result<(), std::fmt::Error> {
    ctx.write(&declaration.kind.to_string())?;
    ctx.write(" ")?;
    ctx.write_separated(&declaration.declarations, ", ", |ctx, declarator| {
        declarator.id.format(ctx)?;
        if let Some(init) = &declarator.init {
            ctx.write(" = ")?;
            format_with_min_precedence(init, 2, ctx)?;
        }
        Ok(())
    })
}

fn format_for_target(target: &ForTarget, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
    match target {
        ForTarget::Declaration(declaration) => format_variable_declaration(declaration, ctx),
        ForTarget::Expression(expression) => format_with_min_precedence(expression, 18, ctx),
    }
}

impl Format for SwitchStatement {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write("switch (")?;
        self.discriminant.format(ctx)?;
        ctx.write(") {")?;
        ctx.write_newline()?;
        ctx.indent();

        for case in &self.cases {
            ctx.write_indent()?;
            match &case.test {
                Some(test) => {
                    ctx.write("case ")?;
                    test.format(ctx)?;
                    ctx.write(":")?;
                }
                None => ctx.write("default:")?,
            }
            ctx.write_newline()?;
            ctx.indent();
            for statement in &case.consequent {
                ctx.write_indent()?;
                statement.format(ctx)?;
                ctx.write_newline()?;
            }
            ctx.dedent();
        }

        ctx.dedent();
        ctx.write_indent()?;
        ctx.write("}")
    }
}

impl Format for TryStatement {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write("try ")?;
        format_block(&self.block, ctx)?;

        if let Some(handler) = &self.handler {
            ctx.write(" catch ")?;
            if let Some(param) = &handler.param {
                ctx.write("(")?;
                param.format(ctx)?;
                ctx.write(") ")?;
            }
            format_block(&handler.body, ctx)?;
        }

        if let Some(finalizer) = &self.finalizer {
            ctx.write(" finally ")?;
            format_block(finalizer, ctx)?;
        }
        Ok(())
    }
}
