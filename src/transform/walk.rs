//! The shared traversal. Every node is visited exactly once: first all
//! pass hooks run on it in pipeline order, then the walk descends into
//! whatever children the (possibly rewritten) node has.

use crate::ast::{
    BlockStatement, Expression, ForInit, ForTarget, Program, Statement, SwitchCase,
    VariableDeclarator,
};

use super::{Pass, TransformError};

pub(crate) type Passes = [Box<dyn Pass>];

pub(crate) fn walk_program(
    program: &mut Program,
    passes: &mut Passes,
) -> Result<(), TransformError> {
    for pass in passes.iter_mut() {
        pass.process_program(program)?;
    }
    for statement in &mut program.body {
        walk_statement(statement, passes)?;
    }
    Ok(())
}

fn walk_statement(statement: &mut Statement, passes: &mut Passes) -> Result<(), TransformError> {
    for pass in passes.iter_mut() {
        pass.process_statement(statement)?;
    }

    match statement {
        Statement::Expression(expression_statement) => {
            walk_expression(&mut expression_statement.expression, passes)?;
        }
        Statement::Block(block) => walk_block(block, passes)?,
        Statement::VariableDeclaration(declaration) => {
            for declarator in &mut declaration.declarations {
                walk_declarator(declarator, passes)?;
            }
        }
        Statement::FunctionDeclaration(function) => walk_block(&mut function.body, passes)?,
        Statement::If(if_statement) => {
            walk_expression(&mut if_statement.test, passes)?;
            walk_statement(&mut if_statement.consequent, passes)?;
            if let Some(alternate) = &mut if_statement.alternate {
                walk_statement(alternate, passes)?;
            }
        }
        Statement::Return(return_statement) => {
            if let Some(argument) = &mut return_statement.argument {
                walk_expression(argument, passes)?;
            }
        }
        Statement::Throw(throw_statement) => {
            walk_expression(&mut throw_statement.argument, passes)?;
        }
        Statement::While(while_statement) => {
            walk_expression(&mut while_statement.test, passes)?;
            walk_statement(&mut while_statement.body, passes)?;
        }
        Statement::DoWhile(do_while) => {
            walk_statement(&mut do_while.body, passes)?;
            walk_expression(&mut do_while.test, passes)?;
        }
        Statement::For(for_statement) => {
            match &mut for_statement.init {
                Some(ForInit::Declaration(declaration)) => {
                    for declarator in &mut declaration.declarations {
                        walk_declarator(declarator, passes)?;
                    }
                }
                Some(ForInit::Expression(expression)) => walk_expression(expression, passes)?,
                None => {}
            }
            if let Some(test) = &mut for_statement.test {
                walk_expression(test, passes)?;
            }
            if let Some(update) = &mut for_statement.update {
                walk_expression(update, passes)?;
            }
            walk_statement(&mut for_statement.body, passes)?;
        }
        Statement::ForIn(for_in) => {
            walk_for_target(&mut for_in.left, passes)?;
            walk_expression(&mut for_in.right, passes)?;
            walk_statement(&mut for_in.body, passes)?;
        }
        Statement::ForOf(for_of) => {
            walk_for_target(&mut for_of.left, passes)?;
            walk_expression(&mut for_of.right, passes)?;
            walk_statement(&mut for_of.body, passes)?;
        }
        Statement::Switch(switch) => {
            walk_expression(&mut switch.discriminant, passes)?;
            for case in &mut switch.cases {
                walk_switch_case(case, passes)?;
            }
        }
        Statement::Try(try_statement) => {
            walk_block(&mut try_statement.block, passes)?;
            if let Some(handler) = &mut try_statement.handler {
                walk_block(&mut handler.body, passes)?;
            }
            if let Some(finalizer) = &mut try_statement.finalizer {
                walk_block(finalizer, passes)?;
            }
        }
        Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => {}
    }

    Ok(())
}

fn walk_block(block: &mut BlockStatement, passes: &mut Passes) -> Result<(), TransformError> {
    for pass in passes.iter_mut() {
        pass.process_block(block)?;
    }
    for statement in &mut block.body {
        walk_statement(statement, passes)?;
    }
    Ok(())
}

fn walk_switch_case(case: &mut SwitchCase, passes: &mut Passes) -> Result<(), TransformError> {
    for pass in passes.iter_mut() {
        pass.process_switch_case(case)?;
    }
    if let Some(test) = &mut case.test {
        walk_expression(test, passes)?;
    }
    for statement in &mut case.consequent {
        walk_statement(statement, passes)?;
    }
    Ok(())
}

fn walk_declarator(
    declarator: &mut VariableDeclarator,
    passes: &mut Passes,
) -> Result<(), TransformError> {
    for pass in passes.iter_mut() {
        pass.process_declarator(declarator)?;
    }
    if let Some(init) = &mut declarator.init {
        walk_expression(init, passes)?;
    }
    Ok(())
}

fn walk_for_target(target: &mut ForTarget, passes: &mut Passes) -> Result<(), TransformError> {
    match target {
        ForTarget::Declaration(declaration) => {
            for declarator in &mut declaration.declarations {
                walk_declarator(declarator, passes)?;
            }
        }
        ForTarget::Expression(expression) => walk_expression(expression, passes)?,
    }
    Ok(())
}

fn walk_expression(expression: &mut Expression, passes: &mut Passes) -> Result<(), TransformError> {
    for pass in passes.iter_mut() {
        pass.process_expression(expression)?;
    }

    match expression {
        Expression::Identifier(_) | Expression::Literal(_) | Expression::This(_) => {}
        Expression::Array(array) => {
            for element in array.elements.iter_mut().flatten() {
                walk_expression(element, passes)?;
            }
        }
        Expression::Object(object) => {
            for property in &mut object.properties {
                walk_expression(&mut property.key, passes)?;
                walk_expression(&mut property.value, passes)?;
            }
        }
        Expression::Function(function) => walk_block(&mut function.body, passes)?,
        Expression::Unary(unary) => walk_expression(&mut unary.argument, passes)?,
        Expression::Update(update) => walk_expression(&mut update.argument, passes)?,
        Expression::Binary(binary) => {
            walk_expression(&mut binary.left, passes)?;
            walk_expression(&mut binary.right, passes)?;
        }
        Expression::Logical(logical) => {
            walk_expression(&mut logical.left, passes)?;
            walk_expression(&mut logical.right, passes)?;
        }
        Expression::Assignment(assignment) => {
            walk_expression(&mut assignment.left, passes)?;
            walk_expression(&mut assignment.right, passes)?;
        }
        Expression::Conditional(conditional) => {
            walk_expression(&mut conditional.test, passes)?;
            walk_expression(&mut conditional.consequent, passes)?;
            walk_expression(&mut conditional.alternate, passes)?;
        }
        Expression::Call(call) => {
            walk_expression(&mut call.callee, passes)?;
            for argument in &mut call.arguments {
                walk_expression(argument, passes)?;
            }
        }
        Expression::New(new) => {
            walk_expression(&mut new.callee, passes)?;
            for argument in &mut new.arguments {
                walk_expression(argument, passes)?;
            }
        }
        Expression::Member(member) => {
            walk_expression(&mut member.object, passes)?;
            walk_expression(&mut member.property, passes)?;
        }
        Expression::Sequence(sequence) => {
            for expression in &mut sequence.expressions {
                walk_expression(expression, passes)?;
            }
        }
    }

    Ok(())
}
