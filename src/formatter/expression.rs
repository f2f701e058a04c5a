use crate::{
    ast::{
        ArrayExpression, AssignmentExpression, BinaryExpression, BinaryOperator, CallExpression,
        ConditionalExpression, Expression, FunctionExpression, Identifier, Literal,
        LogicalExpression, LogicalOperator, MemberExpression, NewExpression, ObjectExpression,
        Property, PropertyKind, SequenceExpression, UnaryExpression, UnaryOperator,
        UpdateExpression, UpdateOperator,
    },
    formatter::{statement::format_block, Format, FormatterContext},
};

/// Binding strength used for parenthesisation; primaries bind
/// strongest.
pub(crate) fn precedence(expression: &Expression) -> u8 {
    match expression {
        Expression::Sequence(_) => 1,
        Expression::Assignment(_) => 2,
        Expression::Conditional(_) => 3,
        Expression::Logical(logical) => logical_precedence(logical.operator),
        Expression::Binary(binary) => binary_precedence(binary.operator),
        Expression::Unary(_) => 16,
        Expression::Update(update) => {
            if update.prefix {
                16
            } else {
                17
            }
        }
        Expression::Call(_) | Expression::New(_) => 18,
        Expression::Member(_) => 19,
        _ => 20,
    }
}

fn logical_precedence(operator: LogicalOperator) -> u8 {
    match operator {
        LogicalOperator::NullishCoalescing => 4,
        LogicalOperator::Or => 5,
        LogicalOperator::And => 6,
    }
}

fn binary_precedence(operator: BinaryOperator) -> u8 {
    use BinaryOperator::*;
    match operator {
        BitOr => 7,
        BitXor => 8,
        BitAnd => 9,
        Equal | NotEqual | StrictEqual | StrictNotEqual => 10,
        LessThan | LessThanEqual | GreaterThan | GreaterThanEqual | In | Instanceof => 11,
        ShiftLeft | ShiftRight | ShiftRightUnsigned => 12,
        Add | Subtract => 13,
        Multiply | Divide | Remainder => 14,
        Exponent => 15,
    }
}

/// Emit the expression, parenthesised if it binds weaker than the
/// position requires.
pub(crate) fn format_with_min_precedence(
    expression: &Expression,
    min_precedence: u8,
    ctx: &mut FormatterContext,
) -> Result<(), std::fmt::Error> {
    if precedence(expression) < min_precedence {
        ctx.write("(")?;
        expression.format(ctx)?;
        ctx.write(")")
    } else {
        expression.format(ctx)
    }
}

/// Whether the emitted text would begin with `function` or `{`, which
/// an expression statement must shield with parentheses.
pub(crate) fn starts_with_function_or_object(expression: &Expression) -> bool {
    match expression {
        Expression::Function(_) | Expression::Object(_) => true,
        Expression::Assignment(assignment) => starts_with_function_or_object(&assignment.left),
        Expression::Binary(binary) => starts_with_function_or_object(&binary.left),
        Expression::Logical(logical) => starts_with_function_or_object(&logical.left),
        Expression::Conditional(conditional) => starts_with_function_or_object(&conditional.test),
        Expression::Call(call) => starts_with_function_or_object(&call.callee),
        Expression::Member(member) => starts_with_function_or_object(&member.object),
        Expression::Update(update) if !update.prefix => {
            starts_with_function_or_object(&update.argument)
        }
        Expression::Sequence(sequence) => sequence
            .expressions
            .first()
            .map(starts_with_function_or_object)
            .unwrap_or(false),
        _ => false,
    }
}

impl Format for Expression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        match self {
            Expression::Identifier(identifier) => identifier.format(ctx),
            Expression::Literal(literal) => literal.format(ctx),
            Expression::This(_) => ctx.write("this"),
            Expression::Array(array) => array.format(ctx),
            Expression::Object(object) => object.format(ctx),
            Expression::Function(function) => function.format(ctx),
            Expression::Unary(unary) => unary.format(ctx),
            Expression::Update(update) => update.format(ctx),
            Expression::Binary(binary) => binary.format(ctx),
            Expression::Logical(logical) => logical.format(ctx),
            Expression::Assignment(assignment) => assignment.format(ctx),
            Expression::Conditional(conditional) => conditional.format(ctx),
            Expression::Call(call) => call.format(ctx),
            Expression::New(new) => new.format(ctx),
            Expression::Member(member) => member.format(ctx),
            Expression::Sequence(sequence) => sequence.format(ctx),
        }
    }
}

impl Format for Identifier {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write(&self.name)
    }
}

impl Format for Literal {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write(&self.raw)
    }
}

impl Format for ArrayExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write("[")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                ctx.write(", ")?;
            }
            if let Some(element) = element {
                format_with_min_precedence(element, 2, ctx)?;
            }
        }
        // A trailing elision only counts with an extra comma.
        if matches!(self.elements.last(), Some(None)) {
            ctx.write(",")?;
        }
        ctx.write("]")
    }
}

impl Format for ObjectExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        if self.properties.is_empty() {
            return ctx.write("{}");
        }

        let multiline = self.properties.len() > 3
            || self
                .properties
                .iter()
                .any(|property| matches!(property.value, Expression::Function(_)));

        if multiline {
            ctx.write("{")?;
            ctx.write_newline()?;
            ctx.indent();
            for (i, property) in self.properties.iter().enumerate() {
                ctx.write_indent()?;
                property.format(ctx)?;
                if i + 1 < self.properties.len() {
                    ctx.write(",")?;
                }
                ctx.write_newline()?;
            }
            ctx.dedent();
            ctx.write_indent()?;
            ctx.write("}")
        } else {
            ctx.write("{ ")?;
            ctx.write_separated(&self.properties, ", ", |ctx, property| property.format(ctx))?;
            ctx.write(" }")
        }
    }
}

impl Format for Property {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        let write_key = |ctx: &mut FormatterContext| -> Result<(), std::fmt::Error> {
            if self.computed {
                ctx.write("[")?;
                format_with_min_precedence(&self.key, 2, ctx)?;
                ctx.write("]")
            } else {
                self.key.format(ctx)
            }
        };

        match self.kind {
            PropertyKind::Get | PropertyKind::Set => {
                ctx.write(if self.kind == PropertyKind::Get {
                    "get "
                } else {
                    "set "
                })?;
                write_key(ctx)?;
                let Expression::Function(function) = &self.value else {
                    // Accessor values are function expressions by
                    // construction; fall back to a data spelling.
                    ctx.write(": ")?;
                    return format_with_min_precedence(&self.value, 2, ctx);
                };
                format_function_parts(function, ctx)
            }
            PropertyKind::Init if self.method => {
                write_key(ctx)?;
                let Expression::Function(function) = &self.value else {
                    ctx.write(": ")?;
                    return format_with_min_precedence(&self.value, 2, ctx);
                };
                format_function_parts(function, ctx)
            }
            PropertyKind::Init if self.shorthand => self.key.format(ctx),
            PropertyKind::Init => {
                write_key(ctx)?;
                ctx.write(": ")?;
                format_with_min_precedence(&self.value, 2, ctx)
            }
        }
    }
}

/// `(params) { body }`, shared by methods and accessors.
fn format_function_parts(
    function: &FunctionExpression,
    ctx: &mut FormatterContext,
) -> Result<(), std::fmt::Error> {
    ctx.write("(")?;
    ctx.write_separated(&function.params, ", ", |ctx, param| param.format(ctx))?;
    ctx.write(") ")?;
    format_block(&function.body, ctx)
}

impl Format for FunctionExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write("function")?;
        if let Some(id) = &self.id {
            ctx.write(" ")?;
            id.format(ctx)?;
        }
        format_function_parts(self, ctx)
    }
}

impl Format for UnaryExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write(&self.operator.to_string())?;
        if self.operator.is_word() {
            ctx.write(" ")?;
        }

        // `- -x` would lex as `--x`; force parentheses instead.
        let sign_clash = match (self.operator, &*self.argument) {
            (UnaryOperator::Minus, Expression::Unary(inner)) => {
                inner.operator == UnaryOperator::Minus
            }
            (UnaryOperator::Minus, Expression::Update(inner)) => {
                inner.prefix && inner.operator == UpdateOperator::Decrement
            }
            (UnaryOperator::Plus, Expression::Unary(inner)) => {
                inner.operator == UnaryOperator::Plus
            }
            (UnaryOperator::Plus, Expression::Update(inner)) => {
                inner.prefix && inner.operator == UpdateOperator::Increment
            }
            _ => false,
        };
        if sign_clash {
            ctx.write("(")?;
            self.argument.format(ctx)?;
            return ctx.write(")");
        }
        format_with_min_precedence(&self.argument, 16, ctx)
    }
}

impl Format for UpdateExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        if self.prefix {
            ctx.write(&self.operator.to_string())?;
            let sign_clash = match (self.operator, &*self.argument) {
                (UpdateOperator::Decrement, Expression::Unary(inner)) => {
                    inner.operator == UnaryOperator::Minus
                }
                (UpdateOperator::Increment, Expression::Unary(inner)) => {
                    inner.operator == UnaryOperator::Plus
                }
                _ => false,
            };
            if sign_clash {
                ctx.write("(")?;
                self.argument.format(ctx)?;
                return ctx.write(")");
            }
            format_with_min_precedence(&self.argument, 16, ctx)
        } else {
            format_with_min_precedence(&self.argument, 18, ctx)?;
            ctx.write(&self.operator.to_string())
        }
    }
}

impl Format for BinaryExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        let precedence = binary_precedence(self.operator);
        let (left_min, right_min) = if self.operator == BinaryOperator::Exponent {
            (precedence + 1, precedence)
        } else {
            (precedence, precedence + 1)
        };

        format_with_min_precedence(&self.left, left_min, ctx)?;
        ctx.write(" ")?;
        ctx.write(&self.operator.to_string())?;
        ctx.write(" ")?;
        format_with_min_precedence(&self.right, right_min, ctx)
    }
}

impl Format for LogicalExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        let precedence = logical_precedence(self.operator);

        // `??` must not mix bare with `&&`/`||`.
        let nullish_clash = |side: &Expression| {
            self.operator == LogicalOperator::NullishCoalescing
                && matches!(
                    side,
                    Expression::Logical(inner)
                        if matches!(inner.operator, LogicalOperator::And | LogicalOperator::Or)
                )
        };

        if nullish_clash(&self.left) {
            ctx.write("(")?;
            self.left.format(ctx)?;
            ctx.write(")")?;
        } else {
            format_with_min_precedence(&self.left, precedence, ctx)?;
        }

        ctx.write(" ")?;
        ctx.write(&self.operator.to_string())?;
        ctx.write(" ")?;

        if nullish_clash(&self.right) {
            ctx.write("(")?;
            self.right.format(ctx)?;
            ctx.write(")")
        } else {
            format_with_min_precedence(&self.right, precedence + 1, ctx)
        }
    }
}

impl Format for AssignmentExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        format_with_min_precedence(&self.left, 18, ctx)?;
        ctx.write(" ")?;
        ctx.write(&self.operator.to_string())?;
        ctx.write(" ")?;
        format_with_min_precedence(&self.right, 2, ctx)
    }
}

impl Format for ConditionalExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        format_with_min_precedence(&self.test, 4, ctx)?;
        ctx.write(" ? ")?;
        format_with_min_precedence(&self.consequent, 2, ctx)?;
        ctx.write(" : ")?;
        format_with_min_precedence(&self.alternate, 2, ctx)
    }
}

impl Format for CallExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        format_with_min_precedence(&self.callee, 18, ctx)?;
        ctx.write("(")?;
        ctx.write_separated(&self.arguments, ", ", |ctx, argument| {
            format_with_min_precedence(argument, 2, ctx)
        })?;
        ctx.write(")")
    }
}

impl Format for NewExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write("new ")?;
        // A call anywhere in the callee chain would swallow the
        // constructor arguments.
        if callee_contains_call(&self.callee) {
            ctx.write("(")?;
            self.callee.format(ctx)?;
            ctx.write(")")?;
        } else {
            format_with_min_precedence(&self.callee, 19, ctx)?;
        }
        ctx.write("(")?;
        ctx.write_separated(&self.arguments, ", ", |ctx, argument| {
            format_with_min_precedence(argument, 2, ctx)
        })?;
        ctx.write(")")
    }
}

fn callee_contains_call(expression: &Expression) -> bool {
    match expression {
        Expression::Call(_) => true,
        Expression::Member(member) => callee_contains_call(&member.object),
        _ => false,
    }
}

impl Format for MemberExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        // `0.x` would read the dot as a decimal point.
        let integer_object = matches!(
            &*self.object,
            Expression::Literal(literal) if literal.raw.bytes().all(|b| b.is_ascii_digit())
        );
        if integer_object {
            ctx.write("(")?;
            self.object.format(ctx)?;
            ctx.write(")")?;
        } else {
            format_with_min_precedence(&self.object, 18, ctx)?;
        }

        if self.computed {
            ctx.write("[")?;
            format_with_min_precedence(&self.property, 1, ctx)?;
            ctx.write("]")
        } else {
            ctx.write(".")?;
            self.property.format(ctx)
        }
    }
}

impl Format for SequenceExpression {
    fn format(&self, ctx: &mut FormatterContext) -> Result<(), std::fmt::Error> {
        ctx.write_separated(&self.expressions, ", ", |ctx, expression| {
            format_with_min_precedence(expression, 2, ctx)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Statement;
    use crate::formatter::{Format, FormatterContext};
    use crate::parser::parse_source;

    fn roundtrip(source: &str) -> String {
        let program = parse_source(source).unwrap();
        let Statement::Expression(statement) = &program.body[0] else {
            panic!("expected an expression statement");
        };
        let mut ctx = FormatterContext::new();
        statement.expression.format(&mut ctx).unwrap();
        ctx.output
    }

    #[test]
    fn test_precedence_parens_are_minimal() {
        assert_eq!(roundtrip("a + b * c;"), "a + b * c");
        assert_eq!(roundtrip("(a + b) * c;"), "(a + b) * c");
        assert_eq!(roundtrip("a * (b + c);"), "a * (b + c)");
        assert_eq!(roundtrip("a - (b - c);"), "a - (b - c)");
        assert_eq!(roundtrip("a - b - c;"), "a - b - c");
    }

    #[test]
    fn test_logical_and_conditional() {
        assert_eq!(roundtrip("a && b || c;"), "a && b || c");
        assert_eq!(roundtrip("a && (b || c);"), "a && (b || c)");
        assert_eq!(roundtrip("(a || b) ? c : d;"), "a || b ? c : d");
        assert_eq!(roundtrip("a ? b : c ? d : e;"), "a ? b : c ? d : e");
        assert_eq!(roundtrip("(a ? b : c) ? d : e;"), "(a ? b : c) ? d : e");
    }

    #[test]
    fn test_nullish_mixing_is_parenthesised() {
        assert_eq!(roundtrip("a ?? (b || c);"), "a ?? (b || c)");
        assert_eq!(roundtrip("(a && b) ?? c;"), "(a && b) ?? c");
    }

    #[test]
    fn test_member_and_call_chains() {
        assert_eq!(roundtrip("a.b.c;"), "a.b.c");
        assert_eq!(roundtrip("a[b + 1];"), "a[b + 1]");
        assert_eq!(roundtrip("f()(x);"), "f()(x)");
        assert_eq!(roundtrip("(a + b).c;"), "(a + b).c");
        assert_eq!(roundtrip("obj.m.call(obj, x);"), "obj.m.call(obj, x)");
    }

    #[test]
    fn test_new_expressions() {
        assert_eq!(roundtrip("new Foo(1);"), "new Foo(1)");
        assert_eq!(roundtrip("new a.b.C();"), "new a.b.C()");
        assert_eq!(roundtrip("new (f())();"), "new (f())()");
    }

    #[test]
    fn test_unary_spacing() {
        assert_eq!(roundtrip("!a;"), "!a");
        assert_eq!(roundtrip("typeof a;"), "typeof a");
        assert_eq!(roundtrip("void 0;"), "void 0");
        assert_eq!(roundtrip("-(-a);"), "-(-a)");
        assert_eq!(roundtrip("- --a;"), "-(--a)");
    }

    #[test]
    fn test_sequences_and_assignments() {
        assert_eq!(roundtrip("a = b = 1;"), "a = b = 1");
        assert_eq!(roundtrip("a = (b, c);"), "a = (b, c)");
        assert_eq!(roundtrip("a += 1;"), "a += 1");
    }

    #[test]
    fn test_array_holes_survive() {
        assert_eq!(roundtrip("[, 1, , 2];"), "[, 1, , 2]");
        assert_eq!(roundtrip("[1, ,];"), "[1, ,]");
    }

    #[test]
    fn test_small_objects_are_inline() {
        assert_eq!(roundtrip("x = { a: 1, b: c };"), "x = { a: 1, b: c }");
        assert_eq!(roundtrip("x = {};"), "x = {}");
        assert_eq!(roundtrip("x = { [k]: 1 };"), "x = { [k]: 1 }");
    }
}
