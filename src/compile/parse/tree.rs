use serde_json::Value;
use std::fmt::{Display, Formatter, Result};

/// A node within a compiled expression.
///
/// Each grammar construct has one variant, holding owned sub-expressions.
/// A tree is built once per expression string and evaluated against a
/// scope, possibly more than once.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value such as `10`, `'name'`, `true` or `null`.
    Literal(Value),
    /// A name resolved against the scope chain.
    Identifier(String),
    /// A prefix operation such as `!ready` or `-offset`.
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    /// An infix operation such as `a + b` or `a && b`.
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// A ternary conditional, `condition ? then : otherwise`.
    Conditional {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    /// A call to a built-in function, such as `min(1, 2)`.
    Call {
        name: String,
        arguments: Vec<Expression>,
    },
    /// An index operation, `object[index]`.
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    /// A slice operation, `object[begin:end]`, either bound optional.
    Slice {
        object: Box<Expression>,
        begin: Option<Box<Expression>>,
        end: Option<Box<Expression>>,
    },
    /// A property access, `object.name`.
    Property {
        object: Box<Expression>,
        name: String,
    },
    /// An array literal, `[1, 2, 3]`.
    Array(Vec<Expression>),
    /// An object literal, `{a: 1, "b c": 2}`.
    ///
    /// The grammar only admits fixed keys, a string literal or a bare
    /// identifier, so keys are stored resolved.
    Object(Vec<(String, Expression)>),
}

/// An infix operator within an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    Lesser,
    LesserOrEqual,
    Greater,
    GreaterOrEqual,
    In,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Lesser => "<",
            BinaryOperator::LesserOrEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::In => "in",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "**",
        };

        f.write_str(text)
    }
}

/// A prefix operator within an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    /// `!`, logical negation of truthiness.
    Not,
    /// `-`, numeric negation.
    Negative,
    /// `+`, identity on numbers.
    Positive,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Negative => "-",
            UnaryOperator::Positive => "+",
        };

        f.write_str(text)
    }
}
