//! Expression parser.
//!
//! Pulls tokens from a Lexer and builds an [`Expression`] tree following
//! the precedence ladder, lowest to highest binding:
//!
//! conditional, logical or, logical and, equality, relational, `in`,
//! additive, multiplicative, power, unary, postfix, primary.
pub mod tree;

use crate::{
    compile::lex::{
        token::{Operator, Token},
        Lexer, TokenResult,
    },
    log::{error_eof, Code, Error, UNEXPECTED_TOKEN},
    region::Region,
    value,
};
use serde_json::Value;
use tree::{BinaryOperator, Expression, UnaryOperator};

type ExpressionResult = Result<Expression, Error>;

pub struct Parser<'source> {
    /// Lexer used to pull from source as tokens instead of raw text.
    lexer: Lexer<'source>,
    /// Store peeked tokens.
    ///
    /// Double option is used to remember when the next token is None.
    buffer: Option<Option<(Token, Region)>>,
}

impl<'source> Parser<'source> {
    /// Create a new Parser from the given string.
    #[inline]
    pub fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(source),
            buffer: None,
        }
    }

    /// Compile the expression.
    ///
    /// Returns an [`Expression`] that can be evaluated against a scope.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the source is not a single complete
    /// expression.
    pub fn compile(mut self) -> ExpressionResult {
        let expression = self.parse_expression()?;

        if let Some((token, region)) = self.next()? {
            return Err(Error::new(Code::SyntaxError, UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help(format!("expected end of expression, found `{token}`")));
        }

        Ok(expression)
    }

    /// Parse an expression, beginning at the lowest binding level.
    fn parse_expression(&mut self) -> ExpressionResult {
        self.parse_conditional()
    }

    /// Parse a conditional, `condition ? then : otherwise`.
    ///
    /// Both branches are themselves full conditionals, so the form nests
    /// to the right.
    fn parse_conditional(&mut self) -> ExpressionResult {
        let expression = self.parse_or()?;

        if self.next_is(Token::Question)? {
            self.next_must(Token::Question)?;
            let then = self.parse_conditional()?;
            self.next_must(Token::Colon)?;
            let otherwise = self.parse_conditional()?;

            return Ok(Expression::Conditional {
                condition: Box::new(expression),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }

        Ok(expression)
    }

    fn parse_or(&mut self) -> ExpressionResult {
        let mut expression = self.parse_and()?;

        while self.next_is(Token::Or)? {
            self.next_must(Token::Or)?;
            let right = self.parse_and()?;
            expression = binary(BinaryOperator::Or, expression, right);
        }

        Ok(expression)
    }

    fn parse_and(&mut self) -> ExpressionResult {
        let mut expression = self.parse_equality()?;

        while self.next_is(Token::And)? {
            self.next_must(Token::And)?;
            let right = self.parse_equality()?;
            expression = binary(BinaryOperator::And, expression, right);
        }

        Ok(expression)
    }

    fn parse_equality(&mut self) -> ExpressionResult {
        let mut expression = self.parse_relational()?;

        while let Some(operator) = self.next_operator(&[
            (Operator::Equal, BinaryOperator::Equal),
            (Operator::NotEqual, BinaryOperator::NotEqual),
        ])? {
            let right = self.parse_relational()?;
            expression = binary(operator, expression, right);
        }

        Ok(expression)
    }

    fn parse_relational(&mut self) -> ExpressionResult {
        let mut expression = self.parse_in()?;

        while let Some(operator) = self.next_operator(&[
            (Operator::Lesser, BinaryOperator::Lesser),
            (Operator::LesserOrEqual, BinaryOperator::LesserOrEqual),
            (Operator::Greater, BinaryOperator::Greater),
            (Operator::GreaterOrEqual, BinaryOperator::GreaterOrEqual),
        ])? {
            let right = self.parse_in()?;
            expression = binary(operator, expression, right);
        }

        Ok(expression)
    }

    fn parse_in(&mut self) -> ExpressionResult {
        let mut expression = self.parse_additive()?;

        while self.next_is(Token::In)? {
            self.next_must(Token::In)?;
            let right = self.parse_additive()?;
            expression = binary(BinaryOperator::In, expression, right);
        }

        Ok(expression)
    }

    fn parse_additive(&mut self) -> ExpressionResult {
        let mut expression = self.parse_multiplicative()?;

        while let Some(operator) = self.next_operator(&[
            (Operator::Add, BinaryOperator::Add),
            (Operator::Subtract, BinaryOperator::Subtract),
        ])? {
            let right = self.parse_multiplicative()?;
            expression = binary(operator, expression, right);
        }

        Ok(expression)
    }

    fn parse_multiplicative(&mut self) -> ExpressionResult {
        let mut expression = self.parse_power()?;

        while let Some(operator) = self.next_operator(&[
            (Operator::Multiply, BinaryOperator::Multiply),
            (Operator::Divide, BinaryOperator::Divide),
            (Operator::Modulo, BinaryOperator::Modulo),
        ])? {
            let right = self.parse_power()?;
            expression = binary(operator, expression, right);
        }

        Ok(expression)
    }

    /// Parse a power operation, `base ** exponent`.
    ///
    /// The right operand is itself a power operation, so `2 ** 3 ** 2`
    /// associates to the right.
    fn parse_power(&mut self) -> ExpressionResult {
        let expression = self.parse_unary()?;

        if self.next_is(Token::Operator(Operator::Power))? {
            self.next_must(Token::Operator(Operator::Power))?;
            let right = self.parse_power()?;

            return Ok(binary(BinaryOperator::Power, expression, right));
        }

        Ok(expression)
    }

    fn parse_unary(&mut self) -> ExpressionResult {
        for (token, operator) in [
            (Token::Exclamation, UnaryOperator::Not),
            (Token::Operator(Operator::Subtract), UnaryOperator::Negative),
            (Token::Operator(Operator::Add), UnaryOperator::Positive),
        ] {
            if self.next_is(token)? {
                self.next_must(token)?;
                let operand = self.parse_unary()?;

                return Ok(Expression::Unary {
                    operator,
                    operand: Box::new(operand),
                });
            }
        }

        self.parse_postfix()
    }

    /// Parse any chain of postfix forms after a primary.
    ///
    /// `.name` yields a property access, `[ ... ]` an index or slice, and
    /// `( ... )` a function call. A call is only valid directly after an
    /// identifier.
    fn parse_postfix(&mut self) -> ExpressionResult {
        let mut expression = self.parse_primary()?;

        loop {
            if self.next_is(Token::Period)? {
                self.next_must(Token::Period)?;
                let name = self.parse_ident()?;

                expression = Expression::Property {
                    object: Box::new(expression),
                    name,
                };
            } else if self.next_is(Token::LeftBracket)? {
                self.next_must(Token::LeftBracket)?;
                expression = self.parse_index_or_slice(expression)?;
            } else if self.next_is(Token::LeftParen)? {
                let (_, region) = self.next_must(Token::LeftParen)?;

                expression = match expression {
                    Expression::Identifier(name) => {
                        let arguments = self.parse_arguments()?;
                        self.next_must(Token::RightParen)?;

                        Expression::Call { name, arguments }
                    }
                    _ => {
                        return Err(Error::new(Code::SyntaxError, "cannot call a non-identifier")
                            .with_pointer(self.lexer.source, region)
                            .with_help("only a built-in function name may precede `(`"));
                    }
                };
            } else {
                break;
            }
        }

        Ok(expression)
    }

    /// Parse the remainder of a `[ ... ]` form, after the opening bracket.
    ///
    /// A `:` before or after the first expression makes the form a slice,
    /// otherwise it is an index.
    fn parse_index_or_slice(&mut self, object: Expression) -> ExpressionResult {
        if self.next_is(Token::Colon)? {
            self.next_must(Token::Colon)?;
            let end = self.parse_slice_end()?;
            self.next_must(Token::RightBracket)?;

            return Ok(Expression::Slice {
                object: Box::new(object),
                begin: None,
                end,
            });
        }

        let first = self.parse_expression()?;

        if self.next_is(Token::Colon)? {
            self.next_must(Token::Colon)?;
            let end = self.parse_slice_end()?;
            self.next_must(Token::RightBracket)?;

            return Ok(Expression::Slice {
                object: Box::new(object),
                begin: Some(Box::new(first)),
                end,
            });
        }

        self.next_must(Token::RightBracket)?;

        Ok(Expression::Index {
            object: Box::new(object),
            index: Box::new(first),
        })
    }

    /// Parse the optional end bound of a slice.
    fn parse_slice_end(&mut self) -> Result<Option<Box<Expression>>, Error> {
        if self.next_is(Token::RightBracket)? {
            return Ok(None);
        }

        Ok(Some(Box::new(self.parse_expression()?)))
    }

    /// Parse a comma separated argument list, stopping before `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, Error> {
        let mut arguments = vec![];

        if !self.next_is(Token::RightParen)? {
            loop {
                arguments.push(self.parse_expression()?);

                if self.next_is(Token::Comma)? {
                    self.next_must(Token::Comma)?;
                } else {
                    break;
                }
            }
        }

        Ok(arguments)
    }

    fn parse_primary(&mut self) -> ExpressionResult {
        match self.next_any_must()? {
            (Token::Number, region) => Ok(Expression::Literal(self.parse_number_literal(region)?)),
            (Token::String, region) => {
                Ok(Expression::Literal(Value::String(self.parse_string(region)?)))
            }
            (Token::True, _) => Ok(Expression::Literal(Value::Bool(true))),
            (Token::False, _) => Ok(Expression::Literal(Value::Bool(false))),
            (Token::Null, _) => Ok(Expression::Literal(Value::Null)),
            (Token::Identifier, region) => Ok(Expression::Identifier(
                self.lexer.source[region].to_string(),
            )),
            (Token::LeftParen, _) => {
                let expression = self.parse_expression()?;
                self.next_must(Token::RightParen)?;

                Ok(expression)
            }
            (Token::LeftBracket, _) => self.parse_array_literal(),
            (Token::LeftBrace, _) => self.parse_object_literal(),
            (_, region) => Err(Error::new(Code::SyntaxError, UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help(
                    "expected a literal, an identifier, `(`, or an array or object literal",
                )),
        }
    }

    /// Parse the remainder of an array literal, after the opening bracket.
    fn parse_array_literal(&mut self) -> ExpressionResult {
        let mut elements = vec![];

        if !self.next_is(Token::RightBracket)? {
            loop {
                elements.push(self.parse_expression()?);

                if self.next_is(Token::Comma)? {
                    self.next_must(Token::Comma)?;
                } else {
                    break;
                }
            }
        }
        self.next_must(Token::RightBracket)?;

        Ok(Expression::Array(elements))
    }

    /// Parse the remainder of an object literal, after the opening brace.
    ///
    /// Keys are string literals or bare identifiers.
    fn parse_object_literal(&mut self) -> ExpressionResult {
        let mut entries = vec![];

        if !self.next_is(Token::RightBrace)? {
            loop {
                let key = match self.next_any_must()? {
                    (Token::String, region) => self.parse_string(region)?,
                    (Token::Identifier, region) => self.lexer.source[region].to_string(),
                    (_, region) => {
                        return Err(Error::new(Code::SyntaxError, UNEXPECTED_TOKEN)
                            .with_pointer(self.lexer.source, region)
                            .with_help("expected a property name"));
                    }
                };
                self.next_must(Token::Colon)?;
                let value = self.parse_expression()?;
                entries.push((key, value));

                if self.next_is(Token::Comma)? {
                    self.next_must(Token::Comma)?;
                } else {
                    break;
                }
            }
        }
        self.next_must(Token::RightBrace)?;

        Ok(Expression::Object(entries))
    }

    /// Parse an identifier and return its text.
    ///
    /// # Errors
    ///
    /// Returns an error if the next token is not an identifier.
    fn parse_ident(&mut self) -> Result<String, Error> {
        match self.next_any_must()? {
            (Token::Identifier, region) => Ok(self.lexer.source[region].to_string()),
            (_, region) => Err(Error::new(Code::SyntaxError, UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help("expected a property name after `.`")),
        }
    }

    /// Parse a String from the literal value of the given Region.
    ///
    /// The surrounding quotes are dropped and escape sequences resolved.
    /// `\n`, `\t` and `\r` have their usual meanings, any other escaped
    /// character stands for itself.
    fn parse_string(&self, region: Region) -> Result<String, Error> {
        let window = region.literal(self.lexer.source);
        let body = &window[1..window.len() - 1];

        if !body.contains('\\') {
            return Ok(body.to_owned());
        }

        let mut string = String::with_capacity(body.len());
        let mut iter = body.chars();
        while let Some(c) = iter.next() {
            match c {
                '\\' => match iter.next() {
                    Some('n') => string.push('\n'),
                    Some('t') => string.push('\t'),
                    Some('r') => string.push('\r'),
                    Some(other) => string.push(other),
                    None => string.push('\\'),
                },
                c => string.push(c),
            }
        }

        Ok(string)
    }

    /// Parse a number [`Value`] from the given Region.
    ///
    /// # Errors
    ///
    /// Returns an error if the literal value of the Region cannot be read
    /// as a double precision float.
    fn parse_number_literal(&self, region: Region) -> Result<Value, Error> {
        let window = region.literal(self.lexer.source);
        let as_number: f64 = window.parse().map_err(|_| {
            Error::new(Code::SyntaxError, "unrecognizable number")
                .with_pointer(self.lexer.source, region)
        })?;

        value::number(as_number).map_err(|_| {
            Error::new(Code::SyntaxError, "unrecognizable number")
                .with_pointer(self.lexer.source, region)
                .with_help("number literals must fit a double precision float")
        })
    }

    /// Consume and return the first of the given operators that matches
    /// the upcoming token, if any.
    fn next_operator(
        &mut self,
        accepted: &[(Operator, BinaryOperator)],
    ) -> Result<Option<BinaryOperator>, Error> {
        for (token, operator) in accepted {
            if self.next_is(Token::Operator(*token))? {
                self.next_must(Token::Operator(*token))?;

                return Ok(Some(*operator));
            }
        }

        Ok(None)
    }

    /// Peek the next token.
    ///
    /// # Errors
    ///
    /// Propagates any error reported by the underlying Lexer.
    fn peek(&mut self) -> TokenResult {
        if let o @ None = &mut self.buffer {
            *o = Some(self.lexer.next()?);
        }

        Ok(self.buffer.unwrap())
    }

    /// Get the next token.
    ///
    /// Prefers to pull a token from the internal buffer first, but will
    /// pull from the lexer when the buffer is empty.
    fn next(&mut self) -> TokenResult {
        match self.buffer.take() {
            Some(t) => Ok(t),
            None => self.lexer.next(),
        }
    }

    /// Returns true if the given token matches the upcoming token.
    ///
    /// # Errors
    ///
    /// Propagates any errors reported by the underlying lexer.
    fn next_is(&mut self, expect: Token) -> Result<bool, Error> {
        Ok(self
            .peek()?
            .map(|(token, _)| token == expect)
            .unwrap_or(false))
    }

    /// Get the next token, and compare it to the given token.
    ///
    /// # Errors
    ///
    /// An error is returned if the next token does not match the given
    /// token, or no tokens are left.
    fn next_must(&mut self, expect: Token) -> Result<(Token, Region), Error> {
        match self.next()? {
            Some((token, region)) => {
                if token == expect {
                    Ok((token, region))
                } else {
                    Err(Error::new(Code::SyntaxError, UNEXPECTED_TOKEN)
                        .with_pointer(self.lexer.source, region)
                        .with_help(format!("expected `{expect}`")))
                }
            }
            None => Err(error_eof(self.lexer.source)),
        }
    }

    /// Get the next token.
    ///
    /// Similar to `next` but requires that a token is returned.
    ///
    /// # Errors
    ///
    /// An error is returned if no more tokens are left.
    fn next_any_must(&mut self) -> Result<(Token, Region), Error> {
        match self.next()? {
            Some((token, region)) => Ok((token, region)),
            None => Err(error_eof(self.lexer.source)),
        }
    }
}

/// Combine two expressions with an infix operator.
fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        tree::{BinaryOperator, Expression, UnaryOperator},
        Parser,
    };
    use serde_json::json;

    #[test]
    fn test_parse_precedence() {
        let expression = helper_compile("1 + 2 * 3");

        assert_eq!(
            expression,
            Expression::Binary {
                operator: BinaryOperator::Add,
                left: Box::new(Expression::Literal(json!(1))),
                right: Box::new(Expression::Binary {
                    operator: BinaryOperator::Multiply,
                    left: Box::new(Expression::Literal(json!(2))),
                    right: Box::new(Expression::Literal(json!(3))),
                }),
            }
        );
    }

    #[test]
    fn test_parse_power_is_right_associative() {
        let expression = helper_compile("2 ** 3 ** 2");

        assert_eq!(
            expression,
            Expression::Binary {
                operator: BinaryOperator::Power,
                left: Box::new(Expression::Literal(json!(2))),
                right: Box::new(Expression::Binary {
                    operator: BinaryOperator::Power,
                    left: Box::new(Expression::Literal(json!(3))),
                    right: Box::new(Expression::Literal(json!(2))),
                }),
            }
        );
    }

    #[test]
    fn test_parse_postfix_chain() {
        let expression = helper_compile("item.tags[0]");

        assert_eq!(
            expression,
            Expression::Index {
                object: Box::new(Expression::Property {
                    object: Box::new(Expression::Identifier("item".to_string())),
                    name: "tags".to_string(),
                }),
                index: Box::new(Expression::Literal(json!(0))),
            }
        );
    }

    #[test]
    fn test_parse_slice_variants() {
        for (source, begin, end) in [
            ("a[1:2]", true, true),
            ("a[1:]", true, false),
            ("a[:2]", false, true),
            ("a[:]", false, false),
        ] {
            match helper_compile(source) {
                Expression::Slice {
                    begin: b, end: e, ..
                } => {
                    assert_eq!(b.is_some(), begin, "begin of `{source}`");
                    assert_eq!(e.is_some(), end, "end of `{source}`");
                }
                other => panic!("`{source}` should be a slice, found {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_unary_nesting() {
        let expression = helper_compile("!!ready");

        assert_eq!(
            expression,
            Expression::Unary {
                operator: UnaryOperator::Not,
                operand: Box::new(Expression::Unary {
                    operator: UnaryOperator::Not,
                    operand: Box::new(Expression::Identifier("ready".to_string())),
                }),
            }
        );
    }

    #[test]
    fn test_parse_conditional_nests_right() {
        let expression = helper_compile("a ? 1 : b ? 2 : 3");

        match expression {
            Expression::Conditional { otherwise, .. } => {
                assert!(matches!(*otherwise, Expression::Conditional { .. }));
            }
            other => panic!("expected conditional, found {other:?}"),
        }
    }

    #[test]
    fn test_parse_object_literal_keys() {
        let expression = helper_compile("{a: 1, 'b c': 2}");

        assert_eq!(
            expression,
            Expression::Object(vec![
                ("a".to_string(), Expression::Literal(json!(1))),
                ("b c".to_string(), Expression::Literal(json!(2))),
            ])
        );
    }

    #[test]
    fn test_parse_string_escapes() {
        let expression = helper_compile(r#"'a\tb\qc'"#);

        assert_eq!(expression, Expression::Literal(json!("a\tbqc")));
    }

    #[test]
    fn test_error_call_non_identifier() {
        assert!(Parser::new("(f)(1)").compile().is_err());
        assert!(Parser::new("a.b(1)").compile().is_err());
    }

    #[test]
    fn test_error_trailing_tokens() {
        assert!(Parser::new("1 2").compile().is_err());
    }

    #[test]
    fn test_error_eof() {
        assert!(Parser::new("1 +").compile().is_err());
        assert!(Parser::new("[1, 2").compile().is_err());
    }

    /// Helper function which compiles the given source, panicking when the
    /// parser reports an error.
    fn helper_compile(source: &str) -> Expression {
        Parser::new(source)
            .compile()
            .unwrap_or_else(|error| panic!("`{source}` should compile: {error:#}"))
    }
}
