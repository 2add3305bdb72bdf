use super::{Pointer, Visual, RED, RESET};
use crate::region::Region;
use std::fmt::{Debug, Display, Formatter, Result};

/// Identifies the category of an [`Error`].
///
/// The code is the stable part of the error contract. Callers that need to
/// react to a specific failure should match on the code, and treat the
/// reason text as display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// An unrecognized `$`-prefixed key was found during validation.
    InvalidOperator,
    /// An expression could not be lexed or parsed.
    SyntaxError,
    /// An identifier or property was not found in scope, or in an object.
    UndefinedVariable,
    /// An operand or argument had the wrong kind.
    TypeMismatch,
    /// The right operand of `/` or `%` was zero.
    DivisionByZero,
    /// An array or string index was outside the valid range.
    IndexOutOfBounds,
    /// A call to an unknown function, or with the wrong number of arguments.
    InvalidFunctionCall,
    /// A malformed duration or unparseable timestamp.
    InvalidDateTime,
    /// An operator was invoked with missing or malformed required fields.
    InvalidTemplate,
    /// An argument was semantically invalid, such as a zero `range` step.
    InvalidArgument,
}

impl Code {
    /// Return the stable name of this [`Code`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::InvalidOperator => "InvalidOperator",
            Code::SyntaxError => "SyntaxError",
            Code::UndefinedVariable => "UndefinedVariable",
            Code::TypeMismatch => "TypeMismatch",
            Code::DivisionByZero => "DivisionByZero",
            Code::IndexOutOfBounds => "IndexOutOfBounds",
            Code::InvalidFunctionCall => "InvalidFunctionCall",
            Code::InvalidDateTime => "InvalidDateTime",
            Code::InvalidTemplate => "InvalidTemplate",
            Code::InvalidArgument => "InvalidArgument",
        }
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.as_str())
    }
}

/// Describes a rendering or validation failure, and allows adding a
/// contextual help text and visualization.
///
/// # Examples
///
/// Creating an [`Error`] that includes a [`Visual`] of type [`Pointer`]:
///
/// ```
/// use stencil::{Code, Error};
///
/// Error::new(Code::SyntaxError, "unexpected token")
///     .with_pointer("1 ?? 2", 2..4)
///     .with_help("expected a single `?` to begin a conditional");
/// ```
///
/// When printed with `println!("{:#}", error)` the [`Error`] produces this
/// output:
///
/// ```text
/// error[SyntaxError]: unexpected token
///   --> 1:3
///    |
///  1 | 1 ?? 2
///    |   ^^
///    |
///   = help: expected a single `?` to begin a conditional
/// ```
pub struct Error {
    /// The category of the [`Error`].
    code: Code,
    /// Describes the cause of the [`Error`].
    reason: String,
    /// A visualization to help illustrate the [`Error`].
    visual: Option<Box<dyn Visual>>,
    /// Additional information to display with the [`Error`].
    help: Option<String>,
}

impl Error {
    /// Create a new [`Error`] with the given [`Code`] and reason text.
    ///
    /// The additional fields may be populated using the various methods
    /// defined on `Error`.
    pub fn new<T>(code: Code, reason: T) -> Self
    where
        T: Into<String>,
    {
        Error {
            code,
            reason: reason.into(),
            visual: None,
            help: None,
        }
    }

    /// Return the [`Code`] of this [`Error`].
    pub fn code(&self) -> Code {
        self.code
    }

    /// Return the reason text, which is a short summary of the [`Error`].
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Return the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the [`Visual`], which is a visualization that helps illustrate
    /// the cause of the error.
    pub fn with_visual(mut self, visual: impl Visual + 'static) -> Self {
        self.visual = Some(Box::new(visual));

        self
    }

    /// Set the visualization to a new [`Pointer`] over the given source
    /// text and [`Region`].
    pub fn with_pointer<T>(mut self, source: &str, region: T) -> Self
    where
        T: Into<Region>,
    {
        self.visual = Some(Box::new(Pointer::new(source, region.into())));

        self
    }

    /// Set the help text, which is contextual information to accompany the
    /// reason text.
    pub fn with_help<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.help = Some(text.into());

        self
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if !f.alternate() {
            writeln!(f, "{self:#}")?;
        }
        f.debug_struct("Error")
            .field("code", &self.code)
            .field("reason", &self.reason)
            .field("visual", &self.visual)
            .field("help", &self.help)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{RED}error{RESET}[{}]: {}", self.code, self.reason)?;

        if let Some(visual) = &self.visual {
            if f.alternate() {
                return visual.display(f, self.help.as_deref());
            }
        }

        Ok(())
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.reason == other.reason && self.help == other.help
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::{Code, Error};

    #[test]
    fn test_code_is_stable() {
        let error = Error::new(Code::DivisionByZero, "division by zero");

        assert_eq!(error.code(), Code::DivisionByZero);
        assert_eq!(error.code().as_str(), "DivisionByZero");
    }

    #[test]
    fn test_equality_ignores_visual() {
        let plain = Error::new(Code::SyntaxError, "unexpected token");
        let pointed = Error::new(Code::SyntaxError, "unexpected token")
            .with_pointer("1 ?? 2", 2..4);

        assert_eq!(plain, pointed);
    }

    #[test]
    fn test_display() {
        let error = Error::new(Code::TypeMismatch, "expected number, found string");

        assert!(format!("{error}").contains("[TypeMismatch]"));
        assert!(format!("{error}").contains("expected number, found string"));
    }
}
