use core::fmt;
use core::fmt::Debug;
use core::fmt::Formatter;
use serde::Serialize;
use std::error::Error;
use std::fmt::Display;

/// The taxonomy bucket an [`IdlErrorType`] belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
pub enum ErrorCategory {
  /// An expected token was not found, or the input ended early.
  Lexical,
  /// A type expression matched no known form.
  Type,
  /// A declaration parsed but violates a model invariant.
  Structural,
  /// A name does not resolve to any known declaration.
  Reference,
  /// The line source itself failed.
  Input,
}

/// A stable classification of errors produced while parsing and building a model.
///
/// Diagnostic codes (prefix `PI`) are assigned per variant and are stable:
/// - `PI0001`: [`IdlErrorType::ExpectedToken`]
/// - `PI0002`: [`IdlErrorType::UnexpectedEnd`]
/// - `PI0003`: [`IdlErrorType::UnexpectedContent`]
/// - `PI0004`: [`IdlErrorType::InvalidType`]
/// - `PI0005`: [`IdlErrorType::MixinImplemented`]
/// - `PI0006`: [`IdlErrorType::NonMixinIncluded`]
/// - `PI0007`: [`IdlErrorType::SetlikeWithMembers`]
/// - `PI0008`: [`IdlErrorType::DuplicateDefinition`]
/// - `PI0009`: [`IdlErrorType::RequiredAfterOptional`]
/// - `PI0010`: [`IdlErrorType::UnknownName`]
/// - `PI0011`: [`IdlErrorType::Io`]
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum IdlErrorType {
  ExpectedToken(String),
  UnexpectedEnd(String),
  UnexpectedContent,
  InvalidType(String),
  MixinImplemented { interface: String, mixin: String },
  NonMixinIncluded { interface: String, included: String },
  SetlikeWithMembers(String),
  DuplicateDefinition(String),
  RequiredAfterOptional { function: String, parameter: String },
  UnknownName { name: String, referenced_by: String },
  Io(String),
}

impl IdlErrorType {
  /// Stable diagnostic code for this error variant.
  pub fn code(&self) -> &'static str {
    match self {
      IdlErrorType::ExpectedToken(_) => "PI0001",
      IdlErrorType::UnexpectedEnd(_) => "PI0002",
      IdlErrorType::UnexpectedContent => "PI0003",
      IdlErrorType::InvalidType(_) => "PI0004",
      IdlErrorType::MixinImplemented { .. } => "PI0005",
      IdlErrorType::NonMixinIncluded { .. } => "PI0006",
      IdlErrorType::SetlikeWithMembers(_) => "PI0007",
      IdlErrorType::DuplicateDefinition(_) => "PI0008",
      IdlErrorType::RequiredAfterOptional { .. } => "PI0009",
      IdlErrorType::UnknownName { .. } => "PI0010",
      IdlErrorType::Io(_) => "PI0011",
    }
  }

  pub fn category(&self) -> ErrorCategory {
    match self {
      IdlErrorType::ExpectedToken(_)
      | IdlErrorType::UnexpectedEnd(_)
      | IdlErrorType::UnexpectedContent => ErrorCategory::Lexical,
      IdlErrorType::InvalidType(_) => ErrorCategory::Type,
      IdlErrorType::MixinImplemented { .. }
      | IdlErrorType::NonMixinIncluded { .. }
      | IdlErrorType::SetlikeWithMembers(_)
      | IdlErrorType::DuplicateDefinition(_)
      | IdlErrorType::RequiredAfterOptional { .. } => ErrorCategory::Structural,
      IdlErrorType::UnknownName { .. } => ErrorCategory::Reference,
      IdlErrorType::Io(_) => ErrorCategory::Input,
    }
  }

  /// Human-readable message describing this error.
  pub fn message(&self) -> String {
    match self {
      IdlErrorType::ExpectedToken(token) => format!("expected `{}`", token),
      IdlErrorType::UnexpectedEnd(expected) => {
        format!("unexpected end of input, expected {}", expected)
      }
      IdlErrorType::UnexpectedContent => "unexpected content".into(),
      IdlErrorType::InvalidType(name) => format!("invalid type `{}`", name),
      IdlErrorType::MixinImplemented { interface, mixin } => format!(
        "`{}` implements `{}`, which is a mixin and must be used with `includes`",
        interface, mixin
      ),
      IdlErrorType::NonMixinIncluded { interface, included } => format!(
        "`{}` includes `{}`, which is not a mixin and must be used with `implements`",
        interface, included
      ),
      IdlErrorType::SetlikeWithMembers(name) => format!(
        "interface `{}` combines a setlike declaration with functions or attributes",
        name
      ),
      IdlErrorType::DuplicateDefinition(name) => format!("`{}` is defined more than once", name),
      IdlErrorType::RequiredAfterOptional { function, parameter } => format!(
        "required parameter `{}` of `{}` follows an optional parameter",
        parameter, function
      ),
      IdlErrorType::UnknownName {
        name,
        referenced_by,
      } => format!("unknown name `{}` referenced by `{}`", name, referenced_by),
      IdlErrorType::Io(msg) => format!("failed to read input: {}", msg),
    }
  }
}

/// Where in the input an error was raised.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct SourcePos {
  pub source: String,
  /// 1-based.
  pub line: usize,
}

/// Where a declaration started, kept so that errors found after parsing can point back at it.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Origin {
  pub pos: SourcePos,
  /// Raw lines read up to the start of the declaration, oldest first.
  pub context: Vec<String>,
}

impl Origin {
  pub fn error(&self, typ: IdlErrorType) -> IdlError {
    IdlError {
      typ,
      pos: Some(self.pos.clone()),
      buffer: String::new(),
      context: self.context.clone(),
    }
  }
}

#[derive(Clone)]
pub struct IdlError {
  pub typ: IdlErrorType,
  pub pos: Option<SourcePos>,
  /// Unconsumed buffer content at the time of the error.
  pub buffer: String,
  /// The last few raw input lines, oldest first.
  pub context: Vec<String>,
}

impl IdlError {
  /// An error raised outside of any input stream, e.g. while linking the model.
  pub fn model(typ: IdlErrorType) -> IdlError {
    IdlError {
      typ,
      pos: None,
      buffer: String::new(),
      context: Vec::new(),
    }
  }

  /// Raises `typ` at `origin` if the declaration's position is known.
  pub fn at(origin: Option<&Origin>, typ: IdlErrorType) -> IdlError {
    match origin {
      Some(origin) => origin.error(typ),
      None => IdlError::model(typ),
    }
  }

  pub fn code(&self) -> &'static str {
    self.typ.code()
  }

  pub fn category(&self) -> ErrorCategory {
    self.typ.category()
  }
}

impl Debug for IdlError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match &self.pos {
      Some(pos) => write!(f, "{} around [{}:{}]", self, pos.source, pos.line),
      None => write!(f, "{}", self),
    }
  }
}

impl Display for IdlError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "error[{}]: {}", self.typ.code(), self.typ.message())?;
    if let Some(pos) = &self.pos {
      write!(f, "\n  --> {}:{}", pos.source, pos.line)?;
    }
    let buffer = self.buffer.trim();
    if !buffer.is_empty() {
      let first = buffer.lines().next().unwrap_or_default();
      write!(f, "\n  buffer: {}", first)?;
    }
    for line in &self.context {
      write!(f, "\n   | {}", line)?;
    }
    Ok(())
  }
}

impl Error for IdlError {}

impl PartialEq for IdlError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for IdlError {}

pub type IdlResult<T> = Result<T, IdlError>;
