use std::error::Error;
use std::fmt;

/// Errors raised while mapping a model onto the JNI boundary.
///
/// Diagnostic codes (prefix `JM`) are stable:
/// - `JM0001`: [`MappingError::UnresolvedType`]
/// - `JM0002`: [`MappingError::UnsupportedType`]
/// - `JM0003`: [`MappingError::NullNotAllowed`]
/// - `JM0004`: [`MappingError::UnknownInterface`]
/// - `JM0005`: [`MappingError::UnknownEnum`]
/// - `JM0006`: [`MappingError::ConflictingOverloads`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingError {
  /// A type name matches no primitive, enum, interface or dictionary.
  UnresolvedType { type_name: String, member: String },
  /// The type is known but cannot cross the boundary at this use site.
  UnsupportedType {
    type_name: String,
    member: String,
    reason: &'static str,
  },
  /// An absent value was passed for a handle that is not nullable.
  NullNotAllowed { type_name: String },
  UnknownInterface(String),
  UnknownEnum(String),
  /// Two raw methods of one class share name and argument descriptor, and their parameters have
  /// the same IDL types.
  ConflictingOverloads { class: String, method: String },
}

impl MappingError {
  pub fn code(&self) -> &'static str {
    match self {
      MappingError::UnresolvedType { .. } => "JM0001",
      MappingError::UnsupportedType { .. } => "JM0002",
      MappingError::NullNotAllowed { .. } => "JM0003",
      MappingError::UnknownInterface(_) => "JM0004",
      MappingError::UnknownEnum(_) => "JM0005",
      MappingError::ConflictingOverloads { .. } => "JM0006",
    }
  }

  pub(crate) fn unsupported(type_name: String, member: &str, reason: &'static str) -> Self {
    Self::UnsupportedType {
      type_name,
      member: member.to_string(),
      reason,
    }
  }
}

impl fmt::Display for MappingError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "error[{}]: ", self.code())?;
    match self {
      MappingError::UnresolvedType { type_name, member } => {
        write!(f, "unresolved type `{type_name}` used by `{member}`")
      }
      MappingError::UnsupportedType {
        type_name,
        member,
        reason,
      } => write!(f, "type `{type_name}` used by `{member}` is not supported: {reason}"),
      MappingError::NullNotAllowed { type_name } => {
        write!(f, "null passed for non-nullable `{type_name}`")
      }
      MappingError::UnknownInterface(name) => write!(f, "unknown interface `{name}`"),
      MappingError::UnknownEnum(name) => write!(f, "unknown enum `{name}`"),
      MappingError::ConflictingOverloads { class, method } => write!(
        f,
        "overloads of `{method}` on `{class}` have identical parameter types"
      ),
    }
  }
}

impl Error for MappingError {}

pub type MappingResult<T> = Result<T, MappingError>;
