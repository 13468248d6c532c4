//! Bracketed decorator lists (`[Key, Key="value"]`) and comment-embedded meta tags
//! (`// [package=physics.vehicle]`).

use crate::char::is_identifier;
use crate::error::IdlResult;
use crate::lex::Pattern;
use crate::lex::TokenStream;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use tracing::warn;

pub mod keys {
  /// Pass/return by value instead of by pointer.
  pub const VALUE: &str = "Value";
  /// Pass/return by reference instead of by pointer.
  pub const REF: &str = "Ref";
  pub const CONST: &str = "Const";
  /// The managed wrapper never frees the native object.
  pub const NO_DELETE: &str = "NoDelete";
  /// Native namespace prefix, e.g. `Prefix="physx::"`.
  pub const PREFIX: &str = "Prefix";
  /// Marks a callback interface implemented on the managed side.
  pub const JS_IMPLEMENTATION: &str = "JSImplementation";
  pub const NULLABLE: &str = "Nullable";
  /// `;`-separated list of platforms the declaration applies to.
  pub const PLATFORMS: &str = "Platforms";
  pub const DEPRECATED: &str = "Deprecated";
  pub const STACK_ALLOCATABLE: &str = "StackAllocatable";

  pub const KNOWN: [&str; 10] = [
    VALUE,
    REF,
    CONST,
    NO_DELETE,
    PREFIX,
    JS_IMPLEMENTATION,
    NULLABLE,
    PLATFORMS,
    DEPRECATED,
    STACK_ALLOCATABLE,
  ];
}

/// The only meta tag currently understood.
pub const META_PACKAGE: &str = "package";

static VALUE_END: Lazy<Pattern> = Lazy::new(|| Pattern::new(&[",", "]"]));

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Decorator {
  pub key: String,
  pub value: Option<String>,
}

impl Decorator {
  pub fn new(key: impl Into<String>, value: Option<String>) -> Decorator {
    Decorator {
      key: key.into(),
      value,
    }
  }

  pub fn flag(key: impl Into<String>) -> Decorator {
    Decorator::new(key, None)
  }
}

impl Display for Decorator {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match &self.value {
      Some(value) => write!(f, "{}=\"{}\"", self.key, value),
      None => f.write_str(&self.key),
    }
  }
}

/// An insertion-ordered set of decorators. The same key may occur more than once with different
/// values; lookups return the first occurrence. Equality ignores order.
#[derive(Clone, Debug, Default, Eq, Serialize)]
#[serde(transparent)]
pub struct Decorators(Vec<Decorator>);

impl Decorators {
  pub fn new() -> Decorators {
    Decorators(Vec::new())
  }

  pub fn insert(&mut self, decorator: Decorator) {
    if !self.0.contains(&decorator) {
      self.0.push(decorator);
    }
  }

  pub fn extend(&mut self, other: Decorators) {
    for d in other.0 {
      self.insert(d);
    }
  }

  pub fn get(&self, key: &str) -> Option<&Decorator> {
    self.0.iter().find(|d| d.key == key)
  }

  pub fn has(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  pub fn value(&self, key: &str) -> Option<&str> {
    self.get(key).and_then(|d| d.value.as_deref())
  }

  pub fn value_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
    self.value(key).unwrap_or(default)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Decorator> {
    self.0.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }
}

impl PartialEq for Decorators {
  fn eq(&self, other: &Self) -> bool {
    self.0.len() == other.0.len() && self.0.iter().all(|d| other.0.contains(d))
  }
}

impl FromIterator<Decorator> for Decorators {
  fn from_iter<T: IntoIterator<Item = Decorator>>(iter: T) -> Self {
    let mut decorators = Decorators::new();
    for d in iter {
      decorators.insert(d);
    }
    decorators
  }
}

impl Display for Decorators {
  /// Renders `[A, B="x"] ` including the trailing space, or nothing when empty.
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    if self.0.is_empty() {
      return Ok(());
    }
    f.write_str("[")?;
    for (i, d) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }
      write!(f, "{}", d)?;
    }
    f.write_str("] ")
  }
}

/// Shared accessors for everything that carries decorators.
pub trait Decorated {
  fn decorators(&self) -> &Decorators;

  fn has_decorator(&self, key: &str) -> bool {
    self.decorators().has(key)
  }

  fn decorator_value(&self, key: &str) -> Option<&str> {
    self.decorators().value(key)
  }

  /// Platforms named by a `Platforms` decorator, or `None` if the declaration is not gated.
  fn platforms(&self) -> Option<Vec<&str>> {
    self.decorator_value(keys::PLATFORMS).map(|v| {
      v.split([';', ','])
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect()
    })
  }

  fn is_available_on(&self, platform: &str) -> bool {
    match self.platforms() {
      Some(platforms) => platforms.contains(&platform),
      None => true,
    }
  }
}

/// Parses a bracketed, comma-separated decorator list. Quoted values are unquoted.
pub fn parse_decorators(stream: &mut TokenStream) -> IdlResult<Decorators> {
  let mut decorators = Decorators::new();
  stream.pop_token("[")?;
  loop {
    if stream.consume_if("]")? {
      break;
    }
    let key = stream.pop_identifier("decorator name")?;
    let value = if stream.consume_if("=")? {
      if stream.peek_prefix("\"")? {
        Some(stream.pop_string_literal()?)
      } else {
        Some(stream.pop_literal(&VALUE_END)?)
      }
    } else {
      None
    };
    if !keys::KNOWN.contains(&key.as_str()) {
      warn!(
        source = stream.source_name(),
        line = stream.line(),
        key = key.as_str(),
        "unknown decorator"
      );
    }
    decorators.insert(Decorator::new(key, value));
    if !stream.consume_if(",")? {
      stream.pop_token("]")?;
      break;
    }
  }
  Ok(decorators)
}

/// Extracts `[key=value]` meta tags from free-form comment text. The value may be empty.
pub fn parse_meta_tags(text: &str) -> Vec<(String, String)> {
  let mut tags = Vec::new();
  let mut rest = text;
  while let Some(open) = rest.find('[') {
    let after = &rest[open + 1..];
    let Some(close) = after.find(']') else {
      break;
    };
    if let Some((key, value)) = after[..close].split_once('=') {
      let key = key.trim();
      let value = value.trim().trim_matches('"');
      if is_identifier(key) {
        tags.push((key.to_string(), value.to_string()));
      }
    }
    rest = &after[close + 1..];
  }
  tags
}
