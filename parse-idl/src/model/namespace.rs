use super::types::Type;
use super::write_comment;
use crate::decorator::Decorated;
use crate::decorator::Decorators;
use crate::error::Origin;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

/// `const T NAME = value;`. The value is kept as written.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Constant {
  pub name: String,
  #[serde(rename = "type")]
  pub typ: Type,
  pub value: String,
  pub decorators: Decorators,
  pub owner: Option<String>,
}

impl Decorated for Constant {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for Constant {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}const {} {} = {};",
      self.decorators, self.typ, self.name, self.value
    )
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Namespace {
  pub name: String,
  pub package: String,
  pub constants: Vec<Constant>,
  pub decorators: Decorators,
  pub comment: Option<String>,
}

impl Namespace {
  pub fn constant(&self, name: &str) -> Option<&Constant> {
    self.constants.iter().find(|c| c.name == name)
  }
}

impl Decorated for Namespace {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for Namespace {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write_comment(f, &self.comment)?;
    write!(f, "{}namespace {} {{\n", self.decorators, self.name)?;
    for c in &self.constants {
      writeln!(f, "  {}", c)?;
    }
    f.write_str("};")
  }
}

#[derive(Clone, Debug, Default)]
pub struct NamespaceBuilder {
  pub name: String,
  pub package: String,
  pub constants: Vec<Constant>,
  pub decorators: Decorators,
  pub comment: Option<String>,
  pub origin: Option<Origin>,
}

impl NamespaceBuilder {
  pub fn new(name: impl Into<String>) -> NamespaceBuilder {
    NamespaceBuilder {
      name: name.into(),
      ..Default::default()
    }
  }

  pub fn build(self) -> Namespace {
    let owner = Some(self.name.clone());
    let constants = self
      .constants
      .into_iter()
      .map(|c| Constant {
        owner: owner.clone(),
        ..c
      })
      .collect();
    Namespace {
      name: self.name,
      package: self.package,
      constants,
      decorators: self.decorators,
      comment: self.comment,
    }
  }
}
