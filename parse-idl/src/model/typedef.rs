use super::types::Type;
use crate::decorator::Decorated;
use crate::decorator::Decorators;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeDef {
  pub name: String,
  #[serde(rename = "type")]
  pub typ: Type,
  pub package: String,
  pub decorators: Decorators,
}

impl Decorated for TypeDef {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for TypeDef {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}typedef {} {};", self.decorators, self.typ, self.name)
  }
}
