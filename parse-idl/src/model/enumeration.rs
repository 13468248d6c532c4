use super::write_comment;
use crate::decorator::Decorated;
use crate::decorator::Decorators;
use crate::error::Origin;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumValue {
  /// The literal as written, e.g. `PxForceMode::eFORCE`.
  pub value: String,
  /// The value with any `Scope::` qualification removed, e.g. `eFORCE`.
  pub unprefixed: String,
}

impl EnumValue {
  pub fn new(value: impl Into<String>) -> EnumValue {
    let value = value.into();
    let unprefixed = value.rsplit("::").next().unwrap_or(&value).to_string();
    EnumValue { value, unprefixed }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Enum {
  pub name: String,
  pub package: String,
  pub values: Vec<EnumValue>,
  pub decorators: Decorators,
  pub comment: Option<String>,
}

impl Enum {
  pub fn value(&self, unprefixed: &str) -> Option<&EnumValue> {
    self.values.iter().find(|v| v.unprefixed == unprefixed)
  }
}

impl Decorated for Enum {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for Enum {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write_comment(f, &self.comment)?;
    write!(f, "{}enum {} {{\n", self.decorators, self.name)?;
    for (i, v) in self.values.iter().enumerate() {
      let sep = if i + 1 < self.values.len() { "," } else { "" };
      writeln!(f, "  \"{}\"{}", v.value, sep)?;
    }
    f.write_str("};")
  }
}

#[derive(Clone, Debug, Default)]
pub struct EnumBuilder {
  pub name: String,
  pub package: String,
  pub values: Vec<EnumValue>,
  pub decorators: Decorators,
  pub comment: Option<String>,
  pub origin: Option<Origin>,
}

impl EnumBuilder {
  pub fn new(name: impl Into<String>) -> EnumBuilder {
    EnumBuilder {
      name: name.into(),
      ..Default::default()
    }
  }

  pub fn build(self) -> Enum {
    Enum {
      name: self.name,
      package: self.package,
      values: self.values,
      decorators: self.decorators,
      comment: self.comment,
    }
  }
}
