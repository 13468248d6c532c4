use super::types::Type;
use super::write_comment;
use crate::decorator::Decorated;
use crate::decorator::Decorators;
use crate::error::Origin;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DictionaryMember {
  pub name: String,
  #[serde(rename = "type")]
  pub typ: Type,
  pub required: bool,
  pub default_value: Option<String>,
  pub decorators: Decorators,
  pub comment: Option<String>,
  pub owner: Option<String>,
}

impl DictionaryMember {
  pub fn new(name: impl Into<String>, typ: Type) -> DictionaryMember {
    DictionaryMember {
      name: name.into(),
      typ,
      required: false,
      default_value: None,
      decorators: Decorators::new(),
      comment: None,
      owner: None,
    }
  }
}

impl Decorated for DictionaryMember {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for DictionaryMember {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write_comment(f, &self.comment)?;
    write!(f, "{}", self.decorators)?;
    if self.required {
      f.write_str("required ")?;
    }
    write!(f, "{} {}", self.typ, self.name)?;
    if let Some(default) = &self.default_value {
      write!(f, " = {}", default)?;
    }
    f.write_str(";")
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dictionary {
  pub name: String,
  pub package: String,
  pub is_partial: bool,
  pub supers: Vec<String>,
  pub members: Vec<DictionaryMember>,
  pub decorators: Decorators,
  pub comment: Option<String>,
}

impl Dictionary {
  pub fn member(&self, name: &str) -> Option<&DictionaryMember> {
    self.members.iter().find(|m| m.name == name)
  }
}

impl Decorated for Dictionary {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for Dictionary {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write_comment(f, &self.comment)?;
    write!(f, "{}", self.decorators)?;
    if self.is_partial {
      f.write_str("partial ")?;
    }
    write!(f, "dictionary {}", self.name)?;
    if !self.supers.is_empty() {
      write!(f, " : {}", self.supers.join(", "))?;
    }
    f.write_str(" {\n")?;
    for m in &self.members {
      writeln!(f, "  {}", m)?;
    }
    f.write_str("};")
  }
}

#[derive(Clone, Debug, Default)]
pub struct DictionaryBuilder {
  pub name: String,
  pub package: String,
  pub is_partial: bool,
  pub supers: Vec<String>,
  pub members: Vec<DictionaryMember>,
  pub decorators: Decorators,
  pub comment: Option<String>,
  pub origin: Option<Origin>,
}

impl DictionaryBuilder {
  pub fn new(name: impl Into<String>) -> DictionaryBuilder {
    DictionaryBuilder {
      name: name.into(),
      ..Default::default()
    }
  }

  /// Appends the members of a partial declaration of the same dictionary.
  pub fn merge(&mut self, partial: DictionaryBuilder) {
    for s in partial.supers {
      if !self.supers.contains(&s) {
        self.supers.push(s);
      }
    }
    self.members.extend(partial.members);
    self.decorators.extend(partial.decorators);
    if self.comment.is_none() {
      self.comment = partial.comment;
    }
  }

  pub fn build(self) -> Dictionary {
    let owner = Some(self.name.clone());
    let members = self
      .members
      .into_iter()
      .map(|m| DictionaryMember {
        owner: owner.clone(),
        ..m
      })
      .collect();
    Dictionary {
      name: self.name,
      package: self.package,
      is_partial: self.is_partial,
      supers: self.supers,
      members,
      decorators: self.decorators,
      comment: self.comment,
    }
  }
}
