use super::function::Function;
use super::namespace::Constant;
use super::types::Type;
use super::write_comment;
use crate::decorator::keys;
use crate::decorator::Decorated;
use crate::decorator::Decorators;
use crate::error::IdlError;
use crate::error::IdlErrorType;
use crate::error::IdlResult;
use crate::error::Origin;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attribute {
  pub name: String,
  #[serde(rename = "type")]
  pub typ: Type,
  pub is_static: bool,
  pub is_readonly: bool,
  pub decorators: Decorators,
  pub comment: Option<String>,
  pub owner: Option<String>,
}

impl Attribute {
  pub fn new(name: impl Into<String>, typ: Type) -> Attribute {
    Attribute {
      name: name.into(),
      typ,
      is_static: false,
      is_readonly: false,
      decorators: Decorators::new(),
      comment: None,
      owner: None,
    }
  }
}

impl Decorated for Attribute {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for Attribute {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write_comment(f, &self.comment)?;
    write!(f, "{}", self.decorators)?;
    if self.is_static {
      f.write_str("static ")?;
    }
    if self.is_readonly {
      f.write_str("readonly ")?;
    }
    write!(f, "attribute {} {};", self.typ, self.name)
  }
}

/// `setlike<T>`: the interface behaves as a set of `T`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SetLike {
  #[serde(rename = "type")]
  pub typ: Type,
  pub is_readonly: bool,
  pub decorators: Decorators,
}

impl Display for SetLike {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.decorators)?;
    if self.is_readonly {
      f.write_str("readonly ")?;
    }
    write!(f, "setlike<{}>;", self.typ)
  }
}

/// How managed code obtains a native instance of an interface.
#[derive(Clone, Debug, PartialEq)]
pub enum Construction<'a> {
  /// One or more declared constructors.
  Declared(Vec<&'a Function>),
  /// No constructor declared; a default constructor is assumed.
  ImplicitDefault,
  /// A callback interface implemented on the managed side, allocated through its adapter.
  CallbackAllocator,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Interface {
  pub name: String,
  pub package: String,
  pub is_mixin: bool,
  pub is_partial: bool,
  pub is_callback: bool,
  /// Inherited interfaces and interfaces pulled in by `implements`/`includes`, in order.
  pub supers: Vec<String>,
  pub constants: Vec<Constant>,
  pub attributes: Vec<Attribute>,
  pub functions: Vec<Function>,
  pub setlike: Option<SetLike>,
  pub decorators: Decorators,
  pub comment: Option<String>,
}

impl Interface {
  pub fn constructors(&self) -> impl Iterator<Item = &Function> {
    self.functions.iter().filter(|f| f.is_constructor)
  }

  pub fn methods(&self) -> impl Iterator<Item = &Function> {
    self.functions.iter().filter(|f| !f.is_constructor)
  }

  /// All overloads named `name`, in declaration order.
  pub fn overloads<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Function> + 'a {
    self.functions.iter().filter(move |f| f.name == name)
  }

  /// Whether `name` is shared by more than one function of this interface.
  pub fn is_overloaded(&self, name: &str) -> bool {
    self.overloads(name).nth(1).is_some()
  }

  pub fn attribute(&self, name: &str) -> Option<&Attribute> {
    self.attributes.iter().find(|a| a.name == name)
  }

  pub fn is_callback_implementation(&self) -> bool {
    self.has_decorator(keys::JS_IMPLEMENTATION)
  }

  pub fn construction(&self) -> Construction<'_> {
    if self.is_callback_implementation() {
      return Construction::CallbackAllocator;
    }
    let declared: Vec<_> = self.constructors().collect();
    if declared.is_empty() {
      Construction::ImplicitDefault
    } else {
      Construction::Declared(declared)
    }
  }

  /// Mixins are never instantiated, and `NoDelete` and callback interfaces are owned natively.
  pub fn has_destructor(&self) -> bool {
    !(self.is_mixin
      || self.is_callback
      || self.is_callback_implementation()
      || self.has_decorator(keys::NO_DELETE))
  }
}

impl Decorated for Interface {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for Interface {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write_comment(f, &self.comment)?;
    write!(f, "{}", self.decorators)?;
    if self.is_partial {
      f.write_str("partial ")?;
    }
    if self.is_callback {
      f.write_str("callback ")?;
    }
    f.write_str("interface ")?;
    if self.is_mixin {
      f.write_str("mixin ")?;
    }
    f.write_str(&self.name)?;
    if !self.supers.is_empty() {
      write!(f, " : {}", self.supers.join(", "))?;
    }
    f.write_str(" {\n")?;
    for c in &self.constants {
      writeln!(f, "  {}", c)?;
    }
    if let Some(setlike) = &self.setlike {
      writeln!(f, "  {}", setlike)?;
    }
    for a in &self.attributes {
      writeln!(f, "  {}", a)?;
    }
    for (i, func) in self.functions.iter().enumerate() {
      // Exploded overloads are rendered once, as their longest form.
      if self.functions.get(i + 1).is_some_and(|next| next.extends_overload(func)) {
        continue;
      }
      writeln!(f, "  {}", func)?;
    }
    f.write_str("};")
  }
}

#[derive(Clone, Debug, Default)]
pub struct InterfaceBuilder {
  pub name: String,
  pub package: String,
  pub is_mixin: bool,
  pub is_partial: bool,
  pub is_callback: bool,
  pub supers: Vec<String>,
  pub constants: Vec<Constant>,
  pub attributes: Vec<Attribute>,
  pub functions: Vec<Function>,
  pub setlike: Option<SetLike>,
  pub decorators: Decorators,
  pub comment: Option<String>,
  pub origin: Option<Origin>,
}

impl InterfaceBuilder {
  pub fn new(name: impl Into<String>) -> InterfaceBuilder {
    InterfaceBuilder {
      name: name.into(),
      ..Default::default()
    }
  }

  pub fn add_super(&mut self, name: &str) {
    if !self.supers.iter().any(|s| s == name) {
      self.supers.push(name.to_string());
    }
  }

  /// Appends the members of a partial declaration of the same interface.
  pub fn merge(&mut self, partial: InterfaceBuilder) {
    for s in &partial.supers {
      self.add_super(s);
    }
    self.constants.extend(partial.constants);
    self.attributes.extend(partial.attributes);
    self.functions.extend(partial.functions);
    if partial.setlike.is_some() {
      self.setlike = partial.setlike;
    }
    self.decorators.extend(partial.decorators);
    if self.comment.is_none() {
      self.comment = partial.comment;
    }
  }

  pub fn build(self) -> IdlResult<Interface> {
    if self.setlike.is_some() && !(self.functions.is_empty() && self.attributes.is_empty()) {
      return Err(IdlError::at(
        self.origin.as_ref(),
        IdlErrorType::SetlikeWithMembers(self.name),
      ));
    }
    let owner = Some(self.name.clone());
    let mut functions = self.functions;
    for f in functions.iter_mut() {
      f.owner = owner.clone();
    }
    let mut attributes = self.attributes;
    for a in attributes.iter_mut() {
      a.owner = owner.clone();
    }
    let mut constants = self.constants;
    for c in constants.iter_mut() {
      c.owner = owner.clone();
    }
    Ok(Interface {
      name: self.name,
      package: self.package,
      is_mixin: self.is_mixin,
      is_partial: self.is_partial,
      is_callback: self.is_callback,
      supers: self.supers,
      constants,
      attributes,
      functions,
      setlike: self.setlike,
      decorators: self.decorators,
      comment: self.comment,
    })
  }
}
