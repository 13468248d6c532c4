use ahash::HashSet;
use ahash::HashSetExt;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

pub const STRING_TYPES: [&str; 3] = ["DOMString", "USVString", "ByteString"];

pub const VOID_TYPES: [&str; 2] = ["void", "undefined"];

/// Types crossing the boundary as an opaque native handle.
pub const ANY_TYPES: [&str; 2] = ["any", "VoidPtr"];

/// The closed set of primitive WebIDL types, including string-like types and `void`.
pub const PRIMITIVE_TYPES: [&str; 18] = [
  "boolean",
  "byte",
  "octet",
  "short",
  "unsigned short",
  "long",
  "unsigned long",
  "long long",
  "unsigned long long",
  "float",
  "unrestricted float",
  "double",
  "unrestricted double",
  "DOMString",
  "USVString",
  "ByteString",
  "void",
  "undefined",
];

/// Every built-in type name that is valid without type arguments.
pub static BASIC_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
  let mut set = HashSet::new();
  set.extend(PRIMITIVE_TYPES);
  set.extend(ANY_TYPES);
  set.insert("object");
  set
});

pub static PARAMETERIZED_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
  let mut set = HashSet::new();
  set.extend(["sequence", "record", "FrozenArray", "Promise", "ObservableArray"]);
  set
});

/// A single named type, e.g. `unsigned long`, `Foo[]`, `sequence<DOMString>` or `Foo?`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimpleType {
  pub name: String,
  pub is_array: bool,
  /// Type arguments of a parameterized type, as IDL text.
  pub params: Vec<String>,
  pub nullable: bool,
  #[serde(skip)]
  is_void: bool,
  #[serde(skip)]
  is_string: bool,
  #[serde(skip)]
  is_any: bool,
  #[serde(skip)]
  is_primitive: bool,
}

impl SimpleType {
  pub fn new(
    name: impl Into<String>,
    is_array: bool,
    params: Vec<String>,
    nullable: bool,
  ) -> SimpleType {
    let name = name.into();
    let plain = params.is_empty();
    SimpleType {
      is_void: plain && VOID_TYPES.contains(&name.as_str()),
      is_string: plain && STRING_TYPES.contains(&name.as_str()),
      is_any: plain && ANY_TYPES.contains(&name.as_str()),
      is_primitive: plain && PRIMITIVE_TYPES.contains(&name.as_str()),
      name,
      is_array,
      params,
      nullable,
    }
  }

  /// A plain named type without array, nullable or type-argument markers.
  pub fn named(name: impl Into<String>) -> SimpleType {
    SimpleType::new(name, false, Vec::new(), false)
  }

  pub fn is_void(&self) -> bool {
    self.is_void
  }

  pub fn is_string(&self) -> bool {
    self.is_string
  }

  /// `any` or `VoidPtr`: an opaque native handle.
  pub fn is_any(&self) -> bool {
    self.is_any
  }

  pub fn is_primitive(&self) -> bool {
    self.is_primitive
  }

  pub fn is_parameterized(&self) -> bool {
    !self.params.is_empty()
  }

  /// A named interface, dictionary or enum type.
  pub fn is_complex(&self) -> bool {
    !self.is_primitive && !self.is_any && self.params.is_empty() && self.name != "object"
  }

  /// The same type with the array marker removed.
  pub fn element(&self) -> SimpleType {
    SimpleType::new(self.name.clone(), false, self.params.clone(), self.nullable)
  }
}

impl Display for SimpleType {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(&self.name)?;
    if !self.params.is_empty() {
      write!(f, "<{}>", self.params.join(", "))?;
    }
    if self.is_array {
      f.write_str("[]")?;
    }
    if self.nullable {
      f.write_str("?")?;
    }
    Ok(())
  }
}

/// `(A or B)`; members are kept in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnionType {
  pub members: Vec<SimpleType>,
  pub nullable: bool,
}

impl UnionType {
  pub fn new(members: Vec<SimpleType>, nullable: bool) -> UnionType {
    UnionType { members, nullable }
  }
}

impl Display for UnionType {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str("(")?;
    for (i, m) in self.members.iter().enumerate() {
      if i > 0 {
        f.write_str(" or ")?;
      }
      write!(f, "{}", m)?;
    }
    f.write_str(")")?;
    if self.nullable {
      f.write_str("?")?;
    }
    Ok(())
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "$t")]
pub enum Type {
  Simple(SimpleType),
  Union(UnionType),
}

impl Type {
  pub fn named(name: impl Into<String>) -> Type {
    Type::Simple(SimpleType::named(name))
  }

  pub fn as_simple(&self) -> Option<&SimpleType> {
    match self {
      Type::Simple(t) => Some(t),
      Type::Union(_) => None,
    }
  }

  pub fn is_void(&self) -> bool {
    self.as_simple().is_some_and(|t| t.is_void())
  }

  pub fn is_nullable(&self) -> bool {
    match self {
      Type::Simple(t) => t.nullable,
      Type::Union(u) => u.nullable,
    }
  }
}

impl Display for Type {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Type::Simple(t) => t.fmt(f),
      Type::Union(u) => u.fmt(f),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn predicates_are_derived_from_the_name() {
    let long = SimpleType::named("long");
    assert!(long.is_primitive() && !long.is_complex() && !long.is_string());

    let s = SimpleType::named("DOMString");
    assert!(s.is_primitive() && s.is_string());

    let ptr = SimpleType::named("VoidPtr");
    assert!(ptr.is_any() && !ptr.is_complex() && !ptr.is_primitive());

    let foo = SimpleType::new("Foo", true, Vec::new(), false);
    assert!(foo.is_complex() && foo.is_array);
    assert!(!foo.element().is_array);

    let seq = SimpleType::new("sequence", false, vec!["long".into()], false);
    assert!(seq.is_parameterized() && !seq.is_complex());

    assert!(Type::named("void").is_void());
  }

  #[test]
  fn renders_idl_text() {
    let rec = SimpleType::new("record", false, vec!["DOMString".into(), "long".into()], true);
    assert_eq!(rec.to_string(), "record<DOMString, long>?");
    let union = UnionType::new(vec![SimpleType::named("Foo"), SimpleType::named("long")], false);
    assert_eq!(Type::Union(union).to_string(), "(Foo or long)");
  }
}
