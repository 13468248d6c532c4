//! The parsed declaration model.
//!
//! Entities are immutable once built. Parsing fills mutable builders, which are finalized in one
//! step by [`ModelBuilder::build`]: partial declarations are merged into their principal
//! declaration, `implements`/`includes` statements are resolved, and per-entity invariants are
//! checked. Back-references from members to their owner are by name.

use crate::decorator::Decorated;
use crate::decorator::META_PACKAGE;
use crate::error::IdlError;
use crate::error::IdlErrorType;
use crate::error::IdlResult;
use crate::error::Origin;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::mem;
use tracing::debug;

pub mod dictionary;
pub mod enumeration;
pub mod function;
pub mod interface;
pub mod namespace;
pub mod typedef;
pub mod types;

use dictionary::Dictionary;
use dictionary::DictionaryBuilder;
use enumeration::Enum;
use interface::Interface;
use interface::InterfaceBuilder;
use namespace::Namespace;
use typedef::TypeDef;
use types::SimpleType;
use types::Type;

/// Renders an attached comment in front of a declaration. Single-line text is written as a line
/// comment, since it may come from one and contain `*/`.
pub(crate) fn write_comment(f: &mut Formatter<'_>, comment: &Option<String>) -> fmt::Result {
  match comment {
    Some(c) if !c.contains('\n') => writeln!(f, "// {}", c),
    // Block comment text never contains `*/` unless built by hand.
    Some(c) => write!(f, "/* {} */ ", c.replace("*/", "* /")),
    None => Ok(()),
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum LinkKind {
  /// `A implements B;`, where `B` must not be a mixin.
  Implements,
  /// `A includes B;`, where `B` must be a mixin.
  Includes,
}

impl LinkKind {
  pub fn keyword(self) -> &'static str {
    match self {
      LinkKind::Implements => "implements",
      LinkKind::Includes => "includes",
    }
  }
}

/// An `implements`/`includes` statement, resolved once all sources are parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
  pub kind: LinkKind,
  pub interface: String,
  pub target: String,
  pub origin: Option<Origin>,
}

impl Link {
  fn error(&self, typ: IdlErrorType) -> IdlError {
    IdlError::at(self.origin.as_ref(), typ)
  }
}

trait Mergeable {
  fn name(&self) -> &str;
  fn origin(&self) -> Option<&Origin>;
  fn is_partial(&self) -> bool;
  fn absorb(&mut self, partial: Self);
}

impl Mergeable for InterfaceBuilder {
  fn name(&self) -> &str {
    &self.name
  }

  fn origin(&self) -> Option<&Origin> {
    self.origin.as_ref()
  }

  fn is_partial(&self) -> bool {
    self.is_partial
  }

  fn absorb(&mut self, partial: Self) {
    self.merge(partial);
  }
}

impl Mergeable for DictionaryBuilder {
  fn name(&self) -> &str {
    &self.name
  }

  fn origin(&self) -> Option<&Origin> {
    self.origin.as_ref()
  }

  fn is_partial(&self) -> bool {
    self.is_partial
  }

  fn absorb(&mut self, partial: Self) {
    self.merge(partial);
  }
}

/// Folds every partial declaration into the first declaration of the same name. The principal
/// (non-partial) declaration takes the place of the first occurrence, followed by partial members
/// in parse order.
fn merge_partials<T: Mergeable>(builders: Vec<T>) -> IdlResult<Vec<T>> {
  let mut merged: Vec<T> = Vec::with_capacity(builders.len());
  let mut by_name: HashMap<String, usize> = HashMap::new();
  for builder in builders {
    let Some(&i) = by_name.get(builder.name()) else {
      by_name.insert(builder.name().to_string(), merged.len());
      merged.push(builder);
      continue;
    };
    let existing = &mut merged[i];
    match (existing.is_partial(), builder.is_partial()) {
      (false, false) => {
        return Err(IdlError::at(
          builder.origin(),
          IdlErrorType::DuplicateDefinition(builder.name().to_string()),
        ));
      }
      (true, false) => {
        let partial = mem::replace(existing, builder);
        existing.absorb(partial);
      }
      _ => existing.absorb(builder),
    }
  }
  Ok(merged)
}

/// Collects builders across any number of sources.
#[derive(Debug, Default)]
pub struct ModelBuilder {
  interfaces: Vec<InterfaceBuilder>,
  dictionaries: Vec<DictionaryBuilder>,
  enums: Vec<Enum>,
  namespaces: Vec<Namespace>,
  typedefs: Vec<TypeDef>,
  links: Vec<Link>,
  // Origins of enums, namespaces and typedefs, which are built as soon as they are parsed.
  origins: HashMap<(Kind, usize), Origin>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Kind {
  Enum,
  Namespace,
  TypeDef,
}

impl ModelBuilder {
  pub fn new() -> ModelBuilder {
    ModelBuilder::default()
  }

  pub fn add_interface(&mut self, interface: InterfaceBuilder) {
    self.interfaces.push(interface);
  }

  pub fn add_dictionary(&mut self, dictionary: DictionaryBuilder) {
    self.dictionaries.push(dictionary);
  }

  pub fn add_enum(&mut self, e: Enum, origin: Option<Origin>) {
    self.record(Kind::Enum, self.enums.len(), origin);
    self.enums.push(e);
  }

  pub fn add_namespace(&mut self, namespace: Namespace, origin: Option<Origin>) {
    self.record(Kind::Namespace, self.namespaces.len(), origin);
    self.namespaces.push(namespace);
  }

  pub fn add_typedef(&mut self, typedef: TypeDef, origin: Option<Origin>) {
    self.record(Kind::TypeDef, self.typedefs.len(), origin);
    self.typedefs.push(typedef);
  }

  fn record(&mut self, kind: Kind, i: usize, origin: Option<Origin>) {
    if let Some(origin) = origin {
      self.origins.insert((kind, i), origin);
    }
  }

  /// Rejects a name declared by more than one top-level declaration of any kind, reporting the
  /// later declaration.
  fn check_unique(
    &self,
    interfaces: &[InterfaceBuilder],
    dictionaries: &[DictionaryBuilder],
  ) -> IdlResult<()> {
    let leaf = |kind: Kind, i: usize| self.origins.get(&(kind, i));
    let names = interfaces
      .iter()
      .map(|b| (&b.name, b.origin.as_ref()))
      .chain(dictionaries.iter().map(|b| (&b.name, b.origin.as_ref())))
      .chain(self.enums.iter().enumerate().map(|(i, e)| (&e.name, leaf(Kind::Enum, i))))
      .chain(
        self
          .namespaces
          .iter()
          .enumerate()
          .map(|(i, e)| (&e.name, leaf(Kind::Namespace, i))),
      )
      .chain(
        self
          .typedefs
          .iter()
          .enumerate()
          .map(|(i, e)| (&e.name, leaf(Kind::TypeDef, i))),
      );
    let mut seen = HashSet::new();
    for (name, origin) in names {
      if !seen.insert(name.as_str()) {
        return Err(IdlError::at(origin, IdlErrorType::DuplicateDefinition(name.clone())));
      }
    }
    Ok(())
  }

  pub fn add_link(&mut self, link: Link) {
    self.links.push(link);
  }

  pub fn build(mut self) -> IdlResult<Model> {
    let mut interfaces = merge_partials(mem::take(&mut self.interfaces))?;
    let dictionaries = merge_partials(mem::take(&mut self.dictionaries))?;
    self.check_unique(&interfaces, &dictionaries)?;

    let by_name: HashMap<String, usize> = interfaces
      .iter()
      .enumerate()
      .map(|(i, b)| (b.name.clone(), i))
      .collect();
    for link in &self.links {
      let referenced_by = format!("{} {} {}", link.interface, link.kind.keyword(), link.target);
      let Some(&target) = by_name.get(&link.target) else {
        return Err(link.error(IdlErrorType::UnknownName {
          name: link.target.clone(),
          referenced_by,
        }));
      };
      let Some(&interface) = by_name.get(&link.interface) else {
        return Err(link.error(IdlErrorType::UnknownName {
          name: link.interface.clone(),
          referenced_by,
        }));
      };
      let target_is_mixin = interfaces[target].is_mixin;
      match link.kind {
        LinkKind::Implements if target_is_mixin => {
          return Err(link.error(IdlErrorType::MixinImplemented {
            interface: link.interface.clone(),
            mixin: link.target.clone(),
          }));
        }
        LinkKind::Includes if !target_is_mixin => {
          return Err(link.error(IdlErrorType::NonMixinIncluded {
            interface: link.interface.clone(),
            included: link.target.clone(),
          }));
        }
        _ => {}
      }
      debug!(
        interface = link.interface.as_str(),
        target = link.target.as_str(),
        kind = link.kind.keyword(),
        "linked interface"
      );
      interfaces[interface].add_super(&link.target);
    }

    let interfaces = interfaces
      .into_iter()
      .map(InterfaceBuilder::build)
      .collect::<IdlResult<Vec<_>>>()?;
    let dictionaries = dictionaries.into_iter().map(DictionaryBuilder::build).collect();
    let mut model = Model {
      interfaces,
      dictionaries,
      enums: self.enums,
      namespaces: self.namespaces,
      typedefs: self.typedefs,
      index: HashMap::new(),
    };
    model.reindex();
    Ok(model)
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Slot {
  Interface(usize),
  Dictionary(usize),
  Enum(usize),
  Namespace(usize),
  TypeDef(usize),
}

/// Any top-level declaration, as returned by [`Model::lookup`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Declaration<'a> {
  Interface(&'a Interface),
  Dictionary(&'a Dictionary),
  Enum(&'a Enum),
  Namespace(&'a Namespace),
  TypeDef(&'a TypeDef),
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Model {
  interfaces: Vec<Interface>,
  dictionaries: Vec<Dictionary>,
  enums: Vec<Enum>,
  namespaces: Vec<Namespace>,
  typedefs: Vec<TypeDef>,
  #[serde(skip)]
  index: HashMap<String, Slot>,
}

impl Model {
  pub fn is_empty(&self) -> bool {
    self.index.is_empty()
  }

  pub fn interfaces(&self) -> &[Interface] {
    &self.interfaces
  }

  pub fn dictionaries(&self) -> &[Dictionary] {
    &self.dictionaries
  }

  pub fn enums(&self) -> &[Enum] {
    &self.enums
  }

  pub fn namespaces(&self) -> &[Namespace] {
    &self.namespaces
  }

  pub fn typedefs(&self) -> &[TypeDef] {
    &self.typedefs
  }

  pub fn lookup(&self, name: &str) -> Option<Declaration<'_>> {
    Some(match *self.index.get(name)? {
      Slot::Interface(i) => Declaration::Interface(&self.interfaces[i]),
      Slot::Dictionary(i) => Declaration::Dictionary(&self.dictionaries[i]),
      Slot::Enum(i) => Declaration::Enum(&self.enums[i]),
      Slot::Namespace(i) => Declaration::Namespace(&self.namespaces[i]),
      Slot::TypeDef(i) => Declaration::TypeDef(&self.typedefs[i]),
    })
  }

  pub fn interface(&self, name: &str) -> Option<&Interface> {
    match self.lookup(name)? {
      Declaration::Interface(i) => Some(i),
      _ => None,
    }
  }

  pub fn dictionary(&self, name: &str) -> Option<&Dictionary> {
    match self.lookup(name)? {
      Declaration::Dictionary(d) => Some(d),
      _ => None,
    }
  }

  pub fn enumeration(&self, name: &str) -> Option<&Enum> {
    match self.lookup(name)? {
      Declaration::Enum(e) => Some(e),
      _ => None,
    }
  }

  pub fn namespace(&self, name: &str) -> Option<&Namespace> {
    match self.lookup(name)? {
      Declaration::Namespace(n) => Some(n),
      _ => None,
    }
  }

  pub fn typedef(&self, name: &str) -> Option<&TypeDef> {
    match self.lookup(name)? {
      Declaration::TypeDef(t) => Some(t),
      _ => None,
    }
  }

  /// Every distinct package, sorted. Declarations before any package tag are in the empty
  /// package.
  pub fn packages(&self) -> Vec<&str> {
    let packages: BTreeSet<&str> = self
      .interfaces
      .iter()
      .map(|e| e.package.as_str())
      .chain(self.dictionaries.iter().map(|e| e.package.as_str()))
      .chain(self.enums.iter().map(|e| e.package.as_str()))
      .chain(self.namespaces.iter().map(|e| e.package.as_str()))
      .chain(self.typedefs.iter().map(|e| e.package.as_str()))
      .collect();
    packages.into_iter().collect()
  }

  pub fn interfaces_in_package<'a>(
    &'a self,
    package: &'a str,
  ) -> impl Iterator<Item = &'a Interface> {
    self.interfaces.iter().filter(move |e| e.package == package)
  }

  pub fn dictionaries_in_package<'a>(
    &'a self,
    package: &'a str,
  ) -> impl Iterator<Item = &'a Dictionary> {
    self.dictionaries.iter().filter(move |e| e.package == package)
  }

  pub fn enums_in_package<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a Enum> {
    self.enums.iter().filter(move |e| e.package == package)
  }

  /// Follows typedef chains until a non-typedef type is reached. Array and nullable markers of
  /// every link in the chain are kept. Cyclic chains stop after visiting each typedef once.
  pub fn resolve_typedef(&self, typ: &Type) -> Type {
    let mut resolved = typ.clone();
    for _ in 0..self.typedefs.len() {
      let Type::Simple(outer) = &resolved else {
        break;
      };
      let Some(typedef) = self.typedef(&outer.name) else {
        break;
      };
      resolved = match &typedef.typ {
        Type::Simple(inner) => Type::Simple(SimpleType::new(
          inner.name.clone(),
          inner.is_array || outer.is_array,
          inner.params.clone(),
          inner.nullable || outer.nullable,
        )),
        Type::Union(inner) => {
          let mut union = inner.clone();
          union.nullable |= outer.nullable;
          Type::Union(union)
        }
      };
    }
    resolved
  }

  /// A copy of this model with every declaration and member gated away from `platform` removed.
  pub fn for_platform(&self, platform: &str) -> Model {
    let available = |d: &dyn Decorated| d.is_available_on(platform);
    let interfaces = self
      .interfaces
      .iter()
      .filter(|e| available(*e))
      .map(|e| {
        let mut e = e.clone();
        e.constants.retain(|m| available(m));
        e.attributes.retain(|m| available(m));
        e.functions.retain(|m| available(m));
        e
      })
      .collect();
    let dictionaries = self
      .dictionaries
      .iter()
      .filter(|e| available(*e))
      .map(|e| {
        let mut e = e.clone();
        e.members.retain(|m| available(m));
        e
      })
      .collect();
    let namespaces = self
      .namespaces
      .iter()
      .filter(|e| available(*e))
      .map(|e| {
        let mut e = e.clone();
        e.constants.retain(|m| available(m));
        e
      })
      .collect();
    let enums = self.enums.iter().filter(|e| available(*e)).cloned().collect();
    let typedefs = self.typedefs.iter().filter(|e| available(*e)).cloned().collect();
    let mut model = Model {
      interfaces,
      dictionaries,
      enums,
      namespaces,
      typedefs,
      index: HashMap::new(),
    };
    model.reindex();
    model
  }

  // Names are checked for uniqueness before a model is first built, and filtering keeps them so.
  fn reindex(&mut self) {
    self.index.clear();
    for (i, e) in self.interfaces.iter().enumerate() {
      self.index.insert(e.name.clone(), Slot::Interface(i));
    }
    for (i, e) in self.dictionaries.iter().enumerate() {
      self.index.insert(e.name.clone(), Slot::Dictionary(i));
    }
    for (i, e) in self.enums.iter().enumerate() {
      self.index.insert(e.name.clone(), Slot::Enum(i));
    }
    for (i, e) in self.namespaces.iter().enumerate() {
      self.index.insert(e.name.clone(), Slot::Namespace(i));
    }
    for (i, e) in self.typedefs.iter().enumerate() {
      self.index.insert(e.name.clone(), Slot::TypeDef(i));
    }
  }
}

impl PartialEq for Model {
  fn eq(&self, other: &Self) -> bool {
    self.interfaces == other.interfaces
      && self.dictionaries == other.dictionaries
      && self.enums == other.enums
      && self.namespaces == other.namespaces
      && self.typedefs == other.typedefs
  }
}

/// Tracks the current package while rendering, emitting a meta tag whenever it changes.
struct PackageTracker<'a> {
  current: &'a str,
}

impl<'a> PackageTracker<'a> {
  fn enter(&mut self, f: &mut Formatter<'_>, package: &'a str) -> fmt::Result {
    if package != self.current {
      writeln!(f, "// [{}={}]", META_PACKAGE, package)?;
      self.current = package;
    }
    Ok(())
  }
}

impl Display for Model {
  /// Renders IDL text that parses back into an equal model.
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let mut packages = PackageTracker { current: "" };
    for e in &self.typedefs {
      packages.enter(f, &e.package)?;
      writeln!(f, "{}", e)?;
    }
    for e in &self.enums {
      packages.enter(f, &e.package)?;
      writeln!(f, "{}\n", e)?;
    }
    for e in &self.namespaces {
      packages.enter(f, &e.package)?;
      writeln!(f, "{}\n", e)?;
    }
    for e in &self.dictionaries {
      packages.enter(f, &e.package)?;
      writeln!(f, "{}\n", e)?;
    }
    for e in &self.interfaces {
      packages.enter(f, &e.package)?;
      writeln!(f, "{}\n", e)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::decorator::keys;
  use crate::decorator::Decorator;
  use crate::model::interface::Attribute;

  fn iface(name: &str) -> InterfaceBuilder {
    InterfaceBuilder::new(name)
  }

  fn link(kind: LinkKind, a: &str, b: &str) -> Link {
    Link {
      kind,
      interface: a.into(),
      target: b.into(),
      origin: None,
    }
  }

  #[test]
  fn partial_declared_first_merges_into_principal() {
    let mut mb = ModelBuilder::new();
    let mut partial = iface("A");
    partial.is_partial = true;
    partial.attributes.push(Attribute::new("late", Type::named("long")));
    mb.add_interface(partial);
    let mut base = iface("A");
    base.attributes.push(Attribute::new("early", Type::named("long")));
    mb.add_interface(base);
    let model = mb.build().unwrap();
    assert_eq!(model.interfaces().len(), 1);
    let a = model.interface("A").unwrap();
    assert!(!a.is_partial);
    let names: Vec<_> = a.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["early", "late"]);
  }

  #[test]
  fn duplicate_principal_declarations_are_rejected() {
    let mut mb = ModelBuilder::new();
    mb.add_interface(iface("A"));
    mb.add_interface(iface("A"));
    assert_eq!(mb.build().unwrap_err().code(), "PI0008");

    let mut mb = ModelBuilder::new();
    mb.add_interface(iface("A"));
    mb.add_dictionary(DictionaryBuilder::new("A"));
    assert_eq!(mb.build().unwrap_err().code(), "PI0008");
  }

  #[test]
  fn links_check_mixin_kind() {
    let mut mixin = iface("M");
    mixin.is_mixin = true;

    let mut mb = ModelBuilder::new();
    mb.add_interface(iface("A"));
    mb.add_interface(mixin.clone());
    mb.add_link(link(LinkKind::Includes, "A", "M"));
    let model = mb.build().unwrap();
    assert_eq!(model.interface("A").unwrap().supers, ["M"]);

    let mut mb = ModelBuilder::new();
    mb.add_interface(iface("A"));
    mb.add_interface(mixin);
    mb.add_link(link(LinkKind::Implements, "A", "M"));
    assert_eq!(mb.build().unwrap_err().code(), "PI0005");

    let mut mb = ModelBuilder::new();
    mb.add_interface(iface("A"));
    mb.add_interface(iface("B"));
    mb.add_link(link(LinkKind::Includes, "A", "B"));
    assert_eq!(mb.build().unwrap_err().code(), "PI0006");
  }

  #[test]
  fn unknown_link_target_is_a_reference_error() {
    let mut mb = ModelBuilder::new();
    mb.add_interface(iface("A"));
    mb.add_link(link(LinkKind::Implements, "A", "B"));
    let err = mb.build().unwrap_err();
    assert_eq!(err.category(), crate::error::ErrorCategory::Reference);
    assert!(matches!(err.typ, IdlErrorType::UnknownName { ref name, .. } if name == "B"));
  }

  fn typedef(name: &str, typ: Type) -> TypeDef {
    TypeDef {
      name: name.into(),
      typ,
      package: String::new(),
      decorators: Default::default(),
    }
  }

  #[test]
  fn resolves_typedef_chains() {
    let mut mb = ModelBuilder::new();
    mb.add_typedef(typedef("Real", Type::named("double")), None);
    let scalar = Type::Simple(SimpleType::new("Real", false, Vec::new(), true));
    mb.add_typedef(typedef("Scalar", scalar), None);
    let model = mb.build().unwrap();
    let resolved = model.resolve_typedef(&Type::named("Scalar"));
    assert_eq!(resolved.to_string(), "double?");
    assert_eq!(model.resolve_typedef(&Type::named("Foo")), Type::named("Foo"));
  }

  #[test]
  fn platform_filter_drops_gated_declarations() {
    let mut mb = ModelBuilder::new();
    let mut win = iface("Win");
    win
      .decorators
      .insert(Decorator::new(keys::PLATFORMS, Some("windows".into())));
    mb.add_interface(win);
    let mut both = iface("Both");
    let mut attr = Attribute::new("linuxOnly", Type::named("long"));
    attr
      .decorators
      .insert(Decorator::new(keys::PLATFORMS, Some("linux;android".into())));
    both.attributes.push(attr);
    mb.add_interface(both);
    let model = mb.build().unwrap();

    let linux = model.for_platform("linux");
    assert!(linux.interface("Win").is_none());
    assert_eq!(linux.interface("Both").unwrap().attributes.len(), 1);

    let windows = model.for_platform("windows");
    assert!(windows.interface("Win").is_some());
    assert!(windows.interface("Both").unwrap().attributes.is_empty());
  }

  #[test]
  fn packages_are_sorted_and_distinct() {
    let mut mb = ModelBuilder::new();
    let mut a = iface("A");
    a.package = "b.pkg".into();
    let mut b = iface("B");
    b.package = "a.pkg".into();
    let mut c = iface("C");
    c.package = "b.pkg".into();
    mb.add_interface(a);
    mb.add_interface(b);
    mb.add_interface(c);
    let model = mb.build().unwrap();
    assert_eq!(model.packages(), ["a.pkg", "b.pkg"]);
    assert_eq!(model.interfaces_in_package("b.pkg").count(), 2);
  }
}
