use crate::error::MappingError;
use crate::error::MappingResult;
use crate::mangle::overload_suffix;
use crate::mangle::raw_symbol;
use crate::mangle::type_fragment;
use crate::primitive::ENUM_WIRE;
use crate::primitive::HANDLE;
use crate::types::TypeMapping;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use serde::Serialize;

/// Name of the instance handle parameter of raw instance methods.
pub const INSTANCE_PARAMETER: &str = "_address";
/// Name of the element index parameter of array accessors.
pub const INDEX_PARAMETER: &str = "index";
/// Stands in for the IDL type of the instance handle parameter.
pub const INSTANCE_TYPE: &str = "this";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RawParameter {
  pub name: String,
  /// IDL type the parameter carries.
  pub idl: String,
  pub raw: String,
  pub signature: String,
}

impl RawParameter {
  pub fn instance() -> RawParameter {
    RawParameter {
      name: INSTANCE_PARAMETER.to_string(),
      idl: INSTANCE_TYPE.to_string(),
      raw: HANDLE.raw.to_string(),
      signature: HANDLE.signature.to_string(),
    }
  }

  pub fn index() -> RawParameter {
    RawParameter {
      name: INDEX_PARAMETER.to_string(),
      idl: ENUM_WIRE.idl.to_string(),
      raw: ENUM_WIRE.raw.to_string(),
      signature: ENUM_WIRE.signature.to_string(),
    }
  }

  pub fn mapped(name: impl Into<String>, mapping: &TypeMapping) -> RawParameter {
    RawParameter {
      name: name.into(),
      idl: mapping.idl.clone(),
      raw: mapping.raw.clone(),
      signature: mapping.signature.clone(),
    }
  }
}

/// A static native method on the managed class, as seen by the JVM.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RawMethod {
  pub name: String,
  /// Whether another raw method of the same class shares the name.
  pub is_overloaded: bool,
  /// Argument descriptor appended to the symbol of overloaded methods; empty otherwise.
  pub overload_suffix: String,
  pub symbol: String,
  pub parameters: Vec<RawParameter>,
  /// JNI return type.
  pub returns: String,
}

impl RawMethod {
  /// An unlinked method; [`link`] assigns the suffix and symbol once every method of the class is
  /// known.
  pub fn new(
    name: String,
    parameters: Vec<RawParameter>,
    returns: impl Into<String>,
  ) -> RawMethod {
    RawMethod {
      name,
      is_overloaded: false,
      overload_suffix: String::new(),
      symbol: String::new(),
      parameters,
      returns: returns.into(),
    }
  }

  pub fn descriptor(&self) -> String {
    overload_suffix(self.parameters.iter().map(|p| p.signature.as_str()))
  }
}

/// Assigns overload suffixes and symbols to every raw method of `class`. Methods sharing a name
/// get the long symbol form. Methods sharing both name and descriptor are first renamed after the
/// IDL types of the parameters where they differ, e.g. `_f_A` and `_f_B`; if their IDL parameter
/// types are identical too they are rejected.
pub fn link<'a>(
  class: &str,
  methods: impl IntoIterator<Item = &'a mut RawMethod>,
) -> MappingResult<()> {
  let mut methods: Vec<&mut RawMethod> = methods.into_iter().collect();
  disambiguate(class, &mut methods)?;

  let mut uses = HashMap::<&str, usize>::new();
  for m in methods.iter() {
    *uses.entry(m.name.as_str()).or_default() += 1;
  }
  let overloaded: HashSet<String> = uses
    .into_iter()
    .filter(|(_, n)| *n > 1)
    .map(|(name, _)| name.to_string())
    .collect();

  let mut symbols = HashSet::new();
  for m in methods {
    m.is_overloaded = overloaded.contains(&m.name);
    m.overload_suffix = if m.is_overloaded {
      m.descriptor()
    } else {
      String::new()
    };
    let suffix = m.is_overloaded.then_some(m.overload_suffix.as_str());
    m.symbol = raw_symbol(class, &m.name, suffix);
    if !symbols.insert(m.symbol.clone()) {
      return Err(MappingError::ConflictingOverloads {
        class: class.to_string(),
        method: m.name.clone(),
      });
    }
  }
  Ok(())
}

/// Renames methods whose name and descriptor are shared by another method.
fn disambiguate(class: &str, methods: &mut [&mut RawMethod]) -> MappingResult<()> {
  let mut groups = HashMap::<(String, String), Vec<usize>>::new();
  for (i, m) in methods.iter().enumerate() {
    groups.entry((m.name.clone(), m.descriptor())).or_default().push(i);
  }
  let mut groups: Vec<Vec<usize>> = groups.into_values().filter(|g| g.len() > 1).collect();
  // Renaming order must not depend on hashing.
  groups.sort_unstable();

  for group in groups {
    let types: Vec<Vec<&str>> = group
      .iter()
      .map(|&i| methods[i].parameters.iter().map(|p| p.idl.as_str()).collect())
      .collect();
    let mut distinct = HashSet::new();
    if !types.iter().all(|t| distinct.insert(t)) {
      return Err(MappingError::ConflictingOverloads {
        class: class.to_string(),
        method: methods[group[0]].name.clone(),
      });
    }
    let arity = types.iter().map(Vec::len).max().unwrap_or(0);
    let differing: Vec<usize> = (0..arity)
      .filter(|&p| types.iter().any(|t| t.get(p) != types[0].get(p)))
      .collect();
    let renamed: Vec<String> = types
      .iter()
      .zip(&group)
      .map(|(t, &i)| {
        let mut name = methods[i].name.clone();
        for idl in differing.iter().filter_map(|&p| t.get(p)) {
          name.push('_');
          name.push_str(&type_fragment(idl));
        }
        name
      })
      .collect();
    for (name, &i) in renamed.into_iter().zip(&group) {
      methods[i].name = name;
    }
  }
  Ok(())
}
