use super::types::Type;
use super::write_comment;
use crate::decorator::Decorated;
use crate::decorator::Decorators;
use crate::error::IdlError;
use crate::error::IdlErrorType;
use crate::error::IdlResult;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Clone, Debug, Serialize)]
pub struct Parameter {
  pub name: String,
  #[serde(rename = "type")]
  pub typ: Type,
  pub optional: bool,
  pub default_value: Option<String>,
  pub decorators: Decorators,
}

impl Parameter {
  pub fn new(name: impl Into<String>, typ: Type) -> Parameter {
    Parameter {
      name: name.into(),
      typ,
      optional: false,
      default_value: None,
      decorators: Decorators::new(),
    }
  }
}

// Structural identity is (name, type, optional); defaults and decorators don't distinguish
// parameters.
impl PartialEq for Parameter {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name && self.typ == other.typ && self.optional == other.optional
  }
}

impl Eq for Parameter {}

impl Decorated for Parameter {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for Parameter {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.decorators)?;
    if self.optional {
      f.write_str("optional ")?;
    }
    write!(f, "{} {}", self.typ, self.name)?;
    if let Some(default) = &self.default_value {
      write!(f, " = {}", default)?;
    }
    Ok(())
  }
}

/// A plain function or a constructor. Constructors are named like their interface and return it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Function {
  pub name: String,
  pub return_type: Type,
  pub is_static: bool,
  pub is_constructor: bool,
  pub parameters: Vec<Parameter>,
  pub decorators: Decorators,
  pub comment: Option<String>,
  /// Name of the owning interface; assigned when the interface is built.
  pub owner: Option<String>,
}

impl Function {
  /// Whether the raw function implicitly receives the instance handle.
  pub fn receives_instance(&self) -> bool {
    !self.is_static && !self.is_constructor
  }

  pub fn optional_parameter_count(&self) -> usize {
    self.parameters.iter().filter(|p| p.optional).count()
  }

  /// Whether this overload is `shorter` plus exactly one more optional parameter, as produced by
  /// optional-parameter explosion.
  pub fn extends_overload(&self, shorter: &Function) -> bool {
    self.name == shorter.name
      && self.is_static == shorter.is_static
      && self.is_constructor == shorter.is_constructor
      && self.return_type == shorter.return_type
      && self.decorators == shorter.decorators
      && self.parameters.len() == shorter.parameters.len() + 1
      && self.parameters.last().is_some_and(|p| p.optional)
      && self.parameters[..shorter.parameters.len()] == shorter.parameters[..]
  }
}

impl Decorated for Function {
  fn decorators(&self) -> &Decorators {
    &self.decorators
  }
}

impl Display for Function {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write_comment(f, &self.comment)?;
    write!(f, "{}", self.decorators)?;
    if self.is_constructor {
      f.write_str(&self.name)?;
    } else {
      if self.is_static {
        f.write_str("static ")?;
      }
      write!(f, "{} {}", self.return_type, self.name)?;
    }
    f.write_str("(")?;
    for (i, p) in self.parameters.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }
      write!(f, "{}", p)?;
    }
    f.write_str(");")
  }
}

#[derive(Clone, Debug)]
pub struct FunctionBuilder {
  pub name: String,
  pub return_type: Type,
  pub is_static: bool,
  pub is_constructor: bool,
  pub parameters: Vec<Parameter>,
  pub decorators: Decorators,
  pub comment: Option<String>,
}

impl FunctionBuilder {
  pub fn new(name: impl Into<String>, return_type: Type) -> FunctionBuilder {
    FunctionBuilder {
      name: name.into(),
      return_type,
      is_static: false,
      is_constructor: false,
      parameters: Vec::new(),
      decorators: Decorators::new(),
      comment: None,
    }
  }

  pub fn constructor(interface: &str) -> FunctionBuilder {
    let mut builder = FunctionBuilder::new(interface, Type::named(interface));
    builder.is_constructor = true;
    builder
  }

  pub fn add_parameter(&mut self, parameter: Parameter) {
    self.parameters.push(parameter);
  }

  /// Finalizes the declaration. With `explode`, a declaration with `k` trailing optional
  /// parameters becomes `k + 1` overloads sharing the required prefix, in increasing order of
  /// optional parameters included. Without it, the single raw declaration is returned.
  pub fn build(self, explode: bool) -> IdlResult<Vec<Function>> {
    let first_optional = self.parameters.iter().position(|p| p.optional);
    if let Some(first) = first_optional {
      if let Some(required) = self.parameters[first..].iter().find(|p| !p.optional) {
        return Err(IdlError::model(IdlErrorType::RequiredAfterOptional {
          function: self.name.clone(),
          parameter: required.name.clone(),
        }));
      }
    }

    let function = Function {
      name: self.name,
      return_type: self.return_type,
      is_static: self.is_static,
      is_constructor: self.is_constructor,
      parameters: self.parameters,
      decorators: self.decorators,
      comment: self.comment,
      owner: None,
    };
    let first = match first_optional {
      Some(first) if explode => first,
      _ => return Ok(vec![function]),
    };
    Ok(
      (first..=function.parameters.len())
        .map(|count| Function {
          parameters: function.parameters[..count].to_vec(),
          ..function.clone()
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn param(name: &str, typ: &str, optional: bool) -> Parameter {
    let mut p = Parameter::new(name, Type::named(typ));
    p.optional = optional;
    p
  }

  #[test]
  fn explodes_optional_parameters_into_overloads() {
    let mut b = FunctionBuilder::new("f", Type::named("void"));
    b.add_parameter(param("a", "long", false));
    b.add_parameter(param("b", "float", true));
    b.add_parameter(param("c", "boolean", true));
    let functions = b.clone().build(true).unwrap();
    assert_eq!(functions.len(), 3);
    let names: Vec<Vec<&str>> = functions
      .iter()
      .map(|f| f.parameters.iter().map(|p| p.name.as_str()).collect())
      .collect();
    assert_eq!(names, vec![vec!["a"], vec!["a", "b"], vec!["a", "b", "c"]]);
    assert!(functions.iter().all(|f| f.name == "f"));

    assert!(functions[1].extends_overload(&functions[0]));
    assert!(functions[2].extends_overload(&functions[1]));
    assert!(!functions[2].extends_overload(&functions[0]));

    let raw = b.build(false).unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].optional_parameter_count(), 2);
  }

  #[test]
  fn required_after_optional_is_rejected() {
    let mut b = FunctionBuilder::new("f", Type::named("void"));
    b.add_parameter(param("a", "long", true));
    b.add_parameter(param("b", "long", false));
    let err = b.build(true).unwrap_err();
    assert_eq!(err.code(), "PI0009");
  }

  #[test]
  fn parameter_identity_ignores_defaults_and_decorators() {
    let mut a = param("x", "long", true);
    a.default_value = Some("1".into());
    let b = param("x", "long", true);
    assert_eq!(a, b);
    assert_ne!(b, param("x", "long", false));
  }
}
