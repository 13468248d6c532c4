use crate::error::MappingResult;
use crate::raw::link;
use crate::raw::RawMethod;
use crate::raw::RawParameter;
use crate::types::TypeMapper;
use crate::types::TypeMapping;
use parse_idl::decorator::keys;
use parse_idl::decorator::Decorated;
use parse_idl::decorator::Decorators;
use parse_idl::model::function::Function;
use parse_idl::model::interface::Construction;
use parse_idl::model::interface::Interface;
use parse_idl::model::types::Type;
use serde::Serialize;
use tracing::debug;
use tracing::trace;

pub const DESTRUCTOR_NAME: &str = "delete_native_instance";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParameterAbi {
  pub name: String,
  pub optional: bool,
  pub mapping: TypeMapping,
}

/// A function or constructor as it crosses the boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FunctionAbi {
  /// Name on the managed surface. Overloads keep the plain name.
  pub name: String,
  pub is_static: bool,
  pub is_constructor: bool,
  /// Whether the raw method takes the instance handle as its first parameter.
  pub receives_instance: bool,
  pub parameters: Vec<ParameterAbi>,
  pub returns: TypeMapping,
  /// The returned native value is copied into thread-local storage before its address is
  /// returned.
  pub uses_value_cache: bool,
  pub raw: RawMethod,
}

impl FunctionAbi {
  pub fn new(mapper: &TypeMapper, function: &Function) -> MappingResult<FunctionAbi> {
    let owner = function.owner.as_deref().unwrap_or("");
    let member = format!("{}.{}", owner, function.name);
    trace!(member = member.as_str(), "mapping function");

    let returns = if function.is_constructor {
      mapper.map_scalar(&Type::named(owner), &Decorators::new(), &member)?
    } else {
      mapper.map_scalar(&function.return_type, &function.decorators, &member)?
    };
    let mut raw_parameters = Vec::new();
    if function.receives_instance() {
      raw_parameters.push(RawParameter::instance());
    }
    let mut parameters = Vec::new();
    for p in &function.parameters {
      let mapping = mapper.map_scalar(&p.typ, &p.decorators, &member)?;
      raw_parameters.push(RawParameter::mapped(&p.name, &mapping));
      parameters.push(ParameterAbi {
        name: p.name.clone(),
        optional: p.optional,
        mapping,
      });
    }
    let raw = RawMethod::new(
      mapper.config().raw_name(&function.name),
      raw_parameters,
      returns.raw.clone(),
    );
    Ok(FunctionAbi {
      name: function.name.clone(),
      is_static: function.is_static,
      is_constructor: function.is_constructor,
      receives_instance: function.receives_instance(),
      parameters,
      uses_value_cache: returns.uses_value_cache(),
      returns,
      raw,
    })
  }

  pub fn overload_suffix(&self) -> &str {
    &self.raw.overload_suffix
  }
}

/// One raw method reading or writing a field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessorAbi {
  pub raw: RawMethod,
  /// Native lvalue of the field, e.g. `_self->x` or `_self->x[index]`.
  pub native_expression: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttributeAbi {
  pub name: String,
  pub is_static: bool,
  /// Describes the element for array attributes.
  pub mapping: TypeMapping,
  pub getter: AccessorAbi,
  pub setter: Option<AccessorAbi>,
}

pub(crate) struct Field<'a> {
  pub name: &'a str,
  pub typ: &'a Type,
  pub decorators: &'a Decorators,
  pub is_static: bool,
  pub is_readonly: bool,
}

fn capitalize(name: &str) -> String {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

impl AttributeAbi {
  pub(crate) fn new(
    mapper: &TypeMapper,
    owner: &str,
    native_owner: &str,
    field: Field,
  ) -> MappingResult<AttributeAbi> {
    let member = format!("{}.{}", owner, field.name);
    trace!(member = member.as_str(), "mapping attribute");
    let mapping = mapper.map(field.typ, field.decorators, &member)?;

    let mut lvalue = if field.is_static {
      format!("{}::{}", native_owner, field.name)
    } else {
      format!("_self->{}", field.name)
    };
    let mut leading = Vec::new();
    if !field.is_static {
      leading.push(RawParameter::instance());
    }
    if mapping.is_array {
      lvalue.push_str("[index]");
      leading.push(RawParameter::index());
    }

    let config = mapper.config();
    let suffix = capitalize(field.name);
    let getter = AccessorAbi {
      raw: RawMethod::new(
        config.raw_name(&format!("get{suffix}")),
        leading.clone(),
        mapping.raw.clone(),
      ),
      native_expression: lvalue.clone(),
    };
    let setter = (!field.is_readonly).then(|| {
      let mut parameters = leading;
      parameters.push(RawParameter::mapped("value", &mapping));
      AccessorAbi {
        raw: RawMethod::new(config.raw_name(&format!("set{suffix}")), parameters, "void"),
        native_expression: lvalue,
      }
    });
    Ok(AttributeAbi {
      name: field.name.to_string(),
      is_static: field.is_static,
      mapping,
      getter,
      setter,
    })
  }

  pub(crate) fn raw_methods(&mut self) -> impl Iterator<Item = &mut RawMethod> {
    std::iter::once(&mut self.getter.raw).chain(self.setter.as_mut().map(|s| &mut s.raw))
  }
}

/// A zero-argument constructor of `owner`.
pub(crate) fn default_constructor(owner: &str) -> Function {
  Function {
    name: owner.to_string(),
    return_type: Type::named(owner),
    is_static: false,
    is_constructor: true,
    parameters: Vec::new(),
    decorators: Decorators::new(),
    comment: None,
    owner: Some(owner.to_string()),
  }
}

pub(crate) fn destructor_method(mapper: &TypeMapper) -> RawMethod {
  RawMethod::new(
    mapper.config().raw_name(DESTRUCTOR_NAME),
    vec![RawParameter::instance()],
    "void",
  )
}

/// How the managed class obtains its native instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ConstructionKind {
  Declared,
  /// A zero-argument constructor is assumed.
  ImplicitDefault,
  /// Allocates the native adapter forwarding to the managed implementation.
  CallbackAllocator,
  /// Mixins are never instantiated.
  None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InterfaceAbi {
  pub name: String,
  pub managed_class: String,
  pub native_type: String,
  pub supers: Vec<String>,
  /// Managed interface implemented by a callback adapter, from `JSImplementation`.
  pub callback_of: Option<String>,
  pub construction: ConstructionKind,
  pub constructors: Vec<FunctionAbi>,
  pub methods: Vec<FunctionAbi>,
  pub attributes: Vec<AttributeAbi>,
  pub destructor: Option<RawMethod>,
}

impl InterfaceAbi {
  pub fn new(mapper: &TypeMapper, interface: &Interface) -> MappingResult<InterfaceAbi> {
    let config = mapper.config();
    let managed_class = config.managed_class(&interface.package, &interface.name);
    let native_type = mapper.native_name(&interface.name);

    let (construction, declared) = match interface.construction() {
      _ if interface.is_mixin => (ConstructionKind::None, Vec::new()),
      Construction::Declared(ctors) => (ConstructionKind::Declared, ctors),
      Construction::ImplicitDefault => (ConstructionKind::ImplicitDefault, Vec::new()),
      Construction::CallbackAllocator => (ConstructionKind::CallbackAllocator, Vec::new()),
    };
    let mut constructors = declared
      .into_iter()
      .map(|c| FunctionAbi::new(mapper, c))
      .collect::<MappingResult<Vec<_>>>()?;
    if matches!(
      construction,
      ConstructionKind::ImplicitDefault | ConstructionKind::CallbackAllocator
    ) {
      constructors.push(FunctionAbi::new(mapper, &default_constructor(&interface.name))?);
    }

    let methods = interface
      .methods()
      .map(|f| FunctionAbi::new(mapper, f))
      .collect::<MappingResult<Vec<_>>>()?;
    let attributes = interface
      .attributes
      .iter()
      .map(|a| {
        let field = Field {
          name: &a.name,
          typ: &a.typ,
          decorators: &a.decorators,
          is_static: a.is_static,
          is_readonly: a.is_readonly,
        };
        AttributeAbi::new(mapper, &interface.name, &native_type, field)
      })
      .collect::<MappingResult<Vec<_>>>()?;
    let destructor = interface.has_destructor().then(|| destructor_method(mapper));

    let mut abi = InterfaceAbi {
      name: interface.name.clone(),
      managed_class,
      native_type,
      supers: interface.supers.clone(),
      callback_of: interface.decorator_value(keys::JS_IMPLEMENTATION).map(str::to_string),
      construction,
      constructors,
      methods,
      attributes,
      destructor,
    };
    abi.link()?;
    debug!(
      interface = abi.name.as_str(),
      class = abi.managed_class.as_str(),
      methods = abi.methods.len(),
      attributes = abi.attributes.len(),
      "mapped interface"
    );
    Ok(abi)
  }

  fn link(&mut self) -> MappingResult<()> {
    let class = self.managed_class.clone();
    let raw = self
      .constructors
      .iter_mut()
      .chain(self.methods.iter_mut())
      .map(|f| &mut f.raw)
      .chain(self.attributes.iter_mut().flat_map(|a| a.raw_methods()))
      .chain(self.destructor.as_mut());
    link(&class, raw)
  }

  pub fn method(&self, name: &str) -> impl Iterator<Item = &FunctionAbi> {
    let name = name.to_string();
    self.methods.iter().filter(move |m| m.name == name)
  }

  pub fn attribute(&self, name: &str) -> Option<&AttributeAbi> {
    self.attributes.iter().find(|a| a.name == name)
  }
}
