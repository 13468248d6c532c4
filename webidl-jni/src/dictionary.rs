use crate::error::MappingResult;
use crate::interface::default_constructor;
use crate::interface::destructor_method;
use crate::interface::AttributeAbi;
use crate::interface::Field;
use crate::interface::FunctionAbi;
use crate::raw::link;
use crate::raw::RawMethod;
use crate::types::TypeMapper;
use parse_idl::model::dictionary::Dictionary;
use serde::Serialize;
use tracing::debug;

/// A dictionary crosses the boundary as a native struct owned by its managed wrapper; every
/// member gets a getter and a setter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DictionaryAbi {
  pub name: String,
  pub managed_class: String,
  pub native_type: String,
  pub supers: Vec<String>,
  pub constructor: FunctionAbi,
  pub members: Vec<AttributeAbi>,
  pub destructor: RawMethod,
}

impl DictionaryAbi {
  pub fn new(mapper: &TypeMapper, dictionary: &Dictionary) -> MappingResult<DictionaryAbi> {
    let native_type = mapper.native_name(&dictionary.name);
    let members = dictionary
      .members
      .iter()
      .map(|m| {
        let field = Field {
          name: &m.name,
          typ: &m.typ,
          decorators: &m.decorators,
          is_static: false,
          is_readonly: false,
        };
        AttributeAbi::new(mapper, &dictionary.name, &native_type, field)
      })
      .collect::<MappingResult<Vec<_>>>()?;
    let mut abi = DictionaryAbi {
      name: dictionary.name.clone(),
      managed_class: mapper
        .config()
        .managed_class(&dictionary.package, &dictionary.name),
      native_type,
      supers: dictionary.supers.clone(),
      constructor: FunctionAbi::new(mapper, &default_constructor(&dictionary.name))?,
      members,
      destructor: destructor_method(mapper),
    };
    let class = abi.managed_class.clone();
    let raw = std::iter::once(&mut abi.constructor.raw)
      .chain(abi.members.iter_mut().flat_map(|m| m.raw_methods()))
      .chain(std::iter::once(&mut abi.destructor));
    link(&class, raw)?;
    debug!(dictionary = abi.name.as_str(), members = abi.members.len(), "mapped dictionary");
    Ok(abi)
  }
}
