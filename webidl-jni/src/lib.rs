//! JNI type and ABI mapping for models built by `parse-idl`.
//!
//! The mapping is a pure function of a finished [`Model`] and a [`JniConfig`]: it decides how each
//! type, function, attribute and enum value crosses the boundary between the managed (Java) and
//! native (C++) sides, and returns those decisions as plain data. It emits no source text.

use error::MappingError;
use error::MappingResult;
use parse_idl::model::Model;
use serde::Serialize;
use tracing::debug_span;

pub mod config;
pub mod dictionary;
pub mod enumeration;
pub mod error;
pub mod interface;
pub mod mangle;
pub mod primitive;
pub mod raw;
pub mod types;

pub use config::JniConfig;
pub use dictionary::DictionaryAbi;
pub use enumeration::EnumAbi;
pub use interface::InterfaceAbi;
pub use types::TypeMapper;
pub use types::TypeMapping;

/// The ABI of every interface, dictionary and enum of a model, in model order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelAbi {
  pub interfaces: Vec<InterfaceAbi>,
  pub dictionaries: Vec<DictionaryAbi>,
  pub enums: Vec<EnumAbi>,
}

impl ModelAbi {
  pub fn new(model: &Model, config: &JniConfig) -> MappingResult<ModelAbi> {
    let _span = debug_span!("map_model").entered();
    let mapper = TypeMapper::new(model, config);
    Ok(ModelAbi {
      interfaces: model
        .interfaces()
        .iter()
        .map(|i| InterfaceAbi::new(&mapper, i))
        .collect::<MappingResult<_>>()?,
      dictionaries: model
        .dictionaries()
        .iter()
        .map(|d| DictionaryAbi::new(&mapper, d))
        .collect::<MappingResult<_>>()?,
      enums: model
        .enums()
        .iter()
        .map(|e| EnumAbi::new(&mapper, &e.name))
        .collect::<MappingResult<_>>()?,
    })
  }

  pub fn interface(&self, name: &str) -> Option<&InterfaceAbi> {
    self.interfaces.iter().find(|i| i.name == name)
  }

  pub fn enumeration(&self, name: &str) -> Option<&EnumAbi> {
    self.enums.iter().find(|e| e.name == name)
  }
}

/// Maps the interface `name` of the mapper's model.
pub fn interface_abi(mapper: &TypeMapper, name: &str) -> MappingResult<InterfaceAbi> {
  let interface = mapper
    .model()
    .interface(name)
    .ok_or_else(|| MappingError::UnknownInterface(name.to_string()))?;
  InterfaceAbi::new(mapper, interface)
}
