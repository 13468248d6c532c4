use crate::error::MappingError;
use crate::error::MappingResult;
use crate::primitive::ENUM_WIRE;
use crate::raw::link;
use crate::raw::RawMethod;
use crate::types::TypeMapper;
use parse_idl::decorator::keys;
use parse_idl::decorator::Decorated;
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumValueAbi {
  /// The literal as declared, e.g. `PxForceMode::eFORCE`.
  pub value: String,
  /// Identifier of the managed constant, e.g. `eFORCE`.
  pub constant: String,
  /// Native expression of the value, including any `Prefix`.
  pub native_value: String,
  /// Raw method returning the native value, so that managed constants never hard-code it.
  pub getter: RawMethod,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumAbi {
  pub name: String,
  pub managed_class: String,
  pub native_type: String,
  /// Always `jint`.
  pub wire_type: String,
  pub values: Vec<EnumValueAbi>,
}

impl EnumAbi {
  pub fn new(mapper: &TypeMapper, name: &str) -> MappingResult<EnumAbi> {
    let e = mapper
      .model()
      .enumeration(name)
      .ok_or_else(|| MappingError::UnknownEnum(name.to_string()))?;
    let config = mapper.config();
    let prefix = e.decorator_value(keys::PREFIX).unwrap_or("");
    let values = e
      .values
      .iter()
      .map(|v| EnumValueAbi {
        value: v.value.clone(),
        constant: v.unprefixed.clone(),
        native_value: format!("{prefix}{}", v.value),
        getter: RawMethod::new(
          config.raw_name(&format!("get{}", v.unprefixed)),
          Vec::new(),
          ENUM_WIRE.raw,
        ),
      })
      .collect();
    let mut abi = EnumAbi {
      name: e.name.clone(),
      managed_class: config.managed_class(&e.package, &e.name),
      native_type: mapper.native_name(&e.name),
      wire_type: ENUM_WIRE.raw.to_string(),
      values,
    };
    let class = abi.managed_class.clone();
    link(&class, abi.values.iter_mut().map(|v| &mut v.getter))?;
    debug!(enumeration = abi.name.as_str(), values = abi.values.len(), "mapped enum");
    Ok(abi)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::JniConfig;
  use parse_idl::parse;

  #[test]
  fn values_keep_their_literal() {
    let model = parse(
      r#"[Prefix="physx::"] enum PxForceMode { "PxForceMode::eFORCE", "PxForceMode::eIMPULSE" };"#,
    )
    .unwrap();
    let config = JniConfig::new().with_package_prefix("de.example");
    let mapper = TypeMapper::new(&model, &config);
    let abi = EnumAbi::new(&mapper, "PxForceMode").unwrap();
    assert_eq!(abi.wire_type, "jint");
    assert_eq!(abi.native_type, "physx::PxForceMode");
    assert_eq!(abi.managed_class, "de.example.PxForceMode");
    let force = &abi.values[0];
    assert_eq!(force.value, "PxForceMode::eFORCE");
    assert_eq!(force.constant, "eFORCE");
    assert_eq!(force.native_value, "physx::PxForceMode::eFORCE");
    assert_eq!(force.getter.symbol, "Java_de_example_PxForceMode__1geteFORCE");
    assert_eq!(abi.values[1].constant, "eIMPULSE");

    assert_eq!(EnumAbi::new(&mapper, "Missing").unwrap_err().code(), "JM0005");
  }
}
