use crate::config::JniConfig;
use crate::error::MappingError;
use crate::error::MappingResult;
use crate::primitive::primitive;
use crate::primitive::Primitive;
use crate::primitive::ENUM_WIRE;
use crate::primitive::HANDLE;
use parse_idl::decorator::keys;
use parse_idl::decorator::Decorated;
use parse_idl::decorator::Decorators;
use parse_idl::model::types::SimpleType;
use parse_idl::model::types::Type;
use parse_idl::model::Declaration;
use parse_idl::model::Model;
use serde::Serialize;

/// How a type is represented on each side of the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TypeKind {
  Primitive,
  String,
  Void,
  /// Crosses as a 32-bit integer and is cast to the native enum type.
  Enum,
  /// `any` or `VoidPtr`: a bare native address.
  Opaque,
  Interface,
  Dictionary,
}

/// How a native object is passed or returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Passing {
  #[default]
  Pointer,
  Value,
  Reference,
}

/// Use-site modifiers, read from the decorators of a parameter, attribute or function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Modifiers {
  pub passing: Passing,
  pub is_const: bool,
  pub nullable: bool,
}

impl Modifiers {
  /// `Value` takes precedence over `Ref`.
  pub fn from_decorators(decorators: &Decorators) -> Modifiers {
    let passing = if decorators.has(keys::VALUE) {
      Passing::Value
    } else if decorators.has(keys::REF) {
      Passing::Reference
    } else {
      Passing::Pointer
    };
    Modifiers {
      passing,
      is_const: decorators.has(keys::CONST),
      nullable: decorators.has(keys::NULLABLE),
    }
  }
}

/// Everything a generator needs to move one value of a type across the boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeMapping {
  /// IDL text of the type after typedef resolution.
  pub idl: String,
  pub kind: TypeKind,
  /// JNI type of the raw native method parameter or result.
  pub raw: String,
  /// C++ type including `const`, `&` and `*` qualifiers.
  pub native: String,
  /// C++ type name without qualifiers, including any `Prefix`.
  pub native_base: String,
  /// Java type on the managed surface.
  pub managed: String,
  /// JNI type descriptor.
  pub signature: String,
  /// Array types are accessed one element at a time; the rest of this mapping describes the
  /// element.
  pub is_array: bool,
  /// Normalized modifiers. Always the default for types that are not native objects.
  pub modifiers: Modifiers,
}

impl TypeMapping {
  fn scalar(idl: String, kind: TypeKind, prim: &Primitive, is_array: bool) -> TypeMapping {
    TypeMapping {
      idl,
      kind,
      raw: prim.raw.to_string(),
      native: prim.native.to_string(),
      native_base: prim.native.to_string(),
      managed: prim.managed.to_string(),
      signature: prim.signature.to_string(),
      is_array,
      modifiers: Modifiers::default(),
    }
  }

  /// Whether the raw value is the address of a native interface or dictionary object.
  pub fn is_object(&self) -> bool {
    matches!(self.kind, TypeKind::Interface | TypeKind::Dictionary)
  }

  pub fn is_nullable(&self) -> bool {
    self.modifiers.nullable
  }

  pub fn is_void(&self) -> bool {
    self.kind == TypeKind::Void
  }

  /// Whether a returned native value must be copied into thread-local storage so that its
  /// address stays valid after the native call returns. Two such results from the same thread are
  /// not valid at the same time: the second call overwrites the first.
  pub fn uses_value_cache(&self) -> bool {
    self.is_object() && self.modifiers.passing == Passing::Value
  }

  /// Native expression converting the raw argument `expr` into the native parameter type.
  ///
  /// String arguments are never released with `ReleaseStringUTFChars`; the extracted buffer
  /// outlives the call.
  pub fn to_native(&self, expr: &str) -> String {
    match self.kind {
      TypeKind::Primitive | TypeKind::Void => expr.to_string(),
      TypeKind::String => format!("env->GetStringUTFChars({expr}, 0)"),
      TypeKind::Enum => format!("({}) {expr}", self.native_base),
      TypeKind::Opaque => format!("(void*) {expr}"),
      TypeKind::Interface | TypeKind::Dictionary => match self.modifiers.passing {
        Passing::Pointer => format!("({}*) {expr}", self.native_base),
        Passing::Value | Passing::Reference => format!("*({}*) {expr}", self.native_base),
      },
    }
  }

  /// Native expression converting the native result `expr` into the raw result type.
  pub fn from_native(&self, expr: &str) -> String {
    match self.kind {
      TypeKind::Primitive | TypeKind::Void => expr.to_string(),
      TypeKind::String => format!("env->NewStringUTF({expr})"),
      TypeKind::Enum => format!("(jint) {expr}"),
      TypeKind::Opaque => format!("(jlong) {expr}"),
      TypeKind::Interface | TypeKind::Dictionary => match self.modifiers.passing {
        Passing::Pointer => format!("(jlong) {expr}"),
        Passing::Value | Passing::Reference => format!("(jlong) &{expr}"),
      },
    }
  }

  /// Managed expression converting the managed value `expr` into the raw argument.
  pub fn managed_to_raw(&self, expr: &str) -> String {
    if !self.is_object() {
      return expr.to_string();
    }
    if self.is_nullable() {
      format!("({expr} != null ? {expr}.getAddress() : 0L)")
    } else {
      format!("{expr}.getAddress()")
    }
  }

  /// Managed expression converting the raw result `expr` into the managed value.
  pub fn raw_to_managed(&self, expr: &str) -> String {
    if !self.is_object() {
      return expr.to_string();
    }
    if self.is_nullable() {
      format!("({expr} != 0L ? {}.wrapPointer({expr}) : null)", self.managed)
    } else {
      format!("{}.wrapPointer({expr})", self.managed)
    }
  }

  /// The raw handle passed for a managed object at `address`, or for no object.
  pub fn to_raw(&self, address: Option<u64>) -> MappingResult<u64> {
    match address {
      Some(address) => Ok(address),
      None if self.is_nullable() => Ok(0),
      None => Err(MappingError::NullNotAllowed {
        type_name: self.idl.clone(),
      }),
    }
  }

  /// The managed object address for the raw handle `raw`. The zero handle of a nullable type
  /// means no object.
  pub fn from_raw(&self, raw: u64) -> Option<u64> {
    if raw == 0 && self.is_nullable() {
      None
    } else {
      Some(raw)
    }
  }
}

/// Maps IDL types onto the JNI boundary against a finished model.
#[derive(Clone, Copy, Debug)]
pub struct TypeMapper<'m> {
  model: &'m Model,
  config: &'m JniConfig,
}

impl<'m> TypeMapper<'m> {
  pub fn new(model: &'m Model, config: &'m JniConfig) -> TypeMapper<'m> {
    TypeMapper { model, config }
  }

  pub fn model(&self) -> &'m Model {
    self.model
  }

  pub fn config(&self) -> &'m JniConfig {
    self.config
  }

  /// The native name of a declaration, honouring its `Prefix` decorator.
  pub fn native_name(&self, name: &str) -> String {
    let prefix = match self.model.lookup(name) {
      Some(Declaration::Interface(d)) => d.decorator_value(keys::PREFIX),
      Some(Declaration::Dictionary(d)) => d.decorator_value(keys::PREFIX),
      Some(Declaration::Enum(d)) => d.decorator_value(keys::PREFIX),
      _ => None,
    };
    format!("{}{}", prefix.unwrap_or(""), name)
  }

  /// Maps `typ` as used by `member`, with modifiers taken from `decorators`.
  pub fn map(
    &self,
    typ: &Type,
    decorators: &Decorators,
    member: &str,
  ) -> MappingResult<TypeMapping> {
    let resolved = self.model.resolve_typedef(typ);
    let simple = match &resolved {
      Type::Simple(simple) => simple,
      Type::Union(_) => {
        return Err(MappingError::unsupported(
          resolved.to_string(),
          member,
          "union types cannot cross the boundary",
        ))
      }
    };
    self.map_simple(simple, Modifiers::from_decorators(decorators), member)
  }

  /// Like [`TypeMapper::map`], but rejects array types, which only attributes can carry.
  pub fn map_scalar(
    &self,
    typ: &Type,
    decorators: &Decorators,
    member: &str,
  ) -> MappingResult<TypeMapping> {
    let mapping = self.map(typ, decorators, member)?;
    if mapping.is_array {
      return Err(MappingError::unsupported(
        typ.to_string(),
        member,
        "arrays are only accessible element-wise through attributes",
      ));
    }
    Ok(mapping)
  }

  fn map_simple(
    &self,
    simple: &SimpleType,
    modifiers: Modifiers,
    member: &str,
  ) -> MappingResult<TypeMapping> {
    let element = simple.element().to_string();
    if simple.is_parameterized() {
      return Err(MappingError::unsupported(
        simple.to_string(),
        member,
        "parameterized types cannot cross the boundary",
      ));
    }
    if simple.is_primitive() {
      let Some(prim) = primitive(&simple.name) else {
        return Err(MappingError::UnresolvedType {
          type_name: simple.name.clone(),
          member: member.to_string(),
        });
      };
      let kind = if simple.is_void() {
        TypeKind::Void
      } else if simple.is_string() {
        TypeKind::String
      } else {
        TypeKind::Primitive
      };
      if kind == TypeKind::Void && simple.is_array {
        return Err(MappingError::unsupported(simple.to_string(), member, "array of void"));
      }
      return Ok(TypeMapping::scalar(element, kind, prim, simple.is_array));
    }
    if simple.is_any() {
      return Ok(TypeMapping::scalar(element, TypeKind::Opaque, &HANDLE, simple.is_array));
    }
    let kind = match self.model.lookup(&simple.name) {
      Some(Declaration::Enum(_)) => {
        let mut mapping =
          TypeMapping::scalar(element, TypeKind::Enum, &ENUM_WIRE, simple.is_array);
        mapping.native = self.native_name(&simple.name);
        mapping.native_base = mapping.native.clone();
        return Ok(mapping);
      }
      Some(Declaration::Interface(_)) => TypeKind::Interface,
      Some(Declaration::Dictionary(_)) => TypeKind::Dictionary,
      _ => {
        return Err(MappingError::UnresolvedType {
          type_name: simple.name.clone(),
          member: member.to_string(),
        })
      }
    };
    let modifiers = Modifiers {
      nullable: modifiers.nullable || simple.nullable,
      ..modifiers
    };
    let native_base = self.native_name(&simple.name);
    let qualifier = match modifiers.passing {
      Passing::Pointer => "*",
      Passing::Reference => "&",
      Passing::Value => "",
    };
    let constness = if modifiers.is_const { "const " } else { "" };
    Ok(TypeMapping {
      idl: element,
      kind,
      raw: HANDLE.raw.to_string(),
      native: format!("{constness}{native_base}{qualifier}"),
      native_base,
      managed: simple.name.clone(),
      signature: HANDLE.signature.to_string(),
      is_array: simple.is_array,
      modifiers,
    })
  }
}
