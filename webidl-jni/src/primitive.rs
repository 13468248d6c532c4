//! The fixed correspondence between WebIDL basic types and their JNI, C++ and Java forms.

use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Primitive {
  pub idl: &'static str,
  /// JNI type at the raw boundary, e.g. `jint`.
  pub raw: &'static str,
  /// C++ type on the native side.
  pub native: &'static str,
  /// Java type on the managed side.
  pub managed: &'static str,
  /// JNI type descriptor, e.g. `I`.
  pub signature: &'static str,
}

const fn p(
  idl: &'static str,
  raw: &'static str,
  native: &'static str,
  managed: &'static str,
  signature: &'static str,
) -> Primitive {
  Primitive {
    idl,
    raw,
    native,
    managed,
    signature,
  }
}

pub const STRING_SIGNATURE: &str = "Ljava/lang/String;";

pub const PRIMITIVES: [Primitive; 18] = [
  p("boolean", "jboolean", "bool", "boolean", "Z"),
  p("byte", "jbyte", "signed char", "byte", "B"),
  p("octet", "jbyte", "unsigned char", "byte", "B"),
  p("short", "jshort", "short", "short", "S"),
  p("unsigned short", "jshort", "unsigned short", "short", "S"),
  p("long", "jint", "int", "int", "I"),
  p("unsigned long", "jint", "unsigned int", "int", "I"),
  p("long long", "jlong", "long long", "long", "J"),
  p("unsigned long long", "jlong", "unsigned long long", "long", "J"),
  p("float", "jfloat", "float", "float", "F"),
  p("unrestricted float", "jfloat", "float", "float", "F"),
  p("double", "jdouble", "double", "double", "D"),
  p("unrestricted double", "jdouble", "double", "double", "D"),
  p("DOMString", "jstring", "const char*", "String", STRING_SIGNATURE),
  p("USVString", "jstring", "const char*", "String", STRING_SIGNATURE),
  p("ByteString", "jstring", "const char*", "String", STRING_SIGNATURE),
  p("void", "void", "void", "void", "V"),
  p("undefined", "void", "void", "void", "V"),
];

/// Pointer-sized handle used for opaque pointers, interfaces and dictionaries.
pub const HANDLE: Primitive = p("VoidPtr", "jlong", "void*", "long", "J");

/// Wire form of enum values.
pub const ENUM_WIRE: Primitive = p("long", "jint", "int", "int", "I");

static BY_NAME: Lazy<HashMap<&'static str, &'static Primitive>> = Lazy::new(|| {
  let mut map = HashMap::new();
  for prim in PRIMITIVES.iter() {
    map.insert(prim.idl, prim);
  }
  map
});

pub fn primitive(idl: &str) -> Option<&'static Primitive> {
  BY_NAME.get(idl).copied()
}
