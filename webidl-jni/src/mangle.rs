//! JNI native method symbol derivation.
//!
//! Symbols follow the JNI naming scheme: `Java_`, the escaped class name with `.` replaced by
//! `_`, `_`, the escaped method name, and for overloaded methods `__` followed by the escaped
//! argument descriptor. Escapes: `_` is `_1`, `;` is `_2`, `[` is `_3`, and any other character
//! that is not ASCII alphanumeric is `_0xxxx` with four lowercase hex digits per UTF-16 unit.
//! Because an escaped `_` is always followed by a digit, and identifiers never start with one, no
//! two distinct (package, class, method, descriptor) tuples produce the same symbol.

use std::fmt::Write;

pub const SYMBOL_PREFIX: &str = "Java_";

/// Escapes one name component. `/` and `.` separate path segments and become `_`.
pub fn escape(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  for c in name.chars() {
    match c {
      'a'..='z' | 'A'..='Z' | '0'..='9' => out.push(c),
      '.' | '/' => out.push('_'),
      '_' => out.push_str("_1"),
      ';' => out.push_str("_2"),
      '[' => out.push_str("_3"),
      _ => {
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
          // Writing to a String cannot fail.
          let _ = write!(out, "_0{:04x}", unit);
        }
      }
    }
  }
  out
}

/// Concatenated JNI descriptors of the raw parameters, e.g. `JIF` for an instance method taking
/// `(long, float)`.
pub fn overload_suffix<'a>(signatures: impl IntoIterator<Item = &'a str>) -> String {
  signatures.into_iter().collect()
}

/// Identifier fragment naming an IDL type, used to tell apart overloads whose descriptors are
/// equal. Words are joined in camel case (`unsigned long` becomes `unsignedLong`) and the result
/// is escaped.
pub fn type_fragment(idl: &str) -> String {
  let mut name = String::with_capacity(idl.len());
  for (i, word) in idl.split_whitespace().enumerate() {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
      if i == 0 {
        name.push(first);
      } else {
        name.extend(first.to_uppercase());
      }
      name.extend(chars);
    }
  }
  escape(&name)
}

/// The exported symbol of a raw native method of `class` (fully qualified, `.`-separated).
/// `None` yields the short form used for methods that are not overloaded; the long form of an
/// overload without parameters ends in a bare `__`.
pub fn raw_symbol(class: &str, method: &str, suffix: Option<&str>) -> String {
  let mut symbol = format!("{}{}_{}", SYMBOL_PREFIX, escape(class), escape(method));
  if let Some(suffix) = suffix {
    symbol.push_str("__");
    symbol.push_str(&escape(suffix));
  }
  symbol
}

#[cfg(test)]
mod tests {
  use super::*;
  use ahash::HashMap;
  use ahash::HashMapExt;

  #[test]
  fn escapes_like_jni() {
    assert_eq!(escape("physics.math.PxVec3"), "physics_math_PxVec3");
    assert_eq!(escape("_getX"), "_1getX");
    assert_eq!(escape("Ljava/lang/String;"), "Ljava_lang_String_2");
    assert_eq!(escape("[I"), "_3I");
    assert_eq!(escape("é"), "_000e9");
  }

  #[test]
  fn short_and_long_forms() {
    assert_eq!(raw_symbol("Foo", "_getX", None), "Java_Foo__1getX");
    assert_eq!(raw_symbol("Foo", "_create", Some("")), "Java_Foo__1create__");
    assert_eq!(
      raw_symbol("physics.Foo", "_f", Some("JILjava/lang/String;")),
      "Java_physics_Foo__1f__JILjava_lang_String_2"
    );
  }

  #[test]
  fn type_fragments() {
    assert_eq!(type_fragment("long"), "long");
    assert_eq!(type_fragment("unsigned long"), "unsignedLong");
    assert_eq!(type_fragment("unsigned  long long"), "unsignedLongLong");
    assert_eq!(type_fragment("PxVec3"), "PxVec3");
    assert_eq!(type_fragment("My_Type"), "My_1Type");
  }

  #[test]
  fn underscore_doubling_would_collide() {
    let doubled = |package: &str, class: &str| {
      format!("{}_{}", package.replace('_', "__"), class.replace('_', "__"))
    };
    assert_eq!(doubled("a_", "b"), doubled("a", "_b"));
    assert_ne!(raw_symbol("a_.b", "f", None), raw_symbol("a._b", "f", None));
  }

  #[test]
  fn symbols_are_injective() {
    let packages = ["", "a", "a_", "a_b", "a.b", "a._b", "a_.b"];
    let classes = ["b", "_b", "b_", "b_c", "B1"];
    let methods = ["_f", "f", "f_", "f__I", "_f_1"];
    let suffixes = [
      None,
      Some(""),
      Some("I"),
      Some("J"),
      Some("JI"),
      Some("Ljava/lang/String;"),
      Some("JLjava/lang/String;I"),
    ];
    let mut seen: HashMap<String, (String, &str, Option<&str>)> = HashMap::new();
    for package in packages {
      for class in classes {
        let qualified = if package.is_empty() {
          class.to_string()
        } else {
          format!("{package}.{class}")
        };
        for method in methods {
          for suffix in suffixes {
            let symbol = raw_symbol(&qualified, method, suffix);
            let tuple = (qualified.clone(), method, suffix);
            if let Some(previous) = seen.insert(symbol.clone(), tuple.clone()) {
              panic!("{symbol} produced by both {previous:?} and {tuple:?}");
            }
          }
        }
      }
    }
  }
}
