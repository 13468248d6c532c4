use crate::decorator::keys;
use crate::decorator::Decorated;
use crate::error::ErrorCategory;
use crate::error::IdlErrorType;
use crate::model::types::Type;
use crate::model::Model;
use crate::parse::ParseOptions;
use crate::parse_with_options;
use crate::IdlParser;

fn parse(code: &str) -> Model {
  crate::parse(code).unwrap()
}

fn parse_err(code: &str) -> IdlErrorType {
  crate::parse(code).unwrap_err().typ
}

#[test]
fn test_constructor_and_function() {
  let model = parse("interface Foo { [NoDelete] Foo(long x); long getX(); };");
  assert_eq!(model.interfaces().len(), 1);
  let foo = model.interface("Foo").unwrap();
  assert_eq!(foo.functions.len(), 2);
  assert!(foo.attributes.is_empty());

  let ctor = &foo.functions[0];
  assert!(ctor.is_constructor);
  assert_eq!(ctor.name, "Foo");
  assert_eq!(ctor.parameters.len(), 1);
  assert!(ctor.has_decorator(keys::NO_DELETE));

  let get_x = &foo.functions[1];
  assert_eq!(get_x.name, "getX");
  assert!(get_x.parameters.is_empty());
  assert_eq!(get_x.return_type, Type::named("long"));
  assert_eq!(get_x.owner.as_deref(), Some("Foo"));
}

#[test]
fn test_constructor_keyword_form() {
  let model = parse("interface Foo { constructor(); constructor(float f); };");
  let foo = model.interface("Foo").unwrap();
  assert_eq!(foo.constructors().count(), 2);
  assert!(foo.constructors().all(|c| c.name == "Foo"));
}

#[test]
fn test_static_attribute_and_function() {
  let model = parse(
    r#"
    interface Math {
      static attribute long counter;
      static readonly attribute double PI;
      static double abs(double v);
      readonly attribute long size;
      inherit stringifier attribute DOMString label;
    };
    "#,
  );
  let math = model.interface("Math").unwrap();
  assert_eq!(math.attributes.len(), 4);
  let counter = math.attribute("counter").unwrap();
  assert!(counter.is_static && !counter.is_readonly);
  let pi = math.attribute("PI").unwrap();
  assert!(pi.is_static && pi.is_readonly);
  let size = math.attribute("size").unwrap();
  assert!(!size.is_static && size.is_readonly);
  assert!(math.attribute("label").is_some());
  assert_eq!(math.functions.len(), 1);
  assert!(math.functions[0].is_static);
}

#[test]
fn test_optional_parameters_explode() {
  let code = "interface C { void f(long a, optional long b, optional long c); };";
  let model = parse(code);
  let counts: Vec<_> = model
    .interface("C")
    .unwrap()
    .functions
    .iter()
    .map(|f| f.parameters.len())
    .collect();
  assert_eq!(counts, [1, 2, 3]);

  let raw = parse_with_options(
    code,
    ParseOptions {
      explode_optional_functions: false,
    },
  )
  .unwrap();
  let functions = &raw.interface("C").unwrap().functions;
  assert_eq!(functions.len(), 1);
  assert_eq!(functions[0].optional_parameter_count(), 2);
}

#[test]
fn test_required_after_optional_is_located() {
  let err = crate::parse("interface C {\n  void f(optional long a, long b);\n};").unwrap_err();
  assert_eq!(err.code(), "PI0009");
  assert_eq!(err.category(), ErrorCategory::Structural);
  assert_eq!(err.pos.unwrap().line, 2);
}

#[test]
fn test_decorators_survive_comments() {
  let model = parse(
    r#"
    interface A {
      [Value]
      // the position
      attribute Vec3 pos;
    };
    interface Vec3 {};
    "#,
  );
  let pos = model.interface("A").unwrap().attribute("pos").unwrap();
  assert!(pos.has_decorator(keys::VALUE));
  assert_eq!(pos.comment.as_deref(), Some("the position"));
}

#[test]
fn test_dangling_decorators_do_not_leak() {
  let model = parse(
    r#"
    interface A {
      attribute long x;
      [Value]
    };
    [Const]
    A includes M;
    interface B { attribute long y; };
    interface mixin M {};
    "#,
  );
  let b = model.interface("B").unwrap();
  assert!(b.decorators.is_empty());
  assert!(b.attributes[0].decorators.is_empty());
  assert_eq!(model.interface("A").unwrap().supers, ["M"]);
}

#[test]
fn test_package_tags() {
  let mut parser = IdlParser::new();
  parser
    .parse_str(
      "first.idl",
      r#"
      interface Root {};
      // [package=physics.vehicle]
      interface Wheel {};
      /* [package=physics.geometry] */
      enum Shape { "Shape::eBOX" };
      "#,
    )
    .unwrap();
  parser.parse_str("second.idl", "interface Fresh {};").unwrap();
  let model = parser.finish().unwrap();
  assert_eq!(model.interface("Root").unwrap().package, "");
  assert_eq!(model.interface("Wheel").unwrap().package, "physics.vehicle");
  assert_eq!(model.enumeration("Shape").unwrap().package, "physics.geometry");
  // Each source starts without a package.
  assert_eq!(model.interface("Fresh").unwrap().package, "");
  // Meta tag comments are not attached as documentation.
  assert_eq!(model.interface("Wheel").unwrap().comment, None);
}

#[test]
fn test_forward_references_across_sources() {
  let mut parser = IdlParser::new();
  parser.parse_str("a.idl", "Car implements Vehicle;\ninterface Car {};").unwrap();
  parser
    .parse_str(
      "b.idl",
      "interface Vehicle { attribute long wheels; };\npartial interface Car { void drive(); };",
    )
    .unwrap();
  let model = parser.finish().unwrap();
  let car = model.interface("Car").unwrap();
  assert_eq!(car.supers, ["Vehicle"]);
  assert_eq!(car.functions.len(), 1);
  assert!(!car.is_partial);
}

#[test]
fn test_enum_values() {
  let model = parse(
    r#"
    enum Color {
      "Color::RED", // warm
      /* cool */ "Color::GREEN"
      // trailing
    };
    "#,
  );
  let color = model.enumeration("Color").unwrap();
  let values: Vec<_> = color
    .values
    .iter()
    .map(|v| (v.value.as_str(), v.unprefixed.as_str()))
    .collect();
  assert_eq!(values, [("Color::RED", "RED"), ("Color::GREEN", "GREEN")]);
}

#[test]
fn test_enum_values_need_separators() {
  assert_eq!(
    parse_err("enum E { \"A\" \"B\" };"),
    IdlErrorType::ExpectedToken(",".into())
  );
}

#[test]
fn test_dictionary_members() {
  let model = parse(
    r#"
    dictionary Options : Base {
      required long count;
      DOMString label = "a, b";
      boolean flag = false;
    };
    dictionary Base {};
    "#,
  );
  let options = model.dictionary("Options").unwrap();
  assert_eq!(options.supers, ["Base"]);
  let count = options.member("count").unwrap();
  assert!(count.required && count.default_value.is_none());
  assert_eq!(options.member("label").unwrap().default_value.as_deref(), Some("\"a, b\""));
  assert_eq!(options.member("flag").unwrap().default_value.as_deref(), Some("false"));
  assert_eq!(count.owner.as_deref(), Some("Options"));
}

#[test]
fn test_namespace_and_typedef() {
  let model = parse(
    r#"
    typedef unsigned long long Handle;
    namespace Limits {
      const long MAX_ACTORS = 64;
      const double EPSILON = 1e-6;
    };
    "#,
  );
  let limits = model.namespace("Limits").unwrap();
  assert_eq!(limits.constant("MAX_ACTORS").unwrap().value, "64");
  assert_eq!(limits.constant("EPSILON").unwrap().value, "1e-6");
  assert_eq!(
    model.resolve_typedef(&Type::named("Handle")),
    Type::named("unsigned long long")
  );
}

#[test]
fn test_setlike() {
  let model = parse("interface Tags { readonly setlike<DOMString>; };");
  let setlike = model.interface("Tags").unwrap().setlike.clone().unwrap();
  assert!(setlike.is_readonly);
  assert_eq!(setlike.typ, Type::named("DOMString"));

  // Accepted by the parser, rejected by the model.
  let err = crate::parse("interface Tags { setlike<long>; void clear(); };").unwrap_err();
  assert_eq!(err.code(), "PI0007");
}

#[test]
fn test_mixin_statements() {
  let base = "interface A {}; interface mixin M {}; interface B {};";
  assert!(crate::parse(&format!("{} A includes M;", base)).is_ok());
  assert!(crate::parse(&format!("{} A implements B;", base)).is_ok());
  assert!(matches!(
    parse_err(&format!("{} A implements M;", base)),
    IdlErrorType::MixinImplemented { .. }
  ));
  assert!(matches!(
    parse_err(&format!("{} A includes B;", base)),
    IdlErrorType::NonMixinIncluded { .. }
  ));
}

#[test]
fn test_unexpected_content() {
  let err = crate::parse("interface A {\n  42;\n};").unwrap_err();
  assert_eq!(err.typ, IdlErrorType::UnexpectedContent);
  assert_eq!(err.pos.as_ref().unwrap().line, 2);
  assert!(err.buffer.starts_with("42;"));

  assert_eq!(parse_err("garbage"), IdlErrorType::UnexpectedContent);
  // An attribute without the keyword is not a function either.
  assert_eq!(parse_err("interface A { long x; };"), IdlErrorType::UnexpectedContent);
}

#[test]
fn test_unterminated_body() {
  let err = crate::parse("interface A {\n  attribute long x;\n").unwrap_err();
  assert_eq!(err.code(), "PI0002");
}

#[test]
fn test_invalid_types_fail() {
  let err = crate::parse("interface A { attribute 1Foo x; };").unwrap_err();
  assert_eq!(err.category(), ErrorCategory::Type);
  assert_eq!(err.typ, IdlErrorType::InvalidType("1Foo".into()));
}

#[test]
fn test_union_and_nullable_types() {
  let model = parse("interface A { attribute (Foo or long)? u; Foo? find(DOMString? key); };");
  let a = model.interface("A").unwrap();
  assert!(matches!(a.attribute("u").unwrap().typ, Type::Union(ref u) if u.nullable));
  let find = &a.functions[0];
  assert!(find.return_type.is_nullable());
  assert!(find.parameters[0].typ.is_nullable());
}

#[test]
fn test_callback_interface() {
  let model = parse(
    "[JSImplementation=\"Listener\"] callback interface ListenerImpl { void onEvent(long code); };",
  );
  let listener = model.interface("ListenerImpl").unwrap();
  assert!(listener.is_callback);
  assert_eq!(listener.decorator_value(keys::JS_IMPLEMENTATION), Some("Listener"));
}
