use parse_idl::decorator::Decorators;
use parse_idl::model::types::SimpleType;
use parse_idl::model::types::Type;
use parse_idl::model::Model;
use parse_idl::parse;
use parse_idl::IdlParser;
use webidl_jni::error::MappingError;
use webidl_jni::interface::ConstructionKind;
use webidl_jni::interface_abi;
use webidl_jni::JniConfig;
use webidl_jni::ModelAbi;
use webidl_jni::TypeMapper;

const PHYSICS: &str = include_str!("../../parse-idl/tests/fixtures/physics.idl");

fn physics() -> Model {
  let mut parser = IdlParser::new();
  parser.parse_str("physics.idl", PHYSICS).unwrap();
  parser.finish().unwrap()
}

#[test]
fn overloads_get_distinct_symbols() {
  let model = parse("interface C { void f(long a); void f(long a, long b); };").unwrap();
  let config = JniConfig::new();
  let mapper = TypeMapper::new(&model, &config);
  let c = interface_abi(&mapper, "C").unwrap();
  let symbols: Vec<_> = c.method("f").map(|f| f.raw.symbol.as_str()).collect();
  assert_eq!(symbols, ["Java_C__1f__JI", "Java_C__1f__JII"]);
  let prefix = "Java_C__1f__";
  assert!(symbols.iter().all(|s| s.starts_with(prefix)));
  assert_ne!(&symbols[0][prefix.len()..], &symbols[1][prefix.len()..]);
  // The managed name is left alone.
  assert!(c.method("f").all(|f| f.name == "f" && f.raw.name == "_f"));
}

#[test]
fn overloads_with_equal_descriptors_are_renamed() {
  let model = parse(
    "interface A {}; interface B {};
     interface C {
       void f(A a);
       void f(B b);
       void g(long x);
       void g(unsigned long x);
     };",
  )
  .unwrap();
  let config = JniConfig::new();
  let mapper = TypeMapper::new(&model, &config);
  let c = interface_abi(&mapper, "C").unwrap();
  let raw = |name: &str| -> Vec<(String, String)> {
    c.method(name)
      .map(|f| (f.raw.name.clone(), f.raw.symbol.clone()))
      .collect()
  };
  assert_eq!(
    raw("f"),
    [
      ("_f_A".to_string(), "Java_C__1f_1A".to_string()),
      ("_f_B".to_string(), "Java_C__1f_1B".to_string()),
    ]
  );
  assert_eq!(
    raw("g"),
    [
      ("_g_long".to_string(), "Java_C__1g_1long".to_string()),
      ("_g_unsignedLong".to_string(), "Java_C__1g_1unsignedLong".to_string()),
    ]
  );
  assert!(c.method("f").all(|f| f.raw.descriptor() == "JJ"));
}

#[test]
fn overloads_with_identical_parameter_types_conflict() {
  let model = parse("interface A {}; interface C { void f(A a); void f(A b); };").unwrap();
  let config = JniConfig::new();
  let mapper = TypeMapper::new(&model, &config);
  let err = interface_abi(&mapper, "C").unwrap_err();
  assert_eq!(err.code(), "JM0006");
}

#[test]
fn overload_suffixes_across_the_fixture() {
  let model = physics();
  let abi = ModelAbi::new(&model, &JniConfig::new()).unwrap();
  for interface in &abi.interfaces {
    let functions: Vec<_> = interface.constructors.iter().chain(&interface.methods).collect();
    for (i, a) in functions.iter().enumerate() {
      let shared = functions
        .iter()
        .enumerate()
        .filter(|(j, b)| *j != i && b.name == a.name)
        .collect::<Vec<_>>();
      if shared.is_empty() {
        assert_eq!(a.overload_suffix(), "", "{}.{}", interface.name, a.name);
        assert!(!a.raw.is_overloaded);
      }
      for (_, b) in shared {
        assert_ne!(a.overload_suffix(), b.overload_suffix());
        assert_ne!(a.raw.symbol, b.raw.symbol);
      }
    }
  }

  let actor = abi.interface("PxRigidActor").unwrap();
  let suffixes: Vec<_> = actor.method("addForce").map(|f| f.overload_suffix()).collect();
  assert_eq!(suffixes, ["JJ", "JJI", "JJIZ"]);
  let cast = actor.method("cast").next().unwrap();
  assert!(!cast.receives_instance);
  assert_eq!(cast.raw.symbol, "Java_physics_scene_PxRigidActor__1cast");
  assert!(cast.returns.is_nullable());

  let vec3 = abi.interface("PxVec3").unwrap();
  let ctors: Vec<_> = vec3.constructors.iter().map(|c| c.raw.symbol.as_str()).collect();
  assert_eq!(
    ctors,
    [
      "Java_physics_math_PxVec3__1PxVec3__",
      "Java_physics_math_PxVec3__1PxVec3__FFF"
    ]
  );
}

#[test]
fn fixture_abi() {
  let model = physics();
  let config = JniConfig::new();
  let abi = ModelAbi::new(&model, &config).unwrap();
  assert_eq!(abi.interfaces.len(), model.interfaces().len());
  assert_eq!(abi.dictionaries.len(), 1);
  assert_eq!(abi.enums.len(), 1);

  let vec3 = abi.interface("PxVec3").unwrap();
  assert_eq!(vec3.managed_class, "physics.math.PxVec3");
  assert_eq!(vec3.native_type, "physx::PxVec3");
  assert_eq!(vec3.construction, ConstructionKind::Declared);
  assert!(vec3.destructor.is_some());
  let normalized = vec3.method("getNormalized").next().unwrap();
  assert!(normalized.uses_value_cache);
  assert_eq!(normalized.returns.from_native("_cache"), "(jlong) &_cache");
  let magnitude = vec3.method("magnitude").next().unwrap();
  assert!(!magnitude.uses_value_cache);
  assert_eq!(magnitude.raw.returns, "jfloat");
  assert_eq!(vec3.attribute("x").unwrap().getter.raw.name, "_getX");

  let actor = abi.interface("PxRigidActor").unwrap();
  assert_eq!(actor.supers, ["PxBase"]);
  assert_eq!(actor.construction, ConstructionKind::ImplicitDefault);
  assert!(actor.destructor.is_none());
  let force = &actor.method("addForce").next().unwrap().parameters[0].mapping;
  assert_eq!(force.native, "const physx::PxVec3&");
  assert_eq!(force.to_native("force"), "*(physx::PxVec3*) force");
  assert!(actor.attribute("actorIndex").unwrap().setter.is_none());

  let base = abi.interface("PxBase").unwrap();
  assert_eq!(base.construction, ConstructionKind::None);
  let name = base.method("getConcreteTypeName").next().unwrap();
  assert_eq!(name.returns.native, "const char*");

  let callback = abi.interface("SimpleEventCallback").unwrap();
  assert_eq!(callback.construction, ConstructionKind::CallbackAllocator);
  assert_eq!(callback.callback_of.as_deref(), Some("PxSimulationEventCallback"));
  assert!(callback.destructor.is_none());

  let cuda = abi.interface("PxCudaContext").unwrap();
  assert_eq!(cuda.attribute("context").unwrap().getter.raw.returns, "jlong");

  let options = &abi.dictionaries[0];
  let gravity = &options.members[0];
  assert_eq!(gravity.mapping.native, "physx::PxVec3");
  assert_eq!(gravity.getter.native_expression, "_self->gravity");

  let mode = abi.enumeration("PxForceModeEnum").unwrap();
  assert_eq!(mode.managed_class, "physics.scene.PxForceModeEnum");
  let constants: Vec<_> = mode.values.iter().map(|v| v.constant.as_str()).collect();
  assert_eq!(constants, ["eFORCE", "eIMPULSE", "eVELOCITY_CHANGE", "eACCELERATION"]);

  let json = serde_json::to_value(&abi).unwrap();
  assert_eq!(json["enums"][0]["wire_type"], "jint");
  assert_eq!(json["enums"][0]["values"][0]["constant"], "eFORCE");
  assert_eq!(json["dictionaries"][0]["members"][0]["mapping"]["kind"], "Interface");
}

#[test]
fn nullable_handles_round_trip_for_every_complex_type() {
  let model = physics();
  let config = JniConfig::new();
  let mapper = TypeMapper::new(&model, &config);
  let names = model
    .interfaces()
    .iter()
    .map(|i| i.name.as_str())
    .chain(model.dictionaries().iter().map(|d| d.name.as_str()));
  for name in names {
    let typ = Type::Simple(SimpleType::new(name, false, Vec::new(), true));
    let mapping = mapper.map(&typ, &Decorators::new(), "test").unwrap();
    assert!(mapping.is_object() && mapping.is_nullable(), "{name}");
    assert_eq!(mapping.from_raw(mapping.to_raw(None).unwrap()), None);
    for address in [1, 0xdead_beef, u64::MAX] {
      assert_eq!(mapping.from_raw(mapping.to_raw(Some(address)).unwrap()), Some(address));
    }
  }
}

#[test]
fn unresolved_types_name_the_member() {
  let model = parse("interface A { void f(Missing m); };").unwrap();
  let err = ModelAbi::new(&model, &JniConfig::new()).unwrap_err();
  assert_eq!(
    err,
    MappingError::UnresolvedType {
      type_name: "Missing".into(),
      member: "A.f".into(),
    }
  );

  let model = parse("interface A { void f(long[] values); };").unwrap();
  let err = ModelAbi::new(&model, &JniConfig::new()).unwrap_err();
  assert_eq!(err.code(), "JM0002");

  let config = JniConfig::new();
  let mapper = TypeMapper::new(&model, &config);
  assert_eq!(interface_abi(&mapper, "B").unwrap_err().code(), "JM0004");
}

#[test]
fn platform_filtering_applies_before_mapping() {
  let model = physics();
  let android = model.for_platform("android");
  let abi = ModelAbi::new(&android, &JniConfig::new()).unwrap();
  assert!(abi.interface("PxCudaContext").is_none());
  assert!(abi.interface("PxVec3").is_some());
}
