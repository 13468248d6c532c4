use crate::error::IdlErrorType;
use crate::lex::Pattern;
use crate::lex::TokenStream;
use crate::model::types::Type;
use std::cell::Cell;
use std::io;
use std::rc::Rc;

fn stream(code: &str) -> TokenStream<'_> {
  TokenStream::from_text("test", code)
}

fn check_type(code: &str, expected: &str) {
  let t = stream(code).parse_type().unwrap();
  assert_eq!(t.to_string(), expected);
}

#[test]
fn test_pulls_lines_only_when_needed() {
  let pulled = Rc::new(Cell::new(0));
  let counter = pulled.clone();
  let lines = ["interface", "Foo", "{", "};", "trailing"]
    .into_iter()
    .map(move |l| {
      counter.set(counter.get() + 1);
      Ok::<_, io::Error>(l.to_string())
    });
  let mut s = TokenStream::new("lazy", Box::new(lines));
  assert!(s.consume_keyword("interface").unwrap());
  assert_eq!(pulled.get(), 1);
  assert_eq!(s.pop_identifier("name").unwrap(), "Foo");
  assert_eq!(pulled.get(), 2);
  assert_eq!(s.line(), 2);
  s.pop_token("{").unwrap();
  assert_eq!(pulled.get(), 3);
}

#[test]
fn test_end_of_input_is_explicit() {
  let mut s = stream("  \n\t\n");
  assert!(s.at_end().unwrap());
  assert!(s.is_exhausted());
  assert!(!s.peek_prefix("x").unwrap());
  let err = s.pop_token(";").unwrap_err();
  assert!(matches!(err.typ, IdlErrorType::UnexpectedEnd(_)));
}

#[test]
fn test_starts_with_fails_when_input_is_too_short() {
  let mut s = stream("a");
  assert!(s.starts_with("a").unwrap());
  // The buffer holds "a\n"; a longer prefix cannot be satisfied.
  let err = s.starts_with("abcdef").unwrap_err();
  assert_eq!(err.code(), "PI0002");
}

#[test]
fn test_peek_tokens_spans_lines() {
  let mut s = stream("A\n  implements\nB;");
  assert_eq!(s.peek_tokens(4).unwrap(), ["A", "implements", "B", ";"]);
  // Nothing consumed.
  assert_eq!(s.pop_identifier("name").unwrap(), "A");
  assert_eq!(s.peek_tokens(10).unwrap(), ["implements", "B", ";"]);
}

#[test]
fn test_poll_until_pattern_respects_abort() {
  let open = Pattern::new(&["("]);
  let end = Pattern::new(&[";"]);
  let mut s = stream("long\nfoo(long x);");
  let m = s.poll_until_pattern(&open, Some(&end)).unwrap().unwrap();
  assert_eq!(m.before, "long\nfoo");
  assert_eq!(m.matched, "(");
  assert_eq!(s.buffer().len(), "long\nfoo(long x);\n".len());

  let mut s = stream("attribute long x; void f();");
  assert_eq!(s.poll_until_pattern(&open, Some(&end)).unwrap(), None);
}

#[test]
fn test_require_until_pattern_consumes() {
  let close = Pattern::new(&["*/"]);
  let mut s = stream(" a comment\n over lines */ rest");
  let m = s.require_until_pattern(&close).unwrap();
  assert_eq!(m.before, " a comment\n over lines ");
  assert_eq!(s.line(), 2);
  assert!(s.consume_keyword("rest").unwrap());

  let mut s = stream("never closed");
  assert_eq!(s.require_until_pattern(&close).unwrap_err().code(), "PI0002");
}

#[test]
fn test_keywords_match_whole_words() {
  let mut s = stream("interfaceFoo");
  assert!(!s.consume_keyword("interface").unwrap());
  assert_eq!(
    s.pop_keyword("interface").unwrap_err().typ,
    IdlErrorType::ExpectedToken("interface".into())
  );
}

#[test]
fn test_literals() {
  let end = Pattern::new(&[",", ")"]);
  let mut s = stream("\"a, b\" , 1.5)");
  assert_eq!(s.pop_literal(&end).unwrap(), "\"a, b\"");
  s.pop_token(",").unwrap();
  assert_eq!(s.pop_literal(&end).unwrap(), "1.5");
  s.pop_token(")").unwrap();

  let mut s = stream("\"PxForceMode::eFORCE\"");
  assert_eq!(s.pop_string_literal().unwrap(), "PxForceMode::eFORCE");
}

#[test]
fn test_parse_simple_types() {
  check_type("long", "long");
  check_type("unsigned long long x", "unsigned long long");
  check_type("unsigned short", "unsigned short");
  check_type("unrestricted double", "unrestricted double");
  check_type("long long", "long long");
  check_type("Foo[]", "Foo[]");
  check_type("Foo?", "Foo?");
  check_type("DOMString[]?", "DOMString[]?");
  check_type("sequence<long>", "sequence<long>");
  check_type("record<DOMString, sequence<Foo?>>", "record<DOMString, sequence<Foo?>>");
}

#[test]
fn test_long_long_only_after_long() {
  // `short long` is not a type; the second word is left for the caller.
  let mut s = stream("short long");
  assert_eq!(s.parse_type().unwrap(), Type::named("short"));
  assert_eq!(s.pop_identifier("name").unwrap(), "long");
}

#[test]
fn test_parse_union_types() {
  check_type("(Foo or long)", "(Foo or long)");
  check_type("(Foo or Bar[] or DOMString)?", "(Foo or Bar[] or DOMString)?");
  let t = stream("(A or B)").parse_type().unwrap();
  assert!(matches!(t, Type::Union(ref u) if u.members.len() == 2));
}

#[test]
fn test_invalid_types() {
  let err = stream("1Foo x").parse_type().unwrap_err();
  assert_eq!(err.typ, IdlErrorType::InvalidType("1Foo".into()));
  let err = stream("; x").parse_type().unwrap_err();
  assert_eq!(err.code(), "PI0004");
}

#[test]
fn test_errors_carry_context() {
  let mut s = stream("one\ntwo\nthree");
  s.pop_identifier("a").unwrap();
  s.pop_identifier("b").unwrap();
  let err = s.pop_token("{").unwrap_err();
  let pos = err.pos.clone().unwrap();
  assert_eq!(pos.source, "test");
  assert_eq!(pos.line, 3);
  assert_eq!(err.context, ["one", "two", "three"]);
  let rendered = err.to_string();
  assert!(rendered.starts_with("error[PI0001]: expected `{`"));
  assert!(rendered.contains("--> test:3"));
}

#[test]
fn test_io_errors_surface() {
  let lines = vec![
    Ok("interface".to_string()),
    Err(io::Error::new(io::ErrorKind::Other, "disk on fire")),
  ];
  let mut s = TokenStream::new("broken", Box::new(lines.into_iter()));
  s.pop_keyword("interface").unwrap();
  let err = s.pop_identifier("name").unwrap_err();
  assert_eq!(err.code(), "PI0011");
}
