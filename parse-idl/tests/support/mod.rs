use parse_idl::model::Model;
use serde_json::to_string_pretty;
use similar::ChangeTag;
use similar::TextDiff;

pub fn diff(expected: &str, actual: &str) -> String {
  let mut msg = String::new();
  for change in TextDiff::from_lines(expected, actual).iter_all_changes() {
    let sign = match change.tag() {
      ChangeTag::Delete => "-",
      ChangeTag::Insert => "+",
      ChangeTag::Equal => " ",
    };
    msg.push_str(sign);
    msg.push_str(change.as_str().unwrap());
  }
  msg
}

/// Renders `model` back to IDL, parses that text and asserts both models are equal.
pub fn assert_round_trip(model: &Model) -> String {
  let rendered = model.to_string();
  let reparsed = match parse_idl::parse(&rendered) {
    Ok(m) => m,
    Err(err) => panic!("rendered IDL failed to parse: {}\n{}", err, rendered),
  };
  if &reparsed != model {
    let expected = to_string_pretty(model).unwrap();
    let actual = to_string_pretty(&reparsed).unwrap();
    panic!(
      "round trip changed the model:\n{}\nrendered:\n{}",
      diff(&expected, &actual),
      rendered
    );
  }
  rendered
}
