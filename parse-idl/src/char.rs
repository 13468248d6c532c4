use ahash::HashSet;
use ahash::HashSetExt;
use core::ops::RangeInclusive;
use once_cell::sync::Lazy;

/// A set of characters, optionally inverted.
#[derive(Clone)]
pub struct CharFilter {
  chars: HashSet<char>,
  inverted: bool,
}

impl CharFilter {
  pub fn new() -> CharFilter {
    CharFilter {
      chars: HashSet::new(),
      inverted: false,
    }
  }

  pub fn add_char(&mut self, c: char) {
    self.chars.insert(c);
  }

  pub fn add_chars(&mut self, chars: RangeInclusive<char>) {
    for c in chars {
      self.chars.insert(c);
    }
  }

  pub fn invert(&mut self) {
    self.inverted = !self.inverted;
  }

  pub fn has(&self, c: char) -> bool {
    self.chars.contains(&c) != self.inverted
  }

  /// Length in bytes of the longest prefix of `s` whose chars all pass this filter.
  pub fn prefix_len(&self, s: &str) -> usize {
    s.char_indices()
      .find(|(_, c)| !self.has(*c))
      .map(|(i, _)| i)
      .unwrap_or(s.len())
  }
}

impl Default for CharFilter {
  fn default() -> Self {
    CharFilter::new()
  }
}

// Identifiers are C-style; IDL names end up verbatim in native and raw symbol names.
pub static ID_START: Lazy<CharFilter> = Lazy::new(|| {
  let mut filter = CharFilter::new();
  filter.add_chars('a'..='z');
  filter.add_chars('A'..='Z');
  filter.add_char('_');
  filter
});

pub static ID_CONTINUE: Lazy<CharFilter> = Lazy::new(|| {
  let mut filter = ID_START.clone();
  filter.add_chars('0'..='9');
  filter
});

pub static WHITESPACE: Lazy<CharFilter> = Lazy::new(|| {
  let mut filter = CharFilter::new();
  for c in [' ', '\t', '\n', '\r', '\x0b', '\x0c', '\u{00A0}', '\u{FEFF}'] {
    filter.add_char(c);
  }
  filter
});

/// Whether `s` is a C-style identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if ID_START.has(c) => chars.all(|c| ID_CONTINUE.has(c)),
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identifiers_must_not_start_with_digit() {
    assert!(is_identifier("Foo_1"));
    assert!(is_identifier("_foo"));
    assert!(!is_identifier("1Foo"));
    assert!(!is_identifier(""));
    assert!(!is_identifier("a-b"));
  }

  #[test]
  fn prefix_len_stops_at_first_rejected_char() {
    assert_eq!(ID_CONTINUE.prefix_len("abc1 def"), 4);
    assert_eq!(ID_CONTINUE.prefix_len("(x"), 0);
    assert_eq!(WHITESPACE.prefix_len(" \t\nx"), 3);
  }
}
