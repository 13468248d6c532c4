//! Line-buffered token stream.
//!
//! Input arrives as a lazy, finite sequence of raw lines. The stream appends lines to its buffer
//! only when an operation needs more characters than are currently buffered, so a source is never
//! read further than the parser has looked. End of input is an explicit state: once the line
//! source returns `None`, every read that still needs characters reports that instead of waiting.

use crate::char::is_identifier;
use crate::char::ID_CONTINUE;
use crate::char::WHITESPACE;
use crate::error::IdlError;
use crate::error::IdlErrorType;
use crate::error::IdlResult;
use crate::error::Origin;
use crate::error::SourcePos;
use crate::model::types::SimpleType;
use crate::model::types::Type;
use crate::model::types::UnionType;
use crate::model::types::BASIC_TYPES;
use crate::model::types::PARAMETERIZED_TYPES;
use aho_corasick::AhoCorasick;
use aho_corasick::MatchKind;
use memchr::memchr;
use memchr::memchr_iter;
use std::collections::VecDeque;
use std::io;
use std::io::BufRead;

#[cfg(test)]
mod tests;

/// How many raw lines are kept for diagnostics.
pub const CONTEXT_LINES: usize = 5;

/// A lazy, non-restartable sequence of raw input lines (without line terminators).
pub type LineSource<'a> = Box<dyn Iterator<Item = io::Result<String>> + 'a>;

/// A set of literal alternatives searched for inside the buffer.
pub struct Pattern {
  literals: Vec<&'static str>,
  matcher: AhoCorasick,
}

impl Pattern {
  pub fn new(literals: &[&'static str]) -> Pattern {
    let matcher = AhoCorasick::builder()
      .match_kind(MatchKind::LeftmostLongest)
      .build(literals)
      .unwrap();
    Pattern {
      literals: literals.to_vec(),
      matcher,
    }
  }

  /// Byte range of the leftmost match in `haystack`.
  pub fn find(&self, haystack: &str) -> Option<(usize, usize)> {
    self.matcher.find(haystack).map(|m| (m.start(), m.end()))
  }

  pub fn describe(&self) -> String {
    self
      .literals
      .iter()
      .map(|l| format!("`{}`", l.escape_debug()))
      .collect::<Vec<_>>()
      .join(" or ")
  }
}

/// Text found by [`TokenStream::poll_until_pattern`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternMatch {
  pub before: String,
  pub matched: String,
}

pub struct TokenStream<'a> {
  source_name: String,
  lines: LineSource<'a>,
  buf: String,
  // 1-based line of the first buffered character.
  line: usize,
  recent: VecDeque<String>,
  exhausted: bool,
}

impl<'a> TokenStream<'a> {
  pub fn new(source_name: impl Into<String>, lines: LineSource<'a>) -> TokenStream<'a> {
    TokenStream {
      source_name: source_name.into(),
      lines,
      buf: String::new(),
      line: 1,
      recent: VecDeque::with_capacity(CONTEXT_LINES),
      exhausted: false,
    }
  }

  pub fn from_text(source_name: impl Into<String>, text: &'a str) -> TokenStream<'a> {
    TokenStream::new(source_name, Box::new(text.lines().map(|l| Ok(l.to_string()))))
  }

  pub fn from_reader<R: BufRead + 'a>(
    source_name: impl Into<String>,
    reader: R,
  ) -> TokenStream<'a> {
    TokenStream::new(source_name, Box::new(reader.lines()))
  }

  pub fn source_name(&self) -> &str {
    &self.source_name
  }

  /// 1-based line number of the next unconsumed character.
  pub fn line(&self) -> usize {
    self.line
  }

  /// Currently buffered, unconsumed text.
  pub fn buffer(&self) -> &str {
    &self.buf
  }

  /// The current position and the last few raw lines read.
  pub fn origin(&self) -> Origin {
    Origin {
      pos: self.pos(),
      context: self.recent.iter().cloned().collect(),
    }
  }

  fn pos(&self) -> SourcePos {
    SourcePos {
      source: self.source_name.clone(),
      line: self.line,
    }
  }

  pub fn is_exhausted(&self) -> bool {
    self.exhausted
  }

  pub fn error(&self, typ: IdlErrorType) -> IdlError {
    IdlError {
      typ,
      pos: Some(self.pos()),
      buffer: self.buf.clone(),
      context: self.recent.iter().cloned().collect(),
    }
  }

  /// Appends the next raw line to the buffer. Returns false once the source is exhausted.
  fn pull(&mut self) -> IdlResult<bool> {
    if self.exhausted {
      return Ok(false);
    }
    match self.lines.next() {
      Some(Ok(line)) => {
        if self.recent.len() == CONTEXT_LINES {
          self.recent.pop_front();
        }
        self.recent.push_back(line.clone());
        self.buf.push_str(&line);
        self.buf.push('\n');
        Ok(true)
      }
      Some(Err(err)) => Err(self.error(IdlErrorType::Io(err.to_string()))),
      None => {
        self.exhausted = true;
        Ok(false)
      }
    }
  }

  /// Drops `n` bytes from the front of the buffer.
  fn consume(&mut self, n: usize) {
    self.line += memchr_iter(b'\n', &self.buf.as_bytes()[..n]).count();
    self.buf.drain(..n);
  }

  /// Trims leading whitespace, pulling lines until non-whitespace is buffered. Returns false if the
  /// input ended first.
  pub fn skip_whitespace(&mut self) -> IdlResult<bool> {
    loop {
      let n = WHITESPACE.prefix_len(&self.buf);
      self.consume(n);
      if !self.buf.is_empty() {
        return Ok(true);
      }
      if !self.pull()? {
        return Ok(false);
      }
    }
  }

  /// Whether only whitespace remains in the whole input.
  pub fn at_end(&mut self) -> IdlResult<bool> {
    Ok(!self.skip_whitespace()?)
  }

  /// Ensures at least `prefix.len()` bytes are buffered and reports whether the buffer begins with
  /// `prefix`. Fails if the input ends before enough bytes arrive.
  pub fn starts_with(&mut self, prefix: &str) -> IdlResult<bool> {
    while self.buf.len() < prefix.len() {
      if !self.pull()? {
        return Err(self.error(IdlErrorType::UnexpectedEnd(format!("`{}`", prefix))));
      }
    }
    Ok(self.buf.starts_with(prefix))
  }

  /// Like [`Self::starts_with`] after skipping whitespace, but reports a mismatch instead of
  /// failing at end of input. Used by look-ahead predicates.
  pub fn peek_prefix(&mut self, prefix: &str) -> IdlResult<bool> {
    if !self.skip_whitespace()? {
      return Ok(false);
    }
    while self.buf.len() < prefix.len() {
      if !self.pull()? {
        return Ok(false);
      }
    }
    Ok(self.buf.starts_with(prefix))
  }

  /// Pulls input until `search` matches in the buffer, without consuming anything. Returns `None`
  /// if `abort` matches before `search` does, or if the input ends first.
  pub fn poll_until_pattern(
    &mut self,
    search: &Pattern,
    abort: Option<&Pattern>,
  ) -> IdlResult<Option<PatternMatch>> {
    loop {
      let found = search.find(&self.buf);
      let aborted = abort.and_then(|a| a.find(&self.buf));
      match (found, aborted) {
        (Some((start, _)), Some((abort_start, _))) if abort_start < start => return Ok(None),
        (Some((start, end)), _) => {
          return Ok(Some(PatternMatch {
            before: self.buf[..start].to_string(),
            matched: self.buf[start..end].to_string(),
          }));
        }
        (None, Some(_)) => return Ok(None),
        (None, None) => {
          if !self.pull()? {
            return Ok(None);
          }
        }
      }
    }
  }

  /// Like [`Self::poll_until_pattern`], but also consumes the returned text and its delimiter.
  pub fn pop_until_pattern(
    &mut self,
    search: &Pattern,
    abort: Option<&Pattern>,
  ) -> IdlResult<Option<PatternMatch>> {
    let found = self.poll_until_pattern(search, abort)?;
    if let Some(m) = &found {
      self.consume(m.before.len() + m.matched.len());
    }
    Ok(found)
  }

  /// Like [`Self::pop_until_pattern`], but a missing match is an error.
  pub fn require_until_pattern(&mut self, search: &Pattern) -> IdlResult<PatternMatch> {
    match self.pop_until_pattern(search, None)? {
      Some(m) => Ok(m),
      None => Err(self.error(IdlErrorType::UnexpectedEnd(search.describe()))),
    }
  }

  /// Consumes exactly `token` after leading whitespace.
  pub fn pop_token(&mut self, token: &str) -> IdlResult<()> {
    if !self.skip_whitespace()? {
      return Err(self.error(IdlErrorType::UnexpectedEnd(format!("`{}`", token))));
    }
    if !self.starts_with(token)? {
      return Err(self.error(IdlErrorType::ExpectedToken(token.to_string())));
    }
    self.consume(token.len());
    Ok(())
  }

  /// Consumes `token` if it is next, after leading whitespace.
  pub fn consume_if(&mut self, token: &str) -> IdlResult<bool> {
    let matched = self.peek_prefix(token)?;
    if matched {
      self.consume(token.len());
    }
    Ok(matched)
  }

  /// Consumes `keyword` if the next word is exactly `keyword`.
  pub fn consume_keyword(&mut self, keyword: &str) -> IdlResult<bool> {
    let matched = self.peek_word()?.is_some_and(|w| w == keyword);
    if matched {
      self.consume(keyword.len());
    }
    Ok(matched)
  }

  /// Consumes `keyword`, which must be the next word.
  pub fn pop_keyword(&mut self, keyword: &str) -> IdlResult<()> {
    if !self.consume_keyword(keyword)? {
      if self.exhausted && self.buf.trim().is_empty() {
        return Err(self.error(IdlErrorType::UnexpectedEnd(format!("`{}`", keyword))));
      }
      return Err(self.error(IdlErrorType::ExpectedToken(keyword.to_string())));
    }
    Ok(())
  }

  /// The next word (a run of identifier characters), not consumed.
  pub fn peek_word(&mut self) -> IdlResult<Option<String>> {
    if !self.skip_whitespace()? {
      return Ok(None);
    }
    let len = ID_CONTINUE.prefix_len(&self.buf);
    Ok((len > 0).then(|| self.buf[..len].to_string()))
  }

  /// Up to `n` upcoming tokens without consuming them, where a token is either a word or a single
  /// non-whitespace character. Stops early at end of input.
  pub fn peek_tokens(&mut self, n: usize) -> IdlResult<Vec<String>> {
    let mut tokens = Vec::with_capacity(n);
    if !self.skip_whitespace()? {
      return Ok(tokens);
    }
    let mut pos = 0;
    while tokens.len() < n {
      pos += WHITESPACE.prefix_len(&self.buf[pos..]);
      if pos == self.buf.len() {
        if !self.pull()? {
          break;
        }
        continue;
      }
      let rest = &self.buf[pos..];
      // Every buffered line ends with `\n`, so a word never straddles the buffer end.
      let len = match ID_CONTINUE.prefix_len(rest) {
        0 => rest.chars().next().map(|c| c.len_utf8()).unwrap_or(0),
        len => len,
      };
      tokens.push(rest[..len].to_string());
      pos += len;
    }
    Ok(tokens)
  }

  /// Consumes an identifier. `what` names the expected thing in the error.
  pub fn pop_identifier(&mut self, what: &str) -> IdlResult<String> {
    if !self.skip_whitespace()? {
      return Err(self.error(IdlErrorType::UnexpectedEnd(what.to_string())));
    }
    let len = ID_CONTINUE.prefix_len(&self.buf);
    if !is_identifier(&self.buf[..len]) {
      return Err(self.error(IdlErrorType::ExpectedToken(what.to_string())));
    }
    let ident = self.buf[..len].to_string();
    self.consume(len);
    Ok(ident)
  }

  /// Consumes a double-quoted string literal and returns its content without quotes.
  pub fn pop_string_literal(&mut self) -> IdlResult<String> {
    self.pop_token("\"")?;
    let end = memchr(b'"', self.buf.as_bytes());
    match end {
      Some(end) => {
        let content = self.buf[..end].to_string();
        self.consume(end + 1);
        Ok(content)
      }
      None => Err(self.error(IdlErrorType::ExpectedToken("\"".into()))),
    }
  }

  /// Consumes the rest of the current line including its terminator.
  pub fn pop_line(&mut self) -> IdlResult<String> {
    if self.buf.is_empty() && !self.pull()? {
      return Ok(String::new());
    }
    // Lines are appended whole, so the buffer always holds a full line here.
    let end = memchr(b'\n', self.buf.as_bytes()).unwrap_or(self.buf.len());
    let line = self.buf[..end].to_string();
    self.consume((end + 1).min(self.buf.len()));
    Ok(line)
  }

  /// Consumes a literal value (e.g. a default value or constant) up to, but not including, the
  /// first of `terminators`. Quoted strings are kept with their quotes and may contain terminators.
  pub fn pop_literal(&mut self, terminators: &Pattern) -> IdlResult<String> {
    if !self.skip_whitespace()? {
      return Err(self.error(IdlErrorType::UnexpectedEnd("literal value".into())));
    }
    if self.buf.starts_with('"') {
      let content = self.pop_string_literal()?;
      return Ok(format!("\"{}\"", content));
    }
    match self.poll_until_pattern(terminators, None)? {
      Some(m) => {
        let len = m.before.len();
        let value = m.before.trim().to_string();
        if value.is_empty() {
          return Err(self.error(IdlErrorType::ExpectedToken("literal value".into())));
        }
        self.consume(len);
        Ok(value)
      }
      None => Err(self.error(IdlErrorType::UnexpectedEnd(terminators.describe()))),
    }
  }

  /// Reads a run of identifier characters, which may be empty.
  fn pop_word(&mut self) -> IdlResult<String> {
    if !self.skip_whitespace()? {
      return Ok(String::new());
    }
    let len = ID_CONTINUE.prefix_len(&self.buf);
    let word = self.buf[..len].to_string();
    self.consume(len);
    Ok(word)
  }

  /// Consumes a type expression: a union `(A or B)`, or a simple type with an optional
  /// `unsigned`/`unrestricted` qualifier, type arguments, `[]` array marker and `?` nullable
  /// marker.
  pub fn parse_type(&mut self) -> IdlResult<Type> {
    if !self.skip_whitespace()? {
      return Err(self.error(IdlErrorType::UnexpectedEnd("type".into())));
    }
    if self.consume_if("(")? {
      let mut members = vec![self.parse_simple_type()?];
      while self.consume_keyword("or")? {
        members.push(self.parse_simple_type()?);
      }
      self.pop_token(")")?;
      let nullable = self.consume_if("?")?;
      return Ok(Type::Union(UnionType::new(members, nullable)));
    }
    Ok(Type::Simple(self.parse_simple_type()?))
  }

  fn parse_simple_type(&mut self) -> IdlResult<SimpleType> {
    let mut name = self.pop_word()?;
    if name.is_empty() {
      let found = self.buf.chars().next().map(String::from).unwrap_or_default();
      return Err(self.error(IdlErrorType::InvalidType(found)));
    }
    if name == "unsigned" || name == "unrestricted" {
      let base = self.pop_word()?;
      name = format!("{} {}", name, base);
    }
    if name == "long" || name == "unsigned long" {
      if self.consume_keyword("long")? {
        name.push_str(" long");
      }
    }

    let mut params = Vec::new();
    if PARAMETERIZED_TYPES.contains(name.as_str()) {
      self.pop_token("<")?;
      loop {
        params.push(self.parse_type()?.to_string());
        if !self.consume_if(",")? {
          break;
        }
      }
      self.pop_token(">")?;
    }

    let is_array = self.consume_if("[]")?;
    let nullable = self.consume_if("?")?;

    if !(BASIC_TYPES.contains(name.as_str())
      || PARAMETERIZED_TYPES.contains(name.as_str())
      || is_identifier(&name))
    {
      return Err(self.error(IdlErrorType::InvalidType(name)));
    }
    Ok(SimpleType::new(name, is_array, params, nullable))
  }
}
