use super::Element;
use super::Parser;
use crate::decorator::parse_decorators;
use crate::decorator::parse_meta_tags;
use crate::decorator::META_PACKAGE;
use crate::error::IdlResult;
use crate::lex::Pattern;
use once_cell::sync::Lazy;
use tracing::debug;

static BLOCK_COMMENT_END: Lazy<Pattern> = Lazy::new(|| Pattern::new(&["*/"]));

impl<'a, 'm> Parser<'a, 'm> {
  /// Comments carrying meta tags are directives; any other comment becomes the pending comment for
  /// the next declaration.
  fn comment(&mut self, text: &str) {
    let tags = parse_meta_tags(text);
    if tags.is_empty() {
      let text = text.trim();
      if !text.is_empty() {
        self.ctx.set_comment(text.to_string());
      }
      return;
    }
    for (key, value) in tags {
      if key == META_PACKAGE {
        debug!(package = value.as_str(), line = self.stream.line(), "package");
        self.ctx.set_package(value);
      } else {
        debug!(key = key.as_str(), "ignoring meta tag");
      }
    }
  }

  pub(super) fn parse_line_comment(&mut self) -> IdlResult<Option<Element>> {
    self.stream.pop_token("//")?;
    let text = self.stream.pop_line()?;
    self.comment(&text);
    Ok(None)
  }

  pub(super) fn parse_block_comment(&mut self) -> IdlResult<Option<Element>> {
    self.stream.pop_token("/*")?;
    let m = self.stream.require_until_pattern(&BLOCK_COMMENT_END)?;
    self.comment(&m.before);
    Ok(None)
  }

  pub(super) fn parse_decorators(&mut self) -> IdlResult<Option<Element>> {
    let decorators = parse_decorators(&mut self.stream)?;
    self.ctx.add_decorators(decorators);
    Ok(None)
  }
}
