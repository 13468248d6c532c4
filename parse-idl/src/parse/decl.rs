use super::Element;
use super::Frame;
use super::Parser;
use crate::error::IdlErrorType;
use crate::error::IdlResult;
use crate::model::dictionary::DictionaryBuilder;
use crate::model::enumeration::EnumBuilder;
use crate::model::enumeration::EnumValue;
use crate::model::interface::InterfaceBuilder;
use crate::model::namespace::NamespaceBuilder;
use crate::model::typedef::TypeDef;
use crate::model::Link;
use crate::model::LinkKind;
use tracing::debug;

impl<'a, 'm> Parser<'a, 'm> {
  /// `: A, B` after a declaration name.
  fn parse_supers(&mut self) -> IdlResult<Vec<String>> {
    let mut supers = Vec::new();
    if self.stream.consume_if(":")? {
      loop {
        supers.push(self.stream.pop_identifier("inherited name")?);
        if !self.stream.consume_if(",")? {
          break;
        }
      }
    }
    Ok(supers)
  }

  /// Parses a `{ ... };` body for an already pushed frame and pops it again.
  fn parse_body(&mut self, frame: Frame) -> IdlResult<Frame> {
    self.stream.pop_token("{")?;
    self.push(frame);
    self.parse_children(Some("}"))?;
    self.stream.pop_token("}")?;
    self.stream.pop_token(";")?;
    self.drop_pending("closing brace");
    Ok(self.pop())
  }

  pub(super) fn parse_interface(&mut self) -> IdlResult<Option<Element>> {
    let mut b = InterfaceBuilder::new("");
    b.origin = Some(self.stream.origin());
    b.decorators = self.ctx.take_decorators();
    b.comment = self.ctx.take_comment();
    b.package = self.ctx.package().to_string();
    b.is_partial = self.stream.consume_keyword("partial")?;
    b.is_callback = self.stream.consume_keyword("callback")?;
    self.stream.pop_keyword("interface")?;
    b.is_mixin = self.stream.consume_keyword("mixin")?;
    b.name = self.stream.pop_identifier("interface name")?;
    b.supers = self.parse_supers()?;
    let Frame::Interface(b) = self.parse_body(Frame::Interface(b))? else {
      return Err(self.stream.error(IdlErrorType::UnexpectedContent));
    };
    debug!(
      interface = b.name.as_str(),
      functions = b.functions.len(),
      attributes = b.attributes.len(),
      "parsed interface"
    );
    Ok(Some(Element::Interface(b)))
  }

  pub(super) fn parse_dictionary(&mut self) -> IdlResult<Option<Element>> {
    let mut b = DictionaryBuilder::new("");
    b.origin = Some(self.stream.origin());
    b.decorators = self.ctx.take_decorators();
    b.comment = self.ctx.take_comment();
    b.package = self.ctx.package().to_string();
    b.is_partial = self.stream.consume_keyword("partial")?;
    self.stream.pop_keyword("dictionary")?;
    b.name = self.stream.pop_identifier("dictionary name")?;
    b.supers = self.parse_supers()?;
    let Frame::Dictionary(b) = self.parse_body(Frame::Dictionary(b))? else {
      return Err(self.stream.error(IdlErrorType::UnexpectedContent));
    };
    debug!(dictionary = b.name.as_str(), members = b.members.len(), "parsed dictionary");
    Ok(Some(Element::Dictionary(b)))
  }

  pub(super) fn parse_namespace(&mut self) -> IdlResult<Option<Element>> {
    let mut b = NamespaceBuilder::new("");
    b.origin = Some(self.stream.origin());
    b.decorators = self.ctx.take_decorators();
    b.comment = self.ctx.take_comment();
    b.package = self.ctx.package().to_string();
    self.stream.pop_keyword("namespace")?;
    b.name = self.stream.pop_identifier("namespace name")?;
    let Frame::Namespace(b) = self.parse_body(Frame::Namespace(b))? else {
      return Err(self.stream.error(IdlErrorType::UnexpectedContent));
    };
    debug!(namespace = b.name.as_str(), constants = b.constants.len(), "parsed namespace");
    Ok(Some(Element::Namespace(b)))
  }

  pub(super) fn parse_enum(&mut self) -> IdlResult<Option<Element>> {
    let mut b = EnumBuilder::new("");
    b.origin = Some(self.stream.origin());
    b.decorators = self.ctx.take_decorators();
    b.comment = self.ctx.take_comment();
    b.package = self.ctx.package().to_string();
    self.stream.pop_keyword("enum")?;
    b.name = self.stream.pop_identifier("enum name")?;
    let Frame::Enum(b) = self.parse_body(Frame::Enum(b))? else {
      return Err(self.stream.error(IdlErrorType::UnexpectedContent));
    };
    debug!(enumeration = b.name.as_str(), values = b.values.len(), "parsed enum");
    Ok(Some(Element::Enum(b)))
  }

  /// `"Value"` followed by `,` unless it is the last value.
  pub(super) fn parse_enum_value(&mut self) -> IdlResult<Option<Element>> {
    let value = self.stream.pop_string_literal()?;
    if !self.stream.consume_if(",")? && !self.stream.peek_prefix("}")? {
      // Comments may sit between the last value and the closing brace.
      if !(self.stream.peek_prefix("//")? || self.stream.peek_prefix("/*")?) {
        return Err(self.stream.error(IdlErrorType::ExpectedToken(",".into())));
      }
    }
    Ok(Some(Element::EnumValue(EnumValue::new(value))))
  }

  pub(super) fn parse_typedef(&mut self) -> IdlResult<Option<Element>> {
    let origin = self.stream.origin();
    let decorators = self.ctx.take_decorators();
    self.ctx.take_comment();
    self.stream.pop_keyword("typedef")?;
    let typ = self.stream.parse_type()?;
    let name = self.stream.pop_identifier("typedef name")?;
    self.stream.pop_token(";")?;
    let typedef = TypeDef {
      name,
      typ,
      package: self.ctx.package().to_string(),
      decorators,
    };
    Ok(Some(Element::TypeDef(typedef, origin)))
  }

  /// `A implements B;` or `A includes B;`. Resolution waits until every source is parsed.
  pub(super) fn parse_link(&mut self, kind: LinkKind) -> IdlResult<Option<Element>> {
    self.drop_pending(kind.keyword());
    let origin = self.stream.origin();
    let interface = self.stream.pop_identifier("interface name")?;
    self.stream.pop_keyword(kind.keyword())?;
    let target = self.stream.pop_identifier("interface name")?;
    self.stream.pop_token(";")?;
    Ok(Some(Element::Link(Link {
      kind,
      interface,
      target,
      origin: Some(origin),
    })))
  }
}
