use super::Element;
use super::Frame;
use super::Parser;
use crate::error::IdlErrorType;
use crate::error::IdlResult;
use crate::lex::Pattern;
use crate::model::dictionary::DictionaryMember;
use crate::model::function::FunctionBuilder;
use crate::model::function::Parameter;
use crate::model::interface::Attribute;
use crate::model::interface::SetLike;
use crate::model::namespace::Constant;
use once_cell::sync::Lazy;

/// Keywords that may precede `attribute`.
pub(super) const ATTRIBUTE_QUALIFIERS: [&str; 4] = ["static", "readonly", "inherit", "stringifier"];

pub(super) static PARAMS_START: Lazy<Pattern> = Lazy::new(|| Pattern::new(&["("]));
pub(super) static DECLARATION_END: Lazy<Pattern> = Lazy::new(|| Pattern::new(&[";"]));
static PARAM_DEFAULT_END: Lazy<Pattern> = Lazy::new(|| Pattern::new(&[",", ")"]));

impl<'a, 'm> Parser<'a, 'm> {
  fn interface_name(&self) -> Option<&str> {
    match self.stack.last() {
      Some(Frame::Interface(b)) => Some(&b.name),
      _ => None,
    }
  }

  /// A function or constructor declaration including its parameter list. Constructors are written
  /// either `Name(...)` or `constructor(...)`.
  pub(super) fn parse_function(&mut self, constructor: bool) -> IdlResult<Option<Element>> {
    let decorators = self.ctx.take_decorators();
    let comment = self.ctx.take_comment();
    let mut b = if constructor {
      let Some(name) = self.interface_name().map(str::to_string) else {
        return Err(self.stream.error(IdlErrorType::UnexpectedContent));
      };
      if !self.stream.consume_keyword("constructor")? {
        self.stream.pop_keyword(&name)?;
      }
      FunctionBuilder::constructor(&name)
    } else {
      let is_static = self.stream.consume_keyword("static")?;
      let return_type = self.stream.parse_type()?;
      let name = self.stream.pop_identifier("function name")?;
      let mut b = FunctionBuilder::new(name, return_type);
      b.is_static = is_static;
      b
    };
    b.decorators = decorators;
    b.comment = comment;

    self.stream.pop_token("(")?;
    self.push(Frame::Function(b));
    self.parse_children(Some(")"))?;
    self.stream.pop_token(")")?;
    self.stream.pop_token(";")?;
    self.drop_pending("end of parameter list");
    let Frame::Function(b) = self.pop() else {
      return Err(self.stream.error(IdlErrorType::UnexpectedContent));
    };
    let functions = b
      .build(self.options.explode_optional_functions)
      .map_err(|e| self.locate(e))?;
    Ok(Some(Element::Functions(functions)))
  }

  /// One parameter and its trailing `,` (required unless the list ends).
  pub(super) fn parse_parameter(&mut self) -> IdlResult<Option<Element>> {
    let decorators = self.ctx.take_decorators();
    self.ctx.take_comment();
    let optional = self.stream.consume_keyword("optional")?;
    let typ = self.stream.parse_type()?;
    let name = self.stream.pop_identifier("parameter name")?;
    let mut p = Parameter::new(name, typ);
    p.optional = optional;
    p.decorators = decorators;
    if self.stream.consume_if("=")? {
      p.default_value = Some(self.stream.pop_literal(&PARAM_DEFAULT_END)?);
    }
    if !self.stream.consume_if(",")? && !self.stream.peek_prefix(")")? {
      return Err(self.stream.error(IdlErrorType::ExpectedToken(",".into())));
    }
    Ok(Some(Element::Parameter(p)))
  }

  pub(super) fn parse_attribute(&mut self) -> IdlResult<Option<Element>> {
    let decorators = self.ctx.take_decorators();
    let comment = self.ctx.take_comment();
    let mut is_static = false;
    let mut is_readonly = false;
    loop {
      if self.stream.consume_keyword("static")? {
        is_static = true;
      } else if self.stream.consume_keyword("readonly")? {
        is_readonly = true;
      } else if !(self.stream.consume_keyword("inherit")?
        || self.stream.consume_keyword("stringifier")?)
      {
        break;
      }
    }
    self.stream.pop_keyword("attribute")?;
    let typ = self.stream.parse_type()?;
    let name = self.stream.pop_identifier("attribute name")?;
    self.stream.pop_token(";")?;
    let mut a = Attribute::new(name, typ);
    a.is_static = is_static;
    a.is_readonly = is_readonly;
    a.decorators = decorators;
    a.comment = comment;
    Ok(Some(Element::Attribute(a)))
  }

  pub(super) fn parse_member(&mut self) -> IdlResult<Option<Element>> {
    let decorators = self.ctx.take_decorators();
    let comment = self.ctx.take_comment();
    let required = self.stream.consume_keyword("required")?;
    let typ = self.stream.parse_type()?;
    let name = self.stream.pop_identifier("member name")?;
    let mut m = DictionaryMember::new(name, typ);
    if self.stream.consume_if("=")? {
      m.default_value = Some(self.stream.pop_literal(&DECLARATION_END)?);
    }
    self.stream.pop_token(";")?;
    m.required = required;
    m.decorators = decorators;
    m.comment = comment;
    Ok(Some(Element::Member(m)))
  }

  pub(super) fn parse_constant(&mut self) -> IdlResult<Option<Element>> {
    let decorators = self.ctx.take_decorators();
    self.ctx.take_comment();
    self.stream.pop_keyword("const")?;
    let typ = self.stream.parse_type()?;
    let name = self.stream.pop_identifier("constant name")?;
    self.stream.pop_token("=")?;
    let value = self.stream.pop_literal(&DECLARATION_END)?;
    self.stream.pop_token(";")?;
    Ok(Some(Element::Constant(Constant {
      name,
      typ,
      value,
      decorators,
      owner: None,
    })))
  }

  pub(super) fn parse_setlike(&mut self) -> IdlResult<Option<Element>> {
    let decorators = self.ctx.take_decorators();
    self.ctx.take_comment();
    let is_readonly = self.stream.consume_keyword("readonly")?;
    self.stream.pop_keyword("setlike")?;
    self.stream.pop_token("<")?;
    let typ = self.stream.parse_type()?;
    self.stream.pop_token(">")?;
    self.stream.pop_token(";")?;
    Ok(Some(Element::SetLike(SetLike {
      typ,
      is_readonly,
      decorators,
    })))
  }
}
