//! Stack-driven recursive-descent parser.
//!
//! Every grammar construct is a [`Production`]. A production that owns a body (an interface, a
//! function's parameter list, ...) pushes a [`Frame`] holding its builder, then runs
//! [`Parser::parse_children`], which repeatedly asks each child production allowed by the frame
//! whether it matches the upcoming tokens, and runs the first that does. When the body's terminator
//! is reached the frame is popped and its finished element is handed to the frame below.

use crate::char::ID_CONTINUE;
use crate::decorator::Decorators;
use crate::error::IdlError;
use crate::error::IdlErrorType;
use crate::error::IdlResult;
use crate::error::Origin;
use crate::lex::TokenStream;
use crate::model::dictionary::DictionaryBuilder;
use crate::model::dictionary::DictionaryMember;
use crate::model::enumeration::EnumBuilder;
use crate::model::enumeration::EnumValue;
use crate::model::function::Function;
use crate::model::function::FunctionBuilder;
use crate::model::function::Parameter;
use crate::model::interface::Attribute;
use crate::model::interface::InterfaceBuilder;
use crate::model::interface::SetLike;
use crate::model::namespace::Constant;
use crate::model::namespace::NamespaceBuilder;
use crate::model::typedef::TypeDef;
use crate::model::Link;
use crate::model::LinkKind;
use crate::model::ModelBuilder;
use std::mem;
use tracing::trace;
use tracing::warn;

mod comment;
mod decl;
mod member;
#[cfg(test)]
mod tests;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParseOptions {
  /// Expand each function with `k` trailing optional parameters into `k + 1` overloads.
  pub explode_optional_functions: bool,
}

impl Default for ParseOptions {
  fn default() -> Self {
    ParseOptions {
      explode_optional_functions: true,
    }
  }
}

/// State shared by every production while parsing one source: decorators and a comment waiting to
/// attach to the next declaration, and the package set by the most recent meta tag.
#[derive(Debug, Default)]
pub struct ParseCtx {
  pending_decorators: Decorators,
  pending_comment: Option<String>,
  package: String,
}

impl ParseCtx {
  pub fn add_decorators(&mut self, decorators: Decorators) {
    self.pending_decorators.extend(decorators);
  }

  pub fn take_decorators(&mut self) -> Decorators {
    mem::take(&mut self.pending_decorators)
  }

  pub fn set_comment(&mut self, comment: String) {
    self.pending_comment = Some(comment);
  }

  pub fn take_comment(&mut self) -> Option<String> {
    self.pending_comment.take()
  }

  pub fn package(&self) -> &str {
    &self.package
  }

  pub fn set_package(&mut self, package: String) {
    self.package = package;
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Production {
  Root,
  LineComment,
  BlockComment,
  Decorators,
  Interface,
  Dictionary,
  Enum,
  EnumValue,
  Namespace,
  TypeDef,
  Implements,
  Includes,
  Constant,
  SetLike,
  Attribute,
  Constructor,
  Function,
  FunctionParameter,
  Member,
}

impl Production {
  /// Child productions tried, in order, inside this production's body.
  pub fn children(self) -> &'static [Production] {
    use Production::*;
    match self {
      Root => &[
        LineComment,
        BlockComment,
        Decorators,
        Interface,
        Dictionary,
        Enum,
        Namespace,
        TypeDef,
        Implements,
        Includes,
      ],
      Interface => &[
        LineComment,
        BlockComment,
        Decorators,
        Constant,
        SetLike,
        Attribute,
        Constructor,
        Function,
      ],
      Dictionary => &[LineComment, BlockComment, Decorators, Member],
      Namespace => &[LineComment, BlockComment, Decorators, Constant],
      Enum => &[LineComment, BlockComment, EnumValue],
      Constructor | Function => &[LineComment, BlockComment, Decorators, FunctionParameter],
      _ => &[],
    }
  }
}

/// What a finished production contributes to its parent.
#[derive(Debug)]
pub(crate) enum Element {
  Interface(InterfaceBuilder),
  Dictionary(DictionaryBuilder),
  Enum(EnumBuilder),
  EnumValue(EnumValue),
  Namespace(NamespaceBuilder),
  TypeDef(TypeDef, Origin),
  Link(Link),
  Constant(Constant),
  SetLike(SetLike),
  Attribute(Attribute),
  Functions(Vec<Function>),
  Parameter(Parameter),
  Member(DictionaryMember),
}

/// An open production body on the parser stack.
#[derive(Debug)]
pub(crate) enum Frame {
  Root,
  Interface(InterfaceBuilder),
  Dictionary(DictionaryBuilder),
  Namespace(NamespaceBuilder),
  Enum(EnumBuilder),
  Function(FunctionBuilder),
}

impl Frame {
  fn production(&self) -> Production {
    match self {
      Frame::Root => Production::Root,
      Frame::Interface(_) => Production::Interface,
      Frame::Dictionary(_) => Production::Dictionary,
      Frame::Namespace(_) => Production::Namespace,
      Frame::Enum(_) => Production::Enum,
      Frame::Function(b) if b.is_constructor => Production::Constructor,
      Frame::Function(_) => Production::Function,
    }
  }
}

pub struct Parser<'a, 'm> {
  stream: TokenStream<'a>,
  model: &'m mut ModelBuilder,
  ctx: ParseCtx,
  options: ParseOptions,
  stack: Vec<Frame>,
}

impl<'a, 'm> Parser<'a, 'm> {
  pub fn new(stream: TokenStream<'a>, model: &'m mut ModelBuilder, options: ParseOptions) -> Self {
    Parser {
      stream,
      model,
      ctx: ParseCtx::default(),
      options,
      stack: Vec::new(),
    }
  }

  /// Parses the whole source, adding its declarations to the model builder.
  pub fn parse_source(&mut self) -> IdlResult<()> {
    self.stack.push(Frame::Root);
    self.parse_children(None)?;
    self.stack.pop();
    self.drop_pending("end of input");
    Ok(())
  }

  /// Attaches the current stream position to errors raised by builders.
  fn locate(&self, err: IdlError) -> IdlError {
    match err.pos {
      Some(_) => err,
      None => self.stream.error(err.typ),
    }
  }

  /// Discards pending decorators and comment at a point where no declaration can follow.
  fn drop_pending(&mut self, at: &str) {
    let decorators = self.ctx.take_decorators();
    if !decorators.is_empty() {
      warn!(
        source = self.stream.source_name(),
        line = self.stream.line(),
        decorators = %decorators,
        at,
        "dropping decorators that precede no declaration"
      );
    }
    self.ctx.take_comment();
  }

  fn top(&self) -> Production {
    self
      .stack
      .last()
      .map(Frame::production)
      .unwrap_or(Production::Root)
  }

  fn push(&mut self, frame: Frame) {
    trace!(production = ?frame.production(), depth = self.stack.len(), "enter");
    self.stack.push(frame);
  }

  fn pop(&mut self) -> Frame {
    let frame = self.stack.pop().unwrap_or(Frame::Root);
    trace!(production = ?frame.production(), depth = self.stack.len(), "exit");
    frame
  }

  /// Runs child productions of the current frame until `terminator` is next. Without a
  /// terminator, runs until the input ends.
  fn parse_children(&mut self, terminator: Option<&str>) -> IdlResult<()> {
    let parent = self.top();
    loop {
      if self.stream.at_end()? {
        return match terminator {
          Some(t) => Err(self.stream.error(IdlErrorType::UnexpectedEnd(format!("`{}`", t)))),
          None => Ok(()),
        };
      }
      if let Some(t) = terminator {
        if self.stream.starts_with(t)? {
          return Ok(());
        }
      }
      let Some(child) = self.match_child(parent)? else {
        return Err(self.stream.error(IdlErrorType::UnexpectedContent));
      };
      if let Some(element) = self.run(child)? {
        self.attach(element)?;
      }
    }
  }

  fn match_child(&mut self, parent: Production) -> IdlResult<Option<Production>> {
    for &child in parent.children() {
      if self.matches(child)? {
        return Ok(Some(child));
      }
    }
    Ok(None)
  }

  /// Whether `production` can start at the current position. Never consumes input.
  fn matches(&mut self, production: Production) -> IdlResult<bool> {
    use Production::*;
    Ok(match production {
      Root => false,
      LineComment => self.stream.peek_prefix("//")?,
      BlockComment => self.stream.peek_prefix("/*")?,
      Decorators => self.stream.peek_prefix("[")?,
      EnumValue => self.stream.peek_prefix("\"")?,
      Interface => {
        let t = self.stream.peek_tokens(2)?;
        match t.first().map(String::as_str) {
          Some("interface") => true,
          Some("partial" | "callback") => t.get(1).is_some_and(|w| w == "interface"),
          _ => false,
        }
      }
      Dictionary => {
        let t = self.stream.peek_tokens(2)?;
        match t.first().map(String::as_str) {
          Some("dictionary") => true,
          Some("partial") => t.get(1).is_some_and(|w| w == "dictionary"),
          _ => false,
        }
      }
      Enum => self.stream.peek_word()?.is_some_and(|w| w == "enum"),
      Namespace => self.stream.peek_word()?.is_some_and(|w| w == "namespace"),
      TypeDef => self.stream.peek_word()?.is_some_and(|w| w == "typedef"),
      Implements => self.second_token_is("implements")?,
      Includes => self.second_token_is("includes")?,
      Constant => self.stream.peek_word()?.is_some_and(|w| w == "const"),
      SetLike => {
        let t = self.stream.peek_tokens(2)?;
        match t.first().map(String::as_str) {
          Some("setlike") => true,
          Some("readonly") => t.get(1).is_some_and(|w| w == "setlike"),
          _ => false,
        }
      }
      Attribute => {
        let t = self.stream.peek_tokens(5)?;
        t.iter()
          .find(|w| !member::ATTRIBUTE_QUALIFIERS.contains(&w.as_str()))
          .is_some_and(|w| w == "attribute")
      }
      Constructor => {
        let name = match self.stack.last() {
          Some(Frame::Interface(b)) => b.name.clone(),
          _ => return Ok(false),
        };
        let t = self.stream.peek_tokens(2)?;
        t.len() == 2 && (t[0] == name || t[0] == "constructor") && t[1] == "("
      }
      Function => self.function_follows()?,
      FunctionParameter | Member => self.type_follows(&["optional", "required"])?,
    })
  }

  fn second_token_is(&mut self, keyword: &str) -> IdlResult<bool> {
    let t = self.stream.peek_tokens(2)?;
    Ok(t.get(1).is_some_and(|w| w == keyword))
  }

  /// Whether the next token can begin a type, optionally after one of `qualifiers`.
  fn type_follows(&mut self, qualifiers: &[&str]) -> IdlResult<bool> {
    let t = self.stream.peek_tokens(2)?;
    let first = match t.first() {
      Some(first) if qualifiers.contains(&first.as_str()) => t.get(1),
      first => first,
    };
    // Digits are let through so that malformed names fail as invalid types.
    Ok(first.is_some_and(|w| w == "(" || w.starts_with(|c| ID_CONTINUE.has(c))))
  }

  /// A type, then a name, then `(` before the next `;`.
  fn function_follows(&mut self) -> IdlResult<bool> {
    if !self.type_follows(&["static"])? {
      return Ok(false);
    }
    Ok(
      self
        .stream
        .poll_until_pattern(&member::PARAMS_START, Some(&member::DECLARATION_END))?
        .is_some(),
    )
  }

  fn run(&mut self, production: Production) -> IdlResult<Option<Element>> {
    use Production::*;
    trace!(?production, line = self.stream.line(), "matched");
    match production {
      Root => Ok(None),
      LineComment => self.parse_line_comment(),
      BlockComment => self.parse_block_comment(),
      Decorators => self.parse_decorators(),
      Interface => self.parse_interface(),
      Dictionary => self.parse_dictionary(),
      Enum => self.parse_enum(),
      EnumValue => self.parse_enum_value(),
      Namespace => self.parse_namespace(),
      TypeDef => self.parse_typedef(),
      Implements => self.parse_link(LinkKind::Implements),
      Includes => self.parse_link(LinkKind::Includes),
      Constant => self.parse_constant(),
      SetLike => self.parse_setlike(),
      Attribute => self.parse_attribute(),
      Constructor => self.parse_function(true),
      Function => self.parse_function(false),
      FunctionParameter => self.parse_parameter(),
      Member => self.parse_member(),
    }
  }

  /// Hands a finished element to the frame on top of the stack.
  fn attach(&mut self, element: Element) -> IdlResult<()> {
    let top = self.stack.last_mut();
    match (top, element) {
      (Some(Frame::Root), Element::Interface(b)) => self.model.add_interface(b),
      (Some(Frame::Root), Element::Dictionary(b)) => self.model.add_dictionary(b),
      (Some(Frame::Root), Element::Enum(mut b)) => {
        let origin = b.origin.take();
        self.model.add_enum(b.build(), origin);
      }
      (Some(Frame::Root), Element::Namespace(mut b)) => {
        let origin = b.origin.take();
        self.model.add_namespace(b.build(), origin);
      }
      (Some(Frame::Root), Element::TypeDef(t, origin)) => self.model.add_typedef(t, Some(origin)),
      (Some(Frame::Root), Element::Link(l)) => self.model.add_link(l),
      (Some(Frame::Interface(b)), Element::Constant(c)) => b.constants.push(c),
      (Some(Frame::Interface(b)), Element::Attribute(a)) => b.attributes.push(a),
      (Some(Frame::Interface(b)), Element::Functions(f)) => b.functions.extend(f),
      (Some(Frame::Interface(b)), Element::SetLike(s)) => {
        if b.setlike.is_some() {
          let name = b.name.clone();
          return Err(self.stream.error(IdlErrorType::DuplicateDefinition(format!(
            "{}.setlike",
            name
          ))));
        }
        b.setlike = Some(s);
      }
      (Some(Frame::Dictionary(b)), Element::Member(m)) => b.members.push(m),
      (Some(Frame::Namespace(b)), Element::Constant(c)) => b.constants.push(c),
      (Some(Frame::Enum(b)), Element::EnumValue(v)) => b.values.push(v),
      (Some(Frame::Function(b)), Element::Parameter(p)) => b.add_parameter(p),
      // Child tables only admit the pairs above.
      _ => return Err(self.stream.error(IdlErrorType::UnexpectedContent)),
    };
    Ok(())
  }
}
