use error::IdlResult;
use lex::LineSource;
use lex::TokenStream;
use model::Model;
use model::ModelBuilder;
use parse::Parser;
use std::io::BufRead;
use tracing::debug_span;

pub mod char;
pub mod decorator;
pub mod error;
pub mod lex;
pub mod model;
pub mod parse;

pub use parse::ParseOptions;

/// Parses any number of sources into one model. Declarations may reference each other across
/// sources; references are resolved by [`IdlParser::finish`].
#[derive(Debug, Default)]
pub struct IdlParser {
  model: ModelBuilder,
  options: ParseOptions,
}

impl IdlParser {
  pub fn new() -> IdlParser {
    IdlParser::default()
  }

  pub fn with_options(options: ParseOptions) -> IdlParser {
    IdlParser {
      model: ModelBuilder::new(),
      options,
    }
  }

  /// Parses one source read lazily line by line. Pending decorators, comments and the current
  /// package do not carry over to the next source.
  pub fn parse_lines(&mut self, source_name: &str, lines: LineSource<'_>) -> IdlResult<()> {
    let _span = debug_span!("parse_source", source = source_name).entered();
    let stream = TokenStream::new(source_name, lines);
    Parser::new(stream, &mut self.model, self.options).parse_source()
  }

  pub fn parse_str(&mut self, source_name: &str, text: &str) -> IdlResult<()> {
    self.parse_lines(source_name, Box::new(text.lines().map(|l| Ok(l.to_string()))))
  }

  pub fn parse_reader<R: BufRead>(&mut self, source_name: &str, reader: R) -> IdlResult<()> {
    self.parse_lines(source_name, Box::new(reader.lines()))
  }

  pub fn finish(self) -> IdlResult<Model> {
    let _span = debug_span!("build_model").entered();
    self.model.build()
  }
}

pub fn parse(text: &str) -> IdlResult<Model> {
  parse_with_options(text, ParseOptions::default())
}

pub fn parse_with_options(text: &str, options: ParseOptions) -> IdlResult<Model> {
  let mut parser = IdlParser::with_options(options);
  parser.parse_str("<input>", text)?;
  parser.finish()
}
