use clap::Parser;
use parse_idl::error::IdlError;
use parse_idl::model::Model;
use parse_idl::IdlParser;
use parse_idl::ParseOptions;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::stdin;
use std::io::BufReader;
use std::io::stdout;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing::warn;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use walkdir::WalkDir;
use webidl_jni::JniConfig;
use webidl_jni::ModelAbi;

const SCHEMA_VERSION: u32 = 1;
const STDIN_NAME: &str = "<stdin>";

#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "Parse WebIDL-dialect files and print the model or its JNI ABI as JSON"
)]
struct Cli {
  /// IDL files, or directories searched recursively for `.idl` files. Omit to read stdin.
  inputs: Vec<PathBuf>,

  /// Print the JNI ABI of the model instead of the model itself.
  #[arg(long)]
  abi: bool,

  /// Print the model as IDL text instead of JSON.
  #[arg(long, conflicts_with = "abi")]
  idl: bool,

  /// Package prefix of managed classes, e.g. `de.example.bindings`.
  #[arg(long)]
  prefix: Option<String>,

  /// Prefix of raw native method names (default `_`).
  #[arg(long)]
  symbol_prefix: Option<String>,

  /// Drop declarations and members not available on this platform.
  #[arg(long)]
  platform: Option<String>,

  /// Keep functions with optional parameters as declared instead of expanding them into
  /// overloads.
  #[arg(long)]
  no_explode: bool,

  /// Report sources that fail to parse and continue with the rest. Exits with status 2 when any
  /// source was skipped.
  #[arg(long)]
  keep_going: bool,

  /// Print JSON on a single line.
  #[arg(long)]
  compact: bool,

  /// Emit JSON trace events to stderr.
  #[arg(long)]
  trace: bool,
}

#[derive(Serialize)]
struct Output<'a, T: Serialize> {
  schema_version: u32,
  sources: &'a [String],
  skipped: &'a [String],
  #[serde(flatten)]
  body: T,
}

#[derive(Serialize)]
struct ModelBody<'a> {
  model: &'a Model,
}

#[derive(Serialize)]
struct AbiBody<'a> {
  abi: &'a ModelAbi,
}

struct Source {
  name: String,
  input: Input,
}

enum Input {
  /// Opened and read line by line on every pass.
  File(PathBuf),
  /// Stdin can only be read once, so it is buffered.
  Text(String),
}

enum Failure {
  Open(String),
  Parse(IdlError),
}

impl fmt::Display for Failure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Failure::Open(msg) => f.write_str(msg),
      Failure::Parse(err) => write!(f, "{err}"),
    }
  }
}

impl Source {
  fn parse_into(&self, parser: &mut IdlParser) -> Result<(), Failure> {
    let parsed = match &self.input {
      Input::File(path) => {
        let file = File::open(path)
          .map_err(|err| Failure::Open(format!("failed to read {}: {err}", path.display())))?;
        parser.parse_reader(&self.name, BufReader::new(file))
      }
      Input::Text(text) => parser.parse_str(&self.name, text),
    };
    parsed.map_err(Failure::Parse)
  }
}

fn main() -> ExitCode {
  let args = Cli::parse();
  init_tracing(args.trace);

  let sources = match read_sources(&args.inputs) {
    Ok(sources) => sources,
    Err(err) => {
      eprintln!("{err}");
      return ExitCode::FAILURE;
    }
  };

  let options = ParseOptions {
    explode_optional_functions: !args.no_explode,
  };
  let mut parser = IdlParser::with_options(options);
  let mut parsed = Vec::new();
  let mut skipped = Vec::new();
  for source in &sources {
    // A failing source may already have added declarations, so with --keep-going every source
    // is checked on its own before it joins the shared model.
    if args.keep_going {
      match source.parse_into(&mut IdlParser::with_options(options)) {
        Ok(()) => {}
        Err(Failure::Parse(err)) => {
          warn!(source = source.name.as_str(), code = err.code(), "skipping source");
          eprintln!("{err}");
          skipped.push(source.name.clone());
          continue;
        }
        Err(err) => {
          eprintln!("{err}");
          return ExitCode::FAILURE;
        }
      }
    }
    if let Err(err) = source.parse_into(&mut parser) {
      eprintln!("{err}");
      return ExitCode::FAILURE;
    }
    parsed.push(source.name.clone());
  }
  let mut model = match parser.finish() {
    Ok(model) => model,
    Err(err) => {
      eprintln!("{err}");
      return ExitCode::FAILURE;
    }
  };
  if let Some(platform) = &args.platform {
    model = model.for_platform(platform);
  }
  debug!(
    sources = parsed.len(),
    interfaces = model.interfaces().len(),
    "built model"
  );

  let mut out = stdout().lock();
  let written = if args.idl {
    write!(out, "{model}").map_err(|e| e.to_string())
  } else if args.abi {
    let config = JniConfig {
      symbol_prefix: args.symbol_prefix.clone(),
      package_prefix: args.prefix.clone(),
    };
    let abi = match ModelAbi::new(&model, &config) {
      Ok(abi) => abi,
      Err(err) => {
        eprintln!("{err}");
        return ExitCode::FAILURE;
      }
    };
    write_json(&mut out, &parsed, &skipped, AbiBody { abi: &abi }, args.compact)
  } else {
    write_json(&mut out, &parsed, &skipped, ModelBody { model: &model }, args.compact)
  };
  if let Err(err) = written.and_then(|_| writeln!(out).map_err(|e| e.to_string())) {
    eprintln!("failed to write output: {err}");
    return ExitCode::FAILURE;
  }
  if skipped.is_empty() {
    ExitCode::SUCCESS
  } else {
    ExitCode::from(2)
  }
}

fn write_json<W: Write, T: Serialize>(
  out: &mut W,
  sources: &[String],
  skipped: &[String],
  body: T,
  compact: bool,
) -> Result<(), String> {
  let output = Output {
    schema_version: SCHEMA_VERSION,
    sources,
    skipped,
    body,
  };
  let res = if compact {
    serde_json::to_writer(out, &output)
  } else {
    serde_json::to_writer_pretty(out, &output)
  };
  res.map_err(|e| e.to_string())
}

fn read_sources(inputs: &[PathBuf]) -> Result<Vec<Source>, String> {
  if inputs.is_empty() {
    let mut text = String::new();
    stdin()
      .read_to_string(&mut text)
      .map_err(|err| format!("failed to read stdin: {err}"))?;
    return Ok(vec![Source {
      name: STDIN_NAME.to_string(),
      input: Input::Text(text),
    }]);
  }
  let mut sources = Vec::new();
  for input in inputs {
    if input.is_dir() {
      for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.map_err(|err| format!("failed to walk {}: {err}", input.display()))?;
        if entry.file_type().is_file() && is_idl(entry.path()) {
          sources.push(file_source(entry.path()));
        }
      }
    } else {
      sources.push(file_source(input));
    }
  }
  Ok(sources)
}

fn is_idl(path: &Path) -> bool {
  path.extension().is_some_and(|ext| ext == "idl")
}

fn file_source(path: &Path) -> Source {
  Source {
    name: path.display().to_string(),
    input: Input::File(path.to_path_buf()),
  }
}

fn init_tracing(enabled: bool) {
  if !enabled {
    return;
  }
  let _ = tracing_subscriber::fmt()
    .with_span_events(FmtSpan::CLOSE)
    .with_max_level(Level::DEBUG)
    .json()
    .with_ansi(false)
    .with_writer(std::io::stderr)
    .try_init();
}
