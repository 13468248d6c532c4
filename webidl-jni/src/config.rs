use serde::Serialize;

/// Prefix of raw native method names when none is configured.
pub const DEFAULT_SYMBOL_PREFIX: &str = "_";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct JniConfig {
  /// Prepended to every raw native method name, and therefore part of every raw symbol.
  /// Defaults to [`DEFAULT_SYMBOL_PREFIX`].
  pub symbol_prefix: Option<String>,
  /// Prepended to every declaration package when deriving managed class names, e.g.
  /// `de.example.bindings`.
  pub package_prefix: Option<String>,
}

impl JniConfig {
  pub fn new() -> JniConfig {
    JniConfig::default()
  }

  pub fn with_symbol_prefix(mut self, prefix: impl Into<String>) -> JniConfig {
    self.symbol_prefix = Some(prefix.into());
    self
  }

  pub fn with_package_prefix(mut self, prefix: impl Into<String>) -> JniConfig {
    self.package_prefix = Some(prefix.into());
    self
  }

  /// The raw native method name for a managed member name.
  pub fn raw_name(&self, member: &str) -> String {
    let prefix = self.symbol_prefix.as_deref().unwrap_or(DEFAULT_SYMBOL_PREFIX);
    format!("{prefix}{member}")
  }

  /// The managed package of a declaration, `.`-separated. May be empty.
  pub fn managed_package(&self, package: &str) -> String {
    [self.package_prefix.as_deref().unwrap_or(""), package]
      .into_iter()
      .filter(|p| !p.is_empty())
      .collect::<Vec<_>>()
      .join(".")
  }

  /// The fully qualified managed class name of a declaration.
  pub fn managed_class(&self, package: &str, name: &str) -> String {
    let package = self.managed_package(package);
    if package.is_empty() {
      name.to_string()
    } else {
      format!("{package}.{name}")
    }
  }
}
