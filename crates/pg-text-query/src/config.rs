//! Layered completion request configuration.
//!
//! The effective configuration for a request is built from an ordered list of
//! layers, each a partial mapping of request parameters. Later layers win per
//! key; values are never merged recursively.
//!
//! ```
//! use pg_text_query::{CompletionConfig, ConfigLayers};
//!
//! let layers = ConfigLayers::builtin();
//! let overrides = CompletionConfig::new().set("temperature", 0.7);
//! let effective = layers.resolve(&overrides);
//! assert_eq!(effective.get("temperature"), Some(&serde_json::json!(0.7)));
//! ```

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{PgtqError, PgtqResult};

/// Environment variable naming an optional configuration file.
pub const CONFIG_PATH_ENV: &str = "PGTQ_OPENAI_CONFIG";

/// Top-level key whose table holds the completion request parameters.
pub const CONFIG_SECTION: &str = "completion_create";

const BUILTIN_CONFIG: &str = include_str!("default_completion.toml");

/// A mapping of completion request parameters (model, temperature, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionConfig {
    params: Map<String, Value>,
}

impl CompletionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.params.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.params.remove(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.params.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Overlay `other` onto `self`: every key in `other` replaces the one here.
    pub fn merge(&mut self, other: &CompletionConfig) {
        for (k, v) in &other.params {
            self.params.insert(k.clone(), v.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.params
    }
}

impl From<Map<String, Value>> for CompletionConfig {
    fn from(params: Map<String, Value>) -> Self {
        Self { params }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for CompletionConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Reduce layers left to right; the rightmost value for a key wins.
pub fn merge_layers<'a, I>(layers: I) -> CompletionConfig
where
    I: IntoIterator<Item = &'a CompletionConfig>,
{
    layers
        .into_iter()
        .fold(CompletionConfig::new(), |mut acc, layer| {
            acc.merge(layer);
            acc
        })
}

/// Where a configuration layer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Defaults bundled with the crate.
    Builtin,
    /// A user-supplied configuration file.
    File(PathBuf),
    /// Per-call overrides.
    Overrides,
}

/// Ordered configuration layers, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers {
    layers: Vec<(ConfigOrigin, CompletionConfig)>,
}

impl ConfigLayers {
    /// No layers at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Only the bundled defaults.
    pub fn builtin() -> Self {
        Self::empty().push(ConfigOrigin::Builtin, builtin_config())
    }

    /// Bundled defaults plus the file named by `PGTQ_OPENAI_CONFIG`, if set.
    pub fn from_env() -> PgtqResult<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::builtin().with_file(PathBuf::from(path)),
            _ => Ok(Self::builtin()),
        }
    }

    /// Append the `completion_create` table of a configuration file.
    pub fn with_file(self, path: impl Into<PathBuf>) -> PgtqResult<Self> {
        let path = path.into();
        let config = load_config_file(&path)?;
        Ok(self.push(ConfigOrigin::File(path), config))
    }

    /// Append a layer above all existing ones.
    pub fn push(mut self, origin: ConfigOrigin, config: CompletionConfig) -> Self {
        self.layers.push((origin, config));
        self
    }

    pub fn layers(&self) -> &[(ConfigOrigin, CompletionConfig)] {
        &self.layers
    }

    /// Merge all layers, then `overrides` on top.
    pub fn resolve(&self, overrides: &CompletionConfig) -> CompletionConfig {
        merge_layers(
            self.layers
                .iter()
                .map(|(_, c)| c)
                .chain(std::iter::once(overrides)),
        )
    }
}

/// The bundled default request parameters.
pub fn builtin_config() -> CompletionConfig {
    // The bundled document is checked by tests; a broken one yields no defaults.
    parse_config_str(BUILTIN_CONFIG, ConfigFormat::Toml, "builtin config").unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Toml,
        }
    }
}

/// Read the `completion_create` table from a TOML or YAML file.
///
/// `.yaml`/`.yml` files are parsed as YAML, everything else as TOML.
pub fn load_config_file(path: &Path) -> PgtqResult<CompletionConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PgtqError::config(format!(
            "failed to read config file {}: {e}",
            path.display()
        ))
    })?;
    let origin = path.display().to_string();
    parse_config_str(&raw, ConfigFormat::from_path(path), &origin)
}

fn parse_config_str(raw: &str, format: ConfigFormat, origin: &str) -> PgtqResult<CompletionConfig> {
    let doc: Value = match format {
        ConfigFormat::Toml => toml::from_str(raw)
            .map_err(|e| PgtqError::config(format!("failed to parse {origin}: {e}")))?,
        ConfigFormat::Yaml => serde_yaml::from_str(raw)
            .map_err(|e| PgtqError::config(format!("failed to parse {origin}: {e}")))?,
    };

    let Value::Object(mut root) = doc else {
        return Err(PgtqError::config(format!(
            "{origin}: expected a table at the top level"
        )));
    };

    match root.remove(CONFIG_SECTION) {
        Some(Value::Object(params)) => Ok(CompletionConfig::from(params)),
        Some(_) => Err(PgtqError::config(format!(
            "{origin}: `{CONFIG_SECTION}` must be a table"
        ))),
        None => Err(PgtqError::config(format!(
            "{origin}: missing `{CONFIG_SECTION}` section"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn builtin_document_parses() {
        let cfg = parse_config_str(BUILTIN_CONFIG, ConfigFormat::Toml, "builtin").unwrap();
        assert_eq!(cfg.get("model"), Some(&json!("gpt-3.5-turbo-instruct")));
        assert_eq!(cfg.get("max_tokens"), Some(&json!(256)));
        assert_eq!(cfg.get("stop"), Some(&json!(["#", ";"])));
        assert_eq!(builtin_config(), cfg);
    }

    #[test]
    fn merge_is_shallow_last_writer_wins() {
        let a = CompletionConfig::new()
            .set("model", "a")
            .set("logit_bias", json!({"50256": -100, "1": 1}));
        let b = CompletionConfig::new().set("logit_bias", json!({"2": 5}));
        let c = CompletionConfig::new().set("model", "c");

        let merged = merge_layers([&a, &b, &c]);
        assert_eq!(merged.get("model"), Some(&json!("c")));
        assert_eq!(merged.get("logit_bias"), Some(&json!({"2": 5})));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn absent_keys_stay_absent() {
        let merged = merge_layers([&CompletionConfig::new().set("model", "m"), &CompletionConfig::new()]);
        assert!(!merged.contains_key("temperature"));
        assert!(merge_layers(std::iter::empty()).is_empty());
    }

    #[test]
    fn resolve_orders_builtin_file_overrides() {
        let layers = ConfigLayers::empty()
            .push(
                ConfigOrigin::Builtin,
                CompletionConfig::new()
                    .set("model", "base")
                    .set("temperature", 0.5)
                    .set("max_tokens", 64),
            )
            .push(
                ConfigOrigin::File(PathBuf::from("x.toml")),
                CompletionConfig::new().set("temperature", 0.9).set("n", 1),
            );

        let effective = layers.resolve(&CompletionConfig::new().set("temperature", 0));
        assert_eq!(effective.get("model"), Some(&json!("base")));
        assert_eq!(effective.get("temperature"), Some(&json!(0)));
        assert_eq!(effective.get("max_tokens"), Some(&json!(64)));
        assert_eq!(effective.get("n"), Some(&json!(1)));
    }

    #[test]
    fn load_toml_file() {
        let f = write_temp(
            ".toml",
            r#"
[completion_create]
model = "custom-model"
temperature = 0.2
stop = [";"]
"#,
        );
        let cfg = load_config_file(f.path()).unwrap();
        assert_eq!(cfg.get("model"), Some(&json!("custom-model")));
        assert_eq!(cfg.get("temperature"), Some(&json!(0.2)));
        assert_eq!(cfg.get("stop"), Some(&json!([";"])));
    }

    #[test]
    fn load_yaml_file() {
        let f = write_temp(
            ".yaml",
            "completion_create:\n  model: yaml-model\n  max_tokens: 100\nunrelated:\n  key: 1\n",
        );
        let cfg = load_config_file(f.path()).unwrap();
        assert_eq!(cfg.get("model"), Some(&json!("yaml-model")));
        assert_eq!(cfg.get("max_tokens"), Some(&json!(100)));
        assert_eq!(cfg.len(), 2);
    }

    #[test]
    fn with_file_layers_above_builtin() {
        let f = write_temp(".yml", "completion_create:\n  model: from-file\n");
        let layers = ConfigLayers::builtin().with_file(f.path()).unwrap();
        assert_eq!(layers.layers().len(), 2);
        assert_eq!(layers.layers()[1].0, ConfigOrigin::File(f.path().to_path_buf()));

        let effective = layers.resolve(&CompletionConfig::new());
        assert_eq!(effective.get("model"), Some(&json!("from-file")));
        assert_eq!(effective.get("max_tokens"), Some(&json!(256)));
    }

    #[test]
    fn missing_section_is_config_error() {
        let f = write_temp(".toml", "[other]\nmodel = \"x\"\n");
        let err = load_config_file(f.path()).unwrap_err();
        assert!(matches!(err, PgtqError::Config(_)));
        assert!(err.to_string().contains("missing `completion_create`"));
    }

    #[test]
    fn non_table_section_is_config_error() {
        let f = write_temp(".yaml", "completion_create: 3\n");
        let err = load_config_file(f.path()).unwrap_err();
        assert!(err.to_string().contains("must be a table"));
    }

    #[test]
    fn unreadable_file_is_config_error() {
        let err = load_config_file(Path::new("/nonexistent/pgtq/config.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn from_iterator_and_remove() {
        let mut cfg: CompletionConfig = [("model", json!("m")), ("n", json!(2))]
            .into_iter()
            .collect();
        assert_eq!(cfg.remove("n"), Some(json!(2)));
        assert_eq!(cfg.keys().collect::<Vec<_>>(), vec!["model"]);
    }
}
