//! Command-line tools over JSON documents.
//!
//! Provides the core logic used by the binary entry points:
//! - `prism-diff`: print the delta between two object documents
//! - `prism-apply`: apply a delta document to an object document
//!
//! Both accept `--config <file>` (TOML or JSON, see [`PrismConfig`]) and any
//! number of `--schema <file>` extension schema documents.

use std::path::{Path, PathBuf};

use prism_schema::SchemaSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::codec::JsonCodec;
use crate::config::PrismConfig;
use crate::context::PrismContext;
use crate::delta::{diff, DeltaCodec};
use crate::error::PrismError;
use crate::model::Binder;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum CliError {
    Usage(String),
    Io(PathBuf, std::io::Error),
    Schema(PathBuf, serde_json::Error),
    Prism(PrismError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(e)        => write!(f, "{e}"),
            CliError::Io(path, e)     => write!(f, "{}: {e}", path.display()),
            CliError::Schema(path, e) => write!(f, "{}: {e}", path.display()),
            CliError::Prism(e)        => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<PrismError> for CliError {
    fn from(e: PrismError) -> Self { CliError::Prism(e) }
}

// ── Arguments ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    pub files: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub schemas: Vec<PathBuf>,
}

impl CliOptions {
    /// Parses arguments, program name excluded.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, CliError> {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "--schema" => {
                    let value = args
                        .next()
                        .ok_or_else(|| CliError::Usage(format!("{arg} needs a file")))?;
                    if arg == "--config" {
                        options.config = Some(PathBuf::from(value));
                    } else {
                        options.schemas.push(PathBuf::from(value));
                    }
                }
                flag if flag.starts_with("--") => {
                    return Err(CliError::Usage(format!("unknown option {flag}")))
                }
                _ => options.files.push(PathBuf::from(arg)),
            }
        }
        Ok(options)
    }

    /// The two positional files, or a usage error naming them.
    pub fn two_files(&self, usage: &str) -> Result<(&Path, &Path), CliError> {
        match self.files.as_slice() {
            [a, b] => Ok((a.as_path(), b.as_path())),
            _ => Err(CliError::Usage(format!("usage: {usage}"))),
        }
    }
}

/// Logs to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::Io(path.to_path_buf(), e))
}

/// A context with the configured settings and extension schemas.
pub fn load_context(options: &CliOptions) -> Result<PrismContext, CliError> {
    let config = match &options.config {
        Some(path) => PrismConfig::load(path)?,
        None => PrismConfig::default(),
    };
    let mut extensions = Vec::new();
    for path in &options.schemas {
        let source = SchemaSource::from_json(&read_file(path)?)
            .map_err(|e| CliError::Schema(path.clone(), e))?;
        extensions.push(source);
    }
    info!(schemas = extensions.len(), "loading context");
    Ok(PrismContext::bootstrap(config, extensions)?)
}

// ── Commands ──────────────────────────────────────────────────────────────

/// The delta turning the `old` object document into the `new` one, as a
/// delta document.
pub fn diff_documents(ctx: &PrismContext, old: &str, new: &str) -> Result<String, CliError> {
    let json = JsonCodec::from_context(ctx);
    let binder = Binder::new(ctx);
    let old = binder.bind(&json.read_document(old)?)?;
    let new = binder.bind(&json.read_document(new)?)?;
    let delta = diff(ctx, &old, &new)?;
    Ok(json.write_document(&DeltaCodec::new(ctx).encode(&delta)?)?)
}

/// Applies a delta document to an object document. An empty `object`
/// stands for a missing object; a delete yields `null`.
pub fn apply_document(ctx: &PrismContext, object: &str, delta: &str) -> Result<String, CliError> {
    let json = JsonCodec::from_context(ctx);
    let binder = Binder::new(ctx);
    let mut slot = match object.trim() {
        "" | "null" => None,
        text => Some(binder.bind(&json.read_document(text)?)?),
    };
    let delta = DeltaCodec::new(ctx).decode(&json.read_document(delta)?)?;
    delta.apply_to_slot(ctx, &mut slot)?;
    match slot {
        Some(object) => Ok(json.write_document(&binder.unbind(&object)?)?),
        None => Ok("null".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JACK: &str = r#"{"user": {"oid": "u1", "name": "jack", "employeeType": ["pirate"]}}"#;
    const CAPTAIN: &str = r#"{"user": {"oid": "u1", "name": "jack", "description": "Captain", "employeeType": ["PIRATE", "captain"]}}"#;

    fn ctx() -> PrismContext {
        PrismContext::with_defaults().unwrap()
    }

    #[test]
    fn parses_options() {
        let args = ["a.json", "--config", "c.toml", "b.json", "--schema", "s.json"];
        let options = CliOptions::parse(args.iter().map(|s| s.to_string())).unwrap();
        assert_eq!(options.files, [PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(options.config, Some(PathBuf::from("c.toml")));
        assert_eq!(options.schemas, [PathBuf::from("s.json")]);
        assert!(CliOptions::parse(["--config".to_string()]).is_err());
        assert!(CliOptions::parse(["--verbose".to_string()]).is_err());
    }

    #[test]
    fn diff_then_apply() {
        let ctx = ctx();
        let delta = diff_documents(&ctx, JACK, CAPTAIN).unwrap();
        assert!(delta.contains("objectDelta"));
        let applied = apply_document(&ctx, JACK, &delta).unwrap();
        let json = JsonCodec::from_context(&ctx);
        let binder = Binder::new(&ctx);
        let expected = binder.bind(&json.read_document(CAPTAIN).unwrap()).unwrap();
        let actual = binder.bind(&json.read_document(&applied).unwrap()).unwrap();
        assert!(actual.equivalent(&expected, &ctx));
    }

    #[test]
    fn apply_delete_yields_null() {
        let ctx = ctx();
        let delta = r#"{"objectDelta": {"changeType": "delete", "oid": "u1", "objectType": "c:UserType"}}"#;
        assert_eq!(apply_document(&ctx, JACK, delta).unwrap(), "null");
    }

    #[test]
    fn bad_input_is_reported() {
        let ctx = ctx();
        let err = diff_documents(&ctx, JACK, r#"{"user": {"shoeSize": 9}}"#).unwrap_err();
        assert!(matches!(err, CliError::Prism(PrismError::SchemaViolation { .. })));
    }
}
