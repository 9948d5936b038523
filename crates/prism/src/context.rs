//! The explicitly passed runtime context.
//!
//! There is no global registry. A [`PrismContext`] bundles the schema and
//! matching registries, the PolyString normalizer and the configuration, and
//! is handed to every operation that needs them. Cloning it is cheap.

use std::sync::Arc;

use prism_path::QName;
use prism_schema::{ItemDefinition, SchemaRegistry, SchemaSnapshot, SchemaSource};
use tracing::debug;

use crate::config::PrismConfig;
use crate::error::Result;
use crate::matching::{MatchingRule, MatchingRuleRegistry};
use crate::value::{DefaultNormalizer, Normalizer, PolyString};

#[derive(Debug, Clone)]
pub struct PrismContext {
    schema: Arc<SchemaRegistry>,
    matching: Arc<MatchingRuleRegistry>,
    normalizer: Arc<dyn Normalizer>,
    config: Arc<PrismConfig>,
}

impl PrismContext {
    pub fn new(
        schema: Arc<SchemaRegistry>,
        matching: Arc<MatchingRuleRegistry>,
        normalizer: Arc<dyn Normalizer>,
        config: PrismConfig,
    ) -> Self {
        Self {
            schema,
            matching,
            normalizer,
            config: Arc::new(config),
        }
    }

    /// Bootstraps both registries (built-in schemas, then `extensions`) and
    /// seals them.
    pub fn bootstrap(config: PrismConfig, extensions: Vec<SchemaSource>) -> Result<Self> {
        let schema = SchemaRegistry::bootstrap(extensions)?;
        let matching = MatchingRuleRegistry::with_builtins();
        matching.seal();
        let normalizer = DefaultNormalizer::new(config.normalizer);
        debug!(
            namespaces = schema.snapshot().namespaces().len(),
            types = schema.snapshot().type_count(),
            "prism context bootstrapped"
        );
        Ok(Self::new(
            Arc::new(schema),
            Arc::new(matching),
            Arc::new(normalizer),
            config,
        ))
    }

    /// Built-in schemas and default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::bootstrap(PrismConfig::default(), Vec::new())
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn snapshot(&self) -> Arc<SchemaSnapshot> {
        self.schema.snapshot()
    }

    pub fn matching(&self) -> &MatchingRuleRegistry {
        &self.matching
    }

    pub fn normalizer(&self) -> &dyn Normalizer {
        self.normalizer.as_ref()
    }

    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    /// A context identical to this one but with another configuration.
    pub fn with_config(&self, config: PrismConfig) -> Self {
        Self {
            config: Arc::new(config),
            ..self.clone()
        }
    }

    pub fn poly_string(&self, orig: impl Into<String>) -> PolyString {
        PolyString::new(orig, self.normalizer())
    }

    /// The rule for values of `definition`, or the fallback for undeclared
    /// items.
    pub fn rule_for(&self, definition: Option<&ItemDefinition>) -> Result<Arc<dyn MatchingRule>> {
        match definition {
            Some(def) => self
                .matching
                .get_rule(def.matching_rule.as_ref(), &def.type_name),
            None => self.matching.get_rule(None, &QName::local("anyType")),
        }
    }
}
