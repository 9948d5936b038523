//! Matching rule lookup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use prism_path::QName;
use prism_schema::constants::{poly_string_type, MATCHING_NS};
use tracing::debug;

use super::rules::{builtin_rules, DefaultRule};
use super::MatchingRule;
use crate::error::{PrismError, Result};

#[derive(Debug, Clone)]
struct RuleTable {
    rules: IndexMap<QName, Arc<dyn MatchingRule>>,
    /// Type name -> default rule name.
    type_defaults: IndexMap<QName, QName>,
    fallback: Arc<dyn MatchingRule>,
}

impl RuleTable {
    fn find(&self, name: &QName) -> Option<&Arc<dyn MatchingRule>> {
        self.rules.get(name).or_else(|| {
            self.rules
                .iter()
                .find(|(k, _)| k.matches(name))
                .map(|(_, r)| r)
        })
    }
}

/// Registry of named rules and per-type defaults.
///
/// Filled at startup, then read-mostly. Reads go through an atomically
/// swapped snapshot; registrations copy the table under a writer lock.
#[derive(Debug)]
pub struct MatchingRuleRegistry {
    table: ArcSwap<RuleTable>,
    writer: Mutex<()>,
    sealed: AtomicBool,
}

impl Default for MatchingRuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl MatchingRuleRegistry {
    /// A registry holding only the exact-match fallback.
    pub fn empty() -> Self {
        Self::from_rules(vec![Arc::new(DefaultRule::default())], IndexMap::new())
    }

    /// All built-in rules, with `polyStringStrict` as the PolyString type
    /// default.
    pub fn with_builtins() -> Self {
        let mut type_defaults = IndexMap::new();
        type_defaults.insert(poly_string_type(), QName::new(MATCHING_NS, "polyStringStrict"));
        Self::from_rules(builtin_rules(), type_defaults)
    }

    fn from_rules(
        rules: Vec<Arc<dyn MatchingRule>>,
        type_defaults: IndexMap<QName, QName>,
    ) -> Self {
        let fallback: Arc<dyn MatchingRule> = Arc::new(DefaultRule::default());
        let mut table = IndexMap::new();
        for rule in rules {
            table.insert(rule.name().clone(), rule);
        }
        Self {
            table: ArcSwap::from_pointee(RuleTable {
                rules: table,
                type_defaults,
                fallback,
            }),
            writer: Mutex::new(()),
            sealed: AtomicBool::new(false),
        }
    }

    fn update(&self, f: impl FnOnce(&mut RuleTable) -> Result<()>) -> Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = (*self.table.load_full()).clone();
        f(&mut next)?;
        self.table.store(Arc::new(next));
        Ok(())
    }

    /// Adds a rule. Names must be unique.
    pub fn register(&self, rule: Arc<dyn MatchingRule>) -> Result<()> {
        let name = rule.name().clone();
        self.update(|table| {
            if table.rules.contains_key(&name) {
                return Err(PrismError::IllegalArgument(format!(
                    "matching rule {name} is already registered"
                )));
            }
            table.rules.insert(name.clone(), rule);
            Ok(())
        })?;
        debug!(rule = %name, sealed = self.is_sealed(), "matching rule registered");
        Ok(())
    }

    /// Declares the rule used for `type_name` when an item names none.
    pub fn set_type_default(&self, type_name: QName, rule_name: QName) -> Result<()> {
        self.update(|table| {
            if table.find(&rule_name).is_none() {
                return Err(PrismError::unresolved(&type_name, &rule_name));
            }
            table.type_defaults.insert(type_name, rule_name);
            Ok(())
        })
    }

    /// Resolves the rule for a value of `type_name`.
    ///
    /// An explicit `name` wins and must exist. Otherwise the type's default
    /// is used, then the exact-match fallback.
    pub fn get_rule(&self, name: Option<&QName>, type_name: &QName) -> Result<Arc<dyn MatchingRule>> {
        let table = self.table.load();
        if let Some(name) = name {
            return table
                .find(name)
                .cloned()
                .ok_or_else(|| PrismError::unresolved(type_name, name));
        }
        Ok(table
            .type_defaults
            .get(type_name)
            .and_then(|rule| table.find(rule))
            .unwrap_or(&table.fallback)
            .clone())
    }

    pub fn find(&self, name: &QName) -> Option<Arc<dyn MatchingRule>> {
        self.table.load().find(name).cloned()
    }

    pub fn rule_names(&self) -> Vec<QName> {
        self.table.load().rules.keys().cloned().collect()
    }

    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}
