pub mod rules;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rules::{Field, Post, Rule, RULES};

/// Value of a spec field that could not be determined.
pub const UNKNOWN: &str = "N/A";

static EXTRACTOR: LazyLock<SpecExtractor> = LazyLock::new(SpecExtractor::new);

/// Hardware attributes pulled out of a listing title. Every field is either a
/// normalized token or [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRecord {
    pub processor: String,
    pub ram: String,
    pub storage: String,
    pub gpu: String,
    pub screen: String,
}

impl Default for SpecRecord {
    fn default() -> Self {
        Self {
            processor: UNKNOWN.to_string(),
            ram: UNKNOWN.to_string(),
            storage: UNKNOWN.to_string(),
            gpu: UNKNOWN.to_string(),
            screen: UNKNOWN.to_string(),
        }
    }
}

impl SpecRecord {
    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Processor => &mut self.processor,
            Field::Ram => &mut self.ram,
            Field::Storage => &mut self.storage,
            Field::Gpu => &mut self.gpu,
            Field::Screen => &mut self.screen,
        }
    }
}

struct CompiledRule {
    field: Field,
    post: Post,
    regex: Regex,
}

/// Compiled pattern table. Rules whose pattern fails to compile are dropped
/// with a warning, so their field always comes out as [`UNKNOWN`].
pub struct SpecExtractor {
    rules: Vec<CompiledRule>,
}

impl Default for SpecExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecExtractor {
    pub fn new() -> Self {
        Self::with_rules(RULES.iter().copied())
    }

    pub fn with_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut compiled = Vec::new();
        for rule in rules {
            match Regex::new(rule.pattern) {
                Ok(regex) => compiled.push(CompiledRule {
                    field: rule.field,
                    post: rule.post,
                    regex,
                }),
                Err(e) => warn!(
                    field = rule.field.name(),
                    pattern = rule.pattern,
                    "Dropping spec pattern: {}",
                    e
                ),
            }
        }
        Self { rules: compiled }
    }

    pub fn extract(&self, title: &str) -> SpecRecord {
        let mut specs = SpecRecord::default();
        let mut resolved: Vec<Field> = Vec::with_capacity(5);

        for rule in &self.rules {
            if resolved.contains(&rule.field) {
                continue;
            }
            if let Some(value) = rule.post.apply(&rule.regex, title) {
                *specs.slot(rule.field) = value;
                resolved.push(rule.field);
            }
        }

        debug!(title, ?specs, "Extracted specs");
        specs
    }
}

/// Extract specs with the built-in pattern table.
pub fn extract(title: &str) -> SpecRecord {
    EXTRACTOR.extract(title)
}
