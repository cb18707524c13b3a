//! # Health Rate Matcher
//!
//! Compiles the ordered rate-policy list into anchored regular expressions
//! once, then answers "which tolerances apply to this entity" without
//! further allocation or locking. The compiled table is immutable after
//! construction, so a shared `Arc<HealthRateMatcher>` can be read from any
//! number of tasks.
//!
//! Precedence is positional: the first policy whose namespace, kind and name
//! patterns all match wins, and the last policy is the catch-all default.

use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::annotation::{parse_health_annotation, RATE_HEALTH_ANNOTATION};
use crate::config::{Rate, Tolerance};

/// A compiled pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Empty, `.*`, or a pattern that failed to compile
    Any,
    Regex(Regex),
    /// Never matches; used for code patterns that failed to compile
    Never,
}

impl Pattern {
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Regex(re) => re.is_match(value),
            Pattern::Never => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Any => "^.*$",
            Pattern::Regex(re) => re.as_str(),
            Pattern::Never => "",
        }
    }
}

/// Wrap a pattern so it must match the whole value.
///
/// `P` becomes `^(?:P)$`. A pattern already carrying one anchor only gets the
/// missing one.
pub fn anchor_pattern(pattern: &str) -> String {
    match (pattern.starts_with('^'), pattern.ends_with('$')) {
        (true, true) => pattern.to_string(),
        (true, false) => format!("{pattern}$"),
        (false, true) => format!("^{pattern}"),
        (false, false) => format!("^(?:{pattern})$"),
    }
}

/// Compile an entity/protocol/direction pattern. Empty means match-any, and
/// an invalid pattern degrades to match-any with a warning.
pub fn compile_pattern(pattern: &str, field: &str) -> Pattern {
    let trimmed = pattern.trim();
    if trimmed.is_empty() || trimmed == ".*" {
        return Pattern::Any;
    }
    match Regex::new(&anchor_pattern(trimmed)) {
        Ok(re) => Pattern::Regex(re),
        Err(e) => {
            warn!(field = field, pattern = pattern, error = %e, "Invalid health pattern, matching everything");
            Pattern::Any
        }
    }
}

/// Compile a response-code pattern. Every `X`/`x` stands for one digit, so
/// `5XX` matches `500` to `599`.
///
/// Unlike the other patterns, an empty or invalid code pattern matches no
/// code at all: nothing is counted as an error under it.
pub fn compile_code_pattern(code: &str) -> Pattern {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Pattern::Never;
    }
    let expanded = trimmed.replace(['X', 'x'], r"\d");
    match Regex::new(&anchor_pattern(&expanded)) {
        Ok(re) => Pattern::Regex(re),
        Err(e) => {
            warn!(code = code, error = %e, "Invalid tolerance code pattern, no errors will be counted for it");
            Pattern::Never
        }
    }
}

/// A tolerance with its three patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledTolerance {
    tolerance: Tolerance,
    code: Pattern,
    protocol: Pattern,
    direction: Pattern,
}

impl CompiledTolerance {
    pub fn compile(tolerance: &Tolerance) -> Self {
        Self {
            code: compile_code_pattern(&tolerance.code),
            protocol: compile_pattern(&tolerance.protocol, "protocol"),
            direction: compile_pattern(&tolerance.direction, "direction"),
            tolerance: tolerance.clone(),
        }
    }

    /// Validate then compile; `None` for a tolerance with bad thresholds.
    pub fn try_compile(tolerance: &Tolerance) -> Option<Self> {
        match tolerance.validate() {
            Ok(()) => Some(Self::compile(tolerance)),
            Err(reason) => {
                warn!(code = %tolerance.code, reason = %reason, "Dropping invalid tolerance");
                None
            }
        }
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }

    pub fn degraded(&self) -> f64 {
        self.tolerance.degraded
    }

    pub fn failure(&self) -> f64 {
        self.tolerance.failure
    }

    pub fn matches_code(&self, code: &str) -> bool {
        self.code.is_match(code)
    }

    pub fn matches_protocol(&self, protocol: &str) -> bool {
        self.protocol.is_match(protocol)
    }

    pub fn matches_direction(&self, direction: &str) -> bool {
        self.direction.is_match(direction)
    }

    pub fn code_pattern(&self) -> &Pattern {
        &self.code
    }
}

/// A rate policy with its entity patterns and tolerances compiled.
#[derive(Debug, Clone)]
pub struct CompiledRate {
    rate: Rate,
    namespace: Pattern,
    kind: Pattern,
    name: Pattern,
    tolerances: Vec<CompiledTolerance>,
}

impl CompiledRate {
    pub fn compile(rate: &Rate) -> Self {
        Self {
            namespace: compile_pattern(&rate.namespace, "namespace"),
            kind: compile_pattern(&rate.kind, "kind"),
            name: compile_pattern(&rate.name, "name"),
            tolerances: rate
                .tolerance
                .iter()
                .filter_map(CompiledTolerance::try_compile)
                .collect(),
            rate: rate.clone(),
        }
    }

    pub fn matches(&self, namespace: &str, name: &str, kind: &str) -> bool {
        self.namespace.is_match(namespace) && self.kind.is_match(kind) && self.name.is_match(name)
    }

    pub fn rate(&self) -> &Rate {
        &self.rate
    }

    pub fn tolerances(&self) -> &[CompiledTolerance] {
        &self.tolerances
    }
}

/// Ordered, compiled rate-policy table.
#[derive(Debug, Clone, Default)]
pub struct HealthRateMatcher {
    rates: Vec<CompiledRate>,
}

impl HealthRateMatcher {
    pub fn new(rates: &[Rate]) -> Self {
        let rates: Vec<CompiledRate> = rates.iter().map(CompiledRate::compile).collect();
        debug!(
            rates = rates.len(),
            tolerances = rates.iter().map(|r| r.tolerances.len()).sum::<usize>(),
            "Compiled health rate policies"
        );
        Self { rates }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rates(&self) -> &[CompiledRate] {
        &self.rates
    }

    /// First policy matching the entity, else the last (default) policy, or
    /// `None` for an empty table.
    pub fn matching_rate(&self, namespace: &str, name: &str, kind: &str) -> Option<&CompiledRate> {
        self.rates
            .iter()
            .find(|rate| rate.matches(namespace, name, kind))
            .or_else(|| self.rates.last())
    }

    /// Tolerances of `rate` whose protocol and direction patterns both match.
    pub fn matching_tolerances<'a>(
        &self,
        rate: &'a CompiledRate,
        protocol: &str,
        direction: &str,
    ) -> Vec<&'a CompiledTolerance> {
        rate.tolerances
            .iter()
            .filter(|t| t.matches_protocol(protocol) && t.matches_direction(direction))
            .collect()
    }

    /// Every tolerance of the matching policy, unfiltered.
    pub fn all_tolerances_for_entity(&self, namespace: &str, name: &str, kind: &str) -> Vec<CompiledTolerance> {
        self.matching_rate(namespace, name, kind)
            .map(|rate| rate.tolerances.clone())
            .unwrap_or_default()
    }

    /// Tolerances from the resource's rate annotation when it yields at least
    /// one valid entry; otherwise those of the matching policy.
    pub fn tolerances_with_annotation_override(
        &self,
        namespace: &str,
        name: &str,
        kind: &str,
        annotations: Option<&HashMap<String, String>>,
    ) -> Vec<CompiledTolerance> {
        let overridden = annotations
            .and_then(|a| a.get(RATE_HEALTH_ANNOTATION))
            .and_then(|value| parse_health_annotation(value))
            .filter(|tolerances| !tolerances.is_empty());

        match overridden {
            Some(tolerances) => {
                debug!(namespace = namespace, name = name, kind = kind, tolerances = tolerances.len(), "Using annotation tolerance override");
                tolerances.iter().map(CompiledTolerance::compile).collect()
            }
            None => self.all_tolerances_for_entity(namespace, name, kind),
        }
    }

    /// Annotation-or-policy tolerances filtered by direction only.
    pub fn tolerances_for_entity(
        &self,
        namespace: &str,
        name: &str,
        kind: &str,
        direction: &str,
        annotations: Option<&HashMap<String, String>>,
    ) -> Vec<CompiledTolerance> {
        self.tolerances_with_annotation_override(namespace, name, kind, annotations)
            .into_iter()
            .filter(|t| t.matches_direction(direction))
            .collect()
    }
}
