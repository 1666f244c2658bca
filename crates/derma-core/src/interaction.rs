use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ingredient::IngredientId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InteractionType {
    /// Do not combine: the pair irritates or cancels out.
    Conflict,
    /// Combine freely: the pair works better together.
    Synergy,
    /// Combine with care, e.g. on alternate days.
    Caution,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Conflict => "CONFLICT",
            InteractionType::Synergy => "SYNERGY",
            InteractionType::Caution => "CAUTION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONFLICT" => Some(InteractionType::Conflict),
            "SYNERGY" => Some(InteractionType::Synergy),
            "CAUTION" => Some(InteractionType::Caution),
            _ => None,
        }
    }

    /// Synergies are informational; only conflicts and cautions warn.
    pub fn is_warning(&self) -> bool {
        !matches!(self, InteractionType::Synergy)
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unordered ingredient pair. `(a, b)` and `(b, a)` produce the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(IngredientId, IngredientId);

impl PairKey {
    pub fn new(a: IngredientId, b: IngredientId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn is_self_pair(&self) -> bool {
        self.0 == self.1
    }
}

/// A curated interaction between two ingredients. Stored once per pair in
/// whatever order the curator wrote it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub ingredient_a: IngredientId,
    pub ingredient_b: IngredientId,
    pub kind: InteractionType,
    pub severity: Severity,
    pub advice: String,
    #[serde(default)]
    pub citation: Option<String>,
}

impl InteractionRule {
    pub fn new(
        a: IngredientId,
        b: IngredientId,
        kind: InteractionType,
        severity: Severity,
        advice: &str,
    ) -> Self {
        Self {
            ingredient_a: a,
            ingredient_b: b,
            kind,
            severity,
            advice: advice.to_string(),
            citation: None,
        }
    }

    pub fn with_citation(mut self, citation: &str) -> Self {
        self.citation = Some(citation.to_string());
        self
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(self.ingredient_a, self.ingredient_b)
    }
}
