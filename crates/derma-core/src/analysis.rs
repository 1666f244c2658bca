//! Analysis orchestration: manual pair checks and scan cross-referencing.
//!
//! The analyzer holds no state between calls. Everything a caller wants to
//! remember (detected names, chat history) stays with the caller.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::ingredient::IngredientId;
use crate::interaction::{InteractionRule, InteractionType, Severity};
use crate::matching::IngredientMatcher;
use crate::profile::UserProfile;
use crate::safety::{RiskLevel, Verdict, evaluate, evaluate_id};

pub struct Analyzer<'a, C: Catalog> {
    catalog: &'a C,
    profile: UserProfile,
    match_aliases: bool,
}

/// A catalog id together with its display name, when the catalog has one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngredientRef {
    pub id: IngredientId,
    pub name: Option<String>,
}

impl IngredientRef {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("#{}", self.id))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngredientVerdict {
    pub ingredient: IngredientRef,
    pub verdict: Verdict,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairReport {
    pub profile: UserProfile,
    pub first: IngredientVerdict,
    pub second: IngredientVerdict,
    /// `None` means no known interaction: the pair is compatible.
    pub interaction: Option<InteractionRule>,
}

impl PairReport {
    pub fn is_compatible(&self) -> bool {
        self.interaction
            .as_ref()
            .is_none_or(|rule| !rule.kind.is_warning())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanMatch {
    /// The name as the extractor reported it.
    pub detected: String,
    pub ingredient: IngredientRef,
    pub via_alias: bool,
    pub verdict: Verdict,
    /// Rule against the routine ingredient, synergies included.
    pub interaction: Option<InteractionRule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersonalRisk {
    pub ingredient: IngredientRef,
    pub risk: RiskLevel,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractionRisk {
    pub ingredient: IngredientRef,
    pub routine: IngredientRef,
    pub kind: InteractionType,
    pub severity: Severity,
    pub advice: String,
    pub citation: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanSummary {
    Safe,
    Unsafe,
    #[serde(rename = "NO_MATCH")]
    NoMatches,
}

impl ScanSummary {
    /// Label written to the scan-history log.
    pub fn label(&self) -> &'static str {
        match self {
            ScanSummary::Safe => "SAFE",
            ScanSummary::Unsafe => "UNSAFE",
            ScanSummary::NoMatches => "NO_MATCH",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanReport {
    pub profile: UserProfile,
    pub routine: Option<IngredientRef>,
    pub matches: Vec<ScanMatch>,
    /// Non-blank detected names with no catalog entry.
    pub unmatched: Vec<String>,
    pub personal_risks: Vec<PersonalRisk>,
    pub interaction_risks: Vec<InteractionRisk>,
    pub summary: ScanSummary,
}

impl ScanReport {
    pub fn is_safe(&self) -> bool {
        self.summary != ScanSummary::Unsafe
    }

    pub fn matched_names(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.ingredient.display_name()).collect()
    }
}

impl<'a, C: Catalog> Analyzer<'a, C> {
    pub fn new(catalog: &'a C, profile: UserProfile) -> Self {
        Self {
            catalog,
            profile,
            match_aliases: false,
        }
    }

    /// Also resolve detected names through ingredient aliases.
    pub fn match_aliases(mut self, enabled: bool) -> Self {
        self.match_aliases = enabled;
        self
    }

    pub fn evaluate(&self, id: IngredientId) -> Verdict {
        evaluate_id(self.catalog, id, &self.profile)
    }

    /// Symmetric: `lookup(a, b) == lookup(b, a)`.
    pub fn lookup(&self, a: IngredientId, b: IngredientId) -> Option<&'a InteractionRule> {
        self.catalog.find_interaction(a, b)
    }

    fn reference(&self, id: IngredientId) -> IngredientRef {
        IngredientRef {
            id,
            name: self.catalog.find_by_id(id).map(|i| i.inci_name.clone()),
        }
    }

    pub fn check_pair(&self, a: IngredientId, b: IngredientId) -> PairReport {
        let interaction = self.lookup(a, b).cloned();
        PairReport {
            profile: self.profile,
            first: IngredientVerdict {
                ingredient: self.reference(a),
                verdict: self.evaluate(a),
            },
            second: IngredientVerdict {
                ingredient: self.reference(b),
                verdict: self.evaluate(b),
            },
            interaction,
        }
    }

    /// Cross-reference extracted names against the catalog and, optionally,
    /// against one routine ingredient the user already applies.
    pub fn cross_reference(&self, detected: &[String], routine: Option<IngredientId>) -> ScanReport {
        let ingredients = self.catalog.list_all();
        let matcher = if self.match_aliases {
            IngredientMatcher::with_aliases(ingredients)
        } else {
            IngredientMatcher::new(ingredients)
        };
        let routine_ref = routine.map(|id| self.reference(id));

        let mut matches = Vec::new();
        let mut unmatched = Vec::new();
        let mut personal_risks = Vec::new();
        let mut interaction_risks = Vec::new();

        for name in detected {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let Some(hit) = matcher.match_name(name) else {
                unmatched.push(name.to_string());
                continue;
            };

            let ingredient = hit.ingredient;
            let reference = IngredientRef {
                id: ingredient.id,
                name: Some(ingredient.inci_name.clone()),
            };
            let assessment = evaluate(ingredient, &self.profile);
            if assessment.risk.is_risky() {
                personal_risks.push(PersonalRisk {
                    ingredient: reference.clone(),
                    risk: assessment.risk,
                    explanation: assessment.explanation.clone(),
                });
            }

            let interaction = match (&routine_ref, routine) {
                (Some(routine_ref), Some(routine_id)) if routine_id != ingredient.id => {
                    let rule = self.lookup(ingredient.id, routine_id).cloned();
                    if let Some(rule) = rule.as_ref().filter(|r| r.kind.is_warning()) {
                        interaction_risks.push(InteractionRisk {
                            ingredient: reference.clone(),
                            routine: routine_ref.clone(),
                            kind: rule.kind,
                            severity: rule.severity,
                            advice: rule.advice.clone(),
                            citation: rule.citation.clone(),
                        });
                    }
                    rule
                }
                _ => None,
            };

            matches.push(ScanMatch {
                detected: name.to_string(),
                ingredient: reference,
                via_alias: hit.via_alias,
                verdict: Verdict::Assessed(assessment),
                interaction,
            });
        }

        let summary = if !personal_risks.is_empty() || !interaction_risks.is_empty() {
            ScanSummary::Unsafe
        } else if matches.is_empty() {
            ScanSummary::NoMatches
        } else {
            ScanSummary::Safe
        };

        ScanReport {
            profile: self.profile,
            routine: routine_ref,
            matches,
            unmatched,
            personal_risks,
            interaction_risks,
            summary,
        }
    }
}
