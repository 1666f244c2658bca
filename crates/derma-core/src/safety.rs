//! Personal suitability rules.
//!
//! Checks run in a fixed order and accumulate findings. The overall risk is
//! the max-merge of every finding's risk, so a later check can raise the
//! level but never lower it. The pregnancy retinoid gate is the one absolute
//! veto: it short-circuits everything after it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::constants::{BHA_NAMES, COMEDOGENIC_DANGER, COMEDOGENIC_MAX, COMEDOGENIC_MILD, HARSH_SAFETY_RATING};
use crate::ingredient::{FunctionCategory, Ingredient, IngredientId};
use crate::profile::{SkinType, UserProfile};

pub const NO_DATA: &str = "No data for this ingredient.";

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Safe,
    Warning,
    Danger,
}

impl RiskLevel {
    /// Escalate-only combination.
    pub fn merge(self, other: RiskLevel) -> RiskLevel {
        self.max(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Warning => "WARNING",
            RiskLevel::Danger => "DANGER",
        }
    }

    pub fn is_risky(&self) -> bool {
        *self > RiskLevel::Safe
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which check produced a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyRule {
    PregnancyRetinoid,
    PregnancyBha,
    Comedogenic,
    MildlyComedogenic,
    MoistureStripping,
    Irritant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule: SafetyRule,
    pub risk: RiskLevel,
    pub message: String,
}

impl Finding {
    fn new(rule: SafetyRule, risk: RiskLevel, message: String) -> Self {
        Self {
            rule,
            risk,
            message,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub risk: RiskLevel,
    pub explanation: String,
    pub findings: Vec<Finding>,
}

impl Assessment {
    fn from_findings(findings: Vec<Finding>, skin_type: SkinType) -> Self {
        let risk = findings
            .iter()
            .fold(RiskLevel::Safe, |acc, f| acc.merge(f.risk));
        let explanation = if findings.is_empty() {
            format!("Suitable for a {skin_type} skin profile.")
        } else {
            findings
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };
        Self {
            risk,
            explanation,
            findings,
        }
    }

    pub fn fired(&self, rule: SafetyRule) -> bool {
        self.findings.iter().any(|f| f.rule == rule)
    }
}

/// Outcome of evaluating a catalog id. A miss is a normal outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Assessed(Assessment),
    Unknown { explanation: String },
}

impl Verdict {
    pub fn unknown() -> Self {
        Verdict::Unknown {
            explanation: NO_DATA.to_string(),
        }
    }

    pub fn risk(&self) -> Option<RiskLevel> {
        match self {
            Verdict::Assessed(a) => Some(a.risk),
            Verdict::Unknown { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.risk().map_or("UNKNOWN", |r| r.as_str())
    }

    pub fn explanation(&self) -> &str {
        match self {
            Verdict::Assessed(a) => &a.explanation,
            Verdict::Unknown { explanation } => explanation,
        }
    }

    pub fn is_risky(&self) -> bool {
        self.risk().is_some_and(|r| r.is_risky())
    }
}

fn is_bha(ingredient: &Ingredient) -> bool {
    let name = ingredient.inci_name.trim().to_lowercase();
    BHA_NAMES.contains(&name.as_str())
}

/// Judge one ingredient against one profile. Deterministic and total.
pub fn evaluate(ingredient: &Ingredient, profile: &UserProfile) -> Assessment {
    let name = &ingredient.inci_name;
    let category = ingredient.category;
    let skin = profile.skin_type;
    let mut findings = Vec::new();

    if profile.is_pregnant {
        if category == FunctionCategory::Retinoid {
            let veto = Finding::new(
                SafetyRule::PregnancyRetinoid,
                RiskLevel::Danger,
                format!(
                    "Avoid completely: {name} is a retinoid. Retinoids carry a teratogenic \
                     risk (birth defects) during pregnancy and breastfeeding."
                ),
            );
            return Assessment::from_findings(vec![veto], skin);
        }
        if is_bha(ingredient) {
            findings.push(Finding::new(
                SafetyRule::PregnancyBha,
                RiskLevel::Warning,
                "Use with caution: high-strength BHA is not recommended during pregnancy. \
                 Ask your doctor about a safe dosage."
                    .to_string(),
            ));
        }
    }

    if skin.is_breakout_prone() {
        let rating = ingredient.comedogenic_rating;
        if rating >= COMEDOGENIC_DANGER {
            findings.push(Finding::new(
                SafetyRule::Comedogenic,
                RiskLevel::Danger,
                format!(
                    "Pore-clogging: comedogenic rating {rating}/{COMEDOGENIC_MAX}. Very likely \
                     to cause breakouts on {skin} skin."
                ),
            ));
        } else if rating == COMEDOGENIC_MILD {
            findings.push(Finding::new(
                SafetyRule::MildlyComedogenic,
                RiskLevel::Warning,
                format!(
                    "Note: mild pore-clogging risk (comedogenic rating \
                     {COMEDOGENIC_MILD}/{COMEDOGENIC_MAX})."
                ),
            ));
        }
    }

    if skin == SkinType::Dry
        && category.is_stripping()
        && ingredient.safety_rating >= HARSH_SAFETY_RATING
    {
        findings.push(Finding::new(
            SafetyRule::MoistureStripping,
            RiskLevel::Warning,
            format!("Drying: {name} can strip the skin's natural moisture."),
        ));
    }

    if skin == SkinType::Sensitive
        && category.is_irritant()
        && ingredient.safety_rating >= HARSH_SAFETY_RATING
    {
        findings.push(Finding::new(
            SafetyRule::Irritant,
            RiskLevel::Warning,
            format!(
                "Irritation risk: sensitive skin should avoid strong fragrances and \
                 preservatives such as {name}."
            ),
        ));
    }

    Assessment::from_findings(findings, skin)
}

/// Catalog-backed evaluation. Missing ids yield [`Verdict::Unknown`].
pub fn evaluate_id(catalog: &impl Catalog, id: IngredientId, profile: &UserProfile) -> Verdict {
    match catalog.find_by_id(id) {
        Some(ingredient) => Verdict::Assessed(evaluate(ingredient, profile)),
        None => Verdict::unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use proptest::prelude::*;

    fn profile(skin: SkinType, pregnant: bool) -> UserProfile {
        UserProfile::new(skin, pregnant)
    }

    fn retinol() -> Ingredient {
        Ingredient::new(1, "Retinol", FunctionCategory::Retinoid).with_ratings(4, 2)
    }

    #[test]
    fn test_merge_never_downgrades() {
        assert_eq!(RiskLevel::Danger.merge(RiskLevel::Warning), RiskLevel::Danger);
        assert_eq!(RiskLevel::Warning.merge(RiskLevel::Safe), RiskLevel::Warning);
        assert_eq!(RiskLevel::Safe.merge(RiskLevel::Danger), RiskLevel::Danger);
    }

    #[test]
    fn test_pregnancy_retinoid_veto() {
        let a = evaluate(&retinol(), &profile(SkinType::Normal, true));
        assert_eq!(a.risk, RiskLevel::Danger);
        assert!(a.explanation.contains("teratogenic"));
        assert!(a.explanation.contains("pregnancy"));
        assert_eq!(a.findings.len(), 1);
        assert!(a.fired(SafetyRule::PregnancyRetinoid));
    }

    #[test]
    fn test_pregnancy_veto_skips_skin_checks() {
        // Comedogenic 2 on oily skin would add a warning, but the veto returns first.
        let a = evaluate(&retinol(), &profile(SkinType::Oily, true));
        assert_eq!(a.risk, RiskLevel::Danger);
        assert!(!a.fired(SafetyRule::MildlyComedogenic));
    }

    #[test]
    fn test_retinoid_without_pregnancy_is_not_vetoed() {
        let a = evaluate(&retinol(), &profile(SkinType::Normal, false));
        assert_eq!(a.risk, RiskLevel::Safe);
        assert!(a.explanation.contains("Normal"));
    }

    #[test]
    fn test_pregnancy_bha_warning_continues() {
        let bha = Ingredient::new(2, "Salicylic Acid", FunctionCategory::Unknown).with_ratings(3, 0);
        let a = evaluate(&bha, &profile(SkinType::Normal, true));
        assert_eq!(a.risk, RiskLevel::Warning);
        assert!(a.fired(SafetyRule::PregnancyBha));

        let lower = Ingredient::new(3, "bha", FunctionCategory::Unknown);
        assert!(evaluate(&lower, &profile(SkinType::Normal, true)).fired(SafetyRule::PregnancyBha));
    }

    #[test]
    fn test_pregnancy_bha_then_comedogenic_escalates() {
        let bha = Ingredient::new(2, "Salicylic Acid", FunctionCategory::Unknown).with_ratings(3, 3);
        let a = evaluate(&bha, &profile(SkinType::AcneProne, true));
        assert_eq!(a.risk, RiskLevel::Danger);
        assert_eq!(a.findings.len(), 2);
        assert_eq!(a.explanation.lines().count(), 2);
    }

    #[test]
    fn test_oily_comedogenic_oil_is_danger() {
        let coconut = Ingredient::new(4, "Cocos Nucifera Oil", FunctionCategory::Oil).with_ratings(1, 4);
        let a = evaluate(&coconut, &profile(SkinType::Oily, false));
        assert_eq!(a.risk, RiskLevel::Danger);
        assert!(a.explanation.contains("Pore-clogging"));
    }

    #[test]
    fn test_mildly_comedogenic_is_warning() {
        let jojoba = Ingredient::new(5, "Simmondsia Chinensis Seed Oil", FunctionCategory::Oil)
            .with_ratings(1, 2);
        let a = evaluate(&jojoba, &profile(SkinType::AcneProne, false));
        assert_eq!(a.risk, RiskLevel::Warning);
        assert!(a.fired(SafetyRule::MildlyComedogenic));
    }

    #[test]
    fn test_comedogenic_ignored_for_dry_skin() {
        let coconut = Ingredient::new(4, "Cocos Nucifera Oil", FunctionCategory::Oil).with_ratings(1, 4);
        assert_eq!(evaluate(&coconut, &profile(SkinType::Dry, false)).risk, RiskLevel::Safe);
    }

    #[test]
    fn test_dry_skin_harsh_surfactant() {
        let sls = Ingredient::new(6, "Sodium Lauryl Sulfate", FunctionCategory::Surfactant)
            .with_ratings(5, 0);
        let a = evaluate(&sls, &profile(SkinType::Dry, false));
        assert_eq!(a.risk, RiskLevel::Warning);
        assert!(a.fired(SafetyRule::MoistureStripping));

        let mild = Ingredient::new(7, "Water", FunctionCategory::Solvent).with_ratings(1, 0);
        assert_eq!(evaluate(&mild, &profile(SkinType::Dry, false)).risk, RiskLevel::Safe);
    }

    #[test]
    fn test_sensitive_skin_fragrance_capped_at_warning() {
        let fragrance = Ingredient::new(8, "Fragrance", FunctionCategory::Perfume).with_ratings(8, 0);
        let a = evaluate(&fragrance, &profile(SkinType::Sensitive, false));
        assert_eq!(a.risk, RiskLevel::Warning);
        assert!(a.fired(SafetyRule::Irritant));
    }

    #[test]
    fn test_sensitive_skin_mild_preservative_is_safe() {
        let ehg = Ingredient::new(9, "Ethylhexylglycerin", FunctionCategory::Preservative)
            .with_ratings(2, 0);
        assert_eq!(evaluate(&ehg, &profile(SkinType::Sensitive, false)).risk, RiskLevel::Safe);
    }

    #[test]
    fn test_evaluate_id_unknown() {
        let catalog = MemoryCatalog::default();
        let v = evaluate_id(&catalog, IngredientId(42), &profile(SkinType::Oily, false));
        assert_eq!(v.label(), "UNKNOWN");
        assert_eq!(v.explanation(), NO_DATA);
        assert!(!v.is_risky());
    }

    #[test]
    fn test_evaluate_id_known() {
        let catalog = MemoryCatalog::builder().ingredient(retinol()).build().unwrap();
        let v = evaluate_id(&catalog, IngredientId(1), &profile(SkinType::Sensitive, true));
        assert_eq!(v.risk(), Some(RiskLevel::Danger));
        assert!(v.is_risky());
    }

    #[test]
    fn test_verdict_serializes_with_status() {
        let json = serde_json::to_value(Verdict::unknown()).unwrap();
        assert_eq!(json["status"], "unknown");

        let assessed = Verdict::Assessed(evaluate(&retinol(), &profile(SkinType::Normal, true)));
        let json = serde_json::to_value(assessed).unwrap();
        assert_eq!(json["status"], "assessed");
        assert_eq!(json["risk"], "DANGER");
    }

    fn any_category() -> impl Strategy<Value = FunctionCategory> {
        (0..FunctionCategory::ALL.len()).prop_map(|i| FunctionCategory::ALL[i])
    }

    fn any_skin() -> impl Strategy<Value = SkinType> {
        (0..SkinType::ALL.len()).prop_map(|i| SkinType::ALL[i])
    }

    proptest! {
        #[test]
        fn prop_pregnant_retinoid_always_danger(skin in any_skin(), safety in 0u8..10, com in 0u8..=5) {
            let ing = Ingredient::new(1, "Tretinoin", FunctionCategory::Retinoid).with_ratings(safety, com);
            let a = evaluate(&ing, &profile(skin, true));
            prop_assert_eq!(a.risk, RiskLevel::Danger);
            prop_assert!(a.explanation.contains("pregnancy"));
        }

        #[test]
        fn prop_breakout_prone_high_comedogenic_is_danger(
            category in any_category(),
            pregnant in any::<bool>(),
            safety in 0u8..10,
            com in 3u8..=5,
            acne in any::<bool>(),
        ) {
            let skin = if acne { SkinType::AcneProne } else { SkinType::Oily };
            let ing = Ingredient::new(1, "Test Oil", category).with_ratings(safety, com);
            prop_assert_eq!(evaluate(&ing, &profile(skin, pregnant)).risk, RiskLevel::Danger);
        }

        #[test]
        fn prop_breakout_prone_low_comedogenic_is_safe(
            category in any_category(),
            safety in 0u8..10,
            com in 0u8..=1,
            acne in any::<bool>(),
        ) {
            let skin = if acne { SkinType::AcneProne } else { SkinType::Oily };
            let ing = Ingredient::new(1, "Test Ingredient", category).with_ratings(safety, com);
            prop_assert_eq!(evaluate(&ing, &profile(skin, false)).risk, RiskLevel::Safe);
        }

        #[test]
        fn prop_evaluate_idempotent(
            category in any_category(),
            skin in any_skin(),
            pregnant in any::<bool>(),
            safety in 0u8..10,
            com in 0u8..=5,
        ) {
            let ing = Ingredient::new(1, "Salicylic Acid", category).with_ratings(safety, com);
            let p = profile(skin, pregnant);
            prop_assert_eq!(evaluate(&ing, &p), evaluate(&ing, &p));
        }

        #[test]
        fn prop_risk_is_max_of_findings(
            category in any_category(),
            skin in any_skin(),
            pregnant in any::<bool>(),
            safety in 0u8..10,
            com in 0u8..=5,
        ) {
            let ing = Ingredient::new(1, "Salicylic Acid", category).with_ratings(safety, com);
            let a = evaluate(&ing, &profile(skin, pregnant));
            let max = a.findings.iter().map(|f| f.risk).max().unwrap_or(RiskLevel::Safe);
            prop_assert_eq!(a.risk, max);
        }

        #[test]
        fn prop_dry_and_sensitive_rules_never_reach_danger(
            category in any_category(),
            safety in 0u8..10,
            com in 0u8..=5,
            dry in any::<bool>(),
        ) {
            let skin = if dry { SkinType::Dry } else { SkinType::Sensitive };
            let ing = Ingredient::new(1, "Test Ingredient", category).with_ratings(safety, com);
            prop_assert!(evaluate(&ing, &profile(skin, false)).risk <= RiskLevel::Warning);
        }
    }
}
