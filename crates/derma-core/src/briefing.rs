//! Context handed to the conversational assistant.
//!
//! The briefing only narrates what the analyzer already computed; dialogue
//! history belongs to whoever drives the conversation.

use serde::{Deserialize, Serialize};

use crate::analysis::ScanReport;
use crate::profile::UserProfile;

/// Canned model turn that closes the seeded opening exchange.
pub const ACKNOWLEDGEMENT: &str =
    "Understood. I'm ready to advise on this product based on your skin profile.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Briefing {
    pub ingredients: Vec<String>,
    pub profile: UserProfile,
    pub findings: Vec<String>,
}

impl Briefing {
    pub fn new(ingredients: Vec<String>, profile: UserProfile) -> Self {
        Self {
            ingredients,
            profile,
            findings: Vec::new(),
        }
    }

    /// Brief on a scan: the detected names plus every risk the rules found.
    pub fn from_scan(detected: &[String], report: &ScanReport) -> Self {
        let ingredients = detected
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();

        let mut findings: Vec<String> = report
            .personal_risks
            .iter()
            .map(|r| {
                format!(
                    "{} ({}): {}",
                    r.ingredient.display_name(),
                    r.risk,
                    r.explanation.replace('\n', " ")
                )
            })
            .collect();
        findings.extend(report.interaction_risks.iter().map(|r| {
            format!(
                "{} + {} ({}, {}): {}",
                r.ingredient.display_name(),
                r.routine.display_name(),
                r.kind,
                r.severity,
                r.advice
            )
        }));
        if !report.unmatched.is_empty() {
            findings.push(format!(
                "Not in the reference catalog (unverified): {}",
                report.unmatched.join(", ")
            ));
        }

        Self {
            findings,
            ..Self::new(ingredients, report.profile)
        }
    }

    pub fn render(&self) -> String {
        let ingredients = if self.ingredients.is_empty() {
            "(none detected)".to_string()
        } else {
            self.ingredients.join(", ")
        };
        let findings = if self.findings.is_empty() {
            "   - No personal or interaction risks found.".to_string()
        } else {
            self.findings
                .iter()
                .map(|f| format!("   - {f}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "You are a friendly, professional AI dermatology assistant.\n\
             \n\
             CURRENT CONTEXT:\n\
             1. The user just scanned a product containing: {ingredients}.\n\
             2. The user's skin profile: {profile}.\n\
             3. Rule-engine findings:\n\
             {findings}\n\
             \n\
             YOUR TASK:\n\
             - Answer the user's questions about this product.\n\
             - Advise on usage, frequency and precautions based on the ingredient list above.\n\
             - Politely decline questions unrelated to skincare.\n\
             - Keep answers short and well formatted in Markdown.",
            profile = self.profile.describe(),
        )
    }

    /// Opening exchange for a new chat session.
    pub fn seed_history(&self) -> Vec<ChatTurn> {
        vec![ChatTurn::user(self.render()), ChatTurn::model(ACKNOWLEDGEMENT)]
    }
}
