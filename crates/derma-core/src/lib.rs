//! Skincare ingredient safety and interaction engine.
//!
//! Maps (ingredient, user profile) to a personal risk verdict and
//! (ingredient, ingredient) to a curated interaction rule, and composes both
//! into reports for a manual pair check or a scanned ingredient list.
//!
//! Zero I/O: reads an immutable catalog snapshot and returns plain data.
//! Image extraction and chat are external collaborators: this crate only
//! parses what they return and briefs what they receive.

pub mod analysis;
pub mod briefing;
pub mod catalog;
pub mod constants;
pub mod extraction;
pub mod ingredient;
pub mod interaction;
pub mod matching;
pub mod profile;
pub mod safety;

pub use analysis::{
    Analyzer, IngredientRef, IngredientVerdict, InteractionRisk, PairReport, PersonalRisk,
    ScanMatch, ScanReport, ScanSummary,
};
pub use briefing::{Briefing, ChatTurn, Role};
pub use catalog::{Catalog, CatalogBuilder, CatalogError, MemoryCatalog};
pub use extraction::{EXTRACTION_PROMPT, parse_reply};
pub use ingredient::{FunctionCategory, Ingredient, IngredientId};
pub use interaction::{InteractionRule, InteractionType, PairKey, Severity};
pub use matching::{IngredientMatcher, NameMatch};
pub use profile::{ParseProfileError, SkinType, UserProfile};
pub use safety::{Assessment, Finding, RiskLevel, SafetyRule, Verdict, evaluate, evaluate_id};
