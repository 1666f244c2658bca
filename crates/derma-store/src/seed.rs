//! Curated catalog data and its importer.
//!
//! Catalog files are TOML with `[[ingredient]]` and `[[interaction]]` tables.
//! Interactions name their ingredients by canonical name, so a file can add
//! rules against ingredients imported earlier. A built-in dataset ships with
//! the crate.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use derma_core::constants::COMEDOGENIC_MAX;
use derma_core::{InteractionRule, InteractionType, Severity};

use crate::error::{Result, StoreError};
use crate::store::{self, Store, Upserted};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default, rename = "ingredient")]
    pub ingredients: Vec<IngredientEntry>,
    #[serde(default, rename = "interaction")]
    pub interactions: Vec<InteractionEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IngredientEntry {
    pub inci: String,
    /// Comma-separated common names.
    #[serde(default)]
    pub common: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_safety")]
    pub safety: u8,
    #[serde(default)]
    pub comedogenic: u8,
    #[serde(default)]
    pub pregnancy_safe: Option<bool>,
    #[serde(default)]
    pub mechanism: String,
}

impl IngredientEntry {
    pub fn aliases(&self) -> Vec<String> {
        store::split_aliases(&self.common)
    }
}

fn default_category() -> String {
    "Unknown".to_string()
}

fn default_safety() -> u8 {
    1
}

#[derive(Clone, Debug, Deserialize)]
pub struct InteractionEntry {
    pub a: String,
    pub b: String,
    pub kind: String,
    pub severity: String,
    #[serde(default)]
    pub advice: String,
    #[serde(default)]
    pub citation: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub ingredients_inserted: usize,
    pub ingredients_updated: usize,
    pub rules_inserted: usize,
    /// Rules whose pair already had one.
    pub rules_skipped: usize,
    /// Rules naming an ingredient that is not in the catalog, as "A <-> B".
    pub rules_missing: Vec<String>,
}

pub fn parse_catalog(text: &str) -> Result<CatalogFile> {
    Ok(toml::from_str(text)?)
}

pub fn read_catalog(path: &Path) -> Result<CatalogFile> {
    let text = fs::read_to_string(path)?;
    parse_catalog(&text)
}

pub fn builtin_catalog() -> Result<CatalogFile> {
    parse_catalog(BUILTIN_CATALOG)
}

/// Import a catalog file in one transaction. Ingredients are upserted by
/// case-insensitive name; a rule is only written when its unordered pair has
/// none yet. Rules naming unknown ingredients are skipped and reported.
pub fn import_catalog(store: &Store, file: &CatalogFile) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let tx = store.conn().unchecked_transaction()?;

    for entry in &file.ingredients {
        if entry.inci.trim().is_empty() {
            return Err(StoreError::InvalidData(
                "ingredient with an empty name".to_string(),
            ));
        }
        if entry.comedogenic > COMEDOGENIC_MAX {
            return Err(StoreError::InvalidData(format!(
                "comedogenic rating {} for '{}' is outside 0-{COMEDOGENIC_MAX}",
                entry.comedogenic, entry.inci
            )));
        }
        match store::upsert_ingredient_on(&tx, entry)? {
            Upserted::Inserted(_) => report.ingredients_inserted += 1,
            Upserted::Updated(_) => report.ingredients_updated += 1,
        }
    }

    for entry in &file.interactions {
        let kind = InteractionType::parse(&entry.kind).ok_or_else(|| {
            StoreError::InvalidData(format!("unknown interaction type '{}'", entry.kind))
        })?;
        let severity = Severity::parse(&entry.severity).ok_or_else(|| {
            StoreError::InvalidData(format!("unknown severity '{}'", entry.severity))
        })?;

        let ids = (
            store::ingredient_id_on(&tx, &entry.a)?,
            store::ingredient_id_on(&tx, &entry.b)?,
        );
        let (Some(a), Some(b)) = ids else {
            tracing::warn!(a = %entry.a, b = %entry.b, "interaction names an unknown ingredient");
            report.rules_missing.push(format!("{} <-> {}", entry.a, entry.b));
            continue;
        };

        let mut rule = InteractionRule::new(a, b, kind, severity, &entry.advice);
        rule.citation = entry.citation.clone();
        if store::insert_interaction_on(&tx, &rule)? {
            report.rules_inserted += 1;
        } else {
            tracing::debug!(a = %entry.a, b = %entry.b, "pair already has a rule");
            report.rules_skipped += 1;
        }
    }

    tx.commit()?;
    tracing::info!(
        inserted = report.ingredients_inserted,
        updated = report.ingredients_updated,
        rules = report.rules_inserted,
        skipped = report.rules_skipped,
        "catalog imported"
    );
    Ok(report)
}

pub fn import_builtin(store: &Store) -> Result<ImportReport> {
    let report = import_catalog(store, &builtin_catalog()?)?;
    store.set_metadata("catalog_source", "builtin")?;
    Ok(report)
}
