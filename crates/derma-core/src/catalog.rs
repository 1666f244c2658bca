//! Read-only ingredient catalog.
//!
//! The [`Catalog`] trait is the only way the engine reads reference data.
//! [`MemoryCatalog`] is the in-process snapshot every analysis runs against:
//! it is built once through [`CatalogBuilder`], which enforces the catalog
//! rules, and is never mutated afterwards.

use std::collections::HashMap;
use std::fmt;

use crate::constants::COMEDOGENIC_MAX;
use crate::ingredient::{Ingredient, IngredientId};
use crate::interaction::{InteractionRule, PairKey};

pub trait Catalog {
    fn find_by_id(&self, id: IngredientId) -> Option<&Ingredient>;

    /// Case-insensitive lookup by canonical name.
    fn find_by_name(&self, name: &str) -> Option<&Ingredient>;

    /// Every ingredient, sorted by canonical name.
    fn list_all(&self) -> &[Ingredient];

    /// The rule for the unordered pair `{a, b}`, if one was curated.
    fn find_interaction(&self, a: IngredientId, b: IngredientId) -> Option<&InteractionRule>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    DuplicateId(IngredientId),
    DuplicateName(String),
    EmptyName(IngredientId),
    ComedogenicOutOfRange { name: String, rating: u8 },
    UnknownIngredient(IngredientId),
    DuplicateRule(IngredientId, IngredientId),
    SelfInteraction(IngredientId),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DuplicateId(id) => write!(f, "duplicate ingredient id {id}"),
            CatalogError::DuplicateName(name) => {
                write!(f, "duplicate ingredient name '{name}' (names are case-insensitive)")
            }
            CatalogError::EmptyName(id) => write!(f, "ingredient {id} has an empty name"),
            CatalogError::ComedogenicOutOfRange { name, rating } => write!(
                f,
                "comedogenic rating {rating} for '{name}' is outside 0-{COMEDOGENIC_MAX}"
            ),
            CatalogError::UnknownIngredient(id) => {
                write!(f, "interaction rule references unknown ingredient {id}")
            }
            CatalogError::DuplicateRule(a, b) => {
                write!(f, "more than one interaction rule for pair ({a}, {b})")
            }
            CatalogError::SelfInteraction(id) => {
                write!(f, "interaction rule pairs ingredient {id} with itself")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Immutable in-memory catalog.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    ingredients: Vec<Ingredient>,
    by_id: HashMap<IngredientId, usize>,
    by_name: HashMap<String, usize>,
    rules: HashMap<PairKey, InteractionRule>,
}

impl MemoryCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Catalog for MemoryCatalog {
    fn find_by_id(&self, id: IngredientId) -> Option<&Ingredient> {
        self.by_id.get(&id).map(|&i| &self.ingredients[i])
    }

    fn find_by_name(&self, name: &str) -> Option<&Ingredient> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|&i| &self.ingredients[i])
    }

    fn list_all(&self) -> &[Ingredient] {
        &self.ingredients
    }

    fn find_interaction(&self, a: IngredientId, b: IngredientId) -> Option<&InteractionRule> {
        self.rules.get(&PairKey::new(a, b))
    }
}

/// Collects records and validates them as a whole in [`CatalogBuilder::build`].
#[derive(Default)]
pub struct CatalogBuilder {
    ingredients: Vec<Ingredient>,
    rules: Vec<InteractionRule>,
}

impl CatalogBuilder {
    pub fn ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn ingredients(mut self, ingredients: impl IntoIterator<Item = Ingredient>) -> Self {
        self.ingredients.extend(ingredients);
        self
    }

    pub fn rule(mut self, rule: InteractionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = InteractionRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> Result<MemoryCatalog, CatalogError> {
        let mut ingredients = self.ingredients;
        ingredients.sort_by(|a, b| {
            a.inci_name
                .to_lowercase()
                .cmp(&b.inci_name.to_lowercase())
                .then_with(|| a.inci_name.cmp(&b.inci_name))
        });

        let mut by_id = HashMap::with_capacity(ingredients.len());
        let mut by_name = HashMap::with_capacity(ingredients.len());
        for (idx, ing) in ingredients.iter().enumerate() {
            if ing.inci_name.trim().is_empty() {
                return Err(CatalogError::EmptyName(ing.id));
            }
            if ing.comedogenic_rating > COMEDOGENIC_MAX {
                return Err(CatalogError::ComedogenicOutOfRange {
                    name: ing.inci_name.clone(),
                    rating: ing.comedogenic_rating,
                });
            }
            if by_id.insert(ing.id, idx).is_some() {
                return Err(CatalogError::DuplicateId(ing.id));
            }
            if by_name.insert(ing.inci_name.trim().to_lowercase(), idx).is_some() {
                return Err(CatalogError::DuplicateName(ing.inci_name.clone()));
            }
        }

        let mut rules = HashMap::with_capacity(self.rules.len());
        for rule in self.rules {
            for id in [rule.ingredient_a, rule.ingredient_b] {
                if !by_id.contains_key(&id) {
                    return Err(CatalogError::UnknownIngredient(id));
                }
            }
            let key = rule.key();
            if key.is_self_pair() {
                return Err(CatalogError::SelfInteraction(rule.ingredient_a));
            }
            let (a, b) = (rule.ingredient_a, rule.ingredient_b);
            if rules.insert(key, rule).is_some() {
                return Err(CatalogError::DuplicateRule(a, b));
            }
        }

        Ok(MemoryCatalog {
            ingredients,
            by_id,
            by_name,
            rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredient::FunctionCategory;
    use crate::interaction::{InteractionType, Severity};

    fn ing(id: i64, name: &str) -> Ingredient {
        Ingredient::new(id, name, FunctionCategory::Unknown)
    }

    fn rule(a: i64, b: i64) -> InteractionRule {
        InteractionRule::new(
            IngredientId(a),
            IngredientId(b),
            InteractionType::Conflict,
            Severity::High,
            "split morning and night",
        )
    }

    #[test]
    fn test_list_all_sorted_by_name() {
        let catalog = MemoryCatalog::builder()
            .ingredient(ing(1, "Water"))
            .ingredient(ing(2, "glycerin"))
            .ingredient(ing(3, "Allantoin"))
            .build()
            .unwrap();
        let names: Vec<&str> = catalog.list_all().iter().map(|i| i.inci_name.as_str()).collect();
        assert_eq!(names, vec!["Allantoin", "glycerin", "Water"]);
    }

    #[test]
    fn test_find_by_id_and_name() {
        let catalog = MemoryCatalog::builder()
            .ingredient(ing(10, "Niacinamide"))
            .build()
            .unwrap();
        assert_eq!(catalog.find_by_id(IngredientId(10)).unwrap().inci_name, "Niacinamide");
        assert!(catalog.find_by_id(IngredientId(11)).is_none());
        assert_eq!(catalog.find_by_name("NIACINAMIDE").unwrap().id, IngredientId(10));
        assert_eq!(catalog.find_by_name(" niacinamide ").unwrap().id, IngredientId(10));
        assert!(catalog.find_by_name("Niacin").is_none());
    }

    #[test]
    fn test_duplicate_name_case_insensitive() {
        let err = MemoryCatalog::builder()
            .ingredient(ing(1, "Retinol"))
            .ingredient(ing(2, "RETINOL"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName(_)));
    }

    #[test]
    fn test_duplicate_id() {
        let err = MemoryCatalog::builder()
            .ingredient(ing(1, "Retinol"))
            .ingredient(ing(1, "Water"))
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId(IngredientId(1)));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = MemoryCatalog::builder().ingredient(ing(1, "  ")).build().unwrap_err();
        assert_eq!(err, CatalogError::EmptyName(IngredientId(1)));
    }

    #[test]
    fn test_comedogenic_out_of_range() {
        let err = MemoryCatalog::builder()
            .ingredient(ing(1, "Lanolin").with_ratings(1, 6))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::ComedogenicOutOfRange { rating: 6, .. }));
    }

    #[test]
    fn test_rule_lookup_symmetric() {
        let catalog = MemoryCatalog::builder()
            .ingredient(ing(1, "Retinol"))
            .ingredient(ing(2, "Ascorbic Acid"))
            .rule(rule(2, 1))
            .build()
            .unwrap();
        let forward = catalog.find_interaction(IngredientId(1), IngredientId(2));
        let backward = catalog.find_interaction(IngredientId(2), IngredientId(1));
        assert!(forward.is_some());
        assert_eq!(forward, backward);
        assert_eq!(catalog.rule_count(), 1);
    }

    #[test]
    fn test_reversed_duplicate_rule_rejected() {
        let err = MemoryCatalog::builder()
            .ingredient(ing(1, "Retinol"))
            .ingredient(ing(2, "Ascorbic Acid"))
            .rule(rule(1, 2))
            .rule(rule(2, 1))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateRule(_, _)));
    }

    #[test]
    fn test_rule_with_unknown_ingredient_rejected() {
        let err = MemoryCatalog::builder()
            .ingredient(ing(1, "Retinol"))
            .rule(rule(1, 99))
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::UnknownIngredient(IngredientId(99)));
    }

    #[test]
    fn test_self_interaction_rejected() {
        let err = MemoryCatalog::builder()
            .ingredient(ing(1, "Retinol"))
            .rule(rule(1, 1))
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::SelfInteraction(IngredientId(1)));
    }

    #[test]
    fn test_default_catalog_is_empty() {
        let catalog = MemoryCatalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.find_by_id(IngredientId(4)).is_none());
    }
}
