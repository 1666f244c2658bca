//! Fuzzy resolution of free-text ingredient names against the catalog.
//!
//! A detected name matches a catalog entry when the entry's name, lowercased,
//! is a substring of the lowercased detected name. When several entries
//! match, the longest name wins ("Cetearyl Alcohol" beats "Alcohol"); equal
//! lengths prefer canonical names over aliases, then alphabetical order.

use serde::Serialize;

use crate::ingredient::Ingredient;

struct Candidate<'a> {
    needle: String,
    len: usize,
    via_alias: bool,
    ingredient: &'a Ingredient,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NameMatch<'a> {
    pub ingredient: &'a Ingredient,
    /// The catalog name (canonical or alias) found inside the detected text.
    pub matched_on: String,
    pub via_alias: bool,
}

pub struct IngredientMatcher<'a> {
    candidates: Vec<Candidate<'a>>,
}

impl<'a> IngredientMatcher<'a> {
    /// Match on canonical names only.
    pub fn new(ingredients: &'a [Ingredient]) -> Self {
        Self::build(ingredients, false)
    }

    /// Match on canonical names and common aliases ("Aqua" → Water).
    pub fn with_aliases(ingredients: &'a [Ingredient]) -> Self {
        Self::build(ingredients, true)
    }

    fn build(ingredients: &'a [Ingredient], aliases: bool) -> Self {
        let mut candidates = Vec::new();
        for ingredient in ingredients {
            push_candidate(&mut candidates, &ingredient.inci_name, false, ingredient);
            if aliases {
                for alias in &ingredient.aliases {
                    push_candidate(&mut candidates, alias, true, ingredient);
                }
            }
        }
        candidates.sort_by(|a, b| {
            b.len
                .cmp(&a.len)
                .then(a.via_alias.cmp(&b.via_alias))
                .then_with(|| a.needle.cmp(&b.needle))
                .then(a.ingredient.id.cmp(&b.ingredient.id))
        });
        Self { candidates }
    }

    pub fn match_name(&self, detected: &str) -> Option<NameMatch<'a>> {
        let haystack = detected.trim().to_lowercase();
        if haystack.is_empty() {
            return None;
        }
        self.candidates
            .iter()
            .find(|c| haystack.contains(&c.needle))
            .map(|c| NameMatch {
                ingredient: c.ingredient,
                matched_on: c.needle.clone(),
                via_alias: c.via_alias,
            })
    }
}

fn push_candidate<'a>(
    candidates: &mut Vec<Candidate<'a>>,
    name: &str,
    via_alias: bool,
    ingredient: &'a Ingredient,
) {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return;
    }
    candidates.push(Candidate {
        len: needle.chars().count(),
        needle,
        via_alias,
        ingredient,
    });
}
