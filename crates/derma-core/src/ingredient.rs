use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable catalog identifier of an ingredient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientId(pub i64);

impl fmt::Display for IngredientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an ingredient does in a formula. Closed vocabulary: anything the
/// curators did not classify lands in `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionCategory {
    Solvent,
    Humectant,
    Emollient,
    Occlusive,
    Oil,
    Emulsifier,
    Thickener,
    Preservative,
    Perfume,
    Chelator,
    Antioxidant,
    Soothing,
    Sunscreen,
    Retinoid,
    Surfactant,
    Unknown,
}

impl FunctionCategory {
    pub const ALL: [FunctionCategory; 16] = [
        FunctionCategory::Solvent,
        FunctionCategory::Humectant,
        FunctionCategory::Emollient,
        FunctionCategory::Occlusive,
        FunctionCategory::Oil,
        FunctionCategory::Emulsifier,
        FunctionCategory::Thickener,
        FunctionCategory::Preservative,
        FunctionCategory::Perfume,
        FunctionCategory::Chelator,
        FunctionCategory::Antioxidant,
        FunctionCategory::Soothing,
        FunctionCategory::Sunscreen,
        FunctionCategory::Retinoid,
        FunctionCategory::Surfactant,
        FunctionCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionCategory::Solvent => "Solvent",
            FunctionCategory::Humectant => "Humectant",
            FunctionCategory::Emollient => "Emollient",
            FunctionCategory::Occlusive => "Occlusive",
            FunctionCategory::Oil => "Oil",
            FunctionCategory::Emulsifier => "Emulsifier",
            FunctionCategory::Thickener => "Thickener",
            FunctionCategory::Preservative => "Preservative",
            FunctionCategory::Perfume => "Perfume",
            FunctionCategory::Chelator => "Chelator",
            FunctionCategory::Antioxidant => "Antioxidant",
            FunctionCategory::Soothing => "Soothing",
            FunctionCategory::Sunscreen => "Sunscreen",
            FunctionCategory::Retinoid => "Retinoid",
            FunctionCategory::Surfactant => "Surfactant",
            FunctionCategory::Unknown => "Unknown",
        }
    }

    /// Lenient parse of a curated category label. Case-insensitive;
    /// "Fragrance" is an accepted spelling of `Perfume`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("fragrance") {
            return FunctionCategory::Perfume;
        }
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(FunctionCategory::Unknown)
    }

    /// Solvents and surfactants strip the skin's natural oils.
    pub fn is_stripping(&self) -> bool {
        matches!(self, FunctionCategory::Solvent | FunctionCategory::Surfactant)
    }

    /// Perfumes and preservatives are the usual irritants for reactive skin.
    pub fn is_irritant(&self) -> bool {
        matches!(self, FunctionCategory::Perfume | FunctionCategory::Preservative)
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog record, keyed by its standardized INCI name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub inci_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub category: FunctionCategory,
    /// Ordinal hazard score: 1 is safest, 8 and above is highest concern.
    pub safety_rating: u8,
    /// Pore-clogging potential on the 0-5 scale.
    pub comedogenic_rating: u8,
    #[serde(default)]
    pub pregnancy_safe: Option<bool>,
    #[serde(default)]
    pub mechanism: String,
}

impl Ingredient {
    pub fn new(id: i64, inci_name: &str, category: FunctionCategory) -> Self {
        Self {
            id: IngredientId(id),
            inci_name: inci_name.trim().to_string(),
            aliases: Vec::new(),
            category,
            safety_rating: 1,
            comedogenic_rating: 0,
            pregnancy_safe: None,
            mechanism: String::new(),
        }
    }

    pub fn with_ratings(mut self, safety: u8, comedogenic: u8) -> Self {
        self.safety_rating = safety;
        self.comedogenic_rating = comedogenic;
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pregnancy_safe(mut self, safe: bool) -> Self {
        self.pregnancy_safe = Some(safe);
        self
    }

    pub fn with_mechanism(mut self, mechanism: &str) -> Self {
        self.mechanism = mechanism.to_string();
        self
    }

    /// Case-insensitive comparison against the canonical name.
    pub fn is_named(&self, name: &str) -> bool {
        self.inci_name.to_lowercase() == name.trim().to_lowercase()
    }
}
