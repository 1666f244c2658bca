use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkinType {
    #[default]
    Normal,
    Oily,
    Dry,
    Sensitive,
    #[serde(rename = "Acne-Prone")]
    AcneProne,
}

impl SkinType {
    pub const ALL: [SkinType; 5] = [
        SkinType::Normal,
        SkinType::Oily,
        SkinType::Dry,
        SkinType::Sensitive,
        SkinType::AcneProne,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkinType::Normal => "Normal",
            SkinType::Oily => "Oily",
            SkinType::Dry => "Dry",
            SkinType::Sensitive => "Sensitive",
            SkinType::AcneProne => "Acne-Prone",
        }
    }

    /// Oily and acne-prone skin share the comedogenic check.
    pub fn is_breakout_prone(&self) -> bool {
        matches!(self, SkinType::Oily | SkinType::AcneProne)
    }
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProfileError(String);

impl fmt::Display for ParseProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown skin type '{}' (expected one of: Normal, Oily, Dry, Sensitive, Acne-Prone)",
            self.0
        )
    }
}

impl std::error::Error for ParseProfileError {}

impl FromStr for SkinType {
    type Err = ParseProfileError;

    /// Accepts the bare code in any case and with `-`, `_` or no separator
    /// ("acne_prone", "AcneProne"). A trailing display annotation such as
    /// "Oily (Dầu)" is ignored: only the first word is the code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.split_whitespace().next().unwrap_or("");
        let folded: String = code
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "normal" => Ok(SkinType::Normal),
            "oily" => Ok(SkinType::Oily),
            "dry" => Ok(SkinType::Dry),
            "sensitive" => Ok(SkinType::Sensitive),
            "acneprone" | "acne" => Ok(SkinType::AcneProne),
            _ => Err(ParseProfileError(s.trim().to_string())),
        }
    }
}

/// Who the analysis is for. Built once per session and never mutated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub skin_type: SkinType,
    /// Pregnant or breastfeeding.
    pub is_pregnant: bool,
}

impl UserProfile {
    pub fn new(skin_type: SkinType, is_pregnant: bool) -> Self {
        Self {
            skin_type,
            is_pregnant,
        }
    }

    /// One-line synopsis used in reports and assistant briefings.
    pub fn describe(&self) -> String {
        if self.is_pregnant {
            format!("{} skin, pregnant or breastfeeding", self.skin_type)
        } else {
            format!("{} skin", self.skin_type)
        }
    }
}
