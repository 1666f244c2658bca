use regex::Regex;
use std::sync::LazyLock;

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;\n]").unwrap());
static DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s*\-•`]+|[\s`.]+$").unwrap());

/// Instruction sent alongside a product-label photo.
pub const EXTRACTION_PROMPT: &str = "\
Extract all chemical ingredient names from this skincare product label image.
Standardize names to INCI format (e.g., Vitamin B3 -> Niacinamide).
Return ONLY a comma-separated list. No other text.";

/// Split a vision model's reply into ingredient names.
/// Accepts commas, semicolons or newlines as separators and strips list
/// bullets, backticks and trailing periods. Never fails: an empty or
/// unusable reply is simply zero detections.
pub fn parse_reply(reply: &str) -> Vec<String> {
    SEPARATOR
        .split(reply.trim())
        .map(|part| DECORATION.replace_all(part, "").to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_separated() {
        assert_eq!(
            parse_reply("Water, Glycerin, Niacinamide"),
            vec!["Water", "Glycerin", "Niacinamide"]
        );
    }

    #[test]
    fn test_empty_reply() {
        assert!(parse_reply("").is_empty());
        assert!(parse_reply("   \n ").is_empty());
        assert!(parse_reply(", , ,").is_empty());
    }

    #[test]
    fn test_bullets_and_newlines() {
        assert_eq!(
            parse_reply("- Water\n* Glycerin\n• Fragrance (Parfum)."),
            vec!["Water", "Glycerin", "Fragrance (Parfum)"]
        );
    }

    #[test]
    fn test_backticks_and_semicolons() {
        assert_eq!(parse_reply("`Water`; `Retinol`"), vec!["Water", "Retinol"]);
    }

    #[test]
    fn test_keeps_inner_punctuation() {
        assert_eq!(
            parse_reply("PEG-100 Stearate, Caprylic/Capric Triglyceride"),
            vec!["PEG-100 Stearate", "Caprylic/Capric Triglyceride"]
        );
    }
}
