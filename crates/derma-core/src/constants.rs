/// Upper bound of the comedogenic scale (0 = never clogs pores).
pub const COMEDOGENIC_MAX: u8 = 5;

/// Comedogenic rating at or above which oily/acne-prone skin is in danger.
pub const COMEDOGENIC_DANGER: u8 = 3;

/// Comedogenic rating that earns a mild warning for oily/acne-prone skin.
pub const COMEDOGENIC_MILD: u8 = 2;

/// Safety rating at or above which solvents, surfactants, perfumes and
/// preservatives are considered harsh for dry or sensitive skin.
pub const HARSH_SAFETY_RATING: u8 = 4;

/// Canonical names treated as beta hydroxy acid by the pregnancy gate.
pub const BHA_NAMES: [&str; 2] = ["salicylic acid", "bha"];
