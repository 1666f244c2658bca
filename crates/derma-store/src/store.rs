use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use uuid::Uuid;

use derma_core::{
    FunctionCategory, Ingredient, IngredientId, InteractionRule, InteractionType, MemoryCatalog,
    Severity, SkinType, UserProfile,
};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::seed::IngredientEntry;

pub struct Store {
    conn: Connection,
}

/// One row of the scan-history log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanRecord {
    pub id: Uuid,
    /// UTC, `YYYY-MM-DD HH:MM:SS` as written by SQLite.
    pub created_at: String,
    pub detected: Vec<String>,
    pub routine: Option<String>,
    pub profile: UserProfile,
    pub label: String,
}

/// Outcome of an ingredient upsert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upserted {
    Inserted(IngredientId),
    Updated(IngredientId),
}

impl Upserted {
    pub fn id(&self) -> IngredientId {
        match self {
            Upserted::Inserted(id) | Upserted::Updated(id) => *id,
        }
    }
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Catalog ---

    pub fn ingredient_count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ingredients", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    pub fn interaction_count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM interactions", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    pub fn ingredient_id(&self, name: &str) -> Result<Option<IngredientId>> {
        ingredient_id_on(&self.conn, name)
    }

    /// Snapshot the whole catalog for one analysis session.
    pub fn load_catalog(&self) -> Result<MemoryCatalog> {
        let ingredients = self.load_ingredients()?;
        let rules = self.load_interactions()?;
        tracing::debug!(
            ingredients = ingredients.len(),
            rules = rules.len(),
            "loaded catalog snapshot"
        );
        Ok(MemoryCatalog::builder()
            .ingredients(ingredients)
            .rules(rules)
            .build()?)
    }

    fn load_ingredients(&self) -> Result<Vec<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, inci_name, aliases, category, safety_rating, comedogenic_rating,
                    pregnancy_safe, mechanism
             FROM ingredients ORDER BY id",
        )?;

        let rows: Vec<(i64, String, String, String, i64, i64, Option<bool>, String)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(
                |(id, name, aliases, category, safety, comedogenic, pregnancy_safe, mechanism)|
                 -> Result<Ingredient> {
                    let mut ingredient =
                        Ingredient::new(id, &name, FunctionCategory::from_label(&category))
                            .with_ratings(to_rating(&name, safety)?, to_rating(&name, comedogenic)?)
                            .with_aliases(split_aliases(&aliases))
                            .with_mechanism(&mechanism);
                    ingredient.pregnancy_safe = pregnancy_safe;
                    Ok(ingredient)
                },
            )
            .collect()
    }

    fn load_interactions(&self) -> Result<Vec<InteractionRule>> {
        let mut stmt = self.conn.prepare(
            "SELECT ingredient_a, ingredient_b, kind, severity, advice, citation
             FROM interactions ORDER BY id",
        )?;

        let rows: Vec<(i64, i64, String, String, String, Option<String>)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(a, b, kind, severity, advice, citation)| -> Result<InteractionRule> {
                let kind = InteractionType::parse(&kind).ok_or_else(|| {
                    StoreError::InvalidData(format!("unknown interaction type '{kind}'"))
                })?;
                let severity = Severity::parse(&severity).ok_or_else(|| {
                    StoreError::InvalidData(format!("unknown severity '{severity}'"))
                })?;
                let mut rule =
                    InteractionRule::new(IngredientId(a), IngredientId(b), kind, severity, &advice);
                rule.citation = citation;
                Ok(rule)
            })
            .collect()
    }

    // --- Scan history ---

    /// Append one scan result to the log. The timestamp is assigned by SQLite.
    pub fn append_scan(
        &self,
        detected: &[String],
        routine: Option<&str>,
        profile: &UserProfile,
        label: &str,
    ) -> Result<ScanRecord> {
        let id = Uuid::new_v4();
        let detected_json = serde_json::to_string(detected)
            .map_err(|e| StoreError::InvalidData(format!("detected list: {e}")))?;

        self.conn.execute(
            "INSERT INTO scan_history (id, detected, routine, skin_type, pregnant, label)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                detected_json,
                routine,
                profile.skin_type.as_str(),
                profile.is_pregnant,
                label,
            ],
        )?;

        let created_at: String = self.conn.query_row(
            "SELECT created_at FROM scan_history WHERE id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )?;

        tracing::info!(%id, label, detected = detected.len(), "scan logged");
        Ok(ScanRecord {
            id,
            created_at,
            detected: detected.to_vec(),
            routine: routine.map(str::to_string),
            profile: *profile,
            label: label.to_string(),
        })
    }

    /// Most recent scans first.
    pub fn recent_scans(&self, limit: usize) -> Result<Vec<ScanRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, detected, routine, skin_type, pregnant, label
             FROM scan_history ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;

        let rows: Vec<(String, String, String, Option<String>, String, bool, String)> = stmt
            .query_map([limit as i64], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(id, created_at, detected, routine, skin, pregnant, label)| -> Result<ScanRecord> {
                let detected: Vec<String> = serde_json::from_str(&detected).map_err(|e| {
                    StoreError::InvalidData(format!("scan {id}: bad detected list: {e}"))
                })?;
                let skin_type: SkinType = skin
                    .parse()
                    .map_err(|e| StoreError::InvalidData(format!("scan {id}: {e}")))?;
                Ok(ScanRecord {
                    id: parse_uuid(&id)?,
                    created_at,
                    detected,
                    routine,
                    profile: UserProfile::new(skin_type, pregnant),
                    label,
                })
            })
            .collect()
    }
}

// --- Connection-level helpers, shared with the importer's transaction ---

pub(crate) fn ingredient_id_on(conn: &Connection, name: &str) -> Result<Option<IngredientId>> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM ingredients WHERE inci_name = ?1",
            [name.trim()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id.map(IngredientId))
}

/// Insert or update by case-insensitive canonical name. Existing rows keep their id.
pub(crate) fn upsert_ingredient_on(conn: &Connection, entry: &IngredientEntry) -> Result<Upserted> {
    let name = entry.inci.trim();
    let aliases = entry.aliases().join(", ");
    let category = FunctionCategory::from_label(&entry.category);

    match ingredient_id_on(conn, name)? {
        Some(id) => {
            conn.execute(
                "UPDATE ingredients
                 SET inci_name = ?2, aliases = ?3, category = ?4, safety_rating = ?5,
                     comedogenic_rating = ?6, pregnancy_safe = ?7, mechanism = ?8
                 WHERE id = ?1",
                params![
                    id.0,
                    name,
                    aliases,
                    category.as_str(),
                    entry.safety,
                    entry.comedogenic,
                    entry.pregnancy_safe,
                    entry.mechanism,
                ],
            )?;
            Ok(Upserted::Updated(id))
        }
        None => {
            conn.execute(
                "INSERT INTO ingredients
                 (inci_name, aliases, category, safety_rating, comedogenic_rating,
                  pregnancy_safe, mechanism)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    name,
                    aliases,
                    category.as_str(),
                    entry.safety,
                    entry.comedogenic,
                    entry.pregnancy_safe,
                    entry.mechanism,
                ],
            )?;
            Ok(Upserted::Inserted(IngredientId(conn.last_insert_rowid())))
        }
    }
}

/// Insert a rule unless the unordered pair already has one. Returns whether
/// a row was written.
pub(crate) fn insert_interaction_on(conn: &Connection, rule: &InteractionRule) -> Result<bool> {
    if rule.ingredient_a == rule.ingredient_b {
        return Err(StoreError::InvalidData(format!(
            "interaction pairs ingredient {} with itself",
            rule.ingredient_a
        )));
    }

    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM interactions
             WHERE (ingredient_a = ?1 AND ingredient_b = ?2)
                OR (ingredient_a = ?2 AND ingredient_b = ?1)",
            params![rule.ingredient_a.0, rule.ingredient_b.0],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Ok(false);
    }

    conn.execute(
        "INSERT INTO interactions (ingredient_a, ingredient_b, kind, severity, advice, citation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            rule.ingredient_a.0,
            rule.ingredient_b.0,
            rule.kind.as_str(),
            rule.severity.as_str(),
            rule.advice,
            rule.citation,
        ],
    )?;
    Ok(true)
}

pub(crate) fn split_aliases(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_rating(name: &str, value: i64) -> Result<u8> {
    u8::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("rating {value} for '{name}' out of range")))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidData(format!("invalid UUID '{s}': {e}")))
}
