//! Label dictionary: the glyphs a marker may carry, glyph pairs that form a
//! combination, and per-label model adjustments.
//!
//! The JSON form also accepts the field names of legacy `meta.json`
//! files (`monji`, `tango`, `kanji`).

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pose::ModelAdjustment;

/// Integer label id as used by the dictionary.
pub type LabelId = u32;

#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("duplicate label id {0}")]
    DuplicateId(LabelId),
    #[error("label {0} has an empty glyph")]
    EmptyGlyph(LabelId),
    #[error("combination {id} cannot be split into two label ids")]
    UnresolvedCombination { id: LabelId },
}

/// One recognizable glyph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphEntry {
    pub id: LabelId,
    #[serde(alias = "kanji")]
    pub glyph: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onyomi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kunyomi: Option<String>,
    /// Opaque asset reference for the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GlyphEntry {
    pub fn new(id: LabelId, glyph: impl Into<String>) -> Self {
        Self {
            id,
            glyph: glyph.into(),
            onyomi: None,
            kunyomi: None,
            model: None,
        }
    }
}

/// Ordered pair of labels that together form a combination.
///
/// When `left`/`right` are omitted they are read from the decimal digits of
/// `id` (`12` is label 1 followed by label 2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationEntry {
    pub id: LabelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<LabelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<LabelId>,
    #[serde(default, alias = "tango", skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl CombinationEntry {
    pub fn new(id: LabelId, left: LabelId, right: LabelId) -> Self {
        Self {
            id,
            left: Some(left),
            right: Some(right),
            word: None,
            model: None,
        }
    }

    /// `(left, right)` label ids.
    pub fn pair(&self) -> Option<(LabelId, LabelId)> {
        match (self.left, self.right) {
            (Some(l), Some(r)) => Some((l, r)),
            (None, None) if self.id >= 10 => Some((self.id / 10, self.id % 10)),
            _ => None,
        }
    }
}

/// Serialized form; validated into [`LabelDictionary`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RawDictionary {
    #[serde(default, alias = "monji")]
    glyphs: Vec<GlyphEntry>,
    #[serde(default, alias = "tango")]
    combinations: Vec<CombinationEntry>,
    #[serde(default)]
    adjustments: BTreeMap<LabelId, ModelAdjustment>,
}

/// Validated label dictionary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "RawDictionary", into = "RawDictionary")]
pub struct LabelDictionary {
    glyphs: Vec<GlyphEntry>,
    combinations: Vec<CombinationEntry>,
    adjustments: BTreeMap<LabelId, ModelAdjustment>,
}

impl TryFrom<RawDictionary> for LabelDictionary {
    type Error = DictionaryError;

    fn try_from(raw: RawDictionary) -> Result<Self, Self::Error> {
        let mut dict = LabelDictionary::new(raw.glyphs)?;
        for c in raw.combinations {
            dict.push_combination(c)?;
        }
        dict.adjustments = raw.adjustments;
        Ok(dict)
    }
}

impl From<LabelDictionary> for RawDictionary {
    fn from(d: LabelDictionary) -> Self {
        Self {
            glyphs: d.glyphs,
            combinations: d.combinations,
            adjustments: d.adjustments,
        }
    }
}

impl LabelDictionary {
    /// Build from glyph entries; order is preserved and matters for
    /// classification.
    pub fn new(glyphs: Vec<GlyphEntry>) -> Result<Self, DictionaryError> {
        let mut seen = HashSet::new();
        for g in &glyphs {
            if !seen.insert(g.id) {
                return Err(DictionaryError::DuplicateId(g.id));
            }
            if g.glyph.trim().is_empty() {
                return Err(DictionaryError::EmptyGlyph(g.id));
            }
        }
        Ok(Self {
            glyphs,
            combinations: Vec::new(),
            adjustments: BTreeMap::new(),
        })
    }

    pub fn with_combination(mut self, entry: CombinationEntry) -> Result<Self, DictionaryError> {
        self.push_combination(entry)?;
        Ok(self)
    }

    pub fn with_adjustment(mut self, id: LabelId, adjustment: ModelAdjustment) -> Self {
        self.adjustments.insert(id, adjustment);
        self
    }

    fn push_combination(&mut self, entry: CombinationEntry) -> Result<(), DictionaryError> {
        if entry.pair().is_none() {
            return Err(DictionaryError::UnresolvedCombination { id: entry.id });
        }
        if self.combinations.iter().any(|c| c.id == entry.id) {
            return Err(DictionaryError::DuplicateId(entry.id));
        }
        self.combinations.push(entry);
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DictionaryError> {
        let raw: RawDictionary = serde_json::from_str(raw)?;
        Self::try_from(raw)
    }

    pub fn glyphs(&self) -> &[GlyphEntry] {
        &self.glyphs
    }

    pub fn combinations(&self) -> &[CombinationEntry] {
        &self.combinations
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// All glyphs concatenated in dictionary order.
    pub fn whitelist(&self) -> String {
        self.glyphs.iter().map(|g| g.glyph.as_str()).collect()
    }

    pub fn glyph(&self, id: LabelId) -> Option<&GlyphEntry> {
        self.glyphs.iter().find(|g| g.id == id)
    }

    /// Combination formed by `left` followed by `right`.
    pub fn combination(&self, left: LabelId, right: LabelId) -> Option<&CombinationEntry> {
        self.combinations
            .iter()
            .find(|c| c.pair() == Some((left, right)))
    }

    pub fn combination_id(&self, left: LabelId, right: LabelId) -> Option<LabelId> {
        self.combination(left, right).map(|c| c.id)
    }

    /// Model adjustment for a glyph or combination id; identity when unset.
    pub fn adjustment(&self, id: LabelId) -> ModelAdjustment {
        self.adjustments.get(&id).cloned().unwrap_or_default()
    }
}
