//! Core data model types for perceptest.
//!
//! These are the fundamental types the whole harness uses to represent
//! questions, their metadata vectors, subtypes, and reporting categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CorpusError;

/// Minimum number of elements in a question vector.
pub const MIN_VECTOR_LEN: usize = 11;

/// Index of the relational flag in a question vector.
pub const RELATIONAL_BIT: usize = 6;

/// Indices that select the subtype, in priority order.
pub const SUBTYPE_BITS: [usize; 3] = [8, 9, 10];

/// Fixed-layout 0/1 metadata vector attached to every question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct QuestionVector(Vec<u8>);

impl QuestionVector {
    /// Build a vector from raw bits, checking length and that every element is 0 or 1.
    pub fn new(bits: Vec<u8>) -> Result<Self, CorpusError> {
        if bits.len() < MIN_VECTOR_LEN {
            return Err(CorpusError::VectorTooShort {
                len: bits.len(),
                min: MIN_VECTOR_LEN,
            });
        }
        if let Some(index) = bits.iter().position(|&b| b > 1) {
            return Err(CorpusError::InvalidBit {
                index,
                value: i64::from(bits[index]),
            });
        }
        Ok(Self(bits))
    }

    /// Build a vector from signed integers, as found in JSON corpora.
    pub fn from_ints(values: &[i64]) -> Result<Self, CorpusError> {
        let bits = values
            .iter()
            .enumerate()
            .map(|(index, &value)| match value {
                0 | 1 => Ok(value as u8),
                _ => Err(CorpusError::InvalidBit { index, value }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(bits)
    }

    /// Parse a vector string made only of `0` and `1` characters.
    pub fn parse_bits(s: &str) -> Result<Self, CorpusError> {
        let bits = s
            .chars()
            .enumerate()
            .map(|(index, ch)| match ch {
                '0' => Ok(0),
                '1' => Ok(1),
                _ => Err(CorpusError::InvalidBitChar { index, ch }),
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Self::new(bits)
    }

    pub fn bits(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether bit 6 marks this as a relational question.
    pub fn is_relational(&self) -> bool {
        self.0[RELATIONAL_BIT] == 1
    }

    /// How many of the subtype bits (8, 9, 10) are set.
    pub fn subtype_bit_count(&self) -> usize {
        SUBTYPE_BITS.iter().filter(|&&i| self.0[i] == 1).count()
    }

    /// Derive the subtype. The lowest set index among 8, 9, 10 wins.
    pub fn subtype(&self) -> Option<Subtype> {
        let slot = SUBTYPE_BITS.iter().position(|&i| self.0[i] == 1)?;
        let subtype = match (self.is_relational(), slot) {
            (true, 0) => Subtype::Closest,
            (true, 1) => Subtype::Farthest,
            (true, _) => Subtype::Count,
            (false, 0) => Subtype::TopBottom,
            (false, 1) => Subtype::LeftRight,
            (false, _) => Subtype::Shape,
        };
        Some(subtype)
    }
}

impl TryFrom<Vec<u8>> for QuestionVector {
    type Error = CorpusError;

    fn try_from(bits: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(bits)
    }
}

impl From<QuestionVector> for Vec<u8> {
    fn from(vector: QuestionVector) -> Self {
        vector.0
    }
}

impl fmt::Display for QuestionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

/// Fine-grained question subtype derived from the question vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtype {
    Closest,
    /// Also spelled "furthest" in some corpora.
    #[serde(alias = "furthest")]
    Farthest,
    Count,
    TopBottom,
    LeftRight,
    Shape,
}

impl Subtype {
    pub const ALL: [Subtype; 6] = [
        Subtype::Closest,
        Subtype::Farthest,
        Subtype::Count,
        Subtype::TopBottom,
        Subtype::LeftRight,
        Subtype::Shape,
    ];

    pub fn is_relational(self) -> bool {
        matches!(self, Subtype::Closest | Subtype::Farthest | Subtype::Count)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Subtype::Closest => "closest",
            Subtype::Farthest => "farthest",
            Subtype::Count => "count",
            Subtype::TopBottom => "topbottom",
            Subtype::LeftRight => "leftright",
            Subtype::Shape => "shape",
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "closest" => Ok(Subtype::Closest),
            "farthest" | "furthest" => Ok(Subtype::Farthest),
            "count" => Ok(Subtype::Count),
            "topbottom" => Ok(Subtype::TopBottom),
            "leftright" => Ok(Subtype::LeftRight),
            "shape" => Ok(Subtype::Shape),
            other => Err(format!("unknown subtype: {other}")),
        }
    }
}

/// Reporting bucket for accuracy aggregation.
///
/// Declaration order is the fixed reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "shape")]
    Shape,
    #[serde(rename = "topbottom")]
    TopBottom,
    #[serde(rename = "leftright")]
    LeftRight,
    #[serde(rename = "closest")]
    Closest,
    #[serde(rename = "farthest", alias = "furthest")]
    Farthest,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "non-relational")]
    NonRelational,
    #[serde(rename = "relational")]
    Relational,
    #[serde(rename = "overall")]
    Overall,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Shape,
        Category::TopBottom,
        Category::LeftRight,
        Category::Closest,
        Category::Farthest,
        Category::Count,
        Category::NonRelational,
        Category::Relational,
        Category::Overall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Shape => "shape",
            Category::TopBottom => "topbottom",
            Category::LeftRight => "leftright",
            Category::Closest => "closest",
            Category::Farthest => "farthest",
            Category::Count => "count",
            Category::NonRelational => "non-relational",
            Category::Relational => "relational",
            Category::Overall => "overall",
        }
    }

    /// The relational/non-relational group bucket for a question.
    pub fn group(relational: bool) -> Self {
        if relational {
            Category::Relational
        } else {
            Category::NonRelational
        }
    }
}

impl From<Subtype> for Category {
    fn from(subtype: Subtype) -> Self {
        match subtype {
            Subtype::Closest => Category::Closest,
            Subtype::Farthest => Category::Farthest,
            Subtype::Count => Category::Count,
            Subtype::TopBottom => Category::TopBottom,
            Subtype::LeftRight => Category::LeftRight,
            Subtype::Shape => Category::Shape,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "non-relational" | "nonrelational" => Ok(Category::NonRelational),
            "relational" => Ok(Category::Relational),
            "overall" => Ok(Category::Overall),
            other => other
                .parse::<Subtype>()
                .map(Category::from)
                .map_err(|_| format!("unknown category: {other}")),
        }
    }
}

/// A single normalized question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    /// Path of the stimulus image.
    pub image_path: String,
    /// Text shown to the participant.
    pub question_text: String,
    /// Expected answer, normalized to a string.
    pub correct_answer: String,
    /// Metadata vector.
    pub question_vector: QuestionVector,
}

impl QuestionRecord {
    pub fn subtype(&self) -> Option<Subtype> {
        self.question_vector.subtype()
    }

    pub fn is_relational(&self) -> bool {
        self.question_vector.is_relational()
    }
}
