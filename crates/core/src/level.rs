//! CEFR proficiency levels and the guideline text sent to the model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::GradedError;

/// A Common European Framework of Reference proficiency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// All levels, easiest first.
    pub const ALL: [CefrLevel; 6] =
        [CefrLevel::A1, CefrLevel::A2, CefrLevel::B1, CefrLevel::B2, CefrLevel::C1, CefrLevel::C2];

    /// Short code such as `"B1"`.
    pub fn code(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }

    /// Human-readable band name.
    pub fn label(self) -> &'static str {
        match self {
            CefrLevel::A1 => "Beginner",
            CefrLevel::A2 => "Elementary",
            CefrLevel::B1 => "Intermediate",
            CefrLevel::B2 => "Upper Intermediate",
            CefrLevel::C1 => "Advanced",
            CefrLevel::C2 => "Proficient",
        }
    }

    /// Writing guideline for this level, embedded verbatim in prompts.
    pub fn guideline(self) -> &'static str {
        match self {
            CefrLevel::A1 => {
                "Use only the most common everyday words. Write very short, simple sentences in the present tense. \
                 Avoid idioms, phrasal verbs and subordinate clauses."
            }
            CefrLevel::A2 => {
                "Use common, high-frequency vocabulary. Keep sentences short and simple; basic past and future \
                 tenses are fine. Link ideas with simple connectors such as and, but and because."
            }
            CefrLevel::B1 => {
                "Use clear, standard vocabulary on familiar topics. Sentences may combine two clauses. Explain or \
                 replace uncommon words and avoid dense idiomatic language."
            }
            CefrLevel::B2 => {
                "Use a broad general vocabulary and some topic-specific terms. Complex sentences are fine when they \
                 stay clear. Keep idioms to common ones."
            }
            CefrLevel::C1 => {
                "Use a wide, precise vocabulary including less common words and idiomatic expressions. Varied and \
                 complex sentence structures are appropriate."
            }
            CefrLevel::C2 => {
                "Use sophisticated, nuanced vocabulary and fully native-like structures. Subtle distinctions of \
                 meaning, idioms and stylistic variation are all appropriate."
            }
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CefrLevel {
    type Err = GradedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            _ => Err(GradedError::InvalidLevel(s.to_string())),
        }
    }
}
