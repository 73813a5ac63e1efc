// ============================================================
// Layer 3 — Sentiment Label Types
// ============================================================
// Every utterance carries one continuous valence score in
// roughly [-3, 3]. The two auxiliary tasks are derived from it:
//
//   polarity  = sign of the score (0 counts as positive)
//   intensity = bucket of |score|:
//
//     |s|:  0 ──── 0.5 ──── 1.5 ──── 2.5 ──────▶
//           Neutral   Weak    Medium   Strong
//
// Each boundary belongs to the bucket above it.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower edges of the Weak, Medium and Strong buckets.
pub const INTENSITY_BOUNDARIES: [f32; 3] = [0.5, 1.5, 2.5];

// ─── Polarity ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Negative,
    Positive,
}

impl Polarity {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.0 { Polarity::Positive } else { Polarity::Negative }
    }

    /// Decision rule for a predicted probability of being positive.
    pub fn from_probability(p: f32) -> Self {
        if p >= 0.5 { Polarity::Positive } else { Polarity::Negative }
    }

    /// Binary target: 1 for positive, 0 for negative.
    pub fn label(self) -> u8 {
        match self {
            Polarity::Negative => 0,
            Polarity::Positive => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Polarity::Negative => "Negative",
            Polarity::Positive => "Positive",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Intensity ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intensity {
    Neutral,
    Weak,
    Medium,
    Strong,
}

impl Intensity {
    pub const COUNT: usize = 4;

    pub fn from_score(score: f32) -> Self {
        let magnitude = score.abs();
        if magnitude >= INTENSITY_BOUNDARIES[2] {
            Intensity::Strong
        } else if magnitude >= INTENSITY_BOUNDARIES[1] {
            Intensity::Medium
        } else if magnitude >= INTENSITY_BOUNDARIES[0] {
            Intensity::Weak
        } else {
            Intensity::Neutral
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Intensity::Neutral),
            1 => Some(Intensity::Weak),
            2 => Some(Intensity::Medium),
            3 => Some(Intensity::Strong),
            _ => None,
        }
    }

    /// Most probable class of a predicted distribution.
    /// Ties resolve to the lower class, like numpy's argmax.
    pub fn from_distribution(probs: &[f32; Self::COUNT]) -> Self {
        let mut best = 0;
        for (i, &p) in probs.iter().enumerate().skip(1) {
            if p > probs[best] {
                best = i;
            }
        }
        // best < COUNT by construction
        Self::from_index(best).unwrap_or(Intensity::Neutral)
    }

    pub fn one_hot(self) -> [f32; Self::COUNT] {
        let mut v = [0.0; Self::COUNT];
        v[self.index()] = 1.0;
        v
    }

    pub fn name(self) -> &'static str {
        match self {
            Intensity::Neutral => "Neutral",
            Intensity::Weak    => "Weak",
            Intensity::Medium  => "Medium",
            Intensity::Strong  => "Strong",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── SentimentLabels ──────────────────────────────────────────────────────────
/// The three targets of one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentLabels {
    pub valence:   f32,
    pub polarity:  Polarity,
    pub intensity: Intensity,
}

impl SentimentLabels {
    pub fn from_score(score: f32) -> Self {
        Self {
            valence:   score,
            polarity:  Polarity::from_score(score),
            intensity: Intensity::from_score(score),
        }
    }
}
