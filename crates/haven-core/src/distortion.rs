//! Cognitive distortion detector (catastrophizing, mind reading, all-or-nothing).
//!
//! Pure keyword heuristic. At most one distortion per message: the sets are
//! scanned top-down and the first hit wins.

use crate::patterns::{contains_any, ALL_OR_NOTHING_TRIGGERS, CATASTROPHIZING_TRIGGERS, MIND_READING_TRIGGERS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distortion {
    Catastrophizing,
    MindReading,
    AllOrNothing,
}

impl Distortion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distortion::Catastrophizing => "catastrophizing",
            Distortion::MindReading => "mind_reading",
            Distortion::AllOrNothing => "all_or_nothing",
        }
    }

    /// Human-readable label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Distortion::Catastrophizing => "Catastrophizing",
            Distortion::MindReading => "Mind Reading",
            Distortion::AllOrNothing => "All-or-Nothing Thinking",
        }
    }
}

/// Detector output; `kind` is `Some` exactly when `detected` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DistortionVerdict {
    pub detected: bool,
    pub kind: Option<Distortion>,
}

impl DistortionVerdict {
    fn found(kind: Distortion) -> Self {
        Self {
            detected: true,
            kind: Some(kind),
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        self.kind.map(|k| k.label())
    }
}

const DISTORTION_RULES: &[(Distortion, &[&str])] = &[
    (Distortion::Catastrophizing, CATASTROPHIZING_TRIGGERS),
    (Distortion::MindReading, MIND_READING_TRIGGERS),
    (Distortion::AllOrNothing, ALL_OR_NOTHING_TRIGGERS),
];

/// Accepts raw text; case is folded here.
pub fn detect_distortion(text: &str) -> DistortionVerdict {
    let lower = text.to_lowercase();
    DISTORTION_RULES
        .iter()
        .find(|(_, triggers)| contains_any(&lower, triggers))
        .map(|(kind, _)| DistortionVerdict::found(*kind))
        .unwrap_or_default()
}
