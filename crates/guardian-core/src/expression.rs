//! Rule-based expression classifier.
//!
//! Folds per-face blendshape scores into six action families (max, not sum),
//! then thresholds each family into a discrete label. Two tiers: a global
//! floor drops sensor noise before aggregation, per-label thresholds require
//! a confident signal before a label is surfaced.

use crate::types::{ExpressionLabel, ExpressionSet, FaceBlendshapes, ScoredCategory};

// --- Named constants ---
const DETECTION_FLOOR: f32 = 0.10;
const BROW_RAISE_THRESHOLD: f32 = 0.25;
const BROW_LOWER_THRESHOLD: f32 = 0.25;
const MOUTH_OPEN_THRESHOLD: f32 = 0.30;
const EYE_CLOSED_THRESHOLD: f32 = 0.20;
const LIP_FROWN_THRESHOLD: f32 = 0.20;

/// Action families, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    BrowRaise,
    BrowLower,
    JawOpen,
    EyeClosedLeft,
    EyeClosedRight,
    MouthFrown,
}

/// Substring keys per family, matched against the case-folded category name.
/// Covers snake_case names and MediaPipe camelCase names after folding.
const FAMILY_KEYS: [(Family, &[&str]); 6] = [
    (
        Family::BrowRaise,
        &["brow_raise", "brow_up", "brow_outer_up", "browinnerup", "browouterup"],
    ),
    (Family::BrowLower, &["brow_lower", "brow_down", "browdown"]),
    (Family::JawOpen, &["jaw_open", "jawopen", "mouth_open"]),
    (
        Family::EyeClosedLeft,
        &["eye_closed_left", "eye_blink_left", "left_eye_closed", "eyeblinkleft"],
    ),
    (
        Family::EyeClosedRight,
        &["eye_closed_right", "eye_blink_right", "right_eye_closed", "eyeblinkright"],
    ),
    (Family::MouthFrown, &["mouth_frown", "mouthfrown", "lip_frown"]),
];

fn family_of(folded_name: &str) -> Option<Family> {
    FAMILY_KEYS
        .iter()
        .find(|(_, keys)| keys.iter().any(|k| folded_name.contains(k)))
        .map(|(family, _)| *family)
}

/// Peak score per action family for one face.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FamilyScores {
    pub brow_raise: f32,
    pub brow_lower: f32,
    pub mouth_open: f32,
    pub eye_close_left: f32,
    pub eye_close_right: f32,
    pub lip_frown: f32,
}

impl FamilyScores {
    /// Accumulate the per-family maximum over all categories above the floor.
    pub fn accumulate(categories: &[ScoredCategory]) -> Self {
        let mut scores = Self::default();
        for category in categories {
            if category.score.is_nan() || category.score < DETECTION_FLOOR {
                continue;
            }
            let folded = category.name.to_lowercase();
            let Some(family) = family_of(&folded) else {
                continue;
            };
            let slot = scores.slot_mut(family);
            *slot = slot.max(category.score);
        }
        scores
    }

    fn slot_mut(&mut self, family: Family) -> &mut f32 {
        match family {
            Family::BrowRaise => &mut self.brow_raise,
            Family::BrowLower => &mut self.brow_lower,
            Family::JawOpen => &mut self.mouth_open,
            Family::EyeClosedLeft => &mut self.eye_close_left,
            Family::EyeClosedRight => &mut self.eye_close_right,
            Family::MouthFrown => &mut self.lip_frown,
        }
    }

    /// Apply per-label thresholds. Always returns at least one label.
    pub fn labels(&self) -> ExpressionSet {
        let mut labels = Vec::with_capacity(4);

        if self.brow_raise > BROW_RAISE_THRESHOLD {
            labels.push(ExpressionLabel::EyebrowsRaised);
        }
        if self.brow_lower > BROW_LOWER_THRESHOLD {
            labels.push(ExpressionLabel::EyebrowsFurrowed);
        }
        if self.mouth_open > MOUTH_OPEN_THRESHOLD {
            labels.push(ExpressionLabel::MouthOpen);
        }

        let left = self.eye_close_left > EYE_CLOSED_THRESHOLD;
        let right = self.eye_close_right > EYE_CLOSED_THRESHOLD;
        match (left, right) {
            (true, true) => labels.push(ExpressionLabel::EyesClosed),
            (true, false) => labels.push(ExpressionLabel::LeftEyeClosed),
            (false, true) => labels.push(ExpressionLabel::RightEyeClosed),
            (false, false) => {}
        }

        if self.lip_frown > LIP_FROWN_THRESHOLD {
            labels.push(ExpressionLabel::LipFrown);
        }

        ExpressionSet::from_labels(labels)
    }
}

/// Classify one face's blendshape categories into expression labels.
pub fn classify(categories: &[ScoredCategory]) -> ExpressionSet {
    let scores = FamilyScores::accumulate(categories);
    let labels = scores.labels();
    tracing::debug!(
        categories = categories.len(),
        ?scores,
        labels = %labels.describe(),
        "classified face"
    );
    labels
}

/// Convenience wrapper over [`classify`] for a whole face record.
pub fn classify_face(face: &FaceBlendshapes) -> ExpressionSet {
    classify(&face.categories)
}
