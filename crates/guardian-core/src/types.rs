use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// One named facial-action score from the blendshape model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCategory {
    /// Blendshape name, e.g. "browInnerUp" or "jaw_open".
    #[serde(alias = "categoryName")]
    pub name: String,
    /// Model confidence in [0, 1].
    pub score: f32,
}

impl ScoredCategory {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// All blendshape scores reported for a single tracked face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceBlendshapes {
    #[serde(default)]
    pub categories: Vec<ScoredCategory>,
}

/// An object reported by the external detector.
///
/// Only `class` and `score` are interpreted; `bbox` is carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub class: String,
    pub score: f32,
    /// [x, y, width, height] in source pixels.
    #[serde(default)]
    pub bbox: [f32; 4],
}

impl DetectedObject {
    pub fn new(class: impl Into<String>, score: f32) -> Self {
        Self {
            class: class.into(),
            score,
            bbox: [0.0; 4],
        }
    }
}

/// Discrete expression label derived from blendshape scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpressionLabel {
    #[serde(rename = "eyebrows raised")]
    EyebrowsRaised,
    #[serde(rename = "eyebrows furrowed")]
    EyebrowsFurrowed,
    #[serde(rename = "mouth open")]
    MouthOpen,
    #[serde(rename = "eyes closed")]
    EyesClosed,
    #[serde(rename = "left eye closed")]
    LeftEyeClosed,
    #[serde(rename = "right eye closed")]
    RightEyeClosed,
    #[serde(rename = "lip frown")]
    LipFrown,
    #[serde(rename = "neutral expression")]
    Neutral,
}

impl ExpressionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EyebrowsRaised => "eyebrows raised",
            Self::EyebrowsFurrowed => "eyebrows furrowed",
            Self::MouthOpen => "mouth open",
            Self::EyesClosed => "eyes closed",
            Self::LeftEyeClosed => "left eye closed",
            Self::RightEyeClosed => "right eye closed",
            Self::LipFrown => "lip frown",
            Self::Neutral => "neutral expression",
        }
    }
}

impl fmt::Display for ExpressionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion-ordered, duplicate-free set of labels for one face.
///
/// Never empty: building from zero labels yields `{neutral expression}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExpressionSet(Vec<ExpressionLabel>);

impl ExpressionSet {
    /// The `{neutral expression}` singleton.
    pub fn neutral() -> Self {
        Self(vec![ExpressionLabel::Neutral])
    }

    /// Collect labels, dropping duplicates and falling back to neutral when empty.
    pub fn from_labels(labels: impl IntoIterator<Item = ExpressionLabel>) -> Self {
        let mut out: Vec<ExpressionLabel> = Vec::new();
        for label in labels {
            if !out.contains(&label) {
                out.push(label);
            }
        }
        if out.is_empty() {
            Self::neutral()
        } else {
            Self(out)
        }
    }

    pub fn labels(&self) -> &[ExpressionLabel] {
        &self.0
    }

    pub fn contains(&self, label: ExpressionLabel) -> bool {
        self.0.contains(&label)
    }

    pub fn iter(&self) -> impl Iterator<Item = ExpressionLabel> + '_ {
        self.0.iter().copied()
    }

    /// Labels joined with ", " (e.g. "eyebrows raised, mouth open").
    pub fn describe(&self) -> String {
        join_labels(&self.0)
    }
}

impl<'de> Deserialize<'de> for ExpressionSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let labels = Vec::<ExpressionLabel>::deserialize(deserializer)?;
        Ok(Self::from_labels(labels))
    }
}

pub(crate) fn join_labels(labels: &[ExpressionLabel]) -> String {
    labels
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Mission mode selected in the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    Medical,
    Defense,
    #[default]
    Policing,
}

impl Mode {
    /// Case-insensitive parse; anything unrecognized is `Policing`.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "medical" => Self::Medical,
            "defense" | "defence" => Self::Defense,
            _ => Self::Policing,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medical => "MEDICAL",
            Self::Defense => "DEFENSE",
            Self::Policing => "POLICING",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lossy(s))
    }
}

impl From<String> for Mode {
    fn from(s: String) -> Self {
        Self::parse_lossy(&s)
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

/// One perception frame as delivered by the detector and landmark collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default, alias = "faceBlendshapes")]
    pub faces: Vec<FaceBlendshapes>,
}

impl Frame {
    /// Classify every face and fold the frame into a [`Scene`].
    pub fn scene(&self) -> Scene {
        Scene {
            objects: self.objects.clone(),
            faces: self.faces.iter().map(crate::expression::classify_face).collect(),
        }
    }
}

/// What the synthesizer knows about the current frame.
///
/// `faces` holds one label set per tracked face; an empty list means no
/// face is being tracked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub objects: Vec<DetectedObject>,
    pub faces: Vec<ExpressionSet>,
}

impl Scene {
    pub fn new(objects: Vec<DetectedObject>, faces: Vec<ExpressionSet>) -> Self {
        Self { objects, faces }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there are neither objects nor tracked faces.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.faces.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Union of labels across all faces, in first-seen order.
    pub fn expressions(&self) -> Vec<ExpressionLabel> {
        let mut out = Vec::new();
        for label in self.faces.iter().flat_map(|f| f.iter()) {
            if !out.contains(&label) {
                out.push(label);
            }
        }
        out
    }

    /// Number of objects whose class equals `class` (case-insensitive).
    pub fn count_class(&self, class: &str) -> usize {
        self.objects
            .iter()
            .filter(|o| o.class.eq_ignore_ascii_case(class))
            .count()
    }

    /// Per-class object counts in first-seen order, classes lowercased.
    pub fn class_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for obj in &self.objects {
            let class = obj.class.to_lowercase();
            match counts.iter_mut().find(|(c, _)| *c == class) {
                Some((_, n)) => *n += 1,
                None => counts.push((class, 1)),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_set_never_empty() {
        let set = ExpressionSet::from_labels(Vec::new());
        assert_eq!(set.labels(), &[ExpressionLabel::Neutral]);
        assert!(!set.labels().is_empty());
    }

    #[test]
    fn test_expression_set_dedup_keeps_order() {
        let set = ExpressionSet::from_labels([
            ExpressionLabel::MouthOpen,
            ExpressionLabel::EyebrowsRaised,
            ExpressionLabel::MouthOpen,
        ]);
        assert_eq!(
            set.labels(),
            &[ExpressionLabel::MouthOpen, ExpressionLabel::EyebrowsRaised]
        );
        assert_eq!(set.describe(), "mouth open, eyebrows raised");
    }

    #[test]
    fn test_mode_parse_lossy() {
        assert_eq!(Mode::parse_lossy("MEDICAL"), Mode::Medical);
        assert_eq!(Mode::parse_lossy(" defense "), Mode::Defense);
        assert_eq!(Mode::parse_lossy("Defence"), Mode::Defense);
        assert_eq!(Mode::parse_lossy("policing"), Mode::Policing);
        assert_eq!(Mode::parse_lossy("patrol"), Mode::Policing);
        assert_eq!(Mode::parse_lossy(""), Mode::Policing);
    }

    #[test]
    fn test_mode_serde_uses_upper_case() {
        let json = serde_json::to_string(&Mode::Defense).unwrap();
        assert_eq!(json, "\"DEFENSE\"");
        let mode: Mode = serde_json::from_str("\"medical\"").unwrap();
        assert_eq!(mode, Mode::Medical);
    }

    #[test]
    fn test_frame_accepts_mediapipe_field_names() {
        let json = r#"{
            "objects": [{"class": "person", "score": 0.91, "bbox": [1, 2, 3, 4]}],
            "faceBlendshapes": [
                {"categories": [{"index": 3, "categoryName": "jawOpen", "score": 0.6, "displayName": ""}]}
            ]
        }"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.objects[0].class, "person");
        assert_eq!(frame.objects[0].bbox, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(frame.faces[0].categories[0].name, "jawOpen");
    }

    #[test]
    fn test_frame_defaults_to_empty_lists() {
        let frame: Frame = serde_json::from_str("{}").unwrap();
        assert!(frame.objects.is_empty());
        assert!(frame.scene().is_empty());
    }

    #[test]
    fn test_scene_class_counts_first_seen_order() {
        let scene = Scene::new(
            vec![
                DetectedObject::new("person", 0.9),
                DetectedObject::new("cup", 0.7),
                DetectedObject::new("person", 0.8),
            ],
            Vec::new(),
        );
        assert_eq!(
            scene.class_counts(),
            vec![("person".to_string(), 2), ("cup".to_string(), 1)]
        );
        assert_eq!(scene.count_class("PERSON"), 2);
    }

    #[test]
    fn test_scene_class_counts_fold_case() {
        let scene = Scene::new(
            vec![
                DetectedObject::new("Person", 0.9),
                DetectedObject::new("person", 0.8),
                DetectedObject::new("CUP", 0.7),
            ],
            Vec::new(),
        );
        assert_eq!(
            scene.class_counts(),
            vec![("person".to_string(), 2), ("cup".to_string(), 1)]
        );
    }

    #[test]
    fn test_scene_expressions_union() {
        let scene = Scene::new(
            Vec::new(),
            vec![
                ExpressionSet::from_labels([ExpressionLabel::MouthOpen]),
                ExpressionSet::from_labels([ExpressionLabel::MouthOpen, ExpressionLabel::LipFrown]),
            ],
        );
        assert_eq!(
            scene.expressions(),
            vec![ExpressionLabel::MouthOpen, ExpressionLabel::LipFrown]
        );
    }
}
