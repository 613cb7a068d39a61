//! Local response synthesis.
//!
//! The question text is routed to exactly one intent by ordered keyword
//! groups (first match wins), then answered from mode-indexed templates
//! filled in from the current [`Scene`]. Pure string logic; cannot fail.

use crate::types::{join_labels, Mode, Scene};

const THREAT_CLASSES: [&str; 2] = ["knife", "scissors"];
const MEDICAL_CLASSES: [&str; 5] = ["bottle", "cup", "scissors", "syringe", "toothbrush"];
const PERSON_CLASS: &str = "person";
const UNATTENDED_CLASS: &str = "backpack";

const NO_DETECTIONS: &str = "I don't detect any objects or faces right now. \
    Please check that the camera is active and the area is well lit.";
const FACE_STANDBY: &str =
    "Facial analysis is ready and will activate as soon as a face is in view.";
const CAMERA_PROMPT: &str = "Please activate the camera so I can analyze your surroundings.";
const SYSTEMS_NOMINAL: &str = "All systems nominal.";

/// Which template family answers a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Vision,
    Face,
    Threat,
    Medical,
    Capabilities,
    Contextual,
}

/// Keyword groups in priority order. Keys match whole words; a trailing `*`
/// matches any word starting with the stem, and multi-word keys match
/// consecutive words. A bare "person" is not a face keyword.
const INTENT_PATTERNS: [(Intent, &[&str]); 5] = [
    (
        Intent::Vision,
        &[
            "what do you see",
            "what can you see",
            "describ*",
            "look",
            "looking",
            "see",
            "vision",
            "scan*",
            "surroundings",
        ],
    ),
    (
        Intent::Face,
        &["face*", "facial", "expression*", "emotion*", "mood*", "feel*", "smil*", "frown*"],
    ),
    (
        Intent::Threat,
        &["threat*", "danger*", "security", "weapon*", "risk*", "suspicious", "safe*"],
    ),
    (
        Intent::Medical,
        &["medic*", "health*", "patient*", "injur*", "vital*", "first aid", "hurt*"],
    ),
    (
        Intent::Capabilities,
        &["help*", "what can you do", "capabilit*", "feature*", "abilit*", "command*"],
    ),
];

impl Intent {
    /// Route a question to the first matching keyword group.
    pub fn detect(text: &str) -> Self {
        let folded = text.to_lowercase();
        let words: Vec<&str> = folded
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();
        INTENT_PATTERNS
            .iter()
            .find(|(_, keys)| keys.iter().any(|k| key_matches(&words, k)))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::Contextual)
    }
}

fn key_matches(words: &[&str], key: &str) -> bool {
    let parts: Vec<&str> = key.split(' ').collect();
    words.windows(parts.len()).any(|window| {
        window.iter().zip(&parts).all(|(word, part)| match part.strip_suffix('*') {
            Some(stem) => word.starts_with(stem),
            None => word == part,
        })
    })
}

/// Answer a question from local templates only.
pub fn synthesize(text: &str, scene: &Scene, mode: Mode) -> String {
    let intent = Intent::detect(text);
    tracing::debug!(?intent, %mode, objects = scene.objects.len(), faces = scene.face_count(), "local synthesis");
    match intent {
        Intent::Vision => vision_response(scene, mode),
        Intent::Face => face_response(scene, mode),
        Intent::Threat => threat_response(scene),
        Intent::Medical => medical_response(scene, mode),
        Intent::Capabilities => capabilities_response(scene, mode),
        Intent::Contextual => contextual_response(scene),
    }
}

/// One-line summary of the scene, embedded in delegation prompts.
pub fn vision_context(scene: &Scene) -> String {
    if scene.is_empty() {
        return "No detections.".to_string();
    }
    let objects = if scene.objects.is_empty() {
        "none".to_string()
    } else {
        enumerate_objects(scene)
    };
    let faces = match scene.face_count() {
        0 => "none".to_string(),
        n => format!("{n} ({})", join_labels(&scene.expressions())),
    };
    format!("Objects: {objects}. Faces: {faces}.")
}

fn vision_response(scene: &Scene, mode: Mode) -> String {
    if scene.is_empty() {
        return NO_DETECTIONS.to_string();
    }

    let mut out = if scene.objects.is_empty() {
        "I don't see any objects right now.".to_string()
    } else {
        format!("I can see {}.", enumerate_objects(scene))
    };

    let expressions = scene.expressions();
    if !expressions.is_empty() {
        out.push_str(&format!(
            " Facial tracking shows {}.",
            join_labels(&expressions)
        ));
    }

    out.push(' ');
    out.push_str(mode_status(mode));
    out.push(' ');
    out.push_str(SYSTEMS_NOMINAL);
    out
}

fn face_response(scene: &Scene, mode: Mode) -> String {
    if scene.faces.is_empty() {
        return FACE_STANDBY.to_string();
    }
    format!(
        "Tracking {} with {} detected. Current expression: {}. {}",
        count_noun(scene.face_count(), "face"),
        people(scene.count_class(PERSON_CLASS)),
        join_labels(&scene.expressions()),
        face_analysis(mode),
    )
}

fn threat_response(scene: &Scene) -> String {
    let threats = unique_classes(scene, &THREAT_CLASSES);
    let people_count = scene.count_class(PERSON_CLASS);
    let unattended = if people_count == 0 {
        scene.count_class(UNATTENDED_CLASS)
    } else {
        0
    };

    if !threats.is_empty() {
        format!(
            "ALERT: potential threat detected: {}. {} in view. \
             Recommend you activate security protocol immediately.",
            threats.join(", "),
            people(people_count),
        )
    } else if unattended > 0 {
        format!(
            "Caution: monitoring {} with no people nearby.",
            count_noun(unattended, "unattended item"),
        )
    } else {
        format!(
            "Low risk. {} tracked, no threats identified. {SYSTEMS_NOMINAL}",
            people(people_count),
        )
    }
}

fn medical_response(scene: &Scene, mode: Mode) -> String {
    let items = scene
        .objects
        .iter()
        .filter(|o| is_one_of(&o.class, &MEDICAL_CLASSES))
        .count();
    let people_count = scene.count_class(PERSON_CLASS);

    let mut out = if items > 0 {
        format!(
            "Medical scan: {} detected ({}) and {} in view.",
            count_noun(items, "medical item"),
            unique_classes(scene, &MEDICAL_CLASSES).join(", "),
            people(people_count),
        )
    } else {
        format!(
            "Medical scan: no medical items detected, {} in view.",
            people(people_count)
        )
    };

    if mode != Mode::Medical {
        out.push_str(" Switch to MEDICAL mode for patient-focused monitoring.");
    }
    out
}

fn capabilities_response(scene: &Scene, mode: Mode) -> String {
    let status = if scene.is_empty() {
        "Detection is currently inactive, activate the camera to begin."
    } else {
        "Detection is currently active."
    };
    format!(
        "Guardian X is running in {mode} mode. I can detect and count objects, \
         track facial expressions, assess threats, recognize medical supplies \
         and answer by voice. {status}"
    )
}

fn contextual_response(scene: &Scene) -> String {
    if scene.is_empty() {
        return CAMERA_PROMPT.to_string();
    }
    format!(
        "I'm currently tracking {} and {}. Could you clarify what you'd like to know? \
         You can ask what I see, about threats or about medical items.",
        count_noun(scene.objects.len(), "object"),
        count_noun(scene.face_count(), "face"),
    )
}

fn mode_status(mode: Mode) -> &'static str {
    match mode {
        Mode::Medical => "Medical mode: monitoring for patient distress and medical equipment.",
        Mode::Defense => "Defense mode: perimeter watch active, tracking all contacts.",
        Mode::Policing => "Policing mode: monitoring the scene for public safety concerns.",
    }
}

fn face_analysis(mode: Mode) -> &'static str {
    match mode {
        Mode::Medical => "Watching for signs of pain or distress.",
        Mode::Defense => "Reading behavioral cues for hostile intent.",
        Mode::Policing => "Assessing demeanor for signs of agitation.",
    }
}

/// "2 persons, 1 cup and 1 knife", classes in first-seen order.
fn enumerate_objects(scene: &Scene) -> String {
    let parts: Vec<String> = scene
        .class_counts()
        .into_iter()
        .map(|(class, n)| count_noun(n, &class))
        .collect();
    join_with_and(&parts)
}

fn count_noun(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn people(n: usize) -> String {
    if n == 1 {
        "1 person".to_string()
    } else {
        format!("{n} people")
    }
}

fn join_with_and(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn is_one_of(class: &str, set: &[&str]) -> bool {
    set.iter().any(|c| class.eq_ignore_ascii_case(c))
}

fn unique_classes(scene: &Scene, set: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for obj in scene.objects.iter().filter(|o| is_one_of(&o.class, set)) {
        let class = obj.class.to_lowercase();
        if !out.contains(&class) {
            out.push(class);
        }
    }
    out
}
