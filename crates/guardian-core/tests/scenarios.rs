//! End-to-end scenarios: JSON perception frames through classification and
//! response synthesis, with and without a remote backend.

use guardian_core::{
    classify, synthesize, ChatBackend, DelegationError, ExpressionLabel, ExpressionSet, Frame,
    Mode, Responder, Scene, ScoredCategory,
};

struct Unreachable;

impl ChatBackend for Unreachable {
    async fn complete(&self, _prompt: &str) -> Result<String, DelegationError> {
        Err(DelegationError::Transport("dns lookup failed".into()))
    }
}

fn frame(json: &str) -> Frame {
    serde_json::from_str(json).expect("valid frame json")
}

#[test]
fn classify_is_never_empty() {
    let inputs: Vec<Vec<ScoredCategory>> = vec![
        vec![],
        vec![ScoredCategory::new("cheekSquintLeft", 0.9)],
        vec![ScoredCategory::new("jawOpen", 0.05)],
        vec![ScoredCategory::new("jawOpen", 0.95)],
        vec![
            ScoredCategory::new("eyeBlinkLeft", 0.5),
            ScoredCategory::new("eyeBlinkRight", 0.5),
            ScoredCategory::new("mouthFrownRight", 0.5),
        ],
    ];
    for categories in inputs {
        assert!(!classify(&categories).labels().is_empty());
    }
}

#[test]
fn frame_scene_classifies_each_face() {
    let f = frame(
        r#"{
            "objects": [],
            "faces": [
                {"categories": [
                    {"categoryName": "browInnerUp", "score": 0.42},
                    {"categoryName": "jawOpen", "score": 0.55}
                ]},
                {"categories": [
                    {"categoryName": "eyeBlinkLeft", "score": 0.25},
                    {"categoryName": "eyeBlinkRight", "score": 0.25}
                ]}
            ]
        }"#,
    );
    let scene = f.scene();
    assert_eq!(scene.face_count(), 2);
    assert_eq!(
        scene.faces[0].labels(),
        &[ExpressionLabel::EyebrowsRaised, ExpressionLabel::MouthOpen]
    );
    assert_eq!(scene.faces[1].labels(), &[ExpressionLabel::EyesClosed]);
}

#[test]
fn empty_frame_describes_no_detections() {
    let scene = frame("{}").scene();
    let out = synthesize("what do you see", &scene, Mode::Policing);
    assert!(out.starts_with("I don't detect any objects or faces"), "{out}");
    assert!(out.contains("well lit"));
}

#[test]
fn two_people_policing_description() {
    let scene = frame(
        r#"{"objects": [
            {"class": "person", "score": 0.9, "bbox": [0, 0, 10, 10]},
            {"class": "person", "score": 0.8, "bbox": [20, 0, 10, 10]}
        ]}"#,
    )
    .scene();
    let out = synthesize("describe", &scene, Mode::parse_lossy("POLICING"));
    assert!(out.contains("2 persons"), "{out}");
    assert!(out.contains("Policing mode"));
}

#[test]
fn knife_in_defense_mode_raises_alert() {
    let scene = frame(r#"{"objects": [{"class": "knife", "score": 0.77, "bbox": [1, 1, 5, 5]}]}"#)
        .scene();
    let out = synthesize("any threats", &scene, Mode::Defense);
    assert!(out.contains("knife"));
    assert!(out.contains("security protocol"));
}

#[test]
fn threat_outranks_person_mention() {
    let scene = Scene::new(Vec::new(), vec![ExpressionSet::neutral()]);
    let out = synthesize("is this person a threat", &scene, Mode::Policing);
    assert_eq!(out, synthesize("threat", &scene, Mode::Policing));
    assert!(!out.contains("Current expression"));
}

#[tokio::test]
async fn failing_backend_matches_local_output() {
    let scene = frame(
        r#"{
            "objects": [{"class": "bottle", "score": 0.6}, {"class": "person", "score": 0.9}],
            "faces": [{"categories": [{"categoryName": "mouthFrownLeft", "score": 0.4}]}]
        }"#,
    )
    .scene();

    let questions = ["what do you see", "how is their face", "medical", "help", "hi"];
    for mode in [Mode::Medical, Mode::Defense, Mode::Policing] {
        for q in questions {
            let local = Responder::local().respond(q, &scene, mode).await;
            let remote = Responder::with_chat(Unreachable).respond(q, &scene, mode).await;
            assert_eq!(local, remote);
        }
    }
}
