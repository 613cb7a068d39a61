//! Interactive session: frames and questions interleaved on one line stream.

use guardian_core::{ChatBackend, Frame, Mode, Responder, Scene};

/// Outcome of handling one input line.
#[derive(Debug, PartialEq)]
pub enum Step {
    /// Answer to a question, for stdout.
    Reply(String),
    /// Status note, for stderr.
    Note(String),
    Quit,
    Idle,
}

pub struct Session<C> {
    responder: Responder<C>,
    scene: Scene,
    mode: Mode,
    frames_seen: u64,
}

impl<C: ChatBackend> Session<C> {
    pub fn new(responder: Responder<C>, mode: Mode) -> Self {
        Self {
            responder,
            scene: Scene::empty(),
            mode,
            frames_seen: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// A line starting with `{` replaces the current frame, `/mode NAME`
    /// switches mode, `/quit` ends, anything else is a question.
    pub async fn handle_line(&mut self, line: &str) -> Step {
        let line = line.trim();
        if line.is_empty() {
            return Step::Idle;
        }

        if line.starts_with('{') {
            return match serde_json::from_str::<Frame>(line) {
                Ok(frame) => {
                    self.scene = frame.scene();
                    self.frames_seen += 1;
                    tracing::debug!(
                        frame = self.frames_seen,
                        objects = self.scene.objects.len(),
                        faces = self.scene.face_count(),
                        "frame updated"
                    );
                    Step::Idle
                }
                Err(err) => {
                    tracing::warn!(error = %err, "discarding malformed frame");
                    Step::Note(format!("invalid frame: {err}"))
                }
            };
        }

        if let Some(command) = line.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            return match (parts.next(), parts.next()) {
                (Some("quit" | "exit"), _) => Step::Quit,
                (Some("mode"), Some(name)) => {
                    self.mode = Mode::parse_lossy(name);
                    tracing::info!(mode = %self.mode, "mode switched");
                    Step::Note(format!("mode: {}", self.mode))
                }
                (Some("mode"), None) => Step::Note(format!("mode: {}", self.mode)),
                _ => Step::Note(format!("unknown command: /{command}")),
            };
        }

        Step::Reply(self.responder.respond(line, &self.scene, self.mode).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_core::{synthesize, ExpressionLabel, NoChat};

    fn session() -> Session<NoChat> {
        Session::new(Responder::local(), Mode::Policing)
    }

    #[tokio::test]
    async fn test_question_without_frame() {
        let mut s = session();
        let step = s.handle_line("what do you see").await;
        assert_eq!(
            step,
            Step::Reply(synthesize("what do you see", &Scene::empty(), Mode::Policing))
        );
    }

    #[tokio::test]
    async fn test_frame_then_question() {
        let mut s = session();
        let frame = r#"{"objects":[{"class":"knife","score":0.8}],"faces":[{"categories":[{"categoryName":"jawOpen","score":0.7}]}]}"#;
        assert_eq!(s.handle_line(frame).await, Step::Idle);
        assert_eq!(s.scene().objects.len(), 1);
        assert!(s.scene().faces[0].contains(ExpressionLabel::MouthOpen));

        let Step::Reply(reply) = s.handle_line("any threats?").await else {
            panic!("expected a reply");
        };
        assert!(reply.contains("knife"));
    }

    #[tokio::test]
    async fn test_malformed_frame_keeps_previous_scene() {
        let mut s = session();
        s.handle_line(r#"{"objects":[{"class":"cup","score":0.5}]}"#).await;
        let step = s.handle_line("{not json").await;
        assert!(matches!(step, Step::Note(ref n) if n.starts_with("invalid frame")));
        assert_eq!(s.scene().objects[0].class, "cup");
    }

    #[tokio::test]
    async fn test_mode_and_quit_commands() {
        let mut s = session();
        assert_eq!(s.handle_line("/mode medical").await, Step::Note("mode: MEDICAL".into()));
        assert_eq!(s.mode(), Mode::Medical);
        assert_eq!(s.handle_line("/mode").await, Step::Note("mode: MEDICAL".into()));
        assert!(matches!(s.handle_line("/dance").await, Step::Note(_)));
        assert_eq!(s.handle_line("   ").await, Step::Idle);
        assert_eq!(s.handle_line("/quit").await, Step::Quit);
    }
}
