//! guardian-core — Perception glue for the Guardian X assistant.
//!
//! Turns blendshape scores into discrete expression labels and turns
//! (question, detections, expressions, mission mode) into a plain-text
//! answer, either by delegating to a remote chat backend or by local
//! templates. Performs no I/O of its own apart from the delegated call.

pub mod delegate;
pub mod expression;
pub mod respond;
pub mod types;

pub use delegate::{
    build_prompt, sanitize_reply, ChatBackend, DelegationError, NoChat, Responder,
    DEFAULT_CHAT_TIMEOUT,
};
pub use expression::{classify, classify_face, FamilyScores};
pub use respond::{synthesize, vision_context, Intent};
pub use types::{
    DetectedObject, ExpressionLabel, ExpressionSet, FaceBlendshapes, Frame, Mode, Scene,
    ScoredCategory,
};
