/// Interaction / music overlay state.
///
/// Pure display: a "Press Z to interact" hint, short-lived feedback
/// messages, and the music on/off flag. Nothing here touches movement.

use tracing::info;

use super::Millis;

pub const FEEDBACK_MS: Millis = 1000;
pub const INTERACT_HINT: &str = "Press Z to interact";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FeedbackKind {
    Interacted,
    Music,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub text: &'static str,
    pub expires_at: Millis,
}

#[derive(Clone, Debug, Default)]
pub struct PromptOverlay {
    hint_visible: bool,
    music_on: bool,
    feedback: Option<Feedback>,
}

impl PromptOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interact(&mut self, now: Millis) {
        info!("interaction triggered");
        self.feedback = Some(Feedback {
            kind: FeedbackKind::Interacted,
            text: "Interacted!",
            expires_at: now + FEEDBACK_MS,
        });
    }

    /// Flip the music flag; returns the new state.
    pub fn toggle_music(&mut self, now: Millis) -> bool {
        self.music_on = !self.music_on;
        info!(on = self.music_on, "music toggled");
        self.feedback = Some(Feedback {
            kind: FeedbackKind::Music,
            text: if self.music_on { "Music: ON" } else { "Music: OFF" },
            expires_at: now + FEEDBACK_MS,
        });
        self.music_on
    }

    pub fn expire(&mut self, now: Millis) {
        if self.feedback.as_ref().is_some_and(|f| now >= f.expires_at) {
            self.feedback = None;
        }
    }

    pub fn show_hint(&mut self, visible: bool) {
        self.hint_visible = visible;
    }

    pub fn hint(&self) -> Option<&'static str> {
        self.hint_visible.then_some(INTERACT_HINT)
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn music_on(&self) -> bool {
        self.music_on
    }
}
