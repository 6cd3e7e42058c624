//! One handler per route. Each returns the raw reply text; the outbound
//! filter in the router runs afterwards.

mod admin;
mod content;
mod owner;
mod system;

use super::{HandlerError, ResponseRouter, Route};
use crate::classify::mood::Mood;
use crate::types::{Message, SenderRole};

impl ResponseRouter {
    pub(super) async fn dispatch(
        &mut self,
        msg: &Message,
        sender: &str,
        role: SenderRole,
        mood: Mood,
        route: &Route,
    ) -> Result<String, HandlerError> {
        match route {
            Route::Image => Ok(super::replies::IMAGE_RECEIVED.to_owned()),
            Route::Law(cmd) => Ok(self.handle_law(*cmd, sender)),
            Route::Ops(cmd) => self.handle_ops(*cmd).await,
            Route::Learning(cmd) => Ok(self.handle_learning(*cmd, sender)),
            Route::Admin(cmd) => self.handle_admin(cmd, sender, role).await,
            Route::System(cmd) => self.handle_system(cmd, sender, role).await,
            Route::Hybrid(m) => self.handle_hybrid(m, mood),
            Route::Learned(m) => self.handle_learned(m, mood).await,
            Route::LlmFallback => Ok(self.handle_fallback(msg.text.trim(), sender, role, mood).await),
        }
    }
}

/// Prefix an apology when the customer sounds upset.
fn with_mood(mood: Mood, text: String) -> String {
    if mood == Mood::Angry {
        format!("{}{text}", super::replies::ANGRY_PREFIX)
    } else {
        text
    }
}
