use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use devfront_core::{ActorForm, ActorId, Result};
use devfront_protocol::{ActorChannel, ActorSpec, Front, FrontBase, FrontClass};
use serde_json::{json, Value};
use tracing::debug;

use crate::node::NodeRef;

pub static CUSTOM_HIGHLIGHTER_SPEC: ActorSpec =
    ActorSpec::new("customhighlighter", &["release", "show", "hide", "finalize"], &[]);

/// Front for a custom (non box-model) highlighter such as the CSS grid or
/// rulers highlighter. Tracks whether it was last shown or hidden.
pub struct CustomHighlighterFront {
    base: FrontBase,
    is_shown: AtomicBool,
}

impl CustomHighlighterFront {
    pub fn is_shown(&self) -> bool {
        self.is_shown.load(Ordering::SeqCst)
    }

    /// Returns the actor's `value` (whether anything was drawn) when it
    /// sends one.
    pub async fn show(&self, node: &NodeRef, options: Value) -> Result<Option<bool>> {
        self.is_shown.store(true, Ordering::SeqCst);
        let reply = self
            .base
            .request("show", json!({ "node": node.wire_id(), "options": options }))
            .await?;
        Ok(reply.get("value").and_then(Value::as_bool))
    }

    pub async fn hide(&self) -> Result<()> {
        self.is_shown.store(false, Ordering::SeqCst);
        self.base.request("hide", Value::Null).await?;
        Ok(())
    }

    /// Tear down the highlighter's remote resources. The actor does not reply.
    pub async fn finalize(&self) -> Result<()> {
        self.base.send_oneway("finalize", Value::Null).await
    }

    /// Destroy the remote actor. The front is unusable afterwards and should
    /// be released from the client.
    pub async fn release(&self) -> Result<()> {
        debug!(actor = %self.base.actor_id(), "releasing custom highlighter");
        self.base.request("release", Value::Null).await?;
        Ok(())
    }
}

impl Front for CustomHighlighterFront {
    fn spec(&self) -> &'static ActorSpec {
        &CUSTOM_HIGHLIGHTER_SPEC
    }

    fn actor_id(&self) -> ActorId {
        self.base.actor_id()
    }

    fn apply_form(&self, form: ActorForm) {
        self.base.set_form(form);
    }

    fn handle_event(&self, event: &str, _packet: Value) {
        debug!(actor = %self.base.actor_id(), event, "custom highlighter has no events, ignoring");
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl FrontClass for CustomHighlighterFront {
    fn actor_spec() -> &'static ActorSpec {
        &CUSTOM_HIGHLIGHTER_SPEC
    }

    fn new(channel: Arc<dyn ActorChannel>, form: ActorForm) -> Self {
        Self {
            base: FrontBase::new(channel, form),
            is_shown: AtomicBool::new(false),
        }
    }
}
