//! Client-side proxies for remote actors.

use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock};

use devfront_core::{ActorForm, ActorId, Result, Traits};
use serde_json::Value;
use tracing::debug;

use crate::spec::ActorSpec;
use crate::ActorChannel;

/// A live proxy for one remote actor.
pub trait Front: Send + Sync + 'static {
    fn spec(&self) -> &'static ActorSpec;

    fn actor_id(&self) -> ActorId;

    /// Replace the cached form. Synchronous, total, never emits events.
    fn apply_form(&self, form: ActorForm);

    /// Called by the client for packets pushed by the remote actor.
    fn handle_event(&self, event: &str, packet: Value);

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A front type the registry can construct.
pub trait FrontClass: Front + Sized {
    fn actor_spec() -> &'static ActorSpec;

    /// Store the handles; must not talk to the remote side.
    fn new(channel: Arc<dyn ActorChannel>, form: ActorForm) -> Self;
}

pub fn downcast_front<F: Front>(front: Arc<dyn Front>) -> Option<Arc<F>> {
    front.as_any().downcast::<F>().ok()
}

/// The part every front shares: the channel it talks through and the cached
/// actor id and traits from its latest form.
pub struct FrontBase {
    channel: Arc<dyn ActorChannel>,
    form: RwLock<CachedForm>,
}

#[derive(Default)]
struct CachedForm {
    actor: ActorId,
    traits: Traits,
}

impl FrontBase {
    pub fn new(channel: Arc<dyn ActorChannel>, form: ActorForm) -> Self {
        let base = Self {
            channel,
            form: RwLock::new(CachedForm::default()),
        };
        base.set_form(form);
        base
    }

    pub fn set_form(&self, form: ActorForm) {
        let mut cached = self.form.write().unwrap_or_else(PoisonError::into_inner);
        cached.actor = form.actor;
        cached.traits = form.traits;
    }

    pub fn actor_id(&self) -> ActorId {
        self.form
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .actor
            .clone()
    }

    pub fn traits(&self) -> Traits {
        self.form
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .traits
            .clone()
    }

    pub async fn request(&self, method: &str, args: Value) -> Result<Value> {
        let actor = self.actor_id();
        debug!(actor = %actor, method, "front request");
        self.channel.request(&actor, method, args).await
    }

    pub async fn send_oneway(&self, method: &str, args: Value) -> Result<()> {
        let actor = self.actor_id();
        debug!(actor = %actor, method, "front oneway");
        self.channel.send_oneway(&actor, method, args).await
    }
}
