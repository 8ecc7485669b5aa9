//! Front for the box-model highlighter actor.
//!
//! `is_node_highlighted` is an optimistic local cache: it is set before the
//! remote show resolves and cleared only by `unhighlight`. A failed remote
//! call leaves it as it was set.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use devfront_core::{ActorForm, ActorId, Result, RuntimeFlags, Traits};
use devfront_protocol::{ActorChannel, ActorSpec, EventEmitter, Front, FrontBase, FrontClass, NamedEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::node::NodeRef;

/// The highlighter declares no events. Picker notifications are sent by the
/// walker actor, not by this one.
pub static HIGHLIGHTER_SPEC: ActorSpec = ActorSpec::new(
    "highlighter",
    &["showBoxModel", "hideBoxModel", "pick", "pickAndFocus", "cancelPick"],
    &[],
);

/// Trait advertised by highlighters that can pick and focus in one call.
pub const PICK_AND_FOCUS_TRAIT: &str = "pickAndFocus";

pub const NODE_HIGHLIGHT: &str = "node-highlight";
pub const NODE_UNHIGHLIGHT: &str = "node-unhighlight";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlighterCapabilities {
    pub pick_and_focus: bool,
}

impl HighlighterCapabilities {
    pub fn from_traits(traits: &Traits) -> Self {
        Self {
            pick_and_focus: traits.supports(PICK_AND_FOCUS_TRAIT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickMethod {
    Pick,
    PickAndFocus,
}

impl PickMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PickMethod::Pick => "pick",
            PickMethod::PickAndFocus => "pickAndFocus",
        }
    }
}

/// `pickAndFocus` only when asked for and advertised, `pick` otherwise.
pub fn pick_method(do_focus: bool, capabilities: HighlighterCapabilities) -> PickMethod {
    if do_focus && capabilities.pick_and_focus {
        PickMethod::PickAndFocus
    } else {
        PickMethod::Pick
    }
}

/// Options of `showBoxModel`. Unset fields are left out of the packet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxModelOptions {
    /// `content`, `padding`, `border` or `margin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_info_bar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_guides: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_only: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_region_area: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HighlighterEvent {
    /// A node was highlighted through [`HighlighterFront::highlight`].
    NodeHighlight(NodeRef),
    /// [`HighlighterFront::unhighlight`] finished, whether or not it hid
    /// anything remotely.
    NodeUnhighlight,
    /// A typed packet the actor sent without being asked.
    Remote { name: String, packet: Value },
}

impl NamedEvent for HighlighterEvent {
    fn name(&self) -> &str {
        match self {
            HighlighterEvent::NodeHighlight(_) => NODE_HIGHLIGHT,
            HighlighterEvent::NodeUnhighlight => NODE_UNHIGHLIGHT,
            HighlighterEvent::Remote { name, .. } => name,
        }
    }
}

pub struct HighlighterFront {
    base: FrontBase,
    capabilities: RwLock<HighlighterCapabilities>,
    is_node_highlighted: AtomicBool,
    events: EventEmitter<HighlighterEvent>,
}

impl HighlighterFront {
    pub fn capabilities(&self) -> HighlighterCapabilities {
        *self.capabilities.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn traits(&self) -> Traits {
        self.base.traits()
    }

    pub fn is_node_highlighted(&self) -> bool {
        self.is_node_highlighted.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> &EventEmitter<HighlighterEvent> {
        &self.events
    }

    /// Start the node picker, focusing the picked node if asked and supported.
    pub async fn pick(&self, do_focus: bool) -> Result<()> {
        let method = pick_method(do_focus, self.capabilities());
        self.base.request(method.as_str(), Value::Null).await?;
        Ok(())
    }

    pub async fn cancel_pick(&self) -> Result<()> {
        self.base.request("cancelPick", Value::Null).await?;
        Ok(())
    }

    pub async fn show_box_model(&self, node: &NodeRef, options: &BoxModelOptions) -> Result<()> {
        self.base
            .request(
                "showBoxModel",
                json!({
                    "node": node.wire_id(),
                    "options": options,
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn hide_box_model(&self) -> Result<()> {
        self.base.request("hideBoxModel", Value::Null).await?;
        Ok(())
    }

    /// Show the box model on `node`. Without a node this does nothing.
    pub async fn highlight(&self, node: Option<&NodeRef>, options: BoxModelOptions) -> Result<()> {
        let Some(node) = node else {
            return Ok(());
        };

        self.is_node_highlighted.store(true, Ordering::SeqCst);
        self.show_box_model(node, &options).await?;
        self.events.emit(HighlighterEvent::NodeHighlight(node.clone()));
        Ok(())
    }

    /// Hide the highlighter.
    ///
    /// In test mode hovering across nodes keeps the highlighter up; only a
    /// forced hide (e.g. the pointer leaving the markup view) takes it down.
    /// `node-unhighlight` is emitted even when no remote hide was sent.
    pub async fn unhighlight(&self, force_hide: bool, flags: RuntimeFlags) -> Result<()> {
        let force_hide = force_hide || !flags.testing;

        if force_hide
            && self
                .is_node_highlighted
                .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            self.hide_box_model().await?;
        } else {
            debug!(actor = %self.base.actor_id(), force_hide, "remote hide skipped");
        }

        self.events.emit(HighlighterEvent::NodeUnhighlight);
        Ok(())
    }
}

impl Front for HighlighterFront {
    fn spec(&self) -> &'static ActorSpec {
        &HIGHLIGHTER_SPEC
    }

    fn actor_id(&self) -> ActorId {
        self.base.actor_id()
    }

    fn apply_form(&self, form: ActorForm) {
        let capabilities = HighlighterCapabilities::from_traits(&form.traits);
        self.base.set_form(form);
        *self.capabilities.write().unwrap_or_else(PoisonError::into_inner) = capabilities;
    }

    fn handle_event(&self, event: &str, packet: Value) {
        self.events.emit(HighlighterEvent::Remote {
            name: event.to_string(),
            packet,
        });
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl FrontClass for HighlighterFront {
    fn actor_spec() -> &'static ActorSpec {
        &HIGHLIGHTER_SPEC
    }

    fn new(channel: Arc<dyn ActorChannel>, form: ActorForm) -> Self {
        let capabilities = HighlighterCapabilities::from_traits(&form.traits);
        Self {
            base: FrontBase::new(channel, form),
            capabilities: RwLock::new(capabilities),
            is_node_highlighted: AtomicBool::new(false),
            events: EventEmitter::new(),
        }
    }
}
