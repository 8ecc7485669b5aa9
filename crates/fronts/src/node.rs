use devfront_core::ActorId;
use serde::{Deserialize, Serialize};

/// Reference to a DOM node actor, the target of highlighter calls.
///
/// On the wire a node argument is just its actor id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub actor: ActorId,
    #[serde(default, rename = "nodeName", skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

impl NodeRef {
    pub fn new(actor: impl Into<ActorId>) -> Self {
        Self {
            actor: actor.into(),
            node_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.node_name = Some(name.into());
        self
    }

    pub fn wire_id(&self) -> &str {
        self.actor.as_str()
    }
}
