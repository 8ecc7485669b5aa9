//! Actor protocol plumbing: packets, spec descriptors, the call layer,
//! the front abstraction and its registry, and a packet-level client.

pub mod client;
pub mod events;
pub mod front;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod packet;
pub mod registry;
pub mod spec;
pub mod transport;

use async_trait::async_trait;
use devfront_core::{ActorId, Result};
use serde_json::Value;

pub use client::RemoteClient;
pub use events::{EventEmitter, NamedEvent};
pub use front::{downcast_front, Front, FrontBase, FrontClass};
pub use registry::FrontRegistry;
pub use spec::ActorSpec;
pub use transport::PacketTransport;

/// The call layer a front sends its requests through.
///
/// `args` must be a JSON object (or `null`); its keys become fields of the
/// request packet. The returned value is the full reply packet.
#[async_trait]
pub trait ActorChannel: Send + Sync {
    async fn request(&self, to: &ActorId, method: &str, args: Value) -> Result<Value>;

    /// Send a request the actor never replies to.
    async fn send_oneway(&self, to: &ActorId, method: &str, args: Value) -> Result<()>;
}
