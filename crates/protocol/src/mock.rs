//! In-process stand-ins for both ends of a front.
//!
//! [`MockChannel`] records requests instead of sending them; replies are
//! scripted per method, or held until released by hand. [`RecordingFront`]
//! is a minimal front that remembers the events pushed to it.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use devfront_core::{ActorForm, ActorId, Error, Result};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use crate::front::{Front, FrontBase, FrontClass};
use crate::spec::ActorSpec;
use crate::ActorChannel;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub to: ActorId,
    pub method: String,
    pub args: Value,
}

/// A request parked by a gated channel, waiting for its reply.
pub struct PendingCall {
    pub call: RecordedCall,
    reply: oneshot::Sender<Result<Value>>,
}

impl PendingCall {
    pub fn resolve(self, reply: Value) {
        let _ = self.reply.send(Ok(reply));
    }

    pub fn reject(self, error: Error) {
        let _ = self.reply.send(Err(error));
    }
}

#[derive(Default)]
pub struct MockChannel {
    calls: Mutex<Vec<RecordedCall>>,
    scripted: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    gate: Option<mpsc::UnboundedSender<PendingCall>>,
}

impl MockChannel {
    /// Every request resolves immediately, with a scripted reply if one is
    /// queued for its method and `{"from": to}` otherwise.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every request is parked until the test resolves it.
    pub fn gated() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Self {
            gate: Some(tx),
            ..Self::default()
        };
        (Arc::new(channel), rx)
    }

    pub fn reply_with(&self, method: &str, reply: Value) {
        self.push(method, Ok(reply));
    }

    pub fn fail_with(&self, method: &str, error: Error) {
        self.push(method, Err(error));
    }

    fn push(&self, method: &str, outcome: Result<Value>) {
        self.scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(method.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }
}

#[async_trait]
impl ActorChannel for MockChannel {
    async fn request(&self, to: &ActorId, method: &str, args: Value) -> Result<Value> {
        let call = RecordedCall {
            to: to.clone(),
            method: method.to_string(),
            args,
        };
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.clone());

        if let Some(gate) = &self.gate {
            let (reply, rx) = oneshot::channel();
            gate.send(PendingCall { call, reply })
                .map_err(|_| Error::Transport("mock gate closed".to_string()))?;
            return rx
                .await
                .map_err(|_| Error::Transport("mock call dropped".to_string()))?;
        }

        let scripted = self
            .scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(method)
            .and_then(|q| q.pop_front());
        scripted.unwrap_or_else(|| Ok(json!({ "from": to.as_str() })))
    }

    async fn send_oneway(&self, to: &ActorId, method: &str, args: Value) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                to: to.clone(),
                method: method.to_string(),
                args,
            });
        Ok(())
    }
}

pub static RECORDING_SPEC: ActorSpec = ActorSpec::new("recording", &["ping"], &["pinged"]);

pub struct RecordingFront {
    base: FrontBase,
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingFront {
    pub async fn ping(&self) -> Result<Value> {
        self.base.request("ping", Value::Null).await
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn traits(&self) -> devfront_core::Traits {
        self.base.traits()
    }
}

impl Front for RecordingFront {
    fn spec(&self) -> &'static ActorSpec {
        &RECORDING_SPEC
    }

    fn actor_id(&self) -> ActorId {
        self.base.actor_id()
    }

    fn apply_form(&self, form: ActorForm) {
        self.base.set_form(form);
    }

    fn handle_event(&self, event: &str, packet: Value) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event.to_string(), packet));
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl FrontClass for RecordingFront {
    fn actor_spec() -> &'static ActorSpec {
        &RECORDING_SPEC
    }

    fn new(channel: Arc<dyn ActorChannel>, form: ActorForm) -> Self {
        Self {
            base: FrontBase::new(channel, form),
            events: Mutex::new(Vec::new()),
        }
    }
}
