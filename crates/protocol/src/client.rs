//! Packet-level client for the actor protocol.
//!
//! Replies carry no request id: the server answers each actor's requests in
//! the order it received them, so pending requests are queued FIFO per actor.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devfront_core::{ActorForm, ActorId, ClientConfig, Error, Result};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::front::{downcast_front, Front};
use crate::packet;
use crate::registry::FrontRegistry;
use crate::transport::PacketTransport;
use crate::ActorChannel;

type ReplySender = oneshot::Sender<Result<Value>>;
type PendingMap = Arc<Mutex<HashMap<ActorId, VecDeque<ReplySender>>>>;
type Pool = Arc<Mutex<HashMap<ActorId, Arc<dyn Front>>>>;

/// The request side of a connection. Fronts hold this, never the client, so
/// the pool holding fronts does not keep itself alive.
struct Requester {
    tx: mpsc::Sender<Value>,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
    timeout: Duration,
}

#[async_trait]
impl ActorChannel for Requester {
    async fn request(&self, to: &ActorId, method: &str, args: Value) -> Result<Value> {
        if to.is_empty() {
            return Err(Error::Protocol(format!("cannot send '{}' to an actor without id", method)));
        }
        let msg = packet::request(to, method, args)?;
        let permit = self
            .tx
            .reserve()
            .await
            .map_err(|_| Error::Transport("connection closed".to_string()))?;

        let (tx, rx) = oneshot::channel();
        {
            // Enqueue and send under one lock so queue order matches wire order.
            let mut pending = self.pending.lock().await;
            if self.closed.load(Ordering::SeqCst) {
                return Err(Error::Transport("connection closed".to_string()));
            }
            pending.entry(to.clone()).or_default().push_back(tx);
            debug!(actor = %to, method, "→ request");
            permit.send(msg);
        }

        // On timeout the slot stays queued so the late reply is absorbed by it
        // rather than matched to the next request.
        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(Error::Transport("reply channel closed".to_string())),
            Err(_) => Err(Error::Timeout(format!(
                "{}.{} timed out after {}ms",
                to,
                method,
                self.timeout.as_millis()
            ))),
        }
    }

    async fn send_oneway(&self, to: &ActorId, method: &str, args: Value) -> Result<()> {
        if to.is_empty() {
            return Err(Error::Protocol(format!("cannot send '{}' to an actor without id", method)));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Transport("connection closed".to_string()));
        }
        let msg = packet::request(to, method, args)?;
        debug!(actor = %to, method, "→ oneway");
        self.tx
            .send(msg)
            .await
            .map_err(|_| Error::Transport("connection closed".to_string()))
    }
}

pub struct RemoteClient {
    requester: Arc<Requester>,
    pool: Pool,
    registry: Arc<FrontRegistry>,
    _reader_handle: JoinHandle<()>,
    transport_tasks: Vec<JoinHandle<()>>,
}

impl RemoteClient {
    pub fn new(transport: PacketTransport, registry: FrontRegistry, config: &ClientConfig) -> Self {
        let PacketTransport {
            outgoing,
            incoming,
            tasks,
        } = transport;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let pool: Pool = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let registry = Arc::new(registry);

        let reader_handle = tokio::spawn(Self::reader_task(
            incoming,
            pending.clone(),
            pool.clone(),
            closed.clone(),
        ));

        Self {
            requester: Arc::new(Requester {
                tx: outgoing,
                pending,
                closed,
                timeout: Duration::from_millis(config.request_timeout_ms),
            }),
            pool,
            registry,
            _reader_handle: reader_handle,
            transport_tasks: tasks,
        }
    }

    /// Connect over WebSocket to `config.endpoint`.
    pub async fn connect(registry: FrontRegistry, config: &ClientConfig) -> Result<Self> {
        let transport = PacketTransport::connect_websocket(&config.endpoint, config.send_buffer).await?;
        Ok(Self::new(transport, registry, config))
    }

    /// Send a raw request, e.g. to the root actor.
    pub async fn request(&self, to: &ActorId, method: &str, args: Value) -> Result<Value> {
        self.requester.request(to, method, args).await
    }

    /// The front for the actor described by `form`.
    ///
    /// A pooled front gets the new form applied; otherwise one is built
    /// through the registry for `type_name` and pooled.
    pub async fn front_for_form(&self, type_name: &str, form: ActorForm) -> Result<Arc<dyn Front>> {
        if form.actor.is_empty() {
            return Err(Error::Protocol(format!("{} form has no actor id", type_name)));
        }
        let mut pool = self.pool.lock().await;
        if let Some(front) = pool.get(&form.actor) {
            if front.spec().type_name != type_name {
                return Err(Error::Protocol(format!(
                    "actor {} is a {}, not a {}",
                    form.actor,
                    front.spec().type_name,
                    type_name
                )));
            }
            debug!(actor = %form.actor, "updating pooled front form");
            front.apply_form(form);
            return Ok(front.clone());
        }

        let actor = form.actor.clone();
        let channel: Arc<dyn ActorChannel> = self.requester.clone();
        let front = self.registry.construct(type_name, channel, form)?;
        debug!(actor = %actor, type_name, "front created");
        pool.insert(actor, front.clone());
        Ok(front)
    }

    /// Typed variant of [`front_for_form`](Self::front_for_form).
    pub async fn get_front<F: Front>(&self, type_name: &str, form: ActorForm) -> Result<Arc<F>> {
        let front = self.front_for_form(type_name, form).await?;
        downcast_front::<F>(front)
            .ok_or_else(|| Error::Protocol(format!("front for '{}' has an unexpected type", type_name)))
    }

    pub async fn front(&self, actor: &ActorId) -> Option<Arc<dyn Front>> {
        self.pool.lock().await.get(actor).cloned()
    }

    /// Drop the client's reference to a front.
    pub async fn release(&self, actor: &ActorId) -> bool {
        self.pool.lock().await.remove(actor).is_some()
    }

    async fn reader_task(
        mut incoming: mpsc::Receiver<Value>,
        pending: PendingMap,
        pool: Pool,
        closed: Arc<AtomicBool>,
    ) {
        while let Some(msg) = incoming.recv().await {
            let Some(from) = packet::from(&msg) else {
                warn!("dropping packet without 'from': {}", msg);
                continue;
            };
            let front = pool.lock().await.get(&from).cloned();

            let declared_event = match (&front, packet::kind(&msg)) {
                (Some(front), Some(kind)) => front.spec().has_event(kind),
                _ => false,
            };

            if !declared_event {
                let waiter = take_waiter(&mut *pending.lock().await, &from);
                if let Some(tx) = waiter {
                    debug!(actor = %from, "← reply");
                    if tx.send(packet::into_reply(msg)).is_err() {
                        warn!(actor = %from, "reply arrived after its request gave up, dropped");
                    }
                    continue;
                }
            }

            match (front, packet::kind(&msg).map(str::to_string)) {
                (Some(front), Some(kind)) => {
                    debug!(actor = %from, event = %kind, "← event");
                    front.handle_event(&kind, msg);
                }
                _ => debug!(actor = %from, "unsolicited packet ignored: {}", msg),
            }
        }

        closed.store(true, Ordering::SeqCst);
        let mut pending = pending.lock().await;
        let failed: usize = pending.values().map(VecDeque::len).sum();
        if failed > 0 {
            warn!(failed, "connection closed with requests in flight");
        }
        for (_, queue) in pending.drain() {
            for tx in queue {
                let _ = tx.send(Err(Error::Transport("connection closed".to_string())));
            }
        }
    }
}

/// Pop the oldest waiter for `actor`, forgetting the actor once its queue
/// is empty.
fn take_waiter(
    pending: &mut HashMap<ActorId, VecDeque<ReplySender>>,
    actor: &ActorId,
) -> Option<ReplySender> {
    let queue = pending.get_mut(actor)?;
    let waiter = queue.pop_front();
    if queue.is_empty() {
        pending.remove(actor);
    }
    waiter
}

impl Drop for RemoteClient {
    fn drop(&mut self) {
        self._reader_handle.abort();
        for task in &self.transport_tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingFront;
    use serde_json::json;

    fn setup(timeout_ms: u64) -> (RemoteClient, PacketTransport) {
        let (client_end, server_end) = PacketTransport::pair(16);
        let mut registry = FrontRegistry::new();
        registry.register::<RecordingFront>();
        let config = ClientConfig {
            request_timeout_ms: timeout_ms,
            ..ClientConfig::default()
        };
        (RemoteClient::new(client_end, registry, &config), server_end)
    }

    #[tokio::test]
    async fn test_replies_matched_in_order_per_actor() {
        let (client, mut server) = setup(1_000);
        let actor = ActorId::from("conn0.thing1");

        let serve = async {
            for _ in 0..2 {
                let req = server.incoming.recv().await.unwrap();
                let reply = json!({"from": req["to"], "echo": req["type"]});
                server.outgoing.send(reply).await.unwrap();
            }
        };
        let (first, second, _) = tokio::join!(
            client.request(&actor, "first", Value::Null),
            client.request(&actor, "second", Value::Null),
            serve
        );
        assert_eq!(first.unwrap()["echo"], "first");
        assert_eq!(second.unwrap()["echo"], "second");
        assert!(client.requester.pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_answered_actors_leave_pending_map() {
        let (client, mut server) = setup(1_000);

        let serve = async {
            for _ in 0..3 {
                let req = server.incoming.recv().await.unwrap();
                server.outgoing.send(json!({"from": req["to"]})).await.unwrap();
            }
        };
        let (id_a, id_b, id_c) = (
            ActorId::from("conn0.a"),
            ActorId::from("conn0.b"),
            ActorId::from("conn0.c"),
        );
        let (a, b, c, _) = tokio::join!(
            client.request(&id_a, "ping", Value::Null),
            client.request(&id_b, "ping", Value::Null),
            client.request(&id_c, "ping", Value::Null),
            serve
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();
        assert!(client.requester.pending.lock().await.is_empty());
    }

    #[test]
    fn test_take_waiter_keeps_remaining_queue() {
        let actor = ActorId::from("conn0.a");
        let mut pending: HashMap<ActorId, VecDeque<ReplySender>> = HashMap::new();
        let (first, _rx1) = oneshot::channel();
        let (second, _rx2) = oneshot::channel();
        pending.entry(actor.clone()).or_default().extend([first, second]);

        assert!(take_waiter(&mut pending, &actor).is_some());
        assert_eq!(pending[&actor].len(), 1);
        assert!(take_waiter(&mut pending, &actor).is_some());
        assert!(!pending.contains_key(&actor));
        assert!(take_waiter(&mut pending, &actor).is_none());
    }

    #[tokio::test]
    async fn test_error_packet_becomes_remote_error() {
        let (client, mut server) = setup(1_000);
        let actor = ActorId::from("conn0.thing1");

        let serve = async {
            server.incoming.recv().await.unwrap();
            server
                .outgoing
                .send(json!({"from": "conn0.thing1", "error": "unknownMethod", "message": "nope"}))
                .await
                .unwrap();
        };
        let (result, _) = tokio::join!(client.request(&actor, "bogus", Value::Null), serve);
        match result {
            Err(Error::Remote { actor, error, message }) => {
                assert_eq!(actor, "conn0.thing1");
                assert_eq!(error, "unknownMethod");
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_declared_event_is_not_taken_as_reply() {
        let (client, mut server) = setup(1_000);
        let front: Arc<RecordingFront> = client
            .get_front("recording", ActorForm::new("conn0.rec1"))
            .await
            .unwrap();

        let serve = async {
            let req = server.incoming.recv().await.unwrap();
            assert_eq!(req, json!({"to": "conn0.rec1", "type": "ping"}));
            server
                .outgoing
                .send(json!({"from": "conn0.rec1", "type": "pinged", "count": 1}))
                .await
                .unwrap();
            server
                .outgoing
                .send(json!({"from": "conn0.rec1", "pong": true}))
                .await
                .unwrap();
        };
        let (reply, _) = tokio::join!(front.ping(), serve);
        assert_eq!(reply.unwrap()["pong"], true);

        let events = front.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "pinged");
        assert_eq!(events[0].1["count"], 1);
    }

    #[tokio::test]
    async fn test_unsolicited_typed_packet_goes_to_front() {
        let (client, server) = setup(1_000);
        let front: Arc<RecordingFront> = client
            .get_front("recording", ActorForm::new("conn0.rec1"))
            .await
            .unwrap();

        server
            .outgoing
            .send(json!({"from": "conn0.rec1", "type": "somethingNew"}))
            .await
            .unwrap();
        for _ in 0..200 {
            if !front.events().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(front.events()[0].0, "somethingNew");
    }

    #[tokio::test]
    async fn test_closed_transport_fails_pending_requests() {
        let (client, mut server) = setup(5_000);
        let actor = ActorId::from("root");

        let serve = async move {
            server.incoming.recv().await.unwrap();
            drop(server);
        };
        let (result, _) = tokio::join!(client.request(&actor, "listTabs", Value::Null), serve);
        assert!(matches!(result, Err(Error::Transport(_))));

        let again = client.request(&actor, "listTabs", Value::Null).await;
        assert!(matches!(again, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let (client, mut server) = setup(50);
        let actor = ActorId::from("root");

        let result = client.request(&actor, "listTabs", Value::Null).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert_eq!(server.incoming.recv().await.unwrap()["type"], "listTabs");
    }

    #[tokio::test]
    async fn test_late_reply_absorbed_by_timed_out_slot() {
        let (client, mut server) = setup(50);
        let actor = ActorId::from("root");

        assert!(matches!(
            client.request(&actor, "slow", Value::Null).await,
            Err(Error::Timeout(_))
        ));
        server.incoming.recv().await.unwrap();
        server.outgoing.send(json!({"from": "root", "n": 1})).await.unwrap();

        let serve = async {
            server.incoming.recv().await.unwrap();
            server.outgoing.send(json!({"from": "root", "n": 2})).await.unwrap();
        };
        let (reply, _) = tokio::join!(client.request(&actor, "fast", Value::Null), serve);
        assert_eq!(reply.unwrap()["n"], 2);
        assert!(client.requester.pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_front_for_form_reuses_pooled_front() {
        let (client, _server) = setup(1_000);
        let first = client
            .front_for_form("recording", ActorForm::new("conn0.rec1"))
            .await
            .unwrap();
        let updated = ActorForm::from_value(json!({"actor": "conn0.rec1", "traits": {"fast": true}})).unwrap();
        let second = client.front_for_form("recording", updated).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let typed = downcast_front::<RecordingFront>(second).unwrap();
        assert!(typed.traits().supports("fast"));
    }

    #[tokio::test]
    async fn test_front_for_form_rejections() {
        let (client, _server) = setup(1_000);
        let err = client
            .front_for_form("recording", ActorForm::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Protocol(_)));

        client
            .front_for_form("recording", ActorForm::new("conn0.rec1"))
            .await
            .unwrap();
        let err = client
            .front_for_form("highlighter", ActorForm::new("conn0.rec1"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Protocol(_)));

        let err = client
            .front_for_form("highlighter", ActorForm::new("conn0.other"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_release() {
        let (client, _server) = setup(1_000);
        let actor = ActorId::from("conn0.rec1");
        client
            .front_for_form("recording", ActorForm::new("conn0.rec1"))
            .await
            .unwrap();
        assert!(client.front(&actor).await.is_some());
        assert!(client.release(&actor).await);
        assert!(client.front(&actor).await.is_none());
        assert!(!client.release(&actor).await);
    }

    #[tokio::test]
    async fn test_oneway_leaves_no_pending_slot() {
        let (client, mut server) = setup(1_000);
        let front = client
            .front_for_form("recording", ActorForm::new("conn0.rec1"))
            .await
            .unwrap();
        drop(front);
        let actor = ActorId::from("conn0.rec1");
        client
            .requester
            .send_oneway(&actor, "finalize", Value::Null)
            .await
            .unwrap();
        assert_eq!(server.incoming.recv().await.unwrap()["type"], "finalize");

        let serve = async {
            server.incoming.recv().await.unwrap();
            server.outgoing.send(json!({"from": "conn0.rec1", "ok": 1})).await.unwrap();
        };
        let (reply, _) = tokio::join!(client.request(&actor, "ping", Value::Null), serve);
        assert_eq!(reply.unwrap()["ok"], 1);
    }

    #[tokio::test]
    async fn test_request_to_empty_actor() {
        let (client, _server) = setup(1_000);
        let err = client
            .request(&ActorId::default(), "ping", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
