//! Shape of the JSON packets exchanged with remote actors.
//!
//! Requests: `{ "to": actor, "type": method, ...args }`
//! Replies:  `{ "from": actor, ... }`
//! Errors:   `{ "from": actor, "error": code, "message": text }`
//! Events:   `{ "from": actor, "type": event, ...payload }`

use devfront_core::{ActorId, Error, Result};
use serde_json::{Map, Value};

/// Build a request packet. `to` and `type` always win over same-named args.
pub fn request(to: &ActorId, method: &str, args: Value) -> Result<Value> {
    let mut packet = match args {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(Error::Protocol(format!(
                "arguments to {}.{} must be an object, got {}",
                to, method, other
            )))
        }
    };
    packet.insert("to".to_string(), Value::String(to.to_string()));
    packet.insert("type".to_string(), Value::String(method.to_string()));
    Ok(Value::Object(packet))
}

/// Sender of an incoming packet.
pub fn from(packet: &Value) -> Option<ActorId> {
    packet
        .get("from")
        .and_then(|v| v.as_str())
        .map(ActorId::from)
}

/// `type` field of an incoming packet, set on events and absent on most replies.
pub fn kind(packet: &Value) -> Option<&str> {
    packet.get("type").and_then(|v| v.as_str())
}

/// Turn a reply into `Ok(packet)` or the remote error it carries.
pub fn into_reply(packet: Value) -> Result<Value> {
    let Some(code) = packet.get("error") else {
        return Ok(packet);
    };
    let error = match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let message = packet
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let actor = from(&packet).map(|a| a.to_string()).unwrap_or_default();
    Err(Error::Remote {
        actor,
        error,
        message,
    })
}
