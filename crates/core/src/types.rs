use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier of a remote actor, e.g. `server1.conn0.highlighter12`.
///
/// An empty id means the form that produced it carried none; the call layer
/// rejects requests addressed to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Capabilities advertised by a remote actor in its form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Traits(BTreeMap<String, Value>);

impl Traits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the trait is present with a truthy value.
    pub fn supports(&self, name: &str) -> bool {
        self.0.get(name).map(is_truthy).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Traits {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Wire representation of an actor: `{ actor, traits?, ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorForm {
    #[serde(default)]
    pub actor: ActorId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub traits: Traits,
    /// Any other attributes the actor reported.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActorForm {
    pub fn new(actor: impl Into<ActorId>) -> Self {
        Self {
            actor: actor.into(),
            ..Self::default()
        }
    }

    pub fn with_traits(mut self, traits: Traits) -> Self {
        self.traits = traits;
        self
    }

    pub fn from_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_without_traits_has_empty_traits() {
        let form = ActorForm::from_value(json!({"actor": "conn0.highlighter1"})).unwrap();
        assert_eq!(form.actor.as_str(), "conn0.highlighter1");
        assert!(form.traits.is_empty());
    }

    #[test]
    fn test_form_null_traits_has_empty_traits() {
        let form = ActorForm::from_value(json!({"actor": "a", "traits": null})).unwrap();
        assert!(form.traits.is_empty());
    }

    #[test]
    fn test_empty_form() {
        let form = ActorForm::from_value(json!({})).unwrap();
        assert!(form.actor.is_empty());
        assert!(form.traits.is_empty());
    }

    #[test]
    fn test_extra_fields_kept_aside() {
        let form = ActorForm::from_value(json!({
            "actor": "a",
            "traits": {"pickAndFocus": true},
            "typeName": "highlighter"
        }))
        .unwrap();
        assert!(form.traits.supports("pickAndFocus"));
        assert_eq!(form.extra.get("typeName"), Some(&json!("highlighter")));
        assert!(!form.extra.contains_key("traits"));
    }

    #[test]
    fn test_trait_truthiness() {
        let traits: Traits = [
            ("yes", json!(true)),
            ("no", json!(false)),
            ("zero", json!(0)),
            ("one", json!(1)),
            ("empty", json!("")),
            ("obj", json!({})),
            ("null", Value::Null),
        ]
        .into_iter()
        .collect();
        assert!(traits.supports("yes"));
        assert!(!traits.supports("no"));
        assert!(!traits.supports("zero"));
        assert!(traits.supports("one"));
        assert!(!traits.supports("empty"));
        assert!(traits.supports("obj"));
        assert!(!traits.supports("null"));
        assert!(!traits.supports("missing"));
    }
}
