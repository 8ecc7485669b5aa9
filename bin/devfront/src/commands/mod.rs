pub mod config_cmd;
pub mod custom;
pub mod highlighter;
pub mod status;

use anyhow::Context;
use devfront_core::{ActorForm, Config, Paths, Traits};
use devfront_fronts::default_registry;
use devfront_protocol::RemoteClient;
use serde_json::Value;
use tracing::info;

pub struct Session {
    pub client: RemoteClient,
    pub config: Config,
}

/// Load config, apply the `--endpoint` override and connect.
pub async fn connect(endpoint: Option<String>) -> anyhow::Result<Session> {
    let paths = Paths::new();
    let mut config = Config::load_or_default(&paths)?;
    if let Some(endpoint) = endpoint {
        config.client.endpoint = endpoint;
    }
    config.validate()?;

    info!(endpoint = %config.client.endpoint, "connecting");
    let client = RemoteClient::connect(default_registry(), &config.client).await?;
    Ok(Session { client, config })
}

pub fn parse_json_arg(name: &str, raw: Option<&str>) -> anyhow::Result<Value> {
    match raw {
        Some(raw) => serde_json::from_str(raw).with_context(|| format!("--{} is not valid JSON", name)),
        None => Ok(Value::Null),
    }
}

/// Build a form for an actor id given on the command line.
pub fn form_for(actor: &str, traits: Option<&str>) -> anyhow::Result<ActorForm> {
    let traits: Traits = match parse_json_arg("traits", traits)? {
        Value::Null => Traits::new(),
        Value::Object(map) => map.into_iter().collect(),
        other => anyhow::bail!("--traits must be a JSON object, got {}", other),
    };
    Ok(ActorForm::new(actor).with_traits(traits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_for_parses_traits() {
        let form = form_for("conn0.highlighter1", Some(r#"{"pickAndFocus": true}"#)).unwrap();
        assert_eq!(form.actor.as_str(), "conn0.highlighter1");
        assert!(form.traits.supports("pickAndFocus"));
    }

    #[test]
    fn test_form_for_without_traits() {
        let form = form_for("a", None).unwrap();
        assert!(form.traits.is_empty());
    }

    #[test]
    fn test_form_for_rejects_non_object() {
        assert!(form_for("a", Some("[1]")).is_err());
        assert!(form_for("a", Some("{")).is_err());
    }
}
