use std::collections::HashMap;
use std::sync::Arc;

use devfront_core::{ActorForm, Error, Result};
use tracing::{debug, warn};

use crate::front::{Front, FrontClass};
use crate::spec::ActorSpec;
use crate::ActorChannel;

type Constructor = fn(Arc<dyn ActorChannel>, ActorForm) -> Arc<dyn Front>;

fn construct_front<F: FrontClass>(channel: Arc<dyn ActorChannel>, form: ActorForm) -> Arc<dyn Front> {
    Arc::new(F::new(channel, form))
}

#[derive(Clone, Copy)]
struct Entry {
    spec: &'static ActorSpec,
    construct: Constructor,
}

/// Maps actor type names to the front type that proxies them.
#[derive(Clone, Default)]
pub struct FrontRegistry {
    entries: HashMap<&'static str, Entry>,
}

impl FrontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F: FrontClass>(&mut self) {
        let spec = F::actor_spec();
        let entry = Entry {
            spec,
            construct: construct_front::<F>,
        };
        if self.entries.insert(spec.type_name, entry).is_some() {
            warn!(type_name = spec.type_name, "front re-registered, replacing previous entry");
        } else {
            debug!(type_name = spec.type_name, "front registered");
        }
    }

    pub fn spec(&self, type_name: &str) -> Option<&'static ActorSpec> {
        self.entries.get(type_name).map(|e| e.spec)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Build the front registered for `type_name`. Performs no remote call.
    pub fn construct(
        &self,
        type_name: &str,
        channel: Arc<dyn ActorChannel>,
        form: ActorForm,
    ) -> Result<Arc<dyn Front>> {
        let entry = self
            .entries
            .get(type_name)
            .ok_or_else(|| Error::NotFound(format!("no front registered for actor type '{}'", type_name)))?;
        Ok((entry.construct)(channel, form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front::downcast_front;
    use crate::mock::{MockChannel, RecordingFront};

    #[test]
    fn test_construct_by_type() {
        let mut registry = FrontRegistry::new();
        registry.register::<RecordingFront>();
        assert!(registry.contains("recording"));
        assert_eq!(registry.type_names(), vec!["recording"]);

        let channel = MockChannel::new();
        let front = registry
            .construct("recording", channel.clone(), ActorForm::new("conn0.recording3"))
            .unwrap();
        assert_eq!(front.actor_id().as_str(), "conn0.recording3");
        assert!(downcast_front::<RecordingFront>(front).is_some());
        assert!(channel.calls().is_empty());
    }

    #[test]
    fn test_unknown_type() {
        let registry = FrontRegistry::new();
        let err = registry
            .construct("nope", MockChannel::new(), ActorForm::new("a"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_spec_lookup() {
        let mut registry = FrontRegistry::new();
        registry.register::<RecordingFront>();
        registry.register::<RecordingFront>();
        assert_eq!(registry.type_names().len(), 1);
        assert_eq!(registry.spec("recording").map(|s| s.type_name), Some("recording"));
        assert!(registry.spec("other").is_none());
    }
}
