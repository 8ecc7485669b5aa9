/// Declarative description of one actor type's wire surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorSpec {
    pub type_name: &'static str,
    pub methods: &'static [&'static str],
    pub events: &'static [&'static str],
}

impl ActorSpec {
    pub const fn new(
        type_name: &'static str,
        methods: &'static [&'static str],
        events: &'static [&'static str],
    ) -> Self {
        Self {
            type_name,
            methods,
            events,
        }
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.events.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: ActorSpec = ActorSpec::new("thing", &["poke", "prod"], &["poked"]);

    #[test]
    fn test_lookup() {
        assert!(SPEC.has_event("poked"));
        assert!(!SPEC.has_event("poke"));
    }
}
