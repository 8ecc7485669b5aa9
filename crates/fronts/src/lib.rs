//! Fronts for the inspector's highlighter actors.

pub mod custom_highlighter;
pub mod highlighter;
pub mod node;

use devfront_protocol::FrontRegistry;

pub use custom_highlighter::{CustomHighlighterFront, CUSTOM_HIGHLIGHTER_SPEC};
pub use highlighter::{
    pick_method, BoxModelOptions, HighlighterCapabilities, HighlighterEvent, HighlighterFront, PickMethod,
    HIGHLIGHTER_SPEC,
};
pub use node::NodeRef;

pub fn register_all(registry: &mut FrontRegistry) {
    registry.register::<HighlighterFront>();
    registry.register::<CustomHighlighterFront>();
}

/// A registry with every front in this crate.
pub fn default_registry() -> FrontRegistry {
    let mut registry = FrontRegistry::new();
    register_all(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = default_registry();
        assert_eq!(registry.type_names(), vec!["customhighlighter", "highlighter"]);
    }
}
