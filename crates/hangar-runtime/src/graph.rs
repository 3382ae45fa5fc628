//! # Component Graph
//!
//! Dependency structure without explicit edges. Layer *i* may depend on
//! anything in layers before it; members of one layer are independent of
//! each other and are always operated on concurrently.
//!
//! ```text
//! layer 0: { db, cache }      ← started first, stopped last
//! layer 1: { seed, migrate }
//! layer 2: { api }            ← started last, stopped first
//! ```
//!
//! Names are not validated here. [`Environment`](crate::Environment)
//! construction checks them across the whole graph, so a name repeated in a
//! later layer is caught.

use std::sync::Arc;

use crate::component::Component;

/// One concurrency group: `(name, component)` pairs in insertion order.
pub type Layer = Vec<(String, Arc<dyn Component>)>;

/// Builder for an ordered sequence of layers.
#[derive(Default, Clone)]
pub struct ComponentGraph {
    layers: Vec<Layer>,
}

impl ComponentGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer. An empty mapping is ignored.
    #[must_use]
    pub fn add_layer<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = (S, Arc<dyn Component>)>,
        S: Into<String>,
    {
        let layer: Layer = components
            .into_iter()
            .map(|(name, component)| (name.into(), component))
            .collect();
        if !layer.is_empty() {
            self.layers.push(layer);
        }
        self
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of non-empty layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub(crate) fn into_layers(self) -> Vec<Layer> {
        self.layers
    }
}

impl std::fmt::Debug for ComponentGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<Vec<&str>> = self
            .layers
            .iter()
            .map(|layer| layer.iter().map(|(name, _)| name.as_str()).collect())
            .collect();
        f.debug_struct("ComponentGraph")
            .field("layers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::mock::{Journal, MockComponent};

    fn mock(name: &str, journal: &Journal) -> Arc<dyn Component> {
        Arc::new(MockComponent::new(name, journal))
    }

    #[test]
    fn test_layers_keep_order() {
        let journal = Journal::default();
        let graph = ComponentGraph::new()
            .add_layer([("db", mock("db", &journal))])
            .add_layer([("seed", mock("seed", &journal)), ("cache", mock("cache", &journal))]);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.layers()[0][0].0, "db");
        assert_eq!(graph.layers()[1][0].0, "seed");
        assert_eq!(graph.layers()[1][1].0, "cache");
    }

    #[test]
    fn test_empty_layer_is_dropped() {
        let journal = Journal::default();
        let graph = ComponentGraph::new()
            .add_layer(Vec::<(String, Arc<dyn Component>)>::new())
            .add_layer([("db", mock("db", &journal))])
            .add_layer(Vec::<(&str, Arc<dyn Component>)>::new());

        assert_eq!(graph.len(), 1);
        assert!(!graph.is_empty());
    }

    #[test]
    fn test_no_validation_at_build_time() {
        let journal = Journal::default();
        let graph = ComponentGraph::new()
            .add_layer([("bad name", mock("x", &journal))])
            .add_layer([("bad name", mock("y", &journal))]);

        assert_eq!(graph.len(), 2);
        assert_eq!(
            format!("{graph:?}"),
            r#"ComponentGraph { layers: [["bad name"], ["bad name"]] }"#
        );
    }
}
