//! Layer-preserving status snapshot, ready for serialization.

use serde::Serialize;

use crate::status::ComponentStatus;

/// One component's entry in a [`StatusSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub status: ComponentStatus,
    pub config: serde_json::Value,
}

/// Status of every component, grouped by layer in graph order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub environment: String,
    pub layers: Vec<Vec<ComponentSnapshot>>,
}

impl StatusSnapshot {
    /// Look up a component's entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ComponentSnapshot> {
        self.components().find(|entry| entry.name == name)
    }

    /// All entries, layer by layer.
    pub fn components(&self) -> impl Iterator<Item = &ComponentSnapshot> {
        self.layers.iter().flatten()
    }

    /// Whether every component is `running` or `finished`.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.components().all(|entry| {
            matches!(
                entry.status,
                ComponentStatus::Running | ComponentStatus::Finished
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(name: &str, status: ComponentStatus) -> ComponentSnapshot {
        ComponentSnapshot {
            name: name.to_string(),
            component_type: "container".to_string(),
            status,
            config: json!({ "image": "postgres:16" }),
        }
    }

    #[test]
    fn test_serialized_shape() {
        let snapshot = StatusSnapshot {
            environment: "dev".to_string(),
            layers: vec![vec![entry("db", ComponentStatus::Running)]],
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!({
                "environment": "dev",
                "layers": [[{
                    "name": "db",
                    "type": "container",
                    "status": "running",
                    "config": { "image": "postgres:16" }
                }]]
            })
        );
    }

    #[test]
    fn test_lookup_and_settled() {
        let snapshot = StatusSnapshot {
            environment: "dev".to_string(),
            layers: vec![
                vec![entry("db", ComponentStatus::Running)],
                vec![entry("seed", ComponentStatus::Finished)],
            ],
        };

        assert_eq!(snapshot.get("seed").unwrap().status, ComponentStatus::Finished);
        assert!(snapshot.get("missing").is_none());
        assert!(snapshot.is_settled());
    }

    #[test]
    fn test_not_settled_while_starting() {
        let snapshot = StatusSnapshot {
            environment: "dev".to_string(),
            layers: vec![vec![entry("db", ComponentStatus::Starting)]],
        };
        assert!(!snapshot.is_settled());
    }
}
