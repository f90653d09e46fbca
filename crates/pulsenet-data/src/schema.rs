//! Serde structs for structured graph files.
//!
//! The same schema is read from RON, JSON, or TOML:
//!
//! ```toml
//! [[modules]]
//! name = "broadcaster"
//! kind = "relay"
//! destinations = ["a", "b"]
//! ```

use serde::{Deserialize, Serialize};

use pulsenet_core::graph::{GraphBuilder, GraphError, ModuleGraph};
use pulsenet_core::module::ModuleKind;

use crate::parser::is_valid_name;

/// Errors raised while turning a [`GraphFile`] into a graph. `index` is the
/// 0-based position in `modules`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("modules[{index}]: invalid module name '{name}'")]
    InvalidName { index: usize, name: String },

    #[error("modules[{index}]: invalid destination '{name}'")]
    InvalidDestination { index: usize, name: String },

    #[error("modules[{index}]: module '{name}' is declared more than once")]
    Duplicate { index: usize, name: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Module kind as written in data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKindData {
    Relay,
    Toggle,
    Conjunction,
}

impl From<ModuleKindData> for ModuleKind {
    fn from(kind: ModuleKindData) -> Self {
        match kind {
            ModuleKindData::Relay => ModuleKind::Relay,
            ModuleKindData::Toggle => ModuleKind::Toggle,
            ModuleKindData::Conjunction => ModuleKind::Conjunction,
        }
    }
}

impl From<ModuleKind> for ModuleKindData {
    fn from(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Relay => ModuleKindData::Relay,
            ModuleKind::Toggle => ModuleKindData::Toggle,
            ModuleKind::Conjunction => ModuleKindData::Conjunction,
        }
    }
}

/// One module declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleData {
    pub name: String,
    pub kind: ModuleKindData,
    pub destinations: Vec<String>,
}

/// Top-level graph file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFile {
    pub modules: Vec<ModuleData>,
}

impl GraphFile {
    /// Check every name, then declare modules in file order and build the graph.
    pub fn into_graph(self) -> Result<ModuleGraph, SchemaError> {
        for (index, module) in self.modules.iter().enumerate() {
            if !is_valid_name(&module.name) {
                return Err(SchemaError::InvalidName {
                    index,
                    name: module.name.clone(),
                });
            }
            if let Some(dest) = module.destinations.iter().find(|d| !is_valid_name(d)) {
                return Err(SchemaError::InvalidDestination {
                    index,
                    name: dest.clone(),
                });
            }
        }

        let mut builder = GraphBuilder::new();
        for (index, module) in self.modules.into_iter().enumerate() {
            builder
                .declare(&module.name, module.kind.into(), &module.destinations)
                .map_err(|e| match e {
                    GraphError::DuplicateModule(name) => SchemaError::Duplicate { index, name },
                    other => SchemaError::Graph(other),
                })?;
        }
        Ok(builder.build()?)
    }

    /// Export a graph's declared modules in declaration order. Sinks are
    /// implied by the destination lists.
    pub fn from_graph(graph: &ModuleGraph) -> Self {
        let modules = graph
            .modules()
            .map(|(id, def)| ModuleData {
                name: graph.display_name(id).to_string(),
                kind: def.kind.into(),
                destinations: def
                    .destinations
                    .iter()
                    .map(|&d| graph.display_name(d).to_string())
                    .collect(),
            })
            .collect();
        Self { modules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsenet_core::engine::pulse_product;
    use pulsenet_core::test_utils::scenario_b;

    #[test]
    fn kind_names_are_snake_case() {
        let json = serde_json::to_string(&ModuleKindData::Conjunction).unwrap();
        assert_eq!(json, "\"conjunction\"");
    }

    #[test]
    fn destinations_are_required() {
        let missing = serde_json::from_str::<ModuleData>(r#"{"name": "x", "kind": "toggle"}"#);
        assert!(missing.is_err());

        let empty: ModuleData =
            serde_json::from_str(r#"{"name": "x", "kind": "toggle", "destinations": []}"#)
                .unwrap();
        assert!(empty.destinations.is_empty());
    }

    #[test]
    fn invalid_destinations_are_located() {
        let file: GraphFile = serde_json::from_str(
            r#"{"modules": [
                {"name": "broadcaster", "kind": "relay", "destinations": ["a b", ""]},
                {"name": "a", "kind": "toggle", "destinations": []}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            file.into_graph().unwrap_err(),
            SchemaError::InvalidDestination {
                index: 0,
                name: "a b".into()
            }
        );
    }

    #[test]
    fn invalid_names_are_located() {
        for bad in ["", "a-b", "%a", "caf\u{00e9}"] {
            let file: GraphFile = serde_json::from_str(&format!(
                r#"{{"modules": [
                    {{"name": "broadcaster", "kind": "relay", "destinations": ["a"]}},
                    {{"name": "{bad}", "kind": "toggle", "destinations": ["out"]}}
                ]}}"#
            ))
            .unwrap();
            let err = file.into_graph().unwrap_err();
            assert!(
                matches!(&err, SchemaError::InvalidName { index: 1, .. }),
                "{bad:?}: {err}"
            );
        }
    }

    #[test]
    fn export_then_rebuild_behaves_identically() {
        let original = scenario_b();
        let file = GraphFile::from_graph(&original);
        assert_eq!(file.modules.len(), 5);
        assert_eq!(file.modules[0].name, "broadcaster");

        let rebuilt = file.into_graph().unwrap();
        assert_eq!(
            pulse_product(&rebuilt).unwrap(),
            pulse_product(&original).unwrap()
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let file = GraphFile {
            modules: vec![
                ModuleData {
                    name: "broadcaster".into(),
                    kind: ModuleKindData::Relay,
                    destinations: vec!["a".into()],
                },
                ModuleData {
                    name: "broadcaster".into(),
                    kind: ModuleKindData::Toggle,
                    destinations: vec![],
                },
            ],
        };
        assert_eq!(
            file.into_graph().unwrap_err(),
            SchemaError::Duplicate {
                index: 1,
                name: "broadcaster".into()
            }
        );
    }

    #[test]
    fn missing_entry_passes_through() {
        let file = GraphFile {
            modules: vec![ModuleData {
                name: "t".into(),
                kind: ModuleKindData::Toggle,
                destinations: vec!["out".into()],
            }],
        };
        assert_eq!(
            file.into_graph().unwrap_err(),
            SchemaError::Graph(GraphError::NoEntry)
        );
    }
}
