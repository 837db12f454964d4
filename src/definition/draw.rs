use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The family a node type belongs to. Each family has its own default
/// colouring so related nodes stand out in a rendered diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawFamily {
    /// Core nodes, reusable regardless of the quality metric.
    #[default]
    Aqp,
    Visqol,
    Pesq,
    WarpQ,
}

impl DrawFamily {
    fn defaults(self) -> &'static [(&'static str, &'static str)] {
        match self {
            DrawFamily::Aqp => &[("fillcolor", "#ffffff")],
            DrawFamily::Visqol => &[("fillcolor", "#56b3e9B3")],
            DrawFamily::Pesq => &[("fillcolor", "#009e74B3")],
            DrawFamily::WarpQ => &[("fillcolor", "#d55c00B3")],
        }
    }
}

const BASE_OPTIONS: &[(&str, &str)] = &[("shape", "box"), ("style", "filled")];

/// Flattened visualization attributes of a node, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawOptions(BTreeMap<String, String>);

impl DrawOptions {
    /// Merges base defaults, family defaults and per-instance overrides.
    /// Later layers win on key collision.
    pub fn layered(family: DrawFamily, overrides: Option<&Map<String, Value>>) -> Self {
        let mut options = BTreeMap::new();
        for (key, value) in BASE_OPTIONS.iter().chain(family.defaults()) {
            options.insert(key.to_string(), value.to_string());
        }
        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                options.insert(key.clone(), value);
            }
        }
        Self(options)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
