//! The variable environment visible to expressions and templates.

use serde::{Serialize, Serializer, ser::SerializeMap};

use super::value::Value;

/// Name of the root bound to the persisted project configuration.
pub const PROJECT_ROOT: &str = "project";
/// Name of the root bound to the global (per-user) configuration.
pub const GLOBAL_ROOT: &str = "global";

/// `true` for the read-only roots, which parameters may not rebind.
pub fn is_root(name: &str) -> bool {
    name == PROJECT_ROOT || name == GLOBAL_ROOT
}

/// Immutable, insertion-ordered mapping of variable names to values.
///
/// Extension never mutates the receiver's observable state for other holders:
/// [`with`](Self::with) and [`extend`](Self::extend) consume `self` and return
/// the extended environment, and a recursive dependency application works on
/// its own clone. Rebinding an existing name replaces the value in place and
/// keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableEnvironment {
    entries: Vec<(String, Value)>,
}

impl VariableEnvironment {
    /// An environment with no bindings at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An environment seeded with the two well-known roots.
    pub fn with_roots(project: Value, global: Value) -> Self {
        Self::empty().with(PROJECT_ROOT, project).with(GLOBAL_ROOT, global)
    }

    /// Bind `key` to `value`, returning the new environment.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind(key.into(), value.into());
        self
    }

    /// Bind every pair of `bindings`, later pairs overriding earlier ones.
    pub fn extend<I, K>(mut self, bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in bindings {
            self.bind(key.into(), value);
        }
        self
    }

    fn bind(&mut self, key: String, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// JSON object handed to the templating backend.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl Serialize for VariableEnvironment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_two_roots_are_reserved() {
        assert!(is_root("project"));
        assert!(is_root("global"));
        assert!(!is_root("projects"));
        assert!(!is_root("name"));
    }

    #[test]
    fn roots_come_first() {
        let env = VariableEnvironment::with_roots(Value::Null, Value::Null).with("name", "demo");
        let keys: Vec<_> = env.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![PROJECT_ROOT, GLOBAL_ROOT, "name"]);
    }

    #[test]
    fn rebinding_keeps_position() {
        let env = VariableEnvironment::empty()
            .with("a", 1)
            .with("b", 2)
            .with("a", 3);

        let pairs: Vec<_> = env.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        assert_eq!(
            pairs,
            vec![("a".to_string(), Value::Int(3)), ("b".to_string(), Value::Int(2))]
        );
    }

    #[test]
    fn clones_are_independent() {
        let parent = VariableEnvironment::empty().with("name", "parent");
        let child = parent.clone().with("name", "child").with("extra", true);

        assert_eq!(parent.get("name"), Some(&Value::from("parent")));
        assert!(!parent.contains("extra"));
        assert_eq!(child.get("name"), Some(&Value::from("child")));
    }

    #[test]
    fn extend_overrides_in_order() {
        let env = VariableEnvironment::empty()
            .with("name", "a")
            .extend([("name", Value::from("b")), ("other", Value::Int(1))]);
        assert_eq!(env.get("name"), Some(&Value::from("b")));
        assert_eq!(env.len(), 2);
    }
}
