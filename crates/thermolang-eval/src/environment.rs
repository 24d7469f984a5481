use crate::value::Value;
use rustc_hash::FxHashMap;

/// User-variable bindings. Sensor names never live here; they are resolved
/// through the sensor facade on every read.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    variables: FxHashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Binds `name`, returning the previous value if there was one.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.variables.insert(name.into(), value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Bindings sorted by name.
    pub fn sorted(&self) -> Vec<(&str, &Value)> {
        let mut entries: Vec<_> = self.variables.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        entries
    }
}
