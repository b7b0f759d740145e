//! Per-file import aliases.
//!
//! `import geo.shapes.Circle as C;` maps `C` to `geo/shapes/Circle`. A name
//! with no alias is taken to be already qualified, so lookups never fail.

use rustc_hash::FxHashMap;

/// Short name to qualified (slash separated) name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: FxHashMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias, returning the previous target if `alias` was taken.
    ///
    /// `target` may be written with dots or slashes.
    pub fn insert(&mut self, alias: impl Into<String>, target: &str) -> Option<String> {
        self.entries.insert(alias.into(), to_internal_name(target))
    }

    /// Resolve a name written in source to its qualified internal name.
    ///
    /// Only the whole name is looked up; unresolved names are returned with
    /// dots turned into slashes.
    pub fn resolve(&self, name: &str) -> String {
        match self.entries.get(name) {
            Some(target) => target.clone(),
            None => to_internal_name(name),
        }
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// `a.b.C` to `a/b/C`.
pub fn to_internal_name(name: &str) -> String {
    name.replace('.', "/")
}

/// `a/b/C` to `a.b.C`.
pub fn to_binary_name(name: &str) -> String {
    name.replace('/', ".")
}
