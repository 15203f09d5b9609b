//! Name/id lookup maps over the module catalog.

use std::collections::HashMap;

use tb_common::Module;

/// Bidirectional `name <-> id` index over a module catalog.
///
/// Built wholesale from a catalog slice and never patched. Lookups are exact
/// and case-sensitive. When the catalog repeats a name or an id, the first
/// entry wins in that direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleNameMap {
    by_name: HashMap<String, String>,
    by_id: HashMap<String, String>,
}

impl ModuleNameMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(modules: &[Module]) -> Self {
        let mut by_name = HashMap::with_capacity(modules.len());
        let mut by_id = HashMap::with_capacity(modules.len());

        for module in modules {
            by_name
                .entry(module.name.clone())
                .or_insert_with(|| module.id.clone());
            by_id
                .entry(module.id.clone())
                .or_insert_with(|| module.name.clone());
        }

        Self { by_name, by_id }
    }

    pub fn module_id(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn module_name(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    pub fn module_exists(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Known module names, sorted.
    pub fn available_module_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
