//! Which traits each struct implements, and the adapter naming rule.

use rustc_hash::FxHashMap;

/// Adapter class for `impl trait_name for struct_name`.
///
/// `<trait>$<struct with '/' replaced by '_'>`. The reflective cast path
/// rebuilds this name at run time from the object's class name, so the rule
/// must not change.
pub fn adapter_name(trait_name: &str, struct_name: &str) -> String {
    format!("{trait_name}${}", struct_name.replace('/', "_"))
}

/// Struct name to the traits it implements, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TraitImplRegistry {
    impls: FxHashMap<String, Vec<String>>,
    count: usize,
}

impl TraitImplRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `struct_name` implements `trait_name`.
    ///
    /// Returns `false` if the pair was already present.
    pub fn register(&mut self, struct_name: &str, trait_name: &str) -> bool {
        let traits = self.impls.entry(struct_name.to_string()).or_default();
        if traits.iter().any(|t| t == trait_name) {
            return false;
        }
        traits.push(trait_name.to_string());
        self.count += 1;
        true
    }

    /// Traits implemented by `struct_name`.
    pub fn traits_of(&self, struct_name: &str) -> &[String] {
        self.impls.get(struct_name).map_or(&[], Vec::as_slice)
    }

    pub fn implements(&self, struct_name: &str, trait_name: &str) -> bool {
        self.traits_of(struct_name).iter().any(|t| t == trait_name)
    }

    /// Number of (struct, trait) pairs.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_name_flattens_struct_path() {
        assert_eq!(adapter_name("zoo/Greeter", "zoo/Dog"), "zoo/Greeter$zoo_Dog");
        assert_eq!(adapter_name("Greeter", "Dog"), "Greeter$Dog");
    }

    #[test]
    fn registration_order_is_kept() {
        let mut registry = TraitImplRegistry::new();
        assert!(registry.register("Dog", "Greeter"));
        assert!(registry.register("Dog", "Walker"));
        assert!(!registry.register("Dog", "Greeter"));

        assert_eq!(registry.traits_of("Dog"), ["Greeter", "Walker"]);
        assert!(registry.implements("Dog", "Walker"));
        assert!(!registry.implements("Cat", "Walker"));
        assert!(registry.traits_of("Cat").is_empty());
        assert_eq!(registry.len(), 2);
    }
}
