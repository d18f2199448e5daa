//! Accumulated query parameters for one logical request.

/// Ordered mapping from query-parameter name to value.
///
/// Filter methods on the resource façades write into a `FilterSet`; the
/// terminal call hands the pairs to the HTTP layer for serialization. Setting
/// a key that is already present overwrites its value in place, so the
/// serialized query string is deterministic and contains exactly the last-set
/// value per key.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    params: Vec<(String, String)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, overwriting any earlier value for the same key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// The accumulated pairs, in insertion order.
    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut filters = FilterSet::new();
        filters.set("bbox", "1,2,3,4");
        filters.set("limit", "10");
        filters.set("min_confidence", "0.8");

        let keys: Vec<&str> = filters.as_pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["bbox", "limit", "min_confidence"]);
    }

    #[test]
    fn last_set_value_wins() {
        let mut filters = FilterSet::new();
        filters.set("limit", "10");
        filters.set("bbox", "1,2,3,4");
        filters.set("limit", "50");

        assert_eq!(filters.get("limit"), Some("50"));
        assert_eq!(filters.len(), 2);
        // overwrite keeps the original position
        assert_eq!(filters.as_pairs()[0].0, "limit");
    }

    #[test]
    fn get_on_missing_key_is_none() {
        let filters = FilterSet::new();
        assert!(filters.is_empty());
        assert_eq!(filters.get("bbox"), None);
    }
}
