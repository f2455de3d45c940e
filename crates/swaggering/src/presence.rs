//! Tracking which fields of a DTO were explicitly set.
//!
//! JSON APIs often treat the _absence_ of a field very differently from its
//! presence, regardless of the value of the field. `{ "name": "web" }` is
//! semantically different from `{ "name": "web", "instances": 0 }`, even
//! though a zero-initialized `instances` field looks the same in both cases.
//! A [`Presence`] side table records the difference.
use std::collections::BTreeMap;

/// The presence flags of a single DTO instance, keyed by the wire name of each
/// field.
///
/// A field can be in one of three states:
///
/// - untracked: it was never set since the object was created,
/// - present: it was explicitly set (flag is `true`),
/// - cleared: it was set and later cleared (flag is `false`).
///
/// Only present fields are readable through
/// [`Fielder::get_field`](crate::Fielder::get_field) and only present fields
/// are marshalled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Presence {
    flags: BTreeMap<String, bool>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the field `name` as present.
    pub fn mark(&mut self, name: &str) {
        self.flags.insert(name.to_owned(), true);
    }

    /// Marks the field `name` as explicitly cleared.
    pub fn clear(&mut self, name: &str) {
        self.flags.insert(name.to_owned(), false);
    }

    /// Returns `true` if the field `name` is currently present. Untracked and
    /// cleared fields are both reported as not present.
    pub fn is_present(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Returns `true` if the field `name` was ever set or cleared.
    pub fn is_tracked(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// Returns the names of all present fields, sorted.
    pub fn names(&self) -> Vec<String> {
        presence_from_map(&self.flags)
    }

    /// Returns `true` if no field is currently present.
    pub fn is_empty(&self) -> bool {
        !self.flags.values().any(|present| *present)
    }

    /// Read-only access to the raw flags, including cleared fields.
    pub fn flags(&self) -> &BTreeMap<String, bool> {
        &self.flags
    }
}

/// Takes a map from field names to presence flags and returns the names that
/// are present, in sorted order.
///
/// The input can be any map-like iterator, so both [`BTreeMap`] and
/// [`HashMap`](std::collections::HashMap) references are accepted. The output
/// is sorted regardless of the iteration order of the input.
///
/// ```
/// use std::collections::HashMap;
/// use swaggering::presence_from_map;
///
/// let flags = HashMap::from([
///     ("value".to_owned(), true),
///     ("active".to_owned(), false),
///     ("port".to_owned(), true),
/// ]);
///
/// assert_eq!(presence_from_map(&flags), vec!["port", "value"]);
/// ```
pub fn presence_from_map<'a, I, K>(map: I) -> Vec<String>
where
    I: IntoIterator<Item = (K, &'a bool)>,
    K: AsRef<str>,
{
    let mut names = map
        .into_iter()
        .filter(|(_, present)| **present)
        .map(|(name, _)| name.as_ref().to_owned())
        .collect::<Vec<_>>();

    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn untracked_cleared_and_present() {
        let mut presence = Presence::new();
        assert!(!presence.is_present("port"));
        assert!(!presence.is_tracked("port"));

        presence.mark("port");
        assert!(presence.is_present("port"));

        presence.clear("port");
        assert!(!presence.is_present("port"));
        assert!(presence.is_tracked("port"));
        assert!(presence.is_empty());
    }

    #[test]
    fn names_are_sorted_and_skip_cleared_fields() {
        let mut presence = Presence::new();
        presence.mark("value");
        presence.mark("active");
        presence.mark("port");
        presence.clear("active");

        assert_eq!(presence.names(), vec!["port", "value"]);
    }

    #[test]
    fn presence_from_unordered_map() {
        let flags = HashMap::from([
            ("zookeeper".to_owned(), true),
            ("alpha".to_owned(), true),
            ("middle".to_owned(), false),
            ("beta".to_owned(), true),
        ]);

        assert_eq!(presence_from_map(&flags), vec!["alpha", "beta", "zookeeper"]);
    }

    #[test]
    fn presence_from_empty_map() {
        let flags: HashMap<String, bool> = HashMap::new();
        assert!(presence_from_map(&flags).is_empty());
    }
}
