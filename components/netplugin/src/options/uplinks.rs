// External crates
use serde::Serialize;
use std::fmt;

/// Ordered accumulator for the repeatable `--vlan-if` option.
///
/// Contract: every occurrence of the option is split on `,` and each token
/// is appended, in order, to what is already held. Occurrences never
/// overwrite each other, duplicates are kept and so are empty tokens, so
/// `--vlan-if eth0,eth1 --vlan-if eth2` holds `["eth0", "eth1", "eth2"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UplinkInterfaces(Vec<String>);

impl UplinkInterfaces {
    /// Empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split one occurrence on `,` and append every token.
    pub fn append(&mut self, occurrence: &str) {
        self.0
            .extend(occurrence.split(',').map(str::to_string));
    }

    /// Accumulate a sequence of occurrences in order.
    pub fn from_occurrences<I, S>(occurrences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut uplinks = Self::new();
        for occurrence in occurrences {
            uplinks.append(occurrence.as_ref());
        }
        uplinks
    }

    /// Interface names in order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of interfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No uplink was configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the interface names.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl fmt::Display for UplinkInterfaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(" "))
    }
}

impl<'a> IntoIterator for &'a UplinkInterfaces {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
