use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// Caller-supplied parameters for a single invocation.
///
/// Values are rendered to text on insert; re-inserting a name replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet(BTreeMap<String, String>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ParameterSet::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Display) {
        self.0.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parameters must be exactly {required:?} (missing: {missing:?}, unexpected: {unexpected:?})")]
pub struct ParameterMismatch {
    pub required: Vec<&'static str>,
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

/// Check that the supplied names are exactly `required`, compared as sets.
pub fn validate(
    params: &ParameterSet,
    required: &'static [&'static str],
) -> Result<(), ParameterMismatch> {
    let required_set: BTreeSet<&str> = required.iter().copied().collect();
    let supplied: BTreeSet<&str> = params.names().collect();

    if required_set == supplied {
        return Ok(());
    }

    Err(ParameterMismatch {
        required: required.to_vec(),
        missing: required_set
            .difference(&supplied)
            .map(|name| (*name).to_owned())
            .collect(),
        unexpected: supplied
            .difference(&required_set)
            .map(|name| (*name).to_owned())
            .collect(),
    })
}
