//! Extension features and the sets the recognizer produces.

use std::collections::BTreeSet;

use serde::Serialize;

/// An extension construct a declaration may use.
///
/// The declaration order is the canonical order in which features contribute
/// statements to a constructor body; see `ss_desugar::plan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Feature {
    SingletonMarker,
    NullAssertion,
    UnnamedInitializer,
    PropertyShorthand,
    /// A parameter list on the declaration itself, implying a constructor.
    PrimaryConstructor,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::SingletonMarker,
        Feature::NullAssertion,
        Feature::UnnamedInitializer,
        Feature::PropertyShorthand,
        Feature::PrimaryConstructor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::SingletonMarker => "SingletonMarker",
            Feature::NullAssertion => "NullAssertion",
            Feature::UnnamedInitializer => "UnnamedInitializer",
            Feature::PropertyShorthand => "PropertyShorthand",
            Feature::PrimaryConstructor => "PrimaryConstructor",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The extension features found on one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, feature: Feature) {
        self.0.insert(feature);
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Features in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(none)");
        }
        let names: Vec<&str> = self.iter().map(Feature::name).collect();
        f.write_str(&names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_follows_canonical_order() {
        let set: FeatureSet = [
            Feature::PropertyShorthand,
            Feature::NullAssertion,
            Feature::UnnamedInitializer,
        ]
        .into_iter()
        .collect();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![
                Feature::NullAssertion,
                Feature::UnnamedInitializer,
                Feature::PropertyShorthand
            ]
        );
        assert_eq!(
            set.to_string(),
            "NullAssertion, UnnamedInitializer, PropertyShorthand"
        );
    }

    #[test]
    fn empty_set_displays_none() {
        assert_eq!(FeatureSet::new().to_string(), "(none)");
    }
}
