//! Feature names and the sparse feature-value map carried on each edge.

use std::collections::BTreeMap;
use std::fmt;

use crate::intern::{InternId, Interner};

static FEATURES: Interner = Interner::new();

/// An interned feature name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Feature(InternId);

impl Feature {
    pub fn intern(text: &str) -> Self {
        Feature(FEATURES.intern(text))
    }

    pub fn as_str(&self) -> String {
        FEATURES.with_str(self.0, |s| s.to_string())
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Feature {
    fn from(s: &str) -> Self {
        Feature::intern(s)
    }
}

/// A sparse `feature -> value` map. Ordered by feature id so that two
/// vectors with equal contents iterate identically (needed for
/// deterministic textual serialization).
pub type FeatureVector = BTreeMap<Feature, f64>;

/// Adds `other`'s entries into `into`, summing values for shared features.
/// Used when accumulating feature contributions along a composer's
/// transducer path before an edge is finalized.
pub fn accumulate(into: &mut FeatureVector, other: &FeatureVector) {
    for (&feature, &value) in other {
        *into.entry(feature).or_insert(0.0) += value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_sums_shared_features() {
        let mut a = FeatureVector::new();
        a.insert(Feature::intern("word-penalty"), 1.0);
        let mut b = FeatureVector::new();
        b.insert(Feature::intern("word-penalty"), 2.0);
        b.insert(Feature::intern("distortion"), 0.5);

        accumulate(&mut a, &b);

        assert_eq!(a[&Feature::intern("word-penalty")], 3.0);
        assert_eq!(a[&Feature::intern("distortion")], 0.5);
    }
}
