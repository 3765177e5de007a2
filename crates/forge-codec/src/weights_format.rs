//! Feature weights file: `feature value` pairs, one per line, blank lines
//! and `#`-prefixed comments ignored.

use std::collections::BTreeMap;

use forge_core::feature::Feature;

use crate::error::CodecError;

pub type Weights = BTreeMap<Feature, f64>;

pub fn parse_weights(input: &str) -> Result<Weights, CodecError> {
    let mut weights = Weights::new();
    for (lineno, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| CodecError::Weights { line: lineno + 1, message: "missing feature name".to_string() })?;
        let value_text = tokens
            .next()
            .ok_or_else(|| CodecError::Weights { line: lineno + 1, message: format!("missing value for {name}") })?;
        let value: f64 = value_text
            .parse()
            .map_err(|_| CodecError::Weights { line: lineno + 1, message: format!("{value_text:?} is not a number") })?;
        weights.insert(Feature::intern(name), value);
    }
    Ok(weights)
}

pub fn serialize_weights(weights: &Weights) -> String {
    weights.iter().map(|(f, v)| format!("{f} {v}")).collect::<Vec<_>>().join("\n")
}

/// Builds a uniform-1.0 weight vector over `features`, for `--weights-one`
/// runs that skip loading a tuned weights file entirely.
pub fn weights_one(features: impl IntoIterator<Item = Feature>) -> Weights {
    features.into_iter().map(|f| (f, 1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_weights_file() {
        let weights = parse_weights("lm 0.5\ntm -0.25\n# comment\n\nwp 1.0").unwrap();
        assert_eq!(weights.len(), 3);
        assert_eq!(weights[&Feature::intern("lm")], 0.5);
    }

    #[test]
    fn rejects_missing_value() {
        assert!(parse_weights("lm").is_err());
    }

    #[test]
    fn weights_one_is_uniform() {
        let weights = weights_one([Feature::intern("lm"), Feature::intern("tm")]);
        assert!(weights.values().all(|&v| v == 1.0));
    }
}
