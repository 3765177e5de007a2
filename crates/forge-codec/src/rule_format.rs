//! The rule textual format: `LHS ||| rhs tokens... ||| feat=val attr=val ...`
//!
//! The trailing `||| feat=val ...` field is optional, so a bare
//! `LHS ||| rhs` line round-trips with empty features and attributes.

use nom::bytes::complete::{tag, take_until};
use nom::combinator::rest;
use nom::multi::many0;
use nom::sequence::terminated;
use nom::IResult;

use forge_core::attribute::{Attribute, AttributeMap, AttributeValue};
use forge_core::feature::{Feature, FeatureVector};
use forge_core::symbol::Symbol;

use crate::error::CodecError;
use crate::location::Location;

fn fields(input: &str) -> IResult<&str, Vec<&str>> {
    let (remaining, mut parts) = many0(terminated(take_until("|||"), tag("|||")))(input)?;
    let (remaining, last) = rest(remaining)?;
    parts.push(last);
    Ok((remaining, parts.into_iter().map(str::trim).collect()))
}

pub(crate) fn parse_assignment(token: &str, features: &mut FeatureVector, attributes: &mut AttributeMap) -> Result<(), CodecError> {
    let (key, value) = token
        .split_once('=')
        .ok_or_else(|| CodecError::parse(Location::start(), format!("expected key=value, got {token:?}")))?;

    if let Ok(v) = value.parse::<f64>() {
        features.insert(Feature::intern(key), v);
        return Ok(());
    }
    let attr_value = match value {
        "true" => AttributeValue::Bool(true),
        "false" => AttributeValue::Bool(false),
        _ => match value.parse::<i64>() {
            Ok(i) => AttributeValue::Int(i),
            Err(_) => AttributeValue::Str(value.to_string()),
        },
    };
    attributes.insert(Attribute::intern(key), attr_value);
    Ok(())
}

/// A parsed rule line: the `(lhs, rhs)` pair plus whatever feature/attribute
/// assignments followed it.
pub struct ParsedRule {
    pub lhs: Symbol,
    pub rhs: Vec<Symbol>,
    pub features: FeatureVector,
    pub attributes: AttributeMap,
}

pub fn parse_rule(input: &str) -> Result<ParsedRule, CodecError> {
    let (_, parts) = fields(input).map_err(|e| CodecError::parse(Location::start(), format!("malformed rule line: {e}")))?;
    if parts.len() < 2 || parts[0].is_empty() {
        return Err(CodecError::parse(Location::start(), "rule line needs at least `LHS ||| rhs`"));
    }

    let lhs = Symbol::intern(parts[0]);
    let rhs: Vec<Symbol> = parts[1].split_whitespace().map(Symbol::intern).collect();

    let mut features = FeatureVector::new();
    let mut attributes = AttributeMap::new();
    for extra in &parts[2..] {
        for token in extra.split_whitespace() {
            parse_assignment(token, &mut features, &mut attributes)?;
        }
    }

    Ok(ParsedRule {
        lhs,
        rhs,
        features,
        attributes,
    })
}

pub fn serialize_rule(lhs: Symbol, rhs: &[Symbol], features: &FeatureVector, attributes: &AttributeMap) -> String {
    let mut out = format!("{lhs} |||");
    for sym in rhs {
        out.push(' ');
        out.push_str(&sym.to_string());
    }
    if features.is_empty() && attributes.is_empty() {
        return out;
    }
    out.push_str(" |||");
    for (feature, value) in features {
        out.push_str(&format!(" {feature}={value}"));
    }
    for (attribute, value) in attributes {
        out.push_str(&format!(" {attribute}={value}"));
    }
    out
}
