//! Line-oriented lattice format: one line per source position, each line a
//! `|`-separated list of outgoing arcs `label:distance[:feat=val,feat=val]`.
//! `distance` is the number of positions the arc spans (almost always `1`
//! for a confusion network, more for a skip edge). A position with no
//! arcs — the sink — is written as a blank line.

use nom::bytes::complete::is_not;
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map, map_res, opt};
use nom::multi::separated_list1;
use nom::sequence::{preceded, separated_pair};
use nom::IResult;

use forge_core::feature::{Feature, FeatureVector};
use forge_core::lattice::{Arc, Lattice};
use forge_core::symbol::Symbol;

use crate::error::CodecError;
use crate::location::Location;

fn label_token(input: &str) -> IResult<&str, &str> {
    is_not(":|\n")(input)
}

fn feature_entry(input: &str) -> IResult<&str, (Feature, f64)> {
    map(
        separated_pair(is_not("=,"), char('='), map_res(is_not(",:|\n"), str::parse::<f64>)),
        |(k, v)| (Feature::intern(k), v),
    )(input)
}

fn features(input: &str) -> IResult<&str, FeatureVector> {
    map(separated_list1(char(','), feature_entry), |entries| entries.into_iter().collect())(input)
}

fn arc(input: &str) -> IResult<&str, Arc> {
    let (input, label) = label_token(input)?;
    let (input, _) = char(':')(input)?;
    let (input, distance) = map_res(digit1, str::parse::<usize>)(input)?;
    let (input, features) = opt(preceded(char(':'), features))(input)?;
    Ok((input, Arc::new(Symbol::intern(label.trim()), distance, features.unwrap_or_default())))
}

fn position(line: &str, lineno: usize) -> Result<Vec<Arc>, CodecError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split('|')
        .map(|part| {
            let part = part.trim();
            all_consuming(arc)(part)
                .map(|(_, a)| a)
                .map_err(|e| CodecError::parse(Location { line: lineno + 1, column: 1, offset: 0 }, format!("malformed arc {part:?}: {e}")))
        })
        .collect()
}

pub fn parse_lattice(input: &str) -> Result<Lattice, CodecError> {
    let positions: Result<Vec<Vec<Arc>>, CodecError> =
        input.lines().enumerate().map(|(lineno, line)| position(line, lineno)).collect();
    Ok(Lattice::new(positions?))
}

fn serialize_arc(arc: &Arc) -> String {
    let mut out = format!("{}:{}", arc.label, arc.distance);
    if !arc.features.is_empty() {
        out.push(':');
        let parts: Vec<String> = arc.features.iter().map(|(f, v)| format!("{f}={v}")).collect();
        out.push_str(&parts.join(","));
    }
    out
}

pub fn serialize_lattice(lattice: &Lattice) -> String {
    lattice
        .positions()
        .iter()
        .map(|arcs| arcs.iter().map(serialize_arc).collect::<Vec<_>>().join(" | "))
        .collect::<Vec<_>>()
        .join("\n")
}
