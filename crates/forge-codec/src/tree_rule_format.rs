//! Tree-rule s-expression format: `(label child child ...)`, where a
//! childless `(label)` and a bare unparenthesized token both denote a
//! frontier leaf. Parens and backslashes inside a label are escaped with a
//! leading backslash, e.g. `(\()` is a single leaf labelled `(`.

use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, is_not};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{all_consuming, map, value};
use nom::multi::many0;
use nom::sequence::preceded;
use nom::IResult;

use forge_core::symbol::Symbol;
use forge_core::tree_rule::TreeRule;

use crate::error::CodecError;
use crate::location::Location;

fn label(input: &str) -> IResult<&str, String> {
    escaped_transform(
        is_not("\\() \t\n"),
        '\\',
        alt((value("(", char('(')), value(")", char(')')), value("\\", char('\\')))),
    )(input)
}

fn bare_leaf(input: &str) -> IResult<&str, TreeRule> {
    map(label, |text| TreeRule::leaf(Symbol::intern(&text)))(input)
}

fn parenthesized(input: &str) -> IResult<&str, TreeRule> {
    let (input, _) = char('(')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, label_text) = label(input)?;
    let (input, children) = many0(preceded(multispace1, tree_rule))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    let sym = Symbol::intern(&label_text);
    Ok((
        input,
        if children.is_empty() {
            TreeRule::leaf(sym)
        } else {
            TreeRule::internal(sym, children)
        },
    ))
}

fn tree_rule(input: &str) -> IResult<&str, TreeRule> {
    alt((parenthesized, bare_leaf))(input)
}

pub fn parse_tree_rule(input: &str) -> Result<TreeRule, CodecError> {
    let trimmed = input.trim();
    all_consuming(tree_rule)(trimmed)
        .map(|(_, tree)| tree)
        .map_err(|e| CodecError::parse(Location::start(), format!("malformed tree-rule: {e}")))
}

fn escape_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.chars() {
        if matches!(ch, '(' | ')' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn serialize_tree_rule(tree: &TreeRule) -> String {
    if tree.is_leaf() {
        escape_label(&tree.label.as_str())
    } else {
        let mut out = format!("({}", escape_label(&tree.label.as_str()));
        for child in &tree.antecedents {
            out.push(' ');
            out.push_str(&serialize_tree_rule(child));
        }
        out.push(')');
        out
    }
}
