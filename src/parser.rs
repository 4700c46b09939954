//! Parsers for the textual forms a parameter value can take.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, space0},
    combinator::{all_consuming, recognize, value},
    multi::many0,
    sequence::{delimited, pair},
    IResult,
};

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// `${key}`, optionally with blanks around the key.
fn blackboard_ref(i: &str) -> IResult<&str, &str> {
    delimited(tag("${"), delimited(space0, identifier, space0), tag("}"))(i)
}

/// Returns the blackboard key if the whole string is a blackboard pattern.
pub fn blackboard_pattern(s: &str) -> Option<&str> {
    all_consuming(blackboard_ref)(s).ok().map(|(_, key)| key)
}

fn bool_literal(i: &str) -> IResult<&str, bool> {
    alt((
        value(true, alt((tag("true"), tag("True"), tag("TRUE"), tag("1")))),
        value(false, alt((tag("false"), tag("False"), tag("FALSE"), tag("0")))),
    ))(i)
}

pub fn parse_bool(s: &str) -> Option<bool> {
    all_consuming(delimited(space0, bool_literal, space0))(s)
        .ok()
        .map(|(_, b)| b)
}
