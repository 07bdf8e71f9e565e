// Token-level parsers shared by the filter expression grammar

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, map_res, opt, recognize, value},
    error::ParseError,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O, E>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an identifier: letters, digits and underscores, not starting with a digit
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
            opt(take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')),
        )),
        String::from,
    )(input)
}

/// Parse a double-quoted string with `\"` and `\\` escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((value("\\", tag("\\")), value("\"", tag("\"")))),
            )),
            char('"'),
        ),
        Option::unwrap_or_default,
    )(input)
}

/// Parse an unquoted value such as `USA`, `Great_Britain` or `Rhythmic-Gymnastics`
pub fn bare_word(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\'')),
        String::from,
    )(input)
}

/// Parse a quoted or bare value
pub fn value_literal(input: &str) -> IResult<&str, String> {
    alt((string_literal, bare_word))(input)
}

/// Parse an optionally signed integer
pub fn integer_literal(input: &str) -> IResult<&str, i32> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse)(input)
}
