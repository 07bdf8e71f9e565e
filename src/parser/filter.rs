// Parser for filter expressions
//
// countries(USA, "Great Britain") | sports(Swimming) | years(1980, 2020) | season(summer) | medals(gold)

use super::lexer::{identifier, integer_literal, value_literal, ws};
use crate::error::{BoardError, BoardResult};
use crate::filter::{Facet, FilterSpec, Medal, Season};
use nom::{
    bytes::complete::tag,
    character::complete::char,
    combinator::{eof, opt},
    multi::separated_list0,
    sequence::{delimited, separated_pair},
    IResult,
};

/// One `name(args)` clause before validation
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Countries(Vec<String>),
    Sports(Vec<String>),
    Years(Option<(i32, i32)>),
    Season(Vec<String>),
    Medals(Vec<String>),
}

fn value_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), ws(value_literal)),
        ws(char(')')),
    )(input)
}

fn year_args(input: &str) -> IResult<&str, Option<(i32, i32)>> {
    delimited(
        ws(char('(')),
        opt(separated_pair(ws(integer_literal), ws(char(',')), ws(integer_literal))),
        ws(char(')')),
    )(input)
}

/// Parse a single clause
pub fn parse_clause(input: &str) -> IResult<&str, Clause> {
    let (rest, name) = ws(identifier)(input)?;
    match name.as_str() {
        "years" => {
            // years() and years(all) both mean no restriction
            let all: IResult<&str, &str> = delimited(ws(char('(')), ws(tag("all")), ws(char(')')))(rest);
            if let Ok((rest, _)) = all {
                return Ok((rest, Clause::Years(None)));
            }
            let (rest, range) = year_args(rest)?;
            Ok((rest, Clause::Years(range)))
        }
        "countries" | "country" => value_list(rest).map(|(r, v)| (r, Clause::Countries(v))),
        "sports" | "sport" => value_list(rest).map(|(r, v)| (r, Clause::Sports(v))),
        "season" => value_list(rest).map(|(r, v)| (r, Clause::Season(v))),
        "medals" | "medal" => value_list(rest).map(|(r, v)| (r, Clause::Medals(v))),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// Parse a complete expression
/// Format: clause | clause | ...
pub fn parse_filter_expr(input: &str) -> IResult<&str, Vec<Clause>> {
    let (input, clauses) = separated_list0(ws(tag("|")), parse_clause)(input)?;
    let (input, _) = ws(eof)(input)?;
    Ok((input, clauses))
}

fn is_all(values: &[String]) -> bool {
    values.is_empty() || (values.len() == 1 && values[0].eq_ignore_ascii_case("all"))
}

impl Clause {
    fn into_spec(self) -> BoardResult<FilterSpec> {
        let spec = FilterSpec::default();
        Ok(match self {
            Clause::Countries(v) if is_all(&v) => spec,
            Clause::Countries(v) => spec.countries(v),
            Clause::Sports(v) if is_all(&v) => spec,
            Clause::Sports(v) => spec.sports(v),
            Clause::Years(None) => spec,
            Clause::Years(Some((min, max))) => {
                if min > max {
                    return Err(BoardError::filter_syntax(format!(
                        "year range starts after it ends ({} > {})",
                        min, max
                    )));
                }
                spec.years(min, max)
            }
            Clause::Season(v) if is_all(&v) => spec,
            Clause::Season(v) => FilterSpec {
                season: Facet::from_values(
                    v.iter()
                        .map(|s| s.parse::<Season>())
                        .collect::<BoardResult<Vec<_>>>()?,
                ),
                ..spec
            },
            Clause::Medals(v) if is_all(&v) => spec,
            Clause::Medals(v) => spec.medals(
                v.iter()
                    .map(|m| m.parse::<Medal>())
                    .collect::<BoardResult<Vec<_>>>()?,
            ),
        })
    }
}

/// Parse a filter expression into a spec. Repeated facets intersect.
pub fn parse_filter(input: &str) -> BoardResult<FilterSpec> {
    let clauses = match parse_filter_expr(input) {
        Ok((_, clauses)) => clauses,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = input.len() - e.input.len();
            return Err(BoardError::filter_syntax(format!(
                "unexpected input at offset {}: '{}'",
                offset,
                e.input.trim()
            )));
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(BoardError::filter_syntax("incomplete filter expression"));
        }
    };

    clauses
        .into_iter()
        .try_fold(FilterSpec::default(), |acc, clause| Ok(acc.intersect(&clause.into_spec()?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::YearRange;

    #[test]
    fn test_parse_clause() {
        let (rest, clause) = parse_clause("countries(USA, \"Great Britain\") | x").unwrap();
        assert_eq!(clause, Clause::Countries(vec!["USA".into(), "Great Britain".into()]));
        assert_eq!(rest, "| x");
    }

    #[test]
    fn test_parse_years() {
        assert_eq!(parse_clause("years(1980, 2020)").unwrap().1, Clause::Years(Some((1980, 2020))));
        assert_eq!(parse_clause("years()").unwrap().1, Clause::Years(None));
        assert_eq!(parse_clause("years(all)").unwrap().1, Clause::Years(None));
    }

    #[test]
    fn test_parse_full_expression() {
        let spec = parse_filter(
            "countries(USA, \"Great Britain\") | sports(Swimming) | years(1980, 2020) | season(summer) | medals(gold, silver)",
        )
        .unwrap();
        assert_eq!(spec.countries, Facet::from_values(["USA".to_string(), "Great Britain".to_string()]));
        assert_eq!(spec.sports, Facet::from_values(["Swimming".to_string()]));
        assert_eq!(spec.years, Some(YearRange::new(1980, 2020)));
        assert_eq!(spec.season, Facet::from_values([Season::Summer]));
        assert_eq!(spec.medals, Facet::from_values([Medal::Gold, Medal::Silver]));
    }

    #[test]
    fn test_empty_and_all_mean_unrestricted() {
        assert!(parse_filter("").unwrap().is_unrestricted());
        assert!(parse_filter("  countries() | season(all) | medals(ALL)  ").unwrap().is_unrestricted());
    }

    #[test]
    fn test_clause_order_and_repetition() {
        let spec = parse_filter("medals(gold, bronze) | countries(USA) | medals(gold)").unwrap();
        assert_eq!(spec.medals, Facet::from_values([Medal::Gold]));
        let spec = parse_filter("years(1980, 2000) | years(1990, 2020)").unwrap();
        assert_eq!(spec.years, Some(YearRange::new(1990, 2000)));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_filter("colour(red)"), Err(BoardError::FilterSyntax(_))));
        assert!(matches!(parse_filter("medals(platinum)"), Err(BoardError::FilterSyntax(_))));
        assert!(matches!(parse_filter("season(spring)"), Err(BoardError::FilterSyntax(_))));
        assert!(matches!(parse_filter("years(2020, 1980)"), Err(BoardError::FilterSyntax(_))));
        assert!(matches!(parse_filter("countries(USA"), Err(BoardError::FilterSyntax(_))));
        assert!(matches!(parse_filter("countries(USA) sports(Judo)"), Err(BoardError::FilterSyntax(_))));
    }
}
