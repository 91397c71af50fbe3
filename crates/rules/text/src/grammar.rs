//! Line grammar for policy sources.
//!
//! Each line is trimmed and stripped of its trailing comment before being
//! recognized with `nom`. The parser only extracts structure; turning
//! expression literals into matchers is the compiler's job.

use std::fmt;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::char,
    combinator::{eof, map, value},
    multi::many0,
    sequence::{preceded, terminated, tuple},
};

use firerole_rules::RuleError;

/// The character that opened and closed an expression literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `'...'`
    Single,
    /// `"..."`
    Double,
    /// `/.../`, a regular expression.
    Slash,
}

impl Delimiter {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '\'' => Some(Self::Single),
            '"' => Some(Self::Double),
            '/' => Some(Self::Slash),
            _ => None,
        }
    }

    /// The delimiter character itself.
    pub fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
            Self::Slash => '/',
        }
    }
}

/// An expression literal with its delimiters removed.
///
/// Backslash escapes are kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExpression {
    pub delimiter: Delimiter,
    pub body: String,
}

impl fmt::Display for RawExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.delimiter.as_char();
        write!(f, "{d}{}{d}", self.body)
    }
}

/// One rule line, before alias resolution and matcher compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule {
    /// 1-based line number in the source.
    pub line: usize,
    /// The trimmed line as written, comment included.
    pub row: String,
    pub allow: bool,
    pub negate: bool,
    /// Field name as written.
    pub field: String,
    pub expressions: Vec<RawExpression>,
}

/// The rules of a source, in order, plus the default set by an any-rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSource {
    pub rules: Vec<RawRule>,
    /// `true` only if an `allow any` line was reached.
    pub default_allow: bool,
}

/// Parse policy source text into raw rules.
///
/// Parsing stops at the first `allow any` / `deny any` line; anything after
/// it is not examined.
pub fn parse(source: &str) -> Result<ParsedSource, RuleError> {
    let mut parsed = ParsedSource::default();

    for (index, line) in source.lines().enumerate() {
        let row = line.trim();
        let clean = strip_comment(row);
        if clean.is_empty() {
            continue;
        }

        if let Ok((_, allow)) = any_rule(clean) {
            parsed.default_allow = allow;
            break;
        }

        let (_, rule) = full_rule(clean)
            .map_err(|_| RuleError::compile(row, index + 1, "not a valid rule!"))?;
        parsed.rules.push(RawRule {
            line: index + 1,
            row: row.to_owned(),
            allow: rule.allow,
            negate: rule.negate,
            field: rule.field.to_owned(),
            expressions: rule.expressions,
        });
    }

    Ok(parsed)
}

/// Drop everything from the first unescaped `#`, and the whitespace before
/// it.
fn strip_comment(row: &str) -> &str {
    let mut prev = None;
    for (i, c) in row.char_indices() {
        if c == '#' && prev != Some('\\') {
            return row[..i].trim_end();
        }
        prev = Some(c);
    }
    row
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

fn ws0(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

fn ws1(input: &str) -> IResult<&str, &str> {
    take_while1(char::is_whitespace)(input)
}

/// `allow` or `deny`, returning whether it allows.
fn command(input: &str) -> IResult<&str, bool> {
    alt((
        value(true, tag_no_case("allow")),
        value(false, tag_no_case("deny")),
    ))(input)
}

/// ASCII word characters.
fn field_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// A delimited literal. The body is at least one character long; the first
/// body character is taken unconditionally, after which the literal ends at
/// the first delimiter not preceded by a backslash.
fn expression(input: &str) -> IResult<&str, RawExpression> {
    let fail = || nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char));

    let mut chars = input.char_indices();
    let delimiter = chars
        .next()
        .and_then(|(_, c)| Delimiter::from_char(c))
        .ok_or_else(fail)?;
    let close = delimiter.as_char();
    let (_, mut prev) = chars.next().ok_or_else(fail)?;

    for (i, c) in chars {
        if c == close && prev != '\\' {
            let expr = RawExpression {
                delimiter,
                body: input[1..i].to_owned(),
            };
            return Ok((&input[i + 1..], expr));
        }
        prev = c;
    }
    Err(fail())
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

struct ParsedRule<'a> {
    allow: bool,
    negate: bool,
    field: &'a str,
    expressions: Vec<RawExpression>,
}

/// `allow|deny any`, optionally followed by whitespace and anything else.
fn any_rule(input: &str) -> IResult<&str, bool> {
    let (input, allow) = terminated(command, ws1)(input)?;
    let (input, _) = tag_no_case("any")(input)?;
    let (input, _) = alt((eof, ws1))(input)?;
    Ok((input, allow))
}

/// `allow|deny [not] FIELD expr (, expr)*`, trailing text ignored.
///
/// `not` is only a keyword when a field and an expression follow it, so
/// `deny not 'x'` is a rule on a field named `not`.
fn full_rule(input: &str) -> IResult<&str, ParsedRule<'_>> {
    let (input, allow) = terminated(command, ws1)(input)?;
    let (input, (negate, field, first)) = alt((
        map(
            tuple((tag_no_case("not"), ws1, field_name, ws1, expression)),
            |(_, _, field, _, expr)| (true, field, expr),
        ),
        map(tuple((field_name, ws1, expression)), |(field, _, expr)| {
            (false, field, expr)
        }),
    ))(input)?;
    let (input, rest) = many0(preceded(tuple((ws0, char(','), ws0)), expression))(input)?;

    let mut expressions = Vec::with_capacity(rest.len() + 1);
    expressions.push(first);
    expressions.extend(rest);

    Ok((
        input,
        ParsedRule {
            allow,
            negate,
            field,
            expressions,
        },
    ))
}
