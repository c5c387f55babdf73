//! CSS selector subset used by the interaction layer
//!
//! Supported grammar:
//!
//! - type (`a`), universal (`*`), class (`.nav-link`), id (`#navbar`)
//! - attribute presence (`[data-target]`) and equality (`[data-bind="x"]`)
//! - descendant (`.nav-menu a`) and child (`ul > li`) combinators
//! - selector lists (`.reveal, [data-reveal]`)

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt},
    error::{context, convert_error, ErrorKind, ParseError as NomParseError, VerboseError},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, tuple},
    Finish, IResult,
};

use crate::error::{PlatformError, Result};
use crate::page::ElementId;

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// A single simple selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    Tag(String),
    Class(String),
    Id(String),
    Attribute { name: String, value: Option<String> },
}

/// A compound selector (`a.nav-link[href]`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compound {
    pub parts: Vec<SimpleSelector>,
}

/// Relationship between two compounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// A complex selector: compounds joined by combinators
///
/// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

/// A comma-separated selector list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

/// Read access to a document tree for selector matching
pub trait ElementView {
    fn tag_name(&self, element: ElementId) -> Option<&str>;
    fn has_class(&self, element: ElementId, class: &str) -> bool;
    fn attribute(&self, element: ElementId, name: &str) -> Option<&str>;
    fn parent(&self, element: ElementId) -> Option<ElementId>;
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(selector: &str) -> Result<Self> {
        all_consuming(selector_list)(selector.trim())
            .finish()
            .map(|(_, list)| list)
            .map_err(|err| PlatformError::InvalidSelector {
                selector: selector.to_string(),
                reason: convert_error(selector.trim(), err),
            })
    }

    /// Whether any selector in the list matches the element
    pub fn matches<V: ElementView + ?Sized>(&self, view: &V, element: ElementId) -> bool {
        self.selectors.iter().any(|s| s.matches(view, element))
    }
}

impl ComplexSelector {
    pub fn matches<V: ElementView + ?Sized>(&self, view: &V, element: ElementId) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_at(view, element, n - 1),
        }
    }

    // Right-to-left match of compounds[..=index] with `element` as the subject
    fn matches_at<V: ElementView + ?Sized>(&self, view: &V, element: ElementId, index: usize) -> bool {
        if !self.compounds[index].matches(view, element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => view
                .parent(element)
                .is_some_and(|parent| self.matches_at(view, parent, index - 1)),
            Combinator::Descendant => {
                let mut ancestor = view.parent(element);
                while let Some(current) = ancestor {
                    if self.matches_at(view, current, index - 1) {
                        return true;
                    }
                    ancestor = view.parent(current);
                }
                false
            }
        }
    }
}

impl Compound {
    pub fn matches<V: ElementView + ?Sized>(&self, view: &V, element: ElementId) -> bool {
        self.parts.iter().all(|part| match part {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => view
                .tag_name(element)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag)),
            SimpleSelector::Class(class) => view.has_class(element, class),
            SimpleSelector::Id(id) => view.attribute(element, "id") == Some(id.as_str()),
            SimpleSelector::Attribute { name, value } => match (view.attribute(element, name), value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
                (None, _) => false,
            },
        })
    }
}

// =============================================================================
// Parsers
// =============================================================================

/// Identifier (alphanumeric, hyphen, underscore)
fn identifier(input: &str) -> ParseResult<&str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

fn quoted_value(input: &str) -> ParseResult<&str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
    ))(input)
}

fn attribute_selector(input: &str) -> ParseResult<SimpleSelector> {
    let (input, _) = char('[')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, value) = opt(preceded(
        tuple((char('='), multispace0)),
        alt((quoted_value, identifier)),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(']')(input)?;
    Ok((
        input,
        SimpleSelector::Attribute {
            name: name.to_string(),
            value: value.map(str::to_string),
        },
    ))
}

fn simple_selector(input: &str) -> ParseResult<SimpleSelector> {
    alt((
        map(preceded(char('.'), identifier), |c: &str| {
            SimpleSelector::Class(c.to_string())
        }),
        map(preceded(char('#'), identifier), |id: &str| {
            SimpleSelector::Id(id.to_string())
        }),
        context("attribute selector", attribute_selector),
    ))(input)
}

fn compound(input: &str) -> ParseResult<Compound> {
    let (input, head) = opt(alt((
        map(char('*'), |_| SimpleSelector::Universal),
        map(identifier, |tag: &str| {
            SimpleSelector::Tag(tag.to_ascii_lowercase())
        }),
    )))(input)?;
    let (input, rest) = many0(simple_selector)(input)?;

    let mut parts = Vec::with_capacity(rest.len() + 1);
    parts.extend(head);
    parts.extend(rest);
    if parts.is_empty() {
        return Err(nom::Err::Error(VerboseError::from_error_kind(
            input,
            ErrorKind::Verify,
        )));
    }
    Ok((input, Compound { parts }))
}

fn complex(input: &str) -> ParseResult<ComplexSelector> {
    let (mut input, first) = compound(input)?;
    let mut compounds = vec![first];
    let mut combinators = Vec::new();

    loop {
        let (rest, spaces) = multispace0(input)?;
        if let Some(after) = rest.strip_prefix('>') {
            let (after, _) = multispace0(after)?;
            let (after, next) = context("compound after '>'", compound)(after)?;
            combinators.push(Combinator::Child);
            compounds.push(next);
            input = after;
            continue;
        }
        if spaces.is_empty() || rest.is_empty() || rest.starts_with(',') {
            break;
        }
        let (rest, next) = compound(rest)?;
        combinators.push(Combinator::Descendant);
        compounds.push(next);
        input = rest;
    }

    Ok((
        input,
        ComplexSelector {
            compounds,
            combinators,
        },
    ))
}

fn selector_list(input: &str) -> ParseResult<SelectorList> {
    let (input, selectors) = separated_list1(
        tuple((multispace0, char(','), multispace0)),
        context("selector", complex),
    )(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, SelectorList { selectors }))
}
