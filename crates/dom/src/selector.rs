//! CSS selector engine
//!
//! Parse once, match many times. Covers the subset of Selectors Level 3 that
//! page automation actually uses:
//!
//! ```text
//! list      := complex ("," complex)*
//! complex   := compound (combinator compound)*
//! combinator:= " " | ">" | "+" | "~"
//! compound  := (type | "*")? ("#id" | ".class" | "[attr op value]")*
//! ```
//!
//! Anything else (pseudo-classes, namespaces, escapes) is rejected with
//! `DomError::InvalidSelector` instead of being silently misread.
//!
//! Matching runs right-to-left and never leaves the element's document:
//! ancestor and sibling walks stop at the document node.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId};
use std::fmt;
use std::str::FromStr;

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<ComplexSelector>,
}

/// Compound selectors joined by combinators, stored subject-first
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    subject: CompoundSelector,
    /// Walking leftwards from the subject
    steps: Vec<(Combinator, CompoundSelector)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CompoundSelector {
    /// `None` is the universal selector
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeSelector {
    name: String,
    test: Option<(AttributeOperator, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeOperator {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(source: &str) -> Result<Self> {
        let alternatives = Parser::new(source).parse_list()?;
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    /// The selector text as given
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Does the element at `node_id` match any selector in the list?
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> bool {
        let Ok(node) = arena.get(node_id) else {
            return false;
        };
        node.is_element()
            && self
                .alternatives
                .iter()
                .any(|complex| complex.matches(arena, node_id, node))
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl ComplexSelector {
    fn matches(&self, arena: &DomArena, node_id: NodeId, node: &DomNode) -> bool {
        self.subject.matches(node) && match_steps(arena, node_id, &self.steps)
    }
}

/// Backtracking match of the remaining compounds, leftwards from `node_id`
fn match_steps(
    arena: &DomArena,
    node_id: NodeId,
    steps: &[(Combinator, CompoundSelector)],
) -> bool {
    let Some(((combinator, compound), rest)) = steps.split_first() else {
        return true;
    };

    let mut candidate = match combinator {
        Combinator::Child | Combinator::Descendant => parent_element(arena, node_id),
        Combinator::NextSibling | Combinator::SubsequentSibling => {
            previous_element_sibling(arena, node_id)
        }
    };

    while let Some(current) = candidate {
        if let Ok(node) = arena.get(current) {
            if compound.matches(node) && match_steps(arena, current, rest) {
                return true;
            }
        }
        candidate = match combinator {
            Combinator::Child | Combinator::NextSibling => None,
            Combinator::Descendant => parent_element(arena, current),
            Combinator::SubsequentSibling => previous_element_sibling(arena, current),
        };
    }

    false
}

fn parent_element(arena: &DomArena, node_id: NodeId) -> Option<NodeId> {
    let parent_id = arena.get(node_id).ok()?.parent_id?;
    arena
        .get(parent_id)
        .ok()
        .filter(|parent| parent.is_element())
        .map(|_| parent_id)
}

fn previous_element_sibling(arena: &DomArena, node_id: NodeId) -> Option<NodeId> {
    let parent_id = arena.get(node_id).ok()?.parent_id?;
    let siblings = &arena.get(parent_id).ok()?.children_ids;
    let position = siblings.iter().position(|&id| id == node_id)?;

    siblings[..position]
        .iter()
        .rev()
        .copied()
        .find(|&id| arena.get(id).map(|n| n.is_element()).unwrap_or(false))
}

impl CompoundSelector {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }

    fn matches(&self, node: &DomNode) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !node.node_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.ids.iter().all(|id| node.attr("id") == Some(id.as_str())) {
            return false;
        }
        if !self
            .classes
            .iter()
            .all(|class| node.classes().any(|c| c == class))
        {
            return false;
        }
        self.attributes.iter().all(|attr| attr.matches(node))
    }
}

impl AttributeSelector {
    fn matches(&self, node: &DomNode) -> bool {
        let Some(actual) = node.attr(&self.name) else {
            return false;
        };
        let Some((operator, expected)) = &self.test else {
            return true;
        };
        let expected = expected.as_str();

        match operator {
            AttributeOperator::Equals => actual == expected,
            AttributeOperator::Includes => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && actual.split_ascii_whitespace().any(|word| word == expected)
            }
            AttributeOperator::DashMatch => {
                actual == expected
                    || (actual.starts_with(expected) && actual[expected.len()..].starts_with('-'))
            }
            AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected),
        }
    }
}

struct Parser<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::invalid_selector(self.source, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Returns whether any whitespace was consumed
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            alternatives.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.bump() {
                None => return Ok(alternatives),
                Some(',') => continue,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        let subject = compounds.pop().ok_or_else(|| self.error("empty selector"))?;
        let steps = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();
        Ok(ComplexSelector { subject, steps })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector> {
        let mut compound = CompoundSelector::default();
        let mut universal = false;

        if self.eat('*') {
            universal = true;
        } else if self.peek().is_some_and(is_ident_char) {
            compound.tag = Some(self.parse_ident()?);
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.parse_attribute()?);
                }
                Some(':') => return Err(self.error("pseudo-classes are not supported")),
                Some('|') => return Err(self.error("namespaces are not supported")),
                Some('\\') => return Err(self.error("escapes are not supported")),
                _ => break,
            }
        }

        if compound.is_empty() && !universal {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected selector, found '{}'", c)),
                None => self.error("expected selector"),
            });
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        if self.eat(']') {
            return Ok(AttributeSelector { name, test: None });
        }

        let operator = match self.bump() {
            Some('=') => AttributeOperator::Equals,
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                if !self.eat('=') {
                    return Err(self.error(format!("expected '=' after '{}'", c)));
                }
                match c {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    _ => AttributeOperator::Substring,
                }
            }
            Some(c) => return Err(self.error(format!("unexpected '{}' in attribute selector", c))),
            None => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                self.parse_quoted(quote)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();

        if !self.eat(']') {
            return Err(self.error("unterminated attribute selector"));
        }
        Ok(AttributeSelector {
            name,
            test: Some((operator, value)),
        })
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
