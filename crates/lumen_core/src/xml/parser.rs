//! Low-level helpers for reading the XML scene format.
//!
//! The scene file stores almost everything as whitespace-separated numbers in
//! element text. These helpers pull typed values out of `roxmltree` nodes and
//! report where the document was malformed.

use lumen_math::{Vec3, Vec4};
use roxmltree::Node;
use thiserror::Error;

/// Errors that can occur while reading scene XML.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Expected root element <Scene>, found <{0}>")]
    UnexpectedRoot(String),

    #[error("Missing <{name}> in <{parent}>")]
    MissingElement { parent: String, name: String },

    #[error("Missing attribute {name} on <{element}>")]
    MissingAttribute { element: String, name: String },

    #[error("Invalid number {value:?} in <{element}>")]
    InvalidNumber { element: String, value: String },

    #[error("<{element}> expects {expected} values, found {found}")]
    WrongCount {
        element: String,
        expected: String,
        found: usize,
    },

    #[error("Invalid transformation reference {0:?}")]
    InvalidTransformRef(String),

    #[error("<{element}> must be at least 1x1, found {width}x{height}")]
    EmptyImage { element: String, width: u32, height: u32 },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// The kind of a transformation reference such as `s1`, `t2` or `r1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformKind {
    Scaling,
    Translation,
    Rotation,
}

fn tag(node: Node) -> String {
    node.tag_name().name().to_string()
}

/// First child element named `name`.
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

/// All child elements named `name`, in document order.
pub fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.has_tag_name(name))
}

/// First child element named `name`, or a `MissingElement` error.
pub fn required_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> ParseResult<Node<'a, 'input>> {
    child(node, name).ok_or_else(|| ParseError::MissingElement {
        parent: tag(node),
        name: name.to_string(),
    })
}

/// Element text with surrounding whitespace removed; empty when absent.
pub fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().map(str::trim).unwrap_or("")
}

fn parse_all<T: std::str::FromStr>(node: Node) -> ParseResult<Vec<T>> {
    text(node)
        .split_whitespace()
        .map(|tok| {
            tok.parse::<T>().map_err(|_| ParseError::InvalidNumber {
                element: tag(node),
                value: tok.to_string(),
            })
        })
        .collect()
}

fn exactly<T>(node: Node, values: Vec<T>, n: usize) -> ParseResult<Vec<T>> {
    if values.len() != n {
        return Err(ParseError::WrongCount {
            element: tag(node),
            expected: n.to_string(),
            found: values.len(),
        });
    }
    Ok(values)
}

/// All floats in the element text.
pub fn floats(node: Node) -> ParseResult<Vec<f32>> {
    parse_all(node)
}

/// All non-negative integers in the element text.
pub fn uints(node: Node) -> ParseResult<Vec<usize>> {
    parse_all(node)
}

/// All values in the element text as `u32`; anything out of range is an
/// invalid number.
pub fn u32s(node: Node) -> ParseResult<Vec<u32>> {
    parse_all(node)
}

pub fn float(node: Node) -> ParseResult<f32> {
    Ok(exactly(node, floats(node)?, 1)?[0])
}

pub fn uint(node: Node) -> ParseResult<usize> {
    Ok(exactly(node, uints(node)?, 1)?[0])
}

pub fn u32_value(node: Node) -> ParseResult<u32> {
    Ok(exactly(node, u32s(node)?, 1)?[0])
}

pub fn vec3(node: Node) -> ParseResult<Vec3> {
    let v = exactly(node, floats(node)?, 3)?;
    Ok(Vec3::new(v[0], v[1], v[2]))
}

pub fn vec4(node: Node) -> ParseResult<Vec4> {
    let v = exactly(node, floats(node)?, 4)?;
    Ok(Vec4::new(v[0], v[1], v[2], v[3]))
}

/// Floats grouped into fixed-size tuples (e.g. `VertexData`).
pub fn float_groups(node: Node, size: usize) -> ParseResult<Vec<Vec<f32>>> {
    let values = floats(node)?;
    if values.len() % size != 0 {
        return Err(ParseError::WrongCount {
            element: tag(node),
            expected: format!("a multiple of {}", size),
            found: values.len(),
        });
    }
    Ok(values.chunks(size).map(<[f32]>::to_vec).collect())
}

/// Integer triples (e.g. mesh `Faces`).
pub fn uint_triples(node: Node) -> ParseResult<Vec<[usize; 3]>> {
    let values = uints(node)?;
    if values.len() % 3 != 0 {
        return Err(ParseError::WrongCount {
            element: tag(node),
            expected: "a multiple of 3".to_string(),
            found: values.len(),
        });
    }
    Ok(values.chunks(3).map(|c| [c[0], c[1], c[2]]).collect())
}

/// Optional child parsed with `f`, falling back to `default` when absent.
pub fn child_or<T>(
    node: Node,
    name: &str,
    default: T,
    f: impl Fn(Node) -> ParseResult<T>,
) -> ParseResult<T> {
    match child(node, name) {
        Some(c) => f(c),
        None => Ok(default),
    }
}

/// Required integer attribute.
pub fn uint_attribute(node: Node, name: &str) -> ParseResult<usize> {
    let value = node
        .attribute(name)
        .ok_or_else(|| ParseError::MissingAttribute {
            element: tag(node),
            name: name.to_string(),
        })?;
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        element: tag(node),
        value: value.to_string(),
    })
}

/// Parse a reference list such as `"s1 t2 r1"` into kinds and 1-based ids.
///
/// A space between the letter and the number is accepted (`"s 1"`).
pub fn transform_refs(s: &str) -> ParseResult<Vec<(TransformKind, usize)>> {
    let mut refs = Vec::new();
    let mut tokens = s.split_whitespace().peekable();

    while let Some(tok) = tokens.next() {
        let mut chars = tok.chars();
        let kind = match chars.next() {
            Some('s') => TransformKind::Scaling,
            Some('t') => TransformKind::Translation,
            Some('r') => TransformKind::Rotation,
            _ => return Err(ParseError::InvalidTransformRef(tok.to_string())),
        };

        let digits = chars.as_str();
        let digits = if digits.is_empty() {
            tokens
                .next()
                .ok_or_else(|| ParseError::InvalidTransformRef(tok.to_string()))?
        } else {
            digits
        };
        let id = digits
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidTransformRef(tok.to_string()))?;
        refs.push((kind, id));
    }

    Ok(refs)
}
