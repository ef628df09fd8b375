//! Path template matching.
//!
//! # Responsibilities
//! - Compile mux-style templates (`/v1/projects/{id}/hosts`) into segments
//! - Match a concrete request path against a template, segment by segment
//!
//! # Design Decisions
//! - Literal segments are case-sensitive and compared exactly
//! - `{name}` matches any single non-empty segment without touching regex
//! - `{name:pattern}` matches a segment only if the whole segment matches
//!   `pattern`; patterns are compiled once, when the template is built
//! - Trailing slashes are significant (`/a` and `/a/` are different templates)

use regex::Regex;

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Variable,
    Pattern(Regex),
}

impl Segment {
    fn parse(segment: &str) -> Result<Self, regex::Error> {
        let Some(inner) = segment
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .filter(|inner| !inner.is_empty())
        else {
            return Ok(Segment::Literal(segment.to_string()));
        };

        match inner.split_once(':') {
            Some((_, pattern)) if !pattern.is_empty() => {
                Regex::new(&format!("^(?:{pattern})$")).map(Segment::Pattern)
            }
            _ => Ok(Segment::Variable),
        }
    }
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template. Fails only on a `{name:pattern}` segment whose
    /// pattern is not a valid regex.
    pub fn new(template: impl Into<String>) -> Result<Self, regex::Error> {
        let raw = template.into();
        let segments = raw
            .split('/')
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { raw, segments })
    }

    /// The template exactly as written in config.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `path` is an instance of this template.
    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/');
        for segment in &self.segments {
            let Some(part) = parts.next() else {
                return false;
            };
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return false;
                    }
                }
                Segment::Variable => {
                    if part.is_empty() {
                        return false;
                    }
                }
                Segment::Pattern(pattern) => {
                    if !pattern.is_match(part) {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }
}
