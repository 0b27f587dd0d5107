//! Path templates with named placeholders.
//!
//! A template such as `/services/hostedservices/{service}/deployments` is
//! validated once when its descriptor is built and expanded per call from
//! [`PathArgs`].

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{BindingError, DescriptorError};

/// Encodes everything except unreserved characters and sub-delimiters, so a
/// value always stays within one path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Param(&'static str),
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    template: &'static str,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template.
    ///
    /// The template must start with `/`; placeholders are `{name}` with a
    /// non-empty name made of ASCII alphanumerics and `_`.
    pub fn parse(template: &'static str) -> Result<Self, DescriptorError> {
        let invalid = |message: &str| DescriptorError::InvalidPathTemplate {
            template: template.to_string(),
            message: message.to_string(),
        };

        if !template.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let (literal, tail) = rest.split_at(open);
            if literal.contains('}') {
                return Err(invalid("unbalanced '}'"));
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(literal));
            }
            let close = tail.find('}').ok_or_else(|| invalid("unclosed '{'"))?;
            let name = tail.get(1..close).unwrap_or_default();
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("placeholder names must be non-empty identifiers"));
            }
            segments.push(Segment::Param(name));
            rest = tail.get(close + 1..).unwrap_or_default();
        }
        if rest.contains('}') {
            return Err(invalid("unbalanced '}'"));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest));
        }

        Ok(Self { template, segments })
    }

    /// Get the template string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.template
    }

    /// Placeholder names in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(*name),
            Segment::Literal(_) => None,
        })
    }

    /// Expand the template, percent-encoding each value as a single segment.
    ///
    /// Empty values and the dot segments `.` and `..` (including their
    /// `%2e` spellings) are rejected, since URL normalization would drop or
    /// collapse them and address another resource.
    pub fn render(&self, args: &PathArgs) -> Result<String, BindingError> {
        let mut path = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Param(name) => {
                    let value = args
                        .get(name)
                        .ok_or_else(|| BindingError::MissingPathParam((*name).to_string()))?;
                    if let Some(message) = unsafe_segment(value) {
                        return Err(BindingError::InvalidValue {
                            field: (*name).to_string(),
                            message: message.to_string(),
                        });
                    }
                    path.extend(utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET));
                }
            }
        }
        Ok(path)
    }
}

fn unsafe_segment(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return Some("path segment is empty");
    }
    let dots = value.to_ascii_lowercase().replace("%2e", ".");
    matches!(dots.as_str(), "." | "..").then_some("dot segments are not allowed")
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template)
    }
}

impl AsRef<str> for PathTemplate {
    fn as_ref(&self) -> &str {
        self.template
    }
}

/// Values for path template placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathArgs {
    values: Vec<(&'static str, String)>,
}

impl PathArgs {
    /// No path arguments.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Adds (or replaces) a value.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
        self
    }

    /// Value for the placeholder.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}
