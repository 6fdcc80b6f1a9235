//! Front-matter parsing and metadata validation

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FrontMatterError;

/// Author field: either a single name or an ordered list of names.
///
/// The original shape is kept so metadata serializes back the way it was
/// written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Authors {
    One(String),
    Many(Vec<String>),
}

impl Default for Authors {
    fn default() -> Self {
        Authors::Many(Vec::new())
    }
}

impl Authors {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Authors::One(name) => std::slice::from_ref(name),
            Authors::Many(names) => names,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().iter().all(|name| name.trim().is_empty())
    }
}

impl<'de> Deserialize<'de> for Authors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, SeqAccess, Visitor};
        use std::fmt;

        struct StringOrVec;

        impl<'de> Visitor<'de> for StringOrVec {
            type Value = Authors;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or a list of strings")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Authors::One(value.to_string()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Authors::One(value.to_string()))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Authors::One(value.to_string()))
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Authors::One(value.to_string()))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Authors::One(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Authors::One(value))
            }

            fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
            where
                S: SeqAccess<'de>,
            {
                let mut names = Vec::new();
                while let Some(value) = seq.next_element::<serde_yaml::Value>()? {
                    let name = scalar_to_string(value)
                        .ok_or_else(|| de::Error::custom("author names must be scalars"))?;
                    names.push(name);
                }
                Ok(Authors::Many(names))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Authors::default())
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Authors::default())
            }
        }

        deserializer.deserialize_any(StringOrVec)
    }
}

/// Raw front-matter as written in a document, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub subtitle: Option<String>,
    pub authors: Option<Authors>,
    #[serde(deserialize_with = "scalar_string")]
    pub date: Option<String>,
}

/// Accept any YAML scalar where a string is expected, so `title: 1984` is a title
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value)
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected a string")),
    }
}

fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Validated document metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Authors,
    pub date: NaiveDate,
}

impl FrontMatter {
    /// Split a document into its front-matter and the remaining body.
    ///
    /// The document must open with a `---` line; the block runs until the next
    /// line that is exactly `---`. Everything after that line is returned
    /// untouched.
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let (block, body) = split_fenced(content)?;
        Ok((Self::parse_yaml(block)?, body))
    }

    fn parse_yaml(block: &str) -> Result<Self, FrontMatterError> {
        if block.trim().is_empty() {
            return Ok(FrontMatter::default());
        }

        let value: serde_yaml::Value =
            serde_yaml::from_str(block).map_err(|e| FrontMatterError::Parse(e.to_string()))?;

        match value {
            serde_yaml::Value::Null => Ok(FrontMatter::default()),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)
                .map_err(|e| FrontMatterError::Parse(e.to_string())),
            _ => Err(FrontMatterError::InvalidRootType),
        }
    }

    /// Check required fields and normalize into [`Metadata`]
    pub fn validate(self) -> Result<Metadata, FrontMatterError> {
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(FrontMatterError::MissingField("title"))?;

        let raw_date = self.date.ok_or(FrontMatterError::MissingField("date"))?;
        let date = parse_date_string(&raw_date)
            .ok_or_else(|| FrontMatterError::InvalidDate(raw_date.clone()))?;

        Ok(Metadata {
            title,
            subtitle: self.subtitle.filter(|s| !s.trim().is_empty()),
            authors: self.authors.unwrap_or_default(),
            date,
        })
    }
}

/// Locate the fenced block; returns (block, body)
fn split_fenced(content: &str) -> Result<(&str, &str), FrontMatterError> {
    let (first, block_start) = next_line(content, 0).ok_or(FrontMatterError::MissingFence)?;
    if !is_fence(first) {
        return Err(FrontMatterError::MissingFence);
    }

    let mut cursor = block_start;
    while let Some((line, next)) = next_line(content, cursor) {
        if is_fence(line) {
            return Ok((&content[block_start..cursor], &content[next..]));
        }
        cursor = next;
    }

    Err(FrontMatterError::Unterminated)
}

/// Returns the line starting at `start` (without its newline) and the offset
/// of the following line
fn next_line(input: &str, start: usize) -> Option<(&str, usize)> {
    if start >= input.len() {
        return None;
    }

    match input[start..].find('\n') {
        Some(pos) => Some((&input[start..start + pos], start + pos + 1)),
        None => Some((&input[start..], input.len())),
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}

/// Parse a calendar date, accepting a few common timestamp forms
fn parse_date_string(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // RFC 3339 keeps the date as written, not shifted to local time
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
