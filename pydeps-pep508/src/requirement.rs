use crate::name::is_name_char;
use crate::{MarkerTree, ParseError, is_valid_name, normalize_name};
use serde::Serialize;
use std::fmt;

/// One declared dependency line, e.g. `requests[socks]>=2.25; python_version<'3.10'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_constraint: Option<VersionConstraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_marker: Option<MarkerTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_qualifier: Option<String>,
    pub raw: String,
}

/// What the line asks of the dependency itself. `features` holds the bracketed
/// extras requested on the dependency (`name[socks]`), which are unrelated to
/// the `extra == ...` marker of the declaring package.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VersionConstraint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl VersionConstraint {
    fn is_empty(&self) -> bool {
        self.specifier.is_none() && self.url.is_none() && self.features.is_empty()
    }
}

impl Requirement {
    pub fn parse(line: &str) -> Result<Requirement, ParseError> {
        let raw = line.trim();
        if raw.is_empty() {
            return Err(ParseError::Empty);
        }

        let name_end = raw.find(|c: char| !is_name_char(c)).unwrap_or(raw.len());
        let name = &raw[..name_end];

        if !is_valid_name(name) {
            return Err(ParseError::InvalidName {
                input: raw.to_string(),
            });
        }

        let mut rest = raw[name_end..].trim_start();
        let mut constraint = VersionConstraint::default();

        if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']').ok_or_else(|| ParseError::UnclosedExtras {
                input: raw.to_string(),
            })?;

            constraint.features = after[..close]
                .split(',')
                .map(str::trim)
                .filter(|extra| !extra.is_empty())
                .map(normalize_name)
                .collect();

            rest = after[close + 1..].trim_start();
        }

        let marker_text;

        if let Some(after) = rest.strip_prefix('@') {
            let (url, marker) = split_url_marker(after);
            let url = url.trim();
            if url.is_empty() {
                return Err(ParseError::MissingUrl {
                    input: raw.to_string(),
                });
            }
            constraint.url = Some(url.to_string());
            marker_text = marker;
        } else {
            let (spec, marker) = match rest.split_once(';') {
                Some((spec, marker)) => (spec, Some(marker)),
                None => (rest, None),
            };

            let spec = strip_parens(spec.trim());
            if !spec.is_empty() {
                if !spec.starts_with(['<', '>', '=', '!', '~']) {
                    return Err(ParseError::InvalidSpecifier {
                        input: raw.to_string(),
                        specifier: spec.to_string(),
                    });
                }
                constraint.specifier = Some(normalize_specifier(spec));
            }
            marker_text = marker;
        }

        let environment_marker = match marker_text.map(str::trim) {
            Some(text) if !text.is_empty() => Some(MarkerTree::parse(text)?),
            _ => None,
        };

        let extra_qualifier = environment_marker.as_ref().and_then(MarkerTree::extra_name);

        Ok(Requirement {
            name: normalize_name(name),
            version_constraint: (!constraint.is_empty()).then_some(constraint),
            environment_marker,
            extra_qualifier,
            raw: raw.to_string(),
        })
    }

    pub fn specifier(&self) -> Option<&str> {
        self.version_constraint
            .as_ref()
            .and_then(|c| c.specifier.as_deref())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;

        if let Some(constraint) = &self.version_constraint {
            if !constraint.features.is_empty() {
                write!(f, "[{}]", constraint.features.join(","))?;
            }
            if let Some(spec) = &constraint.specifier {
                f.write_str(spec)?;
            }
            if let Some(url) = &constraint.url {
                write!(f, " @ {}", url)?;
            }
        }

        if let Some(marker) = &self.environment_marker {
            write!(f, "; {}", marker)?;
        }

        Ok(())
    }
}

/// Parses every line, dropping the ones that fail with a warning.
pub fn parse_requirements<'a, I>(lines: I) -> Vec<Requirement>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parsed = Vec::new();

    for line in lines {
        match Requirement::parse(line) {
            Ok(req) => parsed.push(req),
            Err(err) => {
                tracing::warn!(line = %line, error = %err, "skipping unparseable requirement");
            }
        }
    }

    parsed
}

// A URL may itself contain ';', so the marker separator needs whitespace before it.
fn split_url_marker(input: &str) -> (&str, Option<&str>) {
    let bytes = input.as_bytes();

    for (idx, b) in bytes.iter().enumerate() {
        if *b == b';' && idx > 0 && bytes[idx - 1].is_ascii_whitespace() {
            return (&input[..idx], Some(&input[idx + 1..]));
        }
    }

    (input, None)
}

fn strip_parens(spec: &str) -> &str {
    spec.strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(spec)
}

fn normalize_specifier(spec: &str) -> String {
    spec.split(',')
        .map(|part| part.split_whitespace().collect::<String>())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
