use crate::ParseError;
use std::cmp::Ordering;
use std::fmt;

/// A runtime version reduced to its numeric release segments.
///
/// Pre-release, post-release and local suffixes are ignored: `3.12.0rc1`
/// compares equal to `3.12.0`. Missing trailing segments compare as zero.
#[derive(Debug, Clone)]
pub struct PythonVersion {
    raw: String,
    release: Vec<u64>,
}

impl PythonVersion {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
        let mut release = Vec::new();

        for part in trimmed.split('.') {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                break;
            }

            let value = digits.parse::<u64>().map_err(|_| ParseError::Version {
                input: input.to_string(),
            })?;
            release.push(value);

            if digits.len() != part.len() {
                break;
            }
        }

        if release.is_empty() {
            return Err(ParseError::Version {
                input: input.to_string(),
            });
        }

        Ok(PythonVersion {
            raw: trimmed.to_string(),
            release,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// The `major.minor` form used by the `python_version` marker variable.
    pub fn major_minor(&self) -> PythonVersion {
        let release: Vec<u64> = (0..2)
            .map(|i| self.release.get(i).copied().unwrap_or(0))
            .collect();
        let raw = format!("{}.{}", release[0], release[1]);
        PythonVersion { raw, release }
    }

    /// Prefix match used by `== 3.9.*`.
    pub fn matches_prefix(&self, prefix: &PythonVersion) -> bool {
        prefix
            .release
            .iter()
            .enumerate()
            .all(|(i, segment)| self.segment(i) == *segment)
    }

    /// Compatible-release match used by `~= 3.8` and `~= 3.8.1`.
    pub fn is_compatible_with(&self, spec: &PythonVersion) -> bool {
        if self < spec {
            return false;
        }

        let len = spec.release.len();
        if len < 2 {
            return true;
        }

        spec.release[..len - 1]
            .iter()
            .enumerate()
            .all(|(i, segment)| self.segment(i) == *segment)
    }

    fn segment(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }
}

impl PartialEq for PythonVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PythonVersion {}

impl PartialOrd for PythonVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PythonVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
