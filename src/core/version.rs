//! Purpose: Version-string grammar, ordering, and the two-tier compatibility check.
//! Exports: `Version`, `Requirement`, `VersionSpec`, `vcompare`, `vsatisfies`.
//! Role: Single source of truth for "does this provided version satisfy that spec".
//! Invariants: A spec with exactly one non-digit character is matched as a raw text
//! prefix of the provided version, whatever the caller's `exact` flag says.
//! Invariants: Every other spec shape is matched numerically by segment.
//! Notes: `a`/`b` release tags rank below the release they precede (8.5a1 < 8.5b1 < 8.5).
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, ErrorKind};

const ALPHA: i64 = -2;
const BETA: i64 = -1;

/// A parsed version such as `8.6.0`, `8.5` or `9.0b2`.
///
/// Equality and ordering are numeric by segment, so `8.05` equals `8.5`
/// while still displaying as written.
#[derive(Clone, Debug)]
pub struct Version {
    text: String,
    segments: Vec<i64>,
}

impl Version {
    pub fn parse(text: &str) -> Result<Self, Error> {
        let segments = parse_segments(text).ok_or_else(|| invalid_version(text))?;
        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn major(&self) -> i64 {
        self.segments[0]
    }

    /// Numeric segments; release tags appear as negative markers.
    pub fn segments(&self) -> &[i64] {
        &self.segments
    }

    fn leading(&self, count: usize) -> &[i64] {
        &self.segments[..count.min(self.segments.len())]
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_segments(&self.segments, &other.segments)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_segments(text: &str) -> Option<Vec<i64>> {
    let mut segments = Vec::new();
    let mut current: Option<i64> = None;
    for ch in text.chars() {
        if let Some(digit) = ch.to_digit(10) {
            let value = current.unwrap_or(0);
            current = Some(value.checked_mul(10)?.checked_add(i64::from(digit))?);
            continue;
        }
        let marker = match ch {
            '.' => None,
            'a' => Some(ALPHA),
            'b' => Some(BETA),
            _ => return None,
        };
        segments.push(current.take()?);
        segments.extend(marker);
    }
    segments.push(current?);
    Some(segments)
}

// A version that runs out first is smaller, unless the longer one continues
// with a release tag (8.5 < 8.5.0, but 8.5a1 < 8.5).
fn compare_segments(left: &[i64], right: &[i64]) -> Ordering {
    let mut idx = 0;
    loop {
        match (left.get(idx), right.get(idx)) {
            (None, None) => return Ordering::Equal,
            (Some(l), None) => {
                return if *l < 0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
            (None, Some(r)) => {
                return if *r < 0 {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
            }
            (Some(l), Some(r)) if l != r => return l.cmp(r),
            _ => idx += 1,
        }
    }
}

fn invalid_version(text: &str) -> Error {
    Error::new(ErrorKind::Usage)
        .with_message(format!("expected version number but got \"{text}\""))
        .with_hint("Versions are digits separated by '.', 'a' or 'b', e.g. 8.6.0 or 9.0b2.")
}

/// Numeric shape of a version spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Empty spec: any provided version.
    Any,
    /// Bare version such as `8` or `8.5.1`.
    Min(Version),
    /// `min-max`, or `min-` when `max` is `None`.
    Range { min: Version, max: Option<Version> },
}

impl Requirement {
    pub fn parse(text: &str) -> Result<Self, Error> {
        if text.is_empty() {
            return Ok(Requirement::Any);
        }
        match text.split_once('-') {
            None => Ok(Requirement::Min(Version::parse(text)?)),
            Some((min, max)) => {
                let min = Version::parse(min).map_err(|_| invalid_spec(text))?;
                let max = if max.is_empty() {
                    None
                } else {
                    Some(Version::parse(max).map_err(|_| invalid_spec(text))?)
                };
                Ok(Requirement::Range { min, max })
            }
        }
    }

    /// Numeric range rule; `exact` only narrows the bare-version form.
    pub fn accepts(&self, provided: &Version, exact: bool) -> bool {
        match self {
            Requirement::Any => true,
            Requirement::Min(min) if exact => provided.segments.starts_with(&min.segments),
            Requirement::Min(min) => provided >= min && provided.major() == min.major(),
            Requirement::Range { min, max: None } => provided >= min,
            Requirement::Range {
                min,
                max: Some(max),
            } => {
                provided >= min
                    && compare_segments(provided.leading(2), &max.segments) != Ordering::Greater
            }
        }
    }
}

fn invalid_spec(text: &str) -> Error {
    Error::new(ErrorKind::Usage)
        .with_message(format!("expected versionMin-versionMax but got \"{text}\""))
        .with_hint("Use a bare version (8.5), a range (8.5-9.1) or an open range (8.5-).")
}

/// Caller-supplied version spec, kept verbatim because the bare-pair rule
/// compares raw text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionSpec {
    text: String,
    requirement: Requirement,
}

impl VersionSpec {
    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(Self {
            text: text.to_string(),
            requirement: Requirement::parse(text)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Exactly one non-digit character: `major.minor`.
    pub fn is_bare_pair(&self) -> bool {
        separator_count(&self.text) == 1
    }

    pub fn accepts(&self, provided: &Version, exact: bool) -> bool {
        if self.is_bare_pair() {
            return provided.as_str().starts_with(self.text.as_str());
        }
        self.requirement.accepts(provided, exact)
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub fn separator_count(spec: &str) -> usize {
    spec.chars().filter(|ch| !ch.is_ascii_digit()).count()
}

pub fn vcompare(left: &str, right: &str) -> Result<Ordering, Error> {
    Ok(Version::parse(left)?.cmp(&Version::parse(right)?))
}

pub fn vsatisfies(version: &str, spec: &str, exact: bool) -> Result<bool, Error> {
    let version = Version::parse(version)?;
    Ok(VersionSpec::parse(spec)?.accepts(&version, exact))
}
