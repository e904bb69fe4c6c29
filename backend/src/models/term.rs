//! Academic term types.
//!
//! Exclusivity invariants are scoped per [`Term`], i.e. per
//! (semester, academic year). Both parts are validated on construction so
//! that a `Term` value is always well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors produced while building term values from raw input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TermError {
    #[error("semester must be a positive integer, got {0}")]
    NonPositiveSemester(i64),

    #[error("semester {0} is out of range")]
    SemesterOutOfRange(i64),

    #[error("academic year must match YYYY-YYYY, got '{0}'")]
    MalformedAcademicYear(String),
}

/// Semester number within an academic year (1-based).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Semester(u32);

impl Semester {
    pub fn new(value: i64) -> Result<Self, TermError> {
        if value <= 0 {
            return Err(TermError::NonPositiveSemester(value));
        }
        u32::try_from(value)
            .map(Semester)
            .map_err(|_| TermError::SemesterOutOfRange(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Semester {
    type Error = TermError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Semester::new(value)
    }
}

impl From<Semester> for i64 {
    fn from(s: Semester) -> Self {
        i64::from(s.0)
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Academic year in `YYYY-YYYY` form, e.g. `2025-2026`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear {
    start: u16,
    end: u16,
}

impl AcademicYear {
    pub fn start_year(&self) -> u16 {
        self.start
    }

    pub fn end_year(&self) -> u16 {
        self.end
    }
}

fn parse_year(digits: &str) -> Option<u16> {
    if digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

impl FromStr for AcademicYear {
    type Err = TermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TermError::MalformedAcademicYear(s.to_string());
        let (start, end) = s.split_once('-').ok_or_else(malformed)?;
        let start = parse_year(start).ok_or_else(malformed)?;
        let end = parse_year(end).ok_or_else(malformed)?;
        Ok(AcademicYear { start, end })
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = TermError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AcademicYear> for String {
    fn from(year: AcademicYear) -> Self {
        year.to_string()
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:04}", self.start, self.end)
    }
}

/// The (semester, academic year) scope within which exclusivity applies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    pub semester: Semester,
    pub academic_year: AcademicYear,
}

impl Term {
    pub fn new(semester: Semester, academic_year: AcademicYear) -> Self {
        Self {
            semester,
            academic_year,
        }
    }

    /// Build a term from raw request values.
    pub fn parse(semester: i64, academic_year: &str) -> Result<Self, TermError> {
        Ok(Self::new(Semester::new(semester)?, academic_year.parse()?))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "semester {} of {}", self.semester, self.academic_year)
    }
}
