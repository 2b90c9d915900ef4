use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::CldrError;

/// The kind of change a bullet describes.
///
/// Each kind maps to one `### Section` of a released changelog version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Add,
    Chg,
    Dep,
    Fix,
    Misc,
    Rm,
    Sec,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Kind; 7] = [
        Kind::Add,
        Kind::Chg,
        Kind::Dep,
        Kind::Fix,
        Kind::Misc,
        Kind::Rm,
        Kind::Sec,
    ];

    /// The short name used in bullet lines (e.g. `chg`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Add => "add",
            Kind::Chg => "chg",
            Kind::Dep => "dep",
            Kind::Fix => "fix",
            Kind::Misc => "misc",
            Kind::Rm => "rm",
            Kind::Sec => "sec",
        }
    }

    /// The changelog subsection title (e.g. `Changed`)
    pub fn section_title(&self) -> &'static str {
        match self {
            Kind::Add => "Added",
            Kind::Chg => "Changed",
            Kind::Dep => "Deprecated",
            Kind::Fix => "Fixed",
            Kind::Misc => "Miscellaneous",
            Kind::Rm => "Removed",
            Kind::Sec => "Security",
        }
    }

    /// All kinds ordered by section title, which is the order subsections
    /// appear in within a released version.
    pub fn in_section_order() -> Vec<Kind> {
        let mut kinds = Kind::ALL.to_vec();
        kinds.sort_by_key(|kind| kind.section_title());
        kinds
    }

    /// Sorted list of valid short names, for error messages and help text.
    pub fn valid_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Kind::ALL.iter().map(Kind::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = CldrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| {
                CldrError::parse(format!(
                    "Invalid bullet kind {:?}. Use one of the following supported bullet \
                     kinds instead: {:?}",
                    lowered,
                    Kind::valid_names()
                ))
            })
    }
}
