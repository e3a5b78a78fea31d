use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

macro_rules! code_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

code_newtype!(CourseCode);
code_newtype!(Nrc);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Sunday = 0 through Saturday = 6.
    pub fn num_days_from_sunday(self) -> u32 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub day: DayOfWeek,
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default)]
    pub location: String,
}

impl Meeting {
    pub fn overlaps(&self, other: &Meeting) -> bool {
        self.day == other.day && self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub nrc: Nrc,
    #[serde(default)]
    pub course_code: CourseCode,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    #[serde(default)]
    pub professors: Vec<String>,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub cycle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub code: CourseCode,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseKind {
    Main,
    Lab,
    Standalone,
}

/// How a course relates to its laboratory counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseLink {
    pub kind: CourseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_code: Option<CourseCode>,
}

impl CourseLink {
    pub fn main(lab_code: CourseCode) -> Self {
        Self {
            kind: CourseKind::Main,
            paired_code: Some(lab_code),
        }
    }

    pub fn lab(base_code: CourseCode) -> Self {
        Self {
            kind: CourseKind::Lab,
            paired_code: Some(base_code),
        }
    }

    pub fn standalone() -> Self {
        Self {
            kind: CourseKind::Standalone,
            paired_code: None,
        }
    }
}
