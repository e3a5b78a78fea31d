use serde::{Deserialize, Serialize};

use crate::domain::Section;

/// `POST /schedules` body: outer index = course, inner = sections chosen for that course.
pub type ScheduleRequest = Vec<Vec<Section>>;

/// `POST /schedules` reply: outer index = candidate, inner = one section per requested course,
/// in request order.
pub type ScheduleResponse = Vec<Vec<Section>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSearchQuery {
    #[serde(rename = "nameInput")]
    pub name_input: String,
}

impl CourseSearchQuery {
    /// Turns free text into the directory's wildcard form: every whitespace run becomes `%`.
    /// Returns `None` for a blank query, which must never be sent.
    pub fn from_free_text(raw: &str) -> Option<Self> {
        let words: Vec<&str> = raw.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }
        Some(Self {
            name_input: words.join("%"),
        })
    }
}
