use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use shared::domain::{CourseCode, DayOfWeek, Nrc, Section};

use crate::{config::DEFAULT_PALETTE, orchestrator::ScheduleCandidate};

/// A dated block on the reference week. Derived from a candidate, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: String,
    pub course_code: CourseCode,
    pub nrc: Nrc,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct CalendarProjector {
    reference_monday: NaiveDate,
    palette: Vec<String>,
}

impl CalendarProjector {
    pub fn new(reference_monday: NaiveDate, palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self {
            reference_monday,
            palette,
        }
    }

    /// Both the meeting day and the reference date are counted from Sunday, so Sunday
    /// meetings land on the day before a Monday reference.
    pub fn date_for(&self, day: DayOfWeek) -> NaiveDate {
        let offset = i64::from(day.num_days_from_sunday())
            - i64::from(self.reference_monday.weekday().num_days_from_sunday());
        self.reference_monday + Duration::days(offset)
    }

    pub fn project(&self, candidates: &[ScheduleCandidate]) -> Vec<Vec<CalendarEvent>> {
        candidates
            .iter()
            .map(|candidate| self.project_candidate(candidate))
            .collect()
    }

    /// Colors follow the section's position inside the candidate, not its identity.
    pub fn project_candidate(&self, candidate: &ScheduleCandidate) -> Vec<CalendarEvent> {
        candidate
            .sections
            .iter()
            .enumerate()
            .flat_map(|(index, section)| {
                let color = &self.palette[index % self.palette.len()];
                let title = event_title(section);
                section.meetings.iter().map(move |meeting| {
                    let date = self.date_for(meeting.day);
                    CalendarEvent {
                        title: title.clone(),
                        start: date.and_time(meeting.start),
                        end: date.and_time(meeting.end),
                        color: color.clone(),
                        course_code: section.course_code.clone(),
                        nrc: section.nrc.clone(),
                        location: meeting.location.clone(),
                    }
                })
            })
            .collect()
    }
}

fn event_title(section: &Section) -> String {
    if section.professors.is_empty() {
        format!("{} - {}", section.course_code, section.nrc)
    } else {
        format!(
            "{} - {} ({})",
            section.course_code,
            section.nrc,
            section.professors.join(", ")
        )
    }
}

/// Position over the candidate list. Moves stop at either end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CandidateNavigator {
    active_index: usize,
    len: usize,
}

impl CandidateNavigator {
    pub fn new(len: usize) -> Self {
        Self {
            active_index: 0,
            len,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn select(self, index: usize) -> Self {
        Self {
            active_index: index.min(self.len.saturating_sub(1)),
            len: self.len,
        }
    }

    pub fn next(self) -> Self {
        self.select(self.active_index.saturating_add(1))
    }

    pub fn prev(self) -> Self {
        self.select(self.active_index.saturating_sub(1))
    }

    pub fn has_next(&self) -> bool {
        self.active_index + 1 < self.len
    }

    pub fn has_prev(&self) -> bool {
        self.active_index > 0
    }
}

#[cfg(test)]
#[path = "tests/calendar_tests.rs"]
mod tests;
