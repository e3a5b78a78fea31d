use std::sync::Arc;

use client_core::ScheduleGenerator;
use shared::domain::{CourseCode, Section};
use thiserror::Error;
use tracing::{info, warn};

use crate::selection::Selection;

pub const EMPTY_SCHEDULES_MESSAGE: &str =
    "No conflict-free schedule exists for the selected sections. Try picking more sections.";

/// One section per selected course, in selection order, each tagged with its course code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleCandidate {
    pub sections: Vec<Section>,
}

impl ScheduleCandidate {
    pub fn has_overlap(&self) -> bool {
        let meetings: Vec<_> = self
            .sections
            .iter()
            .enumerate()
            .flat_map(|(index, section)| section.meetings.iter().map(move |m| (index, m)))
            .collect();
        meetings.iter().enumerate().any(|(i, (owner, meeting))| {
            meetings[i + 1..]
                .iter()
                .any(|(other_owner, other)| owner != other_owner && meeting.overlaps(other))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleFailure {
    #[error("Could not generate schedules right now. Please try again later.")]
    FetchFailed,
    #[error("The schedule service sent an unexpected answer. Please try again later.")]
    MalformedResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    NoSelection,
    Candidates(Vec<ScheduleCandidate>),
    Empty,
    Failed(ScheduleFailure),
}

pub struct ScheduleOrchestrator {
    generator: Arc<dyn ScheduleGenerator>,
}

impl ScheduleOrchestrator {
    pub fn new(generator: Arc<dyn ScheduleGenerator>) -> Self {
        Self { generator }
    }

    /// One request per call, no retries. The service answers sections in request course
    /// order, which is how each returned section gets its course code back.
    pub async fn fetch_schedules(&self, selection: &Selection) -> ScheduleOutcome {
        if selection.is_empty() {
            return ScheduleOutcome::NoSelection;
        }

        let course_order = selection.course_order();
        let request = selection.sections_per_course();
        let response = match self.generator.generate_schedules(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(courses = course_order.len(), "schedules: fetch failed: {err:#}");
                return ScheduleOutcome::Failed(ScheduleFailure::FetchFailed);
            }
        };

        if response.is_empty() {
            info!(courses = course_order.len(), "schedules: no conflict-free combination");
            return ScheduleOutcome::Empty;
        }

        let mut candidates = Vec::with_capacity(response.len());
        for (index, sections) in response.into_iter().enumerate() {
            let Some(candidate) = tag_candidate(&course_order, sections) else {
                warn!(
                    candidate = index,
                    courses = course_order.len(),
                    "schedules: candidate does not line up with requested courses"
                );
                return ScheduleOutcome::Failed(ScheduleFailure::MalformedResponse);
            };
            if candidate.has_overlap() {
                warn!(candidate = index, "schedules: dropping overlapping candidate");
                continue;
            }
            candidates.push(candidate);
        }

        if candidates.is_empty() {
            return ScheduleOutcome::Empty;
        }
        info!(
            courses = course_order.len(),
            candidates = candidates.len(),
            "schedules: candidates ready"
        );
        ScheduleOutcome::Candidates(candidates)
    }
}

fn tag_candidate(course_order: &[CourseCode], sections: Vec<Section>) -> Option<ScheduleCandidate> {
    if sections.len() != course_order.len() {
        return None;
    }
    let sections = sections
        .into_iter()
        .zip(course_order)
        .map(|(mut section, code)| {
            section.course_code = code.clone();
            section
        })
        .collect();
    Some(ScheduleCandidate { sections })
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
