use std::collections::{BTreeMap, BTreeSet};

use shared::domain::{Course, CourseCode, Section};

use crate::{
    calendar::{CalendarEvent, CandidateNavigator},
    orchestrator::{ScheduleCandidate, ScheduleFailure, EMPTY_SCHEDULES_MESSAGE},
    requirement::RequirementError,
    selection::Selection,
};

pub const SEARCH_FAILED_MESSAGE: &str = "Could not search courses right now. Please try again later.";
pub const NO_COURSES_MESSAGE: &str = "No courses match your search.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    Ready(Vec<Course>),
    Empty,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchedulePhase {
    #[default]
    NoSelection,
    Validating,
    Fetching,
    Ready,
    Empty(String),
    Error(String),
    Blocked(RequirementError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionPanel {
    Loading,
    Loaded(Vec<Section>),
    Failed(String),
}

/// Render-ready snapshot. Never mutated in place; [`reduce`] produces the next one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub revision: u64,
    pub search: SearchPhase,
    pub schedule: SchedulePhase,
    pub selection: Selection,
    pub warning: Option<String>,
    pub expanded_courses: BTreeSet<CourseCode>,
    pub section_panels: BTreeMap<CourseCode, SectionPanel>,
    pub candidates: Vec<ScheduleCandidate>,
    pub calendar: Vec<Vec<CalendarEvent>>,
    pub navigator: CandidateNavigator,
}

impl ViewState {
    pub fn loading(&self) -> bool {
        matches!(self.search, SearchPhase::Searching)
            || matches!(
                self.schedule,
                SchedulePhase::Validating | SchedulePhase::Fetching
            )
    }

    pub fn empty(&self) -> bool {
        matches!(self.search, SearchPhase::Empty) || matches!(self.schedule, SchedulePhase::Empty(_))
    }

    pub fn empty_message(&self) -> Option<&str> {
        match (&self.schedule, &self.search) {
            (SchedulePhase::Empty(message), _) => Some(message),
            (_, SearchPhase::Empty) => Some(NO_COURSES_MESSAGE),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.search {
            SearchPhase::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn schedule_error(&self) -> Option<String> {
        match &self.schedule {
            SchedulePhase::Error(message) => Some(message.clone()),
            SchedulePhase::Blocked(err) => Some(err.to_string()),
            _ => None,
        }
    }

    pub fn search_results(&self) -> &[Course] {
        match &self.search {
            SearchPhase::Ready(courses) => courses,
            _ => &[],
        }
    }

    pub fn active_candidate_index(&self) -> usize {
        self.navigator.active_index()
    }

    pub fn active_candidate(&self) -> Option<&ScheduleCandidate> {
        self.candidates.get(self.navigator.active_index())
    }

    pub fn active_events(&self) -> &[CalendarEvent] {
        self.calendar
            .get(self.navigator.active_index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_expanded(&self, course_code: &CourseCode) -> bool {
        self.expanded_courses.contains(course_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    SearchStarted,
    SearchCleared,
    SearchSucceeded(Vec<Course>),
    SearchFailed,
    SelectionChanged(Selection),
    ValidationBlocked(RequirementError),
    ValidationUnverified(String),
    ScheduleFetching,
    NoSelection,
    SchedulesReady {
        candidates: Vec<ScheduleCandidate>,
        calendar: Vec<Vec<CalendarEvent>>,
    },
    SchedulesEmpty,
    ScheduleFailed(ScheduleFailure),
    CandidateNext,
    CandidatePrev,
    CandidateSelected(usize),
    PanelToggled(CourseCode),
    SectionsLoading(CourseCode),
    SectionsLoaded(CourseCode, Vec<Section>),
    SectionsFailed(CourseCode, String),
}

pub fn reduce(state: &ViewState, action: ViewAction) -> ViewState {
    let mut next = state.clone();
    next.revision = state.revision + 1;

    match action {
        ViewAction::SearchStarted => next.search = SearchPhase::Searching,
        ViewAction::SearchCleared => next.search = SearchPhase::Idle,
        ViewAction::SearchSucceeded(courses) if courses.is_empty() => {
            next.search = SearchPhase::Empty
        }
        ViewAction::SearchSucceeded(courses) => next.search = SearchPhase::Ready(courses),
        ViewAction::SearchFailed => {
            next.search = SearchPhase::Error(SEARCH_FAILED_MESSAGE.to_string())
        }
        ViewAction::SelectionChanged(selection) => {
            next.warning = None;
            if selection.is_empty() {
                clear_candidates(&mut next);
                next.schedule = SchedulePhase::NoSelection;
            } else {
                next.schedule = SchedulePhase::Validating;
            }
            next.selection = selection;
        }
        ViewAction::ValidationBlocked(err) => next.schedule = SchedulePhase::Blocked(err),
        ViewAction::ValidationUnverified(warning) => next.warning = Some(warning),
        ViewAction::ScheduleFetching => next.schedule = SchedulePhase::Fetching,
        ViewAction::NoSelection => {
            clear_candidates(&mut next);
            next.schedule = SchedulePhase::NoSelection;
        }
        ViewAction::SchedulesReady {
            candidates,
            calendar,
        } => {
            next.navigator = CandidateNavigator::new(candidates.len());
            next.candidates = candidates;
            next.calendar = calendar;
            next.schedule = SchedulePhase::Ready;
        }
        ViewAction::SchedulesEmpty => {
            clear_candidates(&mut next);
            next.schedule = SchedulePhase::Empty(EMPTY_SCHEDULES_MESSAGE.to_string());
        }
        // Previously shown candidates stay on screen.
        ViewAction::ScheduleFailed(failure) => {
            next.schedule = SchedulePhase::Error(failure.to_string())
        }
        ViewAction::CandidateNext => next.navigator = state.navigator.next(),
        ViewAction::CandidatePrev => next.navigator = state.navigator.prev(),
        ViewAction::CandidateSelected(index) => next.navigator = state.navigator.select(index),
        ViewAction::PanelToggled(code) => {
            if !next.expanded_courses.remove(&code) {
                next.expanded_courses.insert(code);
            }
        }
        ViewAction::SectionsLoading(code) => {
            next.section_panels.insert(code, SectionPanel::Loading);
        }
        ViewAction::SectionsLoaded(code, sections) => {
            next.section_panels.insert(code, SectionPanel::Loaded(sections));
        }
        ViewAction::SectionsFailed(code, message) => {
            next.section_panels.insert(code, SectionPanel::Failed(message));
        }
    }

    next
}

fn clear_candidates(state: &mut ViewState) {
    state.candidates.clear();
    state.calendar.clear();
    state.navigator = CandidateNavigator::default();
}

#[cfg(test)]
#[path = "tests/view_state_tests.rs"]
mod tests;
