use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use client_core::{CourseDirectory, ScheduleGenerator};
use shared::{
    domain::{Course, CourseCode, Section},
    protocol::CourseSearchQuery,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    calendar::CalendarProjector,
    config::PlannerSettings,
    orchestrator::{ScheduleOrchestrator, ScheduleOutcome},
    requirement::{PairingResolver, RequirementOutcome, RequirementValidator},
    selection::{Selection, ToggleAction},
    view_state::{reduce, SchedulePhase, SectionPanel, ViewAction, ViewState},
};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Owns the selection and the published view state for one browsing session.
///
/// Every handler mutates state only while holding `inner`, and never across a network
/// round trip. Each logical operation carries a generation number; a response whose
/// generation is no longer the latest is dropped, so the last request issued wins.
pub struct PlannerSession {
    directory: Arc<dyn CourseDirectory>,
    validator: RequirementValidator,
    orchestrator: ScheduleOrchestrator,
    projector: CalendarProjector,
    inner: Mutex<SessionState>,
    snapshots: broadcast::Sender<ViewState>,
}

#[derive(Default)]
struct SessionState {
    selection: Selection,
    view: ViewState,
    search_generation: u64,
    schedule_generation: u64,
    section_generations: HashMap<CourseCode, u64>,
}

impl PlannerSession {
    pub fn new(
        directory: Arc<dyn CourseDirectory>,
        generator: Arc<dyn ScheduleGenerator>,
        settings: &PlannerSettings,
    ) -> Arc<Self> {
        let resolver = PairingResolver::new(directory.clone(), settings.lab_suffix);
        Self::new_with_components(
            directory,
            RequirementValidator::new(resolver),
            ScheduleOrchestrator::new(generator),
            CalendarProjector::new(settings.reference_monday, settings.palette.clone()),
        )
    }

    pub fn new_with_components(
        directory: Arc<dyn CourseDirectory>,
        validator: RequirementValidator,
        orchestrator: ScheduleOrchestrator,
        projector: CalendarProjector,
    ) -> Arc<Self> {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Arc::new(Self {
            directory,
            validator,
            orchestrator,
            projector,
            inner: Mutex::new(SessionState::default()),
            snapshots,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewState> {
        self.snapshots.subscribe()
    }

    pub async fn snapshot(&self) -> ViewState {
        self.inner.lock().await.view.clone()
    }

    pub async fn search(&self, raw_query: &str) {
        let Some(query) = CourseSearchQuery::from_free_text(raw_query) else {
            let mut guard = self.inner.lock().await;
            guard.search_generation += 1;
            self.apply(&mut guard, ViewAction::SearchCleared);
            return;
        };

        let generation = {
            let mut guard = self.inner.lock().await;
            guard.search_generation += 1;
            self.apply(&mut guard, ViewAction::SearchStarted);
            guard.search_generation
        };

        let result = self.directory.search_courses(&query).await;

        let mut guard = self.inner.lock().await;
        if guard.search_generation != generation {
            debug!(generation, name_input = %query.name_input, "session: dropping stale search response");
            return;
        }
        match result {
            Ok(courses) => self.apply(&mut guard, ViewAction::SearchSucceeded(courses)),
            Err(err) => {
                warn!(name_input = %query.name_input, "session: course search failed: {err:#}");
                self.apply(&mut guard, ViewAction::SearchFailed);
            }
        }
    }

    /// Flips one section, then validates the lab pairing and, unless blocked, refetches
    /// schedules. A blocked toggle stays applied; only the fetch is withheld.
    pub async fn toggle_section(&self, course: &Course, section: &Section) -> ToggleAction {
        let (action, generation, selection) = {
            let mut guard = self.inner.lock().await;
            let action = guard.selection.toggle(course, section);
            guard.schedule_generation += 1;
            let generation = guard.schedule_generation;
            let selection = guard.selection.clone();
            self.apply(&mut guard, ViewAction::SelectionChanged(selection.clone()));
            (action, generation, selection)
        };
        info!(course = %course.code, nrc = %section.nrc, ?action, "session: section toggled");

        let verdict = self
            .validator
            .check_requirement(&course.code, action, &selection)
            .await;

        match verdict {
            Ok(RequirementOutcome::Satisfied) => {}
            Ok(RequirementOutcome::Unverified { warning }) => {
                let mut guard = self.inner.lock().await;
                if guard.schedule_generation != generation {
                    return action;
                }
                self.apply(&mut guard, ViewAction::ValidationUnverified(warning));
            }
            Err(err) => {
                let mut guard = self.inner.lock().await;
                if guard.schedule_generation == generation {
                    self.apply(&mut guard, ViewAction::ValidationBlocked(err));
                }
                return action;
            }
        }

        self.fetch_schedules(generation, selection).await;
        action
    }

    /// Manual retry for the current selection. Ignored while the selection is blocked.
    pub async fn refresh_schedules(&self) {
        let (generation, selection) = {
            let mut guard = self.inner.lock().await;
            if matches!(guard.view.schedule, SchedulePhase::Blocked(_)) {
                debug!("session: refresh ignored while requirement is unmet");
                return;
            }
            guard.schedule_generation += 1;
            (guard.schedule_generation, guard.selection.clone())
        };
        self.fetch_schedules(generation, selection).await;
    }

    async fn fetch_schedules(&self, generation: u64, selection: Selection) {
        if !selection.is_empty() {
            let mut guard = self.inner.lock().await;
            if guard.schedule_generation != generation {
                return;
            }
            self.apply(&mut guard, ViewAction::ScheduleFetching);
        }

        let action = match self.orchestrator.fetch_schedules(&selection).await {
            ScheduleOutcome::NoSelection => ViewAction::NoSelection,
            ScheduleOutcome::Candidates(candidates) => {
                let calendar = self.projector.project(&candidates);
                ViewAction::SchedulesReady {
                    candidates,
                    calendar,
                }
            }
            ScheduleOutcome::Empty => ViewAction::SchedulesEmpty,
            ScheduleOutcome::Failed(failure) => ViewAction::ScheduleFailed(failure),
        };

        let mut guard = self.inner.lock().await;
        if guard.schedule_generation != generation {
            debug!(generation, "session: dropping stale schedule response");
            return;
        }
        self.apply(&mut guard, action);
    }

    pub async fn next_candidate(&self) {
        self.navigate(ViewAction::CandidateNext).await;
    }

    pub async fn prev_candidate(&self) {
        self.navigate(ViewAction::CandidatePrev).await;
    }

    pub async fn select_candidate(&self, index: usize) {
        self.navigate(ViewAction::CandidateSelected(index)).await;
    }

    async fn navigate(&self, action: ViewAction) {
        let mut guard = self.inner.lock().await;
        self.apply(&mut guard, action);
    }

    /// Opens or closes a course panel. Opening a panel whose sections are not loaded yet
    /// fetches them.
    pub async fn toggle_expanded(&self, course_code: &CourseCode) {
        let generation = {
            let mut guard = self.inner.lock().await;
            self.apply(&mut guard, ViewAction::PanelToggled(course_code.clone()));
            let needs_load = guard.view.is_expanded(course_code)
                && !matches!(
                    guard.view.section_panels.get(course_code),
                    Some(SectionPanel::Loaded(_) | SectionPanel::Loading)
                );
            if !needs_load {
                return;
            }
            let generation = guard
                .section_generations
                .entry(course_code.clone())
                .or_default();
            *generation += 1;
            let generation = *generation;
            self.apply(&mut guard, ViewAction::SectionsLoading(course_code.clone()));
            generation
        };

        let result = self.directory.list_sections(course_code).await;

        let mut guard = self.inner.lock().await;
        if guard.section_generations.get(course_code) != Some(&generation) {
            return;
        }
        let action = match result {
            Ok(sections) => ViewAction::SectionsLoaded(course_code.clone(), sections),
            Err(err) => {
                warn!(course = %course_code, "session: loading sections failed: {err:#}");
                ViewAction::SectionsFailed(
                    course_code.clone(),
                    format!("Could not load sections for {course_code}. Please try again later."),
                )
            }
        };
        self.apply(&mut guard, action);
    }

    /// Republishes the current snapshot every `period` until stopped or until the session
    /// is dropped.
    pub fn spawn_redraw_ticker(self: &Arc<Self>, period: Duration) -> RedrawTicker {
        let session: Weak<Self> = Arc::downgrade(self);
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(session) = session.upgrade() else {
                    debug!("session: redraw ticker exiting, session dropped");
                    break;
                };
                session.republish().await;
            }
        });
        info!(period = ?period, "session: redraw ticker started");
        RedrawTicker {
            handle: Some(handle),
        }
    }

    async fn republish(&self) {
        let guard = self.inner.lock().await;
        let _ = self.snapshots.send(guard.view.clone());
    }

    fn apply(&self, state: &mut SessionState, action: ViewAction) {
        state.view = reduce(&state.view, action);
        let _ = self.snapshots.send(state.view.clone());
    }
}

/// Handle to the periodic redraw task. Stops the task when stopped or dropped.
pub struct RedrawTicker {
    handle: Option<JoinHandle<()>>,
}

impl RedrawTicker {
    pub fn stop(mut self) {
        self.abort();
        info!("session: redraw ticker stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RedrawTicker {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
