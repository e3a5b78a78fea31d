//! Selection, lab/main requirement validation and schedule composition for the weekly
//! timetable planner.
//!
//! Data flows one way: a toggle mutates the [`selection::Selection`], the
//! [`requirement::RequirementValidator`] gates it, the [`orchestrator::ScheduleOrchestrator`]
//! asks the schedule service for candidates, the [`calendar::CalendarProjector`] turns them
//! into dated events, and the [`session::PlannerSession`] publishes a fresh
//! [`view_state::ViewState`] after every step.

pub mod calendar;
pub mod config;
pub mod orchestrator;
pub mod requirement;
pub mod selection;
pub mod session;
pub mod view_state;

pub use calendar::{CalendarEvent, CalendarProjector, CandidateNavigator};
pub use config::{load_settings, PlannerSettings, SettingsError};
pub use orchestrator::{ScheduleCandidate, ScheduleFailure, ScheduleOrchestrator, ScheduleOutcome};
pub use requirement::{PairingResolver, RequirementError, RequirementOutcome, RequirementValidator};
pub use selection::{Selection, ToggleAction};
pub use session::{PlannerSession, RedrawTicker};
pub use view_state::{SchedulePhase, SearchPhase, SectionPanel, ViewState};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
