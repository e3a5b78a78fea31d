use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use client_core::CourseDirectory;
use shared::domain::{CourseCode, CourseKind, CourseLink};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::selection::{Selection, ToggleAction};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementError {
    #[error("Lab {lab} requires its main course {base} to be selected.")]
    LabRequiresMain { lab: CourseCode, base: CourseCode },
    #[error("Cannot remove lab {lab} while main course {base} is selected.")]
    LabRemovalBlocked { lab: CourseCode, base: CourseCode },
    #[error("Main course {base} requires its lab {lab} to be selected.")]
    MainRequiresLab { base: CourseCode, lab: CourseCode },
    #[error("Cannot remove main course {base} while its lab {lab} is selected.")]
    MainRemovalBlocked { base: CourseCode, lab: CourseCode },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementOutcome {
    Satisfied,
    /// The directory could not be asked; the pairing is neither confirmed nor denied.
    Unverified { warning: String },
}

/// Resolves the lab/main relation of a course code, at most once per code.
pub struct PairingResolver {
    directory: Arc<dyn CourseDirectory>,
    lab_suffix: char,
    resolved: Mutex<HashMap<CourseCode, CourseLink>>,
}

impl PairingResolver {
    pub fn new(directory: Arc<dyn CourseDirectory>, lab_suffix: char) -> Self {
        Self {
            directory,
            lab_suffix,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub fn lab_code_for(&self, base: &CourseCode) -> CourseCode {
        CourseCode(format!("{}{}", base.0, self.lab_suffix))
    }

    /// Lab codes are recognizable from the code alone.
    pub fn classify_without_lookup(&self, code: &CourseCode) -> Option<CourseLink> {
        let base = code.as_str().strip_suffix(self.lab_suffix)?;
        if base.is_empty() {
            return None;
        }
        Some(CourseLink::lab(CourseCode::from(base)))
    }

    pub async fn resolve(&self, code: &CourseCode) -> Result<CourseLink> {
        if let Some(link) = self.classify_without_lookup(code) {
            return Ok(link);
        }
        if let Some(link) = self.resolved.lock().await.get(code).cloned() {
            return Ok(link);
        }

        let lab_code = self.lab_code_for(code);
        let lab_sections = self.directory.list_sections(&lab_code).await?;
        let link = if lab_sections.is_empty() {
            CourseLink::standalone()
        } else {
            CourseLink::main(lab_code)
        };
        debug!(course = %code, kind = ?link.kind, "requirement: resolved course pairing");
        self.resolved
            .lock()
            .await
            .insert(code.clone(), link.clone());
        Ok(link)
    }
}

/// Enforces that a lab-bearing course and its lab are selected together or not at all.
pub struct RequirementValidator {
    resolver: PairingResolver,
}

impl RequirementValidator {
    pub fn new(resolver: PairingResolver) -> Self {
        Self { resolver }
    }

    /// Checks the pairing invariant against `selection` as it stands after the toggle of
    /// `course_code` that produced `action`. The toggled course is judged first, then every
    /// other selected course, so a schedule request never carries an unpaired course. Only
    /// main candidates cost a directory round trip, and resolved pairings are cached.
    pub async fn check_requirement(
        &self,
        course_code: &CourseCode,
        action: ToggleAction,
        selection: &Selection,
    ) -> std::result::Result<RequirementOutcome, RequirementError> {
        let others = selection.course_order();
        let codes = std::iter::once(course_code)
            .chain(others.iter().filter(|code| *code != course_code));

        let mut unverified = Vec::new();
        for code in codes {
            let link = match self.resolver.resolve(code).await {
                Ok(link) => link,
                Err(err) => {
                    warn!(
                        course = %code,
                        ?action,
                        "requirement: lab lookup failed, proceeding without pairing check: {err:#}"
                    );
                    unverified.push(code.as_str());
                    continue;
                }
            };
            if let Err(err) = pairing_verdict(code, &link, selection) {
                debug!(course = %code, toggled = %course_code, ?action, "requirement: blocked: {err}");
                return Err(err);
            }
        }

        if unverified.is_empty() {
            return Ok(RequirementOutcome::Satisfied);
        }
        let codes = unverified.join(", ");
        Ok(RequirementOutcome::Unverified {
            warning: format!(
                "Could not verify whether {codes} needs a lab; schedules are shown without that check."
            ),
        })
    }
}

fn pairing_verdict(
    code: &CourseCode,
    link: &CourseLink,
    selection: &Selection,
) -> std::result::Result<(), RequirementError> {
    let Some(paired) = link.paired_code.clone() else {
        return Ok(());
    };
    let this_selected = selection.contains_course(code);
    let paired_selected = selection.contains_course(&paired);

    match (link.kind, this_selected, paired_selected) {
        (CourseKind::Lab, true, false) => Err(RequirementError::LabRequiresMain {
            lab: code.clone(),
            base: paired,
        }),
        (CourseKind::Lab, false, true) => Err(RequirementError::LabRemovalBlocked {
            lab: code.clone(),
            base: paired,
        }),
        (CourseKind::Main, true, false) => Err(RequirementError::MainRequiresLab {
            base: code.clone(),
            lab: paired,
        }),
        (CourseKind::Main, false, true) => Err(RequirementError::MainRemovalBlocked {
            base: code.clone(),
            lab: paired,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "tests/requirement_tests.rs"]
mod tests;
