use std::collections::BTreeSet;

use shared::{
    domain::{Course, CourseCode, Nrc, Section},
    protocol::ScheduleRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Added,
    RemovedSection,
    RemovedCourse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCourse {
    pub code: CourseCode,
    pub title: String,
    pub sections: Vec<Section>,
}

/// Sections the user picked, grouped by course. Courses keep the order in which they were
/// first picked; that order is the order of the schedule request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    courses: Vec<SelectedCourse>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `section` under `course` when absent (by NRC), removes it otherwise. Removing the
    /// last section of a course drops the course entry.
    pub fn toggle(&mut self, course: &Course, section: &Section) -> ToggleAction {
        let Some(position) = self.position(&course.code) else {
            self.courses.push(SelectedCourse {
                code: course.code.clone(),
                title: course.title.clone(),
                sections: vec![stamped(course, section)],
            });
            return ToggleAction::Added;
        };

        let entry = &mut self.courses[position];
        match entry.sections.iter().position(|s| s.nrc == section.nrc) {
            Some(index) => {
                entry.sections.remove(index);
                if entry.sections.is_empty() {
                    self.courses.remove(position);
                    ToggleAction::RemovedCourse
                } else {
                    ToggleAction::RemovedSection
                }
            }
            None => {
                entry.sections.push(stamped(course, section));
                ToggleAction::Added
            }
        }
    }

    pub fn is_selected(&self, course_code: &CourseCode, nrc: &Nrc) -> bool {
        self.course(course_code)
            .is_some_and(|entry| entry.sections.iter().any(|s| &s.nrc == nrc))
    }

    pub fn contains_course(&self, course_code: &CourseCode) -> bool {
        self.position(course_code).is_some()
    }

    pub fn selected_course_codes(&self) -> BTreeSet<CourseCode> {
        self.courses.iter().map(|entry| entry.code.clone()).collect()
    }

    pub fn course(&self, course_code: &CourseCode) -> Option<&SelectedCourse> {
        self.courses.iter().find(|entry| &entry.code == course_code)
    }

    pub fn course_order(&self) -> Vec<CourseCode> {
        self.courses.iter().map(|entry| entry.code.clone()).collect()
    }

    pub fn sections_per_course(&self) -> ScheduleRequest {
        self.courses
            .iter()
            .map(|entry| entry.sections.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    fn position(&self, course_code: &CourseCode) -> Option<usize> {
        self.courses.iter().position(|entry| &entry.code == course_code)
    }
}

fn stamped(course: &Course, section: &Section) -> Section {
    let mut section = section.clone();
    section.course_code = course.code.clone();
    section
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
