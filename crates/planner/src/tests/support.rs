use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveTime;
use client_core::{CourseDirectory, ScheduleGenerator};
use shared::{
    domain::{Course, CourseCode, DayOfWeek, Meeting, Nrc, Section},
    protocol::{CourseSearchQuery, ScheduleRequest, ScheduleResponse},
};
use tokio::sync::{Mutex, Notify};

pub fn course(code: &str, title: &str) -> Course {
    Course {
        code: CourseCode::from(code),
        title: title.to_string(),
        sections: Vec::new(),
    }
}

pub fn meeting(day: DayOfWeek, start: &str, end: &str) -> Meeting {
    Meeting {
        day,
        start: NaiveTime::parse_from_str(start, "%H:%M").expect("start"),
        end: NaiveTime::parse_from_str(end, "%H:%M").expect("end"),
        location: "ML_B101".to_string(),
    }
}

pub fn section(nrc: &str, course_code: &str, meetings: Vec<Meeting>) -> Section {
    Section {
        nrc: Nrc::from(nrc),
        course_code: CourseCode::from(course_code),
        meetings,
        professors: vec!["Ana Perez".to_string()],
        term: "202520".to_string(),
        cycle: "16".to_string(),
    }
}

pub async fn wait_for_calls(counter: &AtomicUsize, expected: usize) {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while counter.load(Ordering::SeqCst) < expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("call count reached");
}

#[derive(Default)]
pub struct FakeDirectory {
    courses: Vec<Course>,
    sections: HashMap<CourseCode, Vec<Section>>,
    failing_sections: bool,
    failing_search: bool,
    search_gates: HashMap<String, Arc<Notify>>,
    pub search_calls: AtomicUsize,
    pub section_calls: AtomicUsize,
    pub seen_section_codes: Mutex<Vec<CourseCode>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_course(mut self, course: Course, sections: Vec<Section>) -> Self {
        self.sections.insert(course.code.clone(), sections);
        self.courses.push(course);
        self
    }

    pub fn with_failing_sections(mut self) -> Self {
        self.failing_sections = true;
        self
    }

    pub fn with_failing_search(mut self) -> Self {
        self.failing_search = true;
        self
    }

    pub fn with_search_gate(mut self, name_input: &str, gate: Arc<Notify>) -> Self {
        self.search_gates.insert(name_input.to_string(), gate);
        self
    }

    pub fn section_calls(&self) -> usize {
        self.section_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CourseDirectory for FakeDirectory {
    async fn search_courses(&self, query: &CourseSearchQuery) -> Result<Vec<Course>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.search_gates.get(&query.name_input) {
            gate.notified().await;
        }
        if self.failing_search {
            return Err(anyhow!("connection refused"));
        }
        let words: Vec<String> = query
            .name_input
            .split('%')
            .map(str::to_lowercase)
            .collect();
        Ok(self
            .courses
            .iter()
            .filter(|course| {
                let haystack = format!("{} {}", course.code, course.title).to_lowercase();
                words.iter().all(|word| haystack.contains(word.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn list_sections(&self, course_code: &CourseCode) -> Result<Vec<Section>> {
        self.section_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_section_codes.lock().await.push(course_code.clone());
        if self.failing_sections {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.sections.get(course_code).cloned().unwrap_or_default())
    }
}

pub enum Responder {
    /// Every overlap-free combination, with course codes stripped the way the service does.
    Cartesian,
    Fixed(ScheduleResponse),
    Failing,
}

pub struct FakeGenerator {
    responder: Mutex<Responder>,
    first_call_gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<ScheduleRequest>>,
}

impl FakeGenerator {
    pub fn new(responder: Responder) -> Self {
        Self {
            responder: Mutex::new(responder),
            first_call_gate: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn cartesian() -> Self {
        Self::new(Responder::Cartesian)
    }

    pub fn with_first_call_gate(mut self, gate: Arc<Notify>) -> Self {
        self.first_call_gate = Some(gate);
        self
    }

    pub async fn respond_with(&self, responder: Responder) {
        *self.responder.lock().await = responder;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleGenerator for FakeGenerator {
    async fn generate_schedules(
        &self,
        sections_per_course: &ScheduleRequest,
    ) -> Result<ScheduleResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(sections_per_course.clone());
        if call == 0 {
            if let Some(gate) = &self.first_call_gate {
                gate.notified().await;
            }
        }
        match &*self.responder.lock().await {
            Responder::Cartesian => Ok(conflict_free_combinations(sections_per_course)),
            Responder::Fixed(response) => Ok(response.clone()),
            Responder::Failing => Err(anyhow!("503 service unavailable")),
        }
    }
}

fn conflict_free_combinations(sections_per_course: &ScheduleRequest) -> ScheduleResponse {
    let mut combinations: Vec<Vec<Section>> = vec![Vec::new()];
    for options in sections_per_course {
        let mut next = Vec::new();
        for partial in &combinations {
            for option in options {
                let clashes = partial.iter().any(|chosen: &Section| {
                    chosen
                        .meetings
                        .iter()
                        .any(|a| option.meetings.iter().any(|b| a.overlaps(b)))
                });
                if clashes {
                    continue;
                }
                let mut extended = partial.clone();
                let mut stripped = option.clone();
                stripped.course_code = CourseCode::default();
                extended.push(stripped);
                next.push(extended);
            }
        }
        combinations = next;
    }
    combinations
}
