use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{Course, CourseCode, Section},
    error::{ApiError, ApiException, ErrorCode},
    protocol::{CourseSearchQuery, ScheduleRequest, ScheduleResponse},
};
use tracing::{debug, info};
use url::Url;

/// Read side of the course catalogue: free-text search and per-course section listings.
#[async_trait]
pub trait CourseDirectory: Send + Sync {
    async fn search_courses(&self, query: &CourseSearchQuery) -> Result<Vec<Course>>;
    /// An unknown course yields an empty list, not an error.
    async fn list_sections(&self, course_code: &CourseCode) -> Result<Vec<Section>>;
}

/// Remote service that enumerates every conflict-free combination of the offered sections.
#[async_trait]
pub trait ScheduleGenerator: Send + Sync {
    async fn generate_schedules(&self, sections_per_course: &ScheduleRequest)
        -> Result<ScheduleResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpPlannerClient {
    http: Client,
    base_url: Url,
}

impl HttpPlannerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid api base url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            bail!("api base url '{base_url}' cannot carry a path");
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("api base url '{}' cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl CourseDirectory for HttpPlannerClient {
    async fn search_courses(&self, query: &CourseSearchQuery) -> Result<Vec<Course>> {
        let url = self.endpoint(&["courses", "domain"])?;
        debug!(name_input = %query.name_input, "directory: searching courses");
        let response = self.http.get(url).query(query).send().await?;
        let courses: Vec<Course> = ensure_success(response)
            .await?
            .json()
            .await
            .context("malformed course search response")?;
        info!(
            name_input = %query.name_input,
            matches = courses.len(),
            "directory: course search finished"
        );
        Ok(courses)
    }

    async fn list_sections(&self, course_code: &CourseCode) -> Result<Vec<Section>> {
        let url = self.endpoint(&["courses", course_code.as_str(), "sections"])?;
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(course = %course_code, "directory: course not found");
            return Ok(Vec::new());
        }
        let sections: Vec<Section> = ensure_success(response)
            .await?
            .json()
            .await
            .with_context(|| format!("malformed section listing for {course_code}"))?;
        debug!(
            course = %course_code,
            sections = sections.len(),
            "directory: sections listed"
        );
        Ok(sections)
    }
}

#[async_trait]
impl ScheduleGenerator for HttpPlannerClient {
    async fn generate_schedules(
        &self,
        sections_per_course: &ScheduleRequest,
    ) -> Result<ScheduleResponse> {
        let url = self.endpoint(&["schedules"])?;
        let response = self.http.post(url).json(sections_per_course).send().await?;
        let candidates: ScheduleResponse = ensure_success(response)
            .await?
            .json()
            .await
            .context("malformed schedule response")?;
        info!(
            courses = sections_per_course.len(),
            candidates = candidates.len(),
            "schedules: generation finished"
        );
        Ok(candidates)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let exception = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => ApiException::from_body(status.as_u16(), api_error),
        Err(_) => {
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            ApiException::new(status.as_u16(), error_code_for_status(status), message)
        }
    };
    Err(exception.into())
}

fn error_code_for_status(status: StatusCode) -> ErrorCode {
    match status {
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::Validation,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
            ErrorCode::Unavailable
        }
        _ => ErrorCode::Internal,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
