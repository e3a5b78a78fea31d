use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Datelike;
use clap::Parser;
use client_core::HttpPlannerClient;
use planner::{load_settings, CalendarEvent, PlannerSession, SectionPanel, ViewState};
use shared::domain::{Course, CourseCode, Nrc};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Pick {
    course_code: CourseCode,
    nrc: Nrc,
}

fn parse_pick(raw: &str) -> Result<Pick, String> {
    let (code, nrc) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected CODE:NRC, got '{raw}'"))?;
    let (code, nrc) = (code.trim(), nrc.trim());
    if code.is_empty() || nrc.is_empty() {
        return Err(format!("expected CODE:NRC, got '{raw}'"));
    }
    Ok(Pick {
        course_code: CourseCode::from(code),
        nrc: Nrc::from(nrc),
    })
}

#[derive(Parser, Debug)]
#[command(about = "Search courses, pick sections and print a conflict-free weekly timetable")]
struct Args {
    /// Free-text course search.
    #[arg(long)]
    query: String,
    /// Section to pick, as CODE:NRC. Repeatable; applied in order.
    #[arg(long = "select", value_parser = parse_pick)]
    picks: Vec<Pick>,
    /// Candidate schedule to print (0-based, clamped).
    #[arg(long, default_value_t = 0)]
    candidate: usize,
    /// Overrides the configured API base URL.
    #[arg(long)]
    api_url: Option<String>,
    /// Print the active candidate's events as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    settings.validate()?;
    info!(api = %settings.api_base_url, "planner: starting");

    let client = Arc::new(HttpPlannerClient::new(
        &settings.api_base_url,
        settings.request_timeout(),
    )?);
    let session = PlannerSession::new(client.clone(), client, &settings);
    let ticker = settings
        .redraw_interval()
        .map(|period| session.spawn_redraw_ticker(period));

    session.search(&args.query).await;
    let view = session.snapshot().await;
    if let Some(err) = view.error() {
        bail!("{err}");
    }
    if let Some(message) = view.empty_message() {
        println!("{message}");
    }
    for course in view.search_results() {
        println!("{}  {}", course.code, course.title);
    }

    for pick in &args.picks {
        let course = view
            .search_results()
            .iter()
            .find(|course| course.code == pick.course_code)
            .cloned()
            .unwrap_or_else(|| Course {
                code: pick.course_code.clone(),
                title: pick.course_code.to_string(),
                sections: Vec::new(),
            });
        apply_pick(&session, &course, &pick.nrc).await?;
    }

    session.select_candidate(args.candidate).await;
    let view = session.snapshot().await;
    print_schedule(&view);
    if args.json {
        println!("{}", serde_json::to_string_pretty(view.active_events())?);
    }

    if let Some(ticker) = ticker {
        ticker.stop();
    }
    Ok(())
}

async fn apply_pick(session: &PlannerSession, course: &Course, nrc: &Nrc) -> Result<()> {
    let view = session.snapshot().await;
    if !view.is_expanded(&course.code) {
        session.toggle_expanded(&course.code).await;
    }
    let view = session.snapshot().await;
    let sections = match view.section_panels.get(&course.code) {
        Some(SectionPanel::Loaded(sections)) => sections,
        Some(SectionPanel::Failed(message)) => bail!("{message}"),
        _ => return Err(anyhow!("sections for {} are not available", course.code)),
    };
    let section = sections
        .iter()
        .find(|section| &section.nrc == nrc)
        .with_context(|| format!("{} has no section with NRC {nrc}", course.code))?;

    let action = session.toggle_section(course, section).await;
    println!("{} {nrc}: {action:?}", course.code);

    let view = session.snapshot().await;
    if let Some(warning) = &view.warning {
        println!("warning: {warning}");
    }
    if let Some(err) = view.schedule_error() {
        println!("{err}");
    }
    Ok(())
}

fn print_schedule(view: &ViewState) {
    if let Some(message) = view.empty_message() {
        println!("{message}");
    }
    if view.candidates.is_empty() {
        return;
    }
    println!(
        "Candidate {}/{}",
        view.active_candidate_index() + 1,
        view.candidates.len()
    );

    let mut events: Vec<&CalendarEvent> = view.active_events().iter().collect();
    events.sort_by_key(|event| event.start);
    let mut current_day = None;
    for event in events {
        let day = event.start.date();
        if current_day != Some(day) {
            println!("{} {}", day.weekday(), day);
            current_day = Some(day);
        }
        println!(
            "  {}-{}  {}  [{}] {}",
            event.start.format("%H:%M"),
            event.end.format("%H:%M"),
            event.title,
            event.color,
            event.location
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_and_nrc() {
        let pick = parse_pick("IIND2201:10876").expect("pick");
        assert_eq!(pick.course_code.as_str(), "IIND2201");
        assert_eq!(pick.nrc.as_str(), "10876");
    }

    #[test]
    fn rejects_malformed_picks() {
        assert!(parse_pick("IIND2201").is_err());
        assert!(parse_pick(":10876").is_err());
        assert!(parse_pick("IIND2201: ").is_err());
    }

    #[test]
    fn cli_accepts_repeated_selects() {
        let args = Args::try_parse_from([
            "planner_cli",
            "--query",
            "control de produccion",
            "--select",
            "IIND2201:10876",
            "--select",
            "IIND2201T:20876",
        ])
        .expect("args");
        assert_eq!(args.picks.len(), 2);
        assert_eq!(args.candidate, 0);
        assert!(!args.json);
    }
}
