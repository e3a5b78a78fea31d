use super::*;

use std::{
    collections::HashMap,
    env,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_settings_file(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("planner_settings_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(SETTINGS_FILE);
    fs::write(&path, contents).expect("write settings");
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_and_env_yield_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/planner.toml"), no_env);
    assert_eq!(settings, PlannerSettings::default());
    assert_eq!(settings.lab_suffix, 'T');
    assert_eq!(
        settings.reference_monday,
        NaiveDate::from_ymd_opt(2025, 7, 28).expect("date")
    );
    assert_eq!(settings.redraw_interval(), None);
    settings.validate().expect("defaults are valid");
}

#[test]
fn file_values_override_defaults() {
    let path = temp_settings_file(
        r##"
api_base_url = "http://planner.internal:9000/api"
lab_suffix = "L"
reference_monday = 2026-01-05
palette = ["#111111", "#222222"]
request_timeout_secs = 30
redraw_interval_ms = 500
"##,
    );

    let settings = load_settings_from(&path, no_env);

    assert_eq!(settings.api_base_url, "http://planner.internal:9000/api");
    assert_eq!(settings.lab_suffix, 'L');
    assert_eq!(
        settings.reference_monday,
        NaiveDate::from_ymd_opt(2026, 1, 5).expect("date")
    );
    assert_eq!(settings.palette, vec!["#111111", "#222222"]);
    assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    assert_eq!(settings.redraw_interval(), Some(Duration::from_millis(500)));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn environment_overrides_file() {
    let path = temp_settings_file("api_base_url = \"http://from-file/api\"\n");
    let vars: HashMap<&str, &str> = HashMap::from([
        ("PLANNER_API_URL", "http://legacy/api"),
        ("APP__API_BASE_URL", "http://from-env/api"),
        ("APP__PALETTE", "red, green ,,blue"),
        ("APP__REDRAW_INTERVAL_MS", "0"),
    ]);

    let settings = load_settings_from(&path, |name| vars.get(name).map(|v| v.to_string()));

    assert_eq!(settings.api_base_url, "http://from-env/api");
    assert_eq!(settings.palette, vec!["red", "green", "blue"]);
    assert_eq!(settings.redraw_interval_ms, None);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn invalid_values_keep_previous_layer() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("APP__LAB_SUFFIX", "LAB"),
        ("APP__REFERENCE_MONDAY", "next monday"),
        ("APP__REQUEST_TIMEOUT_SECS", "0"),
        ("APP__PALETTE", " , "),
    ]);

    let settings = load_settings_from(Path::new("/nonexistent/planner.toml"), |name| {
        vars.get(name).map(|v| v.to_string())
    });

    assert_eq!(settings, PlannerSettings::default());
}

#[test]
fn validate_rejects_broken_settings() {
    let mut settings = PlannerSettings {
        api_base_url: "localhost without scheme".into(),
        ..PlannerSettings::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::InvalidApiUrl(_))
    ));

    settings.api_base_url = "http://localhost:8080/api".into();
    settings.palette.clear();
    assert_eq!(settings.validate(), Err(SettingsError::EmptyPalette));

    settings.palette = vec!["#000000".into()];
    settings.request_timeout_secs = 0;
    assert_eq!(settings.validate(), Err(SettingsError::ZeroTimeout));
}
