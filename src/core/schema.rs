// src/core/schema.rs
//! Field tables for the bot's five config modules.
//!
//! Each table lists the fields in the order the bot's modules declare them.
//! The tables double as the default configuration and as the fixed layout
//! the materializer writes.

use serde_json::{Map, Value};

use crate::types::BotConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Personals,
    Questions,
    Search,
    Secrets,
    Settings,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Personals,
        Section::Questions,
        Section::Search,
        Section::Secrets,
        Section::Settings,
    ];

    /// JSON key, also the bot's module name
    pub fn key(self) -> &'static str {
        match self {
            Section::Personals => "personals",
            Section::Questions => "questions",
            Section::Search => "search",
            Section::Secrets => "secrets",
            Section::Settings => "settings",
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Section::Personals => PERSONALS,
            Section::Questions => QUESTIONS,
            Section::Search => SEARCH,
            Section::Secrets => SECRETS,
            Section::Settings => SETTINGS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Text(&'static str),
    Integer(i64),
    Flag(bool),
    List(&'static [&'static str]),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Text(text) => Value::String(text.to_string()),
            DefaultValue::Integer(number) => Value::from(number),
            DefaultValue::Flag(flag) => Value::Bool(flag),
            DefaultValue::List(items) => {
                Value::Array(items.iter().map(|item| Value::from(*item)).collect())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: DefaultValue,
}

impl FieldSpec {
    /// Numeric fields are written as bare numbers even when the form sends strings
    pub fn is_numeric(&self) -> bool {
        matches!(self.default, DefaultValue::Integer(_))
    }
}

const fn text(name: &'static str, value: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        default: DefaultValue::Text(value),
    }
}

const fn int(name: &'static str, value: i64) -> FieldSpec {
    FieldSpec {
        name,
        default: DefaultValue::Integer(value),
    }
}

const fn flag(name: &'static str, value: bool) -> FieldSpec {
    FieldSpec {
        name,
        default: DefaultValue::Flag(value),
    }
}

const fn list(name: &'static str, value: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        default: DefaultValue::List(value),
    }
}

// ===== Section tables =====

const PERSONALS: &[FieldSpec] = &[
    text("first_name", ""),
    text("middle_name", ""),
    text("last_name", ""),
    text("phone_number", ""),
    text("current_city", ""),
    text("street", ""),
    text("state", ""),
    text("zipcode", ""),
    text("country", ""),
    text("ethnicity", "Decline"),
    text("gender", "Decline"),
    text("disability_status", "Decline"),
    text("veteran_status", "Decline"),
];

const QUESTIONS: &[FieldSpec] = &[
    text("default_resume_path", "all resumes/default/resume.pdf"),
    text("years_of_experience", "5"),
    text("require_visa", "No"),
    text("website", ""),
    text("linkedIn", ""),
    text("us_citizenship", "U.S. Citizen/Permanent Resident"),
    int("desired_salary", 120000),
    int("current_ctc", 800000),
    int("notice_period", 30),
    text("linkedin_headline", ""),
    text("linkedin_summary", ""),
    text("cover_letter", ""),
    text("user_information_all", ""),
    text("recent_employer", "Not Applicable"),
    text("confidence_level", "8"),
    flag("pause_before_submit", true),
    flag("pause_at_failed_question", true),
    flag("overwrite_previous_answers", false),
];

const SEARCH: &[FieldSpec] = &[
    list("search_terms", &["Software Engineer", "Software Developer"]),
    text("search_location", "United States"),
    int("switch_number", 30),
    flag("randomize_search_order", false),
    text("sort_by", ""),
    text("date_posted", "Past week"),
    text("salary", ""),
    flag("easy_apply_only", true),
    list("experience_level", &[]),
    list("job_type", &[]),
    list("on_site", &[]),
    list("companies", &[]),
    list("location", &[]),
    list("industry", &[]),
    list("job_function", &[]),
    list("job_titles", &[]),
    list("benefits", &[]),
    list("commitments", &[]),
    flag("under_10_applicants", false),
    flag("in_your_network", false),
    flag("fair_chance_employer", false),
    flag("pause_after_filters", true),
    list("about_company_bad_words", &[]),
    list("about_company_good_words", &[]),
    list("bad_words", &[]),
    flag("security_clearance", false),
    flag("did_masters", true),
    int("current_experience", 5),
];

const SECRETS: &[FieldSpec] = &[
    text("username", "username@example.com"),
    text("password", "example_password"),
    flag("use_AI", false),
    text("ai_provider", "openai"),
    text("llm_api_url", "https://api.openai.com/v1/"),
    text("llm_api_key", "not-needed"),
    text("llm_model", "gpt-5-mini"),
    text("llm_spec", "openai"),
    flag("stream_output", false),
];

const SETTINGS: &[FieldSpec] = &[
    flag("close_tabs", false),
    flag("follow_companies", false),
    flag("run_non_stop", false),
    flag("alternate_sortby", true),
    flag("cycle_date_posted", true),
    flag("stop_date_cycle_at_24hr", true),
    text("generated_resume_path", "all resumes/"),
    text(
        "file_name",
        "all excels/all_applied_applications_history.csv",
    ),
    text(
        "failed_file_name",
        "all excels/all_failed_applications_history.csv",
    ),
    text("logs_folder_path", "logs/"),
    int("click_gap", 1),
    flag("run_in_background", false),
    flag("disable_extensions", false),
    flag("safe_mode", true),
    flag("smooth_scroll", false),
    flag("keep_screen_awake", true),
    flag("stealth_mode", true),
    flag("showAiErrorAlerts", false),
];

/// Complete configuration built from the section tables.
pub fn default_config() -> BotConfig {
    let mut sections = Map::new();
    for section in Section::ALL {
        sections.insert(section.key().to_string(), Value::Object(default_section(section)));
    }
    BotConfig::from_map(sections)
}

pub fn default_section(section: Section) -> Map<String, Value> {
    section
        .fields()
        .iter()
        .map(|spec| (spec.name.to_string(), spec.default.to_value()))
        .collect()
}
