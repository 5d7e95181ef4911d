//! Job extraction: turns loosely structured page text into job postings.
//!
//! Content is cut into sections at markdown headings (`#` to `###`) and at
//! separator lines (`---`, `***`). Every section long enough to be a listing is
//! scanned line by line; each field has its own matcher and its own win policy:
//!
//! | field       | matcher                                       | wins  |
//! |-------------|-----------------------------------------------|-------|
//! | title       | labelled line, or a 6–199 char first line      | first |
//! | location    | line mentioning location/city, label stripped | last  |
//! | remote_type | fully remote / hybrid / on-site phrasing      | last  |
//! | salary      | `$N - $M`                                     | last  |
//!
//! Lines that mention none of the field keywords (and were not taken as the
//! title) make up the description.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::scraper::types::{ExtractedJob, RemoteType};

/// Sections at or below this many characters (trimmed) are noise.
pub const MIN_SECTION_CHARS: usize = 50;
pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

const TITLE_KEYWORDS: [&str; 3] = ["job title", "position", "role:"];
const LOCATION_KEYWORDS: [&str; 2] = ["location", "city"];
const REMOTE_KEYWORDS: [&str; 2] = ["remote", "work"];
const NON_DESCRIPTION_KEYWORDS: [&str; 6] = [
    "location",
    "salary",
    "remote",
    "job title",
    "position",
    "role",
];

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,3}\s+(.*)$").unwrap());
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:-{3,}|\*{3,})\s*$").unwrap());
static TITLE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)job title\s*:?|position\s*:?|role\s*:").unwrap());
static LOCATION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[\s*_>\-]*(?:location|city|where)\s*[:*\-]*").unwrap());
static SALARY_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([\d,]+)\s*-\s*\$([\d,]+)").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Segmentation
// ────────────────────────────────────────────────────────────────────────────

/// Lazily splits content into sections. A heading line opens a new section
/// whose first line is the heading text without its marker; a separator line
/// closes the current section and is dropped.
#[derive(Clone)]
pub struct Sections<'a> {
    lines: std::str::Lines<'a>,
    carried_heading: Option<&'a str>,
    done: bool,
}

pub fn sections(content: &str) -> Sections<'_> {
    Sections {
        lines: content.lines(),
        carried_heading: None,
        done: false,
    }
}

impl<'a> Iterator for Sections<'a> {
    type Item = Vec<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut section: Vec<&'a str> = self.carried_heading.take().into_iter().collect();

        for line in self.lines.by_ref() {
            if SEPARATOR.is_match(line) {
                return Some(section);
            }

            if let Some(heading) = HEADING.captures(line).and_then(|c| c.get(1)) {
                if section.iter().all(|l| l.trim().is_empty()) {
                    section.clear();
                    section.push(heading.as_str());
                    continue;
                }
                self.carried_heading = Some(heading.as_str());
                return Some(section);
            }

            section.push(line);
        }

        self.done = true;
        Some(section)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Extracts every job posting found in `content`, in the order the sections appear.
///
/// The returned iterator is lazy and cheap to clone; clone it before consuming
/// to walk the same content again.
pub fn extract_jobs<'a>(
    content: &'a str,
    source_url: &'a str,
) -> impl Iterator<Item = ExtractedJob> + Clone + 'a {
    sections(content)
        .map(|lines| lines.join("\n"))
        .filter(|section| section.trim().chars().count() > MIN_SECTION_CHARS)
        .filter_map(move |section| parse_section(&section, source_url))
}

/// How a field treats repeated matches within one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wins {
    First,
    Last,
}

struct Slot<T> {
    value: Option<T>,
    wins: Wins,
}

impl<T> Slot<T> {
    fn new(wins: Wins) -> Self {
        Self { value: None, wins }
    }

    /// Offers a match; returns whether the slot took it.
    fn offer(&mut self, candidate: Option<T>) -> bool {
        match candidate {
            Some(v) if self.value.is_none() || self.wins == Wins::Last => {
                self.value = Some(v);
                true
            }
            _ => false,
        }
    }
}

struct Line<'a> {
    index: usize,
    text: &'a str,
    lower: String,
}

impl Line<'_> {
    fn mentions_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.lower.contains(k))
    }
}

/// Parses one section into a job, or `None` when it carries no job signal.
///
/// A job is emitted only with a non-empty title plus either a description or
/// an explicitly detected location.
pub fn parse_section(section: &str, source_url: &str) -> Option<ExtractedJob> {
    let mut title = Slot::new(Wins::First);
    let mut location = Slot::new(Wins::Last);
    let mut remote_type = Slot::new(Wins::Last);
    let mut salary_range = Slot::new(Wins::Last);
    let mut description_lines = Vec::new();

    for (index, text) in section.trim().lines().enumerate() {
        let line = Line {
            index,
            text,
            lower: text.to_lowercase(),
        };

        let is_title = title.offer(match_title(&line));
        location.offer(match_location(&line));
        remote_type.offer(match_remote_type(&line));
        salary_range.offer(match_salary(&line));

        if !is_title && !line.mentions_any(&NON_DESCRIPTION_KEYWORDS) {
            description_lines.push(text);
        }
    }

    let title = title.value?;
    let description = truncate_chars(description_lines.join("\n").trim(), MAX_DESCRIPTION_CHARS);
    if description.is_empty() && location.value.is_none() {
        return None;
    }

    Some(ExtractedJob {
        title: truncate_chars(&title, MAX_TITLE_CHARS),
        description,
        location: location.value.unwrap_or_else(|| "Remote".to_string()),
        remote_type: remote_type.value.unwrap_or_default(),
        salary_range: salary_range.value,
        source_url: source_url.to_string(),
        scraped_at: Utc::now(),
    })
}

fn match_title(line: &Line<'_>) -> Option<String> {
    let labelled = line.mentions_any(&TITLE_KEYWORDS);
    let leading = line.index == 0 && (6..200).contains(&line.text.chars().count());
    if !labelled && !leading {
        return None;
    }

    let stripped = TITLE_LABEL.replace_all(line.text, "");
    let title = trim_markup(&stripped);
    (!title.is_empty()).then(|| title.to_string())
}

fn match_location(line: &Line<'_>) -> Option<String> {
    if !line.mentions_any(&LOCATION_KEYWORDS) {
        return None;
    }

    let stripped = LOCATION_LABEL.replace(line.text, "");
    let location = trim_markup(&stripped);
    (!location.is_empty()).then(|| location.to_string())
}

fn match_remote_type(line: &Line<'_>) -> Option<RemoteType> {
    if !line.mentions_any(&REMOTE_KEYWORDS) {
        return None;
    }

    if line.mentions_any(&["fully remote", "work from anywhere"]) {
        Some(RemoteType::FullyRemote)
    } else if line.mentions_any(&["hybrid"]) {
        Some(RemoteType::Hybrid)
    } else if line.mentions_any(&["on-site", "office"]) {
        Some(RemoteType::OnSite)
    } else {
        None
    }
}

fn match_salary(line: &Line<'_>) -> Option<String> {
    SALARY_RANGE
        .find(line.text)
        .map(|m| m.as_str().to_string())
}

/// Parses `"$120,000 - $160,000"` into `(120000.0, 160000.0)`.
pub fn salary_bounds(range: &str) -> Option<(f64, f64)> {
    let caps = SALARY_RANGE.captures(range)?;
    let parse = |i: usize| caps.get(i)?.as_str().replace(',', "").parse::<f64>().ok();
    Some((parse(1)?, parse(2)?))
}

/// Trims whitespace and stray markdown emphasis left behind by label stripping.
fn trim_markup(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | ':' | '-'))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
