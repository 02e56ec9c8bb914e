// src/services/extraction_rules.rs
//
// Extraction Rules
//
// Pull business identifiers out of unstructured strings.
//
// CRITICAL RULES:
// - Rules are explicit and ordered; the first matching rule wins
// - No backtracking across rules once one matches
// - Deterministic: same input → same output
// - No I/O

use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;

use crate::domain::vehicle::MaintenanceReading;
use crate::error::{AppError, AppResult};

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("hard-coded extraction pattern compiles")
}

// ============================================================================
// IDENTIFIER RULES (FILENAME → REPORT NUMBER)
// ============================================================================

struct IdentifierRule {
    name: &'static str,
    pattern: Regex,

    /// Apply to the extension-stripped name instead of the full filename
    on_stem: bool,
}

/// Ordered rules extracting a report number from an upload filename
pub struct IdentifierRules {
    rules: Vec<IdentifierRule>,
}

impl Default for IdentifierRules {
    fn default() -> Self {
        Self {
            rules: vec![
                // 0993.jpg
                IdentifierRule {
                    name: "numeric_name",
                    pattern: pattern(r"(?i)^(\d+)\.[a-z0-9]+$"),
                    on_stem: false,
                },
                // 2704_dekra_report-7.jpg
                IdentifierRule {
                    name: "dekra_report_page",
                    pattern: pattern(r"(?i)^(\d+)_dekra_report-\d+\.[a-z0-9]+$"),
                    on_stem: false,
                },
                // anything else: first digit run in the name without extension
                IdentifierRule {
                    name: "first_digit_run",
                    pattern: pattern(r"(\d+)"),
                    on_stem: true,
                },
            ],
        }
    }
}

impl IdentifierRules {
    /// Extract the report number, or None when no rule matches
    pub fn extract(&self, raw: &str) -> Option<String> {
        self.extract_with_rule(raw).map(|(key, _)| key)
    }

    /// Extract the report number together with the name of the rule that
    /// produced it
    pub fn extract_with_rule(&self, raw: &str) -> Option<(String, &'static str)> {
        let filename = Self::file_name(raw);
        let stem = Self::strip_extension(filename);

        for rule in &self.rules {
            let subject = if rule.on_stem { stem } else { filename };
            if let Some(captures) = rule.pattern.captures(subject) {
                if let Some(key) = captures.get(1) {
                    return Some((key.as_str().to_string(), rule.name));
                }
            }
        }

        None
    }

    /// Last path component, trimmed
    fn file_name(raw: &str) -> &str {
        let trimmed = raw.trim();
        Path::new(trimmed)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(trimmed)
    }

    fn strip_extension(filename: &str) -> &str {
        match filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => filename,
        }
    }
}

// ============================================================================
// MAINTENANCE EXTRACTOR (FREE TEXT → DATE + ODOMETER)
// ============================================================================

/// Parses service-history phrases of the shape "am <date> bei <number> km"
pub struct MaintenanceExtractor {
    phrase: Regex,
}

impl Default for MaintenanceExtractor {
    fn default() -> Self {
        Self {
            phrase: pattern(
                r"(?i)\bam\s+(\d{1,2}\.\d{1,2}\.\d{4})\s+bei\s+(\d[\d.]*(?:,\d+)?)\s*km\b",
            ),
        }
    }
}

impl MaintenanceExtractor {
    /// First reading in the text, if any
    pub fn extract(&self, text: &str) -> Option<MaintenanceReading> {
        self.extract_all(text).into_iter().next()
    }

    /// Every well-formed reading in the text, in order of appearance.
    /// Phrases with impossible dates are skipped.
    pub fn extract_all(&self, text: &str) -> Vec<MaintenanceReading> {
        self.phrase
            .captures_iter(text)
            .filter_map(|captures| {
                let date = normalize_date(captures.get(1)?.as_str())?;
                let mileage_km = normalize_integer(captures.get(2)?.as_str())?;
                Some(MaintenanceReading::new(date, mileage_km))
            })
            .collect()
    }

    /// Like `extract`, but a missing phrase is a user-facing format error
    pub fn parse(&self, text: &str) -> AppResult<MaintenanceReading> {
        self.extract(text).ok_or_else(|| {
            AppError::InvalidFormat(format!(
                "expected 'am TT.MM.JJJJ bei <Kilometer> km', got {:?}",
                text.trim()
            ))
        })
    }
}

/// Re-render a D.M.YYYY date as DD.MM.YYYY, rejecting impossible dates
fn normalize_date(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw, "%d.%m.%Y")
        .ok()
        .map(|date| date.format("%d.%m.%Y").to_string())
}

/// German number formatting: '.' groups thousands, ',' starts the fraction.
/// The fraction is dropped.
pub fn normalize_integer(raw: &str) -> Option<u64> {
    let whole = raw.split(',').next().unwrap_or(raw);
    let digits: String = whole
        .chars()
        .filter(|c| !matches!(c, '.' | ' ' | '\u{a0}'))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

// ============================================================================
// TESTS
// ============================================================================
