//! Date helper functions

use chrono::{DateTime, Locale, TimeZone, Utc};

use crate::config::SiteConfig;

/// Formats repository timestamps for display in the site's timezone and language
#[derive(Debug, Clone)]
pub struct DateFormatter {
    timezone: chrono_tz::Tz,
    format: String,
    locale: Locale,
}

impl DateFormatter {
    pub fn new(timezone: chrono_tz::Tz, format: &str, language: &str) -> Self {
        Self {
            timezone,
            format: moment_to_chrono_format(format),
            locale: locale_for(language),
        }
    }

    pub fn from_config(config: &SiteConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.timezone()?, &config.date_format, &config.language))
    }

    /// Display form of a timestamp; empty for unpublished documents
    pub fn format(&self, date: Option<&DateTime<Utc>>) -> String {
        match date {
            Some(date) => date
                .with_timezone(&self.timezone)
                .format_localized(&self.format, self.locale)
                .to_string(),
            None => String::new(),
        }
    }

    /// Machine-readable form for `<time datetime="...">`
    pub fn datetime(&self, date: Option<&DateTime<Utc>>) -> String {
        date.map(|d| date_xml(&d.with_timezone(&self.timezone)))
            .unwrap_or_default()
    }
}

/// Map a language tag such as `pt-BR` to a chrono locale, POSIX when unknown
fn locale_for(language: &str) -> Locale {
    Locale::try_from(language.replace('-', "_").as_str()).unwrap_or(Locale::POSIX)
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each category
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
        ("SSS", "%3f"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
