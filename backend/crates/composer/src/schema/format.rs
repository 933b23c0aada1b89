//! Semantic string formats
//!
//! The `format` keyword is an assertion here, not an annotation: a string that
//! does not match its declared format is a violation.

use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

/// RFC 1035 hostname length limit
const HOSTNAME_MAX_LENGTH: usize = 253;

/// Supported `format` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    Uuid,
    Date,
    DateTime,
    Time,
    Uri,
    Ipv4,
    Ipv6,
    Hostname,
}

impl Format {
    /// Look up a format by its schema name
    pub fn parse(name: &str) -> Option<Self> {
        let format = match name {
            "email" => Format::Email,
            "uuid" => Format::Uuid,
            "date" => Format::Date,
            "date-time" => Format::DateTime,
            "time" => Format::Time,
            "uri" => Format::Uri,
            "ipv4" => Format::Ipv4,
            "ipv6" => Format::Ipv6,
            "hostname" => Format::Hostname,
            _ => return None,
        };
        Some(format)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::Uuid => "uuid",
            Format::Date => "date",
            Format::DateTime => "date-time",
            Format::Time => "time",
            Format::Uri => "uri",
            Format::Ipv4 => "ipv4",
            Format::Ipv6 => "ipv6",
            Format::Hostname => "hostname",
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Format::Email => email_regex().is_match(value),
            // Hyphenated form only
            Format::Uuid => value.len() == 36 && uuid::Uuid::try_parse(value).is_ok(),
            Format::Date => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
                && value.len() == 10,
            Format::DateTime => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
            Format::Time => is_time(value),
            Format::Uri => uri_regex().is_match(value),
            Format::Ipv4 => value.parse::<Ipv4Addr>().is_ok(),
            Format::Ipv6 => value.parse::<Ipv6Addr>().is_ok(),
            Format::Hostname => {
                value.len() <= HOSTNAME_MAX_LENGTH && hostname_regex().is_match(value)
            }
        }
    }
}

fn is_time(value: &str) -> bool {
    if !time_regex().is_match(value) {
        return false;
    }
    value
        .get(..8)
        .is_some_and(|hms| chrono::NaiveTime::parse_from_str(hms, "%H:%M:%S").is_ok())
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static URI_RE: OnceLock<Regex> = OnceLock::new();
static HOSTNAME_RE: OnceLock<Regex> = OnceLock::new();
static TIME_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, name: &str, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("{name} format regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    compiled(
        &EMAIL_RE,
        "email",
        r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$",
    )
}

fn uri_regex() -> &'static Regex {
    compiled(&URI_RE, "uri", r"(?i)^[a-z][a-z0-9+.\-]*:[^\s]+$")
}

fn hostname_regex() -> &'static Regex {
    compiled(
        &HOSTNAME_RE,
        "hostname",
        r"(?i)^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*\.?$",
    )
}

fn time_regex() -> &'static Regex {
    compiled(
        &TIME_RE,
        "time",
        r"(?i)^\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:z|[+-]\d{2}:\d{2})$",
    )
}
