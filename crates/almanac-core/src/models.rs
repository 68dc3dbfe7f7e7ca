use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::ExpansionConfig;
use crate::error::{CoreError, DefinitionError};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid event status: {0}")]
pub struct ParseEventStatusError(String);

impl FromStr for EventStatus {
    type Err = ParseEventStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(EventStatus::Pending),
            "in_progress" => Ok(EventStatus::InProgress),
            "completed" => Ok(EventStatus::Completed),
            _ => Err(ParseEventStatusError(s.to_string())),
        }
    }
}

/// Step size of the legacy recurrence encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Legacy frequency as stored on persisted records, `none` included.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordFrequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecordFrequency {
    pub fn granularity(self) -> Option<Granularity> {
        match self {
            RecordFrequency::None => None,
            RecordFrequency::Daily => Some(Granularity::Daily),
            RecordFrequency::Weekly => Some(Granularity::Weekly),
            RecordFrequency::Monthly => Some(Granularity::Monthly),
            RecordFrequency::Yearly => Some(Granularity::Yearly),
        }
    }
}

/// Legacy step-based recurrence with an optional weekday restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecurrence {
    pub granularity: Granularity,
    /// Weekday ordinals, 0 = Sunday through 6 = Saturday
    pub weekday_filter: BTreeSet<u8>,
}

impl LegacyRecurrence {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            weekday_filter: BTreeSet::new(),
        }
    }

    pub fn on_weekdays(mut self, weekdays: impl IntoIterator<Item = u8>) -> Self {
        self.weekday_filter.extend(weekdays);
        self
    }

    /// Daily and weekly series restricted to a weekday subset advance one day
    /// at a time instead of by their nominal granularity.
    pub fn is_day_by_day(&self) -> bool {
        matches!(self.granularity, Granularity::Daily | Granularity::Weekly)
            && !self.weekday_filter.is_empty()
    }
}

/// How a definition repeats.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecurrenceSpec {
    /// One-off event.
    #[default]
    None,
    /// Marked recurring but carries no pattern. Only the anchor date is
    /// produced, and its completion is tracked per date.
    FlagOnly,
    Legacy(LegacyRecurrence),
    /// RFC 5545 RRULE body. The rule is authoritative; `fallback` is only
    /// stepped when the rule cannot be parsed.
    Rule {
        rule: String,
        fallback: Option<LegacyRecurrence>,
    },
}

/// Master event record, the immutable input to expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefinition {
    pub id: String,
    pub title: Option<String>,
    pub anchor_date: NaiveDate,
    /// `None` means an all-day event
    pub time_of_day: Option<NaiveTime>,
    pub duration_minutes: u32,
    pub recurrence: RecurrenceSpec,
    pub exclusions: BTreeSet<NaiveDate>,
    pub completions: BTreeSet<NaiveDate>,
    /// Only meaningful for non-recurring definitions
    pub status: EventStatus,
}

impl EventDefinition {
    pub fn new(id: impl Into<String>, anchor_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            title: None,
            anchor_date,
            time_of_day: None,
            duration_minutes: 60,
            recurrence: RecurrenceSpec::None,
            exclusions: BTreeSet::new(),
            completions: BTreeSet::new(),
            status: EventStatus::Pending,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn at(mut self, time_of_day: NaiveTime, duration_minutes: u32) -> Self {
        self.time_of_day = Some(time_of_day);
        self.duration_minutes = duration_minutes;
        self
    }

    pub fn with_recurrence(mut self, recurrence: RecurrenceSpec) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn excluding(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.exclusions.extend(dates);
        self
    }

    pub fn completed_on(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.completions.extend(dates);
        self
    }

    #[inline]
    pub fn is_recurring(&self) -> bool {
        !matches!(self.recurrence, RecurrenceSpec::None)
    }

    /// The legacy weekday restriction, whether declared directly or as a
    /// rule's fallback.
    pub fn weekday_filter(&self) -> Option<&BTreeSet<u8>> {
        let legacy = match &self.recurrence {
            RecurrenceSpec::Legacy(legacy) => Some(legacy),
            RecurrenceSpec::Rule {
                fallback: Some(legacy),
                ..
            } => Some(legacy),
            _ => None,
        };
        legacy
            .map(|legacy| &legacy.weekday_filter)
            .filter(|filter| !filter.is_empty())
    }

    /// Minute interval for an occurrence of this definition, `None` when all-day.
    pub fn span(&self) -> Option<MinuteSpan> {
        self.time_of_day.map(|time| {
            let start = time.hour() * 60 + time.minute();
            MinuteSpan {
                start,
                end: start.saturating_add(self.duration_minutes),
            }
        })
    }
}

/// Weekday ordinal with Sunday as 0.
#[inline]
pub fn weekday_ordinal(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Event record as handed over by the persistence layer.
///
/// Both recurrence encodings may be present at once; `into_definition`
/// resolves them into a single `RecurrenceSpec`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EventRecord {
    pub id: String,
    pub title: Option<String>,
    pub anchor_date: String,
    /// `HH:MM`
    pub time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub recurrence: RecordFrequency,
    pub rrule: Option<String>,
    pub weekdays: Vec<u8>,
    pub exclusions: Vec<String>,
    pub completions: Vec<String>,
    pub status: Option<EventStatus>,
    pub is_recurring: bool,
}

impl EventRecord {
    pub fn into_definition(self, config: &ExpansionConfig) -> Result<EventDefinition, DefinitionError> {
        if self.id.trim().is_empty() {
            return Err(DefinitionError::EmptyId);
        }

        let anchor_date = parse_date_key("anchorDate", &self.anchor_date)?;
        let time_of_day = self.time.as_deref().map(parse_time_of_day).transpose()?;

        if let Some(&bad) = self.weekdays.iter().find(|&&day| day > 6) {
            return Err(DefinitionError::InvalidWeekday(bad));
        }

        let legacy = self.recurrence.granularity().map(|granularity| {
            LegacyRecurrence::new(granularity).on_weekdays(self.weekdays.iter().copied())
        });
        let recurring = self.is_recurring || legacy.is_some();
        let rule = self
            .rrule
            .map(|rule| rule.trim().to_string())
            .filter(|rule| !rule.is_empty());

        let recurrence = match (rule, legacy) {
            (Some(rule), fallback) if recurring => RecurrenceSpec::Rule { rule, fallback },
            (_, Some(legacy)) => RecurrenceSpec::Legacy(legacy),
            _ if recurring => RecurrenceSpec::FlagOnly,
            _ => RecurrenceSpec::None,
        };

        let exclusions = parse_date_keys("exclusions", &self.exclusions)?;
        let completions = parse_date_keys("completions", &self.completions)?;

        Ok(EventDefinition {
            id: self.id,
            title: self.title,
            anchor_date,
            time_of_day,
            duration_minutes: self
                .duration_minutes
                .unwrap_or(config.default_duration_minutes),
            recurrence,
            exclusions,
            completions,
            status: self.status.unwrap_or_default(),
        })
    }
}

/// Parses a date key. Only the leading `YYYY-MM-DD` is significant, so
/// `2024-01-03` and `2024-01-03T00:00:00.000Z` name the same date.
pub fn parse_date_key(field: &'static str, value: &str) -> Result<NaiveDate, DefinitionError> {
    let trimmed = value.trim();
    trimmed
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .ok_or_else(|| DefinitionError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

fn parse_date_keys(field: &'static str, values: &[String]) -> Result<BTreeSet<NaiveDate>, DefinitionError> {
    values.iter().map(|value| parse_date_key(field, value)).collect()
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, DefinitionError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| DefinitionError::InvalidTime(value.to_string()))
}

/// Inclusive, date-only view window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[inline]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Minutes from midnight. `end` may run past 1440 for events crossing midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MinuteSpan {
    pub start: u32,
    pub end: u32,
}

impl MinuteSpan {
    #[inline]
    pub fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

/// Identity of an occurrence: the owning definition plus the date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceKey {
    pub source_id: String,
    pub date: NaiveDate,
}

/// A concrete instance of a definition on one date. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub source_id: String,
    pub occurrence_id: String,
    pub title: Option<String>,
    pub date: NaiveDate,
    pub span: Option<MinuteSpan>,
    pub is_virtual: bool,
    pub completed: bool,
}

impl Occurrence {
    /// The occurrence on the definition's anchor date.
    pub fn master(definition: &EventDefinition, completed: bool) -> Self {
        Self {
            source_id: definition.id.clone(),
            occurrence_id: definition.id.clone(),
            title: definition.title.clone(),
            date: definition.anchor_date,
            span: definition.span(),
            is_virtual: false,
            completed,
        }
    }

    /// A generated occurrence on `date`.
    pub fn generated(definition: &EventDefinition, date: NaiveDate, completed: bool) -> Self {
        Self {
            source_id: definition.id.clone(),
            occurrence_id: format!("{}@{}", definition.id, date),
            title: definition.title.clone(),
            date,
            span: definition.span(),
            is_virtual: true,
            completed,
        }
    }

    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey {
            source_id: self.source_id.clone(),
            date: self.date,
        }
    }

    #[inline]
    pub fn is_all_day(&self) -> bool {
        self.span.is_none()
    }
}

impl fmt::Display for MinuteSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}
