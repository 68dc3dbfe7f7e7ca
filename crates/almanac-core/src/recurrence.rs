use chrono::{Days, Months, NaiveDate, NaiveTime};
use rrule::{RRuleSet, Tz as RRuleTz};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ExpansionConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::RecurrenceError;
use crate::models::{
    weekday_ordinal, DateWindow, EventDefinition, EventStatus, Granularity, LegacyRecurrence,
    Occurrence, RecurrenceSpec,
};

/// RecurrenceExpander: turns master event definitions into the concrete
/// occurrences visible in a date window.
///
/// Responsibilities:
/// 1. Emit the master occurrence on each definition's anchor date
/// 2. Enumerate RRULE occurrences anchored at a time-zone-neutral midnight
/// 3. Step legacy daily/weekly/monthly/yearly series, including weekday subsets
/// 4. Apply exclusions and per-date completion state
/// 5. Recover from malformed rules locally, reporting to a diagnostic sink
pub struct RecurrenceExpander {
    config: ExpansionConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl RecurrenceExpander {
    pub fn new(config: ExpansionConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { config, sink }
    }

    /// Creates an expander with default configuration that logs diagnostics.
    pub fn with_defaults() -> Self {
        Self::new(ExpansionConfig::default(), Arc::new(TracingSink))
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    /// Expands definitions into occurrences inside `window`.
    ///
    /// # Arguments
    /// * `definitions` - Master event definitions, left untouched
    /// * `window` - Inclusive date window
    ///
    /// # Returns
    /// * `Vec<Occurrence>` - Occurrences ordered by date, start minute and source id
    ///
    /// # Behavior
    /// - Each definition is expanded independently
    /// - A definition whose anchor lies outside the window still contributes
    ///   generated occurrences that land inside it
    /// - Never fails; rule problems are sent to the diagnostic sink
    #[tracing::instrument(
        skip(self, definitions),
        fields(definitions = definitions.len(), start = %window.start(), end = %window.end())
    )]
    pub fn expand(&self, definitions: &[EventDefinition], window: DateWindow) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();
        for definition in definitions {
            self.expand_definition(definition, window, &mut occurrences);
        }

        occurrences.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.span.map(|s| s.start).cmp(&b.span.map(|s| s.start)))
                .then_with(|| a.source_id.cmp(&b.source_id))
        });

        tracing::debug!(occurrences = occurrences.len(), "expansion finished");
        occurrences
    }

    fn expand_definition(
        &self,
        definition: &EventDefinition,
        window: DateWindow,
        out: &mut Vec<Occurrence>,
    ) {
        let anchor = definition.anchor_date;
        let anchor_allowed = definition
            .weekday_filter()
            .map_or(true, |filter| filter.contains(&weekday_ordinal(anchor)));

        if window.contains(anchor) && !definition.exclusions.contains(&anchor) && anchor_allowed {
            let completed = if definition.is_recurring() {
                definition.completions.contains(&anchor)
            } else {
                definition.status == EventStatus::Completed
            };
            out.push(Occurrence::master(definition, completed));
        }

        let dates = match &definition.recurrence {
            RecurrenceSpec::None | RecurrenceSpec::FlagOnly => return,
            RecurrenceSpec::Legacy(legacy) => self.legacy_dates(definition, legacy, window),
            RecurrenceSpec::Rule { rule, fallback } => {
                match self.rule_dates(definition, rule, window) {
                    Ok(dates) => dates,
                    Err(error) => {
                        self.sink.report(&definition.id, &error);
                        match fallback {
                            Some(legacy) => self.legacy_dates(definition, legacy, window),
                            None => return,
                        }
                    }
                }
            }
        };

        out.extend(dates.into_iter().map(|date| {
            Occurrence::generated(definition, date, definition.completions.contains(&date))
        }));
    }

    /// Dates produced by an RRULE, after anchor/exclusion filtering.
    fn rule_dates(
        &self,
        definition: &EventDefinition,
        rule: &str,
        window: DateWindow,
    ) -> Result<Vec<NaiveDate>, RecurrenceError> {
        let rule_set = parse_rule(rule, definition.anchor_date)?;

        // Bounds are widened by a day and the window is re-checked on plain
        // dates below, so inclusivity of the rrule bounds does not matter.
        let after = window.start().pred_opt().unwrap_or(window.start());
        let before = window.end().succ_opt().unwrap_or(window.end());
        let bounded = rule_set
            .after(utc_midnight(after))
            .before(utc_midnight(before));

        let candidates = bounded
            .into_iter()
            .map(|dt| dt.date_naive())
            .take_while(|date| *date <= window.end())
            .filter(|date| *date >= window.start());

        Ok(self.collect_generated(definition, candidates, |_| true))
    }

    /// Dates produced by legacy stepping from the anchor.
    fn legacy_dates(
        &self,
        definition: &EventDefinition,
        legacy: &LegacyRecurrence,
        window: DateWindow,
    ) -> Vec<NaiveDate> {
        let day_by_day = legacy.is_day_by_day();
        let steps = LegacySteps::new(definition.anchor_date, legacy, window);

        self.collect_generated(
            definition,
            steps.filter(|date| *date >= window.start()),
            |date| !day_by_day || legacy.weekday_filter.contains(&weekday_ordinal(date)),
        )
    }

    fn collect_generated(
        &self,
        definition: &EventDefinition,
        candidates: impl Iterator<Item = NaiveDate>,
        accept: impl Fn(NaiveDate) -> bool,
    ) -> Vec<NaiveDate> {
        let limit = self.config.max_occurrences_per_definition;
        let mut dates: Vec<NaiveDate> = Vec::new();

        // Candidates arrive in ascending order; sub-daily rules repeat a date.
        for date in candidates {
            if date == definition.anchor_date
                || dates.last() == Some(&date)
                || definition.exclusions.contains(&date)
                || !accept(date)
            {
                continue;
            }
            if let Some(limit) = limit.filter(|limit| dates.len() == *limit) {
                self.sink
                    .report(&definition.id, &RecurrenceError::TooManyOccurrences { limit });
                break;
            }
            dates.push(date);
        }

        dates
    }

    /// Validates an RRULE body without expanding it.
    ///
    /// The rule is parsed against a fixed anchor date.
    pub fn validate_rule(rule: &str) -> Result<(), RecurrenceError> {
        let anchor = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
        parse_rule(rule, anchor).map(|_| ())
    }
}

impl std::fmt::Debug for RecurrenceExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecurrenceExpander")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for RecurrenceExpander {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Expands with default configuration, logging diagnostics through `tracing`.
/// An inverted window yields no occurrences.
pub fn expand(definitions: &[EventDefinition], start: NaiveDate, end: NaiveDate) -> Vec<Occurrence> {
    match DateWindow::new(start, end) {
        Ok(window) => RecurrenceExpander::with_defaults().expand(definitions, window),
        Err(_) => Vec::new(),
    }
}

/// Buckets occurrences by date, keeping their relative order.
pub fn group_by_day(occurrences: &[Occurrence]) -> BTreeMap<NaiveDate, Vec<Occurrence>> {
    let mut days: BTreeMap<NaiveDate, Vec<Occurrence>> = BTreeMap::new();
    for occurrence in occurrences {
        days.entry(occurrence.date)
            .or_default()
            .push(occurrence.clone());
    }
    days
}

/// Builds an RRuleSet whose DTSTART is the anchor date at UTC midnight. Any
/// DTSTART carried by the rule text is replaced so the series cannot drift
/// across a zone boundary.
fn parse_rule(rule: &str, anchor: NaiveDate) -> Result<RRuleSet, RecurrenceError> {
    let body: Vec<String> = rule
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.to_ascii_uppercase().starts_with("DTSTART"))
        .map(|line| {
            let upper = line.to_ascii_uppercase();
            let has_property = ["RRULE:", "EXRULE:", "RDATE", "EXDATE"]
                .iter()
                .any(|prefix| upper.starts_with(prefix));
            if has_property {
                line.to_string()
            } else {
                format!("RRULE:{}", line)
            }
        })
        .collect();

    let text = format!("DTSTART:{}T000000Z\n{}", anchor.format("%Y%m%d"), body.join("\n"));

    text.parse::<RRuleSet>()
        .map_err(|e| RecurrenceError::RuleParse {
            rule: rule.to_string(),
            reason: e.to_string(),
        })
}

fn utc_midnight(date: NaiveDate) -> chrono::DateTime<RRuleTz> {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .with_timezone(&RRuleTz::UTC)
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Days(u64),
    Months(u32),
}

/// Dates `anchor + k * step` for k >= 1 up to the window end. Month steps are
/// always measured from the anchor so end-of-month clamping never compounds.
struct LegacySteps {
    anchor: NaiveDate,
    step: Step,
    k: u32,
    end: NaiveDate,
}

impl LegacySteps {
    fn new(anchor: NaiveDate, legacy: &LegacyRecurrence, window: DateWindow) -> Self {
        let step = if legacy.is_day_by_day() {
            Step::Days(1)
        } else {
            match legacy.granularity {
                Granularity::Daily => Step::Days(1),
                Granularity::Weekly => Step::Days(7),
                Granularity::Monthly => Step::Months(1),
                Granularity::Yearly => Step::Months(12),
            }
        };

        // Skip straight to the first step that can reach the window.
        let k = match step {
            Step::Days(n) => {
                let gap = (window.start() - anchor).num_days();
                if gap > 0 {
                    u32::try_from((gap as u64).div_ceil(n)).unwrap_or(u32::MAX)
                } else {
                    1
                }
            }
            Step::Months(n) => {
                let gap = months_between(anchor, window.start());
                if gap > 0 {
                    u32::try_from(gap).unwrap_or(u32::MAX) / n
                } else {
                    1
                }
            }
        }
        .max(1);

        Self {
            anchor,
            step,
            k,
            end: window.end(),
        }
    }

    fn date_at(&self, k: u32) -> Option<NaiveDate> {
        match self.step {
            Step::Days(n) => self.anchor.checked_add_days(Days::new(u64::from(k) * n)),
            Step::Months(n) => self.anchor.checked_add_months(Months::new(k.checked_mul(n)?)),
        }
    }
}

impl Iterator for LegacySteps {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let date = self.date_at(self.k)?;
        if date > self.end {
            return None;
        }
        self.k = self.k.checked_add(1)?;
        Some(date)
    }
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    use chrono::Datelike;
    i64::from(to.year() - from.year()) * 12 + i64::from(to.month()) - i64::from(from.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
        DateWindow::new(start, end).unwrap()
    }

    fn legacy(granularity: Granularity) -> RecurrenceSpec {
        RecurrenceSpec::Legacy(LegacyRecurrence::new(granularity))
    }

    fn dates_of(occurrences: &[Occurrence]) -> Vec<NaiveDate> {
        occurrences.iter().map(|o| o.date).collect()
    }

    fn recording_expander() -> (RecurrenceExpander, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let expander = RecurrenceExpander::new(ExpansionConfig::default(), sink.clone());
        (expander, sink)
    }

    mod master_tests {
        use super::*;

        #[test]
        fn test_non_recurring_completed() {
            let definition = EventDefinition::new("post", date(2024, 1, 3))
                .with_status(EventStatus::Completed);
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 31));

            assert_eq!(occurrences.len(), 1);
            assert!(occurrences[0].completed);
            assert!(!occurrences[0].is_virtual);
            assert_eq!(occurrences[0].occurrence_id, "post");
        }

        #[test]
        fn test_non_recurring_ignores_completions() {
            let definition = EventDefinition::new("post", date(2024, 1, 3))
                .completed_on([date(2024, 1, 3)]);
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 31));
            assert!(!occurrences[0].completed);
        }

        #[test]
        fn test_recurring_master_uses_completions() {
            let definition = EventDefinition::new("standup", date(2024, 1, 1))
                .with_recurrence(legacy(Granularity::Daily))
                .with_status(EventStatus::Completed);
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 1));
            assert_eq!(occurrences.len(), 1);
            assert!(!occurrences[0].completed);
        }

        #[test]
        fn test_flag_only_emits_master_with_completion() {
            let definition = EventDefinition::new("flagged", date(2024, 1, 2))
                .with_recurrence(RecurrenceSpec::FlagOnly)
                .completed_on([date(2024, 1, 2)]);
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 31));
            assert_eq!(dates_of(&occurrences), vec![date(2024, 1, 2)]);
            assert!(occurrences[0].completed);
        }

        #[test]
        fn test_excluded_master_suppressed_but_series_continues() {
            let definition = EventDefinition::new("daily", date(2024, 1, 1))
                .with_recurrence(legacy(Granularity::Daily))
                .excluding([date(2024, 1, 1)]);
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 3));
            assert_eq!(dates_of(&occurrences), vec![date(2024, 1, 2), date(2024, 1, 3)]);
            assert!(occurrences.iter().all(|o| o.is_virtual));
        }

        #[test]
        fn test_master_respects_weekday_filter() {
            // 2024-01-02 is a Tuesday
            let definition = EventDefinition::new("mw", date(2024, 1, 2)).with_recurrence(
                RecurrenceSpec::Legacy(
                    LegacyRecurrence::new(Granularity::Weekly).on_weekdays([1, 3]),
                ),
            );
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 3));
            assert_eq!(dates_of(&occurrences), vec![date(2024, 1, 3)]);
        }

        #[test]
        fn test_timed_master_span() {
            let definition = EventDefinition::new("timed", date(2024, 1, 1))
                .at(NaiveTime::from_hms_opt(9, 15, 0).unwrap(), 30);
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 1));
            let span = occurrences[0].span.unwrap();
            assert_eq!((span.start, span.end), (555, 585));
        }
    }

    mod legacy_tests {
        use super::*;

        #[test]
        fn test_daily_window() {
            let definition = EventDefinition::new("daily", date(2024, 1, 1))
                .with_recurrence(legacy(Granularity::Daily));
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 5));

            assert_eq!(occurrences.len(), 5);
            assert!(!occurrences[0].is_virtual);
            assert!(occurrences[1..].iter().all(|o| o.is_virtual));
            assert_eq!(occurrences[4].occurrence_id, "daily@2024-01-05");
        }

        #[test]
        fn test_daily_with_exclusion() {
            let definition = EventDefinition::new("daily", date(2024, 1, 1))
                .with_recurrence(legacy(Granularity::Daily))
                .excluding([date(2024, 1, 3)]);
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 5));
            assert_eq!(occurrences.len(), 4);
            assert!(!dates_of(&occurrences).contains(&date(2024, 1, 3)));
        }

        #[test]
        fn test_weekly_weekday_subset_day_by_day() {
            let definition = EventDefinition::new("mw", date(2024, 1, 1)).with_recurrence(
                RecurrenceSpec::Legacy(
                    LegacyRecurrence::new(Granularity::Weekly).on_weekdays([1, 3]),
                ),
            );
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 14));
            assert_eq!(
                dates_of(&occurrences),
                vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 8), date(2024, 1, 10)]
            );
        }

        #[test]
        fn test_monthly_filter_does_not_restrict_steps() {
            // A weekday filter only applies per-day to daily/weekly series.
            let definition = EventDefinition::new("m", date(2024, 1, 1)).with_recurrence(
                RecurrenceSpec::Legacy(
                    LegacyRecurrence::new(Granularity::Monthly).on_weekdays([1]),
                ),
            );
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 3, 31));
            assert_eq!(
                dates_of(&occurrences),
                vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]
            );
        }

        #[rstest]
        #[case::weekly(
            Granularity::Weekly,
            date(2024, 1, 1),
            date(2024, 1, 1),
            vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]
        )]
        #[case::monthly_clamps(
            Granularity::Monthly,
            date(2024, 1, 31),
            date(2024, 1, 1),
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]
        )]
        #[case::yearly_leap(
            Granularity::Yearly,
            date(2020, 2, 29),
            date(2021, 1, 1),
            vec![date(2021, 2, 28), date(2022, 2, 28), date(2023, 2, 28), date(2024, 2, 29)]
        )]
        fn test_granularity_steps(
            #[case] granularity: Granularity,
            #[case] anchor: NaiveDate,
            #[case] start: NaiveDate,
            #[case] expected: Vec<NaiveDate>,
        ) {
            let definition = EventDefinition::new("g", anchor).with_recurrence(legacy(granularity));
            let end = *expected.last().unwrap();
            let occurrences = expand(&[definition], start, end);
            assert_eq!(dates_of(&occurrences), expected);
        }

        #[test]
        fn test_anchor_before_window_fast_forwards() {
            let definition = EventDefinition::new("weekly", date(2020, 1, 6))
                .with_recurrence(legacy(Granularity::Weekly));
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 14));
            // 2020-01-06 and 2024-01-01 are both Mondays
            assert_eq!(dates_of(&occurrences), vec![date(2024, 1, 1), date(2024, 1, 8)]);
            assert!(occurrences.iter().all(|o| o.is_virtual));
        }

        #[test]
        fn test_anchor_after_window_yields_nothing() {
            let definition = EventDefinition::new("later", date(2024, 6, 1))
                .with_recurrence(legacy(Granularity::Daily));
            assert!(expand(&[definition], date(2024, 1, 1), date(2024, 1, 31)).is_empty());
        }

        #[test]
        fn test_completions_are_per_date() {
            let definition = EventDefinition::new("daily", date(2024, 1, 1))
                .with_recurrence(legacy(Granularity::Daily))
                .completed_on([date(2024, 1, 2)]);
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 3));
            let completed: Vec<bool> = occurrences.iter().map(|o| o.completed).collect();
            assert_eq!(completed, vec![false, true, false]);
        }

        #[test]
        fn test_occurrence_cap_reports() {
            let sink = Arc::new(RecordingSink::new());
            let expander = RecurrenceExpander::new(
                ExpansionConfig {
                    max_occurrences_per_definition: Some(3),
                    ..Default::default()
                },
                sink.clone(),
            );
            let definition = EventDefinition::new("daily", date(2024, 1, 1))
                .with_recurrence(legacy(Granularity::Daily));
            let occurrences =
                expander.expand(&[definition], window(date(2024, 1, 1), date(2024, 1, 31)));

            // master plus three generated
            assert_eq!(occurrences.len(), 4);
            assert_eq!(
                sink.reports(),
                vec![("daily".to_string(), RecurrenceError::TooManyOccurrences { limit: 3 })]
            );
        }

        #[test]
        fn test_default_config_keeps_long_windows_whole() {
            let (expander, sink) = recording_expander();
            let definition = EventDefinition::new("daily", date(2024, 1, 1))
                .with_recurrence(legacy(Granularity::Daily));
            let occurrences =
                expander.expand(&[definition], window(date(2024, 1, 1), date(2027, 12, 31)));

            assert_eq!(occurrences.len(), 1461);
            assert_eq!(occurrences.last().unwrap().date, date(2027, 12, 31));
            assert!(sink.is_empty());
        }
    }

    mod rule_tests {
        use super::*;

        fn rule(text: &str) -> RecurrenceSpec {
            RecurrenceSpec::Rule {
                rule: text.to_string(),
                fallback: None,
            }
        }

        #[test]
        fn test_rule_weekly_byday() {
            let definition = EventDefinition::new("r", date(2024, 1, 1))
                .with_recurrence(rule("FREQ=WEEKLY;BYDAY=MO,FR"));
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 12));
            assert_eq!(
                dates_of(&occurrences),
                vec![date(2024, 1, 1), date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 12)]
            );
            assert!(!occurrences[0].is_virtual);
        }

        #[test]
        fn test_rule_window_is_inclusive_and_anchor_outside() {
            let definition = EventDefinition::new("r", date(2023, 12, 1))
                .with_recurrence(rule("FREQ=DAILY"));
            let occurrences = expand(&[definition], date(2024, 1, 10), date(2024, 1, 12));
            assert_eq!(
                dates_of(&occurrences),
                vec![date(2024, 1, 10), date(2024, 1, 11), date(2024, 1, 12)]
            );
        }

        #[test]
        fn test_rule_with_count_and_exclusions() {
            let definition = EventDefinition::new("r", date(2024, 1, 1))
                .with_recurrence(rule("FREQ=DAILY;COUNT=4"))
                .excluding([date(2024, 1, 2)])
                .completed_on([date(2024, 1, 3)]);
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 31));
            assert_eq!(
                dates_of(&occurrences),
                vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 4)]
            );
            assert!(occurrences[1].completed);
            assert!(!occurrences[2].completed);
        }

        #[rstest]
        #[case::hourly("FREQ=HOURLY;INTERVAL=6")]
        #[case::twice_daily("FREQ=DAILY;BYHOUR=9,17")]
        fn test_sub_daily_rule_yields_one_occurrence_per_date(#[case] text: &str) {
            let definition = EventDefinition::new("h", date(2024, 1, 1)).with_recurrence(rule(text));
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 3));

            assert_eq!(
                dates_of(&occurrences),
                vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
            );
            let ids: Vec<&str> = occurrences.iter().map(|o| o.occurrence_id.as_str()).collect();
            assert_eq!(ids, vec!["h", "h@2024-01-02", "h@2024-01-03"]);
        }

        #[test]
        fn test_rule_prefix_and_dtstart_replaced() {
            let definition = EventDefinition::new("r", date(2024, 1, 1)).with_recurrence(rule(
                "DTSTART:20230101T150000Z\nRRULE:FREQ=DAILY;INTERVAL=2",
            ));
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 5));
            assert_eq!(
                dates_of(&occurrences),
                vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 5)]
            );
        }

        #[test]
        fn test_rule_wins_over_fallback() {
            let definition = EventDefinition::new("r", date(2024, 1, 1)).with_recurrence(
                RecurrenceSpec::Rule {
                    rule: "FREQ=WEEKLY".to_string(),
                    fallback: Some(LegacyRecurrence::new(Granularity::Daily)),
                },
            );
            let occurrences = expand(&[definition], date(2024, 1, 1), date(2024, 1, 10));
            assert_eq!(dates_of(&occurrences), vec![date(2024, 1, 1), date(2024, 1, 8)]);
        }

        #[test]
        fn test_malformed_rule_falls_back_to_legacy() {
            let (expander, sink) = recording_expander();
            let definition = EventDefinition::new("broken", date(2024, 1, 1)).with_recurrence(
                RecurrenceSpec::Rule {
                    rule: "FREQ=SOMETIMES".to_string(),
                    fallback: Some(LegacyRecurrence::new(Granularity::Daily)),
                },
            );
            let occurrences =
                expander.expand(&[definition], window(date(2024, 1, 1), date(2024, 1, 3)));

            assert_eq!(occurrences.len(), 3);
            let reports = sink.reports();
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].0, "broken");
            assert!(matches!(reports[0].1, RecurrenceError::RuleParse { .. }));
        }

        #[test]
        fn test_malformed_rule_without_fallback_keeps_master() {
            let (expander, sink) = recording_expander();
            let definition = EventDefinition::new("broken", date(2024, 1, 1))
                .with_recurrence(rule("not a rule"));
            let occurrences =
                expander.expand(&[definition], window(date(2024, 1, 1), date(2024, 1, 3)));
            assert_eq!(dates_of(&occurrences), vec![date(2024, 1, 1)]);
            assert!(!sink.is_empty());
        }

        #[test]
        fn test_validate_rule() {
            assert!(RecurrenceExpander::validate_rule("FREQ=DAILY;INTERVAL=1").is_ok());
            assert!(RecurrenceExpander::validate_rule("RRULE:FREQ=MONTHLY;BYMONTHDAY=1").is_ok());
            assert!(matches!(
                RecurrenceExpander::validate_rule("INVALID_RRULE"),
                Err(RecurrenceError::RuleParse { .. })
            ));
        }
    }

    #[test]
    fn test_output_sorted_and_grouped() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let definitions = vec![
            EventDefinition::new("b", date(2024, 1, 1))
                .at(nine, 60)
                .with_recurrence(legacy(Granularity::Daily)),
            EventDefinition::new("a", date(2024, 1, 1))
                .at(eight, 60)
                .with_recurrence(legacy(Granularity::Daily)),
        ];
        let occurrences = expand(&definitions, date(2024, 1, 1), date(2024, 1, 2));
        let ids: Vec<&str> = occurrences.iter().map(|o| o.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "a", "b"]);

        let days = group_by_day(&occurrences);
        assert_eq!(days.len(), 2);
        assert_eq!(days[&date(2024, 1, 2)].len(), 2);
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let definition = EventDefinition::new("a", date(2024, 1, 1));
        assert!(expand(&[definition], date(2024, 1, 5), date(2024, 1, 1)).is_empty());
    }
}
