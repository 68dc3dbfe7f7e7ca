//! Day layout: packs overlapping timed occurrences into side-by-side columns.
//!
//! The packing itself is a greedy minimum coloring of an interval set and
//! works on plain `Interval`s; the occurrence-level functions wrap it.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{MinuteSpan, Occurrence};
use crate::recurrence::group_by_day;

/// Half-open interval `[start, end)` in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    /// An `end` before `start` is clamped to an empty interval.
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    #[inline]
    pub fn duration(&self) -> u32 {
        self.end - self.start
    }

    /// Strict overlap; back-to-back intervals do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl From<MinuteSpan> for Interval {
    fn from(span: MinuteSpan) -> Self {
        Interval::new(span.start, span.end)
    }
}

/// Column assignment for one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub column: usize,
    /// 1 + the highest column among intervals overlapping this one
    pub group_size: usize,
}

/// Packs intervals into the fewest columns such that no two intervals in a
/// column overlap. The result is aligned with the input slice.
pub fn pack_intervals(intervals: &[Interval]) -> Vec<Placement> {
    let (_, placements) = assign_columns(intervals);
    placements
}

/// Number of columns a packing uses.
pub fn column_count(placements: &[Placement]) -> usize {
    placements.iter().map(|p| p.column + 1).max().unwrap_or(0)
}

/// Returns the placement order and the placements (indexed like the input).
fn assign_columns(intervals: &[Interval]) -> (Vec<usize>, Vec<Placement>) {
    let mut order: Vec<usize> = (0..intervals.len()).collect();
    // stable sort keeps input order for full ties
    order.sort_by(|&a, &b| {
        let (a, b) = (&intervals[a], &intervals[b]);
        a.start
            .cmp(&b.start)
            .then_with(|| b.duration().cmp(&a.duration()))
    });

    let mut columns = vec![0usize; intervals.len()];
    let mut column_end: Vec<u32> = Vec::new();

    for &index in &order {
        let interval = intervals[index];
        let column = match column_end.iter().position(|&end| end <= interval.start) {
            Some(free) => {
                column_end[free] = interval.end;
                free
            }
            None => {
                column_end.push(interval.end);
                column_end.len() - 1
            }
        };
        columns[index] = column;
    }

    let placements = intervals
        .iter()
        .enumerate()
        .map(|(i, interval)| {
            let widest = intervals
                .iter()
                .enumerate()
                .filter(|&(j, other)| j == i || interval.overlaps(other))
                .map(|(j, _)| columns[j])
                .max()
                .unwrap_or(columns[i]);
            Placement {
                column: columns[i],
                group_size: widest + 1,
            }
        })
        .collect();

    (order, placements)
}

/// An occurrence positioned within its day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEvent {
    pub occurrence: Occurrence,
    pub column_index: usize,
    pub overlap_group_size: usize,
}

/// Packs one day's timed occurrences. All-day occurrences have no interval
/// and are left out. Events come back in placement order (start ascending,
/// longer first on ties).
pub fn pack(occurrences: &[Occurrence]) -> Vec<LayoutEvent> {
    let timed: Vec<(&Occurrence, Interval)> = occurrences
        .iter()
        .filter_map(|occurrence| occurrence.span.map(|span| (occurrence, Interval::from(span))))
        .collect();
    let intervals: Vec<Interval> = timed.iter().map(|&(_, interval)| interval).collect();
    let (order, placements) = assign_columns(&intervals);

    order
        .into_iter()
        .map(|index| LayoutEvent {
            occurrence: timed[index].0.clone(),
            column_index: placements[index].column,
            overlap_group_size: placements[index].group_size,
        })
        .collect()
}

/// Everything shown for a single date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayLayout {
    pub date: NaiveDate,
    pub all_day: Vec<Occurrence>,
    pub timed: Vec<LayoutEvent>,
    pub column_count: usize,
}

/// Lays out the occurrences falling on `date`; others are ignored.
pub fn layout_day(date: NaiveDate, occurrences: &[Occurrence]) -> DayLayout {
    let (all_day, timed): (Vec<Occurrence>, Vec<Occurrence>) = occurrences
        .iter()
        .filter(|occurrence| occurrence.date == date)
        .cloned()
        .partition(Occurrence::is_all_day);

    let timed = pack(&timed);
    let column_count = timed
        .iter()
        .map(|event| event.column_index + 1)
        .max()
        .unwrap_or(0);

    tracing::trace!(%date, all_day = all_day.len(), timed = timed.len(), column_count, "laid out day");

    DayLayout {
        date,
        all_day,
        timed,
        column_count,
    }
}

/// Lays out every date that has at least one occurrence, in date order.
pub fn layout_window(occurrences: &[Occurrence]) -> Vec<DayLayout> {
    group_by_day(occurrences)
        .into_iter()
        .map(|(date, day)| layout_day(date, &day))
        .collect()
}
