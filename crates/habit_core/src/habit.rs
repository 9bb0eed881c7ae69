use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HabitError, HabitResult};

pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(Uuid);

impl HabitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for HabitId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A tracked habit and its sparse per-day completion record.
///
/// A missing date and an explicit `false` both mean "not completed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub completion_history: BTreeMap<NaiveDate, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub is_completed: bool,
    pub is_today: bool,
}

impl Habit {
    /// Fresh id, empty history. The name is taken as given.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: HabitId::new(),
            name: name.into(),
            completion_history: BTreeMap::new(),
        }
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completion_history.get(&date).copied().unwrap_or(false)
    }

    /// Flips the flag for `date`, always writing the new value back.
    pub(crate) fn toggle(&mut self, date: NaiveDate) -> bool {
        let next = !self.is_completed_on(date);
        self.completion_history.insert(date, next);
        next
    }

    pub fn week_progress(&self, start: NaiveDate) -> Vec<DayProgress> {
        self.week_progress_at(start, Local::now().date_naive())
    }

    pub fn week_progress_at(&self, start: NaiveDate, today: NaiveDate) -> Vec<DayProgress> {
        week_days(start)
            .into_iter()
            .map(|date| DayProgress {
                date,
                is_completed: self.is_completed_on(date),
                is_today: date == today,
            })
            .collect()
    }

    pub fn completion_ratio(&self, start: NaiveDate) -> f64 {
        // saturated days at the end of chrono's range count once
        let mut days = week_days(start).to_vec();
        days.dedup();
        let completed = days
            .into_iter()
            .filter(|date| self.is_completed_on(*date))
            .count();
        completed as f64 / DAYS_PER_WEEK as f64
    }

    pub fn matches_query(&self, query: &str) -> bool {
        query.trim().is_empty() || self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// The Monday on or before `date`. Dates in the partial first week of
/// chrono's range map to the first representable Monday instead.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().number_from_monday() - 1;
    date.checked_sub_signed(Duration::days(i64::from(offset)))
        .unwrap_or_else(first_monday)
}

fn first_monday() -> NaiveDate {
    let min = NaiveDate::MIN;
    let ahead = (7 - min.weekday().num_days_from_monday()) % 7;
    min + Duration::days(i64::from(ahead))
}

/// Seven consecutive days from `start`; days past chrono's range saturate at
/// [`NaiveDate::MAX`].
pub fn week_days(start: NaiveDate) -> [NaiveDate; DAYS_PER_WEEK] {
    let mut days = [start; DAYS_PER_WEEK];
    for (offset, day) in days.iter_mut().enumerate() {
        *day = start
            .checked_add_signed(Duration::days(offset as i64))
            .unwrap_or(NaiveDate::MAX);
    }
    days
}

/// Trimmed habit name, or [`HabitError::EmptyName`] when nothing is left.
pub fn validate_name(raw: &str) -> HabitResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(HabitError::EmptyName);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_maps_to_preceding_monday() {
        assert_eq!(week_start(date(2026, 2, 4)), date(2026, 2, 2));
        assert_eq!(week_start(date(2026, 2, 1)), date(2026, 1, 26));
        assert_eq!(week_start(date(2026, 2, 2)), date(2026, 2, 2));
    }

    #[test]
    fn week_start_is_idempotent_and_lands_on_monday() {
        let mut day = date(2025, 12, 20);
        for _ in 0..30 {
            let start = week_start(day);
            assert_eq!(start.weekday(), Weekday::Mon);
            assert_eq!(week_start(start), start);
            assert!(start <= day && day - start < Duration::days(7));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn week_start_at_range_limits() {
        let first = week_start(NaiveDate::MIN);
        assert_eq!(first.weekday(), Weekday::Mon);
        assert_eq!(week_start(first), first);
        assert!(first - NaiveDate::MIN < Duration::days(7));

        let last = week_start(NaiveDate::MAX);
        assert_eq!(last.weekday(), Weekday::Mon);
        assert!(last <= NaiveDate::MAX && NaiveDate::MAX - last < Duration::days(7));
    }

    #[test]
    fn week_queries_near_max_saturate() {
        let mut habit = Habit::new("Read");
        habit.toggle(NaiveDate::MAX);
        let start = NaiveDate::MAX - Duration::days(2);
        let days = week_days(start);
        assert_eq!(days[0], start);
        assert_eq!(days[6], NaiveDate::MAX);
        assert_eq!(habit.week_progress_at(start, NaiveDate::MAX).len(), 7);
        let ratio = Habit::new("Idle").completion_ratio(NaiveDate::MAX);
        assert_eq!(ratio, 0.0);
        let ratio = habit.completion_ratio(start);
        assert!((ratio - 1.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn week_progress_flags_system_today() {
        let today = Local::now().date_naive();
        let week = Habit::new("Read").week_progress(week_start(today));
        assert_eq!(week.len(), 7);
        assert!(week.iter().any(|day| day.date == today && day.is_today));
    }

    #[test]
    fn absent_and_explicit_false_read_the_same() {
        let mut habit = Habit::new("Stretch");
        let day = date(2026, 2, 3);
        assert!(!habit.is_completed_on(day));
        habit.toggle(day);
        habit.toggle(day);
        assert_eq!(habit.completion_history.get(&day), Some(&false));
        assert!(!habit.is_completed_on(day));
    }

    #[test]
    fn week_progress_has_seven_days_and_flags_today() {
        let mut habit = Habit::new("Read");
        habit.toggle(date(2026, 2, 3));
        let week = habit.week_progress_at(date(2026, 2, 2), date(2026, 2, 4));
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, date(2026, 2, 2));
        assert_eq!(week[6].date, date(2026, 2, 8));
        assert!(week[1].is_completed);
        assert_eq!(
            week.iter().filter(|day| day.is_today).map(|day| day.date).collect::<Vec<_>>(),
            vec![date(2026, 2, 4)]
        );
    }

    #[test]
    fn completion_ratio_counts_over_fixed_seven() {
        let mut habit = Habit::new("Run");
        for day in [date(2026, 2, 2), date(2026, 2, 4), date(2026, 2, 6)] {
            habit.toggle(day);
        }
        // outside the window
        habit.toggle(date(2026, 2, 9));
        let ratio = habit.completion_ratio(date(2026, 2, 2));
        assert!((ratio - 3.0 / 7.0).abs() < 1e-9);
        assert_eq!(Habit::new("Idle").completion_ratio(date(2026, 2, 2)), 0.0);
    }

    #[test]
    fn full_week_ratio_is_one() {
        let mut habit = Habit::new("Water");
        for day in week_days(date(2026, 2, 2)) {
            habit.toggle(day);
        }
        assert_eq!(habit.completion_ratio(date(2026, 2, 2)), 1.0);
    }

    #[test]
    fn query_matching_is_case_insensitive() {
        let habit = Habit::new("Morning run");
        assert!(habit.matches_query("RUN"));
        assert!(habit.matches_query(""));
        assert!(habit.matches_query("   "));
        assert!(!Habit::new("Walking").matches_query("RUN"));
    }

    #[test]
    fn validate_name_trims() {
        assert_eq!(validate_name("  Read \n"), Ok("Read".to_string()));
        assert_eq!(validate_name("   "), Err(HabitError::EmptyName));
    }

    #[test]
    fn renamed_keeps_identity() {
        let mut habit = Habit::new("Raed");
        habit.toggle(date(2026, 2, 2));
        let fixed = habit.renamed("Read");
        assert_eq!(fixed.id, habit.id);
        assert_eq!(fixed.completion_history, habit.completion_history);
        assert_eq!(fixed.name, "Read");
    }

    #[test]
    fn habit_id_round_trips_through_display() {
        let id = HabitId::new();
        assert_eq!(id.to_string().parse::<HabitId>().unwrap(), id);
    }
}
