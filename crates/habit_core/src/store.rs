use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{
    habit::{Habit, HabitId},
    state::{StateCell, StateStream},
};

/// Owns the canonical, insertion-ordered habit collection and republishes it
/// after every mutation. Unknown ids are silently ignored.
pub struct HabitStore {
    habits: StateCell<Vec<Habit>>,
}

pub struct HabitStoreBuilder {
    habits: Vec<Habit>,
}

impl HabitStoreBuilder {
    pub fn new() -> Self {
        Self { habits: Vec::new() }
    }

    pub fn with_habit(mut self, habit: Habit) -> Self {
        self.habits.push(habit);
        self
    }

    pub fn with_named(self, name: impl Into<String>) -> Self {
        self.with_habit(Habit::new(name))
    }

    pub fn build(self) -> HabitStore {
        debug!(count = self.habits.len(), "habit store seeded");
        HabitStore {
            habits: StateCell::new(self.habits),
        }
    }
}

impl Default for HabitStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for HabitStore {
    fn default() -> Self {
        HabitStoreBuilder::new().build()
    }
}

impl HabitStore {
    pub fn builder() -> HabitStoreBuilder {
        HabitStoreBuilder::new()
    }

    pub fn observe(&self) -> StateStream<Vec<Habit>> {
        self.habits.subscribe()
    }

    pub(crate) fn receiver(&self) -> tokio::sync::watch::Receiver<Vec<Habit>> {
        self.habits.receiver()
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.habits.get()
    }

    pub fn get(&self, id: HabitId) -> Option<Habit> {
        self.habits
            .get()
            .into_iter()
            .find(|habit| habit.id == id)
    }

    pub fn add(&self, habit: Habit) {
        info!(habit_id = %habit.id, name = %habit.name, "habit added");
        self.habits.update(|habits| habits.push(habit));
    }

    pub fn update(&self, habit: Habit) {
        let id = habit.id;
        let replaced = self.habits.update_if(|habits| {
            match habits.iter_mut().find(|existing| existing.id == habit.id) {
                Some(slot) if *slot != habit => {
                    *slot = habit;
                    true
                }
                _ => false,
            }
        });
        debug!(habit_id = %id, replaced, "habit update");
    }

    pub fn delete(&self, id: HabitId) {
        let removed = self.habits.update_if(|habits| {
            let before = habits.len();
            habits.retain(|habit| habit.id != id);
            habits.len() != before
        });
        if removed {
            info!(habit_id = %id, "habit deleted");
        } else {
            debug!(habit_id = %id, "delete ignored for unknown habit");
        }
    }

    pub fn toggle_completion(&self, id: HabitId, date: NaiveDate) {
        let mut completed = None;
        self.habits.update_if(|habits| {
            let Some(habit) = habits.iter_mut().find(|habit| habit.id == id) else {
                return false;
            };
            completed = Some(habit.toggle(date));
            true
        });
        match completed {
            Some(completed) => debug!(habit_id = %id, %date, completed, "completion toggled"),
            None => debug!(habit_id = %id, %date, "toggle ignored for unknown habit"),
        }
    }

    /// Case-insensitive substring match on name; a blank query returns
    /// everything in store order.
    pub fn search(&self, query: &str) -> Vec<Habit> {
        filter_habits(&self.habits.get(), query)
    }
}

pub(crate) fn filter_habits(habits: &[Habit], query: &str) -> Vec<Habit> {
    habits
        .iter()
        .filter(|habit| habit.matches_query(query))
        .cloned()
        .collect()
}
