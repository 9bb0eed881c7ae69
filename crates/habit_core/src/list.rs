//! Consolidated list-screen state: the store's habits combined with the
//! transient search text, displayed week and delete-confirmation target.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::{
    clock::{Clock, SystemClock},
    habit::{week_days, week_start, Habit, HabitId, DAYS_PER_WEEK},
    state::StateCell,
    store::{filter_habits, HabitStore},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListViewState {
    pub habits: Vec<Habit>,
    pub search_query: String,
    pub current_week_start: NaiveDate,
    pub show_delete_dialog: bool,
    pub habit_to_delete: Option<Habit>,
    pub today: NaiveDate,
}

impl ListViewState {
    pub fn week_end(&self) -> NaiveDate {
        self.week_days()[DAYS_PER_WEEK - 1]
    }

    pub fn week_days(&self) -> [NaiveDate; DAYS_PER_WEEK] {
        week_days(self.current_week_start)
    }

    pub fn is_current_week(&self) -> bool {
        self.current_week_start == week_start(self.today)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ListInputs {
    search_query: String,
    week_start: NaiveDate,
    habit_to_delete: Option<Habit>,
    show_delete_dialog: bool,
}

fn derive_list_state(habits: &[Habit], inputs: &ListInputs, today: NaiveDate) -> ListViewState {
    ListViewState {
        habits: filter_habits(habits, &inputs.search_query),
        search_query: inputs.search_query.clone(),
        current_week_start: inputs.week_start,
        show_delete_dialog: inputs.show_delete_dialog,
        habit_to_delete: inputs.habit_to_delete.clone(),
        today,
    }
}

pub struct HabitListModel {
    store: Arc<HabitStore>,
    clock: Arc<dyn Clock>,
    inputs: StateCell<ListInputs>,
}

impl HabitListModel {
    pub fn new(store: Arc<HabitStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<HabitStore>, clock: Arc<dyn Clock>) -> Self {
        let inputs = ListInputs {
            search_query: String::new(),
            week_start: week_start(clock.today()),
            habit_to_delete: None,
            show_delete_dialog: false,
        };
        Self {
            store,
            clock,
            inputs: StateCell::new(inputs),
        }
    }

    pub fn store(&self) -> &Arc<HabitStore> {
        &self.store
    }

    pub fn snapshot(&self) -> ListViewState {
        derive_list_state(&self.store.habits(), &self.inputs.get(), self.clock.today())
    }

    pub fn observe(&self) -> ListViewStream {
        ListViewStream {
            habits: self.store.receiver(),
            inputs: self.inputs.receiver(),
            clock: Arc::clone(&self.clock),
            primed: false,
        }
    }

    pub fn set_search_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.inputs.update_if(|inputs| {
            if inputs.search_query == text {
                return false;
            }
            inputs.search_query = text;
            true
        });
    }

    /// Only today's entry may be changed from the list; other dates are ignored.
    pub fn toggle_completion(&self, habit_id: HabitId, date: NaiveDate) {
        let today = self.clock.today();
        if date != today {
            debug!(habit_id = %habit_id, %date, %today, "toggle ignored outside today");
            return;
        }
        self.store.toggle_completion(habit_id, date);
    }

    pub fn request_delete(&self, habit: Habit) {
        debug!(habit_id = %habit.id, "delete requested");
        self.inputs.update(|inputs| {
            inputs.habit_to_delete = Some(habit);
            inputs.show_delete_dialog = true;
        });
    }

    pub fn cancel_delete(&self) {
        self.inputs.update_if(|inputs| {
            let changed = inputs.show_delete_dialog || inputs.habit_to_delete.is_some();
            inputs.habit_to_delete = None;
            inputs.show_delete_dialog = false;
            changed
        });
    }

    pub fn confirm_delete(&self, habit_id: HabitId) {
        self.store.delete(habit_id);
        self.cancel_delete();
    }

    /// Moves the displayed week by seven days. A week that would run past
    /// chrono's date range is not entered.
    pub fn navigate_week(&self, forward: bool) {
        let step = if forward { 7 } else { -7 };
        let moved = self.inputs.update_if(|inputs| {
            let next = inputs
                .week_start
                .checked_add_signed(Duration::days(step))
                .filter(|start| {
                    start
                        .checked_add_signed(Duration::days(DAYS_PER_WEEK as i64 - 1))
                        .is_some()
                });
            match next {
                Some(start) => {
                    inputs.week_start = start;
                    true
                }
                None => false,
            }
        });
        if !moved {
            debug!(forward, "week navigation stopped at calendar limit");
        }
    }

    pub fn jump_to_current_week(&self) {
        let current = week_start(self.clock.today());
        self.inputs.update_if(|inputs| {
            if inputs.week_start == current {
                return false;
            }
            inputs.week_start = current;
            true
        });
    }
}

/// Combined stream over the store and the list's own inputs. Every emission
/// is rebuilt from the latest value of both.
pub struct ListViewStream {
    habits: watch::Receiver<Vec<Habit>>,
    inputs: watch::Receiver<ListInputs>,
    clock: Arc<dyn Clock>,
    primed: bool,
}

impl ListViewStream {
    pub fn current(&self) -> ListViewState {
        derive_list_state(&self.habits.borrow(), &self.inputs.borrow(), self.clock.today())
    }

    /// Yields the current state first, then one state per observed change.
    /// Returns `None` once the list model or its store is gone.
    pub async fn next(&mut self) -> Option<ListViewState> {
        if self.primed {
            let changed = tokio::select! {
                res = self.habits.changed() => res,
                res = self.inputs.changed() => res,
            };
            changed.ok()?;
        }
        self.primed = true;
        let habits = self.habits.borrow_and_update().clone();
        let inputs = self.inputs.borrow_and_update().clone();
        Some(derive_list_state(&habits, &inputs, self.clock.today()))
    }
}
