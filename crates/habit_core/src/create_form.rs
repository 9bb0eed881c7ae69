use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::HabitResult,
    habit::{validate_name, Habit},
    state::{StateCell, StateStream},
    store::HabitStore,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFormState {
    pub habit_name: String,
    pub is_name_error: bool,
    pub error_message: String,
}

pub struct CreateHabitForm {
    store: Arc<HabitStore>,
    state: StateCell<CreateFormState>,
}

impl CreateHabitForm {
    pub fn new(store: Arc<HabitStore>) -> Self {
        Self {
            store,
            state: StateCell::default(),
        }
    }

    pub fn observe(&self) -> StateStream<CreateFormState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CreateFormState {
        self.state.get()
    }

    /// Typing always clears any previous error.
    pub fn set_name(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.update(|state| {
            state.habit_name = text;
            state.is_name_error = false;
            state.error_message.clear();
        });
    }

    /// Validates the current name and adds the habit to the store. On failure
    /// the error is reflected in the form state and the name is left as typed.
    pub fn submit_habit(&self) -> HabitResult<Habit> {
        let name = self.state.get().habit_name;
        match validate_name(&name) {
            Ok(name) => {
                let habit = Habit::new(name);
                self.store.add(habit.clone());
                Ok(habit)
            }
            Err(err) => {
                debug!(%err, "habit form rejected");
                let message = err.to_string();
                self.state.update(|state| {
                    state.is_name_error = true;
                    state.error_message = message;
                });
                Err(err)
            }
        }
    }

    pub fn submit(&self) -> bool {
        self.submit_habit().is_ok()
    }

    pub fn reset(&self) {
        self.state.set(CreateFormState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HabitError;

    #[test]
    fn blank_name_is_rejected_and_kept() {
        let store = Arc::new(HabitStore::default());
        let form = CreateHabitForm::new(store.clone());
        form.set_name("   ");
        assert!(!form.submit());
        let state = form.state();
        assert!(state.is_name_error);
        assert_eq!(state.error_message, "Name cannot be empty");
        assert_eq!(state.habit_name, "   ");
        assert!(store.habits().is_empty());
    }

    #[test]
    fn valid_name_is_trimmed_and_added_once() {
        let store = Arc::new(HabitStore::default());
        let form = CreateHabitForm::new(store.clone());
        form.set_name("  Read ");
        assert!(form.submit());
        let habits = store.habits();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].name, "Read");
        assert!(habits[0].completion_history.is_empty());
        assert_eq!(form.state().habit_name, "  Read ");
    }

    #[test]
    fn typing_clears_error() {
        let form = CreateHabitForm::new(Arc::new(HabitStore::default()));
        assert_eq!(form.submit_habit(), Err(HabitError::EmptyName));
        assert!(form.state().is_name_error);
        form.set_name("R");
        assert_eq!(
            form.state(),
            CreateFormState {
                habit_name: "R".into(),
                is_name_error: false,
                error_message: String::new(),
            }
        );
    }

    #[test]
    fn reset_restores_initial_state_only() {
        let store = Arc::new(HabitStore::default());
        let form = CreateHabitForm::new(store.clone());
        form.set_name("Walk");
        let habit = form.submit_habit().unwrap();
        form.reset();
        assert_eq!(form.state(), CreateFormState::default());
        assert_eq!(store.habits(), vec![habit]);
    }

    #[tokio::test]
    async fn observers_replay_form_state() {
        let form = CreateHabitForm::new(Arc::new(HabitStore::default()));
        form.set_name("Read");
        let mut stream = form.observe();
        assert_eq!(stream.next().await.unwrap().habit_name, "Read");
        form.set_name("");
        assert!(!form.submit());
        let state = stream.next().await.unwrap();
        assert!(state.is_name_error);
    }
}
