use thiserror::Error;

use crate::habit::HabitId;

pub type HabitResult<T> = Result<T, HabitError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("no habit with id {0}")]
    UnknownHabit(HabitId),
}
