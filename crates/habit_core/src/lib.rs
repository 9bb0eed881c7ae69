pub mod clock;
pub mod create_form;
pub mod error;
pub mod habit;
pub mod list;
pub mod state;
pub mod store;

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::create_form::{CreateFormState, CreateHabitForm};
pub use crate::error::{HabitError, HabitResult};
pub use crate::habit::{week_start, DayProgress, Habit, HabitId};
pub use crate::list::{HabitListModel, ListViewState, ListViewStream};
pub use crate::store::{HabitStore, HabitStoreBuilder};
