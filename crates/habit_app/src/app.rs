use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use habit_core::{
    state::StateStream, Clock, CreateFormState, CreateHabitForm, FixedClock, Habit, HabitError,
    HabitId, HabitListModel, HabitStore, ListViewState, ListViewStream, SystemClock,
};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub(crate) seed: Vec<String>,
    pub(crate) today: Option<NaiveDate>,
    pub(crate) json: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(seed) = std::env::var("HABITS_SEED") {
            config.seed = parse_seed(&seed);
        }
        if let Ok(today) = std::env::var("HABITS_TODAY") {
            match NaiveDate::parse_from_str(today.trim(), "%Y-%m-%d") {
                Ok(date) => config.today = Some(date),
                Err(err) => warn!(value = %today, %err, "ignoring HABITS_TODAY"),
            }
        }
        if let Ok(flag) = std::env::var("HABITS_JSON") {
            config.json = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    fn clock(&self) -> Arc<dyn Clock> {
        match self.today {
            Some(date) => {
                info!(%date, "clock pinned");
                Arc::new(FixedClock::new(date))
            }
            None => Arc::new(SystemClock),
        }
    }
}

fn parse_seed(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// A reference to a habit as typed by the user: a row in the displayed list or an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Row(usize),
    Id(HabitId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Add(String),
    Rename(Target, String),
    Toggle(Target, Option<NaiveDate>),
    Search(String),
    ClearSearch,
    NextWeek,
    PrevWeek,
    ThisWeek,
    Delete(Target),
    Confirm,
    Cancel,
    List,
    Json,
    Help,
    Quit,
}

impl Command {
    pub(crate) fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let command = match verb.to_ascii_lowercase().as_str() {
            "add" => Command::Add(rest.to_string()),
            "rename" => {
                let (target, name) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("usage: rename <row|id> <name>"))?;
                Command::Rename(parse_target(target)?, name.trim().to_string())
            }
            "toggle" => {
                let mut parts = rest.split_whitespace();
                let target = parts
                    .next()
                    .ok_or_else(|| anyhow!("usage: toggle <row|id> [YYYY-MM-DD]"))?;
                let date = parts
                    .next()
                    .map(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
                    .transpose()
                    .context("dates look like 2026-02-04")?;
                Command::Toggle(parse_target(target)?, date)
            }
            "search" => Command::Search(rest.to_string()),
            "clear" => Command::ClearSearch,
            "next" => Command::NextWeek,
            "prev" => Command::PrevWeek,
            "today" => Command::ThisWeek,
            "delete" => Command::Delete(parse_target(rest)?),
            "confirm" | "yes" => Command::Confirm,
            "cancel" | "no" => Command::Cancel,
            "list" | "" => Command::List,
            "json" => Command::Json,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`, try `help`"),
        };
        Ok(command)
    }
}

fn parse_target(raw: &str) -> Result<Target> {
    let raw = raw.trim();
    if let Ok(row) = raw.parse::<usize>() {
        if row == 0 {
            bail!("rows start at 1");
        }
        return Ok(Target::Row(row));
    }
    raw.parse::<HabitId>()
        .map(Target::Id)
        .with_context(|| format!("`{raw}` is neither a row number nor a habit id"))
}

const HELP: &str = "\
add <name>                 create a habit
rename <row|id> <name>     rename a habit
toggle <row|id> [date]     mark today's entry done/undone
search <text> | clear      filter by name
next | prev | today        move the displayed week
delete <row|id>            ask to delete, then `confirm` or `cancel`
list | json                show the current week
quit";

pub struct HabitAppController {
    store: Arc<HabitStore>,
    list: HabitListModel,
    form: CreateHabitForm,
    view: ListViewStream,
    form_view: StateStream<CreateFormState>,
    json: bool,
}

impl HabitAppController {
    pub fn new(config: &AppConfig) -> Self {
        let mut builder = HabitStore::builder();
        for name in &config.seed {
            builder = builder.with_named(name.clone());
        }
        let store = Arc::new(builder.build());
        info!(habit_count = config.seed.len(), "initializing controller");
        let list = HabitListModel::with_clock(store.clone(), config.clock());
        let form = CreateHabitForm::new(store.clone());
        Self {
            view: list.observe(),
            form_view: form.observe(),
            list,
            form,
            store,
            json: config.json,
        }
    }

    /// Applies one command. Returns `false` once the session should end.
    pub(crate) fn handle(&mut self, command: Command, out: &mut impl Write) -> Result<bool> {
        debug!(?command, "handling command");
        match command {
            Command::Add(name) => {
                self.form.set_name(name);
                match self.form.submit_habit() {
                    Ok(habit) => {
                        self.form.reset();
                        writeln!(out, "Added {}", habit.name)?;
                    }
                    Err(_) => writeln!(out, "{}", self.form_view.current().error_message)?,
                }
            }
            Command::Rename(target, name) => {
                let habit = self.resolve(&target)?;
                let name = habit_core::habit::validate_name(&name)?;
                self.store.update(habit.renamed(name));
            }
            Command::Toggle(target, date) => {
                let habit = self.resolve(&target)?;
                let today = self.list.snapshot().today;
                let date = date.unwrap_or(today);
                if date != today {
                    writeln!(out, "Only today's entry can be changed")?;
                }
                self.list.toggle_completion(habit.id, date);
            }
            Command::Search(text) => self.list.set_search_query(text),
            Command::ClearSearch => self.list.set_search_query(""),
            Command::NextWeek => self.list.navigate_week(true),
            Command::PrevWeek => self.list.navigate_week(false),
            Command::ThisWeek => self.list.jump_to_current_week(),
            Command::Delete(target) => {
                let habit = self.resolve(&target)?;
                self.list.request_delete(habit);
            }
            Command::Confirm => match self.list.snapshot().habit_to_delete {
                Some(habit) => self.list.confirm_delete(habit.id),
                None => writeln!(out, "Nothing to delete")?,
            },
            Command::Cancel => self.list.cancel_delete(),
            Command::List => {}
            Command::Json => {
                let rendered = serde_json::to_string_pretty(&self.list.snapshot())?;
                writeln!(out, "{rendered}")?;
                return Ok(true);
            }
            Command::Help => {
                writeln!(out, "{HELP}")?;
                return Ok(true);
            }
            Command::Quit => return Ok(false),
        }
        self.render(out)?;
        Ok(true)
    }

    fn resolve(&self, target: &Target) -> Result<Habit> {
        match target {
            Target::Row(row) => self
                .list
                .snapshot()
                .habits
                .get(row - 1)
                .cloned()
                .ok_or_else(|| anyhow!("no habit at row {row}")),
            Target::Id(id) => self
                .store
                .get(*id)
                .ok_or_else(|| HabitError::UnknownHabit(*id).into()),
        }
    }

    fn render(&self, out: &mut impl Write) -> Result<()> {
        let state = self.view.current();
        if self.json {
            writeln!(out, "{}", serde_json::to_string(&state)?)?;
            return Ok(());
        }
        write!(out, "{}", render_list(&state))?;
        Ok(())
    }
}

pub(crate) fn render_list(state: &ListViewState) -> String {
    let mut text = format_week_heading(state);
    text.push('\n');
    if !state.search_query.trim().is_empty() {
        text.push_str(&format!("Filter: \"{}\"\n", state.search_query));
    }
    if state.habits.is_empty() {
        text.push_str("  (no habits)\n");
    } else {
        let header: String = state
            .week_days()
            .iter()
            .map(|day| format!("{:<3}", &day.format("%a").to_string()[..2]))
            .collect();
        text.push_str(&format!("     {}\n", header.trim_end()));
    }
    for (index, habit) in state.habits.iter().enumerate() {
        let marks: String = habit
            .week_progress_at(state.current_week_start, state.today)
            .iter()
            .map(|day| match (day.is_completed, day.is_today) {
                (true, true) => "[X]",
                (false, true) => "[_]",
                (true, false) => " x ",
                (false, false) => " . ",
            })
            .collect();
        let percent = (habit.completion_ratio(state.current_week_start) * 100.0).round();
        text.push_str(&format!(
            "{:>3}. {marks} {percent:>3}%  {}\n",
            index + 1,
            habit.name
        ));
    }
    if let (true, Some(habit)) = (state.show_delete_dialog, &state.habit_to_delete) {
        text.push_str(&format!("Delete \"{}\"? (confirm/cancel)\n", habit.name));
    }
    text
}

fn format_week_heading(state: &ListViewState) -> String {
    let range = format!(
        "{} - {}",
        state.current_week_start.format("%a %b %d"),
        state.week_end().format("%a %b %d, %Y")
    );
    let weeks = state
        .current_week_start
        .signed_duration_since(habit_core::week_start(state.today))
        .num_days()
        / 7;
    let relative = match weeks {
        0 => "This week".to_string(),
        -1 => "Last week".to_string(),
        1 => "Next week".to_string(),
        w if w < 0 => format!("{} weeks ago", -w),
        w => format!("In {} weeks", w),
    };
    format!("{relative} · {range}")
}

pub fn run(config: AppConfig) -> Result<()> {
    info!("starting habit session");
    let mut controller = HabitAppController::new(&config);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    controller.render(&mut stdout)?;
    for line in stdin.lock().lines() {
        let line = line.context("failed to read command")?;
        let keep_going = match Command::parse(&line) {
            Ok(command) => match controller.handle(command, &mut stdout) {
                Ok(keep_going) => keep_going,
                Err(err) => {
                    writeln!(stdout, "error: {err}")?;
                    true
                }
            },
            Err(err) => {
                writeln!(stdout, "error: {err:#}")?;
                true
            }
        };
        stdout.flush()?;
        if !keep_going {
            break;
        }
    }
    info!("habit session finished");
    Ok(())
}
