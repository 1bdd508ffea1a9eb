//! Pure mapping from cached state to renderer-neutral view models.

use crate::models::{Contact, EntityId, Goal, Habit, LifeArea, Task};
use chrono::NaiveDate;

pub const DEFAULT_AREA_ICON: &str = "📌";

/// Rendered state of one collection view.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<C> {
    /// Nothing has been loaded yet.
    Pending,
    Empty { message: String },
    Items(Vec<C>),
    /// The last load failed; shown instead of a previous render.
    Unavailable { title: String, message: String },
}

impl<C> ListView<C> {
    pub fn from_cards(cards: Vec<C>, empty_message: &str) -> Self {
        if cards.is_empty() {
            Self::Empty {
                message: empty_message.to_string(),
            }
        } else {
            Self::Items(cards)
        }
    }

    pub fn cards(&self) -> &[C] {
        match self {
            Self::Items(cards) => cards,
            _ => &[],
        }
    }
}

/// Filled share of a progress bar, clamped to 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress(u8);

impl Progress {
    pub fn new(percent: u8) -> Self {
        Self(percent.min(100))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Filled proportion in `0.0..=1.0`.
    pub fn fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    pub fn fill_width(self) -> String {
        format!("{}%", self.0)
    }

    /// Text bar of `width` cells.
    pub fn bar(self, width: usize) -> String {
        let filled = (width * usize::from(self.0) + 50) / 100;
        format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaCard {
    pub id: EntityId,
    pub name: String,
    pub icon: String,
    pub title: String,
    pub description: String,
}

impl From<&LifeArea> for AreaCard {
    fn from(area: &LifeArea) -> Self {
        Self {
            id: area.id,
            name: area.name.clone(),
            icon: area
                .icon
                .clone()
                .filter(|icon| !icon.is_empty())
                .unwrap_or_else(|| DEFAULT_AREA_ICON.to_string()),
            title: area.display_name.clone(),
            description: area.description.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalCard {
    pub id: EntityId,
    pub title: String,
    pub status: &'static str,
    pub description: String,
    pub timeframe: &'static str,
    pub progress: Progress,
    pub due_date: Option<NaiveDate>,
}

impl From<&Goal> for GoalCard {
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id,
            title: goal.title.clone(),
            status: goal.status.as_str(),
            description: goal
                .description
                .clone()
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| "No description".to_string()),
            timeframe: goal.timeframe.as_str(),
            progress: Progress::new(goal.progress_percentage),
            due_date: goal.due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitCard {
    pub id: EntityId,
    pub name: String,
    pub habit_type: &'static str,
    pub frequency: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_checkin: Option<NaiveDate>,
}

impl From<&Habit> for HabitCard {
    fn from(habit: &Habit) -> Self {
        Self {
            id: habit.id,
            name: habit.name.clone(),
            habit_type: habit.habit_type.as_str(),
            frequency: habit.frequency_description.clone(),
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            last_checkin: habit.last_checkin_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCard {
    pub id: EntityId,
    pub title: String,
    pub status: &'static str,
    pub priority: &'static str,
    pub area: String,
    pub due_date: Option<NaiveDate>,
}

impl From<&Task> for TaskCard {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            status: task.status.as_str(),
            priority: task.priority.as_str(),
            area: task.area.display_name.clone(),
            due_date: task.due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCard {
    pub id: EntityId,
    pub name: String,
    pub role: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub areas: Vec<String>,
}

impl From<&Contact> for ContactCard {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            name: contact.name.clone(),
            role: contact.role.clone(),
            birthday: contact.birthday,
            areas: contact
                .areas
                .iter()
                .map(|area| area.display_name.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewModel {
    Areas(ListView<AreaCard>),
    Goals(ListView<GoalCard>),
    Habits(ListView<HabitCard>),
    Tasks(ListView<TaskCard>),
    Contacts(ListView<ContactCard>),
}

impl ViewModel {
    /// Plain-text rendering, one line per card.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Areas(list) => list_lines(list, |card| {
                format!("{} {} - {}", card.icon, card.title, card.description)
            }),
            Self::Goals(list) => list_lines(list, |card| {
                format!(
                    "[{}] {} ({}, {}) {} {}",
                    card.status,
                    card.title,
                    card.timeframe,
                    card.description,
                    card.progress.bar(20),
                    card.progress.fill_width()
                )
            }),
            Self::Habits(list) => list_lines(list, |card| {
                format!(
                    "{} [{}] {} - streak {} (best {})",
                    card.name,
                    card.habit_type,
                    card.frequency,
                    card.current_streak,
                    card.longest_streak
                )
            }),
            Self::Tasks(list) => list_lines(list, |card| {
                let due = card
                    .due_date
                    .map(|date| format!(" due {date}"))
                    .unwrap_or_default();
                format!(
                    "[{}] {} ({} priority, {}){due}",
                    card.status, card.title, card.priority, card.area
                )
            }),
            Self::Contacts(list) => list_lines(list, |card| match &card.role {
                Some(role) => format!("{} ({role})", card.name),
                None => card.name.clone(),
            }),
        }
    }
}

fn list_lines<C>(list: &ListView<C>, line: impl Fn(&C) -> String) -> Vec<String> {
    match list {
        ListView::Pending => Vec::new(),
        ListView::Empty { message } => vec![message.clone()],
        ListView::Items(cards) => cards.iter().map(line).collect(),
        ListView::Unavailable { title, message } => vec![title.clone(), message.clone()],
    }
}
