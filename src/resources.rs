use crate::errors::{ClientError, ClientResult};
use crate::models::{
    BirthdayInfo, CheckinReceipt, CheckinRequest, Contact, ContactDraft, ContactPatch, EntityId,
    Goal, GoalDraft, GoalPatch, Habit, HabitDraft, HabitPatch, LifeArea, Task, TaskDraft,
    TaskPatch,
};
use crate::store::{Mutation, Resource, ResourceStore, Validate, require};
use crate::surface::{ToastKind, View};
use crate::views::{AreaCard, ContactCard, GoalCard, HabitCard, ListView, TaskCard, ViewModel};
use tracing::warn;

impl Resource for LifeArea {
    type Card = AreaCard;

    const VIEW: View = View::Dashboard;
    const SINGULAR: &'static str = "Life area";
    const PLURAL: &'static str = "life areas";
    const EMPTY_MESSAGE: &'static str = "No life areas are configured.";
    const LOAD_SUBJECT: &'static str = "dashboard";

    fn id(&self) -> EntityId {
        self.id
    }

    fn view_model(list: ListView<AreaCard>) -> ViewModel {
        ViewModel::Areas(list)
    }
}

impl Resource for Goal {
    type Card = GoalCard;

    const VIEW: View = View::Goals;
    const SINGULAR: &'static str = "Goal";
    const PLURAL: &'static str = "goals";
    const EMPTY_MESSAGE: &'static str =
        "No goals yet. Click \"+ Add Goal\" to create your first goal!";

    fn id(&self) -> EntityId {
        self.id
    }

    fn view_model(list: ListView<GoalCard>) -> ViewModel {
        ViewModel::Goals(list)
    }
}

impl Resource for Habit {
    type Card = HabitCard;

    const VIEW: View = View::Habits;
    const SINGULAR: &'static str = "Habit";
    const PLURAL: &'static str = "habits";
    const EMPTY_MESSAGE: &'static str = "No habits yet. Start tracking one to build a streak.";

    fn id(&self) -> EntityId {
        self.id
    }

    fn view_model(list: ListView<HabitCard>) -> ViewModel {
        ViewModel::Habits(list)
    }
}

impl Resource for Task {
    type Card = TaskCard;

    const VIEW: View = View::Tasks;
    const SINGULAR: &'static str = "Task";
    const PLURAL: &'static str = "tasks";
    const EMPTY_MESSAGE: &'static str = "Nothing to do. Add a task to get started.";

    fn id(&self) -> EntityId {
        self.id
    }

    fn view_model(list: ListView<TaskCard>) -> ViewModel {
        ViewModel::Tasks(list)
    }
}

impl Resource for Contact {
    type Card = ContactCard;

    const VIEW: View = View::Contacts;
    const SINGULAR: &'static str = "Contact";
    const PLURAL: &'static str = "contacts";
    const EMPTY_MESSAGE: &'static str = "No contacts yet.";

    fn id(&self) -> EntityId {
        self.id
    }

    fn view_model(list: ListView<ContactCard>) -> ViewModel {
        ViewModel::Contacts(list)
    }
}

fn require_areas(area_ids: &[EntityId]) -> ClientResult<()> {
    if area_ids.is_empty() {
        return Err(ClientError::validation("Select at least one life area"));
    }
    Ok(())
}

fn require_some(value: Option<&str>, field: &str) -> ClientResult<()> {
    value.map_or(Ok(()), |value| require(value, field))
}

impl Validate for GoalDraft {
    fn validate(&self) -> ClientResult<()> {
        require(&self.title, "Title")?;
        require_areas(&self.area_ids)
    }
}

impl Validate for GoalPatch {
    fn validate(&self) -> ClientResult<()> {
        require_some(self.title.as_deref(), "Title")?;
        if let Some(progress) = self.progress_percentage {
            if progress > 100 {
                return Err(ClientError::validation("Progress must be between 0 and 100"));
            }
        }
        self.area_ids.as_deref().map_or(Ok(()), require_areas)
    }
}

impl Validate for HabitDraft {
    fn validate(&self) -> ClientResult<()> {
        require(&self.name, "Name")?;
        require(&self.frequency_description, "Frequency")?;
        require_areas(&self.area_ids)
    }
}

impl Validate for HabitPatch {
    fn validate(&self) -> ClientResult<()> {
        require_some(self.name.as_deref(), "Name")?;
        require_some(self.frequency_description.as_deref(), "Frequency")?;
        self.area_ids.as_deref().map_or(Ok(()), require_areas)
    }
}

impl Validate for TaskDraft {
    fn validate(&self) -> ClientResult<()> {
        require(&self.title, "Title")
    }
}

impl Validate for TaskPatch {
    fn validate(&self) -> ClientResult<()> {
        require_some(self.title.as_deref(), "Title")
    }
}

impl Validate for ContactDraft {
    fn validate(&self) -> ClientResult<()> {
        require(&self.name, "Name")?;
        require_areas(&self.area_ids)
    }
}

impl Validate for ContactPatch {
    fn validate(&self) -> ClientResult<()> {
        require_some(self.name.as_deref(), "Name")?;
        self.area_ids.as_deref().map_or(Ok(()), require_areas)
    }
}

impl ResourceStore<Habit> {
    /// Records one occurrence of the habit, then reloads.
    pub async fn checkin(
        &self,
        id: EntityId,
        request: &CheckinRequest,
    ) -> ClientResult<CheckinReceipt> {
        let result = self
            .guarded(Ok(()), self.api().checkin_habit(id, request))
            .await;
        self.settle(Mutation::Checkin, result, |receipt| {
            receipt.message.clone().unwrap_or_else(|| {
                format!("Checked in! Current streak: {} days", receipt.current_streak)
            })
        })
        .await
    }
}

impl ResourceStore<Contact> {
    /// Reads the derived birthday details and shows them in a modal. The
    /// cache is not touched.
    pub async fn birthday(&self, id: EntityId) -> ClientResult<BirthdayInfo> {
        let result = {
            let _loading = self.loading().acquire();
            self.api().contact_birthday(id).await
        };

        match result {
            Ok(info) => {
                self.surface()
                    .show_modal(&format!("{}'s birthday", info.name), &birthday_summary(&info));
                Ok(info)
            }
            Err(err) => {
                warn!(contact = %id, "birthday lookup failed: {err}");
                self.surface().toast(
                    &format!("Could not load birthday: {}", err.user_message()),
                    ToastKind::Error,
                );
                Err(err)
            }
        }
    }
}

pub fn birthday_summary(info: &BirthdayInfo) -> String {
    let when = match info.days_until_birthday {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        days => format!("in {days} days"),
    };
    format!(
        "Born {}. Currently {} years old; next birthday {} ({}).",
        info.birthday, info.current_age, when, info.next_birthday
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalTimeframe, HabitType};
    use chrono::NaiveDate;

    #[test]
    fn goal_draft_requires_title_and_area() {
        let mut draft = GoalDraft {
            title: "  ".into(),
            description: None,
            timeframe: GoalTimeframe::Short,
            due_date: None,
            area_ids: vec![EntityId(1)],
            contact_id: None,
        };
        assert!(matches!(draft.validate(), Err(ClientError::Validation(_))));

        draft.title = "Stretch daily".into();
        assert!(draft.validate().is_ok());

        draft.area_ids.clear();
        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "Select at least one life area");
    }

    #[test]
    fn goal_patch_rejects_progress_over_hundred() {
        let patch = GoalPatch {
            progress_percentage: Some(101),
            ..GoalPatch::default()
        };
        assert!(patch.validate().is_err());

        let patch = GoalPatch {
            progress_percentage: Some(100),
            ..GoalPatch::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn habit_draft_requires_frequency() {
        let draft = HabitDraft {
            name: "Meditate".into(),
            description: None,
            habit_type: HabitType::Gain,
            frequency_description: String::new(),
            area_ids: vec![EntityId(8)],
        };
        assert_eq!(draft.validate().unwrap_err().to_string(), "Frequency is required");
    }

    #[test]
    fn area_load_failures_name_the_dashboard() {
        assert_eq!(<LifeArea as Resource>::LOAD_SUBJECT, "dashboard");
        assert_eq!(<Goal as Resource>::LOAD_SUBJECT, "goals");
        assert_eq!(<Contact as Resource>::LOAD_SUBJECT, "contacts");
    }

    #[test]
    fn birthday_summary_names_relative_day() {
        let info = BirthdayInfo {
            contact_id: EntityId(3),
            name: "Ada".into(),
            birthday: NaiveDate::from_ymd_opt(1990, 6, 2).unwrap(),
            current_age: 35,
            next_birthday: NaiveDate::from_ymd_opt(2026, 6, 2).unwrap(),
            days_until_birthday: 1,
        };
        assert_eq!(
            birthday_summary(&info),
            "Born 1990-06-02. Currently 35 years old; next birthday tomorrow (2026-06-02)."
        );
    }
}
