//! Activity domain models.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_after, validate_positive, validate_required};
use validator::ValidationError;

use super::query::{timestamp_value, Predicate, SortOrder};

/// Attribute names of the activities collection.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const TYPE: &str = "type";
    pub const START_DATE: &str = "startDate";
    pub const END_DATE: &str = "endDate";
}

/// Kind of activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Trip,
    Event,
    Workshop,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Trip => "trip",
            ActivityType::Event => "event",
            ActivityType::Workshop => "workshop",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trip" => Some(ActivityType::Trip),
            "event" => Some(ActivityType::Event),
            "workshop" => Some(ActivityType::Workshop),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived lifecycle status of an activity. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityStatus::Upcoming => write!(f, "upcoming"),
            ActivityStatus::Ongoing => write!(f, "ongoing"),
            ActivityStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Derives the status of an activity spanning `start..=end` at instant `now`.
pub fn activity_status(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ActivityStatus {
    if now < start {
        ActivityStatus::Upcoming
    } else if now <= end {
        ActivityStatus::Ongoing
    } else {
        ActivityStatus::Completed
    }
}

/// List view tab selecting a date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityTab {
    #[default]
    All,
    Upcoming,
    Past,
    Ongoing,
}

impl ActivityTab {
    /// Date predicates for this tab relative to `now`.
    pub fn predicates(&self, now: DateTime<Utc>) -> Vec<Predicate> {
        let now = timestamp_value(now);
        match self {
            ActivityTab::All => Vec::new(),
            ActivityTab::Upcoming => vec![Predicate::greater_than(fields::START_DATE, now)],
            ActivityTab::Past => vec![Predicate::less_than(fields::END_DATE, now)],
            ActivityTab::Ongoing => vec![
                Predicate::less_than_equal(fields::START_DATE, now.clone()),
                Predicate::greater_than_equal(fields::END_DATE, now),
            ],
        }
    }
}

/// Filter state of the activities list view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilters {
    pub search: Option<String>,
    pub activity_type: Option<ActivityType>,
    pub tab: ActivityTab,
}

impl ActivityFilters {
    /// Compiles the filter state into a conjunction of predicates.
    pub fn predicates(&self, now: DateTime<Utc>) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                predicates.push(Predicate::search(fields::TITLE, search));
            }
        }

        if let Some(activity_type) = self.activity_type {
            predicates.push(Predicate::equal(fields::TYPE, activity_type.as_str()));
        }

        predicates.extend(self.tab.predicates(now));
        predicates
    }
}

/// Default ordering of the activities list.
pub fn default_activity_sort() -> SortOrder {
    SortOrder::desc(fields::START_DATE)
}

/// An activity document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename(deserialize = "$id"))]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub location: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub max_participants: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub supervisor: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Activity {
    pub fn status(&self, now: DateTime<Utc>) -> ActivityStatus {
        activity_status(self.start_date, self.end_date, now)
    }

    /// Image URL, treating an empty string as no image.
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Where the image of a draft comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSource {
    #[default]
    Empty,
    /// Already uploaded; holds the view URL.
    Persisted(String),
    /// Local bytes awaiting upload on submit.
    Pending { file_name: String, bytes: Vec<u8> },
}

impl ImageSource {
    pub fn from_stored(url: Option<&str>) -> Self {
        match url {
            Some(url) if !url.is_empty() => ImageSource::Persisted(url.to_string()),
            _ => ImageSource::Empty,
        }
    }
}

/// User-editable activity fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityDraft {
    pub title: String,
    pub description: String,
    pub activity_type: ActivityType,
    pub location: String,
    pub image: ImageSource,
    pub max_participants: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub supervisor: String,
}

impl ActivityDraft {
    /// Checks the draft before any network call. The first failing rule wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("Title", &self.title)?;
        validate_required("Description", &self.description)?;
        validate_required("Location", &self.location)?;
        validate_required("Supervisor", &self.supervisor)?;
        validate_positive("Max participants", self.max_participants)?;
        validate_after(
            self.start_date,
            self.end_date,
            "date_order",
            "End date must be after start date",
        )?;
        validate_after(
            self.start_date,
            self.registration_deadline,
            "deadline_order",
            "Registration deadline must be after start date",
        )?;
        Ok(())
    }
}

impl From<&Activity> for ActivityDraft {
    fn from(activity: &Activity) -> Self {
        Self {
            title: activity.title.clone(),
            description: activity.description.clone(),
            activity_type: activity.activity_type,
            location: activity.location.clone(),
            image: ImageSource::from_stored(activity.image()),
            max_participants: activity.max_participants,
            start_date: activity.start_date,
            end_date: activity.end_date,
            registration_deadline: activity.registration_deadline,
            supervisor: activity.supervisor.clone(),
        }
    }
}

/// Dialog state of the activities view.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActivityDialog {
    #[default]
    Closed,
    Create { draft: ActivityDraft },
    Edit { activity: Activity, draft: ActivityDraft },
    Delete { activity: Activity },
    View { activity: Activity },
}

impl ActivityDialog {
    pub fn create(draft: ActivityDraft) -> Self {
        ActivityDialog::Create { draft }
    }

    /// Opens the edit dialog with a draft prefilled from the activity.
    pub fn edit(activity: Activity) -> Self {
        let draft = ActivityDraft::from(&activity);
        ActivityDialog::Edit { activity, draft }
    }

    pub fn delete(activity: Activity) -> Self {
        ActivityDialog::Delete { activity }
    }

    pub fn view(activity: Activity) -> Self {
        ActivityDialog::View { activity }
    }

    /// The activity the dialog operates on, if any.
    pub fn selected(&self) -> Option<&Activity> {
        match self {
            ActivityDialog::Edit { activity, .. }
            | ActivityDialog::Delete { activity }
            | ActivityDialog::View { activity } => Some(activity),
            ActivityDialog::Closed | ActivityDialog::Create { .. } => None,
        }
    }

    pub fn is_submittable(&self) -> bool {
        matches!(
            self,
            ActivityDialog::Create { .. }
                | ActivityDialog::Edit { .. }
                | ActivityDialog::Delete { .. }
        )
    }
}

/// Parses an RFC 3339 timestamp or a zone-less form value (`2025-01-01T10:00`) taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn ts(value: &str) -> DateTime<Utc> {
        parse_timestamp(value).unwrap()
    }

    fn draft() -> ActivityDraft {
        ActivityDraft {
            title: "Lake trip".to_string(),
            description: "A day at the lake".to_string(),
            activity_type: ActivityType::Trip,
            location: "North lake".to_string(),
            image: ImageSource::Empty,
            max_participants: 20,
            start_date: ts("2025-01-01T10:00"),
            end_date: ts("2025-01-01T18:00"),
            registration_deadline: ts("2025-01-01T12:00"),
            supervisor: "Warden".to_string(),
        }
    }

    fn message(err: ValidationError) -> String {
        shared::validation::error_message(&err)
    }

    #[test]
    fn test_status_branches() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 17, 0, 0).unwrap();

        assert_eq!(
            activity_status(start, end, start - Duration::seconds(1)),
            ActivityStatus::Upcoming
        );
        assert_eq!(activity_status(start, end, start), ActivityStatus::Ongoing);
        assert_eq!(activity_status(start, end, end), ActivityStatus::Ongoing);
        assert_eq!(
            activity_status(start, end, end + Duration::seconds(1)),
            ActivityStatus::Completed
        );
    }

    #[test]
    fn test_status_exactly_one_branch() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let end = start + Duration::hours(3);

        for minutes in -120..=300 {
            let now = start + Duration::minutes(minutes);
            let upcoming = now < start;
            let ongoing = start <= now && now <= end;
            let completed = now > end;
            assert_eq!(
                [upcoming, ongoing, completed].iter().filter(|b| **b).count(),
                1
            );

            let expected = if upcoming {
                ActivityStatus::Upcoming
            } else if ongoing {
                ActivityStatus::Ongoing
            } else {
                ActivityStatus::Completed
            };
            assert_eq!(activity_status(start, end, now), expected);
        }
    }

    #[test]
    fn test_tab_predicates() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let now_value = timestamp_value(now);

        assert!(ActivityTab::All.predicates(now).is_empty());
        assert_eq!(
            ActivityTab::Upcoming.predicates(now),
            vec![Predicate::greater_than("startDate", now_value.clone())]
        );
        assert_eq!(
            ActivityTab::Past.predicates(now),
            vec![Predicate::less_than("endDate", now_value.clone())]
        );
        assert_eq!(
            ActivityTab::Ongoing.predicates(now),
            vec![
                Predicate::less_than_equal("startDate", now_value.clone()),
                Predicate::greater_than_equal("endDate", now_value),
            ]
        );
    }

    #[test]
    fn test_filters_compile_in_order() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let filters = ActivityFilters {
            search: Some("  lake ".to_string()),
            activity_type: Some(ActivityType::Workshop),
            tab: ActivityTab::Past,
        };

        let predicates = filters.predicates(now);
        assert_eq!(predicates.len(), 3);
        assert_eq!(predicates[0], Predicate::search("title", "lake"));
        assert_eq!(predicates[1], Predicate::equal("type", "workshop"));
        assert_eq!(predicates[2].attribute(), "endDate");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filters = ActivityFilters {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(filters.predicates(Utc::now()).is_empty());
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut d = draft();
        d.title = "   ".to_string();
        assert_eq!(message(d.validate().unwrap_err()), "Title is required");
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let mut d = draft();
        d.description = String::new();
        d.supervisor = String::new();
        d.max_participants = 0;
        assert_eq!(message(d.validate().unwrap_err()), "Description is required");
    }

    #[test]
    fn test_non_positive_participants_rejected() {
        let mut d = draft();
        d.max_participants = 0;
        assert_eq!(
            message(d.validate().unwrap_err()),
            "Max participants must be greater than 0"
        );
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut d = draft();
        d.start_date = ts("2025-01-01T10:00");
        d.end_date = ts("2025-01-01T09:00");
        assert_eq!(
            message(d.validate().unwrap_err()),
            "End date must be after start date"
        );
    }

    #[test]
    fn test_end_equal_to_start_rejected() {
        let mut d = draft();
        d.end_date = d.start_date;
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_deadline_must_follow_start() {
        let mut d = draft();
        d.registration_deadline = d.start_date - Duration::days(1);
        assert_eq!(
            message(d.validate().unwrap_err()),
            "Registration deadline must be after start date"
        );

        d.registration_deadline = d.start_date;
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_activity_deserialize_from_document() {
        let doc = json!({
            "$id": "act-1",
            "$createdAt": "2025-01-01T00:00:00.000+00:00",
            "title": "Pottery",
            "description": "Clay basics",
            "type": "workshop",
            "location": "Hall B",
            "imageUrl": "",
            "maxParticipants": 12,
            "startDate": "2025-02-01T10:00:00.000+00:00",
            "endDate": "2025-02-01T12:00:00.000+00:00",
            "registrationDeadline": "2025-02-01T11:00:00.000+00:00",
            "supervisor": "Ms. Clay",
            "createdAt": "2025-01-01T00:00:00.000+00:00"
        });

        let activity: Activity = serde_json::from_value(doc).unwrap();
        assert_eq!(activity.id, "act-1");
        assert_eq!(activity.activity_type, ActivityType::Workshop);
        assert_eq!(activity.image(), None);
        assert!(activity.updated_at.is_none());
        assert_eq!(
            activity.status(ts("2025-02-01T11:00")),
            ActivityStatus::Ongoing
        );
    }

    #[test]
    fn test_edit_dialog_prefills_draft() {
        let activity = Activity {
            id: "act-9".to_string(),
            title: "Bus tour".to_string(),
            description: "City tour".to_string(),
            activity_type: ActivityType::Trip,
            location: "Main gate".to_string(),
            image_url: Some("https://cdn.example/view".to_string()),
            max_participants: 40,
            start_date: ts("2025-03-01T08:00"),
            end_date: ts("2025-03-01T16:00"),
            registration_deadline: ts("2025-03-01T09:00"),
            supervisor: "Driver".to_string(),
            created_at: None,
            updated_at: None,
        };

        let dialog = ActivityDialog::edit(activity.clone());
        match &dialog {
            ActivityDialog::Edit { draft, .. } => {
                assert_eq!(draft.title, "Bus tour");
                assert_eq!(
                    draft.image,
                    ImageSource::Persisted("https://cdn.example/view".to_string())
                );
            }
            other => panic!("unexpected dialog {:?}", other),
        }
        assert_eq!(dialog.selected().map(|a| a.id.as_str()), Some("act-9"));
        assert!(dialog.is_submittable());
        assert!(!ActivityDialog::view(activity).is_submittable());
        assert!(ActivityDialog::Closed.selected().is_none());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-01T10:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_activity_type_parse() {
        assert_eq!(ActivityType::parse("trip"), Some(ActivityType::Trip));
        assert_eq!(ActivityType::parse("party"), None);
        assert_eq!(ActivityType::Event.to_string(), "event");
    }
}
