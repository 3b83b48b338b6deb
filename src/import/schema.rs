//! Declarative field schemas for the ten import targets.
//!
//! Each entity kind carries a closed table of `FieldSpec`s: canonical name,
//! requiredness, primitive type, and the accepted source-key synonyms. The
//! mapper and validator both walk these tables, so adding an importable
//! entity means adding one schema and one `EntityKind` arm.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Camper,
    Staff,
    Award,
    DailyNote,
    Trip,
    MenuItem,
    IncidentReport,
    MedicationLog,
    CalendarEvent,
    SportsCalendarEvent,
}

pub const ALL_KINDS: [EntityKind; 10] = [
    EntityKind::Camper,
    EntityKind::Staff,
    EntityKind::Award,
    EntityKind::DailyNote,
    EntityKind::Trip,
    EntityKind::MenuItem,
    EntityKind::IncidentReport,
    EntityKind::MedicationLog,
    EntityKind::CalendarEvent,
    EntityKind::SportsCalendarEvent,
];

impl EntityKind {
    pub fn parse(s: &str) -> Option<EntityKind> {
        match s {
            "camper" | "campers" => Some(EntityKind::Camper),
            "staff" => Some(EntityKind::Staff),
            "award" | "awards" => Some(EntityKind::Award),
            "daily_note" | "daily_notes" => Some(EntityKind::DailyNote),
            "trip" | "trips" => Some(EntityKind::Trip),
            "menu_item" | "menu_items" => Some(EntityKind::MenuItem),
            "incident_report" | "incident_reports" => Some(EntityKind::IncidentReport),
            "medication_log" | "medication_logs" => Some(EntityKind::MedicationLog),
            "calendar_event" | "calendar_events" => Some(EntityKind::CalendarEvent),
            "sports_calendar_event" | "sports_calendar_events" => {
                Some(EntityKind::SportsCalendarEvent)
            }
            _ => None,
        }
    }

    pub fn table(self) -> &'static str {
        self.schema().table
    }

    pub fn schema(self) -> &'static EntitySchema {
        match self {
            EntityKind::Camper => &CAMPER,
            EntityKind::Staff => &STAFF,
            EntityKind::Award => &AWARD,
            EntityKind::DailyNote => &DAILY_NOTE,
            EntityKind::Trip => &TRIP,
            EntityKind::MenuItem => &MENU_ITEM,
            EntityKind::IncidentReport => &INCIDENT_REPORT,
            EntityKind::MedicationLog => &MEDICATION_LOG,
            EntityKind::CalendarEvent => &CALENDAR_EVENT,
            EntityKind::SportsCalendarEvent => &SPORTS_CALENDAR_EVENT,
        }
    }

    /// Camper JSON imports suppress rows whose external id already exists.
    pub fn dedupes_on_person_id(self) -> bool {
        matches!(self, EntityKind::Camper)
    }

    /// Incident imports link campers through a second junction insert.
    pub fn links_campers(self) -> bool {
        matches!(self, EntityKind::IncidentReport)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldType {
    Text { max: usize },
    Uuid,
    Date,
    Int { min: i64, max: i64 },
    Enum { allowed: &'static [&'static str] },
    Email,
    /// Internal camper ids destined for the junction table, not a column.
    UuidList,
}

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub ty: FieldType,
    /// Accepted source keys, tried in order; the canonical name comes first.
    pub synonyms: &'static [&'static str],
    pub default: Option<&'static str>,
}

impl FieldSpec {
    const fn required(name: &'static str, ty: FieldType, synonyms: &'static [&'static str]) -> Self {
        FieldSpec {
            name,
            required: true,
            ty,
            synonyms,
            default: None,
        }
    }

    const fn optional(name: &'static str, ty: FieldType, synonyms: &'static [&'static str]) -> Self {
        FieldSpec {
            name,
            required: false,
            ty,
            synonyms,
            default: None,
        }
    }

    const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_column(&self) -> bool {
        !matches!(self.ty, FieldType::UuidList)
    }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column names in insert order (skips junction-only fields).
    pub fn columns(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.is_column())
            .map(|f| f.name)
            .collect()
    }
}

pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "snack", "dinner"];
pub const SEVERITIES: &[&str] = &["low", "medium", "high"];
pub const INCIDENT_STATUSES: &[&str] = &["open", "resolved", "closed"];

static CAMPER: EntitySchema = EntitySchema {
    kind: EntityKind::Camper,
    table: "campers",
    fields: &[
        FieldSpec::required(
            "name",
            FieldType::Text { max: 200 },
            &["name", "Name", "camper_name", "Camper Name"],
        ),
        FieldSpec::required(
            "person_id",
            FieldType::Text { max: 100 },
            &["person_id", "Person ID", "personId", "external_id", "External ID"],
        ),
        FieldSpec::optional("age", FieldType::Int { min: 0, max: 18 }, &["age", "Age"]),
        FieldSpec::optional("grade", FieldType::Text { max: 50 }, &["grade", "Grade"]),
        FieldSpec::optional(
            "guardian_email",
            FieldType::Email,
            &["guardian_email", "Guardian Email", "guardianEmail", "parent_email"],
        ),
        FieldSpec::optional(
            "guardian_phone",
            FieldType::Text { max: 50 },
            &["guardian_phone", "Guardian Phone", "guardianPhone", "parent_phone"],
        ),
        FieldSpec::optional(
            "allergies",
            FieldType::Text { max: 500 },
            &["allergies", "Allergies"],
        ),
        FieldSpec::optional(
            "medical_notes",
            FieldType::Text { max: 2000 },
            &["medical_notes", "Medical Notes", "medicalNotes"],
        ),
    ],
};

static STAFF: EntitySchema = EntitySchema {
    kind: EntityKind::Staff,
    table: "staff",
    fields: &[
        FieldSpec::required("name", FieldType::Text { max: 200 }, &["name", "Name"]),
        FieldSpec::required("role", FieldType::Text { max: 100 }, &["role", "Role"]),
        FieldSpec::optional(
            "department",
            FieldType::Text { max: 100 },
            &["department", "Department"],
        ),
        FieldSpec::optional("email", FieldType::Email, &["email", "Email"]),
        FieldSpec::optional("phone", FieldType::Text { max: 50 }, &["phone", "Phone"]),
        FieldSpec::optional(
            "hire_date",
            FieldType::Date,
            &["hire_date", "Hire Date", "hireDate"],
        ),
    ],
};

static AWARD: EntitySchema = EntitySchema {
    kind: EntityKind::Award,
    table: "awards",
    fields: &[
        FieldSpec::required("title", FieldType::Text { max: 200 }, &["title", "Title"]),
        FieldSpec::required(
            "child_id",
            FieldType::Uuid,
            &["child_id", "Child ID", "childId", "camper_id"],
        ),
        FieldSpec::required("date", FieldType::Date, &["date", "Date"]),
        FieldSpec::optional(
            "category",
            FieldType::Text { max: 100 },
            &["category", "Category"],
        ),
        FieldSpec::optional(
            "description",
            FieldType::Text { max: 1000 },
            &["description", "Description"],
        ),
    ],
};

static DAILY_NOTE: EntitySchema = EntitySchema {
    kind: EntityKind::DailyNote,
    table: "daily_notes",
    fields: &[
        FieldSpec::required(
            "child_id",
            FieldType::Uuid,
            &["child_id", "Child ID", "childId", "camper_id"],
        ),
        FieldSpec::required("date", FieldType::Date, &["date", "Date"]),
        FieldSpec::optional("mood", FieldType::Text { max: 50 }, &["mood", "Mood"]),
        FieldSpec::optional(
            "activities",
            FieldType::Text { max: 1000 },
            &["activities", "Activities"],
        ),
        FieldSpec::optional("meals", FieldType::Text { max: 500 }, &["meals", "Meals"]),
        FieldSpec::optional("nap", FieldType::Text { max: 100 }, &["nap", "Nap"]),
        FieldSpec::optional("notes", FieldType::Text { max: 2000 }, &["notes", "Notes"]),
    ],
};

static TRIP: EntitySchema = EntitySchema {
    kind: EntityKind::Trip,
    table: "trips",
    fields: &[
        FieldSpec::required("name", FieldType::Text { max: 200 }, &["name", "Name"]),
        FieldSpec::required("type", FieldType::Text { max: 100 }, &["type", "Type"]),
        FieldSpec::required("date", FieldType::Date, &["date", "Date"]),
        FieldSpec::optional(
            "destination",
            FieldType::Text { max: 200 },
            &["destination", "Destination"],
        ),
        FieldSpec::optional(
            "departure_time",
            FieldType::Text { max: 50 },
            &["departure_time", "Departure Time", "departureTime"],
        ),
        FieldSpec::optional(
            "return_time",
            FieldType::Text { max: 50 },
            &["return_time", "Return Time", "returnTime"],
        ),
        FieldSpec::optional(
            "capacity",
            FieldType::Int { min: 0, max: 500 },
            &["capacity", "Capacity"],
        ),
        FieldSpec::optional(
            "chaperone",
            FieldType::Text { max: 200 },
            &["chaperone", "Chaperone"],
        ),
        FieldSpec::optional("status", FieldType::Text { max: 50 }, &["status", "Status"]),
    ],
};

static MENU_ITEM: EntitySchema = EntitySchema {
    kind: EntityKind::MenuItem,
    table: "menu_items",
    fields: &[
        FieldSpec::required("date", FieldType::Date, &["date", "Date"]),
        FieldSpec::required(
            "meal_type",
            FieldType::Enum { allowed: MEAL_TYPES },
            &["meal_type", "Meal Type", "mealType", "meal"],
        ),
        FieldSpec::required("items", FieldType::Text { max: 1000 }, &["items", "Items"]),
        FieldSpec::optional(
            "allergens",
            FieldType::Text { max: 500 },
            &["allergens", "Allergens"],
        ),
    ],
};

static INCIDENT_REPORT: EntitySchema = EntitySchema {
    kind: EntityKind::IncidentReport,
    table: "incident_reports",
    fields: &[
        FieldSpec::required(
            "child_id",
            FieldType::Uuid,
            &["child_id", "Child ID", "childId", "camper_id"],
        ),
        FieldSpec::required("date", FieldType::Date, &["date", "Date"]),
        FieldSpec::required("type", FieldType::Text { max: 100 }, &["type", "Type"]),
        FieldSpec::required(
            "description",
            FieldType::Text { max: 2000 },
            &["description", "Description"],
        ),
        FieldSpec::optional(
            "severity",
            FieldType::Enum { allowed: SEVERITIES },
            &["severity", "Severity"],
        )
        .with_default("medium"),
        FieldSpec::optional(
            "reported_by",
            FieldType::Text { max: 200 },
            &["reported_by", "Reported By", "reportedBy", "reporter"],
        ),
        FieldSpec::optional(
            "status",
            FieldType::Enum {
                allowed: INCIDENT_STATUSES,
            },
            &["status", "Status"],
        )
        .with_default("open"),
        FieldSpec::optional("tags", FieldType::Text { max: 500 }, &["tags", "Tags"]),
        FieldSpec::optional("child_ids", FieldType::UuidList, &["child_ids"]),
    ],
};

static MEDICATION_LOG: EntitySchema = EntitySchema {
    kind: EntityKind::MedicationLog,
    table: "medication_logs",
    fields: &[
        FieldSpec::required(
            "child_id",
            FieldType::Uuid,
            &["child_id", "Child ID", "childId", "camper_id"],
        ),
        FieldSpec::required("date", FieldType::Date, &["date", "Date"]),
        FieldSpec::required(
            "medication_name",
            FieldType::Text { max: 200 },
            &["medication_name", "Medication Name", "medicationName", "medication"],
        ),
        FieldSpec::required(
            "scheduled_time",
            FieldType::Text { max: 50 },
            &["scheduled_time", "Scheduled Time", "scheduledTime", "time"],
        ),
        FieldSpec::optional(
            "dosage",
            FieldType::Text { max: 100 },
            &["dosage", "Dosage"],
        ),
        FieldSpec::optional("notes", FieldType::Text { max: 1000 }, &["notes", "Notes"]),
        FieldSpec::optional(
            "recurrence",
            FieldType::Text { max: 50 },
            &["recurrence", "Recurrence"],
        ),
        FieldSpec::optional(
            "recurrence_end_date",
            FieldType::Date,
            &["recurrence_end_date", "Recurrence End Date", "recurrenceEndDate"],
        ),
    ],
};

static CALENDAR_EVENT: EntitySchema = EntitySchema {
    kind: EntityKind::CalendarEvent,
    table: "calendar_events",
    fields: &[
        FieldSpec::required(
            "event_date",
            FieldType::Date,
            &["event_date", "Event Date", "eventDate", "date"],
        ),
        FieldSpec::required("title", FieldType::Text { max: 200 }, &["title", "Title"]),
        FieldSpec::required("type", FieldType::Text { max: 100 }, &["type", "Type"]),
        FieldSpec::optional(
            "description",
            FieldType::Text { max: 1000 },
            &["description", "Description"],
        ),
        FieldSpec::optional("time", FieldType::Text { max: 50 }, &["time", "Time"]),
        FieldSpec::optional(
            "location",
            FieldType::Text { max: 200 },
            &["location", "Location"],
        ),
    ],
};

static SPORTS_CALENDAR_EVENT: EntitySchema = EntitySchema {
    kind: EntityKind::SportsCalendarEvent,
    table: "sports_calendar_events",
    fields: &[
        FieldSpec::required(
            "event_date",
            FieldType::Date,
            &["event_date", "Event Date", "eventDate", "date"],
        ),
        FieldSpec::required("title", FieldType::Text { max: 200 }, &["title", "Title"]),
        FieldSpec::required(
            "sport_type",
            FieldType::Text { max: 100 },
            &["sport_type", "Sport Type", "sportType", "sport"],
        ),
        FieldSpec::optional("time", FieldType::Text { max: 50 }, &["time", "Time"]),
        FieldSpec::optional(
            "location",
            FieldType::Text { max: 200 },
            &["location", "Location"],
        ),
        FieldSpec::optional("team", FieldType::Text { max: 200 }, &["team", "Team"]),
        FieldSpec::optional(
            "opponent",
            FieldType::Text { max: 200 },
            &["opponent", "Opponent"],
        ),
    ],
};
