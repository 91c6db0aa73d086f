//! Entity catalog
//!
//! Every pulled entity is a row in this table: column schema, temporal
//! columns, response key, default batch size and partitioning. The
//! per-entity behavior lives in small pure functions dispatched on
//! `EntityKind`:
//!
//! - `list_request` builds the list call for one page of one partition
//! - `preprocess` reshapes raw records before flattening
//! - `filter` drops rows after reindexing
//! - `create_request` / `delete_request` build sync mutations

mod mutation;
mod preprocess;
mod request;

pub use mutation::{create_request, delete_request};
pub use preprocess::{filter, preprocess};
pub use request::list_request;

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// Default table name prefix in the warehouse
pub const TABLE_PREFIX: &str = "GoogleClassroom_";

/// Default page size for list calls
pub const PAGE_SIZE: u32 = 1000;

/// Every entity the crate can pull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    OrgUnits,
    StudentUsage,
    Guardians,
    GuardianInvites,
    Courses,
    CourseAliases,
    Topics,
    CourseWork,
    Students,
    Teachers,
    StudentSubmissions,
    Invitations,
    Announcements,
    Meet,
}

impl EntityKind {
    /// All entities in pull order
    pub const ALL: [EntityKind; 14] = [
        EntityKind::OrgUnits,
        EntityKind::StudentUsage,
        EntityKind::Guardians,
        EntityKind::GuardianInvites,
        EntityKind::Courses,
        EntityKind::Topics,
        EntityKind::CourseWork,
        EntityKind::Students,
        EntityKind::Teachers,
        EntityKind::StudentSubmissions,
        EntityKind::CourseAliases,
        EntityKind::Invitations,
        EntityKind::Announcements,
        EntityKind::Meet,
    ];

    /// Entities that support roster sync
    pub const SYNCABLE: [EntityKind; 3] = [
        EntityKind::Courses,
        EntityKind::Students,
        EntityKind::Teachers,
    ];

    /// Static descriptor
    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            EntityKind::OrgUnits => &ORG_UNITS,
            EntityKind::StudentUsage => &STUDENT_USAGE,
            EntityKind::Guardians => &GUARDIANS,
            EntityKind::GuardianInvites => &GUARDIAN_INVITES,
            EntityKind::Courses => &COURSES,
            EntityKind::CourseAliases => &COURSE_ALIASES,
            EntityKind::Topics => &TOPICS,
            EntityKind::CourseWork => &COURSE_WORK,
            EntityKind::Students => &STUDENTS,
            EntityKind::Teachers => &TEACHERS,
            EntityKind::StudentSubmissions => &STUDENT_SUBMISSIONS,
            EntityKind::Invitations => &INVITATIONS,
            EntityKind::Announcements => &ANNOUNCEMENTS,
            EntityKind::Meet => &MEET,
        }
    }

    /// Entity name, also the table suffix
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Warehouse table name with the given prefix
    pub fn table_name(self, prefix: &str) -> String {
        format!("{prefix}{}", self.name())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.replace(['_', '-'], "");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| Error::invalid_value("entity", format!("unknown entity '{s}'")))
    }
}

/// How an entity's requests are fanned out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partitioning {
    /// One request chain
    None,
    /// One request chain per course id
    ByCourse,
    /// One request chain per day
    ByDate,
}

/// Sync settings for entities that support roster sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSpec {
    /// Columns matched between desired and current state
    pub join_keys: &'static [&'static str],
    /// Whether rows missing from the desired state are removed remotely
    pub delete_on_sync: bool,
}

/// Static configuration of one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub name: &'static str,
    /// Target schema, in order
    pub columns: &'static [&'static str],
    /// Columns coerced to timestamps
    pub date_columns: &'static [&'static str],
    /// Response key holding the record list
    pub request_key: &'static str,
    pub batch_size: usize,
    /// The response omits courseId, so it comes from the request
    pub inject_course_id: bool,
    pub partitioning: Partitioning,
    pub sync: Option<SyncSpec>,
}

/// Runtime values entity functions depend on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityContext {
    /// Page size for list calls
    pub page_size: u32,
    /// Org unit restricting usage reports
    pub org_unit_id: Option<String>,
    /// Lower bound for Meet activity
    pub meet_start_time: Option<String>,
    /// Import date stamped on usage rows
    pub today: NaiveDate,
    /// Courses last updated before this are dropped
    pub school_year_start: NaiveDateTime,
    /// Org unit name kept by the OrgUnits filter
    pub student_org_unit: Option<String>,
}

impl Default for EntityContext {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            org_unit_id: None,
            meet_start_time: None,
            today: chrono::Local::now().date_naive(),
            school_year_start: NaiveDateTime::default(),
            student_org_unit: None,
        }
    }
}

const STUDENT_COLUMNS: &[&str] = &["courseId", "userId", "fullName", "emailAddress"];
const ROSTER_JOIN_KEYS: &[&str] = &["alias", "emailAddress"];

static ORG_UNITS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::OrgUnits,
    name: "OrgUnits",
    columns: &["name", "description", "orgUnitPath", "orgUnitId"],
    date_columns: &[],
    request_key: "organizationUnits",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::None,
    sync: None,
};

static STUDENT_USAGE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::StudentUsage,
    name: "StudentUsage",
    columns: &["Email", "AsOfDate", "LastUsedTime", "ImportDate"],
    date_columns: &["AsOfDate", "LastUsedTime", "ImportDate"],
    request_key: "usageReports",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::ByDate,
    sync: None,
};

static GUARDIANS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Guardians,
    name: "Guardians",
    columns: &["studentId", "guardianId", "invitedEmailAddress"],
    date_columns: &[],
    request_key: "guardians",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::None,
    sync: None,
};

static GUARDIAN_INVITES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::GuardianInvites,
    name: "GuardianInvites",
    columns: &[
        "studentId",
        "invitationId",
        "invitedEmailAddress",
        "state",
        "creationTime",
    ],
    date_columns: &["creationTime"],
    request_key: "guardianInvitations",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::None,
    sync: None,
};

static COURSES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Courses,
    name: "Courses",
    columns: &[
        "id",
        "name",
        "courseGroupEmail",
        "courseState",
        "creationTime",
        "description",
        "descriptionHeading",
        "enrollmentCode",
        "guardiansEnabled",
        "ownerId",
        "room",
        "section",
        "teacherGroupEmail",
        "updateTime",
        "calendarId",
    ],
    date_columns: &["creationTime", "updateTime"],
    request_key: "courses",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::None,
    sync: Some(SyncSpec {
        join_keys: &["alias", "name", "section"],
        delete_on_sync: true,
    }),
};

static COURSE_ALIASES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::CourseAliases,
    name: "CourseAliases",
    columns: &["courseId", "alias"],
    date_columns: &[],
    request_key: "aliases",
    batch_size: 1000,
    inject_course_id: true,
    partitioning: Partitioning::ByCourse,
    sync: None,
};

static TOPICS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Topics,
    name: "Topics",
    columns: &["courseId", "topicId", "name", "updateTime"],
    date_columns: &["updateTime"],
    request_key: "topic",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::ByCourse,
    sync: None,
};

static COURSE_WORK: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::CourseWork,
    name: "CourseWork",
    columns: &[
        "courseId",
        "id",
        "title",
        "description",
        "state",
        "alternateLink",
        "creationTime",
        "updateTime",
        "dueDate",
        "maxPoints",
        "workType",
        "assigneeMode",
        "submissionModificationMode",
        "creatorUserId",
        "topicId",
    ],
    date_columns: &["creationTime", "updateTime", "dueDate"],
    request_key: "courseWork",
    batch_size: 120,
    inject_course_id: false,
    partitioning: Partitioning::ByCourse,
    sync: None,
};

static STUDENTS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Students,
    name: "Students",
    columns: STUDENT_COLUMNS,
    date_columns: &[],
    request_key: "students",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::ByCourse,
    sync: Some(SyncSpec {
        join_keys: ROSTER_JOIN_KEYS,
        delete_on_sync: true,
    }),
};

static TEACHERS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Teachers,
    name: "Teachers",
    columns: STUDENT_COLUMNS,
    date_columns: &[],
    request_key: "teachers",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::ByCourse,
    sync: Some(SyncSpec {
        join_keys: ROSTER_JOIN_KEYS,
        delete_on_sync: false,
    }),
};

static STUDENT_SUBMISSIONS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::StudentSubmissions,
    name: "StudentSubmissions",
    columns: &[
        "courseId",
        "courseWorkId",
        "id",
        "userId",
        "creationTime",
        "updateTime",
        "state",
        "draftGrade",
        "assignedGrade",
        "courseWorkType",
        "createdTime",
        "turnedInTimestamp",
        "returnedTimestamp",
        "draftMaxPoints",
        "draftGradeTimestamp",
        "draftGraderId",
        "assignedMaxPoints",
        "assignedGradeTimestamp",
        "assignedGraderId",
        "late",
    ],
    date_columns: &[
        "creationTime",
        "updateTime",
        "createdTime",
        "turnedInTimestamp",
        "returnedTimestamp",
        "draftGradeTimestamp",
        "assignedGradeTimestamp",
    ],
    request_key: "studentSubmissions",
    batch_size: 120,
    inject_course_id: false,
    partitioning: Partitioning::ByCourse,
    sync: None,
};

static INVITATIONS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Invitations,
    name: "Invitations",
    columns: &["id", "userId", "courseId", "role"],
    date_columns: &[],
    request_key: "invitations",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::ByCourse,
    sync: None,
};

static ANNOUNCEMENTS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Announcements,
    name: "Announcements",
    columns: &[
        "id",
        "courseId",
        "text",
        "state",
        "alternateLink",
        "creationTime",
        "updateTime",
        "scheduledTime",
        "assigneeMode",
        "creatorUserId",
    ],
    date_columns: &["creationTime", "updateTime", "scheduledTime"],
    request_key: "announcements",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::ByCourse,
    sync: None,
};

static MEET: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Meet,
    name: "Meet",
    columns: &[
        "conference_id",
        "device_type",
        "display_name",
        "duration_seconds",
        "endpoint_id",
        "identifier",
        "identifier_type",
        "ip_address",
        "is_external",
        "meeting_code",
        "organizer_email",
        "item_time",
        "event_name",
    ],
    date_columns: &["item_time"],
    request_key: "items",
    batch_size: 1000,
    inject_course_id: false,
    partitioning: Partitioning::None,
    sync: None,
};
