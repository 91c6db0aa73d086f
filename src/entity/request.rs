//! List request construction

use super::{EntityContext, EntityKind};
use crate::api::{ApiRequest, ApiService};
use crate::error::{Error, Result};

/// Build the list request for one page of one partition.
///
/// `course_id` and `date` are the partition coordinates; entities that are
/// not partitioned on a dimension ignore it.
pub fn list_request(
    kind: EntityKind,
    course_id: Option<&str>,
    date: Option<&str>,
    page_token: Option<&str>,
    ctx: &EntityContext,
) -> Result<ApiRequest> {
    let page_size = ctx.page_size.to_string();
    let course = || {
        course_id.ok_or_else(|| {
            Error::invalid_value("course_id", format!("{kind} requests need a course id"))
        })
    };

    let request = match kind {
        EntityKind::OrgUnits => {
            return Ok(ApiRequest::get(
                ApiService::Directory,
                "customer/my_customer/orgunits",
            ));
        }
        EntityKind::StudentUsage => {
            let date = date.ok_or_else(|| {
                Error::invalid_value("date", format!("{kind} requests need a date"))
            })?;
            return Ok(
                ApiRequest::get(ApiService::Reports, format!("usage/users/all/dates/{date}"))
                    .query("parameters", "classroom:last_interaction_time")
                    .query_opt("orgUnitID", ctx.org_unit_id.as_deref())
                    .query_opt("pageToken", page_token),
            );
        }
        EntityKind::Meet => {
            return Ok(ApiRequest::get(
                ApiService::Reports,
                "activity/users/all/applications/meet",
            )
            .query("eventName", "call_ended")
            .query_opt("startTime", ctx.meet_start_time.as_deref())
            .query_opt("pageToken", page_token));
        }
        EntityKind::Guardians => ApiRequest::get(ApiService::Classroom, "userProfiles/-/guardians"),
        EntityKind::GuardianInvites => {
            ApiRequest::get(ApiService::Classroom, "userProfiles/-/guardianInvitations")
                .query("states", "PENDING")
                .query("states", "COMPLETE")
        }
        EntityKind::Courses => ApiRequest::get(ApiService::Classroom, "courses"),
        EntityKind::CourseAliases => {
            ApiRequest::get(ApiService::Classroom, format!("courses/{}/aliases", course()?))
        }
        EntityKind::Topics => {
            ApiRequest::get(ApiService::Classroom, format!("courses/{}/topics", course()?))
        }
        EntityKind::CourseWork => {
            ApiRequest::get(ApiService::Classroom, format!("courses/{}/courseWork", course()?))
        }
        EntityKind::Students => {
            ApiRequest::get(ApiService::Classroom, format!("courses/{}/students", course()?))
        }
        EntityKind::Teachers => {
            ApiRequest::get(ApiService::Classroom, format!("courses/{}/teachers", course()?))
        }
        EntityKind::StudentSubmissions => ApiRequest::get(
            ApiService::Classroom,
            format!("courses/{}/courseWork/-/studentSubmissions", course()?),
        ),
        EntityKind::Invitations => {
            ApiRequest::get(ApiService::Classroom, "invitations").query("courseId", course()?)
        }
        EntityKind::Announcements => ApiRequest::get(
            ApiService::Classroom,
            format!("courses/{}/announcements", course()?),
        ),
    };

    Ok(request
        .query("pageSize", page_size)
        .query_opt("pageToken", page_token))
}
