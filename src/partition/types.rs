//! Partition types and traits
//!
//! Defines the core partition abstractions.

use crate::entity::{EntityDescriptor, Partitioning};
use crate::error::{Error, Result};
use std::fmt;

/// Coordinates of one request chain.
///
/// Unpartitioned entities use the empty key; course-scoped entities set
/// `course_id`; daily reports set `date` (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PartitionKey {
    pub course_id: Option<String>,
    pub date: Option<String>,
}

impl PartitionKey {
    /// The key of an unpartitioned entity
    pub fn none() -> Self {
        Self::default()
    }

    /// Key for one course
    pub fn course(course_id: impl Into<String>) -> Self {
        Self {
            course_id: Some(course_id.into()),
            date: None,
        }
    }

    /// Key for one day
    pub fn date(date: impl Into<String>) -> Self {
        Self {
            course_id: None,
            date: Some(date.into()),
        }
    }

    /// Set the course coordinate
    #[must_use]
    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    /// Set the date coordinate
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.course_id, &self.date) {
            (None, None) => f.write_str("-"),
            (Some(c), None) => write!(f, "course {c}"),
            (None, Some(d)) => write!(f, "date {d}"),
            (Some(c), Some(d)) => write!(f, "course {c} on {d}"),
        }
    }
}

/// Trait for partition routers.
///
/// A router yields the values of one partition dimension.
pub trait PartitionRouter: Send + Sync {
    /// Generate partition values
    fn partitions(&self) -> Result<Vec<String>>;
}

/// The partition values a pull fans out over.
///
/// A dimension that is `None` is not partitioned; an empty list means the
/// dimension is partitioned but has nothing to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionPlan {
    courses: Option<Vec<String>>,
    dates: Option<Vec<String>>,
}

impl PartitionPlan {
    /// Plan for an unpartitioned entity: one empty key
    pub fn single() -> Self {
        Self::default()
    }

    /// Set the course dimension from a router
    pub fn by_course(mut self, router: &dyn PartitionRouter) -> Result<Self> {
        self.courses = Some(router.partitions()?);
        Ok(self)
    }

    /// Set the date dimension from a router
    pub fn by_date(mut self, router: &dyn PartitionRouter) -> Result<Self> {
        self.dates = Some(router.partitions()?);
        Ok(self)
    }

    /// Set the course dimension directly
    #[must_use]
    pub fn with_courses<S: Into<String>>(mut self, courses: impl IntoIterator<Item = S>) -> Self {
        self.courses = Some(courses.into_iter().map(Into::into).collect());
        self
    }

    /// Set the date dimension directly
    #[must_use]
    pub fn with_dates<S: Into<String>>(mut self, dates: impl IntoIterator<Item = S>) -> Self {
        self.dates = Some(dates.into_iter().map(Into::into).collect());
        self
    }

    /// Course values, if partitioned by course
    pub fn courses(&self) -> Option<&[String]> {
        self.courses.as_deref()
    }

    /// Date values, if partitioned by date
    pub fn dates(&self) -> Option<&[String]> {
        self.dates.as_deref()
    }

    /// Cross product of the dimensions, courses outermost
    pub fn keys(&self) -> Vec<PartitionKey> {
        let courses: Vec<Option<&String>> = match &self.courses {
            Some(values) => values.iter().map(Some).collect(),
            None => vec![None],
        };
        let dates: Vec<Option<&String>> = match &self.dates {
            Some(values) => values.iter().map(Some).collect(),
            None => vec![None],
        };

        courses
            .iter()
            .flat_map(|course| {
                dates.iter().map(move |date| PartitionKey {
                    course_id: course.cloned(),
                    date: date.cloned(),
                })
            })
            .collect()
    }

    /// Number of partition keys
    pub fn len(&self) -> usize {
        self.courses.as_ref().map_or(1, Vec::len) * self.dates.as_ref().map_or(1, Vec::len)
    }

    /// Whether the plan yields no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the plan provides the dimension the entity is partitioned on
    pub fn validate(&self, descriptor: &EntityDescriptor) -> Result<()> {
        let missing = match descriptor.partitioning {
            Partitioning::None => None,
            Partitioning::ByCourse if self.courses.is_none() => Some("course"),
            Partitioning::ByDate if self.dates.is_none() => Some("date"),
            _ => None,
        };
        match missing {
            Some(dimension) => Err(Error::invalid_value(
                "partitions",
                format!(
                    "{} is partitioned by {dimension} but no {dimension} values were given",
                    descriptor.name
                ),
            )),
            None => Ok(()),
        }
    }
}
