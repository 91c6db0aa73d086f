//! Work items and the request-id codec
//!
//! A batch carries nothing but an id per request, so the id must hold
//! everything needed to rebuild the request: the partition coordinates,
//! the continuation token and the page number. The id is four `;`
//! separated fields. Present values are form-urlencoded, which never
//! produces `;` or `~`; `~` marks an absent value.

use crate::error::{Error, Result};
use crate::partition::PartitionKey;
use std::fmt;
use url::form_urlencoded;

const SEPARATOR: char = ';';
const ABSENT: &str = "~";

/// One request to issue: a partition, page token and page number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub partition: PartitionKey,
    pub page_token: Option<String>,
    pub page: u32,
}

impl WorkItem {
    /// First page of a partition
    pub fn first_page(partition: PartitionKey) -> Self {
        Self {
            partition,
            page_token: None,
            page: 0,
        }
    }

    /// Continuation of this item's partition with the given token
    #[must_use]
    pub fn next_page(&self, page_token: impl Into<String>) -> Self {
        Self {
            partition: self.partition.clone(),
            page_token: Some(page_token.into()),
            page: self.page + 1,
        }
    }

    /// Encoded request id
    pub fn request_id(&self) -> RequestId {
        RequestId::encode(self)
    }
}

/// Request id carrying a whole `WorkItem`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Encode a work item
    pub fn encode(item: &WorkItem) -> Self {
        let fields = [
            encode_field(item.partition.course_id.as_deref()),
            encode_field(item.partition.date.as_deref()),
            encode_field(item.page_token.as_deref()),
            item.page.to_string(),
        ];
        Self(fields.join(&SEPARATOR.to_string()))
    }

    /// Decode back into the work item it was encoded from
    pub fn decode(&self) -> Result<WorkItem> {
        let fields: Vec<&str> = self.0.split(SEPARATOR).collect();
        let [course_id, date, page_token, page] = fields[..] else {
            return Err(Error::request_id(
                &self.0,
                format!("expected 4 fields, found {}", fields.len()),
            ));
        };

        let page = page
            .parse()
            .map_err(|_| Error::request_id(&self.0, format!("invalid page number '{page}'")))?;

        Ok(WorkItem {
            partition: PartitionKey {
                course_id: self.decode_field(course_id)?,
                date: self.decode_field(date)?,
            },
            page_token: self.decode_field(page_token)?,
            page,
        })
    }

    /// Raw id text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn decode_field(&self, raw: &str) -> Result<Option<String>> {
        if raw == ABSENT {
            return Ok(None);
        }
        if !is_encoded(raw) {
            return Err(Error::request_id(
                &self.0,
                format!("field '{raw}' is not form-urlencoded"),
            ));
        }
        Ok(Some(
            form_urlencoded::parse(raw.as_bytes())
                .map(|(key, _)| key.into_owned())
                .next()
                .unwrap_or_default(),
        ))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<RequestId> for String {
    fn from(value: RequestId) -> Self {
        value.0
    }
}

fn encode_field(value: Option<&str>) -> String {
    match value {
        Some(v) => form_urlencoded::byte_serialize(v.as_bytes()).collect(),
        None => ABSENT.to_string(),
    }
}

/// Only bytes the form-urlencoded serializer emits, with well-formed escapes
fn is_encoded(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1..i + 3);
                if !escape.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                    return false;
                }
                i += 3;
            }
            b if b.is_ascii_alphanumeric() || b"*-._+".contains(&b) => i += 1,
            _ => return false,
        }
    }
    true
}
