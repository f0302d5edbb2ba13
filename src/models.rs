use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::err::Error;
use crate::gateway::Document;

/// Server-generated record identifier, rendered as 32 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| Error::InvalidIdentifier {
                message: format!("Invalid id format: `{}`", s),
            })
    }
}

impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFields {
    #[serde(rename = "fullname", alias = "fullName")]
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub subscription: Option<i64>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: StudentFields,
}

impl TryFrom<Document> for Student {
    type Error = Error;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        Ok(Student {
            id: doc.id,
            fields: serde_json::from_value(doc.body)?,
        })
    }
}

/// Body of `POST /students`. Anything besides the two required fields is
/// ignored, so optional attributes always start out unset.
#[derive(Debug, Deserialize)]
pub struct NewStudent {
    #[serde(default, rename = "fullname", alias = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewStudent {
    pub fn validate(self) -> Result<StudentFields, Error> {
        let full_name = required(self.full_name, "fullname")?;
        let phone = required(self.phone, "phone")?;
        Ok(StudentFields {
            full_name,
            phone,
            subscription: None,
            start_date: None,
            last_date: None,
            comments: None,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, Error> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::validation(format!(
            "Missing fullname or phone field: `{}` is empty",
            field
        ))),
    }
}

/// Checks a `PUT /students/{id}` payload against the updatable fields and
/// returns it normalized to stored field names. Nothing is written when this
/// fails.
pub fn validate_student_patch(raw: Map<String, Value>) -> Result<Map<String, Value>, Error> {
    if raw.is_empty() {
        return Err(Error::validation("No student field is updated"));
    }

    let mut patch = Map::new();
    for (key, value) in raw {
        let (field, value) = match key.as_str() {
            "fullname" | "fullName" => ("fullname", non_empty_string(&key, value)?),
            "phone" => ("phone", non_empty_string(&key, value)?),
            "subscription" => ("subscription", nullable_integer(&key, value)?),
            "startDate" => ("startDate", nullable_timestamp(&key, value)?),
            "lastDate" => ("lastDate", nullable_timestamp(&key, value)?),
            "comments" => ("comments", nullable_string(&key, value)?),
            _ => {
                return Err(Error::validation(format!(
                    "Field `{}` is not an updatable student field",
                    key
                )))
            }
        };
        patch.insert(field.to_string(), value);
    }
    Ok(patch)
}

fn wrong_type(key: &str, expected: &str) -> Error {
    Error::validation(format!("Field `{}` must be {}", key, expected))
}

fn non_empty_string(key: &str, value: Value) -> Result<Value, Error> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(Value::String(s)),
        _ => Err(wrong_type(key, "a non-empty string")),
    }
}

fn nullable_string(key: &str, value: Value) -> Result<Value, Error> {
    match value {
        Value::Null | Value::String(_) => Ok(value),
        _ => Err(wrong_type(key, "a string or null")),
    }
}

fn nullable_integer(key: &str, value: Value) -> Result<Value, Error> {
    if value.is_null() || value.is_i64() {
        Ok(value)
    } else {
        Err(wrong_type(key, "an integer or null"))
    }
}

fn nullable_timestamp(key: &str, value: Value) -> Result<Value, Error> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => {
            let parsed = DateTime::parse_from_rfc3339(&s)
                .map_err(|_| wrong_type(key, "an RFC 3339 timestamp or null"))?;
            Ok(serde_json::to_value(parsed.with_timezone(&Utc))?)
        }
        _ => Err(wrong_type(key, "an RFC 3339 timestamp or null")),
    }
}

/// One booked slot inside a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub student_id: RecordId,
    #[serde(default)]
    pub time: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attendance: Option<bool>,
}

/// Client-visible part of a schedule; also the body of `POST /schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFields {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub classes: Vec<Class>,
}

/// What is stored for a schedule. `revision` guards reconciliation
/// against lost updates and never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(flatten)]
    pub fields: ScheduleFields,
    #[serde(default)]
    pub revision: i64,
}

impl TryFrom<Document> for ScheduleDocument {
    type Error = Error;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        Ok(serde_json::from_value(doc.body)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: ScheduleFields,
}

impl TryFrom<Document> for Schedule {
    type Error = Error;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let id = doc.id;
        let stored = ScheduleDocument::try_from(doc)?;
        Ok(Schedule {
            id,
            fields: stored.fields,
        })
    }
}
