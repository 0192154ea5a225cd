use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub i64);

impl QuoteId {
    /// Picks the id for a record created at `now`: the epoch millisecond,
    /// bumped past every id already stored so ids stay unique and increasing.
    /// A stored id at `i64::MAX` cannot be bumped; the timestamp is used then.
    pub fn next(existing: &[QuoteEntry], now: DateTime<Utc>) -> Self {
        let candidate = now.timestamp_millis();
        let highest = existing.iter().filter_map(QuoteEntry::id).max();
        match highest.and_then(|highest| highest.checked_add(1)) {
            Some(bumped) if bumped > candidate => Self(bumped),
            _ => Self(candidate),
        }
    }
}

impl std::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub id: QuoteId,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(with = "iso8601_millis")]
    pub created_at: DateTime<Utc>,
}

impl QuoteRecord {
    /// `created_at` is cut to milliseconds, the precision it is stored with.
    pub fn new(id: QuoteId, fields: QuoteFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            fullname: fields.fullname,
            phone: fields.phone,
            email: fields.email,
            message: fields.message,
            created_at: created_at.trunc_subsecs(3),
        }
    }
}

/// One element of the stored collection. Elements written by older
/// deployments that do not decode as a [`QuoteRecord`] are kept verbatim so a
/// rewrite of the collection never drops them.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuoteEntry {
    Record(QuoteRecord),
    Unrecognized(Value),
}

impl QuoteEntry {
    pub fn record(&self) -> Option<&QuoteRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Unrecognized(_) => None,
        }
    }

    /// Numeric id, also read from unrecognized elements that carry one.
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Record(record) => Some(record.id.0),
            Self::Unrecognized(value) => value.get("id").and_then(Value::as_i64),
        }
    }
}

impl From<QuoteRecord> for QuoteEntry {
    fn from(record: QuoteRecord) -> Self {
        Self::Record(record)
    }
}

/// Raw form payload. Every field is optional at the decoding stage so a
/// missing key surfaces as a validation failure rather than a decode error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSubmission {
    #[serde(default, alias = "fullName")]
    pub fullname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Trimmed, non-empty submission fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteFields {
    pub fullname: String,
    pub phone: String,
    pub email: String,
    pub message: String,
}

impl QuoteSubmission {
    pub fn validate(&self) -> Result<QuoteFields, DomainError> {
        let fullname = required(self.fullname.as_deref());
        let phone = required(self.phone.as_deref());
        let email = required(self.email.as_deref());
        let message = required(self.message.as_deref());

        match (fullname, phone, email, message) {
            (Some(fullname), Some(phone), Some(email), Some(message)) => Ok(QuoteFields {
                fullname: fullname.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                message: message.to_string(),
            }),
            (fullname, phone, email, message) => {
                let fields = [
                    ("fullname", fullname.is_none()),
                    ("phone", phone.is_none()),
                    ("email", email.is_none()),
                    ("message", message.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();
                Err(DomainError::MissingRequiredFields { fields })
            }
        }
    }
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}

/// RFC 3339 in UTC with millisecond precision, e.g. `2026-10-19T08:30:00.123Z`.
pub mod iso8601_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
