use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Balance-affecting event kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Charge,
    Usage,
    Refund,
    Penalty,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 4] = [
        TransactionKind::Charge,
        TransactionKind::Usage,
        TransactionKind::Refund,
        TransactionKind::Penalty,
    ];

    /// Debit kinds are stored negative and are checked against the balance.
    pub fn is_debit(self) -> bool {
        matches!(self, TransactionKind::Usage | TransactionKind::Penalty)
    }

    /// Applies the sign rule for this kind to a caller-supplied magnitude.
    pub fn normalize(self, amount: i64) -> i64 {
        if self.is_debit() {
            -amount.abs()
        } else {
            amount.abs()
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Charge => "charge",
            TransactionKind::Usage => "usage",
            TransactionKind::Refund => "refund",
            TransactionKind::Penalty => "penalty",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "charge" => Ok(TransactionKind::Charge),
            "usage" | "use" => Ok(TransactionKind::Usage),
            "refund" => Ok(TransactionKind::Refund),
            "penalty" => Ok(TransactionKind::Penalty),
            other => {
                let expected: Vec<&str> = Self::ALL.iter().map(|kind| kind.as_str()).collect();
                Err(format!(
                    "unknown transaction type `{other}` (expected one of: {})",
                    expected.join(", ")
                ))
            }
        }
    }
}

/// Primitive values allowed in a transaction's audit metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Metadata key carrying the payment method of a charge.
pub const PAYMENT_METHOD_KEY: &str = "paymentMethod";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: i64,
    /// Running balance after this transaction. Rebuilt from the log on load.
    #[serde(default)]
    pub balance: i64,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Transaction {
    /// Builds a transaction with a fresh id. `amount` is normalized by `kind`.
    pub fn new(
        kind: TransactionKind,
        amount: i64,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id(),
            kind,
            amount: kind.normalize(amount),
            balance: 0,
            timestamp: timestamp.trunc_subsecs(3),
            description: description.into(),
            reference_id: None,
            metadata: None,
        }
    }

    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.get(PAYMENT_METHOD_KEY))
            .and_then(MetadataValue::as_text)
    }
}

/// UUIDv7 ids: a millisecond timestamp prefix followed by random bits.
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Millisecond-precision RFC 3339 timestamps (`2025-01-05T09:30:00.123Z`).
pub mod timestamp {
    use chrono::{DateTime, SubsecRound, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn format(value: &DateTime<Utc>) -> String {
        value.format(FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc).trunc_subsecs(3))
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
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`")))
    }

    /// Lenient optional form: empty or unparseable strings load as `None`.
    pub mod lenient {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => serializer.serialize_str(&super::format(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            Ok(raw.as_deref().and_then(super::parse))
        }
    }
}
