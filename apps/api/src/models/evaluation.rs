use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How the evaluator relates to the evaluated company or person.
/// Serialized as its integer code (0–6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "i16", into = "i16")]
pub enum RelationshipType {
    Unset = 0,
    Acquaintance = 1,
    Client = 2,
    Partner = 3,
    Investor = 4,
    Shareholder = 5,
    Friend = 6,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 7] = [
        RelationshipType::Unset,
        RelationshipType::Acquaintance,
        RelationshipType::Client,
        RelationshipType::Partner,
        RelationshipType::Investor,
        RelationshipType::Shareholder,
        RelationshipType::Friend,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RelationshipType::Unset => "unset",
            RelationshipType::Acquaintance => "acquaintance",
            RelationshipType::Client => "client",
            RelationshipType::Partner => "partner",
            RelationshipType::Investor => "investor",
            RelationshipType::Shareholder => "shareholder",
            RelationshipType::Friend => "friend",
        }
    }
}

impl TryFrom<i16> for RelationshipType {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        RelationshipType::ALL
            .get(usize::try_from(code).map_err(|_| format!("invalid relationship type {code}"))?)
            .copied()
            .ok_or_else(|| format!("invalid relationship type {code}"))
    }
}

impl From<RelationshipType> for i16 {
    fn from(value: RelationshipType) -> Self {
        value as i16
    }
}

/// The entity an evaluation is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EvaluationTarget {
    Company(String),
    Person(Uuid),
}

/// The five category sub-scores. Each is optional and 1–5 when set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryScores {
    pub trustworthiness: Option<i16>,
    pub expertise: Option<i16>,
    pub communication: Option<i16>,
    pub reliability: Option<i16>,
    pub value: Option<i16>,
}

impl CategoryScores {
    pub const NAMES: [&'static str; 5] = [
        "trustworthiness",
        "expertise",
        "communication",
        "reliability",
        "value",
    ];

    pub fn values(&self) -> [Option<i16>; 5] {
        [
            self.trustworthiness,
            self.expertise,
            self.communication,
            self.reliability,
            self.value,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationRow {
    pub id: Uuid,
    pub evaluator_id: Uuid,
    pub company_slug: Option<String>,
    pub target_user_id: Option<Uuid>,
    pub rating: i16,
    pub trustworthiness: Option<i16>,
    pub expertise: Option<i16>,
    pub communication: Option<i16>,
    pub reliability: Option<i16>,
    pub value: Option<i16>,
    pub relationship_type: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EvaluationRow {
    pub fn target(&self) -> Option<EvaluationTarget> {
        match (&self.company_slug, self.target_user_id) {
            (Some(slug), None) => Some(EvaluationTarget::Company(slug.clone())),
            (None, Some(user_id)) => Some(EvaluationTarget::Person(user_id)),
            _ => None,
        }
    }

    pub fn categories(&self) -> CategoryScores {
        CategoryScores {
            trustworthiness: self.trustworthiness,
            expertise: self.expertise,
            communication: self.communication,
            reliability: self.reliability,
            value: self.value,
        }
    }

    /// Falls back to `Unset` for codes outside 0–6; the column CHECK prevents those.
    pub fn relationship(&self) -> RelationshipType {
        RelationshipType::try_from(self.relationship_type).unwrap_or(RelationshipType::Unset)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationReplyRow {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Values an evaluation held before an edit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationEditRow {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub edited_at: DateTime<Utc>,
}
