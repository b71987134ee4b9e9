//! Domain entities (spec §3). Enums mirror Postgres enum columns; string
//! `Display`/`FromStr` pairs follow the teacher's convention so the same
//! value round-trips through `sqlx`'s text mapping and through JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str)),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($str => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($name))),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
                <String as sqlx::Encode<sqlx::Postgres>>::encode(self.to_string(), buf)
            }
        }
    };
}

string_enum!(SourceType {
    Feed => "feed",
    Hn => "hn",
    Reddit => "reddit",
});

string_enum!(ItemKind {
    Article => "article",
    Post => "post",
});

string_enum!(RawItemStatus {
    New => "new",
    Extracted => "extracted",
    Embedded => "embedded",
    Clustered => "clustered",
    Scored => "scored",
});

impl RawItemStatus {
    /// Ordinal used to enforce the monotonic-advance invariant (spec §3).
    pub fn rank(self) -> u8 {
        match self {
            RawItemStatus::New => 0,
            RawItemStatus::Extracted => 1,
            RawItemStatus::Embedded => 2,
            RawItemStatus::Clustered => 3,
            RawItemStatus::Scored => 4,
        }
    }
}

string_enum!(ClusterStatus {
    Open => "open",
    Merged => "merged",
    Archived => "archived",
});

string_enum!(Confidence {
    Low => "low",
    Med => "med",
    High => "high",
});

string_enum!(FeedbackKind {
    Save => "save",
    Hide => "hide",
    Report => "report",
});

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    pub source_type: SourceType,
    pub url: String,
    pub category: Option<String>,
    pub credibility_tier: i16,
    pub enabled: bool,
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RawItem {
    pub id: Uuid,
    pub source_id: Uuid,
    pub external_id: Option<String>,
    pub url: Option<String>,
    pub canonical_url: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub raw_text: Option<String>,
    pub raw_payload: serde_json::Value,
    pub content_hash: String,
    pub kind: ItemKind,
    pub status: RawItemStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExtractedContent {
    pub raw_item_id: Uuid,
    pub final_url: String,
    pub text: String,
    pub word_count: i32,
    pub method: String,
    pub quality: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemEmbedding {
    pub raw_item_id: Uuid,
    pub model_id: String,
    pub dim: i32,
    #[sqlx(skip)]
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cluster {
    pub id: Uuid,
    pub canonical_item_id: Uuid,
    pub status: ClusterStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClusterMember {
    pub cluster_id: Uuid,
    pub raw_item_id: Uuid,
    pub is_canonical: bool,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemScore {
    pub raw_item_id: Uuid,
    pub computed_at: DateTime<Utc>,
    pub relevance: f64,
    pub velocity: f64,
    pub cross_source: f64,
    pub novelty: f64,
    pub signal_score: f64,
    pub score_meta: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Briefing {
    pub id: Uuid,
    pub scope: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub summary_md: String,
    pub meta: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Briefing {
    pub const GLOBAL_SCOPE: &'static str = "global";

    pub fn user_scope(user_id: Uuid) -> String {
        format!("user:{user_id}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BriefingItem {
    pub briefing_id: Uuid,
    pub rank: i32,
    pub raw_item_id: Uuid,
    pub cluster_id: Option<Uuid>,
    pub title: String,
    pub one_liner: String,
    pub why_it_matters: String,
    pub confidence: Confidence,
    pub signal_score: f64,
    pub sources: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserPreference {
    pub user_id: Uuid,
    pub topics: Vec<String>,
    pub keywords_include: Vec<String>,
    pub keywords_exclude: Vec<String>,
    pub sources_blocked: Vec<Uuid>,
    pub risk_tolerance: i16,
    pub email_daily: bool,
    pub email_time_utc: String,
}

impl Default for UserPreference {
    fn default() -> Self {
        Self {
            user_id: Uuid::nil(),
            topics: Vec::new(),
            keywords_include: Vec::new(),
            keywords_exclude: Vec::new(),
            sources_blocked: Vec::new(),
            risk_tolerance: 3,
            email_daily: true,
            email_time_utc: "07:00".to_string(),
        }
    }
}

/// Output of an `Ingester::fetch` call, before idempotency/persistence
/// (spec §4.1). Mirrors the teacher/original's `NormalizedItem`.
#[derive(Debug, Clone)]
pub struct NormalizedItem {
    pub external_id: String,
    pub url: Option<String>,
    pub canonical_url: Option<String>,
    pub title: String,
    pub kind: ItemKind,
    pub raw_text: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub raw_payload: serde_json::Value,
}

impl NormalizedItem {
    pub fn content_hash(&self) -> String {
        crate::hash::content_hash(&self.title, self.raw_text.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ranks_are_monotonic() {
        assert!(RawItemStatus::New.rank() < RawItemStatus::Extracted.rank());
        assert!(RawItemStatus::Extracted.rank() < RawItemStatus::Embedded.rank());
        assert!(RawItemStatus::Embedded.rank() < RawItemStatus::Clustered.rank());
        assert!(RawItemStatus::Clustered.rank() < RawItemStatus::Scored.rank());
    }

    #[test]
    fn source_type_round_trips_through_display_and_parse() {
        for (variant, text) in [
            (SourceType::Feed, "feed"),
            (SourceType::Hn, "hn"),
            (SourceType::Reddit, "reddit"),
        ] {
            assert_eq!(variant.to_string(), text);
            assert_eq!(text.parse::<SourceType>().unwrap(), variant);
        }
    }
}
