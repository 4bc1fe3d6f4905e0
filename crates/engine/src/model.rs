use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Asset class shared by both inventories. Matching rules are keyed by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Organization,
    Server,
    VoiceGateway,
    EmailService,
    LobApplication,
    Site,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organization => write!(f, "organization"),
            Self::Server => write!(f, "server"),
            Self::VoiceGateway => write!(f, "voice-gateway"),
            Self::EmailService => write!(f, "email-service"),
            Self::LobApplication => write!(f, "lob-application"),
            Self::Site => write!(f, "site"),
        }
    }
}

/// A record from the source inventory. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    /// External identifier; the source system may omit it.
    #[serde(default)]
    pub id: Option<String>,
    pub kind: RecordKind,
    /// Raw field values keyed by field name; keys vary by kind.
    pub fields: BTreeMap<String, String>,
    /// Organization scope used to narrow candidate search.
    pub org: String,
}

/// A record already present in the target inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRecord {
    /// The target system's primary key, required for updates.
    pub target_id: String,
    pub kind: RecordKind,
    pub fields: BTreeMap<String, String>,
    pub org: String,
}

impl SourceRecord {
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<no id>")
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Resolution tier a candidate was discovered at. Lower tiers are stronger
/// evidence and win score ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Identifier,
    ExactName,
    FuzzyName,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::ExactName => write!(f, "exact_name"),
            Self::FuzzyName => write!(f, "fuzzy_name"),
        }
    }
}

/// A scored (source, target) pairing. `target_index` points into the run's
/// target snapshot.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub target_index: usize,
    pub tier: MatchTier,
    pub score: f64,
    /// Per-field similarity, retained for audit.
    pub per_field: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAction {
    AutoUpdate,
    ManualReview,
    CreateNew,
}

impl std::fmt::Display for MatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AutoUpdate => write!(f, "auto_update"),
            Self::ManualReview => write!(f, "manual_review"),
            Self::CreateNew => write!(f, "create_new"),
        }
    }
}

/// Terminal classification of one source record.
#[derive(Debug, Clone, Serialize)]
pub struct MatchDecision {
    pub source_id: Option<String>,
    pub source_name: String,
    pub kind: RecordKind,
    pub action: MatchAction,
    /// Chosen target; absent for create_new.
    pub target_id: Option<String>,
    pub score: f64,
    pub reasons: Vec<String>,
    /// Source fields carried so the applier can map create/update payloads
    /// from the sealed report alone.
    pub source_fields: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Review queue
// ---------------------------------------------------------------------------

/// Reviewer verdict for a manual-review item. Unset until ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Update,
    Keep,
    Create,
}

impl Resolution {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "update" => Some(Self::Update),
            "keep" => Some(Self::Keep),
            "create" => Some(Self::Create),
            _ => None,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update => write!(f, "update"),
            Self::Keep => write!(f, "keep"),
            Self::Create => write!(f, "create"),
        }
    }
}

/// A manual-review decision with enough context for a human reviewer.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    pub kind: RecordKind,
    pub score: f64,
    pub source_id: Option<String>,
    pub source_fields: BTreeMap<String, String>,
    pub target_id: String,
    pub target_fields: BTreeMap<String, String>,
    /// Per-field similarity breakdown for auditability.
    pub per_field: BTreeMap<String, f64>,
    /// Filled by the review-ingestion step, never during the matching run.
    pub resolution: Option<Resolution>,
}

// ---------------------------------------------------------------------------
// Errors and anomalies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataQuality,
    RemoteWrite,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub record_id: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Duplicate identifiers on the target side are a data-quality anomaly:
/// the pairing falls through to full scoring instead of auto-resolving.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateIdentifierAnomaly {
    pub source_id: Option<String>,
    pub field: String,
    pub value: String,
    pub target_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
    pub dry_run: bool,
}

/// Per-action counts, computed once at seal time from the decision list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub auto_update: usize,
    pub manual_review: usize,
    pub create_new: usize,
    /// Source records excluded before matching (status / exclusion marker).
    pub ineligible: usize,
    /// Target records excluded from the candidate pool for the same reasons.
    pub target_ineligible: usize,
    pub error: usize,
}

/// Immutable summary of one run. Built by `ReportBuilder::seal`; never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub counts: ReportCounts,
    /// Decisions in source input order, not sorted by score.
    pub decisions: Vec<MatchDecision>,
    pub review_queue: Vec<ReviewItem>,
    pub errors: Vec<ErrorEntry>,
    pub anomalies: Vec<DuplicateIdentifierAnomaly>,
}
