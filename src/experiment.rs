//! Deterministic A/B variant assignment and exposure tracking.

use crate::i18n::Language;
use crate::storage::{KeyValueStore, AB_ASSIGNMENTS_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub traffic_percentage: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Free-form settings the call site reads
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Language codes the experiment runs for; empty means every language
    #[serde(default)]
    pub target_languages: Vec<String>,
    pub variants: Vec<Variant>,
}

impl Experiment {
    pub fn targets(&self, language: Language) -> bool {
        self.target_languages.is_empty()
            || self
                .target_languages
                .iter()
                .any(|code| code.eq_ignore_ascii_case(language.code()))
    }

    pub fn variant(&self, id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// First active variant whose cumulative traffic exceeds `bucket`.
    pub fn pick(&self, bucket: u32) -> Option<&Variant> {
        let mut cumulative = 0;
        self.variants.iter().filter(|v| v.active).find(|v| {
            cumulative += v.traffic_percentage;
            cumulative > bucket
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExperimentsDocument {
    experiments: Vec<Experiment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub experiment_id: String,
    pub user_id: String,
    pub variant_id: String,
    /// Language active when the user was assigned
    pub locale: String,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureEvent {
    pub experiment_id: String,
    pub variant_id: String,
    pub user_id: String,
    pub event: String,
    pub properties: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
    pub locale: String,
}

/// Receives exposure events.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: &ExposureEvent);
}

/// Emits events as structured log lines.
#[derive(Debug, Default)]
pub struct TracingAnalyticsSink;

impl AnalyticsSink for TracingAnalyticsSink {
    fn record(&self, event: &ExposureEvent) {
        let properties = serde_json::to_string(&event.properties).unwrap_or_default();
        info!(
            experiment = %event.experiment_id,
            variant = %event.variant_id,
            user = %event.user_id,
            locale = %event.locale,
            timestamp = %event.timestamp.to_rfc3339(),
            properties = %properties,
            "Experiment event '{}'",
            event.event
        );
    }
}

#[derive(Debug, Default)]
pub struct MemoryAnalyticsSink {
    events: Mutex<Vec<ExposureEvent>>,
}

impl MemoryAnalyticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExposureEvent> {
        lock(&self.events).clone()
    }
}

impl AnalyticsSink for MemoryAnalyticsSink {
    fn record(&self, event: &ExposureEvent) {
        lock(&self.events).push(event.clone());
    }
}

type AssignmentKey = (String, String);

/// Cached assignments kept per experiment before the oldest is evicted.
pub const MAX_ASSIGNMENTS_PER_EXPERIMENT: usize = 1000;

pub struct ABVariantAssigner {
    experiments: Vec<Experiment>,
    assignments: Mutex<BTreeMap<AssignmentKey, Assignment>>,
    limit: usize,
    store: Arc<dyn KeyValueStore>,
    sink: Arc<dyn AnalyticsSink>,
}

impl ABVariantAssigner {
    /// Build an assigner, restoring earlier assignments from `store`.
    pub fn new(experiments: Vec<Experiment>, store: Arc<dyn KeyValueStore>, sink: Arc<dyn AnalyticsSink>) -> Self {
        let mut assignments = restore_assignments(store.as_ref());
        assignments.retain(|(experiment_id, _), _| experiments.iter().any(|e| &e.id == experiment_id));
        debug!(
            "Experiment assigner ready: {} experiments, {} cached assignments",
            experiments.len(),
            assignments.len()
        );
        Self {
            experiments,
            assignments: Mutex::new(assignments),
            limit: MAX_ASSIGNMENTS_PER_EXPERIMENT,
            store,
            sink,
        }
    }

    /// Parse an `{ "experiments": [...] }` definitions document.
    pub fn from_json(
        value: Value,
        store: Arc<dyn KeyValueStore>,
        sink: Arc<dyn AnalyticsSink>,
    ) -> Result<Self, serde_json::Error> {
        let document: ExperimentsDocument = serde_json::from_value(value)?;
        Ok(Self::new(document.experiments, store, sink))
    }

    /// Cap the cached assignments per experiment (at least one).
    pub fn with_assignment_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn experiment(&self, id: &str) -> Option<&Experiment> {
        self.experiments.iter().find(|e| e.id == id)
    }

    pub fn assignment(&self, experiment_id: &str, user_id: &str) -> Option<Assignment> {
        lock(&self.assignments)
            .get(&(experiment_id.to_string(), user_id.to_string()))
            .cloned()
    }

    /// Variant for a user, or `None` when the experiment is unknown, inactive
    /// or not running for `language`.
    pub fn assign(&self, experiment_id: &str, user_id: &str, language: Language) -> Option<Variant> {
        let Some(experiment) = self.experiment(experiment_id) else {
            debug!("Unknown experiment '{}'", experiment_id);
            return None;
        };
        if !experiment.active || !experiment.targets(language) {
            return None;
        }

        let key = (experiment_id.to_string(), user_id.to_string());
        let cached = lock(&self.assignments).get(&key).map(|a| a.variant_id.clone());
        match cached.as_deref().map(|id| experiment.variant(id)) {
            Some(Some(variant)) if variant.active => return Some(variant.clone()),
            Some(_) => debug!(
                "Cached variant of '{}' for '{}' is gone or inactive, reassigning",
                experiment_id, user_id
            ),
            None => {}
        }

        let bucket = bucket(user_id);
        let variant = experiment.pick(bucket)?;
        let assignment = Assignment {
            experiment_id: experiment_id.to_string(),
            user_id: user_id.to_string(),
            variant_id: variant.id.clone(),
            locale: language.code().to_string(),
            assigned_at: Utc::now(),
        };
        debug!(
            "Assigned '{}' to variant '{}' of '{}' (bucket {})",
            user_id, variant.id, experiment_id, bucket
        );

        let snapshot = {
            let mut assignments = lock(&self.assignments);
            assignments.insert(key, assignment);
            evict_oldest(&mut assignments, experiment_id, user_id, self.limit);
            assignments.values().cloned().collect::<Vec<_>>()
        };
        self.persist(&snapshot);
        Some(variant.clone())
    }

    /// Record an event for an assigned user. Returns `false` (and records
    /// nothing) when the user has no assignment in the experiment.
    pub fn track(&self, experiment_id: &str, user_id: &str, event_name: &str, properties: Map<String, Value>) -> bool {
        let Some(assignment) = self.assignment(experiment_id, user_id) else {
            return false;
        };

        self.sink.record(&ExposureEvent {
            experiment_id: assignment.experiment_id,
            variant_id: assignment.variant_id,
            user_id: assignment.user_id,
            event: event_name.to_string(),
            properties,
            timestamp: Utc::now(),
            locale: assignment.locale,
        });
        true
    }

    fn persist(&self, assignments: &[Assignment]) {
        let result = serde_json::to_string(assignments)
            .map_err(|e| e.to_string())
            .and_then(|json| self.store.set(AB_ASSIGNMENTS_KEY, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!("Failed to persist experiment assignments: {}", e);
        }
    }
}

/// Drop the oldest assignments of an experiment beyond `limit`, never the
/// one just made for `keep_user`.
fn evict_oldest(
    assignments: &mut BTreeMap<AssignmentKey, Assignment>,
    experiment_id: &str,
    keep_user: &str,
    limit: usize,
) {
    loop {
        let in_experiment = assignments.keys().filter(|(exp, _)| exp == experiment_id);
        if in_experiment.count() <= limit {
            return;
        }
        let oldest = assignments
            .iter()
            .filter(|((exp, user), _)| exp == experiment_id && user != keep_user)
            .min_by_key(|(_, a)| a.assigned_at)
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => {
                debug!("Evicting cached assignment of '{}' in '{}'", key.1, key.0);
                assignments.remove(&key);
            }
            None => return,
        }
    }
}

fn restore_assignments(store: &dyn KeyValueStore) -> BTreeMap<AssignmentKey, Assignment> {
    let Some(raw) = store.get(AB_ASSIGNMENTS_KEY) else {
        return BTreeMap::new();
    };
    match serde_json::from_str::<Vec<Assignment>>(&raw) {
        Ok(assignments) => assignments
            .into_iter()
            .map(|a| ((a.experiment_id.clone(), a.user_id.clone()), a))
            .collect(),
        Err(e) => {
            warn!("Ignoring unreadable experiment assignment cache: {}", e);
            BTreeMap::new()
        }
    }
}

/// 32-bit multiply-add string hash over UTF-16 code units.
pub fn hash_user_id(user_id: &str) -> i32 {
    user_id
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Traffic bucket in `0..100`.
pub fn bucket(user_id: &str) -> u32 {
    hash_user_id(user_id).unsigned_abs() % 100
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
