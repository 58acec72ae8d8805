// crates/keelson-core/src/runtime/executor.rs
// ============================================================================
// Module: Keelson Pipeline Executor
// Description: Resource-aware, cache-backed driver over the validator DAG.
// Purpose: Schedule ready validators, enforce budgets, cache by input hash, retry errors.
// Dependencies: crate::core, crate::interfaces, crate::runtime::{registry, store, topology}
// ============================================================================

//! ## Overview
//! The executor drives validators through the topology with four
//! concerns handled at distinct points: readiness (the topology),
//! resources (the pool), caching (content-hash keys with TTL), and
//! retries (execution errors only — a `failed` result is a statement
//! about the design and is never retried).
//!
//! Workers are plain threads reporting over an mpsc channel. A worker
//! that outlives its timeout is abandoned, not killed: the executor
//! records an `error` result mentioning the timeout and ignores any late
//! report.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::ExecutionId;
use crate::core::Finding;
use crate::core::PhaseId;
use crate::core::ResourceRequirements;
use crate::core::Timestamp;
use crate::core::ValidationResult;
use crate::core::ValidatorDefinition;
use crate::core::ValidatorId;
use crate::core::ValidatorState;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::hash_determinized;
use crate::interfaces::ValidationContext;
use crate::runtime::registry::ValidatorRegistry;
use crate::runtime::store::StateStore;
use crate::runtime::topology::ValidatorTopology;

// ============================================================================
// SECTION: Resource Pool
// ============================================================================

/// Interior counters guarded by the pool mutex.
#[derive(Debug)]
struct PoolInner {
    /// CPU cores currently available.
    cpu_available: u32,
    /// RAM currently available in gigabytes.
    ram_available_gb: f64,
}

/// Counting resource pool for cpu and ram budgets.
///
/// # Invariants
/// - Acquire and release are always paired by the executor.
#[derive(Debug)]
pub struct ResourcePool {
    /// Total CPU cores in the pool.
    cpu_total: u32,
    /// Total RAM in gigabytes.
    ram_total_gb: f64,
    /// Whether a GPU is present.
    has_gpu: bool,
    /// Available counters.
    inner: Mutex<PoolInner>,
}

impl ResourcePool {
    /// Creates a pool with the given totals.
    #[must_use]
    pub fn new(cpu_cores: u32, ram_gb: f64, has_gpu: bool) -> Self {
        Self {
            cpu_total: cpu_cores,
            ram_total_gb: ram_gb,
            has_gpu,
            inner: Mutex::new(PoolInner {
                cpu_available: cpu_cores,
                ram_available_gb: ram_gb,
            }),
        }
    }

    /// Returns true when the requirement could ever fit the total pool.
    #[must_use]
    pub fn could_ever_fit(&self, req: &ResourceRequirements) -> bool {
        req.cpu_cores <= self.cpu_total
            && req.ram_gb <= self.ram_total_gb
            && (!req.gpu_required || self.has_gpu)
    }

    /// Attempts to reserve the requirement; true on success.
    #[must_use]
    pub fn try_acquire(&self, req: &ResourceRequirements) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if req.cpu_cores <= inner.cpu_available
            && req.ram_gb <= inner.ram_available_gb
            && (!req.gpu_required || self.has_gpu)
        {
            inner.cpu_available -= req.cpu_cores;
            inner.ram_available_gb -= req.ram_gb;
            true
        } else {
            false
        }
    }

    /// Returns a previously acquired requirement to the pool.
    pub fn release(&self, req: &ResourceRequirements) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.cpu_available = (inner.cpu_available + req.cpu_cores).min(self.cpu_total);
            inner.ram_available_gb = (inner.ram_available_gb + req.ram_gb).min(self.ram_total_gb);
        }
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        let cores = u32::try_from(num_cpus::get()).unwrap_or(4);
        Self::new(cores, 16.0, false)
    }
}

// ============================================================================
// SECTION: Validation Cache
// ============================================================================

/// One cached result keyed by input hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached result.
    pub result: ValidationResult,
    /// Input hash the result was produced under.
    pub input_hash: String,
    /// When the entry was cached.
    pub cached_at: Timestamp,
    /// Time-to-live in seconds.
    pub ttl_seconds: u64,
}

impl CacheEntry {
    /// Returns true while the entry is inside its TTL.
    #[must_use]
    pub fn is_valid(&self, now: Timestamp) -> bool {
        now.seconds_since(self.cached_at) < self.ttl_seconds
    }
}

/// Cache statistics for observability surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Number of entries held.
    pub total_entries: usize,
    /// Number of entries inside their TTL.
    pub valid_entries: usize,
    /// Validator ids with entries, sorted.
    pub validator_ids: Vec<ValidatorId>,
}

/// Result cache keyed by `(validator id, input hash)`.
///
/// In-memory by default; setting `PIPELINE_CACHE_DIR` adds a disk copy
/// of every entry so results survive the process.
#[derive(Debug, Default)]
pub struct ValidationCache {
    /// Entries by validator id (one entry per id, keyed by hash inside).
    entries: Mutex<BTreeMap<ValidatorId, CacheEntry>>,
    /// Optional disk backing directory.
    disk_dir: Option<PathBuf>,
}

impl ValidationCache {
    /// Creates an in-memory cache, with disk backing when `dir` is set.
    #[must_use]
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            disk_dir: dir,
        }
    }

    /// Returns a copy of the cached result when the hash matches and the
    /// entry is inside its TTL. The copy is marked `was_cached`.
    #[must_use]
    pub fn get(&self, id: &ValidatorId, input_hash: &str) -> Option<ValidationResult> {
        let now = Timestamp::now();
        let from_memory = self
            .entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(id).cloned())
            .filter(|entry| entry.input_hash == input_hash && entry.is_valid(now));
        let entry = from_memory.or_else(|| {
            self.read_disk(id)
                .filter(|entry| entry.input_hash == input_hash && entry.is_valid(now))
        })?;
        let mut result = entry.result;
        result.was_cached = true;
        Some(result)
    }

    /// Inserts a result under `(id, input_hash)` with the given TTL.
    pub fn put(&self, id: &ValidatorId, input_hash: &str, result: ValidationResult, ttl_seconds: u64) {
        let entry = CacheEntry {
            result,
            input_hash: input_hash.to_string(),
            cached_at: Timestamp::now(),
            ttl_seconds,
        };
        self.write_disk(id, &entry);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id.clone(), entry);
        }
    }

    /// Drops the entry for one validator.
    pub fn invalidate(&self, id: &ValidatorId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(id);
        }
        if let Some(path) = self.disk_path(id) {
            let _ = std::fs::remove_file(path);
        }
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        let ids: Vec<ValidatorId> = self
            .entries
            .lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        for id in &ids {
            self.invalidate(id);
        }
    }

    /// Returns cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let now = Timestamp::now();
        let entries = self.entries.lock().map(|map| map.clone()).unwrap_or_default();
        CacheStats {
            total_entries: entries.len(),
            valid_entries: entries.values().filter(|entry| entry.is_valid(now)).count(),
            validator_ids: entries.keys().cloned().collect(),
        }
    }

    /// Returns the last cached time for a validator, if any.
    #[must_use]
    pub fn last_cached_at(&self, id: &ValidatorId) -> Option<Timestamp> {
        self.entries.lock().ok().and_then(|entries| entries.get(id).map(|entry| entry.cached_at))
    }

    /// Disk file for one validator's entry.
    fn disk_path(&self, id: &ValidatorId) -> Option<PathBuf> {
        let dir = self.disk_dir.as_ref()?;
        let name: String = id
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        Some(dir.join(format!("{name}.json")))
    }

    /// Reads a disk entry, tolerating absence and corruption.
    fn read_disk(&self, id: &ValidatorId) -> Option<CacheEntry> {
        let path = self.disk_path(id)?;
        let bytes = std::fs::read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Writes a disk entry, tolerating failure.
    fn write_disk(&self, id: &ValidatorId, entry: &CacheEntry) {
        let Some(path) = self.disk_path(id) else {
            return;
        };
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Ok(bytes) = serde_json::to_vec(entry) {
            if std::fs::write(&path, bytes).is_err() {
                warn!(validator = %id, "failed to write disk cache entry");
            }
        }
    }
}

// ============================================================================
// SECTION: Execution State
// ============================================================================

/// The driver's working memory for one invocation.
///
/// # Invariants
/// - A validator id is in at most one of the five sets at any time.
/// - Serializes sets as sorted lists and timestamps as RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
    /// Invocation identifier.
    pub execution_id: ExecutionId,
    /// When the invocation started.
    pub started_at: Timestamp,
    /// When the invocation completed, if it has.
    pub completed_at: Option<Timestamp>,
    /// Validators awaiting execution.
    pub pending: BTreeSet<ValidatorId>,
    /// Validators currently running.
    pub running: BTreeSet<ValidatorId>,
    /// Validators that completed with `passed` or `warning`.
    pub completed: BTreeSet<ValidatorId>,
    /// Validators that ended `failed` or `error`.
    pub failed: BTreeSet<ValidatorId>,
    /// Validators skipped (unchanged inputs or unmet dependencies).
    pub skipped: BTreeSet<ValidatorId>,
    /// Results by validator id.
    pub results: BTreeMap<ValidatorId, ValidationResult>,
    /// True when the run stopped early on an `error` result.
    pub had_fatal_error: bool,
    /// Validator that caused the fatal stop, when one did.
    pub fatal_error_validator: Option<ValidatorId>,
}

/// Compact counts for progress surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    /// Invocation identifier.
    pub execution_id: ExecutionId,
    /// Pending count.
    pub pending: usize,
    /// Running count.
    pub running: usize,
    /// Completed count.
    pub completed: usize,
    /// Failed count.
    pub failed: usize,
    /// Skipped count.
    pub skipped: usize,
    /// Whether the run stopped on a fatal error.
    pub had_fatal_error: bool,
}

impl ExecutionState {
    /// Creates a fresh state with the given pending set.
    #[must_use]
    pub fn new(execution_id: ExecutionId, pending: BTreeSet<ValidatorId>) -> Self {
        Self {
            execution_id,
            started_at: Timestamp::now(),
            completed_at: None,
            pending,
            running: BTreeSet::new(),
            completed: BTreeSet::new(),
            failed: BTreeSet::new(),
            skipped: BTreeSet::new(),
            results: BTreeMap::new(),
            had_fatal_error: false,
            fatal_error_validator: None,
        }
    }

    /// True when nothing is pending or running.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty() && self.running.is_empty()
    }

    /// True when any validator ended in the failed bucket.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Returns compact counts.
    #[must_use]
    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            execution_id: self.execution_id.clone(),
            pending: self.pending.len(),
            running: self.running.len(),
            completed: self.completed.len(),
            failed: self.failed.len(),
            skipped: self.skipped.len(),
            had_fatal_error: self.had_fatal_error,
        }
    }

    /// Serializes the state to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Serialization`] when encoding fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ExecutorError> {
        serde_json::to_vec_pretty(self).map_err(|err| ExecutorError::Serialization(err.to_string()))
    }

    /// Restores a state from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Serialization`] when decoding fails.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ExecutorError> {
        serde_json::from_slice(bytes).map_err(|err| ExecutorError::Serialization(err.to_string()))
    }
}

// ============================================================================
// SECTION: Executor Configuration
// ============================================================================

/// Errors raised by executor configuration and persistence.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Execution-state serialization failed.
    #[error("execution state serialization failed: {0}")]
    Serialization(String),
}

/// Tunable executor behavior.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum concurrent worker threads.
    pub max_workers: usize,
    /// Stop scheduling after an `error` result.
    pub stop_on_fatal_error: bool,
    /// Skip transitive successors of a `failed` validator.
    pub stop_on_failure: bool,
    /// Consult the result cache before running.
    pub skip_cached: bool,
    /// Consult `should_skip_unchanged` before the cache.
    pub skip_unchanged: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        let workers = std::env::var("PIPELINE_WORKERS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value >= 1)
            .unwrap_or_else(num_cpus::get);
        Self {
            max_workers: workers,
            stop_on_fatal_error: false,
            stop_on_failure: false,
            skip_cached: true,
            skip_unchanged: true,
        }
    }
}

// ============================================================================
// SECTION: Pipeline Executor
// ============================================================================

/// Callback invoked per completed validator.
pub type ProgressCallback = Box<dyn Fn(&ValidatorId, &ValidationResult) + Send + Sync>;

/// Book-keeping for one in-flight worker.
struct RunningWorker {
    /// Wall-clock deadline derived from the definition timeout.
    deadline: Instant,
    /// Resources reserved for the worker.
    requirements: ResourceRequirements,
}

/// Drives validators through the DAG within resource budgets.
pub struct PipelineExecutor {
    /// Built topology.
    topology: Arc<ValidatorTopology>,
    /// Shared state store.
    store: Arc<StateStore>,
    /// Registry of bound implementations.
    registry: Arc<ValidatorRegistry>,
    /// Resource budget.
    pool: ResourcePool,
    /// Result cache, shared with worker threads.
    cache: Arc<ValidationCache>,
    /// Behavior configuration.
    config: ExecutorConfig,
    /// Progress observers.
    callbacks: Vec<ProgressCallback>,
    /// Cooperative cancellation flag shared with callers.
    cancelled: Arc<std::sync::atomic::AtomicBool>,
}

impl PipelineExecutor {
    /// Creates an executor over a built topology.
    #[must_use]
    pub fn new(
        topology: Arc<ValidatorTopology>,
        store: Arc<StateStore>,
        registry: Arc<ValidatorRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        let cache_dir = std::env::var("PIPELINE_CACHE_DIR").ok().map(PathBuf::from);
        Self {
            topology,
            store,
            registry,
            pool: ResourcePool::default(),
            cache: Arc::new(ValidationCache::new(cache_dir)),
            config,
            callbacks: Vec::new(),
            cancelled: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Returns a handle that cancels the pipeline when set. The executor
    /// stops submitting new work and awaits in-flight workers; it never
    /// terminates them forcibly.
    #[must_use]
    pub fn cancel_handle(&self) -> Arc<std::sync::atomic::AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Replaces the resource pool.
    #[must_use]
    pub fn with_pool(mut self, pool: ResourcePool) -> Self {
        self.pool = pool;
        self
    }

    /// Registers a progress callback fired per completed validator.
    pub fn on_progress(&mut self, callback: ProgressCallback) {
        self.callbacks.push(callback);
    }

    /// Invalidates the cache entry for one validator.
    pub fn invalidate_cache(&self, id: &ValidatorId) {
        self.cache.invalidate(id);
    }

    /// Returns cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Executes every validator in the topology.
    #[must_use]
    pub fn execute_all(&self, execution_id: ExecutionId) -> ExecutionState {
        let pending: BTreeSet<ValidatorId> =
            self.topology.execution_order().iter().cloned().collect();
        self.run(execution_id, pending)
    }

    /// Executes the validators declared for one phase.
    ///
    /// Dependencies outside the phase are treated as satisfied when their
    /// produced parameters are already present in the store; otherwise
    /// the dependent validator is skipped with a dependency finding.
    #[must_use]
    pub fn execute_phase(&self, execution_id: ExecutionId, phase: PhaseId) -> ExecutionState {
        let pending = self.topology.validators_for_phase(phase);
        self.run(execution_id, pending)
    }

    /// Executes one validator synchronously on the caller thread.
    #[must_use]
    pub fn execute_single(&self, id: &ValidatorId) -> ValidationResult {
        let execution_id = ExecutionId::new(format!("single-{id}"));
        let result = self.run_validator(id, &execution_id);
        self.notify_progress(id, &result);
        result
    }

    // ========================================================================
    // SECTION: Driver Loop
    // ========================================================================

    /// The scheduling loop shared by `execute_all` and `execute_phase`.
    fn run(&self, execution_id: ExecutionId, pending: BTreeSet<ValidatorId>) -> ExecutionState {
        let mut state = ExecutionState::new(execution_id, pending);
        let (sender, receiver) = mpsc::channel::<(ValidatorId, ValidationResult)>();
        let mut workers: BTreeMap<ValidatorId, RunningWorker> = BTreeMap::new();
        let mut abandoned: BTreeSet<ValidatorId> = BTreeSet::new();
        let mut stop_scheduling = false;

        info!(execution = %state.execution_id, pending = state.pending.len(), "pipeline run started");

        loop {
            if self.cancelled.load(std::sync::atomic::Ordering::SeqCst) {
                stop_scheduling = true;
            }
            if !stop_scheduling && self.schedule_ready(&mut state, &sender, &mut workers) {
                stop_scheduling = true;
            }

            if state.running.is_empty() {
                if stop_scheduling || state.pending.is_empty() {
                    break;
                }
                // Nothing running and nothing startable: the rest are
                // blocked behind failed or skipped dependencies.
                self.skip_blocked(&mut state);
                break;
            }

            let nearest = workers.values().map(|worker| worker.deadline).min();
            let wait = nearest
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or_else(|| Duration::from_millis(50));

            match receiver.recv_timeout(wait.max(Duration::from_millis(1))) {
                Ok((id, result)) => {
                    if abandoned.remove(&id) {
                        // Late report from a timed-out worker; already
                        // accounted for.
                        continue;
                    }
                    if let Some(worker) = workers.remove(&id) {
                        self.pool.release(&worker.requirements);
                    }
                    state.running.remove(&id);
                    if self.bucket(&mut state, id, result) {
                        stop_scheduling = true;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    let expired: Vec<ValidatorId> = workers
                        .iter()
                        .filter(|(_, worker)| worker.deadline <= now)
                        .map(|(id, _)| id.clone())
                        .collect();
                    for id in expired {
                        if let Some(worker) = workers.remove(&id) {
                            self.pool.release(&worker.requirements);
                        }
                        state.running.remove(&id);
                        abandoned.insert(id.clone());
                        let timeout_secs = self
                            .topology
                            .node(&id)
                            .map_or(0, |node| node.definition.timeout_seconds);
                        let mut result = ValidationResult::completed(id.clone(), ValidatorState::Error);
                        result.error_message =
                            Some(format!("timeout after {timeout_secs}s; worker abandoned"));
                        warn!(validator = %id, timeout_secs, "validator timed out");
                        if self.bucket(&mut state, id, result) {
                            stop_scheduling = true;
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        state.completed_at = Some(Timestamp::now());
        info!(
            execution = %state.execution_id,
            completed = state.completed.len(),
            failed = state.failed.len(),
            skipped = state.skipped.len(),
            "pipeline run finished"
        );
        state
    }

    /// Starts every ready validator that fits the pool and worker cap.
    /// Returns true when a bucketed result demands a scheduling stop.
    fn schedule_ready(
        &self,
        state: &mut ExecutionState,
        sender: &mpsc::Sender<(ValidatorId, ValidationResult)>,
        workers: &mut BTreeMap<ValidatorId, RunningWorker>,
    ) -> bool {
        let ready = self.ready_in(state);
        for id in ready {
            if state.running.len() >= self.config.max_workers {
                break;
            }
            let Some(node) = self.topology.node(&id) else {
                continue;
            };
            let requirements = node.definition.resource_requirements;
            if !self.pool.could_ever_fit(&requirements) {
                state.pending.remove(&id);
                let mut result = ValidationResult::completed(id.clone(), ValidatorState::Error);
                result.error_message =
                    Some("resource requirements exceed the total pool".to_string());
                if self.bucket(state, id, result) {
                    return true;
                }
                continue;
            }
            if !self.pool.try_acquire(&requirements) {
                continue;
            }
            state.pending.remove(&id);
            state.running.insert(id.clone());
            let deadline =
                Instant::now() + Duration::from_secs(node.definition.timeout_seconds.max(1));
            workers.insert(
                id.clone(),
                RunningWorker {
                    deadline,
                    requirements,
                },
            );
            self.spawn_worker(id, state.execution_id.clone(), sender.clone());
        }
        false
    }

    /// Returns pending validators whose dependencies are satisfied, in
    /// topology order (priority within depth).
    fn ready_in(&self, state: &ExecutionState) -> Vec<ValidatorId> {
        self.topology
            .execution_order()
            .iter()
            .filter(|id| state.pending.contains(*id))
            .filter(|id| {
                self.topology.node(id).is_some_and(|node| {
                    node.all_dependencies().iter().all(|dep| self.dependency_satisfied(dep, state))
                })
            })
            .cloned()
            .collect()
    }

    /// A dependency is satisfied when completed in this run, or outside
    /// the run entirely with all of its outputs already in the store.
    fn dependency_satisfied(&self, dep: &ValidatorId, state: &ExecutionState) -> bool {
        if state.completed.contains(dep) {
            return true;
        }
        if state.pending.contains(dep)
            || state.running.contains(dep)
            || state.failed.contains(dep)
            || state.skipped.contains(dep)
        {
            return false;
        }
        self.topology.node(dep).is_some_and(|node| {
            node.definition
                .produces_parameters
                .iter()
                .all(|path| self.store.contains(path.as_str()))
        })
    }

    /// Marks every remaining pending validator skipped with a
    /// dependency-failure finding.
    fn skip_blocked(&self, state: &mut ExecutionState) {
        let blocked: Vec<ValidatorId> = state.pending.iter().cloned().collect();
        for id in blocked {
            state.pending.remove(&id);
            self.record_dependency_skip(state, id);
        }
    }

    /// Records one dependency-failure skip result.
    fn record_dependency_skip(&self, state: &mut ExecutionState, id: ValidatorId) {
        let mut result = ValidationResult::completed(id.clone(), ValidatorState::Skipped);
        result.push_finding(Finding::warning(
            "dependency-failure",
            "skipped: upstream dependency failed or was never satisfied",
        ));
        state.skipped.insert(id.clone());
        self.notify_progress(&id, &result);
        state.results.insert(id, result);
    }

    /// Spawns the worker thread for one validator.
    fn spawn_worker(
        &self,
        id: ValidatorId,
        execution_id: ExecutionId,
        sender: mpsc::Sender<(ValidatorId, ValidationResult)>,
    ) {
        let topology = Arc::clone(&self.topology);
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        let cache = Arc::clone(&self.cache);
        let config = self.config.clone();
        std::thread::spawn(move || {
            let result = run_validator_inner(
                &topology, &store, &registry, &config, &cache, &id, &execution_id,
            );
            let _ = sender.send((id, result));
        });
    }

    /// Buckets a completed result per the state-machine table. Returns
    /// true when scheduling must stop.
    fn bucket(&self, state: &mut ExecutionState, id: ValidatorId, result: ValidationResult) -> bool {
        let node = self.topology.node(&id);
        let ttl = node.map_or(3600, |node| node.definition.cache_ttl_seconds);
        let input_hash = result.input_hash.clone();
        let mut stop = false;

        match result.state {
            ValidatorState::Passed | ValidatorState::Warning => {
                state.completed.insert(id.clone());
                if let Some(hash) = &input_hash {
                    if !result.was_cached {
                        self.cache.put(&id, hash, result.clone(), ttl);
                    }
                }
            }
            ValidatorState::Failed => {
                state.failed.insert(id.clone());
                if let Some(hash) = &input_hash {
                    // A negative result is also a result.
                    if !result.was_cached {
                        self.cache.put(&id, hash, result.clone(), ttl);
                    }
                }
                if self.config.stop_on_failure {
                    let successors = self.topology.transitive_successors(&id);
                    let to_skip: Vec<ValidatorId> =
                        successors.into_iter().filter(|succ| state.pending.remove(succ)).collect();
                    for succ in to_skip {
                        self.record_dependency_skip(state, succ);
                    }
                }
            }
            ValidatorState::Error => {
                state.failed.insert(id.clone());
                if self.config.stop_on_fatal_error {
                    state.had_fatal_error = true;
                    state.fatal_error_validator = Some(id.clone());
                    stop = true;
                }
            }
            ValidatorState::Skipped => {
                state.skipped.insert(id.clone());
            }
            ValidatorState::NotImplemented => {
                if self.registry.required().contains(&id) {
                    state.failed.insert(id.clone());
                } else {
                    state.skipped.insert(id.clone());
                }
            }
            ValidatorState::Pending | ValidatorState::Running => {
                // Non-terminal states never come back from a worker;
                // treat defensively as failed.
                state.failed.insert(id.clone());
            }
        }

        self.notify_progress(&id, &result);
        state.results.insert(id, result);
        stop
    }

    /// Fires every registered progress callback.
    fn notify_progress(&self, id: &ValidatorId, result: &ValidationResult) {
        for callback in &self.callbacks {
            callback(id, result);
        }
    }

    /// Runs one validator synchronously, with cache and retry handling.
    fn run_validator(&self, id: &ValidatorId, execution_id: &ExecutionId) -> ValidationResult {
        run_validator_inner(
            &self.topology,
            &self.store,
            &self.registry,
            &self.config,
            &self.cache,
            id,
            execution_id,
        )
    }
}

// ============================================================================
// SECTION: Per-Validator Execution
// ============================================================================

/// Computes the input hash for one validator: a stable hash of the
/// definition fingerprint plus the current value of each declared input
/// path. The validator never observes paths it did not declare.
fn compute_input_hash(definition: &ValidatorDefinition, store: &StateStore) -> Option<String> {
    #[derive(Serialize)]
    /// Hash payload: definition plus declared input snapshot.
    struct InputHashPayload<'a> {
        /// The full definition, hashed as its own fingerprint.
        definition: &'a ValidatorDefinition,
        /// Current values of declared input paths.
        inputs: BTreeMap<&'a str, JsonValue>,
    }

    let inputs: BTreeMap<&str, JsonValue> = definition
        .depends_on_parameters
        .iter()
        .map(|path| {
            (path.as_str(), store.get(path.as_str(), crate::core::StateValue::Null).to_json())
        })
        .collect();
    hash_determinized(
        DEFAULT_HASH_ALGORITHM,
        &InputHashPayload {
            definition,
            inputs,
        },
    )
    .ok()
    .map(|digest| digest.value)
}

/// The per-validator sequence shared by worker threads and
/// `execute_single`: resolve, hash, skip-unchanged, cache, validate with
/// retries.
#[allow(
    clippy::too_many_arguments,
    reason = "Worker threads receive each collaborator separately to avoid a self borrow."
)]
fn run_validator_inner(
    topology: &ValidatorTopology,
    store: &StateStore,
    registry: &ValidatorRegistry,
    config: &ExecutorConfig,
    cache: &ValidationCache,
    id: &ValidatorId,
    execution_id: &ExecutionId,
) -> ValidationResult {
    let Some(node) = topology.node(id) else {
        let mut result = ValidationResult::completed(id.clone(), ValidatorState::Error);
        result.error_message = Some(format!("validator {id} not found in topology"));
        return result;
    };
    let definition = &node.definition;

    let Some(implementation) = registry.instance(id) else {
        let mut result = ValidationResult::completed(id.clone(), ValidatorState::NotImplemented);
        result.error_message = Some(format!("No implementation bound for {id}"));
        return result;
    };

    let input_hash = compute_input_hash(definition, store);

    if config.skip_unchanged {
        let last_run = cache.last_cached_at(id);
        if implementation.should_skip_unchanged(store, last_run) {
            let mut result = ValidationResult::completed(id.clone(), ValidatorState::Skipped);
            result.was_skipped_unchanged = true;
            result.input_hash = input_hash;
            return result;
        }
    }

    if config.skip_cached {
        if let Some(hash) = input_hash.as_deref() {
            if let Some(cached) = cache.get(id, hash) {
                debug!(validator = %id, "cache hit");
                return cached;
            }
        }
    }

    let attempts = definition.max_retries + 1;
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        let ctx = ValidationContext {
            execution_id: execution_id.clone(),
            attempt,
        };
        match implementation.validate(store, &ctx) {
            Ok(mut result) => {
                result.input_hash = input_hash;
                if result.completed_at.is_none() {
                    result.finish(result.state);
                }
                return result;
            }
            Err(err) => {
                last_error = err.to_string();
                if attempt < attempts {
                    debug!(validator = %id, attempt, error = %last_error, "retrying after error");
                    std::thread::sleep(Duration::from_millis(definition.retry_delay_ms));
                }
            }
        }
    }

    let mut result = ValidationResult::completed(id.clone(), ValidatorState::Error);
    result.error_message = Some(last_error);
    result.input_hash = input_hash;
    result
}
