// crates/keelson-core/src/core/taxonomy.rs
// ============================================================================
// Module: Keelson Validator Taxonomy
// Description: Validator definitions, findings, results, and resource types.
// Purpose: Declare the immutable vocabulary shared by topology, executor, and gates.
// Dependencies: crate::core::{identifiers, phase, time, value}, serde
// ============================================================================

//! ## Overview
//! The taxonomy is the shared vocabulary of the pipeline: what a
//! validator declares about itself, what one run of it produced, and the
//! closed enumerations those records are built from. The
//! `failed`/`error` split in [`ValidatorState`] is load-bearing: `failed`
//! is a statement about the design (never retried), `error` is a
//! statement about the code or environment (retried, may stop the run).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ParamPath;
use crate::core::identifiers::ValidatorId;
use crate::core::phase::PhaseId;
use crate::core::time::Timestamp;
use crate::core::value::StateValue;

// ============================================================================
// SECTION: Closed Enumerations
// ============================================================================

/// Category of computation a validator performs.
///
/// # Invariants
/// - Variants are stable for serialization and catalog export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorCategory {
    /// Physics computations (hydrostatics, resistance).
    Physics,
    /// Parameter bounds and envelope checks.
    Bounds,
    /// Classification-society rule checks.
    ClassRules,
    /// Stability computations.
    Stability,
    /// Arrangement generation and checks.
    Arrangement,
    /// Production planning.
    Production,
    /// Cost estimation.
    Cost,
    /// Regulatory compliance.
    Compliance,
}

/// Scheduling priority; also the first scheduling tie-break key.
///
/// # Invariants
/// - Variant order is the priority order; `Critical` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorPriority {
    /// Must run as early as possible.
    Critical,
    /// Runs before normal work.
    High,
    /// Default priority.
    Normal,
    /// Best-effort work.
    Low,
}

/// Whether a gate condition blocks or merely warns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRequirement {
    /// A non-passing result blocks the gate.
    Required,
    /// A non-passing result produces a warning only.
    Optional,
}

/// Outcome state of a validator run.
///
/// # Invariants
/// - `Failed` means validation failure (bad inputs or rejected outputs)
///   and is never retried; `Error` means code or environment failure and
///   is retried up to the definition's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorState {
    /// Scheduled, not yet started.
    Pending,
    /// Currently executing.
    Running,
    /// Completed with no findings above info.
    Passed,
    /// Completed with non-blocking findings.
    Warning,
    /// Validation failure; the design is wrong, not the code.
    Failed,
    /// Code or environment failure.
    Error,
    /// Inputs unchanged and a cached result exists.
    Skipped,
    /// Declared in the topology but no implementation bound.
    NotImplemented,
}

impl ValidatorState {
    /// Returns the stable snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Warning => "warning",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Skipped => "skipped",
            Self::NotImplemented => "not_implemented",
        }
    }

    /// Returns true for states the gate counts as success.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Passed | Self::Warning)
    }

    /// Returns true for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

/// Severity of one finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSeverity {
    /// Check passed.
    Passed,
    /// Informational note.
    Info,
    /// Non-blocking concern.
    Warning,
    /// Blocking defect.
    Error,
    /// Blocking defect requiring immediate attention.
    Critical,
}

// ============================================================================
// SECTION: Resource Requirements
// ============================================================================

/// Resources a validator needs to run.
///
/// # Invariants
/// - The scheduler refuses to start a validator whose requirements do
///   not fit the currently available pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    /// CPU cores required.
    pub cpu_cores: u32,
    /// RAM required in gigabytes.
    pub ram_gb: f64,
    /// Whether a GPU is required.
    pub gpu_required: bool,
}

impl Default for ResourceRequirements {
    fn default() -> Self {
        Self {
            cpu_cores: 1,
            ram_gb: 0.5,
            gpu_required: false,
        }
    }
}

// ============================================================================
// SECTION: Validator Definition
// ============================================================================

/// Immutable declaration of one validator.
///
/// # Invariants
/// - `id` is unique within a process.
/// - Every path in `produces_parameters` is produced by exactly one
///   validator across the whole topology.
/// - The input hash of a run depends only on this definition and the
///   current values of `depends_on_parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorDefinition {
    /// Validator identifier (`"<phase>/<name>"`).
    pub id: ValidatorId,
    /// Human-readable name.
    pub name: String,
    /// Short description of what the validator checks or computes.
    pub description: String,
    /// Computation category.
    pub category: ValidatorCategory,
    /// Scheduling priority.
    pub priority: ValidatorPriority,
    /// Canonical phase this validator belongs to.
    pub phase: PhaseId,
    /// Whether the phase gate inspects this validator.
    pub is_gate_condition: bool,
    /// Whether a non-passing result blocks the gate or only warns.
    pub gate_requirement: GateRequirement,
    /// Validators this one must run after (explicit edges).
    pub depends_on_validators: Vec<ValidatorId>,
    /// State paths read by this validator.
    pub depends_on_parameters: Vec<ParamPath>,
    /// State paths written by this validator.
    pub produces_parameters: Vec<ParamPath>,
    /// Resources required to run.
    pub resource_requirements: ResourceRequirements,
    /// Wall-clock timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum retries after an execution error.
    pub max_retries: u32,
    /// Delay between retries in milliseconds.
    pub retry_delay_ms: u64,
    /// Cache time-to-live in seconds for results of this validator.
    pub cache_ttl_seconds: u64,
}

impl ValidatorDefinition {
    /// Creates a definition with default scheduling and cache settings.
    #[must_use]
    pub fn new(
        id: impl Into<ValidatorId>,
        name: impl Into<String>,
        phase: PhaseId,
        category: ValidatorCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            priority: ValidatorPriority::Normal,
            phase,
            is_gate_condition: false,
            gate_requirement: GateRequirement::Optional,
            depends_on_validators: Vec::new(),
            depends_on_parameters: Vec::new(),
            produces_parameters: Vec::new(),
            resource_requirements: ResourceRequirements::default(),
            timeout_seconds: 300,
            max_retries: 0,
            retry_delay_ms: 100,
            cache_ttl_seconds: 3600,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the scheduling priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: ValidatorPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the validator as a gate condition with the given requirement.
    #[must_use]
    pub const fn as_gate(mut self, requirement: GateRequirement) -> Self {
        self.is_gate_condition = true;
        self.gate_requirement = requirement;
        self
    }

    /// Adds explicit validator dependencies.
    #[must_use]
    pub fn depends_on(mut self, ids: impl IntoIterator<Item = ValidatorId>) -> Self {
        self.depends_on_validators.extend(ids);
        self
    }

    /// Adds parameter dependencies.
    #[must_use]
    pub fn reads(mut self, paths: impl IntoIterator<Item = ParamPath>) -> Self {
        self.depends_on_parameters.extend(paths);
        self
    }

    /// Adds produced parameters.
    #[must_use]
    pub fn writes(mut self, paths: impl IntoIterator<Item = ParamPath>) -> Self {
        self.produces_parameters.extend(paths);
        self
    }

    /// Sets the retry policy for execution errors.
    #[must_use]
    pub const fn with_retries(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Sets the resource requirements.
    #[must_use]
    pub const fn with_resources(mut self, requirements: ResourceRequirements) -> Self {
        self.resource_requirements = requirements;
        self
    }
}

// ============================================================================
// SECTION: Findings
// ============================================================================

/// One observation from a validator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Finding identifier, unique within the run.
    pub finding_id: String,
    /// Severity of the observation.
    pub severity: ResultSeverity,
    /// Human-readable message.
    pub message: String,
    /// Parameter path the finding refers to, when applicable.
    pub parameter: Option<ParamPath>,
    /// Expected value, when applicable.
    pub expected: Option<StateValue>,
    /// Actual value, when applicable.
    pub actual: Option<StateValue>,
    /// Regulation or rule reference, when applicable.
    pub reference: Option<String>,
    /// Suggested remediation, when applicable.
    pub suggestion: Option<String>,
}

impl Finding {
    /// Creates a finding with only an identifier, severity, and message.
    #[must_use]
    pub fn new(
        finding_id: impl Into<String>,
        severity: ResultSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            finding_id: finding_id.into(),
            severity,
            message: message.into(),
            parameter: None,
            expected: None,
            actual: None,
            reference: None,
            suggestion: None,
        }
    }

    /// Creates an error-severity finding.
    #[must_use]
    pub fn error(finding_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(finding_id, ResultSeverity::Error, message)
    }

    /// Creates a warning-severity finding.
    #[must_use]
    pub fn warning(finding_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(finding_id, ResultSeverity::Warning, message)
    }

    /// Attaches the parameter path the finding refers to.
    #[must_use]
    pub fn on_parameter(mut self, path: impl Into<ParamPath>) -> Self {
        self.parameter = Some(path.into());
        self
    }

    /// Attaches expected and actual values.
    #[must_use]
    pub fn with_values(mut self, expected: StateValue, actual: StateValue) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }
}

// ============================================================================
// SECTION: Validation Result
// ============================================================================

/// Outcome of one validator run.
///
/// # Invariants
/// - `input_hash` is the hash the run was produced under; cached copies
///   carry the original hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Validator that produced this result.
    pub validator_id: ValidatorId,
    /// Outcome state.
    pub state: ValidatorState,
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run completed, if it did.
    pub completed_at: Option<Timestamp>,
    /// Execution time in milliseconds.
    pub execution_time_ms: u64,
    /// Findings captured during the run.
    pub findings: Vec<Finding>,
    /// Error message for `failed`/`error` states, when available.
    pub error_message: Option<String>,
    /// Diagnostic backtrace text, when available.
    pub traceback: Option<String>,
    /// Input hash the run was produced under.
    pub input_hash: Option<String>,
    /// Whether the result was served from the cache.
    pub was_cached: bool,
    /// Whether the run was skipped because inputs were unchanged.
    pub was_skipped_unchanged: bool,
}

impl ValidationResult {
    /// Creates a result in the given state with start time now.
    #[must_use]
    pub fn started(validator_id: ValidatorId, state: ValidatorState) -> Self {
        Self {
            validator_id,
            state,
            started_at: Timestamp::now(),
            completed_at: None,
            execution_time_ms: 0,
            findings: Vec::new(),
            error_message: None,
            traceback: None,
            input_hash: None,
            was_cached: false,
            was_skipped_unchanged: false,
        }
    }

    /// Creates a completed result in the given state.
    #[must_use]
    pub fn completed(validator_id: ValidatorId, state: ValidatorState) -> Self {
        let mut result = Self::started(validator_id, state);
        result.completed_at = Some(result.started_at);
        result
    }

    /// Marks the result complete, stamping the completion time.
    pub fn finish(&mut self, state: ValidatorState) {
        let now = Timestamp::now();
        self.state = state;
        self.completed_at = Some(now);
        self.execution_time_ms = now.millis_since(self.started_at);
    }

    /// Appends a finding.
    pub fn push_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Returns true when any finding is at or above error severity.
    #[must_use]
    pub fn has_blocking_findings(&self) -> bool {
        self.findings.iter().any(|finding| finding.severity >= ResultSeverity::Error)
    }
}
