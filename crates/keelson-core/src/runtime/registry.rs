// crates/keelson-core/src/runtime/registry.rs
// ============================================================================
// Module: Keelson Validator Registry
// Description: Maps validator ids to bound implementations with lifecycle control.
// Purpose: Refuse pipeline startup when required validators lack implementations.
// Dependencies: crate::core, crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! Two-layer structure: factory registration (id to constructor) and an
//! instance cache (id to bound implementation). The mandatory calling
//! order is `reset`, register, `instantiate_all`, `validate_required`.
//! Marking an id required means the pipeline must refuse to start if no
//! implementation was registered or the factory failed — silently
//! skipping a required validator historically allowed a gate to pass
//! without ever being checked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::core::ValidatorId;
use crate::interfaces::Validator;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised during registry lifecycle steps.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A validator factory failed to construct its implementation.
    #[error("validator {id} failed to instantiate: {reason}")]
    InstantiationFailed {
        /// Validator that failed to instantiate.
        id: ValidatorId,
        /// Failure description from the factory.
        reason: String,
    },
    /// Required validators lack implementations or instances.
    #[error("required validators missing implementations: {missing:?}")]
    MissingRequired {
        /// Required ids with no usable instance.
        missing: Vec<ValidatorId>,
    },
}

// ============================================================================
// SECTION: Validator Registry
// ============================================================================

/// Constructor for a validator implementation.
pub type ValidatorFactory = Box<dyn Fn() -> Result<Box<dyn Validator>, String> + Send + Sync>;

/// Central registry for validator implementations.
#[derive(Default)]
pub struct ValidatorRegistry {
    /// Registered constructors by validator id.
    factories: BTreeMap<ValidatorId, ValidatorFactory>,
    /// Instantiated implementations by validator id.
    instances: BTreeMap<ValidatorId, Arc<dyn Validator>>,
    /// Ids that must have a usable instance before the pipeline starts.
    required: BTreeSet<ValidatorId>,
}

impl ValidatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all registrations, instances, and required marks.
    ///
    /// Must precede re-registration in each process or test to prevent
    /// state leakage across workers.
    pub fn reset(&mut self) {
        self.factories.clear();
        self.instances.clear();
        self.required.clear();
        debug!("validator registry reset");
    }

    /// Registers a constructor for a validator id.
    pub fn register(&mut self, id: ValidatorId, factory: ValidatorFactory) {
        self.factories.insert(id, factory);
    }

    /// Registers an already-constructed implementation.
    pub fn register_instance(&mut self, id: ValidatorId, instance: Arc<dyn Validator>) {
        self.instances.insert(id, instance);
    }

    /// Marks a validator id as required.
    pub fn mark_required(&mut self, id: ValidatorId) {
        self.required.insert(id);
    }

    /// Instantiates every registered factory, returning the instance count.
    ///
    /// Factory failures are logged and skipped here; `validate_required`
    /// turns failures on required ids into hard errors.
    pub fn instantiate_all(&mut self) -> usize {
        let ids: Vec<ValidatorId> = self.factories.keys().cloned().collect();
        for id in ids {
            if self.instances.contains_key(&id) {
                continue;
            }
            match self.factories.get(&id).map(|factory| factory()) {
                Some(Ok(instance)) => {
                    debug!(validator = %id, "instantiated");
                    self.instances.insert(id, Arc::from(instance));
                }
                Some(Err(reason)) => {
                    warn!(validator = %id, %reason, "failed to instantiate");
                }
                None => {}
            }
        }
        self.instances.len()
    }

    /// Verifies every required id has a usable instance.
    ///
    /// Call `instantiate_all` first so factory failures are visible here.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingRequired`] naming every required
    /// id without an instance.
    pub fn validate_required(&self) -> Result<(), RegistryError> {
        let missing: Vec<ValidatorId> = self
            .required
            .iter()
            .filter(|id| !self.instances.contains_key(*id))
            .cloned()
            .collect();
        if missing.is_empty() {
            debug!(count = self.required.len(), "all required validators verified");
            Ok(())
        } else {
            Err(RegistryError::MissingRequired { missing })
        }
    }

    /// Returns the instance bound to `id`, when one exists.
    #[must_use]
    pub fn instance(&self, id: &ValidatorId) -> Option<Arc<dyn Validator>> {
        self.instances.get(id).cloned()
    }

    /// Returns true when an instance is bound for `id`.
    #[must_use]
    pub fn has_instance(&self, id: &ValidatorId) -> bool {
        self.instances.contains_key(id)
    }

    /// Returns all instantiated validators.
    #[must_use]
    pub fn instances(&self) -> &BTreeMap<ValidatorId, Arc<dyn Validator>> {
        &self.instances
    }

    /// Returns the required id set.
    #[must_use]
    pub fn required(&self) -> &BTreeSet<ValidatorId> {
        &self.required
    }
}
