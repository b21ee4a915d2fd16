//! Ordered catalogue of checks and section headers.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::checks::{Check, CheckContext, Verdict};
use crate::engine::id;
use crate::{AuditError, CheckDescriptor};

/// A catalogue entry: descriptor plus its predicate.
pub struct RegisteredCheck {
    descriptor: CheckDescriptor,
    check: Arc<dyn Check>,
}

impl RegisteredCheck {
    pub fn new(descriptor: CheckDescriptor, check: impl Check + 'static) -> Self {
        RegisteredCheck {
            descriptor,
            check: Arc::new(check),
        }
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    pub fn evaluate(&self, ctx: &CheckContext) -> Result<Verdict, AuditError> {
        self.check.evaluate(ctx)
    }
}

impl fmt::Debug for RegisteredCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCheck")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Group heading, `"N"` or `"N.M"`. Never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionHeader {
    pub id: String,
    pub title: String,
}

/// Catalogue in registration order. Ids are unique across checks and
/// section headers.
#[derive(Debug, Default)]
pub struct CheckRegistry {
    checks: Vec<Arc<RegisteredCheck>>,
    sections: Vec<SectionHeader>,
    ids: HashSet<String>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section header.
    pub fn section(
        &mut self,
        id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<&mut Self, AuditError> {
        let id = id.into();
        if id::depth(&id) > 2 {
            return Err(AuditError::Catalogue {
                id,
                reason: "section headers are at most two levels deep".to_string(),
            });
        }
        self.claim(&id)?;
        self.sections.push(SectionHeader {
            id,
            title: title.into(),
        });
        Ok(self)
    }

    /// Register a check.
    pub fn register(
        &mut self,
        descriptor: CheckDescriptor,
        check: impl Check + 'static,
    ) -> Result<&mut Self, AuditError> {
        if descriptor.level > 2 {
            return Err(AuditError::Catalogue {
                id: descriptor.id,
                reason: format!("level must be 0, 1 or 2 (got {})", descriptor.level),
            });
        }
        self.claim(&descriptor.id)?;
        self.checks
            .push(Arc::new(RegisteredCheck::new(descriptor, check)));
        Ok(self)
    }

    fn claim(&mut self, check_id: &str) -> Result<(), AuditError> {
        if !id::is_valid(check_id) {
            return Err(AuditError::Catalogue {
                id: check_id.to_string(),
                reason: "ids are dot-separated alphanumeric segments".to_string(),
            });
        }
        if !self.ids.insert(check_id.to_string()) {
            return Err(AuditError::Catalogue {
                id: check_id.to_string(),
                reason: "duplicate id".to_string(),
            });
        }
        Ok(())
    }

    /// Checks in catalogue order
    pub fn checks(&self) -> &[Arc<RegisteredCheck>] {
        &self.checks
    }

    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn get(&self, check_id: &str) -> Option<&Arc<RegisteredCheck>> {
        self.checks
            .iter()
            .find(|entry| entry.descriptor.id == check_id)
    }
}
