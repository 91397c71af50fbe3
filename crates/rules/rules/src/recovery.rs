use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use firerole_state::{RoleId, RoleStore};

use crate::codec::{decode, encode};
use crate::error::RuleError;
use crate::frontend::PolicyFrontend;
use crate::ir::policy::CompiledPolicy;

/// Outcome of a repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Roles whose compiled artifact was rewritten.
    pub repaired: usize,
    /// Roles whose source no longer compiles, with the compile error.
    pub failed: Vec<(RoleId, String)>,
}

/// Loads, stores, and repairs compiled role definitions.
///
/// Decode failures are assumed to be systemic (an IR change makes every
/// stored artifact unreadable at once), so the first one triggers a
/// recompilation of every stored source rather than just the failing role.
/// The repair pass is not transactional; concurrent readers may observe a mix
/// of old and rewritten artifacts.
pub struct RecoveryCoordinator {
    store: Arc<dyn RoleStore>,
    frontend: Arc<dyn PolicyFrontend>,
}

impl RecoveryCoordinator {
    /// Create a coordinator over a role store and the frontend that compiles
    /// its sources.
    pub fn new(store: Arc<dyn RoleStore>, frontend: Arc<dyn PolicyFrontend>) -> Self {
        Self { store, frontend }
    }

    /// Compile a role's source and persist it alongside the encoded result.
    ///
    /// Nothing is written if the source fails to compile.
    #[instrument(skip_all, fields(role = %role))]
    pub async fn store_definition(
        &self,
        role: &RoleId,
        source: &str,
    ) -> Result<CompiledPolicy, RuleError> {
        let policy = self.frontend.compile(source)?;
        let bytes = encode(&policy)?;
        self.store.set(role, &bytes, source).await?;
        debug!(rows = policy.rules.len(), "stored role definition");
        Ok(policy)
    }

    /// Load a role's compiled definition, repairing stored artifacts if it
    /// cannot be decoded.
    ///
    /// Unknown roles and artifacts that are still unreadable after one repair
    /// pass yield [`CompiledPolicy::empty`]. Store failures are returned as
    /// errors.
    #[instrument(skip_all, fields(role = %role))]
    pub async fn load_or_repair(&self, role: &RoleId) -> Result<CompiledPolicy, RuleError> {
        let Some(stored) = self.store.get(role).await? else {
            debug!("role not found, using empty policy");
            return Ok(CompiledPolicy::empty());
        };

        match decode(&stored.compiled) {
            Ok(policy) => return Ok(policy),
            Err(e) if e.is_decode() => {
                warn!(error = %e, "compiled definition unreadable, repairing all roles");
            }
            Err(e) => return Err(e),
        }

        self.repair_all().await?;

        let Some(stored) = self.store.get(role).await? else {
            return Ok(CompiledPolicy::empty());
        };
        match decode(&stored.compiled) {
            Ok(policy) => Ok(policy),
            Err(e) => {
                error!(error = %e, "definition still unreadable after repair, using empty policy");
                Ok(CompiledPolicy::empty())
            }
        }
    }

    /// Recompile every stored source and rewrite its compiled artifact.
    ///
    /// A role whose source fails to compile keeps its old artifact and is
    /// reported in [`RepairReport::failed`]; the pass carries on with the
    /// remaining roles.
    #[instrument(skip_all)]
    pub async fn repair_all(&self) -> Result<RepairReport, RuleError> {
        let mut report = RepairReport::default();

        for (role, source) in self.store.list_all().await? {
            let bytes = match self.frontend.compile(&source).and_then(|p| encode(&p)) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(role = %role, error = %e, "cannot recompile role definition");
                    report.failed.push((role, e.to_string()));
                    continue;
                }
            };
            self.store.set(&role, &bytes, &source).await?;
            report.repaired += 1;
        }

        info!(
            repaired = report.repaired,
            failed = report.failed.len(),
            "repaired role definitions"
        );
        Ok(report)
    }
}
