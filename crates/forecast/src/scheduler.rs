use std::sync::Arc;

use demandcast_core::{ForecastRow, TenantId};

use crate::demand::DemandModel;
use crate::job::ForecastJob;
use crate::result::ForecastError;

/// Tenant scope for execution.
///
/// - `Any`: run jobs for any tenant (shared workers).
/// - `Tenant`: only accept jobs for the specified tenant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TenantScope {
    Any,
    Tenant(TenantId),
}

impl TenantScope {
    pub fn allows(&self, tenant_id: TenantId) -> bool {
        match self {
            TenantScope::Any => true,
            TenantScope::Tenant(t) => *t == tenant_id,
        }
    }
}

impl From<Option<TenantId>> for TenantScope {
    fn from(tenant: Option<TenantId>) -> Self {
        tenant.map_or(TenantScope::Any, TenantScope::Tenant)
    }
}

pub trait ForecastScheduler: Send + Sync + 'static {
    fn scope(&self) -> TenantScope;

    fn model(&self) -> &DemandModel;

    fn run<J: ForecastJob>(&self, job: &J) -> Result<Vec<ForecastRow>, ForecastError> {
        let tenant = job.tenant_id();
        if !self.scope().allows(tenant) {
            return Err(ForecastError::TenantScope(format!(
                "job tenant {tenant} not allowed by scheduler"
            )));
        }
        job.run(self.model())
    }
}

/// Synchronous scheduler that runs jobs immediately on the calling thread.
///
/// Cheap to clone; callers fan it out across blocking workers.
#[derive(Clone)]
pub struct LocalForecastScheduler {
    scope: TenantScope,
    model: Arc<DemandModel>,
}

impl LocalForecastScheduler {
    pub fn new(scope: TenantScope, model: Arc<DemandModel>) -> Self {
        Self { scope, model }
    }

    pub fn for_tenant(tenant_id: TenantId, model: Arc<DemandModel>) -> Self {
        Self::new(TenantScope::Tenant(tenant_id), model)
    }
}

impl ForecastScheduler for LocalForecastScheduler {
    fn scope(&self) -> TenantScope {
        self.scope
    }

    fn model(&self) -> &DemandModel {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use demandcast_core::{ProductId, SalesObservation};

    use crate::job::ProductForecastJob;

    fn job(tenant: TenantId) -> ProductForecastJob {
        let d = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        ProductForecastJob::new(tenant, ProductId::new(), vec![SalesObservation::new(d, 4.0)], 2)
    }

    #[test]
    fn rejects_jobs_outside_scope() {
        let allowed = TenantId::new();
        let scheduler = LocalForecastScheduler::for_tenant(allowed, Arc::new(DemandModel::default()));

        assert!(scheduler.run(&job(allowed)).is_ok());
        let err = scheduler.run(&job(TenantId::new())).unwrap_err();
        assert!(matches!(err, ForecastError::TenantScope(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn any_scope_accepts_every_tenant() {
        let scheduler = LocalForecastScheduler::new(TenantScope::Any, Arc::new(DemandModel::default()));
        assert!(scheduler.run(&job(TenantId::new())).is_ok());
        assert_eq!(TenantScope::from(None), TenantScope::Any);
    }
}
