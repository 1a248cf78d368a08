use std::sync::Arc;

use crate::services::kpi_policy::KpiPolicy;
use crate::store::KpiStore;

#[derive(Clone)]
pub struct AppState {
    pub kpi_store: Arc<dyn KpiStore>,
    pub kpi_policy: Arc<KpiPolicy>,
}
