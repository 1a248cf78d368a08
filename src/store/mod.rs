mod kpi_store;
mod pg_kpi_store;

pub use kpi_store::KpiStore;
pub use pg_kpi_store::PgKpiStore;
