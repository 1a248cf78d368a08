pub(crate) mod kpi;
