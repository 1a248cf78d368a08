mod kpi;

pub use kpi::*;
