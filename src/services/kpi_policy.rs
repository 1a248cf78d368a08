/// Business policy constants for the consolidated KPI report. Defaults come
/// from product; change them only with product sign-off.
#[derive(Debug, Clone)]
pub struct KpiPolicy {
    /// A task is on time when its slip is at most this many days.
    pub on_time_slip_days: i64,
    /// Contractual weekly capacity per staff member, in hours.
    pub weekly_capacity_hours: f64,
    /// Offer statuses counted as won.
    pub won_statuses: Vec<String>,
    /// Offer statuses whose expected amount counts toward forecast revenue.
    pub active_statuses: Vec<String>,
}

impl Default for KpiPolicy {
    fn default() -> Self {
        Self {
            on_time_slip_days: 1,
            weekly_capacity_hours: 35.0,
            won_statuses: vec!["won".to_string(), "signed".to_string()],
            active_statuses: vec![
                "draft".to_string(),
                "sent".to_string(),
                "negotiation".to_string(),
                "won".to_string(),
                "signed".to_string(),
            ],
        }
    }
}
