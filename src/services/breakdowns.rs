use std::collections::HashMap;

use crate::db::kpi_queries::{CategoryMarginRow, UserConversionRow, UserLoadRow};
use crate::models::{Breakdowns, CategoryMargin, UserConversion, UserLoad};

/// Folds dimension-keyed storage rows into the breakdown maps.
///
/// Keys are only the dimension values observed in range: a user with no
/// offers in the window is absent from the map, not present with zeros.
pub fn breakdown(
    conversion_rows: Vec<UserConversionRow>,
    load_rows: Vec<UserLoadRow>,
    margin_rows: Vec<CategoryMarginRow>,
) -> Breakdowns {
    let conversion_by_user: HashMap<String, UserConversion> = conversion_rows
        .into_iter()
        .map(|row| {
            let rate = if row.offers > 0 {
                row.won_offers as f64 / row.offers as f64 * 100.0
            } else {
                0.0
            };
            (
                row.user_id.to_string(),
                UserConversion {
                    offers: row.offers,
                    won_offers: row.won_offers,
                    conversion_rate: rate,
                },
            )
        })
        .collect();

    let load_by_user: HashMap<String, UserLoad> = load_rows
        .into_iter()
        .map(|row| {
            (
                row.user_id.to_string(),
                UserLoad {
                    entries: row.entries,
                    total_hours: row.total_hours,
                },
            )
        })
        .collect();

    let margin_by_category: HashMap<String, CategoryMargin> = margin_rows
        .into_iter()
        .map(|row| {
            (
                row.category,
                CategoryMargin {
                    offers: row.offers,
                    average_margin_percentage: row.average_margin_percentage,
                },
            )
        })
        .collect();

    Breakdowns {
        conversion_by_user,
        load_by_user,
        margin_by_category,
    }
}
