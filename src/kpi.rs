// Headline numbers for the dashboard, always derived from the unfiltered data

use crate::data::Dataset;
use crate::filter::{country_label, distinct_countries};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_medals: f64,
    pub country_count: usize,
    /// Country (or code) of the first record holding the largest `total`.
    pub leader: Option<String>,
    pub leader_total: f64,
    pub latest_year: Option<i32>,
    /// `total` of the first record carrying the largest `year`.
    pub latest_year_total: f64,
}

/// Compute every headline from one dataset. Empty input yields the zeroed default.
pub fn compute(dataset: &Dataset) -> Kpis {
    compute_with_participation(dataset, dataset)
}

/// Medal headlines from `medals`; the latest-year figure from `participation`
/// (an athletes-per-year series).
#[tracing::instrument(level = "debug", skip_all, fields(medals = medals.len(), participation = participation.len()))]
pub fn compute_with_participation(medals: &Dataset, participation: &Dataset) -> Kpis {
    let mut kpis = Kpis {
        total_medals: medals.iter().map(|r| r.number_or("total", 0.0)).sum(),
        country_count: distinct_countries(medals),
        ..Kpis::default()
    };

    // Strict `>` keeps the first occurrence on ties.
    let mut best: Option<f64> = None;
    for record in medals {
        let total = record.number_or("total", 0.0);
        if best.map_or(true, |b| total > b) {
            best = Some(total);
            kpis.leader = country_label(record);
            kpis.leader_total = total;
        }
    }

    let mut latest: Option<f64> = None;
    for record in participation {
        let Some(year) = record.number("year") else {
            continue;
        };
        if latest.map_or(true, |l| year > l) {
            latest = Some(year);
            kpis.latest_year = Some(year.round() as i32);
            kpis.latest_year_total = record.number_or("total", 0.0);
        }
    }

    tracing::debug!(total = kpis.total_medals, countries = kpis.country_count, "kpis computed");
    kpis
}
