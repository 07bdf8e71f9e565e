// Page-level state: base data, current filters, and every mounted view

use crate::chart::ChartKind;
use crate::data::{medals_per_million, Dataset};
use crate::filter::{self, Aggregates, FacetOptions, FilterOutcome, FilterSpec};
use crate::kpi::{self, Kpis};
use crate::view::ChartView;

/// Owns the base dataset and re-derives everything downstream of a filter change.
///
/// KPIs are computed once from the unfiltered data; the filtered dataset and every
/// view's geometry are rebuilt from scratch on each [`Dashboard::set_filters`].
/// With a population table attached, scatter views draw the filtered medals joined
/// against it instead of the raw records.
#[derive(Debug, Clone)]
pub struct Dashboard {
    base: Dataset,
    participation: Option<Dataset>,
    population: Option<Dataset>,
    per_million: Option<Dataset>,
    filters: FilterSpec,
    outcome: FilterOutcome,
    kpis: Kpis,
    views: Vec<ChartView>,
}

impl Dashboard {
    pub fn new(base: Dataset) -> Self {
        Self::with_participation(base, None)
    }

    pub fn with_participation(base: Dataset, participation: Option<Dataset>) -> Self {
        let kpis = match &participation {
            Some(p) => kpi::compute_with_participation(&base, p),
            None => kpi::compute(&base),
        };
        let outcome = FilterOutcome {
            dataset: base.clone(),
            aggregates: Aggregates::of(&base),
        };
        Self {
            base,
            participation,
            population: None,
            per_million: None,
            filters: FilterSpec::default(),
            outcome,
            kpis,
            views: Vec::new(),
        }
    }

    /// Attach a population table used by scatter views.
    pub fn with_population(mut self, population: Option<Dataset>) -> Self {
        self.population = population;
        self.per_million = self
            .population
            .as_ref()
            .map(|p| medals_per_million(&self.outcome.dataset, p));
        self
    }

    /// Data a view draws: the filtered records, or their population join for scatter views.
    fn data_for(&self, view: &ChartView) -> &Dataset {
        match (&self.per_million, view.spec().map(|s| s.kind())) {
            (Some(joined), Some(ChartKind::Scatter)) => joined,
            _ => &self.outcome.dataset,
        }
    }

    /// Add a view and draw it with the current filtered data. Returns its index.
    pub fn mount(&mut self, mut view: ChartView) -> usize {
        let data = self.data_for(&view);
        view.update(data);
        self.views.push(view);
        self.views.len() - 1
    }

    /// Replace the filters and rebuild the filtered data and all views.
    pub fn set_filters(&mut self, filters: FilterSpec) -> &FilterOutcome {
        self.outcome = filter::apply(&self.base, &filters);
        self.filters = filters;
        self.per_million = self
            .population
            .as_ref()
            .map(|p| medals_per_million(&self.outcome.dataset, p));
        let mut views = std::mem::take(&mut self.views);
        for view in &mut views {
            let data = self.data_for(view);
            view.update(data);
        }
        self.views = views;
        tracing::debug!(
            active = self.filters.active_count(),
            results = self.outcome.dataset.len(),
            views = self.views.len(),
            "filters changed"
        );
        &self.outcome
    }

    pub fn clear_filters(&mut self) -> &FilterOutcome {
        self.set_filters(FilterSpec::default())
    }

    pub fn base(&self) -> &Dataset {
        &self.base
    }

    pub fn participation(&self) -> Option<&Dataset> {
        self.participation.as_ref()
    }

    /// Filtered medals joined with the population table, when one is attached.
    pub fn per_million(&self) -> Option<&Dataset> {
        self.per_million.as_ref()
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn filtered(&self) -> &Dataset {
        &self.outcome.dataset
    }

    pub fn aggregates(&self) -> &Aggregates {
        &self.outcome.aggregates
    }

    pub fn kpis(&self) -> &Kpis {
        &self.kpis
    }

    /// Filter status line shown above the charts.
    pub fn summary(&self) -> String {
        self.filters.summary(self.outcome.dataset.len())
    }

    /// Options for the filter controls, always taken from the base data.
    pub fn facet_options(&self) -> FacetOptions {
        FacetOptions::of(&self.base)
    }

    pub fn views(&self) -> &[ChartView] {
        &self.views
    }

    pub fn view_mut(&mut self, index: usize) -> Option<&mut ChartView> {
        self.views.get_mut(index)
    }
}
