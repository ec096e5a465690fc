// One economic analysis pass: filter, aggregate, merge, compute margins.
use crate::aggregate::{breakdown_rows, costs_by_crop, costs_by_crop_and_type, merge_costs};
use crate::filter::{restrict_to_crops, ProductionSelection};
use crate::margin::compute_all;
use crate::params::ParamLookup;
use crate::types::{CostBreakdownRow, CostLine, CropEconomicSummary, EconomicTotals, ProductionRecord};
use crate::util::average;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct EconomicAnalysis {
    /// One entry per filtered production record, in source order.
    pub summaries: Vec<CropEconomicSummary>,
    pub cost_breakdown: Vec<CostBreakdownRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// The selection left no production rows; nothing was computed.
    NoData,
    Ready(EconomicAnalysis),
}

/// Species present in the production rows that pass `selection`, sorted.
pub fn selected_species(production: &[ProductionRecord], selection: &ProductionSelection) -> Vec<String> {
    production
        .iter()
        .filter(|r| selection.matches(r))
        .map(|r| r.species.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn analyze(
    production: &[ProductionRecord],
    costs: &[CostLine],
    selection: &ProductionSelection,
    params: &impl ParamLookup,
) -> Analysis {
    let filtered = selection.apply(production);
    if filtered.is_empty() {
        info!("selection left no production rows");
        return Analysis::NoData;
    }
    let costs = restrict_to_crops(costs, &filtered);
    debug!(
        production = filtered.len(),
        cost_lines = costs.len(),
        "running economic pass"
    );

    let totals = costs_by_crop(&costs);
    let breakdown = costs_by_crop_and_type(&costs);
    let merged = merge_costs(&filtered, &totals);
    let summaries = compute_all(&merged, params);

    Analysis::Ready(EconomicAnalysis {
        summaries,
        cost_breakdown: breakdown_rows(&breakdown),
    })
}

pub fn totals(analysis: &EconomicAnalysis) -> EconomicTotals {
    let s = &analysis.summaries;
    let species: HashSet<&str> = s.iter().map(|r| r.species.as_str()).collect();
    EconomicTotals {
        total_crops: s.len(),
        total_species: species.len(),
        total_harvested_area_ha: s.iter().map(|r| r.harvested_area_ha).sum(),
        total_work_order_cost: s.iter().map(|r| r.total_cost).sum(),
        total_final_income: s.iter().map(|r| r.final_income_total).sum(),
        avg_margin_per_ha: average(&s.iter().map(|r| r.margin_per_ha).collect::<Vec<_>>()),
    }
}
