// Per-crop revenue, cost and margin.
use crate::params::ParamLookup;
use crate::types::{CostedProduction, CropEconomicSummary, EconomicParams};
use std::cmp::Ordering;

/// Economics of one merged production record.
///
/// Missing area or yield is read as 0. A zero (or negative) harvested area
/// yields a zero unit cost instead of a division error; nothing else is
/// guarded, so negative yields flow straight through.
pub fn compute(costed: &CostedProduction, p: &EconomicParams) -> CropEconomicSummary {
    let r = &costed.record;
    let area = r.harvested_area_ha.unwrap_or(0.0);
    let yield_tn = r.yield_tn_per_ha.unwrap_or(0.0);

    let gross_revenue_per_ha = yield_tn * p.gross_price_usd_per_tn;
    let net_revenue_per_ha = yield_tn * p.net_price_usd_per_tn;
    let freight_per_ha = yield_tn * p.freight_usd_per_tn;
    let unit_cost_per_ha = if area > 0.0 {
        costed.total_cost / area
    } else {
        0.0
    };
    let final_income_per_ha =
        net_revenue_per_ha - freight_per_ha - p.rent_usd_per_ha - unit_cost_per_ha;
    let final_income_total = final_income_per_ha * area;
    let total_cost_per_ha = unit_cost_per_ha + p.rent_usd_per_ha + freight_per_ha;
    let margin_per_ha = net_revenue_per_ha - total_cost_per_ha;

    CropEconomicSummary {
        species: r.species.clone(),
        crop: r.crop.clone(),
        field: r.field.clone(),
        harvested_area_ha: area,
        yield_tn_per_ha: yield_tn,
        gross_revenue_per_ha,
        net_revenue_per_ha,
        total_cost: costed.total_cost,
        freight_per_ha,
        rent_per_ha: p.rent_usd_per_ha,
        final_income_per_ha,
        final_income_total,
        unit_cost_per_ha,
        total_cost_per_ha,
        margin_per_ha,
    }
}

pub fn compute_all(costed: &[CostedProduction], params: &impl ParamLookup) -> Vec<CropEconomicSummary> {
    costed
        .iter()
        .map(|c| compute(c, &params.params_for(&c.record.species)))
        .collect()
}

/// Display order: highest total final income first.
pub fn ranked(summaries: &[CropEconomicSummary]) -> Vec<CropEconomicSummary> {
    let mut sorted = summaries.to_vec();
    sorted.sort_by(|a, b| {
        b.final_income_total
            .partial_cmp(&a.final_income_total)
            .unwrap_or(Ordering::Equal)
    });
    sorted
}
