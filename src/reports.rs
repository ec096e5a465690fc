use crate::types::{
    BudgetComparisonRow, BudgetLine, CompanyCropHarvestRow, CostLine, CostLineRow, CropCostRow,
    DailyHarvestRow, HarvestLoad, InputTypeCostRow, ItemCostRow, ProductionRecord, ProductionRow,
    ShareRow,
};
use crate::util::{average, format_number, format_opt, normalize_key, ratio_or_zero, round_to};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Items beyond this rank are folded into a single "Otros" row.
const TOP_ITEMS: usize = 15;
const OTHER_ITEMS: &str = "Otros";

pub fn production_rows(records: &[ProductionRecord]) -> Vec<ProductionRow> {
    records
        .iter()
        .map(|r| ProductionRow {
            crop: r.crop.clone(),
            species: r.species.clone(),
            field: r.field.clone(),
            harvested_area: format_opt(r.harvested_area_ha, 2),
            progress: format_opt(r.progress_pct, 1),
            tons_field: format_opt(r.tons_field, 2),
            yield_conditioned: format_opt(r.yield_tn_per_ha, 2),
        })
        .collect()
}

/// Field tonnage per group and its share of the filtered total, largest first.
pub fn production_shares<F>(records: &[ProductionRecord], key: F) -> Vec<ShareRow>
where
    F: Fn(&ProductionRecord) -> &str,
{
    let mut tons: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records {
        *tons.entry(key(r)).or_insert(0.0) += r.tons_field.unwrap_or(0.0);
    }
    let total: f64 = tons.values().sum();
    let mut groups: Vec<(&str, f64)> = tons.into_iter().collect();
    groups.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    groups
        .into_iter()
        .map(|(group, t)| ShareRow {
            group: group.to_string(),
            tons: format_number(t, 2),
            share_pct: format_number(ratio_or_zero(t, total) * 100.0, 2),
        })
        .collect()
}

/// Per-day kilograms with the running total of delivered (final) kilograms.
pub fn harvest_daily(loads: &[HarvestLoad]) -> Vec<DailyHarvestRow> {
    let mut days: BTreeMap<chrono::NaiveDate, (f64, f64, f64)> = BTreeMap::new();
    for l in loads {
        let e = days.entry(l.date).or_insert((0.0, 0.0, 0.0));
        e.0 += l.kg_origin.unwrap_or(0.0);
        e.1 += l.kg_final.unwrap_or(0.0);
        e.2 += l.diff_kg.unwrap_or(0.0);
    }
    let mut cumulative = 0.0;
    days.into_iter()
        .map(|(date, (origin, fin, diff))| {
            cumulative += fin;
            DailyHarvestRow {
                date: date.format("%Y-%m-%d").to_string(),
                kg_origin: format_number(origin, 0),
                kg_final: format_number(fin, 0),
                diff_kg: format_number(diff, 0),
                cumulative_kg: format_number(cumulative, 0),
            }
        })
        .collect()
}

/// Shrinkage per company and crop; the percentage is shrink over origin kilograms.
pub fn harvest_by_company_crop(loads: &[HarvestLoad]) -> Vec<CompanyCropHarvestRow> {
    let mut groups: BTreeMap<(&str, &str), (f64, f64, f64)> = BTreeMap::new();
    for l in loads {
        let e = groups
            .entry((l.company.as_str(), l.crop.as_str()))
            .or_insert((0.0, 0.0, 0.0));
        e.0 += l.kg_origin.unwrap_or(0.0);
        e.1 += l.kg_final.unwrap_or(0.0);
        e.2 += l.diff_kg.unwrap_or(0.0);
    }
    groups
        .into_iter()
        .map(|((company, crop), (origin, fin, diff))| CompanyCropHarvestRow {
            company: company.to_string(),
            crop: crop.to_string(),
            kg_origin: format_number(origin, 0),
            kg_final: format_number(fin, 0),
            diff_kg: format_number(diff, 0),
            diff_pct: format_number(ratio_or_zero(diff, origin) * 100.0, 2),
        })
        .collect()
}

/// Cost lines of one crop with the surface used to spread them per hectare.
struct CropCosts<'a> {
    crop: &'a str,
    surface: f64,
    lines: Vec<&'a CostLine>,
}

/// Group by crop and keep crops whose first reported surface is positive.
fn crops_with_surface(lines: &[CostLine]) -> Vec<CropCosts<'_>> {
    let mut by_crop: BTreeMap<&str, Vec<&CostLine>> = BTreeMap::new();
    for l in lines {
        by_crop.entry(l.crop.as_str()).or_default().push(l);
    }
    by_crop
        .into_iter()
        .filter_map(|(crop, lines)| {
            let surface = lines.iter().find_map(|l| l.surface_ha)?;
            (surface > 0.0).then_some(CropCosts { crop, surface, lines })
        })
        .collect()
}

fn sum_by<'a, F>(lines: &[&'a CostLine], key: F) -> BTreeMap<String, f64>
where
    F: Fn(&'a CostLine) -> String,
{
    let mut totals = BTreeMap::new();
    for &l in lines {
        *totals.entry(key(l)).or_insert(0.0) += l.total_cost.unwrap_or(0.0);
    }
    totals
}

pub fn crop_costs_per_ha(lines: &[CostLine]) -> Vec<CropCostRow> {
    let mut rows: Vec<(f64, CropCostRow)> = crops_with_surface(lines)
        .into_iter()
        .map(|c| {
            let total: f64 = c.lines.iter().map(|l| l.total_cost.unwrap_or(0.0)).sum();
            let usd_ha = total / c.surface;
            let row = CropCostRow {
                crop: c.crop.to_string(),
                surface_ha: format_number(c.surface, 2),
                total_cost: format_number(total, 2),
                usd_per_ha: format_number(usd_ha, 2),
            };
            (usd_ha, row)
        })
        .collect();
    rows.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    rows.into_iter().map(|(_, row)| row).collect()
}

pub fn input_type_costs_per_ha(lines: &[CostLine]) -> Vec<InputTypeCostRow> {
    let mut rows = Vec::new();
    for c in crops_with_surface(lines) {
        for (input_type, total) in sum_by(&c.lines, |l| l.input_type.clone()) {
            rows.push(InputTypeCostRow {
                crop: c.crop.to_string(),
                input_type,
                usd_per_ha: format_number(total / c.surface, 2),
            });
        }
    }
    rows
}

/// Per labor/input USD/ha for each crop, largest first, capped at the top items.
pub fn item_costs_per_ha(lines: &[CostLine]) -> Vec<ItemCostRow> {
    let mut rows = Vec::new();
    for c in crops_with_surface(lines) {
        let per_item = sum_by(&c.lines, |l| l.item.clone().unwrap_or_default());
        let mut items: Vec<(String, f64)> = per_item
            .into_iter()
            .map(|(item, total)| (item, total / c.surface))
            .collect();
        items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        if items.len() > TOP_ITEMS {
            let rest: f64 = items[TOP_ITEMS..].iter().map(|(_, v)| v).sum();
            items.truncate(TOP_ITEMS);
            items.push((OTHER_ITEMS.to_string(), rest));
        }
        rows.extend(items.into_iter().map(|(item, usd_ha)| ItemCostRow {
            crop: c.crop.to_string(),
            item,
            usd_per_ha: format_number(usd_ha, 2),
        }));
    }
    rows
}

/// Every work-order line of the crops with a known surface, in source order
/// within each crop.
pub fn cost_line_detail(lines: &[CostLine]) -> Vec<CostLineRow> {
    let mut rows = Vec::new();
    for c in crops_with_surface(lines) {
        rows.extend(c.lines.iter().map(|l| CostLineRow {
            crop: c.crop.to_string(),
            item: l.item.clone().unwrap_or_default(),
            input_type: l.input_type.clone(),
            quantity: format_opt(l.executed_quantity, 2),
            price: format_opt(l.price, 2),
            total: format_opt(l.total_cost, 2),
            usd_per_ha: format_number(l.total_cost.unwrap_or(0.0) / c.surface, 2),
        }));
    }
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetComparison {
    pub species: String,
    pub input_type: String,
    pub executed_usd_ha: f64,
    pub budget_usd: f64,
    pub difference: f64,
    pub pct_executed: f64,
}

/// Executed USD/ha against budget per species and normalized input type.
///
/// Executed is the mean over the species' crops that used the input type;
/// species without any crop carrying a positive surface are left out.
pub fn budget_vs_actual(lines: &[CostLine], budget: &[BudgetLine]) -> Vec<BudgetComparison> {
    let mut by_species: BTreeMap<&str, Vec<CostLine>> = BTreeMap::new();
    for l in lines {
        if let Some(species) = l.species.as_deref() {
            by_species.entry(species).or_default().push(l.clone());
        }
    }

    let mut out = Vec::new();
    for (species, species_lines) in by_species {
        let mut executed: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let crops = crops_with_surface(&species_lines);
        if crops.is_empty() {
            continue;
        }
        for c in &crops {
            for (input_type, total) in sum_by(&c.lines, |l| normalize_key(&l.input_type)) {
                executed.entry(input_type).or_default().push(total / c.surface);
            }
        }

        let mut budgeted: BTreeMap<String, f64> = BTreeMap::new();
        for b in budget.iter().filter(|b| b.species == species) {
            *budgeted.entry(normalize_key(&b.input_type)).or_insert(0.0) += b.budget_usd.unwrap_or(0.0);
        }

        let mut types: Vec<&String> = executed.keys().chain(budgeted.keys()).collect();
        types.sort();
        types.dedup();
        for input_type in types {
            let exec = executed.get(input_type).map(|v| average(v)).unwrap_or(0.0);
            let budget_usd = budgeted.get(input_type).copied().unwrap_or(0.0);
            out.push(BudgetComparison {
                species: species.to_string(),
                input_type: input_type.clone(),
                executed_usd_ha: exec,
                budget_usd,
                difference: exec - budget_usd,
                pct_executed: round_to(ratio_or_zero(exec, budget_usd) * 100.0, 1),
            });
        }
    }
    out
}

pub fn budget_rows(comparisons: &[BudgetComparison]) -> Vec<BudgetComparisonRow> {
    comparisons
        .iter()
        .map(|c| BudgetComparisonRow {
            species: c.species.clone(),
            input_type: c.input_type.clone(),
            executed: format_number(c.executed_usd_ha, 2),
            budget: format_number(c.budget_usd, 2),
            difference: format_number(c.difference, 2),
            pct_executed: format_number(c.pct_executed, 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{cost_line, production};
    use chrono::NaiveDate;

    fn line(crop: &str, species: &str, input_type: &str, item: &str, total: f64, surface: Option<f64>) -> CostLine {
        let mut l = cost_line(crop, input_type, total);
        l.species = Some(species.to_string());
        l.item = Some(item.to_string());
        l.surface_ha = surface;
        l
    }

    fn load(day: u32, company: &str, crop: &str, origin: f64, fin: f64) -> HarvestLoad {
        HarvestLoad {
            date: NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
            company: company.to_string(),
            crop: crop.to_string(),
            kg_origin: Some(origin),
            kg_final: Some(fin),
            moisture: None,
            diff_kg: Some(origin - fin),
            diff_pct: None,
        }
    }

    #[test]
    fn species_shares_add_to_hundred() {
        let records = vec![
            production("Maize", "Cereal", "North", 100.0, 6.0),
            production("Wheat", "Cereal", "South", 50.0, 4.0),
            production("Soy", "Oilseed", "South", 100.0, 2.0),
        ];
        let rows = production_shares(&records, |r| r.species.as_str());
        assert_eq!(rows[0].group, "Cereal");
        assert_eq!(rows[0].tons, "800.00");
        assert_eq!(rows[0].share_pct, "80.00");
        assert_eq!(rows[1].share_pct, "20.00");
        assert_eq!(production_rows(&records)[2].yield_conditioned, "2.00");
    }

    #[test]
    fn shares_of_empty_tonnage_are_zero() {
        let mut r = production("Maize", "Cereal", "North", 0.0, 0.0);
        r.tons_field = None;
        let rows = production_shares(&[r], |r| r.crop.as_str());
        assert_eq!(rows[0].share_pct, "0.00");
    }

    #[test]
    fn daily_harvest_accumulates_final_kg() {
        let loads = vec![
            load(2, "Acme", "Maize", 1000.0, 950.0),
            load(1, "Acme", "Maize", 2000.0, 1980.0),
            load(2, "Agro", "Soy", 500.0, 490.0),
        ];
        let rows = harvest_daily(&loads);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2025-04-01");
        assert_eq!(rows[0].cumulative_kg, "1,980");
        assert_eq!(rows[1].kg_final, "1,440");
        assert_eq!(rows[1].cumulative_kg, "3,420");
    }

    #[test]
    fn company_crop_shrink_pct() {
        let loads = vec![
            load(1, "Acme", "Maize", 1000.0, 950.0),
            load(2, "Acme", "Maize", 1000.0, 990.0),
            load(2, "Agro", "Soy", 0.0, 0.0),
        ];
        let rows = harvest_by_company_crop(&loads);
        assert_eq!(rows[0].diff_kg, "60");
        assert_eq!(rows[0].diff_pct, "3.00");
        assert_eq!(rows[1].diff_pct, "0.00");
    }

    #[test]
    fn cost_per_ha_uses_first_surface_and_skips_unknown() {
        let lines = vec![
            line("Maize", "Cereal", "Seed", "Hybrid seed", 3000.0, None),
            line("Maize", "Cereal", "Fertilizer", "Urea", 1000.0, Some(100.0)),
            line("Maize", "Cereal", "Fertilizer", "MAP", 1000.0, Some(80.0)),
            line("Soy", "Oilseed", "Seed", "Seed", 500.0, None),
        ];
        let rows = crop_costs_per_ha(&lines);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].usd_per_ha, "50.00");

        let by_type = input_type_costs_per_ha(&lines);
        assert_eq!(by_type.len(), 2);
        assert_eq!(by_type[0].input_type, "Fertilizer");
        assert_eq!(by_type[0].usd_per_ha, "20.00");
    }

    #[test]
    fn line_detail_spreads_each_line_over_crop_surface() {
        let mut seed = line("Maize", "Cereal", "Seed", "Hybrid seed", 3000.0, None);
        seed.price = Some(150.0);
        seed.executed_quantity = Some(20.0);
        let mut urea = line("Maize", "Cereal", "Fertilizer", "Urea", 1000.0, Some(100.0));
        urea.total_cost = None;
        let lines = vec![
            seed,
            urea,
            line("Maize", "Cereal", "Fertilizer", "MAP", 1000.0, Some(80.0)),
            line("Soy", "Oilseed", "Seed", "Seed", 500.0, None),
        ];
        let rows = cost_line_detail(&lines);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].item, "Hybrid seed");
        assert_eq!(rows[0].quantity, "20.00");
        assert_eq!(rows[0].price, "150.00");
        assert_eq!(rows[0].usd_per_ha, "30.00");
        assert_eq!(rows[1].total, "");
        assert_eq!(rows[1].usd_per_ha, "0.00");
        assert_eq!(rows[2].usd_per_ha, "10.00");
        assert!(rows.iter().all(|r| r.crop == "Maize"));
    }

    #[test]
    fn item_breakdown_folds_tail_into_others() {
        let mut lines: Vec<CostLine> = (0..18)
            .map(|i| line("Maize", "Cereal", "Labor", &format!("Item {:02}", i), 100.0 + i as f64, Some(1.0)))
            .collect();
        lines.push(line("Maize", "Cereal", "Labor", "Item 00", 0.0, Some(1.0)));
        let rows = item_costs_per_ha(&lines);
        assert_eq!(rows.len(), TOP_ITEMS + 1);
        assert_eq!(rows[0].item, "Item 17");
        let others = rows.last().unwrap();
        assert_eq!(others.item, OTHER_ITEMS);
        assert_eq!(others.usd_per_ha, "303.00");
    }

    #[test]
    fn budget_comparison_outer_joins_input_types() {
        let lines = vec![
            line("Maize", "Cereal", " Seed ", "a", 2000.0, Some(100.0)),
            line("Wheat", "Cereal", "seed", "b", 1000.0, Some(100.0)),
            line("Wheat", "Cereal", "Herbicide", "c", 500.0, Some(100.0)),
        ];
        let budget = vec![
            BudgetLine {
                crop: "Maize".into(),
                species: "Cereal".into(),
                input_type: "SEED".into(),
                budget_usd: Some(12.0),
            },
            BudgetLine {
                crop: "Maize".into(),
                species: "Cereal".into(),
                input_type: "Fungicide".into(),
                budget_usd: Some(8.0),
            },
        ];
        let out = budget_vs_actual(&lines, &budget);
        assert_eq!(out.len(), 3);

        let fungicide = &out[0];
        assert_eq!(fungicide.input_type, "fungicide");
        assert_eq!(fungicide.executed_usd_ha, 0.0);
        assert_eq!(fungicide.pct_executed, 0.0);

        let herbicide = &out[1];
        assert_eq!(herbicide.executed_usd_ha, 5.0);
        assert_eq!(herbicide.budget_usd, 0.0);
        assert_eq!(herbicide.pct_executed, 0.0);

        let seed = &out[2];
        assert_eq!(seed.executed_usd_ha, 15.0);
        assert_eq!(seed.budget_usd, 12.0);
        assert_eq!(seed.difference, 3.0);
        assert_eq!(seed.pct_executed, 125.0);

        assert_eq!(budget_rows(&out)[2].pct_executed, "125.0");
    }
}
