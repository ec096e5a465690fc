// Cost aggregation and the production/cost merge.
use crate::types::{CostBreakdownRow, CostLine, CostedProduction, ProductionRecord};
use std::collections::BTreeMap;

/// Sum cost lines per crop. Crops without lines are absent from the map;
/// missing totals contribute nothing.
pub fn costs_by_crop(lines: &[CostLine]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for line in lines {
        *totals.entry(line.crop.clone()).or_insert(0.0) += line.total_cost.unwrap_or(0.0);
    }
    totals
}

/// Sum cost lines per (crop, input type).
pub fn costs_by_crop_and_type(lines: &[CostLine]) -> BTreeMap<(String, String), f64> {
    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
    for line in lines {
        let key = (line.crop.clone(), line.input_type.clone());
        *totals.entry(key).or_insert(0.0) += line.total_cost.unwrap_or(0.0);
    }
    totals
}

pub fn breakdown_rows(totals: &BTreeMap<(String, String), f64>) -> Vec<CostBreakdownRow> {
    totals
        .iter()
        .map(|((crop, input_type), total)| CostBreakdownRow {
            crop: crop.clone(),
            input_type: input_type.clone(),
            total_cost: *total,
        })
        .collect()
}

/// Left join of per-crop cost totals onto production records.
///
/// The join key is the crop name compared byte for byte. A crop spelled
/// differently in the two exports (case, padding) ends up with zero cost.
pub fn merge_costs(
    production: &[ProductionRecord],
    totals: &BTreeMap<String, f64>,
) -> Vec<CostedProduction> {
    production
        .iter()
        .map(|record| CostedProduction {
            total_cost: totals.get(&record.crop).copied().unwrap_or(0.0),
            record: record.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{cost_line, production};

    #[test]
    fn sums_per_crop_and_type() {
        let mut missing = cost_line("Maize 1", "Seed", 0.0);
        missing.total_cost = None;
        let lines = vec![
            cost_line("Maize 1", "Seed", 1000.0),
            cost_line("Maize 1", "Fertilizer", 2500.0),
            cost_line("Maize 1", "Seed", 500.0),
            missing,
        ];
        let by_crop = costs_by_crop(&lines);
        assert_eq!(by_crop.get("Maize 1"), Some(&4000.0));
        assert_eq!(by_crop.len(), 1);

        let by_type = costs_by_crop_and_type(&lines);
        assert_eq!(by_type.get(&("Maize 1".into(), "Seed".into())), Some(&1500.0));
        let rows = breakdown_rows(&by_type);
        assert_eq!(rows[0].input_type, "Fertilizer");
        assert_eq!(rows[1].total_cost, 1500.0);
    }

    #[test]
    fn crops_without_costs_merge_as_zero() {
        let records = vec![
            production("Maize 1", "Cereal", "North", 100.0, 8.0),
            production("Soy 1", "Oilseed", "South", 50.0, 3.0),
        ];
        let totals = costs_by_crop(&[cost_line("Maize 1", "Seed", 4000.0)]);
        let merged = merge_costs(&records, &totals);
        assert_eq!(merged[0].total_cost, 4000.0);
        assert_eq!(merged[1].total_cost, 0.0);
    }

    #[test]
    fn join_is_exact_match_only() {
        let records = vec![production("Maize 1", "Cereal", "North", 100.0, 8.0)];
        let totals = costs_by_crop(&[cost_line("maize 1 ", "Seed", 4000.0)]);
        let merged = merge_costs(&records, &totals);
        assert_eq!(merged[0].total_cost, 0.0);
    }
}
