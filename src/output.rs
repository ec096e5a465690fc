use crate::error::{ReportError, Result};
use crate::params::{ParamBackend, ParamLookup, ParameterStore};
use crate::pipeline::{totals, EconomicAnalysis};
use crate::types::{CostBreakdownRow, CropEconomicSummary, EconomicSummaryRow, ParamsRow};
use crate::util::format_number;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(|e| ReportError::io(path, e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|e| ReportError::io(path, e))?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if rows.len() > max_rows {
        println!("({} more rows not shown)\n", rows.len() - max_rows);
    }
}

pub fn summary_rows(summaries: &[CropEconomicSummary]) -> Vec<EconomicSummaryRow> {
    summaries
        .iter()
        .map(|s| EconomicSummaryRow {
            species: s.species.clone(),
            crop: s.crop.clone(),
            field: s.field.clone(),
            harvested_area: format_number(s.harvested_area_ha, 2),
            yield_tn_ha: format_number(s.yield_tn_per_ha, 2),
            net_revenue_ha: format_number(s.net_revenue_per_ha, 2),
            unit_cost_ha: format_number(s.unit_cost_per_ha, 2),
            freight_ha: format_number(s.freight_per_ha, 2),
            rent_ha: format_number(s.rent_per_ha, 2),
            margin_ha: format_number(s.margin_per_ha, 2),
            final_income_total: format_number(s.final_income_total, 2),
        })
        .collect()
}

/// Parameters for `species` as used in this session, flagging stored ones.
pub fn params_rows<B: ParamBackend>(
    store: &ParameterStore<B>,
    species: &[String],
    session: &impl ParamLookup,
) -> Vec<ParamsRow> {
    species
        .iter()
        .map(|s| {
            let p = session.params_for(s);
            ParamsRow {
                species: s.clone(),
                rent: format_number(p.rent_usd_per_ha, 2),
                freight: format_number(p.freight_usd_per_tn, 2),
                gross_price: format_number(p.gross_price_usd_per_tn, 2),
                net_price: format_number(p.net_price_usd_per_tn, 2),
                stored: if store.is_stored(s) { "yes" } else { "default" }.to_string(),
            }
        })
        .collect()
}

const SUMMARY_SHEET: &str = "Resumen";
const BREAKDOWN_SHEET: &str = "Costos Desglosados";

const SUMMARY_HEADERS: [&str; 15] = [
    "Species",
    "Crop",
    "Field",
    "HarvestedArea",
    "YieldTnHa",
    "GrossRevenueUsdHa",
    "NetRevenueUsdHa",
    "WorkOrderCostUsd",
    "FreightUsdHa",
    "RentUsdHa",
    "FinalIncomeUsdHa",
    "FinalIncomeTotalUsd",
    "UnitCostUsdHa",
    "TotalCostUsdHa",
    "MarginUsdHa",
];
const BREAKDOWN_HEADERS: [&str; 3] = ["Crop", "InputType", "TotalCostUsd"];

/// Files written by [`export_analysis`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub workbook: PathBuf,
    pub totals: PathBuf,
}

impl ExportPaths {
    pub fn new(dir: &Path, stem: &str) -> Self {
        Self {
            workbook: dir.join(format!("{}.xlsx", stem)),
            totals: dir.join(format!("{}_totals.json", stem)),
        }
    }
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, summaries: &[CropEconomicSummary]) -> Result<()> {
    write_headers(sheet, &SUMMARY_HEADERS)?;
    for (i, s) in summaries.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &s.species)?;
        sheet.write_string(row, 1, &s.crop)?;
        sheet.write_string(row, 2, &s.field)?;
        let numbers = [
            s.harvested_area_ha,
            s.yield_tn_per_ha,
            s.gross_revenue_per_ha,
            s.net_revenue_per_ha,
            s.total_cost,
            s.freight_per_ha,
            s.rent_per_ha,
            s.final_income_per_ha,
            s.final_income_total,
            s.unit_cost_per_ha,
            s.total_cost_per_ha,
            s.margin_per_ha,
        ];
        for (j, n) in numbers.into_iter().enumerate() {
            sheet.write_number(row, 3 + j as u16, n)?;
        }
    }
    Ok(())
}

fn write_breakdown_sheet(sheet: &mut Worksheet, rows: &[CostBreakdownRow]) -> Result<()> {
    write_headers(sheet, &BREAKDOWN_HEADERS)?;
    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &r.crop)?;
        sheet.write_string(row, 1, &r.input_type)?;
        sheet.write_number(row, 2, r.total_cost)?;
    }
    Ok(())
}

/// Write the summary and cost breakdown as two sheets of one workbook, plus
/// the totals file next to it.
pub fn export_analysis(dir: &Path, stem: &str, analysis: &EconomicAnalysis) -> Result<ExportPaths> {
    std::fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;
    let paths = ExportPaths::new(dir, stem);

    let mut workbook = Workbook::new();
    let summary = workbook.add_worksheet();
    summary.set_name(SUMMARY_SHEET)?;
    write_summary_sheet(summary, &analysis.summaries)?;
    let breakdown = workbook.add_worksheet();
    breakdown.set_name(BREAKDOWN_SHEET)?;
    write_breakdown_sheet(breakdown, &analysis.cost_breakdown)?;
    workbook.save(&paths.workbook)?;

    write_json(&paths.totals, &totals(analysis))?;
    Ok(paths)
}
