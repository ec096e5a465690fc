use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One crop/field row of the production export.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRecord {
    pub crop: String,
    pub species: String,
    pub field: String,
    pub total_area_ha: Option<f64>,
    pub harvested_area_ha: Option<f64>,
    pub progress_pct: Option<f64>,
    pub tons_field: Option<f64>,
    pub yield_field: Option<f64>,
    pub tons_destination: Option<f64>,
    pub yield_destination: Option<f64>,
    pub tons_conditioned: Option<f64>,
    /// Conditioned yield; this is the yield the economics use.
    pub yield_tn_per_ha: Option<f64>,
}

/// One ledger entry of the executed work-order cost report.
#[derive(Debug, Clone, PartialEq)]
pub struct CostLine {
    pub crop: String,
    pub input_type: String,
    pub total_cost: Option<f64>,
    pub company: Option<String>,
    pub species: Option<String>,
    pub field: Option<String>,
    pub item: Option<String>,
    pub surface_ha: Option<f64>,
    pub price: Option<f64>,
    pub executed_quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLine {
    pub crop: String,
    pub species: String,
    pub input_type: String,
    pub budget_usd: Option<f64>,
}

/// A truck load order from the harvest log.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestLoad {
    pub date: NaiveDate,
    pub company: String,
    pub crop: String,
    pub kg_origin: Option<f64>,
    pub kg_final: Option<f64>,
    pub moisture: Option<f64>,
    pub diff_kg: Option<f64>,
    pub diff_pct: Option<f64>,
}

/// Economic assumptions shared by every crop of a species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicParams {
    #[serde(alias = "arrendamiento")]
    pub rent_usd_per_ha: f64,
    #[serde(alias = "flete")]
    pub freight_usd_per_tn: f64,
    #[serde(alias = "precio_bruto")]
    pub gross_price_usd_per_tn: f64,
    #[serde(alias = "precio_neto")]
    pub net_price_usd_per_tn: f64,
}

impl Default for EconomicParams {
    fn default() -> Self {
        Self {
            rent_usd_per_ha: 360.0,
            freight_usd_per_tn: 17.0,
            gross_price_usd_per_tn: 360.0,
            net_price_usd_per_tn: 352.0,
        }
    }
}

/// A production record after the cost merge.
#[derive(Debug, Clone, PartialEq)]
pub struct CostedProduction {
    pub record: ProductionRecord,
    pub total_cost: f64,
}

/// Per-crop economics, exported as the summary sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CropEconomicSummary {
    pub species: String,
    pub crop: String,
    pub field: String,
    pub harvested_area_ha: f64,
    pub yield_tn_per_ha: f64,
    pub gross_revenue_per_ha: f64,
    pub net_revenue_per_ha: f64,
    pub total_cost: f64,
    pub freight_per_ha: f64,
    pub rent_per_ha: f64,
    pub final_income_per_ha: f64,
    pub final_income_total: f64,
    pub unit_cost_per_ha: f64,
    pub total_cost_per_ha: f64,
    pub margin_per_ha: f64,
}

/// Crop × input type cost total, exported as the breakdown sheet.
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct CostBreakdownRow {
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[tabled(rename = "InputType")]
    pub input_type: String,
    #[tabled(rename = "TotalCostUsd")]
    pub total_cost: f64,
}

#[derive(Debug, Tabled, Clone)]
pub struct EconomicSummaryRow {
    #[tabled(rename = "Species")]
    pub species: String,
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Area (ha)")]
    pub harvested_area: String,
    #[tabled(rename = "Yield (tn/ha)")]
    pub yield_tn_ha: String,
    #[tabled(rename = "Net USD/ha")]
    pub net_revenue_ha: String,
    #[tabled(rename = "Unit cost USD/ha")]
    pub unit_cost_ha: String,
    #[tabled(rename = "Freight USD/ha")]
    pub freight_ha: String,
    #[tabled(rename = "Rent USD/ha")]
    pub rent_ha: String,
    #[tabled(rename = "Margin USD/ha")]
    pub margin_ha: String,
    #[tabled(rename = "Final income USD")]
    pub final_income_total: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct ParamsRow {
    #[tabled(rename = "Species")]
    pub species: String,
    #[tabled(rename = "Rent USD/ha")]
    pub rent: String,
    #[tabled(rename = "Freight USD/tn")]
    pub freight: String,
    #[tabled(rename = "Gross USD/tn")]
    pub gross_price: String,
    #[tabled(rename = "Net USD/tn")]
    pub net_price: String,
    #[tabled(rename = "Stored")]
    pub stored: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProductionRow {
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Species")]
    #[tabled(rename = "Species")]
    pub species: String,
    #[serde(rename = "Field")]
    #[tabled(rename = "Field")]
    pub field: String,
    #[serde(rename = "HarvestedArea")]
    #[tabled(rename = "Harvested (ha)")]
    pub harvested_area: String,
    #[serde(rename = "Progress")]
    #[tabled(rename = "Progress %")]
    pub progress: String,
    #[serde(rename = "TonsField")]
    #[tabled(rename = "Tons field")]
    pub tons_field: String,
    #[serde(rename = "YieldConditioned")]
    #[tabled(rename = "Yield cond. (tn/ha)")]
    pub yield_conditioned: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ShareRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "TonsField")]
    #[tabled(rename = "Tons field")]
    pub tons: String,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "Share %")]
    pub share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DailyHarvestRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "KgOrigin")]
    #[tabled(rename = "Kg origin")]
    pub kg_origin: String,
    #[serde(rename = "KgFinal")]
    #[tabled(rename = "Kg final")]
    pub kg_final: String,
    #[serde(rename = "ShrinkKg")]
    #[tabled(rename = "Shrink kg")]
    pub diff_kg: String,
    #[serde(rename = "CumulativeKg")]
    #[tabled(rename = "Cumulative kg")]
    pub cumulative_kg: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CompanyCropHarvestRow {
    #[serde(rename = "Company")]
    #[tabled(rename = "Company")]
    pub company: String,
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "KgOrigin")]
    #[tabled(rename = "Kg origin")]
    pub kg_origin: String,
    #[serde(rename = "KgFinal")]
    #[tabled(rename = "Kg final")]
    pub kg_final: String,
    #[serde(rename = "ShrinkKg")]
    #[tabled(rename = "Shrink kg")]
    pub diff_kg: String,
    #[serde(rename = "ShrinkPct")]
    #[tabled(rename = "Shrink %")]
    pub diff_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CropCostRow {
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Surface")]
    #[tabled(rename = "Surface (ha)")]
    pub surface_ha: String,
    #[serde(rename = "TotalCostUsd")]
    #[tabled(rename = "Total USD")]
    pub total_cost: String,
    #[serde(rename = "UsdHa")]
    #[tabled(rename = "USD/ha")]
    pub usd_per_ha: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct InputTypeCostRow {
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "InputType")]
    #[tabled(rename = "Input type")]
    pub input_type: String,
    #[serde(rename = "UsdHa")]
    #[tabled(rename = "USD/ha")]
    pub usd_per_ha: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ItemCostRow {
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Item")]
    #[tabled(rename = "Labor / input")]
    pub item: String,
    #[serde(rename = "UsdHa")]
    #[tabled(rename = "USD/ha")]
    pub usd_per_ha: String,
}

/// One executed work-order line, spread over its crop's surface.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CostLineRow {
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Item")]
    #[tabled(rename = "Labor / input")]
    pub item: String,
    #[serde(rename = "InputType")]
    #[tabled(rename = "Input type")]
    pub input_type: String,
    #[serde(rename = "ExecutedQuantity")]
    #[tabled(rename = "Executed qty")]
    pub quantity: String,
    #[serde(rename = "Price")]
    #[tabled(rename = "Price")]
    pub price: String,
    #[serde(rename = "TotalUsd")]
    #[tabled(rename = "Total USD")]
    pub total: String,
    #[serde(rename = "UsdHa")]
    #[tabled(rename = "USD/ha")]
    pub usd_per_ha: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BudgetComparisonRow {
    #[serde(rename = "Species")]
    #[tabled(rename = "Species")]
    pub species: String,
    #[serde(rename = "InputType")]
    #[tabled(rename = "Input type")]
    pub input_type: String,
    #[serde(rename = "ExecutedUsdHa")]
    #[tabled(rename = "Executed USD/ha")]
    pub executed: String,
    #[serde(rename = "BudgetUsd")]
    #[tabled(rename = "Budget USD")]
    pub budget: String,
    #[serde(rename = "Difference")]
    #[tabled(rename = "Difference")]
    pub difference: String,
    #[serde(rename = "PctExecuted")]
    #[tabled(rename = "% executed")]
    pub pct_executed: String,
}

/// Totals written next to the economic export.
#[derive(Debug, Serialize, PartialEq)]
pub struct EconomicTotals {
    pub total_crops: usize,
    pub total_species: usize,
    pub total_harvested_area_ha: f64,
    pub total_work_order_cost: f64,
    pub total_final_income: f64,
    pub avg_margin_per_ha: f64,
}
