use crate::cache;
use crate::error::{ReportError, Result};
use crate::normalize::{normalize, ColumnSpec, NormalizedRow, RawTable, Schema};
use crate::types::{BudgetLine, CostLine, HarvestLoad, ProductionRecord};
use crate::util::parse_date_safe;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info};

pub const PRODUCTION_SCHEMA: Schema = Schema {
    name: "production",
    columns: &[
        ColumnSpec::text("Cultivo", "crop"),
        ColumnSpec::text("Especie", "species"),
        ColumnSpec::text("Campo", "field"),
        ColumnSpec::number("Superficie (ha)", "total_area").optional(),
        ColumnSpec::number("Sup. Cosechada (ha)", "harvested_area"),
        ColumnSpec::number("% Avance", "progress").optional(),
        ColumnSpec::number("Ton Chacra", "tons_field").optional(),
        ColumnSpec::number("Rinde Chacra (tn/ha)", "yield_field").optional(),
        ColumnSpec::number("Ton Destino", "tons_destination").optional(),
        ColumnSpec::number("Rinde Destino (tn/ha)", "yield_destination").optional(),
        ColumnSpec::number("Ton Acondicionado", "tons_conditioned").optional(),
        ColumnSpec::number("Rinde Acondicionado (tn/ha)", "yield_conditioned"),
    ],
};

pub const COST_SCHEMA: Schema = Schema {
    name: "costs",
    columns: &[
        ColumnSpec::text("Cultivo", "crop"),
        ColumnSpec::text("Tipo Insumo", "input_type"),
        ColumnSpec::number("Total", "total"),
        ColumnSpec::text("Empresa", "company").optional(),
        ColumnSpec::text("Especie", "species").optional(),
        ColumnSpec::text("Campo", "field").optional(),
        ColumnSpec::text("Labor / Insumo", "item").optional(),
        ColumnSpec::number("Superficie", "surface").optional(),
        ColumnSpec::number("Precio", "price").optional(),
        ColumnSpec::number("Cantidad Ejecutada", "quantity").optional(),
    ],
};

pub const BUDGET_SCHEMA: Schema = Schema {
    name: "budget",
    columns: &[
        ColumnSpec::text("Cultivo", "crop"),
        ColumnSpec::text("Especie", "species"),
        ColumnSpec::text("TipoInsumo", "input_type"),
        ColumnSpec::number("TotalUSD", "total_usd"),
    ],
};

pub const HARVEST_SCHEMA: Schema = Schema {
    name: "harvest",
    columns: &[
        ColumnSpec::text("Fecha", "date"),
        ColumnSpec::text("Empresa", "company"),
        ColumnSpec::text("Cultivo", "crop"),
        ColumnSpec::number("Kg Origen", "kg_origin"),
        ColumnSpec::number("Kg Final", "kg_final"),
        ColumnSpec::number("Humedad", "moisture").optional(),
        ColumnSpec::number("Diferencia Kg", "diff_kg"),
        ColumnSpec::number("Diferencia %", "diff_pct"),
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub source: &'static str,
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
}

/// Read a CSV file or the first sheet of a workbook into a `RawTable`.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path),
        other => Err(ReportError::UnsupportedFormat(format!(
            "{} ({})",
            path.display(),
            if other.is_empty() { "no extension" } else { other }
        ))),
    }
}

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReportError::EmptySource(path.display().to_string()));
    }
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(RawTable { headers, rows })
}

fn read_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_vec();
    let Some(sheet_name) = sheet_names.first() else {
        return Err(ReportError::EmptySource(path.display().to_string()));
    };
    debug!(path = %path.display(), sheet = %sheet_name, "reading worksheet");
    let range = workbook.worksheet_range(sheet_name)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_to_string).collect(),
        None => return Err(ReportError::EmptySource(path.display().to_string())),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(RawTable { headers, rows })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

fn production_from_row(row: &NormalizedRow) -> ProductionRecord {
    ProductionRecord {
        crop: row.text_or_empty("crop"),
        species: row.text_or_empty("species"),
        field: row.text_or_empty("field"),
        total_area_ha: row.number("total_area"),
        harvested_area_ha: row.number("harvested_area"),
        progress_pct: row.number("progress"),
        tons_field: row.number("tons_field"),
        yield_field: row.number("yield_field"),
        tons_destination: row.number("tons_destination"),
        yield_destination: row.number("yield_destination"),
        tons_conditioned: row.number("tons_conditioned"),
        yield_tn_per_ha: row.number("yield_conditioned"),
    }
}

fn cost_from_row(row: &NormalizedRow) -> CostLine {
    CostLine {
        crop: row.text_or_empty("crop"),
        input_type: row.text_or_empty("input_type"),
        total_cost: row.number("total"),
        company: row.text("company").map(str::to_string),
        species: row.text("species").map(str::to_string),
        field: row.text("field").map(str::to_string),
        item: row.text("item").map(str::to_string),
        surface_ha: row.number("surface"),
        price: row.number("price"),
        executed_quantity: row.number("quantity"),
    }
}

fn budget_from_row(row: &NormalizedRow) -> BudgetLine {
    BudgetLine {
        crop: row.text_or_empty("crop"),
        species: row.text_or_empty("species"),
        input_type: row.text_or_empty("input_type"),
        budget_usd: row.number("total_usd"),
    }
}

/// Harvest rows without a parseable date, company or crop are unusable for
/// every harvest view and are dropped here.
fn harvest_from_row(row: &NormalizedRow) -> Option<HarvestLoad> {
    let date = parse_date_safe(row.text("date"))?;
    let company = row.text("company")?.to_string();
    let crop = row.text("crop")?.to_string();
    Some(HarvestLoad {
        date,
        company,
        crop,
        kg_origin: row.number("kg_origin"),
        kg_final: row.number("kg_final"),
        moisture: row.number("moisture"),
        diff_kg: row.number("diff_kg"),
        diff_pct: row.number("diff_pct"),
    })
}

pub fn production_from_table(table: &RawTable) -> Result<Vec<ProductionRecord>> {
    Ok(normalize(table, &PRODUCTION_SCHEMA)?
        .iter()
        .map(production_from_row)
        .collect())
}

pub fn costs_from_table(table: &RawTable) -> Result<Vec<CostLine>> {
    Ok(normalize(table, &COST_SCHEMA)?.iter().map(cost_from_row).collect())
}

pub fn budget_from_table(table: &RawTable) -> Result<Vec<BudgetLine>> {
    Ok(normalize(table, &BUDGET_SCHEMA)?
        .iter()
        .map(budget_from_row)
        .collect())
}

pub fn harvest_from_table(table: &RawTable) -> Result<(Vec<HarvestLoad>, LoadReport)> {
    let rows = normalize(table, &HARVEST_SCHEMA)?;
    let total_rows = rows.len();
    let loads: Vec<HarvestLoad> = rows.iter().filter_map(harvest_from_row).collect();
    let report = LoadReport {
        source: HARVEST_SCHEMA.name,
        total_rows,
        kept_rows: loads.len(),
        dropped_rows: total_rows - loads.len(),
    };
    Ok((loads, report))
}

fn full_report(source: &'static str, rows: usize) -> LoadReport {
    LoadReport {
        source,
        total_rows: rows,
        kept_rows: rows,
        dropped_rows: 0,
    }
}

pub fn load_production(path: &Path) -> Result<(Vec<ProductionRecord>, LoadReport)> {
    let table = cache::load_cached(path)?;
    let records = production_from_table(&table)?;
    info!(path = %path.display(), rows = records.len(), "loaded production");
    let report = full_report(PRODUCTION_SCHEMA.name, records.len());
    Ok((records, report))
}

pub fn load_costs(path: &Path) -> Result<(Vec<CostLine>, LoadReport)> {
    let table = cache::load_cached(path)?;
    let lines = costs_from_table(&table)?;
    info!(path = %path.display(), rows = lines.len(), "loaded cost lines");
    let report = full_report(COST_SCHEMA.name, lines.len());
    Ok((lines, report))
}

pub fn load_budget(path: &Path) -> Result<(Vec<BudgetLine>, LoadReport)> {
    let table = cache::load_cached(path)?;
    let lines = budget_from_table(&table)?;
    info!(path = %path.display(), rows = lines.len(), "loaded budget lines");
    let report = full_report(BUDGET_SCHEMA.name, lines.len());
    Ok((lines, report))
}

pub fn load_harvest(path: &Path) -> Result<(Vec<HarvestLoad>, LoadReport)> {
    let table = cache::load_cached(path)?;
    let (loads, report) = harvest_from_table(&table)?;
    info!(
        path = %path.display(),
        kept = report.kept_rows,
        dropped = report.dropped_rows,
        "loaded harvest load orders"
    );
    Ok((loads, report))
}
