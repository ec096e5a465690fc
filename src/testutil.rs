// Record builders shared by the unit tests.
use crate::types::{CostLine, ProductionRecord};

pub fn production(crop: &str, species: &str, field: &str, area: f64, yield_tn: f64) -> ProductionRecord {
    ProductionRecord {
        crop: crop.to_string(),
        species: species.to_string(),
        field: field.to_string(),
        total_area_ha: Some(area),
        harvested_area_ha: Some(area),
        progress_pct: Some(100.0),
        tons_field: Some(area * yield_tn),
        yield_field: Some(yield_tn),
        tons_destination: None,
        yield_destination: None,
        tons_conditioned: None,
        yield_tn_per_ha: Some(yield_tn),
    }
}

pub fn cost_line(crop: &str, input_type: &str, total: f64) -> CostLine {
    CostLine {
        crop: crop.to_string(),
        input_type: input_type.to_string(),
        total_cost: Some(total),
        company: None,
        species: None,
        field: None,
        item: None,
        surface_ha: None,
        price: None,
        executed_quantity: None,
    }
}
