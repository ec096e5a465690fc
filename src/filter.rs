// Multi-select filters applied to each source before aggregation.
//
// `None` means "everything selected"; `Some(empty)` selects nothing, which
// is how an empty multiselect behaves and leads to the "no data" path.
use crate::types::{CostLine, HarvestLoad, ProductionRecord};
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choice(Option<HashSet<String>>);

impl Choice {
    pub fn all() -> Self {
        Choice(None)
    }

    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Choice(Some(values.into_iter().map(Into::into).collect()))
    }

    /// Build from repeated CLI values: no values given means no filter.
    pub fn from_args(values: &[String]) -> Self {
        if values.is_empty() {
            Choice::all()
        } else {
            Choice::only(values.iter().cloned())
        }
    }

    pub fn allows(&self, value: &str) -> bool {
        match &self.0 {
            None => true,
            Some(set) => set.contains(value),
        }
    }

    fn allows_opt(&self, value: Option<&str>) -> bool {
        match &self.0 {
            None => true,
            Some(set) => value.is_some_and(|v| set.contains(v)),
        }
    }
}

/// Field / species / crop selection over the production export.
#[derive(Debug, Clone, Default)]
pub struct ProductionSelection {
    pub fields: Choice,
    pub species: Choice,
    pub crops: Choice,
}

impl ProductionSelection {
    pub fn matches(&self, r: &ProductionRecord) -> bool {
        self.fields.allows(&r.field) && self.species.allows(&r.species) && self.crops.allows(&r.crop)
    }

    pub fn apply(&self, records: &[ProductionRecord]) -> Vec<ProductionRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Company / species / field / crop selection over the cost report.
#[derive(Debug, Clone, Default)]
pub struct CostSelection {
    pub companies: Choice,
    pub species: Choice,
    pub fields: Choice,
    pub crops: Choice,
}

impl CostSelection {
    pub fn matches(&self, line: &CostLine) -> bool {
        self.companies.allows_opt(line.company.as_deref())
            && self.species.allows_opt(line.species.as_deref())
            && self.fields.allows_opt(line.field.as_deref())
            && self.crops.allows(&line.crop)
    }

    pub fn apply(&self, lines: &[CostLine]) -> Vec<CostLine> {
        lines.iter().filter(|l| self.matches(l)).cloned().collect()
    }
}

/// Company / crop / inclusive date range selection over harvest loads.
#[derive(Debug, Clone, Default)]
pub struct HarvestSelection {
    pub companies: Choice,
    pub crops: Choice,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl HarvestSelection {
    pub fn matches(&self, load: &HarvestLoad) -> bool {
        self.companies.allows(&load.company)
            && self.crops.allows(&load.crop)
            && self.from.map_or(true, |from| load.date >= from)
            && self.to.map_or(true, |to| load.date <= to)
    }

    pub fn apply(&self, loads: &[HarvestLoad]) -> Vec<HarvestLoad> {
        loads.iter().filter(|l| self.matches(l)).cloned().collect()
    }
}

/// Keep only cost lines whose crop survived the production-side filter.
pub fn restrict_to_crops(lines: &[CostLine], production: &[ProductionRecord]) -> Vec<CostLine> {
    let crops: HashSet<&str> = production.iter().map(|r| r.crop.as_str()).collect();
    lines
        .iter()
        .filter(|l| crops.contains(l.crop.as_str()))
        .cloned()
        .collect()
}
