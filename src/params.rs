// Per-species economic parameters.
//
// `ParameterStore` holds the saved table and answers lookups with defaults
// for species it has never seen. The backing resource is injected through
// `ParamBackend` so the margin code never touches the disk.
//
// Saving replaces the whole table: species not included in the saved
// mapping lose their stored parameters.
use crate::error::{ReportError, Result};
use crate::types::EconomicParams;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

pub type ParamTable = BTreeMap<String, EconomicParams>;

/// Anything that can resolve the parameters for a species.
pub trait ParamLookup {
    fn params_for(&self, species: &str) -> EconomicParams;
}

/// Where the parameter table lives between sessions.
pub trait ParamBackend {
    fn load(&self) -> Result<ParamTable>;
    /// Replace the persisted table with `table`.
    fn replace(&self, table: &ParamTable) -> Result<()>;
}

/// JSON object keyed by species, rewritten through a temp file and rename.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ParamBackend for JsonFileBackend {
    fn load(&self) -> Result<ParamTable> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "creating empty parameter file");
            self.replace(&ParamTable::new())?;
            return Ok(ParamTable::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| ReportError::io(&self.path, e))?;
        if raw.trim().is_empty() {
            return Ok(ParamTable::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn replace(&self, table: &ParamTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
        }
        let body = serde_json::to_string_pretty(table)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| ReportError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| ReportError::io(&self.path, e))?;
        debug!(path = %self.path.display(), species = table.len(), "parameter file replaced");
        Ok(())
    }
}

/// Keeps the table in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    table: std::cell::RefCell<ParamTable>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn with_table(table: ParamTable) -> Self {
        Self {
            table: std::cell::RefCell::new(table),
        }
    }
}

#[cfg(test)]
impl ParamBackend for MemoryBackend {
    fn load(&self) -> Result<ParamTable> {
        Ok(self.table.borrow().clone())
    }

    fn replace(&self, table: &ParamTable) -> Result<()> {
        *self.table.borrow_mut() = table.clone();
        Ok(())
    }
}

pub struct ParameterStore<B: ParamBackend> {
    backend: B,
    table: ParamTable,
}

impl<B: ParamBackend> ParameterStore<B> {
    pub fn open(backend: B) -> Result<Self> {
        let table = backend.load()?;
        debug!(species = table.len(), "parameter store opened");
        Ok(Self { backend, table })
    }

    /// Stored parameters for `species`, or the defaults.
    pub fn get(&self, species: &str) -> EconomicParams {
        self.table.get(species).copied().unwrap_or_default()
    }

    pub fn is_stored(&self, species: &str) -> bool {
        self.table.contains_key(species)
    }

    pub fn stored(&self) -> &ParamTable {
        &self.table
    }

    /// Overwrite the persisted table with exactly `table`.
    pub fn set_all(&mut self, table: ParamTable) -> Result<()> {
        self.backend.replace(&table)?;
        info!(species = table.len(), "parameters saved");
        self.table = table;
        Ok(())
    }
}

impl<B: ParamBackend> ParamLookup for ParameterStore<B> {
    fn params_for(&self, species: &str) -> EconomicParams {
        self.get(species)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamField {
    Rent,
    Freight,
    GrossPrice,
    NetPrice,
}

impl FromStr for ParamField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rent" => Ok(ParamField::Rent),
            "freight" => Ok(ParamField::Freight),
            "gross" | "gross_price" => Ok(ParamField::GrossPrice),
            "net" | "net_price" => Ok(ParamField::NetPrice),
            other => Err(format!(
                "unknown parameter '{}' (expected rent, freight, gross or net)",
                other
            )),
        }
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamField::Rent => "rent",
            ParamField::Freight => "freight",
            ParamField::GrossPrice => "gross",
            ParamField::NetPrice => "net",
        };
        f.write_str(name)
    }
}

/// A single user edit, written `SPECIES.FIELD=VALUE` on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamEdit {
    pub species: String,
    pub field: ParamField,
    pub value: f64,
}

impl FromStr for ParamEdit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (target, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected SPECIES.FIELD=VALUE, got '{}'", s))?;
        let (species, field) = target
            .rsplit_once('.')
            .ok_or_else(|| format!("expected SPECIES.FIELD, got '{}'", target))?;
        let species = species.trim();
        if species.is_empty() {
            return Err("species name is empty".to_string());
        }
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", value.trim()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{} must be a non-negative number", target));
        }
        Ok(ParamEdit {
            species: species.to_string(),
            field: field.parse()?,
            value,
        })
    }
}

/// In-session parameters for the species currently on screen.
///
/// Built from the store (stored values or defaults), edited freely, and
/// only persisted when [`ParamSheet::save`] is called.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSheet {
    entries: ParamTable,
}

impl ParamSheet {
    pub fn for_species<'a, I>(store: &impl ParamLookup, species: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let entries = species
            .into_iter()
            .map(|s| (s.to_string(), store.params_for(s)))
            .collect();
        Self { entries }
    }

    /// Apply an edit to a species already on the sheet.
    pub fn apply(&mut self, edit: &ParamEdit) -> Result<()> {
        let params = self
            .entries
            .get_mut(&edit.species)
            .ok_or_else(|| ReportError::SpeciesNotOnSheet(edit.species.clone()))?;
        match edit.field {
            ParamField::Rent => params.rent_usd_per_ha = edit.value,
            ParamField::Freight => params.freight_usd_per_tn = edit.value,
            ParamField::GrossPrice => params.gross_price_usd_per_tn = edit.value,
            ParamField::NetPrice => params.net_price_usd_per_tn = edit.value,
        }
        Ok(())
    }

    pub fn entries(&self) -> &ParamTable {
        &self.entries
    }

    /// Persist the sheet as the complete parameter table.
    pub fn save<B: ParamBackend>(&self, store: &mut ParameterStore<B>) -> Result<()> {
        store.set_all(self.entries.clone())
    }
}

impl ParamLookup for ParamSheet {
    fn params_for(&self, species: &str) -> EconomicParams {
        self.entries.get(species).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(rent: f64) -> EconomicParams {
        EconomicParams {
            rent_usd_per_ha: rent,
            freight_usd_per_tn: 20.0,
            gross_price_usd_per_tn: 300.0,
            net_price_usd_per_tn: 290.0,
        }
    }

    #[test]
    fn unseen_species_gets_defaults() {
        let store = ParameterStore::open(MemoryBackend::default()).unwrap();
        let p = store.get("Cereal");
        assert_eq!(p, EconomicParams::default());
        assert_eq!(p.rent_usd_per_ha, 360.0);
        assert_eq!(p.freight_usd_per_tn, 17.0);
        assert_eq!(p.gross_price_usd_per_tn, 360.0);
        assert_eq!(p.net_price_usd_per_tn, 352.0);
    }

    #[test]
    fn set_all_replaces_instead_of_merging() {
        let mut initial = ParamTable::new();
        initial.insert("Cereal".into(), params(400.0));
        initial.insert("Oilseed".into(), params(300.0));
        let mut store = ParameterStore::open(MemoryBackend::with_table(initial)).unwrap();
        assert_eq!(store.get("Oilseed").rent_usd_per_ha, 300.0);

        let mut only_cereal = ParamTable::new();
        only_cereal.insert("Cereal".into(), params(410.0));
        store.set_all(only_cereal).unwrap();

        assert_eq!(store.get("Cereal").rent_usd_per_ha, 410.0);
        assert_eq!(store.get("Oilseed"), EconomicParams::default());
        assert!(!store.is_stored("Oilseed"));
    }

    #[test]
    fn json_file_round_trip_and_replace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("params.json");
        let mut store = ParameterStore::open(JsonFileBackend::new(&path)).unwrap();
        assert!(path.exists());
        assert!(store.stored().is_empty());

        let mut table = ParamTable::new();
        table.insert("Cereal".into(), params(400.0));
        table.insert("Oilseed".into(), params(300.0));
        store.set_all(table).unwrap();

        let mut table = ParamTable::new();
        table.insert("Cereal".into(), params(420.0));
        store.set_all(table).unwrap();

        let reopened = ParameterStore::open(JsonFileBackend::new(&path)).unwrap();
        assert_eq!(reopened.get("Cereal").rent_usd_per_ha, 420.0);
        assert_eq!(reopened.get("Oilseed"), EconomicParams::default());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn reads_legacy_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(
            &path,
            r#"{"Cereal": {"arrendamiento": 380.0, "flete": 18.0, "precio_bruto": 370.0, "precio_neto": 355.0}}"#,
        )
        .unwrap();
        let store = ParameterStore::open(JsonFileBackend::new(&path)).unwrap();
        let p = store.get("Cereal");
        assert_eq!(p.rent_usd_per_ha, 380.0);
        assert_eq!(p.net_price_usd_per_tn, 355.0);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ParameterStore::open(JsonFileBackend::new(&path)),
            Err(ReportError::Json(_))
        ));
    }

    #[test]
    fn parses_edits() {
        let edit: ParamEdit = "Cereal.rent=400".parse().unwrap();
        assert_eq!(edit.species, "Cereal");
        assert_eq!(edit.field, ParamField::Rent);
        assert_eq!(edit.value, 400.0);

        let dotted: ParamEdit = "Soja 1ra.net=300.5".parse().unwrap();
        assert_eq!(dotted.species, "Soja 1ra");
        assert_eq!(dotted.field, ParamField::NetPrice);

        assert!("Cereal.rent=-1".parse::<ParamEdit>().is_err());
        assert!("Cereal.tax=1".parse::<ParamEdit>().is_err());
        assert!("Cereal=1".parse::<ParamEdit>().is_err());
    }

    #[test]
    fn sheet_edits_stay_in_session_until_saved() {
        let mut initial = ParamTable::new();
        initial.insert("Cereal".into(), params(400.0));
        initial.insert("Legume".into(), params(250.0));
        let mut store = ParameterStore::open(MemoryBackend::with_table(initial)).unwrap();

        let mut sheet = ParamSheet::for_species(&store, ["Cereal", "Oilseed"]);
        assert_eq!(sheet.params_for("Oilseed"), EconomicParams::default());
        sheet.apply(&"Cereal.rent=500".parse().unwrap()).unwrap();
        assert_eq!(sheet.params_for("Cereal").rent_usd_per_ha, 500.0);
        assert_eq!(store.get("Cereal").rent_usd_per_ha, 400.0);

        sheet.save(&mut store).unwrap();
        assert_eq!(store.get("Cereal").rent_usd_per_ha, 500.0);
        assert!(store.is_stored("Oilseed"));
        // Legume was not on the sheet, so saving dropped it.
        assert!(!store.is_stored("Legume"));
    }

    #[test]
    fn edits_outside_the_sheet_are_rejected() {
        let mut store = ParameterStore::open(MemoryBackend::default()).unwrap();
        let mut sheet = ParamSheet::for_species(&store, ["Cereal"]);
        let err = sheet.apply(&"Legume.rent=5".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ReportError::SpeciesNotOnSheet(ref s) if s == "Legume"));

        sheet.save(&mut store).unwrap();
        let stored: Vec<&String> = store.stored().keys().collect();
        assert_eq!(stored, vec!["Cereal"]);
    }
}
