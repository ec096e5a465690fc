// Command line and environment configuration.
//
// Every path can come from a flag, an environment variable (also read from
// `.env`) or the default location under the data directory.
use crate::filter::{Choice, CostSelection, HarvestSelection, ProductionSelection};
use crate::params::ParamEdit;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_PRODUCTION: &str = "Produccion Por Cultivo.xlsx";
const DEFAULT_COSTS: &str = "InformeOtRealizadas.xlsx";
const DEFAULT_BUDGET: &str = "CultivosPresupuestados.xlsx";
const DEFAULT_HARVEST: &str = "ordenes de carga.xlsx";
const DEFAULT_PARAMS: &str = "parametros_por_especie.json";

#[derive(Parser, Debug)]
#[command(
    name = "agro-report",
    about = "Production, harvest, cost and margin reports for farm operations"
)]
pub struct Cli {
    #[command(flatten)]
    pub sources: Sources,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct Sources {
    /// Directory holding the source spreadsheets and the parameter file
    #[arg(long, env = "AGRO_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Production by crop export (CSV or workbook)
    #[arg(long, env = "AGRO_PRODUCTION_FILE", global = true)]
    pub production: Option<PathBuf>,

    /// Executed work-order cost report
    #[arg(long, env = "AGRO_COSTS_FILE", global = true)]
    pub costs: Option<PathBuf>,

    /// Budgeted inputs per crop
    #[arg(long, env = "AGRO_BUDGET_FILE", global = true)]
    pub budget: Option<PathBuf>,

    /// Harvest load orders
    #[arg(long, env = "AGRO_HARVEST_FILE", global = true)]
    pub harvest: Option<PathBuf>,

    /// Per-species economic parameters (JSON)
    #[arg(long, env = "AGRO_PARAMS_FILE", global = true)]
    pub params: Option<PathBuf>,

    /// Where exported files are written
    #[arg(long, env = "AGRO_OUT_DIR", default_value = ".", global = true)]
    pub out_dir: PathBuf,
}

impl Sources {
    fn resolve(&self, explicit: &Option<PathBuf>, default_name: &str) -> PathBuf {
        explicit
            .clone()
            .unwrap_or_else(|| self.data_dir.join(default_name))
    }

    pub fn production_path(&self) -> PathBuf {
        self.resolve(&self.production, DEFAULT_PRODUCTION)
    }

    pub fn costs_path(&self) -> PathBuf {
        self.resolve(&self.costs, DEFAULT_COSTS)
    }

    pub fn budget_path(&self) -> PathBuf {
        self.resolve(&self.budget, DEFAULT_BUDGET)
    }

    pub fn harvest_path(&self) -> PathBuf {
        self.resolve(&self.harvest, DEFAULT_HARVEST)
    }

    pub fn params_path(&self) -> PathBuf {
        self.resolve(&self.params, DEFAULT_PARAMS)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Per-crop revenue, cost and margin using the species parameters
    Economics(EconomicsArgs),
    /// Production table and tonnage shares
    Production(ProductionArgs),
    /// Daily harvest and shrinkage by company and crop
    Harvest(HarvestArgs),
    /// Cost per hectare by crop, input type and item
    Costs(CostArgs),
    /// Executed versus budgeted cost per species and input type
    Budget(CostArgs),
    /// Show the stored species parameters
    Params(ParamsArgs),
    /// Menu-driven session over all reports
    Interactive,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProductionFilterArgs {
    /// Keep only these fields (repeatable)
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Keep only these species (repeatable)
    #[arg(long = "species")]
    pub species: Vec<String>,

    /// Keep only these crops (repeatable)
    #[arg(long = "crop")]
    pub crops: Vec<String>,
}

impl ProductionFilterArgs {
    pub fn selection(&self) -> ProductionSelection {
        ProductionSelection {
            fields: Choice::from_args(&self.fields),
            species: Choice::from_args(&self.species),
            crops: Choice::from_args(&self.crops),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct EconomicsArgs {
    #[command(flatten)]
    pub filter: ProductionFilterArgs,

    /// Override a parameter for this run, e.g. `Cereal.rent=380` (repeatable)
    #[arg(long = "set", value_name = "SPECIES.FIELD=VALUE")]
    pub edits: Vec<ParamEdit>,

    /// Persist the session parameters, replacing the stored table
    #[arg(long)]
    pub save: bool,

    /// Export the summary and cost breakdown using this file stem
    #[arg(long, value_name = "STEM")]
    pub export: Option<String>,

    /// Rows shown in each console preview
    #[arg(long, default_value_t = 20)]
    pub rows: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ProductionArgs {
    #[command(flatten)]
    pub filter: ProductionFilterArgs,

    /// Write the filtered production table to the output directory
    #[arg(long)]
    pub export: bool,

    #[arg(long, default_value_t = 20)]
    pub rows: usize,
}

#[derive(Args, Debug, Clone)]
pub struct HarvestArgs {
    #[arg(long = "company")]
    pub companies: Vec<String>,

    #[arg(long = "crop")]
    pub crops: Vec<String>,

    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day included (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long)]
    pub export: bool,

    #[arg(long, default_value_t = 31)]
    pub rows: usize,
}

impl HarvestArgs {
    pub fn selection(&self) -> HarvestSelection {
        HarvestSelection {
            companies: Choice::from_args(&self.companies),
            crops: Choice::from_args(&self.crops),
            from: self.from,
            to: self.to,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CostArgs {
    #[arg(long = "company")]
    pub companies: Vec<String>,

    #[arg(long = "species")]
    pub species: Vec<String>,

    #[arg(long = "field")]
    pub fields: Vec<String>,

    #[arg(long = "crop")]
    pub crops: Vec<String>,

    #[arg(long)]
    pub export: bool,

    #[arg(long, default_value_t = 20)]
    pub rows: usize,
}

impl CostArgs {
    pub fn selection(&self) -> CostSelection {
        CostSelection {
            companies: Choice::from_args(&self.companies),
            species: Choice::from_args(&self.species),
            fields: Choice::from_args(&self.fields),
            crops: Choice::from_args(&self.crops),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ParamsArgs {
    /// Also show the parameters these species would use (defaults if unsaved)
    #[arg(long = "species")]
    pub species: Vec<String>,
}

/// Directives from `RUST_LOG` (e.g. `agro_report=debug`), falling back to INFO
/// when unset or unparseable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber, logging to stderr.
pub fn init_logging() {
    let filter = log_filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_default_under_data_dir() {
        let cli = Cli::try_parse_from(["agro-report", "--data-dir", "/srv/farm", "params"]).unwrap();
        assert_eq!(
            cli.sources.production_path(),
            PathBuf::from("/srv/farm/Produccion Por Cultivo.xlsx")
        );
        assert_eq!(
            cli.sources.params_path(),
            PathBuf::from("/srv/farm/parametros_por_especie.json")
        );
    }

    #[test]
    fn explicit_path_wins() {
        let cli = Cli::try_parse_from([
            "agro-report",
            "costs",
            "--costs",
            "/tmp/costs.csv",
            "--species",
            "Cereal",
        ])
        .unwrap();
        assert_eq!(cli.sources.costs_path(), PathBuf::from("/tmp/costs.csv"));
        let Command::Costs(args) = cli.command else {
            panic!("expected costs command");
        };
        let selection = args.selection();
        assert!(selection.species.allows("Cereal"));
        assert!(!selection.species.allows("Oilseed"));
        assert!(selection.crops.allows("anything"));
    }

    #[test]
    fn economics_parses_edits_and_filters() {
        let cli = Cli::try_parse_from([
            "agro-report",
            "economics",
            "--species",
            "Cereal",
            "--set",
            "Cereal.rent=400",
            "--set",
            "Cereal.net=350",
            "--save",
        ])
        .unwrap();
        let Command::Economics(args) = cli.command else {
            panic!("expected economics command");
        };
        assert_eq!(args.edits.len(), 2);
        assert!(args.save);
        assert!(args.filter.selection().species.allows("Cereal"));
    }

    #[test]
    fn log_filter_keeps_target_directives() {
        assert_eq!(log_filter(Some("agro_report=debug")).to_string(), "agro_report=debug");
        assert_eq!(log_filter(None).to_string(), "info");
    }

    #[test]
    fn negative_edit_is_rejected() {
        let result = Cli::try_parse_from(["agro-report", "economics", "--set", "Cereal.rent=-5"]);
        assert!(result.is_err());
    }
}
