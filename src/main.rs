// Entry point and command dispatch.
//
// Each subcommand is one computation pass: load the sources it needs,
// apply the selection, aggregate and print markdown previews. The
// interactive mode runs the same passes from a menu and relies on the
// source cache so repeated reports do not re-read unchanged files.
mod aggregate;
mod cache;
mod config;
mod error;
mod filter;
mod loader;
mod margin;
mod normalize;
mod output;
mod params;
mod pipeline;
mod reports;
mod types;
mod util;

#[cfg(test)]
mod testutil;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, Command, CostArgs, EconomicsArgs, HarvestArgs, ParamsArgs, ProductionArgs, Sources};
use loader::LoadReport;
use params::{JsonFileBackend, ParamSheet, ParameterStore};
use pipeline::Analysis;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

const NO_DATA: &str = "No data for the selected filters.\n";

fn print_load(report: &LoadReport) {
    println!(
        "Loaded {} ({} rows)",
        report.source,
        util::format_int(report.kept_rows)
    );
    if report.dropped_rows > 0 {
        println!(
            "Note: {} of {} rows skipped (missing date, company or crop).",
            util::format_int(report.dropped_rows),
            util::format_int(report.total_rows)
        );
    }
}

fn export_rows<T: serde::Serialize>(out_dir: &Path, name: &str, rows: &[T]) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let path = out_dir.join(name);
    output::write_csv(&path, rows).with_context(|| format!("writing {}", path.display()))?;
    println!("(Full table exported to {})\n", path.display());
    Ok(())
}

fn open_params(sources: &Sources) -> Result<ParameterStore<JsonFileBackend>> {
    let path = sources.params_path();
    ParameterStore::open(JsonFileBackend::new(&path))
        .with_context(|| format!("opening parameter file {}", path.display()))
}

fn run_economics(sources: &Sources, args: &EconomicsArgs) -> Result<()> {
    let (production, prod_report) = loader::load_production(&sources.production_path())
        .context("loading production source")?;
    let (costs, cost_report) =
        loader::load_costs(&sources.costs_path()).context("loading cost source")?;
    print_load(&prod_report);
    print_load(&cost_report);
    println!();

    // Parameters are re-read at the start of every pass.
    let mut store = open_params(sources)?;
    let selection = args.filter.selection();
    let species = pipeline::selected_species(&production, &selection);
    let mut sheet = ParamSheet::for_species(&store, species.iter().map(String::as_str));
    for edit in &args.edits {
        info!(species = %edit.species, field = %edit.field, value = edit.value, "parameter edit");
        sheet
            .apply(edit)
            .with_context(|| format!("applying --set {}.{}", edit.species, edit.field))?;
    }

    if args.save {
        sheet.save(&mut store).context("saving parameters")?;
        println!("Parameters saved to {}\n", sources.params_path().display());
    }

    println!("Parameters by species\n");
    let sheet_species: Vec<String> = sheet.entries().keys().cloned().collect();
    output::preview_table_rows(&output::params_rows(&store, &sheet_species, &sheet), args.rows);

    let analysis = match pipeline::analyze(&production, &costs, &selection, &sheet) {
        Analysis::NoData => {
            println!("{}", NO_DATA);
            return Ok(());
        }
        Analysis::Ready(a) => a,
    };

    println!("Economic Summary by Crop");
    println!("(Sorted by final income, highest first)\n");
    let ranked = margin::ranked(&analysis.summaries);
    output::preview_table_rows(&output::summary_rows(&ranked), args.rows);

    println!("Work-order Cost by Crop and Input Type\n");
    output::preview_table_rows(&analysis.cost_breakdown, args.rows);

    let totals = pipeline::totals(&analysis);
    println!(
        "Totals: {} crops, {} ha harvested, final income {} USD\n",
        util::format_int(totals.total_crops),
        util::format_number(totals.total_harvested_area_ha, 2),
        util::format_number(totals.total_final_income, 2)
    );

    if let Some(stem) = &args.export {
        let paths = output::export_analysis(&sources.out_dir, stem, &analysis)
            .context("exporting economic analysis")?;
        println!(
            "Exported {} and {}\n",
            paths.workbook.display(),
            paths.totals.display()
        );
    }
    Ok(())
}

fn run_production(sources: &Sources, args: &ProductionArgs) -> Result<()> {
    let (production, report) = loader::load_production(&sources.production_path())
        .context("loading production source")?;
    print_load(&report);
    println!();

    let filtered = args.filter.selection().apply(&production);
    if filtered.is_empty() {
        println!("{}", NO_DATA);
        return Ok(());
    }

    println!("Production Summary\n");
    let rows = reports::production_rows(&filtered);
    output::preview_table_rows(&rows, args.rows);

    println!("Field Tonnage Share by Species\n");
    output::preview_table_rows(&reports::production_shares(&filtered, |r| r.species.as_str()), args.rows);

    println!("Field Tonnage Share by Crop\n");
    output::preview_table_rows(&reports::production_shares(&filtered, |r| r.crop.as_str()), args.rows);

    if args.export {
        export_rows(&sources.out_dir, "production_report.csv", &rows)?;
    }
    Ok(())
}

fn run_harvest(sources: &Sources, args: &HarvestArgs) -> Result<()> {
    let (loads, report) =
        loader::load_harvest(&sources.harvest_path()).context("loading harvest source")?;
    print_load(&report);
    println!();

    let filtered = args.selection().apply(&loads);
    if filtered.is_empty() {
        println!("{}", NO_DATA);
        return Ok(());
    }

    println!("Daily Harvest (Kg)\n");
    let daily = reports::harvest_daily(&filtered);
    output::preview_table_rows(&daily, args.rows);

    println!("Shrinkage by Company and Crop\n");
    let by_company = reports::harvest_by_company_crop(&filtered);
    output::preview_table_rows(&by_company, args.rows);

    if args.export {
        export_rows(&sources.out_dir, "harvest_daily.csv", &daily)?;
        export_rows(&sources.out_dir, "harvest_by_company_crop.csv", &by_company)?;
    }
    Ok(())
}

fn run_costs(sources: &Sources, args: &CostArgs) -> Result<()> {
    let (costs, report) =
        loader::load_costs(&sources.costs_path()).context("loading cost source")?;
    print_load(&report);
    println!();

    let filtered = args.selection().apply(&costs);
    if filtered.is_empty() {
        println!("{}", NO_DATA);
        return Ok(());
    }

    println!("Cost per Hectare by Crop\n");
    let by_crop = reports::crop_costs_per_ha(&filtered);
    output::preview_table_rows(&by_crop, args.rows);

    println!("Work-order Lines by Crop\n");
    let detail = reports::cost_line_detail(&filtered);
    output::preview_table_rows(&detail, args.rows);

    println!("Cost per Hectare by Input Type\n");
    let by_type = reports::input_type_costs_per_ha(&filtered);
    output::preview_table_rows(&by_type, args.rows);

    println!("Cost per Hectare by Labor / Input\n");
    let by_item = reports::item_costs_per_ha(&filtered);
    output::preview_table_rows(&by_item, args.rows);

    if args.export {
        export_rows(&sources.out_dir, "costs_by_crop.csv", &by_crop)?;
        export_rows(&sources.out_dir, "costs_line_detail.csv", &detail)?;
        export_rows(&sources.out_dir, "costs_by_input_type.csv", &by_type)?;
        export_rows(&sources.out_dir, "costs_by_item.csv", &by_item)?;
    }
    Ok(())
}

fn run_budget(sources: &Sources, args: &CostArgs) -> Result<()> {
    let (costs, cost_report) =
        loader::load_costs(&sources.costs_path()).context("loading cost source")?;
    let (budget, budget_report) =
        loader::load_budget(&sources.budget_path()).context("loading budget source")?;
    print_load(&cost_report);
    print_load(&budget_report);
    println!();

    let filtered = args.selection().apply(&costs);
    if filtered.is_empty() {
        println!("{}", NO_DATA);
        return Ok(());
    }

    let comparison = reports::budget_vs_actual(&filtered, &budget);
    if comparison.is_empty() {
        println!("No comparison data available.\n");
        return Ok(());
    }
    println!("Budget vs Executed by Species\n");
    let rows = reports::budget_rows(&comparison);
    output::preview_table_rows(&rows, args.rows);

    if args.export {
        export_rows(&sources.out_dir, "budget_vs_executed.csv", &rows)?;
    }
    Ok(())
}

fn run_params(sources: &Sources, args: &ParamsArgs) -> Result<()> {
    let store = open_params(sources)?;
    let mut species: Vec<String> = store.stored().keys().cloned().collect();
    for s in &args.species {
        if !species.contains(s) {
            species.push(s.clone());
        }
    }
    println!("Species parameters ({})\n", sources.params_path().display());
    if species.is_empty() {
        println!("(no parameters stored; every species uses the defaults)\n");
        return Ok(());
    }
    let rows = output::params_rows(&store, &species, &store);
    output::preview_table_rows(&rows, rows.len());
    Ok(())
}

/// Print the menu prompt and read one trimmed line.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Returns `true` if the user chose `Y`, `false` for `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn run_interactive(sources: &Sources) -> Result<()> {
    let economics = EconomicsArgs {
        filter: Default::default(),
        edits: Vec::new(),
        save: false,
        export: None,
        rows: 20,
    };
    let production = ProductionArgs {
        filter: Default::default(),
        export: false,
        rows: 20,
    };
    let harvest = HarvestArgs {
        companies: Vec::new(),
        crops: Vec::new(),
        from: None,
        to: None,
        export: false,
        rows: 31,
    };
    let costs = CostArgs {
        companies: Vec::new(),
        species: Vec::new(),
        fields: Vec::new(),
        crops: Vec::new(),
        export: false,
        rows: 20,
    };

    loop {
        println!("Select Report:");
        println!("[1] Economic analysis by species");
        println!("[2] Production by crop");
        println!("[3] Harvest and shrinkage");
        println!("[4] Costs per hectare");
        println!("[5] Budget vs executed");
        println!("[6] Reload source files");
        println!("[0] Exit\n");
        let result = match read_choice().as_str() {
            "1" => run_economics(sources, &economics),
            "2" => run_production(sources, &production),
            "3" => run_harvest(sources, &harvest),
            "4" => run_costs(sources, &costs),
            "5" => run_budget(sources, &costs),
            "6" => {
                cache::clear();
                println!("Sources will be re-read on the next report.\n");
                continue;
            }
            "0" | "" => {
                println!("Exiting the program.");
                return Ok(());
            }
            _ => {
                println!("Invalid choice. Please enter 0-6.\n");
                continue;
            }
        };
        // A failed pass is reported and the session goes on.
        if let Err(e) = result {
            warn!("report failed: {:#}", e);
            eprintln!("Error: {:#}\n", e);
        }
        if !prompt_back_to_menu() {
            println!("Exiting the program.");
            return Ok(());
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    config::init_logging();

    let sources = &cli.sources;
    match &cli.command {
        Command::Economics(args) => run_economics(sources, args),
        Command::Production(args) => run_production(sources, args),
        Command::Harvest(args) => run_harvest(sources, args),
        Command::Costs(args) => run_costs(sources, args),
        Command::Budget(args) => run_budget(sources, args),
        Command::Params(args) => run_params(sources, args),
        Command::Interactive => run_interactive(sources),
    }
}
