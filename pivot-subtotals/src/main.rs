//! # pivot-subtotals
//!
//! Reads a worksheet, pivots it three ways and writes the results to a new
//! workbook:
//!
//! - **Standard Pivot**: the plain pivot, no subtotals
//! - **Row Subtotals**: a subtotal row for every level of the row hierarchy
//! - **Full Subtotals**: subtotals on both axes plus grand totals
//!
//! ## Usage
//!
//! ```bash
//! # Sum TotalPrice by Category/Product and Region/City
//! pivot-subtotals sales.xlsx --values TotalPrice --rows Category,Product --columns Region,City
//!
//! # Load the pivot from a JSON definition, override the aggregation
//! pivot-subtotals sales.xlsx --definition pivot.json --agg mean
//!
//! # Totals after their children, with margins on the row-subtotal sheet
//! pivot-subtotals sales.xlsx --definition pivot.json --subtotals bottom --margins
//! ```
//!
//! Set `RUST_LOG=debug` to trace every aggregation pass.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use persistence::{load_dataset, save_xlsx, Sheet, Workbook};
use subtotal_pivot::{SubtotalDefinition, SubtotalLocation, SubtotalMode};
use tabular_engine::{AggregationType, Value};

#[derive(Parser, Debug)]
#[command(name = "pivot-subtotals")]
#[command(version)]
#[command(about = "Pivot a worksheet with hierarchical subtotals")]
#[command(long_about = None)]
struct Cli {
    /// Source workbook (.xlsx)
    input: PathBuf,

    /// Sheet to read (defaults to the first sheet)
    #[arg(long, short)]
    sheet: Option<String>,

    /// JSON pivot definition; flags below override its fields
    #[arg(long, short)]
    definition: Option<PathBuf>,

    /// Column to aggregate
    #[arg(long)]
    values: Option<String>,

    /// Row hierarchy, outermost first
    #[arg(long, value_delimiter = ',')]
    rows: Vec<String>,

    /// Column hierarchy, outermost first
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Aggregation function: sum, count, mean, min, max, std, var, product...
    #[arg(long)]
    agg: Option<String>,

    /// Shown where a combination has no data: a number, text, or NA
    #[arg(long)]
    fill: Option<String>,

    /// Where subtotals sit relative to their group
    #[arg(long, value_enum)]
    subtotals: Option<Placement>,

    /// Add a grand-total row and column to the row-subtotal sheet
    #[arg(long)]
    margins: bool,

    /// Output workbook (defaults to <input>_pivtab.xlsx)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Placement {
    Top,
    Bottom,
}

impl From<Placement> for SubtotalLocation {
    fn from(placement: Placement) -> Self {
        match placement {
            Placement::Top => SubtotalLocation::AtTop,
            Placement::Bottom => SubtotalLocation::AtBottom,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(output) => {
            println!("{}", output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<PathBuf> {
    let definition = build_definition(cli)?;
    let dataset = load_dataset(&cli.input, cli.sheet.as_deref())
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    let standard = definition
        .standard(&dataset)
        .context("standard pivot failed")?;
    let row_subtotals = definition
        .clone()
        .with_mode(SubtotalMode::RowSubtotals)
        .calculate(&dataset)
        .context("row subtotal pivot failed")?;
    let full_subtotals = definition
        .clone()
        .with_mode(SubtotalMode::FullSubtotals)
        .calculate(&dataset)
        .context("full subtotal pivot failed")?;

    let workbook = Workbook::from_sheets(vec![
        Sheet::from_table("Standard Pivot", &standard),
        Sheet::from_table("Row Subtotals", &row_subtotals),
        Sheet::from_table("Full Subtotals", &full_subtotals),
    ]);

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.input));
    save_xlsx(&workbook, &output).with_context(|| format!("failed to write {}", output.display()))?;

    log::info!(
        "[PIVOT] wrote {} (standard {}x{}, row subtotals {}x{}, full subtotals {}x{})",
        output.display(),
        standard.row_count(),
        standard.column_count(),
        row_subtotals.row_count(),
        row_subtotals.column_count(),
        full_subtotals.row_count(),
        full_subtotals.column_count()
    );
    Ok(output)
}

/// Merges the definition file, if any, with the command-line flags.
fn build_definition(cli: &Cli) -> Result<SubtotalDefinition> {
    let mut definition = match &cli.definition {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read definition {}", path.display()))?;
            serde_json::from_str::<SubtotalDefinition>(&json)
                .with_context(|| format!("invalid definition {}", path.display()))?
        }
        None => {
            let Some(values) = &cli.values else {
                bail!("either --definition or --values is required");
            };
            SubtotalDefinition::new(values.clone(), Vec::new())
        }
    };

    if let Some(values) = &cli.values {
        definition.value_field = values.clone();
    }
    if !cli.rows.is_empty() {
        definition.row_fields = cli.rows.clone();
    }
    if !cli.columns.is_empty() {
        definition.column_fields = cli.columns.clone();
    }
    if let Some(agg) = &cli.agg {
        definition.aggregation = agg
            .parse::<AggregationType>()
            .with_context(|| format!("invalid --agg '{}'", agg))?;
    }
    if let Some(fill) = &cli.fill {
        definition.options.fill_value = parse_fill(fill);
    }
    if let Some(placement) = cli.subtotals {
        definition.options.subtotal_location = placement.into();
    }
    if cli.margins {
        definition.options.include_margins = true;
    }

    if definition.row_fields.is_empty() {
        bail!("no row fields given: pass --rows or set row_fields in the definition");
    }
    Ok(definition)
}

fn parse_fill(text: &str) -> Value {
    match text.trim() {
        "" | "NA" | "NaN" | "nan" => Value::Missing,
        other => other
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::Text(other.to_string())),
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pivot".to_string());
    input.with_file_name(format!("{}_pivtab.xlsx", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::{load_xlsx, SavedCellValue};
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pivot-subtotals").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_build_a_definition() {
        let cli = parse(&[
            "sales.xlsx",
            "--values",
            "TotalPrice",
            "--rows",
            "Category,Product",
            "--columns",
            "Region,City",
            "--agg",
            "mean",
            "--fill",
            "0",
            "--subtotals",
            "bottom",
            "--margins",
        ]);
        let definition = build_definition(&cli).unwrap();

        assert_eq!(definition.value_field, "TotalPrice");
        assert_eq!(definition.row_fields, vec!["Category", "Product"]);
        assert_eq!(definition.column_fields, vec!["Region", "City"]);
        assert_eq!(definition.aggregation, AggregationType::Average);
        assert_eq!(definition.options.fill_value, Value::Number(0.0));
        assert_eq!(definition.options.subtotal_location, SubtotalLocation::AtBottom);
        assert!(definition.options.include_margins);
    }

    #[test]
    fn flags_override_the_definition_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pivot.json");
        fs::write(
            &path,
            r#"{ "value_field": "TotalPrice", "row_fields": ["Category"], "aggregation": "max" }"#,
        )
        .unwrap();

        let cli = parse(&["sales.xlsx", "--definition", path.to_str().unwrap(), "--agg", "sum"]);
        let definition = build_definition(&cli).unwrap();

        assert_eq!(definition.row_fields, vec!["Category"]);
        assert_eq!(definition.aggregation, AggregationType::Sum);
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert!(build_definition(&parse(&["sales.xlsx"])).is_err());
        assert!(build_definition(&parse(&["sales.xlsx", "--values", "TotalPrice"])).is_err());
        assert!(build_definition(&parse(&["sales.xlsx", "--values", "V", "--rows", "A", "--agg", "median"])).is_err());
    }

    #[test]
    fn fill_values_parse_as_numbers_text_or_missing() {
        assert_eq!(parse_fill("NA"), Value::Missing);
        assert_eq!(parse_fill("-1.5"), Value::Number(-1.5));
        assert_eq!(parse_fill("n/a"), Value::from("n/a"));
    }

    #[test]
    fn default_output_sits_next_to_the_input() {
        assert_eq!(
            default_output(Path::new("test_data/sampledatafoodsales.xlsx")),
            PathBuf::from("test_data/sampledatafoodsales_pivtab.xlsx")
        );
    }

    #[test]
    fn writes_three_pivot_sheets() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("sales.xlsx");

        let mut sheet = Sheet::new("Data");
        for (col, name) in ["Category", "Product", "Region", "City", "TotalPrice"].iter().enumerate() {
            sheet.set(0, col as u32, SavedCellValue::Text(name.to_string()));
        }
        let records = [
            ("Fruit", "Apple", "East", "NY", 10.0),
            ("Fruit", "Banana", "East", "NY", 5.0),
            ("Veg", "Carrot", "West", "LA", 7.0),
        ];
        for (i, (category, product, region, city, price)) in records.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.set(row, 0, SavedCellValue::Text(category.to_string()));
            sheet.set(row, 1, SavedCellValue::Text(product.to_string()));
            sheet.set(row, 2, SavedCellValue::Text(region.to_string()));
            sheet.set(row, 3, SavedCellValue::Text(city.to_string()));
            sheet.set(row, 4, SavedCellValue::Number(*price));
        }
        save_xlsx(&Workbook::from_sheets(vec![sheet]), &input).unwrap();

        let cli = parse(&[
            input.to_str().unwrap(),
            "--values",
            "TotalPrice",
            "--rows",
            "Category,Product",
            "--columns",
            "Region,City",
            "--margins",
        ]);
        let output = run(&cli).unwrap();
        assert_eq!(output, dir.path().join("sales_pivtab.xlsx"));

        let written = load_xlsx(&output).unwrap();
        let names: Vec<&str> = written.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Standard Pivot", "Row Subtotals", "Full Subtotals"]);

        // Full subtotals: two column header rows, a row-name row, then the
        // grand-total row first with the grand total in the first data column.
        let full = written.sheet("Full Subtotals").unwrap();
        assert_eq!(full.get(3, 2), Some(&SavedCellValue::Number(22.0)));
    }
}
