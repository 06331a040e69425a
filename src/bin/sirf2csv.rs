//! CLI tool for SIRF PDF to spreadsheet (CSV) conversion

use clap::Parser;
use sirf_inspector::sheet::{workbook, write_csv, Sheet};
use sirf_inspector::{process_file, sirf_columns, ExtractionConfig, ExtractionResult, SirfError};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "sirf2csv",
    about = "Converts Stock Issue Request Form PDFs (or pdf2json output) to CSV sheets"
)]
struct Args {
    /// PDF file, or pdf2json `.json` output
    input: PathBuf,

    /// Directory for the CSV files (defaults to the input's directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Print the extraction result as JSON instead of writing CSV files
    #[arg(long)]
    json: bool,

    /// Detect table headers instead of using the SIRF column template
    #[arg(long)]
    dynamic: bool,

    /// JSON file overriding extraction thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        if args.json {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
        } else {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), SirfError> {
    let config = match &args.config {
        Some(path) => ExtractionConfig::from_json_file(path)?,
        None => ExtractionConfig::default(),
    };

    let start = Instant::now();
    let columns = sirf_columns();
    let schema = if args.dynamic {
        None
    } else {
        Some(columns.as_slice())
    };
    let result = process_file(&args.input, schema, &config)?;
    let elapsed = start.elapsed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let out_dir = args
        .out_dir
        .clone()
        .or_else(|| args.input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    println!("SIRF Conversion");
    println!("===============");
    println!("File: {}", args.input.display());
    print_summary(&result);
    println!("Processing time: {}ms", elapsed.as_millis());
    println!();

    for (idx, sheet) in workbook(&result).iter().enumerate() {
        let path = out_dir.join(sheet_file_name(&stem, idx, &sheet.name));
        write_sheet(sheet, &path)?;
        println!("{:<18} -> {}", sheet.name, path.display());
    }

    Ok(())
}

fn print_summary(result: &ExtractionResult) {
    let found = result.metadata.values().filter(|v| !v.is_empty()).count();
    println!("Metadata fields: {}/{}", found, result.metadata.len());
    if result.has_table() {
        println!("Columns: {}", result.headers.join(" | "));
        println!("Rows: {}", result.rows.len());
    } else {
        println!("Columns: none (no table detected)");
    }
    println!("Page grids: {}", result.page_grids.len());
}

/// `<stem>_sirf.csv` for the main sheet, `<stem>_original_page_N.csv` for grids
fn sheet_file_name(stem: &str, sheet_index: usize, sheet_name: &str) -> String {
    if sheet_index == 0 {
        format!("{}_sirf.csv", stem)
    } else {
        format!("{}_{}.csv", stem, sheet_name.to_lowercase().replace(' ', "_"))
    }
}

fn write_sheet(sheet: &Sheet, path: &Path) -> Result<(), SirfError> {
    let file = File::create(path)?;
    write_csv(sheet, BufWriter::new(file))
}
