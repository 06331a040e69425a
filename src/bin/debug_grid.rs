//! Debug tool: print row clusters and projection columns per page
//!
//! Usage: debug_grid <pdf_or_json> [page_number]
//!
//! Shows each row's anchor y and its fragments, the projection-profile
//! column intervals, and which table header row (if any) was detected.

use sirf_inspector::header::find_header_row;
use sirf_inspector::projection::{project_page, segment_columns};
use sirf_inspector::rows::cluster_rows;
use sirf_inspector::{load_pages, ExtractionConfig};
use std::env;
use std::process;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <pdf_or_json> [page_number]", args[0]);
        eprintln!();
        eprintln!("Prints row clusters and projection-profile columns per page.");
        eprintln!("If page_number is given, only that page is shown.");
        process::exit(1);
    }

    let path = &args[1];
    let filter_page: Option<usize> = args.get(2).and_then(|s| s.parse().ok());
    let config = ExtractionConfig::default();

    let pages = match load_pages(path, &config) {
        Ok(pages) => pages,
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            process::exit(1);
        }
    };

    if pages.is_empty() {
        eprintln!("No pages found.");
        process::exit(0);
    }

    match pages.first().and_then(|p| find_header_row(&p.fragments, &config)) {
        Some((y, header)) => {
            let names: Vec<&str> = header.iter().map(|f| f.text.as_str()).collect();
            eprintln!("Header row at y={:.1}: {}", y, names.join(" | "));
        }
        None => eprintln!("No header row detected on page 1"),
    }
    eprintln!();

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        if filter_page.is_some_and(|p| p != page_num) {
            continue;
        }

        let rows = cluster_rows(&page.fragments, config.row_threshold);
        println!(
            "===== PAGE {} ({} fragments, {} rows) =====",
            page_num,
            page.fragments.len(),
            rows.len()
        );

        let columns = segment_columns(&page.fragments, &config);
        let spans: Vec<String> = columns
            .iter()
            .map(|c| format!("[{:.1}, {:.1})", c.start, c.end))
            .collect();
        println!("Projection columns: {}", spans.join(" "));
        println!("{}", "-".repeat(100));

        println!("{:>8} {:>5}  {}", "Y", "Items", "Fragments (x:text)");
        for row in &rows {
            let items: Vec<String> = row
                .fragments
                .iter()
                .map(|f| format!("{:.1}:{}", f.x, f.text))
                .collect();
            println!("{:8.2} {:>5}  {}", row.y, row.fragments.len(), items.join("  "));
        }

        if let Some(grid) = project_page(page, idx, &config) {
            println!();
            println!("Grid ({}):", grid.name);
            for cells in &grid.cells {
                println!("  | {} |", cells.join(" | "));
            }
        }
        println!();
    }
}
