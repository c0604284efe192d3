use bluemask::optimizer::PhaseSummary;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

pub struct TileStats {
    pub mask_size: usize,
    pub spp: usize,
    pub dimensions: usize,
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

pub fn print_phase_summary(summaries: &[PhaseSummary]) {
    if summaries.is_empty() {
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Dimensions", "Rounds", "Accepted Swaps"]);

    for summary in summaries {
        table.add_row(vec![
            Cell::new(format!(
                "{}-{}",
                summary.dimension + 1,
                summary.dimension + 2
            )),
            Cell::new(summary.rounds).set_alignment(CellAlignment::Right),
            Cell::new(summary.accepted).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("\n{}", table);
}

pub fn print_tile_stats(stats: &TileStats) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Property", "Value"]);

    table.add_row(vec![
        Cell::new("Grid"),
        Cell::new(format!("{0}x{0}", stats.mask_size)),
    ]);
    table.add_row(vec![Cell::new("Samples per pixel"), Cell::new(stats.spp)]);
    table.add_row(vec![Cell::new("Dimensions"), Cell::new(stats.dimensions)]);
    table.add_row(vec![Cell::new("Values"), Cell::new(stats.count)]);
    table.add_row(vec![
        Cell::new("Min"),
        Cell::new(format!("{:.6}", stats.min)),
    ]);
    table.add_row(vec![
        Cell::new("Max"),
        Cell::new(format!("{:.6}", stats.max)),
    ]);
    table.add_row(vec![
        Cell::new("Mean"),
        Cell::new(format!("{:.6}", stats.mean)),
    ]);

    println!("\n{}", table);
}
