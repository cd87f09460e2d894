use comfy_table::{Cell, Color};
use serde::Serialize;

use stickyledger::consts::UNKNOWN;
use stickyledger::gateway::Reconciliation;

use crate::output::format::{
    create_styled_table, format_cost, format_number, header_cell, right_cell, to_pretty_json,
};

/// A replayed call record and what reconciliation made of it
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReconcileRow {
    pub(crate) source: String,
    pub(crate) line: usize,
    #[serde(flatten)]
    pub(crate) reconciliation: Reconciliation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct ReconcileSummary {
    pub(crate) files: usize,
    /// Records whose usage was reconciled
    pub(crate) reconciled: usize,
    /// Well-formed records left untouched (no usage, or a pricing fault)
    pub(crate) untouched: usize,
    /// Lines that were not `{"call": {..}, "response": ..}` records
    pub(crate) skipped: usize,
    /// Records where a computed cost replaced the prior estimate
    pub(crate) priced: usize,
    pub(crate) prior_total: f64,
    pub(crate) final_total: f64,
}

impl ReconcileSummary {
    pub(crate) fn record(&mut self, rec: &Reconciliation) {
        self.reconciled += 1;
        if rec.cost.valid {
            self.priced += 1;
        }
        self.prior_total += rec.prior_cost.unwrap_or(0.0);
        self.final_total += rec.final_cost.unwrap_or(0.0);
    }
}

#[derive(Serialize)]
struct ReconcileOutput<'a> {
    records: &'a [ReconcileRow],
    summary: &'a ReconcileSummary,
}

pub(crate) fn output_reconcile_json(rows: &[ReconcileRow], summary: &ReconcileSummary) -> String {
    to_pretty_json(&ReconcileOutput {
        records: rows,
        summary,
    })
}

pub(crate) fn print_reconcile_table(rows: &[ReconcileRow], summary: &ReconcileSummary, use_color: bool) {
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Record", use_color),
        header_cell("Model", use_color),
        header_cell("Prompt", use_color),
        header_cell("Output", use_color),
        header_cell("Cache Read", use_color),
        header_cell("Cache Write", use_color),
        header_cell("Total", use_color),
        header_cell("Prior", use_color),
        header_cell("Final", use_color),
        header_cell("Corrections", use_color),
    ]);

    let cost_color = if use_color { Some(Color::Green) } else { None };
    for row in rows {
        let rec = &row.reconciliation;
        let usage = &rec.usage;
        let corrections = rec
            .corrections
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let final_color = if rec.cost.valid { cost_color } else { None };
        table.add_row(vec![
            Cell::new(format!("{}:{}", row.source, row.line)),
            Cell::new(rec.model.as_deref().unwrap_or(UNKNOWN)),
            right_cell(&format_number(usage.prompt_tokens), None, false),
            right_cell(&format_number(usage.completion_tokens), None, false),
            right_cell(&format_number(usage.cache_read_tokens), None, false),
            right_cell(&format_number(usage.cache_creation_tokens), None, false),
            right_cell(&format_number(usage.total_tokens), None, false),
            right_cell(&format_cost(rec.prior_cost), None, false),
            right_cell(&format_cost(rec.final_cost), final_color, false),
            Cell::new(corrections),
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL"),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        right_cell(&format_cost(Some(summary.prior_total)), None, true),
        right_cell(&format_cost(Some(summary.final_total)), cost_color, true),
        Cell::new(""),
    ]);

    println!("\n  Usage reconciliation\n");
    println!("{table}");
    println!(
        "\n  {} files, {} reconciled ({} priced), {} untouched, {} skipped lines",
        summary.files, summary.reconciled, summary.priced, summary.untouched, summary.skipped
    );
}
