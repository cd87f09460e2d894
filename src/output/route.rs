use comfy_table::{Cell, Color};
use serde::Serialize;

use crate::output::format::{create_styled_table, format_number, header_cell, right_cell, to_pretty_json};

/// How a session was routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum RouteOutcome {
    Selected,
    Passthrough,
    NoMatch,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RouteRow {
    pub(crate) session_id: String,
    pub(crate) outcome: RouteOutcome,
    pub(crate) deployment_id: Option<String>,
    pub(crate) weight: Option<u64>,
}

#[derive(Serialize)]
struct RouteOutput<'a> {
    model: &'a str,
    candidates: usize,
    routes: &'a [RouteRow],
}

pub(crate) fn output_route_json(model: &str, candidates: usize, rows: &[RouteRow]) -> String {
    to_pretty_json(&RouteOutput {
        model,
        candidates,
        routes: rows,
    })
}

pub(crate) fn print_route_table(model: &str, candidates: usize, rows: &[RouteRow], use_color: bool) {
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Session", use_color),
        header_cell("Deployment", use_color),
        header_cell("Weight", use_color),
    ]);

    let miss_color = if use_color { Some(Color::Yellow) } else { None };
    for row in rows {
        let deployment = match row.outcome {
            RouteOutcome::Selected => Cell::new(row.deployment_id.as_deref().unwrap_or_default()),
            RouteOutcome::Passthrough => styled(Cell::new("(any)"), miss_color),
            RouteOutcome::NoMatch => styled(Cell::new("(none)"), miss_color),
        };
        let weight = row.weight.map(|w| format_number(w as i64)).unwrap_or_default();
        table.add_row(vec![
            Cell::new(&row.session_id),
            deployment,
            right_cell(&weight, None, false),
        ]);
    }

    println!("\n  Sticky routing for {model} ({candidates} candidates)\n");
    println!("{table}");
}

fn styled(cell: Cell, color: Option<Color>) -> Cell {
    match color {
        Some(c) => cell.fg(c),
        None => cell,
    }
}
