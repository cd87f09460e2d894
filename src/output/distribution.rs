use comfy_table::{Cell, Color};
use serde::Serialize;

use crate::output::format::{
    create_styled_table, format_number, format_share, header_cell, right_cell, to_pretty_json,
};

/// Configured versus observed traffic share of one deployment
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ShareRow {
    pub(crate) deployment_id: String,
    pub(crate) weight: u64,
    pub(crate) configured_share: f64,
    pub(crate) sessions: usize,
    pub(crate) observed_share: f64,
}

#[derive(Serialize)]
struct DistributionOutput<'a> {
    model: &'a str,
    samples: usize,
    deployments: &'a [ShareRow],
}

pub(crate) fn output_distribution_json(model: &str, samples: usize, rows: &[ShareRow]) -> String {
    to_pretty_json(&DistributionOutput {
        model,
        samples,
        deployments: rows,
    })
}

pub(crate) fn print_distribution_table(
    model: &str,
    samples: usize,
    rows: &[ShareRow],
    use_color: bool,
) {
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Deployment", use_color),
        header_cell("Weight", use_color),
        header_cell("Configured", use_color),
        header_cell("Sessions", use_color),
        header_cell("Observed", use_color),
    ]);

    let share_color = if use_color { Some(Color::Green) } else { None };
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.deployment_id),
            right_cell(&format_number(row.weight as i64), None, false),
            right_cell(&format_share(row.configured_share), None, false),
            right_cell(&format_number(row.sessions as i64), None, false),
            right_cell(&format_share(row.observed_share), share_color, false),
        ]);
    }

    println!(
        "\n  Traffic share for {model} over {} synthetic sessions\n",
        format_number(samples as i64)
    );
    println!("{table}");
}
