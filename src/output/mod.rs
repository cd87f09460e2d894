mod distribution;
mod format;
mod reconcile;
mod route;

pub(crate) use distribution::{ShareRow, output_distribution_json, print_distribution_table};
pub(crate) use reconcile::{ReconcileRow, ReconcileSummary, output_reconcile_json, print_reconcile_table};
pub(crate) use route::{RouteOutcome, RouteRow, output_route_json, print_route_table};
