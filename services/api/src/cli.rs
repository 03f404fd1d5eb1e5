use crate::dashboard::{run_dashboard, run_what_if, DashboardArgs, WhatIfArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dealer_kpi::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Dealer KPI Dashboard",
    about = "Serve and render activity-weighted dealer service KPIs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Render the KPI dashboard for a filtered dealer selection
    Dashboard(DashboardArgs),
    /// Estimate incremental gross from conversion and accessory uplift
    WhatIf(WhatIfArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Directory holding dealers.csv and kpi_series.csv (overrides KPI_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Dashboard(args) => run_dashboard(args),
        Command::WhatIf(args) => run_what_if(args),
    }
}
