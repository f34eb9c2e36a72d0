use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Motion and sound triggered security monitoring", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// Show the monitoring status of the running service
    Status,
    /// List recordings held by the running service
    Recordings,
}
