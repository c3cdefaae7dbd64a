use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "glass-gate",
    version,
    about = "Authorization and directive resolution for looking-glass queries"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "glass-gate.yaml")]
    pub config: PathBuf,

    /// Path to the devices file (overrides config file setting)
    #[arg(long, global = true)]
    pub devices: Option<PathBuf>,

    /// Path to the directives file (overrides config file setting)
    #[arg(long, global = true)]
    pub directives: Option<PathBuf>,

    /// Plugin directory (overrides config file setting)
    #[arg(long, global = true)]
    pub plugin_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration and print a summary
    Check,

    /// Decide whether a query is permitted and print the result as JSON
    Authorize {
        /// Device id
        #[arg(long)]
        device: String,

        /// Directive id
        #[arg(long)]
        directive: String,

        /// Query target (IP prefix or free-form value)
        #[arg(long)]
        target: String,
    },

    /// Print the public device inventory as JSON
    Inventory,

    /// Print the grouped UI catalog as JSON
    Catalog,

    /// Keep a snapshot loaded, reloading on SIGHUP
    Watch,
}
