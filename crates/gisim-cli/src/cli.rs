use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "GISim CLI - A command-line interface for simulating grazing-incidence scattering and specular reflectivity from multilayer samples.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a grazing-incidence scattering simulation over a 2D detector.
    Run(RunArgs),
    /// Compute a specular reflectivity curve over a grid of incidence angles.
    Specular(SpecularArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the scene description file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub scene: PathBuf,

    /// Path for the output intensity table (CSV).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Override the number of simulation workers from the scene file.
    #[arg(short = 'w', long, value_name = "INT")]
    pub workers: Option<usize>,

    /// Override the number of sub-slices per particle layer from the scene file.
    #[arg(long, value_name = "INT")]
    pub subslices: Option<usize>,

    /// Enable graded-interface material averaging, overriding the scene file.
    #[arg(long)]
    pub average_materials: bool,
}

/// Arguments for the `specular` subcommand.
#[derive(Args, Debug)]
pub struct SpecularArgs {
    /// Path to the scene description file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub scene: PathBuf,

    /// Path for the output reflectivity table (CSV).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Smallest incidence angle of the scan, in degrees.
    #[arg(long, default_value_t = 0.0, value_name = "DEG")]
    pub alpha_min: f64,

    /// Largest incidence angle of the scan, in degrees.
    #[arg(long, default_value_t = 2.0, value_name = "DEG")]
    pub alpha_max: f64,

    /// Number of points in the angle grid.
    #[arg(short = 'n', long, default_value_t = 500, value_name = "INT")]
    pub n_points: usize,
}
