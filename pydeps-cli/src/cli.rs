use crate::commands;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pydeps",
    about = "transitive dependency explorer for PyPI packages",
    version,
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the full dependency graph of a package and analyze it
    Resolve(commands::resolve::ResolveArgs),
    /// Show the direct, classified requirements of one release
    Deps(commands::deps::DepsArgs),
}
