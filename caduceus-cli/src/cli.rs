//! Command-line surface

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogType {
    Console,
    File,
}

#[derive(Debug, Parser)]
#[command(
    name = "caduceus",
    about = "Set up a UniProt Knowledgebase + NCBI Taxonomy database in PostgreSQL",
    version
)]
pub struct Cli {
    #[arg(long, short = 'd', help = "Name of the target database")]
    pub dbname: String,

    #[arg(long = "dbuser", short = 'U', help = "Database user")]
    pub dbuser: String,

    #[arg(long, short = 'p', default_value = "", help = "Database password")]
    pub password: String,

    #[arg(long, short = 'P', default_value_t = 5432, help = "Database port")]
    pub port: u16,

    #[arg(long, short = 'u', default_value = "localhost", help = "Database host")]
    pub host: String,

    #[arg(
        long,
        short = 'j',
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "How many worker processes the copy is distributed to"
    )]
    pub processes: u16,

    #[arg(
        long = "path-to-source-files",
        short = 'k',
        help = "Use manually prepared source files; skip download and preparation"
    )]
    pub path_to_source_files: Option<PathBuf>,

    #[arg(
        long = "path-to-source-archives",
        short = 'z',
        help = "Use manually downloaded archives; skip download only"
    )]
    pub path_to_source_archives: Option<PathBuf>,

    #[arg(short = 'y', help = "Accept the disk-space prompt automatically")]
    pub yes: bool,

    #[arg(
        long = "trgm",
        short = 'i',
        help = "Build the GIN trigram index on the sequence column"
    )]
    pub trgm: bool,

    #[arg(long, short = 'v', help = "Verbose logging")]
    pub verbose: bool,

    #[arg(
        long = "no-clean-up-on-failure",
        short = 'g',
        help = "Keep the database and source files when setup fails"
    )]
    pub no_clean_up_on_failure: bool,

    #[arg(
        long = "logtype",
        short = 't',
        value_enum,
        default_value_t = LogType::Console,
        help = "Where to write logs"
    )]
    pub logtype: LogType,

    #[arg(long = "loglevel", short = 'l', default_value = "info")]
    pub loglevel: String,

    #[arg(long = "logpath", short = 'L', default_value = "logs")]
    pub logpath: PathBuf,
}
