use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "fedql")]
/// FedQL command line tool to query and update a federation of RDF sources
pub struct Args {
    /// The federation configuration file
    #[arg(short, long, global = true, default_value = "federation.json", value_hint = ValueHint::FilePath)]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a query and print the JSON-LD response
    Query {
        /// File with the selections of the query as a JSON array
        ///
        /// If no file is given, stdin is read.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        query_file: Option<PathBuf>,
        /// Indent the response
        #[arg(long)]
        pretty: bool,
    },
    /// Apply mutation fields and print the JSON-LD response of their selections
    ///
    /// Mutations are written to the mutation service of the federation.
    Mutate {
        /// File with the mutation fields as a JSON array of selections
        ///
        /// If no file is given, stdin is read.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        query_file: Option<PathBuf>,
        /// Indent the response
        #[arg(long)]
        pretty: bool,
    },
    /// Print how a query would be split between the services
    Plan {
        /// File with the selections of the query as a JSON array
        ///
        /// If no file is given, stdin is read.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        query_file: Option<PathBuf>,
    },
    /// Apply a SPARQL update to one service
    ///
    /// Local services write the result back to their file.
    Update {
        /// The id of the service to update
        #[arg(short, long)]
        service: String,
        /// The SPARQL update
        #[arg(short, long, conflicts_with = "update_file")]
        update: Option<String>,
        /// File with the SPARQL update
        ///
        /// If neither an update nor a file is given, stdin is read.
        #[arg(long, value_hint = ValueHint::FilePath)]
        update_file: Option<PathBuf>,
    },
}
