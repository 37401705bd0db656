use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bulkfhir")]
#[command(about = "Fetch FHIR bulk export data and reshape it into tables")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log filter (e.g. info, bulkfhir_client=debug)
    #[arg(long, global = true, env = "BULKFHIR_LOG", default_value = "warn")]
    pub log: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a bulk export against a server and reshape the results
    Fetch(FetchArgs),
    /// Reshape a local NDJSON dump without any network access
    Local(LocalArgs),
    /// List the resource types available in a local NDJSON dump
    Types(TypesArgs),
}

#[derive(clap::Args)]
pub struct FetchArgs {
    /// FHIR server base URL
    #[arg(short, long, env = "BULKFHIR_SERVER")]
    pub server: String,

    /// Export endpoint segment (e.g. Patient, or Group/123 for a group export)
    #[arg(long, default_value = "Patient")]
    pub endpoint: String,

    /// Comma-separated resource types to export (e.g. Patient,Observation)
    #[arg(short, long, value_delimiter = ',')]
    pub types: Vec<String>,

    /// Path to a JSON extraction rules file
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Directory to write one CSV file per resource type (stdout if omitted)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Pre-acquired bearer token
    #[arg(long, conflicts_with_all = ["client_id", "key_file", "kid"])]
    pub token: Option<String>,

    /// SMART Backend Services client id
    #[arg(long, requires_all = ["key_file", "kid"])]
    pub client_id: Option<String>,

    /// Path to the registered RSA private key (PEM)
    #[arg(long, requires = "client_id")]
    pub key_file: Option<PathBuf>,

    /// Key id (kid) registered with the authorization server
    #[arg(long, requires = "client_id")]
    pub kid: Option<String>,
}

#[derive(clap::Args)]
pub struct LocalArgs {
    /// Path to an NDJSON dump (e.g. a Synthea export)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Path to a JSON extraction rules file
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Directory to write one CSV file per resource type (stdout if omitted)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct TypesArgs {
    /// Path to an NDJSON dump
    #[arg(short, long)]
    pub file: PathBuf,
}
