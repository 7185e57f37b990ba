use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "Storage Controller", version = "0.1.0")]
/// Control plane for a distributed file-storage network
pub struct Arguments {
    #[arg(short, long)]
    /// Config file with the controller's settings. In YAML format. Defaults are used when omitted.
    pub config: Option<String>,

    #[arg(short, long)]
    /// Log info about registrations, uploads and liveness changes.
    pub verbose: bool,
}
