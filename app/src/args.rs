use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "pgcdc.yaml")]
    pub config: String,

    /// Name reported by the event-logging process
    #[arg(long, default_value = "log")]
    pub process_name: String,
}
