use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the configured datasources and emit their documents
    Run {
        #[arg(long, help = "Config file path")]
        config: PathBuf,

        #[arg(long, help = "Directory of the watermark store")]
        state_dir: Option<PathBuf>,

        #[arg(
            long,
            help = "If specified, writes JSON lines to this file instead of stdout"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Only scan the datasource with this id")]
        datasource: Option<String>,
    },
    /// Inspect or reset persisted watermarks
    State {
        #[arg(long, global = true, help = "Directory of the watermark store")]
        state_dir: Option<PathBuf>,

        #[command(subcommand)]
        command: StateCommand,
    },
    Validate {
        #[arg(long, help = "Config file path")]
        config: PathBuf,
    },
    /// Connect to a datasource's source and describe what it returns
    Probe {
        #[arg(long, help = "Config file path")]
        config: PathBuf,

        #[arg(long, help = "Datasource id")]
        datasource: String,
    },
}

#[derive(Subcommand)]
pub enum StateCommand {
    Show {
        #[arg(long, help = "Connector id")]
        connector: String,

        #[arg(long, help = "Datasource id")]
        datasource: String,

        #[arg(
            long,
            help = "If set, prints the state as JSON instead of a table"
        )]
        json: bool,
    },
    List,
    /// Forget a watermark; the next run starts over
    Reset {
        #[arg(long, help = "Connector id")]
        connector: String,

        #[arg(long, help = "Datasource id")]
        datasource: String,
    },
}
