use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stratum-replicate", version = "0.1.0", about = "Oplog-to-SQL replication engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the importer once: snapshot every configured namespace into the target.
    Import(ConnectArgs),

    /// Enter the tail loop: stream oplog entries into the target until stopped.
    Tail(ConnectArgs),

    /// Run the importer (if needed) and then enter the tail loop.
    Run(ConnectArgs),
}

#[derive(clap::Args, Clone)]
pub struct ConnectArgs {
    /// Mongo-compatible connection string for the source.
    #[arg(long, env = "REPLICATE_SOURCE_URI")]
    pub source_uri: String,

    /// PostgreSQL connection string for the target.
    #[arg(long, env = "REPLICATE_TARGET_URI")]
    pub target_uri: String,

    /// Path to the YAML schema spec.
    #[arg(long, env = "REPLICATE_SCHEMA_FILE")]
    pub schema_file: String,

    /// Path to the sled database backing the tailer's resume timestamp.
    #[arg(long, default_value = "./replicate-state", env = "REPLICATE_STATE_DIR")]
    pub state_dir: String,

    /// Force the importer to run even if a resume timestamp exists.
    #[arg(long)]
    pub reimport: bool,

    /// Run the importer only; do not touch the tailer's timestamp.
    #[arg(long)]
    pub skip_tail: bool,

    /// Neither drop during schema creation nor truncate before import.
    #[arg(long)]
    pub no_drop_tables: bool,

    /// Seconds-since-epoch override for the resume timestamp on tail.
    #[arg(long)]
    pub tail_from: Option<u32>,

    /// Drop delete ops silently.
    #[arg(long)]
    pub ignore_delete: bool,

    /// Under PostgreSQL, suppress per-row errors that carry a structured result.
    #[arg(long)]
    pub unsafe_mode: bool,
}

impl From<ConnectArgs> for engine_runtime::Config {
    fn from(args: ConnectArgs) -> Self {
        let mut config = engine_runtime::Config::new(
            args.source_uri,
            args.target_uri,
            args.schema_file.into(),
            args.state_dir.into(),
        );
        config.reimport = args.reimport;
        config.skip_tail = args.skip_tail;
        config.no_drop_tables = args.no_drop_tables;
        config.tail_from = args.tail_from;
        config.ignore_delete = args.ignore_delete;
        config.unsafe_mode = args.unsafe_mode;
        config
    }
}
