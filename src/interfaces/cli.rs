use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "docmap")]
#[command(about = "Map model objects to documents, with a per-request query cache.")]
#[command(version)]
pub struct Cli {
    /// Use a throwaway in-memory store instead of the database file
    #[arg(long, global = true)]
    pub memory: bool,

    /// Choose color theme
    #[arg(short = 'T', long, global = true)]
    pub theme: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Insert a document for a model
    Insert {
        model: String,
        /// Attributes as a JSON object
        attributes: String,
    },

    /// Find documents of a model
    Find {
        model: String,
        /// Selector as a JSON object
        #[arg(short, long)]
        filter: Option<String>,
        /// Only load these fields (comma separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Load everything but these fields (comma separated)
        #[arg(long, value_delimiter = ',')]
        without: Vec<String>,
        /// Sort field, prefix with '-' for descending
        #[arg(short, long, allow_hyphen_values = true)]
        sort: Vec<String>,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        skip: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set attributes on every document matching a selector
    Update {
        model: String,
        #[arg(short, long)]
        filter: String,
        /// Attributes as a JSON object
        attributes: String,
    },

    /// Delete documents matching a selector
    Delete {
        model: String,
        #[arg(short, long)]
        filter: String,
    },

    /// Show status
    Status,

    /// Generate config sample
    GenerateConfig,
}
