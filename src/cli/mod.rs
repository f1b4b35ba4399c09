use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh the knowledge index for a workspace directory
    Refresh {
        /// Workspace root to index
        path: String,

        /// Tenant to index for
        #[arg(short, long)]
        user: String,
    },

    /// Search indexed knowledge
    Search {
        query: String,

        /// Tenant to search for
        #[arg(short, long)]
        user: String,

        #[arg(long, default_value = "10")]
        num: usize,

        /// Restrict to one category: CODE, DOCUMENT or CONFIG
        #[arg(long)]
        file_type: Option<String>,
    },

    /// Run the HTTP knowledge API
    Serve {
        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Show per-user index statistics
    Stats {
        #[arg(short, long)]
        user: String,
    },
}
