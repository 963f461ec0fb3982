use std::path::PathBuf;

use clap::Parser;

/// Coupon poster CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "coupon-poster",
    version,
    about = "Post the next unpublished coupon from the feed to a Facebook page"
)]
pub struct Cli {
    /// Coupon feed URL (overrides COUPONS_API_URL)
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Path of the JSON state file (overrides STATE_FILE)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Request timeout in seconds for every HTTP call
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum message length in characters
    #[arg(long)]
    pub max_message_length: Option<usize>,

    /// Save the state file locally but skip pushing it to the shared store
    #[arg(long)]
    pub no_sync: bool,
}
