use clap::Parser;
use std::path::PathBuf;

/// GitHub repository harvesting tool: exhaustively enumerates repositories
/// for a topic/language pair by star-bucketing the search space, then
/// downloads a named configuration file from every repository that has one.
#[derive(Parser)]
#[clap(
    author,
    version,
    about,
    long_about = "Enumerates every GitHub repository matching a topic and language by adaptively partitioning the star-count axis under the search API's 1000-result cap, then filters the collection down to repositories containing a named configuration file and downloads those files."
)]
pub struct Args {
    /// Topic to enumerate repositories for.
    #[clap(short, long, default_value = "serverless")]
    pub topic: String,

    /// Language filter applied to every search.
    #[clap(short, long, default_value = "js")]
    pub language: String,

    /// Configuration file name to look for in each collected repository.
    #[clap(short, long, default_value = "serverless.yml")]
    pub filename: String,

    /// Directory the timestamp-named snapshots are written into.
    #[clap(short, long, default_value = ".")]
    pub output: PathBuf,

    /// GitHub API token. Falls back to the GITHUB_TOKEN environment variable.
    #[clap(long)]
    pub token: Option<String>,

    /// Take an abuse-avoidance pause after this many repositories during the
    /// content phase. 0 disables the pause.
    #[clap(long, value_name = "NUM", default_value = "400")]
    pub pause_every: usize,

    /// Length of the abuse-avoidance pause, in seconds.
    #[clap(long, value_name = "SECS", default_value = "7200")]
    pub pause_secs: u64,

    /// Skip enumeration and re-enter at the content phase from an existing
    /// all-repos snapshot.
    #[clap(long, value_name = "PATH")]
    pub repos_file: Option<PathBuf>,
}
