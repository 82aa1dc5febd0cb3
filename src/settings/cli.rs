use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Jira and Confluence dashboard backend")]
pub struct Cli {
    /// Settings file; defaults to settings/dev.toml (debug) or settings/release.toml.
    #[arg(long)]
    pub settings: Option<String>,
}
