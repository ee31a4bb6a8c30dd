use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

pub const QDVC_BEFORE_HELP: &str = concat!(
    "Quick DVC ",
    env!("CARGO_PKG_VERSION"),
    " – parallel sync of DVC-tracked files with an HTTP artifact store\n\n",
    "\x1b[1;36mCommands\x1b[0m\n",
    "  add              Track files: write .dvc pointers and copy content into the cache.\n",
    "  pull             Restore working files from the cache, downloading missing content.\n",
    "  push             Upload cached content the remote does not have yet.\n",
    "  status           Compare working files with their pointers (--repo: with the remote).\n",
    "  clean            Delete working files whose content is recorded (--force: modified too).\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "qdvc",
    author,
    version,
    disable_help_subcommand = true,
    before_help = QDVC_BEFORE_HELP
)]
#[allow(clippy::struct_excessive_bools)]
pub struct QdvcCli {
    #[arg(short, long, help = "Remote username", global = true)]
    pub username: Option<String>,
    #[arg(short, long, help = "Remote password or token", global = true)]
    pub password: Option<String>,
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit a {status,message,details} JSON envelope",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: CommandCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandCli {
    #[command(
        about = "Track files: write pointer files and copy the content into the cache.",
        override_usage = "qdvc add <PATH> [PATH ...]"
    )]
    Add(PathArgs),
    #[command(
        about = "Restore working files, downloading content missing from the cache.",
        override_usage = "qdvc pull <PATH> [PATH ...]"
    )]
    Pull(PathArgs),
    #[command(
        about = "Upload cached content that the remote does not have yet.",
        override_usage = "qdvc push <PATH> [PATH ...]"
    )]
    Push(PathArgs),
    #[command(
        about = "Report tracked files that differ from their pointers or the cache.",
        override_usage = "qdvc status [--repo] <PATH> [PATH ...]"
    )]
    Status(StatusArgs),
    #[command(
        about = "Delete working files whose content is recorded by their pointers.",
        override_usage = "qdvc clean [--force] <PATH> [PATH ...]"
    )]
    Clean(CleanArgs),
}

#[derive(Args, Debug)]
pub struct PathArgs {
    #[arg(
        value_name = "PATH",
        help = "Files, directories, or glob expressions (e.g. Data/*/Images64)"
    )]
    pub paths: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[arg(long, help = "Compare against the remote store instead of the working copy")]
    pub repo: bool,
    #[command(flatten)]
    pub target: PathArgs,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    #[arg(long, help = "Also delete working files that no longer match their pointer")]
    pub force: bool,
    #[command(flatten)]
    pub target: PathArgs,
}
