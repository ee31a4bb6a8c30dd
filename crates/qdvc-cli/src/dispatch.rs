use qdvc_core::{GlobalOptions, SyncCommand};

use crate::cli::{CommandCli, QdvcCli};

pub fn global_options(cli: &QdvcCli) -> GlobalOptions {
    GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
        username: cli.username.clone(),
        password: cli.password.clone(),
    }
}

pub fn build_command(command: &CommandCli) -> SyncCommand {
    match command {
        CommandCli::Add(args) => SyncCommand::Add {
            paths: args.paths.clone(),
        },
        CommandCli::Pull(args) => SyncCommand::Pull {
            paths: args.paths.clone(),
        },
        CommandCli::Push(args) => SyncCommand::Push {
            paths: args.paths.clone(),
        },
        CommandCli::Status(args) => SyncCommand::Status {
            paths: args.target.paths.clone(),
            remote: args.repo,
        },
        CommandCli::Clean(args) => SyncCommand::Clean {
            paths: args.target.paths.clone(),
            force: args.force,
        },
    }
}
