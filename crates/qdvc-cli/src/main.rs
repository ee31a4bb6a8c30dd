use std::sync::Arc;
use std::time::Instant;

use atty::Stream;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use qdvc_core::{BufferedConsole, SharedEffects, SystemEffects, QDVC_VERSION};

mod cli;
mod dispatch;
mod output;
mod style;

use cli::QdvcCli;
use output::OutputOptions;
use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = QdvcCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let started = Instant::now();
    let global = dispatch::global_options(&cli);
    let command = dispatch::build_command(&cli.command);
    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));
    let human = !cli.json && !cli.quiet;
    if human {
        println!("{}", style.banner(&format!("Quick DVC v{QDVC_VERSION}")));
    }

    // JSON mode returns the console lines inside the envelope.
    let captured = cli.json.then(|| Arc::new(BufferedConsole::new()));
    let effects: SharedEffects = match &captured {
        Some(console) => Arc::new(SystemEffects::with_console(console.clone())),
        None => Arc::new(SystemEffects::new(cli.quiet)),
    };

    let outcome =
        qdvc_core::execute(&global, &command, effects).map_err(|err| eyre!("{err:?}"))?;
    let opts = OutputOptions { json: cli.json };
    let code = output::emit_output(opts, &style, &outcome, captured.as_deref())?;

    if human {
        println!("{}", style.dimmed(&format!("Finished in {:?}", started.elapsed())));
    }

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("qdvc_core={level},qdvc_cli={level},qdvc_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
