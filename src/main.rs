use clap::Parser;
use tasktree::cli::commands::Cli;
use tasktree::cli::handlers;
use tasktree::io::config_io;
use tasktree::logging;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand → launch TUI (logs go to a file there)
            launch_tui(&cli)
        }
        Some(_) => {
            logging::init_stderr(cli.verbose);
            handlers::dispatch(cli)
        }
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn launch_tui(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let dir = match &cli.dir {
        Some(d) => d.clone(),
        None => std::env::current_dir()?,
    };
    let loaded = config_io::load_config(&dir, cli.config.as_deref())?;
    tasktree::tui::run(&loaded, cli.scope.as_deref())
}
