use clap::Parser;
use legality_cli::{run, Cli};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    legality_console::init();

    run(Cli::parse())
}
