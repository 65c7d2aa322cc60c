use std::io::IsTerminal;

use clap::Args;
use cookclock_core::Config;

use crate::render::{self, Style};

#[derive(Args)]
pub struct PresetsArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: PresetsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&config.presets)?);
    } else {
        let style = Style {
            color: std::io::stdout().is_terminal(),
        };
        println!("{}", render::preset_table(&config.presets, &config, style));
    }
    Ok(())
}
