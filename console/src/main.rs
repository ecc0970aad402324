mod call;
mod convert;
mod filter;
mod utils;

use call::CallArgs;
use clap::{Parser, Subcommand};
use convert::ConvertArgs;
use filter::FilterArgs;
use utils::UtilsArgs;
use wild::ArgsOs;

#[derive(Parser, Debug)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,)]
struct Cli {
    #[command(subcommand)]
    command: MainMenu,
}

#[derive(Subcommand, Debug)]
enum MainMenu {
    Call {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  CallArgs,
    },

    Filter {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  FilterArgs,
    },

    Convert {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  ConvertArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let args: ArgsOs = wild::args_os();
    let cli = Cli::parse_from(args);

    match cli.command {
        MainMenu::Call { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Filter { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Convert { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
    }
    Ok(())
}
