use clap::Arg;
use clap::ArgAction;
use clap::Command;

pub fn build_cli() -> Command {
    Command::new("farmware")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal dashboard for dispatching SMS advisories to farmers")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a config.toml (defaults to the user config directory)")
                .global(true),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Backend base URL (overrides config and FARMWARE_BASE_URL)")
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write JSON logs to this file instead of the default data directory")
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("dashboard").about("Open the interactive dashboard (default)"))
        .subcommand(
            Command::new("list")
                .about("Print farmers or advisories")
                .arg(
                    Arg::new("collection")
                        .help("Which collection to print")
                        .required(true)
                        .value_parser(["farmers", "advisories"])
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("send")
                .about("Send one advisory to one farmer and print the result")
                .arg(
                    Arg::new("advisory")
                        .long("advisory")
                        .short('a')
                        .help("Advisory id")
                        .required(true),
                )
                .arg(
                    Arg::new("phone")
                        .long("phone")
                        .short('p')
                        .help("Farmer phone number")
                        .required(true),
                ),
        )
}
