pub mod commands;

use clap::{Arg, ArgAction, Command};

pub use commands::handle_subcommands;

fn format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .short('f')
        .value_parser(["console", "json", "html"])
        .default_value("console")
        .help("Output format for the drive state")
}

pub fn build_cli() -> Command {
    let mut cli = Command::new("modbus-gateway")
        .version(crate::VERSION)
        .about("Observe and control a Modbus RTU drive over a serial link")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML configuration file"),
        )
        .arg(Arg::new("port").long("port").short('p').global(true).help("Serial port"))
        .arg(Arg::new("baud").long("baud").short('b').global(true).help("Baud rate"))
        .arg(Arg::new("slave").long("slave").short('s').global(true).help("Slave address (1-247)"))
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .global(true)
                .help("Response window in milliseconds"),
        )
        .arg(
            Arg::new("turnaround-ms")
                .long("turnaround-ms")
                .global(true)
                .help("Delay between request and first read in milliseconds"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .short('d')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log every frame on the bus"),
        )
        .subcommand(
            Command::new("status")
                .about("Read the drive state once")
                .arg(format_arg()),
        )
        .subcommand(
            Command::new("set")
                .about("Write mode and frequency, then read the drive state back")
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .short('m')
                        .required(true)
                        .help("stop, run, reverse or forward (anything else means stop)"),
                )
                .arg(
                    Arg::new("frequency")
                        .long("frequency")
                        .allow_hyphen_values(true)
                        .help("Frequency setpoint in Hz (default 0); written only within 0-500"),
                )
                .arg(format_arg()),
        )
        .subcommand(Command::new("ports").about("List available serial ports"))
        .subcommand(
            Command::new("crc")
                .about("Print the Modbus CRC of a hex byte string")
                .arg(Arg::new("hex").required(true).help("Frame bytes, e.g. 010320000002")),
        )
        .subcommand(
            Command::new("init-config")
                .about("Write the default configuration")
                .arg(Arg::new("file").required(true).help("Destination TOML file")),
        );

    if cfg!(feature = "api") {
        cli = cli.subcommand(
            Command::new("serve")
                .about("Serve the operator form over HTTP")
                .arg(Arg::new("bind").long("bind").help("Bind address"))
                .arg(Arg::new("http-port").long("http-port").help("HTTP port")),
        );
    }

    cli
}
