use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use log::info;

use crate::config::Config;
use crate::devices::DriveCommand;
use crate::modbus::{crc16_modbus, list_serial_ports, ModbusMaster, SerialPortTransport, Timing};
use crate::output::formatter_for;
use crate::services::Reconciler;

pub fn handle_subcommands(matches: &ArgMatches) -> Result<()> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("no subcommand given"))?;

    match name {
        "ports" => return print_ports(),
        "crc" => return print_crc(sub),
        "init-config" => return write_default_config(sub),
        _ => {}
    }

    let mut config = load_config(sub)?;

    match name {
        "status" => {
            info!("🔍 Reading drive state...");
            let mut reconciler = open_reconciler(&config)?;
            let snapshot = reconciler.reconcile(None);
            println!("{}", formatter_for(format_of(sub)).format(&snapshot));
            Ok(())
        }
        "set" => {
            let command = DriveCommand::from_form(
                sub.get_one::<String>("mode").map(String::as_str),
                sub.get_one::<String>("frequency").map(String::as_str),
            )?;
            info!("📝 Executing set command: {:?}", command);

            let mut reconciler = open_reconciler(&config)?;
            let snapshot = reconciler.reconcile(Some(&command));
            println!("{}", formatter_for(format_of(sub)).format(&snapshot));
            Ok(())
        }
        #[cfg(feature = "api")]
        "serve" => {
            if let Some(bind) = sub.get_one::<String>("bind") {
                config.http.bind_address = bind.clone();
            }
            if let Some(port) = sub.get_one::<String>("http-port") {
                config.http.port = port
                    .parse()
                    .with_context(|| format!("invalid HTTP port '{}'", port))?;
            }
            run_server(&config)
        }
        other => Err(anyhow!("unknown subcommand '{}'", other)),
    }
}

fn format_of(sub: &ArgMatches) -> &str {
    sub.get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("console")
}

fn load_config(sub: &ArgMatches) -> Result<Config> {
    let mut config = match sub.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_matches(sub)?;
    config.validate()?;
    Ok(config)
}

fn open_reconciler(config: &Config) -> Result<Reconciler<SerialPortTransport>> {
    let transport = SerialPortTransport::open(config)
        .with_context(|| format!("cannot open {}", config.serial_port))?;
    let master = ModbusMaster::new(transport, config.slave_address, Timing::from(config));
    Ok(Reconciler::new(master))
}

#[cfg(feature = "api")]
fn run_server(config: &Config) -> Result<()> {
    use crate::services::{serve, WebState};

    let reconciler = open_reconciler(config)?.into_shared();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;

    runtime.block_on(serve(WebState::new(reconciler), config.http_address()))?;
    Ok(())
}

fn print_ports() -> Result<()> {
    println!("📡 Available Serial Ports:");
    let ports = list_serial_ports()?;
    if ports.is_empty() {
        println!("   ⚠️  No serial ports found");
    }
    for (index, port) in ports.iter().enumerate() {
        println!("   {}. {}", index + 1, port);
    }
    Ok(())
}

fn print_crc(sub: &ArgMatches) -> Result<()> {
    let text = sub
        .get_one::<String>("hex")
        .ok_or_else(|| anyhow!("missing hex bytes"))?;
    let bytes = hex::decode(text.replace(|c: char| c == ' ' || c == ':', ""))
        .with_context(|| format!("'{}' is not a hex byte string", text))?;

    let crc = crc16_modbus(&bytes);
    let mut frame = bytes;
    frame.extend_from_slice(&crc.to_le_bytes());

    println!("🔢 CRC: 0x{:04X}", crc);
    println!("📋 CRC bytes: Low=0x{:02X}, High=0x{:02X}", crc & 0xFF, crc >> 8);
    println!("📤 Frame: {}", hex::encode_upper(&frame));
    Ok(())
}

fn write_default_config(sub: &ArgMatches) -> Result<()> {
    let path = sub
        .get_one::<String>("file")
        .ok_or_else(|| anyhow!("missing destination file"))?;
    Config::default().save_to_file(path)?;
    println!("✅ Default configuration written to {}", path);
    Ok(())
}
