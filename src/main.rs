use log::{error, LevelFilter};

use modbus_gateway::cli::{build_cli, handle_subcommands};

fn main() {
    let matches = build_cli().get_matches();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if matches.get_flag("debug") {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = handle_subcommands(&matches) {
        error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
