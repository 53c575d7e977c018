//! Application entry point loading the service settings.
use dotenvy::dotenv;

use pushkind_settings::services::loader::load;

fn main() {
    // Load environment variables from `.env` in local development.
    dotenv().ok();
    // Initialize logger with default level INFO if not provided.
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = match load() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Error loading settings: {}", err);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded settings: {:?}", settings);
    log::info!(
        "Settings loaded (run mode: {}, external port: {})",
        settings.server.run_mode,
        settings.server.external_port
    );
}
