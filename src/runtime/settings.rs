use crate::config;

/// Load and validate settings. Logging is not up yet, so problems go to stderr.
pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => match s.validate() {
            Ok(()) => s,
            Err(e) => {
                eprintln!("reprise: invalid config, using defaults: {e}");
                config::Settings::default()
            }
        },
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("reprise: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
