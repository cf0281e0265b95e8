use std::process::ExitCode;

use flythrough::{Experience, ExperienceConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match launch() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load the experience named on the command line, or the built-in portfolio.
fn launch() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => ExperienceConfig::from_path(path)?,
        None => ExperienceConfig::portfolio()?,
    };

    let mut experience = Experience::from_config(&config)?;
    experience.on_stage_changed(|change| {
        log::info!(
            "stage {} -> {} (background {:?})",
            change
                .from
                .as_ref()
                .map(|s| s.as_str())
                .unwrap_or("<start>"),
            change.to,
            change.lighting.background
        );
    });

    flythrough::run(experience, config.window.clone())?;
    Ok(())
}
