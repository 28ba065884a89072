use std::process::ExitCode;

use fastrand::Rng;
use gametools::{resolve_app_paths, run_game, AssetLoader, Game, InputSnapshot, TickDriver};
use tracing::{error, info};

use super::bootstrap::{AppWiring, Demo, LaunchError};
use super::settings::SettingsOverrides;
use crate::games::{ArtSource, Platformer, Simple, Space};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let rng = Rng::new();
    let art = if app.options.generated_art {
        ArtSource::Generated
    } else {
        ArtSource::default()
    };
    let result = match app.options.demo {
        Demo::Simple => launch(Simple::new(art, rng), &app),
        Demo::Platformer => launch(Platformer::new(art, rng), &app),
        Demo::Space => launch(Space::new(art, rng), &app),
    };

    if let Err(err) = result {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn launch<G: Game>(game: G, app: &AppWiring) -> Result<(), LaunchError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        "startup"
    );

    let mut driver = TickDriver::new(game, AssetLoader::new(app_paths.assets_dir));
    apply_overrides(&mut driver, app.overrides.as_ref());

    match app.options.headless_ticks {
        Some(ticks) => {
            let ran = driver.run_headless(ticks, |_| InputSnapshot::default())?;
            info!(ticks = ran, "headless_finished");
            Ok(())
        }
        None => Ok(run_game(driver)?),
    }
}

fn apply_overrides<G: Game>(driver: &mut TickDriver<G>, overrides: Option<&SettingsOverrides>) {
    if let Some(overrides) = overrides {
        overrides.apply(driver.settings_mut());
    }
}
