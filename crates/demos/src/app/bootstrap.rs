use std::fmt;
use std::str::FromStr;

use gametools::{AppError, AssetError, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::settings::{load_overrides_from_env, SettingsError, SettingsOverrides};

const DEMO_ENV_VAR: &str = "GAMETOOLS_DEMO";
const HEADLESS_FLAG: &str = "--headless";
const GENERATED_ART_FLAG: &str = "--generated-art";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Demo {
    #[default]
    Simple,
    Platformer,
    Space,
}

impl FromStr for Demo {
    type Err = LaunchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Demo::Simple),
            "platformer" => Ok(Demo::Platformer),
            "space" => Ok(Demo::Space),
            _ => Err(LaunchError::UnknownDemo(raw.to_string())),
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Demo::Simple => "simple",
            Demo::Platformer => "platformer",
            Demo::Space => "space",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct LaunchOptions {
    pub(crate) demo: Demo,
    pub(crate) headless_ticks: Option<u64>,
    pub(crate) generated_art: bool,
}

#[derive(Debug, Error)]
pub(crate) enum LaunchError {
    #[error("unknown demo '{0}' (expected simple, platformer or space)")]
    UnknownDemo(String),
    #[error("--headless needs a tick count")]
    MissingTickCount,
    #[error("invalid tick count '{0}'")]
    InvalidTickCount(String),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    App(#[from] AppError),
}

pub(crate) struct AppWiring {
    pub(crate) options: LaunchOptions,
    pub(crate) overrides: Option<SettingsOverrides>,
}

pub(crate) fn build_app() -> Result<AppWiring, LaunchError> {
    init_tracing();
    info!("=== gametools demos startup ===");

    let options = parse_launch_args(
        std::env::args().skip(1),
        std::env::var(DEMO_ENV_VAR).ok(),
    )?;
    let overrides = load_overrides_from_env()?;
    info!(
        demo = %options.demo,
        headless_ticks = ?options.headless_ticks,
        generated_art = options.generated_art,
        has_overrides = overrides.is_some(),
        "launch_options"
    );

    Ok(AppWiring { options, overrides })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Reads `[demo] [--headless <ticks>] [--generated-art]`. A demo named on the
/// command line wins over the environment.
fn parse_launch_args<I>(args: I, env_demo: Option<String>) -> Result<LaunchOptions, LaunchError>
where
    I: IntoIterator<Item = String>,
{
    let mut demo = None;
    let mut headless_ticks = None;
    let mut generated_art = false;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == HEADLESS_FLAG {
            let raw = args.next().ok_or(LaunchError::MissingTickCount)?;
            let ticks = raw
                .parse::<u64>()
                .map_err(|_| LaunchError::InvalidTickCount(raw.clone()))?;
            headless_ticks = Some(ticks);
        } else if arg == GENERATED_ART_FLAG {
            generated_art = true;
        } else if demo.is_none() && !arg.starts_with('-') {
            demo = Some(arg.parse::<Demo>()?);
        } else {
            return Err(LaunchError::UnexpectedArgument(arg));
        }
    }

    let demo = match demo {
        Some(demo) => demo,
        None => match env_demo.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse()?,
            _ => Demo::default(),
        },
    };

    Ok(LaunchOptions {
        demo,
        headless_ticks,
        generated_art,
    })
}
