mod app;
mod cli;
mod config;
mod enhance;
mod error;
mod fileactions;
mod image_loader;
mod scanner;
mod ui;
mod viewer;

use app::PictorApp;
use cli::CliArgs;
use scanner::ScanConfig;
use ui::StartupState;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pictor=info")),
        )
        .init();

    let cli = match CliArgs::from_env() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("pictor: {err}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };
    if cli.help {
        print!("{}", cli::USAGE);
        return;
    }

    let (mut settings, warning) = config::load(cli.config.as_deref());
    cli.apply(&mut settings);

    let population = match scanner::populate(&cli.paths, ScanConfig::from(&settings)) {
        Ok(population) => population,
        Err(err) => {
            tracing::error!("Failed to read paths: {:#}", err);
            std::process::exit(1);
        }
    };
    if population.paths.is_empty() && !cli.paths.is_empty() {
        tracing::warn!("No images found in the given paths");
    }

    let app = PictorApp::new(StartupState {
        paths: population.paths,
        index: population.index,
        settings,
        warning,
    });
    std::process::exit(app.run());
}
