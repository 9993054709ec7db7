// No console window for release builds on Windows.
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

mod achievements;
mod app;
mod cat;
mod combo;
mod config;
mod easing;
mod ecs;
mod error;
mod hud;
mod input;
mod logging;
mod paths;
mod pet;
mod platform;
mod render;
mod skin;
mod sound;
mod startup;
mod tray;
mod ui;

fn main() {
    let paths = match paths::Paths::discover() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Bongo Cat cannot start: {e}");
            std::process::exit(1);
        }
    };

    logging::init(Some(&paths.log_file()));
    log::info!("Bongo Cat {} starting up", env!("CARGO_PKG_VERSION"));

    if let Err(e) = app::run(paths) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
