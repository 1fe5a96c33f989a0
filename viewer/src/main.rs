use std::sync::atomic::Ordering;

use clap::Parser;

mod app;
mod args;

use app::App;
use args::Args;

fn main() {
    env_logger::init();

    let args = Args::parse();

    let app = match App::new(&args) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Could not start the viewer: {e}");
            std::process::exit(1);
        }
    };

    let stop = app.stop_signal();
    if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
        log::warn!("Ctrl-C handler not installed: {e}");
    }

    app.run();
}
