mod api;
mod app;
mod constants;
mod forms;
mod reviews;
mod storage;
mod ui;
mod utils;

use adw::prelude::*;
use adw::Application;

fn main() {
    env_logger::init();
    let app = Application::builder()
        .application_id("ma.protrans.Client")
        .build();
    app.connect_activate(|app| {
        if let Err(e) = crate::storage::init() {
            log::warn!("cache unavailable: {e}");
        }
        crate::app::build_ui(app);
    });
    app.run();
}
