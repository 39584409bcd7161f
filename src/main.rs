#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod app;

use eframe::egui;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = regionblur::config::load_settings();
    log::info!("Starting Region Blur (blur radius {})", config.blur_radius);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Region Blur",
        options,
        Box::new(|cc| Ok(Box::new(app::RegionBlur::new(cc, config)))),
    )
}
