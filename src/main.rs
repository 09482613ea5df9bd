mod api;
mod app;
mod utils;

use app::EquipmentApp;

fn main() {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_min_inner_size([700.0, 560.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "Chemical Equipment Visualizer",
        options,
        Box::new(|cc| Box::new(EquipmentApp::new(cc))),
    ) {
        eprintln!("Failed to start UI: {}", e);
    }
}
