mod state;
mod ui;

use eframe::egui;
use state::AppState;
use std::path::PathBuf;

const SOURCE_KEY: &str = "treeshift.source";

struct TreeshiftApp {
    state: AppState,
}

impl TreeshiftApp {
    /// `data` and `config` come from the command line; without a data path
    /// the last opened file is restored.
    fn new(cc: &eframe::CreationContext<'_>, data: Option<PathBuf>, config: Option<PathBuf>) -> Self {
        let restored = cc
            .storage
            .and_then(|s| eframe::get_value::<PathBuf>(s, SOURCE_KEY));
        let mut state = AppState::new(None, config);
        if let Some(path) = data.or(restored) {
            state.start_load(path);
        }
        Self { state }
    }
}

impl eframe::App for TreeshiftApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::draw(&mut self.state, ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Some(source) = &self.state.source {
            eframe::set_value(storage, SOURCE_KEY, source);
        }
    }
}

fn main() -> eframe::Result<()> {
    treeshift_core::logging::init("info");
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let data = args.next();
    let config = args.next();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Treeshift",
        options,
        Box::new(move |cc| Ok(Box::new(TreeshiftApp::new(cc, data, config)))),
    )
}
