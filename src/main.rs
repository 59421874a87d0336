use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use log::{error, info, warn};

use sim_family_tree::gui::frontend::FamilyTreeApp;
use sim_family_tree::gui::graph_view::GraphView;
use sim_family_tree::persistence::persist::{self, AppStateFile};
use sim_family_tree::persistence::settings::AppSettings;

#[derive(Parser, Debug)]
#[command(name = "Sim-Family-Tree", about = "Family tree editor for your Sims")]
struct Args {
    /// Family tree JSON file to open instead of the autosaved session
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,
    /// Directory holding the autosaved session
    #[arg(long, value_name = "DIR")]
    autosave_dir: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let mut settings = AppSettings::load_or_default();
    // First run: leave an editable settings.json behind
    if !AppSettings::settings_path().exists() {
        if let Err(e) = settings.save() {
            warn!("could not write default settings: {}", e);
        }
    }
    if let Some(dir) = args.autosave_dir {
        settings.autosave_override = Some(dir);
    }
    if let Err(e) = settings.ensure_dirs() {
        warn!("could not create app directories: {}", e);
    }
    persist::set_settings_override(settings.clone());

    let mut loaded_state = match persist::load_active() {
        Ok(state) => state,
        Err(e) => {
            warn!("could not read autosaved session: {}", e);
            None
        }
    };
    if let Some(path) = &args.import {
        match persist::import_snapshot_json(path) {
            Ok(snapshot) => {
                info!("opening {}", path.display());
                // Keep the saved camera when there is one
                let viewport = loaded_state
                    .map(|s| s.to_runtime().1)
                    .unwrap_or_default();
                loaded_state = Some(AppStateFile::from_runtime(snapshot, &viewport));
            }
            Err(e) => error!("failed to import {}: {}", path.display(), e),
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 760.0])
            .with_min_inner_size([700.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Sim-Family-Tree",
        options,
        Box::new(move |_cc| {
            if let Some(state) = loaded_state {
                Ok(Box::new(FamilyTreeApp::from_state(state, settings)) as Box<dyn eframe::App>)
            } else {
                // No prior session: the canvas shows the welcome screen
                Ok(Box::new(FamilyTreeApp::new(GraphView::new(), settings)) as Box<dyn eframe::App>)
            }
        }),
    )
}
