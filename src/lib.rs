//! Screen Recorder - record the screen to a video file at a fixed frame rate.
//!
//! The library holds the recording engine. With the `gui` feature it also
//! provides the Tauri control panel.

pub mod capture;
#[cfg(feature = "gui")]
pub mod commands;
pub mod encoder;
pub mod recorder;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling this twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screen_recorder=debug,tauri=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Initialize the application
#[cfg(feature = "gui")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::recording::RecorderState;
    use tauri::Manager;

    init_tracing();

    tracing::info!("Starting Screen Recorder v{}", env!("CARGO_PKG_VERSION"));

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            // Recording commands
            commands::recording::get_resolutions,
            commands::recording::select_resolution,
            commands::recording::get_panel,
            commands::recording::start_recording,
            commands::recording::stop_recording,
            commands::recording::tick,
            // Settings commands
            commands::settings::get_output_dir,
            commands::settings::set_output_dir,
            commands::settings::choose_output_dir,
        ])
        .setup(|app| commands::setup(app))
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app, event| {
            if let tauri::RunEvent::Exit = event {
                if let Some(state) = app.try_state::<RecorderState>() {
                    let mut coordinator = tauri::async_runtime::block_on(state.coordinator.lock());
                    if let Some(summary) = coordinator.shutdown() {
                        tracing::info!("Finalized {:?} on exit", summary.output_path);
                    }
                }
            }
        });
}
