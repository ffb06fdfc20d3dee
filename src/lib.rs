#[cfg(feature = "app")]
mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use config::AppConfig;
use services::classifier::controller::CategoryController;
use services::classifier::inference::OrtEngine;
use services::classifier::model_manager::ModelManager;
use services::resources::BundledResources;
use std::sync::Arc;

/// Wires the ONNX Runtime engine and bundled resources into a controller.
pub fn build_controller(config: &AppConfig) -> CategoryController {
    let resources = Arc::new(BundledResources::new(config.resource_dir.clone()));
    let models = ModelManager::new(Arc::new(OrtEngine), resources.clone(), config.inference);
    CategoryController::new(models, resources)
}

#[cfg(feature = "app")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use models::category::Category;
    use tauri::{Manager, RunEvent};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let resource_dir = app.path().resource_dir().ok();
            let config = AppConfig::resolve(resource_dir.as_deref());
            log::info!("Reading bundled models from {}", config.resource_dir.display());

            let controller = build_controller(&config);
            app.manage(controller.clone());

            // Load the default category on start
            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let ticket = controller.on_category_change(Category::default()).await;
                commands::classifier::announce_when_ready(app_handle, controller, ticket);
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::classifier::list_categories,
            commands::classifier::get_classifier_status,
            commands::classifier::select_category,
            commands::classifier::classify_image,
            commands::classifier::pick_and_classify,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| {
        if let RunEvent::Exit = event {
            let controller = app_handle.state::<CategoryController>().inner().clone();
            tauri::async_runtime::block_on(controller.teardown());
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::category::Category;
    use models::classify_types::DisplayLabel;

    #[tokio::test]
    async fn bundled_controller_fails_soft_without_resources() {
        let dir = tempfile::tempdir().unwrap();
        let controller = build_controller(&AppConfig::new(dir.path()));

        let status = controller.status().await;
        assert_eq!(status.generation, 0);
        assert_eq!(status.result, DisplayLabel::Placeholder);

        controller.on_category_change(Category::Birds).await.settled().await;
        let status = controller.status().await;
        assert!(status.labels_ready);
        assert_eq!(status.label_count, 0);
        assert!(!status.model_ready);
        assert!(status.model_error.unwrap().contains("Model file not found"));
        assert_eq!(controller.classify("/tmp/none.jpg").await, DisplayLabel::NoResult);
    }
}
