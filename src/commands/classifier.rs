use crate::error::AppError;
use crate::models::category::Category;
use crate::models::classify_types::{ClassifierStatus, DisplayLabel, PickOutcome};
use crate::services::classifier::controller::{CategoryController, SwitchTicket};
use tauri::{AppHandle, Emitter, Runtime, State};
use tauri_plugin_dialog::DialogExt;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

#[tauri::command]
pub fn list_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

#[tauri::command]
pub async fn get_classifier_status(
    controller: State<'_, CategoryController>,
) -> Result<ClassifierStatus, AppError> {
    Ok(controller.status().await)
}

#[tauri::command]
pub async fn select_category(
    app: AppHandle,
    controller: State<'_, CategoryController>,
    category: Category,
) -> Result<u64, AppError> {
    let ticket = controller.on_category_change(category).await;
    let generation = ticket.generation;
    announce_when_ready(app, controller.inner().clone(), ticket);
    Ok(generation)
}

#[tauri::command]
pub async fn classify_image(
    controller: State<'_, CategoryController>,
    uri: String,
) -> Result<DisplayLabel, AppError> {
    Ok(controller.classify(uri).await)
}

/// Opens the photo picker and classifies the chosen image. Cancelling or a
/// picker failure leaves everything as it was.
#[tauri::command]
pub async fn pick_and_classify(
    app: AppHandle,
    controller: State<'_, CategoryController>,
) -> Result<Option<DisplayLabel>, AppError> {
    let outcome = pick_image(&app).await;
    Ok(controller.on_pick(outcome).await)
}

pub async fn pick_image<R: Runtime>(app: &AppHandle<R>) -> PickOutcome {
    let (tx, rx) = tokio::sync::oneshot::channel();
    app.dialog()
        .file()
        .add_filter("Image Files", IMAGE_EXTENSIONS)
        .pick_file(move |path| {
            let _ = tx.send(path);
        });

    match rx.await {
        Ok(Some(path)) => match path.into_path() {
            Ok(path) => PickOutcome::Picked(path.to_string_lossy().into_owned()),
            Err(e) => PickOutcome::Failed(format!("Picked image has no file path: {}", e)),
        },
        Ok(None) => PickOutcome::Cancelled,
        Err(e) => PickOutcome::Failed(format!("Image picker closed unexpectedly: {}", e)),
    }
}

/// Emits `category-ready` once both refreshes of `ticket` have settled and
/// it is still the current generation.
pub fn announce_when_ready<R: Runtime>(app: AppHandle<R>, controller: CategoryController, ticket: SwitchTicket) {
    tauri::async_runtime::spawn(async move {
        let generation = ticket.generation;
        ticket.settled().await;

        let status = controller.status().await;
        if status.generation != generation {
            return;
        }
        let _ = app.emit(
            "category-ready",
            serde_json::json!({
                "category": status.category,
                "generation": status.generation,
                "labels": status.label_count,
                "model_ready": status.model_ready,
            }),
        );
    });
}
