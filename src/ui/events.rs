//! Background refresh tasks and their completion events.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app::{App, AppEvent};

/// Starts a refresh for the current filter and query.
///
/// Any refresh still in flight is aborted and its generation retired, so
/// only the latest request can update the list.
pub(super) fn spawn_refresh(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(handle) = app.refresh_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous refresh task");
    }

    app.generation = app.generation.wrapping_add(1);
    let generation = app.generation;
    app.loading = true;

    let requests = app.service.requests(app.filter, &app.query);
    let service = Arc::clone(&app.service);
    let tx = event_tx.clone();

    tracing::debug!(
        generation,
        filter = ?app.filter,
        query = %app.query,
        sources = requests.len(),
        "Spawning refresh task"
    );

    app.refresh_handle = Some(tokio::spawn(async move {
        let event = match catch_task_panic(service.aggregate(&requests)).await {
            Ok(aggregation) => AppEvent::NewsLoaded {
                generation,
                aggregation,
            },
            Err(error) => AppEvent::TaskPanicked {
                task: "refresh",
                error,
            },
        };

        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send refresh result (receiver dropped)");
        }
    }));
}

/// Runs a future, turning a panic into its message.
///
/// The future runs inside the caller's task, so aborting that task also
/// cancels the work.
async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            }
        })
}

/// Applies a background task result to the app state.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::NewsLoaded {
            generation,
            aggregation,
        } => {
            let failed = aggregation
                .outcomes
                .iter()
                .filter(|o| !o.succeeded())
                .count();
            if app.apply_news(generation, aggregation) {
                if failed > 0 {
                    app.set_status(format!("{failed} 件のソースで取得に失敗しました"));
                } else {
                    app.set_status("ニュース取得完了");
                }
            }
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.loading = false;
            app.refresh_handle = None;
            app.set_status(format!("Internal error in {task}: {error}"));
        }
    }
}
