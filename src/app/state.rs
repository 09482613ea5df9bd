use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use crate::api::types::UploadResponse;
use crate::api::ApiError;

/// Backend rejects anything larger, so there is no point sending it.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

/// Where the upload workflow currently is. The selected file lives here and
/// nowhere else; while a transfer is in flight it cannot be replaced.
#[derive(Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    FileSelected(SelectedFile),
    Uploading {
        file: SelectedFile,
        progress: u8,
    },
}

pub enum UploadEvent {
    Progress(u8),
    Finished(Result<UploadResponse, ApiError>),
}

pub struct UploadSuccess {
    pub dataset_id: i64,
    pub message: String,
}

/// Drives the pick, validate, submit, outcome cycle. Mutated only from the
/// UI thread; the transfer worker talks back through the event channel.
#[derive(Default)]
pub struct UploadController {
    phase: UploadPhase,
    pub error_message: Option<String>,
    pub status_message: Option<String>,
    pub events: Option<Receiver<UploadEvent>>,
}

impl UploadController {
    /// Validates a picked or dropped file. An invalid pick leaves the
    /// current phase untouched and surfaces the reason; picks are ignored
    /// entirely mid-transfer.
    pub fn select_file(&mut self, path: PathBuf, size: u64) {
        if self.is_uploading() {
            return;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !name.ends_with(".csv") {
            self.error_message = Some("Please select a CSV file".to_string());
            return;
        }
        if size > MAX_UPLOAD_BYTES {
            self.error_message = Some("File size must not exceed 5MB".to_string());
            return;
        }

        self.error_message = None;
        self.status_message = None;
        self.phase = UploadPhase::FileSelected(SelectedFile { path, name, size });
    }

    /// Moves FileSelected into Uploading and hands the file back for
    /// dispatch. No-op while a transfer is in flight; submitting without a
    /// selection only surfaces an error.
    pub fn begin(&mut self) -> Option<SelectedFile> {
        match &self.phase {
            UploadPhase::Uploading { .. } => None,
            UploadPhase::Idle => {
                self.error_message = Some("Please select a file first".to_string());
                None
            }
            UploadPhase::FileSelected(file) => {
                let file = file.clone();
                self.error_message = None;
                self.status_message = None;
                self.phase = UploadPhase::Uploading {
                    file: file.clone(),
                    progress: 0,
                };
                Some(file)
            }
        }
    }

    pub fn attach_events(&mut self, receiver: Receiver<UploadEvent>) {
        self.events = Some(receiver);
    }

    /// Applies one event from the transfer worker. Returns the new
    /// dataset's id and the backend message on success so the caller can
    /// navigate to it; a failure keeps the selection for a cheap retry.
    pub fn apply_event(&mut self, event: UploadEvent) -> Option<UploadSuccess> {
        match event {
            UploadEvent::Progress(value) => {
                if let UploadPhase::Uploading { progress, .. } = &mut self.phase {
                    *progress = (*progress).max(value.min(100));
                }
                None
            }
            UploadEvent::Finished(result) => {
                let file = match std::mem::take(&mut self.phase) {
                    UploadPhase::Uploading { file, .. } => file,
                    other => {
                        self.phase = other;
                        return None;
                    }
                };
                self.events = None;

                match result {
                    Ok(response) => {
                        self.status_message = Some(response.message.clone());
                        Some(UploadSuccess {
                            dataset_id: response.data.id,
                            message: response.message,
                        })
                    }
                    Err(err) => {
                        self.error_message = Some(err.to_string());
                        self.phase = UploadPhase::FileSelected(file);
                        None
                    }
                }
            }
        }
    }

    /// Discards the selection and any prior outcome. Ignored mid-transfer;
    /// the only way out of Uploading is the event channel.
    pub fn reset(&mut self) {
        if self.is_uploading() {
            return;
        }
        self.phase = UploadPhase::Idle;
        self.error_message = None;
        self.status_message = None;
        self.events = None;
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.phase, UploadPhase::Uploading { .. })
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        match &self.phase {
            UploadPhase::Idle => None,
            UploadPhase::FileSelected(file) => Some(file),
            UploadPhase::Uploading { file, .. } => Some(file),
        }
    }

    pub fn progress(&self) -> u8 {
        match &self.phase {
            UploadPhase::Uploading { progress, .. } => *progress,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_with_file(name: &str, size: u64) -> UploadController {
        let mut controller = UploadController::default();
        controller.select_file(PathBuf::from(format!("/tmp/{}", name)), size);
        controller
    }

    fn upload_response(id: i64, message: &str) -> UploadResponse {
        serde_json::from_value(serde_json::json!({
            "message": message,
            "data": {
                "id": id,
                "filename": "plant.csv",
                "uploaded_at": "2024-05-01T10:12:03Z",
                "total_count": 4,
                "avg_flowrate": 100.0,
                "avg_pressure": 5.0,
                "avg_temperature": 90.0,
                "equipment_type_distribution": {"Pump": 4}
            }
        }))
        .unwrap()
    }

    #[test]
    fn rejects_non_csv_extension() {
        let controller = controller_with_file("readings.txt", 100);
        assert!(controller.selected_file().is_none());
        assert_eq!(
            controller.error_message.as_deref(),
            Some("Please select a CSV file")
        );
    }

    #[test]
    fn rejects_oversized_file() {
        let controller = controller_with_file("big.csv", MAX_UPLOAD_BYTES + 1);
        assert!(controller.selected_file().is_none());
        assert_eq!(
            controller.error_message.as_deref(),
            Some("File size must not exceed 5MB")
        );
    }

    #[test]
    fn accepts_file_at_exactly_the_limit() {
        let controller = controller_with_file("exact.csv", MAX_UPLOAD_BYTES);
        assert_eq!(controller.selected_file().unwrap().name, "exact.csv");
        assert!(controller.error_message.is_none());
    }

    #[test]
    fn invalid_pick_keeps_previous_selection() {
        let mut controller = controller_with_file("plant.csv", 100);
        controller.select_file(PathBuf::from("/tmp/notes.txt"), 100);
        assert_eq!(controller.selected_file().unwrap().name, "plant.csv");
        assert!(controller.error_message.is_some());
    }

    #[test]
    fn submit_without_selection_is_an_error_without_dispatch() {
        let mut controller = UploadController::default();
        assert!(controller.begin().is_none());
        assert!(!controller.is_uploading());
        assert_eq!(
            controller.error_message.as_deref(),
            Some("Please select a file first")
        );
    }

    #[test]
    fn submit_is_a_noop_while_uploading() {
        let mut controller = controller_with_file("plant.csv", 100);
        assert!(controller.begin().is_some());
        assert!(controller.is_uploading());
        assert!(controller.begin().is_none());
        assert!(controller.is_uploading());
    }

    #[test]
    fn selection_cannot_change_mid_transfer() {
        let mut controller = controller_with_file("plant.csv", 100);
        controller.begin();
        controller.select_file(PathBuf::from("/tmp/other.csv"), 100);
        assert_eq!(controller.selected_file().unwrap().name, "plant.csv");
    }

    #[test]
    fn progress_never_decreases() {
        let mut controller = controller_with_file("plant.csv", 100);
        controller.begin();
        controller.apply_event(UploadEvent::Progress(10));
        controller.apply_event(UploadEvent::Progress(55));
        controller.apply_event(UploadEvent::Progress(30));
        assert_eq!(controller.progress(), 55);
    }

    #[test]
    fn progress_is_ignored_outside_a_transfer() {
        let mut controller = controller_with_file("plant.csv", 100);
        controller.apply_event(UploadEvent::Progress(70));
        assert_eq!(controller.progress(), 0);
        assert_eq!(controller.selected_file().unwrap().name, "plant.csv");
    }

    #[test]
    fn success_clears_selection_and_reports_the_new_dataset() {
        let mut controller = controller_with_file("plant.csv", 100);
        controller.begin();

        let success = controller
            .apply_event(UploadEvent::Finished(Ok(upload_response(42, "ok"))))
            .unwrap();

        assert_eq!(success.dataset_id, 42);
        assert_eq!(success.message, "ok");
        assert!(controller.selected_file().is_none());
        assert!(!controller.is_uploading());
        assert_eq!(controller.status_message.as_deref(), Some("ok"));
    }

    #[test]
    fn failure_keeps_the_file_and_shows_backend_text() {
        let mut controller = controller_with_file("plant.csv", 100);
        controller.begin();

        let outcome = controller.apply_event(UploadEvent::Finished(Err(ApiError::Server {
            status: 400,
            message: "bad header".to_string(),
        })));

        assert!(outcome.is_none());
        assert!(!controller.is_uploading());
        assert_eq!(controller.selected_file().unwrap().name, "plant.csv");
        assert_eq!(controller.error_message.as_deref(), Some("bad header"));
    }

    #[test]
    fn reset_returns_to_idle_from_file_selected() {
        let mut controller = controller_with_file("plant.csv", 100);
        controller.reset();
        assert!(controller.selected_file().is_none());
        assert_eq!(controller.progress(), 0);
        assert!(controller.error_message.is_none());
    }

    #[test]
    fn reset_is_ignored_while_uploading() {
        let mut controller = controller_with_file("plant.csv", 100);
        controller.begin();
        controller.apply_event(UploadEvent::Progress(40));
        controller.reset();
        assert!(controller.is_uploading());
        assert_eq!(controller.progress(), 40);
    }
}
