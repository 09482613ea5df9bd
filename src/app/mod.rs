mod state;
mod ui;

use std::future::Future;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};

use eframe::{egui, App};
use tokio::runtime::Runtime;

use crate::api::types::{AuthResponse, DatasetDetail, DatasetSummary, RegisterRequest, UserInfo};
use crate::api::{session, ApiClient, ApiError, SharedSession};
pub use state::{UploadController, UploadEvent};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum View {
    Upload,
    History,
    Detail,
}

#[derive(Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub registering: bool,
    pub email: String,
    pub password_confirm: String,
    pub pending: bool,
    pub error_message: Option<String>,
    pub events: Option<Receiver<Result<AuthResponse, ApiError>>>,
}

#[derive(Default)]
pub struct HistoryState {
    pub entries: Vec<DatasetSummary>,
    pub loading: bool,
    pub error_message: Option<String>,
    pub events: Option<Receiver<Result<Vec<DatasetSummary>, ApiError>>>,
    pub delete_events: Option<Receiver<Result<i64, ApiError>>>,
}

#[derive(Default)]
pub struct DetailState {
    pub detail: Option<DatasetDetail>,
    pub loading: bool,
    pub error_message: Option<String>,
    pub report_status: Option<String>,
    pub events: Option<Receiver<Result<DatasetDetail, ApiError>>>,
    pub report_events: Option<Receiver<Result<PathBuf, ApiError>>>,
}

pub struct EquipmentApp {
    api: ApiClient,
    session: SharedSession,
    view: View,
    upload: UploadController,
    login: LoginForm,
    history: HistoryState,
    detail: DetailState,
}

/// Runs one backend call on its own thread and hands the result back
/// through a channel the UI polls once per frame.
fn spawn_api_task<T, Fut>(future: Fut) -> Receiver<T>
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let (sender, receiver) = channel();
    std::thread::spawn(move || {
        let rt = Runtime::new().unwrap();
        let result = rt.block_on(future);
        let _ = sender.send(result);
    });
    receiver
}

/// Non-blocking poll of a worker channel. Hands the receiver back unless a
/// result arrived or the worker went away.
fn poll_worker<T>(slot: &mut Option<Receiver<T>>) -> Option<T> {
    let receiver = slot.take()?;
    match receiver.try_recv() {
        Ok(value) => Some(value),
        Err(TryRecvError::Empty) => {
            *slot = Some(receiver);
            None
        }
        Err(TryRecvError::Disconnected) => None,
    }
}

impl EquipmentApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let base_url = std::env::var("EQUIPMENT_API_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        println!("Using backend at {}", base_url);

        let session = session::shared();
        Self {
            api: ApiClient::new(base_url, session.clone()),
            session,
            view: View::Upload,
            upload: UploadController::default(),
            login: LoginForm::default(),
            history: HistoryState::default(),
            detail: DetailState::default(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.lock().unwrap().is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        self.session.lock().unwrap().user()
    }

    /// Shared entry for both the file picker and drag-and-drop; the same
    /// validation applies on either path.
    pub fn select_path(&mut self, path: PathBuf) {
        match std::fs::metadata(&path) {
            Ok(metadata) => self.upload.select_file(path, metadata.len()),
            Err(e) => {
                self.upload.error_message =
                    Some(format!("Cannot read {}: {}", path.display(), e));
            }
        }
    }

    pub fn start_upload(&mut self) {
        let Some(file) = self.upload.begin() else {
            return;
        };
        println!("Uploading {} ({} bytes)", file.name, file.size);

        let (sender, receiver) = channel();
        self.upload.attach_events(receiver);

        let api = self.api.clone();
        let progress_sender = sender.clone();
        std::thread::spawn(move || {
            let rt = Runtime::new().unwrap();
            rt.block_on(async move {
                let result = api
                    .upload_csv(&file.path, move |percent| {
                        let _ = progress_sender.send(UploadEvent::Progress(percent));
                    })
                    .await;
                let _ = sender.send(UploadEvent::Finished(result));
            });
        });
    }

    /// Success outcome lands here: switch to the detail view for the new
    /// dataset and fire the summary fetch. Single best-effort transition; a
    /// failed fetch shows up as the detail view's error state.
    pub fn open_dataset(&mut self, dataset_id: i64) {
        self.view = View::Detail;
        self.detail.detail = None;
        self.detail.error_message = None;
        self.detail.report_status = None;
        self.detail.loading = true;

        let api = self.api.clone();
        self.detail.events =
            Some(spawn_api_task(async move { api.dataset_summary(dataset_id).await }));
    }

    pub fn refresh_history(&mut self) {
        self.history.loading = true;
        self.history.error_message = None;

        let api = self.api.clone();
        self.history.events = Some(spawn_api_task(async move {
            api.history().await.map(|response| {
                println!("History refreshed, {} datasets", response.count);
                response.data
            })
        }));
    }

    pub fn delete_dataset(&mut self, dataset_id: i64) {
        let api = self.api.clone();
        self.history.delete_events = Some(spawn_api_task(async move {
            api.delete_dataset(dataset_id).await.map(|_| dataset_id)
        }));
    }

    pub fn download_report(&mut self, dataset_id: i64, destination: PathBuf) {
        println!(
            "Downloading report for dataset {} to {}",
            dataset_id,
            destination.display()
        );
        self.detail.report_status = None;

        let api = self.api.clone();
        self.detail.report_events = Some(spawn_api_task(async move {
            api.download_pdf(dataset_id, &destination)
                .await
                .map(|_| destination)
        }));
    }

    pub fn submit_login(&mut self) {
        if self.login.pending {
            return;
        }
        let username = self.login.username.trim().to_string();
        let password = self.login.password.clone();
        if username.is_empty() || password.is_empty() {
            self.login.error_message = Some("Username and password are required".to_string());
            return;
        }

        self.login.pending = true;
        self.login.error_message = None;
        let api = self.api.clone();
        self.login.events =
            Some(spawn_api_task(async move { api.login(&username, &password).await }));
    }

    pub fn submit_register(&mut self) {
        if self.login.pending {
            return;
        }
        if self.login.password != self.login.password_confirm {
            self.login.error_message = Some("Passwords do not match".to_string());
            return;
        }

        let request = RegisterRequest {
            username: self.login.username.trim().to_string(),
            email: self.login.email.trim().to_string(),
            password: self.login.password.clone(),
            password_confirm: self.login.password_confirm.clone(),
        };

        self.login.pending = true;
        self.login.error_message = None;
        let api = self.api.clone();
        self.login.events = Some(spawn_api_task(async move { api.register(&request).await }));
    }

    pub fn logout(&mut self) {
        println!("Signing out");
        let api = self.api.clone();
        std::thread::spawn(move || {
            let rt = Runtime::new().unwrap();
            if let Err(e) = rt.block_on(api.logout()) {
                eprintln!("Logout request failed: {}", e);
            }
        });
        self.sign_out_locally();
    }

    /// Global 401 handling: wipe the session and every view, land on the
    /// login screen. In-flight workers keep running; their sends go nowhere
    /// once the receivers are dropped.
    fn sign_out_locally(&mut self) {
        self.session.lock().unwrap().clear();
        self.view = View::Upload;
        self.upload = UploadController::default();
        self.login = LoginForm::default();
        self.history = HistoryState::default();
        self.detail = DetailState::default();
    }

    fn has_pending_work(&self) -> bool {
        self.upload.events.is_some()
            || self.login.events.is_some()
            || self.history.events.is_some()
            || self.history.delete_events.is_some()
            || self.detail.events.is_some()
            || self.detail.report_events.is_some()
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        if self.has_pending_work() {
            ctx.request_repaint();
        }

        // Upload progress and completion.
        let mut upload_events = Vec::new();
        if let Some(receiver) = &self.upload.events {
            while let Ok(event) = receiver.try_recv() {
                upload_events.push(event);
            }
        }
        for event in upload_events {
            let unauthorized =
                matches!(&event, UploadEvent::Finished(Err(ApiError::Unauthorized)));
            if let Some(success) = self.upload.apply_event(event) {
                println!(
                    "Upload accepted as dataset {}: {}",
                    success.dataset_id, success.message
                );
                self.refresh_history();
                self.open_dataset(success.dataset_id);
            }
            if unauthorized {
                self.sign_out_locally();
            }
        }

        // Login or registration result.
        if let Some(result) = poll_worker(&mut self.login.events) {
            self.login.pending = false;
            match result {
                Ok(auth) => {
                    println!("Signed in as {}", auth.user.username);
                    self.login = LoginForm::default();
                    self.view = View::Upload;
                    self.refresh_history();
                }
                Err(err) => self.login.error_message = Some(err.to_string()),
            }
        }

        // History list.
        if let Some(result) = poll_worker(&mut self.history.events) {
            self.history.loading = false;
            match result {
                Ok(entries) => self.history.entries = entries,
                Err(ApiError::Unauthorized) => self.sign_out_locally(),
                Err(err) => self.history.error_message = Some(err.to_string()),
            }
        }

        // Dataset deletion.
        if let Some(result) = poll_worker(&mut self.history.delete_events) {
            match result {
                Ok(id) => {
                    println!("Deleted dataset {}", id);
                    self.history.entries.retain(|entry| entry.id != id);
                    let showing_deleted =
                        self.detail.detail.as_ref().map(|d| d.dataset.id) == Some(id);
                    if showing_deleted {
                        self.detail = DetailState::default();
                        if self.view == View::Detail {
                            self.view = View::History;
                        }
                    }
                }
                Err(ApiError::Unauthorized) => self.sign_out_locally(),
                Err(err) => {
                    self.history.error_message = Some(format!("Delete failed: {}", err));
                }
            }
        }

        // Dataset summary for the detail view.
        if let Some(result) = poll_worker(&mut self.detail.events) {
            self.detail.loading = false;
            match result {
                Ok(detail) => self.detail.detail = Some(detail),
                Err(ApiError::Unauthorized) => self.sign_out_locally(),
                Err(err) => self.detail.error_message = Some(err.to_string()),
            }
        }

        // PDF report download.
        if let Some(result) = poll_worker(&mut self.detail.report_events) {
            match result {
                Ok(path) => {
                    self.detail.report_status =
                        Some(format!("Report saved to {}", path.display()));
                    if let Err(e) = open::that(&path) {
                        eprintln!("Failed to open report: {}", e);
                    }
                }
                Err(ApiError::Unauthorized) => self.sign_out_locally(),
                Err(err) => {
                    self.detail.report_status = Some(format!("Report download failed: {}", err));
                }
            }
        }
    }
}

impl App for EquipmentApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
