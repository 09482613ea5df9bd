use eframe::egui::{self, Align, Color32, RichText};
use rfd::FileDialog;

use super::{EquipmentApp, View};
use crate::utils::file_size::format_size;

const OK_GREEN: Color32 = Color32::from_rgb(0, 180, 0);
const ERROR_RED: Color32 = Color32::from_rgb(220, 50, 50);

impl EquipmentApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        if !self.is_authenticated() {
            self.render_login(ctx);
            return;
        }

        // Drops land on the upload view only; the same validation as the
        // picker applies.
        if self.view == View::Upload {
            let dropped = ctx.input(|i| i.raw.dropped_files.clone());
            if let Some(path) = dropped.into_iter().find_map(|file| file.path) {
                self.select_path(path);
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_header(ui);
            ui.separator();
            ui.add_space(10.0);
            egui::ScrollArea::vertical().show(ui, |ui| match self.view {
                View::Upload => self.render_upload(ui),
                View::History => self.render_history(ui),
                View::Detail => self.render_detail(ui),
            });
        });
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("⚗ Chemical Equipment Visualizer");
            ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                if ui.button("Logout").clicked() {
                    self.logout();
                }
                if let Some(user) = self.current_user() {
                    ui.label(format!("Welcome, {}", user.username));
                }
            });
        });
        ui.add_space(5.0);
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.view, View::Upload, "Upload CSV");
            ui.selectable_value(&mut self.view, View::History, "History");
            ui.selectable_value(&mut self.view, View::Detail, "Analysis");
        });
    }

    fn render_upload(&mut self, ui: &mut egui::Ui) {
        ui.heading("Upload CSV File");
        ui.label(
            RichText::new("Upload a CSV file containing equipment data for analysis")
                .color(ui.visuals().text_color().gamma_multiply(0.7)),
        );
        ui.add_space(10.0);

        ui.group(|ui| {
            ui.label(RichText::new("CSV File Requirements").strong());
            ui.label("• File must be in CSV format (.csv extension)");
            ui.label("• Maximum file size: 5MB");
            ui.label("• Required columns: Equipment Name, Type, Flowrate, Pressure, Temperature");
        });

        ui.add_space(10.0);

        let selected = self.upload.selected_file().cloned();
        let uploading = self.upload.is_uploading();
        let hovering_files = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let mut browse_requested = false;
        let mut clear_requested = false;
        let mut submit_requested = false;

        ui.group(|ui| {
            ui.set_min_height(90.0);
            ui.vertical_centered(|ui| {
                ui.add_space(10.0);
                match &selected {
                    Some(file) => {
                        ui.label(RichText::new("📄").size(26.0));
                        ui.label(RichText::new(&file.name).strong());
                        ui.label(format_size(file.size));
                        if !uploading && ui.button("✕ Remove").clicked() {
                            clear_requested = true;
                        }
                    }
                    None => {
                        ui.label(RichText::new("☁").size(26.0));
                        if hovering_files {
                            ui.label("Drop the file to select it");
                        } else {
                            ui.label("Drag and drop your CSV file here");
                            ui.label("or");
                            if ui.button("📁 Browse Files").clicked() {
                                browse_requested = true;
                            }
                        }
                    }
                }
                ui.add_space(10.0);
            });
        });

        if uploading {
            ui.add_space(10.0);
            let fraction = self.upload.progress() as f32 / 100.0;
            ui.add(
                egui::ProgressBar::new(fraction)
                    .show_percentage()
                    .animate(true),
            );
        }

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            let can_submit = selected.is_some() && !uploading;
            ui.add_enabled_ui(can_submit, |ui| {
                let label = if uploading {
                    "⏳ Uploading..."
                } else {
                    "📤 Upload and Analyze"
                };
                if ui
                    .add(egui::Button::new(label).min_size(egui::vec2(180.0, 32.0)))
                    .clicked()
                {
                    submit_requested = true;
                }
            });
            if selected.is_some() && !uploading && ui.button("Clear").clicked() {
                clear_requested = true;
            }
        });

        if let Some(message) = &self.upload.status_message {
            ui.add_space(5.0);
            ui.colored_label(OK_GREEN, message);
        }
        if let Some(error) = &self.upload.error_message {
            ui.add_space(5.0);
            ui.colored_label(ERROR_RED, error);
        }

        ui.add_space(10.0);
        ui.group(|ui| {
            ui.label(RichText::new("Sample Data Format").strong());
            ui.monospace("Equipment Name,Type,Flowrate,Pressure,Temperature");
            ui.monospace("Pump-1,Pump,120,5.2,110");
            ui.monospace("Compressor-1,Compressor,95,8.4,95");
            ui.monospace("Valve-1,Valve,60,4.1,105");
        });

        if clear_requested {
            self.upload.reset();
        }
        if browse_requested {
            if let Some(path) = FileDialog::new()
                .add_filter("CSV Files", &["csv"])
                .pick_file()
            {
                self.select_path(path);
            }
        }
        if submit_requested {
            self.start_upload();
        }
    }

    fn render_history(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Upload History");
            ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                if ui.button("🔄 Refresh").clicked() {
                    self.refresh_history();
                }
            });
        });
        ui.label(
            RichText::new("Your last 5 uploaded datasets")
                .color(ui.visuals().text_color().gamma_multiply(0.7)),
        );
        ui.add_space(10.0);

        if self.history.loading {
            ui.label("Loading history...");
        }
        if let Some(error) = &self.history.error_message {
            ui.colored_label(ERROR_RED, error);
        }

        let mut open_request = None;
        let mut delete_request = None;

        if self.history.entries.is_empty() && !self.history.loading {
            ui.group(|ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.label(RichText::new("No datasets found").strong());
                    ui.label("Upload your first CSV file to get started");
                    ui.add_space(20.0);
                });
            });
        } else {
            egui::Grid::new("history_grid")
                .striped(true)
                .spacing([14.0, 6.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Filename").strong());
                    ui.label(RichText::new("Items").strong());
                    ui.label(RichText::new("Types").strong());
                    ui.label(RichText::new("Avg Flowrate").strong());
                    ui.label(RichText::new("Avg Pressure").strong());
                    ui.label(RichText::new("Avg Temperature").strong());
                    ui.label(RichText::new("Uploaded").strong());
                    ui.label("");
                    ui.end_row();

                    for entry in &self.history.entries {
                        ui.label(&entry.filename);
                        ui.label(entry.total_count.to_string());
                        ui.label(entry.equipment_type_distribution.len().to_string());
                        ui.label(format!("{:.2}", entry.avg_flowrate));
                        ui.label(format!("{:.2}", entry.avg_pressure));
                        ui.label(format!("{:.2}", entry.avg_temperature));
                        ui.label(entry.uploaded_at.get(..10).unwrap_or(&entry.uploaded_at));
                        ui.horizontal(|ui| {
                            if ui.button("View").clicked() {
                                open_request = Some(entry.id);
                            }
                            if ui.button("🗑 Delete").clicked() {
                                delete_request = Some(entry.id);
                            }
                        });
                        ui.end_row();
                    }
                });
        }

        if let Some(id) = open_request {
            self.open_dataset(id);
        }
        if let Some(id) = delete_request {
            self.delete_dataset(id);
        }
    }

    fn render_detail(&mut self, ui: &mut egui::Ui) {
        if self.detail.loading {
            ui.heading("Dataset Analysis");
            ui.label("Loading dataset...");
            return;
        }
        if let Some(error) = &self.detail.error_message {
            ui.heading("Dataset Analysis");
            ui.colored_label(ERROR_RED, error);
            return;
        }

        let mut report_request = None;

        {
            let Some(detail) = &self.detail.detail else {
                ui.heading("Dataset Analysis");
                ui.label("Select a dataset from the History tab to see its analysis");
                return;
            };
            let dataset = &detail.dataset;
            let analysis = &detail.analysis;

            ui.heading(&dataset.filename);
            ui.label(
                RichText::new(format!(
                    "Uploaded on {}",
                    dataset.uploaded_at.get(..10).unwrap_or(&dataset.uploaded_at)
                ))
                .color(ui.visuals().text_color().gamma_multiply(0.7)),
            );
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                ui.group(|ui| {
                    ui.vertical(|ui| {
                        ui.label("Total Equipment");
                        ui.heading(analysis.total_count.to_string());
                    });
                });
                ui.group(|ui| {
                    ui.vertical(|ui| {
                        ui.label("Equipment Types");
                        ui.heading(analysis.equipment_type_distribution.len().to_string());
                    });
                });
            });

            ui.add_space(10.0);
            ui.group(|ui| {
                ui.label(RichText::new("Parameters").strong());
                egui::Grid::new("parameter_grid")
                    .striped(true)
                    .spacing([14.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("");
                        ui.label(RichText::new("Average").strong());
                        ui.label(RichText::new("Min").strong());
                        ui.label(RichText::new("Max").strong());
                        ui.end_row();

                        ui.label("Flowrate");
                        ui.label(format!("{:.2}", analysis.avg_flowrate));
                        ui.label(format!("{:.2}", analysis.min_flowrate));
                        ui.label(format!("{:.2}", analysis.max_flowrate));
                        ui.end_row();

                        ui.label("Pressure");
                        ui.label(format!("{:.2}", analysis.avg_pressure));
                        ui.label(format!("{:.2}", analysis.min_pressure));
                        ui.label(format!("{:.2}", analysis.max_pressure));
                        ui.end_row();

                        ui.label("Temperature");
                        ui.label(format!("{:.2}", analysis.avg_temperature));
                        ui.label(format!("{:.2}", analysis.min_temperature));
                        ui.label(format!("{:.2}", analysis.max_temperature));
                        ui.end_row();
                    });
            });

            ui.add_space(10.0);
            ui.group(|ui| {
                ui.label(RichText::new("Equipment Type Distribution").strong());
                let total = analysis.total_count.max(1) as f32;
                for (equipment_type, count) in &analysis.equipment_type_distribution {
                    ui.add(
                        egui::ProgressBar::new(*count as f32 / total)
                            .text(format!("{}: {}", equipment_type, count)),
                    );
                }
            });

            ui.add_space(10.0);
            ui.group(|ui| {
                ui.label(RichText::new("Statistics by Type").strong());
                egui::Grid::new("type_stats_grid")
                    .striped(true)
                    .spacing([14.0, 6.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Type").strong());
                        ui.label(RichText::new("Count").strong());
                        ui.label(RichText::new("Avg Flowrate").strong());
                        ui.label(RichText::new("Avg Pressure").strong());
                        ui.label(RichText::new("Avg Temperature").strong());
                        ui.end_row();

                        for (equipment_type, stats) in &analysis.statistics_by_type {
                            ui.label(equipment_type);
                            ui.label(stats.count.to_string());
                            ui.label(format!("{:.2}", stats.avg_flowrate));
                            ui.label(format!("{:.2}", stats.avg_pressure));
                            ui.label(format!("{:.2}", stats.avg_temperature));
                            ui.end_row();
                        }
                    });
            });

            ui.add_space(10.0);
            if ui.button("📄 Download PDF Report").clicked() {
                report_request = Some((
                    dataset.id,
                    format!("report_{}.pdf", dataset.filename.trim_end_matches(".csv")),
                ));
            }
            if let Some(status) = &self.detail.report_status {
                ui.label(status);
            }
        }

        if let Some((id, default_name)) = report_request {
            if let Some(destination) = FileDialog::new()
                .set_file_name(&default_name)
                .add_filter("PDF Files", &["pdf"])
                .save_file()
            {
                self.download_report(id, destination);
            }
        }
    }

    fn render_login(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(60.0);
            ui.vertical_centered(|ui| {
                ui.heading("⚗ Chemical Equipment Visualizer");
                ui.label(
                    RichText::new("Sign in to upload and analyze equipment data")
                        .color(ui.visuals().text_color().gamma_multiply(0.7)),
                );
                ui.add_space(20.0);

                ui.scope(|ui| {
                    ui.set_max_width(320.0);

                    ui.horizontal(|ui| {
                        ui.selectable_value(&mut self.login.registering, false, "Login");
                        ui.selectable_value(&mut self.login.registering, true, "Register");
                    });
                    ui.add_space(10.0);

                    egui::Grid::new("login_grid")
                        .num_columns(2)
                        .spacing([8.0, 8.0])
                        .show(ui, |ui| {
                            ui.label("Username:");
                            ui.text_edit_singleline(&mut self.login.username);
                            ui.end_row();

                            if self.login.registering {
                                ui.label("Email:");
                                ui.text_edit_singleline(&mut self.login.email);
                                ui.end_row();
                            }

                            ui.label("Password:");
                            ui.add(
                                egui::TextEdit::singleline(&mut self.login.password)
                                    .password(true),
                            );
                            ui.end_row();

                            if self.login.registering {
                                ui.label("Confirm:");
                                ui.add(
                                    egui::TextEdit::singleline(&mut self.login.password_confirm)
                                        .password(true),
                                );
                                ui.end_row();
                            }
                        });

                    ui.add_space(10.0);
                    let registering = self.login.registering;
                    let pending = self.login.pending;
                    let label = if pending {
                        "⏳ Please wait..."
                    } else if registering {
                        "Register"
                    } else {
                        "Login"
                    };
                    ui.add_enabled_ui(!pending, |ui| {
                        if ui
                            .add(egui::Button::new(label).min_size(egui::vec2(200.0, 32.0)))
                            .clicked()
                        {
                            if registering {
                                self.submit_register();
                            } else {
                                self.submit_login();
                            }
                        }
                    });

                    if let Some(error) = &self.login.error_message {
                        ui.add_space(8.0);
                        ui.colored_label(ERROR_RED, error);
                    }
                });
            });
        });
    }
}
