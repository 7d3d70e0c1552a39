mod graph_view;
mod loader;
mod map_view;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use egui::{
    Align, Color32, Frame, Layout, Margin, RichText, Slider, TextEdit, Ui, Vec2, Visuals,
    style::Widgets,
};
use log::{debug, error, info};
use telesync::{
    FrameReadout, PlayMode, PlaybackEvent, PlaybackState, TelesyncError,
    config::AppConfig,
    playback::MarkerAnimator,
    sync::parse_offset,
};

use super::{
    PALETTE_BLACK, PALETTE_BROWN, PALETTE_MAROON, PALETTE_ORANGE, format_clock, format_distance,
    format_elevation, format_speed,
};
use graph_view::show_graph;
use loader::{LoaderMessage, spawn_concat, spawn_load};
use map_view::{MapInteraction, MapView};

const TRACK_EXTENSIONS: [&str; 2] = ["gpx", "fit"];
const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mov", "m4v", "mkv", "avi"];
const MAP_HEIGHT_SHARE: f32 = 0.65;

enum UiState {
    SelectFiles,
    Loading { activity: String },
    Display,
}

pub struct TelesyncViewerApp {
    app_config: AppConfig,
    ui_state: UiState,
    playback: PlaybackState,
    marker: MarkerAnimator,
    map: Option<MapView>,
    track_path: Option<PathBuf>,
    video_path: Option<PathBuf>,
    loader_tx: Sender<LoaderMessage>,
    loader_rx: Receiver<LoaderMessage>,
    readout: Option<FrameReadout>,
    graph_time_s: f64,
    // playback clock standing in for the video element
    clock_s: f64,
    offset_text: String,
    status: Option<String>,
}

impl TelesyncViewerApp {
    pub fn new(
        app_config: AppConfig,
        track_path: Option<PathBuf>,
        video_path: Option<PathBuf>,
        offset_ms: Option<i64>,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        cc.egui_ctx.set_visuals(Visuals {
            dark_mode: true,
            hyperlink_color: PALETTE_MAROON,
            faint_bg_color: PALETTE_BLACK,
            extreme_bg_color: PALETTE_BROWN,
            panel_fill: PALETTE_BLACK,
            button_frame: true,
            widgets: Widgets::dark(),
            striped: false,
            ..Default::default()
        });

        let mut app = Self::with_config(app_config, track_path, video_path, offset_ms);
        if app.track_path.is_some() && app.video_path.is_some() {
            app.start_loading();
        }
        app
    }

    fn with_config(
        app_config: AppConfig,
        track_path: Option<PathBuf>,
        video_path: Option<PathBuf>,
        offset_ms: Option<i64>,
    ) -> Self {
        let offset_ms = offset_ms.unwrap_or(app_config.default_sync_offset_ms);
        let (loader_tx, loader_rx) = mpsc::channel();
        Self {
            marker: MarkerAnimator::new(app_config.marker_easing),
            playback: PlaybackState::with_offset(offset_ms),
            app_config,
            ui_state: UiState::SelectFiles,
            map: None,
            track_path,
            video_path,
            loader_tx,
            loader_rx,
            readout: None,
            graph_time_s: 0.,
            clock_s: 0.,
            offset_text: offset_ms.to_string(),
            status: None,
        }
    }

    fn start_loading(&mut self) {
        let (Some(track_path), Some(video_path)) = (self.track_path.clone(), self.video_path.clone())
        else {
            return;
        };
        info!("Loading {:?} and {:?}", track_path, video_path);
        spawn_load(
            track_path,
            video_path,
            self.app_config.tools.clone(),
            self.loader_tx.clone(),
        );
        self.ui_state = UiState::Loading {
            activity: "Loading track and video".to_string(),
        };
    }

    /// Back to file selection with the reason shown. Any session already
    /// loaded stays untouched and reachable from there.
    fn fail(&mut self, e: TelesyncError) {
        self.status = Some(e.to_string());
        self.ui_state = UiState::SelectFiles;
    }

    fn receive_loader_messages(&mut self) {
        while let Ok(message) = self.loader_rx.try_recv() {
            match message {
                LoaderMessage::SessionReady(Ok(files)) => {
                    let map = MapView::new(&files.track);
                    match self.playback.load(files.track, files.video) {
                        Ok(events) => {
                            self.map = Some(map);
                            self.marker.clear();
                            self.clock_s = 0.;
                            self.status = None;
                            self.video_path = Some(files.video_path);
                            self.apply_events(events);
                            self.ui_state = UiState::Display;
                        }
                        Err(e) => self.fail(e),
                    }
                }
                LoaderMessage::SessionReady(Err(e)) => self.fail(e),
                LoaderMessage::VideosJoined(Ok(path)) => {
                    self.status = Some(format!("Joined videos into {}", path.display()));
                    self.video_path = Some(path);
                    self.ui_state = UiState::SelectFiles;
                }
                LoaderMessage::VideosJoined(Err(e)) => {
                    self.status = Some(e.to_string());
                    self.ui_state = UiState::SelectFiles;
                }
            }
        }
    }

    fn apply_events(&mut self, events: Vec<PlaybackEvent>) {
        for event in events {
            match event {
                PlaybackEvent::SessionLoaded {
                    frame_count,
                    valid_frame_count,
                    total_distance_km,
                } => debug!(
                    "Viewer showing {} frames ({} valid), {:.2} km",
                    frame_count, valid_frame_count, total_distance_km
                ),
                PlaybackEvent::PlayStateChanged(mode) => {
                    if mode != PlayMode::Playing {
                        self.marker.snap();
                    }
                }
                PlaybackEvent::PositionChanged { position, snap } => {
                    self.marker.set_target(position, snap)
                }
                PlaybackEvent::ReadoutChanged(readout) => self.readout = Some(readout),
                PlaybackEvent::GraphIndicator { video_time_s, .. } => {
                    self.graph_time_s = video_time_s
                }
                PlaybackEvent::OffsetChanged { offset_ms } => {
                    self.offset_text = offset_ms.to_string()
                }
            }
        }
    }

    fn seek(&mut self, frame: usize) -> Vec<PlaybackEvent> {
        let events = self.playback.seek(frame);
        self.clock_s = self.playback.current_time_s();
        events
    }

    fn advance_clock(&mut self, dt_s: f64) {
        if self.playback.mode() != PlayMode::Playing {
            return;
        }
        let Some(duration) = self.playback.session().map(|s| s.video().duration_seconds) else {
            return;
        };
        self.clock_s = (self.clock_s + dt_s).min(duration);
        let mut events = self.playback.on_time_update(self.clock_s);
        if self.clock_s >= duration {
            events.extend(self.playback.pause());
        }
        self.apply_events(events);
        self.marker.tick(dt_s);
    }

    fn pick_dir(dialog: rfd::FileDialog, dir: &Option<PathBuf>) -> rfd::FileDialog {
        match dir {
            Some(dir) => dialog.set_directory(dir),
            None => dialog,
        }
    }

    fn file_label(path: &Option<PathBuf>) -> String {
        path.as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "none selected".to_string())
    }

    fn select_files(&mut self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.);
            ui.heading(RichText::new("Telesync").color(PALETTE_ORANGE).strong());
            ui.add_space(20.);

            ui.horizontal(|ui| {
                if ui.button("🗺 Select track (FIT/GPX)").clicked()
                    && let Some(path) = Self::pick_dir(
                        rfd::FileDialog::new().add_filter("GPS track", &TRACK_EXTENSIONS),
                        &self.app_config.last_track_dir,
                    )
                    .pick_file()
                {
                    self.app_config.last_track_dir = path.parent().map(Path::to_path_buf);
                    self.track_path = Some(path);
                }
                ui.label(Self::file_label(&self.track_path));
            });

            ui.horizontal(|ui| {
                if ui.button("🎞 Select video").clicked()
                    && let Some(path) = Self::pick_dir(
                        rfd::FileDialog::new().add_filter("Video", &VIDEO_EXTENSIONS),
                        &self.app_config.last_video_dir,
                    )
                    .pick_file()
                {
                    self.app_config.last_video_dir = path.parent().map(Path::to_path_buf);
                    self.video_path = Some(path);
                }
                ui.label(Self::file_label(&self.video_path));
                if ui.button("Join several videos…").clicked() {
                    self.join_videos();
                }
            });

            ui.add_space(10.);
            ui.horizontal(|ui| {
                let ready = self.track_path.is_some() && self.video_path.is_some();
                if ui.add_enabled(ready, egui::Button::new("▶ Load")).clicked() {
                    self.start_loading();
                }
                if self.playback.session().is_some() && ui.button("Back to viewer").clicked() {
                    self.ui_state = UiState::Display;
                }
            });

            if let Some(status) = &self.status {
                ui.add_space(10.);
                ui.label(RichText::new(status).color(Color32::LIGHT_GRAY));
            }
        });
    }

    fn join_videos(&mut self) {
        let Some(inputs) = Self::pick_dir(
            rfd::FileDialog::new().add_filter("Video", &VIDEO_EXTENSIONS),
            &self.app_config.last_video_dir,
        )
        .pick_files() else {
            return;
        };
        let Some(output) = Self::pick_dir(
            rfd::FileDialog::new().set_file_name("joined.mp4"),
            &self.app_config.last_video_dir,
        )
        .save_file() else {
            return;
        };
        spawn_concat(
            inputs,
            output,
            self.app_config.tools.clone(),
            self.loader_tx.clone(),
        );
        self.ui_state = UiState::Loading {
            activity: "Joining videos".to_string(),
        };
    }

    fn files_bar(&mut self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.visuals_mut().button_frame = false;
            if ui.button("📂 Open files").clicked() {
                self.events_pause();
                self.ui_state = UiState::SelectFiles;
            }
            ui.separator();
            ui.label(format!(
                "Track: {}  Video: {}",
                Self::file_label(&self.track_path),
                Self::file_label(&self.video_path)
            ));
            if let Some(status) = &self.status {
                ui.separator();
                ui.label(RichText::new(status).color(PALETTE_ORANGE));
            }
        });
    }

    fn events_pause(&mut self) {
        let events = self.playback.pause();
        self.apply_events(events);
    }

    fn controls(&mut self, ui: &mut Ui) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        let Some((frame_count, duration_s)) = self
            .playback
            .session()
            .map(|s| (s.projection().frame_count(), s.video().duration_seconds))
        else {
            return events;
        };

        ui.horizontal(|ui| {
            let label = if self.playback.mode() == PlayMode::Playing {
                "⏸ Pause"
            } else {
                "▶ Play"
            };
            if ui.button(label).clicked() {
                if self.playback.mode() != PlayMode::Playing && self.clock_s >= duration_s {
                    events.extend(self.seek(0));
                }
                events.extend(self.playback.toggle());
            }

            ui.label(format!(
                "{} / {}",
                format_clock(self.clock_s),
                format_clock(duration_s)
            ));

            let mut frame = self.playback.current_frame();
            ui.spacing_mut().slider_width = (ui.available_width() - 360.).max(100.);
            if ui
                .add(Slider::new(&mut frame, 0..=frame_count.saturating_sub(1)).show_value(false))
                .changed()
            {
                events.extend(self.seek(frame));
            }

            ui.separator();
            ui.label("Offset (ms)");
            ui.add(TextEdit::singleline(&mut self.offset_text).desired_width(70.));
            if ui.button("Apply").clicked() {
                match parse_offset(&self.offset_text) {
                    Ok(offset_ms) => {
                        self.status = None;
                        events.extend(self.playback.set_offset(offset_ms));
                    }
                    Err(e) => self.status = Some(e.to_string()),
                }
            }
            ui.checkbox(&mut self.app_config.follow_marker, "Follow");
        });
        events
    }

    fn readout_panel(&self, ui: &mut Ui) {
        let Some(session) = self.playback.session() else {
            return;
        };
        let video = session.video();
        let track = session.track();

        ui.with_layout(Layout::top_down(Align::LEFT), |ui| {
            ui.heading(RichText::new("Telemetry").color(Color32::WHITE));
            match &self.readout {
                Some(readout) => {
                    let fix = if readout.is_valid {
                        RichText::new("GPS fix").color(Color32::GREEN)
                    } else {
                        RichText::new("No GPS fix").color(PALETTE_ORANGE)
                    };
                    ui.label(fix);
                    if let Some(position) = readout.display_position {
                        ui.label(format!("Lat {:.6}", position.lat));
                        ui.label(format!("Lon {:.6}", position.lon));
                    }
                    ui.label(format!("Speed {}", format_speed(readout.speed)));
                    ui.label(format!("Elevation {}", format_elevation(readout.elevation)));
                    ui.label(format!(
                        "Frame {} / {}",
                        readout.frame_index,
                        session.projection().frame_count()
                    ));
                }
                None => {
                    ui.label("No frame selected");
                }
            }

            ui.separator();
            ui.heading(RichText::new("Recording").color(Color32::WHITE));
            ui.label(format!(
                "Points {} ({} valid)",
                track.total_count(),
                track.valid_count()
            ));
            ui.label(format!("Distance {}", format_distance(track.total_distance_km() * 1000.)));
            ui.label(format!(
                "Video {}x{} at {:.2} fps",
                video.width, video.height, video.frames_per_second
            ));
            ui.label(format!("Offset {} ms", self.playback.sync_offset_ms()));
        });
    }

    fn views(&mut self, ui: &mut Ui) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        let marker = self.marker.displayed();
        let follow = self.app_config.follow_marker && self.playback.mode() == PlayMode::Playing;
        let map_size = Vec2::new(ui.available_width(), ui.available_height() * MAP_HEIGHT_SHARE);

        let interaction = match &mut self.map {
            Some(map) => ui.allocate_ui(map_size, |ui| map.show(ui, marker, follow)).inner,
            None => None,
        };
        ui.separator();
        let graph_click = self
            .playback
            .session()
            .and_then(|s| show_graph(ui, s.projection().seconds(), self.graph_time_s));

        match interaction {
            Some(MapInteraction::Clicked(position)) => {
                if let Some(frame) = self.playback.resolve_click(position) {
                    events.extend(self.seek(frame));
                }
            }
            Some(MapInteraction::DragStarted) => self.playback.begin_drag(),
            Some(MapInteraction::DragReleased(position)) => {
                events.extend(self.playback.end_drag(position));
                self.clock_s = self.playback.current_time_s();
            }
            None => {}
        }

        if let Some(second) = graph_click
            && let Some(frame) = self.playback.session().map(|s| s.video().frame_at(second))
        {
            events.extend(self.seek(frame));
        }
        events
    }

    fn display(&mut self, ctx: &egui::Context) {
        let mut events = Vec::new();
        let panel_frame = Frame::default()
            .fill(Color32::TRANSPARENT)
            .inner_margin(Margin::same(5));

        egui::TopBottomPanel::top("files_bar")
            .frame(egui::Frame::new().inner_margin(4))
            .show(ctx, |ui| self.files_bar(ui));
        egui::TopBottomPanel::bottom("playback_controls")
            .frame(panel_frame)
            .show(ctx, |ui| events.extend(self.controls(ui)));
        egui::SidePanel::right("readout")
            .frame(panel_frame)
            .resizable(false)
            .min_width(180.)
            .show(ctx, |ui| self.readout_panel(ui));
        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| events.extend(self.views(ui)));

        self.apply_events(events);
    }
}

impl eframe::App for TelesyncViewerApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.app_config.default_sync_offset_ms = self.playback.sync_offset_ms();
        if let Err(e) = self.app_config.save() {
            error!("Error while saving config file: {}", e);
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.receive_loader_messages();
        self.advance_clock(ctx.input(|i| i.stable_dt) as f64);

        match &self.ui_state {
            UiState::SelectFiles => {
                egui::CentralPanel::default().show(ctx, |ui| self.select_files(ui));
            }
            UiState::Loading { activity } => {
                let activity = activity.clone();
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(40.);
                        ui.spinner();
                        ui.label(RichText::new(activity).color(Color32::WHITE));
                    });
                });
            }
            UiState::Display => self.display(ctx),
        }

        if self.playback.mode() == PlayMode::Playing
            || !self.marker.is_settled()
            || matches!(self.ui_state, UiState::Loading { .. })
        {
            ctx.request_repaint();
        }
    }
}
