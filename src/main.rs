#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use tokio::sync::mpsc;
use image_crop_widget::canvas::Canvas;
use image_crop_widget::config::default_config_path;
use image_crop_widget::{
    AppConfig, ConfigError, CropController, CropperOptions, FileInputHandle, ImageElement, Point,
    SelectedFile, SharedCanvas, Size, UploadError, Uploader, UploaderOptions, data_uri, file_input,
};

/// Upload an image and crop it to a fixed output size.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output width, overriding the config file.
    #[arg(long)]
    target_width: Option<u32>,

    /// Output height, overriding the config file.
    #[arg(long)]
    target_height: Option<u32>,
}

type TextureSlot = Option<(egui::TextureHandle, u64)>;

struct CropperApp {
    file_input: FileInputHandle,
    uploads: mpsc::UnboundedReceiver<Result<String, UploadError>>,
    controller: CropController,
    display: SharedCanvas,
    preview: SharedCanvas,
    display_texture: TextureSlot,
    preview_texture: TextureSlot,
    exported: ImageElement,
    allowed_extensions: Vec<String>,
    status: Option<String>,
}

impl CropperApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: tokio::runtime::Handle,
        config: AppConfig,
    ) -> Result<Self, ConfigError> {
        let (handle, input) = file_input();
        let allowed_extensions = config.uploader.allowed_extensions.clone();
        let mut uploader = Uploader::new(UploaderOptions {
            input: Some(input),
            allowed_extensions: allowed_extensions.clone(),
        })?;

        let display = Canvas::shared(Size::new(0, 0));
        let preview = Canvas::shared(Size::new(0, 0));
        let controller = CropController::new(CropperOptions {
            target_size: Some(config.cropper.target_size()),
            resize_limit: config.cropper.resize_limit,
            handle_size: config.cropper.handle_size,
            display: Some(display.clone()),
            preview: Some(preview.clone()),
        })?;

        // Listen again after every settlement until the window goes away.
        let (tx, uploads) = mpsc::unbounded_channel();
        let ctx = cc.egui_ctx.clone();
        runtime.spawn(async move {
            loop {
                let result = uploader.await_upload().await;
                let closed = matches!(result, Err(UploadError::InputClosed));
                if tx.send(result).is_err() || closed {
                    break;
                }
                ctx.request_repaint();
            }
        });

        Ok(Self {
            file_input: handle,
            uploads,
            controller,
            display,
            preview,
            display_texture: None,
            preview_texture: None,
            exported: ImageElement::default(),
            allowed_extensions,
            status: None,
        })
    }

    fn dispatch(&mut self, files: Vec<SelectedFile>) {
        if let Err(e) = self.file_input.dispatch(files) {
            self.status = Some(e.to_string());
        }
    }

    fn poll_background(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.uploads.try_recv() {
            match result {
                Ok(uri) => {
                    self.controller.set_image_source(uri);
                    self.status = None;
                }
                Err(e) => self.status = Some(e.to_string()),
            }
        }

        if let Some(Err(e)) = self.controller.poll_decoded() {
            self.status = Some(e.to_string());
        }
        if self.controller.has_pending_decode() {
            ctx.request_repaint();
        }
    }

    fn save_cropped(&mut self) {
        if let Err(e) = self.controller.export_to(&mut self.exported) {
            self.status = Some(e.to_string());
            return;
        }
        let Some(uri) = &self.exported.src else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("cropped.png")
            .save_file()
        else {
            return;
        };
        let written = data_uri::decode(uri)
            .map_err(|e| e.to_string())
            .and_then(|(_, bytes)| std::fs::write(&path, bytes).map_err(|e| e.to_string()));
        match written {
            Ok(()) => log::info!("saved cropped image to {}", path.display()),
            Err(e) => {
                log::error!("failed to save image: {e}");
                self.status = Some(format!("Failed to save image: {e}"));
            }
        }
    }
}

fn sync_texture(ctx: &egui::Context, slot: &mut TextureSlot, name: &str, canvas: &SharedCanvas) {
    let canvas = canvas.borrow();
    let revision = canvas.revision();
    if matches!(slot, Some((_, seen)) if *seen == revision) {
        return;
    }
    let size = canvas.size();
    if size.is_empty() {
        *slot = None;
        return;
    }
    let image = egui::ColorImage::from_rgba_unmultiplied(
        [size.width as usize, size.height as usize],
        canvas.pixels().as_raw(),
    );
    match slot {
        Some((texture, seen)) => {
            texture.set(image, egui::TextureOptions::LINEAR);
            *seen = revision;
        }
        None => {
            *slot = Some((
                ctx.load_texture(name, image, egui::TextureOptions::LINEAR),
                revision,
            ));
        }
    }
}

impl eframe::App for CropperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle dropped files
        if !ctx.input(|i| i.raw.dropped_files.is_empty()) {
            let dropped: Vec<SelectedFile> = ctx.input(|i| {
                i.raw
                    .dropped_files
                    .iter()
                    .filter_map(|file| file.path.clone())
                    .map(SelectedFile::from_path)
                    .collect()
            });
            self.dispatch(dropped);
        }

        self.poll_background(ctx);
        sync_texture(ctx, &mut self.display_texture, "display", &self.display);
        sync_texture(ctx, &mut self.preview_texture, "preview", &self.preview);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image").clicked() {
                    if let Some(paths) = rfd::FileDialog::new()
                        .add_filter("Image", self.allowed_extensions.as_slice())
                        .pick_files()
                    {
                        let files = paths.into_iter().map(SelectedFile::from_path).collect();
                        self.dispatch(files);
                    }
                }

                if self.controller.is_listening() && ui.button("Save Cropped Image").clicked() {
                    self.save_cropped();
                }

                let target = self.controller.target_size();
                ui.label(format!("Output: {}x{}", target.width, target.height));
            });

            if let Some(status) = &self.status {
                ui.colored_label(egui::Color32::LIGHT_RED, status);
            }
            ui.separator();

            ui.horizontal_top(|ui| {
                if let Some((texture, _)) = &self.display_texture {
                    let size = texture.size_vec2();
                    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::drag());
                    ui.painter_at(rect).image(
                        texture.id(),
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );

                    let local = |pos: egui::Pos2| Point::new(pos.x - rect.min.x, pos.y - rect.min.y);
                    if response.drag_started() {
                        if let Some(pos) = response.interact_pointer_pos() {
                            self.controller.pointer_down(local(pos));
                        }
                    }
                    if response.dragged() {
                        if let Some(pos) = response.interact_pointer_pos() {
                            self.controller.pointer_move(local(pos));
                        }
                    }
                    if response.drag_stopped() {
                        self.controller.pointer_up();
                    }
                } else if self.controller.has_pending_decode() {
                    ui.spinner();
                } else {
                    ui.label("Open or drop an image to start cropping.");
                }

                if let Some((texture, _)) = &self.preview_texture {
                    ui.add_space(16.0);
                    ui.image(egui::load::SizedTexture::new(
                        texture.id(),
                        texture.size_vec2(),
                    ));
                }
            });
        });
    }
}

fn load_config(args: &Args) -> AppConfig {
    let path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = AppConfig::load_or_default(Some(&path)).unwrap_or_else(|e| {
        log::error!("{e}; using defaults");
        AppConfig::default()
    });
    if let Some(width) = args.target_width {
        config.cropper.target_width = width;
    }
    if let Some(height) = args.target_height {
        config.cropper.target_height = height;
    }
    config
}

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = load_config(&args);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    // decodes spawned from the UI thread land on this runtime's blocking pool
    let _guard = runtime.enter();
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1000.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Image Crop Widget",
        options,
        Box::new(move |cc| Ok(Box::new(CropperApp::new(cc, handle, config)?))),
    )
}
