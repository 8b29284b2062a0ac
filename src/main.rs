// src/main.rs
use nannou::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

use glint::{
    config::Config,
    controllers::{OscCommand, OscController, OscSender},
    models::{QualityTier, VectorDocument, ViewParameters},
    services::{
        CapturePhase, CaptureSnapshot, FrameRecorder, GeometryParams, SceneBuilder,
        TurntableRecorder,
    },
    views::{draw_group, Camera},
};

const OUTPUT_FILE_NAME: &str = "logo360.mp4";

struct Model {
    // Core components:
    document: VectorDocument,
    scene: SceneBuilder,
    view_params: ViewParameters,
    spin_angle: f32,

    // Sample logos bundled next to the binary:
    samples_dir: PathBuf,
    samples: Vec<PathBuf>,
    sample_cursor: usize,
    state_file: PathBuf,

    // Comms components:
    osc_controller: OscController,
    osc_sender: OscSender,

    // Rendering components:
    texture: wgpu::Texture,
    draw: nannou::Draw,
    draw_renderer: nannou::draw::Renderer,
    texture_reshaper: wgpu::TextureReshaper,
    render_size: Vec2,

    // Turntable capture:
    turntable: TurntableRecorder,
    capture_started: Option<Instant>,
    frame_recorder: FrameRecorder,
    exit_requested: bool,

    // Messages
    status: Option<String>,
    alert: Option<String>,

    last_update: Instant,
}

fn main() {
    nannou::app(model).update(update).run();
}

fn model(app: &App) -> Model {
    // Load config
    let config = Config::load().expect("Failed to load config file");

    // Restore the last session's logo, falling back to the first sample
    let state_file = config.resolve_state_file();
    let samples_dir = config.resolve_samples_dir();
    let samples = list_samples(&samples_dir);
    let document = VectorDocument::restore(&state_file)
        .or_else(|| {
            samples
                .first()
                .and_then(|path| VectorDocument::from_file(path).ok())
        })
        .unwrap_or_else(|| {
            VectorDocument::from_markup("empty", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>")
                .expect("fallback document")
        });

    // Create OSC controller
    let osc_controller =
        OscController::new(config.osc.rx_port).expect("Failed to create OSC Controller");
    let osc_sender = OscSender::new(config.osc.rx_port).expect("Failed to create OSC Sender");

    // Create window
    let window_id = app
        .new_window()
        .title("glint 0.2.1")
        .size(config.window.width, config.window.height)
        .msaa_samples(1)
        .view(view)
        .key_pressed(key_pressed)
        .dropped_file(dropped_file)
        .build()
        .unwrap();
    let window = app.window(window_id).unwrap();

    // Set up render texture
    let device = window.device();
    let draw = nannou::Draw::new();
    let texture = wgpu::TextureBuilder::new()
        .size([
            config.rendering.texture_width,
            config.rendering.texture_height,
        ])
        .usage(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
        .sample_count(config.rendering.texture_samples)
        .format(wgpu::TextureFormat::Rgba16Float)
        .build(device);

    // Set up rendering pipeline
    let draw_renderer = nannou::draw::RendererBuilder::new()
        .build_from_texture_descriptor(device, texture.descriptor());
    let sample_count = window.msaa_samples();

    // Create the texture reshaper.
    let texture_view = texture.view().build();
    let texture_reshaper = wgpu::TextureReshaper::new(
        device,
        &texture_view,
        texture.sample_count(),
        texture.sample_type(),
        sample_count,
        Frame::TEXTURE_FORMAT,
    );

    let output_path = config.resolve_output_dir().join(OUTPUT_FILE_NAME);
    std::fs::create_dir_all(config.resolve_output_dir())
        .expect("Failed to create output directory");

    // Create the frame recorder
    let frame_recorder = FrameRecorder::new(device, &texture, &output_path, config.capture.fps);

    let scene = SceneBuilder::new(
        GeometryParams {
            depth: config.extrusion.depth,
            quality: config.extrusion.quality,
        },
        config.extrusion.bevel.clone(),
    );

    Model {
        document,
        scene,
        view_params: ViewParameters::from_defaults(&config.view),
        spin_angle: 0.0,

        samples_dir,
        samples,
        sample_cursor: 0,
        state_file,

        osc_controller,
        osc_sender,

        texture,
        draw,
        draw_renderer,
        texture_reshaper,
        render_size: vec2(
            config.rendering.texture_width as f32,
            config.rendering.texture_height as f32,
        ),

        turntable: TurntableRecorder::new(
            config.capture.duration_seconds,
            config.capture.flush_margin_seconds,
        ),
        capture_started: None,
        frame_recorder,
        exit_requested: false,

        status: None,
        alert: None,

        last_update: Instant::now(),
    }
}

fn list_samples(samples_dir: &std::path::Path) -> Vec<PathBuf> {
    let mut samples: Vec<PathBuf> = std::fs::read_dir(samples_dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.extension()
                        .map_or(false, |e| e.eq_ignore_ascii_case("svg"))
                })
                .collect()
        })
        .unwrap_or_default();
    samples.sort();
    samples
}

fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    if model.alert.is_some() {
        if matches!(key, Key::Return | Key::Escape) {
            model.alert = None;
        }
        return;
    }

    match key {
        // Extrusion depth
        Key::Up => {
            model.osc_sender.send_depth(model.scene.pending().depth + 2.0);
        }
        Key::Down => {
            model.osc_sender.send_depth(model.scene.pending().depth - 2.0);
        }

        // Camera field of view
        Key::Right => {
            model.osc_sender.send_fov(model.view_params.fov_degrees + 5.0);
        }
        Key::Left => {
            model.osc_sender.send_fov(model.view_params.fov_degrees - 5.0);
        }

        // Rotation speed
        Key::Period => {
            model
                .osc_sender
                .send_turn_seconds(model.view_params.turn_seconds - 1.0);
        }
        Key::Comma => {
            model
                .osc_sender
                .send_turn_seconds(model.view_params.turn_seconds + 1.0);
        }

        // Quality tier cycle
        Key::Space => {
            let next = tier_index(model.scene.pending().quality.next());
            model.osc_sender.send_quality(next);
        }

        // Background presets
        Key::Key1 => model.osc_sender.send_background(0.08, 0.09, 0.12),
        Key::Key2 => model.osc_sender.send_background(0.92, 0.92, 0.90),
        Key::Key3 => model.osc_sender.send_background(0.10, 0.25, 0.20),

        // Cycle through bundled sample logos
        Key::S => {
            if !model.samples.is_empty() {
                model.sample_cursor = (model.sample_cursor + 1) % model.samples.len();
                let name = model.samples[model.sample_cursor]
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                model.osc_sender.send_sample(&name);
            }
        }

        Key::R => model.osc_sender.send_start_capture(),

        // Graceful quit that waits for the encoder to drain
        Key::Q => {
            if model.frame_recorder.is_recording() {
                model.frame_recorder.stop();
            }
            model.exit_requested = true;
        }
        _ => (),
    }
}

fn dropped_file(_app: &App, model: &mut Model, path: PathBuf) {
    if model.turntable.is_active() {
        model.status = Some("Drop ignored while a capture is running".to_string());
        return;
    }
    match VectorDocument::from_file(&path) {
        Ok(document) => {
            if let Err(e) = document.persist(&model.state_file) {
                eprintln!("Failed to persist document state: {}", e);
            }
            model.status = Some(format!("Loaded {}", document.name));
            model.document = document;
            model.scene.document_changed();
        }
        Err(e) => model.status = Some(e.to_string()),
    }
}

fn update(app: &App, model: &mut Model, _update: Update) {
    let now = Instant::now();
    let dt = (now - model.last_update).as_secs_f32();
    model.last_update = now;

    model.draw.reset();

    // Process OSC messages
    model.osc_controller.process_messages();
    launch_commands(model);

    if model.exit_requested {
        handle_exit_state(app, model);
        return;
    }

    model.scene.tick(&model.document);

    if model.turntable.is_active() {
        update_capture(model);
    } else {
        model.spin_angle += model.view_params.spin_rate() * dt;
    }

    // Draw the scene into the offscreen texture
    let draw = &model.draw;
    draw.background().color(model.view_params.background);

    let camera = Camera::new(model.view_params.fov_degrees, model.render_size);
    draw_group(
        draw,
        model.scene.group(),
        model.spin_angle,
        &camera,
        scene_color(model.view_params.background),
    );

    // Keep readouts and alerts out of captured frames
    if !model.turntable.is_active() {
        draw_hud(model);
    }

    render_and_capture(app, model);
}

fn update_capture(model: &mut Model) {
    let elapsed = model
        .capture_started
        .map(|t| t.elapsed().as_secs_f32())
        .unwrap_or(0.0);

    if let Some(error) = model.frame_recorder.take_error() {
        fail_capture(model, &error);
        return;
    }

    match model.turntable.phase() {
        CapturePhase::Recording => {
            model.spin_angle = model.turntable.angle(elapsed);
            if model.turntable.advance(elapsed) {
                model.frame_recorder.stop();
            }
        }
        CapturePhase::Finalizing => {
            if !model.frame_recorder.has_pending_frames() {
                model.frame_recorder.cleanup_completed_worker();
                if let Some(error) = model.frame_recorder.take_error() {
                    fail_capture(model, &error);
                } else if let Some(snapshot) = model.turntable.finish() {
                    restore_snapshot(model, snapshot);
                    model.status = Some(format!("Saved {}", OUTPUT_FILE_NAME));
                }
            }
        }
        CapturePhase::Idle => {}
    }
}

fn start_capture(model: &mut Model) {
    let snapshot = CaptureSnapshot {
        spin_angle: model.spin_angle,
        quality: model.scene.committed().quality,
    };
    let has_geometry = !model.scene.group().is_empty();
    match model.turntable.start(snapshot, has_geometry) {
        Ok(()) => {
            // the first recorded frame must already be at export quality
            model
                .scene
                .force_rebuild_with_quality(&model.document, QualityTier::Export);
            model.frame_recorder.start();
            model.capture_started = Some(Instant::now());
            model.status = Some(format!(
                "Recording {:.0}s turntable...",
                model.turntable.duration()
            ));
        }
        Err(e) => model.status = Some(e.to_string()),
    }
}

fn fail_capture(model: &mut Model, error: &str) {
    if model.frame_recorder.is_recording() {
        model.frame_recorder.stop();
    }
    if let Some(snapshot) = model.turntable.abort() {
        restore_snapshot(model, snapshot);
    }
    model.alert = Some(format!("Capture failed: {}", error));
}

fn restore_snapshot(model: &mut Model, snapshot: CaptureSnapshot) {
    model.spin_angle = snapshot.spin_angle;
    model.scene.set_quality(snapshot.quality);
    model.capture_started = None;
}

// Pick a logo color that stays readable against the background.
fn scene_color(background: Rgb<f32>) -> Rgb<f32> {
    let luma = 0.2126 * background.red + 0.7152 * background.green + 0.0722 * background.blue;
    if luma > 0.5 {
        rgb(0.15, 0.17, 0.22)
    } else {
        rgb(0.88, 0.90, 0.95)
    }
}

fn tier_index(tier: QualityTier) -> i32 {
    match tier {
        QualityTier::Draft => 0,
        QualityTier::Standard => 1,
        QualityTier::Export => 2,
    }
}

fn tier_from_index(index: i32) -> Option<QualityTier> {
    match index {
        0 => Some(QualityTier::Draft),
        1 => Some(QualityTier::Standard),
        2 => Some(QualityTier::Export),
        _ => None,
    }
}

fn tier_name(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::Draft => "draft",
        QualityTier::Standard => "standard",
        QualityTier::Export => "export",
    }
}

// ******************************* HUD *******************************

fn draw_hud(model: &Model) {
    let draw = &model.draw;
    let top = model.render_size.y * 0.5;
    let left = -model.render_size.x * 0.5;

    // pending values echo immediately, ahead of the rebuild
    let readout = format!(
        "{}   depth {:.0}   quality {}   fov {:.0}   turn {:.0}s",
        model.document.name,
        model.scene.pending().depth,
        tier_name(model.scene.pending().quality),
        model.view_params.fov_degrees,
        model.view_params.turn_seconds,
    );
    draw.text(&readout)
        .left_justify()
        .x_y(left + 460.0, top - 40.0)
        .w(880.0)
        .font_size(22)
        .color(WHITE);

    if model.scene.is_busy() {
        draw.text("rebuilding...")
            .left_justify()
            .x_y(left + 460.0, top - 72.0)
            .w(880.0)
            .font_size(20)
            .color(YELLOW);
    }

    if let Some(status) = &model.status {
        draw.text(status)
            .left_justify()
            .x_y(left + 460.0, -top + 40.0)
            .w(880.0)
            .font_size(20)
            .color(LIGHTGRAY);
    }

    if let Some(alert) = &model.alert {
        draw.rect()
            .w_h(720.0, 160.0)
            .x_y(0.0, 0.0)
            .color(srgba(0.0, 0.0, 0.0, 0.85));
        draw.text(&format!("{}\n\npress Enter to dismiss", alert))
            .x_y(0.0, 0.0)
            .w(680.0)
            .font_size(24)
            .color(ORANGERED);
    }
}

// ******************************* Rendering and Capture *****************************

fn render_and_capture(app: &App, model: &mut Model) {
    let window = app.main_window();
    let device = window.device();
    let ce_desc = wgpu::CommandEncoderDescriptor {
        label: Some("Texture renderer"),
    };
    let mut encoder = device.create_command_encoder(&ce_desc);
    let texture_view = model.texture.view().build();

    model.draw_renderer.encode_render_pass(
        device,
        &mut encoder,
        &model.draw,
        2.0,
        model.texture.size(),
        &texture_view,
        None,
    );

    // Capture the texture for FrameRecorder
    if model.frame_recorder.is_recording() {
        model
            .frame_recorder
            .capture_frame(device, &mut encoder, &model.texture);
    }

    window.queue().submit(Some(encoder.finish()));
    device.poll(wgpu::Maintain::Wait);
}

// ******************************* Exit State Handling *******************************

fn handle_exit_state(app: &App, model: &mut Model) {
    if model.frame_recorder.has_pending_frames() {
        let draw = &model.draw;
        draw.background().color(BLACK);
        draw.text("finishing video export...")
            .color(WHITE)
            .font_size(32)
            .x_y(0.0, 0.0);
        render_and_capture(app, model);
        std::thread::sleep(std::time::Duration::from_millis(200));
    } else {
        app.quit();
    }
}

// ******************************* OSC Launcher *******************************

fn launch_commands(model: &mut Model) {
    for command in model.osc_controller.take_commands() {
        // parameters freeze while a capture runs
        if model.turntable.is_active() {
            continue;
        }
        match command {
            OscCommand::SetDepth { depth } => {
                model.scene.set_depth(depth.clamp(1.0, 100.0));
            }
            OscCommand::SetQuality { tier_index } => {
                if let Some(tier) = tier_from_index(tier_index) {
                    model.scene.set_quality(tier);
                } else {
                    model.status = Some(format!("Unknown quality tier: {}", tier_index));
                }
            }
            OscCommand::SetFov { degrees } => {
                model.view_params.fov_degrees = degrees.clamp(15.0, 100.0);
            }
            OscCommand::SetTurnSeconds { seconds } => {
                model.view_params.turn_seconds = seconds.clamp(1.0, 60.0);
            }
            OscCommand::SetBackground { r, g, b } => {
                model.view_params.background =
                    rgb(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0));
            }
            OscCommand::LoadSample { name } => load_sample(model, &name),
            OscCommand::StartCapture => start_capture(model),
        }
    }
}

fn load_sample(model: &mut Model, name: &str) {
    let found = model
        .samples
        .iter()
        .position(|path| path.file_name().map_or(false, |n| n.to_string_lossy() == name));
    match found {
        Some(index) => match VectorDocument::sample(&model.samples_dir, name) {
            Ok(document) => {
                if let Err(e) = document.persist(&model.state_file) {
                    eprintln!("Failed to persist document state: {}", e);
                }
                model.sample_cursor = index;
                model.status = Some(format!("Loaded sample {}", document.name));
                model.document = document;
                model.scene.document_changed();
            }
            Err(e) => model.status = Some(e.to_string()),
        },
        None => model.status = Some(format!("No sample named {}", name)),
    }
}

// Draw the state of Model into the given Frame
fn view(_app: &App, model: &Model, frame: Frame) {
    let mut encoder = frame.command_encoder();

    model
        .texture_reshaper
        .encode_render_pass(frame.texture_view(), &mut encoder);
}
