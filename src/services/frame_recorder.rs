// src/services/frame_recorder.rs
// FrameRecorder captures frames from a wgpu::Texture and encodes them to
// video by piping raw frames to ffmpeg for h264 encoding. Encoding runs on
// its own thread to avoid blocking the render loop. Encoder failures are
// parked in an error slot for the caller to collect instead of tearing the
// app down mid-capture.

use nannou::{image::RgbaImage, wgpu};
use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

const RESOLVED_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const NUM_STAGING_BUFFERS: usize = 3;

type FrameData = (Vec<u8>, u32, u32);
type ErrorSlot = Arc<Mutex<Option<String>>>;

struct WorkerThread {
    thread_handle: JoinHandle<()>,
    frame_sender: Sender<FrameData>,
    shutdown_requested: Arc<AtomicBool>,
    thread_completed: Arc<AtomicBool>,
    frames_in_queue: Arc<AtomicUsize>,
}

pub struct FrameRecorder {
    worker_thread: Mutex<Option<WorkerThread>>,

    is_recording: AtomicBool,
    capture_in_progress: Arc<AtomicBool>,
    frame_time: u64,
    next_scheduled_capture: Mutex<u64>,
    output_path: PathBuf,
    fps: u64,
    error_slot: ErrorSlot,

    // capture pipeline
    texture_reshaper: wgpu::TextureReshaper,
    resolved_texture: wgpu::Texture, // for MSAA resolution
    staging_buffers: Vec<Arc<wgpu::Buffer>>,
    current_buffer_index: AtomicUsize,
}

impl FrameRecorder {
    pub fn new(
        device: &wgpu::Device,
        render_texture: &wgpu::Texture,
        output_path: &Path,
        fps: u64,
    ) -> Self {
        // Create a texture for resolving MSAA
        let resolved_texture = wgpu::TextureBuilder::new()
            .size([render_texture.width(), render_texture.height()])
            .sample_count(1) // No MSAA
            .format(RESOLVED_TEXTURE_FORMAT)
            .usage(
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::TEXTURE_BINDING,
            )
            .build(device);

        let texture_reshaper = wgpu::TextureReshaper::new(
            device,
            &render_texture.view().build(),
            render_texture.sample_count(),
            render_texture.sample_type(),
            1, // destination samples (no MSAA)
            RESOLVED_TEXTURE_FORMAT,
        );

        // Staging buffers for GPU->CPU transfer, rotated so a mapped buffer
        // never blocks the next copy
        let pixel_size = format_bytes_per_pixel(RESOLVED_TEXTURE_FORMAT);
        let bytes_per_row = wgpu::util::align_to(render_texture.width() * pixel_size, 256);
        let buffer_size = (bytes_per_row * render_texture.height()) as u64;

        let mut staging_buffers = Vec::with_capacity(NUM_STAGING_BUFFERS);
        for i in 0..NUM_STAGING_BUFFERS {
            staging_buffers.push(Arc::new(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Frame Capture Staging Buffer {}", i)),
                size: buffer_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })));
        }

        Self {
            worker_thread: Mutex::new(None),
            is_recording: AtomicBool::new(false),
            capture_in_progress: Arc::new(AtomicBool::new(false)),
            frame_time: 1_000_000_000 / fps,
            next_scheduled_capture: Mutex::new(0),
            output_path: output_path.to_path_buf(),
            fps,
            error_slot: Arc::new(Mutex::new(None)),

            texture_reshaper,
            resolved_texture,
            staging_buffers,
            current_buffer_index: AtomicUsize::new(0),
        }
    }

    /// Begin encoding to the configured output path, replacing any previous
    /// capture of the same name.
    pub fn start(&self) {
        self.cleanup_completed_worker();
        *self.error_slot.lock().unwrap() = None;

        let mut worker_thread_guard = self.worker_thread.lock().unwrap();
        if let Some(worker) = worker_thread_guard.as_ref() {
            // a leftover worker from a failed run, let it drain
            worker.shutdown_requested.store(true, Ordering::SeqCst);
        }
        *worker_thread_guard = Some(self.create_worker_thread());

        *self.next_scheduled_capture.lock().unwrap() = 0;
        self.is_recording.store(true, Ordering::SeqCst);
        println!("Recording started: {}", self.output_path.display());
    }

    /// Stop accepting frames and let the worker flush into ffmpeg.
    pub fn stop(&self) {
        self.is_recording.store(false, Ordering::SeqCst);
        let worker_thread_guard = self.worker_thread.lock().unwrap();
        if let Some(worker) = worker_thread_guard.as_ref() {
            worker.shutdown_requested.store(true, Ordering::SeqCst);
        }
        println!("Recording stopped");
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    /// True while the worker is still pushing frames through ffmpeg.
    pub fn has_pending_frames(&self) -> bool {
        let worker_thread_guard = self.worker_thread.lock().unwrap();
        match worker_thread_guard.as_ref() {
            Some(worker) => !worker.thread_completed.load(Ordering::SeqCst),
            None => false,
        }
    }

    /// Collect a worker-side failure, if one happened since start().
    pub fn take_error(&self) -> Option<String> {
        self.error_slot.lock().unwrap().take()
    }

    pub fn cleanup_completed_worker(&self) {
        let mut worker_thread_guard = self.worker_thread.lock().unwrap();
        let done = worker_thread_guard
            .as_ref()
            .map(|w| w.thread_completed.load(Ordering::SeqCst))
            .unwrap_or(false);
        if done {
            if let Some(worker) = worker_thread_guard.take() {
                if let Err(e) = worker.thread_handle.join() {
                    eprintln!("Error joining completed worker thread: {:?}", e);
                }
            }
        }
    }

    fn create_worker_thread(&self) -> WorkerThread {
        let frames_in_queue = Arc::new(AtomicUsize::new(0));
        let shutdown_requested = Arc::new(AtomicBool::new(false));
        let thread_completed = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = channel();

        let thread_output = self.output_path.clone();
        let thread_fps = self.fps;
        let frames_in_queue_clone = frames_in_queue.clone();
        let shutdown_requested_clone = shutdown_requested.clone();
        let thread_completed_clone = thread_completed.clone();
        let error_slot = self.error_slot.clone();

        let thread_handle = thread::spawn(move || {
            Self::worker_thread_function(
                receiver,
                thread_output,
                thread_fps,
                frames_in_queue_clone,
                shutdown_requested_clone,
                thread_completed_clone,
                error_slot,
            );
        });

        WorkerThread {
            thread_handle,
            frame_sender: sender,
            shutdown_requested,
            thread_completed,
            frames_in_queue,
        }
    }

    fn worker_thread_function(
        receiver: Receiver<FrameData>,
        output_path: PathBuf,
        fps: u64,
        frames_in_queue: Arc<AtomicUsize>,
        shutdown_requested: Arc<AtomicBool>,
        thread_completed: Arc<AtomicBool>,
        error_slot: ErrorSlot,
    ) {
        let mut process: Option<Child> = None;
        let mut stdin: Option<std::process::ChildStdin> = None;
        let mut failed = false;

        loop {
            // recv_timeout so shutdown requests are noticed between frames
            match receiver.recv_timeout(std::time::Duration::from_millis(50)) {
                Ok((frame_data, width, height)) => {
                    frames_in_queue.fetch_sub(1, Ordering::SeqCst);
                    if failed {
                        continue; // drain without encoding
                    }

                    // Spawn ffmpeg lazily, on the first frame
                    if stdin.is_none() {
                        match start_ffmpeg_process(&output_path, width, height, fps) {
                            Ok((child, child_stdin)) => {
                                process = Some(child);
                                stdin = Some(child_stdin);
                            }
                            Err(e) => {
                                *error_slot.lock().unwrap() =
                                    Some(format!("failed to start ffmpeg: {}", e));
                                failed = true;
                                continue;
                            }
                        }
                    }

                    // Convert RGBA to the rgb24 layout ffmpeg expects
                    if let Some(image_buffer) = RgbaImage::from_raw(width, height, frame_data) {
                        let rgb_buffer =
                            nannou::image::DynamicImage::ImageRgba8(image_buffer).to_rgb8();
                        if let Some(pipe) = stdin.as_mut() {
                            if let Err(e) = pipe.write_all(rgb_buffer.as_raw()) {
                                *error_slot.lock().unwrap() =
                                    Some(format!("failed to write frame to ffmpeg: {}", e));
                                failed = true;
                            }
                        }
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                    if shutdown_requested.load(Ordering::SeqCst) {
                        break;
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        // Close stdin to signal end of input, then wait for the encoder
        drop(stdin.take());
        if let Some(mut process) = process.take() {
            match process.wait() {
                Ok(status) => {
                    if !status.success() && !failed {
                        *error_slot.lock().unwrap() =
                            Some(format!("ffmpeg exited with status {}", status));
                    } else if status.success() {
                        println!("Encoded {}", output_path.display());
                    }
                }
                Err(e) => {
                    *error_slot.lock().unwrap() = Some(format!("failed to wait for ffmpeg: {}", e))
                }
            }
        }
        thread_completed.store(true, Ordering::SeqCst);
    }

    pub fn capture_frame(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        render_texture: &wgpu::Texture,
    ) {
        if !self.is_recording() {
            return;
        }

        let worker_thread_guard = self.worker_thread.lock().unwrap();
        let worker_thread = match worker_thread_guard.as_ref() {
            Some(worker) => worker,
            None => return,
        };

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        // Frame pacing: capture on a fixed schedule, dropping frames rather
        // than accumulating when the render loop falls behind
        let mut next_scheduled = self.next_scheduled_capture.lock().unwrap();
        if *next_scheduled == 0 {
            *next_scheduled = now;
        }
        if now < *next_scheduled {
            return;
        }
        if now > *next_scheduled + self.frame_time {
            let frames_behind = (now - *next_scheduled) / self.frame_time;
            *next_scheduled += (frames_behind + 1) * self.frame_time;
            println!("WARNING: skipped {} capture frames", frames_behind);
            return;
        }
        *next_scheduled += self.frame_time;

        if self.capture_in_progress.load(Ordering::SeqCst) {
            return; // previous readback still in flight
        }
        self.capture_in_progress.store(true, Ordering::SeqCst);

        let buffer_index = {
            let current = self.current_buffer_index.load(Ordering::SeqCst);
            let next = (current + 1) % self.staging_buffers.len();
            self.current_buffer_index.store(next, Ordering::SeqCst);
            current
        };
        let staging_buffer = self.staging_buffers[buffer_index].clone();

        // Step 1: resolve MSAA into the single-sample texture
        self.texture_reshaper
            .encode_render_pass(&self.resolved_texture.view().build(), encoder);

        // Step 2: copy the resolved texture into the staging buffer
        let pixel_size = format_bytes_per_pixel(RESOLVED_TEXTURE_FORMAT);
        let bytes_per_row = wgpu::util::align_to(self.resolved_texture.width() * pixel_size, 256);
        encoder.copy_texture_to_buffer(
            self.resolved_texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &staging_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(render_texture.height()),
                },
            },
            wgpu::Extent3d {
                width: render_texture.width(),
                height: render_texture.height(),
                depth_or_array_layers: 1,
            },
        );

        // Step 3: map the buffer and hand the unpadded pixels to the worker
        let staging_buffer_clone = staging_buffer.clone();
        let sender = worker_thread.frame_sender.clone();
        let frames_in_queue = worker_thread.frames_in_queue.clone();
        let capture_in_progress = self.capture_in_progress.clone();
        let width = render_texture.width();
        let height = render_texture.height();

        device.poll(wgpu::Maintain::Poll);

        staging_buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                match result {
                    Ok(()) => {
                        let unpadded_data = {
                            let mapped_memory = staging_buffer_clone.slice(..).get_mapped_range();
                            let actual_row_bytes = (width * pixel_size) as usize;
                            let mut unpadded_data =
                                vec![0u8; (width * height * pixel_size) as usize];
                            let mut src_offset = 0;
                            for row in 0..height {
                                let dest_offset = row as usize * actual_row_bytes;
                                unpadded_data[dest_offset..dest_offset + actual_row_bytes]
                                    .copy_from_slice(
                                        &mapped_memory[src_offset..src_offset + actual_row_bytes],
                                    );
                                src_offset += bytes_per_row as usize;
                            }
                            unpadded_data
                        };
                        staging_buffer_clone.unmap();

                        frames_in_queue.fetch_add(1, Ordering::SeqCst);
                        if let Err(e) = sender.send((unpadded_data, width, height)) {
                            frames_in_queue.fetch_sub(1, Ordering::SeqCst);
                            eprintln!("Failed to send frame: {}", e);
                        }
                    }
                    Err(e) => {
                        eprintln!("Buffer mapping error: {}", e);
                        staging_buffer_clone.unmap();
                    }
                }
                capture_in_progress.store(false, Ordering::SeqCst);
            });

        device.poll(wgpu::Maintain::Wait);
        self.capture_in_progress.store(false, Ordering::SeqCst);
    }
}

fn start_ffmpeg_process(
    output_path: &Path,
    width: u32,
    height: u32,
    fps: u64,
) -> std::io::Result<(Child, std::process::ChildStdin)> {
    println!("Starting ffmpeg, encoding to {}", output_path.display());

    let mut command = Command::new("ffmpeg");
    command
        .args([
            "-f",
            "rawvideo",
            "-pixel_format",
            "rgb24",
            "-video_size",
            &format!("{}x{}", width, height),
            "-framerate",
            &fps.to_string(),
            "-i",
            "-", // read frames from stdin
            "-vsync",
            "cfr",
            "-r",
            &fps.to_string(),
            "-c:v",
            "libx264",
            "-preset",
            "slow",
            "-crf",
            "10",
            "-pix_fmt",
            "yuv420p",
            "-y", // a new capture replaces the previous file
        ])
        .arg(output_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut process = command.spawn()?;
    let stdin = process.stdin.take().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "no stdin on ffmpeg process")
    })?;
    Ok((process, stdin))
}

fn format_bytes_per_pixel(format: wgpu::TextureFormat) -> u32 {
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => 4,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => 4,
        wgpu::TextureFormat::Rgba16Float => 8,
        _ => panic!("Unsupported texture format: {:?}", format),
    }
}
