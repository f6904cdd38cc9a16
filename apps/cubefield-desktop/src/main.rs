use anyhow::{Context as _, Result};
use clap::Parser;
use cubefield_packer::PackConfig;
use cubefield_render::{CubeScene, RotationAnimator};
use cubefield_render_wgpu::{OrthoCamera, WgpuRenderer};
use cubefield_stream::{BatchIngest, IngestConfig, IngestStatus, PackingWorker};
use egui::Context as EguiContext;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "cubefield-desktop", about = "Cube field packing viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Number of cubes to place
    #[arg(short = 'n', long, default_value_t = cubefield_common::N)]
    count: usize,

    /// Smallest cube radius, also the minimum gap
    #[arg(long, default_value_t = cubefield_common::MIN_R)]
    min_radius: f32,

    /// Largest cube radius
    #[arg(long, default_value_t = cubefield_common::MAX_R)]
    max_radius: f32,

    /// Placements per streamed batch
    #[arg(long, default_value_t = cubefield_common::N_PER_CHUNK)]
    batch_size: usize,

    /// RNG seed for the packing and colors
    #[arg(long)]
    seed: Option<u64>,

    /// Consecutive rejected samples before giving up (0 = never)
    #[arg(long, default_value_t = cubefield_packer::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u64,

    /// Batches consumed per frame
    #[arg(long, default_value_t = 16)]
    batches_per_frame: usize,
}

impl Cli {
    fn pack_config(&self) -> PackConfig {
        PackConfig {
            target_count: self.count,
            min_radius: self.min_radius,
            max_radius: self.max_radius,
            batch_size: self.batch_size,
            max_attempts: (self.max_attempts > 0).then_some(self.max_attempts),
            seed: self.seed,
        }
    }
}

/// Application state.
struct AppState {
    worker: PackingWorker,
    ingest: BatchIngest,
    scene: CubeScene,
    animator: RotationAnimator,
    camera: OrthoCamera,
    started_at: Instant,
    show_hud: bool,
}

impl AppState {
    fn new(cli: &Cli) -> Result<Self> {
        let config = cli.pack_config();
        let capacity = config.target_count;
        let mut worker = PackingWorker::spawn(config).context("starting packing worker")?;
        worker.start()?;

        let (scene, animator) = match cli.seed {
            Some(seed) => (
                CubeScene::with_seed(capacity, seed),
                RotationAnimator::with_seed(seed),
            ),
            None => (CubeScene::new(capacity), RotationAnimator::new()),
        };

        Ok(Self {
            worker,
            ingest: BatchIngest::new(IngestConfig {
                batches_per_frame: cli.batches_per_frame,
            }),
            scene,
            animator,
            camera: OrthoCamera::default(),
            started_at: Instant::now(),
            show_hud: true,
        })
    }

    fn update(&mut self) {
        if self.ingest.is_running() {
            let placements = self.ingest.poll(&self.worker);
            if !placements.is_empty() {
                self.scene.ingest(&placements);
            }
            let stats = self.ingest.stats();
            self.scene.set_totals(stats.n, stats.tests_n);
        }

        let rotation = self.animator.update(self.started_at.elapsed());
        self.scene.set_rotation(rotation);
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed && key == KeyCode::F1 {
            self.show_hud = !self.show_hud;
        }
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        egui::Area::new(egui::Id::new("hud"))
            .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new(self.scene.status_text())
                        .monospace()
                        .color(egui::Color32::WHITE),
                );
                match self.ingest.status() {
                    IngestStatus::Running => {}
                    IngestStatus::Done => {
                        ui.small("done");
                    }
                    IngestStatus::Failed(e) => {
                        ui.colored_label(egui::Color32::LIGHT_RED, e.to_string());
                    }
                    IngestStatus::Lost => {
                        ui.colored_label(egui::Color32::LIGHT_RED, "packing worker lost");
                    }
                }
                if self.scene.dropped() > 0 {
                    ui.small(format!("{} cubes over capacity", self.scene.dropped()));
                }
            });
    }
}

/// Window, surface, and device; created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        egui_ctx: &EguiContext,
        capacity: usize,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Cube Field")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cubefield_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            capacity,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn draw_ui(
        &mut self,
        egui_ctx: &EguiContext,
        view: &wgpu::TextureView,
        state: &AppState,
    ) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| state.draw_ui(ctx));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    fn frame(&mut self, egui_ctx: &EguiContext, state: &AppState) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &state.camera,
            &state.scene,
        );
        self.draw_ui(egui_ctx, &view, state);

        output.present();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let capacity = self.state.scene.group(cubefield_render::SizeClass::Large).capacity();
        match Gpu::new(event_loop, &self.egui_ctx, capacity) {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                self.state.camera.resize(size.width, size.height);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size.width, new_size.height);
                self.state.camera.resize(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                self.state.update();
                gpu.frame(&self.egui_ctx, &self.state);
                gpu.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.state.worker.cancel();
        tracing::info!(
            placed = self.state.scene.instance_count(),
            tests_n = self.state.scene.tests_n(),
            "cubefield-desktop exiting"
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("cubefield-desktop starting");

    let state = AppState::new(&cli)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
