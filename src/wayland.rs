use anyhow::{Context, Result};
use calloop::generic::Generic;
use calloop::{EventLoop, Interest, LoopHandle, Mode, PostAction};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_layer, delegate_output, delegate_pointer, delegate_registry,
    delegate_seat, delegate_shm,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    seat::pointer::{PointerEvent, PointerEventKind, PointerHandler},
    seat::{Capability as SeatCapability, SeatHandler, SeatState},
    shell::wlr_layer::{
        Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
        LayerSurfaceConfigure,
    },
    shell::WaylandSurface,
    shm::{slot::SlotPool, Shm, ShmHandler},
};
use wayland_client::{
    backend::WaylandError,
    globals::registry_queue_init,
    protocol::{wl_output, wl_pointer, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};

use std::os::fd::AsFd;
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::canvas::{Canvas, FontState};
use crate::config::WorldClockConfig;
use crate::ipc::{self, CardInfo, IpcCommand, IpcResponse, StateReport};
use crate::layout::Layout;
use crate::renderer::{self, FrameState};
use crate::view::{ViewController, ViewOption, ViewSelection};
use crate::zones::ZoneRegistry;

pub struct WorldClock {
    registry_state: RegistryState,
    seat_state: SeatState,
    output_state: OutputState,
    _compositor_state: CompositorState,
    shm: Shm,
    pool: SlotPool,

    layer_surface: LayerSurface,
    width: u32,
    height: u32,
    configured: bool,
    needs_redraw: bool,

    config: WorldClockConfig,
    config_path: PathBuf,
    compact: bool,
    font: FontState,
    subtitle: String,

    controller: ViewController,
    options: Vec<ViewOption>,
    layout: Layout,
    loop_handle: LoopHandle<'static, WorldClock>,

    pointer: Option<wl_pointer::WlPointer>,

    // IPC
    ipc_listener: UnixListener,
    ipc_socket_path: PathBuf,

    wayland_readable: bool,
    should_quit: bool,
}

pub fn run(
    config: WorldClockConfig,
    registry: ZoneRegistry,
    config_path: PathBuf,
    socket_override: Option<PathBuf>,
) -> Result<()> {
    let conn = Connection::connect_to_env().context(
        "Failed to connect to Wayland. Ensure a Wayland compositor with wlr-layer-shell support is running."
    )?;

    let (globals, mut event_queue) = registry_queue_init(&conn)
        .context("Failed to initialize Wayland registry")?;
    let qh = event_queue.handle();

    let compositor = CompositorState::bind(&globals, &qh)
        .context("wl_compositor not available")?;
    let layer_shell = LayerShell::bind(&globals, &qh)
        .context("wlr-layer-shell not available. Your compositor must support the wlr_layer_shell_v1 protocol.")?;
    let shm = Shm::bind(&globals, &qh)
        .context("wl_shm not available")?;

    let surface = compositor.create_surface(&qh);
    let layer = parse_layer(&config.window.layer);
    let layer_surface = layer_shell.create_layer_surface(&qh, surface, layer, Some("worldclock"), None);

    let font = FontState::new(&config.clock.font)?;

    let mut event_loop: EventLoop<'static, WorldClock> =
        EventLoop::try_new().context("Failed to create event loop")?;
    let loop_handle = event_loop.handle();

    let controller = ViewController::new(
        registry,
        config.view.clone(),
        config.clock.refresh_period(),
        &loop_handle,
    )?;
    let options = controller.view_options();
    let subtitle = config.subtitle(controller.registry());

    // Compute initial size from content
    let compact = config.window.compact;
    let layout = Layout::compute(config.clock.font_size, compact, &options, controller.active_zones().len());

    layer_surface.set_size(layout.width, layout.height);
    layer_surface.set_anchor(parse_anchor(&config.window.anchor));
    layer_surface.set_margin(
        config.window.margin_top,
        config.window.margin_right,
        config.window.margin_bottom,
        config.window.margin_left,
    );
    layer_surface.set_exclusive_zone(0);
    layer_surface.set_keyboard_interactivity(KeyboardInteractivity::None);
    layer_surface.commit();

    let pool = SlotPool::new(
        (layout.width * layout.height * 4) as usize,
        &shm,
    ).context("Failed to create SHM pool")?;

    // IPC setup
    let ipc_socket_path = ipc::socket_path(socket_override.as_ref());
    let ipc_listener = ipc::create_listener(&ipc_socket_path)?;

    // Wake the loop for Wayland events and IPC connections
    let wayland_fd = conn.backend().poll_fd().try_clone_to_owned()
        .context("Failed to duplicate Wayland fd")?;
    loop_handle
        .insert_source(Generic::new(wayland_fd, Interest::READ, Mode::Level), |_, _, app: &mut WorldClock| {
            app.wayland_readable = true;
            Ok(PostAction::Continue)
        })
        .map_err(|e| anyhow::anyhow!("Failed to watch Wayland fd: {}", e.error))?;

    let ipc_fd = ipc_listener.as_fd().try_clone_to_owned()
        .context("Failed to duplicate IPC socket fd")?;
    loop_handle
        .insert_source(Generic::new(ipc_fd, Interest::READ, Mode::Level), |_, _, app: &mut WorldClock| {
            app.poll_ipc();
            Ok(PostAction::Continue)
        })
        .map_err(|e| anyhow::anyhow!("Failed to watch IPC socket: {}", e.error))?;

    let mut app = WorldClock {
        registry_state: RegistryState::new(&globals),
        seat_state: SeatState::new(&globals, &qh),
        output_state: OutputState::new(&globals, &qh),
        _compositor_state: compositor,
        shm,
        pool,
        layer_surface,
        width: layout.width,
        height: layout.height,
        configured: false,
        needs_redraw: true,
        config,
        config_path,
        compact,
        font,
        subtitle,
        controller,
        options,
        layout,
        loop_handle,
        pointer: None,
        ipc_listener,
        ipc_socket_path,
        wayland_readable: false,
        should_quit: false,
    };

    event_queue.roundtrip(&mut app)?;

    // Signal handling
    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        }).context("Failed to set signal handler")?;
    }

    // Main event loop: presenter timers, Wayland and IPC all wake the same loop
    loop {
        if app.should_quit || !running.load(Ordering::SeqCst) {
            break;
        }

        event_queue.flush()?;
        event_loop
            .dispatch(Some(Duration::from_millis(500)), &mut app)
            .context("Event loop dispatch failed")?;

        if std::mem::take(&mut app.wayland_readable) {
            if let Some(guard) = event_queue.prepare_read() {
                match guard.read() {
                    Ok(_) => {}
                    Err(WaylandError::Io(e)) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                    Err(e) => return Err(e).context("Failed to read Wayland events"),
                }
            }
        }
        event_queue.dispatch_pending(&mut app)?;

        if app.controller.take_dirty() {
            app.needs_redraw = true;
        }

        if app.configured && app.needs_redraw {
            app.draw(&qh)?;
            app.needs_redraw = false;
        }
    }

    // Cleanup
    ipc::cleanup_socket(&app.ipc_socket_path);

    Ok(())
}

fn parse_layer(layer: &str) -> Layer {
    match layer {
        "background" => Layer::Background,
        "bottom" => Layer::Bottom,
        "top" => Layer::Top,
        "overlay" => Layer::Overlay,
        _ => Layer::Top,
    }
}

fn parse_anchor(anchor: &str) -> Anchor {
    let mut parsed = Anchor::empty();
    for part in anchor.split_whitespace() {
        match part.to_lowercase().as_str() {
            "top" => parsed |= Anchor::TOP,
            "bottom" => parsed |= Anchor::BOTTOM,
            "left" => parsed |= Anchor::LEFT,
            "right" => parsed |= Anchor::RIGHT,
            other => log::warn!("Ignoring unknown anchor edge '{}'", other),
        }
    }
    parsed
}

impl WorldClock {
    /// Recompute the layout and resize the surface if the content changed size.
    fn update_layout(&mut self) {
        let layout = Layout::compute(
            self.config.clock.font_size,
            self.compact,
            &self.options,
            self.controller.active_zones().len(),
        );
        if layout.width != self.layout.width || layout.height != self.layout.height {
            self.width = layout.width;
            self.height = layout.height;
            self.layer_surface.set_size(self.width, self.height);
            self.layer_surface.wl_surface().commit();
        }
        self.layout = layout;
        self.needs_redraw = true;
    }

    fn select_view(&mut self, selection: ViewSelection) -> Result<()> {
        let handle = self.loop_handle.clone();
        if self.controller.select(selection, &handle)? {
            self.update_layout();
        }
        Ok(())
    }

    fn draw(&mut self, qh: &QueueHandle<Self>) -> Result<()> {
        let width = self.width;
        let height = self.height;

        if width == 0 || height == 0 { return Ok(()); }

        let stride = width as i32 * 4;
        let buf_size = (stride * height as i32) as usize;

        // Ensure pool is big enough
        if self.pool.len() < buf_size {
            self.pool.resize(buf_size).context("Failed to resize SHM pool")?;
        }

        let (buffer, canvas_data) = self.pool
            .create_buffer(width as i32, height as i32, stride, wl_shm::Format::Argb8888)
            .context("Failed to create buffer")?;

        let mut canvas = Canvas::new(width, height)?;
        let state = FrameState {
            config: &self.config,
            layout: &self.layout,
            subtitle: &self.subtitle,
            options: &self.options,
            selection: self.controller.selection(),
            cards: self.controller.presenters().iter().map(|p| (p.zone(), p.card())).collect(),
        };
        renderer::render(&mut canvas, &state, &self.font);

        // Copy pixels with RGBA->BGRA swizzle
        let pixels = canvas.pixels_argb8888();
        canvas_data[..pixels.len()].copy_from_slice(&pixels);

        // Attach and commit
        let surface = self.layer_surface.wl_surface();
        buffer.attach_to(surface).context("Failed to attach buffer")?;
        surface.damage_buffer(0, 0, width as i32, height as i32);
        surface.frame(qh, surface.clone());
        surface.commit();
        Ok(())
    }

    fn poll_ipc(&mut self) {
        loop {
            match self.ipc_listener.accept() {
                Ok((stream, _)) => {
                    self.handle_ipc_connection(stream);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("IPC accept error: {}", e);
                    break;
                }
            }
        }
    }

    fn handle_ipc_connection(&mut self, stream: std::os::unix::net::UnixStream) {
        if let Err(e) = ipc::set_client_timeouts(&stream) {
            log::warn!("IPC socket setup error: {}", e);
            return;
        }
        let cmd = match ipc::read_command(&stream) {
            Ok(cmd) => cmd,
            Err(e) => {
                log::warn!("IPC read error: {}", e);
                return;
            }
        };

        let response = self.handle_command(cmd);
        let mut stream = stream;
        if let Err(e) = ipc::write_response(&mut stream, &response) {
            log::warn!("IPC write error: {}", e);
        }
    }

    fn handle_command(&mut self, cmd: IpcCommand) -> IpcResponse {
        match cmd {
            IpcCommand::SetView { view } => {
                let selection = match self.controller.registry().parse_selection(&view) {
                    Ok(selection) => selection,
                    Err(e) => return IpcResponse::err(e.to_string()),
                };
                match self.select_view(selection) {
                    Ok(()) => IpcResponse::ok(),
                    Err(e) => IpcResponse::err(format!("{:#}", e)),
                }
            }
            IpcCommand::SetCompact { compact } => {
                self.compact = compact;
                self.update_layout();
                IpcResponse::ok()
            }
            IpcCommand::ToggleCompact => {
                self.compact = !self.compact;
                self.update_layout();
                IpcResponse::ok()
            }
            IpcCommand::GetState => {
                let cards = self
                    .controller
                    .presenters()
                    .iter()
                    .map(|p| CardInfo::new(p.zone(), &p.card()))
                    .collect();
                IpcResponse::state(StateReport {
                    view: self.controller.selection().to_string(),
                    compact: self.compact,
                    width: self.width,
                    height: self.height,
                    config_path: self.config_path.to_string_lossy().into_owned(),
                    zones: self.controller.registry().ids(),
                    cards,
                })
            }
            IpcCommand::Quit => {
                self.should_quit = true;
                IpcResponse::ok()
            }
        }
    }
}

// SCTK handler implementations

impl CompositorHandler for WorldClock {
    fn scale_factor_changed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _new_factor: i32) {
        self.needs_redraw = true;
    }

    fn transform_changed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _new_transform: wl_output::Transform) {
        self.needs_redraw = true;
    }

    fn frame(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _time: u32) {}

    fn surface_enter(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, output: &wl_output::WlOutput) {
        if let Some(info) = self.output_state.info(output) {
            log::info!("Surface entered output: {:?}", info.name);
        }
    }

    fn surface_leave(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _output: &wl_output::WlOutput) {}
}

impl LayerShellHandler for WorldClock {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.should_quit = true;
    }

    fn configure(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface, configure: LayerSurfaceConfigure, _serial: u32) {
        if configure.new_size.0 > 0 {
            self.width = configure.new_size.0;
        }
        if configure.new_size.1 > 0 {
            self.height = configure.new_size.1;
        }
        self.configured = true;
        self.needs_redraw = true;
    }
}

impl OutputHandler for WorldClock {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn update_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn output_destroyed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
}

impl SeatHandler for WorldClock {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {}

    fn new_capability(&mut self, _conn: &Connection, qh: &QueueHandle<Self>, seat: wl_seat::WlSeat, capability: SeatCapability) {
        if capability == SeatCapability::Pointer && self.pointer.is_none() {
            match self.seat_state.get_pointer(qh, &seat) {
                Ok(pointer) => self.pointer = Some(pointer),
                Err(e) => log::warn!("Failed to get pointer: {}", e),
            }
        }
    }

    fn remove_capability(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat, capability: SeatCapability) {
        if capability == SeatCapability::Pointer {
            if let Some(pointer) = self.pointer.take() {
                pointer.release();
            }
        }
    }

    fn remove_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {}
}

impl ShmHandler for WorldClock {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for WorldClock {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState, SeatState];
}

const BTN_LEFT: u32 = 0x110;

impl PointerHandler for WorldClock {
    fn pointer_frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _pointer: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        for event in events {
            if let PointerEventKind::Press { button, .. } = event.kind {
                if button != BTN_LEFT {
                    continue;
                }
                let (x, y) = event.position;
                let Some(selection) = self.layout.hit_test(x as f32, y as f32).cloned() else {
                    continue;
                };
                if let Err(e) = self.select_view(selection) {
                    log::warn!("View switch failed: {:#}", e);
                }
            }
        }
    }
}

delegate_compositor!(WorldClock);
delegate_layer!(WorldClock);
delegate_output!(WorldClock);
delegate_pointer!(WorldClock);
delegate_registry!(WorldClock);
delegate_seat!(WorldClock);
delegate_shm!(WorldClock);
