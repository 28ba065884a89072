use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::assets::{AssetError, AssetLoader};
use crate::geometry::Position;
use crate::{resolve_app_paths, StartupError};

use super::driver::TickDriver;
use super::game::{Game, GameCommand};
use super::input::{InputSnapshot, Key, KeyStates};
use super::metrics::LoopStats;
use super::rendering::Renderer;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run<G: Game>(game: G) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        "startup"
    );
    run_game(TickDriver::new(game, AssetLoader::new(app_paths.assets_dir)))
}

/// Setup runs before the window opens, so a missing asset fails fast. An asset
/// error raised by a reset stops the loop and is returned once it has exited.
pub fn run_game<G: Game>(mut driver: TickDriver<G>) -> Result<(), AppError> {
    if !driver.is_started() {
        driver.start()?;
    }
    let settings = driver.settings().clone();

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(settings.title.clone())
            .with_inner_size(LogicalSize::new(
                settings.width.max(1) as f64,
                settings.height.max(1) as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), settings.width, settings.height)
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = settings.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(settings.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = settings.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(settings.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut loop_stats = LoopStats::new(metrics_log_interval);
    let mut fatal: Option<AssetError> = None;

    event_loop
        .run(|event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    if let Err(error) = renderer.resize_to_window() {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => input_collector.release_all(),
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position(
                        renderer.window_pos_to_play_area(position.x as f32, position.y as f32),
                    );
                }
                WindowEvent::CursorLeft { .. } => input_collector.set_cursor_position(None),
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    accumulator =
                        accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    accumulator = step_plan.remaining_accumulator;

                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        let mut painter = renderer.frame_painter();
                        painter.clear(settings.background);
                        let tick_started = Instant::now();
                        match driver.tick(&input_snapshot, &mut painter) {
                            Ok(GameCommand::Quit) => {
                                info!(reason = "game_quit", "shutdown_requested");
                                window_target.exit();
                                break;
                            }
                            Ok(command) => loop_stats.record_tick(tick_started.elapsed(), command),
                            Err(asset_error) => {
                                error!(error = %asset_error, "game_reset_failed");
                                fatal = Some(asset_error);
                                window_target.exit();
                                break;
                            }
                        }
                    }

                    if step_plan.dropped_backlog > Duration::ZERO {
                        loop_stats.record_dropped(step_plan.dropped_backlog);
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    if let Err(error) = renderer.present() {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    loop_stats.record_frame(raw_frame_dt);

                    if let Some(snapshot) = loop_stats.take_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            tick_cost_ms = snapshot.tick_cost_ms,
                            dropped_backlog_ms = snapshot.dropped_backlog_ms,
                            resets = snapshot.resets,
                            ticks = driver.tick_count(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!(ticks = driver.tick_count(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)?;

    match fatal {
        Some(asset_error) => Err(AppError::Asset(asset_error)),
        None => Ok(()),
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    held: KeyStates,
    pressed_edges: KeyStates,
    left_mouse_is_down: bool,
    left_click_pressed_edge: bool,
    cursor_position: Option<Position>,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_key_state_from_physical_key(key_event.physical_key, is_pressed);
    }

    fn update_key_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let Some(key) = map_physical_key(key) else {
            return;
        };
        if is_pressed && !self.held.is_down(key) {
            self.pressed_edges.set(key, true);
        }
        self.held.set(key, is_pressed);
        if key == Key::Escape && is_pressed {
            self.mark_quit_requested();
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    self.left_click_pressed_edge = true;
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => self.left_mouse_is_down = false,
        }
    }

    fn set_cursor_position(&mut self, position: Option<Position>) {
        self.cursor_position = position;
    }

    fn release_all(&mut self) {
        self.held.clear();
        self.left_mouse_is_down = false;
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.held,
            self.pressed_edges,
            self.left_mouse_is_down,
            self.left_click_pressed_edge,
            self.cursor_position,
        );
        self.pressed_edges.clear();
        self.left_click_pressed_edge = false;
        snapshot
    }
}

fn map_physical_key(key: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let key = match code {
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::Space => Key::Space,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    };
    Some(key)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
