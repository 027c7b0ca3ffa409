use std::{path::Path, time::Instant};

use chip8::{constants::DEFAULT_SAMPLE_RATE, prelude::*};
use glow::HasContext;
use log::info;
use winit::{
    event::{Event as EV, WindowEvent as WE},
    event_loop::EventLoopBuilder,
    platform::run_return::EventLoopExtRunReturn,
};

use crate::{
    actions::*, audio::AudioOutput, error::AppError, render::Render, window::WindowContext,
    EventLoop, InputMap,
};

/// Chip8 Application
pub struct Chip8App {
    window: WindowContext,
    render: Render,
    vm: Chip8Vm,
    input_map: InputMap,
    /// Segments produced by the sound timer, consumed by the audio device.
    queue: SegmentQueue,
    /// Interpreter keeps running without sound when there is no audio device.
    audio: Option<AudioOutput>,
}

impl Chip8App {
    pub fn new(event_loop: &EventLoop, input_map: InputMap, conf: Chip8Conf) -> Result<Self, AppError> {
        let window = WindowContext::new(event_loop, "chip8")?;

        // Create renderer
        let mut render = Render::new(window.gl.clone())?;
        log::info!("Created OpenGL renderer:\n{}", render.opengl_info());

        let size = window.inner_size();
        render.set_viewport(size.width, size.height);

        info!("vm config: {conf:?}");
        let vm = Chip8Vm::new(conf);

        let queue = SegmentQueue::default();
        let audio = match AudioOutput::new(queue.clone()) {
            Ok(audio) => Some(audio),
            Err(err) => {
                log::warn!("continuing without sound, {err}");
                None
            }
        };

        Ok(Self {
            window,
            render,
            vm,
            input_map,
            queue,
            audio,
        })
    }

    pub fn create_event_loop() -> EventLoop {
        EventLoopBuilder::new().build()
    }

    /// Load ROM file into VM
    pub fn load_rom(&mut self, filepath: impl AsRef<Path>) -> Result<(), AppError> {
        let filepath = filepath.as_ref();
        info!("load rom: {}", filepath.display());

        self.vm.load_rom(filepath)?;

        if let Some(name) = filepath.file_name() {
            self.window
                .window
                .set_title(&format!("chip8 - {}", name.to_string_lossy()));
        }

        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.audio
            .as_ref()
            .map(AudioOutput::sample_rate)
            .unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Run one 60Hz frame of the interpreter.
    fn update(&mut self, clock: &FrameClock) -> Result<(), AppError> {
        // Merge input stream into VM, in the order it arrived.
        for (keycode, pressed) in self.input_map.drain_chip8() {
            self.vm.set_key(keycode, pressed);
        }

        let report = self.vm.run_frame(clock.elapsed())?;

        if report.ticked() {
            if self.audio.is_some() {
                self.queue.push_tick(self.sample_rate(), report.timers);
            }

            // Queue a RedrawRequested event.
            self.window.request_redraw();
        }

        Ok(())
    }
}

/// Event Loop.
impl Chip8App {
    pub fn run(&mut self, event_loop: &mut EventLoop) -> Result<(), AppError> {
        let main_window_id = self.window.window_id();
        // Interpreter time starts with the loop.
        let mut clock = FrameClock::new();
        let mut next_frame = Instant::now();
        let mut result = Ok(());

        event_loop.run_return(|event, _, control_flow| {
            match event {
                EV::MainEventsCleared => {
                    // Frame Update

                    if self.input_map.is_action_pressed(EXIT) {
                        log::info!("Exit");
                        control_flow.set_exit();
                        return;
                    }

                    if Instant::now() >= next_frame {
                        if let Err(err) = self.update(&clock) {
                            result = Err(err);
                            control_flow.set_exit();
                            return;
                        }

                        let s = self.vm.dump_keys().unwrap_or_default();
                        if !s.is_empty() {
                            log::trace!("{s}");
                        }

                        next_frame = clock.next_frame();
                    }

                    self.input_map.clear_state();
                    control_flow.set_wait_until(next_frame);
                }
                EV::RedrawRequested(window_id) if window_id == main_window_id => {
                    // Redraw the application.
                    if self.window.make_context_current().is_ok() {
                        self.render.draw_display(self.vm.display());

                        if let Err(err) = self.window.swap_buffers() {
                            log::error!("swap buffers: {err}");
                        }
                    }
                }
                EV::WindowEvent { window_id, event } if window_id == main_window_id => {
                    match event {
                        WE::Resized(size) => {
                            // Some platforms like EGL require resizing GL surface to update the size.
                            self.window.resize_surface(size);
                            self.render.set_viewport(size.width, size.height);
                            self.window.request_redraw();
                        }
                        WE::KeyboardInput { input, .. } => {
                            if let Some(virtual_keycode) = input.virtual_keycode {
                                self.input_map.push_key(virtual_keycode, input.state);
                            }
                        }
                        WE::Focused(false) => {
                            // Key releases are not delivered to an unfocused window.
                            self.vm.clear_keys();
                        }
                        WE::CloseRequested => {
                            control_flow.set_exit();
                        }
                        _ => { /* blank */ }
                    }
                }
                EV::LoopDestroyed => unsafe {
                    self.window.gl.finish();
                },
                _ => { /* blank */ }
            }
        });

        if self.queue.dropped_samples() > 0 {
            log::debug!("audio samples dropped: {}", self.queue.dropped_samples());
        }

        result
    }
}
