//! eframe/egui frontend for the `run` subcommand. Steps one frame of
//! emulation per paint, maps WASD/arrow keys to the joypad, and throttles to
//! `DISPLAY_REFRESH_RATE` with `spin_sleep` the way the driver loop would on
//! bare hardware.

use crate::gb::display::colorize;
use crate::gb::joypad::JoypadInput;
use crate::gb::{Emulator, DISPLAY_REFRESH_RATE, SCREEN_HEIGHT, SCREEN_WIDTH};
use eframe::egui;
use egui::{
    CentralPanel, Color32, ColorImage, Context, Key, Label, RichText, TextureHandle,
    TextureOptions, TopBottomPanel, Ui, Vec2, Widget,
};
use std::time::{Duration, Instant};

pub struct EmulatorApp {
    emulator: Emulator,
    texture: Option<TextureHandle>,
    scale: usize,
    last_frame: Instant,
    /// Set once `run_frame` returns an illegal-opcode fault; stepping stops
    /// but the last frame stays on screen.
    halted: Option<String>,
}

impl EmulatorApp {
    pub fn new(emulator: Emulator, scale: usize) -> Self {
        Self {
            emulator,
            texture: None,
            scale,
            last_frame: Instant::now(),
            halted: None,
        }
    }

    fn poll_input(ctx: &Context) -> JoypadInput {
        ctx.input(|i| JoypadInput {
            a: i.key_down(Key::X),
            b: i.key_down(Key::Z),
            start: i.key_down(Key::Enter),
            select: i.key_down(Key::Backspace),
            up: i.key_down(Key::ArrowUp),
            down: i.key_down(Key::ArrowDown),
            left: i.key_down(Key::ArrowLeft),
            right: i.key_down(Key::ArrowRight),
        })
    }

    fn draw_top_panel(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if ui.button("Load ROM").clicked() {
                self.choose_cartridge();
            }
            ui.separator();
            match &self.halted {
                Some(err) => {
                    Label::new(RichText::new(format!("halted: {err}")).color(Color32::RED))
                        .selectable(false)
                        .ui(ui);
                }
                None => {
                    Label::new(RichText::new(format!("{}", self.emulator.bus.cartridge())))
                        .selectable(false)
                        .ui(ui);
                }
            }
        });
    }

    fn choose_cartridge(&mut self) {
        let dialog = rfd::FileDialog::new().add_filter("Game Boy ROM", &["gb"]);
        let Some(path) = dialog.pick_file() else {
            return;
        };
        match Emulator::from_path(&path) {
            Ok(emulator) => {
                self.emulator = emulator;
                self.halted = None;
            }
            Err(err) => log::error!("failed to load {}: {err}", path.display()),
        }
    }

    fn draw_frame(&mut self, ctx: &Context, ui: &mut Ui) {
        let pixels = colorize(self.emulator.framebuffer());
        let image = ColorImage::from_rgba_unmultiplied(
            [usize::from(SCREEN_WIDTH), usize::from(SCREEN_HEIGHT)],
            &pixels,
        );

        let texture = self.texture.get_or_insert_with(|| {
            ctx.load_texture("framebuffer", image.clone(), TextureOptions::NEAREST)
        });
        texture.set(image, TextureOptions::NEAREST);

        let size = Vec2::new(
            (usize::from(SCREEN_WIDTH) * self.scale) as f32,
            (usize::from(SCREEN_HEIGHT) * self.scale) as f32,
        );
        ui.image((texture.id(), size));
    }
}

impl eframe::App for EmulatorApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if self.halted.is_none() {
            self.emulator.set_joypad_input(Self::poll_input(ctx));
            if let Err(err) = self.emulator.run_frame() {
                log::error!("emulation halted: {err}");
                self.halted = Some(err.to_string());
            }
        }

        TopBottomPanel::top("top_panel").show(ctx, |ui| self.draw_top_panel(ui));
        CentralPanel::default().show(ctx, |ui| {
            self.draw_frame(ctx, ui);
        });

        let frame_time = Duration::from_secs_f64(1.0 / DISPLAY_REFRESH_RATE);
        let elapsed = self.last_frame.elapsed();
        if elapsed < frame_time {
            spin_sleep::sleep(frame_time - elapsed);
        }
        self.last_frame = Instant::now();
        ctx.request_repaint();
    }
}
