//! Native viewer window
//!
//! Thin eframe shell around [`Session`]: translates egui input into session
//! events, drains finished asset loads, runs one frame step and paints.

use eframe::egui::{self, Color32, Pos2, Rect, Sense};
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};
use tracing::{debug, info, trace};

use crate::assets::AssetEvent;
use crate::config::Config;
use crate::hud;
use crate::input::Key;
use crate::session::{Session, SessionEvent};

const HELP_MARGIN: f32 = 12.0;

/// Run the native viewer until the window closes
pub fn run_viewer(config: Config, assets: UnboundedReceiver<AssetEvent>) -> anyhow::Result<()> {
    let session = Session::new(&config)?;
    let [width, height] = config.render.window_size;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_title("Galaxy Flyer"),
        ..Default::default()
    };

    eframe::run_native(
        "Galaxy Flyer",
        options,
        Box::new(|cc| Ok(Box::new(FlyerApp::new(cc, session, assets)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))?;

    info!("Viewer closed");
    Ok(())
}

/// Keyboard layout of the viewer
pub fn map_key(key: egui::Key) -> Option<Key> {
    use egui::Key as K;
    let mapped = match key {
        K::W => Key::Forward,
        K::S => Key::Back,
        K::A => Key::Left,
        K::D => Key::Right,
        K::R => Key::Up,
        K::F => Key::Down,
        K::ArrowUp => Key::PitchUp,
        K::ArrowDown => Key::PitchDown,
        K::ArrowLeft => Key::YawLeft,
        K::ArrowRight => Key::YawRight,
        K::Q => Key::RollLeft,
        K::E => Key::RollRight,
        K::Plus | K::Equals => Key::ZoomIn,
        K::Minus => Key::ZoomOut,
        K::Num0 => Key::Digit(0),
        K::Num1 => Key::Digit(1),
        K::Num2 => Key::Digit(2),
        K::Num3 => Key::Digit(3),
        K::Num4 => Key::Digit(4),
        K::Num5 => Key::Digit(5),
        K::Num6 => Key::Digit(6),
        K::Num7 => Key::Digit(7),
        K::Num8 => Key::Digit(8),
        K::Num9 => Key::Digit(9),
        K::C => Key::ToggleColors,
        K::P => Key::TogglePanel,
        K::M => Key::ToggleMode,
        K::Home => Key::Home,
        _ => return None,
    };
    Some(mapped)
}

struct FlyerApp {
    session: Session,
    assets: Option<UnboundedReceiver<AssetEvent>>,
    viewport: Option<Rect>,
    pointer_down: bool,
    help_rect: Option<Rect>,
}

impl FlyerApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        session: Session,
        assets: UnboundedReceiver<AssetEvent>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        Self {
            session,
            assets: Some(assets),
            viewport: None,
            pointer_down: false,
            help_rect: None,
        }
    }

    fn drain_assets(&mut self) {
        let Some(rx) = self.assets.as_mut() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(event) => self.session.handle_asset(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("All asset loaders finished");
                    self.assets = None;
                    break;
                }
            }
        }
    }

    /// Translate this frame's egui input into session events
    fn collect_input(&mut self, ctx: &egui::Context, response: &egui::Response) {
        let mut events = Vec::new();

        ctx.input(|i| {
            for event in &i.events {
                match event {
                    egui::Event::Key { key, pressed, .. } => {
                        if let Some(k) = map_key(*key) {
                            events.push(if *pressed {
                                SessionEvent::KeyDown(k)
                            } else {
                                SessionEvent::KeyUp(k)
                            });
                        }
                    }
                    egui::Event::WindowFocused(false) => events.push(SessionEvent::FocusLost),
                    _ => {}
                }
            }

            let down = i.pointer.primary_down() && (response.hovered() || self.pointer_down);
            if down != self.pointer_down {
                self.pointer_down = down;
                events.push(if down {
                    SessionEvent::PointerDown
                } else {
                    SessionEvent::PointerUp
                });
            }
            if down {
                let delta = i.pointer.delta();
                if delta != egui::Vec2::ZERO {
                    events.push(SessionEvent::PointerDrag {
                        dx: delta.x as f64,
                        dy: delta.y as f64,
                    });
                }
            }

            if response.hovered() && i.raw_scroll_delta.y != 0.0 {
                events.push(SessionEvent::Scroll(i.raw_scroll_delta.y as f64));
            }
        });

        if response.clicked() {
            let on_help = response
                .interact_pointer_pos()
                .zip(self.help_rect)
                .is_some_and(|(pos, rect)| rect.contains(pos));
            if on_help {
                events.push(SessionEvent::Tap);
            }
        }

        for event in events {
            self.session.handle(event);
        }
    }
}

impl eframe::App for FlyerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_assets();

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
                let screen = response.rect;

                if self.viewport != Some(screen) {
                    self.viewport = Some(screen);
                    self.session.handle(SessionEvent::Resize {
                        width: screen.width(),
                        height: screen.height(),
                    });
                }

                self.collect_input(ctx, &response);
                let report = self.session.frame();
                if report.hud_refreshed {
                    trace!("HUD refreshed (ticked={})", report.ticked);
                }

                self.session.renderer().paint(
                    &painter,
                    screen,
                    self.session.camera(),
                    self.session.show_colors(),
                );

                hud::paint_instruments(&painter, screen, self.session.visibility(), self.session.hud());

                self.help_rect = if self.session.show_panel() {
                    let top_left = Pos2::new(screen.left() + HELP_MARGIN, screen.top() + HELP_MARGIN);
                    Some(hud::paint_help(&painter, top_left, &self.session.help_lines()))
                } else {
                    None
                };

                if self.session.is_loading() {
                    hud::paint_loading(&painter, screen);
                }
            });

        ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(map_key(egui::Key::W), Some(Key::Forward));
        assert_eq!(map_key(egui::Key::F), Some(Key::Down));
        assert_eq!(map_key(egui::Key::Num0), Some(Key::Digit(0)));
        assert_eq!(map_key(egui::Key::Num7), Some(Key::Digit(7)));
        assert_eq!(map_key(egui::Key::M), Some(Key::ToggleMode));
        assert_eq!(map_key(egui::Key::Equals), Some(Key::ZoomIn));
        assert_eq!(map_key(egui::Key::Z), None);
    }

    #[test]
    fn test_only_toggles_and_digits_are_not_motion() {
        for key in [egui::Key::C, egui::Key::P, egui::Key::M, egui::Key::Home, egui::Key::Num5] {
            assert!(!map_key(key).unwrap().is_motion());
        }
        for key in [egui::Key::W, egui::Key::Q, egui::Key::ArrowLeft, egui::Key::Minus] {
            assert!(map_key(key).unwrap().is_motion());
        }
    }
}
