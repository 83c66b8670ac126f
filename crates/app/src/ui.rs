use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Sense, Stroke, Ui};
use std::time::{Duration, Instant};
use treeshift_core::palette::Rgb;
use treeshift_core::{Config, Rect};

use crate::state::AppState;

pub fn draw(app: &mut AppState, ctx: &egui::Context) {
    let now = Instant::now();
    let changed = app.poll_load(now) | app.tick(now);

    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        top_bar(ui, app);
    });

    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(Color32::WHITE))
        .show(ctx, |ui| {
            canvas(ui, app, now);
        });

    // Keep frames coming while cells move; otherwise wake for the next tick.
    if changed || app.is_animating(now) || app.load_rx.is_some() {
        ctx.request_repaint();
    } else if let Some(playback) = app.playback.as_ref().filter(|p| p.is_running()) {
        ctx.request_repaint_after(playback.config().tick_interval());
    } else {
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

fn top_bar(ui: &mut Ui, app: &mut AppState) {
    ui.horizontal(|ui| {
        if ui.button("Open Data…").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("data", &["json", "js"])
                .pick_file()
            {
                app.start_load(path);
            }
        }
        if ui.button("Open Config…").clicked() {
            if let Some(path) = rfd::FileDialog::new().add_filter("config", &["json"]).pick_file() {
                app.config_path = Some(path);
                if let Some(data) = app.source.clone() {
                    app.start_load(data);
                }
            }
        }
        ui.separator();
        let playing = app.playback.as_ref().map_or(false, |p| p.is_running());
        let toggle = ui.add_enabled(
            app.playback.is_some(),
            egui::Button::new(if playing { "Pause" } else { "Start" }),
        );
        if toggle.clicked() {
            app.toggle_playing(Instant::now());
        }
        if ui
            .add_enabled(app.playback.is_some(), egui::Button::new("Restart"))
            .clicked()
        {
            app.restart(Instant::now());
        }
        if let Some(source) = &app.source {
            ui.separator();
            ui.label(source.display().to_string());
        }
        if let Some(status) = &app.status {
            ui.separator();
            ui.colored_label(Color32::from_rgb(200, 60, 60), status);
        }
    });
}

fn canvas(ui: &mut Ui, app: &AppState, now: Instant) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
    let Some(playback) = &app.playback else {
        painter.text(
            response.rect.center(),
            Align2::CENTER_CENTER,
            "Open a data file to start",
            FontId::proportional(18.0),
            Color32::GRAY,
        );
        return;
    };
    let config = playback.config();
    let view = View::fit(response.rect, config);

    painter.text(
        view.point(config.canvas_width / 2.0, config.margin.top / 2.0),
        Align2::CENTER_CENTER,
        &app.label,
        FontId::proportional(28.0 * view.scale),
        Color32::from_gray(40),
    );

    for (group, rect) in app.visible_groups(now) {
        let screen = view.rect(rect);
        painter.rect_filled(screen, 0.0, color32(group.color));
        if config.draw_domain_labels {
            painter.with_clip_rect(screen).text(
                screen.left_top() + egui::vec2(4.0, 2.0),
                Align2::LEFT_TOP,
                &group.key,
                FontId::proportional(13.0 * view.scale.max(0.6)),
                Color32::WHITE,
            );
        }
    }

    for (sprite, rect) in app.visible(now) {
        let screen = view.rect(rect);
        if screen.width() <= 0.0 || screen.height() <= 0.0 {
            continue;
        }
        painter.rect_filled(screen, 0.0, lighten(color32(sprite.color)));
        if config.draw_border {
            painter.rect_stroke(screen, 0.0, Stroke::new(1.0, Color32::WHITE));
        }
        package_label(
            &painter.with_clip_rect(screen),
            screen,
            &sprite.identity.package,
            config.split_package_names,
            view.scale,
        );
    }
}

fn package_label(painter: &Painter, cell: egui::Rect, name: &str, split: bool, scale: f32) {
    let font = FontId::proportional(11.0 * scale.max(0.6));
    let line_height = font.size + 1.0;
    let lines: Vec<&str> = if split { name.split('-').collect() } else { vec![name] };
    for (i, line) in lines.iter().enumerate() {
        let pos = cell.left_top() + egui::vec2(3.0, 2.0 + i as f32 * line_height);
        if pos.y > cell.bottom() {
            break;
        }
        painter.text(pos, Align2::LEFT_TOP, *line, font.clone(), Color32::from_gray(20));
    }
}

/// Maps canvas coordinates onto the screen, keeping the aspect ratio.
struct View {
    origin: Pos2,
    scale: f32,
}

impl View {
    fn fit(area: egui::Rect, config: &Config) -> Self {
        let sx = area.width() / config.canvas_width as f32;
        let sy = area.height() / config.canvas_height as f32;
        let scale = sx.min(sy).max(0.01);
        let used = egui::vec2(
            config.canvas_width as f32 * scale,
            config.canvas_height as f32 * scale,
        );
        Self {
            origin: area.center() - used / 2.0,
            scale,
        }
    }

    fn point(&self, x: f64, y: f64) -> Pos2 {
        self.origin + egui::vec2(x as f32 * self.scale, y as f32 * self.scale)
    }

    fn rect(&self, r: Rect) -> egui::Rect {
        egui::Rect::from_min_max(self.point(r.x0, r.y0), self.point(r.x1, r.y1))
    }
}

fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}

fn lighten(c: Color32) -> Color32 {
    let mix = |v: u8| v + (255 - v) / 3;
    Color32::from_rgb(mix(c.r()), mix(c.g()), mix(c.b()))
}
