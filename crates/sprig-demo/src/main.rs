use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use sprig_engine::config::StageConfig;
use sprig_engine::coords::{Rect, Vec2};
use sprig_engine::core::{App, AppControl, FrameCtx};
use sprig_engine::device::{GpuInit, WgpuBackend};
use sprig_engine::logging::{LoggingConfig, init_logging};
use sprig_engine::math::AffineMatrix;
use sprig_engine::paint::Color;
use sprig_engine::render::{DrawStyle, RenderContext, draw};
use sprig_engine::sprite::{AtlasFrame, SpriteDefinition, SpriteSheet};
use sprig_engine::texture::{LoadState, PendingTexture, TextureData, TextureLoader};
use sprig_engine::window::{Runtime, RuntimeConfig};

const VIEW_W: f32 = 320.0;
const VIEW_H: f32 = 180.0;

const FRAME: u32 = 16;
const FRAMES: u32 = 4;

struct Ball {
    pos: Vec2,
    vel: Vec2,
    tint: Color,
}

impl Ball {
    fn step(&mut self, radius: f32) {
        self.vel.y += 0.15;
        self.pos = self.pos + self.vel;

        if self.pos.x < radius || self.pos.x > VIEW_W - radius {
            self.vel.x = -self.vel.x;
            self.pos.x = self.pos.x.clamp(radius, VIEW_W - radius);
        }
        if self.pos.y > FLOOR_Y - radius {
            self.vel.y = -self.vel.y * 0.9;
            self.pos.y = FLOOR_Y - radius;
        }

        // Settled on the floor: bounce again.
        if self.pos.y >= FLOOR_Y - radius && self.vel.length() < 0.5 {
            self.vel.y = -5.0;
        }
    }
}

const FLOOR_Y: f32 = VIEW_H - 20.0;

/// Composite blend while paused.
const PAUSED_TINT: Color = Color::rgb(0.5, 0.5, 0.55);

struct Demo {
    atlas_path: Option<PathBuf>,
    sheet: Option<PathBuf>,
    atlas: Option<PendingTexture>,
    sprite: SpriteDefinition,
    balls: Vec<Ball>,
    paused: bool,
}

impl Demo {
    fn new(atlas: Option<PathBuf>, sheet: Option<PathBuf>) -> Self {
        let colors = [
            Color::WHITE,
            Color::rgb(1.0, 0.6, 0.6),
            Color::rgb(0.6, 1.0, 0.6),
            Color::rgb(0.6, 0.7, 1.0),
        ];
        let balls = colors
            .iter()
            .enumerate()
            .map(|(i, &tint)| Ball {
                pos: Vec2::new(40.0 + i as f32 * 60.0, 30.0 + i as f32 * 10.0),
                vel: Vec2::new(1.0 + i as f32 * 0.4, 0.0),
                tint,
            })
            .collect();

        Self {
            atlas_path: atlas,
            sheet,
            atlas: None,
            sprite: procedural_sprite(),
            balls,
            paused: false,
        }
    }

    fn poll_atlas(&mut self, render: &mut RenderContext<WgpuBackend<'_>>) {
        let Some(pending) = self.atlas.as_mut() else {
            return;
        };
        match pending.poll(render) {
            LoadState::Pending => return,
            LoadState::Ready(loaded) => {
                render.install_atlas(loaded.handle);
                if self.sheet.is_none() {
                    // No frame layout given: show the whole image.
                    let size = FRAME as f32;
                    self.sprite = SpriteDefinition::single(size, size, Vec2::new(size * 0.5, size * 0.5));
                }
                info!("atlas '{}' installed ({}x{})", pending.label(), loaded.width, loaded.height);
            }
            LoadState::Failed(err) => warn!("keeping procedural atlas: {err}"),
        }
        self.atlas = None;
    }
}

impl App for Demo {
    fn on_start(&mut self, render: &mut RenderContext<WgpuBackend<'_>>) -> Result<()> {
        render
            .create_atlas(&procedural_atlas()?)
            .context("failed to upload procedural atlas")?;
        self.atlas = self
            .atlas_path
            .take()
            .map(|path| TextureLoader::load(path, render.atlas_params()));

        if let Some(path) = &self.sheet {
            let sheet = SpriteSheet::from_file(path)
                .with_context(|| format!("failed to read sprite sheet {}", path.display()))?;
            let mut names: Vec<&str> = sheet.names().collect();
            names.sort_unstable();
            if let Some(sprite) = names.first().and_then(|name| sheet.get(name)) {
                info!("using sprite '{}' from {}", names[0], path.display());
                self.sprite = sprite.clone();
            }
        }
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => AppControl::Exit,
            PhysicalKey::Code(KeyCode::Space) => {
                self.paused = !self.paused;
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.poll_atlas(ctx.render);
        ctx.render.set_composite_blend(if self.paused { PAUSED_TINT } else { Color::WHITE });

        let radius = self.sprite.width * 0.5;
        if !self.paused {
            for ball in &mut self.balls {
                ball.step(radius);
            }
        }

        if let Err(err) = self.draw(ctx.render) {
            warn!("draw failed: {err}");
        }
        AppControl::Continue
    }
}

impl Demo {
    fn draw(&self, render: &mut RenderContext<WgpuBackend<'_>>) -> Result<()> {
        let floor = Color::rgb(0.25, 0.2, 0.3);
        draw::rect(
            render,
            Rect::from_origin_size(Vec2::new(0.0, FLOOR_Y), Vec2::new(VIEW_W, VIEW_H - FLOOR_Y)),
            &DrawStyle::with_blend(floor),
        )?;
        draw::line(
            render,
            Vec2::new(0.0, FLOOR_Y),
            Vec2::new(VIEW_W, FLOOR_Y),
            &DrawStyle::with_blend(Color::rgb(0.8, 0.7, 0.9)),
        )?;

        let shadow = DrawStyle::with_blend(Color::BLACK.with_alpha(0.35));
        for ball in &self.balls {
            let height = (FLOOR_Y - ball.pos.y).max(0.0);
            let r = (6.0 - height * 0.03).max(2.0);
            draw::circle(render, Vec2::new(ball.pos.x, FLOOR_Y + 4.0), r, 12, &shadow)?;
        }

        for (i, ball) in self.balls.iter().enumerate() {
            let angle = ball.pos.x / 8.0;
            let spin = move |m: AffineMatrix| {
                m.translate(0.5, 0.5).rotate(angle).translate(-0.5, -0.5)
            };
            let style = DrawStyle::with_transform(&spin).blend(ball.tint);
            draw::sprite_speed(render, &self.sprite, 0.1 + i as f32 * 0.05, ball.pos, &style)?;
        }
        Ok(())
    }
}

/// `FRAMES` discs in a row, each a little brighter than the last.
fn procedural_atlas() -> Result<TextureData> {
    let width = FRAME * FRAMES;
    let mut pixels = vec![0u8; (width * FRAME * 4) as usize];
    let c = (FRAME as f32 - 1.0) * 0.5;
    for frame in 0..FRAMES {
        let shade = 150 + frame as u8 * 35;
        for y in 0..FRAME {
            for x in 0..FRAME {
                let (dx, dy) = (x as f32 - c, y as f32 - c);
                if dx * dx + dy * dy > c * c {
                    continue;
                }
                // Stripe that shows the rotation.
                let stripe = (x + frame * 2) % 8 < 2;
                let v = if stripe { shade / 2 } else { shade };
                let i = ((y * width + frame * FRAME + x) * 4) as usize;
                pixels[i..i + 4].copy_from_slice(&[v, v, v, 255]);
            }
        }
    }
    Ok(TextureData::from_rgba8(width, FRAME, pixels)?)
}

fn procedural_sprite() -> SpriteDefinition {
    let frames: Vec<AtlasFrame> = (0..FRAMES)
        .map(|i| AtlasFrame::new((i * FRAME) as f32, 0.0))
        .collect();
    let size = FRAME as f32;
    SpriteDefinition::from_atlas(
        size,
        size,
        Vec2::new(size * 0.5, size * 0.5),
        &frames,
        (FRAME * FRAMES) as f32,
        FRAME as f32,
    )
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    // sprig-demo [atlas.png [sheet.json]]
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let atlas = args.next();
    let sheet = args.next();

    Runtime::run(
        RuntimeConfig {
            title: "sprig demo".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        StageConfig {
            background: Color::rgb(0.1, 0.1, 0.15),
            ..StageConfig::with_view(VIEW_W, VIEW_H)
        },
        Demo::new(atlas, sheet),
    )
}
