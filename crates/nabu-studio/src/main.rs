use anyhow::Result;

use nabu_engine::assets::AssetCache;
use nabu_engine::coords::{Vec2, Vec3};
use nabu_engine::core::{App, AppControl, FrameCtx};
use nabu_engine::device::GpuInit;
use nabu_engine::input::Key;
use nabu_engine::logging::{init_logging, LoggingConfig};
use nabu_engine::paint::Color;
use nabu_engine::render::{
    BatchPipelines, Camera, Renderer, RendererConfig, Sprite, SpriteSheet, Texture, TILE_SIZE,
};
use nabu_engine::text::{FontId, TextSystem};
use nabu_engine::window::{Runtime, RuntimeConfig};

/// Procedural textures generated at startup; more than one batch can bind.
const TEXTURE_COUNT: usize = 12;
const CAMERA_SPEED: f32 = 400.0;
const STATS_INTERVAL: f32 = 2.0;

// Batches draw from the highest z down, so lower z lands on top.
const Z_TILES: f32 = 5.0;
const Z_SPRITES: f32 = 4.0;
const Z_SHAPES: f32 = 3.0;
const Z_CURSOR: f32 = 2.0;
const Z_HUD: f32 = 1.0;
const Z_TEXT: f32 = 0.0;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// GPU-side state created on the first frame, once a device exists.
struct Scene {
    pipelines: BatchPipelines,
    sprites: Vec<Sprite>,
    sheet: SpriteSheet,
    text: TextSystem,
    font: Option<FontId>,
}

struct Studio {
    renderer: Renderer,
    camera: Camera,
    assets: AssetCache,
    scene: Option<Scene>,
    next_stats_at: f32,
}

impl Studio {
    fn new() -> Result<Self> {
        Ok(Self {
            renderer: Renderer::new(RendererConfig::default())?,
            camera: Camera::new(Vec2::ZERO),
            assets: AssetCache::new(),
            scene: None,
            next_stats_at: STATS_INTERVAL,
        })
    }

    fn build_scene(&mut self, ctx: &FrameCtx<'_, '_>) -> Result<Scene> {
        let device = ctx.gpu.device();
        let queue = ctx.gpu.queue();

        let slots = ctx.gpu.max_texture_slots();
        if slots < self.renderer.config().texture_slots {
            log::warn!("device offers {slots} texture slots; clamping renderer config");
            self.renderer = Renderer::new(self.renderer.config().clamp_to_device(slots))?;
        }

        for i in 0..TEXTURE_COUNT {
            let name = format!("checker-{i}");
            let tint = palette(i);
            let pixels = checkerboard(16, 4, tint);
            let texture = Texture::from_rgba8(device, queue, name.as_str(), 16, 16, &pixels);
            self.assets.insert_texture(name, texture);
        }
        let sprites = (0..TEXTURE_COUNT)
            .filter_map(|i| self.assets.texture(&format!("checker-{i}")))
            .map(Sprite::new)
            .collect();

        let atlas_pixels = sheet_pixels(64, 16);
        let atlas = Texture::from_rgba8(device, queue, "tiles", 64, 64, &atlas_pixels);
        let sheet = SpriteSheet::new(atlas, 16, 16, 16, 0).with_names(["grass", "water", "sand", "stone"]);

        let mut text = TextSystem::new(device, queue);
        let font = FONT_CANDIDATES.iter().find_map(|path| {
            self.assets
                .load_font(&mut text.fonts, "body", path)
                .inspect_err(|e| log::debug!("font {path}: {e}"))
                .ok()
        });
        if font.is_none() {
            log::warn!("no system font found; text is disabled");
        }

        Ok(Scene {
            pipelines: ctx.create_pipelines(),
            sprites,
            sheet,
            text,
            font,
        })
    }
}

impl App for Studio {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }

        if self.scene.is_none() {
            match self.build_scene(ctx) {
                Ok(scene) => self.scene = Some(scene),
                Err(e) => {
                    log::error!("failed to build scene: {e:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Continue;
        };

        let t = ctx.time.elapsed;
        self.camera.position += ctx.input.direction() * CAMERA_SPEED * ctx.time.dt;

        let r = &mut self.renderer;

        // Background tiles.
        for y in 0..21 {
            for x in 0..40 {
                let index = ((x + y) % 4) as usize;
                let Some(tile) = scene.sheet.get(index) else { continue };
                let center = Vec3::new((x as f32 + 0.5) * TILE_SIZE, (y as f32 + 0.5) * TILE_SIZE, Z_TILES);
                r.draw_sprite(center, Vec2::splat(TILE_SIZE), 0.0, Color::WHITE, tile);
            }
        }
        if let Ok(water) = scene.sheet.named("water") {
            r.draw_sprite(Vec3::new(200.0, 600.0, Z_TILES), Vec2::splat(96.0), 0.0, Color::WHITE, water);
        }

        // Spinning textured quads across more textures than one batch holds.
        for (i, sprite) in scene.sprites.iter().enumerate() {
            let x = 80.0 + i as f32 * 90.0;
            let angle = t * 45.0 + i as f32 * 15.0;
            r.draw_sprite(Vec3::new(x, 360.0, Z_SPRITES), Vec2::splat(64.0), angle, Color::WHITE, sprite);
        }

        // Pulsing circles and plain quads.
        for i in 0..10 {
            let phase = t * 2.0 + i as f32;
            let radius = 20.0 + phase.sin() * 8.0;
            let color = palette(i).with_alpha(0.85);
            r.draw_circle(Vec3::new(100.0 + i as f32 * 110.0, 180.0, Z_SHAPES), radius, color);
            r.draw_rotated_quad(
                Vec3::new(100.0 + i as f32 * 110.0, 520.0, Z_SHAPES),
                Vec2::new(40.0, 12.0),
                -angle_of(phase),
                color,
            );
        }

        // Cursor marker in world space.
        if let Some(pointer) = ctx.input.pointer {
            let world = self.camera.screen_to_world(pointer);
            r.draw_circle(world.extend(Z_CURSOR), 6.0, Color::WHITE);
        }

        // HUD strip in normalized screen space.
        r.draw_normalized_quad(Vec3::new(0.5, 0.97, Z_HUD), Vec2::new(1.0, 0.06), Color::BLACK.with_alpha(0.6));

        if let Some(font) = scene.font {
            let stats = r.stats();
            let hud = format!(
                "batches {}  shapes {}  draws {}  camera {:.0},{:.0}",
                stats.batches, stats.shapes, stats.draw_calls, self.camera.position.x, self.camera.position.y
            );
            let top_left = self.camera.position + Vec2::new(12.0, self.camera.visible_size().y - 8.0);
            r.draw_text(&mut scene.text, font, &hud, 18.0, top_left.extend(Z_TEXT), Color::WHITE);
        }

        scene.text.upload_pending(ctx.gpu.queue());
        let control = ctx.present(&mut self.renderer, &scene.pipelines, &mut self.camera);

        if t >= self.next_stats_at {
            let stats = self.renderer.stats();
            log::info!(
                "frame {}: {} batches, {} shapes, {} draw calls",
                ctx.time.frame_index,
                stats.batches,
                stats.shapes,
                stats.draw_calls
            );
            self.next_stats_at = t + STATS_INTERVAL;
        }

        control
    }
}

fn angle_of(phase: f32) -> f32 {
    phase.to_degrees() % 360.0
}

fn palette(i: usize) -> Color {
    const COLORS: [&str; 6] = ["e06c75ff", "98c379ff", "61afefff", "e5c07bff", "c678ddff", "56b6c2ff"];
    Color::from_hex(COLORS[i % COLORS.len()]).unwrap_or(Color::WHITE)
}

/// `size` x `size` RGBA checkerboard alternating `tint` and a darker shade.
fn checkerboard(size: u32, cell: u32, tint: Color) -> Vec<u8> {
    let light = to_rgba8(tint);
    let dark = to_rgba8(Color::new(tint.r * 0.4, tint.g * 0.4, tint.b * 0.4, 1.0));
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let px = if (x / cell + y / cell) % 2 == 0 { light } else { dark };
            pixels.extend_from_slice(&px);
        }
    }
    pixels
}

/// 4x4 grid of solid `cell`-pixel tiles for the sprite sheet.
fn sheet_pixels(size: u32, cell: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let index = ((y / cell) * (size / cell) + x / cell) as usize;
            let shade = if (x % cell == 0) || (y % cell == 0) { 0.8 } else { 1.0 };
            let c = palette(index);
            pixels.extend_from_slice(&to_rgba8(Color::new(c.r * shade, c.g * shade, c.b * shade, 1.0)));
        }
    }
    pixels
}

fn to_rgba8(c: Color) -> [u8; 4] {
    c.clamped().to_array().map(|v| (v * 255.0).round() as u8)
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let studio = Studio::new()?;
    Runtime::run(
        RuntimeConfig {
            title: "Nabu Studio".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        studio,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlays_sit_below_the_background_in_z() {
        let layers = [Z_TILES, Z_SPRITES, Z_SHAPES, Z_CURSOR, Z_HUD, Z_TEXT];
        assert!(layers.windows(2).all(|w| w[0] > w[1]));
    }
}
