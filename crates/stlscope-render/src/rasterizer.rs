//! CPU triangle rasterizer
//!
//! Two passes over the scene:
//! 1. opaque items with depth writes
//! 2. translucent items sorted far-to-near, depth-tested but not written,
//!    blended over what is already in the color buffer
//!
//! Triangles with any corner behind the eye are dropped rather than clipped.

use glam::{Mat4, Vec3, Vec4};
use image::RgbaImage;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::scene::{RenderItem, RenderScene};
use crate::{MAX_DIMENSION, RenderError, Result};

const AXIS_COLORS: [[f32; 3]; 3] = [[0.85, 0.1, 0.1], [0.1, 0.65, 0.1], [0.1, 0.2, 0.85]];

/// Headless software renderer
#[derive(Debug, Clone)]
pub struct SoftwareRenderer {
    /// Light contribution for faces seen edge-on, in [0, 1]
    pub ambient: f32,
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self { ambient: 0.25 }
    }
}

/// A vertex after projection
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
}

struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<[f32; 3]>,
    depth: Vec<f32>,
}

impl Framebuffer {
    fn new(width: u32, height: u32, background: [f32; 3]) -> Self {
        let len = width as usize * height as usize;
        Self {
            width: width as usize,
            height: height as usize,
            color: vec![background; len],
            depth: vec![f32::INFINITY; len],
        }
    }

    fn plot(
        &mut self,
        x: usize,
        y: usize,
        depth: f32,
        color: [f32; 3],
        alpha: f32,
        write_depth: bool,
    ) {
        let idx = y * self.width + x;
        if depth >= self.depth[idx] {
            return;
        }
        if write_depth {
            self.depth[idx] = depth;
        }
        let dst = &mut self.color[idx];
        for c in 0..3 {
            dst[c] = dst[c] * (1.0 - alpha) + color[c] * alpha;
        }
    }

    fn into_image(self) -> RgbaImage {
        let width = self.width as u32;
        RgbaImage::from_fn(width, self.height as u32, |x, y| {
            let px = self.color[y as usize * self.width + x as usize];
            let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            image::Rgba([to_u8(px[0]), to_u8(px[1]), to_u8(px[2]), 255])
        })
    }
}

impl SoftwareRenderer {
    /// Render a scene to an RGBA image
    pub fn render(&self, scene: &RenderScene) -> Result<RgbaImage> {
        let (width, height) = (scene.width, scene.height);
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RenderError::InvalidSize { width, height });
        }
        if scene.camera.distance() <= f32::EPSILON {
            return Err(RenderError::DegenerateCamera);
        }

        let mut camera = scene.camera.clone();
        camera.aspect = width as f32 / height as f32;
        let bounds = scene.bounds();
        if let Some(bounds) = &bounds {
            camera.fit_clip_planes(bounds);
        }
        let view_proj = camera.view_projection_matrix();

        let mut fb = Framebuffer::new(width, height, scene.background);

        let (opaque, mut translucent): (Vec<&RenderItem>, Vec<&RenderItem>) = scene
            .items
            .iter()
            .filter(|item| item.opacity > 0.0)
            .partition(|item| item.is_opaque());

        // Far-to-near so nearer translucent models blend over farther ones
        let eye_distance = |item: &RenderItem| {
            item.world_bounds()
                .map_or(0.0, |b| (b.center() - camera.position).length())
        };
        translucent.sort_by(|a, b| eye_distance(*b).total_cmp(&eye_distance(*a)));

        for item in &opaque {
            self.draw_item(&mut fb, item, &camera, &view_proj, true);
        }
        for item in &translucent {
            self.draw_item(&mut fb, item, &camera, &view_proj, false);
        }

        if scene.show_axes {
            let length = bounds.map_or(camera.distance() * 0.25, |b| {
                (b.max.abs().max(b.min.abs()).max_element() * 1.2).max(b.diagonal() * 0.25)
            });
            for (axis, color) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().zip(AXIS_COLORS) {
                draw_line(&mut fb, &view_proj, Vec3::ZERO, axis * length, color);
            }
        }

        tracing::debug!(
            width,
            height,
            opaque = opaque.len(),
            translucent = translucent.len(),
            "Rasterized scene"
        );

        Ok(fb.into_image())
    }

    fn draw_item(
        &self,
        fb: &mut Framebuffer,
        item: &RenderItem,
        camera: &Camera,
        view_proj: &Mat4,
        write_depth: bool,
    ) {
        let world: Vec<Vec3> = item
            .mesh
            .vertices
            .par_iter()
            .map(|v| item.transform.transform_point3(*v))
            .collect();
        let (width, height) = (fb.width as f32, fb.height as f32);
        let screen: Vec<Option<ScreenVertex>> = world
            .par_iter()
            .map(|p| project(view_proj, *p, width, height))
            .collect();

        let alpha = item.opacity.clamp(0.0, 1.0);
        let base = Vec3::from_array(item.color);

        for tri in item.mesh.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(s0), Some(s1), Some(s2)) = (screen[i0], screen[i1], screen[i2]) else {
                continue;
            };

            let (a, b, c) = (world[i0], world[i1], world[i2]);
            let Some(normal) = (b - a).cross(c - a).try_normalize() else {
                continue;
            };
            let to_eye = (camera.position - (a + b + c) / 3.0).normalize_or_zero();
            let light = self.ambient + (1.0 - self.ambient) * normal.dot(to_eye).abs();
            let shaded = (base * light).to_array();

            fill_triangle(fb, [s0, s1, s2], shaded, alpha, write_depth);
        }
    }
}

/// Project to pixel coordinates, `None` when the point is behind the eye
fn project(view_proj: &Mat4, p: Vec3, width: f32, height: f32) -> Option<ScreenVertex> {
    let clip: Vec4 = *view_proj * p.extend(1.0);
    if clip.w <= 1e-6 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(ScreenVertex {
        x: (ndc.x * 0.5 + 0.5) * width,
        y: (0.5 - ndc.y * 0.5) * height,
        depth: ndc.z,
    })
}

fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

fn fill_triangle(
    fb: &mut Framebuffer,
    v: [ScreenVertex; 3],
    color: [f32; 3],
    alpha: f32,
    write_depth: bool,
) {
    let area = edge(&v[0], &v[1], v[2].x, v[2].y);
    if area.abs() < 1e-8 {
        return;
    }

    let lowest = |axis: fn(&ScreenVertex) -> f32| v.iter().map(axis).fold(f32::INFINITY, f32::min);
    let highest =
        |axis: fn(&ScreenVertex) -> f32| v.iter().map(axis).fold(f32::NEG_INFINITY, f32::max);
    let min_x = lowest(|p| p.x).floor().max(0.0);
    let max_x = highest(|p| p.x).ceil().min(fb.width as f32 - 1.0);
    let min_y = lowest(|p| p.y).floor().max(0.0);
    let max_y = highest(|p| p.y).ceil().min(fb.height as f32 - 1.0);
    if min_x > max_x || min_y > max_y {
        return;
    }

    for y in min_y as usize..=max_y as usize {
        let py = y as f32 + 0.5;
        for x in min_x as usize..=max_x as usize {
            let px = x as f32 + 0.5;
            // Dividing by the signed area accepts either winding
            let w0 = edge(&v[1], &v[2], px, py) / area;
            let w1 = edge(&v[2], &v[0], px, py) / area;
            let w2 = edge(&v[0], &v[1], px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let depth = w0 * v[0].depth + w1 * v[1].depth + w2 * v[2].depth;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }
            fb.plot(x, y, depth, color, alpha, write_depth);
        }
    }
}

fn draw_line(fb: &mut Framebuffer, view_proj: &Mat4, from: Vec3, to: Vec3, color: [f32; 3]) {
    let (w, h) = (fb.width as f32, fb.height as f32);
    let (Some(a), Some(b)) = (project(view_proj, from, w, h), project(view_proj, to, w, h)) else {
        return;
    };

    let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().clamp(1.0, 4.0 * (w + h));
    let n = steps as usize;
    for i in 0..=n {
        let t = i as f32 / steps;
        let x = a.x + (b.x - a.x) * t;
        let y = a.y + (b.y - a.y) * t;
        if x < 0.0 || y < 0.0 || x >= w || y >= h {
            continue;
        }
        // Small bias so axes on a model's surface stay visible
        let depth = (a.depth + (b.depth - a.depth) * t) - 1e-4;
        fb.plot(x as usize, y as usize, depth, color, 1.0, true);
    }
}
