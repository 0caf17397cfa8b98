use crate::braille::BrailleCanvas;
use crate::engine::render::{Primitive, RenderPass};
use crate::engine::Village;
use crate::geo::LngLat;
use crate::map::geometry::{draw_circle, draw_ring, draw_thick_line, fill_polygon, draw_line};
use crate::map::projection::Viewport;

/// A text overlay in character coordinates, colored like its source.
pub struct TextOverlay {
    pub col: u16,
    pub row: u16,
    pub text: String,
    /// CSS hex color, converted by the ui layer.
    pub color: String,
    pub emphasized: bool,
}

/// One braille plane per distinct color, drawn back to front.
pub struct Scene {
    pub planes: Vec<(String, BrailleCanvas)>,
    pub texts: Vec<TextOverlay>,
}

/// Projects a render pass onto braille canvases. Planes are grouped by
/// color because a braille cell carries a single foreground color.
pub struct MapRenderer {
    char_width: usize,
    char_height: usize,
}

impl MapRenderer {
    pub fn new(char_width: usize, char_height: usize) -> Self {
        Self { char_width, char_height }
    }

    pub fn resize(&mut self, char_width: usize, char_height: usize) {
        self.char_width = char_width;
        self.char_height = char_height;
    }

    fn plane_index(planes: &mut Vec<(String, BrailleCanvas)>, color: &str, w: usize, h: usize) -> usize {
        if let Some(idx) = planes.iter().position(|(c, _)| c == color) {
            return idx;
        }
        planes.push((color.to_string(), BrailleCanvas::new(w, h)));
        planes.len() - 1
    }

    /// Rasterize a render pass. Fill planes land before stroke planes of
    /// the same primitive so outlines stay crisp over dithered fills.
    pub fn render(
        &self,
        pass: &RenderPass<'_>,
        viewport: &Viewport,
        selected_village: Option<&Village>,
    ) -> Scene {
        let (w, h) = (self.char_width, self.char_height);
        let mut planes: Vec<(String, BrailleCanvas)> = Vec::new();
        let mut texts: Vec<TextOverlay> = Vec::new();

        for primitive in &pass.primitives {
            match primitive {
                Primitive::Polygon { ring, style, label, .. } => {
                    let projected = self.project_ring(ring, viewport);
                    if projected.is_empty() {
                        continue;
                    }

                    if style.fill_opacity > 0.0 {
                        let idx = Self::plane_index(&mut planes, &style.fill_color, w, h);
                        fill_polygon(&mut planes[idx].1, &projected, style.fill_opacity);
                    }
                    if style.stroke_opacity > 0.0 {
                        let idx = Self::plane_index(&mut planes, &style.stroke_color, w, h);
                        draw_ring(&mut planes[idx].1, &projected, style.weight);
                    }

                    if let Some(label) = label {
                        let pos = LngLat::new(label.position.lng, label.position.lat);
                        let (px, py) = viewport.project(pos);
                        if viewport.is_visible(px, py) && px >= 0 && py >= 0 {
                            texts.push(TextOverlay {
                                col: (px / 2) as u16,
                                row: (py / 4) as u16,
                                text: label.text.clone(),
                                color: "#ffffff".to_string(),
                                emphasized: false,
                            });
                        }
                    }
                }
                Primitive::Line { coords, style, .. } => {
                    if style.stroke_opacity <= 0.0 {
                        continue;
                    }
                    let idx = Self::plane_index(&mut planes, &style.stroke_color, w, h);
                    self.draw_linestring(&mut planes[idx].1, coords, style.weight, viewport);
                }
                Primitive::Marker { position, style, selected, feature, .. } => {
                    let (px, py) = viewport.project(*position);
                    if !viewport.is_visible(px, py) {
                        continue;
                    }
                    let radius = if viewport.zoom > 14.0 { 3 } else { 2 };
                    let idx = Self::plane_index(&mut planes, &style.fill_color, w, h);
                    draw_circle(&mut planes[idx].1, px, py, radius);

                    if *selected && px >= 0 && py >= 0 {
                        texts.push(TextOverlay {
                            col: (px / 2) as u16,
                            row: (py / 4) as u16,
                            text: "◆".to_string(),
                            color: "#ef4444".to_string(),
                            emphasized: true,
                        });
                    } else if viewport.zoom > 14.0 && px >= 0 && py >= 0 {
                        // Names appear once markers are sparse enough to read
                        if let Some(label_col) = ((px / 2) as u16).checked_add(2) {
                            texts.push(TextOverlay {
                                col: label_col,
                                row: (py / 4) as u16,
                                text: feature.name().to_string(),
                                color: style.fill_color.clone(),
                                emphasized: false,
                            });
                        }
                    }
                }
                Primitive::ClusterBubble { position, count, style, .. } => {
                    let (px, py) = viewport.project(*position);
                    if !viewport.is_visible(px, py) {
                        continue;
                    }
                    let idx = Self::plane_index(&mut planes, &style.fill_color, w, h);
                    draw_circle(&mut planes[idx].1, px, py, 3);
                    if px >= 0 && py >= 0 {
                        if let Some(label_col) = ((px / 2) as u16).checked_add(2) {
                            texts.push(TextOverlay {
                                col: label_col,
                                row: (py / 4) as u16,
                                text: format!("({count})"),
                                color: style.fill_color.clone(),
                                emphasized: true,
                            });
                        }
                    }
                }
            }
        }

        if let Some(village) = selected_village {
            let (px, py) = viewport.project(village.position);
            if viewport.is_visible(px, py) && px >= 0 && py >= 0 {
                texts.push(TextOverlay {
                    col: (px / 2) as u16,
                    row: (py / 4) as u16,
                    text: format!("◎ {}", village.name),
                    color: "#ef4444".to_string(),
                    emphasized: true,
                });
            }
        }

        Scene { planes, texts }
    }

    fn project_ring(&self, ring: &[LngLat], viewport: &Viewport) -> Vec<(i32, i32)> {
        if ring.len() < 3 {
            return Vec::new();
        }
        let projected: Vec<(i32, i32)> = ring.iter().map(|&p| viewport.project(p)).collect();

        // Skip polygons entirely outside the canvas
        let any_visible = projected
            .windows(2)
            .any(|w| viewport.line_might_be_visible(w[0], w[1]));
        if any_visible {
            projected
        } else {
            Vec::new()
        }
    }

    /// Draw a linestring with viewport culling (long wrap-around segments
    /// are dropped, matching the projected-distance guard on borders).
    fn draw_linestring(
        &self,
        canvas: &mut BrailleCanvas,
        coords: &[LngLat],
        weight: f32,
        viewport: &Viewport,
    ) {
        if coords.len() < 2 {
            return;
        }

        let mut prev: Option<(i32, i32)> = None;
        for &pos in coords {
            let (px, py) = viewport.project(pos);

            if let Some((prev_x, prev_y)) = prev {
                let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
                if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                    if weight >= 3.0 {
                        draw_thick_line(canvas, prev_x, prev_y, px, py);
                    } else {
                        draw_line(canvas, prev_x, prev_y, px, py);
                    }
                }
            }
            prev = Some((px, py));
        }
    }
}
