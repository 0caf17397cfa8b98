use crate::app::App;
use crate::engine::popup::{self, PopupContent};
use crate::engine::render;
use crate::map::{MapRenderer, Scene};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Parse a CSS hex color ("#rrggbb") into a terminal color.
fn hex_color(hex: &str) -> Color {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 {
        return Color::Gray;
    }
    match (
        u8::from_str_radix(&hex[0..2], 16),
        u8::from_str_radix(&hex[2..4], 16),
        u8::from_str_radix(&hex[4..6], 16),
    ) {
        (Ok(r), Ok(g), Ok(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map + panel
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    // Side panel opens for a popup or a selected village
    let panel_content = app
        .popup
        .clone()
        .or_else(|| app.village().map(popup::build_village));

    let (map_area, panel_area) = if panel_content.is_some() && chunks[0].width > 50 {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(34)])
            .split(chunks[0]);
        (split[0], Some(split[1]))
    } else {
        (chunks[0], None)
    };

    let dropped = render_map(frame, app, map_area);
    if let (Some(area), Some(content)) = (panel_area, panel_content) {
        render_panel(frame, &content, area);
    }
    render_status_bar(frame, app, dropped, chunks[1]);
}

/// Render the map block. Returns the number of features dropped by
/// validation in this pass, for the status bar.
fn render_map(frame: &mut Frame, app: &App, area: Rect) -> usize {
    let title = format!(" FRA Atlas · {} ", app.basemap.config().name);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let pass = render::run(
        &app.layers,
        &app.geo_features,
        viewport.zoom,
        &viewport.bounds(),
        &app.dispatcher,
    );
    let dropped = pass.diagnostics.len();

    let renderer = MapRenderer::new(inner.width as usize, inner.height as usize);
    let scene = renderer.render(&pass, &viewport, app.village());

    let cursor_pos = app.mouse_pos.and_then(|(col, row)| {
        let cx = col.saturating_sub(1 + area.x);
        let cy = row.saturating_sub(1 + area.y);
        if cx < inner.width && cy < inner.height {
            Some((cx, cy))
        } else {
            None
        }
    });

    frame.render_widget(MapWidget { scene, cursor_pos }, inner);
    dropped
}

/// Braille planes plus text overlays, drawn back to front.
struct MapWidget {
    scene: Scene,
    cursor_pos: Option<(u16, u16)>,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (color_hex, canvas) in &self.scene.planes {
            let color = hex_color(color_hex);
            for (row_idx, row_str) in canvas.rows().enumerate() {
                if row_idx >= area.height as usize {
                    break;
                }
                let y = area.y + row_idx as u16;
                for (col_idx, ch) in row_str.chars().enumerate() {
                    if col_idx >= area.width as usize {
                        break;
                    }
                    // Skip empty braille characters (U+2800)
                    if ch == '\u{2800}' {
                        continue;
                    }
                    buf[(area.x + col_idx as u16, y)].set_char(ch).set_fg(color);
                }
            }
        }

        for overlay in &self.scene.texts {
            if overlay.row >= area.height || overlay.col >= area.width {
                continue;
            }
            let y = area.y + overlay.row;
            let mut style = Style::default().fg(hex_color(&overlay.color));
            if overlay.emphasized {
                style = style.add_modifier(Modifier::BOLD);
            }
            let max_len = (area.width - overlay.col) as usize;
            for (i, ch) in overlay.text.chars().take(max_len.min(24)).enumerate() {
                let x = area.x + overlay.col + i as u16;
                buf[(x, y)].set_char(ch).set_style(style);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

/// Info panel for the selected feature or village.
fn render_panel(frame: &mut Frame, content: &PopupContent, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", content.title),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));

    let mut lines = Vec::new();
    if let Some(badge) = &content.badge {
        lines.push(Line::from(Span::styled(
            badge.clone(),
            Style::default().fg(Color::Magenta),
        )));
        lines.push(Line::default());
    }
    for row in &content.rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", row.label), Style::default().fg(Color::DarkGray)),
            Span::styled(row.value.clone(), Style::default().fg(Color::White)),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Esc to close",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, dropped: usize, area: Rect) {
    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_label(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_label(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
    ];

    // One indicator per layer: digit hotkey + first word, green when
    // visible, brackets around the opacity-target layer
    for (i, layer) in app.layers.layers().iter().enumerate() {
        let short = layer.name.split_whitespace().next().unwrap_or(&layer.name);
        let text = if i == app.active_layer {
            format!("[{}:{}] ", i + 1, short)
        } else {
            format!("{}:{} ", i + 1, short)
        };
        spans.push(Span::styled(
            text,
            Style::default().fg(if layer.visible { Color::Green } else { Color::DarkGray }),
        ));
    }

    if dropped > 0 {
        spans.push(Span::styled(
            format!("| {dropped} dropped "),
            Style::default().fg(Color::Red),
        ));
    }

    if let Some(last) = app.event_log.last() {
        spans.push(Span::styled("| ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(last.clone(), Style::default().fg(Color::Magenta)));
    }

    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom 1-6:layers b:map v:village e:export q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
