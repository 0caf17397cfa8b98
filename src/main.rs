use anyhow::Result;
use fra_atlas::app::App;
use fra_atlas::{data, ui};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::path::Path;
use std::time::Duration;

fn main() -> Result<()> {
    let mut terminal = ratatui::init();
    terminal.clear()?;

    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Mouse: wheel zooms at the cursor, drag pans, click selects.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.begin_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag(mouse.column, mouse.row);
        }
        _ => {}
    }
}

fn load_data(app: &mut App) {
    let data_dir = Path::new("data");
    if data_dir.exists() {
        let _ = data::load_all_geojson(&mut app.geo_features, data_dir);
    }
    if app.geo_features.is_empty() {
        app.geo_features = data::demo_dataset();
    }
    app.villages = data::demo_villages();
}

fn run(terminal: &mut DefaultTerminal) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width as usize, size.height as usize);
    load_data(&mut app);

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps poll
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') => app.quit(),
                            KeyCode::Esc => {
                                // Esc closes an open panel before quitting
                                if app.popup.is_some() || app.village().is_some() {
                                    app.close_popup();
                                    app.clear_village();
                                } else {
                                    app.quit();
                                }
                            }

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Layer toggles by registry position
                            KeyCode::Char(c @ '1'..='6') => {
                                app.toggle_layer_index(c as usize - '1' as usize);
                            }

                            // Opacity target + adjustment
                            KeyCode::Tab => app.next_active_layer(),
                            KeyCode::Char('[') => app.adjust_active_opacity(-10),
                            KeyCode::Char(']') => app.adjust_active_opacity(10),

                            KeyCode::Char('b') | KeyCode::Char('B') => app.cycle_basemap(),
                            KeyCode::Char('v') => app.cycle_village(),
                            KeyCode::Char('V') => app.clear_village(),

                            KeyCode::Char('e') | KeyCode::Char('E') => {
                                if let Err(e) = app.export_to_file() {
                                    app.event_log.push(format!("export failed: {e}"));
                                }
                            }

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => {
                                let size = terminal.size()?;
                                app = App::new(size.width as usize, size.height as usize);
                                load_data(&mut app);
                            }

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        // Settle detection for the bounds-change callback
        app.tick();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
