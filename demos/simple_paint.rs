//! Simple paint
//!
//! Drag with any button to draw, 1-4 pick a colour, C clears and Escape
//! quits. Runs headless on the null transport when no display is set.

use std::env;
use x11kit::{
    Color, Connection, Cursor, CursorShape, Event, EventInterest, Flow, Font, GcOptions,
    GraphicsContext, NullTransport, Rectangle, Window, WindowOptions,
};

const WIDTH: u16 = 600;
const HEIGHT: u16 = 400;
const TOOLBAR: i16 = 40;

const KEY_ESCAPE: u8 = 9;
const KEY_1: u8 = 10;
const KEY_C: u8 = 54;

const PALETTE: [Color; 4] = [Color::Black, Color::Red, Color::Green, Color::Blue];

struct Stroke {
    color: usize,
    from: (i16, i16),
    to: (i16, i16),
}

struct Canvas {
    background: GraphicsContext,
    brushes: Vec<GraphicsContext>,
    text: GraphicsContext,
}

impl Canvas {
    fn new(window: &Window, font: &Font) -> x11kit::Result<Self> {
        let brush = |color| {
            window.create_graphics_context(&GcOptions {
                foreground: color,
                ..GcOptions::default()
            })
        };
        let brushes = PALETTE
            .iter()
            .map(|&color| brush(color))
            .collect::<x11kit::Result<Vec<_>>>()?;
        Ok(Canvas {
            background: brush(Color::White)?,
            brushes,
            text: window.create_graphics_context(&GcOptions {
                font: Some(font.id()),
                ..GcOptions::default()
            })?,
        })
    }

    fn draw_toolbar(&self, current: usize) -> x11kit::Result<()> {
        self.background
            .fill_rectangle(Rectangle::new(0, 0, WIDTH, TOOLBAR as u16))?;
        self.text.draw_text(10, 20, "Simple Paint")?;
        for (i, brush) in self.brushes.iter().enumerate() {
            let x = 150 + i as i16 * 60;
            brush.fill_rectangle(Rectangle::new(x, 5, 30, 30))?;
            if i == current {
                self.brushes[0].draw_rectangle(Rectangle::new(x - 2, 3, 34, 34))?;
            }
        }
        self.text.draw_text(400, 20, "1-4: colours, C: clear, Esc: quit")
    }

    fn draw_stroke(&self, stroke: &Stroke) -> x11kit::Result<()> {
        self.brushes[stroke.color].draw_line(stroke.from.0, stroke.from.1, stroke.to.0, stroke.to.1)
    }

    fn clear(&self) -> x11kit::Result<()> {
        self.background.fill_rectangle(Rectangle::new(
            0,
            TOOLBAR,
            WIDTH,
            HEIGHT - TOOLBAR as u16,
        ))
    }
}

#[derive(Default)]
struct Painter {
    current: usize,
    last: Option<(i16, i16)>,
    strokes: Vec<Stroke>,
}

impl Painter {
    fn handle(&mut self, canvas: &Canvas, event: &Event) -> x11kit::Result<Flow> {
        match event {
            Event::Expose(_) => {
                canvas.draw_toolbar(self.current)?;
                for stroke in &self.strokes {
                    canvas.draw_stroke(stroke)?;
                }
            }
            Event::ButtonPress(input) if input.event_y > TOOLBAR => {
                self.last = Some((input.event_x, input.event_y));
            }
            Event::ButtonRelease(_) => self.last = None,
            Event::Motion(input) if input.event_y > TOOLBAR => {
                if let Some(from) = self.last {
                    let to = (input.event_x, input.event_y);
                    let stroke = Stroke {
                        color: self.current,
                        from,
                        to,
                    };
                    canvas.draw_stroke(&stroke)?;
                    self.strokes.push(stroke);
                    self.last = Some(to);
                }
            }
            Event::KeyPress(input) => match input.detail {
                KEY_ESCAPE => return Ok(Flow::Stop),
                KEY_C => {
                    self.strokes.clear();
                    canvas.clear()?;
                    canvas.draw_toolbar(self.current)?;
                }
                code if (KEY_1..KEY_1 + PALETTE.len() as u8).contains(&code) => {
                    self.current = usize::from(code - KEY_1);
                    log::info!("colour changed to {:?}", PALETTE[self.current]);
                    canvas.draw_toolbar(self.current)?;
                }
                _ => {}
            },
            _ => {}
        }
        Ok(Flow::Continue)
    }
}

fn run(conn: &Connection) -> x11kit::Result<()> {
    let window = Window::create(
        conn,
        &WindowOptions {
            x: 100,
            y: 100,
            width: WIDTH,
            height: HEIGHT,
            title: Some("Simple Paint".to_string()),
            events: vec![
                EventInterest::Exposure,
                EventInterest::ButtonPress,
                EventInterest::ButtonRelease,
                EventInterest::ButtonMotion,
                EventInterest::KeyPress,
            ],
            ..WindowOptions::default()
        },
    )?;
    let font = Font::fixed(conn)?;
    let cursor = Cursor::standard(conn, CursorShape::Crosshair)?;
    window.set_cursor(&cursor)?;

    let canvas = Canvas::new(&window, &font)?;
    window.show()?;

    let mut painter = Painter::default();
    let mut failure = None;
    window.event_loop(|event| match painter.handle(&canvas, event) {
        Ok(flow) => flow,
        Err(err) => {
            failure = Some(err);
            Flow::Stop
        }
    })?;
    if let Some(err) = failure {
        return Err(err);
    }
    log::info!("{} strokes painted", painter.strokes.len());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let headless = env::args().any(|arg| arg == "-null") || env::var_os("DISPLAY").is_none();
    let conn = if headless {
        log::info!("no display, painting on the null transport");
        Connection::with_transport(NullTransport::new(), 0)
    } else {
        Connection::connect(None, None)
    };

    let result = conn.and_then(|conn| {
        run(&conn)?;
        let report = conn.close();
        log::info!("released {} resources", report.released.len());
        Ok(())
    });
    if let Err(err) = result {
        eprintln!("simple_paint: {}", err);
        std::process::exit(1);
    }
}
