//! Bouncing balls
//!
//! Click to add a ball, Space pauses, G/H lower and raise gravity, C clears
//! and Escape quits. On the null transport the animation stops by itself
//! after a fixed number of frames.

use std::env;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use x11kit::{
    Arc, Color, Connection, Event, EventInterest, Flow, Font, GcOptions, GraphicsContext,
    NullTransport, Rectangle, Scope, Window, WindowOptions,
};

const WIDTH: f32 = 600.0;
const HEIGHT: f32 = 400.0;
const FRAME: Duration = Duration::from_millis(16);
const HEADLESS_FRAMES: u64 = 120;

const KEY_ESCAPE: u8 = 9;
const KEY_G: u8 = 42;
const KEY_H: u8 = 43;
const KEY_C: u8 = 54;
const KEY_SPACE: u8 = 65;

/// Xorshift generator; good enough to scatter balls
struct Rng(u64);

impl Rng {
    fn seeded() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x2545_f491_4f6c_dd1d);
        Rng(nanos | 1)
    }

    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Uniform in [0, 1)
    fn unit(&mut self) -> f32 {
        (self.next() >> 40) as f32 / (1u64 << 24) as f32
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

struct Ball {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    radius: f32,
    brush: usize,
}

impl Ball {
    fn new(x: f32, y: f32, rng: &mut Rng) -> Self {
        // Never slower than 1px per frame on either axis
        let speed = |rng: &mut Rng| {
            let v = (rng.unit() - 0.5) * 8.0;
            if v.abs() < 1.0 {
                2.0f32.copysign(v)
            } else {
                v
            }
        };
        Ball {
            x,
            y,
            vx: speed(rng),
            vy: speed(rng),
            radius: 10.0 + rng.below(20) as f32,
            brush: rng.below(3) as usize,
        }
    }

    fn step(&mut self, gravity: f32) {
        self.vy += gravity;
        self.x += self.vx;
        self.y += self.vy;

        if self.x - self.radius <= 0.0 || self.x + self.radius >= WIDTH {
            self.vx *= -0.9;
            self.x = self.x.clamp(self.radius, WIDTH - self.radius);
        }
        if self.y - self.radius <= 0.0 || self.y + self.radius >= HEIGHT {
            self.vy *= -0.9;
            self.y = self.y.clamp(self.radius, HEIGHT - self.radius);
        }
    }

    fn resting(&self) -> bool {
        self.vx.abs() < 0.1 && self.vy.abs() < 0.1 && self.y > HEIGHT - 20.0
    }

    fn bounds(&self) -> Arc {
        let diameter = (self.radius * 2.0) as u16;
        Arc::ellipse(
            (self.x - self.radius) as i16,
            (self.y - self.radius) as i16,
            diameter,
            diameter,
        )
    }
}

struct Scene {
    balls: Vec<Ball>,
    gravity: f32,
    paused: bool,
    frames: u64,
    rng: Rng,
}

impl Scene {
    fn new() -> Self {
        let mut rng = Rng::seeded();
        let balls = (0..5)
            .map(|_| {
                let x = 50.0 + rng.below(500) as f32;
                let y = 50.0 + rng.below(300) as f32;
                Ball::new(x, y, &mut rng)
            })
            .collect();
        Scene {
            balls,
            gravity: 0.15,
            paused: false,
            frames: 0,
            rng,
        }
    }

    fn advance(&mut self) {
        for ball in &mut self.balls {
            ball.step(self.gravity);
        }
        self.balls.retain(|ball| !ball.resting());
        self.frames += 1;
    }

    fn handle(&mut self, event: &Event) -> Flow {
        match event {
            Event::ButtonPress(input) if (60..360).contains(&input.event_y) => {
                let (x, y) = (f32::from(input.event_x), f32::from(input.event_y));
                log::info!("new ball at ({}, {})", x, y);
                let ball = Ball::new(x, y, &mut self.rng);
                self.balls.push(ball);
            }
            Event::KeyPress(input) => match input.detail {
                KEY_ESCAPE => return Flow::Stop,
                KEY_SPACE => self.paused = !self.paused,
                KEY_G => self.gravity = (self.gravity - 0.05).max(0.0),
                KEY_H => self.gravity = (self.gravity + 0.05).min(1.0),
                KEY_C => self.balls.clear(),
                _ => {}
            },
            _ => {}
        }
        Flow::Continue
    }
}

struct Painter {
    background: GraphicsContext,
    text: GraphicsContext,
    brushes: Vec<GraphicsContext>,
}

impl Painter {
    fn new(window: &Window, font: &Font) -> x11kit::Result<Self> {
        let brush = |color| {
            window.create_graphics_context(&GcOptions {
                foreground: color,
                ..GcOptions::default()
            })
        };
        Ok(Painter {
            background: brush(Color::Black)?,
            text: window.create_graphics_context(&GcOptions {
                foreground: Color::White,
                background: Color::Black,
                font: Some(font.id()),
                ..GcOptions::default()
            })?,
            brushes: vec![brush(Color::Red)?, brush(Color::Green)?, brush(Color::Blue)?],
        })
    }

    fn draw(&self, scene: &Scene) -> x11kit::Result<()> {
        self.background
            .fill_rectangle(Rectangle::new(0, 0, WIDTH as u16, HEIGHT as u16))?;
        for ball in &scene.balls {
            self.brushes[ball.brush].fill_arc(ball.bounds())?;
        }
        self.text.draw_text(
            10,
            20,
            &format!(
                "Balls: {} | Gravity: {:.2}",
                scene.balls.len(),
                scene.gravity
            ),
        )?;
        let status = if scene.paused { "Paused" } else { "Running" };
        self.text.draw_text(
            10,
            385,
            &format!("{} | Frame: {}", status, scene.frames),
        )
    }
}

fn run(conn: &Connection, frame_limit: Option<u64>) -> x11kit::Result<()> {
    let window = Window::create(
        conn,
        &WindowOptions {
            x: 100,
            y: 100,
            width: WIDTH as u16,
            height: HEIGHT as u16,
            background: Color::Black,
            title: Some("Bouncing Balls".to_string()),
            events: vec![
                EventInterest::Exposure,
                EventInterest::KeyPress,
                EventInterest::ButtonPress,
            ],
            ..WindowOptions::default()
        },
    )?;
    let font = Font::fixed(conn)?;
    let painter = Painter::new(&window, &font)?;
    window.show()?;

    let mut scene = Scene::new();
    let dispatcher = conn.dispatcher(Scope::Window(window.id()));
    let mut last_frame = Instant::now();

    loop {
        if dispatcher.dispatch_pending(|event| scene.handle(event))? == Flow::Stop {
            break;
        }
        if frame_limit.map_or(false, |limit| scene.frames >= limit) {
            break;
        }

        if last_frame.elapsed() >= FRAME {
            if !scene.paused {
                scene.advance();
            }
            painter.draw(&scene)?;
            conn.flush()?;
            last_frame = Instant::now();
        }
        thread::sleep(Duration::from_millis(1));
    }

    log::info!("stopped after {} frames", scene.frames);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let headless = env::args().any(|arg| arg == "-null") || env::var_os("DISPLAY").is_none();
    let result = if headless {
        log::info!("no display, animating {} frames on the null transport", HEADLESS_FRAMES);
        Connection::with_transport(NullTransport::new(), 0)
            .and_then(|conn| run(&conn, Some(HEADLESS_FRAMES)))
    } else {
        Connection::with_connection(None, None, |conn| run(conn, None))
    };

    if let Err(err) = result {
        eprintln!("bouncing_balls: {}", err);
        std::process::exit(1);
    }
}
