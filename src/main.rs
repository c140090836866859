//! x11kit - Probe a display
//!
//! Connects, prints the screen snapshot and optionally opens a window that
//! echoes every event it receives.

use std::env;
use std::process;
use x11kit::{
    Connection, Event, EventInterest, Flow, NullTransport, Window, WindowOptions, VERSION,
};

fn print_usage() {
    println!("x11kit v{}", VERSION);
    println!("Probe an X11 display through the x11kit client façade");
    println!();
    println!("Usage: x11kit [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -display <name>       Display to connect to (default: $DISPLAY)");
    println!("  -screen <n>           Screen number (default: from the display name)");
    println!("  -window               Open a window and echo its events until a key is pressed");
    println!("  -null                 Use the headless null transport instead of a server");
    println!("  -h, --help            Show this help message");
    println!();
    println!("Examples:");
    println!("  x11kit -display :1");
    println!("  RUST_LOG=debug x11kit -window");
    println!();
}

#[derive(Debug, Default)]
struct Config {
    display: Option<String>,
    screen: Option<usize>,
    open_window: bool,
    null: bool,
}

fn parse_args() -> Result<Config, String> {
    let mut config = Config::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-display" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for -display".to_string());
                }
                config.display = Some(args[i].clone());
            }
            "-screen" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for -screen".to_string());
                }
                config.screen = Some(
                    args[i]
                        .parse()
                        .map_err(|_| "Invalid screen number".to_string())?,
                );
            }
            "-window" => {
                config.open_window = true;
            }
            "-null" => {
                config.null = true;
            }
            arg => {
                return Err(format!("Unknown option: {}", arg));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn describe(event: &Event) -> String {
    let mut line = event.kind().as_str().to_string();
    if let Some(window) = event.window() {
        line.push_str(&format!(" window={}", window));
    }
    if let Some(pos) = event.position() {
        line.push_str(&format!(" at ({}, {})", pos.x, pos.y));
    }
    if let Some(button) = event.button() {
        line.push_str(&format!(" button={}", button));
    }
    if let Some(keycode) = event.keycode() {
        line.push_str(&format!(" keycode={}", keycode));
    }
    if event.sent_event() {
        line.push_str(" (sent)");
    }
    line
}

fn echo_events(conn: &Connection) -> x11kit::Result<()> {
    let window = Window::create(
        conn,
        &WindowOptions {
            width: 320,
            height: 200,
            title: Some("x11kit probe".to_string()),
            events: vec![
                EventInterest::Exposure,
                EventInterest::KeyPress,
                EventInterest::ButtonPress,
                EventInterest::ButtonRelease,
                EventInterest::PointerMotion,
                EventInterest::StructureNotify,
            ],
            ..WindowOptions::default()
        },
    )?;
    window.set_class("x11kit", "X11kit")?;
    window.show()?;
    println!("Window {} mapped; press any key in it to quit", window.id());

    let count = window.event_loop(|event| {
        println!("  {}", describe(event));
        match event {
            Event::KeyPress(_) => Flow::Stop,
            _ => Flow::Continue,
        }
    })?;
    println!("{} events received", count);
    Ok(())
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    let conn = if config.null {
        Connection::with_transport(NullTransport::new(), config.screen.unwrap_or(0))
    } else {
        Connection::connect(config.display.as_deref(), config.screen)
    };
    let conn = match conn {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    let screen = conn.screen_info();
    let (dpi_x, dpi_y) = screen.dpi();
    println!("Screen {}:", screen.number);
    println!(
        "  size:         {}x{} pixels ({}x{} mm, {:.0}x{:.0} dpi)",
        screen.width, screen.height, screen.width_mm, screen.height_mm, dpi_x, dpi_y
    );
    println!("  root window:  {}", screen.root);
    println!("  root depth:   {}", screen.root_depth);
    println!("  root visual:  0x{:x}", screen.root_visual.get());
    println!("  colormap:     {}", screen.default_colormap);
    println!("  white pixel:  0x{:06x}", screen.white_pixel);
    println!("  black pixel:  0x{:06x}", screen.black_pixel);

    if config.open_window {
        if let Err(err) = echo_events(&conn) {
            eprintln!("Error: {}", err);
        }
    }

    let report = conn.close();
    if !report.is_clean() {
        eprintln!("{} resources could not be released", report.failures.len());
        process::exit(1);
    }
}
