/// Live display test for x11kit
///
/// Connects to the X server named by $DISPLAY through the socket transport
/// and cross-checks what x11kit reports and creates against an independent
/// x11rb connection. Skipped (successfully) when no server is reachable.
use std::env;
use std::process;
use x11kit::{Connection, Font, GcOptions, Rectangle, Window, WindowOptions};
use x11rb::connection::Connection as _;
use x11rb::protocol::xproto::ConnectionExt as _;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn check_screen(conn: &Connection) -> TestResult {
    let (reference, screen_num) = x11rb::connect(None)?;
    let screen = &reference.setup().roots[screen_num];
    let info = conn.screen_info();

    assert_eq!(info.root.get(), screen.root);
    assert_eq!(info.width, screen.width_in_pixels);
    assert_eq!(info.height, screen.height_in_pixels);
    assert_eq!(info.root_depth, screen.root_depth);
    assert_eq!(info.white_pixel, screen.white_pixel);
    assert_eq!(info.black_pixel, screen.black_pixel);
    println!("  screen snapshot matches x11rb");
    Ok(())
}

fn check_window(conn: &Connection) -> TestResult {
    let window = Window::create(
        conn,
        &WindowOptions {
            x: 10,
            y: 20,
            width: 123,
            height: 45,
            title: Some("x11kit live test".to_string()),
            ..WindowOptions::default()
        },
    )?;
    let gc = window.create_graphics_context(&GcOptions::default())?;
    gc.fill_rectangle(Rectangle::new(0, 0, 10, 10))?;
    conn.flush()?;

    // Resource ids are global, so a second client can inspect ours
    let (reference, _) = x11rb::connect(None)?;
    let geometry = reference.get_geometry(window.id().get())?.reply()?;
    assert_eq!((geometry.width, geometry.height), (123, 45));
    assert_eq!((geometry.x, geometry.y), (10, 20));
    println!("  window geometry matches x11rb");

    gc.release()?;
    window.release()?;
    // A round trip guarantees the server has processed the destroy
    conn.intern_atom("WM_NAME", true)?;
    assert!(
        reference.get_geometry(window.id().get())?.reply().is_err(),
        "window should be gone after release"
    );
    println!("  released window is gone");
    Ok(())
}

fn check_font(conn: &Connection) -> TestResult {
    let font = Font::fixed(conn)?;
    let metrics = font.query_metrics()?;
    assert!(metrics.ascent > 0);
    assert_eq!(font.height()?, metrics.ascent + metrics.descent);
    println!("  fixed font: {:?}", metrics);
    Ok(())
}

fn check_atoms(conn: &Connection) -> TestResult {
    let (reference, _) = x11rb::connect(None)?;
    let ours = conn.intern_atom("_X11KIT_LIVE_TEST", false)?;
    let theirs = reference
        .intern_atom(true, b"_X11KIT_LIVE_TEST")?
        .reply()?
        .atom;
    assert_eq!(ours.get(), theirs);
    println!("  atom 0x{:x} matches x11rb", theirs);
    Ok(())
}

fn run() -> TestResult {
    let conn = Connection::connect(None, None)?;
    check_screen(&conn)?;
    check_window(&conn)?;
    check_font(&conn)?;
    check_atoms(&conn)?;

    let report = conn.close();
    assert!(report.is_clean());
    println!("  close released {} resources", report.released.len());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if env::var_os("DISPLAY").is_none() {
        println!("live_display: DISPLAY not set, skipping");
        return;
    }
    if let Err(e) = x11rb::connect(None) {
        println!("live_display: no X server reachable ({}), skipping", e);
        return;
    }

    println!("live_display:");
    if let Err(e) = run() {
        eprintln!("live_display failed: {}", e);
        process::exit(1);
    }
    println!("live_display: ok");
}
