//! Façade behaviour against the headless null transport

use x11kit::protocol::{GrabStatus, Request, RequestOpcode, RECORD_SIZE};
use x11kit::*;

fn connect() -> (Connection, NullControl) {
    let transport = NullTransport::new();
    let control = transport.control();
    let conn = Connection::with_transport(transport, 0).unwrap();
    (conn, control)
}

fn button_press(window: ResourceId, button: u8, x: i16, y: i16) -> [u8; RECORD_SIZE] {
    let mut raw = [0u8; RECORD_SIZE];
    raw[0] = 4;
    raw[1] = button;
    raw[12..16].copy_from_slice(&window.get().to_le_bytes());
    raw[24..26].copy_from_slice(&x.to_le_bytes());
    raw[26..28].copy_from_slice(&y.to_le_bytes());
    raw[30] = 1;
    raw
}

fn key_press(window: ResourceId, keycode: u8) -> [u8; RECORD_SIZE] {
    let mut raw = [0u8; RECORD_SIZE];
    raw[0] = 2;
    raw[1] = keycode;
    raw[12..16].copy_from_slice(&window.get().to_le_bytes());
    raw
}

fn count(control: &NullControl, opcode: RequestOpcode) -> usize {
    control.opcodes().iter().filter(|op| **op == opcode).count()
}

#[test]
fn test_default_window_request() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();

    match &control.requests()[0] {
        Request::CreateWindow {
            wid,
            parent,
            width,
            height,
            border_width,
            values,
            ..
        } => {
            assert_eq!(*wid, window.id());
            assert_eq!(*parent, conn.root());
            assert_eq!((*width, *height, *border_width), (400, 300, 1));
            assert_eq!(values.mask, 0x802);
            assert_eq!(values.values, vec![0x00FF_FFFF, 0x0000_8001]);
        }
        other => panic!("unexpected request {:?}", other),
    }
}

#[test]
fn test_release_is_idempotent_for_every_kind() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    let gc = window.create_graphics_context(&GcOptions::default()).unwrap();
    let font = Font::fixed(&conn).unwrap();
    let cursor = Cursor::standard(&conn, CursorShape::Arrow).unwrap();
    let colormap = Colormap::create(&conn, conn.screen_info().root_visual).unwrap();
    let pixmap = Pixmap::create(&conn, window.drawable(), 16, 16, None).unwrap();
    control.clear_requests();

    for _ in 0..3 {
        gc.release().unwrap();
        font.release().unwrap();
        cursor.release().unwrap();
        colormap.release().unwrap();
        pixmap.release().unwrap();
        window.release().unwrap();
    }

    assert_eq!(
        control.opcodes(),
        vec![
            RequestOpcode::FreeGC,
            RequestOpcode::CloseFont,
            RequestOpcode::FreeCursor,
            RequestOpcode::FreeColormap,
            RequestOpcode::FreePixmap,
            RequestOpcode::DestroyWindow,
        ]
    );
    assert!(conn.live_resources().is_empty());
    assert!(window.is_released() && gc.is_released() && pixmap.is_released());

    // Nothing more goes out on drop or close
    drop((window, gc, font, cursor, colormap, pixmap));
    let report = conn.close();
    assert!(report.released.is_empty());
    assert_eq!(control.opcodes().len(), 6);
}

#[test]
fn test_close_frees_in_reverse_creation_order() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    let gc = window.create_graphics_context(&GcOptions::default()).unwrap();
    control.clear_requests();

    let report = conn.close();
    assert!(report.is_clean());
    assert_eq!(
        report.released,
        vec![gc.resource_ref(), window.resource_ref()]
    );
    assert_eq!(
        control.opcodes(),
        vec![RequestOpcode::FreeGC, RequestOpcode::DestroyWindow]
    );
}

#[test]
fn test_scoped_handles_drop_before_connection() {
    let (conn, control) = connect();
    {
        let window = Window::create(&conn, &WindowOptions::default()).unwrap();
        let _pixmap = Pixmap::create(&conn, window.drawable(), 8, 8, None).unwrap();
        assert_eq!(conn.live_resources().len(), 2);
    }
    assert!(conn.live_resources().is_empty());
    let opcodes = control.opcodes();
    assert_eq!(
        &opcodes[opcodes.len() - 2..],
        &[RequestOpcode::FreePixmap, RequestOpcode::DestroyWindow]
    );
}

#[test]
fn test_handles_outliving_connection() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    drop(conn);

    assert!(window.is_released());
    window.release().unwrap();
    assert!(matches!(window.show(), Err(Error::ConnectionLost)));
    assert_eq!(count(&control, RequestOpcode::DestroyWindow), 1);
}

#[test]
fn test_font_with_size_metrics() {
    let (conn, _control) = connect();
    let font = Font::with_size(&conn, 14).unwrap();
    assert!(font.name().contains("--14-"));

    let metrics = font.query_metrics().unwrap();
    assert!(metrics.ascent > 0);
    assert_eq!(font.height().unwrap(), metrics.ascent + metrics.descent);
    assert_eq!(metrics.max_char_width, 7);
    assert_eq!(font.text_width("abc").unwrap(), 21);
}

#[test]
fn test_fixed_font_metrics_are_cached() {
    let (conn, control) = connect();
    let font = Font::fixed(&conn).unwrap();
    let first = font.query_metrics().unwrap();
    let second = font.query_metrics().unwrap();
    assert_eq!(first, second);
    assert_eq!((first.ascent, first.descent), (11, 2));
    assert_eq!(count(&control, RequestOpcode::QueryFont), 1);
}

#[test]
fn test_draw_text_requires_font() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    let gc = window.create_graphics_context(&GcOptions::default()).unwrap();

    assert!(matches!(gc.draw_text(10, 20, "hi"), Err(Error::FontNotSet)));
    assert_eq!(count(&control, RequestOpcode::ImageText8), 0);

    let font = Font::fixed(&conn).unwrap();
    gc.set_font(&font).unwrap();
    assert_eq!(gc.font(), Some(font.id()));
    gc.draw_text(10, 20, "hi").unwrap();

    match control.requests().last() {
        Some(Request::ImageText8 { text, x, y, .. }) => {
            assert_eq!(text, b"hi");
            assert_eq!((*x, *y), (10, 20));
        }
        other => panic!("unexpected request {:?}", other),
    }
}

#[test]
fn test_draw_text_longer_than_255_bytes_fails() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    let font = Font::fixed(&conn).unwrap();
    let gc = window
        .create_graphics_context(&GcOptions {
            font: Some(font.id()),
            ..GcOptions::default()
        })
        .unwrap();

    gc.draw_text(0, 12, &"x".repeat(255)).unwrap();
    match gc.draw_text(0, 12, &"x".repeat(300)) {
        Err(Error::Encode(err)) => assert_eq!((err.bytes, err.limit), (300, 255)),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(count(&control, RequestOpcode::ImageText8), 1);
    assert!(!conn.has_error());
}

#[test]
fn test_gc_font_from_options() {
    let (conn, _control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    let font = Font::fixed(&conn).unwrap();
    let gc = window
        .create_graphics_context(&GcOptions {
            font: Some(font.id()),
            ..GcOptions::default()
        })
        .unwrap();
    gc.draw_text(0, 12, "ok").unwrap();
}

#[test]
fn test_gc_changes_go_through_value_lists() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    let gc = window.create_graphics_context(&GcOptions::default()).unwrap();
    control.clear_requests();

    gc.set_foreground(Color::Red).unwrap();
    gc.set_line_width(3).unwrap();
    gc.change(
        &GcAttributes::new()
            .set(GcAttr::Background, Color::Blue)
            .set(GcAttr::Foreground, Color::Green),
    )
    .unwrap();

    let changes: Vec<(u32, Vec<u32>)> = control
        .requests()
        .into_iter()
        .map(|request| match request {
            Request::ChangeGC { values, .. } => (values.mask, values.values),
            other => panic!("unexpected request {:?}", other),
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (1 << 2, vec![0xFF0000]),
            (1 << 4, vec![3]),
            ((1 << 2) | (1 << 3), vec![0x00FF00, 0x0000FF]),
        ]
    );
}

#[test]
fn test_drawing_targets_bound_drawable() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    let pixmap = Pixmap::create(&conn, window.drawable(), 64, 32, None).unwrap();
    assert_eq!(pixmap.depth(), 24);

    let gc = pixmap.create_graphics_context(&GcOptions::default()).unwrap();
    gc.fill_rectangle(Rectangle::new(0, 0, 64, 32)).unwrap();
    gc.draw_line(0, 0, 63, 31).unwrap();
    gc.fill_arc(Arc::ellipse(4, 4, 8, 8)).unwrap();

    let window_gc = window.create_graphics_context(&GcOptions::default()).unwrap();
    window_gc
        .copy_area(pixmap.drawable(), 0, 0, 64, 32, 10, 10)
        .unwrap();

    for request in control.requests() {
        match request {
            Request::PolyFillRectangle { drawable, .. }
            | Request::PolyLine { drawable, .. }
            | Request::PolyFillArc { drawable, .. } => assert_eq!(drawable, pixmap.id()),
            Request::CopyArea { src, dst, .. } => {
                assert_eq!(src, pixmap.id());
                assert_eq!(dst, window.id());
            }
            _ => {}
        }
    }
}

#[test]
fn test_connection_lost_short_circuits() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    let gc = window.create_graphics_context(&GcOptions::default()).unwrap();
    let font = Font::fixed(&conn).unwrap();
    let cursor = Cursor::standard(&conn, CursorShape::Hand).unwrap();
    let colormap = Colormap::create(&conn, conn.screen_info().root_visual).unwrap();
    let pixmap = Pixmap::create(&conn, window.drawable(), 8, 8, None).unwrap();
    let sent = control.opcodes().len();

    control.break_connection();
    assert!(conn.has_error());
    assert!(matches!(window.show(), Err(Error::ConnectionLost)));
    assert!(matches!(gc.draw_point(1, 1), Err(Error::ConnectionLost)));
    assert!(matches!(gc.draw_text(1, 1, "x"), Err(Error::ConnectionLost)));
    assert!(matches!(font.query_metrics(), Err(Error::ConnectionLost)));
    assert!(matches!(window.set_cursor(&cursor), Err(Error::ConnectionLost)));
    assert!(matches!(
        colormap.alloc_color(0, 0, 0xFFFF),
        Err(Error::ConnectionLost)
    ));
    assert!(matches!(
        pixmap.create_graphics_context(&GcOptions::default()),
        Err(Error::ConnectionLost)
    ));
    assert!(matches!(
        Cursor::standard(&conn, CursorShape::Arrow),
        Err(Error::ConnectionLost)
    ));
    assert!(matches!(
        Window::create(&conn, &WindowOptions::default()),
        Err(Error::ConnectionLost)
    ));

    // Release only marks the slot; the server already dropped the client
    gc.release().unwrap();
    assert!(gc.is_released());

    let report = conn.close();
    assert!(report.is_clean());
    // Window, font, cursor, colormap and pixmap; the GC went first
    assert_eq!(report.released.len(), 5);
    assert!(cursor.is_released() && colormap.is_released() && pixmap.is_released());
    assert_eq!(control.opcodes().len(), sent);
}

#[test]
fn test_released_handle_reports_released() {
    let (conn, _control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    window.release().unwrap();
    match window.show() {
        Err(Error::Released { kind, id }) => {
            assert_eq!(kind, ResourceKind::Window);
            assert_eq!(id, window.id());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_standard_cursor_uses_glyph_pair() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    control.clear_requests();

    let cursor = Cursor::standard(&conn, CursorShape::Crosshair).unwrap();
    window.set_cursor(&cursor).unwrap();

    let requests = control.requests();
    assert_eq!(
        requests.iter().map(Request::opcode).collect::<Vec<_>>(),
        vec![
            RequestOpcode::OpenFont,
            RequestOpcode::CreateGlyphCursor,
            RequestOpcode::CloseFont,
            RequestOpcode::ChangeWindowAttributes,
        ]
    );
    match &requests[1] {
        Request::CreateGlyphCursor {
            cid,
            source_char,
            mask_char,
            fore,
            back,
            ..
        } => {
            assert_eq!(*cid, cursor.id());
            assert_eq!((*source_char, *mask_char), (34, 35));
            assert_eq!((*fore, *back), (Rgb::BLACK, Rgb::WHITE));
        }
        other => panic!("unexpected request {:?}", other),
    }
    match &requests[3] {
        Request::ChangeWindowAttributes { values, .. } => {
            assert_eq!(values.mask, 1 << 14);
            assert_eq!(values.values, vec![cursor.id().get()]);
        }
        other => panic!("unexpected request {:?}", other),
    }
    // The cursor font is closed again; window and cursor remain
    assert_eq!(conn.live_resources().len(), 2);
}

#[test]
fn test_colormap_allocation() {
    let (conn, _control) = connect();
    let colormap = conn.create_colormap(conn.screen_info().root_visual).unwrap();
    assert_eq!(colormap.alloc_color(0xFFFF, 0x8080, 0).unwrap(), 0xFF8000);
    assert_eq!(colormap.alloc_named_color("Yellow").unwrap(), 0xFFFF00);
    match colormap.alloc_named_color("no-such-color") {
        Err(Error::Protocol(err)) => assert_eq!(err.major_opcode, 85),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_window_geometry_and_properties() {
    let (conn, control) = connect();
    let window = Window::create(
        &conn,
        &WindowOptions {
            x: 5,
            y: 6,
            title: Some("demo".to_string()),
            ..WindowOptions::default()
        },
    )
    .unwrap();
    window.move_to(-10, 20).unwrap();
    window.resize(640, 480).unwrap();
    assert_eq!(window.geometry(), Rectangle::new(-10, 20, 640, 480));

    window.set_class("demo", "Demo").unwrap();
    let properties: Vec<Vec<u8>> = control
        .requests()
        .into_iter()
        .filter_map(|request| match request {
            Request::ChangeProperty { data, .. } => Some(data),
            _ => None,
        })
        .collect();
    assert_eq!(properties, vec![b"demo".to_vec(), b"demo\0Demo\0".to_vec()]);
}

#[test]
fn test_query_pointer_and_grabs() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    control.set_pointer(120, -4);

    let pointer = window.query_pointer().unwrap();
    assert!(pointer.same_screen);
    assert_eq!((pointer.root_x, pointer.root_y), (120, -4));
    assert_eq!((pointer.win_x, pointer.win_y), (120, -4));

    let status = window
        .grab_pointer(&[EventInterest::ButtonPress, EventInterest::PointerMotion], true, None)
        .unwrap();
    assert_eq!(status, GrabStatus::Success);
    assert_eq!(window.grab_keyboard().unwrap(), GrabStatus::Success);
    window.ungrab_pointer().unwrap();
    window.ungrab_keyboard().unwrap();
}

#[test]
fn test_window_event_loop() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    let other = ResourceId::new(0xDEAD);

    control.push_event(button_press(other, 3, 1, 1));
    control.push_event(button_press(window.id(), 1, 150, 80));
    control.push_event(key_press(window.id(), 9));
    control.push_event(button_press(window.id(), 2, 0, 0));

    let mut seen = Vec::new();
    let handled = window
        .event_loop(|event| {
            seen.push(event.clone());
            match event {
                Event::KeyPress(_) => Flow::Stop,
                _ => Flow::Continue,
            }
        })
        .unwrap();

    assert_eq!(handled, 2);
    assert_eq!(seen[0].kind(), EventKind::ButtonPress);
    assert_eq!(seen[0].button(), Some(1));
    assert_eq!(seen[0].position(), Some(Point::new(150, 80)));
    assert_eq!(seen[1].keycode(), Some(9));

    // The trailing event is still queued
    assert!(conn.poll_for_event().unwrap().is_some());
    assert!(conn.poll_for_event().unwrap().is_none());
}

#[test]
fn test_dispatch_pending_owned_scope() {
    let (conn, control) = connect();
    let first = Window::create(&conn, &WindowOptions::default()).unwrap();
    let second = Window::create(&conn, &WindowOptions::default()).unwrap();

    control.push_event(button_press(first.id(), 1, 0, 0));
    control.push_event(button_press(ResourceId::new(0x42), 1, 0, 0));
    control.push_event(button_press(second.id(), 1, 0, 0));

    let mut windows = Vec::new();
    let flow = conn
        .dispatcher(Scope::Owned)
        .dispatch_pending(|event| {
            windows.push(event.window());
            Flow::Continue
        })
        .unwrap();
    assert_eq!(flow, Flow::Continue);
    assert_eq!(windows, vec![Some(first.id()), Some(second.id())]);
}

#[test]
fn test_error_events_are_delivered_to_all_scope() {
    let (conn, control) = connect();
    let mut raw = [0u8; RECORD_SIZE];
    raw[1] = 3; // BadWindow
    raw[4..8].copy_from_slice(&0x1234u32.to_le_bytes());
    raw[10] = 8; // MapWindow
    control.push_event(raw);

    match conn.wait_for_event().unwrap() {
        Some(Event::Error(err)) => {
            assert_eq!(err.bad_value, 0x1234);
            assert_eq!(err.major_opcode, 8);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(conn.wait_for_event().unwrap().is_none());
}

#[test]
fn test_unsupported_attributes_are_ignored() {
    let (conn, control) = connect();
    let window = Window::create(&conn, &WindowOptions::default()).unwrap();
    control.clear_requests();
    window
        .change_attributes(
            &WindowAttributes::new()
                .set_named("glitter", 1u32)
                .set_named("event-mask", AttrValue::from_event_names(&["exposure", "mind-reading"])),
        )
        .unwrap();

    match &control.requests()[0] {
        Request::ChangeWindowAttributes { values, .. } => {
            assert_eq!(values.mask, 1 << 11);
            assert_eq!(values.values, vec![0x8000]);
        }
        other => panic!("unexpected request {:?}", other),
    }
}
