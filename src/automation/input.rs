//! Mouse input simulation.
//!
//! Clicks are sent with SendInput as hardware-level events; the chat client
//! ignores synthetic window messages. This moves the real cursor.

use anyhow::Result;

/// Converts a virtual-screen coordinate to SendInput's 0-65535 range.
pub fn normalize_coordinate(value: i32, origin: i32, extent: i32) -> i32 {
    if extent <= 1 {
        return 0;
    }
    let offset = (value - origin).clamp(0, extent - 1) as i64;
    ((offset * 65535) / (extent as i64 - 1)) as i32
}

/// Left-clicks at an absolute screen position.
#[cfg(windows)]
pub fn click_at_screen(x: i32, y: i32) -> Result<()> {
    use anyhow::anyhow;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
        MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEEVENTF_VIRTUALDESK, MOUSEINPUT,
        MOUSE_EVENT_FLAGS,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
        SM_YVIRTUALSCREEN,
    };

    let (origin_x, origin_y, extent_x, extent_y) = unsafe {
        (
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN),
            GetSystemMetrics(SM_CYVIRTUALSCREEN),
        )
    };
    let norm_x = normalize_coordinate(x, origin_x, extent_x);
    let norm_y = normalize_coordinate(y, origin_y, extent_y);

    let mouse = |flags: MOUSE_EVENT_FLAGS| INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: norm_x,
                dy: norm_y,
                dwFlags: flags | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK | MOUSEEVENTF_MOVE,
                ..Default::default()
            },
        },
    };

    let steps = [
        mouse(MOUSE_EVENT_FLAGS(0)),
        mouse(MOUSEEVENTF_LEFTDOWN),
        mouse(MOUSEEVENTF_LEFTUP),
    ];
    for input in steps {
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            return Err(anyhow!("SendInput blocked at ({}, {})", x, y));
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    Ok(())
}

#[cfg(not(windows))]
pub fn click_at_screen(x: i32, y: i32) -> Result<()> {
    Err(anyhow::anyhow!(
        "Mouse input at ({}, {}) is only supported on Windows",
        x,
        y
    ))
}
