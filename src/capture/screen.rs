//! Screen region capture using GDI.

use anyhow::{anyhow, Result};
use image::RgbaImage;

use crate::automation::config::ScreenRect;

/// Captures a rectangle of the desktop as an RGBA image.
///
/// Coordinates are virtual-screen pixels, as shown by the mouse position.
#[cfg(windows)]
pub fn capture_region(rect: &ScreenRect) -> Result<RgbaImage> {
    use std::ffi::c_void;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
        GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
        DIB_RGB_COLORS, HGDIOBJ, SRCCOPY,
    };

    if rect.width == 0 || rect.height == 0 {
        return Err(anyhow!("Empty capture region {:?}", rect));
    }
    let width = rect.width as i32;
    let height = rect.height as i32;

    let mut buffer = vec![0u8; rect.width as usize * rect.height as usize * 4];

    unsafe {
        let screen_dc = GetDC(HWND::default());
        if screen_dc.is_invalid() {
            return Err(anyhow!("GetDC failed"));
        }
        let mem_dc = CreateCompatibleDC(screen_dc);
        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        let previous = SelectObject(mem_dc, HGDIOBJ(bitmap.0));

        let blit = BitBlt(mem_dc, 0, 0, width, height, screen_dc, rect.x, rect.y, SRCCOPY);

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height: top-down rows
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let rows = GetDIBits(
            mem_dc,
            bitmap,
            0,
            rect.height,
            Some(buffer.as_mut_ptr() as *mut c_void),
            &mut info,
            DIB_RGB_COLORS,
        );

        SelectObject(mem_dc, previous);
        let _ = DeleteObject(HGDIOBJ(bitmap.0));
        let _ = DeleteDC(mem_dc);
        ReleaseDC(HWND::default(), screen_dc);

        blit.map_err(|e| anyhow!("BitBlt failed: {}", e))?;
        if rows == 0 {
            return Err(anyhow!("GetDIBits returned no rows"));
        }
    }

    // BGRA -> RGBA, GDI leaves alpha at 0
    for pixel in buffer.chunks_exact_mut(4) {
        pixel.swap(0, 2);
        pixel[3] = 255;
    }

    RgbaImage::from_raw(rect.width, rect.height, buffer)
        .ok_or_else(|| anyhow!("Capture buffer size mismatch"))
}

#[cfg(not(windows))]
pub fn capture_region(rect: &ScreenRect) -> Result<RgbaImage> {
    Err(anyhow!(
        "Screen capture of {:?} is only supported on Windows",
        rect
    ))
}
