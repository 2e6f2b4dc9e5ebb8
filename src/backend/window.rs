// Window/surface provider
//
// Bring-up needs two things from the windowing side: the instance extensions
// the platform requires for presentation, and the raw handles a surface is
// bound to. Anything that exposes raw-window-handle 0.6 handles (winit
// windows included) qualifies.

use super::error::BringupError;
use ash::extensions::khr;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use std::ffi::CStr;

pub trait WindowSurface {
    /// Instance extensions needed to present to this window
    fn required_extensions(&self) -> Result<Vec<&'static CStr>, BringupError>;

    fn raw_handles(&self) -> Result<(RawDisplayHandle, RawWindowHandle), BringupError>;
}

impl<T> WindowSurface for T
where
    T: HasDisplayHandle + HasWindowHandle,
{
    fn required_extensions(&self) -> Result<Vec<&'static CStr>, BringupError> {
        let display = self.display_handle()?.as_raw();
        surface_extensions(display)
    }

    fn raw_handles(&self) -> Result<(RawDisplayHandle, RawWindowHandle), BringupError> {
        let display = self.display_handle()?.as_raw();
        let window = self.window_handle()?.as_raw();
        Ok((display, window))
    }
}

/// Surface extensions for a display, `VK_KHR_surface` first
pub fn surface_extensions(display: RawDisplayHandle) -> Result<Vec<&'static CStr>, BringupError> {
    let platform = match display {
        RawDisplayHandle::Windows(_) => khr::Win32Surface::name(),
        RawDisplayHandle::Xlib(_) => khr::XlibSurface::name(),
        RawDisplayHandle::Xcb(_) => khr::XcbSurface::name(),
        RawDisplayHandle::Wayland(_) => khr::WaylandSurface::name(),
        other => {
            return Err(BringupError::UnsupportedWindowSystem(format!("{:?}", other)));
        }
    };
    Ok(vec![khr::Surface::name(), platform])
}
