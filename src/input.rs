use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels per wheel "line" when the platform reports pixel deltas.
const PIXELS_PER_LINE: f32 = 120.0;

/// Convert a window-space pointer position to normalized device coordinates
/// (`-1..1` on both axes, +y up).
pub fn to_ndc(position: Vec2, width: u32, height: u32) -> Vec2 {
    let size = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    Vec2::new(
        position.x / size.x * 2.0 - 1.0,
        1.0 - position.y / size.y * 2.0,
    )
}

/// Input gathered between two frames.
///
/// The scroll offset behaves like a page offset: it only grows when the
/// wheel moves down, shrinks when it moves up, and never drops below zero.
#[derive(Debug, Default)]
pub struct Input {
    keys_pressed: HashSet<KeyCode>,
    clicked: bool,
    pointer: Vec2,
    pointer_moved: bool,
    scroll_offset: f32,
    scrolled: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame state. Call after the frame has consumed its input.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.clicked = false;
        self.pointer_moved = false;
        self.scrolled = false;
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let (PhysicalKey::Code(key), ElementState::Pressed) =
                    (event.physical_key, event.state)
                {
                    if !event.repeat {
                        self.keys_pressed.insert(key);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.press(),
            WindowEvent::CursorMoved { position, .. } => {
                self.move_pointer(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                // Wheel down reports negative y and moves further down the page.
                self.scroll(-lines);
            }
            _ => {}
        }
    }

    fn press(&mut self) {
        self.clicked = true;
    }

    fn move_pointer(&mut self, position: Vec2) {
        self.pointer_moved |= position != self.pointer;
        self.pointer = position;
    }

    fn scroll(&mut self, lines: f32) {
        let next = (self.scroll_offset + lines).max(0.0);
        self.scrolled |= next != self.scroll_offset;
        self.scroll_offset = next;
    }

    /// Returns true if the key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the left button went down this frame.
    pub fn clicked(&self) -> bool {
        self.clicked
    }

    /// Pointer position in window pixels.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn pointer_moved(&self) -> bool {
        self.pointer_moved
    }

    /// Accumulated scroll offset, in wheel lines.
    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn scrolled(&self) -> bool {
        self.scrolled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_corners() {
        assert_eq!(to_ndc(Vec2::ZERO, 800, 600), Vec2::new(-1.0, 1.0));
        assert_eq!(to_ndc(Vec2::new(800.0, 600.0), 800, 600), Vec2::new(1.0, -1.0));
        assert_eq!(to_ndc(Vec2::new(400.0, 300.0), 800, 600), Vec2::ZERO);
    }

    #[test]
    fn ndc_survives_zero_size() {
        let ndc = to_ndc(Vec2::ZERO, 0, 0);
        assert!(ndc.is_finite());
    }

    #[test]
    fn scroll_offset_is_clamped_and_flags_change() {
        let mut input = Input::new();
        input.scroll(-3.0);
        assert_eq!(input.scroll_offset(), 0.0);
        assert!(!input.scrolled());

        input.scroll(2.0);
        input.scroll(1.5);
        assert_eq!(input.scroll_offset(), 3.5);
        assert!(input.scrolled());

        input.begin_frame();
        assert!(!input.scrolled());
        assert_eq!(input.scroll_offset(), 3.5);
    }

    #[test]
    fn pointer_and_click_reset_each_frame() {
        let mut input = Input::new();
        input.move_pointer(Vec2::new(10.0, 20.0));
        input.press();
        assert!(input.pointer_moved());
        assert!(input.clicked());

        input.begin_frame();
        assert!(!input.pointer_moved());
        assert!(!input.clicked());
        assert_eq!(input.pointer(), Vec2::new(10.0, 20.0));

        input.move_pointer(Vec2::new(10.0, 20.0));
        assert!(!input.pointer_moved());
    }
}
