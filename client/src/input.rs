//! Keyboard and mouse sampling with edge detection

use crate::physics::MoveInput;
use macroquad::prelude::{
    get_char_pressed, is_key_down, is_mouse_button_pressed, mouse_delta_position, screen_height,
    screen_width, set_cursor_grab, show_mouse, KeyCode, MouseButton,
};
use shared::ROOM_CODE_LEN;

/// Everything the game needs from one frame of input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub movement: MoveInput,
    /// Pointer movement in pixels since the last frame.
    pub look: (f32, f32),
    pub toggle_pause: bool,
    pub create_room: bool,
    pub join_room: Option<String>,
    pub leave_room: bool,
}

/// True on the frame `current` goes down.
pub fn edge(current: bool, previous: &mut bool) -> bool {
    let pressed = current && !*previous;
    *previous = current;
    pressed
}

/// Room code being typed by the player.
#[derive(Debug, Clone, Default)]
pub struct CodeEntry {
    buffer: String,
    active: bool,
}

impl CodeEntry {
    pub fn begin(&mut self) {
        self.buffer.clear();
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn push(&mut self, c: char) {
        if self.active && c.is_ascii_alphanumeric() && self.buffer.len() < ROOM_CODE_LEN {
            self.buffer.push(c.to_ascii_uppercase());
        }
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn cancel(&mut self) {
        self.buffer.clear();
        self.active = false;
    }

    /// Ends entry and hands back whatever was typed.
    pub fn submit(&mut self) -> Option<String> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some(std::mem::take(&mut self.buffer))
    }
}

pub struct InputManager {
    code_entry: CodeEntry,
    pointer_locked: bool,

    // Previous frame key states for edge detection
    prev_space: bool,
    prev_escape: bool,
    prev_enter: bool,
    prev_backspace: bool,
    prev_key_c: bool,
    prev_key_j: bool,
    prev_key_l: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            code_entry: CodeEntry::default(),
            pointer_locked: false,
            prev_space: false,
            prev_escape: false,
            prev_enter: false,
            prev_backspace: false,
            prev_key_c: false,
            prev_key_j: false,
            prev_key_l: false,
        }
    }

    pub fn code_entry(&self) -> &CodeEntry {
        &self.code_entry
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    pub fn release_pointer(&mut self) {
        if self.pointer_locked {
            set_cursor_grab(false);
            show_mouse(true);
            self.pointer_locked = false;
        }
    }

    fn lock_pointer(&mut self) {
        set_cursor_grab(true);
        show_mouse(false);
        self.pointer_locked = true;
    }

    /// Samples this frame's input. While `paused` only menu keys are read.
    pub fn update(&mut self, paused: bool) -> FrameInput {
        let mut frame = FrameInput::default();

        let escape = edge(is_key_down(KeyCode::Escape), &mut self.prev_escape);
        let enter = edge(is_key_down(KeyCode::Enter), &mut self.prev_enter);
        let backspace = edge(is_key_down(KeyCode::Backspace), &mut self.prev_backspace);
        let key_c = edge(is_key_down(KeyCode::C), &mut self.prev_key_c);
        let key_j = edge(is_key_down(KeyCode::J), &mut self.prev_key_j);
        let key_l = edge(is_key_down(KeyCode::L), &mut self.prev_key_l);
        let space = edge(is_key_down(KeyCode::Space), &mut self.prev_space);

        if self.code_entry.is_active() {
            while let Some(c) = get_char_pressed() {
                self.code_entry.push(c);
            }
            if backspace {
                self.code_entry.backspace();
            }
            if enter {
                frame.join_room = self.code_entry.submit();
            }
            if escape {
                self.code_entry.cancel();
            }
            return frame;
        }

        // Drop characters typed outside code entry.
        while get_char_pressed().is_some() {}

        if escape {
            frame.toggle_pause = true;
            self.release_pointer();
        }

        if paused {
            frame.leave_room = key_l;
            return frame;
        }

        if key_c {
            frame.create_room = true;
        }
        if key_j {
            self.code_entry.begin();
            self.release_pointer();
            return frame;
        }

        if !self.pointer_locked && is_mouse_button_pressed(MouseButton::Left) {
            self.lock_pointer();
        }

        frame.movement = MoveInput {
            forward: is_key_down(KeyCode::W),
            back: is_key_down(KeyCode::S),
            left: is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::D),
            jump: space,
        };

        if self.pointer_locked {
            // Deltas come back normalized to -1..1 and inverted.
            let delta = mouse_delta_position();
            frame.look = (
                -delta.x * screen_width() / 2.0,
                -delta.y * screen_height() / 2.0,
            );
        }

        frame
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
