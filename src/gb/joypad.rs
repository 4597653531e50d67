//! Joypad (§4.4): eight-button matrix with two selectable halves.

use crate::utils;

/// One of the eight physical buttons, named as the host supplies them (§6).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Button {
    A,
    B,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
}

/// A snapshot of which buttons are currently held, used by frontends that
/// prefer to hand the whole state over in one call instead of individual
/// press/release events.
#[derive(Copy, Clone, Default, Debug)]
pub struct JoypadInput {
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub select: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl JoypadInput {
    fn get(self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::Start => self.start,
            Button::Select => self.select,
            Button::Up => self.up,
            Button::Down => self.down,
            Button::Left => self.left,
            Button::Right => self.right,
        }
    }
}

/// Register at 0xFF00. Button state is tracked independently of the
/// selection latches; `read()` only decides which half is visible.
#[derive(Copy, Clone, Default, Debug)]
pub struct Joypad {
    a: bool,
    b: bool,
    start: bool,
    select: bool,
    up: bool,
    down: bool,
    left: bool,
    right: bool,

    /// Active-low selection bits as last written (bit 5 = action, bit 4 = direction).
    select_action: bool,
    select_direction: bool,
}

impl Joypad {
    /// Applies a whole snapshot at once, raising the interrupt for any
    /// button whose state transitions from released to pressed (§4.4).
    pub fn handle_input(&mut self, input: JoypadInput) -> bool {
        let mut irq = false;
        for button in [
            Button::A,
            Button::B,
            Button::Start,
            Button::Select,
            Button::Up,
            Button::Down,
            Button::Left,
            Button::Right,
        ] {
            irq |= self.set_button(button, input.get(button));
        }
        irq
    }

    /// Presses or releases a single button. Returns true if the Joypad
    /// interrupt should be raised (a false->true transition). Opposite
    /// direction pairs cannot both be held: a press is dropped while the
    /// opposite is held.
    pub fn set_button(&mut self, button: Button, pressed: bool) -> bool {
        if pressed && self.blocked_by_opposite(button) {
            return false;
        }
        let was_pressed = self.get(button);
        self.put(button, pressed);
        pressed && !was_pressed
    }

    fn blocked_by_opposite(&self, button: Button) -> bool {
        match button {
            Button::Up => self.down,
            Button::Down => self.up,
            Button::Left => self.right,
            Button::Right => self.left,
            _ => false,
        }
    }

    fn get(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::Start => self.start,
            Button::Select => self.select,
            Button::Up => self.up,
            Button::Down => self.down,
            Button::Left => self.left,
            Button::Right => self.right,
        }
    }

    fn put(&mut self, button: Button, value: bool) {
        match button {
            Button::A => self.a = value,
            Button::B => self.b = value,
            Button::Start => self.start = value,
            Button::Select => self.select = value,
            Button::Up => self.up = value,
            Button::Down => self.down = value,
            Button::Left => self.left = value,
            Button::Right => self.right = value,
        }
    }

    /// Writes the selection bits (bits 5-4 of 0xFF00). The lower nibble is
    /// read-only and cannot be written through this register.
    pub fn write_select(&mut self, value: u8) {
        // Active low: writing 0 selects that half.
        self.select_action = !utils::bit_at(value, 5);
        self.select_direction = !utils::bit_at(value, 4);
    }

    /// Assembles the value visible at 0xFF00.
    pub fn read(&self) -> u8 {
        let action_bits = utils::set_bit(0, 0, !self.a);
        let action_bits = utils::set_bit(action_bits, 1, !self.b);
        let action_bits = utils::set_bit(action_bits, 2, !self.select);
        let action_bits = utils::set_bit(action_bits, 3, !self.start);

        let direction_bits = utils::set_bit(0, 0, !self.right);
        let direction_bits = utils::set_bit(direction_bits, 1, !self.left);
        let direction_bits = utils::set_bit(direction_bits, 2, !self.up);
        let direction_bits = utils::set_bit(direction_bits, 3, !self.down);

        let lower = match (self.select_action, self.select_direction) {
            (true, true) => action_bits & direction_bits,
            (true, false) => action_bits,
            (false, true) => direction_bits,
            (false, false) => 0b1111,
        };

        let mut value = 0b1100_0000;
        value = utils::set_bit(value, 5, !self.select_action);
        value = utils::set_bit(value, 4, !self.select_direction);
        value | lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_all_released() {
        let joypad = Joypad::default();
        assert_eq!(joypad.read(), 0xFF);
    }

    #[test]
    fn test_select_direction_reports_pressed_buttons() {
        let mut joypad = Joypad::default();
        joypad.write_select(0b1110_1111); // select direction half
        joypad.set_button(Button::Right, true);
        assert_eq!(joypad.read() & 0x0F, 0b1110);
    }

    #[test]
    fn test_select_action_reports_pressed_buttons() {
        let mut joypad = Joypad::default();
        joypad.write_select(0b1101_1111); // select action half
        joypad.set_button(Button::A, true);
        assert_eq!(joypad.read() & 0x0F, 0b1110);
    }

    #[test]
    fn test_press_raises_interrupt_only_on_the_rising_edge() {
        let mut joypad = Joypad::default();
        assert!(joypad.set_button(Button::Start, true));
        assert!(!joypad.set_button(Button::Start, true));
        assert!(!joypad.set_button(Button::Start, false));
    }

    #[test]
    fn test_opposite_direction_press_is_dropped() {
        let mut joypad = Joypad::default();
        joypad.set_button(Button::Left, true);
        assert!(!joypad.set_button(Button::Right, true));

        joypad.write_select(0b1110_1111);
        assert_eq!(joypad.read() & 0b0001, 0b0001, "Right should read as released");
    }

    #[test]
    fn test_handle_input_snapshot_raises_only_on_new_press() {
        let mut joypad = Joypad::default();
        let pressed = JoypadInput {
            a: true,
            ..Default::default()
        };
        assert!(joypad.handle_input(pressed));
        assert!(!joypad.handle_input(pressed));
    }
}
