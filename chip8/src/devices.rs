//! Keyboard input state.
use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        match key_id {
            0 => Ok(Self::Key0),
            1 => Ok(Self::Key1),
            2 => Ok(Self::Key2),
            3 => Ok(Self::Key3),
            4 => Ok(Self::Key4),
            5 => Ok(Self::Key5),
            6 => Ok(Self::Key6),
            7 => Ok(Self::Key7),
            8 => Ok(Self::Key8),
            9 => Ok(Self::Key9),
            10 => Ok(Self::KeyA),
            11 => Ok(Self::KeyB),
            12 => Ok(Self::KeyC),
            13 => Ok(Self::KeyD),
            14 => Ok(Self::KeyE),
            15 => Ok(Self::KeyF),
            _ => Err(InvalidKeyCode),
        }
    }
}

#[derive(Debug)]
pub struct InvalidKeyCode;

impl std::error::Error for InvalidKeyCode {}

impl std::fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "keycode must be in range 0 <= keycode < 16")
    }
}

/// State of the 16-key hex keypad, and the wait-for-key latch.
#[derive(Debug, Default, Clone)]
pub struct Keypad {
    /// Pressed is a 1 bit, released is a 0 bit.
    state: u16,
    /// Register waiting to receive the next pressed key, set by `Fx0A`.
    wait: Option<u8>,
}

impl Keypad {
    pub fn new() -> Self {
        Default::default()
    }

    /// Update the state of a key.
    ///
    /// Returns `true` when the key went from released to pressed.
    pub fn set(&mut self, key: KeyCode, pressed: bool) -> bool {
        let was_pressed = self.is_pressed(key.as_u8());
        if pressed {
            self.state |= 1 << key.as_u8();
        } else {
            self.state &= !(1 << key.as_u8());
        }
        pressed && !was_pressed
    }

    /// Key ids outside of the keypad are never pressed.
    #[inline]
    pub fn is_pressed(&self, key_id: u8) -> bool {
        key_id < KEY_COUNT && self.state & (1 << key_id) != 0
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any(&self) -> bool {
        self.state != 0
    }

    /// Iterate the ids of all keys that are currently down.
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        (0..KEY_COUNT).filter(|k| self.is_pressed(*k))
    }

    /// Release all keys. The wait latch is left as it is.
    pub fn clear(&mut self) {
        self.state = 0;
    }

    /// Latch the keypad so the CPU blocks until the next key press.
    pub fn begin_wait(&mut self, vx: u8) {
        self.wait = Some(vx & 0xF);
    }

    /// Register targeted by an active wait, if any.
    #[inline(always)]
    pub fn waiting(&self) -> Option<u8> {
        self.wait
    }

    /// Release the latch with a key press, returning the target register.
    pub fn resolve(&mut self) -> Option<u8> {
        self.wait.take()
    }

    /// Clear key state and latch.
    pub fn reset(&mut self) {
        self.state = 0;
        self.wait = None;
    }
}

#[cfg(feature = "serde")]
mod de {
    use std::fmt::Display;

    use serde::de::{Deserialize, Error, Expected, Unexpected, Visitor};

    use super::*;

    impl Expected for InvalidKeyCode {
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            <Self as Display>::fmt(self, f)
        }
    }

    impl<'de> Deserialize<'de> for KeyCode {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            // YAML integer type
            deserializer.deserialize_i64(KeyCodeVisitor)
        }
    }

    struct KeyCodeVisitor;

    impl<'de> Visitor<'de> for KeyCodeVisitor {
        type Value = KeyCode;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "an integer between 0 and 15")
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            u8::try_from(v)
                .ok()
                .and_then(|key_id| KeyCode::try_from(key_id).ok())
                .ok_or_else(|| E::invalid_value(Unexpected::Signed(v), &InvalidKeyCode))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            u8::try_from(v)
                .ok()
                .and_then(|key_id| KeyCode::try_from(key_id).ok())
                .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &InvalidKeyCode))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut keys = Keypad::default();

        keys.set(KeyCode::Key0, true);
        assert_eq!(keys.state, 0b00000000_00000001);
        assert!(keys.is_pressed(0));
        assert!(!keys.is_pressed(1));
        assert!(!keys.is_pressed(7));

        keys.set(KeyCode::Key7, true);
        assert_eq!(keys.state, 0b00000000_10000001);
        assert!(keys.is_pressed(0));
        assert!(keys.is_pressed(7));

        keys.set(KeyCode::Key0, false);
        assert_eq!(keys.state, 0b00000000_10000000);
        assert!(!keys.is_pressed(0));
        assert!(keys.is_pressed(7));

        keys.set(KeyCode::KeyF, true);
        assert_eq!(keys.state, 0b10000000_10000000);
        assert!(keys.is_pressed(15));
        assert_eq!(keys.pressed().collect::<Vec<_>>(), vec![7, 15]);
    }

    #[test]
    fn test_out_of_range_key() {
        let mut keys = Keypad::default();
        keys.set(KeyCode::KeyF, true);
        assert!(!keys.is_pressed(16));
        assert!(!keys.is_pressed(0xFF));
    }

    #[test]
    fn test_rising_edge() {
        let mut keys = Keypad::default();
        assert!(keys.set(KeyCode::Key5, true));
        // Held down, or repeated by the OS.
        assert!(!keys.set(KeyCode::Key5, true));
        assert!(!keys.set(KeyCode::Key5, false));
        assert!(keys.set(KeyCode::Key5, true));
    }

    #[test]
    fn test_wait_latch() {
        let mut keys = Keypad::default();
        assert_eq!(keys.waiting(), None);
        keys.begin_wait(0x3);
        assert_eq!(keys.waiting(), Some(0x3));
        assert_eq!(keys.resolve(), Some(0x3));
        assert_eq!(keys.waiting(), None);
        assert_eq!(keys.resolve(), None);
    }

    #[test]
    fn test_keycode_conversion() {
        for key_id in 0..KEY_COUNT {
            let keycode = KeyCode::try_from(key_id).unwrap();
            assert_eq!(u8::from(keycode), key_id);
        }
        assert!(KeyCode::try_from(16).is_err());
        assert_eq!(KeyCode::KeyA.to_string(), "ka");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_keycode_deserialize() {
        let keys: Vec<KeyCode> = serde_yaml::from_str("[0, 12, 15]").unwrap();
        assert_eq!(keys, vec![KeyCode::Key0, KeyCode::KeyC, KeyCode::KeyF]);
        assert!(serde_yaml::from_str::<KeyCode>("16").is_err());
        assert!(serde_yaml::from_str::<KeyCode>("-1").is_err());
    }
}
