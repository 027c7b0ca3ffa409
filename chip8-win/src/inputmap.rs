use std::{collections::VecDeque, iter::Iterator, path::Path};

use chip8::KeyCode;
use serde::Deserialize;
use smol_str::SmolStr;
use winit::event::{ElementState, VirtualKeyCode};

use crate::error::AppError;

/// Key map used when none is given on the command line.
const DEFAULT_KEYMAP: &str = include_str!("keymap.yaml");

/// Input mapper
///
/// Maps user input events to either Chip8 keycodes (suitable to be used in the VM),
/// or application specific named actions.
///
/// - *Chip8 Keycode*: These are the 16 keys of the old COSMAC VIP computer.
///   Stored in 8-bit integers and suitable to be passed to the virtual machine.
/// - *Named Action*: These are application specific input events that are
///   identified by a readable string.
#[derive(Debug)]
pub struct InputMap {
    actions: Box<[InputInfo]>,
    /// Mapping of host keyboard keys to application actions, by index.
    keys: Box<[(VirtualKeyCode, usize)]>,
    /// Buffer of collected events, as they happen.
    events: VecDeque<InputEvent>,
    /// Current state of the key. Whether it is pressed down.
    state: Vec<InputState>,
}

#[derive(Debug)]
struct InputInfo {
    chip8: Option<KeyCode>,
    action: Option<SmolStr>,
}

/// Mapping to make optional fields infallible.
impl From<InputDef> for InputInfo {
    fn from(def: InputDef) -> Self {
        Self {
            chip8: def.chip8,
            action: def.action,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputDef {
    chip8: Option<KeyCode>,
    action: Option<SmolStr>,
    keyboard_keys: Option<Vec<VirtualKeyCode>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub state: ElementState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Action(SmolStr),
    Chip8(u8),
}

impl InputKind {
    pub fn as_chip8(&self) -> Option<KeyCode> {
        match self {
            Self::Chip8(key_id) => KeyCode::try_from(*key_id).ok(),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct InputState {
    event: InputKind,
    pressed: bool,
}

impl InputMap {
    pub fn from_file(filepath: impl AsRef<Path>) -> Result<Self, AppError> {
        let file = std::fs::File::open(filepath.as_ref())?;
        let defs: Vec<InputDef> = serde_yaml::from_reader(file)?;
        Ok(Self::from_defs(defs))
    }

    pub fn from_yaml(source: &str) -> Result<Self, AppError> {
        let defs: Vec<InputDef> = serde_yaml::from_str(source)?;
        Ok(Self::from_defs(defs))
    }

    /// The built-in QWERTY layout, with Escape to exit.
    pub fn default_keymap() -> Result<Self, AppError> {
        Self::from_yaml(DEFAULT_KEYMAP)
    }

    fn from_defs(defs: Vec<InputDef>) -> Self {
        log::debug!("loaded input definitions: {:#?}", defs);

        let keys = Self::build_keys(&defs);
        let actions = defs.into_iter().map(InputInfo::from).collect();

        InputMap {
            actions,
            keys,
            events: VecDeque::new(),
            state: Vec::new(),
        }
    }

    /// Build a mapping of [`VirtualKeyCode`]s to indices into the given action definition mapping.
    fn build_keys(defs: &[InputDef]) -> Box<[(VirtualKeyCode, usize)]> {
        defs.iter()
            // definitions will be mapped by their index
            .enumerate()
            // lift keycodes out of the definitions
            .filter_map(|(index, def)| def.keyboard_keys.as_ref().map(|keys| (index, keys)))
            // flatten borrowed keycodes into one iterator of copied keycodes
            .flat_map(|(index, keys)| keys.iter().copied().map(move |keycode| (keycode, index)))
            .collect::<Vec<(VirtualKeyCode, usize)>>()
            .into_boxed_slice()
    }

    /// Given a user input keycode, map it to either a Chip8 key, or a named action.
    pub fn map_key(&self, key: VirtualKeyCode) -> Option<InputKind> {
        self.keys
            .iter()
            .find(|(keycode, _)| *keycode == key)
            .map(|(_, index)| *index)
            .and_then(|index| self.actions.get(index))
            .and_then(|input_def| {
                if let Some(key_code) = input_def.chip8 {
                    Some(InputKind::Chip8(key_code.as_u8()))
                } else {
                    input_def
                        .action
                        .as_ref()
                        .map(|action_name| InputKind::Action(action_name.clone()))
                }
            })
    }

    /// Push key event into the input state.
    pub fn push_key(&mut self, keycode: VirtualKeyCode, state: ElementState) {
        // Convert `winit` key to our input framework
        match self.map_key(keycode) {
            Some(kind) => {
                // Stream of events in order
                self.events.push_back(InputEvent {
                    kind: kind.clone(),
                    state,
                });

                let pressed = state == ElementState::Pressed;

                // Map of state flags that can be checked by code
                match self.state.iter_mut().find(|el| el.event == kind) {
                    Some(existing) => existing.pressed = pressed,
                    None => {
                        // Insert new state
                        self.state.push(InputState {
                            event: kind,
                            pressed,
                        })
                    }
                }
            }
            None => {
                log::trace!("no input mapping for {keycode:?}");
            }
        }
    }

    pub fn is_action_pressed(&self, action: impl AsRef<str>) -> bool {
        let query = action.as_ref().trim();
        self.state
            .iter()
            .find(|state| match state.event {
                InputKind::Action(ref name) => name == query,
                _ => false,
            })
            .map(|state| state.pressed)
            .unwrap_or(false)
    }

    /// Take the Chip8 key transitions collected since the last call, in the order they happened.
    ///
    /// Action events are discarded.
    pub fn drain_chip8(&mut self) -> impl Iterator<Item = (KeyCode, bool)> + '_ {
        self.events.drain(..).filter_map(|ev| {
            ev.kind
                .as_chip8()
                .map(|keycode| (keycode, ev.state == ElementState::Pressed))
        })
    }

    /// Forget state of released keys.
    pub fn clear_state(&mut self) {
        self.state.retain(|state| state.pressed);
    }
}
