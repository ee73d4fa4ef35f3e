use super::presets::CameraPreset;

/// What a global key press asks the application to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    ToggleAutoRotate,
    SwitchView(CameraPreset),
    TogglePerformance,
}

/// Map a `KeyboardEvent.code` (layout independent) to an action.
#[inline]
pub fn action_for_key(code: &str, ctrl: bool) -> Option<KeyAction> {
    match code {
        "KeyP" if ctrl => Some(KeyAction::TogglePerformance),
        "Space" => Some(KeyAction::ToggleAutoRotate),
        "KeyD" => Some(KeyAction::SwitchView(CameraPreset::Defaulting)),
        "KeyV" => Some(KeyAction::SwitchView(CameraPreset::Vision)),
        "KeyT" => Some(KeyAction::SwitchView(CameraPreset::Tunes)),
        "KeyW" => Some(KeyAction::SwitchView(CameraPreset::Words)),
        "KeyA" => Some(KeyAction::SwitchView(CameraPreset::Ambience)),
        _ => None,
    }
}

/// One-line help text listing the shortcuts above.
pub const SHORTCUT_HELP: &str =
    "Space: rotate • D/V/T/W/A: camera views • Ctrl+P: performance stats";
