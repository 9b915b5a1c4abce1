//! Conversion of the evaluated value tree into the boundary snapshot.

use std::ptr;

use crate::{
    raw::{RawAction, RawButtonAction, RawButtonBinding, RawKeyBinding, RawOutput},
    registry::HandleRegistry,
    script::EvaluatedDocument,
    snapshot::{
        Action, ButtonAction, ButtonBinding, ConfigSnapshot, KeyBinding, OutputConfig, c_string,
        vec_into_raw,
    },
};

/// Translate an evaluated document into a snapshot, registering its
/// callbacks under a fresh token.
///
/// Scalars, outputs, and binding fields are copied verbatim. Infallible
/// for validated input; an action record with no active alternative
/// aborts, since the flattening pass guarantees exactly one.
pub(crate) fn translate(
    document: EvaluatedDocument,
    registry: &mut HandleRegistry,
) -> ConfigSnapshot {
    let EvaluatedDocument {
        raw,
        keyboard,
        error_display,
    } = document;

    let key_bindings: Vec<KeyBinding> = raw.key_bindings.iter().map(key_binding).collect();
    let button_bindings: Vec<ButtonBinding> =
        raw.button_bindings.iter().map(button_binding).collect();
    let outputs: Vec<OutputConfig> = raw.outputs.iter().map(output).collect();

    let token = registry.insert(keyboard, error_display);

    let (key_bindings, number_of_key_bindings) = vec_into_raw(key_bindings);
    let (button_bindings, number_of_button_bindings) = vec_into_raw(button_bindings);
    let (outputs, number_of_outputs) = vec_into_raw(outputs);

    ConfigSnapshot {
        token,
        border_width: raw.border_width,
        active_border_color: raw.active_border_color,
        inactive_border_color: raw.inactive_border_color,
        key_bindings,
        number_of_key_bindings,
        button_bindings,
        number_of_button_bindings,
        outputs,
        number_of_outputs,
    }
}

fn output(config: &RawOutput) -> OutputConfig {
    OutputConfig {
        name: c_string(&config.name),
        x: config.x,
        y: config.y,
        scale: config.scale,
    }
}

fn key_binding(binding: &RawKeyBinding) -> KeyBinding {
    KeyBinding {
        action: select_action(&binding.action),
        mods: binding.mods,
        code: binding.key.code,
        sym: binding
            .key
            .sym
            .as_deref()
            .map_or(ptr::null_mut(), c_string),
    }
}

fn button_binding(binding: &RawButtonBinding) -> ButtonBinding {
    ButtonBinding {
        action: select_button_action(&binding.action),
        mods: binding.mods,
        button: binding.button,
    }
}

/// Pick the single active alternative of a flattened action record.
///
/// First match wins, in this fixed order. A zero `move_to_output`,
/// `focus_output`, or `switch_vt` means that alternative is absent, so
/// output index 0 cannot be addressed from a binding.
pub(crate) fn select_action(record: &RawAction) -> Action {
    if let Some(cmd) = &record.execute {
        Action::Execute(c_string(cmd))
    } else if let Some(workspace) = &record.move_to {
        Action::MoveTo(c_string(workspace))
    } else if record.move_to_output != 0 {
        Action::MoveToOutput(record.move_to_output)
    } else if let Some(workspace) = &record.view {
        Action::View(c_string(workspace))
    } else if record.close {
        Action::Close
    } else if record.config_reload {
        Action::ConfigReload
    } else if record.focus_down {
        Action::FocusDown
    } else if record.focus_up {
        Action::FocusUp
    } else if record.focus_primary {
        Action::FocusPrimary
    } else if record.focus_output != 0 {
        Action::FocusOutput(record.focus_output)
    } else if record.next_layout {
        Action::NextLayout
    } else if record.sink {
        Action::Sink
    } else if record.swap_down {
        Action::SwapDown
    } else if record.swap_up {
        Action::SwapUp
    } else if record.swap_primary {
        Action::SwapPrimary
    } else if record.swap_workspaces {
        Action::SwapWorkspaces
    } else if record.switch_vt != 0 {
        Action::SwitchVt(record.switch_vt)
    } else {
        panic!("key binding action record has no active alternative")
    }
}

/// Pick the single active alternative of a flattened button action.
pub(crate) fn select_button_action(record: &RawButtonAction) -> ButtonAction {
    if record.move_window {
        ButtonAction::Move
    } else if record.resize {
        ButtonAction::Resize
    } else {
        panic!("button binding action record has no active alternative")
    }
}
