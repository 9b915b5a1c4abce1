#[cfg(test)]
mod tests {
    use std::{
        ffi::{CStr, c_char},
        slice,
        sync::atomic::Ordering,
    };

    use serial_test::serial;

    use crate::{
        Action, ButtonAction, Color, Error, HandleRegistry,
        loader::load_from_str,
        raw::{RawAction, RawButtonAction, RawConfig, RawOutput},
        snapshot::{release_snapshot, tally},
        translate::{select_action, select_button_action},
    };

    fn text(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    #[test]
    #[serial]
    fn execute_wins_over_every_other_alternative() {
        let record = RawAction {
            execute: Some("foot".to_string()),
            close: true,
            swap_up: true,
            switch_vt: 4,
            ..Default::default()
        };
        let mut action = select_action(&record);
        let Action::Execute(cmd) = &action else {
            panic!("expected execute, got {:?}", action);
        };
        assert_eq!(text(*cmd), "foot");
        unsafe { action.release() };
    }

    #[test]
    #[serial]
    fn priority_order_is_fixed() {
        type Set = fn(&mut RawAction);
        type Expect = fn(&Action) -> bool;
        let alternatives: Vec<(&str, Set, Expect)> = vec![
            (
                "execute",
                |r| r.execute = Some("x".to_string()),
                |a| matches!(a, Action::Execute(_)),
            ),
            (
                "move_to",
                |r| r.move_to = Some("x".to_string()),
                |a| matches!(a, Action::MoveTo(_)),
            ),
            (
                "move_to_output",
                |r| r.move_to_output = 2,
                |a| matches!(a, Action::MoveToOutput(2)),
            ),
            (
                "view",
                |r| r.view = Some("x".to_string()),
                |a| matches!(a, Action::View(_)),
            ),
            ("close", |r| r.close = true, |a| matches!(a, Action::Close)),
            (
                "config_reload",
                |r| r.config_reload = true,
                |a| matches!(a, Action::ConfigReload),
            ),
            (
                "focus_down",
                |r| r.focus_down = true,
                |a| matches!(a, Action::FocusDown),
            ),
            (
                "focus_up",
                |r| r.focus_up = true,
                |a| matches!(a, Action::FocusUp),
            ),
            (
                "focus_primary",
                |r| r.focus_primary = true,
                |a| matches!(a, Action::FocusPrimary),
            ),
            (
                "focus_output",
                |r| r.focus_output = 1,
                |a| matches!(a, Action::FocusOutput(1)),
            ),
            (
                "next_layout",
                |r| r.next_layout = true,
                |a| matches!(a, Action::NextLayout),
            ),
            ("sink", |r| r.sink = true, |a| matches!(a, Action::Sink)),
            (
                "swap_down",
                |r| r.swap_down = true,
                |a| matches!(a, Action::SwapDown),
            ),
            (
                "swap_up",
                |r| r.swap_up = true,
                |a| matches!(a, Action::SwapUp),
            ),
            (
                "swap_primary",
                |r| r.swap_primary = true,
                |a| matches!(a, Action::SwapPrimary),
            ),
            (
                "swap_workspaces",
                |r| r.swap_workspaces = true,
                |a| matches!(a, Action::SwapWorkspaces),
            ),
            (
                "switch_vt",
                |r| r.switch_vt = 7,
                |a| matches!(a, Action::SwitchVt(7)),
            ),
        ];

        // Every suffix of the precedence list, with all its alternatives
        // active, must resolve to the suffix's first entry.
        for start in 0..alternatives.len() {
            let mut record = RawAction::default();
            for (_, set, _) in &alternatives[start..] {
                set(&mut record);
            }
            let (name, _, expected) = &alternatives[start];
            let mut selected = select_action(&record);
            assert!(expected(&selected), "alternative {} should win", name);
            unsafe { selected.release() };
        }
    }

    #[test]
    #[serial]
    fn zero_output_index_falls_through() {
        let record = RawAction {
            move_to_output: 0,
            view: Some("mail".to_string()),
            ..Default::default()
        };
        let mut action = select_action(&record);
        assert!(matches!(action, Action::View(_)));
        unsafe { action.release() };

        let record = RawAction {
            focus_output: 0,
            next_layout: true,
            ..Default::default()
        };
        assert!(matches!(select_action(&record), Action::NextLayout));
    }

    #[test]
    fn switch_vt_is_the_final_fallback() {
        let record = RawAction {
            switch_vt: 3,
            ..Default::default()
        };
        assert!(matches!(select_action(&record), Action::SwitchVt(3)));
    }

    #[test]
    #[should_panic(expected = "no active alternative")]
    fn empty_action_record_aborts() {
        select_action(&RawAction::default());
    }

    #[test]
    fn button_actions_resolve_first_match() {
        let move_only = RawButtonAction {
            move_window: true,
            resize: false,
        };
        assert_eq!(select_button_action(&move_only), ButtonAction::Move);

        let resize_only = RawButtonAction {
            move_window: false,
            resize: true,
        };
        assert_eq!(select_button_action(&resize_only), ButtonAction::Resize);

        let both = RawButtonAction {
            move_window: true,
            resize: true,
        };
        assert_eq!(select_button_action(&both), ButtonAction::Move);
    }

    #[test]
    #[should_panic(expected = "no active alternative")]
    fn empty_button_record_aborts() {
        select_button_action(&RawButtonAction::default());
    }

    #[test]
    #[serial]
    fn example_document_translates_verbatim() {
        let source = r#"#{
    border_width: 2,
    active_border_color: color(255, 0, 0, 255),
    inactive_border_color: color(60, 60, 60, 255),
    outputs: [output("eDP-1", 0, 0, 1.0)],
    button_bindings: [],
    key_bindings: [key_binding(64, key_code(36), close)],
    configure_keyboard: |vendor| #{ layout: "us" },
    error_display: |msg| msg,
}"#;
        let mut registry = HandleRegistry::new();
        let mut snapshot = load_from_str(source, None, &mut registry).unwrap();

        assert_eq!(snapshot.border_width, 2);
        assert_eq!(
            snapshot.active_border_color,
            Color {
                r: 255,
                g: 0,
                b: 0,
                a: 255
            }
        );

        let outputs =
            unsafe { slice::from_raw_parts(snapshot.outputs, snapshot.number_of_outputs) };
        assert_eq!(outputs.len(), 1);
        assert_eq!(text(outputs[0].name), "eDP-1");
        assert_eq!(outputs[0].x, 0);
        assert_eq!(outputs[0].y, 0);
        assert_eq!(outputs[0].scale, 1.0);

        let bindings = unsafe {
            slice::from_raw_parts(snapshot.key_bindings, snapshot.number_of_key_bindings)
        };
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].mods, 64);
        assert_eq!(bindings[0].code, 36);
        assert!(bindings[0].sym.is_null());
        assert!(matches!(bindings[0].action, Action::Close));

        let token = snapshot.token;
        unsafe { release_snapshot(&mut snapshot) };
        registry.release(token);
    }

    #[test]
    #[serial]
    fn output_index_two_resolves_to_move_to_output() {
        let source = r#"#{
    border_width: 0,
    active_border_color: color(0, 0, 0, 255),
    inactive_border_color: color(0, 0, 0, 255),
    outputs: [],
    button_bindings: [],
    key_bindings: [key_binding(mod_logo, key_code(9), move_to_output(2))],
    configure_keyboard: |vendor| #{ layout: "us" },
    error_display: |msg| msg,
}"#;
        let mut registry = HandleRegistry::new();
        let mut snapshot = load_from_str(source, None, &mut registry).unwrap();
        let bindings = unsafe {
            slice::from_raw_parts(snapshot.key_bindings, snapshot.number_of_key_bindings)
        };
        assert!(matches!(bindings[0].action, Action::MoveToOutput(2)));
        let token = snapshot.token;
        unsafe { release_snapshot(&mut snapshot) };
        registry.release(token);
    }

    #[test]
    #[serial]
    fn malformed_document_leaves_the_registry_unchanged() {
        let mut registry = HandleRegistry::new();
        assert!(load_from_str("#{", None, &mut registry).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    #[serial]
    fn release_balances_every_allocation() {
        let strings_before = tally::STRINGS.load(Ordering::Relaxed);
        let slices_before = tally::SLICES.load(Ordering::Relaxed);

        let source = r#"#{
    border_width: 1,
    active_border_color: color(255, 0, 0, 255),
    inactive_border_color: color(60, 60, 60, 255),
    outputs: [output("eDP-1", 0, 0, 1.0), output("HDMI-A-1", 1920, 0, 2.0)],
    button_bindings: [button_binding(mod_logo, btn_left, move_window)],
    key_bindings: [
        key_binding(mod_logo, key_sym("Return"), execute("alacritty")),
        key_binding(mod_logo | mod_shift, key_code(45), move_to("mail")),
        key_binding(mod_logo, key_code(23), close),
    ],
    configure_keyboard: |vendor| #{ layout: "us" },
    error_display: |msg| msg,
}"#;
        let mut registry = HandleRegistry::new();
        let mut snapshot = load_from_str(source, None, &mut registry).unwrap();

        // 2 output names + 1 key symbol + 2 action texts; 3 arrays.
        assert_eq!(tally::STRINGS.load(Ordering::Relaxed), strings_before + 5);
        assert_eq!(tally::SLICES.load(Ordering::Relaxed), slices_before + 3);

        let token = snapshot.token;
        unsafe { release_snapshot(&mut snapshot) };
        registry.release(token);

        assert_eq!(tally::STRINGS.load(Ordering::Relaxed), strings_before);
        assert_eq!(tally::SLICES.load(Ordering::Relaxed), slices_before);
    }

    #[test]
    fn interior_nul_is_rejected() {
        let config = RawConfig {
            border_width: 0,
            active_border_color: Color {
                r: 0,
                g: 0,
                b: 0,
                a: 0,
            },
            inactive_border_color: Color {
                r: 0,
                g: 0,
                b: 0,
                a: 0,
            },
            outputs: vec![RawOutput {
                name: "bad\0name".to_string(),
                x: 0,
                y: 0,
                scale: 1.0,
            }],
            button_bindings: Vec::new(),
            key_bindings: Vec::new(),
        };
        let err = config.validate(None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.pretty().contains("NUL"));
    }
}
