#[cfg(test)]
mod tests {
    use std::{
        ffi::{CStr, CString},
        fs,
        mem::MaybeUninit,
    };

    use serial_test::serial;

    use crate::ffi::{
        KeyboardConfigOut, skiff_autostart_path, skiff_config_free, skiff_config_load,
        skiff_config_release, skiff_error_display_cmd, skiff_keyboard_config, skiff_registry_free,
        skiff_registry_new, skiff_str_free,
    };

    const DOC: &str = r#"#{
    border_width: 3,
    active_border_color: color(10, 20, 30, 255),
    inactive_border_color: color(0, 0, 0, 255),
    outputs: [output("DP-1", 1920, 0, 1.5)],
    button_bindings: [button_binding(mod_logo, btn_right, resize_window)],
    key_bindings: [key_binding(mod_logo, key_code(28), execute("foot"))],
    configure_keyboard: |vendor| #{ layout: "no" },
    error_display: |msg| `echo ${msg}`,
}"#;

    #[test]
    #[serial]
    fn load_query_free_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.rhai");
        fs::write(&path, DOC).unwrap();
        let c_path = CString::new(path.to_str().unwrap()).unwrap();

        let registry = skiff_registry_new();
        let mut snapshot = MaybeUninit::uninit();
        let diag = unsafe { skiff_config_load(registry, c_path.as_ptr(), snapshot.as_mut_ptr()) };
        assert!(diag.is_null());
        let mut snapshot = unsafe { snapshot.assume_init() };
        assert_eq!(snapshot.border_width, 3);
        assert_eq!(snapshot.number_of_key_bindings, 1);
        assert_eq!(snapshot.number_of_button_bindings, 1);
        assert_eq!(snapshot.number_of_outputs, 1);

        let mut keyboard = MaybeUninit::<KeyboardConfigOut>::uninit();
        let err =
            unsafe { skiff_keyboard_config(registry, snapshot.token, 0, keyboard.as_mut_ptr()) };
        assert!(err.is_null());
        let keyboard = unsafe { keyboard.assume_init() };
        assert_eq!(
            unsafe { CStr::from_ptr(keyboard.layout) }.to_str().unwrap(),
            "no"
        );
        unsafe { skiff_str_free(keyboard.layout) };

        let message = CString::new("disk full").unwrap();
        let command =
            unsafe { skiff_error_display_cmd(registry, snapshot.token, message.as_ptr()) };
        assert!(!command.is_null());
        assert_eq!(
            unsafe { CStr::from_ptr(command) }.to_str().unwrap(),
            "echo disk full"
        );
        unsafe { skiff_str_free(command) };

        unsafe { skiff_config_free(&mut snapshot) };
        unsafe { skiff_config_release(registry, snapshot.token) };
        unsafe { skiff_registry_free(registry) };
    }

    #[test]
    #[serial]
    fn failed_load_returns_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.rhai");
        fs::write(&path, "#{").unwrap();
        let c_path = CString::new(path.to_str().unwrap()).unwrap();

        let registry = skiff_registry_new();
        let mut snapshot = MaybeUninit::uninit();
        let diag = unsafe { skiff_config_load(registry, c_path.as_ptr(), snapshot.as_mut_ptr()) };
        assert!(!diag.is_null());
        let text = unsafe { CStr::from_ptr(diag) }.to_string_lossy().into_owned();
        assert!(text.contains("parse"));
        unsafe { skiff_str_free(diag) };
        unsafe { skiff_registry_free(registry) };
    }

    #[test]
    fn autostart_path_is_resolved() {
        let path = skiff_autostart_path();
        assert!(!path.is_null());
        let text = unsafe { CStr::from_ptr(path) }.to_string_lossy().into_owned();
        assert!(text.ends_with("autostart"));
        unsafe { skiff_str_free(path) };
    }
}
