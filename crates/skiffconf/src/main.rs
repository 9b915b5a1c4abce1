//! Validate and inspect skiff configuration documents.
//!
//! Loads a document the same way the compositor does, then prints `OK`, a
//! JSON summary (`--dump`), or the diagnostic the compositor would show.
//! The callback queries can be exercised with `--keyboard` and
//! `--error-message`.

use std::{
    ffi::{CStr, c_char},
    path::PathBuf,
    process, slice,
};

use clap::Parser;
use serde::Serialize;
use skiff_config::{
    Action, ConfigSnapshot, LoadedConfig, SharedRegistry, resolve_config_path,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "skiffconf", about = "Validate a skiff configuration document", version)]
struct Cli {
    /// Path to the configuration document (defaults to the user config location)
    path: Option<PathBuf>,

    /// Dump a JSON summary of the translated configuration
    #[arg(long)]
    dump: bool,

    /// Query the keyboard layout for a device vendor id
    #[arg(long, value_name = "VENDOR")]
    keyboard: Option<u32>,

    /// Render the error-display command for a message
    #[arg(long, value_name = "MESSAGE")]
    error_message: Option<String>,
}

#[derive(Serialize)]
struct Summary {
    border_width: u32,
    active_border_color: [u8; 4],
    inactive_border_color: [u8; 4],
    outputs: Vec<OutputSummary>,
    key_bindings: Vec<String>,
    button_bindings: usize,
}

#[derive(Serialize)]
struct OutputSummary {
    name: String,
    x: i32,
    y: i32,
    scale: f32,
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let registry = SharedRegistry::default();
    let resolved = resolve_config_path(cli.path.as_deref());
    let config = match LoadedConfig::load(Some(&resolved), &registry) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.pretty());
            process::exit(1);
        }
    };

    if let Some(vendor) = cli.keyboard {
        match config.keyboard_config(vendor) {
            Ok(keyboard) => println!("{}", keyboard.layout),
            Err(err) => {
                eprintln!("{}", err.pretty());
                process::exit(1);
            }
        }
        return;
    }

    if let Some(message) = &cli.error_message {
        match config.error_display_command(message) {
            Ok(command) => println!("{}", command),
            Err(err) => {
                eprintln!("{}", err.pretty());
                process::exit(1);
            }
        }
        return;
    }

    if cli.dump {
        let summary = summarize(config.snapshot());
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("failed to serialize summary: {}", err);
                process::exit(1);
            }
        }
    } else {
        println!("OK");
    }
}

/// Read the C-layout snapshot back into printable form.
fn summarize(snapshot: &ConfigSnapshot) -> Summary {
    let key_bindings =
        unsafe { slice::from_raw_parts(snapshot.key_bindings, snapshot.number_of_key_bindings) };
    let outputs = unsafe { slice::from_raw_parts(snapshot.outputs, snapshot.number_of_outputs) };

    Summary {
        border_width: snapshot.border_width,
        active_border_color: rgba(&snapshot.active_border_color),
        inactive_border_color: rgba(&snapshot.inactive_border_color),
        outputs: outputs
            .iter()
            .map(|output| OutputSummary {
                name: c_text(output.name),
                x: output.x,
                y: output.y,
                scale: output.scale,
            })
            .collect(),
        key_bindings: key_bindings
            .iter()
            .map(|binding| {
                let key = if binding.sym.is_null() {
                    format!("code {}", binding.code)
                } else {
                    c_text(binding.sym)
                };
                format!(
                    "mods={} {} -> {}",
                    binding.mods,
                    key,
                    describe_action(&binding.action)
                )
            })
            .collect(),
        button_bindings: snapshot.number_of_button_bindings,
    }
}

fn rgba(color: &skiff_config::Color) -> [u8; 4] {
    [color.r, color.g, color.b, color.a]
}

fn describe_action(action: &Action) -> String {
    match action {
        Action::Execute(cmd) => format!("execute {}", c_text(*cmd)),
        Action::MoveTo(workspace) => format!("move-to {}", c_text(*workspace)),
        Action::MoveToOutput(output) => format!("move-to-output {}", output),
        Action::View(workspace) => format!("view {}", c_text(*workspace)),
        Action::Close => "close".to_string(),
        Action::ConfigReload => "config-reload".to_string(),
        Action::FocusDown => "focus-down".to_string(),
        Action::FocusUp => "focus-up".to_string(),
        Action::FocusPrimary => "focus-primary".to_string(),
        Action::FocusOutput(output) => format!("focus-output {}", output),
        Action::NextLayout => "next-layout".to_string(),
        Action::Sink => "sink".to_string(),
        Action::SwapDown => "swap-down".to_string(),
        Action::SwapUp => "swap-up".to_string(),
        Action::SwapPrimary => "swap-primary".to_string(),
        Action::SwapWorkspaces => "swap-workspaces".to_string(),
        Action::SwitchVt(vt) => format!("switch-vt {}", vt),
    }
}

fn c_text(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}
