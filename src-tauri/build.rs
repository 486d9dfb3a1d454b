//! Build script for the Snipping Tool Tauri app.
//!
//! Only the Tauri codegen step is needed: the panel and overlay are plain
//! static pages under `ui/`, and screen capture goes through `xcap`.

fn main() {
    tauri_build::build();
}
