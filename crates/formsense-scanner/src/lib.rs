/// The FormSense page runtime.
/// Injected into browser contexts by bridges; exposes `window.FormSense.process`.
pub const RUNTIME_JS: &str = include_str!("runtime.js");
