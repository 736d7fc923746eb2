pub mod runner;

pub use runner::SyncRunner;

use std::cell::RefCell;

use framesync::SyncConfig;
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<SyncRunner>> = const { RefCell::new(None) };
}

fn with_runner<R>(f: impl FnOnce(&mut SyncRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Wall clock in microseconds from `performance.now()`, if available.
fn performance_now_usec() -> Option<u64> {
    let performance = web_sys::window()?.performance()?;
    Some((performance.now() * 1000.0) as u64)
}

/// Create the runner and start its clock.
///
/// `config_json` may be empty for defaults. A malformed config is logged and
/// replaced by the defaults.
#[wasm_bindgen]
pub fn sync_init(config_json: &str, start_ticks_usec: f64) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let config = if config_json.trim().is_empty() {
        SyncConfig::default()
    } else {
        SyncConfig::from_json(config_json).unwrap_or_else(|err| {
            log::error!("framesync: invalid config, using defaults: {}", err);
            SyncConfig::default()
        })
    };

    let mut runner = SyncRunner::new(config);
    runner.init(start_ticks_usec as u64);
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });

    log::info!("framesync: initialized");
}

#[wasm_bindgen]
pub fn sync_set_ticks_usec(ticks_usec: f64) {
    with_runner(|r| r.set_ticks_usec(ticks_usec as u64));
}

/// Sample `performance.now()` as the current frame time.
/// Returns false if no clock is available.
#[wasm_bindgen]
pub fn sync_sample_clock() -> bool {
    match performance_now_usec() {
        Some(usec) => with_runner(|r| r.set_ticks_usec(usec)).is_some(),
        None => false,
    }
}

#[wasm_bindgen]
pub fn sync_set_fixed_fps(fps: i32) {
    with_runner(|r| r.set_fixed_fps(fps));
}

#[wasm_bindgen]
pub fn sync_set_jitter_fix(jitter_fix: f32) {
    with_runner(|r| r.set_jitter_fix(jitter_fix));
}

/// Advance one frame. Returns the number of fixed steps to run.
#[wasm_bindgen]
pub fn sync_tick() -> u32 {
    with_runner(|r| r.tick().steps).unwrap_or(0)
}

// ---- Data accessors ----

/// Latest timing as `[idle_step, steps, interpolation_fraction, time_deficit]`.
#[wasm_bindgen]
pub fn sync_timing() -> js_sys::Float32Array {
    with_runner(|r| js_sys::Float32Array::from(r.record().as_floats()))
        .unwrap_or_else(|| js_sys::Float32Array::new_with_length(0))
}

#[wasm_bindgen]
pub fn sync_timing_ptr() -> *const f32 {
    with_runner(|r| r.record_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn sync_idle_step() -> f32 {
    with_runner(|r| r.record().idle_step).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn sync_interpolation_fraction() -> f32 {
    with_runner(|r| r.record().interpolation_fraction).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn sync_jitter_variance() -> f32 {
    with_runner(|r| r.jitter_variance()).unwrap_or(0.0)
}
