//! Wall-clock time that works on native and in the browser.

/// Seconds since the UNIX epoch, with sub-second precision. Zero if the clock is unavailable.
pub fn now_secs() -> f64 {
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0)
    }
    #[cfg(target_arch = "wasm32")]
    {
        // the performance clock is relative to page load
        web_sys::window()
            .and_then(|window| window.performance())
            .map(|perf| (perf.time_origin() + perf.now()) / 1000.0)
            .unwrap_or(0.0)
    }
}

/// Whole seconds since the UNIX epoch, as stored on history items.
pub fn unix_timestamp() -> u64 {
    now_secs() as u64
}
