//! X-Plane 12 normal-law fly-by-wire plugin.
//!
//! Compiles to a `.xpl` shared library loaded by X-Plane. The `XPLM*` entry
//! points below are only present in non-test builds; unit tests use `MockXplm`
//! and call `FbwPlugin` methods directly.

pub mod logger;
pub mod plugin;
pub mod xplm_shim;

// Raw X-Plane SDK extern declarations, production builds only.
// Symbols are resolved at runtime by X-Plane when the .xpl is loaded.
#[cfg(not(test))]
pub(crate) mod xplm_sys {
    use std::ffi::{c_char, c_float, c_int, c_void};

    pub type XPLMDataRef = *mut c_void;

    extern "C" {
        pub fn XPLMFindDataRef(inDataRefName: *const c_char) -> XPLMDataRef;
        pub fn XPLMGetDataf(inDataRef: XPLMDataRef) -> c_float;
        pub fn XPLMGetDatai(inDataRef: XPLMDataRef) -> c_int;
        pub fn XPLMGetDatavf(
            inDataRef:  XPLMDataRef,
            outValues:  *mut c_float,
            inOffset:   c_int,
            inMax:      c_int,
        ) -> c_int;
        pub fn XPLMSetDataf(inDataRef: XPLMDataRef, inValue: c_float);
        pub fn XPLMSetDatai(inDataRef: XPLMDataRef, inValue: c_int);
        pub fn XPLMDebugString(inString: *const c_char);
        pub fn XPLMRegisterFlightLoopCallback(
            inFlightLoop: Option<
                unsafe extern "C" fn(f32, f32, c_int, *mut c_void) -> f32,
            >,
            inInterval: c_float,
            inRefcon:   *mut c_void,
        );
        pub fn XPLMUnregisterFlightLoopCallback(
            inFlightLoop: Option<
                unsafe extern "C" fn(f32, f32, c_int, *mut c_void) -> f32,
            >,
            inRefcon: *mut c_void,
        );
    }
}

// ── XPLM entry points (production only) ──────────────────────────────────────

#[cfg(not(test))]
mod entry {
    use super::logger::XplmLogger;
    use super::plugin::{load_config, FbwPlugin, CONFIG_PATH, EVERY_FRAME};
    use super::xplm_shim::{RealXplm, XplmApi};
    use log::{error, info, LevelFilter};
    use std::ffi::{c_int, c_void};
    use std::path::Path;
    use std::sync::{Arc, Mutex, OnceLock};

    static PLUGIN: OnceLock<Mutex<FbwPlugin>> = OnceLock::new();

    #[no_mangle]
    pub unsafe extern "C" fn XPluginStart(
        out_name: *mut std::ffi::c_char,
        out_sig:  *mut std::ffi::c_char,
        out_desc: *mut std::ffi::c_char,
    ) -> c_int {
        write_cstr(out_name, "Normal Law FBW");
        write_cstr(out_sig,  "fbw.normal-law");
        write_cstr(out_desc, "Normal-law pitch and roll augmentation with envelope protection");

        let xplm: Arc<dyn XplmApi> = Arc::new(RealXplm);
        if XplmLogger::new(xplm.clone(), LevelFilter::Info).install().is_err() {
            xplm.log("FBW: logger already installed\n");
        }

        let config = load_config(Path::new(CONFIG_PATH));
        if PLUGIN.set(Mutex::new(FbwPlugin::new(xplm, &config))).is_err() {
            error!("XPluginStart: plugin already initialized");
            return 0;
        }

        info!("XPluginStart OK");
        1
    }

    #[no_mangle]
    pub unsafe extern "C" fn XPluginStop() {
        info!("XPluginStop");
    }

    #[no_mangle]
    pub unsafe extern "C" fn XPluginEnable() -> c_int {
        let Some(plugin) = PLUGIN.get() else {
            error!("XPluginEnable: plugin not initialized");
            return 0;
        };
        let Ok(mut p) = plugin.lock() else {
            error!("XPluginEnable: plugin state poisoned");
            return 0;
        };
        p.find_handles();
        p.engage();

        super::xplm_sys::XPLMRegisterFlightLoopCallback(
            Some(flight_loop_cb),
            EVERY_FRAME,
            std::ptr::null_mut(),
        );
        info!("XPluginEnable OK");
        1
    }

    #[no_mangle]
    pub unsafe extern "C" fn XPluginDisable() {
        super::xplm_sys::XPLMUnregisterFlightLoopCallback(
            Some(flight_loop_cb),
            std::ptr::null_mut(),
        );
        if let Some(Ok(mut p)) = PLUGIN.get().map(|plugin| plugin.lock()) {
            p.release();
        }
        info!("XPluginDisable");
    }

    #[no_mangle]
    pub unsafe extern "C" fn XPluginReceiveMessage(
        _from:  c_int,
        _msg:   c_int,
        _param: *mut c_void,
    ) {
    }

    unsafe extern "C" fn flight_loop_cb(
        since_last_call:   f32,
        _since_last_floop: f32,
        _counter:          std::ffi::c_int,
        _refcon:           *mut c_void,
    ) -> f32 {
        if let Some(plugin) = PLUGIN.get() {
            if let Ok(mut p) = plugin.lock() {
                return p.flight_loop_tick(since_last_call);
            }
        }
        EVERY_FRAME
    }

    unsafe fn write_cstr(dst: *mut std::ffi::c_char, s: &str) {
        let bytes = s.as_bytes();
        let len = bytes.len().min(255);
        std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const std::ffi::c_char, dst, len);
        *dst.add(len) = 0;
    }
}

// ── Re-exports used by integration tests ─────────────────────────────────────

pub use plugin::{load_config, FbwPlugin, CONFIG_PATH, EVERY_FRAME};
pub use xplm_shim::{DataRefValue, MockXplm, XplmApi};
