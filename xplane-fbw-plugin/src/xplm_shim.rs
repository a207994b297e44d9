//! XPLM abstraction layer.
//!
//! All X-Plane SDK calls go through the `XplmApi` trait so that unit tests can
//! substitute `MockXplm` without a running simulator.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Opaque handle to a cached X-Plane dataref (pointer-sized).
pub type DataRefHandle = usize;

// ── DataRefValue (mock storage) ───────────────────────────────────────────────

/// Value stored in the mock shim for a single dataref.
#[derive(Debug, Clone, PartialEq)]
pub enum DataRefValue {
    Float(f32),
    Int(i32),
    FloatArray(Vec<f32>),
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Abstraction over the XPLM dataref and logging calls used by the plugin.
///
/// `Send + Sync` so the trait object can be shared with the global logger.
pub trait XplmApi: Send + Sync {
    fn find_dataref(&self, path: &str) -> Option<DataRefHandle>;
    fn get_float(&self, handle: DataRefHandle) -> f32;
    fn get_int(&self, handle: DataRefHandle) -> i32;
    /// Read up to `out.len()` floats starting at `offset`.
    fn get_float_array(&self, handle: DataRefHandle, offset: usize, out: &mut [f32]);
    fn set_float(&self, handle: DataRefHandle, value: f32);
    fn set_int(&self, handle: DataRefHandle, value: i32);
    fn log(&self, message: &str);
}

// ── MockXplm ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MockInner {
    datarefs: HashMap<String, DataRefValue>,
    /// Index is the handle; assigned on first lookup.
    handles: Vec<String>,
    log_messages: Vec<String>,
}

impl MockInner {
    fn path(&self, handle: DataRefHandle) -> String {
        self.handles.get(handle).cloned().unwrap_or_default()
    }

    fn value(&self, handle: DataRefHandle) -> Option<&DataRefValue> {
        self.datarefs.get(&self.path(handle))
    }

    fn write(&mut self, handle: DataRefHandle, value: DataRefValue) {
        let path = self.path(handle);
        self.datarefs.insert(path, value);
    }
}

/// Test implementation: an in-memory dataref table the plugin reads and writes.
#[derive(Default)]
pub struct MockXplm {
    inner: Mutex<MockInner>,
}

impl MockXplm {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap()
    }

    /// Set (or replace) a dataref value; handles stay valid across replacements.
    pub fn set_dataref(&self, path: &str, value: DataRefValue) {
        self.lock().datarefs.insert(path.to_string(), value);
    }

    /// Current stored value, including anything the plugin wrote.
    pub fn dataref(&self, path: &str) -> Option<DataRefValue> {
        self.lock().datarefs.get(path).cloned()
    }

    pub fn log_messages(&self) -> Vec<String> {
        self.lock().log_messages.clone()
    }
}

impl XplmApi for MockXplm {
    fn find_dataref(&self, path: &str) -> Option<DataRefHandle> {
        let mut g = self.lock();
        if !g.datarefs.contains_key(path) {
            return None;
        }
        if let Some(idx) = g.handles.iter().position(|p| p == path) {
            return Some(idx);
        }
        g.handles.push(path.to_string());
        Some(g.handles.len() - 1)
    }

    fn get_float(&self, handle: DataRefHandle) -> f32 {
        match self.lock().value(handle) {
            Some(DataRefValue::Float(v)) => *v,
            _ => 0.0,
        }
    }

    fn get_int(&self, handle: DataRefHandle) -> i32 {
        match self.lock().value(handle) {
            Some(DataRefValue::Int(v)) => *v,
            _ => 0,
        }
    }

    fn get_float_array(&self, handle: DataRefHandle, offset: usize, out: &mut [f32]) {
        if let Some(DataRefValue::FloatArray(arr)) = self.lock().value(handle) {
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = arr.get(offset + i).copied().unwrap_or(0.0);
            }
        }
    }

    fn set_float(&self, handle: DataRefHandle, value: f32) {
        self.lock().write(handle, DataRefValue::Float(value));
    }

    fn set_int(&self, handle: DataRefHandle, value: i32) {
        self.lock().write(handle, DataRefValue::Int(value));
    }

    fn log(&self, message: &str) {
        self.lock().log_messages.push(message.to_string());
    }
}

// ── RealXplm: production builds only ─────────────────────────────────────────

#[cfg(not(test))]
pub use real::RealXplm;

#[cfg(not(test))]
mod real {
    use super::{DataRefHandle, XplmApi};
    use std::ffi::CString;

    /// Production implementation wrapping the raw XPLM extern calls.
    pub struct RealXplm;

    impl XplmApi for RealXplm {
        fn find_dataref(&self, path: &str) -> Option<DataRefHandle> {
            let c = CString::new(path).ok()?;
            let h = unsafe { crate::xplm_sys::XPLMFindDataRef(c.as_ptr()) };
            if h.is_null() { None } else { Some(h as usize) }
        }

        fn get_float(&self, handle: DataRefHandle) -> f32 {
            unsafe { crate::xplm_sys::XPLMGetDataf(handle as _) }
        }

        fn get_int(&self, handle: DataRefHandle) -> i32 {
            unsafe { crate::xplm_sys::XPLMGetDatai(handle as _) }
        }

        fn get_float_array(&self, handle: DataRefHandle, offset: usize, out: &mut [f32]) {
            unsafe {
                crate::xplm_sys::XPLMGetDatavf(
                    handle as _,
                    out.as_mut_ptr(),
                    offset as i32,
                    out.len() as i32,
                );
            }
        }

        fn set_float(&self, handle: DataRefHandle, value: f32) {
            unsafe { crate::xplm_sys::XPLMSetDataf(handle as _, value) }
        }

        fn set_int(&self, handle: DataRefHandle, value: i32) {
            unsafe { crate::xplm_sys::XPLMSetDatai(handle as _, value) }
        }

        fn log(&self, message: &str) {
            if let Ok(c) = CString::new(message) {
                unsafe { crate::xplm_sys::XPLMDebugString(c.as_ptr()) }
            }
        }
    }
}
