//! FFI bindings for Synheart Vitals
//!
//! This module provides C-compatible functions for calling Vitals from a host
//! application. Rate functions write their result through an out-pointer and
//! return `0` on success or `-1` on failure; call `vitals_last_error` for the
//! message. Returned strings must be freed with `vitals_free_string`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::VitalsError;
use crate::pipeline::VitalsProcessor;
use crate::record::VitalsRecord;
use crate::types::{Frame, SampledFrameSequence};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Write a rate through `out` and translate the result into a status code
unsafe fn write_rate(result: Result<u32, VitalsError>, out: *mut u32) -> i32 {
    match result {
        Ok(rate) => {
            *out = rate;
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Split a contiguous RGBA buffer into equally sized frames
unsafe fn frames_from_rgba(
    rgba: *const u8,
    len: usize,
    frame_count: usize,
    width: u32,
    height: u32,
) -> Result<SampledFrameSequence, VitalsError> {
    if rgba.is_null() {
        return Err(VitalsError::MalformedInput(
            "Invalid frame buffer pointer".to_string(),
        ));
    }
    let frame_len = (width as usize) * (height as usize) * 4;
    if frame_count == 0 || frame_len == 0 {
        return Err(VitalsError::EmptyFrameSequence);
    }
    if frame_len.checked_mul(frame_count) != Some(len) {
        return Err(VitalsError::MalformedInput(format!(
            "frame buffer holds {len} bytes, expected {frame_count} frames of {width}x{height} RGBA"
        )));
    }

    let bytes = std::slice::from_raw_parts(rgba, len);
    let frames = bytes
        .chunks_exact(frame_len)
        .map(|chunk| Frame::from_rgba(width, height, chunk))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SampledFrameSequence::new(frames))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Estimate respiratory rate from a flat accelerometer trace.
///
/// # Safety
/// - `csv` must be a valid null-terminated C string.
/// - `out_rate` must be a valid pointer to a `u32`.
/// - Returns 0 on success, -1 on error; call `vitals_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn vitals_respiratory_rate(csv: *const c_char, out_rate: *mut u32) -> i32 {
    clear_last_error();
    vitals_processor_respiratory_rate(&VitalsProcessorHandle::default(), csv, out_rate)
}

/// Estimate heart rate from already-sampled RGBA frames.
///
/// `rgba` holds `frame_count` frames of `width * height * 4` bytes each, back to back.
///
/// # Safety
/// - `rgba` must point to `len` readable bytes.
/// - `out_rate` must be a valid pointer to a `u32`.
/// - Returns 0 on success, -1 on error; call `vitals_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn vitals_heart_rate_rgba(
    rgba: *const u8,
    len: usize,
    frame_count: usize,
    width: u32,
    height: u32,
    out_rate: *mut u32,
) -> i32 {
    clear_last_error();
    vitals_processor_heart_rate_rgba(
        &VitalsProcessorHandle::default(),
        rgba,
        len,
        frame_count,
        width,
        height,
        out_rate,
    )
}

/// Build a vitals record JSON string.
///
/// `symptoms_json` is an object of symptom name to rating 0-5, e.g.
/// `{"Fever": 3, "cough": 1}`, or NULL for no ratings.
///
/// # Safety
/// - `symptoms_json` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_record_json(
    heart_rate: u32,
    respiratory_rate: u32,
    symptoms_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let mut record = VitalsRecord::new(heart_rate, respiratory_rate);

    if !symptoms_json.is_null() {
        let json_str = match cstr_to_string(symptoms_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid symptoms string pointer");
                return ptr::null_mut();
            }
        };
        let ratings: BTreeMap<String, u8> = match serde_json::from_str(&json_str) {
            Ok(r) => r,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        };
        for (name, rating) in ratings {
            if let Err(e) = record.rate_by_name(&name, rating) {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    }

    match record.to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Configured Processor API
// ============================================================================

/// Opaque handle to a VitalsProcessor
#[derive(Default)]
pub struct VitalsProcessorHandle {
    processor: VitalsProcessor,
}

/// Create a processor from a JSON calibration, or the default calibration when `config_json` is NULL.
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Returns a pointer that must be freed with `vitals_processor_free`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_new(
    config_json: *const c_char,
) -> *mut VitalsProcessorHandle {
    clear_last_error();

    if config_json.is_null() {
        return Box::into_raw(Box::default());
    }

    let json_str = match cstr_to_string(config_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        }
    };

    match VitalsProcessor::from_config_json(&json_str) {
        Ok(processor) => Box::into_raw(Box::new(VitalsProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a VitalsProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitals_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_free(processor: *mut VitalsProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Estimate respiratory rate with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitals_processor_new`.
/// - `csv` must be a valid null-terminated C string.
/// - `out_rate` must be a valid pointer to a `u32`.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_respiratory_rate(
    processor: *const VitalsProcessorHandle,
    csv: *const c_char,
    out_rate: *mut u32,
) -> i32 {
    clear_last_error();

    if processor.is_null() || out_rate.is_null() {
        set_last_error("Invalid processor or output pointer");
        return -1;
    }

    let csv_str = match cstr_to_string(csv) {
        Some(s) => s,
        None => {
            set_last_error("Invalid CSV string pointer");
            return -1;
        }
    };

    let handle = &*processor;
    write_rate(handle.processor.respiratory_rate(&csv_str), out_rate)
}

/// Estimate heart rate from already-sampled RGBA frames with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitals_processor_new`.
/// - `rgba` must point to `len` readable bytes.
/// - `out_rate` must be a valid pointer to a `u32`.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_heart_rate_rgba(
    processor: *const VitalsProcessorHandle,
    rgba: *const u8,
    len: usize,
    frame_count: usize,
    width: u32,
    height: u32,
    out_rate: *mut u32,
) -> i32 {
    clear_last_error();

    if processor.is_null() || out_rate.is_null() {
        set_last_error("Invalid processor or output pointer");
        return -1;
    }

    let handle = &*processor;
    let result = frames_from_rgba(rgba, len, frame_count, width, height)
        .and_then(|sequence| handle.processor.heart_rate_from_frames(&sequence));
    write_rate(result, out_rate)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Vitals functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Vitals function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitals_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Vitals function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vitals_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Vitals library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vitals_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breathing_csv() -> CString {
        let mut lines = vec!["0.0".to_string()];
        for i in 1..451 {
            lines.push(if i % 2 == 0 { "1.0" } else { "1.1" }.to_string());
        }
        for _axis in 0..2 {
            lines.push("0.0".to_string());
            lines.extend(std::iter::repeat("0.5".to_string()).take(450));
        }
        CString::new(lines.join("\n")).unwrap()
    }

    unsafe fn last_error() -> String {
        let error = vitals_last_error();
        assert!(!error.is_null());
        CStr::from_ptr(error).to_str().unwrap().to_string()
    }

    #[test]
    fn test_ffi_respiratory_rate() {
        let csv = breathing_csv();
        let mut rate = 0u32;
        unsafe {
            assert_eq!(vitals_respiratory_rate(csv.as_ptr(), &mut rate), 0);
            assert!(vitals_last_error().is_null());
        }
        assert_eq!(rate, 293);
    }

    #[test]
    fn test_ffi_respiratory_rate_error() {
        let csv = CString::new("0.0\n1.0\n").unwrap();
        let mut rate = 77u32;
        unsafe {
            assert_eq!(vitals_respiratory_rate(csv.as_ptr(), &mut rate), -1);
            assert!(last_error().contains("Insufficient samples"));
        }
        assert_eq!(rate, 77);
    }

    #[test]
    fn test_ffi_heart_rate_rgba() {
        let (width, height, frames) = (100u32, 100u32, 50usize);
        let buffer = vec![0u8; (width * height * 4) as usize * frames];
        let mut rate = 99u32;
        unsafe {
            let status =
                vitals_heart_rate_rgba(buffer.as_ptr(), buffer.len(), frames, width, height, &mut rate);
            assert_eq!(status, 0);
        }
        assert_eq!(rate, 0);
    }

    #[test]
    fn test_ffi_heart_rate_bad_buffer() {
        let buffer = vec![0u8; 100];
        let mut rate = 0u32;
        unsafe {
            let status = vitals_heart_rate_rgba(buffer.as_ptr(), buffer.len(), 2, 10, 10, &mut rate);
            assert_eq!(status, -1);
            assert!(last_error().contains("Malformed input"));
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let config = CString::new(r#"{"respiratory": {"window_start": 1, "window_end": 10}}"#)
                .unwrap();
            let processor = vitals_processor_new(config.as_ptr());
            assert!(!processor.is_null());

            let csv = breathing_csv();
            let mut rate = 0u32;
            assert_eq!(
                vitals_processor_respiratory_rate(processor, csv.as_ptr(), &mut rate),
                0
            );
            // 10 transitions: 10 / 45 * 30
            assert_eq!(rate, 6);

            vitals_processor_free(processor);

            let default_processor = vitals_processor_new(ptr::null());
            assert!(!default_processor.is_null());
            vitals_processor_free(default_processor);
        }
    }

    #[test]
    fn test_ffi_processor_rejects_bad_config() {
        unsafe {
            let config = CString::new(r#"{"heart": {"frame_stride": 0}}"#).unwrap();
            let processor = vitals_processor_new(config.as_ptr());
            assert!(processor.is_null());
            assert!(last_error().contains("frame_stride"));
        }
    }

    #[test]
    fn test_ffi_record_json() {
        let symptoms = CString::new(r#"{"Fever": 3, "shortness_of_breath": 1}"#).unwrap();
        unsafe {
            let result = vitals_record_json(72, 16, symptoms.as_ptr());
            assert!(!result.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(value["heart_rate"], 72);
            assert_eq!(value["symptoms"]["fever"], 3);
            assert_eq!(value["symptoms"]["shortness_of_breath"], 1);

            vitals_free_string(result);

            let bad = CString::new(r#"{"Fever": 8}"#).unwrap();
            assert!(vitals_record_json(72, 16, bad.as_ptr()).is_null());
            assert!(last_error().contains("exceeds"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = vitals_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
