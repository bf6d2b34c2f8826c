//! C ABI exports.
//!
//! Every export returns a heap-allocated, NUL-terminated UTF-8 string that the
//! caller owns and must release with [`htmlconverter_free_string`]. Failures are
//! reported in-band: a result starting with [`ERROR_PREFIX`] is a diagnostic,
//! anything else is the converted HTML.

use std::{
    any::Any,
    ffi::{CStr, CString},
    os::raw::c_char,
    panic::{self, AssertUnwindSafe},
};

use tracing::warn;

use crate::{
    application::render::{
        CodeRequest, ConvertError, ConvertService, RenderPipelineConfig, configure_render_service,
        converter,
    },
    config,
    infra::telemetry,
};

/// Marker that distinguishes a failure from converted output.
pub const ERROR_PREFIX: &str = "error: ";

/// Collapse a pipeline result into the in-band string convention.
pub fn encode_result(result: Result<String, ConvertError>) -> String {
    match result {
        Ok(html) => html,
        Err(err) => format!("{ERROR_PREFIX}{err}"),
    }
}

fn run_boundary<F>(operation: &'static str, convert: F) -> String
where
    F: FnOnce() -> Result<String, ConvertError>,
{
    let result = match panic::catch_unwind(AssertUnwindSafe(convert)) {
        Ok(result) => result,
        Err(payload) => Err(ConvertError::Panic {
            operation,
            message: panic_message(payload.as_ref()),
        }),
    };

    if let Err(err) = &result {
        warn!(
            target = "ffi",
            operation,
            kind = err.kind(),
            error = %err,
            "conversion failed"
        );
    }

    encode_result(result)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string valid for reads.
unsafe fn read_c_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    unsafe { CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}

fn into_c_string(text: String) -> *mut c_char {
    let text = if text.contains('\0') {
        text.replace('\0', "\u{FFFD}")
    } else {
        text
    };
    CString::new(text).unwrap_or_default().into_raw()
}

/// Highlight `source` as HTML. `lexer` names the language and may be empty or
/// null, in which case the language is detected from the content.
///
/// # Safety
///
/// Both pointers must be null or point to NUL-terminated strings that stay
/// valid for the duration of the call.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn convertCodeToHTML(
    source: *const c_char,
    lexer: *const c_char,
) -> *mut c_char {
    let source = unsafe { read_c_str(source) };
    let lexer = unsafe { read_c_str(lexer) };

    let output = run_boundary("code", || {
        let request = CodeRequest::new(source).with_lexer_hint(lexer);
        converter().convert_code(&request)
    });
    into_c_string(output)
}

/// Render a Markdown document, front matter removed.
///
/// # Safety
///
/// `source` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn convertMarkdownToHTML(source: *const c_char) -> *mut c_char {
    let source = unsafe { read_c_str(source) };
    into_c_string(run_boundary("markdown", || {
        converter().convert_markdown(&source)
    }))
}

/// Render a Jupyter notebook given as nbformat JSON.
///
/// # Safety
///
/// `source` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn convertNotebookToHTML(source: *const c_char) -> *mut c_char {
    let source = unsafe { read_c_str(source) };
    into_c_string(run_boundary("notebook", || {
        converter().convert_notebook(&source)
    }))
}

/// Stylesheet matching the classes emitted by the conversions.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn convertThemeToCSS() -> *mut c_char {
    into_c_string(run_boundary("theme", || converter().stylesheet()))
}

/// Release a string returned by any export. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a pointer previously returned by this library that has
/// not been freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn htmlconverter_free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: the pointer came from `CString::into_raw` in `into_c_string`.
    drop(unsafe { CString::from_raw(ptr) });
}

/// Load settings from configuration files and `HTMLCONVERTER__*` variables,
/// install the tracing subscriber and apply the configured theme. Call once,
/// before the first conversion. Returns an empty string on success.
#[unsafe(no_mangle)]
pub extern "C" fn htmlconverter_init() -> *mut c_char {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), String> {
        let settings = config::load_from_env().map_err(|err| err.to_string())?;
        telemetry::init(&settings.logging).map_err(|err| err.to_string())?;
        configure_render_service(RenderPipelineConfig::from(&settings.render))
            .map_err(|err| err.to_string())
    }));

    let output = match outcome {
        Ok(Ok(())) => String::new(),
        Ok(Err(message)) => format!("{ERROR_PREFIX}{message}"),
        Err(payload) => format!(
            "{ERROR_PREFIX}{}",
            ConvertError::Panic {
                operation: "init",
                message: panic_message(payload.as_ref()),
            }
        ),
    };
    into_c_string(output)
}
