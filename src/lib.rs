pub mod ast;
pub mod error;
pub mod interpreter;
pub mod json;
pub mod parser;
pub mod sketch;
pub mod vec2;

use error::VexlError;
use sketch::Sketch;

pub use parser::{parse, ParseResult};

// ── Core API ───────────────────────────────────────────────────────

/// The result of a full script run: the rebuilt sketch plus the two
/// diagnostic channels, parse errors and evaluation errors.
pub struct RunResult {
    pub sketch: Sketch,
    pub parse_errors: Vec<VexlError>,
    pub eval_errors: Vec<VexlError>,
}

impl RunResult {
    /// Whether any diagnostics were produced, warnings included.
    pub fn has_errors(&self) -> bool {
        !self.parse_errors.is_empty() || !self.eval_errors.is_empty()
    }

    /// Both channels in order, parse errors first.
    pub fn all_errors(&self) -> impl Iterator<Item = &VexlError> {
        self.parse_errors.iter().chain(self.eval_errors.iter())
    }
}

/// Parse a script and evaluate it into a fresh sketch.
///
/// Every call rebuilds the environment and the dependency graph from
/// scratch; there is no carry-over between runs. This never panics — all
/// failures end up in the two error lists.
pub fn run_vexl(input: &str) -> RunResult {
    let parsed = parser::parse(input);
    let mut sketch = Sketch::new();
    let eval_errors = interpreter::execute(&parsed.instructions, &mut sketch);
    RunResult {
        sketch,
        parse_errors: parsed.errors,
        eval_errors,
    }
}

// ── WASM FFI ────────────────────────────────────────────────────────

/// Allocate `len` bytes in WASM memory, returning a pointer.
/// The caller must free the returned pointer with `dealloc(ptr, len)`.
#[no_mangle]
pub extern "C" fn alloc(len: usize) -> *mut u8 {
    let layout = std::alloc::Layout::from_size_align(len, 1).unwrap();
    unsafe { std::alloc::alloc(layout) }
}

/// Free a buffer previously returned by `alloc` or by any of the
/// `wasm_*` functions. For null-terminated strings returned by those
/// functions, pass `strlen(ptr) + 1` as `len`.
#[no_mangle]
pub unsafe extern "C" fn dealloc(ptr: *mut u8, len: usize) {
    let layout = std::alloc::Layout::from_size_align(len, 1).unwrap();
    unsafe { std::alloc::dealloc(ptr, layout) };
}

// ── Session-based WASM FFI ──────────────────────────────────────────
//
// The rendering/interaction layer drives the runtime through sessions: it
// re-runs the script whenever the text changes, drags interactive vectors
// between runs, and reads the environment back as JSON for drawing.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

struct Session {
    sketch: Sketch,
}

// WASM is single-threaded, so thread_local is just a convenient safe wrapper.
thread_local! {
    static SESSIONS: RefCell<HashMap<u32, Session>> = RefCell::new(HashMap::new());
    static NEXT_SESSION_ID: Cell<u32> = const { Cell::new(1) };
}

fn with_sessions<R>(f: impl FnOnce(&mut HashMap<u32, Session>) -> R) -> R {
    SESSIONS.with(|s| f(&mut s.borrow_mut()))
}

fn next_id() -> u32 {
    NEXT_SESSION_ID.with(|c| {
        let id = c.get();
        c.set(id + 1);
        id
    })
}

/// Create a new session holding an empty sketch. Returns a session ID.
#[no_mangle]
pub extern "C" fn wasm_session_new() -> u32 {
    let id = next_id();
    with_sessions(|s| {
        s.insert(
            id,
            Session {
                sketch: Sketch::new(),
            },
        )
    });
    id
}

/// Run a script, replacing the session's sketch with the freshly built
/// one. Returns a pointer to a null-terminated JSON array of diagnostics
/// (parse errors first, then evaluation errors). An unknown session id is
/// a no-op and returns `[]`.
#[no_mangle]
pub unsafe extern "C" fn wasm_session_run(
    id: u32,
    src_ptr: *const u8,
    src_len: usize,
) -> *const u8 {
    if !with_sessions(|s| s.contains_key(&id)) {
        return string_to_c_ptr("[]".to_string());
    }
    let input = unsafe {
        let slice = std::slice::from_raw_parts(src_ptr, src_len);
        std::str::from_utf8_unchecked(slice)
    };
    let result = run_vexl(input);
    let errors: Vec<VexlError> = result.all_errors().cloned().collect();
    with_sessions(|s| {
        if let Some(session) = s.get_mut(&id) {
            session.sketch = result.sketch;
        }
    });
    string_to_c_ptr(json::errors_to_json(&errors))
}

/// Drag entry point: set a named vector's components in place and
/// propagate recompute to its reference dependents. Returns 1 when the
/// name resolved to a vector, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn wasm_session_drag(
    id: u32,
    name_ptr: *const u8,
    name_len: usize,
    x: f64,
    y: f64,
) -> u32 {
    let name = unsafe {
        let slice = std::slice::from_raw_parts(name_ptr, name_len);
        std::str::from_utf8_unchecked(slice)
    };
    with_sessions(|s| match s.get_mut(&id) {
        Some(session) => u32::from(session.sketch.set_vector(name, x, y)),
        None => 0,
    })
}

/// Serialize the session's current environment to compact JSON.
/// Returns a pointer to a null-terminated JSON string.
#[no_mangle]
pub extern "C" fn wasm_session_get_value(id: u32) -> *const u8 {
    with_sessions(|s| match s.get(&id) {
        Some(session) => string_to_c_ptr(json::to_json(&session.sketch)),
        None => string_to_c_ptr("{}".to_string()),
    })
}

/// Reset the session's sketch to empty.
#[no_mangle]
pub extern "C" fn wasm_session_reset(id: u32) {
    with_sessions(|s| {
        if let Some(session) = s.get_mut(&id) {
            session.sketch = Sketch::new();
        }
    });
}

/// Free a session, dropping its sketch.
#[no_mangle]
pub extern "C" fn wasm_session_free(id: u32) {
    with_sessions(|s| s.remove(&id));
}

/// Convert a String to a null-terminated C pointer with exact allocation size.
/// The allocation size is exactly `s.len() + 1` bytes, so the caller can
/// free with `dealloc(ptr, strlen(ptr) + 1)`.
fn string_to_c_ptr(s: String) -> *const u8 {
    let mut bytes = s.into_bytes();
    bytes.push(0);
    // into_boxed_slice guarantees allocation size == bytes.len()
    let boxed = bytes.into_boxed_slice();
    Box::into_raw(boxed) as *mut u8
}

#[cfg(test)]
mod tests;
