//! Call-site attribution
//!
//! The emitting thread walks its own stack once per log call and records the
//! first frame that does not belong to the logging API. The walk is bounded:
//! a fixed number of leading frames is skipped outright, then at most
//! `lookback` frames are inspected before giving up with
//! [`CallSite::unknown`].

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Frames discarded before any name is inspected (the unwinder entry).
pub const CALLER_SKIP: usize = 1;

/// Frames inspected after the skip before giving up.
pub const CALLER_LOOKBACK: usize = 16;

const UNKNOWN: &str = "unknown";

/// Location of the code that emitted a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl CallSite {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    /// Sentinel used when no external frame is found
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, 0, UNKNOWN)
    }

    pub fn is_unknown(&self) -> bool {
        self.file == UNKNOWN && self.line == 0 && self.function == UNKNOWN
    }

    /// Last path component of `file`
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.file)
    }
}

/// Source of call-site information for new records
pub trait CallSiteResolver: Send + Sync {
    fn resolve(&self) -> CallSite;
}

/// Resolver that always reports the same location
#[derive(Debug, Clone)]
pub struct FixedCallSite(pub CallSite);

impl CallSiteResolver for FixedCallSite {
    fn resolve(&self) -> CallSite {
        self.0.clone()
    }
}

/// Qualified names of every logging-API frame that can sit between the
/// caller and the stack walk.
static INTERNAL_FRAMES: Lazy<HashSet<String>> = Lazy::new(|| {
    let krate = env!("CARGO_CRATE_NAME");
    let mut frames = HashSet::new();

    for method in [
        "log", "log_fmt", "emit", "debug", "info", "warn", "error", "exception", "fatal",
    ] {
        frames.insert(format!("{krate}::core::logger::Logger::{method}"));
        frames.insert(format!("{krate}::root::{method}"));
    }
    frames.insert(format!("{krate}::core::call_site::BacktraceResolver::capture"));
    frames.insert(format!(
        "<{krate}::core::call_site::BacktraceResolver as {krate}::core::call_site::CallSiteResolver>::resolve"
    ));
    frames
});

/// Strip the trailing generic arguments and closure markers from a
/// demangled symbol so it can be compared against [`INTERNAL_FRAMES`].
fn normalize(name: &str) -> &str {
    let mut name = name;
    while let Some(idx) = name.rfind("::{") {
        let tail = &name[idx + 3..];
        if tail.starts_with("{closure") || tail.starts_with("closure") {
            name = &name[..idx];
        } else {
            break;
        }
    }
    if name.starts_with('<') {
        return name;
    }
    match name.find("::<") {
        Some(idx) => &name[..idx],
        None => name,
    }
}

fn is_internal_frame(name: &str) -> bool {
    let normalized = normalize(name);
    normalized.starts_with("backtrace::")
        || normalized.starts_with("_Unwind")
        || INTERNAL_FRAMES.contains(normalized)
}

/// Stack-walking resolver backed by the `backtrace` crate
#[derive(Debug, Clone)]
pub struct BacktraceResolver {
    skip: usize,
    lookback: usize,
}

impl BacktraceResolver {
    pub fn new() -> Self {
        Self::with_window(CALLER_SKIP, CALLER_LOOKBACK)
    }

    pub fn with_window(skip: usize, lookback: usize) -> Self {
        Self { skip, lookback }
    }

    #[inline(never)]
    fn capture(&self) -> CallSite {
        let mut found: Option<CallSite> = None;
        let mut index = 0usize;

        backtrace::trace(|frame| {
            index += 1;
            if index <= self.skip {
                return true;
            }
            if index > self.skip + self.lookback {
                return false;
            }

            // Inlined frames resolve to several symbols, innermost first.
            backtrace::resolve_frame(frame, |symbol| {
                if found.is_some() {
                    return;
                }
                let Some(name) = symbol.name() else {
                    return;
                };
                let qualified = format!("{:#}", name);
                if is_internal_frame(&qualified) {
                    return;
                }
                let file = symbol
                    .filename()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| UNKNOWN.to_string());
                found = Some(CallSite {
                    file,
                    line: symbol.lineno().unwrap_or(0),
                    function: qualified,
                });
            });

            found.is_none()
        });

        found.unwrap_or_else(CallSite::unknown)
    }
}

impl Default for BacktraceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CallSiteResolver for BacktraceResolver {
    fn resolve(&self) -> CallSite {
        self.capture()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_generics_and_closures() {
        assert_eq!(normalize("app::main::{{closure}}"), "app::main");
        assert_eq!(normalize("app::main::{closure#0}"), "app::main");
        assert_eq!(
            normalize("my_crate::core::logger::Logger::log::<&str>"),
            "my_crate::core::logger::Logger::log"
        );
        assert_eq!(
            normalize("<a::B as a::C>::resolve"),
            "<a::B as a::C>::resolve"
        );
    }

    #[test]
    fn test_internal_frames() {
        let krate = env!("CARGO_CRATE_NAME");
        assert!(is_internal_frame(&format!("{krate}::core::logger::Logger::info")));
        assert!(is_internal_frame(&format!("{krate}::core::logger::Logger::log::<alloc::string::String>")));
        assert!(is_internal_frame("backtrace::backtrace::trace"));
        assert!(!is_internal_frame("server::handle_request"));
        assert!(!is_internal_frame(&format!("{krate}::core::logger::tests::emit_from_test")));
    }

    #[test]
    fn test_exhausted_window_yields_unknown() {
        let resolver = BacktraceResolver::with_window(1, 0);
        assert!(resolver.resolve().is_unknown());
    }

    #[test]
    fn test_fixed_call_site() {
        let site = CallSite::new("/src/app/main.rs", 42, "app::main");
        let resolver = FixedCallSite(site.clone());
        assert_eq!(resolver.resolve(), site);
        assert_eq!(site.file_name(), "main.rs");
    }
}
