//! Request timing macros
//!
//! Debug builds log how long each catalog request took. Release builds
//! evaluate the request and nothing else.

/// Evaluate `$request` and log its duration at debug level under `$label`.
///
/// ```ignore
/// let payload = timed_request!("Course list", source.get_courses(None).await);
/// ```
#[macro_export]
macro_rules! timed_request {
    ($label:expr, $request:expr) => {{
        #[cfg(debug_assertions)]
        let started = ::std::time::Instant::now();
        let outcome = $request;
        #[cfg(debug_assertions)]
        log::debug!("{} request took {:?}", $label, started.elapsed());
        outcome
    }};
}

/// Wire-level trace line, compiled out of release builds
#[macro_export]
macro_rules! wire_trace {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            log::trace!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_timed_request_yields_the_request_value() {
        let attempts = std::cell::Cell::new(0);
        let value: Result<u32, String> = timed_request!("Counter", {
            attempts.set(attempts.get() + 1);
            Ok(7)
        });

        assert_eq!(value, Ok(7));
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn test_timed_request_wraps_awaited_calls() {
        let label = String::from("Async");
        let value = timed_request!(label, async { "done" }.await);
        assert_eq!(value, "done");
        wire_trace!("{} finished with {}", label, value);
    }
}
