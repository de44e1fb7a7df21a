use time::{format_description, UtcOffset};
use tracing_subscriber::{fmt, EnvFilter, FmtSubscriber};

pub const TRACE_ENV_VAR: &str = "TRACE";

// Sets up tracing. Goes to stderr, filtered by the TRACE env var, and is
// off unless it is set.
// Levels are: trace, debug, info, warn, error
//
// For example:
//
// All targets, info level:                     info
// Lot matching and gain entries, debug level:  ilcg::portfolio=debug
// Global at info, rate lookups as trace:       info,ilcg::fx=trace
//
// More generally: target[span{field=value}]=level
// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn setup_tracing() {
    let time_format =
        format_description::parse("[hour]:[minute]:[second].[subsecond digits:5]")
            .expect("Time format description is invalid");

    // The local offset cannot always be determined (eg. multi-threaded test
    // runners), in which case timestamps are UTC.
    let time_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = fmt::time::OffsetTime::new(time_offset, time_format);

    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_env(TRACE_ENV_VAR))
        .with_timer(timer)
        .finish();

    // Tests call this repeatedly. Only the first one sticks.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Appends a directive to the TRACE env var. Must be called before
/// setup_tracing.
pub fn enable_trace_env(trace_env: &str) {
    if let Ok(existing_env) = std::env::var(TRACE_ENV_VAR) {
        if !existing_env.is_empty() {
            std::env::set_var(TRACE_ENV_VAR, existing_env + "," + trace_env);
            return;
        }
    }
    std::env::set_var(TRACE_ENV_VAR, trace_env);
}
