use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("polaris.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("polaris.client.request_errors");
pub(crate) static CLIENT_AUTH_RETRIES: Counter = Counter::new("polaris.client.auth_retries");

pub(crate) static SESSION_VERIFIES: Counter = Counter::new("polaris.session.verifies");
pub(crate) static SESSION_REFRESHES: Counter = Counter::new("polaris.session.refreshes");
pub(crate) static SESSION_REFRESHES_COALESCED: Counter =
    Counter::new("polaris.session.refreshes_coalesced");
pub(crate) static SESSION_REFRESH_FAILURES: Counter =
    Counter::new("polaris.session.refresh_failures");
pub(crate) static SESSION_TEARDOWNS: Counter = Counter::new("polaris.session.teardowns");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("polaris.stream.events");
pub(crate) static STREAM_TOKENS: Counter = Counter::new("polaris.stream.tokens");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("polaris.stream.errors");
pub(crate) static STREAM_TTFT: Moments = Moments::new("polaris.stream.ttft_seconds");

pub(crate) static TURN_DURATION: Moments = Moments::new("polaris.chat.turn_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_AUTH_RETRIES);

    collector.register_counter(&SESSION_VERIFIES);
    collector.register_counter(&SESSION_REFRESHES);
    collector.register_counter(&SESSION_REFRESHES_COALESCED);
    collector.register_counter(&SESSION_REFRESH_FAILURES);
    collector.register_counter(&SESSION_TEARDOWNS);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_TOKENS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_moments(&STREAM_TTFT);

    collector.register_moments(&TURN_DURATION);
}
