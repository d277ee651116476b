use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("parley.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("parley.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("parley.client.request_duration_seconds");

pub(crate) static SESSION_TURNS: Counter = Counter::new("parley.session.turns");
pub(crate) static SESSION_TURN_ERRORS: Counter = Counter::new("parley.session.turn_errors");
pub(crate) static SESSION_SUMMARIES: Counter = Counter::new("parley.session.summaries");
pub(crate) static SESSION_SAVES: Counter = Counter::new("parley.session.saves");
pub(crate) static SESSION_LOADS: Counter = Counter::new("parley.session.loads");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_TURN_ERRORS);
    collector.register_counter(&SESSION_SUMMARIES);
    collector.register_counter(&SESSION_SAVES);
    collector.register_counter(&SESSION_LOADS);
}
