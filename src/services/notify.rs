// SPDX-License-Identifier: MIT

//! User-notification boundary.

/// Fire-and-forget user-visible messages. Delivery failures are the sink's
/// problem; callers never observe them.
pub trait Notifier: Send + Sync {
    fn post(&self, title: &str, body: &str);
}

/// Notifier that writes to the tracing log.
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn post(&self, title: &str, body: &str) {
        tracing::info!(title, body, "User notification");
    }
}

/// Notifier that drops everything, for tests.
#[derive(Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn post(&self, _title: &str, _body: &str) {}
}
