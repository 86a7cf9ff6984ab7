use std::time::Duration;

use dispatchr::queue;
use dispatchr::time::Time;
use objc2::MainThreadMarker;

/// Runs `work(context)` on the main queue after `delay`.
///
/// Requiring a [`MainThreadMarker`] keeps `context` on the thread it was
/// created on, so it does not have to be `Send`.
pub fn after_on_main<T: 'static>(
    _mtm: MainThreadMarker,
    delay: Duration,
    context: T,
    work: fn(T),
) {
    let delay_ns = i64::try_from(delay.as_nanos()).unwrap_or(i64::MAX);
    queue::main().after_f_s(Time::new_after(Time::NOW, delay_ns), context, work);
}

/// Runs `work(context)` on the next turn of the main queue.
pub fn async_on_main<T: 'static>(_mtm: MainThreadMarker, context: T, work: fn(T)) {
    queue::main().after_f_s(Time::NOW, context, work);
}
