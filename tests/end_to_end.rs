//! End-to-end test against the real process clock.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use reveille::prelude::*;

#[test]
fn given_system_clocks_when_schedule_in_one_minute_then_trigger_about_one_minute_out() -> Result<()> {
    // GIVEN: host and caller both on the process wall clock
    let dispatch = Arc::new(InMemoryDispatch::new());
    let scheduler = AlarmScheduler::new(dispatch.clone(), Arc::new(SystemClock::new()));

    // WHEN: scheduling one minute from now
    let before = Utc::now().timestamp_millis();
    let request = AlarmRequest::exact(
        AlarmId::new(1),
        Utc::now() + Duration::seconds(60),
        ActionRef::new("wake")?,
    );
    let trigger = scheduler.schedule_exact(&request)?;
    let after = Utc::now().timestamp_millis();

    // THEN: the trigger lands within the sampling window of a minute out
    let delay = trigger.delay_from(before);
    assert!(delay <= 60_000 + (after - before), "delay {delay} too long");
    assert!(delay >= 60_000 - (after - before), "delay {delay} too short");

    // AND: cancel clears it
    scheduler.cancel(request.id, &request.action)?;
    assert_eq!(dispatch.pending_count()?, 0);
    Ok(())
}
