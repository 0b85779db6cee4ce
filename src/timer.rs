use anyhow::Result;
use calloop::timer::{TimeoutAction, Timer};
use calloop::LoopHandle;
use std::time::Duration;

/// Owns one repeating timer registration. Dropping the handle removes the
/// timer from its event loop, so the callback never runs again.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    #[cfg(test)]
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

/// Run `tick` every `period` on the loop behind `handle` until the returned
/// handle is dropped. The first call happens one period from now.
pub fn every<D: 'static, F>(handle: &LoopHandle<'static, D>, period: Duration, mut tick: F) -> Result<TimerHandle>
where
    F: FnMut() + 'static,
{
    let token = handle
        .insert_source(Timer::from_duration(period), move |_deadline, _, _data| {
            tick();
            TimeoutAction::ToDuration(period)
        })
        .map_err(|e| anyhow::anyhow!("Failed to register timer: {}", e.error))?;

    let handle = handle.clone();
    Ok(TimerHandle {
        cancel: Some(Box::new(move || handle.remove(token))),
    })
}
