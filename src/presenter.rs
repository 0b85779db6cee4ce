use anyhow::Result;
use calloop::LoopHandle;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::time_utils::{self, TimeSnapshot};
use crate::timer::{self, TimerHandle};
use crate::zones::ZoneDescriptor;

/// What a presenter currently shows, plus how many times it was computed.
#[derive(Debug, Clone)]
pub struct Card {
    pub snapshot: TimeSnapshot,
    pub ticks: u64,
    dirty: bool,
}

impl Card {
    fn fresh(zone: &ZoneDescriptor) -> Self {
        Self {
            snapshot: time_utils::current_snapshot(&zone.tz),
            ticks: 1,
            dirty: true,
        }
    }

    fn refresh(&mut self, zone: &ZoneDescriptor) {
        let snapshot = time_utils::current_snapshot(&zone.tz);
        if snapshot != self.snapshot {
            self.dirty = true;
        }
        self.snapshot = snapshot;
        self.ticks += 1;
    }
}

/// Live display unit for one zone. Dropping it cancels its refresh timer.
pub struct ClockPresenter {
    zone: ZoneDescriptor,
    card: Rc<RefCell<Card>>,
    _timer: TimerHandle,
}

impl ClockPresenter {
    pub fn activate<D: 'static>(
        zone: ZoneDescriptor,
        period: Duration,
        handle: &LoopHandle<'static, D>,
    ) -> Result<Self> {
        let card = Rc::new(RefCell::new(Card::fresh(&zone)));

        let tick_card = card.clone();
        let tick_zone = zone.clone();
        let timer = timer::every(handle, period, move || {
            tick_card.borrow_mut().refresh(&tick_zone);
        })?;

        log::debug!("Activated presenter for {} ({})", zone.id, zone.timezone_name);
        Ok(Self { zone, card, _timer: timer })
    }

    pub fn zone(&self) -> &ZoneDescriptor {
        &self.zone
    }

    pub fn card(&self) -> Card {
        self.card.borrow().clone()
    }

    /// Shared view of the card, still readable after the presenter is gone.
    #[cfg(test)]
    pub fn card_handle(&self) -> Rc<RefCell<Card>> {
        self.card.clone()
    }

    /// Report whether the displayed snapshot changed since the last call.
    pub fn take_dirty(&self) -> bool {
        std::mem::replace(&mut self.card.borrow_mut().dirty, false)
    }
}

impl Drop for ClockPresenter {
    fn drop(&mut self) {
        log::debug!("Deactivated presenter for {}", self.zone.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneRegistry;
    use calloop::EventLoop;

    fn spin(event_loop: &mut EventLoop<'static, ()>, rounds: usize) {
        for _ in 0..rounds {
            event_loop.dispatch(Some(Duration::from_millis(10)), &mut ()).unwrap();
        }
    }

    #[test]
    fn activation_shows_a_snapshot_immediately() {
        let event_loop: EventLoop<'static, ()> = EventLoop::try_new().unwrap();
        let zone = ZoneRegistry::builtin().lookup("brisbane").unwrap().clone();
        let presenter = ClockPresenter::activate(zone, Duration::from_millis(200), &event_loop.handle()).unwrap();

        let card = presenter.card();
        assert_eq!(card.ticks, 1);
        assert_eq!(card.snapshot.hours.len(), 2);
        assert!(card.snapshot.meridiem == "AM" || card.snapshot.meridiem == "PM");
        assert!(presenter.take_dirty());
        assert!(!presenter.take_dirty());
    }

    #[test]
    fn ticks_stop_once_presenter_is_dropped() {
        let mut event_loop: EventLoop<'static, ()> = EventLoop::try_new().unwrap();
        let zone = ZoneRegistry::builtin().lookup("reno").unwrap().clone();
        let presenter = ClockPresenter::activate(zone, Duration::from_millis(1), &event_loop.handle()).unwrap();
        let card = presenter.card_handle();

        spin(&mut event_loop, 20);
        let ticks = card.borrow().ticks;
        assert!(ticks > 1);

        drop(presenter);
        spin(&mut event_loop, 20);
        assert_eq!(card.borrow().ticks, ticks);
    }
}
