use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use crate::Clock;

/// Simulated time in nanoseconds, shared by a [`SimClock`] and a [`SimDelay`].
#[derive(Clone, Default)]
pub struct SimTime {
    pub nanos: Rc<Cell<u64>>,
}

/// Clock that moves forward by `tick_ns` every time it is read.
pub struct SimClock {
    time: SimTime,
    tick_ns: u64,
}

impl SimClock {
    pub fn new(time: &SimTime, tick_ns: u64) -> SimClock {
        SimClock {
            time: time.clone(),
            tick_ns,
        }
    }
}

impl Clock for SimClock {
    fn now(&mut self) -> f64 {
        let now = self.time.nanos.get();
        self.time.nanos.set(now + self.tick_ns);
        now as f64 / 1e9
    }
}

/// Delay that advances simulated time instead of sleeping.
pub struct SimDelay {
    time: SimTime,
    pub slept_ns: Rc<Cell<u64>>,
    pub calls: Rc<Cell<usize>>,
}

impl SimDelay {
    pub fn new(time: &SimTime) -> SimDelay {
        SimDelay {
            time: time.clone(),
            slept_ns: Rc::new(Cell::new(0)),
            calls: Rc::new(Cell::new(0)),
        }
    }

    fn advance(&mut self, ns: u32) {
        self.time.nanos.set(self.time.nanos.get() + ns as u64);
        self.slept_ns.set(self.slept_ns.get() + ns as u64);
        self.calls.set(self.calls.get() + 1);
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(ns);
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.advance(ns);
    }
}
