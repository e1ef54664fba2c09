use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

/// Cooperative stop flag, shared between a solver and whoever may stop it.
#[derive(Clone, Debug, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Decisions between two clock reads.
const CLOCK_INTERVAL: u32 = 64;

/// Deadline and interrupt polled by the search at decision points.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    deadline: Option<Instant>,
    interrupt: Interrupt,
    ticks: u32,
}

impl Limits {
    pub fn new(deadline: Option<Instant>, interrupt: Interrupt) -> Self {
        Self {
            deadline,
            interrupt,
            ticks: 0,
        }
    }

    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
        self.ticks = 0;
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn set_interrupt(&mut self, interrupt: Interrupt) {
        self.interrupt = interrupt;
    }

    pub fn reached(&mut self) -> bool {
        if self.interrupt.is_raised() {
            return true;
        }
        let Some(deadline) = self.deadline else {
            return false;
        };
        let check = self.ticks == 0;
        self.ticks = (self.ticks + 1) % CLOCK_INTERVAL;
        check && Instant::now() >= deadline
    }
}
