//! SysTick based embassy time driver for CH32V203
//!
//! SysTick interrupts at 1 kHz, matching the `tick-hz-1_000` feature. One
//! alarm is provided, which is all the generic timer queue needs.

use core::cell::Cell;
use critical_section::Mutex;
use embassy_time_driver::{AlarmHandle, Driver};
use portable_atomic::{AtomicBool, AtomicU64, Ordering};

struct Alarm {
    timestamp: Cell<u64>,
    callback: Cell<Option<(fn(*mut ()), *mut ())>>,
}

// Only touched inside critical sections on a single core.
unsafe impl Send for Alarm {}

/// Tick counter plus a single alarm slot
pub struct SysTickDriver {
    ticks: AtomicU64,
    allocated: AtomicBool,
    alarm: Mutex<Alarm>,
}

impl SysTickDriver {
    const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            allocated: AtomicBool::new(false),
            alarm: Mutex::new(Alarm {
                timestamp: Cell::new(u64::MAX),
                callback: Cell::new(None),
            }),
        }
    }

    /// Advance one tick and fire the alarm once it is due
    fn tick(&self) {
        let now = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;

        let due = critical_section::with(|cs| {
            let alarm = self.alarm.borrow(cs);
            if alarm.timestamp.get() <= now {
                alarm.timestamp.set(u64::MAX);
                alarm.callback.get()
            } else {
                None
            }
        });

        if let Some((callback, ctx)) = due {
            callback(ctx);
        }
    }
}

impl Driver for SysTickDriver {
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    unsafe fn allocate_alarm(&self) -> Option<AlarmHandle> {
        if self.allocated.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(AlarmHandle::new(0))
        }
    }

    fn set_alarm_callback(&self, _alarm: AlarmHandle, callback: fn(*mut ()), ctx: *mut ()) {
        critical_section::with(|cs| self.alarm.borrow(cs).callback.set(Some((callback, ctx))));
    }

    fn set_alarm(&self, _alarm: AlarmHandle, timestamp: u64) -> bool {
        critical_section::with(|cs| {
            let alarm = self.alarm.borrow(cs);
            if timestamp <= self.now() {
                // Already passed; the caller polls its queue itself
                alarm.timestamp.set(u64::MAX);
                false
            } else {
                alarm.timestamp.set(timestamp);
                true
            }
        })
    }
}

embassy_time_driver::time_driver_impl!(static DRIVER: SysTickDriver = SysTickDriver::new());

/// SysTick interrupt handler body
pub fn on_systick() {
    DRIVER.tick();
}

// Critical section implementation for single-core RISC-V
#[cfg(target_arch = "riscv32")]
critical_section::set_impl!(RiscvCriticalSection);

#[cfg(target_arch = "riscv32")]
struct RiscvCriticalSection;

#[cfg(target_arch = "riscv32")]
unsafe impl critical_section::Impl for RiscvCriticalSection {
    unsafe fn acquire() -> u8 {
        let was_active = riscv::register::mstatus::read().mie();
        riscv::interrupt::disable();
        was_active as u8
    }

    unsafe fn release(was_active: u8) {
        if was_active != 0 {
            riscv::interrupt::enable();
        }
    }
}
