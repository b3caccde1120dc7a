#![no_std]

// This mod MUST go first, so that the others see its macros.
#[doc(hidden)]
pub mod fmt;

pub mod tasks;

use embassy_executor::{InterruptExecutor, SendSpawner};
use embassy_nrf::interrupt;
use embassy_nrf::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use thermo_pipeline::Context;

pub const HW_VERSION: &str = env!("HW_VERSION");
pub const FW_VERSION: &str = env!("FW_VERSION");

/// Tasks on all three executors share the context, so its primitives
/// lock with a critical section.
pub type AppMutex = CriticalSectionRawMutex;
pub type AppContext = Context<AppMutex>;

// Statics
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_MED: InterruptExecutor = InterruptExecutor::new();

// Interrupt executors
#[interrupt]
unsafe fn EGU0_SWI0() {
    EXECUTOR_MED.on_interrupt()
}

#[interrupt]
unsafe fn EGU1_SWI1() {
    EXECUTOR_HIGH.on_interrupt()
}

pub fn init_executors() -> (SendSpawner, SendSpawner) {
    // Medium-priority executor: EGU0_SWI0, priority level 7
    interrupt::EGU0_SWI0.set_priority(Priority::P7);
    let medium_prio_spawner = EXECUTOR_MED.start(interrupt::EGU0_SWI0);

    // High-priority executor: EGU1_SWI1, priority level 6
    interrupt::EGU1_SWI1.set_priority(Priority::P6);
    let high_prio_spawner = EXECUTOR_HIGH.start(interrupt::EGU1_SWI1);
    (medium_prio_spawner, high_prio_spawner)
}

pub mod prelude {
    pub use super::{
        debug, error, info, init_executors, tasks::*, trace, unwrap, warn,
        AppContext, AppMutex, FW_VERSION, HW_VERSION,
    };
    pub use embassy_executor::Spawner;
    pub use embassy_nrf::interrupt;
    pub use embassy_nrf::interrupt::{InterruptExt, Priority};
    pub use embassy_time::{Duration, Timer};

    pub use kdc_thermo_bsp::{DisplayResources, KdcThermo, SensorResources};
    pub use thermo_pipeline::config::DEVICE_NAME;
    pub use thermo_pipeline::{BroadcastPayload, InitBits, Overflow};
}
