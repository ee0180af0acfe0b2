//! # Example: startup
//!
//! Boots a small shell the way a game does at launch.
//!
//! Shows how to:
//! - Register a [`ResourceStore`] first so later systems can read resources during setup.
//! - Wrap an [`AsyncSystem`] in [`Gated`] so its ticks wait for its own setup.
//! - Subscribe/unsubscribe on the [`EventBus`] and observe the deferred removal.
//! - Observe lifecycle events with [`LogWriter`].
//!
//! ## Flow
//! ```text
//! Shell::start()
//!     ├─► start() hooks
//!     ├─► ResourceStore.setup()      (loads Keymap, skips Soundbank)
//!     └─► Gated<DebugConsole>.setup() (reads Keymap, subscribes "debug.toggle")
//! frames
//!     ├─► publish("debug.toggle")    ─► console toggles
//!     └─► dispose → unsubscribe      ─► applied by shutdown
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example startup --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tickvisor::{
    AsyncSystem, Callback0, Config, EventBus, Gated, LogWriter, Observe, Resource,
    ResourceStore, SetupError, Shell,
};
use tracing_subscriber::EnvFilter;

struct Keymap {
    toggle: &'static str,
}

#[async_trait]
impl Resource for Keymap {
    fn name() -> &'static str {
        "keymap"
    }

    async fn load() -> Result<Self, SetupError> {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Ok(Keymap { toggle: "F1" })
    }
}

struct Soundbank;

#[async_trait]
impl Resource for Soundbank {
    fn name() -> &'static str {
        "soundbank"
    }

    async fn load() -> Result<Self, SetupError> {
        Err(SetupError::fail("bundle not found"))
    }
}

struct DebugConsole {
    store: Arc<ResourceStore>,
    bus: EventBus,
    on_toggle: Callback0,
    visible: Arc<AtomicBool>,
    frames: AtomicU32,
}

impl DebugConsole {
    fn new(store: Arc<ResourceStore>, bus: EventBus) -> Self {
        let visible = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&visible);
        Self {
            store,
            bus,
            on_toggle: Callback0::new(move || {
                let was = flag.fetch_xor(true, Ordering::Relaxed);
                println!("[console] visible={}", !was);
                Ok(())
            }),
            visible,
            frames: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl AsyncSystem for DebugConsole {
    fn name(&self) -> &str {
        "debug-console"
    }

    async fn setup(&self) -> Result<(), SetupError> {
        let keymap = self.store.get::<Keymap>().ok_or_else(|| SetupError::Missing {
            dependency: "keymap".into(),
        })?;
        println!("[console] bound to {}", keymap.toggle);
        self.bus.subscribe("debug.toggle", &self.on_toggle)?;
        Ok(())
    }

    fn tick(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    fn dispose(&self) {
        let _ = self.bus.unsubscribe("debug.toggle", &self.on_toggle);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let builder = Shell::builder(Config::default());
    let store = Arc::new(ResourceStore::new().with::<Keymap>().with::<Soundbank>());
    let console = Gated::new(DebugConsole::new(Arc::clone(&store), builder.bus()));

    let observers = vec![Arc::new(LogWriter::new()) as Arc<dyn Observe>];
    let shell = builder
        .with_observers(observers)
        .with_participant(store)
        .with_async_system(Arc::new(console))
        .build();

    // Not ready yet: this tick is dropped by the gate.
    shell.frame();
    shell.start().await?;

    for _ in 0..3 {
        shell.frame();
        shell.bus().publish("debug.toggle")?;
    }

    if let Some(console) = shell.get::<Gated<DebugConsole>>() {
        println!(
            "[main] console frames={} visible={}",
            console.inner().frames.load(Ordering::Relaxed),
            console.inner().visible.load(Ordering::Relaxed)
        );
    }

    shell.shutdown().await;
    println!("[main] topics left={}", shell.bus().topic_count());
    Ok(())
}
