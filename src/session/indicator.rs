use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

pub const DOT_CYCLE: Duration = Duration::from_millis(300);
pub const BLINK_CYCLE: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct IndicatorState {
    dots: usize,
    visible: bool,
}

/// Animated "typing" placeholder, driven by two independent timers: the
/// dot count advances every 300ms, visibility toggles every 500ms.
#[derive(Debug)]
pub struct TypingIndicator {
    state: Arc<Mutex<IndicatorState>>,
    dots_task: JoinHandle<()>,
    blink_task: JoinHandle<()>,
}

impl TypingIndicator {
    pub fn start() -> Self {
        let state = Arc::new(Mutex::new(IndicatorState { dots: 1, visible: true }));

        let dots_state = state.clone();
        let dots_task = tokio::spawn(async move {
            let mut ticker = interval(DOT_CYCLE);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut s = dots_state.lock().unwrap();
                s.dots = s.dots % 3 + 1;
            }
        });

        let blink_state = state.clone();
        let blink_task = tokio::spawn(async move {
            let mut ticker = interval(BLINK_CYCLE);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut s = blink_state.lock().unwrap();
                s.visible = !s.visible;
            }
        });

        Self { state, dots_task, blink_task }
    }

    pub fn frame(&self) -> String {
        let s = self.state.lock().unwrap();
        if s.visible {
            ".".repeat(s.dots)
        } else {
            String::new()
        }
    }

    pub fn stop(&self) {
        self.dots_task.abort();
        self.blink_task.abort();
    }
}

impl Drop for TypingIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}
