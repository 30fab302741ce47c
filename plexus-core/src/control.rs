use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Mutex;

/// A command sent on the optional inbound control stream (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Continue,
    Stop,
}

/// The scheduler's view of an optional inbound command stream.
///
/// Drains non-blockingly before each generation's evaluation and blocks on
/// the channel while paused, still honoring cancellation. A closed channel
/// behaves exactly like "no further commands" — it is not itself a stop.
pub struct ControlStream {
    receiver: Option<Mutex<mpsc::Receiver<ControlCommand>>>,
    paused: AtomicBool,
    stopped: AtomicBool,
}

impl ControlStream {
    pub fn new(receiver: mpsc::Receiver<ControlCommand>) -> Self {
        ControlStream {
            receiver: Some(Mutex::new(receiver)),
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// No control stream configured; every drain/block call is a no-op.
    pub fn none() -> Self {
        ControlStream {
            receiver: None,
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn apply(&self, command: ControlCommand) {
        match command {
            ControlCommand::Pause => self.paused.store(true, Ordering::Release),
            ControlCommand::Continue => self.paused.store(false, Ordering::Release),
            ControlCommand::Stop => {
                self.stopped.store(true, Ordering::Release);
                self.paused.store(false, Ordering::Release);
            }
        }
    }

    /// Drains every currently-queued command without blocking.
    pub fn drain_nonblocking(&self) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        let receiver = receiver.lock().unwrap();
        loop {
            match receiver.try_recv() {
                Ok(command) => self.apply(command),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Blocks on the channel while paused. Still wakes up to re-check
    /// cancellation on every received command, and returns as soon as the
    /// stream is unpaused, stopped, or `cancelled` flips true.
    pub fn block_while_paused(&self, cancelled: &AtomicBool) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        let receiver = receiver.lock().unwrap();

        while self.is_paused() && !self.is_stopped() && !cancelled.load(Ordering::Acquire) {
            match receiver.recv() {
                Ok(command) => self.apply(command),
                Err(_) => break,
            }
        }
    }
}
