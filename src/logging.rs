// pensettings/src/logging.rs

use std::{
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        OnceLock,
    },
    thread,
    time::Duration,
};

use crate::paths::app_root_dir;

/* =========================
   GLOBAL STATE
   ========================= */

static DEBUG: AtomicBool = AtomicBool::new(false);
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_TX: OnceLock<Sender<Message>> = OnceLock::new();

const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

enum Message {
    Line(String),
    /// Acknowledged once every earlier line is on disk.
    Flush(Sender<()>),
}

/* =========================
   PUBLIC API
   ========================= */

/// Start the writer thread. Later calls only update the debug flag.
pub fn init(debug: bool) {
    DEBUG.store(debug, Ordering::Relaxed);

    if LOG_TX.get().is_some() {
        return;
    }

    let path = log_path().clone();
    let (tx, rx) = mpsc::channel::<Message>();
    if LOG_TX.set(tx).is_err() {
        return;
    }

    thread::spawn(move || {
        let mut file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("pensettings: cannot open log file {}: {e}", path.display());
                return;
            }
        };
        write_lines(rx, &mut file);
    });
}

/// Block until every line queued so far has been written. Call before
/// `process::exit`, which does not wait for the writer thread.
pub fn flush() {
    let Some(tx) = LOG_TX.get() else {
        return;
    };
    let (ack_tx, ack_rx) = mpsc::channel();
    if tx.send(Message::Flush(ack_tx)).is_ok() {
        let _ = ack_rx.recv_timeout(FLUSH_TIMEOUT);
    }
}

/// Toggle `info!` output after startup (config reload).
pub fn set_debug(debug: bool) {
    DEBUG.store(debug, Ordering::Relaxed);
}

#[inline]
pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/* =========================
   INTERNAL
   ========================= */

#[inline]
pub fn enqueue(level: &str, msg: String) {
    if let Some(tx) = LOG_TX.get() {
        let _ = tx.send(Message::Line(format_line(level, &msg)));
    }
}

fn write_lines(rx: Receiver<Message>, out: &mut impl Write) {
    while let Ok(message) = rx.recv() {
        match message {
            Message::Line(line) => {
                let _ = writeln!(out, "{line}");
                let _ = out.flush();
            }
            Message::Flush(ack) => {
                let _ = out.flush();
                let _ = ack.send(());
            }
        }
    }
}

fn format_line(level: &str, msg: &str) -> String {
    format!("{} [{level}] {msg}", timestamp())
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/* =========================
   MACROS
   ========================= */

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        if $crate::logging::debug_enabled() {
            $crate::logging::enqueue(
                "INFO",
                format!($($arg)*)
            );
        }
    }};
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        $crate::logging::enqueue(
            "WARN",
            format!($($arg)*)
        );
    }};
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        $crate::logging::enqueue(
            "ERROR",
            format!($($arg)*)
        );
    }};
}

/* =========================
   PATH
   ========================= */

fn log_path() -> &'static PathBuf {
    LOG_PATH.get_or_init(|| app_root_dir().join("pensettings.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_carries_level_and_message() {
        let line = format_line("WARN", "[Registry] access denied");
        assert!(line.ends_with("[WARN] [Registry] access denied"));
        // "YYYY-MM-DD HH:MM:SS.mmm"
        assert_eq!(line.find(" [WARN]"), Some(23));
    }

    #[test]
    fn macros_are_silent_without_writer() {
        crate::warn!("dropped {}", 1);
        crate::error!("dropped {}", 2);
        crate::info!("dropped {}", 3);
        flush();
    }

    #[test]
    fn flush_is_acknowledged_after_earlier_lines() {
        let (tx, rx) = mpsc::channel();
        let (ack_tx, ack_rx) = mpsc::channel();
        tx.send(Message::Line("first".into())).unwrap();
        tx.send(Message::Line("Command failed: boom".into())).unwrap();
        tx.send(Message::Flush(ack_tx)).unwrap();
        tx.send(Message::Line("after".into())).unwrap();
        drop(tx);

        let mut out = Vec::new();
        write_lines(rx, &mut out);

        assert_eq!(String::from_utf8(out).unwrap(), "first\nCommand failed: boom\nafter\n");
        assert!(ack_rx.try_recv().is_ok());
    }
}
