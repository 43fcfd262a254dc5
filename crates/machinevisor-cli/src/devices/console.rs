//! Screen and speech output on the terminal.

use std::io::Write;
use std::path::PathBuf;

use machinevisor::{SpeechOutput, StatusDisplay};

/// Prints status updates to stdout; optionally keeps the latest frame on disk.
#[derive(Default)]
pub struct ConsoleDisplay {
    frame_out: Option<PathBuf>,
}

impl ConsoleDisplay {
    pub fn new(frame_out: Option<PathBuf>) -> Self {
        Self { frame_out }
    }

    fn print(&self, channel: &str, text: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for line in text.lines() {
            let _ = writeln!(out, "[{channel}] {line}");
        }
        let _ = out.flush();
    }
}

impl StatusDisplay for ConsoleDisplay {
    fn show_pose_status(&self, text: &str) {
        self.print("pose", text);
    }

    fn show_capture_status(&self, text: &str) {
        self.print("capture", text);
    }

    fn show_image(&self, jpeg: &[u8]) {
        tracing::debug!("Frame: {} bytes", jpeg.len());
        if let Some(path) = &self.frame_out {
            if let Err(e) = std::fs::write(path, jpeg) {
                tracing::warn!("Failed to write frame to {}: {e}", path.display());
            }
        }
    }
}

/// Prints what would be spoken, with the rate.
#[derive(Default)]
pub struct ConsoleSpeech {
    voice: Option<String>,
}

impl ConsoleSpeech {
    pub fn new(voice: Option<String>) -> Self {
        Self { voice }
    }

    pub fn line(&self, text: &str, rate: f32) -> String {
        match &self.voice {
            Some(voice) => format!("[speech {voice} x{rate:.2}] {text}"),
            None => format!("[speech x{rate:.2}] {text}"),
        }
    }
}

impl SpeechOutput for ConsoleSpeech {
    fn speak(&self, text: &str, rate: f32) {
        println!("{}", self.line(text, rate));
    }
}
