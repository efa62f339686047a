use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

const TICK: Duration = Duration::from_millis(150);
const MIN_WIDTH: usize = 20;

/// Animated waiting line: a filled dot sweeping back and forth over a
/// hollow track, redrawn in place every tick. Runs as its own task so the
/// caller is free to await the request; `finish` (or drop) clears the line
/// before anything else is printed.
pub struct ProgressIndicator {
    stop: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
    width: usize,
}

impl ProgressIndicator {
    /// Starts the animation sized to the status line above it, never
    /// narrower than `MIN_WIDTH` columns.
    pub fn start(width: usize) -> Self {
        let width = width.max(MIN_WIDTH);
        let (stop, mut stopped) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(TICK);
            let mut position: usize = 0;
            let mut forward = true;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        draw_frame(width, position);
                        if forward {
                            if position + 1 >= width {
                                forward = false;
                                position -= 1;
                            } else {
                                position += 1;
                            }
                        } else if position == 0 {
                            forward = true;
                            position += 1;
                        } else {
                            position -= 1;
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }
            clear_line(width);
        });
        Self {
            stop: Some(stop),
            handle: Some(handle),
            width,
        }
    }

    /// Stops the animation and waits for the line to be cleared.
    pub async fn finish(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(true);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            clear_line(self.width);
        }
    }
}

fn draw_frame(width: usize, position: usize) {
    let frame: String = (0..width).map(|i| if i == position { '●' } else { '○' }).collect();
    print!("\r{}", frame.blue());
    let _ = io::stdout().flush();
}

fn clear_line(width: usize) {
    print!("\r{}\r", " ".repeat(width));
    let _ = io::stdout().flush();
}
