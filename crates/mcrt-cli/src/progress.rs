use std::{
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use mcrt::utils::progress::Progress;

/// Runs `f` while a progress bar follows `progress` on stdout
pub fn with_progress_bar<R, F: FnOnce() -> R>(progress: &Progress, f: F) -> R {
    let finished = AtomicBool::new(false);
    std::thread::scope(|s| {
        s.spawn(|| {
            while !finished.load(Ordering::Relaxed) {
                print!("\r{progress}");
                let _ = std::io::stdout().flush();
                std::thread::sleep(Duration::from_millis(200));
            }
            println!("\r{progress}");
        });
        let res = f();
        finished.store(true, Ordering::Relaxed);
        res
    })
}
