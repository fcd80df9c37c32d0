// Timing helpers

use std::thread;
use std::time::Duration;

/// Sleep the calling thread for `ms` milliseconds
pub fn delay(ms: u32) {
    thread::sleep(Duration::from_millis(u64::from(ms)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_delay_waits_at_least() {
        let start = Instant::now();
        delay(5);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
