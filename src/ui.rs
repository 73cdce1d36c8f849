use std::io::Write;

pub fn narration(text: &str) {
    print!("\r\x1b[K\x1b[36m{}\x1b[0m\n", text);
    std::io::stdout().flush().ok();
}

pub fn heard(text: &str) {
    print!("\r\x1b[K> {}\n", text);
    std::io::stdout().flush().ok();
}

pub fn listening() {
    print!("\r\x1b[K\x1b[90m⠋ Listening... (speak, or type a command)\x1b[0m");
    std::io::stdout().flush().ok();
}

pub fn tracking_status(ticks: u64, clicks: u32, cursor: (f64, f64)) {
    print!(
        "\r\x1b[K\x1b[35m✋ {} frames, {} clicks, cursor ({:.0}, {:.0})\x1b[0m",
        ticks, clicks, cursor.0, cursor.1
    );
    std::io::stdout().flush().ok();
}

pub fn clear_line() {
    print!("\r\x1b[K");
    std::io::stdout().flush().ok();
}
