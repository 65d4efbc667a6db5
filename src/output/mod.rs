//! Styled terminal output for cfn2tf
//!
//! Warnings and errors go to stderr so `cfn2tf serialize` can be piped.

use owo_colors::OwoColorize;

const GREEN: (u8, u8, u8) = (152, 225, 152);
const RED: (u8, u8, u8) = (255, 160, 160);
const YELLOW: (u8, u8, u8) = (255, 230, 160);
const BLUE: (u8, u8, u8) = (160, 200, 255);
const LAVENDER: (u8, u8, u8) = (181, 174, 254);
const TEAL: (u8, u8, u8) = (120, 180, 195);
const GREY: (u8, u8, u8) = (160, 160, 160);

fn symbol(text: &str, (r, g, b): (u8, u8, u8)) -> String {
    text.truecolor(r, g, b).bold().to_string()
}

fn grey(text: &str) -> String {
    let (r, g, b) = GREY;
    text.truecolor(r, g, b).to_string()
}

pub fn success(message: &str) {
    println!("{} {}", symbol("✓", GREEN), message.bright_white());
}

pub fn error(message: &str) {
    eprintln!("{} {}", symbol("✗", RED), message.bright_white());
}

pub fn warning(message: &str) {
    eprintln!("{} {}", symbol("⚠", YELLOW), message.bright_white());
}

pub fn info(message: &str) {
    println!("{} {}", symbol("ℹ", BLUE), message.bright_white());
}

/// Section header followed by a full separator line
pub fn section(title: &str) {
    let (r, g, b) = LAVENDER;
    println!("\n{}", title.truecolor(r, g, b).bold());
    println!("{}", grey(&"─".repeat(50)));
}

pub fn subsection(title: &str) {
    let (r, g, b) = TEAL;
    println!("\n{}", title.truecolor(r, g, b));
    println!("{}", grey(&"·".repeat(30)));
}

pub fn key_value(key: &str, value: &str) {
    println!("  {} {}", grey(&format!("{}:", key)), value.bright_white());
}

pub fn key_value_highlight(key: &str, value: &str) {
    let (r, g, b) = TEAL;
    println!(
        "  {} {}",
        grey(&format!("{}:", key)),
        value.truecolor(r, g, b).bold()
    );
}

/// Muted text, used for echoed terraform output
pub fn dimmed(message: &str) {
    println!("{}", grey(message));
}

pub fn blank() {
    println!();
}
