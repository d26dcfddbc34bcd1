use colored::Colorize;
use serde::{Serialize, Deserialize};

/// Prints the given string with the given color.
///
/// ## Example
/// ```
/// use diffco::utils::utils_console::{diffco_print, PrintMode, PrintColor};
/// diffco_print("test", PrintMode::Print, PrintColor::Blue, false);
/// ```
pub fn diffco_print(s: &str, mode: PrintMode, color: PrintColor, bolded: bool) {
    let mut string = match &color {
        PrintColor::None => { s.normal() }
        _ => {
            let c = color.get_color_triple();
            s.truecolor(c.0, c.1, c.2)
        }
    };
    if bolded { string = string.bold(); }
    match mode {
        PrintMode::Println => { println!("{}", string); }
        PrintMode::Print => { print!("{}", string); }
    }
}

pub fn diffco_print_new_line() {
    diffco_print("\n", PrintMode::Print, PrintColor::None, false);
}

/// Prints only if the given debug level is at least `required`.
pub fn diffco_print_debug(s: &str, debug: &DiffcoDebug, required: DiffcoDebug, color: PrintColor, bolded: bool) {
    if debug.includes(&required) {
        diffco_print(s, PrintMode::Println, color, bolded);
    }
}

/// Prints a yellow warning.  Warnings are shown unless the debug level is `Silent`.
pub fn diffco_print_warning(s: &str, debug: &DiffcoDebug) {
    diffco_print_debug(&format!("WARNING: {}", s), debug, DiffcoDebug::Summary, PrintColor::Yellow, true);
}

/// Println will cause a new line after each line, while Print will not.
#[derive(Clone, Debug)]
pub enum PrintMode {
    Println,
    Print
}

/// Defines color for a diffco print command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrintColor {
    None,
    Blue,
    Green,
    Red,
    Yellow,
    Cyan,
    Magenta
}
impl PrintColor {
    pub fn get_color_triple(&self) -> (u8, u8, u8) {
        match self {
            PrintColor::None => { (0,0,0) }
            PrintColor::Blue => { return (0, 0, 255) }
            PrintColor::Green => { return (0, 255, 0) }
            PrintColor::Red => { return (255, 0, 0) }
            PrintColor::Yellow => { return (255, 255, 0) }
            PrintColor::Cyan => { return (0, 255, 255) }
            PrintColor::Magenta => { return (255, 0, 255) }
        }
    }
}

/// Verbosity passed down to long-running stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiffcoDebug {
    Silent,
    Summary,
    Verbose
}
impl DiffcoDebug {
    pub fn includes(&self, level: &DiffcoDebug) -> bool {
        self >= level
    }
}
impl Default for DiffcoDebug {
    fn default() -> Self {
        Self::Summary
    }
}
