pub mod console;
pub mod views;

use is_terminal::IsTerminal;

/// Color only when writing to a terminal and `NO_COLOR` is unset.
pub fn stdout_supports_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// Paint `text` with `style` when `color` is on.
pub(crate) fn paint<F>(text: &str, color: bool, style: F) -> String
where
    F: FnOnce(&str) -> String,
{
    if color {
        style(text)
    } else {
        text.to_string()
    }
}
