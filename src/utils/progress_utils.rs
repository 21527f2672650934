use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

/// A styled progress bar, or `None` when stderr is not a terminal.
pub fn progress_bar(len: u64, msg: String) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }

    let bar = ProgressBar::new(len).with_message(msg);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise} / {eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }

    Some(bar)
}
