//! Bundled reset stylesheets.

use crate::config::Preflight;

const MINIMAL: &str = include_str!("preflight/minimal.css");
const STANDARD: &str = include_str!("preflight/standard.css");
const FULL: &str = include_str!("preflight/full.css");

pub fn stylesheet(level: Preflight) -> &'static str {
    match level {
        Preflight::Disabled => "",
        Preflight::Minimal => MINIMAL.trim_end(),
        Preflight::Standard => STANDARD.trim_end(),
        Preflight::Full => FULL.trim_end(),
    }
}

#[cfg(test)]
mod tests {
    use super::stylesheet;
    use crate::config::Preflight;

    #[test]
    fn levels_grow() {
        assert_eq!(stylesheet(Preflight::Disabled), "");
        let minimal = stylesheet(Preflight::Minimal).len();
        let standard = stylesheet(Preflight::Standard).len();
        let full = stylesheet(Preflight::Full).len();
        assert!(minimal > 0 && minimal < standard && standard < full);
    }

    #[test]
    fn every_level_sets_box_sizing() {
        for level in [Preflight::Minimal, Preflight::Standard, Preflight::Full] {
            assert!(
                stylesheet(level).starts_with("*, ::before, ::after { box-sizing: border-box;")
            );
        }
    }
}
