//! Building the case-selector argument string.

use anyhow::{Context, Result};
use regex::Regex;

use crate::infra::config::Settings;

/// Builds the program-argument string handed to the runner for one request.
///
/// Stale selectors left behind by earlier invocations or manual edits are
/// stripped before the fresh selector is prepended, so selectors never
/// accumulate no matter how often a configuration is reused.
#[derive(Debug, Clone)]
pub struct ArgumentBuilder {
    flag: String,
    strip: Vec<Regex>,
}

impl ArgumentBuilder {
    /// Compile the stripping patterns for the configured flag spellings.
    pub fn from_config(settings: &Settings) -> Result<Self> {
        let selector = &settings.selector;
        let mut strip = Vec::with_capacity(selector.strip_flags.len());
        for spelling in &selector.strip_flags {
            let pattern = format!(r"{}\s+\S+", regex::escape(spelling));
            let regex = Regex::new(&pattern)
                .with_context(|| format!("invalid selector flag spelling '{spelling}'"))?;
            strip.push(regex);
        }
        Ok(Self {
            flag: selector.flag.clone(),
            strip,
        })
    }

    /// Produce the argument string for `runner_path` and `case`.
    ///
    /// Case 0 selects the whole file; any other index is appended to the
    /// path as a two-digit zero-padded suffix (`path:07`). `existing` is the
    /// base configuration's current argument string; whatever survives
    /// stripping is kept after the selector. Running the builder on its own
    /// output yields the same string again.
    pub fn build(&self, existing: &str, runner_path: &str, case: usize) -> String {
        let mut cleaned = existing.to_string();
        for regex in &self.strip {
            cleaned = regex.replace_all(&cleaned, "").into_owned();
        }
        let cleaned = cleaned.trim();

        let selector = if case > 0 {
            format!("{runner_path}:{case:02}")
        } else {
            runner_path.to_string()
        };

        if cleaned.is_empty() {
            format!("{} {}", self.flag, selector)
        } else {
            format!("{} {} {}", self.flag, selector, cleaned)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ArgumentBuilder {
        ArgumentBuilder::from_config(&Settings::default()).unwrap()
    }

    #[test]
    fn whole_file_selector_has_no_case_suffix() {
        let args = builder().build("", "/ws/demo.test", 0);
        assert_eq!(args, "-t /ws/demo.test");
    }

    #[test]
    fn case_index_is_zero_padded_to_two_digits() {
        let builder = builder();
        assert_eq!(builder.build("", "/ws/demo.test", 7), "-t /ws/demo.test:07");
        assert_eq!(builder.build("", "/ws/demo.test", 12), "-t /ws/demo.test:12");
        assert_eq!(builder.build("", "/ws/demo.test", 104), "-t /ws/demo.test:104");
    }

    #[test]
    fn unrelated_arguments_survive_after_the_selector() {
        let args = builder().build("--verbose --jobs 4", "/ws/demo.test", 2);
        assert_eq!(args, "-t /ws/demo.test:02 --verbose --jobs 4");
    }

    #[test]
    fn stale_selectors_are_stripped_in_every_spelling() {
        let args = builder().build(
            "-t /old/other.test:03 --verbose --testLocation /older/one.test",
            "/ws/demo.test",
            1,
        );
        assert_eq!(args, "-t /ws/demo.test:01 --verbose");
    }

    #[test]
    fn rebuilding_from_own_output_is_idempotent() {
        let builder = builder();
        let first = builder.build("--keep me", "/ws/demo.test", 5);
        let second = builder.build(&first, "/ws/demo.test", 5);
        assert_eq!(first, second);
    }

    #[test]
    fn switching_case_replaces_the_selector() {
        let builder = builder();
        let first = builder.build("", "/ws/demo.test", 1);
        let second = builder.build(&first, "/ws/demo.test", 2);
        assert_eq!(second, "-t /ws/demo.test:02");
    }

    #[test]
    fn flag_without_a_value_is_left_alone() {
        // Nothing follows the flag, so the strip pattern cannot match it.
        let args = builder().build("-t", "/ws/demo.test", 0);
        assert_eq!(args, "-t /ws/demo.test -t");
    }

    #[test]
    fn extra_spellings_from_config_are_stripped_too() {
        let mut settings = Settings::default();
        settings.selector.strip_flags.push("--case-file".to_string());
        let builder = ArgumentBuilder::from_config(&settings).unwrap();
        let args = builder.build("--case-file old.test --color", "/ws/demo.test", 0);
        assert_eq!(args, "-t /ws/demo.test --color");
    }
}
