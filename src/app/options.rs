//! Local filtering of dropdown options.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};

/// One entry of a select input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// An option that survived filtering, with the byte ranges of its label to highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedOption<'a> {
    pub option: &'a SelectOption,
    pub highlight_ranges: Vec<(usize, usize)>,
}

/// Filters `options` by a whitespace-separated query.
///
/// Every token must fuzzy-match the label, ignoring case. Source order is
/// kept. An empty query returns every option without highlights.
#[must_use]
pub fn filter_options<'a>(options: &'a [SelectOption], query: &str) -> Vec<MatchedOption<'a>> {
    let tokens: Vec<&str> = query.split_whitespace().collect();

    let _span = tracing::debug_span!("filter_options", total = options.len(), tokens = tokens.len()).entered();

    if tokens.is_empty() {
        return options
            .iter()
            .map(|option| MatchedOption {
                option,
                highlight_ranges: Vec::new(),
            })
            .collect();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    options
        .iter()
        .filter_map(|option| {
            let mut indices = Vec::new();
            for token in &tokens {
                let (_score, matched) = matcher.fuzzy_indices(&option.label, token)?;
                indices.extend(matched);
            }
            Some(MatchedOption {
                option,
                highlight_ranges: coalesce_ranges(&option.label, indices),
            })
        })
        .collect()
}

/// Highlight ranges of `text` matching `query` as one pattern.
#[must_use]
pub fn highlight_ranges(text: &str, query: &str) -> Vec<(usize, usize)> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    SkimMatcherV2::default()
        .fuzzy_indices(text, query.trim())
        .map(|(_score, indices)| coalesce_ranges(text, indices))
        .unwrap_or_default()
}

/// Turns matched char indices into sorted, merged byte ranges of `text`.
fn coalesce_ranges(text: &str, mut char_indices: Vec<usize>) -> Vec<(usize, usize)> {
    char_indices.sort_unstable();
    char_indices.dedup();

    let offsets: Vec<(usize, usize)> = text
        .char_indices()
        .map(|(start, c)| (start, start + c.len_utf8()))
        .collect();

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for idx in char_indices {
        let Some(&(start, end)) = offsets.get(idx) else {
            continue;
        };
        match ranges.last_mut() {
            Some(last) if last.1 == start => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states() -> Vec<SelectOption> {
        vec![
            SelectOption::new("1", "Tamil Nadu"),
            SelectOption::new("2", "Kerala"),
            SelectOption::new("3", "West Bengal"),
            SelectOption::new("4", "Karnataka"),
        ]
    }

    #[test]
    fn every_token_must_match() {
        let options = states();
        let matched: Vec<&str> = filter_options(&options, "ta na")
            .iter()
            .map(|m| m.option.value.as_str())
            .collect();
        assert_eq!(matched, vec!["1", "3", "4"]);

        let narrowed: Vec<&str> = filter_options(&options, "KER")
            .iter()
            .map(|m| m.option.value.as_str())
            .collect();
        assert_eq!(narrowed, vec!["2"]);
    }

    #[test]
    fn highlights_point_into_the_original_label() {
        let options = vec![SelectOption::new("1", "İstanbul Road")];
        let matched = filter_options(&options, "road");
        assert_eq!(matched[0].highlight_ranges, vec![(10, 14)]);
        assert_eq!(&options[0].label[10..14], "Road");
    }

    #[test]
    fn empty_query_keeps_everything() {
        let options = states();
        assert_eq!(filter_options(&options, "   ").len(), 4);
    }

    #[test]
    fn ranges_are_merged() {
        assert_eq!(highlight_ranges("Kerala", "ker"), vec![(0, 3)]);
        assert!(highlight_ranges("Kerala", "").is_empty());
    }
}
