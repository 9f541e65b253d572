//! Cleanup of assistant answers before they reach the markdown renderer.
//!
//! The service's model output is polluted with retrieval metadata
//! (`imageAltText...`, `imageUrl...`, `imageCaption...`), stray HTML
//! `class=` attributes and separator debris. [`sanitize`] strips all of it,
//! then turns bare image URLs into markdown images.
//!
//! The work is split into named [`Stage`]s run in a fixed order. The cleanup
//! stages repeat until the text stops changing, which is what makes
//! `sanitize(sanitize(x)) == sanitize(x)` hold even when removing one token
//! splices together another.
//!
//! Only assistant-authored content goes through here; user input is shown
//! verbatim.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SanitizeError {
    #[error("failed to build sanitizer stage '{stage}': {source}")]
    Build {
        stage: &'static str,
        source: regex::Error,
    },

    #[error("stage '{stage}' failed: {reason}")]
    Stage { stage: &'static str, reason: String },

    #[error("text did not settle after {0} cleanup passes")]
    Unsettled(usize),
}

/// One transformation in the pipeline
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply<'a>(&self, input: &'a str) -> Result<Cow<'a, str>, SanitizeError>;
}

fn compile(stage: &'static str, pattern: &str) -> Result<Regex, SanitizeError> {
    Regex::new(pattern).map_err(|source| SanitizeError::Build { stage, source })
}

/// Deletes every match of a pattern
pub struct RemovePattern {
    name: &'static str,
    regex: Regex,
}

impl RemovePattern {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, SanitizeError> {
        Ok(Self {
            name,
            regex: compile(name, pattern)?,
        })
    }
}

impl Stage for RemovePattern {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply<'a>(&self, input: &'a str) -> Result<Cow<'a, str>, SanitizeError> {
        Ok(self.regex.replace_all(input, ""))
    }
}

/// Runs of two or more `,`/`/` become a single `,`.
///
/// A run made only of slashes right after a `:` is a URL scheme separator
/// (`https://`) and is kept.
pub struct CollapseSeparators {
    regex: Regex,
}

impl CollapseSeparators {
    pub const NAME: &'static str = "collapse-separators";

    pub fn new() -> Result<Self, SanitizeError> {
        Ok(Self {
            regex: compile(Self::NAME, r"(:?)([,/]{2,})")?,
        })
    }
}

impl Stage for CollapseSeparators {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply<'a>(&self, input: &'a str) -> Result<Cow<'a, str>, SanitizeError> {
        Ok(self.regex.replace_all(input, |caps: &Captures| {
            let colon = &caps[1];
            let run = &caps[2];
            if !colon.is_empty() && run.chars().all(|c| c == '/') {
                format!("{colon}{run}")
            } else {
                format!("{colon},")
            }
        }))
    }
}

/// Strips whitespace and commas from both ends of the text
pub struct TrimSeparators;

impl Stage for TrimSeparators {
    fn name(&self) -> &'static str {
        "trim-separators"
    }

    fn apply<'a>(&self, input: &'a str) -> Result<Cow<'a, str>, SanitizeError> {
        Ok(Cow::Borrowed(
            input.trim_matches(|c: char| c.is_whitespace() || c == ','),
        ))
    }
}

/// Runs of horizontal whitespace become one space; line breaks stay
pub struct CollapseSpaces {
    regex: Regex,
}

impl CollapseSpaces {
    pub const NAME: &'static str = "collapse-spaces";

    pub fn new() -> Result<Self, SanitizeError> {
        Ok(Self {
            regex: compile(Self::NAME, r"[^\S\r\n]{2,}")?,
        })
    }
}

impl Stage for CollapseSpaces {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply<'a>(&self, input: &'a str) -> Result<Cow<'a, str>, SanitizeError> {
        Ok(self.regex.replace_all(input, " "))
    }
}

/// Wraps whitespace-delimited image URLs as `![](url)`.
///
/// Only whole tokens qualify, so a URL glued to other text is left alone.
pub struct EmbedImageUrls {
    token: Regex,
    image_url: Regex,
}

impl EmbedImageUrls {
    pub const NAME: &'static str = "embed-image-urls";

    pub fn new() -> Result<Self, SanitizeError> {
        Ok(Self {
            token: compile(Self::NAME, r"\S+")?,
            image_url: compile(
                Self::NAME,
                r"(?i)^https?://\S+\.(?:png|jpe?g|gif|svg|webp)$",
            )?,
        })
    }
}

impl Stage for EmbedImageUrls {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply<'a>(&self, input: &'a str) -> Result<Cow<'a, str>, SanitizeError> {
        Ok(self.token.replace_all(input, |caps: &Captures| {
            let token = &caps[0];
            if self.image_url.is_match(token) {
                format!("![]({token})")
            } else {
                token.to_string()
            }
        }))
    }
}

/// An ordered chain of stages.
///
/// `cleanup` stages only ever delete or shorten text and are repeated until
/// a full pass changes nothing; `finish` stages then run once.
pub struct Pipeline {
    cleanup: Vec<Box<dyn Stage>>,
    finish: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(cleanup: Vec<Box<dyn Stage>>, finish: Vec<Box<dyn Stage>>) -> Self {
        Self { cleanup, finish }
    }

    /// The answer-cleanup pipeline used for every assistant message
    pub fn standard() -> Result<Self, SanitizeError> {
        let cleanup: Vec<Box<dyn Stage>> = vec![
            Box::new(RemovePattern::new(
                "remove-found-established",
                r"(?i)found/established",
            )?),
            Box::new(RemovePattern::new(
                "remove-image-alt-text",
                r"(?i)imageAltText[^\s,]*",
            )?),
            Box::new(RemovePattern::new("remove-image-url", r"(?i)imageUrl[^\s,]*")?),
            Box::new(RemovePattern::new(
                "remove-image-caption",
                r"(?i)imageCaption[^,\r\n]*",
            )?),
            Box::new(RemovePattern::new(
                "remove-class-attribute",
                r#"(?i)\bclass\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]*)"#,
            )?),
            Box::new(CollapseSeparators::new()?),
            Box::new(TrimSeparators),
            Box::new(CollapseSpaces::new()?),
        ];
        let finish: Vec<Box<dyn Stage>> = vec![Box::new(EmbedImageUrls::new()?)];
        Ok(Self::new(cleanup, finish))
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.cleanup
            .iter()
            .chain(self.finish.iter())
            .map(|stage| stage.name())
            .collect()
    }

    pub fn run(&self, raw: &str) -> Result<String, SanitizeError> {
        let mut text = raw.to_string();

        // Each pass that changes anything shortens the text by at least one
        // byte, so the text length bounds the number of passes.
        let max_passes = raw.len() + 1;
        let mut passes = 0;
        loop {
            let next = run_stages(&self.cleanup, &text)?;
            if next == text {
                break;
            }
            text = next;
            passes += 1;
            if passes > max_passes {
                return Err(SanitizeError::Unsettled(passes));
            }
        }

        run_stages(&self.finish, &text)
    }

    /// Like [`Pipeline::run`] but falls back to the untouched input on error
    pub fn sanitize(&self, raw: &str) -> String {
        match self.run(raw) {
            Ok(clean) => clean,
            Err(err) => {
                tracing::warn!(error = %err, "sanitizer failed, keeping original text");
                raw.to_string()
            }
        }
    }
}

fn run_stages(stages: &[Box<dyn Stage>], input: &str) -> Result<String, SanitizeError> {
    let mut text = input.to_string();
    for stage in stages {
        let next = stage.apply(&text)?.into_owned();
        text = next;
    }
    Ok(text)
}

static STANDARD: OnceLock<Result<Pipeline, SanitizeError>> = OnceLock::new();

/// Clean an assistant answer for rendering. Never fails: any internal error
/// returns `raw` unchanged.
pub fn sanitize(raw: &str) -> String {
    match STANDARD.get_or_init(Pipeline::standard) {
        Ok(pipeline) => pipeline.sanitize(raw),
        Err(err) => {
            tracing::warn!(error = %err, "sanitizer unavailable, keeping original text");
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stage_output(stage: &dyn Stage, input: &str) -> String {
        stage.apply(input).unwrap().into_owned()
    }

    #[test]
    fn test_stage_order() {
        let pipeline = Pipeline::standard().unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "remove-found-established",
                "remove-image-alt-text",
                "remove-image-url",
                "remove-image-caption",
                "remove-class-attribute",
                "collapse-separators",
                "trim-separators",
                "collapse-spaces",
                "embed-image-urls",
            ]
        );
    }

    #[test]
    fn test_found_established_is_case_insensitive() {
        let stage = RemovePattern::new("t", r"(?i)found/established").unwrap();
        assert_eq!(
            stage_output(&stage, "Aspirin Found/Established 1899"),
            "Aspirin  1899"
        );
    }

    #[test]
    fn test_image_caption_runs_to_comma_or_newline() {
        assert_eq!(
            sanitize("imageCaption A bottle of syrup, shake well"),
            "shake well"
        );
        assert_eq!(
            sanitize("Dose: 5ml imageCaption Measuring cup, then rest"),
            "Dose: 5ml , then rest"
        );
        assert_eq!(
            sanitize("imagecaption Blister pack\nTake with water"),
            "Take with water"
        );
    }

    #[test]
    fn test_class_attribute_variants() {
        assert_eq!(sanitize(r#"Take <b class="warn">care</b>"#), "Take <b >care</b>");
        assert_eq!(sanitize("Use CLASS='x y' daily"), "Use daily");
        assert_eq!(sanitize("Use class=dose daily"), "Use daily");
        assert_eq!(sanitize("subclass=keep"), "subclass=keep");
    }

    #[test]
    fn test_collapse_separators_keeps_url_scheme() {
        let stage = CollapseSeparators::new().unwrap();
        assert_eq!(stage_output(&stage, "a,,b//c,/d"), "a,b,c,d");
        assert_eq!(
            stage_output(&stage, "see https://x.org/a"),
            "see https://x.org/a"
        );
        assert_eq!(stage_output(&stage, "ratio:,,2"), "ratio:,2");
    }

    #[test]
    fn test_whitespace_collapses_but_line_breaks_survive() {
        assert_eq!(
            sanitize("## Uses\n-   Pain   relief\n\n-  Fever"),
            "## Uses\n- Pain relief\n\n- Fever"
        );
    }

    #[test]
    fn test_metadata_tokens_are_removed() {
        assert_eq!(
            sanitize("imageAltTextAspirin, imageUrlhttps://x/y.png, Take twice daily"),
            "Take twice daily"
        );
    }

    #[test]
    fn test_bare_image_url_becomes_markdown_image() {
        assert_eq!(
            sanitize("See https://example.com/pic.jpg for details"),
            "See ![](https://example.com/pic.jpg) for details"
        );
        assert_eq!(
            sanitize("https://cdn.example.com/Label.PNG"),
            "![](https://cdn.example.com/Label.PNG)"
        );
    }

    #[test]
    fn test_url_glued_to_text_is_untouched() {
        assert_eq!(
            sanitize("(https://example.com/pic.jpg)"),
            "(https://example.com/pic.jpg)"
        );
        assert_eq!(
            sanitize("see:https://example.com/pic.gif"),
            "see:https://example.com/pic.gif"
        );
    }

    #[test]
    fn test_non_image_url_is_untouched() {
        assert_eq!(
            sanitize("More at https://example.com/leaflet.pdf"),
            "More at https://example.com/leaflet.pdf"
        );
    }

    #[test]
    fn test_spliced_tokens_are_removed_too() {
        // Removing the inner token joins the outer halves into a new one.
        assert_eq!(sanitize("Xfoundfound/established/establishedY"), "XY");
        assert_eq!(sanitize(r#"found/class="a"established dose"#), "dose");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            ",,,",
            "plain answer",
            "imageAltTextAspirin, imageUrlhttps://x/y.png, Take twice daily",
            "See https://example.com/pic.jpg for details",
            "https://a.io/x.webp https://a.io/y.svg",
            "Xfoundfound/established/establishedY",
            "a , , , b // c",
            ",  imageCaption   tail\n\n  **Bold**   text  ,",
            r#"<span class="x">found/established</span>, ,/ https://i.io/p.jpeg"#,
            "ratio:,,//2",
            "tab\t\tseparated\r\nline",
            "![](https://already.io/done.png) and https://new.io/x.gif",
            "imageUrl",
            "classclass=a=b",
        ];
        for input in inputs {
            let once = sanitize(input);
            let twice = sanitize(&once);
            assert_eq!(twice, once, "not idempotent for {input:?}");
        }
    }

    struct Broken;

    impl Stage for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn apply<'a>(&self, _input: &'a str) -> Result<Cow<'a, str>, SanitizeError> {
            Err(SanitizeError::Stage {
                stage: "broken",
                reason: "boom".to_string(),
            })
        }
    }

    #[test]
    fn test_failing_stage_returns_original_text() {
        let pipeline = Pipeline::new(
            vec![Box::new(TrimSeparators), Box::new(Broken)],
            Vec::new(),
        );
        assert!(pipeline.run("  keep me,  ").is_err());
        assert_eq!(pipeline.sanitize("  keep me,  "), "  keep me,  ");
    }
}
