use indicatif::ProgressStyle;

const ONLY_MESSAGE_TEMPLATE: &str = "{spinner} {wide_msg}";
const MEMBER_TEMPLATE: &str = "{spinner} {prefix:12} {wide_bar:} {pos:>3}/{len:3} {msg}";

pub struct ProgressStyleTemplate;

impl ProgressStyleTemplate {
    pub fn only_message() -> ProgressStyle {
        ProgressStyle::with_template(ONLY_MESSAGE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// One step per roster member.
    pub fn member_bar() -> ProgressStyle {
        ProgressStyle::with_template(MEMBER_TEMPLATE)
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}
