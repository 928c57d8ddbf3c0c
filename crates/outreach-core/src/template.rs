use crate::Target;

/// Pure string substitution for note/message personalization.
///
/// `{name}` resolves through [`Target::display_name`]; any other
/// `{placeholder}` is looked up in the target's extra columns. Unknown
/// placeholders are left untouched so a typo is visible in the output
/// rather than silently dropped.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    template: String,
}

impl MessageTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, target: &Target) -> String {
        let mut out = self.template.replace("{name}", &target.display_name());
        for (key, value) in &target.fields {
            out = out.replace(&format!("{{{}}}", key), value);
        }
        out
    }
}
