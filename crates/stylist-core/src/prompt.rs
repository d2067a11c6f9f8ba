//! Prompt templates with named slots.
//!
//! A template declares its slots up front. Construction compiles the source
//! and renders it once with a marker value per slot, which rejects sources
//! that reference an undeclared slot or never use a declared one.

use tera::{Context, Tera};

use crate::error::{StylistError, StylistResult};

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    slots: Vec<&'static str>,
    tera: Tera,
}

impl PromptTemplate {
    /// Compile and validate a template.
    pub fn new(
        name: impl Into<String>,
        source: &str,
        slots: &[&'static str],
    ) -> StylistResult<Self> {
        let name = name.into();

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(&name, source)
            .map_err(|e| StylistError::template(&name, describe(&e)))?;

        let mut probe = Context::new();
        for slot in slots {
            probe.insert(*slot, &marker(slot));
        }
        let rendered = tera
            .render(&name, &probe)
            .map_err(|e| StylistError::template(&name, describe(&e)))?;

        if let Some(unused) = slots.iter().find(|slot| !rendered.contains(&marker(slot))) {
            return Err(StylistError::template(
                &name,
                format!("slot '{}' is declared but never used", unused),
            ));
        }

        Ok(Self {
            name,
            slots: slots.to_vec(),
            tera,
        })
    }

    /// A template without slots.
    pub fn fixed(name: impl Into<String>, text: &str) -> StylistResult<Self> {
        Self::new(name, text, &[])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &[&'static str] {
        &self.slots
    }

    /// Fill every slot. Missing and unknown slot names are errors.
    pub fn render(&self, values: &[(&str, &str)]) -> StylistResult<String> {
        if let Some((unknown, _)) = values.iter().find(|(key, _)| !self.slots.contains(key)) {
            return Err(StylistError::template(
                &self.name,
                format!("no slot named '{}'", unknown),
            ));
        }

        let mut context = Context::new();
        for slot in &self.slots {
            let value = values
                .iter()
                .find(|(key, _)| key == slot)
                .map(|(_, value)| *value)
                .ok_or_else(|| {
                    StylistError::template(&self.name, format!("missing value for slot '{}'", slot))
                })?;
            context.insert(*slot, value);
        }

        self.tera
            .render(&self.name, &context)
            .map_err(|e| StylistError::template(&self.name, describe(&e)))
    }
}

fn marker(slot: &str) -> String {
    format!("\u{1}slot:{}\u{1}", slot)
}

/// Tera keeps the useful part of its messages in the source chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_named_slots() {
        let template = PromptTemplate::new("greet", "Hello {{ who }} from {{ place }}!", &["who", "place"]).unwrap();
        let text = template.render(&[("place", "Lisbon"), ("who", "Ana")]).unwrap();
        assert_eq!(text, "Hello Ana from Lisbon!");
    }

    #[test]
    fn test_values_are_not_escaped_or_reinterpreted() {
        let template = PromptTemplate::new("raw", "{{ body }}", &["body"]).unwrap();
        let text = template.render(&[("body", "<b>{{ not a slot }}</b> & [link](https://x.y)")]).unwrap();
        assert_eq!(text, "<b>{{ not a slot }}</b> & [link](https://x.y)");
    }

    #[test]
    fn test_undeclared_slot_fails_at_construction() {
        let err = PromptTemplate::new("bad", "Hi {{ name }} {{ typo }}", &["name"]).unwrap_err();
        assert!(matches!(err, StylistError::Template { .. }));
    }

    #[test]
    fn test_unused_slot_fails_at_construction() {
        let err = PromptTemplate::new("bad", "Hi {{ name }}", &["name", "age"]).unwrap_err();
        assert!(err.to_string().contains("'age' is declared but never used"));
    }

    #[test]
    fn test_syntax_error_fails_at_construction() {
        assert!(PromptTemplate::new("bad", "Hi {{ name ", &["name"]).is_err());
    }

    #[test]
    fn test_render_rejects_missing_and_unknown_values() {
        let template = PromptTemplate::new("t", "{{ a }} {{ b }}", &["a", "b"]).unwrap();
        assert!(template.render(&[("a", "1")]).is_err());
        assert!(template.render(&[("a", "1"), ("b", "2"), ("c", "3")]).is_err());
    }

    #[test]
    fn test_fixed_template_renders_verbatim() {
        let template = PromptTemplate::fixed("static", "Just text.").unwrap();
        assert_eq!(template.render(&[]).unwrap(), "Just text.");
    }
}
