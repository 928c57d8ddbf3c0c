//! Scripted in-memory page session for engine tests.
#![allow(dead_code)]

use async_trait::async_trait;
use outreach_engine::session::{LocatorQuery, PageSession};
use outreach_engine::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// One interactive control on a scripted page.
#[derive(Debug, Clone)]
pub struct FakeControl {
    pub id: &'static str,
    pub tag: &'static str,
    pub text: &'static str,
    pub attributes: Vec<(&'static str, &'static str)>,
    /// Named page state to switch to when clicked.
    pub on_click: Option<&'static str>,
}

impl FakeControl {
    pub fn button(id: &'static str, text: &'static str) -> Self {
        Self {
            id,
            tag: "button",
            text,
            attributes: Vec::new(),
            on_click: None,
        }
    }

    pub fn with_attr(mut self, name: &'static str, value: &'static str) -> Self {
        self.attributes.push((name, value));
        self
    }

    pub fn clicking_to(mut self, state: &'static str) -> Self {
        self.on_click = Some(state);
        self
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub text: String,
    pub controls: Vec<FakeControl>,
}

impl FakePage {
    pub fn new(text: &str, controls: Vec<FakeControl>) -> Self {
        Self {
            text: text.to_string(),
            controls,
        }
    }
}

/// Scripted browser session: pages keyed by URL, plus named states
/// reachable through clicks (dialogs, post-send pages).
#[derive(Default)]
pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    states: HashMap<&'static str, FakePage>,
    current: Mutex<FakePage>,
    pub navigations: Mutex<Vec<String>>,
    pub clicks: Mutex<Vec<String>>,
    pub typed: Mutex<Vec<(String, String)>>,
    pub captures: Mutex<Vec<String>>,
    pub unreachable: Vec<String>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn state(mut self, name: &'static str, page: FakePage) -> Self {
        self.states.insert(name, page);
        self
    }

    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.push(url.to_string());
        self
    }

    pub fn set_current(&self, page: FakePage) {
        *self.current.lock().unwrap() = page;
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.typed.lock().unwrap().clone()
    }
}

/// Minimal CSS matching: comma lists, descendant selectors (only the
/// last token is checked), tag names, `.class`, and `tag[attr='value']`.
fn matches_css(control: &FakeControl, css: &str) -> bool {
    css.split(',').any(|selector| {
        let selector = selector.trim();
        let last = selector.split_whitespace().last().unwrap_or(selector);
        matches_simple(control, last)
    })
}

fn matches_simple(control: &FakeControl, selector: &str) -> bool {
    if let Some((tag, rest)) = selector.split_once('[') {
        let tag_ok = tag.is_empty() || control.tag == tag;
        let body = rest.trim_end_matches(']');
        return match body.split_once('=') {
            Some((name, value)) => {
                let value = value.trim_matches('\'').trim_matches('"');
                tag_ok && control.attr(name) == Some(value)
            }
            None => tag_ok && control.attr(body).is_some(),
        };
    }

    if let Some(class) = selector.strip_prefix('.') {
        return control
            .attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class));
    }

    control.tag == selector
}

#[async_trait]
impl PageSession for FakeSession {
    type Handle = FakeControl;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.navigations.lock().unwrap().push(url.to_string());

        if self.unreachable.contains(&url.to_string()) {
            return Err(Error::Navigation(format!("timed out loading {}", url)));
        }

        match self.pages.get(url) {
            Some(page) => {
                self.set_current(page.clone());
                Ok(())
            }
            None => Err(Error::Navigation(format!("no route to {}", url))),
        }
    }

    async fn find_all(&self, query: &LocatorQuery) -> Result<Vec<FakeControl>> {
        let current = self.current.lock().unwrap();
        let matches = current
            .controls
            .iter()
            .filter(|control| match query {
                LocatorQuery::Css(css) => matches_css(control, css),
                LocatorQuery::TextContains { css, needle } => {
                    matches_css(control, css)
                        && control
                            .text
                            .to_lowercase()
                            .contains(&needle.to_lowercase())
                }
                LocatorQuery::AttributeContains { css, name, value } => {
                    matches_css(control, css)
                        && control
                            .attr(name)
                            .is_some_and(|v| v.to_lowercase().contains(&value.to_lowercase()))
                }
            })
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn click(&self, handle: &FakeControl) -> Result<()> {
        self.clicks.lock().unwrap().push(handle.id.to_string());

        if handle.attr("data-click-fails").is_some() {
            return Err(Error::Driver("click intercepted".to_string()));
        }

        if let Some(state) = handle.on_click {
            let page = self
                .states
                .get(state)
                .cloned()
                .unwrap_or_else(|| panic!("fake state '{}' not scripted", state));
            self.set_current(page);
        }
        Ok(())
    }

    async fn type_text(&self, handle: &FakeControl, text: &str) -> Result<()> {
        self.typed
            .lock()
            .unwrap()
            .push((handle.id.to_string(), text.to_string()));
        Ok(())
    }

    async fn page_text(&self) -> Result<String> {
        Ok(self.current.lock().unwrap().text.clone())
    }

    async fn capture(&self, label: &str) {
        self.captures.lock().unwrap().push(label.to_string());
    }
}
