/// Raw search text as typed. Settled values arrive separately from the
/// debounce stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchBox {
    value: String,
}

impl SearchBox {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Stores the new text and returns it for forwarding to the debouncer.
    pub fn input(&mut self, text: &str) -> String {
        self.value = text.to_string();
        self.value.clone()
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn render(&self) -> String {
        if self.value.is_empty() {
            "Search notes: _".to_string()
        } else {
            format!("Search notes: {}_", self.value)
        }
    }
}
