use sydata_result::Result;
use tracing::trace;

use crate::source::SourceRef;

/// Text leaf, read from its datasource on first access.
#[derive(Clone, Debug, Default)]
pub struct Text {
    source: Option<SourceRef>,
    value: Option<String>,
    modified: bool,
}

impl Text {
    pub fn new() -> Self {
        Self::from(String::new())
    }

    pub fn bound(source: SourceRef) -> Self {
        Self {
            source: Some(source),
            value: None,
            modified: false,
        }
    }

    pub fn datasource(&self) -> Option<&SourceRef> {
        self.source.as_ref()
    }

    pub fn get(&mut self) -> Result<&str> {
        if self.value.is_none() {
            if let Some(source) = &self.source {
                trace!(source = %source.identity(), "reading text");
                self.value = Some(source.read_text()?);
            }
        }
        Ok(self.value.as_deref().unwrap_or_default())
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.value = Some(text.into());
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.source.is_none() || self.modified
    }

    pub fn writeback(&mut self, target: &SourceRef, link: Option<&str>) -> Result<bool> {
        if let Some(key) = link {
            return match &self.source {
                Some(source) if !self.modified => target.link(key, source.as_ref()),
                _ => Ok(false),
            };
        }
        let in_place = self
            .source
            .as_ref()
            .is_some_and(|s| s.identity() == target.identity());
        if in_place && !self.modified {
            return Ok(true);
        }
        let text = self.get()?.to_string();
        target.write_text(&text)?;
        Ok(true)
    }

    pub fn detach(&mut self) -> Result<()> {
        self.get()?;
        self.source = None;
        Ok(())
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self {
            source: None,
            value: Some(value),
            modified: false,
        }
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}
